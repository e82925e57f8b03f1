use std::path::PathBuf;
use std::process::ExitCode;

use blob_bench::{BenchmarkConfig, CargoToolchain, PrebuiltToolchain, Toolchain};
use clap::Parser;

/// Compare single-worker, multi-thread and multi-process blob ingestion into SQLite.
#[derive(Parser, Debug)]
#[command(name = "blob-bench")]
#[command(version, about)]
struct Cli {
    /// Size of every blob in bytes
    #[arg(long, default_value = "1024")]
    blob_size: usize,

    /// Number of blobs written by each strategy
    #[arg(long, default_value = "100000")]
    total_blobs: u64,

    /// Worker threads for the multi-thread strategy
    #[arg(long, default_value = "10")]
    threads: usize,

    /// Worker processes (and pool size) for the multi-process strategy
    #[arg(long, default_value = "10")]
    processes: usize,

    /// Directory holding the store files
    #[arg(long, default_value = "dbs")]
    storage_dir: PathBuf,

    /// Directory holding the worker executables
    #[arg(long, default_value = "bin")]
    bin_dir: PathBuf,

    /// Cargo target directory used when building the workers
    #[arg(long, default_value = "target/blob-bench")]
    target_dir: PathBuf,

    /// Use the executables already in --bin-dir instead of building them
    #[arg(long)]
    skip_build: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match BenchmarkConfig::builder()
        .blob_size(cli.blob_size)
        .total_blobs(cli.total_blobs)
        .threads(cli.threads)
        .processes(cli.processes)
        .storage_dir(cli.storage_dir)
        .bin_dir(cli.bin_dir)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    let toolchain: Box<dyn Toolchain> = if cli.skip_build {
        Box::new(PrebuiltToolchain)
    } else {
        Box::new(CargoToolchain::new(cli.target_dir))
    };

    match blob_bench::run(&config, toolchain.as_ref()) {
        Ok(report) => {
            println!();
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Benchmark failed: {e}");
            ExitCode::FAILURE
        }
    }
}
