//! Splits `total_blobs` across worker threads, one store per thread.
//!
//! Usage: `multi_writer <total_blobs> <blob_size> <num_threads> <database_base>`
//!
//! Thread `i` writes into `<database_base>_<i>.sqlite`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "multi_writer")]
struct Args {
    /// Number of blobs to insert across all threads
    total_blobs: u64,
    /// Size of every blob in bytes
    blob_size: usize,
    /// Number of writer threads
    num_threads: usize,
    /// Shard prefix; thread `i` writes `<prefix>_<i>.sqlite`
    database_base: PathBuf,
}

fn main() -> ExitCode {
    let _ = env_logger::try_init();
    let args = Args::parse();

    if args.num_threads == 0 {
        eprintln!("Error: thread count must be at least 1");
        return ExitCode::FAILURE;
    }

    match blob_bench::writer::insert_sharded(
        &args.database_base,
        args.total_blobs,
        args.blob_size,
        args.num_threads,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
