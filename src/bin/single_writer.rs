//! Writes `count` blobs sequentially into one store.
//!
//! Usage: `single_writer <count> <blob_size> <database_file>`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "single_writer")]
struct Args {
    /// Number of blobs to insert
    count: u64,
    /// Size of every blob in bytes
    blob_size: usize,
    /// Store created by the harness
    database_file: PathBuf,
}

fn main() -> ExitCode {
    let _ = env_logger::try_init();
    let args = Args::parse();

    match blob_bench::writer::insert_blobs(&args.database_file, 1, args.count, args.blob_size) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
