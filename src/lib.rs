//! Write-throughput harness for blob ingestion into SQLite.
//!
//! The harness compares three ways of writing the same number of fixed-size blobs:
//!
//! - **single**: one worker process writes everything into one store;
//! - **multi-thread**: one worker process splits the work across threads, one store per thread;
//! - **multi-process**: one worker process per shard, each with its own store, driven from a
//!   bounded pool.
//!
//! A run builds the worker executables, provisions every store up front, runs the three
//! strategies one after another and reports their wall-clock durations.
//!
//! ```no_run
//! use blob_bench::{BenchmarkConfig, CargoToolchain};
//!
//! let config = BenchmarkConfig::builder().total_blobs(10_000).build()?;
//! let toolchain = CargoToolchain::new("target/blob-bench");
//! let report = blob_bench::run(&config, &toolchain)?;
//! println!("{report}");
//! # Ok::<(), blob_bench::BenchError>(())
//! ```

mod config;
mod error;
mod partition;
mod pipeline;
mod report;
mod storage;
mod strategy;
mod toolchain;
mod worker;
pub mod writer;

pub use config::{BenchmarkConfig, BenchmarkConfigBuilder, MULTI_WRITER, SINGLE_WRITER};
pub use error::{
    BenchError, CompilationFailure, ConfigError, ExecutionFailure, ProvisioningFailure,
    WriterError,
};
pub use partition::{ShardShare, WorkPartition};
pub use pipeline::{BenchmarkRun, RunState, run};
pub use report::ResultReporter;
pub use storage::{
    BLOB_TABLE, StorageKind, StorageLayout, StorageTarget, ThroughputSettings,
    apply_throughput_settings, provision, provision_all, shard_path,
};
pub use strategy::{Strategy, StrategyResult, StrategyRunner};
pub use toolchain::{
    BuildUnit, CargoToolchain, CompileFlags, PrebuiltToolchain, Toolchain, build_all,
};
pub use worker::WorkerInvocation;
