use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default size of one blob in bytes.
const DEFAULT_BLOB_SIZE: usize = 1024;

/// Default number of blobs written by each strategy.
const DEFAULT_TOTAL_BLOBS: u64 = 100_000;

/// Default worker thread count for the multi-thread strategy.
const DEFAULT_THREADS: usize = 10;

/// Default worker process count for the multi-process strategy.
const DEFAULT_PROCESSES: usize = 10;

/// File name of the single-worker executable inside the binaries directory.
pub const SINGLE_WRITER: &str = "single_writer";

/// File name of the multi-thread executable inside the binaries directory.
pub const MULTI_WRITER: &str = "multi_writer";

/// Immutable settings for one benchmark run.
///
/// Built once through [`BenchmarkConfig::builder`] and then passed by reference
/// to every stage. Nothing in the crate mutates it after [`build`](BenchmarkConfigBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    blob_size: usize,
    total_blobs: u64,
    threads: usize,
    processes: usize,
    storage_dir: PathBuf,
    bin_dir: PathBuf,
}

impl BenchmarkConfig {
    /// Returns a builder preloaded with the default workload.
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::new()
    }

    pub fn blob_size(&self) -> usize {
        self.blob_size
    }

    pub fn total_blobs(&self) -> u64 {
        self.total_blobs
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Path of the single-worker executable.
    pub fn single_writer(&self) -> PathBuf {
        self.bin_dir.join(format!("{SINGLE_WRITER}{EXE_SUFFIX}"))
    }

    /// Path of the multi-thread executable.
    pub fn multi_writer(&self) -> PathBuf {
        self.bin_dir.join(format!("{MULTI_WRITER}{EXE_SUFFIX}"))
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            blob_size: DEFAULT_BLOB_SIZE,
            total_blobs: DEFAULT_TOTAL_BLOBS,
            threads: DEFAULT_THREADS,
            processes: DEFAULT_PROCESSES,
            storage_dir: PathBuf::from("dbs"),
            bin_dir: PathBuf::from("bin"),
        }
    }
}

/// Builder for [`BenchmarkConfig`].
///
/// # Example
///
/// ```
/// use blob_bench::BenchmarkConfig;
///
/// let config = BenchmarkConfig::builder()
///     .total_blobs(10_000)
///     .processes(4)
///     .storage_dir("/tmp/blob-bench")
///     .build()
///     .unwrap();
/// assert_eq!(config.processes(), 4);
/// ```
pub struct BenchmarkConfigBuilder {
    config: BenchmarkConfig,
}

impl BenchmarkConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BenchmarkConfig::default(),
        }
    }

    /// Sets the size of every blob in bytes.
    ///
    /// Default: 1024
    #[must_use]
    pub fn blob_size(mut self, bytes: usize) -> Self {
        self.config.blob_size = bytes;
        self
    }

    /// Sets how many blobs each strategy writes in total.
    ///
    /// Default: 100000
    #[must_use]
    pub fn total_blobs(mut self, count: u64) -> Self {
        self.config.total_blobs = count;
        self
    }

    /// Sets the worker thread count used by the multi-thread strategy.
    ///
    /// Default: 10
    #[must_use]
    pub fn threads(mut self, count: usize) -> Self {
        self.config.threads = count;
        self
    }

    /// Sets the worker process count (and pool size) used by the multi-process strategy.
    ///
    /// Default: 10
    #[must_use]
    pub fn processes(mut self, count: usize) -> Self {
        self.config.processes = count;
        self
    }

    /// Sets the directory holding every store file.
    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.storage_dir = dir.into();
        self
    }

    /// Sets the directory holding the worker executables.
    #[must_use]
    pub fn bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.bin_dir = dir.into();
        self
    }

    /// Validates the settings and freezes them.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob size, thread count or process count is zero.
    pub fn build(self) -> Result<BenchmarkConfig, ConfigError> {
        let config = self.config;
        if config.blob_size == 0 {
            return Err(ConfigError::ZeroBlobSize);
        }
        if config.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if config.processes == 0 {
            return Err(ConfigError::ZeroProcesses);
        }
        Ok(config)
    }
}

impl Default for BenchmarkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
