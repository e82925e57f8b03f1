use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::strategy::Strategy;

/// Errors raised while validating a [`BenchmarkConfig`](crate::BenchmarkConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The blob size must be at least one byte.
    ZeroBlobSize,
    /// The multi-thread strategy needs at least one thread.
    ZeroThreads,
    /// The multi-process strategy needs at least one process.
    ZeroProcesses,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBlobSize => write!(f, "blob size must be at least 1 byte"),
            ConfigError::ZeroThreads => write!(f, "thread count must be at least 1"),
            ConfigError::ZeroProcesses => write!(f, "process count must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A worker executable could not be produced.
#[derive(Debug)]
pub enum CompilationFailure {
    /// The compiler could not be started at all.
    Spawn { program: String, source: io::Error },
    /// The compiler ran but exited unsuccessfully.
    ExitStatus { unit: String, status: ExitStatus },
    /// The compiler reported success but the expected binary is not on disk.
    MissingArtifact { unit: String, path: PathBuf },
    /// The built artifact could not be installed into the binaries directory.
    Install { unit: String, path: PathBuf, source: io::Error },
}

impl fmt::Display for CompilationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilationFailure::Spawn { program, source } => {
                write!(f, "failed to launch compiler '{program}': {source}")
            }
            CompilationFailure::ExitStatus { unit, status } => {
                write!(f, "compiling '{unit}' failed: {status}")
            }
            CompilationFailure::MissingArtifact { unit, path } => write!(
                f,
                "compiling '{unit}' produced no binary at {}",
                path.display()
            ),
            CompilationFailure::Install { unit, path, source } => write!(
                f,
                "installing '{unit}' to {} failed: {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CompilationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompilationFailure::Spawn { source, .. } => Some(source),
            CompilationFailure::Install { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A storage target could not be reset or created.
#[derive(Debug)]
pub enum ProvisioningFailure {
    /// Filesystem error while preparing the directory or removing an old store.
    Io { path: PathBuf, source: io::Error },
    /// A statement against the fresh store failed.
    Statement {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// The engine refused one of the throughput settings.
    Setting {
        path: PathBuf,
        pragma: &'static str,
        expected: &'static str,
        actual: String,
    },
}

impl ProvisioningFailure {
    /// Path of the store that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ProvisioningFailure::Io { path, .. }
            | ProvisioningFailure::Statement { path, .. }
            | ProvisioningFailure::Setting { path, .. } => path,
        }
    }
}

impl fmt::Display for ProvisioningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningFailure::Io { path, source } => {
                write!(f, "preparing {} failed: {source}", path.display())
            }
            ProvisioningFailure::Statement { path, source } => {
                write!(f, "creating store {} failed: {source}", path.display())
            }
            ProvisioningFailure::Setting {
                path,
                pragma,
                expected,
                actual,
            } => write!(
                f,
                "store {} reports {pragma}={actual}, expected {expected}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ProvisioningFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProvisioningFailure::Io { source, .. } => Some(source),
            ProvisioningFailure::Statement { source, .. } => Some(source),
            ProvisioningFailure::Setting { .. } => None,
        }
    }
}

/// A worker invocation did not complete successfully.
#[derive(Debug)]
pub enum ExecutionFailure {
    /// The worker executable could not be started.
    Spawn {
        strategy: Strategy,
        program: PathBuf,
        source: io::Error,
    },
    /// The worker exited with a non-zero status.
    ExitStatus {
        strategy: Strategy,
        program: PathBuf,
        status: ExitStatus,
    },
    /// The worker pool for the multi-process strategy could not be built.
    Pool {
        strategy: Strategy,
        source: rayon::ThreadPoolBuildError,
    },
}

impl ExecutionFailure {
    /// Strategy that was running when the failure happened.
    pub fn strategy(&self) -> Strategy {
        match self {
            ExecutionFailure::Spawn { strategy, .. }
            | ExecutionFailure::ExitStatus { strategy, .. }
            | ExecutionFailure::Pool { strategy, .. } => *strategy,
        }
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionFailure::Spawn {
                strategy,
                program,
                source,
            } => write!(
                f,
                "{strategy}: failed to launch {}: {source}",
                program.display()
            ),
            ExecutionFailure::ExitStatus {
                strategy,
                program,
                status,
            } => write!(f, "{strategy}: {} exited with {status}", program.display()),
            ExecutionFailure::Pool { strategy, source } => {
                write!(f, "{strategy}: failed to build worker pool: {source}")
            }
        }
    }
}

impl std::error::Error for ExecutionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionFailure::Spawn { source, .. } => Some(source),
            ExecutionFailure::Pool { source, .. } => Some(source),
            ExecutionFailure::ExitStatus { .. } => None,
        }
    }
}

/// Top-level error for a benchmark run. Every variant is fatal.
#[derive(Debug)]
pub enum BenchError {
    Config(ConfigError),
    Compilation(CompilationFailure),
    Provisioning(ProvisioningFailure),
    Execution(ExecutionFailure),
}

impl BenchError {
    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            BenchError::Config(_) => "configuration",
            BenchError::Compilation(_) => "build",
            BenchError::Provisioning(_) => "provisioning",
            BenchError::Execution(_) => "execution",
        }
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::Config(e) => write!(f, "invalid configuration: {e}"),
            BenchError::Compilation(e) => write!(f, "compilation failure: {e}"),
            BenchError::Provisioning(e) => write!(f, "provisioning failure: {e}"),
            BenchError::Execution(e) => write!(f, "execution failure: {e}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::Config(e) => Some(e),
            BenchError::Compilation(e) => Some(e),
            BenchError::Provisioning(e) => Some(e),
            BenchError::Execution(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BenchError {
    fn from(err: ConfigError) -> Self {
        BenchError::Config(err)
    }
}

impl From<CompilationFailure> for BenchError {
    fn from(err: CompilationFailure) -> Self {
        BenchError::Compilation(err)
    }
}

impl From<ProvisioningFailure> for BenchError {
    fn from(err: ProvisioningFailure) -> Self {
        BenchError::Provisioning(err)
    }
}

impl From<ExecutionFailure> for BenchError {
    fn from(err: ExecutionFailure) -> Self {
        BenchError::Execution(err)
    }
}

/// Errors raised inside the reference write-path executables.
#[derive(Debug)]
pub enum WriterError {
    /// The engine rejected an open, pragma, insert or commit.
    Sqlite(rusqlite::Error),
    /// A writer thread panicked before finishing its shard.
    ThreadPanicked(usize),
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterError::Sqlite(e) => write!(f, "{e}"),
            WriterError::ThreadPanicked(index) => write!(f, "writer thread {index} panicked"),
        }
    }
}

impl std::error::Error for WriterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriterError::Sqlite(e) => Some(e),
            WriterError::ThreadPanicked(_) => None,
        }
    }
}

impl From<rusqlite::Error> for WriterError {
    fn from(err: rusqlite::Error) -> Self {
        WriterError::Sqlite(err)
    }
}
