use std::path::Path;
use std::process::Command;

use crate::error::ExecutionFailure;
use crate::strategy::Strategy;

/// A typed invocation of one of the worker executables.
///
/// Argument order is the fixed positional contract of the executables:
///
/// | executable      | arguments                                   |
/// |-----------------|---------------------------------------------|
/// | `single_writer` | count, blob size, store path                |
/// | `multi_writer`  | count, blob size, thread count, shard prefix |
#[derive(Debug, Clone, Copy)]
pub enum WorkerInvocation<'a> {
    Single {
        program: &'a Path,
        count: u64,
        blob_size: usize,
        store: &'a Path,
    },
    MultiThread {
        program: &'a Path,
        count: u64,
        blob_size: usize,
        threads: usize,
        prefix: &'a Path,
    },
}

impl WorkerInvocation<'_> {
    pub fn program(&self) -> &Path {
        match self {
            WorkerInvocation::Single { program, .. }
            | WorkerInvocation::MultiThread { program, .. } => program,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        match *self {
            WorkerInvocation::Single {
                count,
                blob_size,
                store,
                ..
            } => {
                cmd.arg(count.to_string())
                    .arg(blob_size.to_string())
                    .arg(store);
            }
            WorkerInvocation::MultiThread {
                count,
                blob_size,
                threads,
                prefix,
                ..
            } => {
                cmd.arg(count.to_string())
                    .arg(blob_size.to_string())
                    .arg(threads.to_string())
                    .arg(prefix);
            }
        }
        cmd
    }

    /// Runs the worker and blocks until it exits. There is no timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker cannot be started or exits unsuccessfully.
    pub fn run(&self, strategy: Strategy) -> Result<(), ExecutionFailure> {
        let mut cmd = self.command();
        log::debug!("{strategy}: running {cmd:?}");

        let status = cmd.status().map_err(|source| ExecutionFailure::Spawn {
            strategy,
            program: self.program().to_path_buf(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecutionFailure::ExitStatus {
                strategy,
                program: self.program().to_path_buf(),
                status,
            })
        }
    }
}
