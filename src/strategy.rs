//! The three concurrency strategies under comparison.
//!
//! Each strategy launches worker executables and blocks until they exit; the harness
//! itself never writes to a store. Timing is wall-clock from [`Instant`], taken around
//! the blocking invocation(s) only.

use std::fmt;
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::config::BenchmarkConfig;
use crate::error::ExecutionFailure;
use crate::partition::WorkPartition;
use crate::storage::StorageLayout;
use crate::worker::WorkerInvocation;

/// One of the concurrency models being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One process, one thread, one store.
    Single,
    /// One process, one thread per shard.
    MultiThread,
    /// One process per shard, driven from a bounded pool.
    MultiProcess,
}

impl Strategy {
    /// Label used in the summary.
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Single => "Single-threaded",
            Strategy::MultiThread => "Multi-threaded",
            Strategy::MultiProcess => "Multi-process",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Single => write!(f, "single"),
            Strategy::MultiThread => write!(f, "multi-thread"),
            Strategy::MultiProcess => write!(f, "multi-process"),
        }
    }
}

/// Outcome of one completed strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyResult {
    strategy: Strategy,
    elapsed: Duration,
    success: bool,
}

impl StrategyResult {
    pub fn new(strategy: Strategy, elapsed: Duration, success: bool) -> Self {
        Self {
            strategy,
            elapsed,
            success,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn success(&self) -> bool {
        self.success
    }
}

/// Runs strategies against a provisioned layout.
pub struct StrategyRunner<'a> {
    config: &'a BenchmarkConfig,
    layout: &'a StorageLayout,
}

impl<'a> StrategyRunner<'a> {
    pub fn new(config: &'a BenchmarkConfig, layout: &'a StorageLayout) -> Self {
        Self { config, layout }
    }

    /// Runs `strategy`; see the individual `run_*` methods.
    pub fn run(&self, strategy: Strategy) -> Result<StrategyResult, ExecutionFailure> {
        match strategy {
            Strategy::Single => self.run_single(),
            Strategy::MultiThread => self.run_multi_thread(),
            Strategy::MultiProcess => self.run_multi_process(),
        }
    }

    /// Writes every blob from a single worker process into the single store.
    pub fn run_single(&self) -> Result<StrategyResult, ExecutionFailure> {
        let program = self.config.single_writer();
        let invocation = WorkerInvocation::Single {
            program: &program,
            count: self.config.total_blobs(),
            blob_size: self.config.blob_size(),
            store: self.layout.single().path(),
        };

        let start = Instant::now();
        invocation.run(Strategy::Single)?;
        Ok(StrategyResult::new(Strategy::Single, start.elapsed(), true))
    }

    /// Hands the whole workload to the multi-thread worker, which splits it across its
    /// own threads and thread shards.
    pub fn run_multi_thread(&self) -> Result<StrategyResult, ExecutionFailure> {
        let program = self.config.multi_writer();
        let invocation = WorkerInvocation::MultiThread {
            program: &program,
            count: self.config.total_blobs(),
            blob_size: self.config.blob_size(),
            threads: self.config.threads(),
            prefix: self.layout.thread_prefix(),
        };

        let start = Instant::now();
        invocation.run(Strategy::MultiThread)?;
        Ok(StrategyResult::new(
            Strategy::MultiThread,
            start.elapsed(),
            true,
        ))
    }

    /// Launches one single-worker process per process shard on a pool sized to the
    /// configured process count.
    ///
    /// Every worker runs to completion before any result is looked at. Results are then
    /// inspected in shard order and the first failure is returned; later failures are
    /// only logged.
    pub fn run_multi_process(&self) -> Result<StrategyResult, ExecutionFailure> {
        let strategy = Strategy::MultiProcess;
        let partition = WorkPartition::new(self.config.total_blobs(), self.config.processes());
        let shards = self.layout.process_shards();
        debug_assert_eq!(partition.len(), shards.len());
        let program = self.config.single_writer();
        let blob_size = self.config.blob_size();

        let start = Instant::now();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.processes())
            .thread_name(|i| format!("process-shard-{i}"))
            .build()
            .map_err(|source| ExecutionFailure::Pool { strategy, source })?;

        let outcomes: Vec<Result<(), ExecutionFailure>> = pool.install(|| {
            partition
                .shares()
                .par_iter()
                .zip(shards)
                .map(|(share, target)| {
                    let invocation = WorkerInvocation::Single {
                        program: &program,
                        count: share.count,
                        blob_size,
                        store: target.path(),
                    };
                    invocation.run(strategy).inspect_err(|e| {
                        log::error!("process shard {} failed: {e}", share.index);
                    })
                })
                .collect()
        });
        let elapsed = start.elapsed();

        for outcome in outcomes {
            outcome?;
        }
        Ok(StrategyResult::new(strategy, elapsed, true))
    }
}
