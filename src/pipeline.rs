//! Drives one benchmark run from build to summary.
//!
//! ```text
//! Idle -> Building -> Provisioning -> RunningSingle -> RunningThreaded
//!      -> RunningProcess -> Reporting -> Done
//! ```
//!
//! Any stage may move to `Failed`, which is terminal. Nothing is retried and no partial
//! summary is produced.

use std::fmt;

use crate::config::BenchmarkConfig;
use crate::error::BenchError;
use crate::report::ResultReporter;
use crate::storage::{self, StorageLayout};
use crate::strategy::{Strategy, StrategyRunner};
use crate::toolchain::{self, BuildUnit, Toolchain};

/// Stage of a [`BenchmarkRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Building,
    Provisioning,
    RunningSingle,
    RunningThreaded,
    RunningProcess,
    Reporting,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Building => "building",
            RunState::Provisioning => "provisioning",
            RunState::RunningSingle => "running single",
            RunState::RunningThreaded => "running multi-thread",
            RunState::RunningProcess => "running multi-process",
            RunState::Reporting => "reporting",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

const STRATEGY_STAGES: [(RunState, Strategy); 3] = [
    (RunState::RunningSingle, Strategy::Single),
    (RunState::RunningThreaded, Strategy::MultiThread),
    (RunState::RunningProcess, Strategy::MultiProcess),
];

/// A single pass through the pipeline.
pub struct BenchmarkRun<'a> {
    config: &'a BenchmarkConfig,
    toolchain: &'a dyn Toolchain,
    state: RunState,
}

impl<'a> BenchmarkRun<'a> {
    pub fn new(config: &'a BenchmarkConfig, toolchain: &'a dyn Toolchain) -> Self {
        Self {
            config,
            toolchain,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn enter(&mut self, state: RunState) {
        log::debug!("{} -> {}", self.state, state);
        self.state = state;
    }

    /// Runs every stage in order.
    ///
    /// A run can only be executed once; the returned reporter holds all three results.
    ///
    /// # Errors
    ///
    /// Returns the first failure from any stage. The run is left in [`RunState::Failed`].
    ///
    /// # Panics
    ///
    /// Panics if the run has already been executed.
    pub fn execute(&mut self) -> Result<ResultReporter, BenchError> {
        assert_eq!(self.state, RunState::Idle, "a benchmark run executes once");

        let result = self.execute_stages();
        match &result {
            Ok(_) => self.enter(RunState::Done),
            Err(e) => {
                log::error!("benchmark failed during {} ({}): {e}", e.stage(), self.state);
                self.enter(RunState::Failed);
            }
        }
        result
    }

    fn execute_stages(&mut self) -> Result<ResultReporter, BenchError> {
        self.enter(RunState::Building);
        log::info!("Compiling programs...");
        toolchain::build_all(self.toolchain, &BuildUnit::workers(self.config))?;

        self.enter(RunState::Provisioning);
        log::info!("Initializing databases...");
        let layout = StorageLayout::new(self.config);
        storage::provision_all(self.config, &layout)?;

        log::info!(
            "Running benchmarks (total blobs: {})",
            self.config.total_blobs()
        );
        let runner = StrategyRunner::new(self.config, &layout);
        let mut reporter = ResultReporter::new(self.config.total_blobs());
        for (state, strategy) in STRATEGY_STAGES {
            self.enter(state);
            reporter.record(runner.run(strategy)?);
        }

        self.enter(RunState::Reporting);
        Ok(reporter)
    }
}

/// Runs the whole pipeline once.
pub fn run(
    config: &BenchmarkConfig,
    toolchain: &dyn Toolchain,
) -> Result<ResultReporter, BenchError> {
    BenchmarkRun::new(config, toolchain).execute()
}
