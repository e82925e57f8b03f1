use std::fmt;

use comfy_table::{Table, presets};

use crate::strategy::{Strategy, StrategyResult};

/// Collects strategy results in execution order and renders the final summary.
///
/// The reporter only observes; it never decides whether a run passed.
#[derive(Debug, Clone, Default)]
pub struct ResultReporter {
    total_blobs: u64,
    results: Vec<StrategyResult>,
}

impl ResultReporter {
    pub fn new(total_blobs: u64) -> Self {
        Self {
            total_blobs,
            results: Vec::new(),
        }
    }

    /// Appends a completed strategy and logs its duration.
    pub fn record(&mut self, result: StrategyResult) {
        log::info!(
            "{}: {:.2} seconds",
            result.strategy().label(),
            result.elapsed().as_secs_f64()
        );
        self.results.push(result);
    }

    pub fn results(&self) -> &[StrategyResult] {
        &self.results
    }

    /// Looks up the result of a strategy, if it has completed.
    pub fn get(&self, strategy: Strategy) -> Option<&StrategyResult> {
        self.results.iter().find(|r| r.strategy() == strategy)
    }

    /// One `Label: 1.23s` line per strategy.
    pub fn summary_lines(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| format!("{}: {:.2}s", r.strategy().label(), r.elapsed().as_secs_f64()))
            .collect()
    }

    /// Throughput table with speedup relative to the single-worker strategy.
    pub fn table(&self) -> Table {
        let baseline = self
            .get(Strategy::Single)
            .map(|r| r.elapsed().as_secs_f64());

        let mut table = Table::new();
        table.load_preset(presets::ASCII_MARKDOWN);
        table.set_header(["strategy", "seconds", "blobs/sec", "vs single"]);
        for result in &self.results {
            let secs = result.elapsed().as_secs_f64();
            let throughput = if secs > 0.0 {
                format!("{:.0}", self.total_blobs as f64 / secs)
            } else {
                "-".to_string()
            };
            let speedup = match baseline {
                Some(base) if secs > 0.0 => format!("{:.2}x", base / secs),
                _ => "-".to_string(),
            };
            table.add_row([
                result.strategy().label().to_string(),
                format!("{secs:.2}"),
                throughput,
                speedup,
            ]);
        }
        table
    }
}

impl fmt::Display for ResultReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final Results:")?;
        for line in self.summary_lines() {
            writeln!(f, "{line}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.table())
    }
}
