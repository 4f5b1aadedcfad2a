//! Utils

use std::time::Duration;

use clap::Parser;

use crate::solvers::SolveOptions;

/// Arguments for the allocation demo
#[derive(Debug, Parser)]
pub struct AllocateArgs {
    /// Fixture set to load plants, orders & weights from
    #[clap(short, long, default_value = "sample")]
    pub fixture: String,

    /// Solver time limit in seconds
    #[clap(short, long, default_value_t = 10.0)]
    pub time_limit: f64,

    /// Random seed passed to solvers that accept one
    #[clap(long)]
    pub seed: Option<u64>,

    /// Number of solver worker threads
    #[clap(short, long)]
    pub workers: Option<u32>,

    /// Log the solver's search progress
    #[clap(long)]
    pub log_search: bool,

    /// Print the plan as JSON instead of Markdown tables
    #[clap(long)]
    pub json: bool,
}

impl AllocateArgs {
    /// Solve options described by these arguments.
    ///
    /// A negative or non-finite time limit falls back to the default.
    pub fn solve_options(&self) -> SolveOptions {
        let defaults = SolveOptions::default();

        let time_limit =
            Duration::try_from_secs_f64(self.time_limit).unwrap_or(defaults.time_limit);

        SolveOptions {
            time_limit,
            seed: self.seed,
            workers: self.workers,
            log_search: self.log_search,
        }
    }
}
