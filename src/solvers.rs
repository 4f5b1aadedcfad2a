//! Solvers for Allocation Problems

use std::{fmt, time::Duration};

use good_lp::Variable;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{problem::ProblemError, solvers::ilp::ILPState};

pub mod backend;
pub mod ilp;

pub use backend::GoodLpBackend;

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// Wrapped configuration error
    #[error(transparent)]
    Problem(#[from] ProblemError),

    /// Integer coefficient cannot be represented exactly as a solver coefficient.
    #[error("coefficient cannot be represented exactly as a solver coefficient: {value}")]
    CoefficientNotRepresentable {
        /// Offending integer value
        value: i128,
    },

    /// Combining objective coefficients overflowed.
    #[error("objective coefficient overflow while combining objective {objective}")]
    CoefficientOverflow {
        /// Objective being combined when the overflow happened
        objective: String,
    },

    /// The solver thread could not be started.
    #[error("failed to start the solver thread")]
    Worker(#[source] std::io::Error),

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,

    /// Feasible but not proven optimal, e.g. when the time budget ran out
    Feasible,

    /// The model has no feasible solution
    Infeasible,

    /// The model is malformed
    Invalid,

    /// The solver stopped without a usable answer
    Unknown,

    /// Nothing was eligible, so the solver was never invoked
    NotSolved,
}

impl SolveStatus {
    /// Returns true if variable values are available.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// Status name
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Invalid => "invalid",
            SolveStatus::Unknown => "unknown",
            SolveStatus::NotSolved => "not_solved",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options passed to a [`SolverBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOptions {
    /// Wall-clock budget for the solve
    pub time_limit: Duration,

    /// Random seed, for backends that support one
    pub seed: Option<u64>,

    /// Worker threads, for backends that support parallel search
    pub workers: Option<u32>,

    /// Ask the backend to log its search progress
    pub log_search: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            seed: None,
            workers: None,
            log_search: false,
        }
    }
}

/// Answer returned by a [`SolverBackend`].
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    /// Solve status
    pub status: SolveStatus,

    /// Value of every model variable; empty unless the status has a solution
    pub values: FxHashMap<Variable, f64>,

    /// Objective value, when a solution exists
    pub objective_value: Option<f64>,

    /// Best proven bound on the objective, when the backend reports one
    pub best_bound: Option<f64>,

    /// Wall-clock time spent solving
    pub elapsed: Duration,
}

impl SolverOutcome {
    /// Outcome carrying no solution.
    pub fn without_solution(status: SolveStatus, elapsed: Duration) -> Self {
        Self {
            status,
            values: FxHashMap::default(),
            objective_value: None,
            best_bound: None,
            elapsed,
        }
    }

    /// Value of a variable, or zero when the outcome has none.
    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }
}

/// An integer programming engine able to solve a recorded model.
pub trait SolverBackend {
    /// Maximise the model recorded in `state`.
    ///
    /// Solver non-success is reported through [`SolveStatus`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the backend hits an internal failure.
    fn solve(&self, state: ILPState, options: &SolveOptions) -> Result<SolverOutcome, SolverError>;
}

impl<B: SolverBackend + ?Sized> SolverBackend for &B {
    fn solve(&self, state: ILPState, options: &SolveOptions) -> Result<SolverOutcome, SolverError> {
        (**self).solve(state, options)
    }
}
