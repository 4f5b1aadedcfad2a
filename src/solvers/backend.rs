//! `good_lp` Backend

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;
#[cfg(feature = "solver-highs")]
use good_lp::solvers::WithTimeLimit;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel, Variable,
};
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::{debug, info, warn};

use crate::solvers::{
    SolveOptions, SolveStatus, SolverBackend, SolverError, SolverOutcome,
    ilp::{ILPState, apply_recorded_constraints, state::ILPConstraint},
};

/// Extra wait past the time limit for a backend that enforces the limit itself and returns
/// its incumbent.
#[cfg(feature = "solver-highs")]
const DEADLINE_GRACE: Duration = Duration::from_secs(1);
#[cfg(not(feature = "solver-highs"))]
const DEADLINE_GRACE: Duration = Duration::ZERO;

/// Solver backend using `good_lp` with the solver selected by cargo features.
///
/// The model is solved on its own thread and the caller waits at most `time_limit` for the
/// answer. A solve that misses the deadline is reported as [`SolveStatus::Unknown`]; microlp
/// cannot be interrupted, so its thread is detached and finishes in the background. With
/// `solver-highs` the limit is also passed to HiGHS, which stops on its own and returns its
/// best incumbent as [`SolveStatus::Feasible`].
///
/// microlp has no seed or worker controls.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoodLpBackend;

impl SolverBackend for GoodLpBackend {
    fn solve(&self, state: ILPState, options: &SolveOptions) -> Result<SolverOutcome, SolverError> {
        let started = Instant::now();

        if state.is_empty() {
            warn!("model has no variables");

            return Ok(SolverOutcome::without_solution(
                SolveStatus::Invalid,
                started.elapsed(),
            ));
        }

        let (pb, objective, variables, constraints) = state.into_parts();

        debug!(
            variables = variables.len(),
            constraints = constraints.len(),
            time_limit = %options.time_limit.human(Truncate::Nano),
            "solving allocation model"
        );

        let (tx, rx) = mpsc::channel();
        let worker_options = options.clone();

        thread::Builder::new()
            .name("plant-alloc-solver".into())
            .spawn(move || {
                let outcome =
                    run(pb, &objective, &variables, constraints, &worker_options, started);

                // The receiver is gone once the deadline has passed.
                if tx.send(outcome).is_err() {
                    debug!("late solver answer discarded");
                }
            })
            .map_err(SolverError::Worker)?;

        let deadline = options.time_limit.saturating_add(DEADLINE_GRACE);

        let outcome = match rx.recv_timeout(deadline) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                let elapsed = started.elapsed();

                warn!(
                    elapsed = %elapsed.human(Truncate::Nano),
                    limit = %options.time_limit.human(Truncate::Nano),
                    "solve exceeded its time budget"
                );

                SolverOutcome::without_solution(SolveStatus::Unknown, elapsed)
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("solver thread stopped without an answer");

                SolverOutcome::without_solution(SolveStatus::Unknown, started.elapsed())
            }
        };

        info!(
            status = %outcome.status,
            objective = outcome.objective_value,
            elapsed = %outcome.elapsed.human(Truncate::Nano),
            "solve finished"
        );

        Ok(outcome)
    }
}

/// Replay the recorded model into the selected solver and map its answer.
fn run(
    pb: ProblemVariables,
    objective: &Expression,
    variables: &[Variable],
    constraints: Vec<ILPConstraint>,
    options: &SolveOptions,
    started: Instant,
) -> SolverOutcome {
    debug!(
        seed = options.seed,
        workers = options.workers,
        log_search = options.log_search,
        "replaying model into the solver"
    );

    let model = pb.maximise(objective.clone()).using(default_solver);

    #[cfg(feature = "solver-highs")]
    let model = model
        .with_time_limit(options.time_limit.as_secs_f64())
        .set_verbose(options.log_search);

    let model = apply_recorded_constraints(model, constraints);

    let result = model.solve();
    let elapsed = started.elapsed();

    match result {
        Ok(solution) => {
            let status = match solution.status() {
                SolutionStatus::Optimal => SolveStatus::Optimal,
                _ => SolveStatus::Feasible,
            };

            let values = variables
                .iter()
                .map(|&var| (var, solution.value(var)))
                .collect();

            SolverOutcome {
                status,
                values,
                objective_value: Some(objective.eval_with(&solution)),
                best_bound: None,
                elapsed,
            }
        }
        Err(ResolutionError::Infeasible) => {
            SolverOutcome::without_solution(SolveStatus::Infeasible, elapsed)
        }
        Err(ResolutionError::Unbounded) => {
            SolverOutcome::without_solution(SolveStatus::Invalid, elapsed)
        }
        Err(err) => {
            warn!(error = %err, "solver stopped without a solution");

            SolverOutcome::without_solution(SolveStatus::Unknown, elapsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use good_lp::variable;
    use testresult::TestResult;

    use super::*;
    use crate::solvers::ilp::state::ConstraintRelation;

    #[test]
    fn empty_model_is_invalid() -> TestResult {
        let outcome = GoodLpBackend.solve(ILPState::new(), &SolveOptions::default())?;

        assert_eq!(outcome.status, SolveStatus::Invalid);
        assert!(outcome.values.is_empty());

        Ok(())
    }

    #[test]
    fn solves_small_knapsack() -> TestResult {
        let mut state = ILPState::new();
        let a = state.add_variable(variable().binary());
        let b = state.add_variable(variable().binary());
        let c = state.add_variable(variable().binary());

        state.add_to_objective(a, 4.0);
        state.add_to_objective(b, 2.0);
        state.add_to_objective(c, 2.0);
        state.add_constraint(
            Expression::from(a) * 4.0 + b * 2.0 + c * 2.0,
            ConstraintRelation::Leq,
            5.0,
        );

        let outcome = GoodLpBackend.solve(state, &SolveOptions::default())?;

        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!(outcome.objective_value.is_some_and(|v| (v - 4.0).abs() < 1e-6));

        Ok(())
    }

    #[test]
    fn missed_deadline_reports_unknown() -> TestResult {
        let mut state = ILPState::new();
        let mut weight = Expression::from(0.0);

        for idx in 0..200_u32 {
            let var = state.add_variable(variable().binary());
            let size = f64::from(idx % 17 + 3);

            state.add_to_objective(var, size + f64::from(idx % 5));
            weight += var * size;
        }

        state.add_constraint(weight, ConstraintRelation::Leq, 401.0);

        let options = SolveOptions {
            time_limit: Duration::ZERO,
            ..SolveOptions::default()
        };

        let outcome = GoodLpBackend.solve(state, &options)?;

        assert_eq!(outcome.status, SolveStatus::Unknown);
        assert!(outcome.values.is_empty());
        assert!(outcome.objective_value.is_none());
        assert!(outcome.elapsed < Duration::from_secs(1));

        Ok(())
    }
}
