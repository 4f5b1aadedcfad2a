//! Allocator
//!
//! Single synchronous entry point: classify, normalise, formulate, solve, decode. Each call
//! builds fresh variables and constraints; nothing is shared between calls.

use std::time::Duration;

use tracing::{debug, info, info_span};

use crate::{
    classify::ClassifiedItems,
    items::groups::ModelGroup,
    normalize::objective_bounds,
    plan::{AllocationPlan, DecodeInput, decode},
    plants::total_capacity,
    problem::AllocationProblem,
    solvers::{
        GoodLpBackend, SolveOptions, SolveStatus, SolverBackend, SolverError, SolverOutcome,
        ilp::{ILPObserver, NoopObserver, build_model, objective::ObjectiveCoefficients},
    },
};

/// Allocates items to plants with a [`SolverBackend`].
#[derive(Debug, Default, Clone)]
pub struct Allocator<B = GoodLpBackend> {
    backend: B,
    options: SolveOptions,
}

impl Allocator {
    /// Create an allocator using the default backend and options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: SolverBackend> Allocator<B> {
    /// Create an allocator using the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            options: SolveOptions::default(),
        }
    }

    /// Returns the allocator with the given solve options.
    #[must_use]
    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Solve options
    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Allocate the problem's items to its plants.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] on configuration errors, non-representable coefficients or a
    /// violated internal invariant. Solver non-success is reported on the plan's status.
    pub fn allocate(&self, problem: &AllocationProblem) -> Result<AllocationPlan, SolverError> {
        self.allocate_with_observer(problem, &mut NoopObserver)
    }

    /// Allocate while notifying `observer` of the model formulation.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] on configuration errors, non-representable coefficients or a
    /// violated internal invariant.
    pub fn allocate_with_observer(
        &self,
        problem: &AllocationProblem,
        observer: &mut dyn ILPObserver,
    ) -> Result<AllocationPlan, SolverError> {
        let span = info_span!(
            "allocate",
            items = problem.items().len(),
            plants = problem.plants().len()
        );
        let _guard = span.enter();

        let classified = ClassifiedItems::classify(problem.items(), problem.plants());
        let groups = ModelGroup::collect(problem.items(), problem.plants(), classified.eligible());
        let specs = problem.objective_specs()?;

        let bounds = objective_bounds(
            &specs,
            problem.items(),
            classified.eligible(),
            total_capacity(problem.plants()),
            problem.scaling().ub_epsilon,
        );

        let coefficients =
            ObjectiveCoefficients::compute(problem, &specs, &bounds, &classified, &groups)?;

        let (outcome, vars) = if classified.is_empty() {
            debug!("no eligible items, skipping solve");

            (
                SolverOutcome::without_solution(SolveStatus::NotSolved, Duration::ZERO),
                None,
            )
        } else {
            let model = build_model(problem, &classified, &groups, &coefficients, observer)?;
            let outcome = self.backend.solve(model.state, &self.options)?;

            (outcome, Some(model.vars))
        };

        let plan = decode(
            problem,
            &DecodeInput {
                classified: &classified,
                groups: &groups,
                specs: &specs,
                coefficients: &coefficients,
                vars: vars.as_ref(),
                outcome: &outcome,
            },
        )?;

        info!(
            status = %plan.status,
            allocated = plan.summary.allocated_count,
            unallocated = plan.summary.unallocated_count,
            skipped = plan.summary.skipped_count,
            zero_quantity = plan.summary.zero_quantity_items_count,
            "allocation finished"
        );

        Ok(plan)
    }
}
