//! Plant allocation prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocator::Allocator,
    classify::{Classification, ClassifiedItems, SkipReason},
    fixtures::{Fixture, FixtureError},
    items::{Item, groups::ModelGroup},
    objectives::{ObjectiveSpec, Sense},
    orders::{Order, OrderLine},
    plan::{
        AllocationDecision, AllocationPlan, AllocationSummary, ItemStatus, UnallocatedReason,
        report::{ReportError, write_markdown},
    },
    plants::Plant,
    problem::{AllocationProblem, ProblemError},
    solvers::{
        GoodLpBackend, SolveOptions, SolveStatus, SolverBackend, SolverError, SolverOutcome,
        ilp::{FormulationStats, ILPObserver, NoopObserver},
    },
    weights::{ScalingConfig, WeightsConfig},
};
