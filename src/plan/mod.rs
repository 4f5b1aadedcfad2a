//! Allocation Plan
//!
//! Decodes a solver outcome into one decision per input item plus per-plant, per-model and
//! objective diagnostics. Decoding enforces the reconciliation invariant: allocated, unallocated,
//! skipped and zero-quantity items partition the input exactly.

use std::{collections::BTreeMap, time::Duration};

use num_traits::ToPrimitive;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    classify::{Classification, ClassifiedItems, SkipReason},
    items::{Item, groups::ModelGroup, total_quantity},
    objectives::{DUE_DATE_OBJECTIVE, ObjectiveSpec, QUANTITY_OBJECTIVE, Sense},
    plants::{Plant, total_capacity},
    problem::AllocationProblem,
    solvers::{
        SolveStatus, SolverError, SolverOutcome,
        ilp::{
            BINARY_THRESHOLD, ModelVars,
            objective::{ObjectiveCoefficients, StructuralCoefficient},
        },
    },
    urgency::UrgencyProfile,
};

pub mod report;

/// Why an eligible item was not placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnallocatedReason {
    /// Lost the competition for capacity
    InsufficientCapacity,

    /// The solver returned no usable solution
    NoSolution,
}

impl UnallocatedReason {
    /// Reason code
    pub fn as_str(self) -> &'static str {
        match self {
            UnallocatedReason::InsufficientCapacity => "insufficient_capacity",
            UnallocatedReason::NoSolution => "no_solution",
        }
    }
}

/// Terminal status of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Placed at the named plant
    Allocated {
        /// Plant name
        plant: String,
    },

    /// Modelled but not placed
    Unallocated {
        /// Reason code
        reason: UnallocatedReason,
    },

    /// Never modelled
    Skipped {
        /// Reason code
        reason: SkipReason,
    },

    /// Quantity is zero
    ZeroQuantity,
}

/// Decision for one input item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDecision {
    /// Item name
    pub item: String,

    /// Owning order
    pub order: String,

    /// Model key
    pub model: String,

    /// Submodel, if any
    pub submodel: Option<String>,

    /// Quantity
    pub quantity: u64,

    /// Terminal status
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl AllocationDecision {
    /// Plant the item was allocated to, if any.
    pub fn plant(&self) -> Option<&str> {
        match &self.status {
            ItemStatus::Allocated { plant } => Some(plant),
            _ => None,
        }
    }
}

/// Load of one plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSummary {
    /// Plant name
    pub name: String,

    /// Capacity
    pub capacity: u64,

    /// Quantity placed
    pub used_capacity: u64,

    /// Capacity left over
    pub unused_capacity: u64,

    /// `used / capacity × 100`
    pub utilization_pct: f64,

    /// Items placed, in item order
    pub items: Vec<String>,

    /// Models present, in first-placed order
    pub models: Vec<String>,
}

/// Placement of one model group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model key
    pub model: String,

    /// Eligible items of the model
    pub items: usize,

    /// Eligible demand of the model
    pub demand: u64,

    /// Items placed
    pub items_placed: usize,

    /// Quantity placed
    pub quantity_placed: u64,

    /// Plants allowed to produce the model
    pub compatible_plants: Vec<String>,

    /// Plants the model was placed at
    pub plants: Vec<String>,
}

/// Aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    /// Number of plants
    pub plants_count: usize,

    /// Number of distinct orders
    pub orders_count: usize,

    /// Number of input items
    pub items_count: usize,

    /// Number of distinct models across all items
    pub unique_models_count: usize,

    /// Sum of plant capacities
    pub total_capacity: u64,

    /// Sum of all item quantities
    pub total_demand: u64,

    /// `total_capacity − total_demand`
    pub capacity_minus_demand: i64,

    /// Sum of eligible item quantities
    pub eligible_demand: u64,

    /// Items skipped
    pub skipped_count: usize,

    /// Quantity of skipped items
    pub skipped_demand: u64,

    /// Items with zero quantity
    pub zero_quantity_items_count: usize,

    /// Items allocated
    pub allocated_count: usize,

    /// Items modelled but not allocated
    pub unallocated_count: usize,

    /// Quantity allocated
    pub total_allocated_quantity: u64,

    /// Quantity of unallocated items
    pub unallocated_demand: u64,

    /// `total_allocated_quantity / total_demand` (0 when there is no demand)
    pub allocated_ratio: f64,

    /// Plants holding at least one item
    pub plants_used: usize,

    /// Σ over models of plants used beyond the first
    pub extra_plants: usize,
}

/// Achieved value of one additive objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveReport {
    /// Objective name
    pub name: String,

    /// Optimisation direction
    pub sense: Sense,

    /// Weight
    pub weight: f64,

    /// Knapsack upper bound
    pub upper_bound: f64,

    /// Whether the objective took part
    pub used: bool,

    /// Signed integer coefficient
    pub coefficient: i64,

    /// Sum of values over allocated items
    pub achieved: i64,

    /// `achieved / upper_bound` (0 when unused)
    pub normalized: f64,

    /// `coefficient × achieved`
    pub contribution: i64,
}

/// Achieved value of one structural penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralReport {
    /// Weight
    pub weight: f64,

    /// Normalizer
    pub normalizer: u64,

    /// Penalty per unit
    pub coefficient: i64,

    /// Penalised count in the solution
    pub achieved: u64,

    /// `−coefficient × achieved`
    pub contribution: i64,
}

/// Soft-minimum shortfall of one model at one plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortfallRow {
    /// Model key
    pub model: String,

    /// Plant name
    pub plant: String,

    /// Quantity of the model placed at the plant
    pub placed_quantity: u64,

    /// Value of the solver's shortfall variable
    pub shortfall: u64,

    /// `max(0, threshold − placed_quantity)` when anything is placed
    pub implied_shortfall: u64,
}

/// Soft-minimum diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftMinReport {
    /// Threshold
    pub threshold: u64,

    /// Penalty term
    pub penalty: StructuralReport,

    /// Shortfall per (model, plant) pair with placed quantity or solver shortfall
    pub pairs: Vec<ShortfallRow>,
}

/// Built-in objective components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveComponents {
    /// Allocated quantity
    pub quantity_component: i64,

    /// Sum of allocated due-date values
    pub due_component: i64,

    /// Quantity weight at the configured precision
    pub int_w_quantity: i64,

    /// Due-date weight at the configured precision
    pub int_w_due: i64,

    /// Urgency scale
    pub scale: u32,

    /// Weight precision
    pub weight_precision: u32,
}

/// Objective value, bound and gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveBoundMetrics {
    /// Objective value of the solution
    pub objective_value: f64,

    /// Best proven bound
    pub best_objective_bound: f64,

    /// `max(0, bound − value)`
    pub gap_abs: f64,

    /// `gap_abs / max(1, |value|)`
    pub gap_rel: f64,
}

impl ObjectiveBoundMetrics {
    /// Metrics of a maximisation with the given value and bound.
    pub fn new(objective_value: f64, best_objective_bound: f64) -> Self {
        let gap_abs = (best_objective_bound - objective_value).max(0.0);
        let gap_rel = gap_abs / objective_value.abs().max(1.0);

        Self {
            objective_value,
            best_objective_bound,
            gap_abs,
            gap_rel,
        }
    }
}

/// Objective breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveReport {
    /// Global scale `K`
    pub scale: i64,

    /// Objective value, when a solution exists
    pub objective_value: Option<f64>,

    /// Bound and gap, when a bound is known
    pub bound: Option<ObjectiveBoundMetrics>,

    /// Additive objectives, in input order
    pub additive: Vec<AdditiveReport>,

    /// Group-split penalty; `achieved` is the number of extra plants
    pub group: StructuralReport,

    /// Plants-used penalty; `achieved` is the number of plants used
    pub plants: StructuralReport,

    /// Soft-minimum diagnostics, when the soft minimum is active
    pub soft_min: Option<SoftMinReport>,

    /// Built-in components
    pub components: ObjectiveComponents,
}

/// Result of one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Solve status
    pub status: SolveStatus,

    /// Wall-clock solve time
    pub elapsed: Duration,

    /// One decision per input item, in input order
    pub decisions: Vec<AllocationDecision>,

    /// Per-plant load, in plant order
    pub plants: Vec<PlantSummary>,

    /// Per-model placement, in first-seen model order
    pub models: Vec<ModelSummary>,

    /// Skipped item names keyed by model
    pub skipped_by_model: BTreeMap<String, Vec<String>>,

    /// Aggregate counts
    pub summary: AllocationSummary,

    /// Objective breakdown
    pub objective: ObjectiveReport,

    /// Urgency diagnostics
    pub urgency: UrgencyProfile,
}

impl AllocationPlan {
    /// Decision for the named item.
    pub fn decision(&self, item: &str) -> Option<&AllocationDecision> {
        self.decisions.iter().find(|decision| decision.item == item)
    }

    /// Allocated decisions
    pub fn allocated(&self) -> impl Iterator<Item = &AllocationDecision> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.status, ItemStatus::Allocated { .. }))
    }

    /// Unallocated decisions
    pub fn unallocated(&self) -> impl Iterator<Item = &AllocationDecision> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.status, ItemStatus::Unallocated { .. }))
    }

    /// Skipped decisions
    pub fn skipped(&self) -> impl Iterator<Item = &AllocationDecision> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.status, ItemStatus::Skipped { .. }))
    }

    /// Zero-quantity decisions
    pub fn zero_quantity(&self) -> impl Iterator<Item = &AllocationDecision> {
        self.decisions
            .iter()
            .filter(|d| matches!(d.status, ItemStatus::ZeroQuantity))
    }

    /// Serialise the plan as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Everything the decoder needs besides the problem itself.
#[derive(Debug)]
pub(crate) struct DecodeInput<'a> {
    pub(crate) classified: &'a ClassifiedItems,
    pub(crate) groups: &'a [ModelGroup],
    pub(crate) specs: &'a [ObjectiveSpec],
    pub(crate) coefficients: &'a ObjectiveCoefficients,
    pub(crate) vars: Option<&'a ModelVars>,
    pub(crate) outcome: &'a SolverOutcome,
}

/// Decode a solver outcome into an [`AllocationPlan`].
///
/// # Errors
///
/// Returns [`SolverError::InvariantViolation`] if the solution assigns an item twice, exceeds
/// a plant's capacity, or the decisions do not reconcile with the input.
pub(crate) fn decode(
    problem: &AllocationProblem,
    input: &DecodeInput<'_>,
) -> Result<AllocationPlan, SolverError> {
    let items = problem.items();
    let plants = problem.plants();
    let solve_status = input.outcome.status;

    let placements = extract_placements(items.len(), input.vars, input.outcome)?;

    let decisions: Vec<AllocationDecision> = items
        .iter()
        .enumerate()
        .map(|(item_idx, item)| {
            let status = match input.classified.class(item_idx) {
                Some(Classification::ZeroQuantity) => ItemStatus::ZeroQuantity,
                Some(Classification::Skipped(reason)) => ItemStatus::Skipped { reason },
                Some(Classification::Eligible) | None => {
                    match placements.get(item_idx).copied().flatten() {
                        Some(plant_idx) => ItemStatus::Allocated {
                            plant: plants
                                .get(plant_idx)
                                .map(|plant| plant.name().to_string())
                                .unwrap_or_default(),
                        },
                        None if solve_status.has_solution()
                            || solve_status == SolveStatus::NotSolved =>
                        {
                            ItemStatus::Unallocated {
                                reason: UnallocatedReason::InsufficientCapacity,
                            }
                        }
                        None => ItemStatus::Unallocated {
                            reason: UnallocatedReason::NoSolution,
                        },
                    }
                }
            };

            AllocationDecision {
                item: item.name().to_string(),
                order: item.order().to_string(),
                model: item.model().to_string(),
                submodel: item.submodel().map(str::to_string),
                quantity: item.quantity(),
                status,
            }
        })
        .collect();

    let plant_summaries = summarize_plants(items, plants, &placements)?;
    let models = summarize_models(items, plants, input.groups, &placements);
    let skipped_by_model = skipped_by_model(items, &decisions);
    let summary = summarize(problem, &decisions, &plant_summaries, &models);

    reconcile(&summary)?;

    let objective = objective_report(problem, input, &placements, &summary)?;

    Ok(AllocationPlan {
        status: solve_status,
        elapsed: input.outcome.elapsed,
        decisions,
        plants: plant_summaries,
        models,
        skipped_by_model,
        summary,
        objective,
        urgency: problem.urgency().clone(),
    })
}

/// Chosen plant per item index.
fn extract_placements(
    item_count: usize,
    vars: Option<&ModelVars>,
    outcome: &SolverOutcome,
) -> Result<Vec<Option<usize>>, SolverError> {
    let mut placements = vec![None; item_count];

    let Some(vars) = vars.filter(|_| outcome.status.has_solution()) else {
        return Ok(placements);
    };

    for item in &vars.items {
        let chosen: SmallVec<[usize; 2]> = item
            .assign
            .iter()
            .filter(|&&(_, var)| outcome.value(var) > BINARY_THRESHOLD)
            .map(|&(plant_idx, _)| plant_idx)
            .collect();

        if chosen.len() > 1 {
            return Err(SolverError::InvariantViolation {
                message: "item assigned to more than one plant",
            });
        }

        let placed = outcome.value(item.placed) > BINARY_THRESHOLD;

        if placed != !chosen.is_empty() {
            return Err(SolverError::InvariantViolation {
                message: "placement flag disagrees with plant assignments",
            });
        }

        if let Some(slot) = placements.get_mut(item.item_idx) {
            *slot = chosen.first().copied();
        }
    }

    Ok(placements)
}

fn summarize_plants(
    items: &[Item],
    plants: &[Plant],
    placements: &[Option<usize>],
) -> Result<Vec<PlantSummary>, SolverError> {
    plants
        .iter()
        .enumerate()
        .map(|(plant_idx, plant)| {
            let mut used_capacity: u64 = 0;
            let mut placed_items = Vec::new();
            let mut models: Vec<String> = Vec::new();

            for (item, _) in items
                .iter()
                .zip(placements)
                .filter(|(_, placement)| **placement == Some(plant_idx))
            {
                used_capacity = used_capacity.saturating_add(item.quantity());
                placed_items.push(item.name().to_string());

                if !models.iter().any(|model| model == item.model()) {
                    models.push(item.model().to_string());
                }
            }

            if used_capacity > plant.capacity() {
                return Err(SolverError::InvariantViolation {
                    message: "plant capacity exceeded",
                });
            }

            Ok(PlantSummary {
                name: plant.name().to_string(),
                capacity: plant.capacity(),
                used_capacity,
                unused_capacity: plant.capacity().saturating_sub(used_capacity),
                utilization_pct: percentage(used_capacity, plant.capacity()),
                items: placed_items,
                models,
            })
        })
        .collect()
}

fn summarize_models(
    items: &[Item],
    plants: &[Plant],
    groups: &[ModelGroup],
    placements: &[Option<usize>],
) -> Vec<ModelSummary> {
    groups
        .iter()
        .map(|group| {
            let mut items_placed = 0;
            let mut quantity_placed: u64 = 0;
            let mut demand: u64 = 0;
            let mut placed_at: SmallVec<[usize; 4]> = SmallVec::new();

            for &item_idx in group.items() {
                let quantity = items.get(item_idx).map_or(0, Item::quantity);
                demand = demand.saturating_add(quantity);

                if let Some(plant_idx) = placements.get(item_idx).copied().flatten() {
                    items_placed += 1;
                    quantity_placed = quantity_placed.saturating_add(quantity);

                    if !placed_at.contains(&plant_idx) {
                        placed_at.push(plant_idx);
                    }
                }
            }

            placed_at.sort_unstable();

            ModelSummary {
                model: group.model().to_string(),
                items: group.items().len(),
                demand,
                items_placed,
                quantity_placed,
                compatible_plants: plant_names(plants, group.plants()),
                plants: plant_names(plants, &placed_at),
            }
        })
        .collect()
}

fn skipped_by_model(
    items: &[Item],
    decisions: &[AllocationDecision],
) -> BTreeMap<String, Vec<String>> {
    let mut skipped: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (item, decision) in items.iter().zip(decisions) {
        if matches!(decision.status, ItemStatus::Skipped { .. }) {
            skipped
                .entry(item.model().to_string())
                .or_default()
                .push(item.name().to_string());
        }
    }

    skipped
}

fn summarize(
    problem: &AllocationProblem,
    decisions: &[AllocationDecision],
    plant_summaries: &[PlantSummary],
    models: &[ModelSummary],
) -> AllocationSummary {
    let items = problem.items();

    let total_capacity = total_capacity(problem.plants());
    let total_demand = total_quantity(items);

    let mut summary = AllocationSummary {
        plants_count: problem.plants().len(),
        orders_count: problem.orders_count(),
        items_count: items.len(),
        unique_models_count: items.iter().map(Item::model).collect::<FxHashSet<_>>().len(),
        total_capacity,
        total_demand,
        capacity_minus_demand: to_i64(total_capacity).saturating_sub(to_i64(total_demand)),
        eligible_demand: 0,
        skipped_count: 0,
        skipped_demand: 0,
        zero_quantity_items_count: 0,
        allocated_count: 0,
        unallocated_count: 0,
        total_allocated_quantity: 0,
        unallocated_demand: 0,
        allocated_ratio: 0.0,
        plants_used: plant_summaries.iter().filter(|p| !p.items.is_empty()).count(),
        extra_plants: models
            .iter()
            .map(|model| model.plants.len().saturating_sub(1))
            .sum(),
    };

    for decision in decisions {
        match decision.status {
            ItemStatus::Allocated { .. } => {
                summary.allocated_count += 1;
                summary.total_allocated_quantity =
                    summary.total_allocated_quantity.saturating_add(decision.quantity);
                summary.eligible_demand = summary.eligible_demand.saturating_add(decision.quantity);
            }
            ItemStatus::Unallocated { .. } => {
                summary.unallocated_count += 1;
                summary.unallocated_demand =
                    summary.unallocated_demand.saturating_add(decision.quantity);
                summary.eligible_demand = summary.eligible_demand.saturating_add(decision.quantity);
            }
            ItemStatus::Skipped { .. } => {
                summary.skipped_count += 1;
                summary.skipped_demand = summary.skipped_demand.saturating_add(decision.quantity);
            }
            ItemStatus::ZeroQuantity => summary.zero_quantity_items_count += 1,
        }
    }

    summary.allocated_ratio = ratio(summary.total_allocated_quantity, total_demand);

    summary
}

fn reconcile(summary: &AllocationSummary) -> Result<(), SolverError> {
    let accounted = summary.allocated_count
        + summary.unallocated_count
        + summary.skipped_count
        + summary.zero_quantity_items_count;

    if accounted != summary.items_count {
        return Err(SolverError::InvariantViolation {
            message: "item decisions do not reconcile with the input",
        });
    }

    if summary.total_allocated_quantity > summary.total_capacity
        || summary.total_allocated_quantity > summary.eligible_demand
    {
        return Err(SolverError::InvariantViolation {
            message: "allocated quantity exceeds capacity or eligible demand",
        });
    }

    Ok(())
}

fn objective_report(
    problem: &AllocationProblem,
    input: &DecodeInput<'_>,
    placements: &[Option<usize>],
    summary: &AllocationSummary,
) -> Result<ObjectiveReport, SolverError> {
    let coefficients = input.coefficients;
    let weights = problem.weights();

    let allocated: SmallVec<[usize; 16]> = placements
        .iter()
        .enumerate()
        .filter_map(|(item_idx, placement)| placement.map(|_| item_idx))
        .collect();

    let additive: Vec<AdditiveReport> = input
        .specs
        .iter()
        .zip(&coefficients.additive)
        .map(|(spec, term)| {
            let achieved = allocated
                .iter()
                .filter_map(|&item_idx| spec.values.get(item_idx))
                .fold(0_i64, |acc, value| acc.saturating_add(*value));

            let normalized = if term.used && term.upper_bound > 0.0 {
                achieved.to_f64().unwrap_or(0.0) / term.upper_bound
            } else {
                0.0
            };

            AdditiveReport {
                name: term.name.clone(),
                sense: term.sense,
                weight: term.weight,
                upper_bound: term.upper_bound,
                used: term.used,
                coefficient: term.coefficient,
                achieved,
                normalized,
                contribution: term.coefficient.saturating_mul(achieved),
            }
        })
        .collect();

    let achieved_of = |name: &str| {
        additive
            .iter()
            .find(|report| report.name == name)
            .map_or(0, |report| report.achieved)
    };

    let components = ObjectiveComponents {
        quantity_component: achieved_of(QUANTITY_OBJECTIVE),
        due_component: achieved_of(DUE_DATE_OBJECTIVE),
        int_w_quantity: weights.int_w_quantity()?,
        int_w_due: weights.int_w_due()?,
        scale: weights.scale,
        weight_precision: weights.weight_precision,
    };

    let soft_min = if weights.soft_min_enabled() {
        Some(soft_min_report(problem, input, placements)?)
    } else {
        None
    };

    let objective_value = input.outcome.objective_value;
    let best_bound = input.outcome.best_bound.or_else(|| {
        (input.outcome.status == SolveStatus::Optimal)
            .then_some(objective_value)
            .flatten()
    });

    let bound = objective_value
        .zip(best_bound)
        .map(|(value, bound)| ObjectiveBoundMetrics::new(value, bound));

    Ok(ObjectiveReport {
        scale: coefficients.scale,
        objective_value,
        bound,
        additive,
        group: structural_report(
            &coefficients.group,
            u64::try_from(summary.extra_plants).unwrap_or(u64::MAX),
        ),
        plants: structural_report(
            &coefficients.plants,
            u64::try_from(summary.plants_used).unwrap_or(u64::MAX),
        ),
        soft_min,
        components,
    })
}

/// Penalised shortfall is read from the solver's variables. It can exceed the implied
/// shortfall when the solution is not optimal but never fall below it.
fn soft_min_report(
    problem: &AllocationProblem,
    input: &DecodeInput<'_>,
    placements: &[Option<usize>],
) -> Result<SoftMinReport, SolverError> {
    let threshold = problem.weights().soft_min_qty;
    let items = problem.items();
    let outcome = input.outcome;
    let mut pairs = Vec::new();

    for (group_idx, group) in input.groups.iter().enumerate() {
        let shortfall_vars = input
            .vars
            .and_then(|vars| vars.groups.iter().find(|g| g.group_idx == group_idx))
            .map(|g| g.shortfall.as_slice())
            .unwrap_or_default();

        for &plant_idx in group.plants() {
            let placed_quantity = group
                .items()
                .iter()
                .filter(|&&item_idx| placements.get(item_idx).copied().flatten() == Some(plant_idx))
                .filter_map(|&item_idx| items.get(item_idx))
                .fold(0_u64, |acc, item| acc.saturating_add(item.quantity()));

            let implied_shortfall = if placed_quantity == 0 {
                0
            } else {
                threshold.saturating_sub(placed_quantity)
            };

            let shortfall = if outcome.status.has_solution() {
                shortfall_vars
                    .iter()
                    .find(|&&(idx, _)| idx == plant_idx)
                    .map_or(0, |&(_, var)| {
                        outcome.value(var).max(0.0).round().to_u64().unwrap_or(0)
                    })
            } else {
                implied_shortfall
            };

            if shortfall < implied_shortfall {
                return Err(SolverError::InvariantViolation {
                    message: "soft-minimum shortfall below the placed quantity's gap",
                });
            }

            if placed_quantity == 0 && shortfall == 0 {
                continue;
            }

            pairs.push(ShortfallRow {
                model: group.model().to_string(),
                plant: problem
                    .plants()
                    .get(plant_idx)
                    .map(|plant| plant.name().to_string())
                    .unwrap_or_default(),
                placed_quantity,
                shortfall,
                implied_shortfall,
            });
        }
    }

    let total_shortfall = pairs
        .iter()
        .fold(0_u64, |acc, row| acc.saturating_add(row.shortfall));

    Ok(SoftMinReport {
        threshold,
        penalty: structural_report(&input.coefficients.soft_min, total_shortfall),
        pairs,
    })
}

fn structural_report(
    term: &StructuralCoefficient,
    achieved: u64,
) -> StructuralReport {
    StructuralReport {
        weight: term.weight,
        normalizer: term.normalizer,
        coefficient: term.coefficient,
        achieved,
        contribution: term.coefficient.saturating_mul(to_i64(achieved)).saturating_neg(),
    }
}

fn plant_names(plants: &[Plant], indexes: &[usize]) -> Vec<String> {
    indexes
        .iter()
        .filter_map(|&plant_idx| plants.get(plant_idx))
        .map(|plant| plant.name().to_string())
        .collect()
}

fn percentage(part: u64, whole: u64) -> f64 {
    ratio(part, whole) * 100.0
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    part.to_f64().unwrap_or(0.0) / whole.to_f64().unwrap_or(1.0)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
