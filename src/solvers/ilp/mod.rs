//! ILP Model
//!
//! Formulates the allocation as a binary program over the eligible items:
//!
//! - `assign[i, p]` for every compatible (item, plant) pair only, so compatibility holds by
//!   construction
//! - `placed[i] = Σ_p assign[i, p]`, with an explicit at-most-one row when an item has several
//!   compatible plants
//! - `present[g, p]` linked both ways to the assignments of group `g` at plant `p`
//! - `used[g]` and `plant_used[p]` linked both ways to presence and assignments
//! - capacity rows per plant, and optional hard and soft minimum lot rows per (group, plant)
//!
//! Every item may always stay unplaced, so the model is feasible by construction.

use good_lp::{Expression, SolverModel, Variable, variable};
use num_traits::ToPrimitive;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    classify::ClassifiedItems,
    items::{Item, groups::ModelGroup},
    problem::AllocationProblem,
    solvers::{
        SolverError,
        ilp::{
            objective::ObjectiveCoefficients,
            observer::{ConstraintKind, VariableKind},
            state::{ConstraintRelation, ILPConstraint},
        },
    },
};

pub mod objective;
pub mod observer;
pub mod state;

pub use observer::{FormulationStats, ILPObserver, NoopObserver};
pub use state::ILPState;

/// Binary threshold for determining truthiness
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Decision variables of one eligible item.
#[derive(Debug, Clone)]
pub struct ItemVars {
    /// Item index in the problem
    pub item_idx: usize,

    /// `placed[i]`
    pub placed: Variable,

    /// `(plant index, assign[i, p])` for every compatible plant
    pub assign: SmallVec<[(usize, Variable); 4]>,
}

impl ItemVars {
    /// Assignment variable at the given plant, if the pair is compatible.
    pub fn assign_at(&self, plant_idx: usize) -> Option<Variable> {
        self.assign
            .iter()
            .find(|(p, _)| *p == plant_idx)
            .map(|&(_, var)| var)
    }
}

/// Decision variables of one model group.
#[derive(Debug, Clone)]
pub struct GroupVars {
    /// Group index
    pub group_idx: usize,

    /// `used[g]`
    pub used: Variable,

    /// `(plant index, present[g, p])`
    pub present: SmallVec<[(usize, Variable); 4]>,

    /// `(plant index, shortfall[g, p])`, empty unless the soft minimum is active
    pub shortfall: SmallVec<[(usize, Variable); 4]>,
}

/// Every decision variable of the model.
#[derive(Debug, Clone, Default)]
pub struct ModelVars {
    /// Per eligible item, in eligible order
    pub items: Vec<ItemVars>,

    /// Per model group, in group order
    pub groups: Vec<GroupVars>,

    /// `(plant index, plant_used[p])` for plants with at least one candidate item
    pub plants: Vec<(usize, Variable)>,
}

/// A formulated allocation model ready for a backend.
#[derive(Debug)]
pub struct AllocationModel {
    /// Recorded variables, objective and constraints
    pub state: ILPState,

    /// Handles to the decision variables
    pub vars: ModelVars,
}

/// Formulate the allocation model.
///
/// # Errors
///
/// Returns a [`SolverError`] if a quantity, capacity or coefficient cannot be represented
/// exactly as a solver coefficient.
pub fn build_model<O: ILPObserver + ?Sized>(
    problem: &AllocationProblem,
    classified: &ClassifiedItems,
    groups: &[ModelGroup],
    coefficients: &ObjectiveCoefficients,
    observer: &mut O,
) -> Result<AllocationModel, SolverError> {
    let mut builder = ModelBuilder {
        state: ILPState::new(),
        observer,
    };

    let items = builder.add_item_variables(classified)?;
    let mut vars = ModelVars {
        items,
        groups: Vec::with_capacity(groups.len()),
        plants: Vec::new(),
    };

    builder.add_group_rules(problem, groups, &mut vars)?;
    builder.add_plant_rules(problem, &mut vars)?;

    let ModelBuilder { mut state, observer } = builder;

    coefficients.apply(&mut state, &vars, observer)?;

    debug!(
        variables = state.variables().len(),
        constraints = state.constraints().len(),
        items = vars.items.len(),
        groups = vars.groups.len(),
        plants = vars.plants.len(),
        "formulated allocation model"
    );

    Ok(AllocationModel { state, vars })
}

struct ModelBuilder<'o, O: ILPObserver + ?Sized> {
    state: ILPState,
    observer: &'o mut O,
}

impl<O: ILPObserver + ?Sized> ModelBuilder<'_, O> {
    fn constrain(
        &mut self,
        kind: ConstraintKind,
        lhs: Expression,
        relation: ConstraintRelation,
        rhs: f64,
    ) {
        self.observer.on_constraint(kind, &lhs, relation, rhs);
        self.state.add_constraint(lhs, relation, rhs);
    }

    fn binary(&mut self) -> Variable {
        self.state.add_variable(variable().binary())
    }

    fn add_item_variables(
        &mut self,
        classified: &ClassifiedItems,
    ) -> Result<Vec<ItemVars>, SolverError> {
        let mut items = Vec::with_capacity(classified.eligible().len());

        for &item_idx in classified.eligible() {
            let placed = self.binary();
            self.observer.on_placed_variable(item_idx, placed);

            let assign: SmallVec<[(usize, Variable); 4]> = classified
                .compatible_plants(item_idx)
                .iter()
                .map(|&plant_idx| {
                    let var = self.binary();
                    self.observer.on_assign_variable(item_idx, plant_idx, var);

                    (plant_idx, var)
                })
                .collect();

            // Σ_p assign[i, p] − placed[i] = 0
            let mut placement: Expression = assign.iter().map(|&(_, var)| var).sum();
            placement -= placed;
            self.constrain(ConstraintKind::Placement, placement, ConstraintRelation::Eq, 0.0);

            if assign.len() > 1 {
                let at_most_one: Expression = assign.iter().map(|&(_, var)| var).sum();
                self.constrain(
                    ConstraintKind::AtMostOne,
                    at_most_one,
                    ConstraintRelation::Leq,
                    1.0,
                );
            }

            items.push(ItemVars {
                item_idx,
                placed,
                assign,
            });
        }

        ensure_item_vars_len(items.len(), classified.eligible().len())?;

        Ok(items)
    }

    fn add_group_rules(
        &mut self,
        problem: &AllocationProblem,
        groups: &[ModelGroup],
        vars: &mut ModelVars,
    ) -> Result<(), SolverError> {
        let weights = problem.weights();
        let hard_min = u64_to_f64_exact(weights.hard_min_qty)?;
        let soft_min = u64_to_f64_exact(weights.soft_min_qty)?;

        let position: FxHashMap<usize, usize> = vars
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.item_idx, pos))
            .collect();

        for (group_idx, group) in groups.iter().enumerate() {
            let used = self.binary();
            self.observer
                .on_structural_variable(VariableKind::GroupUsed, group_idx, used);

            let mut present_vars: SmallVec<[(usize, Variable); 4]> = SmallVec::new();
            let mut shortfall_vars: SmallVec<[(usize, Variable); 4]> = SmallVec::new();

            for &plant_idx in group.plants() {
                // (assign var, quantity) of every group member compatible with this plant.
                let mut members: SmallVec<[(Variable, f64); 8]> = SmallVec::new();

                for item_idx in group.items() {
                    let Some(item_vars) = position.get(item_idx).and_then(|&pos| vars.items.get(pos))
                    else {
                        return Err(SolverError::InvariantViolation {
                            message: "model group references an item without variables",
                        });
                    };

                    if let Some(var) = item_vars.assign_at(plant_idx) {
                        members.push((var, quantity_of(problem, *item_idx)?));
                    }
                }

                if members.is_empty() {
                    continue;
                }

                let present = self.binary();
                self.observer
                    .on_presence_variable(group_idx, plant_idx, present);

                // assign[i, p] ≤ present[g, p]
                for &(var, _) in &members {
                    self.constrain(
                        ConstraintKind::Presence,
                        Expression::from(var) - present,
                        ConstraintRelation::Leq,
                        0.0,
                    );
                }

                // Σ_i assign[i, p] ≥ present[g, p]
                let mut any: Expression = members.iter().map(|&(var, _)| var).sum();
                any -= present;
                self.constrain(ConstraintKind::Presence, any, ConstraintRelation::Geq, 0.0);

                // present[g, p] ≤ used[g]
                self.constrain(
                    ConstraintKind::GroupUsage,
                    Expression::from(present) - used,
                    ConstraintRelation::Leq,
                    0.0,
                );

                let placed_quantity = members
                    .iter()
                    .fold(Expression::default(), |mut acc, &(var, quantity)| {
                        acc += var * quantity;
                        acc
                    });

                if weights.hard_min_enabled() {
                    // Σ q·assign ≥ hard_min · present
                    let mut lhs = placed_quantity.clone();
                    lhs -= present * hard_min;
                    self.constrain(ConstraintKind::HardMinimum, lhs, ConstraintRelation::Geq, 0.0);
                }

                if weights.soft_min_enabled() {
                    let shortfall = self.state.add_variable(
                        variable().integer().min(0.0).max(soft_min),
                    );
                    self.observer
                        .on_structural_variable(VariableKind::Shortfall, group_idx, shortfall);

                    // shortfall ≥ soft_min · present − Σ q·assign
                    let mut lhs = placed_quantity;
                    lhs += shortfall;
                    lhs -= present * soft_min;
                    self.constrain(ConstraintKind::SoftMinimum, lhs, ConstraintRelation::Geq, 0.0);

                    shortfall_vars.push((plant_idx, shortfall));
                }

                present_vars.push((plant_idx, present));
            }

            // Σ_p present[g, p] ≥ used[g]
            let mut anywhere: Expression = present_vars.iter().map(|&(_, var)| var).sum();
            anywhere -= used;
            self.constrain(ConstraintKind::GroupUsage, anywhere, ConstraintRelation::Geq, 0.0);

            vars.groups.push(GroupVars {
                group_idx,
                used,
                present: present_vars,
                shortfall: shortfall_vars,
            });
        }

        Ok(())
    }

    fn add_plant_rules(
        &mut self,
        problem: &AllocationProblem,
        vars: &mut ModelVars,
    ) -> Result<(), SolverError> {
        for (plant_idx, plant) in problem.plants().iter().enumerate() {
            let mut candidates: SmallVec<[(Variable, f64); 8]> = SmallVec::new();

            for item in &vars.items {
                if let Some(var) = item.assign_at(plant_idx) {
                    candidates.push((var, quantity_of(problem, item.item_idx)?));
                }
            }

            if candidates.is_empty() {
                continue;
            }

            let plant_used = self.binary();
            self.observer
                .on_structural_variable(VariableKind::PlantUsed, plant_idx, plant_used);

            for &(var, _) in &candidates {
                self.constrain(
                    ConstraintKind::PlantUsage,
                    Expression::from(var) - plant_used,
                    ConstraintRelation::Leq,
                    0.0,
                );
            }

            let mut any: Expression = candidates.iter().map(|&(var, _)| var).sum();
            any -= plant_used;
            self.constrain(ConstraintKind::PlantUsage, any, ConstraintRelation::Geq, 0.0);

            // Σ q·assign[i, p] ≤ capacity(p)
            let load = candidates
                .iter()
                .fold(Expression::default(), |mut acc, &(var, quantity)| {
                    acc += var * quantity;
                    acc
                });
            let capacity = u64_to_f64_exact(plant.capacity())?;
            self.constrain(ConstraintKind::Capacity, load, ConstraintRelation::Leq, capacity);

            vars.plants.push((plant_idx, plant_used));
        }

        Ok(())
    }
}

/// Apply recorded constraints to a solver model.
pub(crate) fn apply_recorded_constraints<S: SolverModel>(
    mut model: S,
    constraints: Vec<ILPConstraint>,
) -> S {
    for constraint in constraints {
        model = match constraint.relation {
            ConstraintRelation::Eq => model.with(constraint.lhs.eq(constraint.rhs)),
            ConstraintRelation::Leq => model.with(constraint.lhs.leq(constraint.rhs)),
            ConstraintRelation::Geq => model.with(constraint.lhs.geq(constraint.rhs)),
        };
    }

    model
}

fn quantity_of(problem: &AllocationProblem, item_idx: usize) -> Result<f64, SolverError> {
    let quantity = problem.items().get(item_idx).map_or(0, Item::quantity);

    u64_to_f64_exact(quantity)
}

/// Ensure that every eligible item received variables.
fn ensure_item_vars_len(vars_len: usize, eligible_len: usize) -> Result<(), SolverError> {
    if vars_len != eligible_len {
        return Err(SolverError::InvariantViolation {
            message: "item variable count does not match number of eligible items",
        });
    }

    Ok(())
}

/// Convert an `i64` to `f64` only if the conversion is exact.
///
/// `good_lp` stores coefficients as `f64`; integers beyond 2^53 would silently change.
pub fn i64_to_f64_exact(v: i64) -> Option<f64> {
    let f = v.to_f64()?;

    (f.to_i64() == Some(v)).then_some(f)
}

/// Convert a quantity or capacity to an exact solver coefficient.
///
/// # Errors
///
/// Returns [`SolverError::CoefficientNotRepresentable`] if the value does not survive an
/// `f64` round trip.
pub fn u64_to_f64_exact(v: u64) -> Result<f64, SolverError> {
    v.to_f64()
        .filter(|f| f.to_u64() == Some(v))
        .ok_or(SolverError::CoefficientNotRepresentable {
            value: i128::from(v),
        })
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;
    use crate::{normalize::objective_bounds, plants::Plant, weights::WeightsConfig};

    fn formulate(weights: WeightsConfig) -> Result<(AllocationModel, FormulationStats), SolverError> {
        let today = date(2025, 8, 21);
        let items = vec![
            Item::new("a", "M1", 4, "O1", today),
            Item::new("b", "M1", 2, "O1", today),
            Item::new("c", "M2", 2, "O2", today),
            Item::new("d", "M9", 2, "O2", today),
            Item::new("e", "M1", 0, "O2", today),
        ];
        let plants = vec![
            Plant::new("P1", 5, ["M1", "M2"]),
            Plant::new("P2", 3, ["M1"]),
            Plant::new("P3", 9, ["M7"]),
        ];

        let problem = AllocationProblem::new(items, plants, weights, today)?;
        let classified = ClassifiedItems::classify(problem.items(), problem.plants());
        let groups = ModelGroup::collect(problem.items(), problem.plants(), classified.eligible());
        let specs = problem.objective_specs()?;
        let bounds = objective_bounds(&specs, problem.items(), classified.eligible(), 17, 1e-9);
        let coefficients =
            ObjectiveCoefficients::compute(&problem, &specs, &bounds, &classified, &groups)?;

        let mut stats = FormulationStats::default();
        let model = build_model(&problem, &classified, &groups, &coefficients, &mut stats)?;

        Ok((model, stats))
    }

    #[test]
    fn assign_variables_only_for_compatible_pairs() -> TestResult {
        let (model, stats) = formulate(WeightsConfig::default())?;

        // a, b: P1 and P2; c: P1 only. d and e are not eligible.
        assert_eq!(stats.assign_variables, 5);
        assert_eq!(stats.placed_variables, 3);
        assert_eq!(model.vars.items.len(), 3);
        assert_eq!(
            model.vars.items.get(2).map(|item| item.assign.len()),
            Some(1)
        );

        Ok(())
    }

    #[test]
    fn at_most_one_only_for_multi_plant_items() -> TestResult {
        let (_, stats) = formulate(WeightsConfig::default())?;

        assert_eq!(stats.constraint_count(ConstraintKind::Placement), 3);
        assert_eq!(stats.constraint_count(ConstraintKind::AtMostOne), 2);

        Ok(())
    }

    #[test]
    fn plants_without_candidates_get_no_rows() -> TestResult {
        let (model, stats) = formulate(WeightsConfig::default())?;

        let plants: Vec<usize> = model.vars.plants.iter().map(|&(p, _)| p).collect();

        assert_eq!(plants, vec![0, 1]);
        assert_eq!(stats.constraint_count(ConstraintKind::Capacity), 2);
        assert_eq!(stats.structural_count(VariableKind::PlantUsed), 2);

        Ok(())
    }

    #[test]
    fn presence_variables_per_group_plant_pair() -> TestResult {
        let (model, stats) = formulate(WeightsConfig::default())?;

        // M1 at P1 and P2, M2 at P1
        assert_eq!(stats.presence_variables, 3);
        assert_eq!(stats.structural_count(VariableKind::GroupUsed), 2);
        assert_eq!(model.vars.groups.len(), 2);

        Ok(())
    }

    #[test]
    fn minimum_lot_rows_only_when_enabled() -> TestResult {
        let (_, plain) = formulate(WeightsConfig::default())?;
        let (model, with_min) =
            formulate(WeightsConfig::default().with_hard_min(3).with_soft_min(4, 1.0))?;

        assert_eq!(plain.constraint_count(ConstraintKind::HardMinimum), 0);
        assert_eq!(plain.constraint_count(ConstraintKind::SoftMinimum), 0);
        assert_eq!(with_min.constraint_count(ConstraintKind::HardMinimum), 3);
        assert_eq!(with_min.constraint_count(ConstraintKind::SoftMinimum), 3);
        assert_eq!(
            model.vars.groups.iter().map(|g| g.shortfall.len()).sum::<usize>(),
            3
        );

        Ok(())
    }

    #[test]
    fn observer_sees_every_variable() -> TestResult {
        let (model, stats) = formulate(WeightsConfig::default())?;

        assert_eq!(stats.variable_count(), model.state.variables().len());
        assert_eq!(stats.constraint_total(), model.state.constraints().len());

        Ok(())
    }

    #[test]
    fn i64_to_f64_exact_detects_inexact_values() {
        assert_eq!(i64_to_f64_exact(1_000), Some(1_000.0));
        // 2^53 + 1 is not exactly representable in f64.
        assert_eq!(i64_to_f64_exact(9_007_199_254_740_993), None);
    }

    #[test]
    fn u64_to_f64_exact_rejects_inexact_values() {
        assert!(u64_to_f64_exact(42).is_ok());
        assert!(matches!(
            u64_to_f64_exact(9_007_199_254_740_993),
            Err(SolverError::CoefficientNotRepresentable { .. })
        ));
    }
}
