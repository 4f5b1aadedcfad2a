//! ILP Observer
//!
//! Hooks notified while the allocation model is formulated.

use good_lp::{Expression, Variable};
use rustc_hash::FxHashMap;

use crate::solvers::ilp::state::ConstraintRelation;

/// Family of a structural decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// `used[g]`: model group placed anywhere
    GroupUsed,

    /// `plant_used[p]`: plant holds at least one item
    PlantUsed,

    /// `shortfall[g, p]`: soft-minimum shortfall of a group at a plant
    Shortfall,
}

/// Family of a recorded constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Assignments of an item sum to its placement flag
    Placement,

    /// At most one assignment per item
    AtMostOne,

    /// Links assignments and group presence
    Presence,

    /// Links group presence and group usage
    GroupUsage,

    /// Links assignments and plant usage
    PlantUsage,

    /// Plant capacity
    Capacity,

    /// Hard minimum lot
    HardMinimum,

    /// Soft minimum shortfall
    SoftMinimum,
}

/// Observer of the model formulation.
///
/// Every hook has an empty default, so implementors only override what they need.
pub trait ILPObserver {
    /// An `assign[i, p]` variable was created.
    fn on_assign_variable(&mut self, _item_idx: usize, _plant_idx: usize, _var: Variable) {}

    /// A `placed[i]` variable was created.
    fn on_placed_variable(&mut self, _item_idx: usize, _var: Variable) {}

    /// A `present[g, p]` variable was created.
    fn on_presence_variable(&mut self, _group_idx: usize, _plant_idx: usize, _var: Variable) {}

    /// A structural variable was created; `index` is a group or plant index.
    fn on_structural_variable(&mut self, _kind: VariableKind, _index: usize, _var: Variable) {}

    /// A constraint was recorded.
    fn on_constraint(
        &mut self,
        _kind: ConstraintKind,
        _lhs: &Expression,
        _relation: ConstraintRelation,
        _rhs: f64,
    ) {
    }

    /// A term was added to the maximised objective.
    fn on_objective_term(&mut self, _var: Variable, _coefficient: f64) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ILPObserver for NoopObserver {}

/// Observer that counts what was formulated.
#[derive(Debug, Default, Clone)]
pub struct FormulationStats {
    /// Number of `assign` variables
    pub assign_variables: usize,

    /// Number of `placed` variables
    pub placed_variables: usize,

    /// Number of `present` variables
    pub presence_variables: usize,

    /// Structural variables per kind
    pub structural_variables: FxHashMap<VariableKind, usize>,

    /// Constraints per kind
    pub constraints: FxHashMap<ConstraintKind, usize>,

    /// Number of objective terms
    pub objective_terms: usize,
}

impl FormulationStats {
    /// Number of constraints of the given kind.
    pub fn constraint_count(&self, kind: ConstraintKind) -> usize {
        self.constraints.get(&kind).copied().unwrap_or(0)
    }

    /// Number of structural variables of the given kind.
    pub fn structural_count(&self, kind: VariableKind) -> usize {
        self.structural_variables.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of variables.
    pub fn variable_count(&self) -> usize {
        self.assign_variables
            + self.placed_variables
            + self.presence_variables
            + self.structural_variables.values().sum::<usize>()
    }

    /// Total number of constraints.
    pub fn constraint_total(&self) -> usize {
        self.constraints.values().sum()
    }
}

impl ILPObserver for FormulationStats {
    fn on_assign_variable(&mut self, _item_idx: usize, _plant_idx: usize, _var: Variable) {
        self.assign_variables += 1;
    }

    fn on_placed_variable(&mut self, _item_idx: usize, _var: Variable) {
        self.placed_variables += 1;
    }

    fn on_presence_variable(&mut self, _group_idx: usize, _plant_idx: usize, _var: Variable) {
        self.presence_variables += 1;
    }

    fn on_structural_variable(&mut self, kind: VariableKind, _index: usize, _var: Variable) {
        *self.structural_variables.entry(kind).or_insert(0) += 1;
    }

    fn on_constraint(
        &mut self,
        kind: ConstraintKind,
        _lhs: &Expression,
        _relation: ConstraintRelation,
        _rhs: f64,
    ) {
        *self.constraints.entry(kind).or_insert(0) += 1;
    }

    fn on_objective_term(&mut self, _var: Variable, _coefficient: f64) {
        self.objective_terms += 1;
    }
}
