//! ILP State

use std::fmt;

use good_lp::{Expression, ProblemVariables, Variable, VariableDefinition};

/// Relation operator for a linear ILP constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintRelation {
    /// Equality (`lhs == rhs`)
    Eq,

    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

impl fmt::Display for ConstraintRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstraintRelation::Eq => "=",
            ConstraintRelation::Leq => "<=",
            ConstraintRelation::Geq => ">=",
        })
    }
}

/// Recorded linear ILP constraint emitted during model construction.
#[derive(Debug, Clone)]
pub struct ILPConstraint {
    /// Left-hand side expression
    pub lhs: Expression,

    /// Relation operator
    pub relation: ConstraintRelation,

    /// Right-hand side scalar
    pub rhs: f64,
}

/// Builder state for ILP problem variables, objective and constraints
pub struct ILPState {
    pb: ProblemVariables,
    objective: Expression,
    variables: Vec<Variable>,
    constraints: Vec<ILPConstraint>,
}

impl fmt::Debug for ILPState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ILPState")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field(
                "variables",
                &format!("[{} variables]", self.variables.len()),
            )
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish()
    }
}

impl Default for ILPState {
    fn default() -> Self {
        Self::new()
    }
}

impl ILPState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            pb: ProblemVariables::new(),
            objective: Expression::default(),
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a decision variable.
    pub fn add_variable(&mut self, definition: VariableDefinition) -> Variable {
        let var = self.pb.add(definition);

        self.variables.push(var);

        var
    }

    /// Add a term to the maximised objective.
    pub fn add_to_objective(&mut self, var: Variable, coefficient: f64) {
        self.objective += var * coefficient;
    }

    /// Record a constraint.
    pub fn add_constraint(&mut self, lhs: Expression, relation: ConstraintRelation, rhs: f64) {
        self.constraints.push(ILPConstraint { lhs, relation, rhs });
    }

    /// Objective expression built so far
    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    /// Every variable, in creation order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Recorded constraints, in creation order
    pub fn constraints(&self) -> &[ILPConstraint] {
        &self.constraints
    }

    /// Returns true if no variable has been created.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Extract the problem variables, objective, variable list and recorded constraints.
    pub fn into_parts(self) -> (ProblemVariables, Expression, Vec<Variable>, Vec<ILPConstraint>) {
        (self.pb, self.objective, self.variables, self.constraints)
    }
}
