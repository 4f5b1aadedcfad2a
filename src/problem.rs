//! Allocation Problem
//!
//! A validated bundle of items, plants, objectives and weights. Every configuration error is
//! raised here, before any model is built.

use jiff::civil::Date;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    items::Item,
    objectives::{DUE_DATE_OBJECTIVE, ObjectiveSpec, QUANTITY_OBJECTIVE},
    orders::{Order, flatten},
    plants::Plant,
    solvers::ilp::i64_to_f64_exact,
    urgency::UrgencyProfile,
    weights::{ScalingConfig, WeightsConfig},
};

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProblemError {
    /// Two items share a name.
    #[error("duplicate item name: {0}")]
    DuplicateItemName(String),

    /// Two plants share a name.
    #[error("duplicate plant name: {0}")]
    DuplicatePlantName(String),

    /// A plant has zero capacity.
    #[error("plant {plant} has non-positive capacity {capacity}")]
    NonPositiveCapacity {
        /// Plant name
        plant: String,

        /// Offending capacity
        capacity: u64,
    },

    /// A plant allows no models.
    #[error("plant {0} has no allowed models")]
    EmptyAllowedModels(String),

    /// A plant lists the same model twice.
    #[error("plant {plant} lists model {model} more than once")]
    DuplicateAllowedModel {
        /// Plant name
        plant: String,

        /// Repeated model key
        model: String,
    },

    /// No plants were supplied.
    #[error("at least one plant is required")]
    NoPlants,

    /// An objective does not have exactly one value per item.
    #[error("objective {objective} has {actual} values, expected {expected}")]
    ValuesLengthMismatch {
        /// Objective name
        objective: String,

        /// Number of items
        expected: usize,

        /// Number of values supplied
        actual: usize,
    },

    /// An objective value is negative.
    #[error("objective {objective} has negative value {value} at index {index}")]
    NegativeObjectiveValue {
        /// Objective name
        objective: String,

        /// Item index
        index: usize,

        /// Offending value
        value: i64,
    },

    /// Objective sense is neither `maximize` nor `minimize`.
    #[error("unknown objective sense: {0}")]
    UnknownSense(String),

    /// A weight is negative or not finite.
    #[error("invalid weight {field}: {value}")]
    InvalidWeight {
        /// Field or objective name
        field: String,

        /// Offending value
        value: f64,
    },

    /// A required weight does not resolve to a positive integer.
    #[error("required weight {field} = {value} does not round to a positive integer at precision {precision}")]
    RequiredWeightNotPositive {
        /// Field name
        field: String,

        /// Offending value
        value: f64,

        /// Configured weight precision
        precision: u32,
    },

    /// Horizon must be at least one day.
    #[error("horizon_days must be at least 1, got {0}")]
    InvalidHorizon(u32),

    /// Scale must be at least one.
    #[error("scale must be at least 1, got {0}")]
    InvalidScale(u32),

    /// Weight precision must be at least one.
    #[error("weight_precision must be at least 1, got {0}")]
    InvalidWeightPrecision(u32),
}

/// Validated allocation problem
#[derive(Debug, Clone)]
pub struct AllocationProblem {
    items: Vec<Item>,
    plants: Vec<Plant>,
    weights: WeightsConfig,
    scaling: ScalingConfig,
    objectives: Vec<ObjectiveSpec>,
    urgency: UrgencyProfile,
}

impl AllocationProblem {
    /// Create a problem from items and plants, planning as of `today`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] if the plants, items or weights are invalid.
    pub fn new(
        items: Vec<Item>,
        plants: Vec<Plant>,
        weights: WeightsConfig,
        today: Date,
    ) -> Result<Self, ProblemError> {
        validate_plants(&plants)?;
        validate_items(&items)?;
        weights.validate()?;

        let urgency = UrgencyProfile::compute(&items, today, weights.horizon_days);

        Ok(Self {
            items,
            plants,
            weights,
            scaling: ScalingConfig::default(),
            objectives: Vec::new(),
            urgency,
        })
    }

    /// Create a problem from orders, flattening their lines into items.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] if the plants, derived items or weights are invalid.
    pub fn from_orders(
        orders: &[Order],
        plants: Vec<Plant>,
        weights: WeightsConfig,
        today: Date,
    ) -> Result<Self, ProblemError> {
        Self::new(flatten(orders), plants, weights, today)
    }

    /// Returns the problem with an additional caller-supplied objective.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] if the objective is invalid for this problem's items.
    pub fn with_objective(mut self, spec: ObjectiveSpec) -> Result<Self, ProblemError> {
        spec.validate(self.items.len())?;

        self.objectives.push(spec);

        Ok(self)
    }

    /// Returns the problem with custom scaling constants.
    #[must_use]
    pub fn with_scaling(mut self, scaling: ScalingConfig) -> Self {
        self.scaling = scaling;
        self
    }

    /// All items, in input order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All plants, in input order
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    /// Weights
    pub fn weights(&self) -> &WeightsConfig {
        &self.weights
    }

    /// Scaling constants
    pub fn scaling(&self) -> &ScalingConfig {
        &self.scaling
    }

    /// Urgency derived from the items' due dates
    pub fn urgency(&self) -> &UrgencyProfile {
        &self.urgency
    }

    /// Caller-supplied objectives
    pub fn custom_objectives(&self) -> &[ObjectiveSpec] {
        &self.objectives
    }

    /// Number of distinct orders the items belong to.
    pub fn orders_count(&self) -> usize {
        self.items
            .iter()
            .map(Item::order)
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Every additive objective: the built-in quantity and due-date objectives followed by the
    /// caller-supplied ones.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] if a required weight cannot be resolved.
    pub fn objective_specs(&self) -> Result<Vec<ObjectiveSpec>, ProblemError> {
        let precision = f64::from(self.weights.weight_precision);
        let w_quantity = int_weight_as_f64("w_quantity", self.weights.int_w_quantity()?)?;
        let w_due = int_weight_as_f64("w_due", self.weights.int_w_due()?)?;

        let quantities = self
            .items
            .iter()
            .map(|item| i64::try_from(item.quantity()).unwrap_or(i64::MAX))
            .collect();

        let due_values = self
            .urgency
            .due_values(self.weights.scale, self.scaling.component_ceiling);

        let mut specs = Vec::with_capacity(self.objectives.len().saturating_add(2));

        specs.push(ObjectiveSpec::maximize(
            QUANTITY_OBJECTIVE,
            quantities,
            w_quantity / precision,
        ));
        specs.push(ObjectiveSpec::maximize(
            DUE_DATE_OBJECTIVE,
            due_values,
            w_due / precision,
        ));
        specs.extend(self.objectives.iter().cloned());

        Ok(specs)
    }
}

fn int_weight_as_f64(field: &str, int_weight: i64) -> Result<f64, ProblemError> {
    i64_to_f64_exact(int_weight).ok_or_else(|| ProblemError::InvalidWeight {
        field: field.to_string(),
        value: f64::NAN,
    })
}

fn validate_plants(plants: &[Plant]) -> Result<(), ProblemError> {
    if plants.is_empty() {
        return Err(ProblemError::NoPlants);
    }

    let mut names = FxHashSet::default();

    for plant in plants {
        if !names.insert(plant.name()) {
            return Err(ProblemError::DuplicatePlantName(plant.name().to_string()));
        }

        if plant.capacity() == 0 {
            return Err(ProblemError::NonPositiveCapacity {
                plant: plant.name().to_string(),
                capacity: plant.capacity(),
            });
        }

        if plant.allowed_models().is_empty() {
            return Err(ProblemError::EmptyAllowedModels(plant.name().to_string()));
        }

        let mut models = FxHashSet::default();

        for model in plant.allowed_models() {
            if !models.insert(model.as_str()) {
                return Err(ProblemError::DuplicateAllowedModel {
                    plant: plant.name().to_string(),
                    model: model.clone(),
                });
            }
        }
    }

    Ok(())
}

fn validate_items(items: &[Item]) -> Result<(), ProblemError> {
    let mut names = FxHashSet::default();

    for item in items {
        if !names.insert(item.name()) {
            return Err(ProblemError::DuplicateItemName(item.name().to_string()));
        }
    }

    Ok(())
}
