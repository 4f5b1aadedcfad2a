//! Weights

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::problem::ProblemError;

/// Structural and scaling knobs of the objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Weight of the built-in quantity objective (required)
    pub w_quantity: f64,

    /// Weight of the built-in due-date objective (required)
    pub w_due: f64,

    /// Planning horizon in days
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Integer scale applied to normalised urgencies
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Multiplier turning fractional weights into integers
    #[serde(default = "default_weight_precision")]
    pub weight_precision: u32,

    /// Penalty weight for spreading a model group over several plants (0 = off)
    #[serde(default)]
    pub w_group: f64,

    /// Penalty weight for every plant in use
    #[serde(default)]
    pub w_plants: f64,

    /// Hard minimum quantity of a model group at any plant it is present at (0 = off)
    #[serde(default)]
    pub hard_min_qty: u64,

    /// Soft minimum quantity of a model group at any plant it is present at (0 = off)
    #[serde(default)]
    pub soft_min_qty: u64,

    /// Penalty weight for each unit of soft-minimum shortfall
    #[serde(default)]
    pub w_soft_min: f64,
}

fn default_horizon_days() -> u32 {
    30
}

fn default_scale() -> u32 {
    1_000
}

fn default_weight_precision() -> u32 {
    1
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl WeightsConfig {
    /// Create a config with the given required weights and default knobs.
    pub fn new(w_quantity: f64, w_due: f64) -> Self {
        Self {
            w_quantity,
            w_due,
            horizon_days: default_horizon_days(),
            scale: default_scale(),
            weight_precision: default_weight_precision(),
            w_group: 0.0,
            w_plants: 0.0,
            hard_min_qty: 0,
            soft_min_qty: 0,
            w_soft_min: 0.0,
        }
    }

    /// Returns the config with the given grouping weight.
    #[must_use]
    pub fn with_group_weight(mut self, w_group: f64) -> Self {
        self.w_group = w_group;
        self
    }

    /// Returns the config with the given plants-used weight.
    #[must_use]
    pub fn with_plants_weight(mut self, w_plants: f64) -> Self {
        self.w_plants = w_plants;
        self
    }

    /// Returns the config with a hard minimum lot size.
    #[must_use]
    pub fn with_hard_min(mut self, hard_min_qty: u64) -> Self {
        self.hard_min_qty = hard_min_qty;
        self
    }

    /// Returns the config with a soft minimum lot size and its weight.
    #[must_use]
    pub fn with_soft_min(mut self, soft_min_qty: u64, w_soft_min: f64) -> Self {
        self.soft_min_qty = soft_min_qty;
        self.w_soft_min = w_soft_min;
        self
    }

    /// Returns the config with the given horizon.
    #[must_use]
    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    /// Returns the config with the given weight precision.
    #[must_use]
    pub fn with_weight_precision(mut self, weight_precision: u32) -> Self {
        self.weight_precision = weight_precision;
        self
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] naming the offending field when a weight is negative or not
    /// finite, a required weight rounds to zero at the configured precision, or the horizon,
    /// scale or precision is zero.
    pub fn validate(&self) -> Result<(), ProblemError> {
        for (field, value) in [
            ("w_quantity", self.w_quantity),
            ("w_due", self.w_due),
            ("w_group", self.w_group),
            ("w_plants", self.w_plants),
            ("w_soft_min", self.w_soft_min),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProblemError::InvalidWeight {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.horizon_days == 0 {
            return Err(ProblemError::InvalidHorizon(self.horizon_days));
        }

        if self.scale == 0 {
            return Err(ProblemError::InvalidScale(self.scale));
        }

        if self.weight_precision == 0 {
            return Err(ProblemError::InvalidWeightPrecision(self.weight_precision));
        }

        self.int_w_quantity()?;
        self.int_w_due()?;

        Ok(())
    }

    /// Quantity weight as an integer at the configured precision.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] if the weight does not round to a positive integer.
    pub fn int_w_quantity(&self) -> Result<i64, ProblemError> {
        required_int_weight("w_quantity", self.w_quantity, self.weight_precision)
    }

    /// Due-date weight as an integer at the configured precision.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] if the weight does not round to a positive integer.
    pub fn int_w_due(&self) -> Result<i64, ProblemError> {
        required_int_weight("w_due", self.w_due, self.weight_precision)
    }

    /// Returns true if the hard minimum lot rule is active.
    pub fn hard_min_enabled(&self) -> bool {
        self.hard_min_qty > 0
    }

    /// Returns true if the soft minimum lot penalty is active.
    pub fn soft_min_enabled(&self) -> bool {
        self.soft_min_qty > 0 && self.w_soft_min > 0.0
    }
}

fn required_int_weight(field: &str, value: f64, precision: u32) -> Result<i64, ProblemError> {
    let scaled = (value * f64::from(precision)).round().to_i64();

    match scaled {
        Some(int_weight) if int_weight > 0 => Ok(int_weight),
        _ => Err(ProblemError::RequiredWeightNotPositive {
            field: field.to_string(),
            value,
            precision,
        }),
    }
}

/// Global scaling constants of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Target magnitude `K` of a fully weighted, normalised objective term
    pub objective_scale: i64,

    /// Ceiling on any single per-item component value
    pub component_ceiling: i64,

    /// Upper bounds at or below this are treated as zero
    pub ub_epsilon: f64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            objective_scale: 10_000,
            component_ceiling: 10_000_000,
            ub_epsilon: 1e-9,
        }
    }
}
