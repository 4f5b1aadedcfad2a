//! Objectives
//!
//! An [`ObjectiveSpec`] is an additive per-item objective: every placed item contributes its
//! value, the sum is normalised by a capacity-aware upper bound and weighted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::problem::ProblemError;

/// Name of the built-in quantity objective.
pub const QUANTITY_OBJECTIVE: &str = "quantity";

/// Name of the built-in due-date objective.
pub const DUE_DATE_OBJECTIVE: &str = "due_date";

/// Optimisation direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sense {
    /// Larger sums are better
    Maximize,

    /// Smaller sums are better
    Minimize,
}

impl Sense {
    /// Sign applied to coefficients of this sense in a maximised objective.
    pub fn sign(self) -> i64 {
        match self {
            Sense::Maximize => 1,
            Sense::Minimize => -1,
        }
    }

    /// Lowercase name of the sense.
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Maximize => "maximize",
            Sense::Minimize => "minimize",
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sense {
    type Err = ProblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maximize" => Ok(Sense::Maximize),
            "minimize" => Ok(Sense::Minimize),
            other => Err(ProblemError::UnknownSense(other.to_string())),
        }
    }
}

impl TryFrom<String> for Sense {
    type Error = ProblemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sense> for String {
    fn from(sense: Sense) -> Self {
        sense.as_str().to_string()
    }
}

/// Additive per-item objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    /// Objective name, used in diagnostics
    pub name: String,

    /// One non-negative value per problem item, in item order
    pub values: Vec<i64>,

    /// Optimisation direction
    #[serde(default = "default_sense")]
    pub sense: Sense,

    /// Non-negative weight; zero disables the objective
    pub weight: f64,
}

fn default_sense() -> Sense {
    Sense::Maximize
}

impl ObjectiveSpec {
    /// Create a maximised objective.
    pub fn maximize(name: impl Into<String>, values: Vec<i64>, weight: f64) -> Self {
        Self {
            name: name.into(),
            values,
            sense: Sense::Maximize,
            weight,
        }
    }

    /// Create a minimised objective.
    pub fn minimize(name: impl Into<String>, values: Vec<i64>, weight: f64) -> Self {
        Self {
            name: name.into(),
            values,
            sense: Sense::Minimize,
            weight,
        }
    }

    /// Check the objective against the number of problem items.
    ///
    /// # Errors
    ///
    /// Returns a [`ProblemError`] when the value count does not match `item_count`, a value is
    /// negative, or the weight is negative or not finite.
    pub fn validate(&self, item_count: usize) -> Result<(), ProblemError> {
        if self.values.len() != item_count {
            return Err(ProblemError::ValuesLengthMismatch {
                objective: self.name.clone(),
                expected: item_count,
                actual: self.values.len(),
            });
        }

        if let Some((index, &value)) = self.values.iter().enumerate().find(|(_, v)| **v < 0) {
            return Err(ProblemError::NegativeObjectiveValue {
                objective: self.name.clone(),
                index,
                value,
            });
        }

        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ProblemError::InvalidWeight {
                field: self.name.clone(),
                value: self.weight,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn sense_parses_known_values() -> TestResult {
        assert_eq!("maximize".parse::<Sense>()?, Sense::Maximize);
        assert_eq!("minimize".parse::<Sense>()?, Sense::Minimize);

        Ok(())
    }

    #[test]
    fn unknown_sense_is_rejected_with_value() {
        let err = "sideways".parse::<Sense>().err();

        assert!(matches!(err, Some(ProblemError::UnknownSense(ref s)) if s == "sideways"));
    }

    #[test]
    fn spec_deserializes_with_default_sense() -> TestResult {
        let spec: ObjectiveSpec = serde_norway::from_str("name: fill\nvalues: [1, 2]\nweight: 0.5\n")?;

        assert_eq!(spec.sense, Sense::Maximize);
        assert_eq!(spec.values, vec![1, 2]);

        Ok(())
    }

    #[test]
    fn spec_with_unknown_sense_fails_to_deserialize() {
        let result: Result<ObjectiveSpec, _> =
            serde_norway::from_str("name: fill\nvalues: [1]\nsense: up\nweight: 1\n");

        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let spec = ObjectiveSpec::maximize("fill", vec![1, 2], 1.0);

        assert!(matches!(
            spec.validate(3),
            Err(ProblemError::ValuesLengthMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_negative_values() {
        let spec = ObjectiveSpec::minimize("cost", vec![1, -4], 1.0);

        assert!(matches!(
            spec.validate(2),
            Err(ProblemError::NegativeObjectiveValue {
                index: 1,
                value: -4,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_negative_weight() {
        let spec = ObjectiveSpec::maximize("fill", vec![1], -0.5);

        assert!(matches!(spec.validate(1), Err(ProblemError::InvalidWeight { .. })));
    }
}
