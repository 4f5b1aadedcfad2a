//! Plants

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A production plant with a finite quantity capacity and the set of models it may produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    name: String,
    capacity: u64,
    allowed_models: SmallVec<[String; 4]>,
}

impl Plant {
    /// Create a new plant.
    pub fn new<M>(name: impl Into<String>, capacity: u64, allowed_models: M) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            name: name.into(),
            capacity,
            allowed_models: allowed_models.into_iter().map(Into::into).collect(),
        }
    }

    /// Unique plant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum total quantity the plant can produce.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Model keys this plant is allowed to produce.
    pub fn allowed_models(&self) -> &[String] {
        &self.allowed_models
    }

    /// Returns true if the plant may produce the given model.
    pub fn allows(&self, model: &str) -> bool {
        self.allowed_models.iter().any(|allowed| allowed == model)
    }
}

/// Sum of the capacities of all plants, saturating at `u64::MAX`.
pub fn total_capacity(plants: &[Plant]) -> u64 {
    plants
        .iter()
        .fold(0_u64, |acc, plant| acc.saturating_add(plant.capacity()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_only_listed_models() {
        let plant = Plant::new("North", 10, ["red", "blue"]);

        assert!(plant.allows("red"));
        assert!(plant.allows("blue"));
        assert!(!plant.allows("green"));
    }

    #[test]
    fn total_capacity_sums_all_plants() {
        let plants = [Plant::new("A", 5, ["M1"]), Plant::new("B", 3, ["M1"])];

        assert_eq!(total_capacity(&plants), 8);
    }

    #[test]
    fn total_capacity_saturates() {
        let plants = [Plant::new("A", u64::MAX, ["M1"]), Plant::new("B", 3, ["M1"])];

        assert_eq!(total_capacity(&plants), u64::MAX);
    }
}
