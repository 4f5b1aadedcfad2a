//! Classification
//!
//! Partitions items into zero-quantity, skipped and eligible sets before any model is built.
//! Zero quantity takes precedence over compatibility, which takes precedence over size.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::{items::Item, plants::Plant};

/// Why an item was skipped without being modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No plant may produce the item's model
    NoCompatiblePlant,

    /// The item fits the compatible plants only if it were split
    TooLargeForAnyPlant,
}

impl SkipReason {
    /// Reason code
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoCompatiblePlant => "no_compatible_plant",
            SkipReason::TooLargeForAnyPlant => "too_large_for_any_plant",
        }
    }
}

/// Terminal classification of an item before solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Quantity is zero; never modelled
    ZeroQuantity,

    /// Structurally impossible to place
    Skipped(SkipReason),

    /// Modelled
    Eligible,
}

/// Result of classifying every item of a problem.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedItems {
    classes: Vec<Classification>,
    compatible: Vec<SmallVec<[usize; 4]>>,
    eligible: Vec<usize>,
}

impl ClassifiedItems {
    /// Classify `items` against `plants`, preserving input order.
    pub fn classify(items: &[Item], plants: &[Plant]) -> Self {
        let mut classes = Vec::with_capacity(items.len());
        let mut compatible = Vec::with_capacity(items.len());
        let mut eligible = Vec::new();

        for (item_idx, item) in items.iter().enumerate() {
            let plant_indexes: SmallVec<[usize; 4]> = plants
                .iter()
                .enumerate()
                .filter(|(_, plant)| plant.allows(item.model()))
                .map(|(plant_idx, _)| plant_idx)
                .collect();

            let class = classify_item(item.quantity(), &plant_indexes, plants);

            if class == Classification::Eligible {
                eligible.push(item_idx);
            }

            classes.push(class);
            compatible.push(plant_indexes);
        }

        debug!(
            items = items.len(),
            eligible = eligible.len(),
            "classified items"
        );

        Self {
            classes,
            compatible,
            eligible,
        }
    }

    /// Classification of every item, in input order
    pub fn classes(&self) -> &[Classification] {
        &self.classes
    }

    /// Classification of the item at `item_idx`
    pub fn class(&self, item_idx: usize) -> Option<Classification> {
        self.classes.get(item_idx).copied()
    }

    /// Compatible plant indexes of the item at `item_idx`
    pub fn compatible_plants(&self, item_idx: usize) -> &[usize] {
        self.compatible.get(item_idx).map_or(&[], |plants| plants.as_slice())
    }

    /// Indexes of eligible items, in input order
    pub fn eligible(&self) -> &[usize] {
        &self.eligible
    }

    /// Returns true if no item is eligible.
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

fn classify_item(quantity: u64, compatible: &[usize], plants: &[Plant]) -> Classification {
    if quantity == 0 {
        return Classification::ZeroQuantity;
    }

    if compatible.is_empty() {
        return Classification::Skipped(SkipReason::NoCompatiblePlant);
    }

    let capacities = compatible
        .iter()
        .filter_map(|&plant_idx| plants.get(plant_idx))
        .map(Plant::capacity);

    let max_capacity = capacities.clone().max().unwrap_or(0);
    let total_capacity = capacities.fold(0_u64, u64::saturating_add);

    // Items larger than the aggregate stay modelled and end up unallocated.
    if quantity > max_capacity && quantity <= total_capacity {
        return Classification::Skipped(SkipReason::TooLargeForAnyPlant);
    }

    Classification::Eligible
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn item(name: &str, model: &str, quantity: u64) -> Item {
        Item::new(name, model, quantity, "O1", date(2025, 8, 21))
    }

    fn plants() -> Vec<Plant> {
        vec![Plant::new("P1", 5, ["M1", "M2"]), Plant::new("P2", 3, ["M1"])]
    }

    #[test]
    fn zero_quantity_wins_over_incompatibility() {
        let classified = ClassifiedItems::classify(&[item("a", "M9", 0)], &plants());

        assert_eq!(classified.class(0), Some(Classification::ZeroQuantity));
        assert!(classified.is_empty());
    }

    #[test]
    fn unsupported_model_is_skipped() {
        let classified = ClassifiedItems::classify(&[item("a", "M9", 5)], &plants());

        assert_eq!(
            classified.class(0),
            Some(Classification::Skipped(SkipReason::NoCompatiblePlant))
        );
    }

    #[test]
    fn item_fitting_only_when_split_is_skipped() {
        let classified = ClassifiedItems::classify(&[item("a", "M1", 7)], &plants());

        assert_eq!(
            classified.class(0),
            Some(Classification::Skipped(SkipReason::TooLargeForAnyPlant))
        );
    }

    #[test]
    fn item_larger_than_aggregate_capacity_stays_eligible() {
        let classified = ClassifiedItems::classify(&[item("a", "M1", 9)], &plants());

        assert_eq!(classified.class(0), Some(Classification::Eligible));
        assert_eq!(classified.eligible(), &[0]);
    }

    #[test]
    fn compatibility_is_limited_to_allowed_models() {
        let classified =
            ClassifiedItems::classify(&[item("a", "M1", 2), item("b", "M2", 6)], &plants());

        assert_eq!(classified.compatible_plants(0), &[0, 1]);
        assert_eq!(classified.compatible_plants(1), &[0]);
        // M2 only fits P1 (5) and exceeds the aggregate as well, so it stays eligible.
        assert_eq!(classified.eligible(), &[0, 1]);
    }
}
