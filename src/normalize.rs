//! Normalization
//!
//! Each additive objective is divided by an upper bound on what it could achieve, so weights
//! across heterogeneous objectives are comparable. The bound is the fractional knapsack
//! relaxation over the aggregate plant capacity. It need not be tight, only valid.

use std::cmp::Ordering;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    items::Item,
    objectives::{ObjectiveSpec, Sense},
};

/// Upper bound of one additive objective over the eligible items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveBound {
    /// Objective name
    pub name: String,

    /// Optimisation direction
    pub sense: Sense,

    /// Weight
    pub weight: f64,

    /// Fractional knapsack upper bound
    pub upper_bound: f64,

    /// False when the objective is weightless or its bound is negligible
    pub used: bool,
}

/// Fractional knapsack bound of `(value, quantity)` entries under `capacity`.
///
/// Zero-quantity entries contribute their value unconditionally. The rest are taken greedily
/// by value density, with a fractional share at the margin.
pub fn knapsack_upper_bound(entries: impl IntoIterator<Item = (i64, u64)>, capacity: u64) -> f64 {
    let mut free = 0.0;
    let mut candidates: Vec<(f64, f64)> = Vec::new();

    for (value, quantity) in entries {
        let value = value.to_f64().unwrap_or(0.0);

        if value <= 0.0 {
            continue;
        }

        if quantity == 0 {
            free += value;
        } else {
            candidates.push((value, quantity.to_f64().unwrap_or(f64::MAX)));
        }
    }

    candidates.sort_by(|(va, qa), (vb, qb)| density_order(va / qa, vb / qb));

    let mut remaining = capacity.to_f64().unwrap_or(f64::MAX);
    let mut bound = free;

    for (value, quantity) in candidates {
        if remaining <= 0.0 {
            break;
        }

        if quantity <= remaining {
            bound += value;
            remaining -= quantity;
        } else {
            bound += value * remaining / quantity;
            break;
        }
    }

    bound
}

fn density_order(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Compute the bound of every objective over the eligible items.
pub fn objective_bounds(
    specs: &[ObjectiveSpec],
    items: &[Item],
    eligible: &[usize],
    capacity: u64,
    epsilon: f64,
) -> Vec<ObjectiveBound> {
    specs
        .iter()
        .map(|spec| {
            let upper_bound = if spec.weight > 0.0 {
                knapsack_upper_bound(
                    eligible.iter().filter_map(|&item_idx| {
                        let value = spec.values.get(item_idx)?;
                        let item = items.get(item_idx)?;

                        Some((*value, item.quantity()))
                    }),
                    capacity,
                )
            } else {
                0.0
            };

            let used = spec.weight > 0.0 && upper_bound > epsilon;

            if spec.weight > 0.0 && !used {
                warn!(
                    objective = %spec.name,
                    upper_bound,
                    "objective has a negligible upper bound and is ignored"
                );
            }

            debug!(objective = %spec.name, upper_bound, used, "normalised objective");

            ObjectiveBound {
                name: spec.name.clone(),
                sense: spec.sense,
                weight: spec.weight,
                upper_bound,
                used,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn takes_everything_when_capacity_suffices() {
        let bound = knapsack_upper_bound([(10, 2), (6, 3)], 100);

        assert!(close(bound, 16.0));
    }

    #[test]
    fn fills_by_density_with_fractional_margin() {
        // Densities: 5.0, 2.0, 1.0. Capacity 4 takes the first (2 units) and half of the second.
        let bound = knapsack_upper_bound([(4, 4), (10, 2), (8, 4)], 4);

        assert!(close(bound, 14.0));
    }

    #[test]
    fn zero_quantity_values_are_free() {
        let bound = knapsack_upper_bound([(7, 0), (10, 10)], 5);

        assert!(close(bound, 12.0));
    }

    #[test]
    fn zero_values_contribute_nothing() {
        let bound = knapsack_upper_bound([(0, 1), (0, 0)], 5);

        assert!(close(bound, 0.0));
    }

    #[test]
    fn objective_bounds_flag_unused_objectives() {
        let due = date(2025, 8, 21);
        let items = [Item::new("a", "M1", 2, "O1", due), Item::new("b", "M1", 3, "O1", due)];
        let specs = [
            ObjectiveSpec::maximize("quantity", vec![2, 3], 1.0),
            ObjectiveSpec::maximize("zero", vec![0, 0], 1.0),
            ObjectiveSpec::maximize("weightless", vec![5, 5], 0.0),
        ];

        let bounds = objective_bounds(&specs, &items, &[0, 1], 4, 1e-9);
        let used: Vec<bool> = bounds.iter().map(|bound| bound.used).collect();

        assert_eq!(used, vec![true, false, false]);
        assert!(bounds.first().is_some_and(|bound| close(bound.upper_bound, 4.0)));
    }

    #[test]
    fn objective_bounds_only_count_eligible_items() {
        let due = date(2025, 8, 21);
        let items = [Item::new("a", "M1", 2, "O1", due), Item::new("b", "M1", 3, "O1", due)];
        let specs = [ObjectiveSpec::maximize("fill", vec![10, 20], 1.0)];

        let bounds = objective_bounds(&specs, &items, &[0], 100, 1e-9);

        assert!(bounds.first().is_some_and(|bound| close(bound.upper_bound, 10.0)));
    }
}
