//! Structural penalties: plants used, model-group splitting and plant minimums.
//!
//! Raising a penalty weight must never make the penalised quantity grow.

use jiff::civil::{Date, date};
use testresult::TestResult;

use plant_alloc::prelude::*;

fn today() -> Date {
    date(2025, 6, 2)
}

fn two_equal_plants() -> Vec<Plant> {
    vec![Plant::new("A", 10, ["M1"]), Plant::new("B", 10, ["M1"])]
}

fn items(quantities: &[u64]) -> Vec<Item> {
    quantities
        .iter()
        .enumerate()
        .map(|(idx, &quantity)| Item::new(format!("i{idx}"), "M1", quantity, "O1", today()))
        .collect()
}

fn allocate(
    plants: Vec<Plant>,
    items: Vec<Item>,
    weights: WeightsConfig,
) -> TestResult<AllocationPlan> {
    let problem = AllocationProblem::new(items, plants, weights, today())?;

    Ok(Allocator::new().allocate(&problem)?)
}

fn is_non_increasing(values: &[usize]) -> bool {
    values.windows(2).all(|pair| pair.first() >= pair.last())
}

#[test]
fn plants_used_never_grows_with_its_weight() -> TestResult {
    let mut plants_used = Vec::new();

    for w_plants in [0.0, 0.5, 2.0, 10.0] {
        let weights = WeightsConfig::default()
            .with_group_weight(0.0)
            .with_plants_weight(w_plants);

        let plan = allocate(two_equal_plants(), items(&[6, 6]), weights)?;

        assert!(plan.status.has_solution());
        plants_used.push(plan.summary.plants_used);
    }

    assert!(is_non_increasing(&plants_used), "{plants_used:?}");
    assert_eq!(plants_used.first(), Some(&2));
    assert_eq!(plants_used.last(), Some(&0));

    Ok(())
}

#[test]
fn plants_per_model_never_grows_with_group_weight() -> TestResult {
    let mut plants_per_model = Vec::new();

    for w_group in [0.0, 0.2, 1.0, 5.0] {
        let weights = WeightsConfig::default().with_group_weight(w_group);

        let plan = allocate(two_equal_plants(), items(&[6, 6]), weights)?;

        let model = plan.models.first().ok_or("missing model summary")?;
        plants_per_model.push(model.plants.len());
    }

    assert!(is_non_increasing(&plants_per_model), "{plants_per_model:?}");
    assert_eq!(plants_per_model, vec![2, 2, 1, 1]);

    Ok(())
}

#[test]
fn group_split_is_reported_as_extra_plants() -> TestResult {
    let weights = WeightsConfig::default().with_group_weight(0.0);

    let plan = allocate(two_equal_plants(), items(&[6, 6]), weights)?;

    assert_eq!(plan.summary.extra_plants, 1);
    assert_eq!(plan.objective.group.achieved, 1);
    assert_eq!(plan.objective.group.contribution, 0);

    Ok(())
}

#[test]
fn shortfall_never_grows_with_soft_minimum_weight() -> TestResult {
    let mut shortfalls = Vec::new();

    for w_soft_min in [0.01, 0.1, 1.0, 10.0] {
        let weights = WeightsConfig::default().with_soft_min(8, w_soft_min);

        let plan = allocate(two_equal_plants(), items(&[6, 6, 3]), weights)?;

        let soft = plan.objective.soft_min.as_ref().ok_or("soft minimum inactive")?;
        let total: u64 = soft.pairs.iter().map(|row| row.shortfall).sum();

        assert_eq!(total, soft.penalty.achieved);
        assert!(soft.pairs.iter().all(|row| row.shortfall == row.implied_shortfall));
        shortfalls.push(usize::try_from(total)?);
    }

    assert!(is_non_increasing(&shortfalls), "{shortfalls:?}");
    assert_eq!(shortfalls.first(), Some(&2));
    assert_eq!(shortfalls.last(), Some(&0));

    Ok(())
}

#[test]
fn soft_minimum_is_off_without_weight() -> TestResult {
    let weights = WeightsConfig::default().with_soft_min(8, 0.0);

    let plan = allocate(two_equal_plants(), items(&[6]), weights)?;

    assert!(plan.objective.soft_min.is_none());
    assert_eq!(plan.summary.allocated_count, 1);

    Ok(())
}

#[test]
fn unreachable_hard_minimum_excludes_the_group() -> TestResult {
    let plants = vec![Plant::new("A", 10, ["M1"]), Plant::new("B", 15, ["M1"])];
    let weights = WeightsConfig::default().with_hard_min(20);

    let plan = allocate(plants, items(&[5, 5]), weights)?;

    assert!(plan.status.has_solution());
    assert_eq!(plan.summary.allocated_count, 0);
    assert_eq!(plan.summary.unallocated_count, 2);
    assert!(plan.unallocated().all(|d| {
        d.status
            == ItemStatus::Unallocated {
                reason: UnallocatedReason::InsufficientCapacity,
            }
    }));

    Ok(())
}

#[test]
fn reachable_hard_minimum_consolidates_the_group() -> TestResult {
    let weights = WeightsConfig::default()
        .with_group_weight(0.0)
        .with_hard_min(8);

    let plan = allocate(two_equal_plants(), items(&[5, 5]), weights)?;

    // Split 5 + 5 would leave both plants under the minimum.
    assert_eq!(plan.summary.allocated_count, 2);
    assert_eq!(plan.summary.plants_used, 1);

    Ok(())
}
