//! End-to-end allocation scenarios.
//!
//! Each test builds a small problem, runs the default allocator and checks the item
//! decisions together with the reconciliation of the plan.

use jiff::{
    ToSpan,
    civil::{Date, date},
};
use testresult::TestResult;

use plant_alloc::prelude::*;

fn today() -> Date {
    date(2025, 6, 2)
}

fn assert_reconciles(plan: &AllocationPlan, items: usize) {
    let summary = &plan.summary;

    assert_eq!(plan.decisions.len(), items);
    assert_eq!(
        summary.allocated_count
            + summary.unallocated_count
            + summary.skipped_count
            + summary.zero_quantity_items_count,
        items
    );
    assert!(summary.total_allocated_quantity <= summary.eligible_demand);
    assert!(summary.total_allocated_quantity <= summary.total_capacity);
}

#[test]
fn single_item_fits_and_is_allocated() -> TestResult {
    let plants = vec![
        Plant::new("P1", 100, ["M1", "M2"]),
        Plant::new("P2", 100, ["M1"]),
    ];
    let orders = [Order::new("O1", today()).with_line(OrderLine::new("M1", 10))];

    let problem =
        AllocationProblem::from_orders(&orders, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_reconciles(&plan, 1);
    assert!(plan.status.has_solution());
    assert_eq!(plan.summary.total_allocated_quantity, 10);
    assert_eq!(plan.summary.skipped_count, 0);
    assert_eq!(plan.summary.plants_used, 1);

    let decision = plan.decision("O1/1").ok_or("missing decision")?;

    assert!(matches!(decision.plant(), Some("P1" | "P2")));

    Ok(())
}

#[test]
fn model_without_plant_is_skipped_without_solving() -> TestResult {
    let plants = vec![Plant::new("P1", 100, ["M2"])];
    let items = vec![Item::new("i1", "M1", 5, "O1", today())];

    let problem = AllocationProblem::new(items, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_reconciles(&plan, 1);
    assert_eq!(plan.status, SolveStatus::NotSolved);
    assert_eq!(plan.summary.skipped_count, 1);
    assert_eq!(plan.summary.skipped_demand, 5);
    assert_eq!(plan.summary.allocated_count, 0);
    assert_eq!(
        plan.decision("i1").map(|d| d.status.clone()),
        Some(ItemStatus::Skipped {
            reason: SkipReason::NoCompatiblePlant
        })
    );
    assert_eq!(
        plan.skipped_by_model.get("M1"),
        Some(&vec!["i1".to_string()])
    );

    Ok(())
}

#[test]
fn best_packing_leaves_one_small_item_unallocated() -> TestResult {
    let plants = vec![Plant::new("P1", 5, ["M1"]), Plant::new("P2", 3, ["M1"])];
    let items = vec![
        Item::new("big", "M1", 4, "O1", today()),
        Item::new("small-a", "M1", 2, "O1", today()),
        Item::new("small-b", "M1", 2, "O1", today()),
    ];

    let problem = AllocationProblem::new(items, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_reconciles(&plan, 3);
    assert_eq!(plan.summary.total_allocated_quantity, 6);
    assert_eq!(plan.summary.allocated_count, 2);
    assert_eq!(plan.summary.skipped_count, 0);
    assert_eq!(plan.decision("big").and_then(|d| d.plant()), Some("P1"));

    let unallocated: Vec<&AllocationDecision> = plan.unallocated().collect();

    assert_eq!(unallocated.len(), 1);
    assert!(unallocated.iter().all(|d| d.quantity == 2));
    assert!(unallocated.iter().all(|d| {
        d.status
            == ItemStatus::Unallocated {
                reason: UnallocatedReason::InsufficientCapacity,
            }
    }));

    Ok(())
}

#[test]
fn zero_quantity_takes_precedence_over_compatibility() -> TestResult {
    let plants = vec![Plant::new("P1", 10, ["M1"])];
    let items = vec![
        Item::new("unknown-model", "M9", 0, "O1", today()),
        Item::new("known-model", "M1", 0, "O1", today()),
        Item::new("real", "M1", 4, "O1", today()),
    ];

    let problem = AllocationProblem::new(items, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_reconciles(&plan, 3);
    assert_eq!(plan.summary.zero_quantity_items_count, 2);
    assert_eq!(plan.zero_quantity().count(), 2);
    assert_eq!(plan.summary.skipped_count, 0);
    assert_eq!(plan.decision("real").and_then(|d| d.plant()), Some("P1"));

    Ok(())
}

#[test]
fn too_large_for_every_single_plant_is_skipped() -> TestResult {
    let plants = vec![Plant::new("P1", 5, ["M1"]), Plant::new("P2", 5, ["M1"])];
    let items = vec![
        // fits the aggregate but no single plant
        Item::new("too-large", "M1", 8, "O1", today()),
        // exceeds even the aggregate: stays modelled and competes
        Item::new("huge", "M1", 12, "O1", today()),
        Item::new("fits", "M1", 5, "O1", today()),
    ];

    let problem = AllocationProblem::new(items, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_reconciles(&plan, 3);
    assert_eq!(
        plan.decision("too-large").map(|d| d.status.clone()),
        Some(ItemStatus::Skipped {
            reason: SkipReason::TooLargeForAnyPlant
        })
    );
    assert_eq!(
        plan.decision("huge").map(|d| d.status.clone()),
        Some(ItemStatus::Unallocated {
            reason: UnallocatedReason::InsufficientCapacity
        })
    );
    assert!(plan.decision("fits").and_then(|d| d.plant()).is_some());
    assert_eq!(plan.summary.skipped_demand, 8);

    Ok(())
}

#[test]
fn overdue_item_wins_scarce_capacity() -> TestResult {
    let plants = vec![Plant::new("P1", 10, ["M1"])];
    let items = vec![
        Item::new("later", "M1", 10, "O1", today().checked_add(20.days())?),
        Item::new("overdue", "M1", 10, "O2", today().checked_sub(5.days())?),
    ];

    let problem = AllocationProblem::new(items, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_reconciles(&plan, 2);
    assert_eq!(plan.decision("overdue").and_then(|d| d.plant()), Some("P1"));
    assert_eq!(plan.decision("later").and_then(|d| d.plant()), None);

    Ok(())
}

#[test]
fn more_overdue_beats_less_overdue() -> TestResult {
    let plants = vec![Plant::new("P1", 10, ["M1"])];
    let items = vec![
        Item::new("three-days", "M1", 10, "O1", today().checked_sub(3.days())?),
        Item::new("ten-days", "M1", 10, "O2", today().checked_sub(10.days())?),
    ];

    let problem = AllocationProblem::new(items, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;

    assert_eq!(plan.decision("ten-days").and_then(|d| d.plant()), Some("P1"));
    assert_eq!(plan.urgency.max_overdue_days, 10);

    Ok(())
}

#[test]
fn summary_counts_orders_models_and_capacity() -> TestResult {
    let plants = vec![Plant::new("P1", 20, ["M1", "M2"]), Plant::new("P2", 5, ["M2"])];
    let orders = [
        Order::new("O1", today())
            .with_line(OrderLine::new("M1", 6))
            .with_line(OrderLine::new("M2", 4).with_submodel("blue")),
        Order::new("O2", today()).with_line(OrderLine::new("M3", 2).named("orphan")),
    ];

    let problem =
        AllocationProblem::from_orders(&orders, plants, WeightsConfig::default(), today())?;
    let plan = Allocator::new().allocate(&problem)?;
    let summary = &plan.summary;

    assert_reconciles(&plan, 3);
    assert_eq!(summary.plants_count, 2);
    assert_eq!(summary.orders_count, 2);
    assert_eq!(summary.unique_models_count, 3);
    assert_eq!(summary.total_capacity, 25);
    assert_eq!(summary.total_demand, 12);
    assert_eq!(summary.capacity_minus_demand, 13);
    assert_eq!(summary.total_allocated_quantity, 10);
    assert_eq!(
        plan.decision("O1/2").and_then(|d| d.submodel.as_deref()),
        Some("blue")
    );
    assert_eq!(
        plan.decision("orphan").map(|d| d.status.clone()),
        Some(ItemStatus::Skipped {
            reason: SkipReason::NoCompatiblePlant
        })
    );

    Ok(())
}
