//! Plan Report
//!
//! Markdown rendering of an [`AllocationPlan`].

use std::io;

use tabled::{builder::Builder, settings::Style};
use thiserror::Error;

use crate::plan::{AllocationDecision, AllocationPlan, ItemStatus};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write the plan as Markdown.
///
/// # Errors
///
/// Returns a [`ReportError`] if writing to `out` fails.
pub fn write_markdown(plan: &AllocationPlan, mut out: impl io::Write) -> Result<(), ReportError> {
    let summary = &plan.summary;

    writeln!(out, "# Allocation\n")?;
    writeln!(out, "Status: `{}`\n", plan.status)?;

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);

    for (metric, value) in [
        ("Plants", summary.plants_count.to_string()),
        ("Orders", summary.orders_count.to_string()),
        ("Items", summary.items_count.to_string()),
        ("Models", summary.unique_models_count.to_string()),
        ("Total capacity", summary.total_capacity.to_string()),
        ("Total demand", summary.total_demand.to_string()),
        ("Capacity minus demand", summary.capacity_minus_demand.to_string()),
        ("Allocated items", summary.allocated_count.to_string()),
        ("Allocated quantity", summary.total_allocated_quantity.to_string()),
        ("Allocated ratio", format!("{:.1}%", summary.allocated_ratio * 100.0)),
        ("Unallocated items", summary.unallocated_count.to_string()),
        ("Skipped items", summary.skipped_count.to_string()),
        ("Skipped demand", summary.skipped_demand.to_string()),
        ("Zero-quantity items", summary.zero_quantity_items_count.to_string()),
        ("Plants used", summary.plants_used.to_string()),
        ("Extra plants", summary.extra_plants.to_string()),
    ] {
        builder.push_record([metric.to_string(), value]);
    }

    write_table(&mut out, builder)?;

    for plant in &plan.plants {
        writeln!(
            out,
            "## {}\n\nAllocated items: {}, quantity: {} / {}, unused: {} ({:.1}% utilised)\n",
            plant.name,
            plant.items.len(),
            plant.used_capacity,
            plant.capacity,
            plant.unused_capacity,
            plant.utilization_pct,
        )?;

        let placed: Vec<&AllocationDecision> = plan
            .allocated()
            .filter(|decision| decision.plant() == Some(plant.name.as_str()))
            .collect();

        if placed.is_empty() {
            writeln!(out, "_No items._\n")?;
            continue;
        }

        let mut builder = Builder::default();
        builder.push_record(["Item", "Order", "Model", "Submodel", "Quantity"]);

        for decision in placed {
            builder.push_record([
                decision.item.clone(),
                decision.order.clone(),
                decision.model.clone(),
                decision.submodel.clone().unwrap_or_default(),
                decision.quantity.to_string(),
            ]);
        }

        write_table(&mut out, builder)?;
    }

    write_reason_table(&mut out, "Unallocated", plan.unallocated())?;
    write_reason_table(&mut out, "Skipped", plan.skipped())?;

    writeln!(out, "## Objective\n")?;

    let mut builder = Builder::default();
    builder.push_record([
        "Objective",
        "Sense",
        "Weight",
        "Upper bound",
        "Coefficient",
        "Achieved",
        "Contribution",
    ]);

    for term in &plan.objective.additive {
        builder.push_record([
            term.name.clone(),
            term.sense.to_string(),
            format!("{:.3}", term.weight),
            format!("{:.1}", term.upper_bound),
            term.coefficient.to_string(),
            term.achieved.to_string(),
            term.contribution.to_string(),
        ]);
    }

    for (name, term) in [
        ("extra plants per model", &plan.objective.group),
        ("plants used", &plan.objective.plants),
    ]
    .into_iter()
    .chain(
        plan.objective
            .soft_min
            .as_ref()
            .map(|soft| ("soft minimum shortfall", &soft.penalty)),
    ) {
        builder.push_record([
            name.to_string(),
            "penalty".to_string(),
            format!("{:.3}", term.weight),
            term.normalizer.to_string(),
            term.coefficient.to_string(),
            term.achieved.to_string(),
            term.contribution.to_string(),
        ]);
    }

    write_table(&mut out, builder)?;

    if let Some(bound) = plan.objective.bound {
        writeln!(
            out,
            "Objective {:.1}, bound {:.1}, gap {:.1} ({:.4})\n",
            bound.objective_value, bound.best_objective_bound, bound.gap_abs, bound.gap_rel
        )?;
    } else if let Some(value) = plan.objective.objective_value {
        writeln!(out, "Objective {value:.1}\n")?;
    }

    Ok(())
}

fn write_reason_table<'a>(
    out: &mut impl io::Write,
    title: &str,
    decisions: impl Iterator<Item = &'a AllocationDecision>,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();
    builder.push_record(["Item", "Order", "Model", "Quantity", "Reason"]);

    let mut rows = 0_usize;

    for decision in decisions {
        let reason = match decision.status {
            ItemStatus::Unallocated { reason } => reason.as_str(),
            ItemStatus::Skipped { reason } => reason.as_str(),
            ItemStatus::Allocated { .. } | ItemStatus::ZeroQuantity => "",
        };

        builder.push_record([
            decision.item.clone(),
            decision.order.clone(),
            decision.model.clone(),
            decision.quantity.to_string(),
            reason.to_string(),
        ]);

        rows += 1;
    }

    writeln!(out, "## {title}\n")?;

    if rows == 0 {
        writeln!(out, "_None._\n")?;
        return Ok(());
    }

    write_table(out, builder)
}

fn write_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReportError> {
    let mut table = builder.build();
    table.with(Style::markdown());

    writeln!(out, "{table}\n")?;

    Ok(())
}
