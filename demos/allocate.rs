//! Allocation Example
//!
//! Loads a fixture set, allocates its orders to its plants and prints the plan.
//!
//! Use `-f` to load a fixture set by name
//! Use `--json` to print the plan as JSON instead of Markdown tables
//! Set `RUST_LOG=plant_alloc=debug` to see the model sizes and coefficients

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::Zoned;
use plant_alloc::{
    allocator::Allocator, fixtures::Fixture, plan::report::write_markdown,
    utils::AllocateArgs,
};
use tracing_subscriber::EnvFilter;

/// Allocation Example
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = AllocateArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let problem = fixture.problem(Zoned::now().date())?;

    let plan = Allocator::new()
        .with_options(args.solve_options())
        .allocate(&problem)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.json {
        writeln!(handle, "{}", plan.to_json()?)?;
    } else {
        write_markdown(&plan, &mut handle)?;
    }

    writeln!(handle, "Solution: {}", plan.elapsed.human(Truncate::Nano))?;

    Ok(())
}
