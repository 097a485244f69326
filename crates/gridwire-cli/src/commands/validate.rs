//! Validate command implementation.

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use gridwire_import::{
    LayoutReport, NormalizeReport, RepairReport, ResolveReport, Validator, Workspace,
};

use super::common::{load_config, load_record};

/// Execute the validate command.
pub fn execute(input: &str, config: Option<&str>) -> Result<()> {
    println!("{} Validating {}", style("→").cyan().bold(), style(input).green());

    let config = load_config(config)?;
    let mut workspace = Workspace::new();
    let mut record = load_record(input, workspace.catalog())?;

    let validator = Validator::default();
    println!("  Stages: {}", validator.stage_names().join(" → "));

    let mut ctx = workspace.context(&config);
    validator
        .run(&mut record, &mut ctx)
        .context("Record rejected")?;
    ResolveReport::release(&mut ctx);
    debug!("Record '{}' validated", record.name());

    println!("{} Record is valid", style("✓").green().bold());

    if let Some(report) = ctx.get::<RepairReport>() {
        println!(
            "  Repair:    {} dangling dropped, {} duplicates collapsed, {} reciprocals added",
            report.dangling, report.duplicates, report.synthesized
        );
    }
    if let Some(report) = ctx.get::<NormalizeReport>() {
        println!(
            "  Normalize: {} snapped, {} demoted, {} coerced, {} ports derived",
            report.snapped, report.demoted, report.coerced, report.derived_ports
        );
    }
    if let Some(report) = ctx.get::<ResolveReport>() {
        println!(
            "  Resolve:   {} validated, {} registered, {} reused",
            report.validated, report.registered, report.reused
        );
    }
    if let Some(report) = ctx.get::<LayoutReport>() {
        println!(
            "  Layout:    {} placed in {} bands, {} demoted",
            report.placed, report.bands, report.demoted
        );
    }

    if let (Some(min), Some(max)) = (record.bounds().min(), record.bounds().max()) {
        println!("  Bounds:    {} .. {}", min, max);
    }

    Ok(())
}
