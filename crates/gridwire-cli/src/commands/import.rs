//! Import command implementation.

use std::fs;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use gridwire_import::{CircuitHost, Importer, Workspace};
use gridwire_ir::{CircuitId, SchemaCatalog, TypeId};

use super::common::{load_config, load_record};

/// A placed component, as reported.
#[derive(Debug, Serialize)]
struct PlacedComponent {
    id: u32,
    #[serde(rename = "type")]
    ty: String,
    x: i32,
    y: i32,
}

/// Registration summary written with `--output`.
#[derive(Debug, Serialize)]
struct Summary {
    circuit: u32,
    component_type: Option<u32>,
    reused: bool,
    components: Vec<PlacedComponent>,
}

/// Execute the import command.
pub fn execute(input: &str, config: Option<&str>, composite: bool, output: Option<&str>) -> Result<()> {
    println!(
        "{} Importing {}{}",
        style("→").cyan().bold(),
        style(input).green(),
        if composite { " as a composite type" } else { "" }
    );

    let config = load_config(config)?;
    let mut workspace = Workspace::new();
    let record = load_record(input, workspace.catalog())?;
    println!(
        "  Loaded: {} components, {} links, {} dependencies",
        record.num_components(),
        record.links().len(),
        record.dependencies().count()
    );

    let importer = Importer::new(config);
    let registration = importer
        .import(record, composite, &mut workspace)
        .context("Import rejected")?;
    info!("Imported '{}' as {}", input, registration.circuit);

    println!(
        "{} Registered as circuit {}",
        style("✓").green().bold(),
        registration.circuit
    );
    if let Some(ty) = registration.component_type {
        let name = workspace
            .catalog()
            .schema(ty)
            .map(|s| format!("{}/{}", s.path(), s.name()))
            .unwrap_or_default();
        println!("  Component type: {} {}", ty, style(name).yellow());
    }
    if registration.reused {
        println!("  {}", style("Identity was already registered").dim());
    }

    let components = placements(&workspace, registration.circuit);
    for placed in &components {
        println!("  #{:<5} {:<16} ({}, {})", placed.id, placed.ty, placed.x, placed.y);
    }

    if let Some(path) = output {
        let summary = Summary {
            circuit: registration.circuit.0,
            component_type: registration.component_type.map(|ty| ty.0),
            reused: registration.reused,
            components,
        };
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
        debug!("Wrote summary of {} components to {}", summary.components.len(), path);
        println!("  Output: {}", style(path).green());
    }

    Ok(())
}

fn placements(workspace: &Workspace, circuit: CircuitId) -> Vec<PlacedComponent> {
    let host = workspace.host();
    host.components(circuit)
        .into_iter()
        .filter_map(|id| {
            let ty = host.type_of(circuit, id)?;
            let position = host.position_of(circuit, id)?;
            Some(PlacedComponent {
                id: id.0,
                ty: type_name(workspace.catalog(), ty),
                x: position.x,
                y: position.y,
            })
        })
        .collect()
}

fn type_name(catalog: &SchemaCatalog, ty: TypeId) -> String {
    catalog
        .schema(ty)
        .map_or_else(|| ty.to_string(), |s| s.name().to_string())
}
