//! Catalog command implementation.

use console::style;

use gridwire_ir::SchemaCatalog;

/// Execute the catalog command.
pub fn execute() {
    let catalog = SchemaCatalog::with_builtins();

    println!("{}", style("Component types:").bold());
    for schema in catalog.schemas() {
        let ports: Vec<String> = schema
            .ports()
            .map(|p| format!("{}:{}", p.id, p.direction))
            .collect();
        println!(
            "  {:<4} {:<24} {:<6} {}",
            style(schema.id()).yellow(),
            format!("{}/{}", schema.path(), schema.name()),
            schema.size().to_string(),
            style(ports.join(" ")).dim()
        );
    }
}
