//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - circuit import, validation and auto-layout",
        style("Gridwire").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  gridwire-ir      Circuit intermediate representation");
    println!("  gridwire-import  Validation, layout and registration pipeline");
    println!("  gridwire-cli     Command-line interface");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
