use std::path::Path;

use dswarm_core::config::{self, BackupConfig};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Print the effective configuration (file, then environment) as TOML.
pub async fn show(config: &BackupConfig) -> Result<()> {
    println!();
    println!("{}", "Current Configuration".bright_cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let toml_str = toml::to_string_pretty(config).into_diagnostic()?;
    println!("{}", toml_str);

    Ok(())
}

/// Save the effective configuration to `path`.
pub async fn save(config: &BackupConfig, path: &Path) -> Result<()> {
    let output = Output::new();
    output.kv("Saving configuration to", &path.display().to_string());

    config::save_config(config, path).await?;

    output.success("Configuration saved");
    println!();
    println!("To use this configuration, run:");
    println!(
        "  {} --config {} <COMMAND>",
        "dswarm-tools".bright_green(),
        path.display()
    );

    Ok(())
}
