mod commands;
mod output;
mod params;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dswarm_core::config;
use miette::Result;
use tracing::info;

use crate::params::CommandKind;

#[derive(Parser)]
#[command(name = "dswarm-tools")]
#[command(about = "Backup and restore for d:swarm projects, data models and data model content")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export all projects into a directory, one JSON file per project
    ExportProjects {
        /// Parameters as -key=value, see --help
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        params: Vec<String>,
    },
    /// Import all project files of a directory, one project at a time
    ImportProjects {
        /// Parameters as -key=value, see --help
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        params: Vec<String>,
    },
    /// Export the content of every input data model of every project
    ExportDatamodelsContent {
        /// Parameters as -key=value, see --help
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        params: Vec<String>,
    },
    /// Write data model content files back into the graph extension
    ImportDatamodelsContent {
        /// Parameters as -key=value, see --help
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        params: Vec<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "dswarm-tools.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::{EnvFilter, fmt};

    // RUST_LOG wins over the built-in levels
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("dswarm_core=debug,dswarm_cli=debug,warn")
        } else {
            EnvFilter::new("dswarm_core=info,dswarm_cli=info,warn")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        config::load_config_from_standard_locations().await?
    };
    config.apply_env();

    match &cli.command {
        Commands::ExportProjects { params } => {
            commands::run(CommandKind::ExportProjects, params, &config).await?
        }
        Commands::ImportProjects { params } => {
            commands::run(CommandKind::ImportProjects, params, &config).await?
        }
        Commands::ExportDatamodelsContent { params } => {
            commands::run(CommandKind::ExportDataModelsContent, params, &config).await?
        }
        Commands::ImportDatamodelsContent { params } => {
            commands::run(CommandKind::ImportDataModelsContent, params, &config).await?
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config).await?,
            ConfigCommands::Save { path } => commands::config::save(&config, path).await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hyphenated_parameters_reach_the_command() {
        let cli = Cli::try_parse_from([
            "dswarm-tools",
            "export-projects",
            "-dswarm-backend-api=http://localhost:8087/dmp",
            "-export-directory-name=/tmp/export",
        ])
        .unwrap();

        match cli.command {
            Commands::ExportProjects { params } => assert_eq!(
                params,
                vec![
                    "-dswarm-backend-api=http://localhost:8087/dmp".to_string(),
                    "-export-directory-name=/tmp/export".to_string(),
                ]
            ),
            _ => panic!("expected export-projects"),
        }
    }

    #[test]
    fn test_command_names() {
        let cli = Cli::try_parse_from([
            "dswarm-tools",
            "--debug",
            "import-datamodels-content",
            "-import-directory-name=content",
        ])
        .unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::ImportDatamodelsContent { .. }));
    }
}
