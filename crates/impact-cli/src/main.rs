//! impact - estimate the energy and environmental impact of LLM requests

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use impact_core::{Config, ImpactEngine, Provider};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::compute::ComputeArgs;
use output::OutputFormat;

/// Estimate the energy and environmental impact of LLM inference requests
#[derive(Debug, Parser)]
#[command(name = "impact")]
#[command(about = "Estimate the energy and environmental impact of LLM inference requests")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Model catalog path (overrides the configured catalog)
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable JSON output (overrides --output)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Estimate the impacts of one request
    #[command(name = "compute")]
    Compute {
        /// Model name or alias
        #[arg(short, long)]
        model: String,

        /// Require the model to belong to this provider
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Number of generated output tokens
        #[arg(short, long)]
        tokens: u64,

        /// Measured request latency in seconds
        #[arg(short, long)]
        latency: f64,

        /// Geography code of the serving datacenter
        #[arg(short, long)]
        geo: Option<String>,
    },

    /// List catalog models
    #[command(name = "models")]
    Models {
        /// Filter by provider
        #[arg(short, long)]
        provider: Option<Provider>,
    },

    /// Show model details
    #[command(name = "describe-model")]
    DescribeModel {
        /// Model name or alias
        model: String,
    },

    /// Show the effective hardware profile
    #[command(name = "hardware")]
    Hardware,
}

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("impact_cli={},impact_core={}", log_level, log_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    debug!("Starting impact CLI with args: {:?}", cli);

    let config = load_config(cli.config.as_ref())?;

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        cli.output
    };

    match cli.command {
        Commands::Compute { model, provider, tokens, latency, geo } => {
            let catalog = commands::load_catalog(&config, cli.catalog.as_deref())?;
            let engine = ImpactEngine::new(config.electricity_table());
            let args = ComputeArgs {
                model,
                provider,
                output_tokens: tokens,
                latency_seconds: latency,
                geography: geo.unwrap_or_else(|| config.electricity.default_geography.clone()),
            };
            commands::compute::compute(&catalog, &engine, &config.hardware, args, output_format)?;
        }

        Commands::Models { provider } => {
            let catalog = commands::load_catalog(&config, cli.catalog.as_deref())?;
            commands::models::list_models(&catalog, provider, output_format)?;
        }

        Commands::DescribeModel { model } => {
            let catalog = commands::load_catalog(&config, cli.catalog.as_deref())?;
            commands::models::describe_model(&catalog, &model, output_format)?;
        }

        Commands::Hardware => {
            commands::hardware::show_hardware(&config.hardware, output_format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert()
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "impact", "compute", "--model", "gpt-4", "--tokens", "200", "--latency", "4.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Compute { model, provider, tokens, latency, geo } => {
                assert_eq!(model, "gpt-4");
                assert!(provider.is_none());
                assert_eq!(tokens, 200);
                assert_eq!(latency, 4.5);
                assert!(geo.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["impact", "models", "--provider", "mistralai"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models { provider: Some(Provider::MistralAi) }
        ));

        let cli = Cli::try_parse_from(["impact", "describe-model", "gpt-4"]).unwrap();
        assert!(matches!(cli.command, Commands::DescribeModel { .. }));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(Cli::try_parse_from(["impact", "models", "--provider", "acme"]).is_err());
    }

    #[test]
    fn test_output_format() {
        let cli = Cli::try_parse_from(["impact", "--json", "hardware"]).unwrap();
        assert!(cli.json);

        let cli = Cli::try_parse_from(["impact", "hardware", "--output", "yaml"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Yaml);
    }
}
