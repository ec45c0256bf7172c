//! # Circuit Breaker Configuration Validator
//!
//! Command-line tool for validating circuit breaker settings across
//! environments before a service starts with them.

use anyhow::{Context, Result};
use atomic_circuit::config::{CircuitBreakerSettings, ComponentBreakerConfig, SettingsLoader};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate circuit breaker settings files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment whose override file is applied (development, test, production, ...)
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory path (default: $ATOMIC_CIRCUIT_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Ignore ATOMIC_CIRCUIT__* environment variable overrides
    #[arg(long)]
    no_env: bool,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate all settings
    Validate,

    /// Show the resolved configuration for one component
    Component {
        /// Component name; unknown names resolve to the default config
        name: String,
    },

    /// Show every configured component
    Show,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = load_settings(&cli).and_then(|settings| match &cli.command {
        Some(Commands::Validate) | None => report_valid(&cli, &settings),
        Some(Commands::Component { name }) => show_component(&cli, &settings, name),
        Some(Commands::Show) => show_all(&cli, &settings),
    });

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<CircuitBreakerSettings> {
    let defaults = SettingsLoader::from_env();
    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| defaults.config_directory().to_path_buf());
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(|| defaults.environment().to_string());

    let mut loader = SettingsLoader::new(config_dir, environment);
    if cli.no_env {
        loader = loader.without_env_overrides();
    }

    loader.load().with_context(|| {
        format!(
            "failed to load settings for environment '{}' from {}",
            loader.environment(),
            loader.config_directory().display()
        )
    })
}

fn report_valid(cli: &Cli, settings: &CircuitBreakerSettings) -> Result<()> {
    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(settings)?),
        OutputFormat::Table => {
            println!("✅ Circuit breaker settings are valid");
            println!("   Components configured: {}", settings.component_configs.len());
            println!("   Max circuit breakers:  {}", settings.max_circuit_breakers);
        }
    }
    Ok(())
}

fn show_component(cli: &Cli, settings: &CircuitBreakerSettings, name: &str) -> Result<()> {
    let config = settings.config_for_component(name);
    let source = if settings.component_configs.contains_key(name) {
        "component"
    } else {
        "default"
    };

    match cli.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "component": name,
                "source": source,
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            print_header();
            print_row(name, &config);
            println!("(resolved from {source} config)");
        }
    }
    Ok(())
}

fn show_all(cli: &Cli, settings: &CircuitBreakerSettings) -> Result<()> {
    let mut names: Vec<&String> = settings.component_configs.keys().collect();
    names.sort();

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(settings)?),
        OutputFormat::Table => {
            print_header();
            print_row("<default>", &settings.default_config);
            for name in names {
                print_row(name, &settings.component_configs[name]);
            }
        }
    }
    Ok(())
}

fn print_header() {
    println!(
        "{:<24} {:>10} {:>10} {:>12}",
        "COMPONENT", "FAILURES", "SUCCESSES", "RESET (ms)"
    );
}

fn print_row(name: &str, config: &ComponentBreakerConfig) {
    println!(
        "{:<24} {:>10} {:>10} {:>12}",
        name, config.failure_threshold, config.success_threshold, config.reset_timeout_ms
    );
}
