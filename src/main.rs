//! rolegate CLI
//!
//! Validates rule files and evaluates single requests against them.

use clap::{Parser, Subcommand};
use rolegate::{
    PermissionState,
    config::{EngineConfig, LogFormat, load_config},
    controller::{Controller, ReloadSchedule, with_reload_schedule},
    loader::{JsonFileLoader, RuleLoader, RulesFormat, YamlFileLoader},
};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Role-based access control for HTTP requests
#[derive(Parser, Debug)]
#[command(name = "rolegate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "ROLEGATE_CONFIG")]
    config: Option<String>,

    /// Rules file, overriding the configured one
    #[arg(short, long, global = true, env = "ROLEGATE_RULES")]
    rules: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ROLEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the rules file and report every invalid rule
    Validate,

    /// Evaluate one request; exits 0 only when strictly granted
    Check {
        #[arg(long)]
        host: String,

        #[arg(long)]
        path: String,

        #[arg(long)]
        method: String,

        /// Role held by the caller (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Decision<'a> {
    host: &'a str,
    path: &'a str,
    method: &'a str,
    roles: &'a [String],
    state: PermissionState,
    granted: bool,
}

fn init_logging(config: &EngineConfig, level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(&config.logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn validate(config: &EngineConfig) -> anyhow::Result<ExitCode> {
    let path = config.rules.expanded_path();
    let loaded = match config.rules.resolved_format()? {
        RulesFormat::Json => JsonFileLoader::new(&path)?.load()?,
        RulesFormat::Yaml => YamlFileLoader::new(&path)?.load()?,
    };

    match loaded.validate() {
        Ok(()) => {
            println!("{}: {} valid rule(s)", path.display(), loaded.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}: {}", path.display(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check(
    config: &EngineConfig,
    host: &str,
    path: &str,
    method: &str,
    roles: &[String],
    json: bool,
) -> anyhow::Result<ExitCode> {
    // One-shot evaluation never needs the reload task
    let controller = Controller::new([
        config.controller_option()?,
        with_reload_schedule(ReloadSchedule::Disabled),
    ])
    .inspect_err(|e| error!(error = %e, "Failed to load rules"))?;

    let state = controller.query(host, path, method, roles)?;

    if json {
        let decision = Decision {
            host,
            path,
            method,
            roles,
            state,
            granted: state.is_granted(),
        };
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!("{}", state);
    }

    Ok(if state.is_granted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> anyhow::Result<ExitCode> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(rules) = args.rules {
        config.rules.path = rules;
        config.rules.format = None;
    }

    init_logging(&config, args.log_level.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rules = %config.rules.path,
        "Starting rolegate"
    );

    match args.command {
        Command::Validate => validate(&config),
        Command::Check {
            host,
            path,
            method,
            roles,
            json,
        } => check(&config, &host, &path, &method, &roles, json),
    }
}
