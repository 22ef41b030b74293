mod registered_bundles;

use anyhow::Result;
use bundlekit::config::bundle_settings;
use bundlekit::discovered_bundles;
use bundlekit_bootstrap::{AppConfig, CliArgs};
use clap::{Parser, Subcommand};

use std::path::PathBuf;

/// Bundle host - runs in-process bundles over a shared service registry
#[derive(Parser)]
#[command(name = "bundle-host")]
#[command(about = "Bundle host - runs in-process bundles over a shared service registry")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start all bundles and run until Ctrl+C / SIGTERM
    Run,
    /// Validate configuration and list linked bundles
    Check,
    /// Start all bundles, then shut down immediately
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // defaults -> YAML (if provided) -> env (BUNDLE_HOST__*) -> CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    bundlekit_bootstrap::init_logging(&config.logging)?;

    if args.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check => {
            check(&config);
            Ok(())
        }
        Commands::Once => once(config),
    }
}

async fn run(config: AppConfig) -> Result<()> {
    tracing::info!("bundle host starting");
    let cancel = bundlekit_bootstrap::shutdown_token();
    let host = bundlekit_bootstrap::build_host(config)?;

    let report = bundlekit_bootstrap::run_until_cancelled(&host, &cancel).await;
    tracing::info!(
        started = report.started.len(),
        failed = report.failed.len(),
        "bundle host stopped"
    );
    Ok(())
}

fn once(config: AppConfig) -> Result<()> {
    let host = bundlekit_bootstrap::build_host(config)?;
    let report = bundlekit_bootstrap::run_once(&host);

    for name in &report.started {
        println!("started {name}");
    }
    for (name, err) in &report.failed {
        println!("failed  {name}: {err}");
    }

    if !report.is_success() {
        anyhow::bail!("{} bundle(s) failed to start", report.failed.len());
    }
    Ok(())
}

fn check(config: &AppConfig) {
    tracing::info!("checking configuration");
    println!("Configuration is valid");

    let linked = discovered_bundles();
    println!("Bundles:");
    for descriptor in &linked {
        let settings = bundle_settings(config, descriptor.name);
        let run_level = settings.run_level.unwrap_or(descriptor.run_level);
        let status = if settings.enabled {
            "enabled"
        } else {
            "disabled"
        };
        println!("  {:<12} run_level={run_level:<4} {status}", descriptor.name);
    }

    for name in config.bundle_names() {
        if !linked.iter().any(|d| d.name == name) {
            tracing::warn!(bundle = %name, "configuration section for a bundle that is not linked");
        }
    }
}
