use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use oidc_loadgen::config::{load_config, print_schema};
use oidc_loadgen::startup;
use oidc_loadgen::utils::logger::init_logging;
use oidc_loadgen::worker::Scenario;

/// Simulates concurrent users logging into an OpenID-Connect provider.
#[derive(Parser)]
#[command(name = "oidc-loadgen", version)]
struct Cli {
    /// YAML configuration file; `OIDC_LOAD_*` variables override it
    #[arg(short, long, default_value = "./config.yaml")]
    config: PathBuf,

    /// Scenario to run, overriding the configuration
    #[arg(short, long, value_enum)]
    scenario: Option<Scenario>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.print_schema {
        if let Err(e) = print_schema() {
            eprintln!("Error printing schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config(&cli.config, cli.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match startup::run(Arc::new(config)).await {
        Ok(summary) if summary.setup_failures == summary.workers && summary.workers > 0 => {
            error!("Every worker failed its setup");
            std::process::exit(2);
        }
        Ok(_) => {}
        Err(e) => {
            error!("Load test aborted: {}", e);
            std::process::exit(1);
        }
    }
}
