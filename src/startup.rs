//! Load test startup.
//!
//! Loads the realm catalog, builds the OIDC client and shared metrics, runs
//! the workers and finally dumps the collected metrics.

use std::sync::Arc;

use tracing::info;

use crate::catalog::RealmCatalog;
use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::oidc::{OidcClient, OidcClientConfig};
use crate::state::RunState;
use crate::worker::{run_workers, RunSummary};

/// Runs a complete load test with the given configuration.
///
/// # Errors
///
/// Returns an error if the realm fixtures cannot be loaded, the HTTP client
/// cannot be built or the metrics cannot be written.
pub async fn run(config: Arc<ConfigV1>) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let catalog = Arc::new(RealmCatalog::load(&config.data_dir, config.realm_count)?);
    let metrics = Metrics::new();
    let provider = OidcClient::new(
        OidcClientConfig {
            offline_tokens: config.offline_tokens,
            request_timeout: config.request_timeout(),
        },
        metrics.clone(),
    )?;

    info!(
        provider_url = config.provider_url.as_str(),
        realms = catalog.len(),
        scenario = config.scenario.as_str(),
        offline_tokens = config.offline_tokens,
        "Starting load test"
    );

    let state = RunState {
        config: config.clone(),
        catalog,
        provider: Arc::new(provider),
        metrics: metrics.clone(),
    };

    let summary = run_workers(state).await;

    let error_rate = metrics.publish_error_rate();
    info!(error_rate, "Iteration error rate");

    let rendered = metrics.render();
    match &config.metrics_output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            info!("Metrics written to '{}'", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(summary)
}
