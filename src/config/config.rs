use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use crate::worker::Scenario;

/// Prefix of the environment variables overriding the config file,
/// e.g. `OIDC_LOAD_PROVIDER_URL`, `OIDC_LOAD_WORKERS`.
pub const ENV_PREFIX: &str = "OIDC_LOAD_";

/// Complete configuration of a load test run.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    /// Identity provider base URL, e.g. `http://keycloak:8080/auth`.
    pub provider_url: String,
    /// Number of realm fixtures to load (`realm-000.json` ..).
    pub realm_count: usize,
    /// Request `offline_access` tokens.
    #[serde(default)]
    pub offline_tokens: bool,
    /// Sessions built per worker for the pooled scenarios.
    #[serde(default = "default_session_pool_size")]
    pub session_pool_size: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Time over which worker start-up is spread.
    #[serde(default = "default_ramp_up_in_secs")]
    pub ramp_up_in_secs: u64,
    /// Time the full set of workers keeps iterating after ramp-up.
    #[serde(default = "default_steady_state_in_secs")]
    pub steady_state_in_secs: u64,
    #[serde(default = "default_setup_timeout_in_secs")]
    pub setup_timeout_in_secs: u64,
    /// Deadline of a single provider request.
    #[serde(default = "default_request_timeout_in_secs")]
    pub request_timeout_in_secs: u64,
    /// Pause between iterations; scenario default when absent.
    #[serde(default)]
    pub pause_in_ms: Option<u64>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub scenario: Scenario,
    /// Where to write the Prometheus text dump; stdout when absent.
    #[serde(default)]
    pub metrics_output: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_session_pool_size() -> usize {
    1000
}

fn default_workers() -> usize {
    10
}

fn default_ramp_up_in_secs() -> u64 {
    20
}

fn default_steady_state_in_secs() -> u64 {
    120
}

fn default_setup_timeout_in_secs() -> u64 {
    3600
}

fn default_request_timeout_in_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl ConfigV1 {
    pub fn ramp_up(&self) -> Duration {
        Duration::from_secs(self.ramp_up_in_secs)
    }

    pub fn steady_state(&self) -> Duration {
        Duration::from_secs(self.steady_state_in_secs)
    }

    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_in_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_in_secs)
    }

    /// Pause between two iterations of the configured scenario.
    pub fn pause(&self) -> Duration {
        self.pause_in_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.scenario.default_pause())
    }
}

/// Layers the YAML file (optional) under `OIDC_LOAD_*` environment variables.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads the configuration; a scenario given on the command line wins over both layers.
pub fn load_config(path: &Path, scenario: Option<Scenario>) -> Result<ConfigV1, figment::Error> {
    let mut figment = figment(path);
    if let Some(scenario) = scenario {
        figment = figment.merge(Serialized::default("scenario", scenario));
    }
    figment.extract::<ConfigV1>()
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(ConfigV1);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
