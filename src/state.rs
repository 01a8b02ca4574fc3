//! Shared run state.
//!
//! Everything here is either immutable after start-up or internally
//! synchronized, so workers can clone it freely.

use std::sync::Arc;

use crate::catalog::RealmCatalog;
use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::oidc::IdentityProvider;

/// State shared by every worker of a run.
#[derive(Clone)]
pub struct RunState {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Read-only realm fixtures.
    pub catalog: Arc<RealmCatalog>,
    /// Protocol engine used for every provider call.
    pub provider: Arc<dyn IdentityProvider>,
    /// Prometheus counters for requests, checks and iterations.
    pub metrics: Metrics,
}
