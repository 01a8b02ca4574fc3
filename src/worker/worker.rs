use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use super::scenario::Scenario;
use crate::catalog::{pick_client, pick_user};
use crate::metrics::MetricsRecorder;
use crate::models::{Client, User};
use crate::oidc::{AuthFailure, Endpoints};
use crate::session::{
    probe_with_escalation, LoginFlow, PoolStep, ProbeKind, Session, SessionPool, SetupFailure,
};
use crate::state::RunState;

/// Why an iteration failed.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("realm '{0}' has no clients or no users")]
    EmptyRealm(String),

    #[error("session pool is empty")]
    PoolExhausted,
}

impl IterationError {
    pub fn is_transient(&self) -> bool {
        match self {
            IterationError::Auth(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Sessions a worker keeps between iterations.
enum Sessions {
    /// Fresh login every iteration; nothing is kept.
    Fresh,
    /// One client/user picked at setup, logged in lazily on first use.
    Single {
        client: Client,
        user: User,
        session: Option<Session>,
    },
    Pool(SessionPool),
}

/// Per-worker counters returned at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub iterations: u64,
    pub failures: u64,
}

/// One simulated user: an assigned realm, its own RNG and its own sessions.
/// Nothing in a worker is shared with other workers.
pub struct Worker {
    id: usize,
    scenario: Scenario,
    state: RunState,
    endpoints: Endpoints,
    rng: StdRng,
    sessions: Sessions,
}

impl Worker {
    /// Assigns the realm (`id mod realm_count`) and prepares the scenario's sessions.
    /// For pooled scenarios this performs `session_pool_size` logins, bounded by
    /// the setup timeout.
    pub async fn setup(id: usize, state: RunState) -> Result<Self, SetupFailure> {
        let scenario = state.config.scenario;
        let catalog = state.catalog.clone();
        let realm = catalog.realm_for_worker(id);
        let endpoints = Endpoints::for_realm(&state.config.provider_url, &realm.id);
        let mut rng = StdRng::seed_from_u64(id as u64);

        let sessions = match scenario {
            Scenario::Login => Sessions::Fresh,
            _ if scenario.uses_pool() => {
                let size = state.config.session_pool_size;
                if size == 0 {
                    return Err(SetupFailure::EmptyPool);
                }
                let setup_timeout = state.config.setup_timeout();
                let build = SessionPool::build(
                    state.provider.as_ref(),
                    &endpoints,
                    realm,
                    size,
                    &mut rng,
                );
                let pool = timeout(setup_timeout, build)
                    .await
                    .map_err(|_| SetupFailure::Timeout(setup_timeout))??;
                Sessions::Pool(pool)
            }
            _ => match (pick_client(realm, &mut rng), pick_user(realm, &mut rng)) {
                (Some(client), Some(user)) => Sessions::Single {
                    client: client.clone(),
                    user: user.clone(),
                    session: None,
                },
                _ => return Err(SetupFailure::EmptyRealm(realm.id.clone())),
            },
        };

        info!(
            worker_id = id,
            realm = realm.id.as_str(),
            scenario = scenario.as_str(),
            "Worker ready"
        );

        Ok(Self {
            id,
            scenario,
            state,
            endpoints,
            rng,
            sessions,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of sessions currently held (pool size, 1 for a logged-in single session).
    pub fn session_count(&self) -> usize {
        match &self.sessions {
            Sessions::Fresh => 0,
            Sessions::Single { session, .. } => usize::from(session.is_some()),
            Sessions::Pool(pool) => pool.len(),
        }
    }

    /// Runs one iteration and records exactly one success/failure indicator for it.
    /// The failure is returned so the caller can account for it.
    pub async fn run_iteration(&mut self) -> Result<(), IterationError> {
        let result = self.iterate().await;
        self.state
            .metrics
            .record_iteration(self.scenario.as_str(), result.is_ok());

        if let Err(e) = &result {
            if e.is_transient() {
                debug!(
                    worker_id = self.id,
                    scenario = self.scenario.as_str(),
                    error = %e,
                    "Iteration failed"
                );
            } else {
                warn!(
                    worker_id = self.id,
                    scenario = self.scenario.as_str(),
                    error = %e,
                    "Iteration failed"
                );
            }
        }
        result
    }

    /// Iterates until `deadline`, pausing between iterations.
    pub async fn run(mut self, deadline: Instant) -> WorkerReport {
        let pause = self.state.config.pause();
        let mut report = WorkerReport {
            worker_id: self.id,
            ..Default::default()
        };

        while Instant::now() < deadline {
            report.iterations += 1;
            if self.run_iteration().await.is_err() {
                report.failures += 1;
            }
            sleep_until(std::cmp::min(Instant::now() + pause, deadline)).await;
        }

        debug!(
            worker_id = self.id,
            iterations = report.iterations,
            failures = report.failures,
            "Worker finished"
        );
        report
    }

    async fn iterate(&mut self) -> Result<(), IterationError> {
        let provider = self.state.provider.as_ref();
        let metrics = &self.state.metrics;
        let endpoints = &self.endpoints;
        let realm = self.state.catalog.realm_for_worker(self.id);

        match &mut self.sessions {
            Sessions::Fresh => {
                let (client, user) =
                    match (pick_client(realm, &mut self.rng), pick_user(realm, &mut self.rng)) {
                        (Some(client), Some(user)) => (client, user),
                        _ => return Err(IterationError::EmptyRealm(realm.id.clone())),
                    };
                provider.login(endpoints, client, user).await?;
                Ok(())
            }

            Sessions::Single {
                client,
                user,
                session,
            } => {
                if session.is_none() {
                    *session = Some(
                        Session::establish(
                            provider,
                            endpoints,
                            &realm.id,
                            client,
                            user,
                            LoginFlow::Browser,
                        )
                        .await?,
                    );
                }
                // Established just above when it was missing
                let Some(session) = session.as_mut() else {
                    return Ok(());
                };
                match self.scenario {
                    Scenario::Tokeninfo => {
                        probe_with_escalation(
                            provider,
                            endpoints,
                            session,
                            ProbeKind::Introspect,
                            metrics,
                        )
                        .await?;
                    }
                    Scenario::Userinfo => {
                        probe_with_escalation(
                            provider,
                            endpoints,
                            session,
                            ProbeKind::Userinfo,
                            metrics,
                        )
                        .await?;
                    }
                    _ => session.refresh(provider, endpoints).await?,
                }
                Ok(())
            }

            Sessions::Pool(pool) => {
                let step = match self.scenario {
                    Scenario::PooledTokeninfo => PoolStep::Probe(ProbeKind::Introspect),
                    Scenario::PooledUserinfo => PoolStep::Probe(ProbeKind::Userinfo),
                    _ => PoolStep::Refresh,
                };
                pool.rotate(provider, endpoints, step, metrics)
                    .await
                    .ok_or(IterationError::PoolExhausted)?
                    .map_err(IterationError::from)
            }
        }
    }
}
