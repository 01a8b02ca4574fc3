use std::collections::VecDeque;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use super::escalation::{probe_with_escalation, ProbeKind};
use super::session::{LoginFlow, Session};
use crate::catalog::{pick_client, pick_user};
use crate::metrics::MetricsRecorder;
use crate::models::Realm;
use crate::oidc::{AuthFailure, Endpoints, IdentityProvider};

/// A worker's session pool could not be built; the worker cannot run.
#[derive(Debug, Error)]
pub enum SetupFailure {
    #[error("realm '{0}' has no clients or no users")]
    EmptyRealm(String),

    #[error("setup login {index} of {size} failed: {source}")]
    Login {
        index: usize,
        size: usize,
        #[source]
        source: AuthFailure,
    },

    #[error("session pool size must be at least 1")]
    EmptyPool,

    #[error("setup did not complete within {0:?}")]
    Timeout(std::time::Duration),
}

/// What a pooled iteration does with the session at the head of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStep {
    Refresh,
    Probe(ProbeKind),
}

/// Fixed set of authenticated sessions owned by one worker, used in FIFO order.
///
/// Each iteration takes the head with `pop_front` and returns it with
/// `push_back`, so over `len()` iterations every session is used exactly once.
#[derive(Debug, Default)]
pub struct SessionPool {
    sessions: VecDeque<Session>,
}

impl SessionPool {
    pub fn new(sessions: impl IntoIterator<Item = Session>) -> Self {
        Self {
            sessions: sessions.into_iter().collect(),
        }
    }

    /// Issues `size` sequential password logins, each with a random client and
    /// user of `realm`. Any failed login fails the whole setup.
    pub async fn build<P, R>(
        provider: &P,
        endpoints: &Endpoints,
        realm: &Realm,
        size: usize,
        rng: &mut R,
    ) -> Result<Self, SetupFailure>
    where
        P: IdentityProvider + ?Sized,
        R: Rng + Send + ?Sized,
    {
        info!(
            realm = realm.id.as_str(),
            size, "Building session pool"
        );

        let mut sessions = VecDeque::with_capacity(size);
        for index in 0..size {
            let (client, user) = match (pick_client(realm, rng), pick_user(realm, rng)) {
                (Some(client), Some(user)) => (client, user),
                _ => return Err(SetupFailure::EmptyRealm(realm.id.clone())),
            };

            let session = Session::establish(
                provider,
                endpoints,
                &realm.id,
                client,
                user,
                LoginFlow::Password,
            )
            .await
            .map_err(|source| SetupFailure::Login {
                index,
                size,
                source,
            })?;

            debug!(
                realm = realm.id.as_str(),
                index,
                client_id = client.client_id.as_str(),
                username = user.username.as_str(),
                "Session established"
            );
            sessions.push_back(session);
        }

        Ok(Self { sessions })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Takes the least recently used session.
    pub fn pop_front(&mut self) -> Option<Session> {
        self.sessions.pop_front()
    }

    /// Returns a session to the tail of the rotation.
    pub fn push_back(&mut self, session: Session) {
        self.sessions.push_back(session);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Applies `step` to the head session and moves it to the tail.
    ///
    /// The session goes back even when the step fails, keeping its last known
    /// good tokens. Returns `None` when the pool is empty.
    pub async fn rotate<P, M>(
        &mut self,
        provider: &P,
        endpoints: &Endpoints,
        step: PoolStep,
        metrics: &M,
    ) -> Option<Result<(), AuthFailure>>
    where
        P: IdentityProvider + ?Sized,
        M: MetricsRecorder,
    {
        let mut session = self.sessions.pop_front()?;
        let result = match step {
            PoolStep::Refresh => session.refresh(provider, endpoints).await,
            PoolStep::Probe(kind) => {
                probe_with_escalation(provider, endpoints, &mut session, kind, metrics)
                    .await
                    .map(|_| ())
            }
        };
        self.sessions.push_back(session);
        Some(result)
    }
}
