//! Re-authentication policy for long-lived sessions probed against the
//! introspection or userinfo endpoint.
//!
//! ```text
//! Authenticated --401--> Refreshing --ok--> Authenticated
//!                            |
//!                          failed
//!                            v
//!                     ReAuthenticating --ok--> Authenticated
//!                            |
//!                          failed --> error for this iteration
//! ```
//!
//! A probe answered with any other non-200 status is recorded as a failed
//! check and leaves the session untouched.

use tracing::{debug, info, warn};

use super::session::Session;
use crate::metrics::MetricsRecorder;
use crate::oidc::{AuthFailure, Endpoints, IdentityProvider};

/// Which endpoint the probe calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Introspect,
    Userinfo,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Introspect => "tokeninfo",
            ProbeKind::Userinfo => "userinfo",
        }
    }

    fn check_name(&self) -> &'static str {
        match self {
            ProbeKind::Introspect => "tokeninfo.status == 200",
            ProbeKind::Userinfo => "userinfo.status == 200",
        }
    }
}

/// What a probe call ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 200; the tokens are still good.
    Valid,
    /// Neither 200 nor 401: a failed check, no state change.
    Rejected(u16),
    /// 401 followed by a successful refresh.
    Refreshed,
    /// 401, refresh failed, full login succeeded.
    Reauthenticated,
}

async fn probe_status<P: IdentityProvider + ?Sized>(
    provider: &P,
    endpoints: &Endpoints,
    session: &Session,
    kind: ProbeKind,
) -> Result<u16, AuthFailure> {
    match kind {
        ProbeKind::Introspect => Ok(provider
            .introspect(endpoints, session.tokens(), &session.client)
            .await?
            .status),
        ProbeKind::Userinfo => Ok(provider.userinfo(endpoints, session.tokens()).await?.status),
    }
}

/// Probes once, escalating on 401 to exactly one refresh and, if that fails,
/// exactly one full login. No further retry happens within the call.
pub async fn probe_with_escalation<P, M>(
    provider: &P,
    endpoints: &Endpoints,
    session: &mut Session,
    kind: ProbeKind,
    metrics: &M,
) -> Result<ProbeOutcome, AuthFailure>
where
    P: IdentityProvider + ?Sized,
    M: MetricsRecorder,
{
    let status = probe_status(provider, endpoints, session, kind).await?;

    if status == 401 {
        info!(
            probe = kind.as_str(),
            username = session.user.username.as_str(),
            "Renewing access_token..."
        );
        match session.refresh(provider, endpoints).await {
            Ok(()) => {
                metrics.record_escalation(kind.as_str(), "refresh", true);
                return Ok(ProbeOutcome::Refreshed);
            }
            Err(e) => {
                metrics.record_escalation(kind.as_str(), "refresh", false);
                debug!(probe = kind.as_str(), error = %e, "Refresh failed, logging in again");
            }
        }

        info!(
            probe = kind.as_str(),
            username = session.user.username.as_str(),
            "Logging-in..."
        );
        return match session.reauthenticate(provider, endpoints).await {
            Ok(()) => {
                metrics.record_escalation(kind.as_str(), "login", true);
                Ok(ProbeOutcome::Reauthenticated)
            }
            Err(e) => {
                metrics.record_escalation(kind.as_str(), "login", false);
                warn!(probe = kind.as_str(), error = %e, "Re-authentication failed");
                Err(e)
            }
        };
    }

    let passed = status == 200;
    metrics.record_check(kind.check_name(), passed);
    if passed {
        Ok(ProbeOutcome::Valid)
    } else {
        Ok(ProbeOutcome::Rejected(status))
    }
}
