use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The protocol step a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    AuthorizationPage,
    AuthorizationResponse,
    TokenExchange,
    PasswordGrant,
    Refresh,
    Introspect,
    Userinfo,
}

impl Step {
    /// Label used in logs, checks and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::AuthorizationPage => "authorization page",
            Step::AuthorizationResponse => "authorization response",
            Step::TokenExchange => "token exchange",
            Step::PasswordGrant => "password grant",
            Step::Refresh => "refresh",
            Step::Introspect => "introspect",
            Step::Userinfo => "userinfo",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a protocol operation against the identity provider.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("{step}: expected HTTP {expected}, got {actual}")]
    UnexpectedStatus {
        step: Step,
        expected: u16,
        actual: u16,
    },

    #[error("authorization response carried no code (Location: {location:?})")]
    MissingAuthorizationCode { location: Option<String> },

    #[error("authorization page has no login form")]
    MissingLoginForm,

    #[error("{step}: request failed: {source}")]
    Transport {
        step: Step,
        #[source]
        source: reqwest::Error,
    },

    #[error("{step}: no response within {after:?}")]
    Timeout { step: Step, after: Duration },

    #[error("{step}: malformed token response: {source}")]
    MalformedResponse {
        step: Step,
        #[source]
        source: serde_json::Error,
    },

    #[error("client '{client_id}' has no redirect URI")]
    MissingRedirectUri { client_id: String },

    #[error("user '{username}' has no credentials")]
    MissingCredentials { username: String },
}

impl AuthFailure {
    /// Transient failures end the iteration; the next one starts fresh.
    /// The others point at a provider/fixture mismatch and deserve attention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthFailure::UnexpectedStatus { .. }
                | AuthFailure::Transport { .. }
                | AuthFailure::Timeout { .. }
        )
    }

    /// The HTTP status the provider answered with, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthFailure::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// Short, stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthFailure::UnexpectedStatus { .. } => "unexpected_status",
            AuthFailure::MissingAuthorizationCode { .. } => "missing_authorization_code",
            AuthFailure::MissingLoginForm => "missing_login_form",
            AuthFailure::Transport { .. } => "transport",
            AuthFailure::Timeout { .. } => "timeout",
            AuthFailure::MalformedResponse { .. } => "malformed_response",
            AuthFailure::MissingRedirectUri { .. } => "missing_redirect_uri",
            AuthFailure::MissingCredentials { .. } => "missing_credentials",
        }
    }
}
