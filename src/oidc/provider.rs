use super::endpoints::Endpoints;
use super::error::AuthFailure;
use crate::models::{Client, TokenSet, User};

/// Outcome of a token introspection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionResult {
    pub status: u16,
    /// `active` claim of the response; false when the call did not return 200.
    pub active: bool,
    pub scope: Option<String>,
}

/// Outcome of a userinfo call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfoResult {
    pub status: u16,
    pub subject: Option<String>,
    pub preferred_username: Option<String>,
}

/// The protocol operations the load test drives against an identity provider.
///
/// Implementations are stateless beyond their configuration: every call takes
/// its inputs explicitly and returns a fresh `TokenSet` or a typed failure.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization-Code flow through a simulated browser.
    async fn login(
        &self,
        endpoints: &Endpoints,
        client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure>;

    /// Resource-Owner-Password flow.
    async fn headless_login(
        &self,
        endpoints: &Endpoints,
        client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure>;

    async fn refresh_tokens(
        &self,
        endpoints: &Endpoints,
        tokens: &TokenSet,
        client: &Client,
    ) -> Result<TokenSet, AuthFailure>;

    /// Non-200 answers are returned, not raised; only transport failures are errors.
    async fn introspect(
        &self,
        endpoints: &Endpoints,
        tokens: &TokenSet,
        client: &Client,
    ) -> Result<IntrospectionResult, AuthFailure>;

    /// Same contract as `introspect`.
    async fn userinfo(
        &self,
        endpoints: &Endpoints,
        tokens: &TokenSet,
    ) -> Result<UserInfoResult, AuthFailure>;
}
