use crate::models::{Client, TokenSet, User};
use crate::oidc::{AuthFailure, Endpoints, IdentityProvider};

/// How a session was (and will be re-) authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFlow {
    /// Authorization-Code flow through the simulated browser.
    Browser,
    /// Resource-Owner-Password flow.
    Password,
}

impl LoginFlow {
    pub async fn login<P: IdentityProvider + ?Sized>(
        &self,
        provider: &P,
        endpoints: &Endpoints,
        client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure> {
        match self {
            LoginFlow::Browser => provider.login(endpoints, client, user).await,
            LoginFlow::Password => provider.headless_login(endpoints, client, user).await,
        }
    }
}

/// An authenticated (realm, client, user) triple and its current tokens.
///
/// Owned by exactly one worker. The token set is only ever replaced by the
/// result of a successful provider call.
#[derive(Debug, Clone)]
pub struct Session {
    pub realm_id: String,
    pub client: Client,
    pub user: User,
    pub flow: LoginFlow,
    tokens: TokenSet,
}

impl Session {
    pub fn new(
        realm_id: impl Into<String>,
        client: Client,
        user: User,
        flow: LoginFlow,
        tokens: TokenSet,
    ) -> Self {
        Self {
            realm_id: realm_id.into(),
            client,
            user,
            flow,
            tokens,
        }
    }

    /// Logs `user` in through `flow` and wraps the resulting tokens.
    pub async fn establish<P: IdentityProvider + ?Sized>(
        provider: &P,
        endpoints: &Endpoints,
        realm_id: &str,
        client: &Client,
        user: &User,
        flow: LoginFlow,
    ) -> Result<Self, AuthFailure> {
        let tokens = flow.login(provider, endpoints, client, user).await?;
        Ok(Self::new(realm_id, client.clone(), user.clone(), flow, tokens))
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Replaces the token set wholesale.
    pub fn install(&mut self, tokens: TokenSet) {
        self.tokens = tokens;
    }

    /// Refreshes the tokens; on failure the last known good set is kept.
    pub async fn refresh<P: IdentityProvider + ?Sized>(
        &mut self,
        provider: &P,
        endpoints: &Endpoints,
    ) -> Result<(), AuthFailure> {
        let tokens = provider
            .refresh_tokens(endpoints, &self.tokens, &self.client)
            .await?;
        self.install(tokens);
        Ok(())
    }

    /// Runs the full login again with the flow that created the session.
    pub async fn reauthenticate<P: IdentityProvider + ?Sized>(
        &mut self,
        provider: &P,
        endpoints: &Endpoints,
    ) -> Result<(), AuthFailure> {
        let tokens = self
            .flow
            .login(provider, endpoints, &self.client, &self.user)
            .await?;
        self.install(tokens);
        Ok(())
    }
}
