//! Scripted `IdentityProvider` used by the session tests.

use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{Client, Credential, TokenSet, User};
use crate::oidc::{
    AuthFailure, Endpoints, IdentityProvider, IntrospectionResult, Step, UserInfoResult,
};

pub fn client() -> Client {
    Client {
        client_id: "app1".to_string(),
        secret: "s3cr3t".to_string(),
        redirect_uris: vec!["https://app/cb".to_string()],
    }
}

pub fn user(username: &str) -> User {
    User {
        username: username.to_string(),
        credentials: vec![Credential {
            kind: None,
            value: "pw".to_string(),
        }],
    }
}

/// Issues numbered tokens and answers probes with a configurable status.
/// A status of 0 means "succeed".
#[derive(Default)]
pub struct FakeProvider {
    issued: AtomicUsize,
    browser_logins: AtomicUsize,
    password_logins: AtomicUsize,
    refreshes: AtomicUsize,
    probes: AtomicUsize,
    probe_status: AtomicU16,
    refresh_status: AtomicU16,
    login_status: AtomicU16,
    login_delay_ms: AtomicU64,
}

impl FakeProvider {
    pub fn answer_probes_with(&self, status: u16) {
        self.probe_status.store(status, Ordering::SeqCst);
    }

    pub fn fail_refresh_with(&self, status: u16) {
        self.refresh_status.store(status, Ordering::SeqCst);
    }

    pub fn fail_login_with(&self, status: u16) {
        self.login_status.store(status, Ordering::SeqCst);
    }

    /// Every login answers only after `delay`.
    pub fn delay_logins(&self, delay: Duration) {
        self.login_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn browser_logins(&self) -> usize {
        self.browser_logins.load(Ordering::SeqCst)
    }

    pub fn password_logins(&self) -> usize {
        self.password_logins.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn issue(&self, owner: &str) -> TokenSet {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        TokenSet {
            access_token: format!("{owner}-at-{n}"),
            refresh_token: Some(format!("{owner}-rt-{n}")),
            expires_in: Some(300),
            refresh_expires_in: Some(1800),
            token_type: Some("Bearer".to_string()),
            scope: Some("openid".to_string()),
        }
    }

    fn outcome(&self, slot: &AtomicU16, step: Step, expected: u16) -> Result<(), AuthFailure> {
        match slot.load(Ordering::SeqCst) {
            0 => Ok(()),
            actual => Err(AuthFailure::UnexpectedStatus {
                step,
                expected,
                actual,
            }),
        }
    }

    async fn login_delay(&self) {
        let delay = self.login_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn probe_status(&self) -> u16 {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.probe_status.load(Ordering::SeqCst) {
            0 => 200,
            status => status,
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeProvider {
    async fn login(
        &self,
        _endpoints: &Endpoints,
        _client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure> {
        self.browser_logins.fetch_add(1, Ordering::SeqCst);
        self.login_delay().await;
        self.outcome(&self.login_status, Step::AuthorizationPage, 200)?;
        Ok(self.issue(&user.username))
    }

    async fn headless_login(
        &self,
        _endpoints: &Endpoints,
        _client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure> {
        self.password_logins.fetch_add(1, Ordering::SeqCst);
        self.login_delay().await;
        self.outcome(&self.login_status, Step::PasswordGrant, 200)?;
        Ok(self.issue(&user.username))
    }

    async fn refresh_tokens(
        &self,
        _endpoints: &Endpoints,
        tokens: &TokenSet,
        _client: &Client,
    ) -> Result<TokenSet, AuthFailure> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.outcome(&self.refresh_status, Step::Refresh, 200)?;
        let owner = tokens
            .access_token
            .split("-at-")
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(self.issue(&owner))
    }

    async fn introspect(
        &self,
        _endpoints: &Endpoints,
        _tokens: &TokenSet,
        _client: &Client,
    ) -> Result<IntrospectionResult, AuthFailure> {
        let status = self.probe_status();
        Ok(IntrospectionResult {
            status,
            active: status == 200,
            scope: None,
        })
    }

    async fn userinfo(
        &self,
        _endpoints: &Endpoints,
        _tokens: &TokenSet,
    ) -> Result<UserInfoResult, AuthFailure> {
        let status = self.probe_status();
        Ok(UserInfoResult {
            status,
            subject: None,
            preferred_username: None,
        })
    }
}
