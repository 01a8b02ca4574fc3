use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::RequestBuilder;
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::browser::{extract_authorization_code, parse_login_form};
use super::endpoints::Endpoints;
use super::error::{AuthFailure, Step};
use super::provider::{IdentityProvider, IntrospectionResult, UserInfoResult};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::{Client, TokenSet, User};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Settings shared by every call of an `OidcClient`.
#[derive(Debug, Clone)]
pub struct OidcClientConfig {
    /// Request `offline_access` on top of `openid`.
    pub offline_tokens: bool,
    /// Deadline of a single HTTP exchange, body included.
    pub request_timeout: Duration,
}

impl Default for OidcClientConfig {
    fn default() -> Self {
        Self {
            offline_tokens: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A fully buffered provider response.
#[derive(Debug)]
struct Reply {
    status: u16,
    url: Url,
    location: Option<String>,
    body: String,
}

/// OIDC client driving Keycloak-style endpoints over HTTP.
pub struct OidcClient {
    config: OidcClientConfig,
    http: reqwest::Client,
    metrics: Metrics,
}

impl OidcClient {
    pub fn new(config: OidcClientConfig, metrics: Metrics) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            config,
            http,
            metrics,
        })
    }

    /// `openid`, plus `offline_access` when offline tokens are requested.
    pub fn scope(&self) -> &'static str {
        if self.config.offline_tokens {
            "openid offline_access"
        } else {
            "openid"
        }
    }

    /// A fresh simulated browser: its own cookie jar, no redirect following.
    fn browser(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );

        reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
    }

    /// Sends `request` and buffers the response under the configured deadline.
    async fn send(&self, step: Step, request: RequestBuilder) -> Result<Reply, AuthFailure> {
        let started = Instant::now();
        let result = self
            .within(step, async {
                let response = request
                    .send()
                    .await
                    .map_err(|source| AuthFailure::Transport { step, source })?;
                let status = response.status().as_u16();
                let url = response.url().clone();
                let location = response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response
                    .text()
                    .await
                    .map_err(|source| AuthFailure::Transport { step, source })?;
                Ok(Reply {
                    status,
                    url,
                    location,
                    body,
                })
            })
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(reply) => {
                debug!(step = step.as_str(), status = reply.status, elapsed, "Provider responded");
                self.metrics
                    .record_request(step.as_str(), &reply.status.to_string(), elapsed);
            }
            Err(e) => {
                debug!(step = step.as_str(), error = %e, elapsed, "Provider request failed");
                self.metrics.record_request(step.as_str(), e.kind(), elapsed);
            }
        }
        result
    }

    async fn within<T, F>(&self, step: Step, fut: F) -> Result<T, AuthFailure>
    where
        F: Future<Output = Result<T, AuthFailure>>,
    {
        let after = self.config.request_timeout;
        match timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(AuthFailure::Timeout { step, after }),
        }
    }

    /// Records the status check and turns a mismatch into `UnexpectedStatus`.
    fn expect_status(&self, step: Step, reply: &Reply, expected: u16) -> Result<(), AuthFailure> {
        let passed = reply.status == expected;
        self.metrics
            .record_check(&format!("{} status == {}", step, expected), passed);
        if passed {
            Ok(())
        } else {
            Err(AuthFailure::UnexpectedStatus {
                step,
                expected,
                actual: reply.status,
            })
        }
    }

    async fn token_request(
        &self,
        step: Step,
        endpoints: &Endpoints,
        form: &[(&str, &str)],
    ) -> Result<TokenSet, AuthFailure> {
        let reply = self
            .send(step, self.http.post(&endpoints.token).form(form))
            .await?;
        self.expect_status(step, &reply, 200)?;
        let tokens = TokenSet::from_json(&reply.body)
            .map_err(|source| AuthFailure::MalformedResponse { step, source })?;
        if self.config.offline_tokens {
            self.metrics.record_check(
                &format!("{} offline_access granted", step),
                tokens.is_offline(),
            );
        }
        Ok(tokens)
    }
}

fn redirect_uri(client: &Client) -> Result<&str, AuthFailure> {
    client
        .redirect_uri()
        .ok_or_else(|| AuthFailure::MissingRedirectUri {
            client_id: client.client_id.clone(),
        })
}

fn password(user: &User) -> Result<&str, AuthFailure> {
    user.password().ok_or_else(|| AuthFailure::MissingCredentials {
        username: user.username.clone(),
    })
}

fn json_body(reply: &Reply) -> Option<Value> {
    if reply.status == 200 {
        serde_json::from_str(&reply.body).ok()
    } else {
        None
    }
}

fn string_claim(claims: &Option<Value>, name: &str) -> Option<String> {
    claims
        .as_ref()
        .and_then(|c| c.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait::async_trait]
impl IdentityProvider for OidcClient {
    async fn login(
        &self,
        endpoints: &Endpoints,
        client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure> {
        let redirect_uri = redirect_uri(client)?;
        let password = password(user)?;
        let browser = self.browser().map_err(|source| AuthFailure::Transport {
            step: Step::AuthorizationPage,
            source,
        })?;

        // 1. Authorization page
        let state = Uuid::new_v4().to_string();
        let page = self
            .send(
                Step::AuthorizationPage,
                browser.get(&endpoints.authorization).query(&[
                    ("login", "true"),
                    ("response_type", "code"),
                    ("scope", self.scope()),
                    ("client_id", client.client_id.as_str()),
                    ("state", state.as_str()),
                    ("redirect_uri", redirect_uri),
                ]),
            )
            .await?;
        self.expect_status(Step::AuthorizationPage, &page, 200)?;

        // 2. Login form submit, redirect not followed
        let form = parse_login_form(&page.body, &page.url)?;
        let submitted = self
            .send(
                Step::AuthorizationResponse,
                browser
                    .post(form.action.clone())
                    .form(&form.fields(&user.username, password)),
            )
            .await?;
        self.expect_status(Step::AuthorizationResponse, &submitted, 302)?;

        // 3. Code from the redirect location
        let location = submitted
            .location
            .as_deref()
            .ok_or(AuthFailure::MissingAuthorizationCode { location: None })?;
        let code = extract_authorization_code(location)?;

        // 4. Code exchange
        self.token_request(
            Step::TokenExchange,
            endpoints,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", redirect_uri),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.secret.as_str()),
            ],
        )
        .await
    }

    async fn headless_login(
        &self,
        endpoints: &Endpoints,
        client: &Client,
        user: &User,
    ) -> Result<TokenSet, AuthFailure> {
        let password = password(user)?;
        self.token_request(
            Step::PasswordGrant,
            endpoints,
            &[
                ("grant_type", "password"),
                ("username", user.username.as_str()),
                ("password", password),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.secret.as_str()),
                ("scope", self.scope()),
            ],
        )
        .await
    }

    async fn refresh_tokens(
        &self,
        endpoints: &Endpoints,
        tokens: &TokenSet,
        client: &Client,
    ) -> Result<TokenSet, AuthFailure> {
        // Without a refresh token the provider answers 400, which is the failure we report
        let refresh_token = tokens.refresh_token.as_deref().unwrap_or_default();
        self.token_request(
            Step::Refresh,
            endpoints,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.secret.as_str()),
            ],
        )
        .await
    }

    async fn introspect(
        &self,
        endpoints: &Endpoints,
        tokens: &TokenSet,
        client: &Client,
    ) -> Result<IntrospectionResult, AuthFailure> {
        let reply = self
            .send(
                Step::Introspect,
                self.http
                    .post(&endpoints.introspection)
                    .basic_auth(&client.client_id, Some(&client.secret))
                    .form(&[("token", tokens.access_token.as_str())]),
            )
            .await?;

        let claims = json_body(&reply);
        Ok(IntrospectionResult {
            status: reply.status,
            active: claims
                .as_ref()
                .and_then(|c| c.get("active"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            scope: string_claim(&claims, "scope"),
        })
    }

    async fn userinfo(
        &self,
        endpoints: &Endpoints,
        tokens: &TokenSet,
    ) -> Result<UserInfoResult, AuthFailure> {
        let reply = self
            .send(
                Step::Userinfo,
                self.http
                    .get(&endpoints.userinfo)
                    .bearer_auth(&tokens.access_token),
            )
            .await?;

        let claims = json_body(&reply);
        Ok(UserInfoResult {
            status: reply.status,
            subject: string_claim(&claims, "sub"),
            preferred_username: string_claim(&claims, "preferred_username"),
        })
    }
}
