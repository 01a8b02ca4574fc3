#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

use oidc_loadgen::catalog::RealmCatalog;
use oidc_loadgen::config::ConfigV1;
use oidc_loadgen::metrics::Metrics;
use oidc_loadgen::models::{Client, Credential, Realm, User};
use oidc_loadgen::oidc::{Endpoints, OidcClient, OidcClientConfig};
use oidc_loadgen::state::RunState;

pub const REALM: &str = "realm-007";
pub const CODE: &str = "CODE-1";

pub fn client() -> Client {
    Client {
        client_id: "app1".to_string(),
        secret: "s3cr3t".to_string(),
        redirect_uris: vec!["https://app/cb".to_string()],
    }
}

pub fn user() -> User {
    User {
        username: "alice".to_string(),
        credentials: vec![Credential {
            kind: Some("password".to_string()),
            value: "pw".to_string(),
        }],
    }
}

pub fn realm() -> Realm {
    Realm {
        id: REALM.to_string(),
        clients: vec![client()],
        users: vec![user()],
    }
}

pub fn realm_path(suffix: &str) -> String {
    format!("/realms/{}{}", REALM, suffix)
}

pub fn oidc_client(metrics: &Metrics) -> OidcClient {
    OidcClient::new(
        OidcClientConfig {
            offline_tokens: false,
            request_timeout: Duration::from_secs(5),
        },
        metrics.clone(),
    )
    .expect("failed to build OIDC client")
}

pub fn endpoints(server: &ServerGuard) -> Endpoints {
    Endpoints::for_realm(&server.url(), REALM)
}

pub async fn mock_server() -> ServerGuard {
    Server::new_async().await
}

/// Authorization page carrying a Keycloak-like login form and a session cookie.
pub async fn mock_authorization_page(server: &mut ServerGuard) -> Mock {
    let html = format!(
        r#"<html><body>
        <form id="kc-form-login" action="{}{}?session_code=sc1&amp;execution=e1&amp;client_id=app1" method="post">
            <input id="username" name="username" type="text" value="">
            <input id="password" name="password" type="password">
            <input type="hidden" name="credentialId" value="">
            <input name="login" type="submit" value="Sign In">
        </form>
        </body></html>"#,
        server.url(),
        realm_path("/login-actions/authenticate"),
    );

    server
        .mock("GET", realm_path("/protocol/openid-connect/auth").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("response_type".into(), "code".into()),
            Matcher::UrlEncoded("client_id".into(), "app1".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "https://app/cb".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html;charset=utf-8")
        .with_header("set-cookie", "AUTH_SESSION_ID=sess-1; Path=/")
        .with_body(html)
        .expect(1)
        .create_async()
        .await
}

/// Credentials post answered with a redirect carrying the authorization code.
pub async fn mock_login_submit(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", realm_path("/login-actions/authenticate").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("session_code".into(), "sc1".into()),
            Matcher::UrlEncoded("execution".into(), "e1".into()),
        ]))
        .match_header("cookie", Matcher::Regex("AUTH_SESSION_ID=sess-1".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("username".into(), "alice".into()),
            Matcher::UrlEncoded("password".into(), "pw".into()),
        ]))
        .with_status(302)
        .with_header(
            "location",
            format!("https://app/cb?state=s1&session_state=ss1&code={}", CODE).as_str(),
        )
        .expect(1)
        .create_async()
        .await
}

pub async fn mock_code_exchange(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", realm_path("/protocol/openid-connect/token").as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), CODE.into()),
            Matcher::UrlEncoded("redirect_uri".into(), "https://app/cb".into()),
            Matcher::UrlEncoded("client_id".into(), "app1".into()),
            Matcher::UrlEncoded("client_secret".into(), "s3cr3t".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body("at-1", "rt-1"))
        .expect(1)
        .create_async()
        .await
}

pub async fn mock_password_grant(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", realm_path("/protocol/openid-connect/token").as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "password".into()),
            Matcher::UrlEncoded("username".into(), "alice".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body("at-1", "rt-1"))
        .create_async()
        .await
}

pub async fn mock_refresh(
    server: &mut ServerGuard,
    from: &str,
    access: &str,
    refresh: &str,
) -> Mock {
    server
        .mock("POST", realm_path("/protocol/openid-connect/token").as_str())
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), from.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body(access, refresh))
        .create_async()
        .await
}

pub async fn mock_userinfo(server: &mut ServerGuard, access_token: &str, status: usize) -> Mock {
    server
        .mock("GET", realm_path("/protocol/openid-connect/userinfo").as_str())
        .match_header("authorization", format!("Bearer {}", access_token).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(json!({"sub": "u-1", "preferred_username": "alice"}).to_string())
        .create_async()
        .await
}

pub fn token_body(access: &str, refresh: &str) -> String {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 300,
        "refresh_expires_in": 1800,
        "token_type": "Bearer",
        "scope": "openid profile email",
    })
    .to_string()
}

/// Run state pointing at `server` with a single-realm catalog.
pub fn run_state(server: &ServerGuard, scenario: &str, pool_size: usize) -> RunState {
    let config: ConfigV1 = serde_json::from_value(json!({
        "provider_url": server.url(),
        "realm_count": 1,
        "scenario": scenario,
        "session_pool_size": pool_size,
        "workers": 1,
        "request_timeout_in_secs": 5,
        "pause_in_ms": 1,
    }))
    .expect("invalid test config");
    let metrics = Metrics::new();

    RunState {
        config: Arc::new(config),
        catalog: Arc::new(RealmCatalog::new(vec![realm()]).expect("invalid test realm")),
        provider: Arc::new(oidc_client(&metrics)),
        metrics,
    }
}
