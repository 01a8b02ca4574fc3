use cached::proc_macro::cached;

/// The provider URLs used by the load test for one realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base: String,
    pub authorization: String,
    pub token: String,
    pub userinfo: String,
    pub introspection: String,
}

impl Endpoints {
    /// Derives the endpoints of `realm_id` below `provider_url`. No network call is made.
    pub fn for_realm(provider_url: &str, realm_id: &str) -> Self {
        endpoints_for(provider_url.to_string(), realm_id.to_string())
    }
}

/// Pure derivation, memoized since many workers share the same few realms.
#[cached(size = 256)]
fn endpoints_for(provider_url: String, realm_id: String) -> Endpoints {
    let base = format!(
        "{}/realms/{}",
        provider_url.trim_end_matches('/'),
        realm_id
    );
    let oidc = format!("{}/protocol/openid-connect", base);

    Endpoints {
        authorization: format!("{}/auth", oidc),
        token: format!("{}/token", oidc),
        userinfo: format!("{}/userinfo", oidc),
        introspection: format!("{}/token/introspect", oidc),
        base,
    }
}
