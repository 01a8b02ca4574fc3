use serde::{Deserialize, Serialize};

/// A realm fixture as exported for the load test: its clients and users.
/// Loaded once and shared read-only between workers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Realm {
    pub id: String,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub users: Vec<User>,
}

/// A confidential OIDC client registered in a realm.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub client_id: String,
    pub secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// The redirect URI used for every authorization request (the first registered one).
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }
}

/// A user able to log into a realm.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl User {
    /// The password submitted on login (the first credential's value).
    pub fn password(&self) -> Option<&str> {
        self.credentials.first().map(|c| c.value.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub value: String,
}
