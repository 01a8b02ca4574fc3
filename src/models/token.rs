use serde::{Deserialize, Serialize};

/// Tokens returned by a successful login or refresh.
///
/// A `TokenSet` is never updated in place: every successful provider call
/// produces a new one which replaces the previous set wholesale.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    /// Absent for grants which do not issue refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Parse the JSON body of a token endpoint response.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// True when the provider issued an offline token (`offline_access` granted).
    pub fn is_offline(&self) -> bool {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().any(|scope| scope == "offline_access"))
            .unwrap_or(false)
    }
}
