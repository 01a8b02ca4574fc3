use std::fmt;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The test a worker repeats on every iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Fresh Authorization-Code login with a random client and user each iteration.
    #[default]
    Login,
    /// One session per worker, refreshed every iteration.
    RefreshToken,
    /// One session per worker, introspected every iteration.
    Tokeninfo,
    /// One session per worker, calling userinfo every iteration.
    Userinfo,
    /// Rotates a pool of sessions, refreshing the head each iteration.
    PooledRefresh,
    /// Rotates a pool of sessions, introspecting the head each iteration.
    PooledTokeninfo,
    /// Rotates a pool of sessions, calling userinfo with the head each iteration.
    PooledUserinfo,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Login => "login",
            Scenario::RefreshToken => "refresh-token",
            Scenario::Tokeninfo => "tokeninfo",
            Scenario::Userinfo => "userinfo",
            Scenario::PooledRefresh => "pooled-refresh",
            Scenario::PooledTokeninfo => "pooled-tokeninfo",
            Scenario::PooledUserinfo => "pooled-userinfo",
        }
    }

    /// Think time between iterations: logins are paced slowly, token calls hammer.
    pub fn default_pause(&self) -> Duration {
        match self {
            Scenario::Login => Duration::from_secs(2),
            _ => Duration::from_millis(50),
        }
    }

    pub fn uses_pool(&self) -> bool {
        matches!(
            self,
            Scenario::PooledRefresh | Scenario::PooledTokeninfo | Scenario::PooledUserinfo
        )
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
