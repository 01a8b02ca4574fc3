//! The OIDC protocol engine: endpoint derivation, the simulated browser used by
//! the Authorization-Code flow, and the HTTP client implementing every flow the
//! load test needs.

pub mod browser;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod provider;

pub use client::{OidcClient, OidcClientConfig};
pub use endpoints::Endpoints;
pub use error::{AuthFailure, Step};
pub use provider::{IdentityProvider, IntrospectionResult, UserInfoResult};
