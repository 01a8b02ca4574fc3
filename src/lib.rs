//! Library exports for oidc-loadgen, shared between the binary and tests.

pub mod catalog;
pub mod config;
pub mod metrics;
pub mod models;
pub mod oidc;
pub mod session;
pub mod startup;
pub mod state;
pub mod utils;
pub mod worker;
