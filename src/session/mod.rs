pub mod escalation;
pub mod pool;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use escalation::{probe_with_escalation, ProbeKind, ProbeOutcome};
pub use pool::{PoolStep, SessionPool, SetupFailure};
pub use session::{LoginFlow, Session};
