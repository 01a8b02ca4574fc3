//! Simulated users: the scenarios they repeat, the per-worker iteration loop
//! and the driver ramping them up.

pub mod driver;
pub mod scenario;
pub mod worker;

pub use driver::{run_workers, RunSummary};
pub use scenario::Scenario;
pub use worker::{IterationError, Worker, WorkerReport};
