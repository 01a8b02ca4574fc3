//! Metrics collection and exposition in the Prometheus text format.
//!
//! This module provides centralized metrics recording for protocol calls,
//! status checks and scenario iterations.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
