//! Resilience around model calls.
//!
//! - Bounded retry of transient failures
//! - Token and cost accounting

mod retry;
mod usage;

pub use retry::{backoff, retry_transient};
pub use usage::{LlmUsage, UsageTracker};
