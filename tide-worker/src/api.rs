//! Wire types for the worker service
//!
//! Rules and facts travel as their serde representations and round-trip to
//! equal objects, which is what lets a master ship work between shards.

use serde::{Deserialize, Serialize};
use tide_core::{Timestep, TimedFact};

/// Request to reason over a time sub-range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonRequest {
    /// First timestep of interest (inclusive)
    pub start_time: Timestep,
    /// Last timestep of interest (inclusive); also the local horizon
    pub end_time: Timestep,
}

/// Outcome of one local reasoning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResult {
    /// Whether the run completed
    pub success: bool,
    /// Failure message when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Derived facts inside the requested range, compacted into intervals
    pub derived_facts: Vec<TimedFact>,
    /// Wall time of the run in milliseconds
    pub execution_ms: f64,
}

impl WorkResult {
    /// Successful result
    pub fn ok(derived_facts: Vec<TimedFact>, execution_ms: f64) -> Self {
        WorkResult {
            success: true,
            error: None,
            derived_facts,
            execution_ms,
        }
    }

    /// Failed result with a message
    pub fn failure(message: impl Into<String>, execution_ms: f64) -> Self {
        WorkResult {
            success: false,
            error: Some(message.into()),
            derived_facts: Vec::new(),
            execution_ms,
        }
    }
}

/// Counters describing a worker's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Base facts accepted
    pub fact_count: usize,
    /// Rules accepted
    pub rule_count: usize,
    /// Derived facts received from other shards
    pub derived_fact_count: usize,
    /// Completed reason calls
    pub reason_calls: u64,
    /// Derived facts reported by the last run
    pub last_derived_count: usize,
    /// Seconds since the worker started
    pub uptime_seconds: u64,
}

/// Acknowledgement for mutation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    /// Number of items accepted
    pub accepted: usize,
}

/// Health probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the worker started
    pub uptime_seconds: u64,
}
