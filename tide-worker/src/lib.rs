//! TIDE Worker - one reasoning shard behind an HTTP interface
//!
//! Wraps the single-node engine as the worker service a distributed master
//! shards work across: mutations, ranged reason calls, reset, health, and
//! stats. All calls are synchronous; failures come back as failed
//! `WorkResult`s rather than transport errors.

pub mod api;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod service;
pub mod state;

pub use api::{AckResponse, HealthResponse, ReasonRequest, WorkResult, WorkerStats};
pub use error::{ApiError, ApiResult};
pub use service::ReasonerWorker;
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};

/// Build the worker router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        // Mutations
        .route("/v1/facts", post(handlers::add_fact))
        .route("/v1/rules", post(handlers::add_rule))
        .route("/v1/derived-facts", post(handlers::add_derived_facts))
        // Work
        .route("/v1/reason", post(handlers::reason))
        .route("/v1/reset", post(handlers::reset))
        // Introspection
        .route("/health/live", get(handlers::health_live))
        .route("/v1/stats", get(handlers::stats))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
}
