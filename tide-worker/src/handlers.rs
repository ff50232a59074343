//! HTTP request handlers

use crate::api::{AckResponse, HealthResponse, ReasonRequest, WorkResult, WorkerStats};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use tide_core::{Rule, TimedFact};
use tracing::{debug, info};

/// Accept one base fact
#[tracing::instrument(name = "add_fact", skip_all)]
pub async fn add_fact(
    State(state): State<AppState>,
    Json(fact): Json<TimedFact>,
) -> ApiResult<Json<AckResponse>> {
    if fact.intervals.is_empty() {
        return Err(ApiError::BadRequest(
            "fact must carry at least one interval".to_string(),
        ));
    }
    if !fact.atom.is_ground() {
        return Err(ApiError::BadRequest(format!(
            "fact atom {} is not ground",
            fact.atom
        )));
    }

    debug!(%fact.atom, "accepting fact");
    state.worker.add_fact(fact);
    metrics::record_mutation("fact", 1);
    sync_gauges(&state);
    Ok(Json(AckResponse { accepted: 1 }))
}

/// Accept one rule
#[tracing::instrument(name = "add_rule", skip_all)]
pub async fn add_rule(
    State(state): State<AppState>,
    Json(rule): Json<Rule>,
) -> ApiResult<Json<AckResponse>> {
    if rule.delay < 0 {
        return Err(ApiError::BadRequest(format!(
            "rule '{}' has negative delay",
            rule.name
        )));
    }

    debug!(rule = %rule.name, "accepting rule");
    state.worker.add_rule(rule);
    metrics::record_mutation("rule", 1);
    sync_gauges(&state);
    Ok(Json(AckResponse { accepted: 1 }))
}

/// Accept a batch of derived facts from another shard
#[tracing::instrument(name = "add_derived_facts", skip_all)]
pub async fn add_derived_facts(
    State(state): State<AppState>,
    Json(facts): Json<Vec<TimedFact>>,
) -> ApiResult<Json<AckResponse>> {
    let accepted = facts.len();
    state.worker.add_derived_facts(facts);
    metrics::record_mutation("derived", accepted);
    Ok(Json(AckResponse { accepted }))
}

/// Run local reasoning over the requested range.
///
/// Failures are reported inside the `WorkResult`, not as transport errors.
#[tracing::instrument(name = "reason", skip(state), fields(start = req.start_time, end = req.end_time))]
pub async fn reason(
    State(state): State<AppState>,
    Json(req): Json<ReasonRequest>,
) -> Json<WorkResult> {
    let result = state.worker.reason(req.start_time, req.end_time);

    metrics::record_reason(
        result.success,
        result.execution_ms / 1000.0,
        result.derived_facts.len(),
    );
    info!(
        success = result.success,
        derived = result.derived_facts.len(),
        execution_ms = result.execution_ms,
        "reason call finished"
    );

    Json(result)
}

/// Drop all worker state
pub async fn reset(State(state): State<AppState>) -> StatusCode {
    state.worker.reset();
    sync_gauges(&state);
    info!("worker state reset");
    StatusCode::NO_CONTENT
}

/// Health check - liveness probe
pub async fn health_live(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let stats = state.worker.stats();
    if !state.worker.is_healthy() {
        return Err(ApiError::ServiceUnavailable("worker wedged".to_string()));
    }
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: stats.uptime_seconds,
    }))
}

/// Worker counters
pub async fn stats(State(state): State<AppState>) -> Json<WorkerStats> {
    Json(state.worker.stats())
}

/// Prometheus metrics endpoint
pub async fn prometheus_metrics() -> String {
    metrics::get_prometheus_metrics()
}

fn sync_gauges(state: &AppState) {
    let stats = state.worker.stats();
    metrics::update_worker_metrics(stats.rule_count, stats.fact_count);
}
