use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::geocode::{AddressQuery, ConfidencePolicy, ResolutionOutcome};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveParams {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Response, ApiError> {
    let start = Instant::now();

    let street = params.street.unwrap_or_default();
    if street.trim().is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "Missing 'street' parameter".into(),
        ));
    }
    let query = AddressQuery {
        street,
        city: params.city.unwrap_or_default(),
        postal_code: params.zip.unwrap_or_default(),
    };

    let outcome = state.resolver.resolve(&query).await;

    info!(
        address = %query,
        outcome = outcome_label(&outcome),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );

    Ok((status_for(&outcome), Json(outcome)).into_response())
}

fn status_for(outcome: &ResolutionOutcome) -> StatusCode {
    match outcome {
        ResolutionOutcome::TransportFailure { .. } => StatusCode::BAD_GATEWAY,
        ResolutionOutcome::ProjectionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}

fn outcome_label(outcome: &ResolutionOutcome) -> &'static str {
    match outcome {
        ResolutionOutcome::NoCandidates => "no_candidates",
        ResolutionOutcome::LowConfidence { .. } => "low_confidence",
        ResolutionOutcome::Resolved { warning: Some(_), .. } => "resolved_with_warning",
        ResolutionOutcome::Resolved { .. } => "resolved",
        ResolutionOutcome::TransportFailure { .. } => "transport_failure",
        ResolutionOutcome::ProjectionFailed { .. } => "projection_failed",
    }
}

// ─── GET /api/config ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct ConfigResponse {
    pub endpoint: String,
    pub source_crs: String,
    pub target_crs: String,
    pub policy: ConfidencePolicy,
}

pub async fn config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let c = state.resolver.config();
    Json(ConfigResponse {
        endpoint: c.endpoint.clone(),
        source_crs: c.source_crs.clone(),
        target_crs: c.target_crs.clone(),
        policy: c.policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&ResolutionOutcome::NoCandidates), StatusCode::OK);
        assert_eq!(
            status_for(&ResolutionOutcome::LowConfidence { score: 10.0 }),
            StatusCode::OK
        );
        assert_eq!(
            status_for(&ResolutionOutcome::TransportFailure {
                status: None,
                message: "timed out".into()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
