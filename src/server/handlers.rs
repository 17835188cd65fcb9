use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::destination::suggest::DEFAULT_SUGGESTION_LIMIT;
use crate::destination::types::{DestinationSummary, QueryContext, ResolutionResult};

use super::state::AppState;

/// Upper bound on `/api/suggest?limit=`.
const MAX_SUGGESTION_LIMIT: usize = 50;

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

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveParams {
    pub query: Option<String>,
    pub departure_country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub query: String,
    #[serde(flatten)]
    pub result: ResolutionResult,
    pub needs_confirmation: bool,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let query = params.query.as_deref().unwrap_or("").trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'query' parameter"));
    }
    if params.lat.is_some() != params.lon.is_some() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide both 'lat' and 'lon', or neither"));
    }
    if let (Some(lat), Some(lon)) = (params.lat, params.lon) {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid coordinates. Lat: -90..90, Lon: -180..180",
            ));
        }
    }

    let context = QueryContext {
        departure_country: params.departure_country.filter(|c| !c.trim().is_empty()),
        bias_lat: params.lat,
        bias_lon: params.lon,
    };
    let result = state.resolver.resolve(query, context).await;

    tracing::info!(
        query,
        primary = result.primary_code().unwrap_or("-"),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );

    Ok(Json(ResolveResponse {
        query: query.to_string(),
        needs_confirmation: result.needs_confirmation(),
        result,
    }))
}

// ─── GET /api/suggest ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SuggestParams {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
}

pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<Vec<DestinationSummary>>, ApiError> {
    let prefix = params.prefix.as_deref().unwrap_or("");
    if prefix.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'prefix' parameter"));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
        .min(MAX_SUGGESTION_LIMIT);

    Ok(Json(state.resolver.suggest(prefix, limit)))
}

// ─── GET /api/destinations ───────────────────────────────────────

pub async fn destinations(State(state): State<Arc<AppState>>) -> Json<Vec<DestinationSummary>> {
    Json(state.resolver.destinations())
}
