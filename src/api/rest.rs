// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  There is no authentication; bind to a
// private interface when exposing the service.
//
// Analysis is CPU bound and may block on another request's in-flight
// computation, so it runs on the blocking pool.
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::app_state::{AppState, ServiceStatus};
use crate::error::AnalysisError;
use crate::market_data::{parse_trade_date, recent_trade_date};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analysis", get(analysis))
        .route("/api/v1/retail-seats", get(get_retail_seats))
        .route("/api/v1/retail-seats", post(set_retail_seats))
        .route("/api/v1/cache/clear", post(clear_cache))
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    service: ServiceStatus,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        service: state.status(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct AnalysisQuery {
    /// `YYYYMMDD` or `YYYY-MM-DD`; defaults to the most recent weekday.
    #[serde(default)]
    date: Option<String>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Response {
    let date = match query.date.as_deref() {
        Some(raw) => match parse_trade_date(raw) {
            Some(d) => d,
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("invalid date '{raw}', expected YYYYMMDD or YYYY-MM-DD"),
                )
            }
        },
        None => recent_trade_date(chrono::Local::now().date_naive()),
    };

    let engine = Arc::clone(&state.engine);
    let config = state.retail_seats.current();
    let joined = tokio::task::spawn_blocking(move || engine.analyze(date, &config)).await;

    match joined {
        Ok(Ok(result)) => Json(result.as_ref()).into_response(),
        Ok(Err(e @ AnalysisError::NoTradingData { .. })) => {
            info!(%date, error = %e, "analysis requested for date without data");
            error_response(StatusCode::NOT_FOUND, e.to_string())
        }
        Ok(Err(e @ AnalysisError::Aborted { .. })) => {
            warn!(%date, error = %e, "analysis aborted");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!(%date, error = %e, "analysis task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("analysis for {date} failed"),
            )
        }
    }
}

// =============================================================================
// Retail seats
// =============================================================================

async fn get_retail_seats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.retail_seats.current();
    Json(config.as_ref().clone())
}

#[derive(Debug, Deserialize)]
struct RetailSeatUpdate {
    seats: Vec<String>,
}

async fn set_retail_seats(
    State(state): State<Arc<AppState>>,
    Json(update): Json<RetailSeatUpdate>,
) -> Response {
    match state.update_retail_seats(&update.seats) {
        Ok(config) => Json(config.as_ref().clone()).into_response(),
        Err(e) => {
            warn!(error = %e, "rejected retail seat update");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

// =============================================================================
// Cache
// =============================================================================

async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.invalidate_cache();
    Json(json!({ "status": "cleared", "cache": state.engine.cache_stats() }))
}
