// HTTP request handlers
use crate::application::analytics_service::AnalyticsResult;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct HotspotQuery {
    pub top: Option<usize>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Year-over-year emission totals
pub async fn yearly_totals(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let result = state.analytics_service.yearly_totals().await;
    series_response("yoy", result, accepts_brotli(&headers)).await
}

/// Monthly emissions per scope
pub async fn monthly_trend(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let result = state.analytics_service.monthly_trend().await;
    series_response("trend", result, accepts_brotli(&headers)).await
}

/// Activities ranked by total emissions
pub async fn hotspots(
    Query(query): Query<HotspotQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let result = state.analytics_service.hotspots(query.top).await;
    series_response("hotspot", result, accepts_brotli(&headers)).await
}

/// Emissions per unit of business metric
pub async fn intensity(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    match state.analytics_service.intensity().await {
        Ok(intensity) => into_response(json_response(&intensity, StatusCode::OK, compress).await),
        Err(e) => upstream_error("intensity", e, compress).await,
    }
}

/// Stream every dashboard panel for a view (progressive loading)
pub async fn stream_dashboard(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.streaming_service.stream_dashboard(&id).await;
    stream_from_receiver(rx, accepts_brotli(&headers))
}

async fn series_response(
    name: &str,
    result: anyhow::Result<AnalyticsResult>,
    compress: bool,
) -> Response {
    match result {
        Ok(result) => into_response(json_response(&result.series, StatusCode::OK, compress).await),
        Err(e) => upstream_error(name, e, compress).await,
    }
}

async fn upstream_error(name: &str, e: anyhow::Error, compress: bool) -> Response {
    tracing::warn!("Error fetching records for {}: {:#}", name, e);
    let body = ErrorBody {
        error: format!("{:#}", e),
    };
    into_response(json_response(&body, StatusCode::BAD_GATEWAY, compress).await)
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
