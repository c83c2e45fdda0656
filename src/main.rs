// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::analytics_service::AnalyticsService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::view_tracker::ViewTracker;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_record_source::HttpRecordSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, hotspots, intensity, monthly_trend, stream_dashboard, yearly_totals,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;

    // Create record source (infrastructure layer)
    let source = Arc::new(HttpRecordSource::new(&config.backend)?);

    // Create services (application layer)
    let analytics_service = AnalyticsService::new(source, config.analytics.hotspot_top_n);
    let streaming_service = StreamingDashboardService::new(
        analytics_service.clone(),
        config.dashboard.panels.clone(),
        Arc::new(ViewTracker::new()),
    );

    // Create application state
    let state = Arc::new(AppState {
        analytics_service,
        streaming_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/analytics/yoy", get(yearly_totals))
        .route("/analytics/trend", get(monthly_trend))
        .route("/analytics/hotspot", get(hotspots))
        .route("/intensity", get(intensity))
        .route("/dashboards/:id", get(stream_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(
        "Starting emission-dashboard on {} (backend {})",
        addr,
        config.backend.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
