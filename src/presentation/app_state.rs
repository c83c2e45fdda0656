// Application state for HTTP handlers
use crate::application::analytics_service::AnalyticsService;
use crate::application::streaming_service::StreamingDashboardService;

#[derive(Clone)]
pub struct AppState {
    pub analytics_service: AnalyticsService,
    pub streaming_service: StreamingDashboardService,
}
