// Streaming dashboard service - skeleton first, then one update per panel
use crate::application::analytics_service::AnalyticsService;
use crate::application::view_tracker::{ViewTicket, ViewTracker};
use crate::domain::pipeline::PipelineReport;
use crate::domain::series::ChartSeries;
use crate::infrastructure::config::{PanelConfig, PanelKind};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSkeleton {
    pub id: String,
    pub title: String,
    pub kind: &'static str,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    Skeleton {
        view_id: String,
        panels: Vec<PanelSkeleton>,
    },
    PanelUpdate {
        panel_id: String,
        series: ChartSeries,
        report: PipelineReport,
    },
    Complete {
        panels: usize,
        duration_ms: u64,
    },
}

#[derive(Clone)]
pub struct StreamingDashboardService {
    analytics: AnalyticsService,
    panels: Vec<PanelConfig>,
    views: Arc<ViewTracker>,
}

impl StreamingDashboardService {
    pub fn new(analytics: AnalyticsService, panels: Vec<PanelConfig>, views: Arc<ViewTracker>) -> Self {
        Self {
            analytics,
            panels,
            views,
        }
    }

    pub async fn stream_dashboard(&self, view_id: &str) -> mpsc::Receiver<DashboardMessage> {
        let (tx, rx) = mpsc::channel(self.panels.len() + 2);
        let start_time = Instant::now();
        let ticket = self.views.begin(view_id);

        // 1. Skeleton goes out before any fetch starts
        let skeleton = DashboardMessage::Skeleton {
            view_id: view_id.to_string(),
            panels: self.panels.iter().map(skeleton_for).collect(),
        };
        let _ = tx.send(skeleton).await;

        // 2. One task per panel, each with its own fetch and recompute
        let mut tasks = JoinSet::new();
        for panel in &self.panels {
            let tx = tx.clone();
            let analytics = self.analytics.clone();
            let views = self.views.clone();
            let ticket = ticket.clone();
            let panel_id = panel.id.clone();
            let mode = panel.kind.mode();

            tasks.spawn(async move {
                let result = match analytics.series_for(mode, None).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!("Error computing panel {}: {:#}", panel_id, e);
                        return;
                    }
                };

                if !is_live(&views, &ticket, &panel_id) {
                    return;
                }
                let msg = DashboardMessage::PanelUpdate {
                    panel_id,
                    series: result.series,
                    report: result.report,
                };
                let _ = tx.send(msg).await;
            });
        }

        // 3. Completion once every panel task has finished
        let total_panels = self.panels.len();
        let views = self.views.clone();
        tokio::spawn(async move {
            while tasks.join_next().await.is_some() {}

            if is_live(&views, &ticket, "complete") {
                let complete = DashboardMessage::Complete {
                    panels: total_panels,
                    duration_ms: start_time.elapsed().as_millis() as u64,
                };
                let _ = tx.send(complete).await;
            }
            views.release(&ticket);
        });

        rx
    }
}

fn is_live(views: &ViewTracker, ticket: &ViewTicket, what: &str) -> bool {
    let live = views.is_current(ticket);
    if !live {
        tracing::debug!(
            "Discarding {} for view {} - superseded by a newer refresh",
            what,
            ticket.view_id()
        );
    }
    live
}

fn skeleton_for(panel: &PanelConfig) -> PanelSkeleton {
    let kind = match panel.kind {
        PanelKind::Yoy => "bar",
        PanelKind::Trend => "line",
        PanelKind::Hotspot => "donut",
    };

    PanelSkeleton {
        id: panel.id.clone(),
        title: panel.title.clone(),
        kind,
        unit: panel.unit.clone(),
    }
}
