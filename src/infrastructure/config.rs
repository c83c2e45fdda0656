use crate::domain::aggregate::AggregationMode;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub dashboard: PanelsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_emission_endpoints")]
    pub emission_endpoints: Vec<EndpointConfig>,
    #[serde(default = "default_metrics_endpoint")]
    pub metrics_endpoint: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            emission_endpoints: default_emission_endpoints(),
            metrics_endpoint: default_metrics_endpoint(),
        }
    }
}

/// One backend listing of emission records.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EndpointConfig {
    pub path: String,
    /// Scope label applied to records from this endpoint that carry none.
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    #[serde(default = "default_hotspot_top_n")]
    pub hotspot_top_n: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            hotspot_top_n: default_hotspot_top_n(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelsConfig {
    #[serde(default = "default_panels")]
    pub panels: Vec<PanelConfig>,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        Self {
            panels: default_panels(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    pub kind: PanelKind,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Yoy,
    Trend,
    Hotspot,
}

impl PanelKind {
    pub fn mode(self) -> AggregationMode {
        match self {
            PanelKind::Yoy => AggregationMode::YearlyTotal,
            PanelKind::Trend => AggregationMode::YearMonthByScope,
            PanelKind::Hotspot => AggregationMode::ActivityTotal,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_emission_endpoints() -> Vec<EndpointConfig> {
    (1..=3)
        .map(|n| EndpointConfig {
            path: format!("/scope{}/", n),
            scope: Some(format!("scope{}", n)),
        })
        .collect()
}

fn default_metrics_endpoint() -> String {
    "/metrics/".to_string()
}

fn default_hotspot_top_n() -> usize {
    6
}

fn default_panels() -> Vec<PanelConfig> {
    let unit = Some("tCO2e".to_string());
    vec![
        PanelConfig {
            id: "yoy".to_string(),
            title: "Year-over-Year Emissions".to_string(),
            kind: PanelKind::Yoy,
            unit: unit.clone(),
        },
        PanelConfig {
            id: "trend".to_string(),
            title: "Emission Trend Over Time".to_string(),
            kind: PanelKind::Trend,
            unit: unit.clone(),
        },
        PanelConfig {
            id: "hotspot".to_string(),
            title: "Emission Hotspots".to_string(),
            kind: PanelKind::Hotspot,
            unit,
        },
    ]
}

/// Loads `config/dashboard.*` (optional) overlaid with `DASHBOARD__*` env vars.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Joins the backend base URL and an endpoint path with exactly one slash.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
