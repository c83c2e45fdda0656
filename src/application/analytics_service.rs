// Analytics service - one fetch and a full recompute per call
use crate::application::record_source::RecordSource;
use crate::domain::aggregate::AggregationMode;
use crate::domain::intensity::{compute_intensity, Intensity};
use crate::domain::pipeline::{self, PipelineReport};
use crate::domain::series::ChartSeries;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsResult {
    pub series: ChartSeries,
    pub report: PipelineReport,
}

#[derive(Clone)]
pub struct AnalyticsService {
    source: Arc<dyn RecordSource>,
    hotspot_top_n: usize,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn RecordSource>, hotspot_top_n: usize) -> Self {
        Self {
            source,
            hotspot_top_n,
        }
    }

    pub async fn yearly_totals(&self) -> anyhow::Result<AnalyticsResult> {
        self.series_for(AggregationMode::YearlyTotal, None).await
    }

    pub async fn monthly_trend(&self) -> anyhow::Result<AnalyticsResult> {
        self.series_for(AggregationMode::YearMonthByScope, None).await
    }

    /// Hotspot ranking; `top` overrides the configured limit and `0` disables it
    pub async fn hotspots(&self, top: Option<usize>) -> anyhow::Result<AnalyticsResult> {
        self.series_for(AggregationMode::ActivityTotal, top).await
    }

    pub async fn series_for(
        &self,
        mode: AggregationMode,
        top: Option<usize>,
    ) -> anyhow::Result<AnalyticsResult> {
        let records = self.source.fetch_emissions().await?;

        let top_n = match mode {
            AggregationMode::ActivityTotal => {
                Some(top.unwrap_or(self.hotspot_top_n)).filter(|n| *n > 0)
            }
            _ => None,
        };
        let (series, report) = pipeline::run(&records, mode, top_n);

        tracing::debug!(
            ?mode,
            records_seen = report.records_seen,
            records_dropped = report.records_dropped,
            observations_excluded = report.observations_excluded,
            rows = series.rows.len(),
            empty = series.is_empty(),
            "Materialized emission series"
        );

        Ok(AnalyticsResult { series, report })
    }

    pub async fn intensity(&self) -> anyhow::Result<Intensity> {
        let (emissions, metrics) = tokio::try_join!(
            self.source.fetch_emissions(),
            self.source.fetch_business_metrics()
        )?;

        let intensity = compute_intensity(&emissions, &metrics);
        tracing::debug!(
            emissions = intensity.emissions,
            metric_total = intensity.metric_total,
            "Computed emission intensity"
        );

        Ok(intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::StaticRecordSource;
    use serde_json::json;

    fn service(source: StaticRecordSource, top_n: usize) -> AnalyticsService {
        AnalyticsService::new(Arc::new(source), top_n)
    }

    fn hotspot_records() -> Vec<serde_json::Value> {
        ["Diesel", "Electricity", "Waste", "Travel"]
            .iter()
            .enumerate()
            .map(|(i, activity)| json!({"activity": activity, "total": 40 - i * 10}))
            .collect()
    }

    #[tokio::test]
    async fn test_yearly_totals() {
        let source = StaticRecordSource::new(vec![
            json!({"year": 2022, "scope": "scope1", "total": 100}),
            json!({"year": 2021, "scope": "scope2", "emission": 25}),
            json!({"year": 2022, "scope": "scope2", "total": "50"}),
        ]);
        let result = service(source, 6).yearly_totals().await.unwrap();

        assert_eq!(result.series.keys(), vec!["2021", "2022"]);
        assert_eq!(result.series.rows[1].value("emission"), 150.0);
        assert_eq!(result.report.records_seen, 3);
    }

    #[tokio::test]
    async fn test_hotspot_limits() {
        let svc = service(StaticRecordSource::new(hotspot_records()), 2);

        let default_top = svc.hotspots(None).await.unwrap();
        assert_eq!(default_top.series.keys(), vec!["Diesel", "Electricity"]);

        let explicit = svc.hotspots(Some(3)).await.unwrap();
        assert_eq!(explicit.series.rows.len(), 3);

        let unlimited = svc.hotspots(Some(0)).await.unwrap();
        assert_eq!(unlimited.series.rows.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let svc = service(StaticRecordSource::failing(), 6);
        assert!(svc.monthly_trend().await.is_err());
        assert!(svc.intensity().await.is_err());
    }

    #[tokio::test]
    async fn test_intensity() {
        let source = StaticRecordSource::new(vec![json!({"total": 90})])
            .with_metrics(vec![json!({"metric_name": "revenue", "value": 30})]);
        let intensity = service(source, 6).intensity().await.unwrap();

        assert_eq!(intensity.intensity, Some(3.0));
    }
}
