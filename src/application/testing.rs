// In-memory record source for service tests
use crate::application::record_source::RecordSource;
use crate::domain::record::{adapt, RawRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    emissions: Vec<Value>,
    metrics: Vec<Value>,
    delay: Option<Duration>,
    fail: bool,
}

impl StaticRecordSource {
    pub fn new(emissions: Vec<Value>) -> Self {
        Self {
            emissions,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_metrics(mut self, metrics: Vec<Value>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn respond(&self, values: &[Value]) -> anyhow::Result<Vec<RawRecord>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("backend unavailable");
        }
        Ok(adapt(values.to_vec()))
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    async fn fetch_emissions(&self) -> anyhow::Result<Vec<RawRecord>> {
        self.respond(&self.emissions).await
    }

    async fn fetch_business_metrics(&self) -> anyhow::Result<Vec<RawRecord>> {
        self.respond(&self.metrics).await
    }
}
