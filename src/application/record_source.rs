// Upstream seam for emission and business metric records
use crate::domain::record::RawRecord;
use async_trait::async_trait;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All emission records across the configured endpoints, in endpoint order
    async fn fetch_emissions(&self) -> anyhow::Result<Vec<RawRecord>>;

    /// Business metric records used as the intensity denominator
    async fn fetch_business_metrics(&self) -> anyhow::Result<Vec<RawRecord>>;
}
