// HTTP record source - pulls raw records from the emissions backend
use crate::application::record_source::RecordSource;
use crate::domain::record::{adapt, RawRecord};
use crate::infrastructure::config::{endpoint_url, BackendSettings, EndpointConfig};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} did not return a JSON array")]
    NotAnArray { url: String },
}

#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    client: reqwest::Client,
    base_url: String,
    emission_endpoints: Vec<EndpointConfig>,
    metrics_endpoint: String,
}

impl HttpRecordSource {
    pub fn new(settings: &BackendSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            emission_endpoints: settings.emission_endpoints.clone(),
            metrics_endpoint: settings.metrics_endpoint.clone(),
        })
    }

    async fn fetch_list(&self, path: &str) -> Result<Vec<Value>, SourceError> {
        let url = endpoint_url(&self.base_url, path);
        tracing::debug!("Fetching records from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| SourceError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { url, status });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|source| SourceError::Decode {
                url: url.clone(),
                source,
            })?;

        match body {
            Value::Array(values) => Ok(values),
            _ => Err(SourceError::NotAnArray { url }),
        }
    }

    async fn fetch_endpoint(&self, endpoint: &EndpointConfig) -> Result<Vec<RawRecord>, SourceError> {
        let mut records = adapt(self.fetch_list(&endpoint.path).await?);

        // scope tables carry no scope column of their own
        if let Some(scope) = &endpoint.scope {
            for record in &mut records {
                if !record.is_empty() {
                    record.insert_if_absent("scope", Value::String(scope.clone()));
                }
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch_emissions(&self) -> anyhow::Result<Vec<RawRecord>> {
        let batches = try_join_all(
            self.emission_endpoints
                .iter()
                .map(|endpoint| self.fetch_endpoint(endpoint)),
        )
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    async fn fetch_business_metrics(&self) -> anyhow::Result<Vec<RawRecord>> {
        Ok(adapt(self.fetch_list(&self.metrics_endpoint).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer, endpoints: Vec<EndpointConfig>) -> BackendSettings {
        BackendSettings {
            base_url: server.uri(),
            timeout_secs: 5,
            emission_endpoints: endpoints,
            metrics_endpoint: "/metrics/".to_string(),
        }
    }

    fn endpoint(path: &str, scope: Option<&str>) -> EndpointConfig {
        EndpointConfig {
            path: path.to_string(),
            scope: scope.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_fetch_emissions_tags_scope_and_keeps_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scope1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"material": "Diesel", "ghg_emission": 12.5, "start_date": "2024-01-01"},
                null
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/emissions/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"activity": "Electricity", "scope": "scope2", "total": 3}
            ])))
            .mount(&server)
            .await;

        let source = HttpRecordSource::new(&settings(
            &server,
            vec![endpoint("/scope1/", Some("scope1")), endpoint("emissions/", Some("scope3"))],
        ))
        .unwrap();
        let records = source.fetch_emissions().await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get("scope"), Some(&json!("scope1")));
        assert!(records[1].is_empty());
        assert_eq!(records[2].get("scope"), Some(&json!("scope2")));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scope1/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source =
            HttpRecordSource::new(&settings(&server, vec![endpoint("/scope1/", None)])).unwrap();
        let err = source.fetch_emissions().await.unwrap_err();

        match err.downcast_ref::<SourceError>() {
            Some(SourceError::Status { status, .. }) => assert_eq!(status.as_u16(), 500),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_array_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "oops"})))
            .mount(&server)
            .await;

        let source = HttpRecordSource::new(&settings(&server, Vec::new())).unwrap();
        let err = source.fetch_business_metrics().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::NotAnArray { .. })
        ));
    }

    #[tokio::test]
    async fn test_business_metrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"metric_name": "units", "metric_date": "2024-02-01", "value": 40}
            ])))
            .mount(&server)
            .await;

        let source = HttpRecordSource::new(&settings(&server, Vec::new())).unwrap();
        let metrics = source.fetch_business_metrics().await.unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].get("value"), Some(&json!(40)));
    }
}
