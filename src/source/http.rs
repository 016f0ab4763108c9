//! HTTP Data Source
//!
//! Fetches dashboard snapshots from the JSON data endpoint.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{DataSource, FetchError};
use crate::dashboard::{ChartType, DashboardSnapshot, TimeFilter};

/// Header marking the request as programmatic rather than navigational
const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// Configuration for the HTTP data source
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Full URL of the data endpoint (e.g. "http://localhost:8000/dashboard/api/data/")
    pub endpoint: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/dashboard/api/data/".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Data source backed by the dashboard JSON endpoint
pub struct HttpDataSource {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpDataSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    /// URL for one fetch, selectors in the query string
    fn request_url(&self, filter: TimeFilter, chart_type: ChartType) -> String {
        let separator = if self.config.endpoint.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}filter={}&chart_type={}",
            self.config.endpoint,
            separator,
            urlencoding::encode(filter.as_str()),
            urlencoding::encode(chart_type.as_str()),
        )
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_snapshot(
        &self,
        filter: TimeFilter,
        chart_type: ChartType,
    ) -> Result<DashboardSnapshot, FetchError> {
        let url = self.request_url(filter, chart_type);
        tracing::debug!(url = %url, "Fetching dashboard snapshot");

        let response = self
            .client
            .get(&url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let snapshot: DashboardSnapshot = serde_json::from_slice(&body)?;

        snapshot
            .check_alignment()
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        tracing::debug!(days = snapshot.len(), "Snapshot received");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::HeaderMap, http::StatusCode, routing::get, Json, Router};
    use std::collections::HashMap;

    fn payload(filter: &str) -> serde_json::Value {
        let days = if filter == "week" { 1 } else { 2 };
        let dates = &["2024-01-01", "2024-01-02"][..days];
        let emissions = &[5.0, 7.5][..days];
        let ones = vec![1.0; days];
        serde_json::json!({
            "dates": dates,
            "emissions": emissions,
            "transport": ones,
            "electricity": ones,
            "food": ones,
            "plastic": ones,
            "categories": ["Transport", "Electricity", "Food", "Plastic"],
            "category_totals": [2, 2, 2, 2],
            "radar_user": [1, 1, 1, 1],
            "radar_global": [6, 7, 5, 4],
        })
    }

    async fn data_handler(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        if headers.get("x-requested-with").and_then(|v| v.to_str().ok()) != Some("XMLHttpRequest") {
            return Err(StatusCode::BAD_REQUEST);
        }
        if params.get("chart_type").is_none() {
            return Err(StatusCode::BAD_REQUEST);
        }
        let filter = params.get("filter").cloned().unwrap_or_default();
        Ok(Json(payload(&filter)))
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/dashboard/api/data/", get(data_handler))
            .route("/broken/", get(|| async { "not json" }))
            .route(
                "/misaligned/",
                get(|| async {
                    Json(serde_json::json!({
                        "dates": ["2024-01-01"], "emissions": [1, 2], "transport": [1],
                        "electricity": [1], "food": [1], "plastic": [1],
                        "categories": [], "category_totals": [], "radar_user": [], "radar_global": []
                    }))
                }),
            )
            .route(
                "/down/",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn source(base: &str, path: &str) -> HttpDataSource {
        HttpDataSource::new(HttpSourceConfig {
            endpoint: format!("{}{}", base, path),
            request_timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[test]
    fn test_request_url() {
        let source = HttpDataSource::new(HttpSourceConfig::default()).unwrap();
        assert_eq!(
            source.request_url(TimeFilter::Week, ChartType::Bar),
            "http://localhost:8000/dashboard/api/data/?filter=week&chart_type=bar"
        );
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let base = spawn_server().await;
        let source = source(&base, "/dashboard/api/data/");

        let snapshot = source
            .fetch_snapshot(TimeFilter::Month, ChartType::Line)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.emissions, vec![5.0, 7.5]);

        let snapshot = source
            .fetch_snapshot(TimeFilter::Week, ChartType::Line)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let base = spawn_server().await;
        let err = source(&base, "/down/")
            .fetch_snapshot(TimeFilter::Month, ChartType::Line)
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_payloads() {
        let base = spawn_server().await;

        let err = source(&base, "/broken/")
            .fetch_snapshot(TimeFilter::Month, ChartType::Line)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));

        let err = source(&base, "/misaligned/")
            .fetch_snapshot(TimeFilter::Month, ChartType::Line)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let err = source("http://127.0.0.1:1", "/dashboard/api/data/")
            .fetch_snapshot(TimeFilter::Month, ChartType::Line)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_) | FetchError::Timeout));
    }
}
