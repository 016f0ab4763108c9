//! Dashboard Data Sources
//!
//! The controller depends on the data endpoint only through the
//! [`DataSource`] trait:
//! - [`HttpDataSource`]: fetches snapshots from the dashboard JSON endpoint

mod http;

pub use http::{HttpDataSource, HttpSourceConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::dashboard::{ChartType, DashboardSnapshot, TimeFilter};

/// Provider of dashboard snapshots
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch one snapshot for the given selectors
    async fn fetch_snapshot(
        &self,
        filter: TimeFilter,
        chart_type: ChartType,
    ) -> Result<DashboardSnapshot, FetchError>;
}

/// Errors that can occur while fetching a snapshot
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}
