//! # EcoGuard
//!
//! Carbon-footprint dashboard controller: fetches emission snapshots from the
//! dashboard data endpoint, turns them into chart descriptions, drives a
//! display surface and handles the dashboard's user actions.
//!
//! ## Features
//!
//! - **Refresh pipeline**: fetch → render → annotate, stale responses discarded
//! - **Charts**: main (line, bar, pie, heatmap), radar, category, waterfall and streak
//! - **Exports**: CSV and JSON data, PNG and PDF charts
//! - **Voice commands**: ordered keyword rules
//! - **Air quality**: OpenWeather lookups by city or position
//!
//! ## Modules
//!
//! - [`dashboard`]: controller, UI state, voice and sharing
//! - [`source`]: data endpoint adapters
//! - [`render`]: pure chart building and SVG output
//! - [`surface`]: display surfaces
//! - [`export`]: downloadable files
//! - [`air_quality`]: air-quality alerts
//! - [`preferences`]: persisted dark-mode flag
//! - [`config`]: configuration loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecoguard::dashboard::DashboardController;
//! use ecoguard::source::{HttpDataSource, HttpSourceConfig};
//! use ecoguard::surface::HeadlessSurface;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(HttpDataSource::new(HttpSourceConfig::default())?);
//!     let surface = Arc::new(HeadlessSurface::with_output_dir("./exports"));
//!
//!     let dashboard = DashboardController::builder(source, surface).build();
//!     dashboard.refresh().await;
//!     dashboard.export_data(ecoguard::export::DataFormat::Csv).await;
//!
//!     Ok(())
//! }
//! ```

pub mod air_quality;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod preferences;
pub mod render;
pub mod source;
pub mod surface;

// Re-export top-level types for convenience
pub use dashboard::{
    AutoRefresh, ChartType, DashboardBuilder, DashboardController, DashboardSettings,
    DashboardSnapshot, RefreshOutcome, Series, TimeFilter, UiState, VoiceAction,
};

pub use source::{DataSource, FetchError, HttpDataSource, HttpSourceConfig};

pub use render::{ChartSpec, ChartTarget, RenderSpec, ThemeColors};

pub use surface::{DisplaySurface, HeadlessSurface, ToastKind};

pub use export::{ChartFormat, DataFormat, ExportError};

pub use air_quality::{AirQualityError, AirQualityReport, AqiLevel, OpenWeatherClient};

pub use preferences::{FilePreferenceStore, PreferenceStore};

pub use config::{Config, ConfigError, LoggingConfig};
