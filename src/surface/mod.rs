//! Display Surfaces
//!
//! A display surface is everything the dashboard draws on: chart slots,
//! annotation grids, toasts, indicators and file downloads. The controller
//! only talks to the [`DisplaySurface`] trait.
//!
//! - [`HeadlessSurface`]: in-memory surface that keeps SVG copies of charts
//!   and writes downloads to disk

mod headless;

pub use headless::{HeadlessSurface, SurfaceEvent};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::air_quality::AirQualityReport;
use crate::dashboard::{Achievement, Insight};
use crate::render::{ChartSpec, ChartTarget};

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// A transient, non-blocking user notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: ToastKind,
    pub message: String,
}

/// A file handed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// An RGBA raster of a rendered chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 8 bits per channel
    pub rgba: Vec<u8>,
}

impl RasterImage {
    /// Pixels as RGB, alpha composited over white
    pub fn to_rgb(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| {
                let alpha = px[3] as u16;
                let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
                [blend(px[0]), blend(px[1]), blend(px[2])]
            })
            .collect()
    }
}

/// Errors raised by a display surface
#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rasterization failed: {0}")]
    Raster(String),
}

/// Everything the dashboard can draw on
pub trait DisplaySurface: Send + Sync {
    /// Draw (or redraw) one chart into its slot
    fn render_chart(&self, chart: &ChartSpec);

    fn show_achievements(&self, achievements: &[Achievement]);

    fn show_insights(&self, insights: &[Insight]);

    fn show_air_quality(&self, report: &AirQualityReport);

    /// Show a transient notification
    fn notify(&self, kind: ToastKind, message: &str);

    /// Dim the dashboard while a refresh is in flight
    fn set_loading(&self, loading: bool);

    /// Voice "listening" indicator
    fn set_listening(&self, listening: bool);

    fn set_dark_mode(&self, enabled: bool);

    /// Hand a file to the user
    fn download(&self, file: Download) -> Result<(), SurfaceError>;

    /// Rasterize the chart currently shown in `target`; `None` if nothing
    /// has been rendered there yet
    fn rasterize_chart(&self, target: ChartTarget) -> Result<Option<RasterImage>, SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_composites_over_white() {
        let image = RasterImage {
            width: 2,
            height: 1,
            rgba: vec![10, 20, 30, 255, 0, 0, 0, 0],
        };
        assert_eq!(image.to_rgb(), vec![10, 20, 30, 255, 255, 255]);
    }
}
