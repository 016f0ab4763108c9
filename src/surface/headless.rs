//! Headless Display Surface
//!
//! Keeps the last rendered chart of every slot as SVG markup, records
//! notifications and downloads in memory, and optionally writes downloads
//! into an output directory. Used by the command-line front end and by
//! tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{DisplaySurface, Download, Notification, RasterImage, SurfaceError, ToastKind};
use crate::air_quality::AirQualityReport;
use crate::dashboard::{Achievement, Insight};
use crate::export::raster;
use crate::render::{svg, ChartSpec, ChartTarget};

/// A chart as last drawn into its slot
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub spec: ChartSpec,
    pub svg: String,
}

/// One drawing call, as recorded in [`HeadlessSurface::events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Chart(ChartTarget),
    Achievements,
    Insights,
}

#[derive(Default)]
struct SurfaceState {
    charts: HashMap<ChartTarget, RenderedChart>,
    render_log: Vec<ChartTarget>,
    events: Vec<SurfaceEvent>,
    achievements: Vec<Achievement>,
    insights: Vec<Insight>,
    air_quality: Option<AirQualityReport>,
    notifications: Vec<Notification>,
    downloads: Vec<Download>,
}

/// In-memory display surface
#[derive(Default)]
pub struct HeadlessSurface {
    state: Mutex<SurfaceState>,
    output_dir: Option<PathBuf>,
    loading: AtomicBool,
    listening: AtomicBool,
    dark_mode: AtomicBool,
}

impl HeadlessSurface {
    /// Surface that keeps downloads in memory only
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface that also writes every download into `dir`
    pub fn with_output_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Chart currently shown in a slot
    pub fn chart(&self, target: ChartTarget) -> Option<RenderedChart> {
        self.state().charts.get(&target).cloned()
    }

    /// Every render call so far, in order
    pub fn render_log(&self) -> Vec<ChartTarget> {
        self.state().render_log.clone()
    }

    /// Chart renders and annotation updates, interleaved in call order
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.state().events.clone()
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        self.state().achievements.clone()
    }

    pub fn insights(&self) -> Vec<Insight> {
        self.state().insights.clone()
    }

    pub fn air_quality(&self) -> Option<AirQualityReport> {
        self.state().air_quality.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    /// Notifications of one kind
    pub fn notifications_of(&self, kind: ToastKind) -> Vec<String> {
        self.state()
            .notifications
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.state().downloads.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode.load(Ordering::SeqCst)
    }
}

impl DisplaySurface for HeadlessSurface {
    fn render_chart(&self, chart: &ChartSpec) {
        let markup = svg::render(chart);
        tracing::debug!(target_slot = %chart.target, bytes = markup.len(), "Chart rendered");

        let mut state = self.state();
        state.render_log.push(chart.target);
        state.events.push(SurfaceEvent::Chart(chart.target));
        state.charts.insert(
            chart.target,
            RenderedChart {
                spec: chart.clone(),
                svg: markup,
            },
        );
    }

    fn show_achievements(&self, achievements: &[Achievement]) {
        let unlocked = achievements.iter().filter(|a| a.unlocked).count();
        tracing::debug!(total = achievements.len(), unlocked, "Achievements updated");
        let mut state = self.state();
        state.achievements = achievements.to_vec();
        state.events.push(SurfaceEvent::Achievements);
    }

    fn show_insights(&self, insights: &[Insight]) {
        tracing::debug!(count = insights.len(), "Insights updated");
        let mut state = self.state();
        state.insights = insights.to_vec();
        state.events.push(SurfaceEvent::Insights);
    }

    fn show_air_quality(&self, report: &AirQualityReport) {
        tracing::info!("{}", report.summary());
        self.state().air_quality = Some(report.clone());
    }

    fn notify(&self, kind: ToastKind, message: &str) {
        match kind {
            ToastKind::Error => tracing::warn!(kind = "error", "{}", message),
            ToastKind::Success => tracing::info!(kind = "success", "{}", message),
            ToastKind::Info => tracing::info!(kind = "info", "{}", message),
        }
        self.state().notifications.push(Notification {
            kind,
            message: message.to_string(),
        });
    }

    fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
    }

    fn set_dark_mode(&self, enabled: bool) {
        self.dark_mode.store(enabled, Ordering::SeqCst);
    }

    fn download(&self, file: Download) -> Result<(), SurfaceError> {
        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(&file.filename);
            std::fs::write(&path, &file.bytes)?;
            tracing::info!(path = %path.display(), bytes = file.bytes.len(), "File saved");
        }
        self.state().downloads.push(file);
        Ok(())
    }

    fn rasterize_chart(&self, target: ChartTarget) -> Result<Option<RasterImage>, SurfaceError> {
        let markup = match self.state().charts.get(&target) {
            Some(chart) => chart.svg.clone(),
            None => return Ok(None),
        };

        raster::rasterize_svg(&markup)
            .map(Some)
            .map_err(|e| SurfaceError::Raster(e.to_string()))
    }
}
