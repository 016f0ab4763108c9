//! Dashboard Controller
//!
//! Owns the current snapshot and UI mode flags and runs the
//! fetch → render → annotate cycle. Every user-facing operation reports
//! failures as notifications on the display surface; nothing here returns
//! an error to the caller.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::share::{Clipboard, NativeShare, ShareOutcome, SharePayload};
use super::snapshot::{ChartType, DashboardSnapshot, Series, TimeFilter};
use super::state::{AutoRefresh, UiState};
use super::voice::{self, SpeechRecognizer, VoiceAction, VoiceRule};
use crate::air_quality::{AirQualityError, AirQualityReport, AirQualitySource, Geolocator};
use crate::export::{self, ChartFormat, DataFormat};
use crate::preferences::{self, MemoryPreferenceStore, PreferenceStore};
use crate::render::{self, ChartTarget, ThemeColors};
use crate::source::DataSource;
use crate::surface::{DisplaySurface, Download, ToastKind};

const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables of a dashboard instance
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    /// Period of the auto-refresh timer
    pub auto_refresh_interval: Duration,
    /// How long the listening indicator stays on
    pub voice_timeout: Duration,
    /// Link included in shared achievements
    pub page_url: String,
    pub initial_filter: TimeFilter,
    pub initial_chart_type: ChartType,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            auto_refresh_interval: Duration::from_secs(30),
            voice_timeout: Duration::from_secs(5),
            page_url: "http://localhost:8000/dashboard/".to_string(),
            initial_filter: TimeFilter::Month,
            initial_chart_type: ChartType::Line,
        }
    }
}

/// How a refresh ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshOutcome {
    /// Snapshot replaced and rendered
    Applied,
    /// A newer response was already applied; this one was discarded
    Stale,
    /// Fetch failed; previous snapshot kept
    Failed,
}

/// Builder for [`DashboardController`]
pub struct DashboardBuilder {
    source: Arc<dyn DataSource>,
    surface: Arc<dyn DisplaySurface>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    native_share: Option<Arc<dyn NativeShare>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    air_quality: Option<Arc<dyn AirQualitySource>>,
    geolocator: Option<Arc<dyn Geolocator>>,
    settings: DashboardSettings,
}

impl DashboardBuilder {
    pub fn new(source: Arc<dyn DataSource>, surface: Arc<dyn DisplaySurface>) -> Self {
        Self {
            source,
            surface,
            preferences: None,
            recognizer: None,
            native_share: None,
            clipboard: None,
            air_quality: None,
            geolocator: None,
            settings: DashboardSettings::default(),
        }
    }

    /// Where the dark-mode flag is persisted; in-memory if unset
    pub fn preferences(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(store);
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn native_share(mut self, share: Arc<dyn NativeShare>) -> Self {
        self.native_share = Some(share);
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn air_quality(mut self, source: Arc<dyn AirQualitySource>) -> Self {
        self.air_quality = Some(source);
        self
    }

    pub fn geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    pub fn settings(mut self, settings: DashboardSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the controller, hydrating dark mode from the preference store
    pub fn build(self) -> Arc<DashboardController> {
        let preferences = self
            .preferences
            .unwrap_or_else(|| Arc::new(MemoryPreferenceStore::new()));

        let dark_mode = preferences::load_dark_mode(preferences.as_ref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read dark mode preference");
            false
        });
        self.surface.set_dark_mode(dark_mode);

        let state = UiState::new(
            self.settings.initial_filter,
            self.settings.initial_chart_type,
            dark_mode,
        );

        tracing::info!(
            source = self.source.name(),
            filter = %state.time_filter,
            chart_type = %state.chart_type,
            dark_mode,
            "Dashboard created"
        );

        Arc::new(DashboardController {
            source: self.source,
            surface: self.surface,
            preferences,
            recognizer: self.recognizer,
            native_share: self.native_share,
            clipboard: self.clipboard,
            air_quality: self.air_quality,
            geolocator: self.geolocator,
            settings: self.settings,
            rules: voice::default_rules(),
            state: RwLock::new(state),
            snapshot: RwLock::new(None),
            timer: Mutex::new(None),
            request_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        })
    }
}

/// The dashboard: current data, UI modes and the actions on them
pub struct DashboardController {
    source: Arc<dyn DataSource>,
    surface: Arc<dyn DisplaySurface>,
    preferences: Arc<dyn PreferenceStore>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    native_share: Option<Arc<dyn NativeShare>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    air_quality: Option<Arc<dyn AirQualitySource>>,
    geolocator: Option<Arc<dyn Geolocator>>,
    settings: DashboardSettings,
    rules: Vec<VoiceRule>,
    state: RwLock<UiState>,
    snapshot: RwLock<Option<Arc<DashboardSnapshot>>>,
    /// Auto-refresh task; `Some` exactly while auto-refresh is active
    timer: Mutex<Option<JoinHandle<()>>>,
    request_seq: AtomicU64,
    applied_seq: AtomicU64,
    in_flight: AtomicUsize,
}

impl DashboardController {
    pub fn builder(source: Arc<dyn DataSource>, surface: Arc<dyn DisplaySurface>) -> DashboardBuilder {
        DashboardBuilder::new(source, surface)
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub async fn ui_state(&self) -> UiState {
        *self.state.read().await
    }

    /// Snapshot currently held, if any fetch has succeeded
    pub async fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot.read().await.clone()
    }

    pub async fn auto_refresh(&self) -> AutoRefresh {
        self.state.read().await.auto_refresh
    }

    // ============================================
    // Fetch and render
    // ============================================

    /// Fetch a snapshot for the current selectors and render it
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let requested = self.ui_state().await;
        let _loading = LoadingGuard::enter(&self.in_flight, self.surface.as_ref());

        tracing::debug!(
            seq,
            filter = %requested.time_filter,
            chart_type = %requested.chart_type,
            "Fetching dashboard data"
        );
        let result = self
            .source
            .fetch_snapshot(requested.time_filter, requested.chart_type)
            .await;

        match result {
            Ok(snapshot) => self.apply(seq, snapshot).await,
            Err(e) => {
                tracing::warn!(seq, error = %e, "Failed to load dashboard data");
                self.surface
                    .notify(ToastKind::Error, "Failed to load dashboard data");
                RefreshOutcome::Failed
            }
        }
    }

    async fn apply(&self, seq: u64, snapshot: DashboardSnapshot) -> RefreshOutcome {
        // Lock order: snapshot, then state
        let mut current = self.snapshot.write().await;
        let ui = self.ui_state().await;

        let applied = self.applied_seq.load(Ordering::SeqCst);
        if seq < applied {
            tracing::debug!(seq, applied, "Discarding stale response");
            return RefreshOutcome::Stale;
        }
        self.applied_seq.store(seq, Ordering::SeqCst);

        let snapshot = Arc::new(snapshot);
        *current = Some(Arc::clone(&snapshot));

        // Render under the write lock: an older response must never render last
        self.render_all(&snapshot, ui);
        self.surface.show_achievements(&snapshot.achievements);
        self.surface.show_insights(&snapshot.ai_insights);

        tracing::info!(seq, days = snapshot.len(), "Dashboard updated");
        RefreshOutcome::Applied
    }

    fn render_all(&self, snapshot: &DashboardSnapshot, ui: UiState) {
        let theme = ThemeColors::for_mode(ui.dark_mode);
        let spec = render::build(snapshot, ui.chart_type, &theme);
        for chart in spec.charts() {
            self.surface.render_chart(chart);
        }
    }

    /// Change the time range and refetch
    pub async fn set_time_filter(&self, filter: TimeFilter) -> RefreshOutcome {
        self.state.write().await.time_filter = filter;
        self.refresh().await
    }

    /// Change the main chart type; re-renders from the held snapshot only
    pub async fn set_chart_type(&self, chart_type: ChartType) {
        let current = self.snapshot.read().await;
        let mut state = self.state.write().await;
        state.chart_type = chart_type;

        if let Some(snapshot) = current.as_deref() {
            let theme = ThemeColors::for_mode(state.dark_mode);
            self.surface
                .render_chart(&render::main_chart(snapshot, chart_type, &theme));
        }
    }

    // ============================================
    // Auto-refresh
    // ============================================

    /// Start or stop the periodic refresh; returns the new state
    pub async fn toggle_auto_refresh(self: &Arc<Self>) -> AutoRefresh {
        let mut state = self.state.write().await;
        let next = state.auto_refresh.toggled();

        {
            let mut timer = self.timer_slot();
            if let Some(handle) = timer.take() {
                handle.abort();
            }
            if next.is_active() {
                *timer = Some(self.spawn_auto_refresh());
            }
        }

        state.auto_refresh = next;
        tracing::info!(
            active = next.is_active(),
            interval_secs = self.refresh_interval().as_secs(),
            "Auto-refresh toggled"
        );
        next
    }

    fn refresh_interval(&self) -> Duration {
        self.settings.auto_refresh_interval.max(MIN_REFRESH_INTERVAL)
    }

    fn spawn_auto_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let controller: Weak<Self> = Arc::downgrade(self);
        let period = self.refresh_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(controller) = controller.upgrade() else {
                    break;
                };
                tracing::debug!("Running scheduled refresh");

                // Aborting the ticker detaches a running refresh instead of cancelling it
                let scheduled = tokio::spawn(async move {
                    controller.refresh().await;
                });
                if let Err(e) = scheduled.await {
                    tracing::warn!(error = %e, "Scheduled refresh task failed");
                }
            }
        })
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ============================================
    // Dark mode
    // ============================================

    /// Flip dark mode, persist it and redraw; returns the new value
    pub async fn toggle_dark_mode(&self) -> bool {
        let current = self.snapshot.read().await;
        let mut state = self.state.write().await;
        state.dark_mode = !state.dark_mode;
        let ui = *state;

        if let Err(e) = preferences::store_dark_mode(self.preferences.as_ref(), ui.dark_mode) {
            tracing::warn!(error = %e, "Failed to persist dark mode preference");
        }
        self.surface.set_dark_mode(ui.dark_mode);

        if let Some(snapshot) = current.as_deref() {
            self.render_all(snapshot, ui);
        }
        ui.dark_mode
    }

    // ============================================
    // Export
    // ============================================

    /// Download the held snapshot's series; `false` if nothing was downloaded
    pub async fn export_data(&self, format: DataFormat) -> bool {
        let Some(snapshot) = self.snapshot().await else {
            tracing::debug!(%format, "No data to export");
            return false;
        };

        let file = match export::data_download(&snapshot, format) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(%format, error = %e, "Data export failed");
                self.surface.notify(ToastKind::Error, "Failed to export data");
                return false;
            }
        };

        self.deliver(file)
    }

    /// Download the main chart as an image or PDF
    pub async fn export_chart(&self, format: ChartFormat) -> bool {
        let image = match self.surface.rasterize_chart(ChartTarget::Main) {
            Ok(Some(image)) => image,
            Ok(None) => {
                tracing::debug!(%format, "No chart to export");
                return false;
            }
            Err(e) => {
                tracing::warn!(%format, error = %e, "Chart rasterization failed");
                self.surface.notify(ToastKind::Error, "Failed to export chart");
                return false;
            }
        };

        match export::chart_download(&image, format) {
            Ok(file) => self.deliver(file),
            Err(e) => {
                tracing::warn!(%format, error = %e, "Chart export failed");
                self.surface.notify(ToastKind::Error, "Failed to export chart");
                false
            }
        }
    }

    fn deliver(&self, file: Download) -> bool {
        let filename = file.filename.clone();
        let bytes = file.bytes.len();
        match self.surface.download(file) {
            Ok(()) => {
                tracing::info!(%filename, bytes, "Export downloaded");
                true
            }
            Err(e) => {
                tracing::warn!(%filename, error = %e, "Download failed");
                self.surface
                    .notify(ToastKind::Error, &format!("Failed to save {}", filename));
                false
            }
        }
    }

    // ============================================
    // Drill-down
    // ============================================

    /// Detailed chart of one series from the held snapshot
    pub async fn drill_down(&self, series: Series) -> bool {
        let Some(snapshot) = self.snapshot().await else {
            return false;
        };
        let theme = ThemeColors::for_mode(self.ui_state().await.dark_mode);
        self.surface
            .render_chart(&render::drill_down_chart(&snapshot, series, &theme));
        true
    }

    // ============================================
    // Voice
    // ============================================

    /// Run the first voice rule matching `transcript`
    pub async fn process_voice_command(&self, transcript: &str) -> Option<VoiceAction> {
        tracing::info!(%transcript, "Voice command");

        let Some(rule) = voice::match_command(&self.rules, transcript) else {
            let heard = transcript.to_lowercase();
            self.surface
                .notify(ToastKind::Error, &voice::unrecognized_message(&heard));
            return None;
        };

        match rule.action {
            VoiceAction::ShowRange(filter) => {
                self.set_time_filter(filter).await;
            }
            VoiceAction::ToggleDarkMode => {
                self.toggle_dark_mode().await;
            }
            VoiceAction::ExportData => {
                self.export_data(DataFormat::Csv).await;
            }
            VoiceAction::Refresh => {
                self.refresh().await;
            }
        }

        self.surface.notify(ToastKind::Success, rule.confirmation);
        Some(rule.action)
    }

    /// Listen for one utterance and dispatch it
    pub async fn start_voice_command(&self) -> Option<VoiceAction> {
        let Some(recognizer) = self.recognizer.clone() else {
            self.surface.notify(
                ToastKind::Error,
                "Voice recognition not supported on this device",
            );
            return None;
        };

        self.surface.set_listening(true);
        let surface = Arc::clone(&self.surface);
        let timeout = self.settings.voice_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            surface.set_listening(false);
        });

        match recognizer.recognize().await {
            Ok(transcript) => self.process_voice_command(&transcript).await,
            Err(e) => {
                tracing::warn!(error = %e, "Speech recognition error");
                self.surface.notify(ToastKind::Error, "Voice recognition failed");
                None
            }
        }
    }

    // ============================================
    // Sharing
    // ============================================

    /// Share an unlocked achievement through the best available channel
    pub async fn share_achievement(&self, title: &str) -> ShareOutcome {
        let payload = SharePayload::achievement(title, &self.settings.page_url);

        if let Some(share) = &self.native_share {
            return match share.share(&payload).await {
                Ok(()) => ShareOutcome::Shared,
                Err(e) => {
                    tracing::error!(error = %e, "Native share failed");
                    ShareOutcome::Failed(e.to_string())
                }
            };
        }

        if let Some(clipboard) = &self.clipboard {
            return match clipboard.write_text(&payload.clipboard_text()) {
                Ok(()) => {
                    self.surface
                        .notify(ToastKind::Success, "Achievement copied to clipboard!");
                    ShareOutcome::Copied
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Clipboard write failed");
                    self.surface.notify(
                        ToastKind::Error,
                        "Sharing not supported - Copy link manually",
                    );
                    ShareOutcome::Failed(e.to_string())
                }
            };
        }

        self.surface.notify(
            ToastKind::Error,
            "Sharing not supported - Copy link manually",
        );
        ShareOutcome::Unsupported
    }

    // ============================================
    // Air quality
    // ============================================

    /// Look up and show the air quality of a named city
    pub async fn check_city_air_quality(&self, city: &str) -> Option<AirQualityReport> {
        const FAILED: &str = "Failed to fetch alerts. Please try again.";

        let city = city.trim();
        if city.is_empty() {
            self.surface.notify(ToastKind::Error, "Please enter a city name.");
            return None;
        }

        let Some(source) = &self.air_quality else {
            tracing::warn!("Air quality lookups are not configured");
            self.surface.notify(ToastKind::Error, FAILED);
            return None;
        };

        let coordinates = match source.geocode(city).await {
            Ok(at) => at,
            Err(AirQualityError::CityNotFound(_)) => {
                self.surface.notify(ToastKind::Error, "Location not found.");
                return None;
            }
            Err(e) => {
                tracing::warn!(%city, error = %e, "Geocoding failed");
                self.surface.notify(ToastKind::Error, FAILED);
                return None;
            }
        };

        match source.air_quality(coordinates).await {
            Ok(level) => Some(self.show_report(AirQualityReport {
                location: city.to_string(),
                coordinates,
                level,
            })),
            Err(e) => {
                tracing::warn!(%city, error = %e, "Air quality lookup failed");
                self.surface.notify(ToastKind::Error, FAILED);
                None
            }
        }
    }

    /// Look up and show the air quality at the current position
    pub async fn check_local_air_quality(&self) -> Option<AirQualityReport> {
        let Some(geolocator) = &self.geolocator else {
            self.surface.notify(ToastKind::Error, "Geolocation not supported.");
            return None;
        };

        let coordinates = match geolocator.current_position().await {
            Ok(at) => at,
            Err(e) => {
                tracing::warn!(error = %e, "Geolocation failed");
                self.surface
                    .notify(ToastKind::Error, "Geolocation permission denied.");
                return None;
            }
        };

        let level = match &self.air_quality {
            Some(source) => source.air_quality(coordinates).await,
            None => Err(AirQualityError::Malformed(
                "air quality lookups are not configured".to_string(),
            )),
        };

        match level {
            Ok(level) => Some(self.show_report(AirQualityReport {
                location: coordinates.to_string(),
                coordinates,
                level,
            })),
            Err(e) => {
                tracing::warn!(at = %coordinates, error = %e, "Air quality lookup failed");
                self.surface
                    .notify(ToastKind::Error, "Failed to load air quality data.");
                None
            }
        }
    }

    fn show_report(&self, report: AirQualityReport) -> AirQualityReport {
        self.surface.show_air_quality(&report);
        report
    }
}

/// Holds the loading indicator on while at least one fetch is outstanding
struct LoadingGuard<'a> {
    in_flight: &'a AtomicUsize,
    surface: &'a dyn DisplaySurface,
}

impl<'a> LoadingGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, surface: &'a dyn DisplaySurface) -> Self {
        if in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            surface.set_loading(true);
        }
        Self { in_flight, surface }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.surface.set_loading(false);
        }
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}
