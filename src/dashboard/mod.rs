//! Dashboard
//!
//! The controller and the data it works on:
//! - [`snapshot`]: the fetched dataset and the selectors it is fetched with
//! - [`state`]: UI mode flags
//! - [`controller`]: fetch → render → annotate cycle and user actions
//! - [`voice`]: keyword command rules
//! - [`share`]: achievement sharing targets

pub mod controller;
pub mod share;
pub mod snapshot;
pub mod state;
pub mod voice;

pub use controller::{DashboardBuilder, DashboardController, DashboardSettings, RefreshOutcome};
pub use share::{Clipboard, NativeShare, ShareError, ShareOutcome, SharePayload, SystemClipboard};
pub use snapshot::{
    Achievement, AlignmentError, ChartType, DashboardSnapshot, Insight, ParseSelectorError,
    Series, StreakDay, StreakSummary, TimeFilter,
};
pub use state::{AutoRefresh, UiState};
pub use voice::{LineRecognizer, SpeechRecognizer, VoiceAction, VoiceError, VoiceRule};
