//! Achievement Sharing
//!
//! Sharing prefers the platform share sheet, then the clipboard. Either
//! capability may be absent; absence is detected when sharing is attempted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used for every shared achievement
pub const SHARE_TITLE: &str = "EcoGuard Achievement";

/// What is handed to a share target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    /// Payload announcing an unlocked achievement
    pub fn achievement(achievement_title: &str, url: &str) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            text: format!(
                "I just unlocked \"{}\" on EcoGuard! 🌱 Join me in reducing carbon emissions!",
                achievement_title
            ),
            url: url.to_string(),
        }
    }

    /// Text placed on the clipboard when no share sheet exists
    pub fn clipboard_text(&self) -> String {
        format!("{} {}", self.text, self.url)
    }
}

/// Result of a share attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareOutcome {
    /// Handed to the native share sheet
    Shared,
    /// Copied to the clipboard
    Copied,
    /// No share capability available
    Unsupported,
    Failed(String),
}

/// Errors from share targets
#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Share cancelled")]
    Cancelled,

    #[error("Share failed: {0}")]
    Native(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Platform share sheet
#[async_trait]
pub trait NativeShare: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

/// Writable text clipboard
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

/// System clipboard through arboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ShareError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ShareError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ShareError::Clipboard(e.to_string()))
    }
}
