//! Voice Commands
//!
//! Transcripts are matched against an ordered list of keyword rules. The
//! first rule whose predicate holds wins; later rules are not consulted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::snapshot::TimeFilter;

/// What a recognised command does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceAction {
    ShowRange(TimeFilter),
    ToggleDarkMode,
    ExportData,
    Refresh,
}

/// One (predicate, action) pair
pub struct VoiceRule {
    pub name: &'static str,
    predicate: fn(&str) -> bool,
    pub action: VoiceAction,
    /// Confirmation shown after the action ran
    pub confirmation: &'static str,
}

impl VoiceRule {
    pub fn new(
        name: &'static str,
        predicate: fn(&str) -> bool,
        action: VoiceAction,
        confirmation: &'static str,
    ) -> Self {
        Self {
            name,
            predicate,
            action,
            confirmation,
        }
    }

    /// Whether the (already lower-cased) transcript triggers this rule
    pub fn matches(&self, transcript: &str) -> bool {
        (self.predicate)(transcript)
    }
}

impl std::fmt::Debug for VoiceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceRule")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish()
    }
}

/// The dashboard's command set, in evaluation order
pub fn default_rules() -> Vec<VoiceRule> {
    vec![
        VoiceRule::new(
            "show-month",
            |t| t.contains("show") && t.contains("month"),
            VoiceAction::ShowRange(TimeFilter::Month),
            "Showing monthly data",
        ),
        VoiceRule::new(
            "show-week",
            |t| t.contains("show") && t.contains("week"),
            VoiceAction::ShowRange(TimeFilter::Week),
            "Showing weekly data",
        ),
        VoiceRule::new(
            "dark-mode",
            |t| t.contains("dark mode"),
            VoiceAction::ToggleDarkMode,
            "Dark mode toggled",
        ),
        VoiceRule::new(
            "export",
            |t| t.contains("export"),
            VoiceAction::ExportData,
            "Data exported",
        ),
        VoiceRule::new(
            "refresh",
            |t| t.contains("refresh"),
            VoiceAction::Refresh,
            "Dashboard refreshed",
        ),
    ]
}

/// First rule matching the transcript
pub fn match_command<'a>(rules: &'a [VoiceRule], transcript: &str) -> Option<&'a VoiceRule> {
    let transcript = transcript.to_lowercase();
    rules.iter().find(|rule| rule.matches(&transcript))
}

/// Message shown when no rule matches
pub fn unrecognized_message(transcript: &str) -> String {
    format!(
        "Command \"{}\" not recognized. Try \"show last month\", \"dark mode\", or \"export data\"",
        transcript
    )
}

/// Errors from speech recognition
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("No speech detected")]
    NoSpeech,

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One-shot speech-to-text
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen for a single utterance and return its transcript
    async fn recognize(&self) -> Result<String, VoiceError>;
}

/// Takes the "utterance" from one line of standard input
#[derive(Debug, Default)]
pub struct LineRecognizer;

#[async_trait]
impl SpeechRecognizer for LineRecognizer {
    async fn recognize(&self) -> Result<String, VoiceError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        match lines.next_line().await? {
            Some(line) if !line.trim().is_empty() => Ok(line.trim().to_string()),
            _ => Err(VoiceError::NoSpeech),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_for(transcript: &str) -> Option<VoiceAction> {
        match_command(&default_rules(), transcript).map(|r| r.action)
    }

    #[test]
    fn test_range_commands() {
        assert_eq!(
            action_for("show me last month"),
            Some(VoiceAction::ShowRange(TimeFilter::Month))
        );
        assert_eq!(
            action_for("Show this WEEK"),
            Some(VoiceAction::ShowRange(TimeFilter::Week))
        );
        // "week" without "show" falls through to later rules
        assert_eq!(action_for("refresh the week"), Some(VoiceAction::Refresh));
    }

    #[test]
    fn test_first_match_wins() {
        // Both range rules match; month comes first
        assert_eq!(
            action_for("show month and week"),
            Some(VoiceAction::ShowRange(TimeFilter::Month))
        );
        // dark mode is checked before export
        assert_eq!(
            action_for("export in dark mode"),
            Some(VoiceAction::ToggleDarkMode)
        );
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(action_for("dark mode please"), Some(VoiceAction::ToggleDarkMode));
        assert_eq!(action_for("export data"), Some(VoiceAction::ExportData));
        assert_eq!(action_for("refresh"), Some(VoiceAction::Refresh));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(action_for("xyz"), None);
        assert_eq!(action_for("darkmode"), None);
        assert_eq!(
            unrecognized_message("xyz"),
            "Command \"xyz\" not recognized. Try \"show last month\", \"dark mode\", or \"export data\""
        );
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = default_rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["show-month", "show-week", "dark-mode", "export", "refresh"]
        );
    }
}
