//! Theme colours for light and dark mode

use serde::{Deserialize, Serialize};

/// Colours that depend on the display mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub dark: bool,
    pub text: String,
    pub grid: String,
    pub background: String,
    pub bar_outline: String,
    pub connector: String,
}

impl ThemeColors {
    pub fn light() -> Self {
        Self {
            dark: false,
            text: "#333333".to_string(),
            grid: "#dddddd".to_string(),
            background: "#ffffff".to_string(),
            bar_outline: "#ffffff".to_string(),
            connector: "#3f3f3f".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            dark: true,
            text: "#ffffff".to_string(),
            grid: "#444444".to_string(),
            background: "#1e1e1e".to_string(),
            bar_outline: "#666666".to_string(),
            connector: "#666666".to_string(),
        }
    }

    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::light()
    }
}
