//! UI mode flags owned by the dashboard controller

use serde::{Deserialize, Serialize};

use super::snapshot::{ChartType, TimeFilter};

/// Auto-refresh timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AutoRefresh {
    #[default]
    Idle,
    Active,
}

impl AutoRefresh {
    pub fn is_active(&self) -> bool {
        matches!(self, AutoRefresh::Active)
    }

    /// State after one toggle
    pub fn toggled(self) -> Self {
        match self {
            AutoRefresh::Idle => AutoRefresh::Active,
            AutoRefresh::Active => AutoRefresh::Idle,
        }
    }
}

/// Current selections and modes of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiState {
    pub chart_type: ChartType,
    pub time_filter: TimeFilter,
    /// Persisted across sessions through the preference store
    pub dark_mode: bool,
    pub auto_refresh: AutoRefresh,
}

impl UiState {
    pub fn new(time_filter: TimeFilter, chart_type: ChartType, dark_mode: bool) -> Self {
        Self {
            chart_type,
            time_filter,
            dark_mode,
            auto_refresh: AutoRefresh::Idle,
        }
    }
}
