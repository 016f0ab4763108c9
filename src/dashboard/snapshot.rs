//! Dashboard data model
//!
//! This module defines the dataset the dashboard renders from:
//! - `DashboardSnapshot`: everything fetched in one refresh
//! - `Achievement` and `Insight`: annotation cards shown beside the charts
//! - `StreakSummary`: low-emission streak tracking
//! - `TimeFilter`, `ChartType` and `Series`: the selectors the UI exposes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The complete dataset backing all charts at a point in time
///
/// Replaced wholesale on every applied refresh. Date-series (`emissions`,
/// `transport`, `electricity`, `food`, `plastic`) are index-aligned with
/// `dates`; category-series (`category_totals`, `radar_user`,
/// `radar_global`) are index-aligned with `categories`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub dates: Vec<NaiveDate>,
    pub emissions: Vec<f64>,
    pub transport: Vec<f64>,
    pub electricity: Vec<f64>,
    pub food: Vec<f64>,
    pub plastic: Vec<f64>,
    pub categories: Vec<String>,
    pub category_totals: Vec<f64>,
    pub radar_user: Vec<f64>,
    pub radar_global: Vec<f64>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub ai_insights: Vec<Insight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak_data: Option<StreakSummary>,
}

/// A badge the user has unlocked (or not yet)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub unlocked: bool,
}

/// A generated tip shown in the insights grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub title: String,
    pub text: String,
    pub icon: String,
    /// recommendation, pattern, tip, impact
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Daily streak of low-emission days
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreakSummary {
    pub data: Vec<StreakDay>,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreakDay {
    pub date: NaiveDate,
    pub streak: u32,
    pub is_low_emission: bool,
}

/// Index alignment violation found in a snapshot
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("series '{series}' has {actual} entries, expected {expected}")]
pub struct AlignmentError {
    pub series: &'static str,
    pub expected: usize,
    pub actual: usize,
}

impl DashboardSnapshot {
    /// Number of days covered by the snapshot
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the snapshot covers no days
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Values of one date-aligned series
    pub fn series(&self, series: Series) -> &[f64] {
        match series {
            Series::Emissions => &self.emissions,
            Series::Transport => &self.transport,
            Series::Electricity => &self.electricity,
            Series::Food => &self.food,
            Series::Plastic => &self.plastic,
        }
    }

    /// Dates formatted as `YYYY-MM-DD`, the way charts label them
    pub fn date_labels(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .collect()
    }

    /// Check that every index-aligned sequence matches its dimension
    pub fn check_alignment(&self) -> Result<(), AlignmentError> {
        let days = self.dates.len();
        for series in Series::ALL {
            let actual = self.series(series).len();
            if actual != days {
                return Err(AlignmentError {
                    series: series.as_str(),
                    expected: days,
                    actual,
                });
            }
        }

        let categories = self.categories.len();
        let category_series: [(&'static str, &[f64]); 3] = [
            ("category_totals", &self.category_totals),
            ("radar_user", &self.radar_user),
            ("radar_global", &self.radar_global),
        ];
        for (name, values) in category_series {
            if values.len() != categories {
                return Err(AlignmentError {
                    series: name,
                    expected: categories,
                    actual: values.len(),
                });
            }
        }

        Ok(())
    }
}

/// Error returned when parsing a selector from text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseSelectorError {
    pub kind: &'static str,
    pub value: String,
}

/// Time range the data endpoint filters by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 6] = [
        TimeFilter::Day,
        TimeFilter::Week,
        TimeFilter::Month,
        TimeFilter::Quarter,
        TimeFilter::Year,
        TimeFilter::All,
    ];

    /// Query-string value sent to the data endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Quarter => "quarter",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(TimeFilter::Day),
            "week" => Ok(TimeFilter::Week),
            "month" => Ok(TimeFilter::Month),
            "quarter" => Ok(TimeFilter::Quarter),
            "year" => Ok(TimeFilter::Year),
            "all" => Ok(TimeFilter::All),
            _ => Err(ParseSelectorError {
                kind: "time filter",
                value: s.to_string(),
            }),
        }
    }
}

/// Presentation of the main chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Pie,
    Heatmap,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Pie,
        ChartType::Heatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "bar" => Ok(ChartType::Bar),
            "pie" => Ok(ChartType::Pie),
            "heatmap" => Ok(ChartType::Heatmap),
            _ => Err(ParseSelectorError {
                kind: "chart type",
                value: s.to_string(),
            }),
        }
    }
}

/// A date-aligned series of the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    Emissions,
    Transport,
    Electricity,
    Food,
    Plastic,
}

impl Series {
    /// Export column order after the date
    pub const ALL: [Series; 5] = [
        Series::Emissions,
        Series::Transport,
        Series::Electricity,
        Series::Food,
        Series::Plastic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Series::Emissions => "emissions",
            Series::Transport => "transport",
            Series::Electricity => "electricity",
            Series::Food => "food",
            Series::Plastic => "plastic",
        }
    }

    /// Column header used by data exports
    pub fn column_header(&self) -> &'static str {
        match self {
            Series::Emissions => "CO2_Emissions",
            Series::Transport => "Transport",
            Series::Electricity => "Electricity",
            Series::Food => "Food",
            Series::Plastic => "Plastic",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Series {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emissions" | "co2" => Ok(Series::Emissions),
            "transport" => Ok(Series::Transport),
            "electricity" => Ok(Series::Electricity),
            "food" => Ok(Series::Food),
            "plastic" => Ok(Series::Plastic),
            _ => Err(ParseSelectorError {
                kind: "series",
                value: s.to_string(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::two_day_snapshot;
    use super::*;

    #[test]
    fn test_deserialize_endpoint_payload() {
        let payload = r#"{
            "dates": ["2024-01-01", "2024-01-02"],
            "emissions": [5, 7.5],
            "transport": [1, 1],
            "electricity": [1, 1],
            "food": [1, 1],
            "plastic": [1, 1],
            "categories": ["Transport", "Electricity", "Food", "Plastic"],
            "category_totals": [2, 2, 2, 2],
            "radar_user": [1, 1, 1, 1],
            "radar_global": [6, 7, 5, 4],
            "achievements": [
                {"icon": "🌱", "title": "Eco Starter", "description": "First week of tracking", "unlocked": true}
            ],
            "ai_insights": [
                {"icon": "💡", "title": "Smart Recommendation", "text": "Try reducing transport emissions on Mondays.", "type": "recommendation"}
            ]
        }"#;

        let snapshot: DashboardSnapshot = serde_json::from_str(payload).unwrap();
        assert_eq!(snapshot, two_day_snapshot());
    }

    #[test]
    fn test_missing_annotations_default_to_empty() {
        let payload = r#"{
            "dates": [], "emissions": [], "transport": [], "electricity": [],
            "food": [], "plastic": [], "categories": [], "category_totals": [],
            "radar_user": [], "radar_global": []
        }"#;

        let snapshot: DashboardSnapshot = serde_json::from_str(payload).unwrap();
        assert!(snapshot.achievements.is_empty());
        assert!(snapshot.ai_insights.is_empty());
        assert!(snapshot.streak_data.is_none());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_alignment_check() {
        let snapshot = two_day_snapshot();
        assert!(snapshot.check_alignment().is_ok());

        let mut broken = snapshot.clone();
        broken.food.pop();
        let err = broken.check_alignment().unwrap_err();
        assert_eq!(err.series, "food");
        assert_eq!(err.expected, 2);
        assert_eq!(err.actual, 1);

        let mut broken = snapshot;
        broken.radar_global.push(3.0);
        assert_eq!(broken.check_alignment().unwrap_err().series, "radar_global");
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("Month".parse::<TimeFilter>().unwrap(), TimeFilter::Month);
        assert_eq!("heatmap".parse::<ChartType>().unwrap(), ChartType::Heatmap);
        assert_eq!("co2".parse::<Series>().unwrap(), Series::Emissions);

        let err = "fortnight".parse::<TimeFilter>().unwrap_err();
        assert_eq!(err.to_string(), "unknown time filter 'fortnight'");
    }

    #[test]
    fn test_date_labels() {
        let snapshot = two_day_snapshot();
        assert_eq!(snapshot.date_labels(), vec!["2024-01-01", "2024-01-02"]);
    }
}
