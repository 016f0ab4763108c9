//! Chart Rendering
//!
//! Turns a [`DashboardSnapshot`] into chart descriptions. Everything here is
//! pure: `(snapshot, chart type, theme) -> RenderSpec`. Putting the result on
//! screen is the job of a [`DisplaySurface`](crate::surface::DisplaySurface).
//!
//! - [`theme`]: light/dark colours
//! - [`svg`]: SVG markup for a single chart

pub mod svg;
pub mod theme;

pub use theme::ThemeColors;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dashboard::{ChartType, DashboardSnapshot, Series};

/// Category palette: transport, electricity, food, plastic
pub const CATEGORY_PALETTE: [&str; 4] = ["#e74c3c", "#f39c12", "#2ecc71", "#3498db"];

const GREEN: &str = "#2ecc71";
const BLUE: &str = "#3498db";
const RED: &str = "#e74c3c";
const STREAK_LINE: &str = "#4169e1";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Number of most recent days shown by the bar variant of the main chart
const BAR_WINDOW: usize = 7;

/// Display slot a chart is rendered into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTarget {
    Main,
    Radar,
    Category,
    Waterfall,
    Streak,
    DrillDown,
}

impl ChartTarget {
    /// Element identifier on the page
    pub fn element_id(&self) -> &'static str {
        match self {
            ChartTarget::Main => "mainChart",
            ChartTarget::Radar => "radarChart",
            ChartTarget::Category => "categoryChart",
            ChartTarget::Waterfall => "waterfallChart",
            ChartTarget::Streak => "streakChart",
            ChartTarget::DrillDown => "drillDownChart",
        }
    }
}

impl fmt::Display for ChartTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

/// One data trace of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Line {
        name: String,
        x: Vec<String>,
        y: Vec<f64>,
        color: String,
        width: f64,
        /// Per-point marker colours; `None` uses `color`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marker_colors: Option<Vec<String>>,
    },
    Bar {
        name: String,
        x: Vec<String>,
        y: Vec<f64>,
        /// Cycled over the bars
        colors: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline: Option<String>,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
        colors: Vec<String>,
    },
    Heatmap {
        x: Vec<String>,
        y: Vec<String>,
        z: Vec<Vec<f64>>,
    },
    Polar {
        name: String,
        theta: Vec<String>,
        r: Vec<f64>,
        color: String,
        range: (f64, f64),
    },
    Waterfall {
        x: Vec<String>,
        y: Vec<f64>,
        increasing: String,
        decreasing: String,
        connector: String,
    },
}

/// Everything needed to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub target: ChartTarget,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    pub traces: Vec<Trace>,
    pub theme: ThemeColors,
}

/// All charts of the dashboard for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    pub main: ChartSpec,
    pub radar: ChartSpec,
    pub category: ChartSpec,
    pub waterfall: ChartSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<ChartSpec>,
}

impl RenderSpec {
    /// Charts in render order
    pub fn charts(&self) -> impl Iterator<Item = &ChartSpec> {
        [&self.main, &self.radar, &self.category, &self.waterfall]
            .into_iter()
            .chain(self.streak.as_ref())
    }
}

/// Build every chart of the dashboard
pub fn build(snapshot: &DashboardSnapshot, chart_type: ChartType, theme: &ThemeColors) -> RenderSpec {
    RenderSpec {
        main: main_chart(snapshot, chart_type, theme),
        radar: radar_chart(snapshot, theme),
        category: category_chart(snapshot, theme),
        waterfall: waterfall_chart(snapshot, theme),
        streak: streak_chart(snapshot, theme),
    }
}

/// The primary emissions chart in the selected presentation
pub fn main_chart(snapshot: &DashboardSnapshot, chart_type: ChartType, theme: &ThemeColors) -> ChartSpec {
    let labels = snapshot.date_labels();

    let trace = match chart_type {
        ChartType::Line => Trace::Line {
            name: "CO₂ Emissions".to_string(),
            x: labels,
            y: snapshot.emissions.clone(),
            color: GREEN.to_string(),
            width: 3.0,
            marker_colors: None,
        },
        ChartType::Bar => {
            let start = labels.len().saturating_sub(BAR_WINDOW);
            Trace::Bar {
                name: "CO₂ Emissions".to_string(),
                x: labels[start..].to_vec(),
                y: snapshot.emissions[start.min(snapshot.emissions.len())..].to_vec(),
                colors: vec![BLUE.to_string()],
                outline: None,
            }
        }
        ChartType::Pie => Trace::Pie {
            labels: snapshot.categories.clone(),
            values: snapshot.category_totals.clone(),
            colors: palette(),
        },
        ChartType::Heatmap => {
            let z = weekly_heatmap(&snapshot.emissions);
            Trace::Heatmap {
                x: WEEKDAYS.iter().map(|d| d.to_string()).collect(),
                y: (1..=z.len()).map(|i| format!("Week {}", i)).collect(),
                z,
            }
        }
    };

    let (x_title, y_title) = match chart_type {
        ChartType::Heatmap => ("Day of Week", "Week"),
        _ => ("Date", "CO₂ (kg)"),
    };

    ChartSpec {
        target: ChartTarget::Main,
        title: "CO₂ Emissions Analysis".to_string(),
        x_title: Some(x_title.to_string()),
        y_title: Some(y_title.to_string()),
        traces: vec![trace],
        theme: theme.clone(),
    }
}

/// User performance against the global average, per category
pub fn radar_chart(snapshot: &DashboardSnapshot, theme: &ThemeColors) -> ChartSpec {
    let polar = |name: &str, r: &[f64], color: &str| Trace::Polar {
        name: name.to_string(),
        theta: snapshot.categories.clone(),
        r: r.to_vec(),
        color: color.to_string(),
        range: (0.0, 10.0),
    };

    ChartSpec {
        target: ChartTarget::Radar,
        title: "Performance vs Global Average".to_string(),
        x_title: None,
        y_title: None,
        traces: vec![
            polar("Your Performance", &snapshot.radar_user, GREEN),
            polar("Global Average", &snapshot.radar_global, RED),
        ],
        theme: theme.clone(),
    }
}

/// Emission totals per category
pub fn category_chart(snapshot: &DashboardSnapshot, theme: &ThemeColors) -> ChartSpec {
    ChartSpec {
        target: ChartTarget::Category,
        title: "Emissions by Category".to_string(),
        x_title: Some("Category".to_string()),
        y_title: Some("CO₂ (kg)".to_string()),
        traces: vec![Trace::Bar {
            name: "Total".to_string(),
            x: snapshot.categories.clone(),
            y: snapshot.category_totals.clone(),
            colors: palette(),
            outline: Some(theme.bar_outline.clone()),
        }],
        theme: theme.clone(),
    }
}

/// Week-over-week change of weekly emission totals
pub fn waterfall_chart(snapshot: &DashboardSnapshot, theme: &ThemeColors) -> ChartSpec {
    let (x, y) = weekly_changes(&snapshot.emissions);

    ChartSpec {
        target: ChartTarget::Waterfall,
        title: "Weekly CO₂ Changes".to_string(),
        x_title: Some("Week".to_string()),
        y_title: Some("Change (kg)".to_string()),
        traces: vec![Trace::Waterfall {
            x,
            y,
            increasing: RED.to_string(),
            decreasing: GREEN.to_string(),
            connector: theme.connector.clone(),
        }],
        theme: theme.clone(),
    }
}

/// Low-emission streak tracker, when the snapshot carries streak data
pub fn streak_chart(snapshot: &DashboardSnapshot, theme: &ThemeColors) -> Option<ChartSpec> {
    let streak = snapshot.streak_data.as_ref()?;

    Some(ChartSpec {
        target: ChartTarget::Streak,
        title: "Eco Streak Tracker".to_string(),
        x_title: Some("Date".to_string()),
        y_title: Some("Streak Length".to_string()),
        traces: vec![Trace::Line {
            name: "Streak".to_string(),
            x: streak
                .data
                .iter()
                .map(|d| d.date.format("%Y-%m-%d").to_string())
                .collect(),
            y: streak.data.iter().map(|d| d.streak as f64).collect(),
            color: STREAK_LINE.to_string(),
            width: 2.0,
            marker_colors: Some(
                streak
                    .data
                    .iter()
                    .map(|d| if d.is_low_emission { "green" } else { "red" }.to_string())
                    .collect(),
            ),
        }],
        theme: theme.clone(),
    })
}

/// Detailed view of one series over every loaded day
pub fn drill_down_chart(snapshot: &DashboardSnapshot, series: Series, theme: &ThemeColors) -> ChartSpec {
    ChartSpec {
        target: ChartTarget::DrillDown,
        title: format!("Detailed {} Analysis", series),
        x_title: Some("Date".to_string()),
        y_title: Some("CO₂ (kg)".to_string()),
        traces: vec![Trace::Line {
            name: format!("Detailed {}", series),
            x: snapshot.date_labels(),
            y: snapshot.series(series).to_vec(),
            color: GREEN.to_string(),
            width: 2.0,
            marker_colors: None,
        }],
        theme: theme.clone(),
    }
}

/// Lay daily values out as week rows of seven day cells, zero-padded
pub fn weekly_heatmap(values: &[f64]) -> Vec<Vec<f64>> {
    values
        .chunks(7)
        .map(|week| {
            let mut row = week.to_vec();
            row.resize(7, 0.0);
            row
        })
        .collect()
}

/// Labels and deltas between consecutive weekly totals
pub fn weekly_changes(values: &[f64]) -> (Vec<String>, Vec<f64>) {
    let totals: Vec<f64> = values.chunks(7).map(|week| week.iter().sum()).collect();

    totals
        .windows(2)
        .enumerate()
        .map(|(i, pair)| (format!("Week {}", i + 2), pair[1] - pair[0]))
        .unzip()
}

fn palette() -> Vec<String> {
    CATEGORY_PALETTE.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::snapshot::fixtures::{snapshot_with_days, two_day_snapshot};
    use crate::dashboard::{StreakDay, StreakSummary};

    #[test]
    fn test_line_chart_uses_all_dates() {
        let snapshot = two_day_snapshot();
        let chart = main_chart(&snapshot, ChartType::Line, &ThemeColors::light());

        assert_eq!(chart.target, ChartTarget::Main);
        assert_eq!(chart.x_title.as_deref(), Some("Date"));
        match &chart.traces[0] {
            Trace::Line { x, y, color, .. } => {
                assert_eq!(x, &vec!["2024-01-01".to_string(), "2024-01-02".to_string()]);
                assert_eq!(y, &vec![5.0, 7.5]);
                assert_eq!(color, "#2ecc71");
            }
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_bar_chart_keeps_last_week() {
        let snapshot = snapshot_with_days(10);
        let chart = main_chart(&snapshot, ChartType::Bar, &ThemeColors::light());

        match &chart.traces[0] {
            Trace::Bar { x, y, .. } => {
                assert_eq!(x.len(), 7);
                assert_eq!(x[0], "2024-01-04");
                assert_eq!(y, &vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
            }
            other => panic!("unexpected trace {other:?}"),
        }

        let short = main_chart(&two_day_snapshot(), ChartType::Bar, &ThemeColors::light());
        match &short.traces[0] {
            Trace::Bar { x, .. } => assert_eq!(x.len(), 2),
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_heatmap_pads_last_week() {
        let snapshot = snapshot_with_days(9);
        let chart = main_chart(&snapshot, ChartType::Heatmap, &ThemeColors::light());

        assert_eq!(chart.x_title.as_deref(), Some("Day of Week"));
        assert_eq!(chart.y_title.as_deref(), Some("Week"));
        match &chart.traces[0] {
            Trace::Heatmap { x, y, z } => {
                assert_eq!(x.len(), 7);
                assert_eq!(y, &vec!["Week 1".to_string(), "Week 2".to_string()]);
                assert_eq!(z[1], vec![7.0, 8.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
            }
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_pie_uses_categories() {
        let chart = main_chart(&two_day_snapshot(), ChartType::Pie, &ThemeColors::dark());
        match &chart.traces[0] {
            Trace::Pie { labels, values, colors } => {
                assert_eq!(labels.len(), 4);
                assert_eq!(values, &vec![2.0; 4]);
                assert_eq!(colors[0], "#e74c3c");
            }
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_theme_flows_into_every_chart() {
        let spec = build(&two_day_snapshot(), ChartType::Line, &ThemeColors::dark());
        assert!(spec.charts().all(|c| c.theme.dark));
        assert_eq!(spec.charts().count(), 4);

        match &spec.category.traces[0] {
            Trace::Bar { outline, .. } => assert_eq!(outline.as_deref(), Some("#666666")),
            other => panic!("unexpected trace {other:?}"),
        }
    }

    #[test]
    fn test_weekly_changes() {
        let mut values = vec![1.0; 7];
        values.extend(vec![2.0; 7]);
        values.extend(vec![1.0; 3]);

        let (labels, changes) = weekly_changes(&values);
        assert_eq!(labels, vec!["Week 2", "Week 3"]);
        assert_eq!(changes, vec![7.0, -11.0]);

        let (labels, changes) = weekly_changes(&[1.0, 2.0]);
        assert!(labels.is_empty() && changes.is_empty());
    }

    #[test]
    fn test_streak_chart_only_with_data() {
        let mut snapshot = two_day_snapshot();
        assert!(build(&snapshot, ChartType::Line, &ThemeColors::light())
            .streak
            .is_none());

        snapshot.streak_data = Some(StreakSummary {
            data: vec![
                StreakDay {
                    date: snapshot.dates[0],
                    streak: 1,
                    is_low_emission: true,
                },
                StreakDay {
                    date: snapshot.dates[1],
                    streak: 0,
                    is_low_emission: false,
                },
            ],
            current_streak: 0,
            best_streak: 1,
        });

        let spec = build(&snapshot, ChartType::Line, &ThemeColors::light());
        let streak = spec.streak.as_ref().unwrap();
        match &streak.traces[0] {
            Trace::Line { marker_colors, y, .. } => {
                assert_eq!(y, &vec![1.0, 0.0]);
                assert_eq!(
                    marker_colors.as_deref(),
                    Some(&["green".to_string(), "red".to_string()][..])
                );
            }
            other => panic!("unexpected trace {other:?}"),
        }
        assert_eq!(spec.charts().count(), 5);
    }

    #[test]
    fn test_drill_down_series() {
        let chart = drill_down_chart(&two_day_snapshot(), Series::Food, &ThemeColors::light());
        assert_eq!(chart.target, ChartTarget::DrillDown);
        assert_eq!(chart.title, "Detailed food Analysis");
        match &chart.traces[0] {
            Trace::Line { y, .. } => assert_eq!(y, &vec![1.0, 1.0]),
            other => panic!("unexpected trace {other:?}"),
        }
    }
}
