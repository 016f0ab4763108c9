//! Row-oriented data export
//!
//! One row per date, fixed column order:
//! `Date, CO2_Emissions, Transport, Electricity, Food, Plastic`.

use serde::Serialize;

use super::ExportError;
use crate::dashboard::{DashboardSnapshot, Series};

/// One exported day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "CO2_Emissions")]
    pub emissions: f64,
    #[serde(rename = "Transport")]
    pub transport: f64,
    #[serde(rename = "Electricity")]
    pub electricity: f64,
    #[serde(rename = "Food")]
    pub food: f64,
    #[serde(rename = "Plastic")]
    pub plastic: f64,
}

/// Header row of the CSV export
pub fn header() -> Vec<&'static str> {
    std::iter::once("Date")
        .chain(Series::ALL.iter().map(|s| s.column_header()))
        .collect()
}

/// Rows of the snapshot's date-aligned series
pub fn export_rows(snapshot: &DashboardSnapshot) -> Vec<ExportRow> {
    let value = |series: &[f64], i: usize| series.get(i).copied().unwrap_or(f64::NAN);

    snapshot
        .dates
        .iter()
        .enumerate()
        .map(|(i, date)| ExportRow {
            date: date.format("%Y-%m-%d").to_string(),
            emissions: value(&snapshot.emissions, i),
            transport: value(&snapshot.transport, i),
            electricity: value(&snapshot.electricity, i),
            food: value(&snapshot.food, i),
            plastic: value(&snapshot.plastic, i),
        })
        .collect()
}

/// Format a number in its shortest form: `5`, `7.5`
fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Serialize the snapshot as CSV, rows joined by `\n`, no trailing newline
pub fn to_csv(snapshot: &DashboardSnapshot) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header())?;
    for row in export_rows(snapshot) {
        writer.write_record([
            row.date,
            format_number(row.emissions),
            format_number(row.transport),
            format_number(row.electricity),
            format_number(row.food),
            format_number(row.plastic),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.error().to_string()))?;
    let mut content =
        String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))?;
    if content.ends_with('\n') {
        content.pop();
    }
    Ok(content)
}

/// Serialize the snapshot rows as a JSON array
pub fn to_json(snapshot: &DashboardSnapshot) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&export_rows(snapshot))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::snapshot::fixtures::two_day_snapshot;

    #[test]
    fn test_csv_export_exact() {
        let csv = to_csv(&two_day_snapshot()).unwrap();
        assert_eq!(
            csv,
            "Date,CO2_Emissions,Transport,Electricity,Food,Plastic\n\
             2024-01-01,5,1,1,1,1\n\
             2024-01-02,7.5,1,1,1,1"
        );
    }

    #[test]
    fn test_empty_snapshot_exports_header_only() {
        let csv = to_csv(&DashboardSnapshot::default()).unwrap();
        assert_eq!(csv, "Date,CO2_Emissions,Transport,Electricity,Food,Plastic");
    }

    #[test]
    fn test_json_export() {
        let json = to_json(&two_day_snapshot()).unwrap();
        let rows: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["Date"], "2024-01-02");
        assert_eq!(rows[1]["CO2_Emissions"], 7.5);
    }
}
