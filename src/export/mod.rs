//! Data and Chart Export
//!
//! Produces the files the dashboard offers for download:
//! - [`csv`]: row-oriented CSV and JSON of the date-aligned series
//! - [`raster`]: PNG rasters of rendered charts
//! - [`pdf`]: one-image PDF documents wrapping a raster

pub mod csv;
pub mod pdf;
pub mod raster;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::dashboard::{DashboardSnapshot, ParseSelectorError};
use crate::surface::{Download, RasterImage};

/// Format of a data export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Csv,
    Json,
}

impl DataFormat {
    pub fn filename(&self) -> &'static str {
        match self {
            DataFormat::Csv => "ecoguard_data.csv",
            DataFormat::Json => "ecoguard_data.json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DataFormat::Csv => "text/csv",
            DataFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
        })
    }
}

impl FromStr for DataFormat {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            _ => Err(ParseSelectorError {
                kind: "data format",
                value: s.to_string(),
            }),
        }
    }
}

/// Format of a chart export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Pdf,
}

impl ChartFormat {
    pub fn filename(&self) -> &'static str {
        match self {
            ChartFormat::Png => "ecoguard_chart.png",
            ChartFormat::Pdf => "ecoguard_chart.pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ChartFormat::Png => "image/png",
            ChartFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartFormat::Png => "png",
            ChartFormat::Pdf => "pdf",
        })
    }
}

impl FromStr for ChartFormat {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(ChartFormat::Png),
            "pdf" => Ok(ChartFormat::Pdf),
            _ => Err(ParseSelectorError {
                kind: "chart format",
                value: s.to_string(),
            }),
        }
    }
}

/// Errors that can occur while building an export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Raster error: {0}")]
    Raster(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::csv::Error> for ExportError {
    fn from(err: ::csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// Build the downloadable file for a data export
pub fn data_download(snapshot: &DashboardSnapshot, format: DataFormat) -> Result<Download, ExportError> {
    let content = match format {
        DataFormat::Csv => csv::to_csv(snapshot)?,
        DataFormat::Json => csv::to_json(snapshot)?,
    };
    Ok(Download::new(
        format.filename(),
        format.mime_type(),
        content.into_bytes(),
    ))
}

/// Build the downloadable file for a chart export
pub fn chart_download(image: &RasterImage, format: ChartFormat) -> Result<Download, ExportError> {
    let bytes = match format {
        ChartFormat::Png => raster::encode_png(image)?,
        ChartFormat::Pdf => pdf::single_image_document(image, pdf::Placement::default())?,
    };
    Ok(Download::new(format.filename(), format.mime_type(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::snapshot::fixtures::two_day_snapshot;

    #[test]
    fn test_data_download() {
        let file = data_download(&two_day_snapshot(), DataFormat::Csv).unwrap();
        assert_eq!(file.filename, "ecoguard_data.csv");
        assert_eq!(file.mime_type, "text/csv");
        assert!(file.bytes.starts_with(b"Date,CO2_Emissions"));
    }

    #[test]
    fn test_chart_download_formats() {
        let image = RasterImage {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 255],
        };

        let png = chart_download(&image, ChartFormat::Png).unwrap();
        assert_eq!(png.filename, "ecoguard_chart.png");
        assert!(png.bytes.starts_with(&[0x89, b'P', b'N', b'G']));

        let pdf = chart_download(&image, ChartFormat::Pdf).unwrap();
        assert_eq!(pdf.mime_type, "application/pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<DataFormat>().unwrap(), DataFormat::Csv);
        assert_eq!("pdf".parse::<ChartFormat>().unwrap(), ChartFormat::Pdf);
        assert!("excel".parse::<DataFormat>().is_err());
    }
}
