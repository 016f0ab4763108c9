//! Air Quality Alerts
//!
//! Looks up the air-quality index for a city or the current position and
//! maps it onto a five-level severity scale.
//!
//! - [`client`]: OpenWeather geocoding and air-pollution API
//! - [`location`]: where "here" is

mod client;
mod location;

pub use client::{OpenWeatherClient, OpenWeatherConfig};
pub use location::{Geolocator, StaticGeolocator};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A point on the globe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}, {:.2}", self.lat, self.lon)
    }
}

/// Five-level air-quality scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiLevel {
    Good = 1,
    Fair = 2,
    Moderate = 3,
    Poor = 4,
    VeryPoor = 5,
}

impl AqiLevel {
    /// Map an index value; anything outside 1..=5 is an error
    pub fn from_index(aqi: i64) -> Result<Self, AirQualityError> {
        match aqi {
            1 => Ok(AqiLevel::Good),
            2 => Ok(AqiLevel::Fair),
            3 => Ok(AqiLevel::Moderate),
            4 => Ok(AqiLevel::Poor),
            5 => Ok(AqiLevel::VeryPoor),
            other => Err(AirQualityError::AqiOutOfRange(other)),
        }
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Good => "Good",
            AqiLevel::Fair => "Fair",
            AqiLevel::Moderate => "Moderate",
            AqiLevel::Poor => "Poor",
            AqiLevel::VeryPoor => "Very Poor",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AqiLevel::Good => "😊",
            AqiLevel::Fair => "🙂",
            AqiLevel::Moderate => "😐",
            AqiLevel::Poor => "😷",
            AqiLevel::VeryPoor => "☠️",
        }
    }

    /// Health advice for moderate and worse air
    pub fn advisory(&self) -> Option<&'static str> {
        match self {
            AqiLevel::Good | AqiLevel::Fair => None,
            AqiLevel::Moderate => Some("Consider avoiding intense outdoor exercise."),
            AqiLevel::Poor => Some("Try to stay indoors and use masks."),
            AqiLevel::VeryPoor => Some("Dangerous air, avoid going outside."),
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one air-quality lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReport {
    /// City name, or formatted coordinates for position lookups
    pub location: String,
    pub coordinates: Coordinates,
    pub level: AqiLevel,
}

impl AirQualityReport {
    pub fn advisory(&self) -> Option<&'static str> {
        self.level.advisory()
    }

    /// One-line alert text
    pub fn summary(&self) -> String {
        let mut text = format!(
            "AQI in {} is {} ({} {})",
            self.location,
            self.level.index(),
            self.level.label(),
            self.level.emoji()
        );
        if let Some(advisory) = self.advisory() {
            text.push_str(" - ");
            text.push_str(advisory);
        }
        text
    }
}

/// Provider of geocoding and air-quality readings
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    /// Resolve a city name to coordinates
    async fn geocode(&self, city: &str) -> Result<Coordinates, AirQualityError>;

    /// Current air-quality level at a position
    async fn air_quality(&self, at: Coordinates) -> Result<AqiLevel, AirQualityError>;
}

/// Errors that can occur during air-quality lookups
#[derive(Error, Debug)]
pub enum AirQualityError {
    #[error("City name is empty")]
    EmptyCity,

    #[error("Location not found: {0}")]
    CityNotFound(String),

    #[error("AQI {0} is outside the 1-5 scale")]
    AqiOutOfRange(i64),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),
}
