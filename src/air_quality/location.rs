//! Current position providers

use async_trait::async_trait;

use super::{AirQualityError, Coordinates};

/// Source of the user's current position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, AirQualityError>;
}

/// Position taken from configuration
pub struct StaticGeolocator {
    position: Coordinates,
}

impl StaticGeolocator {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            position: Coordinates { lat, lon },
        }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<Coordinates, AirQualityError> {
        let Coordinates { lat, lon } = self.position;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AirQualityError::Geolocation(format!(
                "invalid coordinates {}",
                self.position
            )));
        }
        Ok(self.position)
    }
}
