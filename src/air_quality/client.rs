//! OpenWeather API Client
//!
//! Geocoding (`/geo/1.0/direct`) and air pollution (`/data/2.5/air_pollution`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{AirQualityError, AirQualitySource, AqiLevel, Coordinates};

/// Configuration for the OpenWeather client
#[derive(Debug, Clone)]
pub struct OpenWeatherConfig {
    /// Base URL (e.g. "https://api.openweathermap.org")
    pub base_url: String,
    pub api_key: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org".to_string(),
            api_key: String::new(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Client for the OpenWeather geocoding and air-pollution endpoints
pub struct OpenWeatherClient {
    client: Client,
    config: OpenWeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: OpenWeatherConfig) -> Result<Self, AirQualityError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenWeatherConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, AirQualityError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AirQualityError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| AirQualityError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AirQualitySource for OpenWeatherClient {
    async fn geocode(&self, city: &str) -> Result<Coordinates, AirQualityError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AirQualityError::EmptyCity);
        }

        let url = format!(
            "{}/geo/1.0/direct?q={}&limit=1&appid={}",
            self.base(),
            urlencoding::encode(city),
            urlencoding::encode(&self.config.api_key)
        );
        tracing::debug!(city = %city, "Geocoding city");

        let places: Vec<GeoResult> = self.get_json(&url).await?;
        places
            .into_iter()
            .next()
            .map(|p| Coordinates { lat: p.lat, lon: p.lon })
            .ok_or_else(|| AirQualityError::CityNotFound(city.to_string()))
    }

    async fn air_quality(&self, at: Coordinates) -> Result<AqiLevel, AirQualityError> {
        let url = format!(
            "{}/data/2.5/air_pollution?lat={}&lon={}&appid={}",
            self.base(),
            at.lat,
            at.lon,
            urlencoding::encode(&self.config.api_key)
        );
        tracing::debug!(lat = at.lat, lon = at.lon, "Fetching air quality");

        let response: PollutionResponse = self.get_json(&url).await?;
        let entry = response
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AirQualityError::Malformed("empty pollution list".to_string()))?;

        AqiLevel::from_index(entry.main.aqi)
    }
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct GeoResult {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct PollutionResponse {
    #[serde(default)]
    list: Vec<PollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct PollutionEntry {
    main: PollutionMain,
}

#[derive(Debug, Deserialize)]
struct PollutionMain {
    aqi: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    async fn geocode(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        match params.get("q").map(String::as_str) {
            Some("New Delhi") => Json(serde_json::json!([
                {"name": "New Delhi", "lat": 28.61, "lon": 77.21, "country": "IN"}
            ])),
            _ => Json(serde_json::json!([])),
        }
    }

    async fn pollution(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let lat: f64 = params.get("lat").and_then(|v| v.parse().ok()).unwrap_or(0.0);
        let aqi = if lat > 28.0 { 4 } else if lat < -50.0 { 9 } else { 1 };
        Json(serde_json::json!({
            "coord": {"lat": lat, "lon": 0.0},
            "list": [{"main": {"aqi": aqi}, "components": {}}]
        }))
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/geo/1.0/direct", get(geocode))
            .route("/data/2.5/air_pollution", get(pollution));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: String) -> OpenWeatherClient {
        OpenWeatherClient::new(OpenWeatherConfig {
            base_url,
            api_key: "test-key".to_string(),
            request_timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_geocode_and_lookup() {
        let client = client(spawn_server().await);

        let at = client.geocode("  New Delhi ").await.unwrap();
        assert_eq!(at, Coordinates { lat: 28.61, lon: 77.21 });

        let level = client.air_quality(at).await.unwrap();
        assert_eq!(level, AqiLevel::Poor);
    }

    #[tokio::test]
    async fn test_unknown_city() {
        let client = client(spawn_server().await);
        let err = client.geocode("Atlantis").await.unwrap_err();
        assert!(matches!(err, AirQualityError::CityNotFound(c) if c == "Atlantis"));
    }

    #[tokio::test]
    async fn test_empty_city_makes_no_request() {
        let client = client("http://127.0.0.1:1".to_string());
        assert!(matches!(
            client.geocode("   ").await,
            Err(AirQualityError::EmptyCity)
        ));
    }

    #[tokio::test]
    async fn test_out_of_scale_aqi() {
        let client = client(spawn_server().await);
        let err = client
            .air_quality(Coordinates { lat: -60.0, lon: 0.0 })
            .await
            .unwrap_err();
        assert!(matches!(err, AirQualityError::AqiOutOfRange(9)));
    }
}
