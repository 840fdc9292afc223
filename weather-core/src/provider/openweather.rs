use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    Config,
    error::{Stage, WeatherError},
    model::{GeoResult, RawWeatherPayload},
};

use super::WeatherProvider;

pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
pub const DEFAULT_ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Where the two OpenWeatherMap calls are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub geocoding_url: String,
    pub onecall_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            onecall_url: DEFAULT_ONECALL_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            geocoding_url: config.geocoding_url.clone().unwrap_or(defaults.geocoding_url),
            onecall_url: config.onecall_url.clone().unwrap_or(defaults.onecall_url),
        }
    }

    /// Both endpoints under one base URL, e.g. a local mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            geocoding_url: format!("{base}/geo/1.0/direct"),
            onecall_url: format!("{base}/data/3.0/onecall"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>, endpoints: Endpoints, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weather-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for OpenWeatherMap")?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoints,
            http,
        })
    }

    fn api_key(&self) -> Result<&str, WeatherError> {
        self.api_key.as_deref().ok_or(WeatherError::NotConfigured)
    }

    /// Issue one GET and return the decoded JSON body.
    ///
    /// `on_status` turns a non-2xx response into the stage's error.
    async fn get_json(
        &self,
        stage: Stage,
        url: &str,
        query: &[(&str, String)],
        on_status: impl FnOnce(StatusCode, &str) -> WeatherError,
    ) -> Result<Value, WeatherError> {
        debug!(%stage, url, "sending request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| WeatherError::network(stage, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::network(stage, e))?;

        if !status.is_success() {
            debug!(%stage, %status, "request failed");
            return Err(on_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::Unknown(format!("{stage} API returned invalid JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    lat: f64,
    lon: f64,
    name: String,
    country: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn geocode(&self, location: &str) -> Result<GeoResult, WeatherError> {
        let api_key = self.api_key()?;

        let body = self
            .get_json(
                Stage::Geocoding,
                &self.endpoints.geocoding_url,
                &[
                    ("q", location.to_string()),
                    ("limit", "1".to_string()),
                    ("appid", api_key.to_string()),
                ],
                |status, body| WeatherError::from_geocoding_status(status, body, location),
            )
            .await?;

        let matches = match body {
            Value::Array(matches) => matches,
            other => {
                return Err(WeatherError::Unknown(format!(
                    "Geocoding API returned {} instead of a list of matches",
                    json_kind(&other)
                )));
            }
        };

        let first = matches.into_iter().next().ok_or_else(|| WeatherError::LocationNotFound {
            location: location.to_string(),
        })?;

        let entry = OwGeocodeEntry::deserialize(&first)
            .map_err(|e| WeatherError::from_decode("geocoding[0]", &e))?;

        Ok(GeoResult {
            latitude: entry.lat,
            longitude: entry.lon,
            name: entry.name,
            country: entry.country.filter(|c| !c.is_empty()),
        })
    }

    async fn one_call(&self, latitude: f64, longitude: f64) -> Result<RawWeatherPayload, WeatherError> {
        let api_key = self.api_key()?;

        let body = self
            .get_json(
                Stage::Weather,
                &self.endpoints.onecall_url,
                &[
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                    ("exclude", "minutely".to_string()),
                    ("units", "metric".to_string()),
                    ("appid", api_key.to_string()),
                ],
                WeatherError::from_weather_status,
            )
            .await?;

        Ok(RawWeatherPayload(body))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
