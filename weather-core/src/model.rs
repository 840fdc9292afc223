use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WeatherError;

/// First geocoding match for a location query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub country: Option<String>,
}

impl GeoResult {
    /// `"{name}, {country}"`, or just the name when the country is unknown.
    pub fn label(&self) -> String {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}

/// The One Call document exactly as the weather endpoint returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeatherPayload(pub Value);

impl RawWeatherPayload {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub description: String,
    pub temperature_celsius: String,
    pub feels_like_celsius: String,
    pub humidity: String,
    pub pressure: String,
    pub wind_speed_mps: String,
    pub wind_direction: String,
    pub clouds: String,
    pub uv_index: String,
    pub visibility: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayForecast {
    pub summary: String,
    pub min_temp: String,
    pub max_temp: String,
    pub morning_temp: String,
    pub evening_temp: String,
    pub precipitation_probability: String,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayForecast {
    pub date: String,
    pub summary: String,
    pub min_temp: String,
    pub max_temp: String,
    pub weather: String,
    pub precipitation_probability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSummary {
    pub event: String,
    pub description: String,
    pub start: String,
    pub end: String,
}

/// Display-ready weather report returned by the `get_weather` tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedWeather {
    pub location: String,
    pub coordinates: Coordinates,
    pub current_weather: CurrentWeather,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_forecast: Option<TodayForecast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_3_day: Option<Vec<DayForecast>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<AlertSummary>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResult {
    pub error: String,
}

impl From<&WeatherError> for ErrorResult {
    fn from(err: &WeatherError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Result of one `get_weather` invocation: a report or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WeatherOutcome {
    Weather(Box<FormattedWeather>),
    Error(ErrorResult),
}

impl WeatherOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, WeatherOutcome::Error(_))
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("an unexpected error occurred: {e}") })
        })
    }
}

impl From<Result<FormattedWeather, WeatherError>> for WeatherOutcome {
    fn from(result: Result<FormattedWeather, WeatherError>) -> Self {
        match result {
            Ok(weather) => WeatherOutcome::Weather(Box::new(weather)),
            Err(err) => WeatherOutcome::Error(ErrorResult::from(&err)),
        }
    }
}
