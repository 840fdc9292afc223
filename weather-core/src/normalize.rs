//! Reshapes a raw One Call document into [`FormattedWeather`].
//!
//! Numbers are rendered the way the upstream JSON wrote them (`15` stays
//! `15`, `15.0` stays `15.0`), with a unit suffix appended. Only the daily
//! and alert entries that end up in the report are decoded, so a broken
//! entry past the third forecast day is ignored.

use chrono::DateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::error::WeatherError;
use crate::model::{
    AlertSummary, Coordinates, CurrentWeather, DayForecast, FormattedWeather, GeoResult,
    RawWeatherPayload, TodayForecast,
};

pub const MAX_FORECAST_DAYS: usize = 3;
pub const MAX_ALERTS: usize = 3;
pub const MAX_ALERT_DESCRIPTION_CHARS: usize = 200;

const NOT_AVAILABLE: &str = "N/A";
const NO_SUMMARY: &str = "No summary available";
const INVALID_TIMESTAMP: &str = "Invalid timestamp";

#[derive(Debug, Deserialize)]
struct OneCall {
    current: Value,
    #[serde(default)]
    daily: Vec<Value>,
    #[serde(default)]
    alerts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    weather: Vec<Value>,
    temp: Number,
    feels_like: Number,
    humidity: Number,
    pressure: Number,
    wind_speed: Number,
    wind_deg: Option<Number>,
    clouds: Number,
    uvi: Number,
    visibility: Option<Number>,
}

#[derive(Debug, Deserialize)]
struct TodayTemp {
    min: Number,
    max: Number,
    morn: Number,
    eve: Number,
}

#[derive(Debug, Deserialize)]
struct Today {
    summary: Option<String>,
    temp: Value,
    pop: f64,
    sunrise: Value,
    sunset: Value,
}

#[derive(Debug, Deserialize)]
struct DayTemp {
    min: Number,
    max: Number,
}

#[derive(Debug, Deserialize)]
struct Day {
    dt: Value,
    summary: Option<String>,
    temp: Value,
    weather: Vec<Value>,
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct Alert {
    event: String,
    description: String,
    start: Value,
    end: Value,
}

/// Build the report for `geo` out of `payload`.
///
/// Pure: the same inputs always serialize to the same bytes.
pub fn normalize(geo: &GeoResult, payload: &RawWeatherPayload) -> Result<FormattedWeather, WeatherError> {
    let doc: OneCall = decode("", payload.as_value())?;

    let current: Current = decode("current", &doc.current)?;
    let current_weather = CurrentWeather {
        description: primary_description(&current.weather, "current")?,
        temperature_celsius: celsius(&current.temp),
        feels_like_celsius: celsius(&current.feels_like),
        humidity: percent(&current.humidity),
        pressure: format!("{} hPa", current.pressure),
        wind_speed_mps: format!("{} m/s", current.wind_speed),
        wind_direction: current
            .wind_deg
            .map(|deg| format!("{deg}°"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        clouds: percent(&current.clouds),
        uv_index: current.uvi.to_string(),
        visibility: current
            .visibility
            .map(|m| format!("{m} m"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };

    let today_forecast = doc
        .daily
        .first()
        .map(today)
        .transpose()?;

    let forecast_3_day = if doc.daily.len() > 1 {
        let days = doc
            .daily
            .iter()
            .enumerate()
            .skip(1)
            .take(MAX_FORECAST_DAYS)
            .map(|(idx, raw)| forecast_day(idx, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Some(days)
    } else {
        None
    };

    let alerts = if doc.alerts.is_empty() {
        None
    } else {
        let alerts = doc
            .alerts
            .iter()
            .enumerate()
            .take(MAX_ALERTS)
            .map(|(idx, raw)| {
                let alert: Alert = decode(&format!("alerts[{idx}]"), raw)?;
                Ok(AlertSummary {
                    event: alert.event,
                    description: truncate_description(&alert.description),
                    start: format_timestamp(&alert.start),
                    end: format_timestamp(&alert.end),
                })
            })
            .collect::<Result<Vec<_>, WeatherError>>()?;
        Some(alerts)
    };

    Ok(FormattedWeather {
        location: geo.label(),
        coordinates: Coordinates {
            latitude: geo.latitude,
            longitude: geo.longitude,
        },
        current_weather,
        today_forecast,
        forecast_3_day,
        alerts,
    })
}

fn today(raw: &Value) -> Result<TodayForecast, WeatherError> {
    let day: Today = decode("daily[0]", raw)?;
    let temp: TodayTemp = decode("daily[0].temp", &day.temp)?;

    Ok(TodayForecast {
        summary: day.summary.unwrap_or_else(|| NO_SUMMARY.to_string()),
        min_temp: celsius(&temp.min),
        max_temp: celsius(&temp.max),
        morning_temp: celsius(&temp.morn),
        evening_temp: celsius(&temp.eve),
        precipitation_probability: precipitation(day.pop),
        sunrise: format_timestamp(&day.sunrise),
        sunset: format_timestamp(&day.sunset),
    })
}

fn forecast_day(idx: usize, raw: &Value) -> Result<DayForecast, WeatherError> {
    let section = format!("daily[{idx}]");
    let day: Day = decode(&section, raw)?;
    let temp: DayTemp = decode(&format!("{section}.temp"), &day.temp)?;

    Ok(DayForecast {
        date: format_timestamp(&day.dt),
        summary: day.summary.unwrap_or_else(|| NO_SUMMARY.to_string()),
        min_temp: celsius(&temp.min),
        max_temp: celsius(&temp.max),
        weather: primary_description(&day.weather, &section)?,
        precipitation_probability: precipitation(day.pop),
    })
}

/// Decode one object of the document. Nested objects are decoded as their
/// own sections so a missing key is reported with its full path.
fn decode<T: DeserializeOwned>(section: &str, value: &Value) -> Result<T, WeatherError> {
    T::deserialize(value).map_err(|e| WeatherError::from_decode(section, &e))
}

fn primary_description(conditions: &[Value], section: &str) -> Result<String, WeatherError> {
    let path = format!("{section}.weather[0]");
    let first = conditions
        .first()
        .ok_or_else(|| WeatherError::missing(path.clone()))?;
    let condition: Condition = decode(&path, first)?;
    Ok(condition.description)
}

fn celsius(value: &Number) -> String {
    format!("{value}°C")
}

fn percent(value: &Number) -> String {
    let whole = value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v.round_ties_even() as i64))
        .unwrap_or_default();
    format!("{whole}%")
}

/// `round(pop * 100)` as an integer percentage, ties to even.
pub fn precipitation(pop: f64) -> String {
    format!("{}%", (pop * 100.0).round_ties_even() as i64)
}

/// Render a Unix timestamp as `YYYY-MM-DD HH:MM UTC`.
///
/// Accepts JSON integers, floats (fraction dropped) and numeric strings;
/// anything else becomes `"Invalid timestamp"`.
pub fn format_timestamp(value: &Value) -> String {
    let secs = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    secs.map(format_unix_seconds)
        .unwrap_or_else(|| INVALID_TIMESTAMP.to_string())
}

pub fn format_unix_seconds(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| INVALID_TIMESTAMP.to_string())
}

/// Cut alert text down to 200 characters plus `"..."`.
pub fn truncate_description(description: &str) -> String {
    match description.char_indices().nth(MAX_ALERT_DESCRIPTION_CHARS) {
        Some((idx, _)) => format!("{}...", &description[..idx]),
        None => description.to_string(),
    }
}
