use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// The upstream call an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Geocoding,
    Weather,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Geocoding => "Geocoding",
            Stage::Weather => "Weather",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a `get_weather` invocation can fail.
///
/// The `Display` text of each variant is the message handed back to the
/// caller inside an `ErrorResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("OpenWeatherMap API key is not configured on the server")]
    NotConfigured,

    #[error("network error while contacting the {stage} API: {message}")]
    Network { stage: Stage, message: String },

    #[error("{}", auth_message(.stage))]
    AuthenticationFailed { stage: Stage },

    #[error("location not found for '{location}'. Please check the location name.")]
    LocationNotFound { location: String },

    #[error(
        "subscription required for this data tier: One Call API 3.0 needs a separate 'One Call by Call' subscription"
    )]
    SubscriptionRequired,

    #[error("weather API rate limit exceeded, retry later")]
    RateLimited,

    #[error("{stage} API error: {details}")]
    UpstreamApi { stage: Stage, details: String },

    #[error("unexpected data format: missing field {field}")]
    MalformedUpstreamPayload { field: String },

    #[error("an unexpected error occurred: {0}")]
    Unknown(String),
}

fn auth_message(stage: &Stage) -> &'static str {
    match stage {
        Stage::Geocoding => "authentication failed: please check your OpenWeatherMap API key",
        Stage::Weather => {
            "authentication failed: check your API key and subscription tier (One Call API 3.0)"
        }
    }
}

impl WeatherError {
    pub fn network(stage: Stage, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not connect to the server".to_string()
        } else {
            // Strip the URL: its query string carries the API key.
            err.without_url().to_string()
        };

        WeatherError::Network { stage, message }
    }

    /// Map a non-2xx geocoding response.
    pub fn from_geocoding_status(status: StatusCode, body: &str, location: &str) -> Self {
        match status.as_u16() {
            401 => WeatherError::AuthenticationFailed {
                stage: Stage::Geocoding,
            },
            404 => WeatherError::LocationNotFound {
                location: location.to_string(),
            },
            _ => WeatherError::UpstreamApi {
                stage: Stage::Geocoding,
                details: status_details(status, body),
            },
        }
    }

    /// Map a non-2xx One Call response.
    pub fn from_weather_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => WeatherError::AuthenticationFailed {
                stage: Stage::Weather,
            },
            402 => WeatherError::SubscriptionRequired,
            429 => WeatherError::RateLimited,
            _ => WeatherError::UpstreamApi {
                stage: Stage::Weather,
                details: status_details(status, body),
            },
        }
    }

    /// Classify a failure to read a section of an upstream document.
    ///
    /// `section` is the path of the value that was being decoded, e.g.
    /// `current` or `daily[1]`; empty for the document root.
    pub fn from_decode(section: &str, err: &serde_json::Error) -> Self {
        match (missing_field_name(err), section) {
            (Some(field), "") => WeatherError::MalformedUpstreamPayload { field },
            (Some(field), _) => WeatherError::MalformedUpstreamPayload {
                field: format!("{section}.{field}"),
            },
            (None, "") => WeatherError::Unknown(format!("invalid upstream document: {err}")),
            (None, _) => WeatherError::Unknown(format!("invalid value in {section}: {err}")),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        WeatherError::MalformedUpstreamPayload {
            field: field.into(),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            WeatherError::Network { stage, .. }
            | WeatherError::AuthenticationFailed { stage }
            | WeatherError::UpstreamApi { stage, .. } => Some(*stage),
            WeatherError::LocationNotFound { .. } => Some(Stage::Geocoding),
            WeatherError::SubscriptionRequired | WeatherError::RateLimited => Some(Stage::Weather),
            WeatherError::NotConfigured
            | WeatherError::MalformedUpstreamPayload { .. }
            | WeatherError::Unknown(_) => None,
        }
    }
}

fn status_details(status: StatusCode, body: &str) -> String {
    let body = truncate_body(body.trim());
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

// serde reports absent keys as "missing field `name`" with no structured
// accessor. Only the leaf name is read from it; the path comes from the
// section the caller decoded.
fn missing_field_name(err: &serde_json::Error) -> Option<String> {
    if !err.is_data() {
        return None;
    }
    let msg = err.to_string();
    let rest = msg.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
