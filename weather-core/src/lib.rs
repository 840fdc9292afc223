//! Core library for the `weather` tool server.
//!
//! This crate defines:
//! - Configuration & credential resolution
//! - The OpenWeatherMap geocoding + One Call provider
//! - Normalization of raw payloads into display-ready reports
//! - The error taxonomy every failure is classified into
//! - The `get_weather` / `list_available_tools` tool surface
//!
//! It is used by `weather-cli`, but can also be embedded in other tool hosts.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod tools;

pub use config::Config;
pub use error::{Stage, WeatherError};
pub use model::{ErrorResult, FormattedWeather, GeoResult, RawWeatherPayload, WeatherOutcome};
pub use provider::{WeatherProvider, provider_from_config};
pub use service::WeatherService;
pub use tools::{Tool, ToolDefinition, ToolError, ToolRegistry};
