use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    error::WeatherError,
    model::{GeoResult, RawWeatherPayload},
    provider::openweather::{Endpoints, OpenWeatherProvider},
};

pub mod openweather;

/// The two upstream calls the pipeline chains together.
///
/// Implementations attribute every failure to its stage before returning it.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Whether a credential is present. Checked before any request is made.
    fn is_configured(&self) -> bool;

    /// Resolve a free-text location to its first geocoding match.
    async fn geocode(&self, location: &str) -> Result<GeoResult, WeatherError>;

    /// Fetch the One Call document for a coordinate pair.
    async fn one_call(&self, latitude: f64, longitude: f64) -> Result<RawWeatherPayload, WeatherError>;
}

/// Construct the OpenWeatherMap provider from config.
///
/// A missing API key is not an error here: the provider reports itself as
/// unconfigured and every weather request is answered with `NotConfigured`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        tracing::warn!(
            "OPENWEATHERMAP_API_KEY is not set and no key is stored in the config file; \
             weather requests will fail until one is configured"
        );
    }

    let provider = OpenWeatherProvider::new(api_key, Endpoints::from_config(config), config.timeout())?;
    Ok(Box::new(provider))
}
