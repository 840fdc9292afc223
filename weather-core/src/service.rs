//! The `get_weather` pipeline: geocode, fetch, normalize.
//!
//! Strictly sequential and stateless between calls. Dropping the returned
//! future abandons whichever request is in flight.

use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    model::{FormattedWeather, WeatherOutcome},
    normalize::normalize,
    provider::WeatherProvider,
};

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    /// Run the pipeline and fold any failure into an `ErrorResult`.
    pub async fn get_weather(&self, location: &str) -> WeatherOutcome {
        let result = self.try_get_weather(location).await;
        if let Err(err) = &result {
            warn!(location, stage = ?err.stage(), error = %err, "get_weather failed");
        }
        WeatherOutcome::from(result)
    }

    pub async fn try_get_weather(&self, location: &str) -> Result<FormattedWeather, WeatherError> {
        if !self.provider.is_configured() {
            return Err(WeatherError::NotConfigured);
        }

        let location = location.trim();
        if location.is_empty() {
            return Err(WeatherError::LocationNotFound {
                location: String::new(),
            });
        }

        let geo = self.provider.geocode(location).await?;
        debug!(name = %geo.name, lat = geo.latitude, lon = geo.longitude, "geocoded");

        let payload = self.provider.one_call(geo.latitude, geo.longitude).await?;
        let report = normalize(&geo, &payload)?;

        info!(location = %report.location, "weather report ready");
        Ok(report)
    }
}
