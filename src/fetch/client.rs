//! Provides [`OpenWeatherClient`], a thin async wrapper around the three
//! OpenWeatherMap endpoints this crate uses: direct geocoding, One Call
//! (current conditions + daily forecast) and the One Call time machine.

use crate::config::Config;
use crate::fetch::error::FetchError;
use crate::types::api::{HistoricalResponse, WeatherResponse};
use crate::types::location::{LatLon, Location};
use crate::types::units::Units;
use bon::bon;
use log::{info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Parts of the One Call document skipped unless the caller asks otherwise.
pub const DEFAULT_EXCLUDE: &str = "minutely,hourly,alerts";

/// HTTP client for OpenWeatherMap.
///
/// Every call is a single request: failures are returned to the caller and
/// never retried.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    units: Units,
    geocoding_url: String,
    onecall_url: String,
    timemachine_url: String,
}

#[bon]
impl OpenWeatherClient {
    /// Creates a client using the key, units, endpoints and timeout of `config`.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            units: config.units,
            geocoding_url: config.geocoding_url.clone(),
            onecall_url: config.onecall_url.clone(),
            timemachine_url: config.timemachine_url(),
        })
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Resolves a city name to coordinates, keeping the best match.
    ///
    /// Optional `.state(..)` and `.country(..)` narrow the query; `.limit(..)`
    /// sets how many candidates the API considers (default 1).
    ///
    /// # Errors
    ///
    /// [`FetchError::LocationNotFound`] when the geocoder returns no match, or
    /// any network, status or decode error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use weather_history::{Config, OpenWeatherClient, FetchError};
    /// # async fn run(config: Config) -> Result<(), FetchError> {
    /// let client = OpenWeatherClient::new(&config)?;
    /// let austin = client.geocode("Austin").state("TX").country("US").call().await?;
    /// println!("{} is at {:?}", austin.display_name(), austin.lat_lon());
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = geocode)]
    #[doc(hidden)]
    pub async fn build_geocode(
        &self,
        #[builder(start_fn)] city: &str,
        state: Option<&str>,
        country: Option<&str>,
        limit: Option<u8>,
    ) -> Result<Location, FetchError> {
        let query = [Some(city), state, country]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        let params = [
            ("q", query.clone()),
            ("limit", limit.unwrap_or(1).to_string()),
            ("appid", self.api_key.clone()),
        ];
        let matches: Vec<Location> = self.get_json(&self.geocoding_url, &params).await?;

        let location = matches
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::LocationNotFound(query.clone()))?;
        info!(
            "Geocoded '{}' to {} ({}, {})",
            query,
            location.display_name(),
            location.lat,
            location.lon
        );
        Ok(location)
    }

    /// Fetches current conditions and the daily forecast for a coordinate.
    ///
    /// `.exclude(..)` replaces the default exclusion list
    /// ([`DEFAULT_EXCLUDE`]) with a comma-separated list of blocks to skip.
    #[builder(start_fn = current_and_forecast)]
    #[doc(hidden)]
    pub async fn build_current_and_forecast(
        &self,
        #[builder(start_fn)] coordinate: LatLon,
        exclude: Option<&str>,
    ) -> Result<WeatherResponse, FetchError> {
        let params = [
            ("lat", coordinate.lat().to_string()),
            ("lon", coordinate.lon().to_string()),
            ("exclude", exclude.unwrap_or(DEFAULT_EXCLUDE).to_string()),
            ("units", self.units.query_value().to_string()),
            ("appid", self.api_key.clone()),
        ];
        let response: WeatherResponse = self.get_json(&self.onecall_url, &params).await?;
        info!(
            "Fetched forecast for {:?}: {} daily entries",
            coordinate,
            response.daily.len()
        );
        Ok(response)
    }

    /// Fetches the observation closest to `timestamp` (Unix seconds).
    pub async fn historical(
        &self,
        coordinate: LatLon,
        timestamp: i64,
    ) -> Result<HistoricalResponse, FetchError> {
        let params = [
            ("lat", coordinate.lat().to_string()),
            ("lon", coordinate.lon().to_string()),
            ("dt", timestamp.to_string()),
            ("units", self.units.query_value().to_string()),
            ("appid", self.api_key.clone()),
        ];
        self.get_json(&self.timemachine_url, &params).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e.without_url()))?;

        // The query string carries the API key, so errors are stripped of their URL.
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e.status());
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e.without_url(),
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e.without_url())
                });
            }
        };

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e.without_url()))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(url.to_string(), e))
    }
}
