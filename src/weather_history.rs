//! The main entry point: ties the OpenWeatherMap client to the CSV history.

use crate::chart::TemperatureSeries;
use crate::config::Config;
use crate::error::WeatherHistoryError;
use crate::fetch::client::OpenWeatherClient;
use crate::fetch::convert::{daily_records, historical_record};
use crate::fetch::error::FetchError;
use crate::reconcile::Reconciliation;
use crate::store::csv_store::CsvStore;
use crate::types::api::{HistoricalResponse, WeatherResponse};
use crate::types::history_frame::HistoryLazyFrame;
use crate::types::location::Location;
use crate::types::units::Units;
use crate::types::weather_record::WeatherRecord;
use bon::bon;
use chrono::{Days, Local, NaiveDate, NaiveTime};
use log::{debug, info, warn};

/// Number of past days fetched by [`WeatherHistory::seed_history`] by default.
pub const DEFAULT_SEED_DAYS: u32 = 7;

/// A geocoded location together with its current conditions and forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct CityWeather {
    pub location: Location,
    pub weather: WeatherResponse,
}

/// Outcome of [`WeatherHistory::seed_history`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeedReport {
    /// `None` when no day could be fetched and the file was left untouched.
    pub merged: Option<Reconciliation>,
    /// Days whose observation could not be fetched, with the reason.
    pub failed: Vec<(NaiveDate, String)>,
}

/// Fetches weather for a city and maintains the persisted history.
///
/// # Examples
///
/// ```no_run
/// # use weather_history::{WeatherHistory, WeatherHistoryError};
/// # async fn run() -> Result<(), WeatherHistoryError> {
/// let history = WeatherHistory::from_env()?;
///
/// let new_york = history.lookup("New York").state("NY").country("US").call().await?;
/// let summary = history.export_daily(&new_york)?;
/// println!("{} rows kept, {} added", summary.kept, summary.added);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WeatherHistory {
    client: OpenWeatherClient,
    store: CsvStore,
}

#[bon]
impl WeatherHistory {
    pub fn new(config: &Config) -> Result<Self, WeatherHistoryError> {
        Ok(Self {
            client: OpenWeatherClient::new(config)?,
            store: CsvStore::new(config.history_path.clone()),
        })
    }

    /// Creates the client from `OPENWEATHERMAP_KEY1` and friends.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::ConfigError::MissingApiKey`] before any request is made
    /// if the key is not set.
    pub fn from_env() -> Result<Self, WeatherHistoryError> {
        let config = Config::from_env()?;
        Self::new(&config)
    }

    pub fn client(&self) -> &OpenWeatherClient {
        &self.client
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    pub fn units(&self) -> Units {
        self.client.units()
    }

    /// Geocodes a city and fetches its current conditions and daily forecast.
    #[builder(start_fn = lookup)]
    #[doc(hidden)]
    pub async fn build_lookup(
        &self,
        #[builder(start_fn)] city: &str,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<CityWeather, WeatherHistoryError> {
        let location = self
            .client
            .geocode(city)
            .maybe_state(state)
            .maybe_country(country)
            .call()
            .await?;
        let weather = self
            .client
            .current_and_forecast(location.lat_lon())
            .call()
            .await?;
        Ok(CityWeather { location, weather })
    }

    /// Writes the daily forecast of `city_weather` into the history, with the
    /// local calendar day as both export day and fetch day.
    pub fn export_daily(
        &self,
        city_weather: &CityWeather,
    ) -> Result<Reconciliation, WeatherHistoryError> {
        self.export_daily_on(city_weather, Local::now().date_naive())
    }

    /// Same as [`WeatherHistory::export_daily`] for an explicit fetch day.
    /// Entries after `today` are stored as predicted.
    ///
    /// # Errors
    ///
    /// [`WeatherHistoryError::NoDailyData`] if the response has no daily
    /// block; the file is not touched in that case.
    pub fn export_daily_on(
        &self,
        city_weather: &CityWeather,
        today: NaiveDate,
    ) -> Result<Reconciliation, WeatherHistoryError> {
        let CityWeather { location, weather } = city_weather;
        if weather.daily.is_empty() {
            return Err(WeatherHistoryError::NoDailyData(location.display_name()));
        }

        let records = daily_records(location, weather, today, today);
        let summary = self.store.merge(records)?;
        info!(
            "Exported {} for {}: {} kept, {} added, {} total",
            self.store.path().display(),
            location.display_name(),
            summary.kept,
            summary.added,
            summary.records.len()
        );
        Ok(summary)
    }

    /// Fetches observations for the `days` days before `today` (today
    /// excluded, default [`DEFAULT_SEED_DAYS`]) and merges them into the
    /// history.
    ///
    /// A day that fails to fetch is logged and reported in
    /// [`SeedReport::failed`]; the other days are still merged.
    #[builder(start_fn = seed_history)]
    #[doc(hidden)]
    pub async fn build_seed_history(
        &self,
        #[builder(start_fn)] city: &str,
        state: Option<&str>,
        country: Option<&str>,
        days: Option<u32>,
        today: Option<NaiveDate>,
    ) -> Result<SeedReport, WeatherHistoryError> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        let location = self
            .client
            .geocode(city)
            .maybe_state(state)
            .maybe_country(country)
            .call()
            .await?;

        let mut records = Vec::new();
        let mut failed = Vec::new();
        let mut offset = solar_offset(location.lon);
        for date in seed_dates(today, days.unwrap_or(DEFAULT_SEED_DAYS)) {
            let result = match self.fetch_local_noon(&location, date, &mut offset).await {
                Ok(response) => historical_record(&location, date, &response, today),
                Err(e) => Err(e),
            };
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping {} for {}: {}", date, location.display_name(), e);
                    failed.push((date, e.to_string()));
                }
            }
        }

        if records.is_empty() {
            warn!("No historical data fetched for {}", location.display_name());
            return Ok(SeedReport {
                merged: None,
                failed,
            });
        }

        let summary = self.store.merge(records)?;
        info!(
            "Seeded {} days for {} ({} failed)",
            summary.added,
            location.display_name(),
            failed.len()
        );
        Ok(SeedReport {
            merged: Some(summary),
            failed,
        })
    }

    /// All persisted records, in file order.
    pub fn history(&self) -> Result<Vec<WeatherRecord>, WeatherHistoryError> {
        Ok(self.store.load()?)
    }

    pub fn history_frame(&self) -> Result<HistoryLazyFrame, WeatherHistoryError> {
        Ok(HistoryLazyFrame::from_records(&self.store.load()?)?)
    }

    /// Temperature series of one location from the persisted history.
    pub fn temperature_series(
        &self,
        city: &str,
        state: &str,
        today: NaiveDate,
    ) -> Result<TemperatureSeries, WeatherHistoryError> {
        let records = self.store.load()?;
        Ok(TemperatureSeries::build(&records, city, state, today))
    }
}

impl WeatherHistory {
    /// Fetches the observation at noon local time of `date`.
    ///
    /// `offset` is the best known UTC offset of the location in seconds. When
    /// the response reports a different one, the offset is corrected and the
    /// day is requested again.
    async fn fetch_local_noon(
        &self,
        location: &Location,
        date: NaiveDate,
        offset: &mut i32,
    ) -> Result<HistoricalResponse, FetchError> {
        let response = self
            .client
            .historical(location.lat_lon(), local_noon(date, *offset))
            .await?;
        if response.timezone_offset == *offset {
            return Ok(response);
        }

        debug!(
            "UTC offset of {} is {}s, not {}s, refetching {}",
            location.display_name(),
            response.timezone_offset,
            offset,
            date
        );
        *offset = response.timezone_offset;
        self.client
            .historical(location.lat_lon(), local_noon(date, *offset))
            .await
    }
}

/// The `days` days before `today`, oldest first.
fn seed_dates(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (1..=u64::from(days))
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .collect()
}

/// Unix timestamp of 12:00 on `date` at `offset_secs` east of UTC.
fn local_noon(date: NaiveDate, offset_secs: i32) -> i64 {
    date.and_time(NaiveTime::default()).and_utc().timestamp() + 12 * 3600
        - i64::from(offset_secs)
}

/// Whole-hour UTC offset of the mean solar time at `lon`. A first guess only:
/// civil offsets can differ by hours (e.g. UTC+14 at 157°W).
fn solar_offset(lon: f64) -> i32 {
    (lon / 15.0).round().clamp(-12.0, 12.0) as i32 * 3600
}
