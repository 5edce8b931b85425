//! Turns API documents into [`WeatherRecord`]s. Pure functions: the fetch day
//! and export day are parameters, never read from the clock here.

use crate::fetch::error::FetchError;
use crate::types::api::{HistoricalResponse, WeatherCondition, WeatherResponse};
use crate::types::location::Location;
use crate::types::weather_record::{round1, WeatherRecord};
use crate::utils::title_case;
use chrono::{DateTime, FixedOffset, NaiveDate};
use log::warn;

/// Converts every entry of the daily forecast into a record.
///
/// The day of each entry is its `dt` timestamp in the location's own UTC
/// offset (`timezone_offset`); an entry without `dt` is dated `export_date`.
/// Entries dated after `today` are marked as predicted.
pub fn daily_records(
    location: &Location,
    response: &WeatherResponse,
    export_date: NaiveDate,
    today: NaiveDate,
) -> Vec<WeatherRecord> {
    response
        .daily
        .iter()
        .map(|day| {
            let weather_date = day
                .dt
                .and_then(|dt| local_date(dt, response.timezone_offset))
                .unwrap_or_else(|| {
                    warn!("Daily entry without usable timestamp, dating it {}", export_date);
                    export_date
                });

            WeatherRecord {
                weather_date,
                export_date,
                city: location.name.clone(),
                state: location.state.clone(),
                temp: day.temp.day.map(round1),
                humidity: day.humidity,
                rain: day.rain.map_or(0.0, |rain| rain.volume()),
                summary: summary_of(&day.weather),
                predicted: weather_date > today,
            }
        })
        .collect()
}

/// Converts a time machine response into the observed record for `date`.
///
/// # Errors
///
/// [`FetchError::EmptyHistorical`] if the response holds no observation.
pub fn historical_record(
    location: &Location,
    date: NaiveDate,
    response: &HistoricalResponse,
    export_date: NaiveDate,
) -> Result<WeatherRecord, FetchError> {
    let observation = response
        .data
        .first()
        .ok_or(FetchError::EmptyHistorical(date))?;

    Ok(WeatherRecord {
        weather_date: date,
        export_date,
        city: location.name.clone(),
        state: location.state.clone(),
        temp: observation.temp.map(round1),
        humidity: observation.humidity,
        rain: 0.0, // time machine data points carry no daily rain total
        summary: summary_of(&observation.weather),
        predicted: false,
    })
}

/// Calendar day of a Unix timestamp at the given offset (seconds east of UTC).
pub(crate) fn local_date(timestamp: i64, offset_secs: i32) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&offset).date_naive())
}

fn summary_of(conditions: &[WeatherCondition]) -> String {
    conditions
        .first()
        .map(|c| title_case(&c.description))
        .unwrap_or_default()
}
