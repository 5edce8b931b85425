//! Defines [`WeatherRecord`], one row of the persisted weather history, and the
//! [`RecordKey`] that identifies at most one record per location and day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single day of weather for one location, either observed or forecast.
///
/// Records are produced by the fetch layer (see [`crate::daily_records`] and
/// [`crate::historical_record`]), merged into the history by
/// [`crate::reconcile`] and persisted by [`crate::CsvStore`]. They are never
/// mutated after creation; a newer record with the same [`RecordKey`] may
/// supersede one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// The day the observation or forecast applies to.
    pub weather_date: NaiveDate,
    /// The day the record was written.
    pub export_date: NaiveDate,
    /// City name as reported by the geocoder (original casing).
    pub city: String,
    /// State or region, empty when the geocoder reports none.
    pub state: String,
    /// Day temperature, rounded to one decimal. `None` when the fetch had no value.
    pub temp: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: i64,
    /// Rain volume, `0.0` when the API reported none.
    pub rain: f64,
    /// Title-cased condition text (e.g. "Light Rain").
    pub summary: String,
    /// `true` for a forecast of a future day, `false` for an actual observation.
    pub predicted: bool,
}

impl WeatherRecord {
    /// Returns the natural key of this record.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.city, &self.state, self.weather_date)
    }

    /// Returns `true` if this is observed (non-forecast) data.
    pub fn is_actual(&self) -> bool {
        !self.predicted
    }

    /// Returns `true` if the record belongs to the given city and state,
    /// compared the same way as [`RecordKey`].
    pub fn is_at(&self, city: &str, state: &str) -> bool {
        normalize(&self.city) == normalize(city) && normalize(&self.state) == normalize(state)
    }
}

/// The `(city, state, weather_date)` triple identifying a record.
///
/// City and state are trimmed and lower-cased so that "New York" and
/// "new york " address the same history row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub city: String,
    pub state: String,
    pub weather_date: NaiveDate,
}

impl RecordKey {
    pub fn new(city: &str, state: &str, weather_date: NaiveDate) -> Self {
        Self {
            city: normalize(city),
            state: normalize(state),
            weather_date,
        }
    }
}

pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Rounds a temperature to one fractional digit.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
