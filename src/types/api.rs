//! Serde models of the OpenWeatherMap JSON documents consumed by this crate.
//!
//! Fields are lenient: anything the conversion layer can do without is
//! optional or defaulted, since the API omits keys (e.g. `rain` on dry days)
//! rather than sending nulls.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// One entry of a `weather` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherCondition {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Rain volume. The daily forecast reports a plain number, other documents an
/// object keyed by accumulation window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rain {
    Volume(f64),
    Window {
        #[serde(rename = "1h", default)]
        one_hour: f64,
    },
}

impl Rain {
    pub fn volume(&self) -> f64 {
        match self {
            Rain::Volume(v) => *v,
            Rain::Window { one_hour } => *one_hour,
        }
    }
}

/// The `current` block of a One Call response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub dt: Option<i64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<i64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub visibility: Option<i64>,
    #[serde(default)]
    pub clouds: Option<i64>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

/// Temperatures of one forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyTemperature {
    #[serde(default)]
    pub day: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub night: Option<f64>,
}

/// One element of the `daily` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyWeather {
    #[serde(default)]
    pub dt: Option<i64>,
    #[serde(default)]
    pub temp: DailyTemperature,
    #[serde(default)]
    pub humidity: i64,
    #[serde(default)]
    pub rain: Option<Rain>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

/// Response of the One Call current + forecast endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub timezone: String,
    /// Seconds east of UTC for the requested location.
    #[serde(default)]
    pub timezone_offset: i32,
    #[serde(default)]
    pub current: Option<CurrentWeather>,
    /// Entries that fail to decode are logged and left out.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub daily: Vec<DailyWeather>,
}

/// Decodes a JSON array element by element, dropping the elements that do not
/// match `T` instead of failing the whole document.
fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed entry {} of API response: {}", index, e);
                None
            }
        })
        .collect())
}

/// One element of a time machine `data` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalWeather {
    #[serde(default)]
    pub dt: Option<i64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub humidity: i64,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

/// Response of the One Call time machine endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalResponse {
    #[serde(default)]
    pub timezone_offset: i32,
    #[serde(default, deserialize_with = "skip_malformed")]
    pub data: Vec<HistoricalWeather>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rain_shapes() -> Result<(), serde_json::Error> {
        let plain: DailyWeather = serde_json::from_value(json!({"dt": 1, "rain": 2.5}))?;
        assert_eq!(plain.rain.map(|r| r.volume()), Some(2.5));

        let windowed: DailyWeather = serde_json::from_value(json!({"dt": 1, "rain": {"1h": 0.4}}))?;
        assert_eq!(windowed.rain.map(|r| r.volume()), Some(0.4));

        let dry: DailyWeather = serde_json::from_value(json!({"dt": 1}))?;
        assert!(dry.rain.is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_daily_entry_is_skipped() -> Result<(), serde_json::Error> {
        let response: WeatherResponse = serde_json::from_value(json!({
            "timezone_offset": -18000,
            "daily": [
                {"dt": 1705338000, "temp": {"day": 35.2}, "humidity": 70},
                {"dt": 1705424400, "temp": {"day": "n/a"}, "humidity": 81},
                {"dt": 1705510800, "temp": {"day": 28.0}, "humidity": 50}
            ]
        }))?;

        let stamps: Vec<Option<i64>> = response.daily.iter().map(|d| d.dt).collect();
        assert_eq!(stamps, vec![Some(1705338000), Some(1705510800)]);
        assert_eq!(response.daily[1].temp.day, Some(28.0));
        Ok(())
    }

    #[test]
    fn test_malformed_historical_entry_is_skipped() -> Result<(), serde_json::Error> {
        let response: HistoricalResponse = serde_json::from_value(json!({
            "data": ["garbage", {"dt": 1704067200, "temp": 41.3, "humidity": 66}]
        }))?;
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].temp, Some(41.3));
        Ok(())
    }

    #[test]
    fn test_response_tolerates_missing_blocks() -> Result<(), serde_json::Error> {
        let response: WeatherResponse = serde_json::from_value(json!({
            "lat": 40.71,
            "lon": -74.0,
            "timezone": "America/New_York",
            "timezone_offset": -18000
        }))?;
        assert!(response.current.is_none());
        assert!(response.daily.is_empty());
        assert_eq!(response.timezone_offset, -18000);
        Ok(())
    }
}
