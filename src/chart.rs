//! Temperature series for one location, split into observed and forecast
//! points, ready for plotting or textual rendering.

use crate::types::weather_record::WeatherRecord;
use chrono::NaiveDate;

/// Minimum padding applied above and below the temperature range.
pub const MIN_Y_PADDING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperaturePoint {
    pub date: NaiveDate,
    pub temp: f64,
}

/// Observed and forecast temperatures of one location, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeries {
    pub city: String,
    pub state: String,
    pub today: NaiveDate,
    pub actual: Vec<TemperaturePoint>,
    pub predicted: Vec<TemperaturePoint>,
    /// Today's observed point and the first forecast point after today,
    /// present only when both exist.
    pub bridge: Option<(TemperaturePoint, TemperaturePoint)>,
    /// Lowest and highest temperature over all points.
    pub range: Option<(f64, f64)>,
    /// `range` padded by 10% of its width, at least [`MIN_Y_PADDING`].
    pub y_limits: Option<(f64, f64)>,
}

impl TemperatureSeries {
    /// Builds the series for `city`/`state` (matched ignoring case) from a
    /// history. Records without a temperature are left out.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use weather_history::{TemperatureSeries, WeatherRecord};
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    /// let day = |d: u32, temp: f64, predicted: bool| WeatherRecord {
    ///     weather_date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
    ///     export_date: today,
    ///     city: "Austin".to_string(),
    ///     state: "Texas".to_string(),
    ///     temp: Some(temp),
    ///     humidity: 40,
    ///     rain: 0.0,
    ///     summary: String::new(),
    ///     predicted,
    /// };
    ///
    /// let series = TemperatureSeries::build(
    ///     &[day(16, 70.0, true), day(15, 60.0, false)],
    ///     "Austin",
    ///     "Texas",
    ///     today,
    /// );
    /// assert_eq!(series.range, Some((60.0, 70.0)));
    /// assert_eq!(series.y_limits, Some((55.0, 75.0)));
    /// assert!(series.bridge.is_some());
    /// ```
    pub fn build(records: &[WeatherRecord], city: &str, state: &str, today: NaiveDate) -> Self {
        let mut rows: Vec<(TemperaturePoint, bool)> = records
            .iter()
            .filter(|r| r.is_at(city, state))
            .filter_map(|r| {
                r.temp.map(|temp| {
                    (
                        TemperaturePoint {
                            date: r.weather_date,
                            temp,
                        },
                        r.predicted,
                    )
                })
            })
            .collect();
        rows.sort_by_key(|(point, _)| point.date);

        let (predicted, actual): (Vec<(TemperaturePoint, bool)>, Vec<(TemperaturePoint, bool)>) =
            rows.iter().copied().partition(|(_, is_predicted)| *is_predicted);
        let actual: Vec<TemperaturePoint> = actual.into_iter().map(|(point, _)| point).collect();
        let predicted: Vec<TemperaturePoint> =
            predicted.into_iter().map(|(point, _)| point).collect();

        let todays_actual = actual.iter().find(|p| p.date == today);
        let next_forecast = predicted.iter().find(|p| p.date > today);
        let bridge = todays_actual.zip(next_forecast).map(|(a, b)| (*a, *b));

        let range = rows.iter().map(|(p, _)| p.temp).fold(None, |acc, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((f64::min(lo, t), f64::max(hi, t))),
        });
        let y_limits = range.map(|(lo, hi)| {
            let padding = f64::max((hi - lo) * 0.1, MIN_Y_PADDING);
            (lo - padding, hi + padding)
        });

        Self {
            city: city.to_string(),
            state: state.to_string(),
            today,
            actual,
            predicted,
            bridge,
            range,
            y_limits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty() && self.predicted.is_empty()
    }

    /// All points in date order, each flagged `true` when it is a forecast.
    pub fn points(&self) -> Vec<(TemperaturePoint, bool)> {
        let mut points: Vec<(TemperaturePoint, bool)> = self
            .actual
            .iter()
            .map(|p| (*p, false))
            .chain(self.predicted.iter().map(|p| (*p, true)))
            .collect();
        points.sort_by_key(|(p, _)| p.date);
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn record(city: &str, day: u32, temp: Option<f64>, predicted: bool) -> WeatherRecord {
        WeatherRecord {
            weather_date: date(day),
            export_date: date(15),
            city: city.to_string(),
            state: "New York".to_string(),
            temp,
            humidity: 50,
            rain: 0.0,
            summary: "Clear Sky".to_string(),
            predicted,
        }
    }

    fn history() -> Vec<WeatherRecord> {
        vec![
            record("New York", 17, Some(45.0), true),
            record("New York", 13, Some(30.0), false),
            record("New York", 15, Some(40.0), false),
            record("New York", 16, Some(42.0), true),
            record("New York", 14, None, false),
            record("Buffalo", 15, Some(10.0), false),
        ]
    }

    #[test]
    fn test_split_and_sorted() {
        let series = TemperatureSeries::build(&history(), "new york", "NEW YORK", date(15));

        let actual: Vec<NaiveDate> = series.actual.iter().map(|p| p.date).collect();
        let predicted: Vec<NaiveDate> = series.predicted.iter().map(|p| p.date).collect();
        assert_eq!(actual, vec![date(13), date(15)]);
        assert_eq!(predicted, vec![date(16), date(17)]);
        assert_eq!(series.points().len(), 4);
    }

    #[test]
    fn test_bridge_connects_today_to_next_forecast() {
        let series = TemperatureSeries::build(&history(), "New York", "New York", date(15));
        let (from, to) = series.bridge.unwrap();
        assert_eq!(from, TemperaturePoint { date: date(15), temp: 40.0 });
        assert_eq!(to, TemperaturePoint { date: date(16), temp: 42.0 });
    }

    #[test]
    fn test_no_bridge_without_todays_observation() {
        let series = TemperatureSeries::build(&history(), "New York", "New York", date(14));
        assert!(series.bridge.is_none());
    }

    #[test]
    fn test_range_and_padding() {
        let series = TemperatureSeries::build(&history(), "New York", "New York", date(15));
        assert_eq!(series.range, Some((30.0, 45.0)));
        // 10% of 15 degrees is below the minimum padding
        assert_eq!(series.y_limits, Some((25.0, 50.0)));

        let wide = vec![
            record("New York", 13, Some(0.0), false),
            record("New York", 14, Some(100.0), false),
        ];
        let series = TemperatureSeries::build(&wide, "New York", "New York", date(15));
        assert_eq!(series.y_limits, Some((-10.0, 110.0)));
    }

    #[test]
    fn test_unknown_location_is_empty() {
        let series = TemperatureSeries::build(&history(), "Boston", "Massachusetts", date(15));
        assert!(series.is_empty());
        assert_eq!(series.range, None);
        assert_eq!(series.y_limits, None);
        assert!(series.bridge.is_none());
    }
}
