//! Contains [`HistoryLazyFrame`], a lazy polars view over the persisted weather history.

use crate::types::weather_record::{normalize, WeatherRecord};
use chrono::NaiveDate;
use polars::prelude::*;

/// A wrapper around a Polars `LazyFrame` holding weather history rows.
///
/// Columns: `weather_date` and `export_date` (Date), `city`, `state`,
/// `temp` (nullable f64), `humidity` (i64), `rain` (f64), `summary` and
/// `predicted` (bool).
///
/// Obtained through [`crate::WeatherHistory::history_frame`] or built directly
/// from records with [`HistoryLazyFrame::from_records`].
#[derive(Clone)]
pub struct HistoryLazyFrame {
    /// The underlying Polars LazyFrame.
    pub frame: LazyFrame,
}

impl HistoryLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Builds the frame from records, keeping their order.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use weather_history::{HistoryLazyFrame, WeatherRecord};
    ///
    /// # fn main() -> Result<(), polars::prelude::PolarsError> {
    /// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    /// let record = WeatherRecord {
    ///     weather_date: day,
    ///     export_date: day,
    ///     city: "Austin".to_string(),
    ///     state: "Texas".to_string(),
    ///     temp: Some(61.0),
    ///     humidity: 40,
    ///     rain: 0.0,
    ///     summary: "Clear Sky".to_string(),
    ///     predicted: false,
    /// };
    ///
    /// let history = HistoryLazyFrame::from_records(&[record])?;
    /// let df = history.for_location("austin", "TEXAS").frame.collect()?;
    /// assert_eq!(df.height(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_records(records: &[WeatherRecord]) -> PolarsResult<Self> {
        let weather_dates: Vec<NaiveDate> = records.iter().map(|r| r.weather_date).collect();
        let export_dates: Vec<NaiveDate> = records.iter().map(|r| r.export_date).collect();
        let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
        let states: Vec<&str> = records.iter().map(|r| r.state.as_str()).collect();
        let temps: Vec<Option<f64>> = records.iter().map(|r| r.temp).collect();
        let humidity: Vec<i64> = records.iter().map(|r| r.humidity).collect();
        let rain: Vec<f64> = records.iter().map(|r| r.rain).collect();
        let summaries: Vec<&str> = records.iter().map(|r| r.summary.as_str()).collect();
        let predicted: Vec<bool> = records.iter().map(|r| r.predicted).collect();

        let df = df!(
            "weather_date" => weather_dates,
            "export_date" => export_dates,
            "city" => cities,
            "state" => states,
            "temp" => temps,
            "humidity" => humidity,
            "rain" => rain,
            "summary" => summaries,
            "predicted" => predicted,
        )?;
        Ok(Self::new(df.lazy()))
    }

    /// Applies an arbitrary predicate lazily and returns the filtered view.
    ///
    /// # Arguments
    ///
    /// * `predicate` - A Polars [`Expr`] over the history columns, e.g.
    ///   `col("rain").gt(lit(0.0))`.
    ///
    /// # Returns
    ///
    /// A new `HistoryLazyFrame` holding only the matching rows. Nothing is
    /// evaluated until the frame is collected.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use polars::prelude::{col, lit};
    /// use weather_history::{HistoryLazyFrame, WeatherRecord};
    ///
    /// # fn main() -> Result<(), polars::prelude::PolarsError> {
    /// let row = |day: u32, rain: f64| WeatherRecord {
    ///     weather_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
    ///     export_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    ///     city: "Austin".to_string(),
    ///     state: "Texas".to_string(),
    ///     temp: Some(61.0),
    ///     humidity: 40,
    ///     rain,
    ///     summary: String::new(),
    ///     predicted: false,
    /// };
    ///
    /// let history = HistoryLazyFrame::from_records(&[row(14, 0.0), row(15, 2.4)])?;
    /// let wet = history.filter(col("rain").gt(lit(0.0))).frame.collect()?;
    /// assert_eq!(wet.height(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> HistoryLazyFrame {
        HistoryLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Rows of one location. City and state are matched ignoring case and
    /// surrounding whitespace, the same way record keys are compared.
    ///
    /// # Arguments
    ///
    /// * `city` - City name as stored, e.g. `"New York"`.
    /// * `state` - State name as stored; empty for places without one.
    ///
    /// # Returns
    ///
    /// A new `HistoryLazyFrame` restricted to that location.
    pub fn for_location(&self, city: &str, state: &str) -> HistoryLazyFrame {
        self.filter(
            normalized(col("city"))
                .eq(lit(normalize(city)))
                .and(normalized(col("state")).eq(lit(normalize(state)))),
        )
    }

    /// Rows whose `weather_date` lies within `start..=end`.
    ///
    /// # Arguments
    ///
    /// * `start` - First weather date to keep (inclusive).
    /// * `end` - Last weather date to keep (inclusive). An `end` before
    ///   `start` gives an empty frame.
    ///
    /// # Returns
    ///
    /// A new `HistoryLazyFrame` filtered by the date range.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use weather_history::{HistoryLazyFrame, WeatherRecord};
    ///
    /// # fn main() -> Result<(), polars::prelude::PolarsError> {
    /// let date = |day: u32| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    /// let records: Vec<WeatherRecord> = (10..=20)
    ///     .map(|day| WeatherRecord {
    ///         weather_date: date(day),
    ///         export_date: date(20),
    ///         city: "Austin".to_string(),
    ///         state: "Texas".to_string(),
    ///         temp: None,
    ///         humidity: 40,
    ///         rain: 0.0,
    ///         summary: String::new(),
    ///         predicted: false,
    ///     })
    ///     .collect();
    ///
    /// let history = HistoryLazyFrame::from_records(&records)?;
    /// let week = history.get_range(date(12), date(18)).frame.collect()?;
    /// assert_eq!(week.height(), 7);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> HistoryLazyFrame {
        self.filter(
            col("weather_date")
                .gt_eq(lit(start))
                .and(col("weather_date").lt_eq(lit(end))),
        )
    }

    pub fn actual(&self) -> HistoryLazyFrame {
        self.filter(col("predicted").not())
    }

    pub fn predicted(&self) -> HistoryLazyFrame {
        self.filter(col("predicted"))
    }

    /// Sorted by `weather_date`; rows of the same day keep their relative order.
    pub fn sorted(&self) -> HistoryLazyFrame {
        HistoryLazyFrame::new(self.frame.clone().sort(
            ["weather_date"],
            SortMultipleOptions::default().with_maintain_order(true),
        ))
    }
}

fn normalized(expr: Expr) -> Expr {
    expr.str().strip_chars(lit(NULL)).str().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, state: &str, day: u32, temp: Option<f64>, predicted: bool) -> WeatherRecord {
        WeatherRecord {
            weather_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            export_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            city: city.to_string(),
            state: state.to_string(),
            temp,
            humidity: 60,
            rain: 0.0,
            summary: "Clear Sky".to_string(),
            predicted,
        }
    }

    fn sample() -> PolarsResult<HistoryLazyFrame> {
        HistoryLazyFrame::from_records(&[
            record("New York", "New York", 17, Some(41.0), true),
            record("New York", "New York", 14, Some(38.5), false),
            record("Austin", "Texas", 15, None, false),
            record("new york ", "NEW YORK", 15, Some(40.0), false),
            record("New York", "New York", 16, Some(39.2), true),
        ])
    }

    #[test]
    fn test_schema() -> Result<(), PolarsError> {
        let df = sample()?.frame.collect()?;

        assert_eq!(df.height(), 5);
        assert_eq!(df.column("weather_date")?.dtype(), &DataType::Date);
        assert_eq!(df.column("export_date")?.dtype(), &DataType::Date);
        assert_eq!(df.column("temp")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("humidity")?.dtype(), &DataType::Int64);
        assert_eq!(df.column("predicted")?.dtype(), &DataType::Boolean);
        assert_eq!(df.column("temp")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_for_location_ignores_case() -> Result<(), PolarsError> {
        let df = sample()?.for_location("NEW YORK", "new york").frame.collect()?;
        assert_eq!(df.height(), 4);

        let none = sample()?.for_location("Boston", "Massachusetts").frame.collect()?;
        assert_eq!(none.height(), 0);
        Ok(())
    }

    #[test]
    fn test_actual_and_predicted() -> Result<(), PolarsError> {
        let history = sample()?.for_location("New York", "New York");
        assert_eq!(history.actual().frame.collect()?.height(), 2);
        assert_eq!(history.predicted().frame.collect()?.height(), 2);
        Ok(())
    }

    #[test]
    fn test_get_range_is_inclusive() -> Result<(), PolarsError> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let df = sample()?.get_range(start, end).frame.collect()?;
        assert_eq!(df.height(), 3);
        Ok(())
    }

    #[test]
    fn test_sorted_by_weather_date() -> Result<(), PolarsError> {
        let df = sample()?
            .for_location("New York", "New York")
            .sorted()
            .frame
            .collect()?;

        let temps: Vec<Option<f64>> = df.column("temp")?.f64()?.into_iter().collect();
        assert_eq!(temps, vec![Some(38.5), Some(40.0), Some(39.2), Some(41.0)]);
        Ok(())
    }

    #[test]
    fn test_empty_history() -> Result<(), PolarsError> {
        let df = HistoryLazyFrame::from_records(&[])?.frame.collect()?;
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 9);
        Ok(())
    }
}
