mod chart;
mod cities;
mod config;
mod error;
mod fetch;
mod reconcile;
mod store;
mod types;
mod utils;
mod weather_history;

pub use error::WeatherHistoryError;
pub use weather_history::*;

pub use config::*;
pub use reconcile::{reconcile, reconcile_with_summary, Reconciliation};

pub use fetch::client::{OpenWeatherClient, DEFAULT_EXCLUDE};
pub use fetch::convert::{daily_records, historical_record};
pub use fetch::error::FetchError;

pub use store::csv_store::{CsvStore, LoadedHistory, HISTORY_COLUMNS, HISTORY_FILE_NAME};
pub use store::error::{RowParseError, StoreError};

pub use cities::{
    CitiesError, CityDirectory, CityEntry, CITIES_FILE_NAME, DEFAULT_CITY_LIMIT,
};
pub use chart::{TemperaturePoint, TemperatureSeries, MIN_Y_PADDING};
pub use types::api::*;
pub use types::history_frame::HistoryLazyFrame;
pub use types::location::{LatLon, Location};
pub use types::units::Units;
pub use types::weather_record::{RecordKey, WeatherRecord};

pub use utils::{default_history_path, get_data_dir, title_case};
