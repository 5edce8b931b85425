use crate::cities::CitiesError;
use crate::config::ConfigError;
use crate::fetch::error::FetchError;
use crate::store::error::StoreError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherHistoryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cities(#[from] CitiesError),

    #[error("Failed to build history frame")]
    Polars(#[from] PolarsError),

    #[error("Forecast for '{0}' contains no daily data, nothing was exported")]
    NoDailyData(String),
}
