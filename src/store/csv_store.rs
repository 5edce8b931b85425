use crate::reconcile::{reconcile_with_summary, Reconciliation};
use crate::store::error::{RowParseError, StoreError};
use crate::types::weather_record::{round1, WeatherRecord};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// File name used when a store is opened on a directory.
pub const HISTORY_FILE_NAME: &str = "weather_export.csv";

/// Column order of the history file. Written verbatim as the header row.
pub const HISTORY_COLUMNS: [&str; 9] = [
    "weather_date",
    "export_date",
    "city",
    "state",
    "temp",
    "humidity",
    "rain",
    "summary",
    "predicted",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw row as found on disk. Every column is optional so that files written by
/// older versions (no `predicted` column) still deserialize.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    weather_date: String,
    #[serde(default)]
    export_date: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    temp: String,
    #[serde(default)]
    humidity: String,
    #[serde(default)]
    rain: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    predicted: Option<String>,
}

impl CsvRow {
    fn into_record(self) -> Result<WeatherRecord, String> {
        Ok(WeatherRecord {
            weather_date: parse_date("weather_date", &self.weather_date)?,
            export_date: parse_date("export_date", &self.export_date)?,
            city: self.city,
            state: self.state,
            temp: parse_temp(&self.temp)?,
            humidity: parse_humidity(&self.humidity)?,
            rain: parse_rain(&self.rain)?,
            summary: self.summary,
            predicted: parse_predicted(self.predicted.as_deref())?,
        })
    }
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| format!("invalid {} '{}': {}", column, value, e))
}

fn parse_temp(value: &str) -> Result<Option<f64>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(|t| Some(round1(t)))
        .map_err(|e| format!("invalid temp '{}': {}", value, e))
}

fn parse_humidity(value: &str) -> Result<i64, String> {
    let value = value.trim();
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<f64>().map(|h| h.round() as i64))
        .map_err(|e| format!("invalid humidity '{}': {}", value, e))
}

fn parse_rain(value: &str) -> Result<f64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .map_err(|e| format!("invalid rain '{}': {}", value, e))
}

// Rows written before the column existed are observations.
fn parse_predicted(value: Option<&str>) -> Result<bool, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
        Some(v) => Err(format!("invalid predicted flag '{}'", v)),
    }
}

fn to_fields(record: &WeatherRecord) -> [String; 9] {
    [
        record.weather_date.format(DATE_FORMAT).to_string(),
        record.export_date.format(DATE_FORMAT).to_string(),
        record.city.clone(),
        record.state.clone(),
        record
            .temp
            .map(|t| format!("{:.1}", round1(t)))
            .unwrap_or_default(),
        record.humidity.to_string(),
        record.rain.to_string(),
        record.summary.clone(),
        if record.predicted { "True" } else { "False" }.to_string(),
    ]
}

/// Result of [`CsvStore::load_detailed`]: the parsed records plus the rows that
/// had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedHistory {
    pub records: Vec<WeatherRecord>,
    pub skipped: Vec<RowParseError>,
}

/// The on-disk weather history: one CSV file, rewritten in full on every save.
///
/// Saves go through a temporary file in the same directory that is renamed over
/// the target, so a concurrent reader sees either the old or the new file.
/// Writers within the process are serialized by an internal lock; the store
/// does not coordinate with other processes.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvStore {
    /// Opens a store on the given file. Nothing is read or created until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Opens a store on [`HISTORY_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every well-formed record. A missing file is an empty history;
    /// malformed rows are logged and skipped.
    pub fn load(&self) -> Result<Vec<WeatherRecord>, StoreError> {
        Ok(self.load_detailed()?.records)
    }

    /// Like [`CsvStore::load`], but also returns the rows that were skipped.
    pub fn load_detailed(&self) -> Result<LoadedHistory, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No history file at {:?} yet, starting empty", self.path);
                return Ok(LoadedHistory::default());
            }
            Err(e) => return Err(StoreError::Read(self.path.clone(), e)),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = reader
            .headers()
            .map_err(|e| StoreError::Header(self.path.clone(), e))?
            .clone();

        let mut loaded = LoadedHistory::default();
        for result in reader.records() {
            let parsed = result.map_err(|e| RowParseError {
                line: e.position().map_or(0, |p| p.line()),
                reason: e.to_string(),
            });
            let parsed = parsed.and_then(|row| {
                let line = row.position().map_or(0, |p| p.line());
                row.deserialize::<CsvRow>(Some(&headers))
                    .map_err(|e| e.to_string())
                    .and_then(CsvRow::into_record)
                    .map_err(|reason| RowParseError { line, reason })
            });

            match parsed {
                Ok(record) => loaded.records.push(record),
                Err(skipped) => {
                    warn!("{} in {:?}", skipped, self.path);
                    loaded.skipped.push(skipped);
                }
            }
        }

        info!(
            "Loaded {} history rows from {:?} ({} skipped)",
            loaded.records.len(),
            self.path,
            loaded.skipped.len()
        );
        Ok(loaded)
    }

    /// Replaces the file with exactly `records`, in the given order.
    ///
    /// # Errors
    ///
    /// Any I/O or encoding failure is returned as-is; the previous file is left
    /// in place and nothing is retried.
    pub fn save(&self, records: &[WeatherRecord]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        self.write_all(records)
    }

    /// Loads the history, reconciles `incoming` into it and saves the result,
    /// all under the writer lock.
    ///
    /// # Arguments
    ///
    /// * `incoming` - Freshly fetched records, in fetch order. Rows sharing a
    ///   key collapse to the last one.
    ///
    /// # Returns
    ///
    /// The [`Reconciliation`] that was written, with its row counts.
    ///
    /// # Errors
    ///
    /// Any load or save failure. On error the file on disk is unchanged.
    pub fn merge(&self, incoming: Vec<WeatherRecord>) -> Result<Reconciliation, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;

        let existing = self.load()?;
        let reconciliation = reconcile_with_summary(existing, incoming);
        self.write_all(&reconciliation.records)?;

        info!(
            "Merged history {:?}: kept {}, replaced {}, suppressed {}, added {}, total {}",
            self.path,
            reconciliation.kept,
            reconciliation.replaced,
            reconciliation.suppressed,
            reconciliation.added,
            reconciliation.records.len()
        );
        Ok(reconciliation)
    }

    fn write_all(&self, records: &[WeatherRecord]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StoreError::DirCreation(dir.clone(), e))?;

        let temp_file =
            NamedTempFile::new_in(&dir).map_err(|e| StoreError::Write(self.path.clone(), e))?;
        {
            let mut writer = csv::Writer::from_writer(temp_file.as_file());
            writer
                .write_record(HISTORY_COLUMNS)
                .map_err(|e| StoreError::Csv(self.path.clone(), e))?;
            for record in records {
                writer
                    .write_record(to_fields(record))
                    .map_err(|e| StoreError::Csv(self.path.clone(), e))?;
            }
            writer
                .flush()
                .map_err(|e| StoreError::Write(self.path.clone(), e))?;
        }
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::Write(self.path.clone(), e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| StoreError::Persist(self.path.clone(), e))?;

        info!("Wrote {} history rows to {:?}", records.len(), self.path);
        Ok(())
    }
}
