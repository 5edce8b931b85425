//! A searchable list of known `City, State` pairs, loaded from a CSV file with
//! `City` and `State` columns (extra columns are ignored).

use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default file name of the city list.
pub const CITIES_FILE_NAME: &str = "cities_dict.csv";
/// Default number of matches returned by [`CityDirectory::search`].
pub const DEFAULT_CITY_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum CitiesError {
    #[error("Failed to open city list '{0}'")]
    Read(PathBuf, #[source] io::Error),

    #[error("Failed to read CSV header of city list '{0}'")]
    Header(PathBuf, #[source] csv::Error),
}

#[derive(Debug, Deserialize)]
struct CityRow {
    #[serde(rename = "City", default)]
    city: String,
    #[serde(rename = "State", default)]
    state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityEntry {
    pub city: String,
    pub state: String,
}

impl CityEntry {
    /// The `"City, State"` label shown to the user.
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    /// Splits a label back into city and state at its last `", "`.
    ///
    /// ```
    /// use weather_history::CityEntry;
    ///
    /// let entry = CityEntry::from_label("Washington, D.C., District of Columbia").unwrap();
    /// assert_eq!(entry.city, "Washington, D.C.");
    /// assert_eq!(entry.state, "District of Columbia");
    /// assert!(CityEntry::from_label("Paris").is_none());
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let (city, state) = label.rsplit_once(", ")?;
        Some(Self {
            city: city.to_string(),
            state: state.to_string(),
        })
    }
}

/// Known cities, unique per `(city, state)` and sorted by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityDirectory {
    entries: Vec<CityEntry>,
}

impl CityDirectory {
    /// Builds a directory from `(city, state)` pairs.
    ///
    /// Names are trimmed; pairs with an empty city or state are dropped and
    /// repeated pairs are kept once.
    pub fn from_pairs<I, C, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, S)>,
        C: AsRef<str>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut entries: Vec<CityEntry> = pairs
            .into_iter()
            .filter_map(|(city, state)| {
                let (city, state) = (city.as_ref().trim(), state.as_ref().trim());
                if city.is_empty() || state.is_empty() {
                    return None;
                }
                Some(CityEntry {
                    city: city.to_string(),
                    state: state.to_string(),
                })
            })
            .filter(|entry| seen.insert(entry.clone()))
            .collect();
        entries.sort_by_key(CityEntry::label);
        Self { entries }
    }

    /// Reads the city list at `path`.
    ///
    /// A missing file gives an empty directory, since the list only assists
    /// city selection. Rows that cannot be read are logged and skipped.
    ///
    /// # Errors
    ///
    /// [`CitiesError::Read`] if the file exists but cannot be opened,
    /// [`CitiesError::Header`] if its header row is unreadable.
    pub fn load(path: &Path) -> Result<Self, CitiesError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("City list {:?} not found, no cities available", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(CitiesError::Read(path.to_path_buf(), e)),
        };

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        reader
            .headers()
            .map_err(|e| CitiesError::Header(path.to_path_buf(), e))?;

        let rows = reader.deserialize::<CityRow>().filter_map(|row| match row {
            Ok(row) => Some((row.city, row.state)),
            Err(e) => {
                warn!("Skipping city list row in {:?}: {}", path, e);
                None
            }
        });
        let directory = Self::from_pairs(rows);
        info!("Loaded {} cities from {:?}", directory.len(), path);
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CityEntry] {
        &self.entries
    }

    /// Returns at most `limit` entries whose label contains `filter`, ignoring
    /// case. An empty filter matches every entry.
    ///
    /// # Arguments
    ///
    /// * `filter` - Text typed by the user, e.g. `"york"`.
    /// * `limit` - Maximum number of matches, usually [`DEFAULT_CITY_LIMIT`].
    ///
    /// # Returns
    ///
    /// Matching entries in label order.
    pub fn search(&self, filter: &str, limit: usize) -> Vec<&CityEntry> {
        let needle = filter.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|entry| needle.is_empty() || entry.label().to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dedupes_and_sorts() {
        let directory = CityDirectory::from_pairs([
            ("Portland", "Oregon"),
            ("Austin", "Texas"),
            ("Portland", "Maine"),
            (" Austin ", "Texas"),
            ("", "Nevada"),
            ("Reno", " "),
        ]);

        let labels: Vec<String> = directory.entries().iter().map(CityEntry::label).collect();
        assert_eq!(labels, vec!["Austin, Texas", "Portland, Maine", "Portland, Oregon"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let directory = CityDirectory::from_pairs([
            ("New York", "New York"),
            ("Yorktown", "Virginia"),
            ("Albany", "New York"),
            ("Boston", "Massachusetts"),
        ]);

        let labels = |filter: &str| -> Vec<String> {
            directory.search(filter, DEFAULT_CITY_LIMIT).iter().map(|e| e.label()).collect()
        };
        assert_eq!(
            labels("YORK"),
            vec!["Albany, New York", "New York, New York", "Yorktown, Virginia"]
        );
        assert_eq!(labels("ton, m"), vec!["Boston, Massachusetts"]);
        assert_eq!(labels("").len(), 4);
        assert!(labels("Atlantis").is_empty());
    }

    #[test]
    fn test_search_respects_limit() {
        let pairs: Vec<(String, String)> = (0..250)
            .map(|i| (format!("Town {:03}", i), "Ohio".to_string()))
            .collect();
        let directory = CityDirectory::from_pairs(pairs);

        let matches = directory.search("town", DEFAULT_CITY_LIMIT);
        assert_eq!(matches.len(), 100);
        assert_eq!(matches[0].city, "Town 000");
    }

    #[test]
    fn test_load_from_csv() -> Result<(), CitiesError> {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CITIES_FILE_NAME);
        std::fs::write(
            &path,
            "City,State,County\n\
             Austin,Texas,Travis\n\
             Austin,Texas,Williamson\n\
             Buffalo,New York,Erie\n\
             Springfield\n",
        )
        .unwrap();

        let directory = CityDirectory::load(&path)?;
        let labels: Vec<String> = directory.entries().iter().map(CityEntry::label).collect();
        assert_eq!(labels, vec!["Austin, Texas", "Buffalo, New York"]);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_empty() -> Result<(), CitiesError> {
        let dir = tempdir().unwrap();
        let directory = CityDirectory::load(&dir.path().join("nope.csv"))?;
        assert!(directory.is_empty());
        Ok(())
    }
}
