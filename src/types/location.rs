//! Geographic types: a bare coordinate pair and the normalized result of a
//! geocoding lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use weather_history::LatLon;
///
/// let austin = LatLon(30.2672, -97.7431);
/// assert_eq!(austin.0, 30.2672); // Latitude
/// assert_eq!(austin.1, -97.7431); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }
}

/// A place returned by the geocoding endpoint.
///
/// Only the first match of a query is kept. `state` is empty for places the
/// geocoder reports without one (most places outside the US).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default)]
    pub state: String,
    /// Localized names keyed by language code, e.g. `{"en": "New York"}`.
    #[serde(default)]
    pub local_names: HashMap<String, String>,
}

impl Location {
    pub fn lat_lon(&self) -> LatLon {
        LatLon(self.lat, self.lon)
    }

    /// "Austin, Texas, US" style label; the state is omitted when empty.
    pub fn display_name(&self) -> String {
        if self.state.is_empty() {
            format!("{}, {}", self.name, self.country)
        } else {
            format!("{}, {}, {}", self.name, self.state, self.country)
        }
    }
}
