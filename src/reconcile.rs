//! Merging of freshly fetched records into the persisted history.
//!
//! Forecast rows are provisional: an incoming row for the same location and
//! day replaces them. Observed rows are final: once an actual record exists on
//! disk for a key, any incoming record for that key is dropped, whether it is
//! a forecast or another observation.

use crate::types::weather_record::{RecordKey, WeatherRecord};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Outcome of a reconciliation, with the counts shown to the user after an export.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The merged history: surviving existing rows first, then new rows.
    pub records: Vec<WeatherRecord>,
    /// Existing rows carried over unchanged.
    pub kept: usize,
    /// Existing forecast rows removed because an incoming row had the same key.
    pub replaced: usize,
    /// Incoming rows dropped because an actual row already existed for their key.
    pub suppressed: usize,
    /// Incoming rows written to the history.
    pub added: usize,
    /// Existing rows dropped because an earlier row already held their key.
    pub collapsed: usize,
}

/// Merges `incoming` into `existing` and returns the new history.
///
/// See [`reconcile_with_summary`] for the rules and the row counts.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use weather_history::{reconcile, WeatherRecord};
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let row = |temp: f64, predicted: bool| WeatherRecord {
///     weather_date: day,
///     export_date: day,
///     city: "New York".into(),
///     state: "New York".into(),
///     temp: Some(temp),
///     humidity: 50,
///     rain: 0.0,
///     summary: "Clear Sky".into(),
///     predicted,
/// };
///
/// // The observed 40 degrees on disk survives a later forecast of 38.
/// let merged = reconcile(vec![row(40.0, false)], vec![row(38.0, true)]);
/// assert_eq!(merged, vec![row(40.0, false)]);
/// ```
pub fn reconcile(existing: Vec<WeatherRecord>, incoming: Vec<WeatherRecord>) -> Vec<WeatherRecord> {
    reconcile_with_summary(existing, incoming).records
}

/// Merges `incoming` into `existing`, reporting what happened to each row.
///
/// Rules, applied per [`RecordKey`]:
/// * incoming rows sharing a key collapse to the last one, kept at the position
///   of the first;
/// * an existing row whose key is not incoming is kept;
/// * an existing actual row whose key is incoming is kept, and the incoming row
///   for that key is suppressed;
/// * an existing forecast row whose key is incoming is dropped and the incoming
///   row takes its place at the end of the history.
///
/// Existing rows that already share a key are collapsed first (an actual row
/// beats a forecast, otherwise the later row wins), so the result never holds
/// two rows for one key.
pub fn reconcile_with_summary(
    existing: Vec<WeatherRecord>,
    incoming: Vec<WeatherRecord>,
) -> Reconciliation {
    let incoming = dedupe_last_wins(incoming);
    let stored = existing.len();
    let existing = collapse_existing(existing);
    let collapsed = stored - existing.len();

    let incoming_keys: HashSet<RecordKey> = incoming.iter().map(WeatherRecord::key).collect();
    let mut suppressed_keys: HashSet<RecordKey> = HashSet::new();

    let mut records = Vec::with_capacity(existing.len() + incoming.len());
    let mut replaced = 0;

    for record in existing {
        let key = record.key();
        if !incoming_keys.contains(&key) {
            records.push(record);
        } else if record.is_actual() {
            suppressed_keys.insert(key);
            records.push(record);
        } else {
            replaced += 1;
        }
    }
    let kept = records.len();

    let before = incoming.len();
    records.extend(
        incoming
            .into_iter()
            .filter(|record| !suppressed_keys.contains(&record.key())),
    );
    let added = records.len() - kept;

    Reconciliation {
        records,
        kept,
        replaced,
        suppressed: before - added,
        added,
        collapsed,
    }
}

fn dedupe_last_wins(records: Vec<WeatherRecord>) -> Vec<WeatherRecord> {
    let mut positions: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<WeatherRecord> = Vec::with_capacity(records.len());

    for record in records {
        match positions.entry(record.key()) {
            Entry::Occupied(entry) => unique[*entry.get()] = record,
            Entry::Vacant(entry) => {
                entry.insert(unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

fn collapse_existing(records: Vec<WeatherRecord>) -> Vec<WeatherRecord> {
    let mut positions: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<WeatherRecord> = Vec::with_capacity(records.len());

    for record in records {
        match positions.entry(record.key()) {
            Entry::Occupied(entry) => {
                let slot = &mut unique[*entry.get()];
                // A later forecast never displaces an observation.
                if record.is_actual() || slot.predicted {
                    log::warn!(
                        "Duplicate history rows for {} / {} on {}; keeping the later one",
                        record.city,
                        record.state,
                        record.weather_date
                    );
                    *slot = record;
                } else {
                    log::warn!(
                        "Duplicate history rows for {} / {} on {}; keeping the earlier actual row, dropping a later forecast",
                        record.city,
                        record.state,
                        record.weather_date
                    );
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn ny(day: u32, temp: f64, predicted: bool) -> WeatherRecord {
        WeatherRecord {
            weather_date: date(day),
            export_date: date(1),
            city: "New York".to_string(),
            state: "New York".to_string(),
            temp: Some(temp),
            humidity: 55,
            rain: 0.0,
            summary: "Overcast Clouds".to_string(),
            predicted,
        }
    }

    fn sorted(mut records: Vec<WeatherRecord>) -> Vec<WeatherRecord> {
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        records
    }

    fn assert_unique_keys(records: &[WeatherRecord]) {
        let keys: HashSet<RecordKey> = records.iter().map(WeatherRecord::key).collect();
        assert_eq!(keys.len(), records.len(), "duplicate keys in {:?}", records);
    }

    #[test]
    fn test_actual_on_disk_beats_incoming_forecast() {
        let existing = vec![ny(1, 40.0, false)];
        let incoming = vec![ny(1, 38.0, true)];

        let result = reconcile_with_summary(existing.clone(), incoming);

        assert_eq!(result.records, existing);
        assert_eq!(result.kept, 1);
        assert_eq!(result.suppressed, 1);
        assert_eq!(result.added, 0);
        assert_eq!(result.replaced, 0);
    }

    #[test]
    fn test_actual_on_disk_beats_incoming_actual() {
        let existing = vec![ny(1, 40.0, false)];
        let result = reconcile(existing.clone(), vec![ny(1, 41.5, false)]);
        assert_eq!(result, existing);
    }

    #[test]
    fn test_forecast_replaced_by_actual() {
        let existing = vec![ny(2, 35.0, true)];
        let incoming = vec![ny(2, 33.0, false)];

        let result = reconcile_with_summary(existing, incoming.clone());

        assert_eq!(result.records, incoming);
        assert_eq!(result.replaced, 1);
        assert_eq!(result.added, 1);
        assert_eq!(result.kept, 0);
    }

    #[test]
    fn test_forecast_replaced_by_newer_forecast() {
        let result = reconcile(vec![ny(3, 30.0, true)], vec![ny(3, 31.2, true)]);
        assert_eq!(result, vec![ny(3, 31.2, true)]);
    }

    #[test]
    fn test_empty_history_takes_all_incoming() {
        let incoming: Vec<WeatherRecord> = (1..=5).map(|d| ny(d, 30.0 + d as f64, d > 2)).collect();
        let result = reconcile(Vec::new(), incoming.clone());
        assert_eq!(result.len(), 5);
        assert_eq!(result, incoming);
    }

    #[test]
    fn test_empty_incoming_leaves_history_unchanged() {
        let existing = vec![ny(1, 40.0, false), ny(2, 35.0, true), ny(3, 36.0, true)];
        let result = reconcile_with_summary(existing.clone(), Vec::new());
        assert_eq!(result.records, existing);
        assert_eq!(result.kept, 3);
        assert_eq!(result.added, 0);
    }

    #[test]
    fn test_order_is_kept_existing_then_new() {
        let existing = vec![ny(1, 40.0, false), ny(2, 35.0, true), ny(3, 36.0, false)];
        let incoming = vec![ny(2, 34.0, false), ny(4, 37.0, true)];

        let result = reconcile(existing, incoming);

        assert_eq!(
            result,
            vec![ny(1, 40.0, false), ny(3, 36.0, false), ny(2, 34.0, false), ny(4, 37.0, true)]
        );
    }

    #[test]
    fn test_other_locations_are_untouched() {
        let mut boston = ny(2, 20.0, true);
        boston.city = "Boston".to_string();
        boston.state = "Massachusetts".to_string();

        let result = reconcile(vec![boston.clone(), ny(2, 35.0, true)], vec![ny(2, 33.0, false)]);

        assert_eq!(result, vec![boston, ny(2, 33.0, false)]);
    }

    #[test]
    fn test_keys_compare_case_insensitively() {
        let mut shouting = ny(1, 38.0, true);
        shouting.city = "NEW YORK".to_string();
        shouting.state = "new york".to_string();

        let result = reconcile(vec![ny(1, 40.0, false)], vec![shouting]);
        assert_eq!(result, vec![ny(1, 40.0, false)]);
    }

    #[test]
    fn test_batch_duplicates_last_wins_at_first_position() {
        let incoming = vec![ny(1, 30.0, true), ny(2, 31.0, true), ny(1, 32.0, false)];
        let result = reconcile_with_summary(Vec::new(), incoming);
        assert_eq!(result.records, vec![ny(1, 32.0, false), ny(2, 31.0, true)]);
        assert_eq!(result.added, 2);
        assert_eq!(result.suppressed, 0);
    }

    #[test]
    fn test_duplicate_history_rows_are_collapsed() {
        let existing = vec![ny(1, 40.0, false), ny(1, 39.0, true), ny(2, 30.0, true), ny(2, 31.0, true)];
        let result = reconcile_with_summary(existing, Vec::new());
        assert_eq!(result.records, vec![ny(1, 40.0, false), ny(2, 31.0, true)]);
        assert_eq!(result.collapsed, 2);
        assert_eq!(result.kept, 2);
    }

    #[test]
    fn test_earlier_actual_survives_later_duplicate_forecast() {
        let existing = vec![ny(3, 41.0, false), ny(4, 20.0, true), ny(3, 37.0, true)];
        let result = reconcile_with_summary(existing, vec![ny(4, 22.0, true)]);

        assert_eq!(result.records, vec![ny(3, 41.0, false), ny(4, 22.0, true)]);
        assert_eq!(result.collapsed, 1);
        assert_eq!(result.replaced, 1);
        assert_unique_keys(&result.records);
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let existing = vec![ny(1, 40.0, false), ny(2, 35.0, true), ny(5, 50.0, true)];
        let incoming = vec![ny(2, 34.0, false), ny(3, 37.0, true), ny(4, 38.0, true), ny(1, 20.0, true)];

        let first = reconcile(existing, incoming.clone());
        let second = reconcile(first.clone(), incoming);

        assert_eq!(sorted(first), sorted(second));
    }

    #[test]
    fn test_keys_unique_after_mixed_merge() {
        let existing = vec![ny(1, 40.0, false), ny(2, 35.0, true), ny(2, 36.0, false), ny(3, 30.0, true)];
        let incoming = vec![ny(1, 1.0, true), ny(2, 2.0, true), ny(3, 3.0, false), ny(3, 4.0, true), ny(6, 6.0, true)];

        let result = reconcile(existing, incoming);

        assert_unique_keys(&result);
        // Day 2 had an observation on disk, so it survives; day 3 takes the last incoming row.
        assert!(result.contains(&ny(2, 36.0, false)));
        assert!(result.contains(&ny(3, 4.0, true)));
        assert!(result.contains(&ny(1, 40.0, false)));
    }

    #[test]
    fn test_every_actual_key_survives_any_batch() {
        let existing: Vec<WeatherRecord> = (1..=6).map(|d| ny(d, 40.0 + d as f64, d % 2 == 0)).collect();
        let incoming: Vec<WeatherRecord> = (1..=6).map(|d| ny(d, 0.0, d % 3 == 0)).collect();

        let result = reconcile(existing.clone(), incoming);

        for actual in existing.iter().filter(|r| r.is_actual()) {
            assert!(result.contains(actual), "lost actual row {:?}", actual);
        }
        for forecast in existing.iter().filter(|r| r.predicted) {
            assert!(!result.contains(forecast), "stale forecast kept {:?}", forecast);
        }
        assert_unique_keys(&result);
    }
}
