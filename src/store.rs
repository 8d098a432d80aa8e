//! Persistence of per-statistic running sums between daily runs.
//!
//! Stored as `last_sums.json` in the data folder:
//! ```json
//! { "sensor:sey_water_consumption": 12.5, "date": "20240620" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const SUMS_FILE_NAME: &str = "last_sums.json";

/// Format of the `date` field and of output file prefixes.
pub const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SumsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(flatten)]
    sums: BTreeMap<String, f64>,
}

/// Cumulative sums loaded at the start of a run and committed once at its end.
#[derive(Debug)]
pub struct SumStore {
    path: PathBuf,
    last_date: Option<String>,
    sums: BTreeMap<String, f64>,
}

impl SumStore {
    /// Loads the sums persisted in `folder` before exporting `date`.
    ///
    /// A missing file means this is the first run. Fails with
    /// [`Error::DuplicateRun`] when the file was already committed for `date`.
    pub fn load(folder: &Path, date: NaiveDate) -> Result<Self> {
        let path = folder.join(SUMS_FILE_NAME);

        if !path.exists() {
            info!(path = %path.display(), "No stored sums, assuming first execution");
            return Ok(Self {
                path,
                last_date: None,
                sums: BTreeMap::new(),
            });
        }

        debug!(path = %path.display(), "Loading stored sums");
        let file: SumsFile = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

        let date = date.format(DATE_FORMAT).to_string();
        if file.date.as_deref() == Some(date.as_str()) {
            return Err(Error::DuplicateRun { date, path });
        }

        info!(
            path = %path.display(),
            last_date = file.date.as_deref().unwrap_or("none"),
            statistics = file.sums.len(),
            "Stored sums loaded"
        );

        Ok(Self {
            path,
            last_date: file.date,
            sums: file.sums,
        })
    }

    pub fn last_date(&self) -> Option<&str> {
        self.last_date.as_deref()
    }

    /// Sum to continue `statistic_id` from; zero for a new statistic.
    pub fn seed(&self, statistic_id: &str) -> f64 {
        self.sums.get(statistic_id).copied().unwrap_or(0.0)
    }

    pub fn record(&mut self, statistic_id: &str, final_sum: f64) {
        self.sums.insert(statistic_id.to_string(), final_sum);
    }

    /// Writes every sum stamped with `date`, replacing the previous file.
    pub fn commit(&mut self, date: NaiveDate) -> Result<()> {
        let date = date.format(DATE_FORMAT).to_string();
        let file = SumsFile {
            date: Some(date.clone()),
            sums: self.sums.clone(),
        };

        // Write aside then rename so a crash never leaves a truncated file.
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serde_json::to_string(&file)?)?;
        std::fs::rename(&staging, &self.path)?;

        info!(path = %self.path.display(), date, statistics = self.sums.len(), "Sums committed");
        self.last_date = Some(date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_folder(name: &str) -> PathBuf {
        let folder = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&folder); // clean up any prior run
        fs::create_dir_all(&folder).unwrap();
        folder
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_first_run_is_empty() {
        let folder = temp_folder("sey_store_test_first_run");
        let store = SumStore::load(&folder, date(20)).unwrap();

        assert_eq!(store.last_date(), None);
        assert_eq!(store.seed("sensor:anything"), 0.0);

        fs::remove_dir_all(&folder).unwrap();
    }

    #[test]
    fn test_commit_then_load_next_day() {
        let folder = temp_folder("sey_store_test_round");
        let mut store = SumStore::load(&folder, date(20)).unwrap();
        store.record("sensor:a", 1.5);
        store.record("sensor:b", 42.0);
        store.record("sensor:a", 3.5);
        store.commit(date(20)).unwrap();

        let store = SumStore::load(&folder, date(21)).unwrap();
        assert_eq!(store.last_date(), Some("20240620"));
        assert_eq!(store.seed("sensor:a"), 3.5);
        assert_eq!(store.seed("sensor:b"), 42.0);
        assert!(!folder.join("last_sums.json.tmp").exists());

        fs::remove_dir_all(&folder).unwrap();
    }

    #[test]
    fn test_file_format() {
        let folder = temp_folder("sey_store_test_format");
        let mut store = SumStore::load(&folder, date(20)).unwrap();
        store.record("sensor:a", 1.5);
        store.commit(date(20)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(folder.join(SUMS_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(value, serde_json::json!({"sensor:a": 1.5, "date": "20240620"}));

        fs::remove_dir_all(&folder).unwrap();
    }

    #[test]
    fn test_same_date_is_duplicate_run() {
        let folder = temp_folder("sey_store_test_duplicate");
        fs::write(
            folder.join(SUMS_FILE_NAME),
            r#"{"sensor:a": 1.0, "date": "20240620"}"#,
        )
        .unwrap();

        let err = SumStore::load(&folder, date(20)).unwrap_err();
        assert!(matches!(err, Error::DuplicateRun { ref date, .. } if date == "20240620"));

        fs::remove_dir_all(&folder).unwrap();
    }

    #[test]
    fn test_older_file_without_date_loads() {
        let folder = temp_folder("sey_store_test_no_date");
        fs::write(folder.join(SUMS_FILE_NAME), r#"{"sensor:a": 2.25}"#).unwrap();

        let store = SumStore::load(&folder, date(20)).unwrap();
        assert_eq!(store.last_date(), None);
        assert_eq!(store.seed("sensor:a"), 2.25);

        fs::remove_dir_all(&folder).unwrap();
    }
}
