//! Key-value file store holding one JSON record per location plus the index.
//!
//! Every write goes through a staging file in the store directory followed by
//! a rename, so a concurrent or crashing reader never observes a half-written
//! file under the final name.

use crate::record::WeatherRecord;
use crate::registry::Location;
use crate::store::error::StoreError;
use crate::utils::ensure_store_dir_exists;
use chrono::{SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Well-known slot holding the `{id, name}` manifest.
pub const INDEX_FILE: &str = "locations.json";

const FALLBACK_NOTE: &str = "data could not be refreshed; reusing the last stored record";

/// One entry of the persisted index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
}

/// Result of a fallback attempt for a location whose refresh failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackOutcome {
    /// The prior record was annotated and re-persisted at this path.
    Reused(PathBuf),
    /// No record was ever stored for the location; nothing was written.
    NoPriorRecord,
}

#[derive(Debug)]
pub struct WeatherStore {
    dir: PathBuf,
}

impl WeatherStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirCreation`] when the directory cannot be
    /// created; this is the one setup failure that is fatal to a whole run.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        ensure_store_dir_exists(&dir)
            .await
            .map_err(|e| StoreError::DirCreation(dir.clone(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic slot path for a location id.
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Atomically writes the record into the slot for `id`. Last write wins.
    pub async fn persist(&self, id: &str, record: &WeatherRecord) -> Result<PathBuf, StoreError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(StoreError::Serialize)?;
        let path = self.record_path(id);
        self.write_atomic(path.clone(), bytes).await?;
        Ok(path)
    }

    /// Reads the stored record for `id`, if any.
    pub async fn read_record(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let path = self.record_path(id);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::RecordDecode(path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::RecordRead(path, e)),
        }
    }

    /// Reuses the prior record for `id` after a failed refresh, annotating it
    /// with the failure before re-persisting. With no prior record nothing is
    /// written and [`FallbackOutcome::NoPriorRecord`] is reported.
    pub async fn persist_fallback(
        &self,
        id: &str,
        error: &str,
    ) -> Result<FallbackOutcome, StoreError> {
        let Some(mut stored) = self.read_record(id).await? else {
            return Ok(FallbackOutcome::NoPriorRecord);
        };
        let path = self.record_path(id);
        let Some(object) = stored.as_object_mut() else {
            return Err(StoreError::RecordShape(path));
        };
        // A repeated failure overwrites the previous annotation; the latest
        // attempt is the one worth reporting.
        object.insert(
            "_fallback".to_string(),
            json!({
                "note": FALLBACK_NOTE,
                "error": error,
                "attemptedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            }),
        );
        let bytes = serde_json::to_vec_pretty(&stored).map_err(StoreError::Serialize)?;
        self.write_atomic(path.clone(), bytes).await?;
        Ok(FallbackOutcome::Reused(path))
    }

    /// Rebuilds the index slot in full from the registry.
    pub async fn write_index(&self, locations: &[Location]) -> Result<PathBuf, StoreError> {
        let entries: Vec<IndexEntry> = locations
            .iter()
            .map(|location| IndexEntry {
                id: location.id.clone(),
                name: location.name.clone(),
            })
            .collect();
        let bytes = serde_json::to_vec_pretty(&entries).map_err(StoreError::Serialize)?;
        let path = self.index_path();
        self.write_atomic(path.clone(), bytes).await?;
        info!("Wrote index of {} locations to {:?}", entries.len(), path);
        Ok(path)
    }

    /// Write-to-staging-name-then-rename inside a blocking task. The staging
    /// file lives in the store directory so the rename stays on one filesystem.
    async fn write_atomic(&self, path: PathBuf, bytes: Vec<u8>) -> Result<(), StoreError> {
        let dir = self.dir.clone();
        task::spawn_blocking(move || {
            let mut staging = NamedTempFile::new_in(&dir)
                .map_err(|e| StoreError::StagingCreate(dir.clone(), e))?;
            staging
                .write_all(&bytes)
                .map_err(|e| StoreError::StagingWrite(path.clone(), e))?;
            staging
                .flush()
                .map_err(|e| StoreError::StagingWrite(path.clone(), e))?;
            staging
                .persist(&path)
                .map_err(|e| StoreError::Rename(path, e.error))?;
            Ok::<(), StoreError>(())
        })
        .await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LocationInfo, WeatherRecord};
    use crate::registry::default_locations;

    fn sample_record(name: &str) -> WeatherRecord {
        let mut current = serde_json::Map::new();
        current.insert("temperature".to_string(), json!("29.5°C"));
        current.insert("windSpeed".to_string(), json!("10 km/h"));
        WeatherRecord {
            timestamp: "2024-01-01 12:00:00".to_string(),
            location: LocationInfo {
                name: name.to_string(),
                latitude: None,
                longitude: None,
                timezone: Some("Asia/Jayapura".to_string()),
                adm4: Some("81.76.01.1001".to_string()),
            },
            current,
            raw: json!({"source": "test"}),
            fallback: None,
        }
    }

    #[tokio::test]
    async fn persist_leaves_exactly_one_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::open(dir.path()).await.unwrap();

        let path = store.persist("ambon", &sample_record("Ambon")).await.unwrap();
        assert_eq!(path, dir.path().join("ambon.json"));

        // No staging leftovers once the rename has happened.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("ambon.json")]);

        let stored = store.read_record("ambon").await.unwrap().unwrap();
        assert_eq!(stored["current"]["temperature"], "29.5°C");
        assert_eq!(stored["location"]["name"], "Ambon");
    }

    #[tokio::test]
    async fn interrupted_staging_write_leaves_prior_record_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::open(dir.path()).await.unwrap();

        store.persist("ambon", &sample_record("Ambon")).await.unwrap();
        let before = store.read_record("ambon").await.unwrap().unwrap();

        // A crash between the staging write and the rename leaves a partial
        // staging file behind but never touches the final name.
        let mut staging = NamedTempFile::new_in(dir.path()).unwrap();
        staging.write_all(b"{\"timestamp\": \"2024-01-02 12:0").unwrap();
        staging.flush().unwrap();
        staging.into_temp_path().keep().unwrap();

        let after = store.read_record("ambon").await.unwrap().unwrap();
        assert_eq!(after, before);
        assert_eq!(after["current"]["temperature"], "29.5°C");
    }

    #[tokio::test]
    async fn fallback_appends_annotation_to_prior_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::open(dir.path()).await.unwrap();

        store.persist("ambon", &sample_record("Ambon")).await.unwrap();
        let before = store.read_record("ambon").await.unwrap().unwrap();

        let outcome = store
            .persist_fallback("ambon", "HTTP request failed with status 503")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            FallbackOutcome::Reused(dir.path().join("ambon.json"))
        );

        let mut after = store.read_record("ambon").await.unwrap().unwrap();
        let fallback = after.as_object_mut().unwrap().remove("_fallback").unwrap();
        assert_eq!(fallback["error"], "HTTP request failed with status 503");
        assert!(fallback["note"].as_str().unwrap().contains("last stored record"));
        assert!(fallback["attemptedAt"].as_str().is_some());
        // Everything except the annotation equals the prior record.
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn fallback_without_prior_record_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::open(dir.path()).await.unwrap();

        let outcome = store.persist_fallback("ambon", "boom").await.unwrap();
        assert_eq!(outcome, FallbackOutcome::NoPriorRecord);
        assert!(!dir.path().join("ambon.json").exists());
    }

    #[tokio::test]
    async fn index_mirrors_the_registry_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeatherStore::open(dir.path()).await.unwrap();

        let locations = default_locations();
        let path = store.write_index(&locations).await.unwrap();
        assert_eq!(path, dir.path().join(INDEX_FILE));

        let bytes = std::fs::read(path).unwrap();
        let entries: Vec<IndexEntry> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entries.len(), locations.len());
        assert_eq!(entries[0].id, "ambon");
        assert_eq!(entries[0].name, "Ambon");
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<&str> = locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn open_fails_when_store_path_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("api");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let error = WeatherStore::open(&blocker).await.unwrap_err();
        assert!(matches!(error, StoreError::DirCreation(..)));
    }
}
