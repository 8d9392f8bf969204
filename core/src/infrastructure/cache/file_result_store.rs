use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    analysis::{entities::CacheEntry, fingerprint::is_fingerprint, ports::ResultStore},
    common::{CacheConfig, StageSettings, generate_uuid_v7},
};

/// Result store backed by one JSON file per fingerprint.
///
/// Entries are written to a uniquely named sibling file and renamed into
/// place, so readers observe either the old or the new entry.
#[derive(Debug, Clone)]
pub struct FsResultStore {
    dir: PathBuf,
    ttl: Duration,
    schema_version: String,
}

impl FsResultStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, schema_version: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            schema_version: schema_version.into(),
        }
    }

    pub fn for_stage(cache: &CacheConfig, stage: &StageSettings) -> Self {
        Self::new(
            stage.cache_dir(&cache.root_dir),
            cache.ttl,
            stage.schema_version.clone(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let age = Utc::now().signed_duration_since(entry.stored_at);
        match age.to_std() {
            Ok(age) => age <= self.ttl,
            // stored in the future: clock skew, treat as fresh
            Err(_) => true,
        }
    }

    async fn discard(&self, path: &Path, reason: &str) {
        debug!(path = %path.display(), reason, "Discarding cache entry");
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
            }
        }
    }

    async fn write_entry(&self, fingerprint: &str, payload: &Value) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let entry = CacheEntry::new(fingerprint, payload.clone(), &self.schema_version);
        let body = serde_json::to_vec_pretty(&entry)?;

        let final_path = self.entry_path(fingerprint);
        let tmp_path = self
            .dir
            .join(format!("{fingerprint}.json.{}.tmp", generate_uuid_v7()));

        if let Err(e) = tokio::fs::write(&tmp_path, &body).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

impl ResultStore for FsResultStore {
    async fn get(&self, fingerprint: &str) -> Option<Value> {
        if !is_fingerprint(fingerprint) {
            warn!(fingerprint, "Rejected malformed cache key");
            return None;
        }

        let path = self.entry_path(fingerprint);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let entry = match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache entry");
                self.discard(&path, "corrupt").await;
                return None;
            }
        };

        if !entry.result.is_object() {
            warn!(path = %path.display(), "Cache entry holds no result object");
            self.discard(&path, "corrupt").await;
            return None;
        }

        if entry.schema_version != self.schema_version {
            self.discard(&path, "schema version mismatch").await;
            return None;
        }

        if !self.is_fresh(&entry) {
            self.discard(&path, "expired").await;
            return None;
        }

        debug!(fingerprint, "Cache hit");
        Some(entry.result)
    }

    async fn put(&self, fingerprint: &str, payload: &Value) {
        if !is_fingerprint(fingerprint) {
            warn!(fingerprint, "Refusing to cache under malformed key");
            return;
        }

        match self.write_entry(fingerprint, payload).await {
            Ok(()) => debug!(fingerprint, dir = %self.dir.display(), "Cached result"),
            Err(e) => warn!(fingerprint, error = %e, "Failed to write cache entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::fingerprint::fingerprint_bytes;
    use serde_json::json;
    use tempfile::tempdir;

    fn store(dir: &Path) -> FsResultStore {
        FsResultStore::new(dir, Duration::from_secs(60), "1.0")
    }

    #[tokio::test]
    async fn test_put_then_get_returns_payload() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = fingerprint_bytes(b"image");
        let payload = json!({"productName": "Oat Milk", "confidence": 90});

        assert!(store.get(&key).await.is_none());
        store.put(&key, &payload).await;
        assert_eq!(store.get(&key).await, Some(payload));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_put_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = store(&dir.path().join("health"));
        let key = fingerprint_bytes(b"nested");

        store.put(&key, &json!({"safetyScore": 40})).await;
        assert!(dir.path().join("health").join(format!("{key}.json")).exists());
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_removed() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = fingerprint_bytes(b"old");
        let path = dir.path().join(format!("{key}.json"));

        let stale = json!({
            "storedAt": (Utc::now() - chrono::Duration::hours(2)).to_rfc3339(),
            "result": {"productName": "Old"},
            "schemaVersion": "1.0"
        });
        std::fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

        assert!(store.get(&key).await.is_none());
        assert!(!path.exists());

        store.put(&key, &json!({"productName": "New"})).await;
        assert_eq!(store.get(&key).await, Some(json!({"productName": "New"})));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_absent_and_removed() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = fingerprint_bytes(b"corrupt");
        let path = dir.path().join(format!("{key}.json"));

        std::fs::write(&path, b"{not json").unwrap();
        assert!(store.get(&key).await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_envelope_missing_fields_is_absent() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = fingerprint_bytes(b"partial");
        let path = dir.path().join(format!("{key}.json"));

        std::fs::write(&path, br#"{"result": {"a": 1}}"#).unwrap();
        assert!(store.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_envelope_without_result_object_is_absent_and_removed() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = fingerprint_bytes(b"null result");
        let path = dir.path().join(format!("{key}.json"));

        let envelope = json!({
            "storedAt": Utc::now().to_rfc3339(),
            "result": null,
            "schemaVersion": "1.0"
        });
        std::fs::write(&path, serde_json::to_vec(&envelope).unwrap()).unwrap();

        assert!(store.get(&key).await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_schema_version_mismatch_is_absent() {
        let dir = tempdir().unwrap();
        let key = fingerprint_bytes(b"versioned");

        store(dir.path()).put(&key, &json!({"a": 1})).await;

        let newer = FsResultStore::new(dir.path(), Duration::from_secs(60), "2.0");
        assert!(newer.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_key_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        store.put("../escape", &json!({"a": 1})).await;
        assert!(store.get("../escape").await.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_for_stage_uses_namespace() {
        let cache = CacheConfig {
            root_dir: PathBuf::from("/var/cache/app"),
            ttl: Duration::from_secs(10),
        };
        let health = FsResultStore::for_stage(&cache, &StageSettings::health_analysis());
        assert_eq!(health.dir(), Path::new("/var/cache/app/health"));

        let food = FsResultStore::for_stage(&cache, &StageSettings::food_extraction());
        assert_eq!(food.dir(), Path::new("/var/cache/app"));
    }
}
