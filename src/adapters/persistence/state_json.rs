//! Implements ReminderStatePort using a JSON file.
//!
//! One record per profile scope: reminder-enabled flag, notified classes and
//! the last schedule snapshot. Shared by every client instance on the machine;
//! last write wins.

use crate::domain::{ClassId, DomainError};
use crate::ports::ReminderStatePort;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Reminder state of one profile scope.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct ScopeState {
    #[serde(default)]
    enabled: bool,
    /// class id → occurrence date it was notified for. One entry per class identity.
    #[serde(default)]
    notified: BTreeMap<ClassId, NaiveDate>,
    #[serde(default)]
    snapshot: Option<String>,
    /// Offline fallback for the week view.
    #[serde(default)]
    cached_week: Option<String>,
}

/// scope key → state
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateData {
    #[serde(default)]
    scopes: HashMap<String, ScopeState>,
}

/// JSON file-based reminder state. Without a path it keeps state in memory only.
pub struct JsonReminderStore {
    path: Option<PathBuf>,
    cache: tokio::sync::RwLock<StateData>,
}

impl JsonReminderStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            cache: tokio::sync::RwLock::new(StateData::default()),
        }
    }

    /// Store that never touches disk.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            cache: tokio::sync::RwLock::new(StateData::default()),
        }
    }

    /// Load state from disk. A missing or corrupt file starts empty.
    pub async fn load(&self) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = match fs::read_to_string(path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "reminder state unreadable; starting empty");
                StateData::default()
            }),
            Err(_) => StateData::default(),
        };
        *self.cache.write().await = data;
        Ok(())
    }

    /// Atomic save using write-replace: temp file, sync_all, rename.
    async fn save(&self) -> Result<(), DomainError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = {
            let data = self.cache.read().await;
            serde_json::to_string_pretty(&*data).map_err(|e| DomainError::State(e.to_string()))?
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::State(format!("create state dir: {}", e)))?;
        }

        let temp_path = path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::State(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::State(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::State(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| DomainError::State(format!("atomic rename failed: {}", e)))?;
        debug!(path = %path.display(), "reminder state saved");
        Ok(())
    }

    /// Mutates one scope, then persists.
    async fn update<F, T>(&self, scope: &str, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut ScopeState) -> T + Send,
    {
        let out = {
            let mut cache = self.cache.write().await;
            f(cache.scopes.entry(scope.to_string()).or_default())
        };
        self.save().await?;
        Ok(out)
    }

    async fn read<F, T>(&self, scope: &str, f: F) -> T
    where
        F: FnOnce(Option<&ScopeState>) -> T + Send,
    {
        let cache = self.cache.read().await;
        f(cache.scopes.get(scope))
    }
}

#[async_trait::async_trait]
impl ReminderStatePort for JsonReminderStore {
    async fn is_enabled(&self, scope: &str) -> Result<bool, DomainError> {
        Ok(self.read(scope, |s| s.is_some_and(|s| s.enabled)).await)
    }

    async fn set_enabled(&self, scope: &str, enabled: bool) -> Result<(), DomainError> {
        self.update(scope, |s| s.enabled = enabled).await
    }

    async fn notified_on(
        &self,
        scope: &str,
        class_id: &ClassId,
    ) -> Result<Option<NaiveDate>, DomainError> {
        Ok(self
            .read(scope, |s| s.and_then(|s| s.notified.get(class_id).copied()))
            .await)
    }

    async fn mark_notified(
        &self,
        scope: &str,
        class_id: &ClassId,
        occurrence: NaiveDate,
    ) -> Result<(), DomainError> {
        let class_id = class_id.clone();
        self.update(scope, move |s| {
            s.notified.insert(class_id, occurrence);
        })
        .await
    }

    async fn prune_notified(&self, scope: &str, before: NaiveDate) -> Result<usize, DomainError> {
        let stale = self
            .read(scope, |s| {
                s.map(|s| s.notified.values().filter(|d| **d < before).count())
                    .unwrap_or(0)
            })
            .await;
        if stale == 0 {
            return Ok(0);
        }
        self.update(scope, |s| {
            s.notified.retain(|_, d| *d >= before);
            stale
        })
        .await
    }

    async fn clear_notified(&self, scope: &str) -> Result<(), DomainError> {
        self.update(scope, |s| s.notified.clear()).await
    }

    async fn load_snapshot(&self, scope: &str) -> Result<Option<String>, DomainError> {
        Ok(self
            .read(scope, |s| s.and_then(|s| s.snapshot.clone()))
            .await)
    }

    async fn save_snapshot(&self, scope: &str, snapshot: &str) -> Result<(), DomainError> {
        let snapshot = snapshot.to_string();
        self.update(scope, move |s| s.snapshot = Some(snapshot)).await
    }

    async fn load_cached_week(&self, scope: &str) -> Result<Option<String>, DomainError> {
        Ok(self
            .read(scope, |s| s.and_then(|s| s.cached_week.clone()))
            .await)
    }

    async fn save_cached_week(&self, scope: &str, week: &str) -> Result<(), DomainError> {
        let week = week.to_string();
        self.update(scope, move |s| s.cached_week = Some(week)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Day, TimeRange};

    fn class_id(subject: &str) -> ClassId {
        ClassId::new(
            Day::Monday,
            &TimeRange::parse("09:00-09:50").unwrap(),
            subject,
            "A-101",
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");

        let store = JsonReminderStore::new(&path);
        store.load().await.unwrap();
        store.set_enabled("CSE|Second|A", true).await.unwrap();
        store
            .mark_notified("CSE|Second|A", &class_id("DBMS"), date("2026-10-19"))
            .await
            .unwrap();
        store.save_snapshot("CSE|Second|A", "{}").await.unwrap();
        store.save_cached_week("CSE|Second|A", "{\"Monday\":[]}").await.unwrap();

        let reloaded = JsonReminderStore::new(&path);
        reloaded.load().await.unwrap();
        assert!(reloaded.is_enabled("CSE|Second|A").await.unwrap());
        assert_eq!(
            reloaded
                .notified_on("CSE|Second|A", &class_id("DBMS"))
                .await
                .unwrap(),
            Some(date("2026-10-19"))
        );
        assert_eq!(
            reloaded.load_snapshot("CSE|Second|A").await.unwrap().as_deref(),
            Some("{}")
        );
        assert_eq!(
            reloaded.load_cached_week("CSE|Second|A").await.unwrap().as_deref(),
            Some("{\"Monday\":[]}")
        );
        // Other scopes are untouched.
        assert!(!reloaded.is_enabled("CSE|Second|B").await.unwrap());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_prune_and_clear() {
        let store = JsonReminderStore::ephemeral();
        let scope = "MCA|First|1";
        store
            .mark_notified(scope, &class_id("Old"), date("2026-10-01"))
            .await
            .unwrap();
        store
            .mark_notified(scope, &class_id("New"), date("2026-10-19"))
            .await
            .unwrap();

        assert_eq!(store.prune_notified(scope, date("2026-10-12")).await.unwrap(), 1);
        assert_eq!(store.notified_on(scope, &class_id("Old")).await.unwrap(), None);
        assert!(store.notified_on(scope, &class_id("New")).await.unwrap().is_some());
        assert_eq!(store.prune_notified(scope, date("2026-10-12")).await.unwrap(), 0);

        store.clear_notified(scope).await.unwrap();
        assert_eq!(store.notified_on(scope, &class_id("New")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let store = JsonReminderStore::new(&path);
        store.load().await.unwrap();
        assert!(!store.is_enabled("x").await.unwrap());
    }
}
