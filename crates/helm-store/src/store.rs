use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use helm_core::WorkspaceSnapshot;

use crate::migrate::upgrade_snapshot_value;
use crate::migrations::MIGRATIONS;

pub const SNAPSHOT_KEY: &str = "workspace";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot schema version {0} is newer than this build supports")]
    UnsupportedSchema(u64),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct HelmStore {
    conn: Mutex<Connection>,
}

impl HelmStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        for sql in MIGRATIONS {
            conn.execute(sql, [])?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn load_snapshot(&self) -> Result<Option<WorkspaceSnapshot>, StoreError> {
        let Some(raw) = self.get_raw(SNAPSHOT_KEY)? else {
            return Ok(None);
        };

        let mut value: serde_json::Value = serde_json::from_str(&raw)?;
        if upgrade_snapshot_value(&mut value)? {
            self.put_raw(SNAPSHOT_KEY, &serde_json::to_string(&value)?)?;
        }

        Ok(Some(serde_json::from_value(value)?))
    }

    pub fn load_snapshot_or_seed(&self) -> Result<WorkspaceSnapshot, StoreError> {
        match self.load_snapshot()? {
            Some(snapshot) => Ok(snapshot),
            None => {
                let snapshot = WorkspaceSnapshot::seeded();
                self.save_snapshot(&snapshot)?;
                Ok(snapshot)
            }
        }
    }

    pub fn save_snapshot(&self, snapshot: &WorkspaceSnapshot) -> Result<(), StoreError> {
        self.put_raw(SNAPSHOT_KEY, &serde_json::to_string(snapshot)?)
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value_json FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_raw(&self, key: &str, value_json: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO snapshots (key, value_json) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
            params![key, value_json],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_core::{ChatMessage, KnowledgeEntry, SCHEMA_VERSION};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn first_load_seeds_default_providers() {
        let dir = tempdir().expect("tempdir");
        let store = HelmStore::open(dir.path().join("helm.sqlite3")).expect("open store");

        let snapshot = store.load_snapshot_or_seed().expect("seed snapshot");
        assert_eq!(snapshot.providers.len(), 4);
        assert!(snapshot.knowledge.is_empty());
        assert!(snapshot.chat_history.is_empty());

        let reloaded = store
            .load_snapshot()
            .expect("reload snapshot")
            .expect("snapshot present after seed");
        assert_eq!(reloaded, snapshot);
    }

    #[test]
    fn snapshot_roundtrip_preserves_collections() {
        let dir = tempdir().expect("tempdir");
        let store = HelmStore::open(dir.path().join("helm.sqlite3")).expect("open store");

        let mut snapshot = store.load_snapshot_or_seed().expect("seed snapshot");
        let provider_id = snapshot.providers[0].id;
        snapshot.chat_history.push(ChatMessage::user(provider_id, "Hello"));
        snapshot.knowledge.push(KnowledgeEntry::locked(
            "fact",
            vec!["chat".to_owned()],
            "OpenAI GPT-4",
        ));
        snapshot.selected_provider = Some(provider_id);
        store.save_snapshot(&snapshot).expect("save snapshot");

        let reloaded = store
            .load_snapshot()
            .expect("reload snapshot")
            .expect("snapshot present");
        assert_eq!(reloaded, snapshot);
    }

    #[test]
    fn reopening_the_same_file_keeps_state() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("helm.sqlite3");

        let first = HelmStore::open(&path).expect("open store");
        let snapshot = first.load_snapshot_or_seed().expect("seed snapshot");
        drop(first);

        let second = HelmStore::open(&path).expect("reopen store");
        let reloaded = second
            .load_snapshot()
            .expect("load snapshot")
            .expect("snapshot persisted across reopen");
        assert_eq!(reloaded.providers, snapshot.providers);
    }

    #[test]
    fn legacy_blob_is_migrated_and_written_back() {
        let dir = tempdir().expect("tempdir");
        let store = HelmStore::open(dir.path().join("helm.sqlite3")).expect("open store");

        let legacy = json!({
            "providers": [{
                "id": "1",
                "name": "OpenAI GPT-4",
                "type": "openai",
                "apiKey": "",
                "enabled": false,
                "color": "#10A37F",
                "icon": "🤖"
            }],
            "knowledge": [],
            "chatHistory": [],
            "selectedProvider": null
        });
        store
            .put_raw(SNAPSHOT_KEY, &legacy.to_string())
            .expect("write legacy blob");

        let snapshot = store
            .load_snapshot()
            .expect("load legacy snapshot")
            .expect("snapshot present");
        assert_eq!(snapshot.schema_version, SCHEMA_VERSION);
        assert_eq!(snapshot.providers.len(), 1);
        assert_eq!(snapshot.providers[0].name, "OpenAI GPT-4");

        let raw = store
            .get_raw(SNAPSHOT_KEY)
            .expect("read raw blob")
            .expect("raw blob present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse raw blob");
        assert_eq!(value["schema_version"], json!(SCHEMA_VERSION));
    }

    #[test]
    fn future_schema_version_fails_loudly() {
        let dir = tempdir().expect("tempdir");
        let store = HelmStore::open(dir.path().join("helm.sqlite3")).expect("open store");

        let future = json!({ "schema_version": SCHEMA_VERSION + 1 });
        store
            .put_raw(SNAPSHOT_KEY, &future.to_string())
            .expect("write future blob");

        let error = store.load_snapshot().expect_err("future blob must fail");
        assert!(matches!(error, StoreError::UnsupportedSchema(_)));
    }
}
