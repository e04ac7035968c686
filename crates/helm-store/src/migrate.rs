use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use helm_core::SCHEMA_VERSION;

use crate::store::StoreError;

// Upgrades a raw snapshot blob in place. Returns true when the blob changed
// and should be written back. Version 0 is the unversioned blob written by
// pre-1.0 builds: camelCase keys, epoch-millisecond timestamps and
// clock-derived string ids.
pub fn upgrade_snapshot_value(value: &mut Value) -> Result<bool, StoreError> {
    let version = value
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if version > u64::from(SCHEMA_VERSION) {
        return Err(StoreError::UnsupportedSchema(version));
    }
    if version == u64::from(SCHEMA_VERSION) {
        return Ok(false);
    }

    upgrade_from_legacy(value);
    value["schema_version"] = json!(SCHEMA_VERSION);
    Ok(true)
}

fn upgrade_from_legacy(value: &mut Value) {
    let Some(root) = value.as_object_mut() else {
        return;
    };

    rename_key(root, "chatHistory", "chat_history");
    rename_key(root, "selectedProvider", "selected_provider");

    let mut provider_ids = HashMap::new();
    if let Some(providers) = root.get_mut("providers").and_then(Value::as_array_mut) {
        for provider in providers.iter_mut().filter_map(Value::as_object_mut) {
            rename_key(provider, "type", "kind");
            rename_key(provider, "apiKey", "api_key");
            rename_key(provider, "color", "accent_color");
            remap_id(provider, "id", &mut provider_ids);
        }
    }

    if let Some(entries) = root.get_mut("knowledge").and_then(Value::as_array_mut) {
        let mut entry_ids = HashMap::new();
        for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
            remap_id(entry, "id", &mut entry_ids);
            normalize_timestamp(entry, "timestamp", "created_at");
        }
    }

    if let Some(messages) = root.get_mut("chat_history").and_then(Value::as_array_mut) {
        let mut message_ids = HashMap::new();
        for message in messages.iter_mut().filter_map(Value::as_object_mut) {
            rename_key(message, "providerId", "provider_id");
            remap_id(message, "id", &mut message_ids);
            remap_id(message, "provider_id", &mut provider_ids);
            normalize_timestamp(message, "timestamp", "created_at");
        }
    }

    if let Some(selected) = root.get("selected_provider").and_then(Value::as_str) {
        if let Some(mapped) = provider_ids.get(selected) {
            root.insert("selected_provider".to_owned(), json!(mapped));
        } else if Uuid::parse_str(selected).is_err() {
            root.insert("selected_provider".to_owned(), Value::Null);
        }
    }
}

fn rename_key(object: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = object.remove(from) {
        object.entry(to.to_owned()).or_insert(value);
    }
}

// Legacy ids were stringified clock ticks; anything that is not already a
// uuid gets a fresh one, consistently across references.
fn remap_id(object: &mut Map<String, Value>, key: &str, seen: &mut HashMap<String, Uuid>) {
    let Some(raw) = object.get(key).and_then(Value::as_str).map(ToOwned::to_owned) else {
        return;
    };
    if Uuid::parse_str(&raw).is_ok() {
        return;
    }
    let mapped = *seen.entry(raw).or_insert_with(Uuid::new_v4);
    object.insert(key.to_owned(), json!(mapped));
}

fn normalize_timestamp(object: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(millis) = object.get(from).and_then(Value::as_i64) {
        object.remove(from);
        if let Some(timestamp) = DateTime::<Utc>::from_timestamp_millis(millis) {
            object.insert(to.to_owned(), json!(timestamp.to_rfc3339()));
        }
    } else {
        rename_key(object, from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_core::WorkspaceSnapshot;

    fn legacy_blob() -> Value {
        json!({
            "providers": [
                {
                    "id": "1",
                    "name": "OpenAI GPT-4",
                    "type": "openai",
                    "apiKey": "sk-test",
                    "enabled": true,
                    "color": "#10A37F",
                    "icon": "🤖"
                }
            ],
            "knowledge": [
                {
                    "id": "1700000000000",
                    "content": "locked fact",
                    "tags": ["chat", "openai"],
                    "source": "OpenAI GPT-4",
                    "timestamp": 1700000000000_i64,
                    "locked": true
                }
            ],
            "chatHistory": [
                {
                    "id": "1700000000001",
                    "providerId": "1",
                    "content": "Hello",
                    "timestamp": 1700000000001_i64,
                    "role": "user"
                }
            ],
            "selectedProvider": "1"
        })
    }

    #[test]
    fn legacy_blob_upgrades_to_current_shape() {
        let mut value = legacy_blob();
        assert!(upgrade_snapshot_value(&mut value).expect("upgrade"));

        let snapshot: WorkspaceSnapshot =
            serde_json::from_value(value).expect("parse upgraded blob");
        assert_eq!(snapshot.schema_version, SCHEMA_VERSION);
        assert_eq!(snapshot.providers.len(), 1);
        assert_eq!(snapshot.providers[0].api_key, "sk-test");
        assert_eq!(snapshot.knowledge.len(), 1);
        assert!(snapshot.knowledge[0].locked);
        assert_eq!(snapshot.chat_history.len(), 1);
        assert_eq!(snapshot.chat_history[0].content, "Hello");
    }

    #[test]
    fn legacy_references_stay_consistent_after_id_remap() {
        let mut value = legacy_blob();
        upgrade_snapshot_value(&mut value).expect("upgrade");

        let snapshot: WorkspaceSnapshot =
            serde_json::from_value(value).expect("parse upgraded blob");
        let provider_id = snapshot.providers[0].id;
        assert_eq!(snapshot.chat_history[0].provider_id, provider_id);
        assert_eq!(snapshot.selected_provider, Some(provider_id));
    }

    #[test]
    fn current_blob_is_untouched() {
        let mut value =
            serde_json::to_value(WorkspaceSnapshot::seeded()).expect("serialize snapshot");
        let before = value.clone();
        assert!(!upgrade_snapshot_value(&mut value).expect("upgrade"));
        assert_eq!(value, before);
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let mut value = json!({ "schema_version": SCHEMA_VERSION + 1 });
        let error = upgrade_snapshot_value(&mut value).expect_err("future version must fail");
        assert!(matches!(error, StoreError::UnsupportedSchema(_)));
    }

    #[test]
    fn selected_provider_pointing_nowhere_becomes_null() {
        let mut value = json!({
            "providers": [],
            "knowledge": [],
            "chatHistory": [],
            "selectedProvider": "42"
        });
        upgrade_snapshot_value(&mut value).expect("upgrade");
        assert!(value["selected_provider"].is_null());
    }
}
