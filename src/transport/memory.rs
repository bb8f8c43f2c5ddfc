//! In-process transport holding records as raw JSON
//!
//! Stored values are not validated, so a seeded collection can contain
//! payloads the schema rejects.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{create_body, update_body, EquipmentTransport};
use crate::{
    error::{AppError, AppResult},
    models::{NewEquipment, UpdateEquipment},
};

/// Keys an update never overwrites
const IMMUTABLE_KEYS: [&str; 2] = ["id", "createdAt"];

#[derive(Debug, Default)]
pub struct MemoryTransport {
    records: RwLock<IndexMap<String, Value>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw payloads, keyed by their `id` field.
    /// Values without a string id get a generated one.
    pub fn seeded(values: impl IntoIterator<Item = Value>) -> Self {
        let records = values
            .into_iter()
            .map(|mut value| {
                let id = match value.get("id").and_then(Value::as_str) {
                    Some(id) => id.to_string(),
                    None => {
                        let id = Uuid::new_v4().to_string();
                        if let Value::Object(map) = &mut value {
                            map.insert("id".to_string(), Value::String(id.clone()));
                        }
                        id
                    }
                };
                (id, value)
            })
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn not_found(id: &str) -> AppError {
        AppError::NotFound(format!("Equipment {}", id))
    }
}

/// JSON merge: `null` removes a key, anything else replaces it
fn merge(target: &mut Value, patch: Value) {
    let (Value::Object(target), Value::Object(patch)) = (target, patch) else {
        return;
    };
    for (key, value) in patch {
        if IMMUTABLE_KEYS.contains(&key.as_str()) {
            continue;
        }
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
}

#[async_trait]
impl EquipmentTransport for MemoryTransport {
    async fn fetch_all(&self) -> AppResult<Value> {
        let records = self.records.read().await;
        Ok(Value::Array(records.values().cloned().collect()))
    }

    async fn fetch_by_id(&self, id: &str) -> AppResult<Value> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, data: &NewEquipment) -> AppResult<Value> {
        let mut body = create_body(data)?;
        let id = Uuid::new_v4().to_string();
        if let Value::Object(map) = &mut body {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        self.records.write().await.insert(id, body.clone());
        Ok(body)
    }

    async fn update(&self, id: &str, changes: &UpdateEquipment) -> AppResult<Value> {
        let patch = update_body(changes)?;
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        merge(record, patch);
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        self.records
            .write()
            .await
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}
