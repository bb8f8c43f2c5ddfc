//! Backend access for equipment records
//!
//! Transports return raw JSON. Payloads are checked against the record
//! schema by the service layer, never here.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{NewEquipment, UpdateEquipment},
};

pub use http::HttpTransport;
pub use memory::MemoryTransport;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentTransport: Send + Sync {
    /// All records, as a JSON array
    async fn fetch_all(&self) -> AppResult<Value>;

    async fn fetch_by_id(&self, id: &str) -> AppResult<Value>;

    /// Create a record; the backend assigns the id
    async fn create(&self, data: &NewEquipment) -> AppResult<Value>;

    /// Apply a partial update and return the stored record
    async fn update(&self, id: &str, changes: &UpdateEquipment) -> AppResult<Value>;

    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// Current time as stored in `createdAt` / `updatedAt`
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Body for a create request, stamped with creation times
pub(crate) fn create_body(data: &NewEquipment) -> AppResult<Value> {
    let mut body = serde_json::to_value(data)?;
    let now = timestamp();
    if let Value::Object(map) = &mut body {
        map.insert("createdAt".to_string(), Value::String(now.clone()));
        map.insert("updatedAt".to_string(), Value::String(now));
    }
    Ok(body)
}

/// Body for a partial update, stamped with the update time
pub(crate) fn update_body(changes: &UpdateEquipment) -> AppResult<Value> {
    let mut body = serde_json::to_value(changes)?;
    if let Value::Object(map) = &mut body {
        map.insert("updatedAt".to_string(), Value::String(timestamp()));
    }
    Ok(body)
}
