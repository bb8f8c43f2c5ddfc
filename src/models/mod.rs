//! Data models for the equipment inventory

pub mod enums;
pub mod equipment;
pub mod schema;

// Re-export commonly used types
pub use enums::{EquipmentCategory, EquipmentStatus};
pub use equipment::{EquipmentDraft, EquipmentField, EquipmentRecord, NewEquipment, UpdateEquipment};
pub use schema::{parse_record, parse_records};
