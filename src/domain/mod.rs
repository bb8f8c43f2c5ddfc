//! Equipment business rules, the form engine and list derivation

pub mod entity;
pub mod form;
pub mod listing;

pub use entity::{EquipmentEntity, FormViolation, ValidationResult};
pub use form::{EquipmentForm, FieldState, InputRejected, SubmitRejected, Submission};
pub use listing::{derive_view, FilterCriteria, InventoryStats, ListView, Segment};
