//! Equipment inventory client core
//!
//! Typed equipment records with schema validation of backend payloads,
//! lifecycle rules, an interactive form engine and list derivation
//! (filter, search, sort, statistics), on top of a pluggable transport.

pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod services;
pub mod transport;

pub use config::AppConfig;
pub use domain::{EquipmentEntity, EquipmentForm, FilterCriteria};
pub use error::{AppError, AppResult};
pub use services::EquipmentService;
