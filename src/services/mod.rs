//! Business logic services

pub mod equipment;

pub use equipment::EquipmentService;
