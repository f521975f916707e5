//! Data models for the equipment server

pub mod equipment;

pub use equipment::{merge, Equipment, EquipmentInput, NewEquipment};
