//! Common types.

pub mod capabilities;
pub mod gatt;
pub mod security;
pub mod uuid;
