//! Core domain types: capabilities and adapter ports

pub mod capability;
pub mod ports;

pub use capability::Capability;
pub use ports::*;
