//! Radio-access (RIC) backend adapters

pub mod i2cat_ric;
pub mod wire;

pub use i2cat_ric::{CellScope, RicAdapter, RicConfig};
