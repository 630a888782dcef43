//! Edge-orchestration backend adapters
//!
//! - i2Edge: artefact/app/instance REST dialect, flavour-based placement
//! - aerOS: NGSI-LD continuum queries plus TOSCA deployments via the HLO

pub mod aeros;
pub mod convert;
pub mod i2edge;

pub use aeros::{AerosAdapter, AerosConfig};
pub use convert::{aggregate_zone, InfrastructureElement};
pub use i2edge::{I2EdgeAdapter, I2EdgeConfig};
