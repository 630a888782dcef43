//! Core-network (NEF) backend adapters
//!
//! One adapter per 5G core family, all built on the shared NEF engine:
//! - Open5GS: QoD + location retrieval
//! - OAI: QoD + traffic influence
//! - Open5GCore: QoD
//! - CoreSim: QoD + traffic influence + location retrieval

pub mod coresim;
pub mod nef;
pub mod oai;
pub mod open5gcore;
pub mod open5gs;
pub mod wire;

pub use coresim::CoresimAdapter;
pub use nef::{NefAdapter, NefCore};
pub use oai::OaiAdapter;
pub use open5gcore::Open5gcoreAdapter;
pub use open5gs::Open5gsAdapter;
