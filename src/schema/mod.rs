//! Canonical schema: backend-agnostic request/response models
//!
//! These are the CAMARA-shaped value objects callers exchange with the
//! adapters. Pure data plus validation; no I/O. Adapters never retain them
//! beyond the call.

pub mod device;
pub mod edge;
pub mod location;
pub mod qod;
pub mod traffic_influence;

pub use device::{ApplicationServer, Device, DeviceIpv4Addr, PortRange, PortsSpec};
pub use edge::{
    AppInstanceInfo, AppInstanceStatus, AppManifest, CpuArchType, EdgeCloudZone, Flavour,
    SubmittedApp, ZoneRegisteredData,
};
pub use location::{Area, Location, Point, RetrievalLocationRequest};
pub use qod::{CreateSession, QosStatus, SessionInfo, StatusInfo};
pub use traffic_influence::TrafficInfluence;
