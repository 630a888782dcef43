//! CAMARA Adapters - Unified Backend Translation Layer
//!
//! A single caller-facing API (CAMARA Quality-on-Demand, Traffic Influence,
//! Device Location, edge application lifecycle) served by heterogeneous
//! backend platforms, each with its own REST dialect, field names and
//! semantics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Canonical Operations                          │
//! │     QoD sessions · Traffic influence · Location · Edge apps/zones   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │   Factory ──▶ capability guard ──▶ validate ──▶ transform ──▶ HTTP  │
//! ├───────────────────────┬──────────────────┬──────────────────────────┤
//! │    Network (NEF)      │   Radio access   │       Edge cloud         │
//! │  ┌──────┐ ┌─────┐     │  ┌───────────┐   │  ┌────────┐ ┌───────┐    │
//! │  │open5gs│ │ oai │ …  │  │ i2CAT RIC │   │  │ i2Edge │ │ aerOS │    │
//! │  └──────┘ └─────┘     │  └───────────┘   │  └────────┘ └───────┘    │
//! └───────────────────────┴──────────────────┴──────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`schema`]: canonical request/response models and validation
//! - [`domain`]: capability registry and adapter ports
//! - [`network`], [`oran`], [`edge`]: per-backend adapters
//! - [`codec`]: reversible identifier encoding for restricted alphabets
//! - [`factory`]: (domain, backend) → adapter resolution
//! - [`transport`]: HTTP port and status translation
//! - [`api`]: REST facade over the canonical operations
//! - [`error`]: canonical error taxonomy

pub mod api;
pub mod codec;
pub mod domain;
pub mod edge;
pub mod error;
pub mod factory;
pub mod network;
pub mod oran;
pub mod schema;
pub mod transport;

// Re-export commonly used types
pub use api::{ApiServer, ApiServerConfig, AppState};
pub use domain::capability::Capability;
pub use domain::ports::{
    EdgeCloudAdapter, EdgeCloudAdapterRef, NetworkAdapter, NetworkAdapterRef,
};
pub use error::{Error, Result};
pub use factory::{AdapterFactory, AdapterHandle, AdapterParams, Domain};
pub use schema::{
    AppInstanceInfo, AppManifest, ApplicationServer, Area, CreateSession, Device, DeviceIpv4Addr,
    EdgeCloudZone, Location, Point, QosStatus, RetrievalLocationRequest, SessionInfo,
    TrafficInfluence, ZoneRegisteredData,
};
pub use transport::{HttpTransport, ReqwestTransport, TransportRef};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
