//! Capability registry
//!
//! Each adapter declares the fixed set of canonical operations it supports
//! at construction time. Every canonical entry point runs the guard before
//! building payloads or touching the transport, so unsupported operations
//! fail fast with zero network I/O.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical operation groups an adapter can support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Quality-on-Demand session management
    Qod,
    /// Traffic influence resource management
    TrafficInfluence,
    /// Device location retrieval
    LocationRetrieval,
    /// Edge application onboarding and deployment
    AppManagement,
    /// Edge zone discovery and capability reporting
    ZoneInformation,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Qod => write!(f, "qod"),
            Capability::TrafficInfluence => write!(f, "traffic_influence"),
            Capability::LocationRetrieval => write!(f, "location_retrieval"),
            Capability::AppManagement => write!(f, "app_management"),
            Capability::ZoneInformation => write!(f, "zone_information"),
        }
    }
}

/// Guard: check `required` against an adapter's declared set.
///
/// Synchronous and side-effect free; must run before any transformation
/// or network call in every canonical operation.
pub fn ensure(adapter: &str, declared: &[Capability], required: Capability) -> Result<()> {
    if declared.contains(&required) {
        Ok(())
    } else {
        Err(Error::unsupported(required, adapter))
    }
}
