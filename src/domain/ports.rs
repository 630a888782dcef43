//! Domain ports: adapter trait definitions
//!
//! These traits are the caller-visible contract: canonical objects in,
//! canonical objects or canonical errors out. Every backend implements a
//! subset of the operations; the rest are rejected by the capability guard
//! before any network I/O.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::capability::Capability;
use crate::error::Result;
use crate::schema::edge::{
    AppInstanceInfo, AppManifest, EdgeCloudZone, SubmittedApp, ZoneRegisteredData,
};
use crate::schema::location::{Location, RetrievalLocationRequest};
use crate::schema::qod::{CreateSession, SessionInfo};
use crate::schema::traffic_influence::TrafficInfluence;

// =============================================================================
// Network Port (network + radio-access domains)
// =============================================================================

/// Port for network-side canonical operations (QoD sessions, traffic
/// influence, location retrieval).
///
/// Implemented by the NEF core family and, for the QoD verbs, by the RIC
/// adapter. Unsupported operations return `CapabilityNotSupported`.
#[async_trait]
pub trait NetworkAdapter: Send + Sync {
    /// Backend name, used in errors and logs
    fn backend_name(&self) -> &'static str;

    /// Declared canonical capabilities
    fn capabilities(&self) -> &'static [Capability];

    // --- Quality on Demand -------------------------------------------------

    async fn create_qod_session(&self, request: &CreateSession) -> Result<SessionInfo>;

    async fn get_qod_session(&self, session_id: &str) -> Result<SessionInfo>;

    async fn delete_qod_session(&self, session_id: &str) -> Result<()>;

    // --- Traffic Influence -------------------------------------------------

    async fn create_traffic_influence(
        &self,
        request: &TrafficInfluence,
    ) -> Result<TrafficInfluence>;

    async fn get_traffic_influence(&self, resource_id: &str) -> Result<TrafficInfluence>;

    /// Full replace of an existing resource
    async fn update_traffic_influence(
        &self,
        resource_id: &str,
        request: &TrafficInfluence,
    ) -> Result<TrafficInfluence>;

    async fn list_traffic_influence(&self) -> Result<Vec<TrafficInfluence>>;

    async fn delete_traffic_influence(&self, resource_id: &str) -> Result<()>;

    // --- Location ----------------------------------------------------------

    async fn retrieve_location(&self, request: &RetrievalLocationRequest) -> Result<Location>;
}

// =============================================================================
// Edge Cloud Port
// =============================================================================

/// Port for edge-cloud canonical operations (application lifecycle and
/// zone discovery).
#[async_trait]
pub trait EdgeCloudAdapter: Send + Sync {
    /// Backend name, used in errors and logs
    fn backend_name(&self) -> &'static str;

    /// Declared canonical capabilities
    fn capabilities(&self) -> &'static [Capability];

    // --- Zones -------------------------------------------------------------

    async fn list_zones(&self) -> Result<Vec<EdgeCloudZone>>;

    /// Aggregate compute capability of one zone
    async fn zone_details(&self, zone_id: &str) -> Result<ZoneRegisteredData>;

    // --- Application registry ----------------------------------------------

    async fn onboard_app(&self, manifest: &AppManifest) -> Result<SubmittedApp>;

    async fn get_onboarded_app(&self, app_id: &str) -> Result<AppManifest>;

    async fn list_onboarded_apps(&self) -> Result<Vec<AppManifest>>;

    /// Refused while instances of the app are still deployed
    async fn delete_onboarded_app(&self, app_id: &str) -> Result<()>;

    // --- Deployment lifecycle ----------------------------------------------

    async fn deploy_app(&self, app_id: &str, zone_ids: &[String]) -> Result<AppInstanceInfo>;

    async fn get_deployed_app(&self, app_instance_id: &str) -> Result<AppInstanceInfo>;

    async fn list_deployed_apps(&self, app_id: Option<&str>) -> Result<Vec<AppInstanceInfo>>;

    async fn undeploy_app(&self, app_instance_id: &str) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type NetworkAdapterRef = Arc<dyn NetworkAdapter>;
pub type EdgeCloudAdapterRef = Arc<dyn EdgeCloudAdapter>;

impl std::fmt::Debug for dyn NetworkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkAdapter")
            .field("backend", &self.backend_name())
            .finish()
    }
}

impl std::fmt::Debug for dyn EdgeCloudAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeCloudAdapter")
            .field("backend", &self.backend_name())
            .finish()
    }
}
