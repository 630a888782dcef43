//! Edge application and zone models

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Application Manifest
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageType {
    Container,
    Helm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepoType {
    Publicrepo,
    Privaterepo,
}

/// Container image location, with credentials for private registries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRepo {
    #[serde(rename = "type")]
    pub repo_type: RepoType,
    pub image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// CPU pool topology constraints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_node_cpu: Option<u32>,
    /// Minimum node memory in MB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_node_memory: Option<u64>,
}

/// Requested compute resources for the app's CPU pool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuPool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_cpu: Option<u32>,
    /// Memory in MB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_pool: Option<CpuPool>,
    /// Storage in GB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<u64>,
}

/// Infrastructure kind plus resource demands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredResources {
    pub infra_kind: String,
    #[serde(default)]
    pub application_resources: ApplicationResources,
    #[serde(default)]
    pub is_standalone: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Any,
}

/// Whether an interface is reachable from outside the zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityType {
    VisibilityExternal,
    VisibilityInternal,
}

/// Exposed network interface of a component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub interface_id: String,
    pub protocol: Protocol,
    pub port: u16,
    pub visibility_type: VisibilityType,
}

/// One deployable component of the application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub component_name: String,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

/// Application descriptor submitted at onboarding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    pub app_id: String,
    pub name: String,
    pub version: String,
    pub app_provider: String,
    pub package_type: PackageType,
    pub app_repo: AppRepo,
    pub required_resources: RequiredResources,
    #[serde(default)]
    pub component_spec: Vec<ComponentSpec>,
}

impl AppManifest {
    pub fn validate(&self) -> Result<()> {
        if self.app_id.is_empty() {
            return Err(Error::InvalidArgument("appId must not be empty".into()));
        }
        if self.name.is_empty() {
            return Err(Error::InvalidArgument("app name must not be empty".into()));
        }
        if self.app_repo.image_path.is_empty() {
            return Err(Error::InvalidArgument(
                "appRepo.imagePath must not be empty".into(),
            ));
        }
        if self.app_repo.repo_type == RepoType::Privaterepo
            && self.app_repo.credentials.is_none()
        {
            return Err(Error::InvalidArgument(
                "private repositories need credentials".into(),
            ));
        }
        if self.component_spec.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one component spec is required".into(),
            ));
        }
        Ok(())
    }
}

/// Response to a successful onboarding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApp {
    pub app_id: String,
}

// =============================================================================
// Application Instances
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppInstanceStatus {
    Instantiating,
    Ready,
    Failed,
    Terminating,
    Unknown,
}

/// One running (or starting) instance of an app in a zone
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInstanceInfo {
    /// Backend-facing instance name; may be an encoded form of the id when
    /// the backend restricts its identifier alphabet
    pub name: String,
    pub app_id: String,
    pub app_instance_id: String,
    pub app_provider: String,
    pub status: AppInstanceStatus,
    pub edge_cloud_zone_id: String,
}

// =============================================================================
// Zones
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Active,
    Inactive,
    Unknown,
}

/// Edge cloud zone summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCloudZone {
    pub edge_cloud_zone_id: String,
    pub edge_cloud_zone_name: String,
    pub edge_cloud_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_cloud_region: Option<String>,
    pub edge_cloud_zone_status: ZoneStatus,
}

/// CPU instruction-set architecture tags, in aggregate-preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CpuArchType {
    #[serde(rename = "ISA_X86_64")]
    X86_64,
    #[serde(rename = "ISA_ARM_64")]
    Arm64,
    #[serde(rename = "ISA_X86")]
    X86,
}

/// Operating system descriptor of a flavour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsType {
    /// "x86_64" or "x86"
    pub architecture: String,
    pub distribution: String,
    pub version: String,
    pub license: String,
}

/// Per-element compute offering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavour {
    pub flavour_id: String,
    pub cpu_arch_type: CpuArchType,
    pub supported_os_types: Vec<OsType>,
    #[serde(rename = "numCPU")]
    pub num_cpu: u64,
    /// MB
    pub memory_size: u64,
    /// MB
    pub storage_size: u64,
}

/// Aggregate compute block (reserved resources / quota limits)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResourceInfo {
    pub cpu_arch_type: CpuArchType,
    #[serde(rename = "numCPU")]
    pub num_cpu: u64,
    /// MB
    pub memory: u64,
}

/// Aggregate capability summary of one zone
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRegisteredData {
    #[serde(default)]
    pub zone_id: String,
    #[serde(default)]
    pub reserved_compute_resources: Vec<ComputeResourceInfo>,
    #[serde(default)]
    pub compute_resource_quota_limits: Vec<ComputeResourceInfo>,
    #[serde(default)]
    pub flavours_supported: Vec<Flavour>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    pub(crate) fn manifest() -> AppManifest {
        AppManifest {
            app_id: "video-analytics".into(),
            name: "video-analytics".into(),
            version: "1.2.0".into(),
            app_provider: "acme".into(),
            package_type: PackageType::Container,
            app_repo: AppRepo {
                repo_type: RepoType::Publicrepo,
                image_path: "registry.example.com/acme/video-analytics:1.2.0".into(),
                user_name: None,
                credentials: None,
            },
            required_resources: RequiredResources {
                infra_kind: "kubernetes".into(),
                application_resources: ApplicationResources {
                    cpu_pool: Some(CpuPool {
                        num_cpu: Some(2),
                        memory: Some(2048),
                        topology: Some(Topology {
                            min_node_cpu: Some(2),
                            min_node_memory: Some(2048),
                        }),
                    }),
                    storage: None,
                },
                is_standalone: false,
            },
            component_spec: vec![ComponentSpec {
                component_name: "video-analytics".into(),
                network_interfaces: vec![NetworkInterface {
                    interface_id: "http".into(),
                    protocol: Protocol::Tcp,
                    port: 8080,
                    visibility_type: VisibilityType::VisibilityExternal,
                }],
            }],
        }
    }

    #[test]
    fn test_manifest_validation() {
        assert!(manifest().validate().is_ok());

        let mut private_without_credentials = manifest();
        private_without_credentials.app_repo.repo_type = RepoType::Privaterepo;
        assert_matches!(
            private_without_credentials.validate(),
            Err(Error::InvalidArgument(_))
        );

        let mut no_components = manifest();
        no_components.component_spec.clear();
        assert_matches!(no_components.validate(), Err(Error::InvalidArgument(_)));
    }

    #[test]
    fn test_manifest_round_trips_camara_json() {
        let value = serde_json::to_value(manifest()).unwrap();
        assert_eq!(value["appId"], "video-analytics");
        assert_eq!(value["packageType"], "CONTAINER");
        assert_eq!(value["appRepo"]["type"], "PUBLICREPO");
        assert_eq!(
            value["componentSpec"][0]["networkInterfaces"][0]["visibilityType"],
            "VISIBILITY_EXTERNAL"
        );
        let back: AppManifest = serde_json::from_value(value).unwrap();
        assert_eq!(back.app_id, "video-analytics");
    }

    #[test]
    fn test_cpu_arch_tags() {
        assert_eq!(
            serde_json::to_value(CpuArchType::X86_64).unwrap(),
            "ISA_X86_64"
        );
        assert_eq!(serde_json::to_value(CpuArchType::Arm64).unwrap(), "ISA_ARM_64");
        let arch: CpuArchType = serde_json::from_value(json!("ISA_X86")).unwrap();
        assert_eq!(arch, CpuArchType::X86);
    }
}
