//! aerOS adapter
//!
//! aerOS exposes its continuum as NGSI-LD entities and takes deployments
//! as TOSCA documents posted to the high-level orchestrator (HLO). The
//! platform keeps no application registry of its own, so this adapter owns
//! the onboarded-app bookkeeping; deployments and zones live in the
//! continuum.
//!
//! aerOS service names must match `^[A-Za-z][A-Za-z0-9_]{1,63}$`, so the
//! CAMARA-facing instance name is the codec-encoded service id.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::codec;
use crate::domain::capability::{self, Capability};
use crate::domain::ports::EdgeCloudAdapter;
use crate::edge::convert::{aggregate_zone, InfrastructureElement};
use crate::error::{Error, Result};
use crate::schema::edge::{
    AppInstanceInfo, AppInstanceStatus, AppManifest, EdgeCloudZone, RepoType, SubmittedApp,
    VisibilityType, ZoneRegisteredData, ZoneStatus,
};
use crate::transport::{error_for_status, Payload, TransportRef, WireResponse};

const BACKEND: &str = "aeros";

const CAPABILITIES: &[Capability] = &[Capability::AppManagement, Capability::ZoneInformation];

/// aerOS instance-name alphabet allows at most 64 chars
const MAX_SERVICE_NAME_LEN: usize = 64;

/// Node memory floor applied when the manifest does not constrain it, MB
const DEFAULT_MIN_NODE_MEMORY: u64 = 1024;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the aerOS adapter; both tokens are mandatory
#[derive(Debug, Clone)]
pub struct AerosConfig {
    pub base_url: String,
    /// Bearer token for continuum (NGSI-LD) queries
    pub access_token: String,
    /// Bearer token for HLO service lifecycle calls
    pub hlo_token: String,
}

// =============================================================================
// Local Bookkeeping
// =============================================================================

#[derive(Default)]
struct AppStore {
    /// Onboarded manifests by app id
    apps: BTreeMap<String, AppManifest>,
    /// Active deployments by instance id
    deployments: BTreeMap<String, AppInstanceInfo>,
    /// Undeployed instance ids per app, purged when the app is deleted
    stopped: BTreeMap<String, Vec<String>>,
    /// Zone id → continuum domain URN, filled by zone listing
    domains: BTreeMap<String, String>,
}

/// Map an aerOS service lifecycle state to the canonical instance status.
/// Unknown or empty states classify as failed.
pub fn map_service_status(status: &str) -> AppInstanceStatus {
    match status.trim().to_uppercase().as_str() {
        "DEPLOYING" => AppInstanceStatus::Instantiating,
        "DEPLOYED" => AppInstanceStatus::Ready,
        "DESTROYING" => AppInstanceStatus::Terminating,
        "FINISHED" => AppInstanceStatus::Ready,
        _ => AppInstanceStatus::Failed,
    }
}

/// Deterministic UUID-shaped digest of a continuum URN. Keeps zone ids
/// stable across listings without an external mapping table.
fn urn_to_zone_id(urn: &str) -> String {
    // FNV-1a over the URN, widened to 128 bits by hashing twice with
    // different offsets
    fn fnv1a(seed: u64, data: &str) -> u64 {
        let mut hash = seed;
        for byte in data.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }
    let high = fnv1a(0xcbf2_9ce4_8422_2325, urn);
    let low = fnv1a(0x6c62_272e_07bb_0142, urn);
    format!(
        "{:08x}-{:04x}-5{:03x}-{:04x}-{:012x}",
        (high >> 32) as u32,
        (high >> 16) as u16,
        high as u16 & 0x0FFF,
        ((low >> 48) as u16 & 0x3FFF) | 0x8000,
        low & 0xFFFF_FFFF_FFFF
    )
}

/// Short unique suffix for service ids
fn service_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{:04x}", (now & 0xFFFF) as u16)
}

// =============================================================================
// Adapter
// =============================================================================

pub struct AerosAdapter {
    config: AerosConfig,
    transport: TransportRef,
    store: RwLock<AppStore>,
}

impl AerosAdapter {
    pub fn new(mut config: AerosConfig, transport: TransportRef) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        info!("Initialized {} adapter (base_url: {})", BACKEND, config.base_url);
        Self {
            config,
            transport,
            store: RwLock::new(AppStore::default()),
        }
    }

    fn require(&self, needed: Capability) -> Result<()> {
        capability::ensure(BACKEND, CAPABILITIES, needed)
    }

    fn continuum_headers(&self) -> Vec<(String, String)> {
        vec![
            ("aerOS".to_string(), "true".to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.access_token),
            ),
        ]
    }

    fn hlo_headers(&self) -> Vec<(String, String)> {
        vec![
            ("aerOS".to_string(), "true".to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.hlo_token),
            ),
        ]
    }

    // --- Continuum client ---------------------------------------------------

    async fn query_entities(&self, ngsild_params: &str) -> Result<WireResponse> {
        let url = format!("{}/entities?{}", self.config.base_url, ngsild_params);
        let response = self
            .transport
            .request(Method::GET, &url, &self.continuum_headers(), None)
            .await?;
        error_for_status(response, "query continuum entities")
    }

    async fn onboard_and_deploy_service(&self, service_id: &str, tosca: String) -> Result<Value> {
        let url = format!("{}/hlo_fe/services/{}", self.config.base_url, service_id);
        let response = self
            .transport
            .request(
                Method::POST,
                &url,
                &self.hlo_headers(),
                Some(Payload::Raw {
                    content_type: "application/yaml",
                    body: tosca,
                }),
            )
            .await?;
        error_for_status(response, "onboard service")?.json()
    }

    async fn undeploy_service(&self, service_id: &str) -> Result<()> {
        let url = format!("{}/hlo_fe/services/{}", self.config.base_url, service_id);
        let response = self
            .transport
            .request(Method::DELETE, &url, &self.hlo_headers(), None)
            .await?;
        error_for_status(response, "undeploy service")?;
        Ok(())
    }

    async fn purge_service(&self, service_id: &str) -> Result<()> {
        let url = format!("{}/hlo_fe/services/{}/purge", self.config.base_url, service_id);
        let response = self
            .transport
            .request(Method::DELETE, &url, &self.hlo_headers(), None)
            .await?;
        error_for_status(response, "purge service")?;
        Ok(())
    }

    fn aeros_service_id(service_id: &str) -> String {
        format!("urn:ngsi-ld:Service:{}", service_id)
    }

    // --- TOSCA generation ---------------------------------------------------

    /// Render the single-component manifest as the TOSCA document the HLO
    /// consumes.
    fn generate_tosca(
        &self,
        manifest: &AppManifest,
        domain_id: &str,
    ) -> Result<String> {
        let component = manifest.component_spec.first().ok_or_else(|| {
            Error::InvalidArgument("manifest carries no component spec".into())
        })?;

        let image_path = &manifest.app_repo.image_path;
        let (repository, image_file) = match image_path.rsplit_once('/') {
            Some((repo, file)) => (repo.to_string(), file.to_string()),
            None => ("docker_hub".to_string(), image_path.clone()),
        };

        let min_node_memory = manifest
            .required_resources
            .application_resources
            .cpu_pool
            .as_ref()
            .and_then(|pool| pool.topology.as_ref())
            .and_then(|topology| topology.min_node_memory)
            .unwrap_or(DEFAULT_MIN_NODE_MEMORY);

        let mut ports = serde_json::Map::new();
        for interface in &component.network_interfaces {
            ports.insert(
                interface.interface_id.clone(),
                json!({
                    "properties": {
                        "protocol": [format!("{:?}", interface.protocol).to_lowercase()],
                        "source": interface.port,
                    }
                }),
            );
        }
        let expose_ports = component
            .network_interfaces
            .iter()
            .any(|interface| interface.visibility_type == VisibilityType::VisibilityExternal);

        let is_private = manifest.app_repo.repo_type == RepoType::Privaterepo;
        let mut artifact = serde_json::Map::new();
        artifact.insert("file".into(), json!(image_file));
        artifact.insert(
            "type".into(),
            json!("tosca.artifacts.Deployment.Image.Container.Docker"),
        );
        artifact.insert("repository".into(), json!(repository));
        artifact.insert("is_private".into(), json!(is_private));
        if let Some(user_name) = &manifest.app_repo.user_name {
            artifact.insert("username".into(), json!(user_name));
        }
        if let Some(credentials) = &manifest.app_repo.credentials {
            artifact.insert("password".into(), json!(credentials));
        }

        let node_template = json!({
            "type": "tosca.nodes.Container.Application",
            "isJob": false,
            "requirements": [
                {
                    "network": {
                        "properties": {
                            "ports": ports,
                            "exposePorts": expose_ports,
                        }
                    }
                },
                {
                    "host": {
                        "node_filter": {
                            "capabilities": [{
                                "host": {
                                    "properties": {
                                        "cpu_arch": {"equal": "x64"},
                                        "realtime": {"equal": false},
                                        "cpu_usage": {"less_or_equal": "0.4"},
                                        "mem_size": {
                                            "greater_or_equal": min_node_memory.to_string()
                                        },
                                        "energy_efficiency": {"greater_or_equal": "0"},
                                        "green": {"greater_or_equal": "0"},
                                        "domain_id": {"equal": domain_id},
                                    }
                                }
                            }]
                        }
                    }
                }
            ],
            "artifacts": {"application_image": Value::Object(artifact)},
            "interfaces": {
                "Standard": {
                    "create": {
                        "implementation": "application_image",
                        "inputs": {"cliArgs": [], "envVars": []},
                    }
                }
            },
        });

        let mut node_templates = serde_json::Map::new();
        node_templates.insert(component.component_name.clone(), node_template);

        let document = json!({
            "tosca_definitions_version": "tosca_simple_yaml_1_3",
            "description": format!("TOSCA for {}", manifest.name),
            "serviceOverlay": false,
            "node_templates": node_templates,
        });

        Ok(serde_yaml::to_string(&document)?)
    }

    /// Resolve a caller-facing zone id back to the continuum domain URN.
    async fn domain_for_zone(&self, zone_id: &str) -> String {
        let store = self.store.read().await;
        store
            .domains
            .get(zone_id)
            .cloned()
            .unwrap_or_else(|| zone_id.to_string())
    }
}

#[async_trait]
impl EdgeCloudAdapter for AerosAdapter {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn list_zones(&self) -> Result<Vec<EdgeCloudZone>> {
        self.require(Capability::ZoneInformation)?;

        let response = self.query_entities("type=Domain&format=simplified").await?;
        let domains: Vec<Value> = response.json()?;
        debug!("continuum reported {} domains", domains.len());

        let mut zones = Vec::new();
        let mut store = self.store.write().await;
        for domain in domains {
            let Some(domain_id) = domain.get("id").and_then(Value::as_str) else {
                continue;
            };

            let raw_status = domain
                .get("domainStatus")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let status_token = raw_status
                .rsplit(':')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase();
            let status = if status_token == "functional" {
                ZoneStatus::Active
            } else {
                ZoneStatus::Unknown
            };

            let provider = match domain.get("owner") {
                Some(Value::Array(owners)) => owners
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                Some(Value::String(owner)) => owner.clone(),
                _ => "unknown".to_string(),
            };

            let zone_id = urn_to_zone_id(domain_id);
            store.domains.insert(zone_id.clone(), domain_id.to_string());

            zones.push(EdgeCloudZone {
                edge_cloud_zone_id: zone_id,
                edge_cloud_zone_name: domain_id.to_string(),
                edge_cloud_provider: provider,
                edge_cloud_region: None,
                edge_cloud_zone_status: status,
            });
        }
        Ok(zones)
    }

    async fn zone_details(&self, zone_id: &str) -> Result<ZoneRegisteredData> {
        self.require(Capability::ZoneInformation)?;

        let domain = self.domain_for_zone(zone_id).await;
        let params = format!(
            "format=simplified&type=InfrastructureElement&q=domain==\"{}\"",
            domain
        );
        let response = self.query_entities(&params).await?;
        let elements: Vec<InfrastructureElement> = response.json()?;
        if elements.is_empty() {
            return Err(Error::NotFound {
                resource: format!("zone {}", zone_id),
            });
        }
        Ok(aggregate_zone(zone_id, &elements))
    }

    async fn onboard_app(&self, manifest: &AppManifest) -> Result<SubmittedApp> {
        self.require(Capability::AppManagement)?;
        manifest.validate()?;

        let mut store = self.store.write().await;
        if store.apps.contains_key(&manifest.app_id) {
            return Err(Error::InvalidArgument(format!(
                "application '{}' already exists",
                manifest.app_id
            )));
        }
        store.apps.insert(manifest.app_id.clone(), manifest.clone());
        debug!("onboarded application [id={}]", manifest.app_id);

        Ok(SubmittedApp {
            app_id: manifest.app_id.clone(),
        })
    }

    async fn get_onboarded_app(&self, app_id: &str) -> Result<AppManifest> {
        self.require(Capability::AppManagement)?;

        self.store
            .read()
            .await
            .apps
            .get(app_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                resource: format!("application {}", app_id),
            })
    }

    async fn list_onboarded_apps(&self) -> Result<Vec<AppManifest>> {
        self.require(Capability::AppManagement)?;
        Ok(self.store.read().await.apps.values().cloned().collect())
    }

    async fn delete_onboarded_app(&self, app_id: &str) -> Result<()> {
        self.require(Capability::AppManagement)?;

        let stopped = {
            let store = self.store.read().await;
            if !store.apps.contains_key(app_id) {
                return Err(Error::NotFound {
                    resource: format!("application {}", app_id),
                });
            }
            let live: Vec<&String> = store
                .deployments
                .iter()
                .filter(|(_, instance)| instance.app_id == app_id)
                .map(|(instance_id, _)| instance_id)
                .collect();
            if !live.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "application '{}' still has deployed instances ({}); undeploy them first",
                    app_id,
                    live.iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            store.stopped.get(app_id).cloned().unwrap_or_default()
        };

        // stopped instances still occupy the continuum until purged
        for instance_id in &stopped {
            self.purge_service(&Self::aeros_service_id(instance_id)).await?;
            debug!("purged service instance [id={}]", instance_id);
        }

        let mut store = self.store.write().await;
        store.stopped.remove(app_id);
        store.apps.remove(app_id);
        info!("Application deleted [id={}]", app_id);
        Ok(())
    }

    async fn deploy_app(&self, app_id: &str, zone_ids: &[String]) -> Result<AppInstanceInfo> {
        self.require(Capability::AppManagement)?;

        let manifest = {
            let store = self.store.read().await;
            store.apps.get(app_id).cloned().ok_or_else(|| Error::NotFound {
                resource: format!("application {}", app_id),
            })?
        };
        let zone_id = zone_ids
            .first()
            .ok_or_else(|| Error::InvalidArgument("at least one target zone is required".into()))?;

        let service_id = format!("{}-{}", app_id, service_suffix());
        // the CAMARA-facing name must fit the aerOS identifier alphabet
        let instance_name = codec::encode(&service_id, MAX_SERVICE_NAME_LEN)?;

        let domain_id = self.domain_for_zone(zone_id).await;
        let tosca = self.generate_tosca(&manifest, &domain_id)?;
        debug!("generated TOSCA for service {}", service_id);

        let response = self
            .onboard_and_deploy_service(&Self::aeros_service_id(&service_id), tosca)
            .await?;
        if response.get("serviceId").is_none() {
            return Err(Error::platform(
                "invalid response from onboard service: missing 'serviceId'",
            ));
        }

        let instance = AppInstanceInfo {
            name: instance_name,
            app_id: app_id.to_string(),
            app_instance_id: service_id.clone(),
            app_provider: manifest.app_provider.clone(),
            status: AppInstanceStatus::Instantiating,
            edge_cloud_zone_id: zone_id.clone(),
        };
        self.store
            .write()
            .await
            .deployments
            .insert(service_id, instance.clone());
        info!("App deployment request submitted [instance={}]", instance.app_instance_id);
        Ok(instance)
    }

    async fn get_deployed_app(&self, app_instance_id: &str) -> Result<AppInstanceInfo> {
        self.require(Capability::AppManagement)?;

        self.store
            .read()
            .await
            .deployments
            .get(app_instance_id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                resource: format!("app instance {}", app_instance_id),
            })
    }

    async fn list_deployed_apps(&self, app_id: Option<&str>) -> Result<Vec<AppInstanceInfo>> {
        self.require(Capability::AppManagement)?;

        Ok(self
            .store
            .read()
            .await
            .deployments
            .values()
            .filter(|instance| match app_id {
                Some(filter) => instance.app_id == filter,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn undeploy_app(&self, app_instance_id: &str) -> Result<()> {
        self.require(Capability::AppManagement)?;

        let instance = {
            let store = self.store.read().await;
            store
                .deployments
                .get(app_instance_id)
                .cloned()
                .ok_or_else(|| Error::NotFound {
                    resource: format!("app instance {}", app_instance_id),
                })?
        };

        self.undeploy_service(&Self::aeros_service_id(app_instance_id))
            .await?;

        let mut store = self.store.write().await;
        store.deployments.remove(app_instance_id);
        store
            .stopped
            .entry(instance.app_id)
            .or_default()
            .push(app_instance_id.to_string());
        info!("App instance undeployed [id={}]", app_instance_id);
        Ok(())
    }
}
