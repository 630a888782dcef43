//! i2Edge adapter
//!
//! Translates the canonical edge operations onto the i2Edge orchestrator
//! REST dialect. i2Edge separates artefacts (image/repo references) from
//! onboarded applications, deploys per zone with an operator-chosen
//! flavour, and signals success with dialect-specific status codes
//! (201 onboard, 202 deploy, 200 delete).

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::capability::{self, Capability};
use crate::domain::ports::EdgeCloudAdapter;
use crate::error::{Error, Result};
use crate::schema::edge::{
    AppInstanceInfo, AppInstanceStatus, AppManifest, AppRepo, ApplicationResources, EdgeCloudZone,
    PackageType, RepoType, RequiredResources, SubmittedApp, ZoneRegisteredData, ZoneStatus,
};
use crate::transport::{expect_status, Payload, TransportRef, WireResponse};

const BACKEND: &str = "i2edge";

const CAPABILITIES: &[Capability] = &[Capability::AppManagement, Capability::ZoneInformation];

/// Node label i2Edge uses to pin instances to a zone
const ZONE_NODE_SELECTOR: &str = "feature.node.kubernetes.io/zoneID";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the i2Edge adapter
#[derive(Debug, Clone)]
pub struct I2EdgeConfig {
    pub base_url: String,
    /// Compute flavour applied to every deployment; mandatory, the
    /// platform has no sensible default
    pub flavour_id: String,
}

// =============================================================================
// Wire Schemas (i2Edge dialect)
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAppMetaData {
    app_name: String,
    app_provider_id: String,
    version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireComponentSpec {
    artefact_id: String,
}

#[derive(Debug, Serialize)]
struct WireOnboardingData {
    app_id: String,
    #[serde(rename = "appProviderId")]
    app_provider_id: String,
    #[serde(rename = "appComponentSpecs")]
    app_component_specs: Vec<WireComponentSpec>,
    #[serde(rename = "appMetaData")]
    app_meta_data: WireAppMetaData,
}

#[derive(Debug, Serialize)]
struct WireOnboardingRequest {
    profile_data: WireOnboardingData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireZoneInfo {
    flavour_id: String,
    zone_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDeployData {
    app_id: String,
    app_provider_id: String,
    app_version: String,
    zone_info: WireZoneInfo,
}

#[derive(Debug, Serialize)]
struct WireDeployRequest {
    app_deploy_data: WireDeployData,
}

#[derive(Debug, Deserialize)]
struct WireZone {
    #[serde(rename = "zoneId", default)]
    zone_id: Option<String>,
    #[serde(rename = "nodeName", default)]
    node_name: Option<String>,
    #[serde(rename = "geographyDetails", default)]
    geography_details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireInstance {
    #[serde(default)]
    app_instance_id: Option<String>,
    #[serde(default)]
    app_id: Option<String>,
    #[serde(default)]
    app_provider: Option<String>,
    #[serde(default)]
    deploy_status: Option<String>,
    #[serde(default)]
    app_spec: Option<Value>,
}

impl WireInstance {
    fn zone_id(&self) -> Option<String> {
        self.app_spec
            .as_ref()
            .and_then(|spec| spec.get("nodeSelector"))
            .and_then(|selector| selector.get(ZONE_NODE_SELECTOR))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Artefact registration parameters (i2Edge-specific surface)
#[derive(Debug, Clone, Serialize)]
pub struct ArtefactSpec {
    pub artefact_id: String,
    pub name: String,
    pub repo_name: String,
    pub repo_type: RepoType,
    pub repo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_token: Option<String>,
}

fn deploy_status_to_canonical(status: Option<&str>) -> AppInstanceStatus {
    match status {
        Some("DEPLOYED") => AppInstanceStatus::Ready,
        _ => AppInstanceStatus::Unknown,
    }
}

// =============================================================================
// Adapter
// =============================================================================

pub struct I2EdgeAdapter {
    config: I2EdgeConfig,
    transport: TransportRef,
}

impl I2EdgeAdapter {
    pub fn new(mut config: I2EdgeConfig, transport: TransportRef) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        info!(
            "Initialized {} adapter (base_url: {}, flavour_id: {})",
            BACKEND, config.base_url, config.flavour_id
        );
        Self { config, transport }
    }

    fn require(&self, needed: Capability) -> Result<()> {
        capability::ensure(BACKEND, CAPABILITIES, needed)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn id_url(&self, path: &str, id: &str) -> String {
        format!("{}{}/{}", self.config.base_url, path, urlencoding::encode(id))
    }

    async fn call(
        &self,
        method: Method,
        url: &str,
        body: Option<Payload>,
        expected: u16,
        context: &str,
    ) -> Result<WireResponse> {
        let response = self.transport.request(method, url, &[], body).await?;
        expect_status(response, expected, context)
    }

    /// Read the onboarded app's raw profile; deploy needs provider and
    /// version from it.
    async fn fetch_profile(&self, app_id: &str) -> Result<Value> {
        let response = self
            .call(
                Method::GET,
                &self.id_url("/application/onboarding", app_id),
                None,
                200,
                "get onboarded app",
            )
            .await?;
        response.json()
    }

    fn manifest_from_profile(&self, app_id: &str, profile: &Value) -> AppManifest {
        let profile_data = profile.get("profile_data").cloned().unwrap_or_default();
        let metadata = profile_data.get("appMetaData").cloned().unwrap_or_default();
        let string_at = |value: &Value, key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        // i2Edge stores only the onboarding profile; repo and resource
        // details are not recoverable from the platform
        AppManifest {
            app_id: profile_data
                .get("app_id")
                .and_then(Value::as_str)
                .unwrap_or(app_id)
                .to_string(),
            name: string_at(&metadata, "appName"),
            version: string_at(&metadata, "version"),
            app_provider: string_at(&profile_data, "appProviderId"),
            package_type: PackageType::Container,
            app_repo: AppRepo {
                repo_type: RepoType::Publicrepo,
                image_path: "not-available".to_string(),
                user_name: None,
                credentials: None,
            },
            required_resources: RequiredResources {
                infra_kind: "kubernetes".to_string(),
                application_resources: ApplicationResources::default(),
                is_standalone: false,
            },
            component_spec: Vec::new(),
        }
    }

    // --- Artefact management (i2Edge-specific, non-canonical) --------------

    /// Register an artefact. i2Edge takes these as form fields.
    pub async fn create_artefact(&self, artefact: &ArtefactSpec) -> Result<()> {
        let value = serde_json::to_value(artefact)?;
        let form = value
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(key, val)| {
                        let text = match val {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        };
                        format!("{}={}", key, urlencoding::encode(&text))
                    })
                    .collect::<Vec<_>>()
                    .join("&")
            })
            .unwrap_or_default();

        self.call(
            Method::POST,
            &self.url("/artefact"),
            Some(Payload::Raw {
                content_type: "application/x-www-form-urlencoded",
                body: form,
            }),
            201,
            "create artefact",
        )
        .await?;
        info!("Artefact added successfully [id={}]", artefact.artefact_id);
        Ok(())
    }

    pub async fn delete_artefact(&self, artefact_id: &str) -> Result<()> {
        self.call(
            Method::DELETE,
            &self.id_url("/artefact", artefact_id),
            None,
            200,
            "delete artefact",
        )
        .await?;
        info!("Artefact deleted successfully [id={}]", artefact_id);
        Ok(())
    }
}

#[async_trait]
impl EdgeCloudAdapter for I2EdgeAdapter {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn list_zones(&self) -> Result<Vec<EdgeCloudZone>> {
        self.require(Capability::ZoneInformation)?;

        let response = self
            .call(Method::GET, &self.url("/zones/list"), None, 200, "list zones")
            .await?;
        let zones: Vec<WireZone> = response.json()?;
        debug!("retrieved {} zones", zones.len());

        Ok(zones
            .into_iter()
            .map(|zone| EdgeCloudZone {
                edge_cloud_zone_id: zone.zone_id.unwrap_or_else(|| "unknown".into()),
                edge_cloud_zone_name: zone.node_name.unwrap_or_else(|| "unknown".into()),
                edge_cloud_provider: BACKEND.to_string(),
                edge_cloud_region: zone.geography_details,
                edge_cloud_zone_status: ZoneStatus::Unknown,
            })
            .collect())
    }

    async fn zone_details(&self, zone_id: &str) -> Result<ZoneRegisteredData> {
        self.require(Capability::ZoneInformation)?;

        let response = self
            .call(
                Method::GET,
                &self.id_url("/zone", zone_id),
                None,
                200,
                "get zone details",
            )
            .await?;

        // the platform reports zone capability in the canonical shape
        // already; only the id needs backfilling
        let mut details: ZoneRegisteredData = response.json()?;
        if details.zone_id.is_empty() {
            details.zone_id = zone_id.to_string();
        }
        Ok(details)
    }

    async fn onboard_app(&self, manifest: &AppManifest) -> Result<SubmittedApp> {
        self.require(Capability::AppManagement)?;
        manifest.validate()?;

        // the artefact carrying the image was registered under the app id
        let payload = WireOnboardingRequest {
            profile_data: WireOnboardingData {
                app_id: manifest.app_id.clone(),
                app_provider_id: manifest.app_provider.clone(),
                app_component_specs: vec![WireComponentSpec {
                    artefact_id: manifest.app_id.clone(),
                }],
                app_meta_data: WireAppMetaData {
                    app_name: manifest.name.clone(),
                    app_provider_id: manifest.app_provider.clone(),
                    version: manifest.version.clone(),
                },
            },
        };

        self.call(
            Method::POST,
            &self.url("/application/onboarding"),
            Some(Payload::Json(serde_json::to_value(&payload)?)),
            201,
            "onboard app",
        )
        .await?;
        info!("App onboarded successfully [id={}]", manifest.app_id);

        Ok(SubmittedApp {
            app_id: manifest.app_id.clone(),
        })
    }

    async fn get_onboarded_app(&self, app_id: &str) -> Result<AppManifest> {
        self.require(Capability::AppManagement)?;
        let profile = self.fetch_profile(app_id).await?;
        Ok(self.manifest_from_profile(app_id, &profile))
    }

    async fn list_onboarded_apps(&self) -> Result<Vec<AppManifest>> {
        self.require(Capability::AppManagement)?;

        let response = self
            .call(
                Method::GET,
                &self.url("/applications/onboarding"),
                None,
                200,
                "list onboarded apps",
            )
            .await?;
        let profiles: Vec<Value> = response.json()?;

        Ok(profiles
            .iter()
            .map(|profile| {
                let app_id = profile
                    .get("profile_data")
                    .and_then(|data| data.get("app_id"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.manifest_from_profile(app_id, profile)
            })
            .collect())
    }

    async fn delete_onboarded_app(&self, app_id: &str) -> Result<()> {
        self.require(Capability::AppManagement)?;

        // i2Edge answers 200 on deletion; canonically that is a bare success
        self.call(
            Method::DELETE,
            &self.id_url("/application/onboarding", app_id),
            None,
            200,
            "delete onboarded app",
        )
        .await?;
        info!("Onboarded app deleted successfully [id={}]", app_id);
        Ok(())
    }

    async fn deploy_app(&self, app_id: &str, zone_ids: &[String]) -> Result<AppInstanceInfo> {
        self.require(Capability::AppManagement)?;
        let zone_id = zone_ids
            .first()
            .ok_or_else(|| Error::InvalidArgument("at least one target zone is required".into()))?;

        // deployment needs provider and version from the onboarded profile,
        // so this operation is two sequential round trips
        let profile = self.fetch_profile(app_id).await?;
        let profile_data = profile.get("profile_data").cloned().unwrap_or_default();
        let app_provider = profile_data
            .get("appProviderId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let app_version = profile_data
            .get("appMetaData")
            .and_then(|metadata| metadata.get("version"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let payload = WireDeployRequest {
            app_deploy_data: WireDeployData {
                app_id: app_id.to_string(),
                app_provider_id: app_provider.clone(),
                app_version,
                zone_info: WireZoneInfo {
                    flavour_id: self.config.flavour_id.clone(),
                    zone_id: zone_id.clone(),
                },
            },
        };

        let response = self
            .call(
                Method::POST,
                &self.url("/application_instance"),
                Some(Payload::Json(serde_json::to_value(&payload)?)),
                202,
                "deploy app",
            )
            .await?;
        let body: Value = response.json()?;
        let instance_id = body
            .get("app_instance_id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::platform("deployment response carries no app_instance_id"))?
            .to_string();
        info!("App deployment request submitted [instance={}]", instance_id);

        Ok(AppInstanceInfo {
            name: instance_id.clone(),
            app_id: app_id.to_string(),
            app_instance_id: instance_id,
            app_provider,
            status: AppInstanceStatus::Instantiating,
            edge_cloud_zone_id: zone_id.clone(),
        })
    }

    async fn get_deployed_app(&self, app_instance_id: &str) -> Result<AppInstanceInfo> {
        self.require(Capability::AppManagement)?;

        // the per-instance endpoint is keyed by zone, so locate the
        // instance in the collection first
        let response = self
            .call(
                Method::GET,
                &self.url("/application_instances"),
                None,
                200,
                "list app instances",
            )
            .await?;
        let instances: Vec<WireInstance> = response.json()?;
        let instance = instances
            .into_iter()
            .find(|candidate| candidate.app_instance_id.as_deref() == Some(app_instance_id))
            .ok_or_else(|| Error::NotFound {
                resource: format!("app instance {}", app_instance_id),
            })?;
        let zone_id = instance.zone_id().unwrap_or_else(|| {
            warn!("instance {} carries no zone selector", app_instance_id);
            "unknown".to_string()
        });

        let response = self
            .call(
                Method::GET,
                &format!(
                    "{}/application_instance/{}/{}",
                    self.config.base_url,
                    urlencoding::encode(&zone_id),
                    urlencoding::encode(app_instance_id)
                ),
                None,
                200,
                "get app instance",
            )
            .await?;
        let detail: Value = response.json()?;
        let state = detail.get("appInstanceState").and_then(Value::as_str);

        Ok(AppInstanceInfo {
            name: app_instance_id.to_string(),
            app_id: instance.app_id.unwrap_or_default(),
            app_instance_id: app_instance_id.to_string(),
            app_provider: instance.app_provider.unwrap_or_default(),
            status: deploy_status_to_canonical(state),
            edge_cloud_zone_id: zone_id,
        })
    }

    async fn list_deployed_apps(&self, app_id: Option<&str>) -> Result<Vec<AppInstanceInfo>> {
        self.require(Capability::AppManagement)?;

        let response = self
            .call(
                Method::GET,
                &self.url("/application_instances"),
                None,
                200,
                "list app instances",
            )
            .await?;
        let instances: Vec<WireInstance> = response.json()?;

        Ok(instances
            .into_iter()
            .filter(|instance| match app_id {
                Some(filter) => instance.app_id.as_deref() == Some(filter),
                None => true,
            })
            .filter_map(|instance| {
                let instance_id = instance.app_instance_id.clone()?;
                let zone_id = instance.zone_id().unwrap_or_else(|| "unknown".into());
                Some(AppInstanceInfo {
                    name: instance_id.clone(),
                    app_id: instance.app_id.clone().unwrap_or_default(),
                    app_instance_id: instance_id,
                    app_provider: instance.app_provider.clone().unwrap_or_default(),
                    status: deploy_status_to_canonical(instance.deploy_status.as_deref()),
                    edge_cloud_zone_id: zone_id,
                })
            })
            .collect())
    }

    async fn undeploy_app(&self, app_instance_id: &str) -> Result<()> {
        self.require(Capability::AppManagement)?;

        self.call(
            Method::DELETE,
            &self.id_url("/application_instance", app_instance_id),
            None,
            200,
            "undeploy app",
        )
        .await?;
        info!("App instance deleted successfully [id={}]", app_instance_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn adapter(transport: std::sync::Arc<MockTransport>) -> I2EdgeAdapter {
        I2EdgeAdapter::new(
            I2EdgeConfig {
                base_url: "http://i2edge.example.com".into(),
                flavour_id: "flavour-small".into(),
            },
            transport,
        )
    }

    fn manifest() -> AppManifest {
        use crate::schema::edge::*;
        AppManifest {
            app_id: "video-analytics".into(),
            name: "video-analytics".into(),
            version: "1.0.0".into(),
            app_provider: "acme".into(),
            package_type: PackageType::Container,
            app_repo: AppRepo {
                repo_type: RepoType::Publicrepo,
                image_path: "registry.example.com/acme/va:1.0.0".into(),
                user_name: None,
                credentials: None,
            },
            required_resources: RequiredResources {
                infra_kind: "kubernetes".into(),
                application_resources: ApplicationResources::default(),
                is_standalone: false,
            },
            component_spec: vec![ComponentSpec {
                component_name: "va".into(),
                network_interfaces: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn test_onboard_maps_manifest_to_profile() {
        let transport = MockTransport::new();
        transport.push(201, json!({"app_id": "video-analytics"}));
        let adapter = adapter(transport.clone());

        let submitted = adapter.onboard_app(&manifest()).await.unwrap();
        assert_eq!(submitted.app_id, "video-analytics");

        let recorded = transport.requests();
        assert_eq!(
            recorded[0].url,
            "http://i2edge.example.com/application/onboarding"
        );
        let body = recorded[0].body.clone().unwrap();
        assert_eq!(body["profile_data"]["app_id"], "video-analytics");
        assert_eq!(
            body["profile_data"]["appComponentSpecs"][0]["artefactId"],
            "video-analytics"
        );
        assert_eq!(body["profile_data"]["appMetaData"]["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_deploy_is_two_sequential_round_trips() {
        let transport = MockTransport::new();
        transport.push(
            200,
            json!({
                "profile_data": {
                    "app_id": "video-analytics",
                    "appProviderId": "acme",
                    "appMetaData": {"appName": "video-analytics", "version": "1.0.0"}
                }
            }),
        );
        transport.push(202, json!({"app_instance_id": "inst-1", "zoneID": "zone-a"}));
        let adapter = adapter(transport.clone());

        let instance = adapter
            .deploy_app("video-analytics", &["zone-a".to_string()])
            .await
            .unwrap();
        assert_eq!(instance.app_instance_id, "inst-1");
        assert_eq!(instance.status, AppInstanceStatus::Instantiating);
        assert_eq!(instance.edge_cloud_zone_id, "zone-a");

        let recorded = transport.requests();
        assert_eq!(recorded.len(), 2);
        let deploy_body = recorded[1].body.clone().unwrap();
        assert_eq!(deploy_body["app_deploy_data"]["zoneInfo"]["flavourId"], "flavour-small");
        assert_eq!(deploy_body["app_deploy_data"]["appVersion"], "1.0.0");
    }

    #[tokio::test]
    async fn test_list_instances_maps_status_and_zone() {
        let transport = MockTransport::new();
        transport.push(
            200,
            json!([
                {
                    "app_instance_id": "inst-1",
                    "app_id": "video-analytics",
                    "app_provider": "acme",
                    "deploy_status": "DEPLOYED",
                    "app_spec": {"nodeSelector": {"feature.node.kubernetes.io/zoneID": "zone-a"}}
                },
                {
                    "app_instance_id": "inst-2",
                    "app_id": "other-app",
                    "deploy_status": "PENDING",
                    "app_spec": {}
                }
            ]),
        );
        let adapter = adapter(transport.clone());

        let instances = adapter.list_deployed_apps(Some("video-analytics")).await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].status, AppInstanceStatus::Ready);
        assert_eq!(instances[0].edge_cloud_zone_id, "zone-a");
    }

    #[tokio::test]
    async fn test_get_deployed_app_not_found() {
        let transport = MockTransport::new();
        transport.push(200, json!([]));
        let adapter = adapter(transport.clone());

        let err = adapter.get_deployed_app("missing").await.unwrap_err();
        assert_matches!(err, Error::NotFound { .. });
    }

    #[tokio::test]
    async fn test_unexpected_success_status_is_platform_error() {
        let transport = MockTransport::new();
        // backend answers 200 where the dialect promises 201
        transport.push(200, json!({}));
        let adapter = adapter(transport.clone());

        let err = adapter.onboard_app(&manifest()).await.unwrap_err();
        assert_matches!(err, Error::PlatformError { status: Some(200), .. });
    }

    #[tokio::test]
    async fn test_zone_listing() {
        let transport = MockTransport::new();
        transport.push(
            200,
            json!([
                {"zoneId": "zone-a", "nodeName": "edge-node-a", "geographyDetails": "ES"},
                {"zoneId": "zone-b", "nodeName": "edge-node-b"}
            ]),
        );
        let adapter = adapter(transport.clone());

        let zones = adapter.list_zones().await.unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].edge_cloud_zone_id, "zone-a");
        assert_eq!(zones[0].edge_cloud_provider, "i2edge");
        assert_eq!(zones[0].edge_cloud_region.as_deref(), Some("ES"));
        assert_eq!(zones[1].edge_cloud_zone_status, ZoneStatus::Unknown);
    }
}
