//! i2CAT near-RT RIC adapter
//!
//! Serves the QoD verbs of the radio-access domain by translating sessions
//! into RIC PRB-priority policies. Device IPs are resolved against a
//! configured IP → PLMN/gNB/UE scope table; there is no per-flow core
//! subscription behind this backend.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::capability::{self, Capability};
use crate::domain::ports::NetworkAdapter;
use crate::error::{Error, Result};
use crate::oran::wire::{policy_id, OranPolicy, PolicyScope, PolicyStatement};
use crate::schema::location::{Location, RetrievalLocationRequest};
use crate::schema::qod::{CreateSession, QosStatus, SessionInfo};
use crate::schema::traffic_influence::TrafficInfluence;
use crate::transport::{error_for_status, Payload, TransportRef};

const BACKEND: &str = "i2cat-ric";

const CAPABILITIES: &[Capability] = &[Capability::Qod];

/// Policy type the RIC rApp registers for QoD
const QOD_POLICY_TYPE: &str = "qod_prb_prio";

/// QoS profile → (policy priority tag, flow identifier)
const QOS_MAPPINGS: &[(&str, i64)] = &[
    ("qos-e", 3),
    ("qos-s", 4),
    ("qos-m", 5),
    ("qos-l", 6),
];

// =============================================================================
// Configuration
// =============================================================================

/// PLMN/gNB/UE identifiers one device IP resolves to
#[derive(Debug, Clone, Deserialize)]
pub struct CellScope {
    pub mcc: String,
    pub mnc: String,
    pub gnb_length: u32,
    pub gnb_id: u64,
    pub ran_ue_id: String,
}

/// Configuration for the RIC adapter
#[derive(Debug, Clone)]
pub struct RicConfig {
    pub base_url: String,
    pub scs_as_id: String,
    /// Device IP → radio scope; supplied at construction, no file reloads
    pub ip_mappings: BTreeMap<String, CellScope>,
}

// =============================================================================
// Adapter
// =============================================================================

pub struct RicAdapter {
    config: RicConfig,
    transport: TransportRef,
}

impl RicAdapter {
    pub fn new(mut config: RicConfig, transport: TransportRef) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        info!(
            "Initialized {} adapter (base_url: {}, scs_as_id: {}, {} mapped UEs)",
            BACKEND,
            config.base_url,
            config.scs_as_id,
            config.ip_mappings.len()
        );
        Self { config, transport }
    }

    // collection URL keeps its trailing slash to match the rApp's router
    fn collection_url(&self) -> String {
        format!(
            "{}/{}/oran-policies/",
            self.config.base_url, self.config.scs_as_id
        )
    }

    fn resource_url(&self, policy_id: &str) -> String {
        format!(
            "{}/{}/oran-policies/{}",
            self.config.base_url,
            self.config.scs_as_id,
            urlencoding::encode(policy_id)
        )
    }

    fn require(&self, needed: Capability) -> Result<()> {
        capability::ensure(BACKEND, CAPABILITIES, needed)
    }

    fn qos_mapping(&self, profile: &str) -> Result<(String, i64)> {
        QOS_MAPPINGS
            .iter()
            .find(|(name, _)| *name == profile)
            .map(|(name, flow_id)| (name.to_string(), *flow_id))
            .ok_or_else(|| {
                let supported = QOS_MAPPINGS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ");
                Error::InvalidArgument(format!(
                    "unsupported qosProfile '{}'; allowed: {}",
                    profile, supported
                ))
            })
    }

    /// Resolve the radio scope from the device's IPv4 candidates, public
    /// address first.
    fn resolve_scope(&self, request: &CreateSession) -> Result<&CellScope> {
        let device = request.device.as_ref().ok_or_else(|| {
            Error::InvalidArgument("device.ipv4Address (public/private) must be provided".into())
        })?;
        let ipv4 = device.ipv4_address.as_ref().ok_or_else(|| {
            Error::InvalidArgument("device.ipv4Address (public/private) must be provided".into())
        })?;

        let mut candidates = vec![ipv4.public_address.to_string()];
        if let Some(private) = ipv4.private_address {
            let private = private.to_string();
            if !candidates.contains(&private) {
                candidates.push(private);
            }
        }

        for candidate in &candidates {
            if let Some(scope) = self.config.ip_mappings.get(candidate) {
                return Ok(scope);
            }
        }
        Err(Error::InvalidArgument(format!(
            "no PLMN/gNB/UE mapping found for device IPs {}",
            candidates.join(", ")
        )))
    }

    fn build_policy(&self, request: &CreateSession) -> Result<OranPolicy> {
        let scope = self.resolve_scope(request)?;
        let (qos_prio, flow_id) = self.qos_mapping(&request.qos_profile)?;

        Ok(OranPolicy {
            policy_type: QOD_POLICY_TYPE.to_string(),
            policy_scope: PolicyScope {
                mcc: scope.mcc.clone(),
                mnc: scope.mnc.clone(),
                gnb_length: scope.gnb_length,
                gnb_id: scope.gnb_id,
                ran_ue_id: scope.ran_ue_id.clone(),
                flow_id,
            },
            policy_statement: PolicyStatement { qos_prio },
            expiry: request.duration,
            notification_uri: request.sink.clone(),
        })
    }
}

#[async_trait]
impl NetworkAdapter for RicAdapter {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    async fn create_qod_session(&self, request: &CreateSession) -> Result<SessionInfo> {
        self.require(Capability::Qod)?;
        request.validate()?;
        let policy = self.build_policy(request)?;

        let response = self
            .transport
            .request(
                Method::POST,
                &self.collection_url(),
                &[],
                Some(Payload::Json(serde_json::to_value(&policy)?)),
            )
            .await?;
        let response = error_for_status(response, "create RIC policy")?;

        let value: serde_json::Value = response.json()?;
        let session_id = policy_id(&value)
            .ok_or_else(|| Error::platform("RIC policy creation did not return an id"))?;
        info!("RIC QoD policy created [id={}]", session_id);

        Ok(SessionInfo::from_request(
            session_id,
            QosStatus::Requested,
            request,
        ))
    }

    async fn get_qod_session(&self, session_id: &str) -> Result<SessionInfo> {
        self.require(Capability::Qod)?;

        let response = self
            .transport
            .request(Method::GET, &self.resource_url(session_id), &[], None)
            .await?;
        let response = error_for_status(response, "get RIC policy")?;
        let value: serde_json::Value = response.json()?;

        // shape the response to CAMARA fields only; RIC internals
        // (policyScope, policyStatement) never leak to the caller
        let now = Utc::now();
        let duration = value.get("expiry").and_then(serde_json::Value::as_u64);
        Ok(SessionInfo {
            session_id: policy_id(&value).unwrap_or_else(|| session_id.to_string()),
            qos_status: QosStatus::Available,
            status_info: None,
            started_at: Some(now),
            expires_at: duration.map(|seconds| now + Duration::seconds(seconds as i64)),
            device: None,
            application_server: None,
            device_ports: None,
            application_server_ports: None,
            qos_profile: None,
            sink: value
                .get("notificationUri")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            duration,
        })
    }

    async fn delete_qod_session(&self, session_id: &str) -> Result<()> {
        self.require(Capability::Qod)?;

        let response = self
            .transport
            .request(Method::DELETE, &self.resource_url(session_id), &[], None)
            .await?;
        error_for_status(response, "delete RIC policy")?;
        info!("RIC QoD policy deleted [id={}]", session_id);
        Ok(())
    }

    async fn create_traffic_influence(
        &self,
        _request: &TrafficInfluence,
    ) -> Result<TrafficInfluence> {
        Err(Error::unsupported(Capability::TrafficInfluence, BACKEND))
    }

    async fn get_traffic_influence(&self, _resource_id: &str) -> Result<TrafficInfluence> {
        Err(Error::unsupported(Capability::TrafficInfluence, BACKEND))
    }

    async fn update_traffic_influence(
        &self,
        _resource_id: &str,
        _request: &TrafficInfluence,
    ) -> Result<TrafficInfluence> {
        Err(Error::unsupported(Capability::TrafficInfluence, BACKEND))
    }

    async fn list_traffic_influence(&self) -> Result<Vec<TrafficInfluence>> {
        Err(Error::unsupported(Capability::TrafficInfluence, BACKEND))
    }

    async fn delete_traffic_influence(&self, _resource_id: &str) -> Result<()> {
        Err(Error::unsupported(Capability::TrafficInfluence, BACKEND))
    }

    async fn retrieve_location(&self, _request: &RetrievalLocationRequest) -> Result<Location> {
        Err(Error::unsupported(Capability::LocationRetrieval, BACKEND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::device::{ApplicationServer, Device, DeviceIpv4Addr};
    use crate::transport::mock::MockTransport;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn config() -> RicConfig {
        let mut ip_mappings = BTreeMap::new();
        ip_mappings.insert(
            "192.168.1.10".to_string(),
            CellScope {
                mcc: "001".into(),
                mnc: "01".into(),
                gnb_length: 28,
                gnb_id: 12345,
                ran_ue_id: "0000000000000001".into(),
            },
        );
        RicConfig {
            base_url: "http://ric.example.com".into(),
            scs_as_id: "scs1".into(),
            ip_mappings,
        }
    }

    fn session_request(public_ip: &str) -> CreateSession {
        CreateSession {
            device: Some(Device {
                ipv4_address: Some(DeviceIpv4Addr {
                    public_address: public_ip.parse().unwrap(),
                    private_address: None,
                    public_port: None,
                }),
                ..Device::default()
            }),
            application_server: ApplicationServer {
                ipv4_address: Some("198.51.100.1".into()),
                ipv6_address: None,
            },
            device_ports: None,
            application_server_ports: None,
            qos_profile: "qos-e".into(),
            sink: Some("https://consumer.example.com/qod".into()),
            duration: Some(600),
        }
    }

    #[tokio::test]
    async fn test_create_builds_policy_from_scope_table() {
        let transport = MockTransport::new();
        transport.push(201, json!({"policy_id": "pol-77"}));
        let adapter = RicAdapter::new(config(), transport.clone());

        let session = adapter
            .create_qod_session(&session_request("192.168.1.10"))
            .await
            .unwrap();
        assert_eq!(session.session_id, "pol-77");
        assert_eq!(session.qos_status, QosStatus::Requested);

        let recorded = transport.requests();
        assert_eq!(recorded[0].url, "http://ric.example.com/scs1/oran-policies/");
        let body = recorded[0].body.clone().unwrap();
        assert_eq!(body["policyType"], "qod_prb_prio");
        assert_eq!(body["policyScope"]["gnb_id"], 12345);
        assert_eq!(body["policyScope"]["flow_id"], 3);
        assert_eq!(body["policyStatement"]["qos_prio"], "qos-e");
        assert_eq!(body["expiry"], 600);
    }

    #[tokio::test]
    async fn test_unmapped_device_fails_before_io() {
        let transport = MockTransport::new();
        let adapter = RicAdapter::new(config(), transport.clone());

        let err = adapter
            .create_qod_session(&session_request("10.10.99.99"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidArgument(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_get_reports_available_without_leaking_scope() {
        let transport = MockTransport::new();
        transport.push(
            200,
            json!({
                "policyId": "pol-77",
                "expiry": 600,
                "notificationUri": "https://consumer.example.com/qod",
                "policyScope": {"gnb_id": 12345}
            }),
        );
        let adapter = RicAdapter::new(config(), transport.clone());

        let session = adapter.get_qod_session("pol-77").await.unwrap();
        assert_eq!(session.session_id, "pol-77");
        assert_eq!(session.qos_status, QosStatus::Available);
        assert!(session.started_at.is_some());
        assert!(session.expires_at.is_some());
        assert_eq!(session.sink.as_deref(), Some("https://consumer.example.com/qod"));
    }

    #[tokio::test]
    async fn test_traffic_influence_rejected_without_io() {
        let transport = MockTransport::new();
        let adapter = RicAdapter::new(config(), transport.clone());

        let err = adapter.list_traffic_influence().await.unwrap_err();
        assert_matches!(err, Error::CapabilityNotSupported { .. });
        assert_eq!(transport.request_count(), 0);
    }
}
