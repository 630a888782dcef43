//! Shared NEF engine
//!
//! The 5G-core family (Open5GS, OAI, Open5GCore, CoreSim) all expose
//! NEF-style northbound APIs that differ only in validation rules and a
//! handful of mandatory fields. The engine owns the canonical/wire
//! transformation and the call sequencing; each core contributes a
//! [`NefCore`] hook implementation for its specifics.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::capability::{self, Capability};
use crate::domain::ports::NetworkAdapter;
use crate::error::{Error, Result};
use crate::network::wire::{
    host_flow_descriptor, location_from_report, server_ip_from_descriptor, MonitoringEventReport,
    MonitoringEventRequest, QosSubscription, TrafficInfluenceSubscription, UsageThreshold,
};
use crate::schema::device::{ApplicationServer, Device, DeviceIpv4Addr};
use crate::schema::location::{Location, RetrievalLocationRequest};
use crate::schema::qod::{CreateSession, QosStatus, SessionInfo};
use crate::schema::traffic_influence::TrafficInfluence;
use crate::transport::{error_for_status, Payload, TransportRef, WireResponse};

// =============================================================================
// Core Hooks
// =============================================================================

/// Extension points a concrete 5G core plugs into the shared engine.
///
/// Validation hooks run before any payload is built; extension hooks run
/// after the engine has populated the shared fields and before the wire
/// call.
pub trait NefCore: Send + Sync {
    /// Backend name used in errors and logs
    const BACKEND: &'static str;

    /// Declared canonical capabilities
    fn capabilities() -> &'static [Capability];

    fn validate_qod(&self, _request: &CreateSession) -> Result<()> {
        Ok(())
    }

    fn extend_qod(
        &self,
        _request: &CreateSession,
        _subscription: &mut QosSubscription,
    ) -> Result<()> {
        Ok(())
    }

    fn validate_traffic_influence(&self, _request: &TrafficInfluence) -> Result<()> {
        Ok(())
    }

    fn extend_traffic_influence(
        &self,
        _request: &TrafficInfluence,
        _subscription: &mut TrafficInfluenceSubscription,
    ) -> Result<()> {
        Ok(())
    }

    fn validate_location(&self, _request: &RetrievalLocationRequest) -> Result<()> {
        Ok(())
    }

    /// Build the monitoring-event subscription for this core. Cores without
    /// the capability never get here: the guard rejects the call first.
    fn location_request(
        &self,
        _request: &RetrievalLocationRequest,
    ) -> Result<MonitoringEventRequest> {
        Err(Error::unsupported(
            Capability::LocationRetrieval,
            Self::BACKEND,
        ))
    }
}

// =============================================================================
// NEF Adapter
// =============================================================================

/// Network adapter speaking the NEF dialect, generic over the core hooks.
pub struct NefAdapter<C: NefCore> {
    core: C,
    base_url: String,
    scs_as_id: String,
    transport: TransportRef,
}

impl<C: NefCore> NefAdapter<C> {
    pub fn new(core: C, base_url: &str, scs_as_id: &str, transport: TransportRef) -> Self {
        info!(
            "Initialized {} network adapter (base_url: {}, scs_as_id: {})",
            C::BACKEND,
            base_url,
            scs_as_id
        );
        Self {
            core,
            base_url: base_url.trim_end_matches('/').to_string(),
            scs_as_id: scs_as_id.to_string(),
            transport,
        }
    }

    fn require(&self, needed: Capability) -> Result<()> {
        capability::ensure(C::BACKEND, C::capabilities(), needed)
    }

    // --- URL building ------------------------------------------------------

    fn collection_url(&self, api: &str) -> String {
        format!(
            "{}/{}/v1/{}/subscriptions",
            self.base_url, api, self.scs_as_id
        )
    }

    fn resource_url(&self, api: &str, id: &str) -> String {
        format!(
            "{}/{}/v1/{}/subscriptions/{}",
            self.base_url,
            api,
            self.scs_as_id,
            urlencoding::encode(id)
        )
    }

    // --- Wire helpers ------------------------------------------------------

    async fn send_json(
        &self,
        method: Method,
        url: &str,
        payload: Option<&impl Serialize>,
        context: &str,
    ) -> Result<WireResponse> {
        let body = match payload {
            Some(payload) => Some(Payload::Json(serde_json::to_value(payload)?)),
            None => None,
        };
        let response = self.transport.request(method, url, &[], body).await?;
        error_for_status(response, context)
    }

    // --- Forward transforms ------------------------------------------------

    fn build_qod_subscription(&self, request: &CreateSession) -> Result<QosSubscription> {
        let mut subscription = QosSubscription {
            notification_destination: request.sink.clone(),
            qos_reference: Some(request.qos_profile.clone()),
            ue_ipv4_addr: request.device.as_ref().and_then(Device::public_ipv4),
            ue_ipv6_addr: request.device.as_ref().and_then(|device| device.ipv6_address),
            usage_threshold: request.duration.map(|duration| UsageThreshold {
                duration: Some(duration),
                total_volume: None,
            }),
            ..QosSubscription::default()
        };
        self.core.extend_qod(request, &mut subscription)?;
        Ok(subscription)
    }

    fn build_ti_subscription(
        &self,
        request: &TrafficInfluence,
    ) -> Result<TrafficInfluenceSubscription> {
        let device_ip = request.ue_ipv4()?;
        // the app instance id doubles as the instance's IPv4 address on
        // core-network backends
        let descriptor = host_flow_descriptor(&device_ip, &request.app_instance_id);

        let mut subscription = TrafficInfluenceSubscription {
            af_app_id: request.app_id.clone(),
            ipv4_addr: Some(device_ip.to_string()),
            notification_destination: request.notification_uri.clone(),
            ..TrafficInfluenceSubscription::default()
        };
        subscription.add_flow_descriptor(&descriptor);
        if let Some(zone_id) = &request.edge_cloud_zone_id {
            subscription.add_traffic_route(zone_id);
        }
        self.core.extend_traffic_influence(request, &mut subscription)?;
        Ok(subscription)
    }

    fn build_location_subscription(
        &self,
        request: &RetrievalLocationRequest,
    ) -> Result<MonitoringEventRequest> {
        let mut subscription = self.core.location_request(request)?;
        if let Some(device) = &request.device {
            if subscription.external_id.is_none() {
                subscription.external_id = device.network_access_identifier.clone();
            }
            if subscription.ipv4_addr.is_none() {
                subscription.ipv4_addr = device.public_ipv4();
            }
            if subscription.ipv6_addr.is_none() {
                subscription.ipv6_addr = device.ipv6_address;
            }
        }
        Ok(subscription)
    }

    // --- Reverse transforms ------------------------------------------------

    fn session_from_subscription(
        &self,
        session_id: &str,
        subscription: QosSubscription,
    ) -> SessionInfo {
        let device = subscription.ue_ipv4_addr.map(|addr| Device {
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: addr,
                private_address: Some(addr),
                public_port: None,
            }),
            ..Device::default()
        });

        // server address only exists inside the flow descriptor
        let application_server = subscription
            .flow_info
            .as_ref()
            .and_then(|flows| flows.first())
            .and_then(|flow| flow.flow_descriptions.as_ref())
            .and_then(|descriptions| descriptions.first())
            .and_then(|descriptor| server_ip_from_descriptor(descriptor).ok())
            .map(|ipv4| ApplicationServer {
                ipv4_address: Some(ipv4),
                ipv6_address: None,
            });

        SessionInfo {
            session_id: subscription
                .subscription_id()
                .unwrap_or_else(|_| session_id.to_string()),
            qos_status: QosStatus::Available,
            status_info: None,
            started_at: None,
            expires_at: None,
            device,
            application_server,
            device_ports: None,
            application_server_ports: None,
            qos_profile: subscription.qos_reference,
            sink: subscription.notification_destination,
            duration: subscription
                .usage_threshold
                .and_then(|threshold| threshold.duration),
        }
    }

    fn traffic_influence_from_subscription(
        &self,
        resource_id: Option<&str>,
        subscription: TrafficInfluenceSubscription,
    ) -> Result<TrafficInfluence> {
        let descriptor = subscription
            .traffic_filters
            .as_ref()
            .and_then(|filters| filters.first())
            .and_then(|filter| filter.flow_descriptions.as_ref())
            .and_then(|descriptions| descriptions.first())
            .ok_or_else(|| Error::platform("traffic influence response carries no flow filter"))?;
        let server_ip = server_ip_from_descriptor(descriptor)?;

        let zone_id = subscription
            .traffic_routes
            .as_ref()
            .and_then(|routes| routes.first())
            .map(|route| route.dnai.clone());

        let device_ip = subscription
            .ipv4_addr
            .as_deref()
            .and_then(|addr| addr.parse().ok());

        Ok(TrafficInfluence {
            traffic_influence_id: subscription
                .resource_id()
                .ok()
                .or_else(|| resource_id.map(str::to_string)),
            api_consumer_id: None,
            app_id: subscription.af_app_id.clone(),
            app_instance_id: server_ip,
            edge_cloud_region: None,
            edge_cloud_zone_id: zone_id,
            source_traffic_filters: None,
            destination_traffic_filters: None,
            notification_uri: subscription.notification_destination.clone(),
            device: Device {
                ipv4_address: device_ip.map(|addr| DeviceIpv4Addr {
                    public_address: addr,
                    private_address: Some(addr),
                    public_port: None,
                }),
                ..Device::default()
            },
        })
    }
}

// =============================================================================
// Canonical Operations
// =============================================================================

#[async_trait]
impl<C: NefCore> NetworkAdapter for NefAdapter<C> {
    fn backend_name(&self) -> &'static str {
        C::BACKEND
    }

    fn capabilities(&self) -> &'static [Capability] {
        C::capabilities()
    }

    async fn create_qod_session(&self, request: &CreateSession) -> Result<SessionInfo> {
        self.require(Capability::Qod)?;
        request.validate()?;
        self.core.validate_qod(request)?;

        let subscription = self.build_qod_subscription(request)?;
        let response = self
            .send_json(
                Method::POST,
                &self.collection_url("3gpp-as-session-with-qos"),
                Some(&subscription),
                "create QoD session",
            )
            .await?;

        let created: QosSubscription = response.json()?;
        let session_id = created.subscription_id()?;
        info!("QoD session created [id={}]", session_id);

        Ok(SessionInfo::from_request(
            session_id,
            QosStatus::Requested,
            request,
        ))
    }

    async fn get_qod_session(&self, session_id: &str) -> Result<SessionInfo> {
        self.require(Capability::Qod)?;

        let response = self
            .send_json(
                Method::GET,
                &self.resource_url("3gpp-as-session-with-qos", session_id),
                None::<&()>,
                "get QoD session",
            )
            .await?;

        let subscription: QosSubscription = response.json()?;
        Ok(self.session_from_subscription(session_id, subscription))
    }

    async fn delete_qod_session(&self, session_id: &str) -> Result<()> {
        self.require(Capability::Qod)?;

        self.send_json(
            Method::DELETE,
            &self.resource_url("3gpp-as-session-with-qos", session_id),
            None::<&()>,
            "delete QoD session",
        )
        .await?;
        info!("QoD session deleted [id={}]", session_id);
        Ok(())
    }

    async fn create_traffic_influence(
        &self,
        request: &TrafficInfluence,
    ) -> Result<TrafficInfluence> {
        self.require(Capability::TrafficInfluence)?;
        request.validate()?;
        self.core.validate_traffic_influence(request)?;

        let subscription = self.build_ti_subscription(request)?;
        let response = self
            .send_json(
                Method::POST,
                &self.collection_url("3gpp-traffic-influence"),
                Some(&subscription),
                "create traffic influence",
            )
            .await?;

        let created: TrafficInfluenceSubscription = response.json()?;
        let resource_id = created.resource_id()?;
        info!("Traffic influence resource created [id={}]", resource_id);

        Ok(request.with_id(resource_id))
    }

    async fn get_traffic_influence(&self, resource_id: &str) -> Result<TrafficInfluence> {
        self.require(Capability::TrafficInfluence)?;

        let response = self
            .send_json(
                Method::GET,
                &self.resource_url("3gpp-traffic-influence", resource_id),
                None::<&()>,
                "get traffic influence",
            )
            .await?;

        let subscription: TrafficInfluenceSubscription = response.json()?;
        self.traffic_influence_from_subscription(Some(resource_id), subscription)
    }

    async fn update_traffic_influence(
        &self,
        resource_id: &str,
        request: &TrafficInfluence,
    ) -> Result<TrafficInfluence> {
        self.require(Capability::TrafficInfluence)?;
        request.validate()?;
        self.core.validate_traffic_influence(request)?;

        let subscription = self.build_ti_subscription(request)?;
        self.send_json(
            Method::PUT,
            &self.resource_url("3gpp-traffic-influence", resource_id),
            Some(&subscription),
            "update traffic influence",
        )
        .await?;

        Ok(request.with_id(resource_id))
    }

    async fn list_traffic_influence(&self) -> Result<Vec<TrafficInfluence>> {
        self.require(Capability::TrafficInfluence)?;

        let response = self
            .send_json(
                Method::GET,
                &self.collection_url("3gpp-traffic-influence"),
                None::<&()>,
                "list traffic influence",
            )
            .await?;

        let subscriptions: Vec<TrafficInfluenceSubscription> = response.json()?;
        subscriptions
            .into_iter()
            .map(|subscription| self.traffic_influence_from_subscription(None, subscription))
            .collect()
    }

    async fn delete_traffic_influence(&self, resource_id: &str) -> Result<()> {
        self.require(Capability::TrafficInfluence)?;

        self.send_json(
            Method::DELETE,
            &self.resource_url("3gpp-traffic-influence", resource_id),
            None::<&()>,
            "delete traffic influence",
        )
        .await?;
        debug!("Traffic influence resource deleted [id={}]", resource_id);
        Ok(())
    }

    async fn retrieve_location(&self, request: &RetrievalLocationRequest) -> Result<Location> {
        self.require(Capability::LocationRetrieval)?;
        request.validate()?;
        self.core.validate_location(request)?;

        let subscription = self.build_location_subscription(request)?;
        let response = self
            .send_json(
                Method::POST,
                &self.collection_url("3gpp-monitoring-event"),
                Some(&subscription),
                "retrieve location",
            )
            .await?;

        let report: MonitoringEventReport = response.json()?;
        location_from_report(&report)
    }
}
