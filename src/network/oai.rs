//! OAI core hooks
//!
//! The OAI NEF filters on host addresses rather than full port matrices:
//! QoD carries a single `permit out` descriptor, and both QoD and traffic
//! influence must name the default OAI data network and slice.

use crate::domain::capability::Capability;
use crate::error::{Error, Result};
use crate::network::nef::{NefAdapter, NefCore};
use crate::network::wire::{
    host_flow_descriptor, FlowInfo, QosSubscription, Snssai, TrafficInfluenceSubscription,
};
use crate::schema::qod::CreateSession;
use crate::schema::traffic_influence::TrafficInfluence;
use crate::transport::TransportRef;

const SUPPORTED_PROFILES: &[&str] = &["qos-e", "qos-s", "qos-m", "qos-l"];

/// Data network name the OAI core serves
const DNN: &str = "oai";

pub struct OaiCore {
    /// Forwarded as `afServiceId` on traffic influence subscriptions
    scs_as_id: String,
}

impl NefCore for OaiCore {
    const BACKEND: &'static str = "oai";

    fn capabilities() -> &'static [Capability] {
        &[Capability::Qod, Capability::TrafficInfluence]
    }

    fn validate_qod(&self, request: &CreateSession) -> Result<()> {
        if !SUPPORTED_PROFILES.contains(&request.qos_profile.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "QoS profile '{}' not supported by oai, supported profiles are {}",
                request.qos_profile,
                SUPPORTED_PROFILES.join(", ")
            )));
        }
        let device_ip = request.device.as_ref().and_then(|device| device.flow_ipv4());
        if device_ip.is_none() {
            return Err(Error::InvalidArgument(
                "oai requires a UE IPv4 address to activate QoS".into(),
            ));
        }
        if request.application_server.ipv4_address.is_none() {
            return Err(Error::InvalidArgument(
                "oai requires an application server IPv4 address to activate QoS".into(),
            ));
        }
        Ok(())
    }

    fn extend_qod(
        &self,
        request: &CreateSession,
        subscription: &mut QosSubscription,
    ) -> Result<()> {
        let device_ip = request
            .device
            .as_ref()
            .and_then(|device| device.flow_ipv4())
            .ok_or_else(|| Error::InvalidArgument("oai requires a UE IPv4 address".into()))?;
        let server_ip = request
            .application_server
            .ipv4_base()
            .ok_or_else(|| {
                Error::InvalidArgument("oai requires an application server IPv4 address".into())
            })?;

        subscription.flow_info = Some(vec![FlowInfo {
            flow_id: 1,
            flow_descriptions: Some(vec![host_flow_descriptor(&device_ip, server_ip)]),
        }]);
        subscription.snssai = Some(Snssai::new(1, "FFFFFF"));
        subscription.dnn = Some(DNN.to_string());
        Ok(())
    }

    fn validate_traffic_influence(&self, request: &TrafficInfluence) -> Result<()> {
        request.ue_ipv4().map_err(|_| {
            Error::InvalidArgument(
                "oai requires a UE IPv4 address to activate traffic influence".into(),
            )
        })?;
        Ok(())
    }

    fn extend_traffic_influence(
        &self,
        _request: &TrafficInfluence,
        subscription: &mut TrafficInfluenceSubscription,
    ) -> Result<()> {
        subscription.dnn = Some(DNN.to_string());
        subscription.snssai = Some(Snssai::new(1, "FFFFFF"));
        subscription.af_service_id = Some(self.scs_as_id.clone());
        Ok(())
    }
}

/// Adapter type for the OAI NEF
pub type OaiAdapter = NefAdapter<OaiCore>;

pub fn new_adapter(base_url: &str, scs_as_id: &str, transport: TransportRef) -> OaiAdapter {
    let core = OaiCore {
        scs_as_id: scs_as_id.to_string(),
    };
    NefAdapter::new(core, base_url, scs_as_id, transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NetworkAdapter;
    use crate::schema::device::{ApplicationServer, Device, DeviceIpv4Addr};
    use crate::transport::mock::MockTransport;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn device(private: &str) -> Device {
        Device {
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: "203.0.113.7".parse().unwrap(),
                private_address: Some(private.parse().unwrap()),
                public_port: None,
            }),
            ..Device::default()
        }
    }

    fn session_request() -> CreateSession {
        CreateSession {
            device: Some(device("10.0.0.100")),
            application_server: ApplicationServer {
                ipv4_address: Some("10.0.0.1".into()),
                ipv6_address: None,
            },
            device_ports: None,
            application_server_ports: None,
            qos_profile: "qos-m".into(),
            sink: Some("https://consumer.example.com/qod".into()),
            duration: Some(3600),
        }
    }

    #[tokio::test]
    async fn test_qod_payload_carries_oai_specifics() {
        let transport = MockTransport::new();
        transport.push(
            201,
            json!({
                "self": "http://nef/3gpp-as-session-with-qos/v1/scs1/subscriptions/abc-1"
            }),
        );
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let session = adapter.create_qod_session(&session_request()).await.unwrap();
        assert_eq!(session.session_id, "abc-1");
        assert_eq!(session.qos_status, crate::schema::qod::QosStatus::Requested);

        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["dnn"], "oai");
        assert_eq!(body["snssai"]["sst"], 1);
        assert_eq!(body["snssai"]["sd"], "FFFFFF");
        assert_eq!(
            body["flowInfo"][0]["flowDescriptions"][0],
            "permit out ip from 10.0.0.100/32 to 10.0.0.1/32"
        );
        // the private address drives the descriptor, the public one the UE field
        assert_eq!(body["ueIpv4Addr"], "203.0.113.7");
    }

    #[tokio::test]
    async fn test_qod_requires_server_ipv4() {
        let transport = MockTransport::new();
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let mut request = session_request();
        request.application_server = ApplicationServer {
            ipv4_address: None,
            ipv6_address: Some("2001:db8::1".into()),
        };
        let err = adapter.create_qod_session(&request).await.unwrap_err();
        assert_matches!(err, Error::InvalidArgument(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_traffic_influence_sets_service_id() {
        let transport = MockTransport::new();
        transport.push(
            201,
            json!({
                "self": "http://nef/3gpp-traffic-influence/v1/scs1/subscriptions/ti-9",
                "afAppId": "video-analytics"
            }),
        );
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let request = TrafficInfluence {
            traffic_influence_id: None,
            api_consumer_id: None,
            app_id: "video-analytics".into(),
            app_instance_id: "10.0.0.1".into(),
            edge_cloud_region: None,
            edge_cloud_zone_id: Some("edge-zone-1".into()),
            source_traffic_filters: None,
            destination_traffic_filters: None,
            notification_uri: Some("https://consumer.example.com/ti".into()),
            device: device("10.0.0.100"),
        };
        let created = adapter.create_traffic_influence(&request).await.unwrap();
        assert_eq!(created.traffic_influence_id.as_deref(), Some("ti-9"));

        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["afServiceId"], "scs1");
        assert_eq!(body["dnn"], "oai");
        assert_eq!(body["trafficRoutes"][0]["dnai"], "edge-zone-1");
        assert_eq!(
            body["trafficFilters"][0]["flowDescriptions"][0],
            "permit out ip from 10.0.0.100/32 to 10.0.0.1/32"
        );
    }

    #[tokio::test]
    async fn test_location_not_supported() {
        let transport = MockTransport::new();
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let err = adapter
            .retrieve_location(&Default::default())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            Error::CapabilityNotSupported { capability, .. }
                if capability == Capability::LocationRetrieval
        );
        assert_eq!(transport.request_count(), 0);
    }
}
