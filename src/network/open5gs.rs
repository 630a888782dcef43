//! Open5GS core hooks
//!
//! Open5GS's NEF supports QoD and location retrieval. QoS profiles map to
//! fixed flow identifiers, and location retrieval rides on monitoring-event
//! subscriptions keyed by MSISDN.

use tracing::debug;

use crate::domain::capability::Capability;
use crate::error::{Error, Result};
use crate::network::nef::{NefAdapter, NefCore};
use crate::network::wire::{
    build_flows, LocationType, MonitoringEventRequest, MonitoringType, QosSubscription,
};
use crate::schema::location::RetrievalLocationRequest;
use crate::schema::qod::CreateSession;
use crate::transport::TransportRef;

/// QoS profile → NEF flow identifier
const QOS_FLOW_IDS: &[(&str, i64)] = &[
    ("qos-e", 3),
    ("qos-s", 4),
    ("qos-m", 5),
    ("qos-l", 6),
];

/// Feature bitmap the Open5GS NEF expects on QoS subscriptions
const SUPPORTED_FEATURES: &str = "003C";

/// Monitoring-event reports are delivered to the local callback endpoint.
const LOCATION_NOTIFICATION_SINK: &str = "http://127.0.0.1:8001";

fn flow_id_for(profile: &str) -> Option<i64> {
    QOS_FLOW_IDS
        .iter()
        .find(|(name, _)| *name == profile)
        .map(|(_, id)| *id)
}

fn supported_profiles() -> String {
    QOS_FLOW_IDS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct Open5gsCore;

impl NefCore for Open5gsCore {
    const BACKEND: &'static str = "open5gs";

    fn capabilities() -> &'static [Capability] {
        &[Capability::Qod, Capability::LocationRetrieval]
    }

    fn validate_qod(&self, request: &CreateSession) -> Result<()> {
        if flow_id_for(&request.qos_profile).is_none() {
            return Err(Error::InvalidArgument(format!(
                "open5gs only supports these qos-profiles: {}",
                supported_profiles()
            )));
        }
        Ok(())
    }

    fn extend_qod(
        &self,
        request: &CreateSession,
        subscription: &mut QosSubscription,
    ) -> Result<()> {
        subscription.supported_features = Some(SUPPORTED_FEATURES.to_string());
        let flow_id = flow_id_for(&request.qos_profile).ok_or_else(|| {
            Error::InvalidArgument(format!("unmapped QoS profile '{}'", request.qos_profile))
        })?;
        subscription.flow_info = Some(build_flows(flow_id, request)?);
        Ok(())
    }

    fn validate_location(&self, request: &RetrievalLocationRequest) -> Result<()> {
        let device = request.device.as_ref().ok_or_else(|| {
            Error::InvalidArgument("open5gs requires a device for location retrieval".into())
        })?;
        if device.phone_number.is_none() {
            return Err(Error::InvalidArgument(
                "open5gs requires device.phoneNumber for location retrieval".into(),
            ));
        }
        Ok(())
    }

    fn location_request(
        &self,
        request: &RetrievalLocationRequest,
    ) -> Result<MonitoringEventRequest> {
        let msisdn = request
            .device
            .as_ref()
            .and_then(|device| device.msisdn())
            .ok_or_else(|| {
                Error::InvalidArgument(
                    "open5gs requires device.phoneNumber for location retrieval".into(),
                )
            })?;
        debug!("building monitoring-event subscription for msisdn {}", msisdn);

        Ok(MonitoringEventRequest {
            msisdn: Some(msisdn),
            external_id: None,
            ipv4_addr: None,
            ipv6_addr: None,
            notification_destination: LOCATION_NOTIFICATION_SINK.to_string(),
            monitoring_type: MonitoringType::LocationReporting,
            location_type: Some(LocationType::LastKnown),
            maximum_number_of_reports: None,
        })
    }
}

/// Adapter type for the Open5GS NEF
pub type Open5gsAdapter = NefAdapter<Open5gsCore>;

pub fn new_adapter(base_url: &str, scs_as_id: &str, transport: TransportRef) -> Open5gsAdapter {
    NefAdapter::new(Open5gsCore, base_url, scs_as_id, transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NetworkAdapter;
    use crate::schema::device::{ApplicationServer, Device};
    use crate::transport::mock::MockTransport;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn location_request(phone: &str) -> RetrievalLocationRequest {
        RetrievalLocationRequest {
            device: Some(Device {
                phone_number: Some(phone.into()),
                ..Device::default()
            }),
            max_age: None,
            max_surface: None,
        }
    }

    #[tokio::test]
    async fn test_location_subscription_shape() {
        let transport = MockTransport::new();
        transport.push(
            200,
            json!({
                "msisdn": "306912345678",
                "monitoringType": "LOCATION_REPORTING",
                "eventTime": "2025-06-18T12:30:00Z",
                "locationInfo": {
                    "geographicArea": {
                        "polygon": {
                            "point_list": {
                                "geographical_coords": [
                                    {"lon": 7.0, "lat": 50.0},
                                    {"lon": 7.1, "lat": 50.0},
                                    {"lon": 7.0, "lat": 50.1}
                                ]
                            }
                        }
                    }
                }
            }),
        );
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let location = adapter
            .retrieve_location(&location_request("+306912345678"))
            .await
            .unwrap();
        assert_matches!(
            location.area,
            crate::schema::location::Area::Polygon { .. }
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "http://nef.example.com/3gpp-monitoring-event/v1/scs1/subscriptions"
        );
        let body = requests[0].body.as_ref().unwrap();
        // leading '+' stripped, last-known location requested
        assert_eq!(body["msisdn"], "306912345678");
        assert_eq!(body["locationType"], "LAST_KNOWN_LOCATION");
        assert_eq!(body["monitoringType"], "LOCATION_REPORTING");
    }

    #[tokio::test]
    async fn test_location_requires_phone_number() {
        let transport = MockTransport::new();
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let request = RetrievalLocationRequest {
            device: Some(Device {
                ipv4_address: None,
                network_access_identifier: Some("ue1@example.com".into()),
                ..Device::default()
            }),
            max_age: None,
            max_surface: None,
        };
        let err = adapter.retrieve_location(&request).await.unwrap_err();
        assert_matches!(err, Error::InvalidArgument(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_profile_rejected_before_io() {
        let transport = MockTransport::new();
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let request = CreateSession {
            device: None,
            application_server: ApplicationServer {
                ipv4_address: Some("198.51.100.1".into()),
                ipv6_address: None,
            },
            device_ports: None,
            application_server_ports: None,
            qos_profile: "gold".into(),
            sink: None,
            duration: Some(60),
        };
        let err = adapter.create_qod_session(&request).await.unwrap_err();
        assert_matches!(err, Error::InvalidArgument(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_traffic_influence_not_supported() {
        let transport = MockTransport::new();
        let adapter = new_adapter("http://nef.example.com", "scs1", transport.clone());

        let err = adapter.list_traffic_influence().await.unwrap_err();
        assert_matches!(
            err,
            Error::CapabilityNotSupported { capability, .. }
                if capability == Capability::TrafficInfluence
        );
        // the guard fires before any network call
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_qos_profile_to_flow_id_table() {
        assert_eq!(flow_id_for("qos-e"), Some(3));
        assert_eq!(flow_id_for("qos-l"), Some(6));
        assert_eq!(flow_id_for("platinum"), None);
    }
}
