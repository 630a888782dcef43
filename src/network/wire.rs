//! 3GPP NEF wire models
//!
//! Request/response shapes of the northbound NEF APIs the core-network
//! family speaks: AsSessionWithQoS (TS 29.122), TrafficInfluence and
//! MonitoringEvent. Field names follow the 3GPP JSON spelling, so serde
//! renames are explicit where they diverge from Rust convention.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};
use crate::schema::location::{Area, Location, Point};
use crate::schema::qod::CreateSession;

// =============================================================================
// Shared Wire Pieces
// =============================================================================

/// Packet filter set of one IP flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInfo {
    pub flow_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_descriptions: Option<Vec<String>>,
}

/// Usage bounds of a QoS subscription; only the duration is driven by the
/// canonical model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageThreshold {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<u64>,
}

/// Network slice selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snssai {
    pub sst: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd: Option<String>,
}

impl Snssai {
    pub fn new(sst: i32, sd: &str) -> Self {
        Self {
            sst,
            sd: Some(sd.to_string()),
        }
    }
}

/// Subscription id is the last segment of a `self` link; absence of the
/// link is a backend contract violation.
pub fn id_from_self_link(self_link: Option<&str>) -> Result<String> {
    let link = self_link
        .filter(|link| !link.is_empty())
        .ok_or_else(|| Error::platform("backend response carries no 'self' link"))?;
    let id = link.rsplit('/').next().unwrap_or(link);
    if id.is_empty() {
        return Err(Error::platform(format!(
            "'self' link '{}' has no resource segment",
            link
        )));
    }
    Ok(id.to_string())
}

// =============================================================================
// AsSessionWithQoS
// =============================================================================

/// AsSessionWithQoS subscription, both request and response shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosSubscription {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_info: Option<Vec<FlowInfo>>,
    /// Pre-defined QoS information the core applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_ipv4_addr: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_ipv6_addr: Option<Ipv6Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snssai: Option<Snssai>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_threshold: Option<UsageThreshold>,
}

impl QosSubscription {
    pub fn subscription_id(&self) -> Result<String> {
        id_from_self_link(self.self_link.as_deref())
    }
}

// =============================================================================
// Traffic Influence
// =============================================================================

/// Routing target (data network access identifier)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficRoute {
    pub dnai: String,
}

/// TrafficInfluence subscription, both request and response shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficInfluenceSubscription {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub af_service_id: Option<String>,
    pub af_app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snssai: Option<Snssai>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_filters: Option<Vec<FlowInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_routes: Option<Vec<TrafficRoute>>,
}

impl TrafficInfluenceSubscription {
    pub fn add_flow_descriptor(&mut self, descriptor: &str) {
        self.traffic_filters = Some(vec![FlowInfo {
            flow_id: 1,
            flow_descriptions: Some(vec![descriptor.to_string()]),
        }]);
    }

    pub fn add_traffic_route(&mut self, dnai: &str) {
        self.traffic_routes = Some(vec![TrafficRoute {
            dnai: dnai.to_string(),
        }]);
    }

    pub fn resource_id(&self) -> Result<String> {
        id_from_self_link(self.self_link.as_deref())
    }
}

// =============================================================================
// Monitoring Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitoringType {
    #[serde(rename = "LOCATION_REPORTING")]
    LocationReporting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    #[serde(rename = "LAST_KNOWN_LOCATION")]
    LastKnown,
    #[serde(rename = "CURRENT_LOCATION")]
    CurrentLocation,
}

/// Monitoring event subscription request (T8)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringEventRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msisdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_addr: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_addr: Option<Ipv6Addr>,
    pub notification_destination: String,
    pub monitoring_type: MonitoringType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<LocationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_number_of_reports: Option<u32>,
}

/// Elapsed time since last network contact, minutes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurationMin {
    pub duration: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeographicalCoordinates {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointList {
    pub geographical_coords: Vec<GeographicalCoordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NefPolygon {
    pub point_list: PointList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographicArea {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<NefPolygon>,
}

/// User location block of a monitoring event report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_of_location_info: Option<DurationMin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_area: Option<GeographicArea>,
}

/// Monitoring event report returned by the NEF
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringEventReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msisdn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_info: Option<LocationInfo>,
    pub monitoring_type: MonitoringType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
}

/// Reverse transform: monitoring event report → canonical location.
///
/// `lastLocationTime` is the event time minus the reported age of the
/// location information.
pub fn location_from_report(report: &MonitoringEventReport) -> Result<Location> {
    let location_info = report
        .location_info
        .as_ref()
        .ok_or_else(|| Error::platform("monitoring event report carries no location info"))?;

    let polygon = location_info
        .geographic_area
        .as_ref()
        .and_then(|area| area.polygon.as_ref())
        .ok_or_else(|| Error::platform("monitoring event report carries no geographic area"))?;

    let boundary: Vec<Point> = polygon
        .point_list
        .geographical_coords
        .iter()
        .map(|coords| Point {
            latitude: coords.lat,
            longitude: coords.lon,
        })
        .collect();

    let event_time = report.event_time.unwrap_or_else(Utc::now);
    let age_minutes = location_info
        .age_of_location_info
        .as_ref()
        .map(|age| age.duration)
        .unwrap_or(0);

    let area = Area::Polygon { boundary };
    area.validate()?;

    Ok(Location {
        last_location_time: event_time - Duration::minutes(age_minutes),
        area,
    })
}

// =============================================================================
// Flow Descriptors
// =============================================================================

/// Port tokens for flow descriptors; an absent spec matches everything.
pub fn flatten_port_spec(spec: Option<&crate::schema::device::PortsSpec>) -> Vec<String> {
    let mut tokens = Vec::new();
    if let Some(spec) = spec {
        if let Some(ports) = &spec.ports {
            tokens.extend(ports.iter().map(|port| port.to_string()));
        }
        if let Some(ranges) = &spec.ranges {
            tokens.extend(ranges.iter().map(|range| format!("{}-{}", range.from, range.to)));
        }
    }
    if tokens.is_empty() {
        tokens.push("0-65535".to_string());
    }
    tokens
}

/// Build bidirectional flow descriptors for every device/server port
/// combination, collapsed into a single `FlowInfo` entry.
pub fn build_flows(flow_id: i64, request: &CreateSession) -> Result<Vec<FlowInfo>> {
    let device_ip: String = match &request.device {
        Some(device) => match device.flow_ipv4() {
            Some(ipv4) => ipv4.to_string(),
            None => device
                .ipv6_address
                .map(|ipv6| ipv6.to_string())
                .ok_or_else(|| {
                    Error::InvalidArgument("device needs an IP address for flow descriptors".into())
                })?,
        },
        None => {
            return Err(Error::InvalidArgument(
                "device is required for flow descriptors".into(),
            ))
        }
    };
    let server_ip = request
        .application_server
        .ipv4_base()
        .map(str::to_string)
        .or_else(|| request.application_server.ipv6_address.clone())
        .ok_or_else(|| {
            Error::InvalidArgument("application server needs an IP address".into())
        })?;

    let device_ports = flatten_port_spec(request.device_ports.as_ref());
    let server_ports = flatten_port_spec(request.application_server_ports.as_ref());

    let mut descriptors = Vec::new();
    for device_port in &device_ports {
        for server_port in &server_ports {
            descriptors.push(format!(
                "permit in ip from {} {} to {} {}",
                device_ip, device_port, server_ip, server_port
            ));
            descriptors.push(format!(
                "permit out ip from {} {} to {} {}",
                server_ip, server_port, device_ip, device_port
            ));
        }
    }

    Ok(vec![FlowInfo {
        flow_id,
        flow_descriptions: Some(vec![descriptors.join(", ")]),
    }])
}

/// Single-direction descriptor used for traffic influence and by cores
/// that filter on host addresses only.
pub fn host_flow_descriptor(device_ip: &Ipv4Addr, server_ip: &str) -> String {
    format!("permit out ip from {}/32 to {}/32", device_ip, server_ip)
}

/// Reverse transform: recover the server IP from a flow descriptor by
/// taking the token after `to ` and stripping the subnet suffix.
pub fn server_ip_from_descriptor(descriptor: &str) -> Result<String> {
    let after = descriptor.split("to ").nth(1).ok_or_else(|| {
        Error::platform(format!("flow descriptor '{}' has no 'to' clause", descriptor))
    })?;
    let ip = after
        .split('/')
        .next()
        .unwrap_or(after)
        .split_whitespace()
        .next()
        .unwrap_or("");
    if ip.is_empty() {
        return Err(Error::platform(format!(
            "flow descriptor '{}' has no server address",
            descriptor
        )));
    }
    Ok(ip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::device::{ApplicationServer, Device, DeviceIpv4Addr, PortRange, PortsSpec};
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn session(device_private: &str, server: &str) -> CreateSession {
        CreateSession {
            device: Some(Device {
                ipv4_address: Some(DeviceIpv4Addr {
                    public_address: "203.0.113.7".parse().unwrap(),
                    private_address: Some(device_private.parse().unwrap()),
                    public_port: None,
                }),
                ..Device::default()
            }),
            application_server: ApplicationServer {
                ipv4_address: Some(server.into()),
                ipv6_address: None,
            },
            device_ports: None,
            application_server_ports: None,
            qos_profile: "qos-e".into(),
            sink: None,
            duration: Some(600),
        }
    }

    #[test]
    fn test_host_descriptor_forward_reverse_fidelity() {
        let descriptor =
            host_flow_descriptor(&"10.0.0.100".parse().unwrap(), "10.0.0.1");
        assert_eq!(descriptor, "permit out ip from 10.0.0.100/32 to 10.0.0.1/32");
        assert_eq!(server_ip_from_descriptor(&descriptor).unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_build_flows_defaults_to_full_port_range() {
        let flows = build_flows(3, &session("10.0.0.100", "198.51.100.1")).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].flow_id, 3);
        let descriptor = &flows[0].flow_descriptions.as_ref().unwrap()[0];
        assert!(descriptor
            .contains("permit in ip from 10.0.0.100 0-65535 to 198.51.100.1 0-65535"));
        assert!(descriptor
            .contains("permit out ip from 198.51.100.1 0-65535 to 10.0.0.100 0-65535"));
    }

    #[test]
    fn test_build_flows_port_combinations() {
        let mut request = session("10.0.0.100", "198.51.100.1");
        request.device_ports = Some(PortsSpec {
            ports: Some(vec![5000, 5001]),
            ranges: None,
        });
        request.application_server_ports = Some(PortsSpec {
            ports: None,
            ranges: Some(vec![PortRange { from: 80, to: 81 }]),
        });
        let flows = build_flows(4, &request).unwrap();
        let descriptor = &flows[0].flow_descriptions.as_ref().unwrap()[0];
        // 2 device ports x 1 server range, two directions each
        assert_eq!(descriptor.matches("permit ").count(), 4);
        assert!(descriptor.contains("from 10.0.0.100 5001 to 198.51.100.1 80-81"));
    }

    #[test]
    fn test_subscription_id_from_self_link() {
        let mut subscription = QosSubscription::default();
        assert_matches!(subscription.subscription_id(), Err(Error::PlatformError { .. }));

        subscription.self_link =
            Some("http://nef.example.com/3gpp-as-session-with-qos/v1/scs/subscriptions/42".into());
        assert_eq!(subscription.subscription_id().unwrap(), "42");
    }

    #[test]
    fn test_location_from_report_applies_age() {
        let report = MonitoringEventReport {
            external_id: None,
            msisdn: Some("306912345678".into()),
            monitoring_type: MonitoringType::LocationReporting,
            event_time: Some(Utc.with_ymd_and_hms(2025, 6, 18, 12, 30, 0).unwrap()),
            location_info: Some(LocationInfo {
                age_of_location_info: Some(DurationMin { duration: 10 }),
                cell_id: None,
                geographic_area: Some(GeographicArea {
                    polygon: Some(NefPolygon {
                        point_list: PointList {
                            geographical_coords: vec![
                                GeographicalCoordinates { lon: 7.0, lat: 50.0 },
                                GeographicalCoordinates { lon: 7.1, lat: 50.0 },
                                GeographicalCoordinates { lon: 7.0, lat: 50.1 },
                            ],
                        },
                    }),
                }),
            }),
        };

        let location = location_from_report(&report).unwrap();
        assert_eq!(
            location.last_location_time,
            Utc.with_ymd_and_hms(2025, 6, 18, 12, 20, 0).unwrap()
        );
        assert_matches!(location.area, Area::Polygon { ref boundary } if boundary.len() == 3);
    }

    #[test]
    fn test_location_from_report_requires_area() {
        let report = MonitoringEventReport {
            external_id: None,
            msisdn: None,
            monitoring_type: MonitoringType::LocationReporting,
            event_time: None,
            location_info: None,
        };
        assert_matches!(location_from_report(&report), Err(Error::PlatformError { .. }));
    }
}
