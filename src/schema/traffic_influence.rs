//! Traffic influence resource model
//!
//! One record serves the whole lifecycle: callers submit it without
//! `trafficInfluenceID`, the backend assigns the id at creation, and reads
//! return the same shape with the id filled in.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::schema::device::Device;

/// Source-side traffic filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTrafficFilters {
    pub source_port: u16,
}

/// Destination-side traffic filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationTrafficFilters {
    pub destination_port: u16,
    pub destination_protocol: String,
}

/// Canonical traffic influence resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficInfluence {
    /// Opaque resource id, assigned by the backend at creation
    #[serde(rename = "trafficInfluenceID", skip_serializing_if = "Option::is_none")]
    pub traffic_influence_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_consumer_id: Option<String>,
    pub app_id: String,
    /// Application instance identifier; for core-network backends this is
    /// the instance's IPv4 address
    pub app_instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_cloud_region: Option<String>,
    /// Target edge zone (DNAI on the wire)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_cloud_zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_traffic_filters: Option<SourceTrafficFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_traffic_filters: Option<DestinationTrafficFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_uri: Option<String>,
    pub device: Device,
}

impl TrafficInfluence {
    pub fn validate(&self) -> Result<()> {
        if self.app_id.is_empty() {
            return Err(Error::InvalidArgument(
                "appId is required for traffic influence".into(),
            ));
        }
        if self.app_instance_id.is_empty() {
            return Err(Error::InvalidArgument(
                "appInstanceId is required for traffic influence".into(),
            ));
        }
        self.device.validate()
    }

    /// Device IPv4 used in flow descriptors; traffic influence requires it.
    pub fn ue_ipv4(&self) -> Result<Ipv4Addr> {
        self.device.flow_ipv4().ok_or_else(|| {
            Error::InvalidArgument("device.ipv4Address is required for traffic influence".into())
        })
    }

    /// Copy with the backend-assigned resource id filled in.
    pub fn with_id(&self, resource_id: impl Into<String>) -> Self {
        let mut resource = self.clone();
        resource.traffic_influence_id = Some(resource_id.into());
        resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::device::DeviceIpv4Addr;
    use assert_matches::assert_matches;

    fn resource() -> TrafficInfluence {
        TrafficInfluence {
            traffic_influence_id: None,
            api_consumer_id: None,
            app_id: "video-analytics".into(),
            app_instance_id: "10.0.0.1".into(),
            edge_cloud_region: None,
            edge_cloud_zone_id: Some("zone-a".into()),
            source_traffic_filters: None,
            destination_traffic_filters: None,
            notification_uri: Some("https://consumer.example.com/ti".into()),
            device: Device {
                ipv4_address: Some(DeviceIpv4Addr {
                    public_address: "203.0.113.7".parse().unwrap(),
                    private_address: Some("10.0.0.100".parse().unwrap()),
                    public_port: None,
                }),
                ..Device::default()
            },
        }
    }

    #[test]
    fn test_ue_ipv4_required() {
        assert_eq!(resource().ue_ipv4().unwrap().to_string(), "10.0.0.100");

        let mut no_ip = resource();
        no_ip.device = Device {
            phone_number: Some("+306912345678".into()),
            ..Device::default()
        };
        assert_matches!(no_ip.ue_ipv4(), Err(Error::InvalidArgument(_)));
    }

    #[test]
    fn test_with_id_round_trip() {
        let created = resource().with_id("ti-42");
        assert_eq!(created.traffic_influence_id.as_deref(), Some("ti-42"));
        let value = serde_json::to_value(&created).unwrap();
        assert_eq!(value["trafficInfluenceID"], "ti-42");
        assert_eq!(value["appId"], "video-analytics");
    }
}
