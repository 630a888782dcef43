//! Quality-on-Demand session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::device::{ApplicationServer, Device, PortsSpec};

// =============================================================================
// Session Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QosStatus {
    Requested,
    Available,
    Unavailable,
}

/// Why a session became unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusInfo {
    DurationExpired,
    NetworkTerminated,
    DeleteRequested,
}

// =============================================================================
// Requests / Responses
// =============================================================================

/// Request to create a QoD session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    pub application_server: ApplicationServer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_ports: Option<PortsSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_server_ports: Option<PortsSpec>,
    /// Named QoS profile; the supported set is backend-specific
    pub qos_profile: String,
    /// Notification sink for session status changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    /// Requested session duration in seconds; expiry is enforced by the
    /// backend's own clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl CreateSession {
    /// Backend-independent validation; adapters layer their own checks on
    /// top of this.
    pub fn validate(&self) -> Result<()> {
        if let Some(device) = &self.device {
            device.validate()?;
        }
        self.application_server.validate()?;
        if let Some(ports) = &self.device_ports {
            ports.validate()?;
        }
        if let Some(ports) = &self.application_server_ports {
            ports.validate()?;
        }
        if !is_valid_qos_profile_name(&self.qos_profile) {
            return Err(Error::InvalidArgument(format!(
                "QoS profile name '{}' is invalid (3-256 chars of [a-zA-Z0-9_.-])",
                self.qos_profile
            )));
        }
        if self.duration == Some(0) {
            return Err(Error::InvalidArgument("duration must be at least 1s".into()));
        }
        Ok(())
    }
}

/// A created or retrieved QoD session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Opaque identifier assigned by the backend at creation
    pub session_id: String,
    pub qos_status: QosStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<StatusInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_server: Option<ApplicationServer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_ports: Option<PortsSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_server_ports: Option<PortsSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl SessionInfo {
    /// Echo a creation request back as the canonical response, with the
    /// backend-assigned id.
    pub fn from_request(session_id: String, status: QosStatus, request: &CreateSession) -> Self {
        Self {
            session_id,
            qos_status: status,
            status_info: None,
            started_at: None,
            expires_at: None,
            device: request.device.clone(),
            application_server: Some(request.application_server.clone()),
            device_ports: request.device_ports.clone(),
            application_server_ports: request.application_server_ports.clone(),
            qos_profile: Some(request.qos_profile.clone()),
            sink: request.sink.clone(),
            duration: request.duration,
        }
    }
}

/// QoS profile names: 3-256 chars of `[a-zA-Z0-9_.-]`
pub fn is_valid_qos_profile_name(name: &str) -> bool {
    if !(3..=256).contains(&name.len()) {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> CreateSession {
        CreateSession {
            device: None,
            application_server: ApplicationServer {
                ipv4_address: Some("198.51.100.1".into()),
                ipv6_address: None,
            },
            device_ports: None,
            application_server_ports: None,
            qos_profile: "qos-e".into(),
            sink: None,
            duration: Some(3600),
        }
    }

    #[test]
    fn test_profile_name_rules() {
        assert!(is_valid_qos_profile_name("qos-e"));
        assert!(is_valid_qos_profile_name("QOS_L.v2"));
        assert!(!is_valid_qos_profile_name("ab")); // too short
        assert!(!is_valid_qos_profile_name("has space"));
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut req = request();
        req.duration = Some(0);
        assert_matches!(req.validate(), Err(Error::InvalidArgument(_)));
    }

    #[test]
    fn test_from_request_echoes_fields() {
        let req = request();
        let session = SessionInfo::from_request("sub-1".into(), QosStatus::Requested, &req);
        assert_eq!(session.session_id, "sub-1");
        assert_eq!(session.qos_status, QosStatus::Requested);
        assert_eq!(session.qos_profile.as_deref(), Some("qos-e"));
        assert_eq!(session.duration, Some(3600));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(QosStatus::Requested).unwrap(),
            "REQUESTED"
        );
        assert_eq!(
            serde_json::to_value(StatusInfo::DurationExpired).unwrap(),
            "DURATION_EXPIRED"
        );
    }
}
