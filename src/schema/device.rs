//! Device and application-server identification
//!
//! A canonical device is identified by at least one of: E.164 phone number,
//! network access identifier, IPv4 address (public, with optional port
//! and/or private address) or IPv6 address. Adapters with stricter needs
//! (e.g. "IPv4 required") validate on top of this.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

// =============================================================================
// Device
// =============================================================================

/// IPv4 identification of a device. `public_address` is always required;
/// NAT'd devices additionally carry the private address and/or the
/// observed public port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIpv4Addr {
    pub public_address: Ipv4Addr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_address: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
}

/// End-user device able to connect to a mobile network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// E.164 number with leading '+'
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// GPSI external identifier, `{local}@{domain}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_access_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<DeviceIpv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<Ipv6Addr>,
}

impl Device {
    /// Invariant check: at least one identifier present, phone number
    /// well-formed when given.
    pub fn validate(&self) -> Result<()> {
        if self.phone_number.is_none()
            && self.network_access_identifier.is_none()
            && self.ipv4_address.is_none()
            && self.ipv6_address.is_none()
        {
            return Err(Error::InvalidArgument(
                "device must carry at least one identifier".into(),
            ));
        }
        if let Some(number) = &self.phone_number {
            if !is_valid_phone_number(number) {
                return Err(Error::InvalidArgument(format!(
                    "phone number '{}' is not E.164 (+ followed by 5-15 digits)",
                    number
                )));
            }
        }
        if let Some(nai) = &self.network_access_identifier {
            if !nai.contains('@') {
                return Err(Error::InvalidArgument(format!(
                    "network access identifier '{}' must be {{local}}@{{domain}}",
                    nai
                )));
            }
        }
        Ok(())
    }

    /// IPv4 used inside flow descriptors: the private (allocated) address
    /// when known, the observed public address otherwise.
    pub fn flow_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4_address
            .as_ref()
            .map(|addr| addr.private_address.unwrap_or(addr.public_address))
    }

    /// Observed public IPv4, what NEF subscriptions carry as `ueIpv4Addr`.
    pub fn public_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4_address.as_ref().map(|addr| addr.public_address)
    }

    /// E.164 number with the leading '+' stripped (MSISDN form).
    pub fn msisdn(&self) -> Option<String> {
        self.phone_number
            .as_ref()
            .map(|number| number.trim_start_matches('+').to_string())
    }
}

/// E.164: '+' then 5 to 15 digits, first digit nonzero
pub fn is_valid_phone_number(number: &str) -> bool {
    let Some(digits) = number.strip_prefix('+') else {
        return false;
    };
    if !(5..=15).contains(&digits.len()) {
        return false;
    }
    if digits.starts_with('0') {
        return false;
    }
    digits.chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Application Server
// =============================================================================

/// Application server address; IPv4/IPv6 given as `address` or
/// `address/mask` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationServer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

impl ApplicationServer {
    pub fn validate(&self) -> Result<()> {
        if self.ipv4_address.is_none() && self.ipv6_address.is_none() {
            return Err(Error::InvalidArgument(
                "application server needs an IPv4 or IPv6 address".into(),
            ));
        }
        if let Some(addr) = &self.ipv4_address {
            let base = addr.split('/').next().unwrap_or(addr);
            base.parse::<Ipv4Addr>().map_err(|_| {
                Error::InvalidArgument(format!("'{}' is not a valid IPv4 address", addr))
            })?;
        }
        Ok(())
    }

    /// Address part with any `/mask` suffix stripped.
    pub fn ipv4_base(&self) -> Option<&str> {
        self.ipv4_address
            .as_deref()
            .map(|addr| addr.split('/').next().unwrap_or(addr))
    }
}

// =============================================================================
// Port Specifications
// =============================================================================

/// Inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

/// Single ports and/or port ranges a QoS profile should apply to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortsSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Vec<PortRange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<u16>>,
}

impl PortsSpec {
    pub fn validate(&self) -> Result<()> {
        for range in self.ranges.iter().flatten() {
            if range.from > range.to {
                return Err(Error::InvalidArgument(format!(
                    "port range {}-{} is inverted",
                    range.from, range.to
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ipv4_device(public: &str, private: Option<&str>) -> Device {
        Device {
            ipv4_address: Some(DeviceIpv4Addr {
                public_address: public.parse().unwrap(),
                private_address: private.map(|p| p.parse().unwrap()),
                public_port: None,
            }),
            ..Device::default()
        }
    }

    #[test]
    fn test_phone_number_validation() {
        assert!(is_valid_phone_number("+306912345678"));
        assert!(is_valid_phone_number("+12345"));
        assert!(!is_valid_phone_number("306912345678")); // missing '+'
        assert!(!is_valid_phone_number("+0123456")); // leading zero
        assert!(!is_valid_phone_number("+123")); // too short
        assert!(!is_valid_phone_number("+12a45678")); // non-digit
    }

    #[test]
    fn test_device_needs_an_identifier() {
        let err = Device::default().validate().unwrap_err();
        assert_matches!(err, Error::InvalidArgument(_));

        let device = Device {
            phone_number: Some("+306912345678".into()),
            ..Device::default()
        };
        assert!(device.validate().is_ok());
        assert_eq!(device.msisdn().unwrap(), "306912345678");
    }

    #[test]
    fn test_flow_ipv4_prefers_private_address() {
        let device = ipv4_device("203.0.113.7", Some("10.0.0.100"));
        assert_eq!(device.flow_ipv4().unwrap().to_string(), "10.0.0.100");
        assert_eq!(device.public_ipv4().unwrap().to_string(), "203.0.113.7");

        let public_only = ipv4_device("203.0.113.7", None);
        assert_eq!(public_only.flow_ipv4().unwrap().to_string(), "203.0.113.7");
    }

    #[test]
    fn test_application_server_mask_stripping() {
        let server = ApplicationServer {
            ipv4_address: Some("198.51.100.0/24".into()),
            ipv6_address: None,
        };
        assert!(server.validate().is_ok());
        assert_eq!(server.ipv4_base().unwrap(), "198.51.100.0");

        let empty = ApplicationServer::default();
        assert_matches!(empty.validate(), Err(Error::InvalidArgument(_)));
    }

    #[test]
    fn test_device_serde_is_camel_case() {
        let device = ipv4_device("203.0.113.7", Some("10.0.0.100"));
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["ipv4Address"]["publicAddress"], "203.0.113.7");
        assert_eq!(value["ipv4Address"]["privateAddress"], "10.0.0.100");
        assert!(value.get("phoneNumber").is_none());
    }
}
