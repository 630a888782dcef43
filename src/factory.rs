//! Adapter factory
//!
//! Resolves a (domain, backend) pair plus construction parameters to a
//! ready adapter instance. Parameters arrive as an open bag of named
//! strings (the shape configuration files produce) and are drained into
//! typed per-backend configs; unknown leftovers are rejected rather than
//! silently ignored. A static lookup: no retries, no instance caching.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::ports::{EdgeCloudAdapterRef, NetworkAdapterRef};
use crate::edge::aeros::{AerosAdapter, AerosConfig};
use crate::edge::i2edge::{I2EdgeAdapter, I2EdgeConfig};
use crate::error::{Error, Result};
use crate::network::{coresim, oai, open5gcore, open5gs};
use crate::oran::{CellScope, RicAdapter, RicConfig};
use crate::transport::{ReqwestTransport, TransportRef};

// =============================================================================
// Domains
// =============================================================================

/// Adapter domains the factory can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Edgecloud,
    Network,
    Oran,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Edgecloud => write!(f, "edgecloud"),
            Domain::Network => write!(f, "network"),
            Domain::Oran => write!(f, "oran"),
        }
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "edgecloud" => Ok(Domain::Edgecloud),
            "network" => Ok(Domain::Network),
            "oran" => Ok(Domain::Oran),
            other => Err(Error::Configuration(format!(
                "unsupported domain '{}'; supported: edgecloud, network, oran",
                other
            ))),
        }
    }
}

// =============================================================================
// Construction Parameters
// =============================================================================

/// Base URL plus the open bag of backend-specific parameters.
///
/// Backends drain the keys they understand; construction fails if
/// anything is left over, so typos surface instead of being accepted.
#[derive(Debug, Clone, Default)]
pub struct AdapterParams {
    pub base_url: String,
    extra: BTreeMap<String, String>,
}

impl AdapterParams {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn from_map(base_url: impl Into<String>, extra: BTreeMap<String, String>) -> Self {
        Self {
            base_url: base_url.into(),
            extra,
        }
    }

    fn optional(&mut self, key: &str) -> Option<String> {
        self.extra.remove(key)
    }

    fn require(&mut self, key: &str, backend: &str) -> Result<String> {
        self.extra.remove(key).ok_or_else(|| {
            Error::Configuration(format!(
                "missing required '{}' for {} adapter",
                key, backend
            ))
        })
    }

    fn finish(&self, backend: &str) -> Result<()> {
        if self.extra.is_empty() {
            return Ok(());
        }
        let unknown: Vec<&str> = self.extra.keys().map(String::as_str).collect();
        Err(Error::Configuration(format!(
            "unknown parameter(s) for {} adapter: {}",
            backend,
            unknown.join(", ")
        )))
    }
}

/// Constructed adapter, tagged by domain
#[derive(Debug)]
pub enum AdapterHandle {
    Network(NetworkAdapterRef),
    EdgeCloud(EdgeCloudAdapterRef),
}

// =============================================================================
// Factory
// =============================================================================

pub struct AdapterFactory;

impl AdapterFactory {
    fn default_transport() -> TransportRef {
        Arc::new(ReqwestTransport::default())
    }

    /// Resolve any (domain, backend) pair.
    pub fn build(domain: Domain, backend: &str, params: AdapterParams) -> Result<AdapterHandle> {
        match domain {
            Domain::Network => Ok(AdapterHandle::Network(Self::network(backend, params)?)),
            Domain::Oran => Ok(AdapterHandle::Network(Self::oran(backend, params)?)),
            Domain::Edgecloud => Ok(AdapterHandle::EdgeCloud(Self::edge_cloud(backend, params)?)),
        }
    }

    // --- Network domain ----------------------------------------------------

    pub fn network(backend: &str, params: AdapterParams) -> Result<NetworkAdapterRef> {
        Self::network_with_transport(backend, params, Self::default_transport())
    }

    pub fn network_with_transport(
        backend: &str,
        mut params: AdapterParams,
        transport: TransportRef,
    ) -> Result<NetworkAdapterRef> {
        let scs_as_id = params.require("scs_as_id", backend)?;
        params.finish(backend)?;
        let base_url = params.base_url;

        match backend {
            "open5gs" => Ok(Arc::new(open5gs::new_adapter(&base_url, &scs_as_id, transport))),
            "oai" => Ok(Arc::new(oai::new_adapter(&base_url, &scs_as_id, transport))),
            "open5gcore" => Ok(Arc::new(open5gcore::new_adapter(
                &base_url, &scs_as_id, transport,
            ))),
            "coresim" => Ok(Arc::new(coresim::new_adapter(&base_url, &scs_as_id, transport))),
            other => Err(Error::Configuration(format!(
                "invalid network backend '{}'; available: open5gs, oai, open5gcore, coresim",
                other
            ))),
        }
    }

    // --- Radio-access domain -----------------------------------------------

    pub fn oran(backend: &str, params: AdapterParams) -> Result<NetworkAdapterRef> {
        Self::oran_with_transport(backend, params, Self::default_transport())
    }

    pub fn oran_with_transport(
        backend: &str,
        mut params: AdapterParams,
        transport: TransportRef,
    ) -> Result<NetworkAdapterRef> {
        match backend {
            "i2cat-ric" => {
                let scs_as_id = params.require("scs_as_id", backend)?;
                let ip_mappings = match params.optional("ip_mappings") {
                    Some(raw) => parse_ip_mappings(&raw)?,
                    None => BTreeMap::new(),
                };
                params.finish(backend)?;
                let config = RicConfig {
                    base_url: params.base_url,
                    scs_as_id,
                    ip_mappings,
                };
                Ok(Arc::new(RicAdapter::new(config, transport)))
            }
            other => Err(Error::Configuration(format!(
                "invalid oran backend '{}'; available: i2cat-ric",
                other
            ))),
        }
    }

    // --- Edge-cloud domain -------------------------------------------------

    pub fn edge_cloud(backend: &str, params: AdapterParams) -> Result<EdgeCloudAdapterRef> {
        Self::edge_cloud_with_transport(backend, params, Self::default_transport())
    }

    pub fn edge_cloud_with_transport(
        backend: &str,
        mut params: AdapterParams,
        transport: TransportRef,
    ) -> Result<EdgeCloudAdapterRef> {
        match backend {
            "i2edge" => {
                let flavour_id = params.require("flavour_id", backend)?;
                params.finish(backend)?;
                let config = I2EdgeConfig {
                    base_url: params.base_url,
                    flavour_id,
                };
                Ok(Arc::new(I2EdgeAdapter::new(config, transport)))
            }
            "aeros" => {
                let access_token = params.require("access_token", backend)?;
                let hlo_token = params.require("hlo_token", backend)?;
                params.finish(backend)?;
                let config = AerosConfig {
                    base_url: params.base_url,
                    access_token,
                    hlo_token,
                };
                Ok(Arc::new(AerosAdapter::new(config, transport)))
            }
            other => Err(Error::Configuration(format!(
                "invalid edgecloud backend '{}'; available: i2edge, aeros",
                other
            ))),
        }
    }
}

fn parse_ip_mappings(raw: &str) -> Result<BTreeMap<String, CellScope>> {
    serde_json::from_str(raw).map_err(|err| {
        Error::Configuration(format!("ip_mappings is not a valid mapping object: {}", err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capability::Capability;
    use assert_matches::assert_matches;

    #[test]
    fn test_unknown_domain_and_backend() {
        assert_matches!(Domain::from_str("cloud"), Err(Error::Configuration(_)));

        let err = AdapterFactory::network(
            "nokia",
            AdapterParams::new("http://nef").with("scs_as_id", "scs1"),
        )
        .unwrap_err();
        assert_matches!(err, Error::Configuration(_));

        let err =
            AdapterFactory::edge_cloud("openshift", AdapterParams::new("http://edge")).unwrap_err();
        assert_matches!(err, Error::Configuration(_));
    }

    #[test]
    fn test_missing_mandatory_parameters() {
        let err = AdapterFactory::network("open5gs", AdapterParams::new("http://nef")).unwrap_err();
        assert_matches!(&err, Error::Configuration(message)
            if message.contains("scs_as_id"));

        let err = AdapterFactory::edge_cloud("i2edge", AdapterParams::new("http://edge"))
            .unwrap_err();
        assert_matches!(&err, Error::Configuration(message)
            if message.contains("flavour_id"));

        let err = AdapterFactory::edge_cloud(
            "aeros",
            AdapterParams::new("http://aeros").with("access_token", "t"),
        )
        .unwrap_err();
        assert_matches!(&err, Error::Configuration(message)
            if message.contains("hlo_token"));
    }

    #[test]
    fn test_unknown_parameters_rejected() {
        let err = AdapterFactory::network(
            "open5gs",
            AdapterParams::new("http://nef")
                .with("scs_as_id", "scs1")
                .with("scsAsId", "typo"),
        )
        .unwrap_err();
        assert_matches!(&err, Error::Configuration(message) if message.contains("scsAsId"));
    }

    #[test]
    fn test_resolves_every_declared_backend() {
        let network = AdapterFactory::network(
            "oai",
            AdapterParams::new("http://nef").with("scs_as_id", "scs1"),
        )
        .unwrap();
        assert_eq!(network.backend_name(), "oai");
        assert!(network.capabilities().contains(&Capability::TrafficInfluence));

        let ric = AdapterFactory::oran(
            "i2cat-ric",
            AdapterParams::new("http://ric")
                .with("scs_as_id", "scs1")
                .with(
                    "ip_mappings",
                    r#"{"192.168.1.10": {"mcc": "001", "mnc": "01", "gnb_length": 28,
                        "gnb_id": 12345, "ran_ue_id": "0000000000000001"}}"#,
                ),
        )
        .unwrap();
        assert_eq!(ric.backend_name(), "i2cat-ric");
        assert_eq!(ric.capabilities(), &[Capability::Qod]);

        let edge = AdapterFactory::edge_cloud(
            "i2edge",
            AdapterParams::new("http://edge").with("flavour_id", "small"),
        )
        .unwrap();
        assert_eq!(edge.backend_name(), "i2edge");

        let handle = AdapterFactory::build(
            Domain::Edgecloud,
            "aeros",
            AdapterParams::new("http://aeros")
                .with("access_token", "a")
                .with("hlo_token", "b"),
        )
        .unwrap();
        assert_matches!(handle, AdapterHandle::EdgeCloud(adapter)
            if adapter.backend_name() == "aeros");
    }

    #[test]
    fn test_bad_ip_mappings_json() {
        let err = AdapterFactory::oran(
            "i2cat-ric",
            AdapterParams::new("http://ric")
                .with("scs_as_id", "scs1")
                .with("ip_mappings", "not-json"),
        )
        .unwrap_err();
        assert_matches!(err, Error::Configuration(_));
    }
}
