//! Open5GCore hooks
//!
//! QoD-only backend. The profile table maps onto the RAN's available 5QI
//! buckets, which currently collapse the two largest profiles.

use crate::domain::capability::Capability;
use crate::error::{Error, Result};
use crate::network::nef::{NefAdapter, NefCore};
use crate::network::wire::{build_flows, QosSubscription};
use crate::schema::qod::CreateSession;
use crate::transport::TransportRef;

/// QoS profile → flow identifier
// TODO qos-l shares qos-m's flow id until the Nokia RAN exposes a larger one
const QOS_FLOW_IDS: &[(&str, i64)] = &[
    ("qos-e", 1),
    ("qos-s", 5),
    ("qos-m", 9),
    ("qos-l", 9),
];

fn flow_id_for(profile: &str) -> Option<i64> {
    let key = profile.trim().to_lowercase();
    QOS_FLOW_IDS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, id)| *id)
}

pub struct Open5gcoreCore;

impl NefCore for Open5gcoreCore {
    const BACKEND: &'static str = "open5gcore";

    fn capabilities() -> &'static [Capability] {
        &[Capability::Qod]
    }

    fn validate_qod(&self, request: &CreateSession) -> Result<()> {
        if flow_id_for(&request.qos_profile).is_none() {
            let supported = QOS_FLOW_IDS
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::InvalidArgument(format!(
                "unsupported QoS profile '{}'; supported profiles for open5gcore are: {}",
                request.qos_profile, supported
            )));
        }
        Ok(())
    }

    fn extend_qod(
        &self,
        request: &CreateSession,
        subscription: &mut QosSubscription,
    ) -> Result<()> {
        let flow_id = flow_id_for(&request.qos_profile).ok_or_else(|| {
            Error::InvalidArgument(format!("unmapped QoS profile '{}'", request.qos_profile))
        })?;
        subscription.flow_info = Some(build_flows(flow_id, request)?);
        // TODO derive the UE address from the request once the testbed NEF
        // stops requiring this fixed one
        subscription.ue_ipv4_addr = Some("192.168.6.1".parse().unwrap());
        Ok(())
    }
}

/// Adapter type for the Open5GCore NEF
pub type Open5gcoreAdapter = NefAdapter<Open5gcoreCore>;

pub fn new_adapter(base_url: &str, scs_as_id: &str, transport: TransportRef) -> Open5gcoreAdapter {
    NefAdapter::new(Open5gcoreCore, base_url, scs_as_id, transport)
}
