//! CoreSim hooks
//!
//! CoreSim is a 5G core simulator whose NEF accepts the full canonical
//! operation set. It tracks 3GPP closely, so validation is tolerant (an
//! unknown QoS profile is logged, not rejected), but its NEF insists on a
//! `dnn` and on explicit flow information.

use tracing::warn;

use crate::domain::capability::Capability;
use crate::error::{Error, Result};
use crate::network::nef::{NefAdapter, NefCore};
use crate::network::wire::{
    build_flows, MonitoringEventRequest, MonitoringType, QosSubscription,
    TrafficInfluenceSubscription,
};
use crate::schema::location::RetrievalLocationRequest;
use crate::schema::qod::CreateSession;
use crate::schema::traffic_influence::TrafficInfluence;
use crate::transport::TransportRef;

const STANDARD_PROFILES: &[&str] = &["qos-e", "qos-s", "qos-m", "qos-l"];

/// Data network name CoreSim's IPAM serves
const DNN: &str = "internet";

const SUPPORTED_FEATURES: &str = "0C";

/// Monitoring-event reports are delivered to the local callback endpoint.
const LOCATION_NOTIFICATION_SINK: &str = "http://127.0.0.1:8001";

pub struct CoresimCore;

impl NefCore for CoresimCore {
    const BACKEND: &'static str = "coresim";

    fn capabilities() -> &'static [Capability] {
        &[
            Capability::Qod,
            Capability::TrafficInfluence,
            Capability::LocationRetrieval,
        ]
    }

    fn validate_qod(&self, request: &CreateSession) -> Result<()> {
        if !STANDARD_PROFILES.contains(&request.qos_profile.as_str()) {
            warn!("non-standard QoS profile: {}", request.qos_profile);
        }
        if request.device.is_none() {
            return Err(Error::InvalidArgument(
                "coresim requires a device to build flow information".into(),
            ));
        }
        Ok(())
    }

    fn extend_qod(
        &self,
        request: &CreateSession,
        subscription: &mut QosSubscription,
    ) -> Result<()> {
        subscription.supported_features = Some(SUPPORTED_FEATURES.to_string());
        subscription.dnn = Some(DNN.to_string());
        subscription.flow_info = Some(build_flows(1, request)?);
        Ok(())
    }

    fn extend_traffic_influence(
        &self,
        _request: &TrafficInfluence,
        subscription: &mut TrafficInfluenceSubscription,
    ) -> Result<()> {
        subscription.dnn = Some(DNN.to_string());
        Ok(())
    }

    fn validate_location(&self, request: &RetrievalLocationRequest) -> Result<()> {
        let device = request.device.as_ref().ok_or_else(|| {
            Error::InvalidArgument("device information is required for location monitoring".into())
        })?;
        if device.phone_number.is_none() && device.network_access_identifier.is_none() {
            return Err(Error::InvalidArgument(
                "coresim requires either phoneNumber or networkAccessIdentifier \
                 for location monitoring"
                    .into(),
            ));
        }
        Ok(())
    }

    fn location_request(
        &self,
        request: &RetrievalLocationRequest,
    ) -> Result<MonitoringEventRequest> {
        let device = request.device.as_ref().ok_or_else(|| {
            Error::InvalidArgument("device information is required for location monitoring".into())
        })?;
        Ok(MonitoringEventRequest {
            msisdn: device.msisdn(),
            external_id: device.network_access_identifier.clone(),
            ipv4_addr: None,
            ipv6_addr: None,
            notification_destination: LOCATION_NOTIFICATION_SINK.to_string(),
            monitoring_type: MonitoringType::LocationReporting,
            // the simulator's monitoring-event service ignores locationType
            location_type: None,
            maximum_number_of_reports: None,
        })
    }
}

/// Adapter type for the CoreSim NEF
pub type CoresimAdapter = NefAdapter<CoresimCore>;

pub fn new_adapter(base_url: &str, scs_as_id: &str, transport: TransportRef) -> CoresimAdapter {
    NefAdapter::new(CoresimCore, base_url, scs_as_id, transport)
}
