//! REST facade handlers
//!
//! Exposes the canonical operations over HTTP for callers that prefer a
//! service to a library. Canonical errors translate back to CAMARA-style
//! `{status, code, message}` error bodies.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::domain::ports::{EdgeCloudAdapterRef, NetworkAdapterRef};
use crate::error::Error;
use crate::schema::location::RetrievalLocationRequest;
use crate::schema::qod::CreateSession;
use crate::schema::traffic_influence::TrafficInfluence;
use crate::schema::AppManifest;

// =============================================================================
// Error Body
// =============================================================================

/// CAMARA-style error info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub code: String,
    pub message: String,
}

fn error_code(err: &Error) -> &'static str {
    match err {
        Error::CapabilityNotSupported { .. } => "NOT_IMPLEMENTED",
        Error::InvalidArgument(_) => "INVALID_ARGUMENT",
        Error::Unauthenticated(_) => "UNAUTHENTICATED",
        Error::PermissionDenied(_) => "PERMISSION_DENIED",
        Error::NotFound { .. } => "NOT_FOUND",
        Error::ServiceUnavailable(_) => "UNAVAILABLE",
        Error::Configuration(_) => "INTERNAL",
        _ => "INTERNAL",
    }
}

fn error_response(err: Error) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ApiErrorBody {
        status: status.as_u16(),
        code: error_code(&err).to_string(),
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}

// =============================================================================
// State & Router
// =============================================================================

/// Adapters the facade serves; either side may be absent
#[derive(Clone, Default)]
pub struct AppState {
    pub network: Option<NetworkAdapterRef>,
    pub edge: Option<EdgeCloudAdapterRef>,
}

impl AppState {
    fn network(&self) -> Result<NetworkAdapterRef, Error> {
        self.network
            .clone()
            .ok_or_else(|| Error::ServiceUnavailable("no network adapter configured".into()))
    }

    fn edge(&self) -> Result<EdgeCloudAdapterRef, Error> {
        self.edge
            .clone()
            .ok_or_else(|| Error::ServiceUnavailable("no edge-cloud adapter configured".into()))
    }
}

/// Build the facade router, request logging included.
pub fn router(state: AppState) -> Router {
    Router::new()
        // QoD sessions
        .route("/qod/v0/sessions", post(create_session))
        .route("/qod/v0/sessions/:id", get(get_session))
        .route("/qod/v0/sessions/:id", delete(delete_session))
        // Location retrieval
        .route("/location/v0/retrieve", post(retrieve_location))
        // Traffic influence
        .route("/traffic-influences/v0", post(create_traffic_influence))
        .route("/traffic-influences/v0", get(list_traffic_influence))
        .route("/traffic-influences/v0/:id", get(get_traffic_influence))
        .route("/traffic-influences/v0/:id", put(update_traffic_influence))
        .route("/traffic-influences/v0/:id", delete(delete_traffic_influence))
        // Edge zones and applications
        .route("/edge/v0/zones", get(list_zones))
        .route("/edge/v0/zones/:id", get(zone_details))
        .route("/edge/v0/apps", post(onboard_app))
        .route("/edge/v0/apps", get(list_apps))
        .route("/edge/v0/apps/:id", get(get_app))
        .route("/edge/v0/apps/:id", delete(delete_app))
        .route("/edge/v0/apps/:id/deploy", post(deploy_app))
        .route("/edge/v0/appinstances", get(list_instances))
        .route("/edge/v0/appinstances/:id", get(get_instance))
        .route("/edge/v0/appinstances/:id", delete(delete_instance))
        // Health
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// QoD Handlers
// =============================================================================

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSession>,
) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.create_qod_session(&request).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.get_qod_session(&id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.delete_qod_session(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn retrieve_location(
    State(state): State<AppState>,
    Json(request): Json<RetrievalLocationRequest>,
) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.retrieve_location(&request).await {
        Ok(location) => (StatusCode::OK, Json(location)).into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Traffic Influence Handlers
// =============================================================================

async fn create_traffic_influence(
    State(state): State<AppState>,
    Json(request): Json<TrafficInfluence>,
) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.create_traffic_influence(&request).await {
        Ok(resource) => (StatusCode::CREATED, Json(resource)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_traffic_influence(State(state): State<AppState>) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.list_traffic_influence().await {
        Ok(resources) => (StatusCode::OK, Json(resources)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_traffic_influence(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.get_traffic_influence(&id).await {
        Ok(resource) => (StatusCode::OK, Json(resource)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_traffic_influence(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TrafficInfluence>,
) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.update_traffic_influence(&id, &request).await {
        Ok(resource) => (StatusCode::OK, Json(resource)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_traffic_influence(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let network = match state.network() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match network.delete_traffic_influence(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Edge Handlers
// =============================================================================

async fn list_zones(State(state): State<AppState>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.list_zones().await {
        Ok(zones) => (StatusCode::OK, Json(zones)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn zone_details(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.zone_details(&id).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn onboard_app(
    State(state): State<AppState>,
    Json(manifest): Json<AppManifest>,
) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.onboard_app(&manifest).await {
        Ok(submitted) => (StatusCode::CREATED, Json(submitted)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_apps(State(state): State<AppState>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.list_onboarded_apps().await {
        Ok(apps) => (StatusCode::OK, Json(apps)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_app(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.get_onboarded_app(&id).await {
        Ok(manifest) => (StatusCode::OK, Json(manifest)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_app(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.delete_onboarded_app(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// Zones the instance should land in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployRequest {
    zone_ids: Vec<String>,
}

async fn deploy_app(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DeployRequest>,
) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.deploy_app(&id, &request.zone_ids).await {
        Ok(instance) => (StatusCode::ACCEPTED, Json(instance)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceFilter {
    app_id: Option<String>,
}

async fn list_instances(
    State(state): State<AppState>,
    Query(filter): Query<InstanceFilter>,
) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.list_deployed_apps(filter.app_id.as_deref()).await {
        Ok(instances) => (StatusCode::OK, Json(instances)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_instance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.get_deployed_app(&id).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_instance(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let edge = match state.edge() {
        Ok(adapter) => adapter,
        Err(err) => return error_response(err),
    };
    match edge.undeploy_app(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Health
// =============================================================================

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capability::Capability;

    #[test]
    fn test_error_body_shape() {
        let err = Error::unsupported(Capability::TrafficInfluence, "open5gs");
        assert_eq!(error_code(&err), "NOT_IMPLEMENTED");
        assert_eq!(err.http_status(), 501);

        let err = Error::NotFound {
            resource: "session x".into(),
        };
        assert_eq!(error_code(&err), "NOT_FOUND");
        assert_eq!(err.http_status(), 404);
    }
}
