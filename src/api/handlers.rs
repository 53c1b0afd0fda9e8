use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::domain::{EngineError, Fqdn, Mapping, Service, VhostKind, VirtualHost};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn list_vhosts(State(state): State<ApiState>) -> Result<Json<Vec<VirtualHost>>, ApiError> {
    Ok(Json(state.manager.list().await?))
}

pub async fn create_vhost(
    State(state): State<ApiState>,
    payload: Result<Json<VirtualHost>, JsonRejection>,
) -> Result<(StatusCode, Json<VirtualHost>), ApiError> {
    let Json(vhost) = payload?;
    state.manager.add(&vhost).await?;
    Ok((StatusCode::CREATED, Json(vhost)))
}

/// `?parent=<primary>` turns the delete into an alias removal.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    pub parent: Option<String>,
}

pub async fn delete_vhost(
    State(state): State<ApiState>,
    Path(hostname): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError> {
    let hostname = Fqdn::new(hostname)?;
    let vhost = match params.parent {
        Some(parent) => VirtualHost::new(hostname, VhostKind::Alias, Some(Fqdn::new(parent)?))?,
        None => VirtualHost::primary(hostname),
    };

    state.manager.delete(&vhost).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_mapping(
    State(state): State<ApiState>,
    payload: Result<Json<Mapping>, JsonRejection>,
) -> Result<(StatusCode, Json<Mapping>), ApiError> {
    let Json(mapping) = payload?;
    state.manager.add_mapping(&mapping).await?;
    Ok((StatusCode::CREATED, Json(mapping)))
}

pub async fn list_services(State(state): State<ApiState>) -> Result<Json<Vec<Service>>, ApiError> {
    let services = state
        .manager
        .services()
        .get()
        .map_err(EngineError::ServiceDirectoryUnavailable)?;
    Ok(Json(services))
}
