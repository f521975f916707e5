//! Equipment API endpoints
//!
//! Every handler opens one storage session, runs the service operation on it
//! and commits once before answering. Errors return early and drop the
//! session, which discards its changes.

use axum::{
    extract::State,
    http::{
        header::{HOST, LOCATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};

use super::{ApiJson, ApiPath};
use crate::{
    config::ServerConfig,
    error::{AppError, AppResult},
    models::equipment::{Equipment, EquipmentInput},
    AppState,
};

/// List all equipment
pub async fn list_equipment(State(state): State<AppState>) -> AppResult<Json<Vec<Equipment>>> {
    let service = &state.services.equipment;
    let mut session = service.begin().await?;
    let equipment = service.list(session.as_mut()).await?;
    session.commit().await?;
    Ok(Json(equipment))
}

/// Get equipment by ID
pub async fn get_equipment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Equipment>> {
    let service = &state.services.equipment;
    let mut session = service.begin().await?;
    let equipment = service.get(session.as_mut(), id).await?;
    session.commit().await?;
    Ok(Json(equipment))
}

/// Create equipment
pub async fn create_equipment(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(data): ApiJson<EquipmentInput>,
) -> AppResult<impl IntoResponse> {
    let service = &state.services.equipment;
    let mut session = service.begin().await?;
    let equipment = service.create(session.as_mut(), data).await?;
    session.commit().await?;

    let location = location_header(&state.config.server, &headers, equipment.id)?;
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(equipment)))
}

/// Update equipment (fields missing from the body are kept)
pub async fn update_equipment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(data): ApiJson<EquipmentInput>,
) -> AppResult<StatusCode> {
    let service = &state.services.equipment;
    let mut session = service.begin().await?;
    service.update(session.as_mut(), id, data).await?;
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete equipment
pub async fn delete_equipment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<StatusCode> {
    let service = &state.services.equipment;
    let mut session = service.begin().await?;
    service.delete(session.as_mut(), id).await?;
    session.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// URL of the detail endpoint for `id`, absolute whenever the public base
/// URL is configured or the request carried a Host header. The scheme of a
/// Host-based URL follows `X-Forwarded-Proto` and defaults to `http`.
fn detail_location(server: &ServerConfig, headers: &HeaderMap, id: i32) -> String {
    let path = format!("/api/equipment/{}", id);

    if let Some(base) = &server.public_url {
        return format!("{}{}", base.trim_end_matches('/'), path);
    }

    let Some(host) = headers.get(HOST).and_then(|value| value.to_str().ok()) else {
        return path;
    };

    // Proxy chains send a comma separated list; the first hop is the client's.
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|proto| matches!(*proto, "http" | "https"))
        .unwrap_or("http");

    format!("{}://{}{}", scheme, host, path)
}

fn location_header(server: &ServerConfig, headers: &HeaderMap, id: i32) -> AppResult<HeaderValue> {
    let location = detail_location(server, headers, id);
    HeaderValue::try_from(location.as_str())
        .map_err(|e| AppError::Internal(format!("Invalid Location header {:?}: {}", location, e)))
}
