// ============================
// crates/backend-lib/src/handlers/devices.rs
// ============================
//! Device management. Every route here sits behind the auth guard.
use crate::{
    auth::Principal,
    error::AppError,
    metrics::{DEVICE_CREATED, DEVICE_REMOVED},
    storage::{DevicePatch, DeviceStore, Storage},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use devicehub_common::{CreateDeviceCommand, DeviceDto, UpdateDeviceCommand};
use metrics::counter;
use std::sync::Arc;
use uuid::Uuid;

fn device_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("device {id:?}"))
}

/// `GET /api/devices`
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<DeviceDto>>, AppError> {
    Ok(Json(state.storage.list_devices().await?))
}

/// `GET /api/devices/{id}`
pub async fn get<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceDto>, AppError> {
    state
        .storage
        .get_device(&id)
        .await?
        .map(Json)
        .ok_or_else(|| device_not_found(&id))
}

/// `POST /api/devices`: new devices start inactive
pub async fn create<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    Json(cmd): Json<CreateDeviceCommand>,
) -> Result<(StatusCode, Json<DeviceDto>), AppError> {
    let now = Utc::now();
    let device = DeviceDto {
        id: Uuid::new_v4().to_string(),
        name: cmd.name,
        address: cmd.address,
        is_active: false,
        created_at: now,
        updated_at: now,
    };

    state.storage.insert_device(device.clone()).await?;
    counter!(DEVICE_CREATED).increment(1);
    tracing::info!(device_id = %device.id, username = %principal.username, "device created");

    Ok((StatusCode::CREATED, Json(device)))
}

/// `PUT /api/devices/{id}`
pub async fn update<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(cmd): Json<UpdateDeviceCommand>,
) -> Result<Json<DeviceDto>, AppError> {
    patch_device(&state, &id, DevicePatch::from(cmd)).await
}

/// `PATCH /api/devices/{id}/activate`
pub async fn activate<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceDto>, AppError> {
    patch_device(&state, &id, DevicePatch::activation(true)).await
}

/// `PATCH /api/devices/{id}/deactivate`
pub async fn deactivate<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceDto>, AppError> {
    patch_device(&state, &id, DevicePatch::activation(false)).await
}

/// `DELETE /api/devices/{id}`: returns the removed device
pub async fn remove<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<DeviceDto>, AppError> {
    let device = state
        .storage
        .remove_device(&id)
        .await?
        .ok_or_else(|| device_not_found(&id))?;

    counter!(DEVICE_REMOVED).increment(1);
    tracing::info!(device_id = %device.id, username = %principal.username, "device removed");
    Ok(Json(device))
}

async fn patch_device<S: Storage>(
    state: &AppState<S>,
    id: &str,
    patch: DevicePatch,
) -> Result<Json<DeviceDto>, AppError> {
    state
        .storage
        .update_device(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| device_not_found(id))
}
