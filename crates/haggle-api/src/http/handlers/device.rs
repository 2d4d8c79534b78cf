//! Push device registration handlers.
//!
//! - POST   /api/v1/devices - Register or refresh a token for the caller
//! - DELETE /api/v1/devices - Remove a token

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use haggle_types::device::{Device, DeviceType};

use crate::http::error::AppError;
use crate::http::extractors::caller::CallerId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceBody {
    pub token: String,
    pub device_type: DeviceType,
}

#[derive(Debug, Deserialize)]
pub struct UnregisterDeviceBody {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct Removed {
    pub removed: bool,
}

pub async fn register_device(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(body): Json<RegisterDeviceBody>,
) -> Result<Json<ApiResponse<Device>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let device = state
        .chat_service
        .register_device(caller, &body.token, body.device_type)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(device, request_id, elapsed)))
}

pub async fn unregister_device(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(body): Json<UnregisterDeviceBody>,
) -> Result<Json<ApiResponse<Removed>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let removed = state
        .chat_service
        .unregister_device(&caller, &body.token)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(Removed { removed }, request_id, elapsed)))
}
