//! PUT /api/v1/profile - Cache the caller's display fields for conversation lists.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use haggle_types::profile::UserProfile;

use crate::http::error::AppError;
use crate::http::extractors::caller::CallerId;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub async fn upsert_profile(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(body): Json<ProfileBody>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let profile = state
        .chat_service
        .upsert_profile(caller, &body.display_name, body.avatar_url)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(profile, request_id, elapsed)))
}
