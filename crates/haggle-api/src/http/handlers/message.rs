//! Message and read-receipt HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/conversations/{id}/messages - History page, newest first
//! - POST /api/v1/conversations/{id}/messages - Send as the caller
//! - POST /api/v1/conversations/{id}/read     - Mark read up to a message
//! - GET  /api/v1/conversations/{id}/unread   - Caller's unread count

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use haggle_types::message::{InboundMessage, Message, MessagePage, MessageType};

use crate::http::error::AppError;
use crate::http::extractors::caller::CallerId;
use crate::http::handlers::participant_conversation;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    pub page_size: Option<u32>,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadBody {
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub conversation_id: Uuid,
    pub unread_count: u32,
}

#[derive(Debug, Serialize)]
pub struct ReadAck {
    pub conversation_id: Uuid,
    pub message_id: String,
}

/// GET /api/v1/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(conversation_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<MessagePage>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = participant_conversation(&state, &caller, &conversation_id).await?;
    let page = state
        .chat_service
        .get_history(&id, query.page, query.page_size)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(page, request_id, elapsed)))
}

/// POST /api/v1/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = participant_conversation(&state, &caller, &conversation_id).await?;
    if body.content.trim().is_empty() && body.media_url.is_none() {
        return Err(AppError::Validation("Message content cannot be empty".to_string()));
    }

    let message = state
        .chat_service
        .send_message(InboundMessage {
            conversation_id: id,
            sender_id: caller,
            content: body.content,
            message_type: body.message_type,
            media_url: body.media_url,
            timestamp: chrono::Utc::now(),
        })
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(message, request_id, elapsed)))
}

/// POST /api/v1/conversations/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(conversation_id): Path<String>,
    Json(body): Json<MarkReadBody>,
) -> Result<Json<ApiResponse<ReadAck>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = participant_conversation(&state, &caller, &conversation_id).await?;
    state
        .chat_service
        .mark_read(&caller, &id, &body.message_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let ack = ReadAck {
        conversation_id: id,
        message_id: body.message_id,
    };
    Ok(Json(ApiResponse::success(ack, request_id, elapsed)))
}

/// GET /api/v1/conversations/{id}/unread
pub async fn unread_count(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<UnreadCount>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = participant_conversation(&state, &caller, &conversation_id).await?;
    let unread_count = state.chat_service.unread_count(&caller, &id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let body = UnreadCount {
        conversation_id: id,
        unread_count,
    };
    Ok(Json(ApiResponse::success(body, request_id, elapsed)))
}
