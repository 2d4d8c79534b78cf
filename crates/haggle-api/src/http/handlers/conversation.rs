//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/conversations       - Open (or reopen) a conversation
//! - GET  /api/v1/conversations       - Caller's conversation list
//! - GET  /api/v1/conversations/{id}  - One conversation with participants

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use haggle_types::conversation::{
    Conversation, ConversationMetadata, ConversationSummary, CreateConversationRequest,
};

use crate::http::error::AppError;
use crate::http::extractors::caller::CallerId;
use crate::http::handlers::participant_conversation;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body for opening a conversation. The caller is always a participant.
#[derive(Debug, Deserialize)]
pub struct CreateConversationBody {
    /// Other participants, seller first; the caller is appended if absent.
    pub participant_ids: Vec<Uuid>,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub item_title: String,
    #[serde(default)]
    pub item_owner_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: ConversationMetadata,
}

impl CreateConversationBody {
    fn into_request(self, caller: Uuid) -> CreateConversationRequest {
        let mut participant_ids = self.participant_ids;
        if !participant_ids.contains(&caller) {
            participant_ids.push(caller);
        }
        CreateConversationRequest {
            participant_ids,
            item_id: self.item_id,
            item_title: self.item_title,
            item_owner_id: self.item_owner_id,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

/// POST /api/v1/conversations - Create-or-get by participants and item.
pub async fn create_conversation(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Json(body): Json<CreateConversationBody>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let conversation = state
        .chat_service
        .start_conversation(body.into_request(caller))
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversation, request_id, elapsed)))
}

/// GET /api/v1/conversations - Caller's inbox, most recently active first.
pub async fn list_conversations(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Query(query): Query<ConversationListQuery>,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let summaries = state
        .chat_service
        .list_conversations(&caller, query.limit, query.offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(summaries, request_id, elapsed)))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    CallerId(caller): CallerId,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let id = participant_conversation(&state, &caller, &conversation_id).await?;
    let conversation = state.chat_service.get_conversation(&id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(conversation, request_id, elapsed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_is_added_to_participants() {
        let (caller, seller) = (Uuid::now_v7(), Uuid::now_v7());
        let body: CreateConversationBody = serde_json::from_value(serde_json::json!({
            "participant_ids": [seller],
            "item_title": "Car-123",
        }))
        .unwrap();

        let request = body.into_request(caller);
        assert_eq!(request.participant_ids, vec![seller, caller]);
        assert_eq!(request.metadata, ConversationMetadata::default());
    }

    #[test]
    fn test_caller_not_duplicated() {
        let (caller, seller) = (Uuid::now_v7(), Uuid::now_v7());
        let body = CreateConversationBody {
            participant_ids: vec![seller, caller],
            item_id: None,
            item_title: String::new(),
            item_owner_id: Some(seller),
            metadata: ConversationMetadata::default(),
        };
        assert_eq!(body.into_request(caller).participant_ids, vec![seller, caller]);
    }

    #[tokio::test]
    async fn test_listed_seller_is_default_item_owner() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::init(dir.path().to_path_buf()).await.unwrap();
        std::mem::forget(dir);

        let (buyer, seller) = (Uuid::now_v7(), Uuid::now_v7());
        let body = CreateConversationBody {
            participant_ids: vec![seller],
            item_id: Some(Uuid::now_v7()),
            item_title: "Car-123".to_string(),
            item_owner_id: None,
            metadata: ConversationMetadata::default(),
        };

        let conversation = state
            .chat_service
            .start_conversation(body.into_request(buyer))
            .await
            .unwrap();
        assert_eq!(conversation.item_owner_id, Some(seller));
        assert_eq!(conversation.participants.len(), 2);
    }
}
