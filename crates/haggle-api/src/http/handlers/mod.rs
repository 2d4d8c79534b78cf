//! REST handlers, one module per resource.

pub mod conversation;
pub mod device;
pub mod message;
pub mod profile;

use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// Resolve a conversation path id the caller participates in.
///
/// Non-participants get the same 404 as a missing conversation.
pub(crate) async fn participant_conversation(
    state: &AppState,
    caller: &Uuid,
    conversation_id: &str,
) -> Result<Uuid, AppError> {
    let id = parse_uuid(conversation_id)?;
    let participants = state.chat_service.participant_ids(&id).await?;
    if !participants.contains(caller) {
        return Err(haggle_types::error::ChatError::NotFound("conversation".to_string()).into());
    }
    Ok(id)
}
