use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use postbox_types::Message;
use postbox_types::api::{DeleteMessagesRequest, SendMessageRequest, StatusResponse};

use crate::error::ApiError;
use crate::{AppState, blocking};

pub async fn send_message(
    State(state): State<AppState>,
    Path(recipient): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = blocking(&state, move |db| {
        db.send_message(&req.content, &recipient, &req.sender_username)
    })
    .await?;
    Ok(Json(message))
}

pub async fn get_all_messages(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = blocking(&state, move |db| db.list_all_messages(&username)).await?;
    Ok(Json(messages))
}

/// An empty result is rendered as an informational body, not `[]`.
pub async fn get_new_messages(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    let messages = blocking(&state, move |db| db.list_new_messages(&username)).await?;

    if messages.is_empty() {
        return Ok(Json(StatusResponse::new("No new messages.")).into_response());
    }
    Ok(Json(messages).into_response())
}

pub async fn get_message(
    State(state): State<AppState>,
    Path((username, message_id)): Path<(String, String)>,
) -> Result<Json<Message>, ApiError> {
    let message = blocking(&state, move |db| db.get_message(&username, &message_id)).await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path((username, message_id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    blocking(&state, move |db| db.delete_message(&username, &message_id)).await?;
    Ok(Json(StatusResponse::new("Message deleted")))
}

pub async fn delete_messages(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<DeleteMessagesRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    blocking(&state, move |db| db.delete_messages(&username, &req.message_ids)).await?;
    Ok(Json(StatusResponse::new("Messages deleted")))
}
