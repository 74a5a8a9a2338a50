use serde::{Deserialize, Serialize};

// -- Users --

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub username: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_username: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessagesRequest {
    pub message_ids: Vec<String>,
}

// -- Responses --

/// Informational body, e.g. `{"Message": "Message deleted"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "Message")]
    pub message: String,
}

impl StatusResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body returned for every rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
