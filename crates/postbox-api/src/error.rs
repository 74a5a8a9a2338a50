use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use postbox_db::StoreError;
use postbox_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::EmptyUsername | StoreError::UsernameExists) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::UserNotFound(_) | StoreError::MessageNotFound) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(StoreError::Database(_) | StoreError::LockPoisoned)
            | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Infrastructure details stay in the logs
        let detail = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            warn!("Request rejected: {}", self);
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbox_db::Party;

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(ApiError::from(StoreError::EmptyUsername).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(StoreError::UsernameExists).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(StoreError::UserNotFound(Party::Sender)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::from(StoreError::MessageNotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_faults_map_to_500() {
        assert_eq!(
            ApiError::from(StoreError::LockPoisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn join_failures_map_to_500() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        let join_err = task.await.unwrap_err();
        assert!(join_err.is_cancelled());
        assert_eq!(ApiError::from(join_err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
