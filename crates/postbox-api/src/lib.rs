//! HTTP adapter over the message store. Handlers translate requests into
//! store calls and store errors into status codes; no business rules live here.

pub mod error;
pub mod messages;
pub mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::error;

use postbox_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self { db })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/", post(users::register_user))
        .route("/users/{username}", get(users::get_user))
        .route(
            "/users/{username}/messages/",
            post(messages::send_message)
                .get(messages::get_all_messages)
                .delete(messages::delete_messages),
        )
        .route("/users/{username}/messages/new", get(messages::get_new_messages))
        .route(
            "/users/{username}/messages/{message_id}",
            get(messages::get_message).delete(messages::delete_message),
        )
        .with_state(state)
}

/// Run a store call off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> postbox_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let value = tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::from(e)
        })??;
    Ok(value)
}
