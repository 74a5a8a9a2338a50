use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use postbox_types::api::{RegisterUserRequest, StatusResponse};
use postbox_types::{NewUser, User};

use crate::error::ApiError;
use crate::{AppState, blocking};

pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = NewUser::new(req.name, req.username);
    let created = blocking(&state, move |db| db.register_user(&user)).await?;

    info!("Registered user {}", created.username);
    Ok(Json(StatusResponse::new("User successfully created")))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = blocking(&state, move |db| db.get_user(&username)).await?;
    Ok(Json(user))
}
