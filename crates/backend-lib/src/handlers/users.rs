//! Profile of the authenticated caller.
use crate::{
    auth::Principal,
    error::AppError,
    storage::{Storage, UserStore},
    AppState,
};
use axum::{extract::State, Extension, Json};
use devicehub_common::AuthenticatedUser;
use std::sync::Arc;

/// `GET /api/users/me`
pub async fn me<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AuthenticatedUser>, AppError> {
    let user = state
        .storage
        .find_by_username(&principal.username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {:?}", principal.username)))?;

    Ok(Json(user.to_authenticated_user()))
}
