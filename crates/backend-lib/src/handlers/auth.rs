// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration and login.
use crate::{
    error::AppError,
    metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, USER_REGISTERED},
    storage::Storage,
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use devicehub_common::{CreateUserCommand, LoginCommand, LoginReply};
use metrics::counter;
use std::sync::Arc;

/// `POST /api/auth/register`: 201 with no body, 500 on any store failure
pub async fn register<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(cmd): Json<CreateUserCommand>,
) -> Result<StatusCode, AppError> {
    state.auth.register(cmd).await?;
    counter!(USER_REGISTERED).increment(1);
    Ok(StatusCode::CREATED)
}

/// `POST /api/auth/login`: 200 `{token}`, 401 with no body on bad credentials
pub async fn login<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Json(cmd): Json<LoginCommand>,
) -> Result<Json<LoginReply>, AppError> {
    match state.auth.login(&cmd.username, &cmd.password).await {
        Ok(token) => {
            counter!(LOGIN_SUCCESS).increment(1);
            Ok(Json(LoginReply { token }))
        },
        Err(err) => {
            if matches!(err, AppError::InvalidCredentials) {
                counter!(LOGIN_FAILURE).increment(1);
            }
            Err(err)
        },
    }
}
