// ============================
// crates/backend-lib/src/middleware/auth.rs
// ============================
//! Bearer-token guard for protected routes.
use crate::{error::AppError, metrics::GUARD_REJECTED, storage::Storage, AppState};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use std::sync::Arc;

/// Extract the token from `Authorization: Bearer <token>`.
/// The scheme is matched case-insensitively; anything else is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("non-ascii authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthenticated("malformed authorization header".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthenticated(format!(
            "unsupported authorization scheme {scheme:?}"
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthenticated("empty bearer token".to_string()));
    }

    Ok(token)
}

/// Reject the request with 401 unless it carries a token that resolves to an
/// existing user; on success the [`Principal`](crate::auth::Principal) is
/// inserted into the request extensions.
pub async fn require_auth<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Owned so no borrow of the request is held across the await.
    let token = bearer_token(request.headers()).map(str::to_owned);
    let resolved = match token {
        Ok(token) => state.auth.authenticate(&token).await,
        Err(err) => Err(err),
    };

    let principal = match resolved {
        Ok(principal) => principal,
        Err(err) => {
            if !err.is_internal() {
                counter!(GUARD_REJECTED).increment(1);
                tracing::debug!(path = %request.uri().path(), reason = %err, "request rejected by auth guard");
            }
            return Err(err);
        },
    };

    tracing::debug!(username = %principal.username, "request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
