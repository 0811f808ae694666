// ============================
// crates/backend-lib/src/router.rs
// ============================
/** HTTP router for the `DeviceHub` server.
Public routes: `/health`, `/api/auth/register`, `/api/auth/login`.
Everything else under `/api` passes through the bearer-token guard. */
use crate::{
    handlers::{self, auth, devices, users},
    middleware::require_auth,
    storage::Storage,
    AppState,
};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the application router
pub fn create_router<S: Storage>(state: Arc<AppState<S>>) -> Router {
    // `route_layer` so unknown paths still 404 instead of 401
    let protected = Router::new()
        .route("/users/me", get(users::me::<S>))
        .route("/devices", get(devices::list::<S>).post(devices::create::<S>))
        .route(
            "/devices/{id}",
            get(devices::get::<S>)
                .put(devices::update::<S>)
                .delete(devices::remove::<S>),
        )
        .route("/devices/{id}/activate", patch(devices::activate::<S>))
        .route("/devices/{id}/deactivate", patch(devices::deactivate::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<S>,
        ));

    let api = Router::new()
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .merge(protected);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
