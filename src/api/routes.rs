//! Router assembly
//!
//! Everything except the login form, the registration redirect, and
//! static/asset serving sits behind the access gate.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::api::handlers;
use crate::auth::AccessGateLayer;
use crate::session::SessionLayer;
use crate::AppState;

/// Build the application router
pub async fn create_router(state: Arc<AppState>) -> Router {
    let gate = AccessGateLayer::new(state.sessions.clone(), state.auth.clone());

    let protected = Router::new()
        .route("/", get(handlers::index))
        .route("/generate-image", post(handlers::generate_image))
        .route("/regenerate-image", post(handlers::regenerate_image))
        .route("/upscale-image", post(handlers::upscale_image))
        .route("/generate-video", post(handlers::generate_video))
        .route("/conversation-history", get(handlers::conversation_history))
        .layer(gate);

    let public = Router::new()
        .route(
            "/login",
            get(handlers::login_form).post(handlers::login_submit),
        )
        .route(
            "/register",
            get(handlers::register).post(handlers::register),
        )
        .route("/download-image/:name", get(handlers::download_image))
        // Clearing also logs the user out, so it must stay callable after it
        // has already discarded the session's auth token.
        .route("/clear-session", post(handlers::clear_session))
        .nest_service("/static", ServeDir::new("static"));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(SessionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
