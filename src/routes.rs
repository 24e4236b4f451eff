// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{leaderboard, quiz, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the quiz, session and leaderboard sub-routers.
/// * Serves question illustrations from the assets directory.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/", post(session::create_session))
        .route(
            "/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/{id}/question", get(session::get_question))
        .route("/{id}/answer", post(session::submit_answer))
        .route("/{id}/advance", post(session::advance));

    let images = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route("/api/quiz", get(quiz::quiz_info))
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        .nest("/api/sessions", session_routes)
        .nest_service("/images", images)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
