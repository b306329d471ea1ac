// src/routes.rs

use axum::{
    Json, Router, http::Method, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempt, auth, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, attempts).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/profile", get(auth::profile))
                .layer(auth_layer.clone()),
        );

    // Browsing public quizzes needs no session; everything else does.
    let quiz_routes = Router::new()
        .route(
            "/",
            get(quiz::list_quizzes).merge(post(quiz::create_quiz).layer(auth_layer.clone())),
        )
        .merge(
            Router::new()
                .route("/user", get(quiz::list_my_quizzes))
                .route(
                    "/{id}",
                    get(quiz::get_quiz)
                        .put(quiz::update_quiz)
                        .delete(quiz::delete_quiz),
                )
                .layer(auth_layer.clone()),
        );

    // POST /{id} takes a quiz id, GET /{id} an attempt id.
    let attempt_routes = Router::new()
        .route("/{id}", post(attempt::submit_attempt).get(attempt::get_attempt))
        .route("/user/{quizId}", get(attempt::list_my_attempts))
        .route("/quiz/{quizId}", get(attempt::list_quiz_attempts))
        .route("/quiz/{quizId}/stats", get(attempt::quiz_stats))
        .layer(auth_layer);

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Server is running!" }))
}
