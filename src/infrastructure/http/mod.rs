use axum::{middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::{
    controllers::{health, quiz::QuizController, usage::UsageController},
    infrastructure::auth::{auth_middleware, optional_auth_middleware, request_id_middleware},
};

use crate::infrastructure::repositories::UserRepository;

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    user_repo: Arc<UserRepository>,
    usage_controller: Arc<UsageController>,
    quiz_controller: Arc<QuizController>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Usage routes (need auth)
    let usage_routes = Router::new()
        .route("/api/usage/stats", get(UsageController::get_stats))
        .route("/api/usage/can-use", get(UsageController::can_use))
        .route("/api/usage/use-prompt", post(UsageController::use_prompt))
        .route("/api/reset/usage/:userId", post(UsageController::reset_usage))
        .with_state(usage_controller.clone())
        .layer(middleware::from_fn_with_state(
            (user_repo.clone(), config.clone()),
            auth_middleware,
        ));

    // Quiz generation admits guests; identity resolution still runs first
    let quiz_routes = Router::new()
        .route("/api/quiz/generate", post(QuizController::generate))
        .with_state(quiz_controller.clone())
        .layer(middleware::from_fn_with_state(
            (user_repo.clone(), config.clone()),
            optional_auth_middleware,
        ));

    // Build application routes
    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool.clone())
        .merge(usage_routes)
        .merge(quiz_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
