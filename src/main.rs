use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizgen_backend::controllers::{quiz::QuizController, usage::UsageController};
use quizgen_backend::domain::quiz::QuizService;
use quizgen_backend::domain::usage::{DailyResetPolicy, UsageService};
use quizgen_backend::infrastructure::config::{Config, LogFormat};
use quizgen_backend::infrastructure::db::{check_connection, create_pool};
use quizgen_backend::infrastructure::http::start_http_server;
use quizgen_backend::infrastructure::repositories::{
    OpenAiQuizGenerator, PgUsageStore, UserRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting QuizGen Backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    // Create OpenAI client
    let openai_config =
        async_openai::config::OpenAIConfig::new().with_api_key(config.openai_api_key.clone());
    let openai_client = Arc::new(async_openai::Client::with_config(openai_config));
    tracing::info!(model = %config.openai_model, "OpenAI client initialized");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool)
    tracing::info!("Instantiating repositories...");
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let usage_store = Arc::new(PgUsageStore::new(pool.clone()));
    let quiz_generator = Arc::new(OpenAiQuizGenerator::new(
        openai_client,
        config.openai_model.clone(),
    ));

    // 2. Instantiate services (inject repositories and policies)
    tracing::info!("Instantiating services...");
    let reset_policy = DailyResetPolicy::new(config.reset_offset());
    let usage_service = Arc::new(UsageService::new(
        usage_store,
        config.free_daily_limit,
        reset_policy,
    ));
    let quiz_service = Arc::new(QuizService::new(quiz_generator));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let usage_controller = Arc::new(UsageController::new(usage_service.clone()));
    let quiz_controller = Arc::new(QuizController::new(quiz_service, usage_service));

    // Start HTTP server with all routes
    start_http_server(pool, config, user_repo, usage_controller, quiz_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "quizgen_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "quizgen_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
