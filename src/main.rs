// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use trivia::config::Config;
use trivia::models::{leaderboard::Leaderboard, question::QuestionSet};
use trivia::routes;
use trivia::state::AppState;
use trivia::storage::CsvScoreStore;
use trivia::utils::clock::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "trivia.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    let questions = load_questions(&config).await?;
    tracing::info!("Loaded {} questions", questions.len());

    // The leaderboard must exist before the first read or write.
    let store = CsvScoreStore::new(&config.leaderboard_path);
    let leaderboard = Leaderboard::new(Arc::new(store));
    if let Err(e) = leaderboard.ensure_initialized().await {
        tracing::error!("Leaderboard store unusable: {}", e);
        return Err(e.into());
    }
    let existing = leaderboard.all().await?;
    tracing::info!(
        "Leaderboard {:?} ready with {} entries",
        config.leaderboard_path,
        existing.len()
    );

    let addr = config.bind_addr;
    let state = AppState::new(config, questions, leaderboard, Arc::new(SystemClock));

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}

async fn load_questions(config: &Config) -> Result<QuestionSet, Box<dyn std::error::Error>> {
    match &config.quiz_file {
        Some(path) => {
            tracing::info!("Reading questions from {:?}", path);
            QuestionSet::from_json_file(path).await.map_err(|e| {
                tracing::error!("Failed to load quiz file {:?}: {}", path, e);
                Box::<dyn std::error::Error>::from(e)
            })
        }
        None => Ok(QuestionSet::builtin()),
    }
}
