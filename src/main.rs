//! Chatbot Assistant - a minimal web chatbot
//!
//! Text or recorded speech goes in, a generated reply comes back, and the
//! whole conversation is rendered after every action.

mod api;
mod config;
mod generator;
mod render;
mod runtime;
mod speech;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use generator::{HuggingFaceGenerator, LoggingGenerator, ResponseGenerator};
use runtime::{Services, SessionManager};
use speech::{GoogleSpeechRecognizer, LoggingRecognizer};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatbot_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Text generation
    let generator = HuggingFaceGenerator::new(&config.generator)?;
    if config.generator.api_token.is_none() {
        tracing::warn!("HF_API_TOKEN not set; the generator may reject or rate-limit requests");
    }
    tracing::info!(
        model = %config.generator.model,
        endpoint = %config.generator.endpoint,
        max_length = config.generator.max_length,
        "Text generator initialized"
    );
    let generator = Arc::new(LoggingGenerator::new(Arc::new(generator)));

    // Speech recognition
    let recognizer = GoogleSpeechRecognizer::new(&config.speech)?;
    if config.speech.api_key.is_none() {
        tracing::warn!("GOOGLE_SPEECH_API_KEY not set; speech input will report service errors");
    }
    tracing::info!(
        language = %config.speech.language,
        record_window_secs = config.speech.record_window.as_secs(),
        "Speech recognizer initialized"
    );

    let services = Services {
        responder: ResponseGenerator::new(generator, config.generator.max_length),
        recognizer: Arc::new(LoggingRecognizer::new(Arc::new(recognizer))),
        record_window: config.speech.record_window,
        speech_timeout: config.speech.timeout,
    };

    let sessions = Arc::new(SessionManager::new(services));
    sessions.start_idle_sweeper(config.session_ttl);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(AppState::new(sessions))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Chatbot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
