// essay-gateway-rs/src/main.rs
// HTTP entry point for essay analysis

use std::sync::Arc;

use tracing::{info, warn};

use config_rs::ServiceConfig;
use essay_analysis::{AnalyzerConfig, EssayAnalyzer, GeminiInvoker};
use essay_gateway::logging::{init_logging, LoggingConfig};
use essay_gateway::{build_router, AppState, SERVICE_NAME};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_path = config_rs::load_dotenv();

    init_logging(LoggingConfig::from_env())?;

    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    let config = AnalyzerConfig::from_env()?;
    if !config.has_api_key() {
        warn!("GOOGLE_GEMINI_API_KEY is not set; analyses will fail until it is configured");
    }

    let analyzer = EssayAnalyzer::from_config(&config)?;
    let catalog = GeminiInvoker::new(&config.provider)?;

    info!(
        candidates = ?analyzer.orchestrator().registry().ids(),
        retry = %config.retry,
        deadline_secs = config.deadline.as_secs(),
        "Analyzer configured"
    );

    let state = Arc::new(AppState::new(Arc::new(analyzer), Arc::new(catalog)));
    let app = build_router(state);

    let service_config = ServiceConfig::new(SERVICE_NAME);
    let addr = service_config.default_bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Essay gateway listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
