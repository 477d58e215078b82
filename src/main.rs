use lead_enrichment_api::config::Config;
use lead_enrichment_api::enrichment::LeadEnricher;
use lead_enrichment_api::handlers::{self, AppState};
use lead_enrichment_api::notifier::{HttpMailRelay, ReportMailer};
use lead_enrichment_api::services::build_http_client;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The enrichment pipeline (connectors and language model).
/// - The optional report mailer.
/// - HTTP routes and middleware.
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_enrichment_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let enricher = LeadEnricher::from_config(&config)?;
    tracing::info!("Enrichment pipeline initialized");

    let mailer = HttpMailRelay::from_config(&config, build_http_client(&config)?)
        .map(|relay| Arc::new(relay) as Arc<dyn ReportMailer>);
    if mailer.is_some() {
        tracing::info!("✓ Mail relay configured");
    }

    let app_state = Arc::new(AppState {
        config: config.clone(),
        enricher,
        mailer,
    });

    let app = handlers::router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
