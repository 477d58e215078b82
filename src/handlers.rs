use crate::config::Config;
use crate::enrichment::LeadEnricher;
use crate::errors::{AppError, ResultExt};
use crate::models::{EnrichmentReport, LeadQuery, LeadRequest};
use crate::notifier::{validate_message, ReportMailer};
use crate::report;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The enrichment pipeline.
    pub enricher: LeadEnricher,
    /// Report mailer (absent when the mail relay is not configured).
    pub mailer: Option<Arc<dyn ReportMailer>>,
}

/// Body of a report request: the lead to enrich and where to send the result.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub lead: LeadRequest,
    pub recipient: String,
}

/// Health check endpoint.
///
/// Returns the service status, version, and which optional features are configured.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-enrichment-api",
            "version": env!("CARGO_PKG_VERSION"),
            "ai_analysis": state.config.openai_api_key.is_some(),
            "email_reports": state.mailer.is_some(),
        })),
    )
}

/// POST /api/v1/leads/enrich
///
/// Enriches a lead from every configured source and returns the analysis,
/// the discovered contact emails, and the raw per-source results.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - JSON body with `name` (required), `email`, `company`, `domain`.
///
/// # Returns
///
/// * `Result<Json<EnrichmentReport>, AppError>` - The report, or 400 when the name is missing.
pub async fn enrich_lead(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LeadRequest>,
) -> Result<Json<EnrichmentReport>, AppError> {
    let lead = LeadQuery::try_from(request)?;
    tracing::info!("POST /leads/enrich - lead: {}", lead.name);

    let report = state.enricher.enrich(&lead).await;

    tracing::info!(
        "Enrichment {} finished. Degraded: {}, Sources: {:?}",
        report.request_id,
        report.analysis.is_degraded(),
        report.data_sources
    );

    Ok(Json(report))
}

/// POST /api/v1/leads/report
///
/// Enriches a lead and emails the rendered HTML report to `recipient`.
///
/// # Returns
///
/// * `Result<Json<serde_json::Value>, AppError>` - `{status, recipient, request_id}` on success.
pub async fn email_lead_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let lead = LeadQuery::try_from(request.lead)?;
    let recipient = request.recipient.trim().to_string();

    let Some(mailer) = state.mailer.clone() else {
        return Err(AppError::MissingCredential(
            "MAIL_RELAY_URL and SENDER_EMAIL_ID".to_string(),
        ));
    };

    // Reject a bad recipient before spending any external API calls
    validate_message(&recipient, "-", "-")?;

    tracing::info!("POST /leads/report - lead: {}, recipient: {}", lead.name, recipient);

    let enrichment = state.enricher.enrich(&lead).await;
    let subject = report::subject(&enrichment);
    let body = report::render_html(&enrichment);

    mailer
        .send(&recipient, &subject, &body)
        .await
        .with_context(|| format!("Sending report {}", enrichment.request_id))?;

    Ok(Json(json!({
        "status": "sent",
        "recipient": recipient,
        "request_id": enrichment.request_id,
    })))
}

/// Builds the HTTP router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/leads/enrich", post(enrich_lead))
        .route("/api/v1/leads/report", post(email_lead_report))
        // Request size limit: 1MB max payload
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(1024 * 1024)));

    Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
