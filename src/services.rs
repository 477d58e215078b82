//! External enrichment API clients.
//!
//! Each provider sits behind its own capability trait so the aggregator can be
//! driven by mocks. All four clients share one failure policy: a transport
//! error, a non-2xx status or a body that is not JSON is an
//! `AppError::ExternalApiError`, and a missing API key is an
//! `AppError::MissingCredential` raised before any request is sent.

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Person enrichment by email/name/company (profile data).
#[async_trait]
pub trait ProfileDataSource: Send + Sync {
    async fn enrich_person(
        &self,
        email: Option<&str>,
        name: Option<&str>,
        company: Option<&str>,
    ) -> Result<Value, AppError>;
}

/// Person lookup by email (contact match).
#[async_trait]
pub trait ContactMatchSource: Send + Sync {
    async fn match_person(&self, email: &str) -> Result<Value, AppError>;
}

/// Email discovery for a company domain.
#[async_trait]
pub trait DomainSearchSource: Send + Sync {
    async fn search_domain(&self, domain: &str) -> Result<Value, AppError>;
}

/// Free-text web search.
#[async_trait]
pub trait WebSearchSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Value, AppError>;
}

/// Builds the shared HTTP client with the configured per-call timeout.
pub fn build_http_client(config: &Config) -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| AppError::InternalError(format!("Failed to create HTTP client: {}", e)))
}

fn require_key<'a>(key: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    key.as_deref()
        .ok_or_else(|| AppError::MissingCredential(name.to_string()))
}

/// Sends the request and parses a JSON body, applying the shared failure policy.
async fn fetch_json(request: RequestBuilder, provider: &str) -> Result<Value, AppError> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::ExternalApiError(format!("{} request failed: {}", provider, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!("{} returned error {}: {}", provider, status, error_text);
        return Err(AppError::ExternalApiError(format!(
            "{} returned status {}: {}",
            provider, status, error_text
        )));
    }

    response.json::<Value>().await.map_err(|e| {
        AppError::ExternalApiError(format!("Failed to parse {} response: {}", provider, e))
    })
}

// ============ PeopleDataLabs ============

pub struct PeopleDataLabsService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PeopleDataLabsService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.peopledatalabs_base_url.clone(),
            api_key: config.peopledatalabs_api_key.clone(),
        }
    }
}

#[async_trait]
impl ProfileDataSource for PeopleDataLabsService {
    async fn enrich_person(
        &self,
        email: Option<&str>,
        name: Option<&str>,
        company: Option<&str>,
    ) -> Result<Value, AppError> {
        let api_key = require_key(&self.api_key, "PEOPLEDATALABS_API_KEY")?;

        let mut params = vec![("api_key", api_key)];
        params.extend(
            [("email", email), ("name", name), ("company", company)]
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v))),
        );

        tracing::info!("Fetching PeopleDataLabs profile for: {:?}", name.or(email));
        // Redact token from logs to prevent credential exposure
        tracing::debug!(
            "PeopleDataLabs URL: {}/v5/person/enrich?api_key=[REDACTED]",
            self.base_url
        );

        let request = self
            .client
            .get(format!("{}/v5/person/enrich", self.base_url))
            .query(&params);

        fetch_json(request, "PeopleDataLabs")
            .await
            .context("PeopleDataLabs person enrich")
    }
}

// ============ Apollo ============

pub struct ApolloService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApolloService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.apollo_base_url.clone(),
            api_key: config.apollo_api_key.clone(),
        }
    }
}

#[async_trait]
impl ContactMatchSource for ApolloService {
    async fn match_person(&self, email: &str) -> Result<Value, AppError> {
        let api_key = require_key(&self.api_key, "APOLLO_API_KEY")?;

        tracing::info!("Fetching Apollo match for email: {}", email);

        let request = self
            .client
            .get(format!("{}/v1/people/match", self.base_url))
            .header("Content-Type", "application/json")
            .header("Cache-Control", "no-cache")
            .header("User-Agent", "AI-Lead-Enrichment/1.0")
            .query(&[("api_key", api_key), ("email", email)]);

        fetch_json(request, "Apollo")
            .await
            .context("Apollo people match")
    }
}

// ============ Hunter.io ============

pub struct HunterService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HunterService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.hunter_base_url.clone(),
            api_key: config.hunter_api_key.clone(),
        }
    }
}

#[async_trait]
impl DomainSearchSource for HunterService {
    async fn search_domain(&self, domain: &str) -> Result<Value, AppError> {
        let api_key = require_key(&self.api_key, "HUNTER_API_KEY")?;

        tracing::info!("Fetching Hunter.io domain search for: {}", domain);

        let request = self
            .client
            .get(format!("{}/v2/domain-search", self.base_url))
            .query(&[("domain", domain), ("api_key", api_key)]);

        fetch_json(request, "Hunter.io")
            .await
            .context("Hunter.io domain search")
    }
}

// ============ SerpAPI ============

pub struct SerpApiService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SerpApiService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.serp_api_base_url.clone(),
            api_key: config.serp_api_key.clone(),
        }
    }
}

#[async_trait]
impl WebSearchSource for SerpApiService {
    async fn search(&self, query: &str) -> Result<Value, AppError> {
        let api_key = require_key(&self.api_key, "SERP_API_KEY")?;

        tracing::info!("Running Google search: {}", query);

        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("api_key", api_key), ("engine", "google")]);

        fetch_json(request, "SerpAPI")
            .await
            .with_context(|| format!("Google search '{}'", query))
    }
}

/// The full set of connectors one aggregator fans out to.
#[derive(Clone)]
pub struct Connectors {
    pub profile_data: Arc<dyn ProfileDataSource>,
    pub contact_match: Arc<dyn ContactMatchSource>,
    pub domain_search: Arc<dyn DomainSearchSource>,
    pub web_search: Arc<dyn WebSearchSource>,
}

impl Connectors {
    /// Production connectors sharing one HTTP client.
    pub fn from_config(config: &Config, client: Client) -> Self {
        Self {
            profile_data: Arc::new(PeopleDataLabsService::new(config, client.clone())),
            contact_match: Arc::new(ApolloService::new(config, client.clone())),
            domain_search: Arc::new(HunterService::new(config, client.clone())),
            web_search: Arc::new(SerpApiService::new(config, client)),
        }
    }
}
