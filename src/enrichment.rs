/// Lead enrichment pipeline
///
/// This module provides the end-to-end enrichment workflow:
/// 1. Fan out to every applicable connector (profile data, contact match,
///    domain search, three web searches)
/// 2. Record each outcome, isolating failures per source
/// 3. Extract contact emails and build the essential summary
/// 4. Run the language-model analysis
/// 5. Assemble the report returned to the caller
use crate::analysis::AnalysisInvoker;
use crate::config::Config;
use crate::errors::AppError;
use crate::extraction::{extract_contact_emails, summarize};
use crate::models::{AggregateResult, EnrichmentReport, LeadQuery, Source, SourceResult};
use crate::services::{build_http_client, Connectors};
use chrono::Utc;
use uuid::Uuid;

/// Calls every applicable connector for a lead and collects the outcomes.
#[derive(Clone)]
pub struct Aggregator {
    connectors: Connectors,
}

impl Aggregator {
    pub fn new(connectors: Connectors) -> Self {
        Self { connectors }
    }

    /// Runs all connector calls concurrently and joins them.
    ///
    /// Profile data and the three web searches always run; contact match only
    /// with an email, domain search only with a domain. A failing call becomes
    /// a `Failure` entry; this function itself never fails. Entries are
    /// recorded in call order regardless of completion order.
    pub async fn aggregate(&self, lead: &LeadQuery) -> AggregateResult {
        let [query_1, query_2, query_3] = lead.search_queries();

        let profile_call = self.connectors.profile_data.enrich_person(
            lead.email.as_deref(),
            Some(lead.name.as_str()),
            lead.company.as_deref(),
        );
        let contact_call = async {
            match lead.email.as_deref() {
                Some(email) => Some(self.connectors.contact_match.match_person(email).await),
                None => None,
            }
        };
        let domain_call = async {
            match lead.domain.as_deref() {
                Some(domain) => Some(self.connectors.domain_search.search_domain(domain).await),
                None => None,
            }
        };

        let (profile, contact, domain, search_1, search_2, search_3) = tokio::join!(
            profile_call,
            contact_call,
            domain_call,
            self.connectors.web_search.search(&query_1),
            self.connectors.web_search.search(&query_2),
            self.connectors.web_search.search(&query_3),
        );

        let mut aggregate = AggregateResult::new();
        record(&mut aggregate, Source::ProfileData, None, profile);
        if let Some(result) = contact {
            record(&mut aggregate, Source::ContactMatch, None, result);
        }
        if let Some(result) = domain {
            record(&mut aggregate, Source::DomainSearch, None, result);
        }
        for (source, (query, result)) in Source::WEB_SEARCHES.into_iter().zip([
            (query_1, search_1),
            (query_2, search_2),
            (query_3, search_3),
        ]) {
            record(&mut aggregate, source, Some(query), result);
        }

        if aggregate.all_failed() {
            tracing::error!("Every source failed for lead {}", lead.name);
        } else {
            tracing::info!(
                "Aggregation complete for {}: {}/{} sources succeeded",
                lead.name,
                aggregate.success_count(),
                aggregate.len()
            );
        }

        aggregate
    }
}

fn record(
    aggregate: &mut AggregateResult,
    source: Source,
    query: Option<String>,
    result: Result<serde_json::Value, AppError>,
) {
    match &result {
        Ok(_) => tracing::info!("✓ {} ({}): success", source.provider(), source),
        Err(e) => tracing::warn!("✗ {} ({}): {}", source.provider(), source, e),
    }
    aggregate.insert(source, query, SourceResult::from_call(result));
}

/// The full pipeline: aggregation, summary, analysis, report.
#[derive(Clone)]
pub struct LeadEnricher {
    aggregator: Aggregator,
    analysis: AnalysisInvoker,
}

impl LeadEnricher {
    pub fn new(aggregator: Aggregator, analysis: AnalysisInvoker) -> Self {
        Self {
            aggregator,
            analysis,
        }
    }

    /// Production pipeline: one shared HTTP client for all connectors and the model.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config)?;
        let connectors = Connectors::from_config(config, client.clone());
        Ok(Self::new(
            Aggregator::new(connectors),
            AnalysisInvoker::from_config(config, client),
        ))
    }

    /// Enriches one lead. Always returns a report; degradation is carried as data.
    pub async fn enrich(&self, lead: &LeadQuery) -> EnrichmentReport {
        let request_id = Uuid::new_v4();
        tracing::info!("🔍 Starting enrichment {} for: {}", request_id, lead.name);

        let aggregate = self.aggregator.aggregate(lead).await;
        let contact_emails = extract_contact_emails(&aggregate);
        let essential_data = summarize(&aggregate);
        tracing::debug!("Essential summary length: {} chars", essential_data.len());

        let analysis = self.analysis.analyze(lead, &essential_data).await;
        if let Some(reason) = analysis.reason() {
            tracing::warn!("Enrichment {} degraded: {}", request_id, reason);
        }

        EnrichmentReport {
            request_id,
            generated_at: Utc::now(),
            lead_name: lead.name.clone(),
            company_name: lead.company.clone(),
            analysis,
            data_sources: aggregate.data_sources(),
            contact_emails,
            raw_api_data: aggregate,
        }
    }
}
