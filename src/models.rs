use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

// ============ Lead Input ============

/// Lead descriptor as received over HTTP, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub domain: Option<String>,
}

/// A validated lead: the subject of one enrichment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadQuery {
    /// Full name of the lead (never blank).
    pub name: String,
    /// Email address, used for the contact-match lookup.
    pub email: Option<String>,
    /// Company name, used in profile lookup and search queries.
    pub company: Option<String>,
    /// Company domain, used for the domain search.
    pub domain: Option<String>,
}

impl LeadQuery {
    /// Builds a lead, trimming every field and treating blank optionals as absent.
    ///
    /// # Errors
    ///
    /// * `AppError::BadRequest` - when the name is blank.
    pub fn new(
        name: &str,
        email: Option<&str>,
        company: Option<&str>,
        domain: Option<&str>,
    ) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Lead name is required".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            email: non_blank(email),
            company: non_blank(company),
            domain: non_blank(domain),
        })
    }

    /// Name-only lead.
    pub fn named(name: &str) -> Result<Self, AppError> {
        Self::new(name, None, None, None)
    }

    /// The three web-search queries, in call order.
    pub fn search_queries(&self) -> [String; 3] {
        let company = self.company.as_deref().unwrap_or("");
        [
            format!("\"{}\" {} LinkedIn", self.name, company),
            format!("\"{}\" {} CEO founder", self.name, company),
            format!("{} news recent", self.company.as_deref().unwrap_or(&self.name)),
        ]
    }
}

impl TryFrom<LeadRequest> for LeadQuery {
    type Error = AppError;

    fn try_from(request: LeadRequest) -> Result<Self, Self::Error> {
        LeadQuery::new(
            request.name.as_deref().unwrap_or(""),
            request.email.as_deref(),
            request.company.as_deref(),
            request.domain.as_deref(),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============ Aggregation ============

/// One external source queried during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    ProfileData,
    ContactMatch,
    DomainSearch,
    /// The three web searches, in call order.
    WebSearch1,
    WebSearch2,
    WebSearch3,
}

impl Source {
    pub const WEB_SEARCHES: [Source; 3] = [
        Source::WebSearch1,
        Source::WebSearch2,
        Source::WebSearch3,
    ];

    /// Every source, in the fixed report order.
    pub const ALL: [Source; 6] = [
        Source::ProfileData,
        Source::ContactMatch,
        Source::DomainSearch,
        Source::WebSearch1,
        Source::WebSearch2,
        Source::WebSearch3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::ProfileData => "profile_data",
            Source::ContactMatch => "contact_match",
            Source::DomainSearch => "domain_search",
            Source::WebSearch1 => "web_search_1",
            Source::WebSearch2 => "web_search_2",
            Source::WebSearch3 => "web_search_3",
        }
    }

    /// Provider label used in logs and reports.
    pub fn provider(&self) -> &'static str {
        match self {
            Source::ProfileData => "PeopleDataLabs",
            Source::ContactMatch => "Apollo",
            Source::DomainSearch => "Hunter.io",
            Source::WebSearch1 | Source::WebSearch2 | Source::WebSearch3 => "Google Search",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of a single connector call. Never partially successful.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult {
    Success { data: Value },
    Failure { error: String },
}

impl SourceResult {
    pub fn from_call(result: Result<Value, AppError>) -> Self {
        match result {
            Ok(data) => SourceResult::Success { data },
            Err(e) => SourceResult::Failure {
                error: e.to_string(),
            },
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            SourceResult::Success { data } => Some(data),
            SourceResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SourceResult::Success { .. } => None,
            SourceResult::Failure { error } => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SourceResult::Success { .. })
    }
}

/// One recorded connector invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub source: Source,
    /// Query text, for web searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub result: SourceResult,
}

/// Every connector outcome for one lead, in call order.
///
/// Serialises as a JSON object keyed by source name whose keys keep the
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    entries: Vec<SourceEntry>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. A repeated source replaces the earlier entry in place.
    pub fn insert(&mut self, source: Source, query: Option<String>, result: SourceResult) {
        let entry = SourceEntry {
            source,
            query,
            result,
        };
        match self.entries.iter_mut().find(|e| e.source == source) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, source: Source) -> Option<&SourceEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of every attempted source, in call order.
    pub fn data_sources(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.source.as_str().to_string())
            .collect()
    }

    /// True when at least one source was attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| !e.result.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_success()).count()
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct EntryBody<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            query: Option<&'a str>,
            #[serde(flatten)]
            result: &'a SourceResult,
        }

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(
                entry.source.as_str(),
                &EntryBody {
                    query: entry.query.as_deref(),
                    result: &entry.result,
                },
            )?;
        }
        map.end()
    }
}

// ============ Extracted Records ============

/// One email discovered by the domain search, copied verbatim from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactEmailRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// The email address itself.
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub seniority: Option<String>,
    /// Source-reported confidence as text, unmodified (`"97"`, `"88.6"`).
    pub confidence: Option<String>,
    pub linkedin: Option<String>,
    pub verification_date: Option<String>,
    pub verification_status: Option<String>,
}

impl ContactEmailRecord {
    /// "First Last", or `None` when both parts are missing.
    pub fn full_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

// ============ Analysis ============

/// Result of the language-model stage. Always displayable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// The model produced a narrative.
    Success { narrative: String },
    /// No model call succeeded; the narrative is built from the summary.
    Degraded { narrative: String, reason: String },
}

impl AnalysisOutcome {
    pub fn narrative(&self) -> &str {
        match self {
            AnalysisOutcome::Success { narrative } => narrative,
            AnalysisOutcome::Degraded { narrative, .. } => narrative,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success { .. } => None,
            AnalysisOutcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }
}

/// Everything the pipeline returns to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub lead_name: String,
    pub company_name: Option<String>,
    pub analysis: AnalysisOutcome,
    pub data_sources: Vec<String>,
    pub contact_emails: Vec<ContactEmailRecord>,
    pub raw_api_data: AggregateResult,
}
