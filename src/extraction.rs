//! Field extraction and summarization.
//!
//! Turns raw connector payloads into short, fixed-format text blocks and
//! concatenates them into the essential summary handed to the language model.
//! Nothing here can fail: a missing, null or oddly-typed field renders as
//! `N/A`, and a source without usable data renders a one-line placeholder.
//!
//! Each source has a small typed adapter (`ProfileRecord`, `ContactMatchRecord`,
//! `DomainSearchRecord`, `SearchHit`) that reads the dynamic payload once, so
//! the rendering code only deals with `Option<String>` and `Vec<String>`.

use crate::models::{AggregateResult, ContactEmailRecord, Source};
use serde_json::{Map, Value};

/// Placeholder for any missing value.
pub const NOT_AVAILABLE: &str = "N/A";

pub const MAX_CONTACT_EMAILS: usize = 10;
pub const MAX_SKILLS: usize = 5;
pub const MAX_RESULTS_PER_QUERY: usize = 3;
pub const SNIPPET_MAX_CHARS: usize = 100;
pub const ELLIPSIS: &str = "...";

pub const NO_EMAILS_FOUND: &str = "No emails found";
pub const NO_VALID_EMAILS_FOUND: &str = "No valid emails found";

pub const PROFILE_PLACEHOLDER: &str = "PeopleDataLabs Profile: No data found or limited results";
pub const CONTACT_MATCH_PLACEHOLDER: &str = "Apollo Profile: No person data found";
pub const DOMAIN_SEARCH_PLACEHOLDER: &str = "Hunter.io Domain Analysis: No data found";
pub const WEB_SEARCH_PLACEHOLDER: &str = "Google Search Results: No data found";

// ============ Value helpers ============

/// Text of a scalar field: non-blank strings and numbers. Anything else is `None`.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field(object: &Map<String, Value>, key: &str) -> Option<String> {
    scalar_text(object.get(key))
}

/// Yes/No for a boolean field.
fn flag(object: &Map<String, Value>, key: &str) -> Option<bool> {
    object.get(key).and_then(Value::as_bool)
}

/// List-valued field as strings: nulls skipped, a lone scalar becomes a
/// one-element list, objects are dropped. Blank values (`0`, `false`, `""`)
/// yield nothing.
fn list_field(value: Option<&Value>) -> Vec<String> {
    if is_blank(value) {
        return Vec::new();
    }
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Number(n)) => vec![n.to_string()],
        Some(Value::Bool(b)) => vec![b.to_string()],
        _ => Vec::new(),
    }
}

fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        items.join(", ")
    }
}

/// Joins a list-valued field with `", "`.
///
/// Null, missing or blank (`0`, `false`, `""`) → `N/A`; empty list → `N/A`;
/// list → non-null entries stringified and joined; any other non-list scalar
/// renders as itself.
pub fn safe_join(value: Option<&Value>) -> String {
    join_or_na(&list_field(value))
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => NOT_AVAILABLE,
    }
}

/// Mirrors "empty means nothing": null, false, 0, "", [] and {}.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(true)) => false,
    }
}

/// The non-empty object stored under `key`, if any.
fn object_at<'a>(payload: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    payload
        .get(key)
        .and_then(Value::as_object)
        .filter(|o| !o.is_empty())
}

/// First `max_chars` characters of `text`, always followed by the ellipsis.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

// ============ Profile data (PeopleDataLabs) ============

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileRecord {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub locations: Vec<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub email: Option<String>,
    pub education: Option<String>,
    pub skills: Vec<String>,
    pub industry: Option<String>,
    pub job_start_date: Option<String>,
    pub experience_levels: Vec<String>,
}

impl ProfileRecord {
    /// Reads the `data` object of a person-enrich response.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let person = object_at(payload, "data")?;

        let email = person
            .get("emails")
            .and_then(Value::as_array)
            .and_then(|emails| emails.first())
            .and_then(Value::as_object)
            .and_then(|first| field(first, "address"));

        let education = person
            .get("education")
            .and_then(Value::as_array)
            .and_then(|schools| schools.first())
            .and_then(|first| first.get("school"))
            .and_then(Value::as_object)
            .and_then(|school| field(school, "name"));

        let mut skills = list_field(person.get("skills"));
        skills.truncate(MAX_SKILLS);

        Some(Self {
            full_name: field(person, "full_name"),
            job_title: field(person, "job_title"),
            company: field(person, "job_company_name"),
            locations: list_field(person.get("location_names")),
            linkedin_url: field(person, "linkedin_url"),
            twitter_url: field(person, "twitter_url"),
            email,
            education,
            skills,
            industry: field(person, "industry"),
            job_start_date: field(person, "job_start_date"),
            experience_levels: list_field(person.get("job_title_levels")),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "PeopleDataLabs Profile:\n\
             - Name: {}\n\
             - Job Title: {}\n\
             - Company: {}\n\
             - Location: {}\n\
             - LinkedIn: {}\n\
             - Twitter: {}\n\
             - Email: {}\n\
             - Education: {}\n\
             - Skills: {}\n\
             - Industry: {}\n\
             - Job Start Date: {}\n\
             - Experience Level: {}",
            or_na(&self.full_name),
            or_na(&self.job_title),
            or_na(&self.company),
            join_or_na(&self.locations),
            or_na(&self.linkedin_url),
            or_na(&self.twitter_url),
            or_na(&self.email),
            or_na(&self.education),
            join_or_na(&self.skills),
            or_na(&self.industry),
            or_na(&self.job_start_date),
            join_or_na(&self.experience_levels),
        )
    }
}

// ============ Contact match (Apollo) ============

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactMatchRecord {
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

impl ContactMatchRecord {
    /// Reads the `person` object of a people-match response.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let person = object_at(payload, "person")?;
        let company = person
            .get("organization")
            .and_then(Value::as_object)
            .and_then(|org| field(org, "name"));

        Some(Self {
            name: field(person, "name"),
            title: field(person, "title"),
            company,
            linkedin_url: field(person, "linkedin_url"),
            twitter_url: field(person, "twitter_url"),
            email: field(person, "email"),
            phone: field(person, "phone"),
            city: field(person, "city"),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "Apollo Profile:\n\
             - Name: {}\n\
             - Title: {}\n\
             - Company: {}\n\
             - LinkedIn: {}\n\
             - Twitter: {}\n\
             - Email: {}\n\
             - Phone: {}\n\
             - Location: {}",
            or_na(&self.name),
            or_na(&self.title),
            or_na(&self.company),
            or_na(&self.linkedin_url),
            or_na(&self.twitter_url),
            or_na(&self.email),
            or_na(&self.phone),
            or_na(&self.city),
        )
    }
}

// ============ Domain search (Hunter.io) ============

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainSearchRecord {
    pub domain: Option<String>,
    pub organization: Option<String>,
    pub email_count: usize,
    pub pattern: Option<String>,
    pub webmail: Option<bool>,
    pub accept_all: Option<bool>,
    /// Pre-rendered contact list (see [`format_contact_emails`]).
    pub emails_detail: String,
}

impl DomainSearchRecord {
    /// Reads the `data` object of a domain-search response.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let data = object_at(payload, "data")?;

        Some(Self {
            domain: field(data, "domain"),
            organization: field(data, "organization"),
            email_count: data
                .get("emails")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            pattern: field(data, "pattern"),
            webmail: flag(data, "webmail"),
            accept_all: flag(data, "accept_all"),
            emails_detail: format_contact_emails(&payload["data"]),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "Hunter.io Domain Analysis:\n\
             - Domain: {}\n\
             - Company: {}\n\
             - Total Emails Found: {}\n\
             - Email Pattern: {}\n\
             - Webmail: {}\n\
             - Accept All: {}\n\
             \n\
             Found Emails:\n\
             {}",
            or_na(&self.domain),
            or_na(&self.organization),
            self.email_count,
            or_na(&self.pattern),
            yes_no(self.webmail),
            yes_no(self.accept_all),
            self.emails_detail,
        )
    }
}

/// Reads one entry of a domain-search `emails` list. Non-objects yield `None`.
pub fn parse_contact_email(entry: &Value) -> Option<ContactEmailRecord> {
    let entry = entry.as_object()?;
    let verification = entry.get("verification").and_then(Value::as_object);

    Some(ContactEmailRecord {
        first_name: field(entry, "first_name"),
        last_name: field(entry, "last_name"),
        email: field(entry, "value"),
        position: field(entry, "position"),
        department: field(entry, "department"),
        seniority: field(entry, "seniority"),
        confidence: field(entry, "confidence"),
        linkedin: field(entry, "linkedin"),
        verification_date: verification.and_then(|v| field(v, "date")),
        verification_status: verification.and_then(|v| field(v, "status")),
    })
}

/// Renders the domain-search contact list, one line per contact, at most
/// [`MAX_CONTACT_EMAILS`] lines.
///
/// `data` is the domain-search `data` object. An absent or empty `emails`
/// field gives [`NO_EMAILS_FOUND`]; a non-list, or a list with no usable
/// entries, gives [`NO_VALID_EMAILS_FOUND`].
pub fn format_contact_emails(data: &Value) -> String {
    let emails = data.get("emails");
    if is_blank(emails) {
        return NO_EMAILS_FOUND.to_string();
    }

    let Some(emails) = emails.and_then(Value::as_array) else {
        return NO_VALID_EMAILS_FOUND.to_string();
    };

    let lines: Vec<String> = emails
        .iter()
        .take(MAX_CONTACT_EMAILS)
        .filter_map(parse_contact_email)
        .map(|record| render_contact_line(&record))
        .collect();

    if lines.is_empty() {
        NO_VALID_EMAILS_FOUND.to_string()
    } else {
        lines.join("\n")
    }
}

fn render_contact_line(record: &ContactEmailRecord) -> String {
    format!(
        "  • {} ({}) - {} - Confidence: {}% - LinkedIn: {}",
        record.full_name().as_deref().unwrap_or(NOT_AVAILABLE),
        or_na(&record.email),
        or_na(&record.position),
        or_na(&record.confidence),
        or_na(&record.linkedin),
    )
}

/// Every contact record discovered by the domain search, uncapped.
pub fn extract_contact_emails(aggregate: &AggregateResult) -> Vec<ContactEmailRecord> {
    aggregate
        .get(Source::DomainSearch)
        .and_then(|entry| entry.result.data())
        .and_then(|payload| payload.get("data"))
        .and_then(|data| data.get("emails"))
        .and_then(Value::as_array)
        .map(|emails| emails.iter().filter_map(parse_contact_email).collect())
        .unwrap_or_default()
}

// ============ Web search (SerpAPI) ============

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHit {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
}

impl SearchHit {
    /// Top organic results of a search response, at most
    /// [`MAX_RESULTS_PER_QUERY`]; non-object entries among them are skipped.
    pub fn top_results(payload: &Value) -> Vec<SearchHit> {
        payload
            .get("organic_results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .take(MAX_RESULTS_PER_QUERY)
                    .filter_map(Value::as_object)
                    .map(|result| SearchHit {
                        title: field(result, "title"),
                        snippet: field(result, "snippet"),
                        link: field(result, "link"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn render(&self) -> String {
        format!(
            "- {}: {} (Link: {})",
            or_na(&self.title),
            truncate_snippet(or_na(&self.snippet), SNIPPET_MAX_CHARS),
            or_na(&self.link),
        )
    }
}

fn web_search_block(aggregate: &AggregateResult) -> Option<String> {
    let searches: Vec<_> = Source::WEB_SEARCHES
        .iter()
        .filter_map(|source| aggregate.get(*source))
        .collect();
    if searches.is_empty() {
        return None;
    }

    let sections: Vec<String> = searches
        .iter()
        .filter_map(|entry| {
            let hits = SearchHit::top_results(entry.result.data()?);
            if hits.is_empty() {
                return None;
            }
            let mut section = format!("Query: {}", entry.query.as_deref().unwrap_or(NOT_AVAILABLE));
            for hit in &hits {
                section.push('\n');
                section.push_str(&hit.render());
            }
            Some(section)
        })
        .collect();

    if sections.is_empty() {
        Some(WEB_SEARCH_PLACEHOLDER.to_string())
    } else {
        Some(format!("Google Search Results:\n\n{}", sections.join("\n\n")))
    }
}

// ============ Summary ============

/// Builds the essential summary: one block per attempted source in the fixed
/// order profile data, contact match, domain search, web search.
///
/// Sources that were never attempted are left out; attempted sources without
/// usable data contribute their placeholder line.
pub fn summarize(aggregate: &AggregateResult) -> String {
    let mut blocks = Vec::new();

    if let Some(entry) = aggregate.get(Source::ProfileData) {
        blocks.push(
            entry
                .result
                .data()
                .and_then(ProfileRecord::from_payload)
                .map(|record| record.render())
                .unwrap_or_else(|| PROFILE_PLACEHOLDER.to_string()),
        );
    }

    if let Some(entry) = aggregate.get(Source::ContactMatch) {
        blocks.push(
            entry
                .result
                .data()
                .and_then(ContactMatchRecord::from_payload)
                .map(|record| record.render())
                .unwrap_or_else(|| CONTACT_MATCH_PLACEHOLDER.to_string()),
        );
    }

    if let Some(entry) = aggregate.get(Source::DomainSearch) {
        blocks.push(
            entry
                .result
                .data()
                .and_then(DomainSearchRecord::from_payload)
                .map(|record| record.render())
                .unwrap_or_else(|| DOMAIN_SEARCH_PLACEHOLDER.to_string()),
        );
    }

    if let Some(block) = web_search_block(aggregate) {
        blocks.push(block);
    }

    blocks.join("\n\n")
}
