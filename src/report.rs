/// Email report rendering
///
/// Turns an `EnrichmentReport` into the subject line and HTML body handed to
/// the report mailer.
use crate::extraction::{MAX_CONTACT_EMAILS, NOT_AVAILABLE};
use crate::models::{ContactEmailRecord, EnrichmentReport, SourceResult};

/// Subject line for an emailed report.
pub fn subject(report: &EnrichmentReport) -> String {
    format!("Lead Enrichment Report: {}", report.lead_name)
}

/// Escapes text for inclusion in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn paragraph_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>\n")
}

fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= 90.0 {
        "High"
    } else if confidence >= 70.0 {
        "Medium"
    } else {
        "Low"
    }
}

/// The reported confidence as shown, with a label when it reads as a number.
fn confidence_cell(confidence: Option<&str>) -> String {
    let Some(raw) = confidence else {
        return NOT_AVAILABLE.to_string();
    };
    match raw.trim().parse::<f64>() {
        Ok(score) if score.is_finite() => {
            format!("{}% ({})", escape_html(raw), confidence_label(score))
        }
        _ => format!("{}%", escape_html(raw)),
    }
}

/// Only http(s) links become anchors; anything else is shown as text.
fn link_cell(url: Option<&str>) -> String {
    match url {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            format!("<a href=\"{0}\">{0}</a>", escape_html(url))
        }
        Some(other) => escape_html(other),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn contact_row(record: &ContactEmailRecord) -> String {
    let text = |value: &Option<String>| escape_html(value.as_deref().unwrap_or(NOT_AVAILABLE));

    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        escape_html(record.full_name().as_deref().unwrap_or(NOT_AVAILABLE)),
        text(&record.email),
        text(&record.position),
        text(&record.department),
        text(&record.seniority),
        confidence_cell(record.confidence.as_deref()),
        text(&record.verification_date),
        text(&record.verification_status),
        link_cell(record.linkedin.as_deref()),
    )
}

/// Renders the full HTML email body.
pub fn render_html(report: &EnrichmentReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&subject(report))));
    html.push_str("</head>\n<body>\n");

    html.push_str(&format!(
        "<h1>Lead Enrichment Report: {}</h1>\n",
        escape_html(&report.lead_name)
    ));
    html.push_str(&format!(
        "<p><strong>Company:</strong> {}<br>\n<strong>Generated:</strong> {}<br>\n<strong>Request:</strong> {}</p>\n",
        escape_html(report.company_name.as_deref().unwrap_or(NOT_AVAILABLE)),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.request_id,
    ));

    html.push_str("<h2>AI Lead Analysis</h2>\n");
    if let Some(reason) = report.analysis.reason() {
        html.push_str(&format!(
            "<p><em>AI analysis unavailable: {}</em></p>\n",
            escape_html(reason)
        ));
    }
    html.push_str(&format!(
        "<div>{}</div>\n",
        paragraph_html(report.analysis.narrative())
    ));

    if !report.contact_emails.is_empty() {
        html.push_str(&format!(
            "<h2>Discovered Emails ({})</h2>\n",
            report.contact_emails.len()
        ));
        html.push_str("<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">\n");
        html.push_str(
            "<tr><th>Name</th><th>Email</th><th>Position</th><th>Department</th>\
             <th>Seniority</th><th>Confidence</th><th>Verified</th><th>Status</th>\
             <th>LinkedIn</th></tr>\n",
        );
        for record in report.contact_emails.iter().take(MAX_CONTACT_EMAILS) {
            html.push_str(&contact_row(record));
        }
        html.push_str("</table>\n");
    }

    html.push_str("<h2>Data Sources</h2>\n<ul>\n");
    for entry in report.raw_api_data.entries() {
        let status = match &entry.result {
            SourceResult::Success { .. } => "retrieved successfully".to_string(),
            SourceResult::Failure { error } => format!("failed: {}", escape_html(error)),
        };
        html.push_str(&format!(
            "<li>{} ({}): {}</li>\n",
            entry.source.provider(),
            entry.source,
            status
        ));
    }
    html.push_str("</ul>\n</body>\n</html>\n");

    html
}
