use crate::config::Config;
use crate::errors::AppError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use std::sync::LazyLock;

/// Delivers a rendered report to a recipient.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Sends an HTML email. Errors carry a human-readable reason.
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

// RFC 5322 simplified email regex
static RE_EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .ok()
});

/// Validate a recipient email address
///
/// Checks for:
/// - Minimum length and the presence of @ and .
/// - A simplified RFC 5322 local@domain.tld shape
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    RE_EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

/// Checks a message before it is handed to any transport.
pub fn validate_message(recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
    if recipient.trim().is_empty() || subject.trim().is_empty() || html_body.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Recipient, subject, and body must all be provided.".to_string(),
        ));
    }
    if !is_valid_email(recipient.trim()) {
        tracing::warn!("❌ Invalid recipient email format: {}", recipient);
        return Err(AppError::BadRequest(
            "Invalid recipient email format.".to_string(),
        ));
    }
    Ok(())
}

/// Mailer that posts messages to an HTTP mail relay.
///
/// The relay receives `{ "from", "to", "subject", "html" }` as JSON with an
/// optional bearer token.
#[derive(Clone)]
pub struct HttpMailRelay {
    client: Client,
    relay_url: String,
    token: Option<String>,
    sender: String,
}

impl HttpMailRelay {
    pub fn new(
        client: Client,
        relay_url: impl Into<String>,
        token: Option<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            client,
            relay_url: relay_url.into(),
            token,
            sender: sender.into(),
        }
    }

    /// `None` unless both the relay URL and the sender address are configured.
    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        let relay_url = config.mail_relay_url.clone()?;
        let sender = config.sender_email.clone()?;
        Some(Self::new(
            client,
            relay_url,
            config.mail_relay_token.clone(),
            sender,
        ))
    }
}

#[async_trait]
impl ReportMailer for HttpMailRelay {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        validate_message(recipient, subject, html_body)?;
        let recipient = recipient.trim();

        tracing::info!("📧 Sending report to: {} (subject: {})", recipient, subject);

        let body = json!({
            "from": self.sender,
            "to": recipient,
            "subject": subject,
            "html": html_body,
        });

        let mut request = self
            .client
            .post(&self.relay_url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Email sending failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Mail relay returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("✓ Report sent successfully to {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user+tag@subdomain.example.co.uk"));
        assert!(is_valid_email("a@b.co"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("not_an_email"));
        assert!(!is_valid_email("missing@domain"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user @example.com"));
    }

    #[test]
    fn test_email_pattern_compiles_once() {
        assert!(RE_EMAIL.is_some());
        let first: *const Regex = RE_EMAIL.as_ref().unwrap();
        assert!(is_valid_email("user@example.com"));
        let second: *const Regex = RE_EMAIL.as_ref().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_message_requires_all_parts() {
        assert!(matches!(
            validate_message("", "s", "b"),
            Err(AppError::BadRequest(ref m)) if m.contains("must all be provided")
        ));
        assert!(matches!(
            validate_message("bad", "s", "b"),
            Err(AppError::BadRequest(ref m)) if m == "Invalid recipient email format."
        ));
        assert!(validate_message("ada@acme.io", "s", "<p>b</p>").is_ok());
    }

    #[test]
    fn test_from_config_requires_url_and_sender() {
        let mut config = Config::without_credentials();
        let client = Client::new();
        assert!(HttpMailRelay::from_config(&config, client.clone()).is_none());

        config.mail_relay_url = Some("https://relay.example.com/send".to_string());
        assert!(HttpMailRelay::from_config(&config, client.clone()).is_none());

        config.sender_email = Some("reports@example.com".to_string());
        assert!(HttpMailRelay::from_config(&config, client).is_some());
    }
}
