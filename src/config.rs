use serde::Deserialize;

const DEFAULT_PEOPLEDATALABS_BASE_URL: &str = "https://api.peopledatalabs.com";
const DEFAULT_APOLLO_BASE_URL: &str = "https://api.apollo.io";
const DEFAULT_HUNTER_BASE_URL: &str = "https://api.hunter.io";
const DEFAULT_SERP_API_BASE_URL: &str = "https://serpapi.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// Process-wide configuration, built once at startup and passed by reference
/// into every client constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub peopledatalabs_api_key: Option<String>,
    pub apollo_api_key: Option<String>,
    pub hunter_api_key: Option<String>,
    pub serp_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub http_timeout_secs: u64,
    pub peopledatalabs_base_url: String,
    pub apollo_base_url: String,
    pub hunter_base_url: String,
    pub serp_api_base_url: String,
    pub openai_base_url: String,
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
    pub sender_email: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            peopledatalabs_api_key: optional_var("PEOPLEDATALABS_API_KEY"),
            apollo_api_key: optional_var("APOLLO_API_KEY"),
            hunter_api_key: optional_var("HUNTER_API_KEY"),
            serp_api_key: optional_var("SERP_API_KEY"),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: optional_var("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            peopledatalabs_base_url: base_url_var(
                "PEOPLEDATALABS_BASE_URL",
                DEFAULT_PEOPLEDATALABS_BASE_URL,
            )?,
            apollo_base_url: base_url_var("APOLLO_BASE_URL", DEFAULT_APOLLO_BASE_URL)?,
            hunter_base_url: base_url_var("HUNTER_BASE_URL", DEFAULT_HUNTER_BASE_URL)?,
            serp_api_base_url: base_url_var("SERP_API_BASE_URL", DEFAULT_SERP_API_BASE_URL)?,
            openai_base_url: base_url_var("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)?,
            mail_relay_url: match optional_var("MAIL_RELAY_URL") {
                Some(url) => Some(validate_base_url("MAIL_RELAY_URL", url)?),
                None => None,
            },
            mail_relay_token: optional_var("MAIL_RELAY_TOKEN"),
            sender_email: optional_var("SENDER_EMAIL_ID"),
        };

        // Only presence is logged, never the credential itself
        tracing::info!("Configuration loaded successfully");
        tracing::info!(
            "PEOPLEDATALABS_API_KEY loaded: {}",
            presence(&config.peopledatalabs_api_key)
        );
        tracing::info!("APOLLO_API_KEY loaded: {}", presence(&config.apollo_api_key));
        tracing::info!("HUNTER_API_KEY loaded: {}", presence(&config.hunter_api_key));
        tracing::info!("SERP_API_KEY loaded: {}", presence(&config.serp_api_key));
        tracing::info!("OPENAI_API_KEY loaded: {}", presence(&config.openai_api_key));
        tracing::debug!("OpenAI model: {}", config.openai_model);
        tracing::debug!("HTTP timeout: {}s", config.http_timeout_secs);
        if !config.mailer_enabled() {
            tracing::warn!("Mail relay not fully configured - report emails disabled");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration with every credential absent and the public endpoints as
    /// base URLs.
    pub fn without_credentials() -> Self {
        Self {
            port: 3000,
            peopledatalabs_api_key: None,
            apollo_api_key: None,
            hunter_api_key: None,
            serp_api_key: None,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            http_timeout_secs: 30,
            peopledatalabs_base_url: DEFAULT_PEOPLEDATALABS_BASE_URL.to_string(),
            apollo_base_url: DEFAULT_APOLLO_BASE_URL.to_string(),
            hunter_base_url: DEFAULT_HUNTER_BASE_URL.to_string(),
            serp_api_base_url: DEFAULT_SERP_API_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            mail_relay_url: None,
            mail_relay_token: None,
            sender_email: None,
        }
    }

    /// Whether the report mailer has what it needs to send.
    pub fn mailer_enabled(&self) -> bool {
        self.mail_relay_url.is_some() && self.sender_email.is_some()
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn base_url_var(name: &str, default: &str) -> anyhow::Result<String> {
    match optional_var(name) {
        Some(url) => validate_base_url(name, url),
        None => Ok(default.to_string()),
    }
}

fn validate_base_url(name: &str, url: String) -> anyhow::Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    url::Url::parse(&url).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    Ok(url.trim_end_matches('/').to_string())
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "YES"
    } else {
        "NO"
    }
}
