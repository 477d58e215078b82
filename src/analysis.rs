//! Language-model analysis of the essential summary.
//!
//! The model's answer is free-form prose and is forwarded untouched. The only
//! structured control flow is the three-way outcome: no model configured,
//! model call failed, model call succeeded.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AnalysisOutcome, LeadQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sampling temperature for every analysis request.
pub const ANALYSIS_TEMPERATURE: f32 = 0.7;
/// Output cap for every analysis request.
pub const ANALYSIS_MAX_TOKENS: u32 = 3000;

pub const NO_ANALYSIS_GENERATED: &str = "No analysis generated";
pub const MODEL_NOT_CONFIGURED: &str = "language model not configured";

/// Sections the model is asked to cover, in order.
pub const ANALYSIS_SECTIONS: [&str; 10] = [
    "🎯 Lead Summary & Key Facts",
    "💼 Professional Background & Career Insights",
    "🏢 Company Analysis & Industry Context",
    "🔗 Social Media & Online Presence (research and find their profiles)",
    "📞 Contact Strategy & Engagement Recommendations",
    "💬 Conversation Starters & Value Propositions",
    "🧠 Personality & Communication Style Assessment",
    "🎯 Potential Pain Points & Business Challenges",
    "📊 Additional Research Insights & Industry Trends",
    "⚡ Quick Action Items for Outreach",
];

/// One chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A text-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the raw completion text; `None` when the model produced no content.
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, AppError>;
}

// ============ OpenAI ============

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client for the OpenAI REST API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// `None` when no `OPENAI_API_KEY` is configured.
    pub fn from_config(config: &Config, client: Client) -> Option<Self> {
        config
            .openai_api_key
            .as_ref()
            .map(|key| Self::new(client, config.openai_base_url.clone(), key.clone()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, AppError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(AppError::ExternalApiError(format!(
                "OpenAI returned status {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse OpenAI response: {}", e))
        })?;

        tracing::debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

// ============ Invoker ============

/// Builds the analysis prompt around the essential summary.
pub fn build_prompt(lead_name: &str, company_name: Option<&str>, essential_data: &str) -> String {
    let from_company = company_name
        .filter(|c| !c.is_empty())
        .map(|c| format!(" from {}", c))
        .unwrap_or_default();

    let sections = ANALYSIS_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, section)| format!("{}. {}", i + 1, section))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an expert lead researcher and sales intelligence analyst. \
I'm providing you with data about a lead: {lead_name}{from_company}.

Your task is to analyze this data and provide comprehensive insights. \
Use your knowledge to provide additional context and research.

IMPORTANT: Please also research and find their social media profiles including:
- LinkedIn (if not already provided)
- Twitter/X profile
- CrunchBase profile (if they're a founder/executive)
- Instagram (if relevant for business)
- Facebook business page
- Personal website/blog
- GitHub (if they're technical)
- Medium/Substack (if they write)

Here's the data I collected:

{essential_data}

Please provide a comprehensive lead analysis. Structure your response however you think \
is most useful for a sales/business development professional. Include:

{sections}

Feel free to make intelligent inferences based on the data and your knowledge. \
Provide actionable insights that would help someone successfully engage with this lead.

Make your analysis detailed, practical, and engaging. Use emojis and formatting to make \
it easy to read. Don't worry about JSON format - just provide the best possible analysis \
in whatever structure works best.
"
    )
}

/// Runs the language-model stage; never fails from the caller's point of view.
#[derive(Clone)]
pub struct AnalysisInvoker {
    model: Option<Arc<dyn LanguageModel>>,
    model_name: String,
}

impl AnalysisInvoker {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        let model = OpenAiClient::from_config(config, client)
            .map(|c| Arc::new(c) as Arc<dyn LanguageModel>);
        if model.is_none() {
            tracing::warn!("OpenAI client not initialized - API key missing");
        }
        Self::new(model, config.openai_model.clone())
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn completion_request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: ANALYSIS_TEMPERATURE,
            max_tokens: ANALYSIS_MAX_TOKENS,
        }
    }

    pub async fn analyze(&self, lead: &LeadQuery, essential_data: &str) -> AnalysisOutcome {
        let Some(model) = &self.model else {
            tracing::warn!("Skipping AI analysis for {}: {}", lead.name, MODEL_NOT_CONFIGURED);
            return AnalysisOutcome::Degraded {
                narrative: format!(
                    "AI analysis not available, but here's what we found:\n\n{}",
                    essential_data
                ),
                reason: MODEL_NOT_CONFIGURED.to_string(),
            };
        };

        let prompt = build_prompt(&lead.name, lead.company.as_deref(), essential_data);
        let request = self.completion_request(prompt);

        tracing::info!("Analyzing lead {} with {}", lead.name, self.model_name);
        match model.complete(&request).await {
            Ok(content) => {
                tracing::info!("✓ AI analysis completed for {}", lead.name);
                AnalysisOutcome::Success {
                    narrative: content
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| NO_ANALYSIS_GENERATED.to_string()),
                }
            }
            Err(e) => {
                tracing::error!("AI analysis failed for {}: {}", lead.name, e);
                AnalysisOutcome::Degraded {
                    narrative: format!(
                        "Analysis failed, but here's what we found:\n\n{}",
                        essential_data
                    ),
                    reason: format!("AI analysis failed: {}", e),
                }
            }
        }
    }
}
