/// Integration tests with mocked external APIs
/// Exercises every HTTP client and the full pipeline against wiremock servers
use lead_enrichment_api::analysis::{
    AnalysisInvoker, ChatMessage, CompletionRequest, LanguageModel, OpenAiClient,
};
use lead_enrichment_api::config::Config;
use lead_enrichment_api::enrichment::LeadEnricher;
use lead_enrichment_api::errors::AppError;
use lead_enrichment_api::models::{AnalysisOutcome, LeadQuery, Source};
use lead_enrichment_api::notifier::{HttpMailRelay, ReportMailer};
use lead_enrichment_api::services::{
    build_http_client, ApolloService, ContactMatchSource, DomainSearchSource, HunterService,
    PeopleDataLabsService, ProfileDataSource, SerpApiService, WebSearchSource,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a test config with every API pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        port: 8080,
        peopledatalabs_api_key: Some("pdl_key".to_string()),
        apollo_api_key: Some("apollo_key".to_string()),
        hunter_api_key: Some("hunter_key".to_string()),
        serp_api_key: Some("serp_key".to_string()),
        openai_api_key: Some("openai_key".to_string()),
        openai_model: "gpt-4".to_string(),
        http_timeout_secs: 5,
        peopledatalabs_base_url: base_url.to_string(),
        apollo_base_url: base_url.to_string(),
        hunter_base_url: base_url.to_string(),
        serp_api_base_url: base_url.to_string(),
        openai_base_url: format!("{}/v1", base_url),
        mail_relay_url: Some(format!("{}/relay/send", base_url)),
        mail_relay_token: Some("relay_token".to_string()),
        sender_email: Some("reports@example.com".to_string()),
    }
}

fn pdl_payload() -> serde_json::Value {
    json!({
        "status": 200,
        "data": {
            "full_name": "ada lovelace",
            "job_title": "founder",
            "job_company_name": "analytical engines",
            "location_names": ["london, england"],
            "skills": ["mathematics", "poetry"],
            "linkedin_url": "linkedin.com/in/ada"
        }
    })
}

fn hunter_payload(count: usize) -> serde_json::Value {
    let emails: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "value": format!("person{}@engines.io", i),
                "first_name": "Person",
                "last_name": i.to_string(),
                "position": "Engineer",
                "confidence": 91,
                "linkedin": null
            })
        })
        .collect();
    json!({
        "data": {
            "domain": "engines.io",
            "organization": "Analytical Engines",
            "pattern": "{first}",
            "webmail": false,
            "accept_all": false,
            "emails": emails
        }
    })
}

fn serp_payload() -> serde_json::Value {
    json!({
        "organic_results": [
            {"title": "Ada Lovelace - LinkedIn", "snippet": "Founder at Analytical Engines", "link": "https://linkedin.com/in/ada"},
            {"title": "Ada news", "snippet": "Recent news", "link": "https://news.example.com/ada"}
        ]
    })
}

#[tokio::test]
async fn test_peopledatalabs_sends_only_present_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/person/enrich"))
        .and(query_param("api_key", "pdl_key"))
        .and(query_param("name", "Ada Lovelace"))
        .and(query_param("company", "Analytical Engines"))
        .and(query_param_is_missing("email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pdl_payload()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let service = PeopleDataLabsService::new(&config, build_http_client(&config).unwrap());
    let result = service
        .enrich_person(None, Some("Ada Lovelace"), Some("Analytical Engines"))
        .await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap()["data"]["full_name"], "ada lovelace");
}

#[tokio::test]
async fn test_apollo_match_sends_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/people/match"))
        .and(query_param("api_key", "apollo_key"))
        .and(query_param("email", "ada@engines.io"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"person": {"name": "Ada Lovelace"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let service = ApolloService::new(&config, build_http_client(&config).unwrap());
    let person = service.match_person("ada@engines.io").await.unwrap();

    assert_eq!(person["person"]["name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_hunter_non_2xx_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/domain-search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let service = HunterService::new(&config, build_http_client(&config).unwrap());
    let err = service.search_domain("engines.io").await.unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Hunter.io domain search:"));
    assert!(message.contains("500"));
}

#[tokio::test]
async fn test_serpapi_non_json_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("engine", "google"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let service = SerpApiService::new(&config, build_http_client(&config).unwrap());
    let err = service.search("ada lovelace").await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse SerpAPI response"));
}

#[tokio::test]
async fn test_openai_request_shape_and_reply() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer openai_key"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "temperature": 0.7,
            "max_tokens": 3000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Narrative"}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let client = OpenAiClient::from_config(&config, build_http_client(&config).unwrap()).unwrap();
    let request = CompletionRequest {
        model: "gpt-4".to_string(),
        messages: vec![ChatMessage::user("prompt")],
        temperature: 0.7,
        max_tokens: 3000,
    };

    let reply = client.complete(&request).await.unwrap();
    assert_eq!(reply.as_deref(), Some("Narrative"));
}

#[tokio::test]
async fn test_openai_quota_error_degrades_analysis() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let invoker = AnalysisInvoker::from_config(&config, build_http_client(&config).unwrap());
    let lead = LeadQuery::named("Ada Lovelace").unwrap();
    let outcome = invoker.analyze(&lead, "SUMMARY").await;

    match outcome {
        AnalysisOutcome::Degraded { narrative, reason } => {
            assert!(narrative.ends_with("SUMMARY"));
            assert!(reason.contains("429"));
        }
        other => panic!("Expected degraded outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_pipeline_against_mocked_apis() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/person/enrich"))
        .and(query_param("email", "ada@engines.io"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pdl_payload()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/people/match"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"person": null})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/domain-search"))
        .and(query_param("domain", "engines.io"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hunter_payload(12)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_payload()))
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "🎯 Lead Summary: Ada builds engines."}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let enricher = LeadEnricher::from_config(&config).unwrap();
    let lead = LeadQuery::new(
        "Ada Lovelace",
        Some("ada@engines.io"),
        Some("Analytical Engines"),
        Some("engines.io"),
    )
    .unwrap();

    let report = enricher.enrich(&lead).await;

    assert_eq!(
        report.analysis,
        AnalysisOutcome::Success {
            narrative: "🎯 Lead Summary: Ada builds engines.".to_string()
        }
    );
    assert_eq!(
        report.data_sources,
        vec![
            "profile_data",
            "contact_match",
            "domain_search",
            "web_search_1",
            "web_search_2",
            "web_search_3"
        ]
    );
    assert_eq!(report.contact_emails.len(), 12);
    assert_eq!(report.company_name.as_deref(), Some("Analytical Engines"));
    assert!(report.raw_api_data.get(Source::ContactMatch).unwrap().result.is_success());

    // The model prompt must embed the essential summary
    let requests = mock_server.received_requests().await.unwrap();
    let prompt_request = requests
        .iter()
        .find(|r| r.url.path() == "/v1/chat/completions")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&prompt_request.body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("- Name: ada lovelace"));
    assert!(prompt.contains("Apollo Profile: No person data found"));
    assert!(prompt.contains("- Total Emails Found: 12"));
    assert!(prompt.contains("Query: \"Ada Lovelace\" Analytical Engines LinkedIn"));
}

#[tokio::test]
async fn test_timeout_surfaces_as_failure_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v5/person/enrich"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pdl_payload())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serp_payload()))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.http_timeout_secs = 1;
    config.openai_api_key = None;
    let enricher = LeadEnricher::from_config(&config).unwrap();
    let report = enricher
        .enrich(&LeadQuery::named("Ada Lovelace").unwrap())
        .await;

    let profile = report.raw_api_data.get(Source::ProfileData).unwrap();
    assert!(profile.result.error().unwrap().contains("PeopleDataLabs"));
    assert!(report
        .raw_api_data
        .get(Source::WebSearch3)
        .unwrap()
        .result
        .is_success());
    assert!(report.analysis.is_degraded());
}

#[tokio::test]
async fn test_mail_relay_posts_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/relay/send"))
        .and(header("Authorization", "Bearer relay_token"))
        .and(body_partial_json(json!({
            "from": "reports@example.com",
            "to": "sales@example.com",
            "subject": "Lead Enrichment Report: Ada Lovelace"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let relay = HttpMailRelay::from_config(&config, build_http_client(&config).unwrap()).unwrap();
    let result = relay
        .send(
            "sales@example.com",
            "Lead Enrichment Report: Ada Lovelace",
            "<p>report</p>",
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_mail_relay_failure_is_readable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/relay/send"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let relay = HttpMailRelay::from_config(&config, build_http_client(&config).unwrap()).unwrap();
    let err = relay
        .send("sales@example.com", "Subject", "<p>report</p>")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ExternalApiError(ref m) if m.contains("upstream down")));
}

#[tokio::test]
async fn test_mail_relay_rejects_invalid_recipient_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let relay = HttpMailRelay::from_config(&config, build_http_client(&config).unwrap()).unwrap();
    let err = relay.send("not-an-email", "Subject", "<p>x</p>").await.unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}
