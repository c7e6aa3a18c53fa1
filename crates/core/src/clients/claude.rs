//! Anthropic Claude Messages API client
//!
//! Used for opportunity scoring, capture strategy drafting and
//! competitive analysis. Transient failures (network, 429, 5xx) are
//! retried with exponential backoff; other 4xx responses fail at once.

use athena_common::config::ClaudeConfig;
use athena_common::errors::{AppError, Result};
use athena_common::metrics::record_llm_request;
use backoff::{future::retry_notify, ExponentialBackoffBuilder};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const SERVICE: &str = "Claude";

const SCORING_MAX_TOKENS: u32 = 2048;
const STRATEGY_MAX_TOKENS: u32 = 4096;
const COMPETITOR_MAX_TOKENS: u32 = 3072;

const SCORING_SYSTEM_PROMPT: &str = "You are an expert federal contract analyst. Your role is to evaluate \
government contracting opportunities and score them based on fit, win probability, and strategic value.";

const STRATEGY_SYSTEM_PROMPT: &str = "You are an expert capture manager specializing in federal government \
contracts. Your role is to develop winning strategies for government proposals.";

const COMPETITOR_SYSTEM_PROMPT: &str =
    "You are a competitive intelligence analyst specializing in federal government contracting.";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Score and rationale extracted from a scoring reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: u32,
    pub rationale: String,
}

/// Claude API client
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ClaudeClient {
    /// Build a client; fails when no API key is configured
    pub fn new(config: &ClaudeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "claude.api_key is not set".to_string(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        tracing::info!(model = %config.model, "Initialized Claude client");

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system + user message exchange and return the reply text
    pub async fn send_message(&self, system: &str, user_message: &str, max_tokens: u32) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: user_message,
            }],
        };

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry_backoff)
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();

        let attempts = AtomicU32::new(0);
        let max_retries = self.max_retries;
        let this = self;
        let request = &request;
        let attempts_ref = &attempts;

        let start = Instant::now();
        let outcome = retry_notify(
            policy,
            move || async move {
                let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst);
                this.post_messages(request).await.map_err(|failure| match failure {
                    Failure::Transient(err) if attempt < max_retries => backoff::Error::transient(err),
                    Failure::Transient(err) | Failure::Permanent(err) => backoff::Error::permanent(err),
                })
            },
            |err: AppError, delay: Duration| {
                warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "Claude request failed, retrying");
            },
        )
        .await;

        record_llm_request(&self.model, start.elapsed().as_secs_f64(), outcome.is_ok());
        outcome
    }

    async fn post_messages(&self, request: &MessagesRequest<'_>) -> std::result::Result<String, Failure> {
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| Failure::Transient(AppError::upstream(SERVICE, format!("Request failed: {}", e))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = AppError::upstream(SERVICE, format!("API error {}: {}", status, body));
            return Err(if is_transient(status) {
                Failure::Transient(err)
            } else {
                Failure::Permanent(err)
            });
        }

        let reply: MessagesResponse = response.json().await.map_err(|e| {
            Failure::Permanent(AppError::upstream(SERVICE, format!("Failed to parse response: {}", e)))
        })?;

        if let Some(usage) = reply.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Claude response received"
            );
        }

        reply
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| Failure::Permanent(AppError::upstream(SERVICE, "Empty response from Claude API")))
    }

    /// Score how well an opportunity fits the company's capabilities
    pub async fn score_opportunity(&self, title: &str, description: &str, capabilities: &str) -> Result<ScoreResult> {
        let prompt = format!(
            "Analyze this federal contracting opportunity and provide a score (0-100) with rationale.\n\n\
             Opportunity Title: {}\n\n\
             Description: {}\n\n\
             Our Capabilities: {}\n\n\
             Provide your response in this exact format:\n\
             SCORE: [0-100]\n\
             RATIONALE: [Your analysis]",
            title, description, capabilities
        );

        let reply = self
            .send_message(SCORING_SYSTEM_PROMPT, &prompt, SCORING_MAX_TOKENS)
            .await?;
        Ok(parse_score_response(&reply))
    }

    /// Draft a capture strategy (win themes, discriminators, teaming, risks)
    pub async fn generate_capture_strategy(&self, title: &str, description: &str, strengths: &str) -> Result<String> {
        let prompt = format!(
            "Create a detailed capture strategy for this federal contracting opportunity.\n\n\
             Opportunity: {}\n\n\
             Description: {}\n\n\
             Our Strengths: {}\n\n\
             Provide a comprehensive capture strategy covering: win themes, discriminators, \
             teaming approach, and risk mitigation.",
            title, description, strengths
        );

        self.send_message(STRATEGY_SYSTEM_PROMPT, &prompt, STRATEGY_MAX_TOKENS)
            .await
    }

    pub async fn analyze_competitors(&self, title: &str, competitor_info: &str) -> Result<String> {
        let prompt = format!(
            "Analyze the competitive landscape for this opportunity.\n\n\
             Opportunity: {}\n\n\
             Known Competitors: {}\n\n\
             Provide analysis of competitor strengths, weaknesses, and our positioning strategy.",
            title, competitor_info
        );

        self.send_message(COMPETITOR_SYSTEM_PROMPT, &prompt, COMPETITOR_MAX_TOKENS)
            .await
    }
}

enum Failure {
    Transient(AppError),
    Permanent(AppError),
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Extract `SCORE:` and `RATIONALE:` from a scoring reply.
///
/// The score is clamped to 0..=100. A reply without a readable score
/// yields `(0, reply)`; a reply without a rationale uses the whole reply.
pub fn parse_score_response(reply: &str) -> ScoreResult {
    let mut score = None;
    let mut rationale = None;

    let mut lines = reply.lines().enumerate();
    while let Some((index, line)) = lines.next() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("SCORE:") {
            score = leading_integer(value.trim());
        } else if let Some(value) = line.strip_prefix("RATIONALE:") {
            let rest: Vec<&str> = reply.lines().skip(index + 1).collect();
            let mut text = value.trim().to_string();
            if !rest.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&rest.join("\n"));
            }
            rationale = Some(text.trim().to_string());
            break;
        }
    }

    match score {
        Some(score) => ScoreResult {
            score: score.clamp(0, 100) as u32,
            rationale: rationale
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| reply.to_string()),
        },
        None => {
            warn!("Failed to parse score response, using defaults");
            ScoreResult {
                score: 0,
                rationale: reply.to_string(),
            }
        }
    }
}

fn leading_integer(value: &str) -> Option<i64> {
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> ClaudeConfig {
        ClaudeConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.to_string(),
            retry_backoff_ms: 10,
            ..ClaudeConfig::default()
        }
    }

    fn text_reply(text: &str) -> serde_json::Value {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 120, "output_tokens": 48}
        })
    }

    #[test]
    fn test_parse_score_response() {
        let result = parse_score_response("SCORE: 85\nRATIONALE: Strong NAICS alignment.");
        assert_eq!(result.score, 85);
        assert_eq!(result.rationale, "Strong NAICS alignment.");

        let multi = parse_score_response("SCORE: 72/100\nRATIONALE: Good fit.\nPast performance is relevant.");
        assert_eq!(multi.score, 72);
        assert_eq!(multi.rationale, "Good fit.\nPast performance is relevant.");
    }

    #[test]
    fn test_parse_score_response_edge_cases() {
        assert_eq!(parse_score_response("SCORE: 140\nRATIONALE: x").score, 100);
        assert_eq!(parse_score_response("SCORE: -5\nRATIONALE: x").score, 0);

        let garbled = "I cannot score this opportunity.";
        assert_eq!(
            parse_score_response(garbled),
            ScoreResult {
                score: 0,
                rationale: garbled.to_string()
            }
        );

        let no_rationale = "SCORE: 64";
        assert_eq!(parse_score_response(no_rationale).rationale, no_rationale);
    }

    #[test]
    fn test_requires_api_key() {
        let config = ClaudeConfig {
            api_key: None,
            ..ClaudeConfig::default()
        };
        assert!(matches!(ClaudeClient::new(&config), Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_score_opportunity_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("SCORE: 91\nRATIONALE: Ideal fit.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClaudeClient::new(&config(&server.uri())).unwrap();
        let result = client
            .score_opportunity("Cloud migration", "Move workloads to GovCloud", "AWS, FedRAMP")
            .await
            .unwrap();

        assert_eq!(result.score, 91);
        assert_eq!(result.rationale, "Ideal fit.");
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Strategy")))
            .mount(&server)
            .await;

        let client = ClaudeClient::new(&config(&server.uri())).unwrap();
        let reply = client.analyze_competitors("Cloud migration", "Acme, Globex").await.unwrap();
        assert_eq!(reply, "Strategy");
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClaudeClient::new(&config(&server.uri())).unwrap();
        let err = client.send_message("system", "hello", 16).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_empty_content_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let client = ClaudeClient::new(&config(&server.uri())).unwrap();
        let err = client.send_message("system", "hello", 16).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}
