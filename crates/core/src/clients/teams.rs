//! Microsoft Teams incoming-webhook client
//!
//! Posts Office 365 `MessageCard` payloads. Delivery is best effort:
//! failures are logged and reported through the returned flag, never
//! propagated.

use athena_common::config::TeamsConfig;
use athena_common::errors::{AppError, Result};
use athena_common::metrics::record_notification;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const THEME_INFO: &str = "0076D7";
const THEME_SUCCESS: &str = "28a745";
const THEME_WARNING: &str = "ffc107";
const THEME_ERROR: &str = "dc3545";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCard {
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "@context")]
    context: &'static str,
    pub summary: String,
    pub title: String,
    pub text: String,
    pub theme_color: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub potential_action: Vec<OpenUriAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenUriAction {
    #[serde(rename = "@type")]
    kind: &'static str,
    pub name: String,
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub os: &'static str,
    pub uri: String,
}

impl MessageCard {
    fn new(title: impl Into<String>, text: impl Into<String>, theme_color: &'static str) -> Self {
        let title = title.into();
        Self {
            kind: "MessageCard",
            context: "https://schema.org/extensions",
            summary: title.clone(),
            title,
            text: text.into(),
            theme_color,
            potential_action: Vec::new(),
        }
    }

    fn with_link(mut self, name: &str, uri: &str) -> Self {
        self.potential_action.push(OpenUriAction {
            kind: "OpenUri",
            name: name.to_string(),
            targets: vec![Target {
                os: "default",
                uri: uri.to_string(),
            }],
        });
        self
    }
}

/// Build the card for a high-scoring opportunity
pub fn high_score_card(title: &str, score: u32, solicitation: &str, deadline: &str, url: Option<&str>) -> MessageCard {
    let card = MessageCard::new(
        format!("🎯 High-Score Opportunity: {}", title),
        format!(
            "**Score:** {}/100\n\n**Solicitation:** {}\n\n**Deadline:** {}\n\nReview this opportunity immediately.",
            score, solicitation, deadline
        ),
        THEME_SUCCESS,
    );

    match url.filter(|u| !u.is_empty()) {
        Some(url) => card.with_link("View Details", url),
        None => card,
    }
}

pub fn capture_team_card(team: &str, opportunity: &str, milestone: &str) -> MessageCard {
    MessageCard::new(
        format!("📢 Capture Team Alert: {}", team),
        format!("**Opportunity:** {}\n\n**Milestone:** {}", opportunity, milestone),
        THEME_WARNING,
    )
}

pub fn system_card(event: &str, message: &str, is_error: bool) -> MessageCard {
    let (icon, theme) = if is_error {
        ("⚠️ ", THEME_ERROR)
    } else {
        ("✅ ", THEME_SUCCESS)
    };
    MessageCard::new(format!("{}{}", icon, event), message, theme)
}

pub struct TeamsClient {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl TeamsClient {
    pub fn new(config: &TeamsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let webhook_url = if !config.enabled {
            None
        } else if config.webhook_url.trim().is_empty() {
            warn!("Teams webhook enabled but URL not configured, notifications will be skipped");
            None
        } else {
            Some(config.webhook_url.clone())
        };

        info!(enabled = webhook_url.is_some(), "Initialized Microsoft Teams client");
        Ok(Self { http, webhook_url })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub async fn send_message(&self, title: &str, text: &str) -> bool {
        self.send_card(MessageCard::new(title, text, THEME_INFO)).await
    }

    pub async fn send_high_score_alert(
        &self,
        title: &str,
        score: u32,
        solicitation: &str,
        deadline: &str,
        url: Option<&str>,
    ) -> bool {
        self.send_card(high_score_card(title, score, solicitation, deadline, url))
            .await
    }

    pub async fn send_capture_team_alert(&self, team: &str, opportunity: &str, milestone: &str) -> bool {
        self.send_card(capture_team_card(team, opportunity, milestone)).await
    }

    pub async fn send_system_notification(&self, event: &str, message: &str, is_error: bool) -> bool {
        self.send_card(system_card(event, message, is_error)).await
    }

    /// Post a card; returns whether Teams accepted it
    pub async fn send_card(&self, card: MessageCard) -> bool {
        let Some(url) = self.webhook_url.as_deref() else {
            debug!(title = %card.title, "Teams notifications disabled, skipping");
            return false;
        };

        let delivered = match self.http.post(url).json(&card).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(title = %card.title, "Teams message sent");
                true
            }
            Ok(response) => {
                error!(title = %card.title, status = %response.status(), "Teams webhook rejected message");
                false
            }
            Err(e) => {
                error!(title = %card.title, error = %e, "Failed to send Teams message");
                false
            }
        };

        record_notification("teams", delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn enabled(url: String) -> TeamsConfig {
        TeamsConfig {
            webhook_url: url,
            enabled: true,
            ..TeamsConfig::default()
        }
    }

    #[test]
    fn test_high_score_card_shape() {
        let card = high_score_card("Cloud migration", 92, "W91-24-R-0001", "2026-11-01", Some("https://sam.gov/x"));
        let value = serde_json::to_value(&card).unwrap();

        assert_eq!(value["@type"], "MessageCard");
        assert_eq!(value["@context"], "https://schema.org/extensions");
        assert_eq!(value["themeColor"], "28a745");
        assert_eq!(value["title"], "🎯 High-Score Opportunity: Cloud migration");
        assert!(value["text"].as_str().unwrap().contains("**Score:** 92/100"));
        assert_eq!(value["potentialAction"][0]["@type"], "OpenUri");
        assert_eq!(value["potentialAction"][0]["name"], "View Details");
        assert_eq!(value["potentialAction"][0]["targets"][0]["uri"], "https://sam.gov/x");

        let no_link = serde_json::to_value(high_score_card("x", 80, "y", "z", Some(""))).unwrap();
        assert!(no_link.get("potentialAction").is_none());
    }

    #[test]
    fn test_system_card_theme() {
        let failure = system_card("Sync Failed", "boom", true);
        assert_eq!(failure.title, "⚠️ Sync Failed");
        assert_eq!(failure.theme_color, "dc3545");

        let success = system_card("Sync Completed", "ok", false);
        assert_eq!(success.title, "✅ Sync Completed");
        assert_eq!(success.theme_color, "28a745");

        assert_eq!(capture_team_card("Blue", "Cloud", "Pink team").theme_color, "ffc107");
    }

    #[tokio::test]
    async fn test_disabled_or_unconfigured_skips() {
        let disabled = TeamsClient::new(&TeamsConfig::default()).unwrap();
        assert!(!disabled.is_enabled());
        assert!(!disabled.send_message("t", "x").await);

        let no_url = TeamsClient::new(&enabled(String::new())).unwrap();
        assert!(!no_url.is_enabled());
    }

    #[tokio::test]
    async fn test_posts_card_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .and(body_partial_json(json!({"@type": "MessageCard", "themeColor": "0076D7"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .expect(1)
            .mount(&server)
            .await;

        let client = TeamsClient::new(&enabled(format!("{}/webhook", server.uri()))).unwrap();
        assert!(client.send_message("Hello", "World").await);
    }

    #[tokio::test]
    async fn test_webhook_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = TeamsClient::new(&enabled(server.uri())).unwrap();
        assert!(!client.send_system_notification("Sync Failed", "boom", true).await);
    }
}
