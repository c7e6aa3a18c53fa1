//! Outbound email
//!
//! `EmailClient` renders notification emails and hands them to a
//! `MailTransport`. Production uses SMTP through lettre.

use async_trait::async_trait;
use athena_common::config::EmailConfig;
use athena_common::errors::{AppError, Result};
use athena_common::metrics::record_notification;
use chrono::NaiveDate;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const FOOTER: &str = "This is an automated notification from Athena Federal Contract Intelligence Platform.";

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub html: bool,
}

/// Delivery backend
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: Email) -> Result<()>;
}

/// SMTP relay transport
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host).map_err(|e| {
                AppError::Configuration {
                    message: format!("Invalid SMTP relay '{}': {}", config.smtp_host, e),
                }
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self { inner: builder.build() })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(&self, email: Email) -> Result<()> {
        let message = to_message(email)?;
        self.inner.send(message).await.map_err(|e| AppError::Email {
            message: e.to_string(),
        })?;
        Ok(())
    }
}

fn to_message(email: Email) -> Result<Message> {
    let from: Mailbox = email.from.parse().map_err(|e| AppError::Email {
        message: format!("Invalid sender '{}': {}", email.from, e),
    })?;
    let to: Mailbox = email.to.parse().map_err(|e| AppError::Email {
        message: format!("Invalid recipient '{}': {}", email.to, e),
    })?;
    let content_type = if email.html {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject)
        .header(content_type)
        .body(email.body)
        .map_err(|e| AppError::Email {
            message: e.to_string(),
        })
}

/// One row of the weekly digest table
#[derive(Debug, Clone)]
pub struct OpportunitySummary {
    pub title: String,
    pub score: u32,
    pub deadline: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct EmailClient {
    transport: Arc<dyn MailTransport>,
    from: String,
    enabled: bool,
}

impl EmailClient {
    pub fn new(transport: Arc<dyn MailTransport>, from: impl Into<String>, enabled: bool) -> Self {
        let from = from.into();
        info!(enabled, from = %from, "Initialized email client");
        Self {
            transport,
            from,
            enabled,
        }
    }

    /// SMTP-backed client from configuration
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let transport = SmtpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), config.from.clone(), config.enabled))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn send_text(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.send(to, subject, body, false).await
    }

    pub async fn send_html(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.send(to, subject, body, true).await
    }

    pub async fn send_opportunity_alert(
        &self,
        to: &str,
        title: &str,
        score: u32,
        solicitation: &str,
        deadline: Option<NaiveDate>,
        url: Option<&str>,
    ) -> Result<()> {
        let subject = format!("High-Score Opportunity: {} (Score: {})", title, score);
        let body = opportunity_alert_html(title, score, solicitation, deadline, url);
        self.send_html(to, &subject, &body).await
    }

    pub async fn send_weekly_digest(
        &self,
        to: &str,
        week_start: NaiveDate,
        week_end: NaiveDate,
        opportunities: &[OpportunitySummary],
    ) -> Result<()> {
        let subject = format!("Athena Weekly Digest: {} - {}", week_start, week_end);
        let body = weekly_digest_html(week_start, week_end, opportunities);
        self.send_html(to, &subject, &body).await
    }

    pub async fn send_team_notification(&self, to: &str, team: &str, opportunity: &str, message: &str) -> Result<()> {
        let subject = format!("Team Update: {} - {}", team, opportunity);
        let body = team_notification_html(team, opportunity, message);
        self.send_html(to, &subject, &body).await
    }

    async fn send(&self, to: &str, subject: &str, body: &str, html: bool) -> Result<()> {
        if !self.enabled {
            debug!(to, subject, "Email sending disabled, skipping");
            return Ok(());
        }

        let email = Email {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            html,
        };

        let outcome = self.transport.deliver(email).await;
        record_notification("email", outcome.is_ok());
        match outcome {
            Ok(()) => {
                info!(to, subject, "Sent email");
                Ok(())
            }
            Err(e) => {
                error!(to, subject, error = %e, "Failed to send email");
                Err(e)
            }
        }
    }
}

fn escape(text: &str) -> String {
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

const CELL: &str = "padding: 10px; border-bottom: 1px solid #ddd;";

fn opportunity_alert_html(
    title: &str,
    score: u32,
    solicitation: &str,
    deadline: Option<NaiveDate>,
    url: Option<&str>,
) -> String {
    let deadline = deadline.map_or_else(|| "Not specified".to_string(), |d| d.to_string());
    let url = url.filter(|u| !u.is_empty()).unwrap_or("#");

    format!(
        "<!DOCTYPE html><html><head><meta charset='UTF-8'></head><body>\
         <div style='font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;'>\
         <h2 style='color: #28a745;'>🎯 High-Score Opportunity Alert</h2>\
         <h3>{title}</h3>\
         <table style='width: 100%; border-collapse: collapse; margin-top: 20px;'>\
         <tr><td style='{CELL}'><strong>Score:</strong></td><td style='{CELL}'>{score}/100</td></tr>\
         <tr><td style='{CELL}'><strong>Solicitation:</strong></td><td style='{CELL}'>{solicitation}</td></tr>\
         <tr><td style='{CELL}'><strong>Deadline:</strong></td><td style='{CELL}'>{deadline}</td></tr>\
         </table>\
         <p style='margin-top: 30px;'><a href='{url}' style='background-color: #0076D7; color: white; \
         padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;'>View Opportunity</a></p>\
         <p style='color: #666; font-size: 12px; margin-top: 40px;'>{FOOTER}</p>\
         </div></body></html>",
        title = escape(title),
        solicitation = escape(solicitation),
        url = escape(url),
    )
}

fn weekly_digest_html(week_start: NaiveDate, week_end: NaiveDate, opportunities: &[OpportunitySummary]) -> String {
    let rows: String = opportunities
        .iter()
        .map(|opp| {
            format!(
                "<tr><td style='{CELL}'>{}</td>\
                 <td style='{CELL} text-align: center;'>{}</td>\
                 <td style='{CELL} text-align: center;'>{}</td></tr>",
                escape(&opp.title),
                opp.score,
                opp.deadline.map_or_else(|| "N/A".to_string(), |d| d.to_string()),
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html><html><head><meta charset='UTF-8'></head><body>\
         <div style='font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto;'>\
         <h2 style='color: #0076D7;'>📊 Athena Weekly Digest</h2>\
         <p><strong>Period:</strong> {week_start} to {week_end}</p>\
         <p><strong>Opportunities:</strong> {count} new opportunities identified</p>\
         <table style='width: 100%; border-collapse: collapse; margin-top: 20px;'>\
         <thead><tr style='background-color: #f0f0f0;'>\
         <th style='padding: 12px; text-align: left; border-bottom: 2px solid #ddd;'>Opportunity</th>\
         <th style='padding: 12px; text-align: center; border-bottom: 2px solid #ddd;'>Score</th>\
         <th style='padding: 12px; text-align: center; border-bottom: 2px solid #ddd;'>Deadline</th>\
         </tr></thead>\
         <tbody>{rows}</tbody>\
         </table>\
         <p style='color: #666; font-size: 12px; margin-top: 40px;'>\
         This is an automated weekly digest from Athena Federal Contract Intelligence Platform.</p>\
         </div></body></html>",
        count = opportunities.len(),
    )
}

fn team_notification_html(team: &str, opportunity: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset='UTF-8'></head><body>\
         <div style='font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;'>\
         <h2 style='color: #ffc107;'>📢 Team Notification</h2>\
         <h3>{team}</h3>\
         <p><strong>Opportunity:</strong> {opportunity}</p>\
         <div style='background-color: #f9f9f9; padding: 15px; margin-top: 20px; border-left: 4px solid #ffc107;'>\
         <p>{message}</p></div>\
         <p style='color: #666; font-size: 12px; margin-top: 40px;'>{FOOTER}</p>\
         </div></body></html>",
        team = escape(team),
        opportunity = escape(opportunity),
        message = escape(message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, email: Email) -> Result<()> {
            self.sent.lock().await.push(email);
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn deliver(&self, _email: Email) -> Result<()> {
            Err(AppError::Email {
                message: "relay refused".to_string(),
            })
        }
    }

    fn client(enabled: bool) -> (EmailClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let client = EmailClient::new(transport.clone(), "noreply@athena.local", enabled);
        (client, transport)
    }

    #[tokio::test]
    async fn test_opportunity_alert() {
        let (client, transport) = client(true);
        let deadline = NaiveDate::from_ymd_opt(2026, 11, 1);

        client
            .send_opportunity_alert("capture@example.com", "Cloud <Migration>", 91, "W91-24-R-0001", deadline, None)
            .await
            .unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "High-Score Opportunity: Cloud <Migration> (Score: 91)");
        assert_eq!(sent[0].from, "noreply@athena.local");
        assert!(sent[0].html);
        assert!(sent[0].body.contains("Cloud &lt;Migration&gt;"));
        assert!(sent[0].body.contains("91/100"));
        assert!(sent[0].body.contains("2026-11-01"));
        assert!(sent[0].body.contains("href='#'"));
    }

    #[tokio::test]
    async fn test_weekly_digest_and_team_subjects() {
        let (client, transport) = client(true);
        let start = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let rows = vec![OpportunitySummary {
            title: "Cyber range".to_string(),
            score: 84,
            deadline: None,
        }];

        client.send_weekly_digest("a@example.com", start, end, &rows).await.unwrap();
        client
            .send_team_notification("a@example.com", "Blue Team", "Cyber range", "Pink team review Friday")
            .await
            .unwrap();

        let sent = transport.sent.lock().await;
        assert_eq!(sent[0].subject, "Athena Weekly Digest: 2026-10-05 - 2026-10-12");
        assert!(sent[0].body.contains("1 new opportunities identified"));
        assert!(sent[0].body.contains("N/A"));
        assert_eq!(sent[1].subject, "Team Update: Blue Team - Cyber range");
        assert!(sent[1].body.contains("Pink team review Friday"));
    }

    #[tokio::test]
    async fn test_disabled_skips_transport() {
        let (client, transport) = client(false);
        assert_ok!(client.send_text("a@example.com", "Hello", "World").await);
        assert!(transport.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = EmailClient::new(Arc::new(FailingTransport), "noreply@athena.local", true);
        let err = client.send_text("a@example.com", "Hello", "World").await.unwrap_err();
        assert!(matches!(err, AppError::Email { .. }));
    }

    #[test]
    fn test_message_conversion() {
        let email = Email {
            from: "noreply@athena.local".to_string(),
            to: "not an address".to_string(),
            subject: "x".to_string(),
            body: "y".to_string(),
            html: false,
        };
        assert_err!(to_message(email.clone()));

        let valid = Email {
            to: "capture@example.com".to_string(),
            ..email
        };
        assert!(to_message(valid).is_ok());
    }
}
