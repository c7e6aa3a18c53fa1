//! Outbound integrations: Claude, Microsoft Teams and SMTP email

pub mod claude;
pub mod email;
pub mod teams;

pub use claude::{parse_score_response, ClaudeClient, ScoreResult};
pub use email::{Email, EmailClient, MailTransport, OpportunitySummary, SmtpTransport};
pub use teams::{MessageCard, TeamsClient};
