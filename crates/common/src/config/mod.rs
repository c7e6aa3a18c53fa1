//! Configuration management for Athena services
//!
//! Supports loading configuration from:
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Environment variables (prefixed with APP__)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration
    #[serde(default)]
    pub redis: RedisConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Anthropic Claude client configuration
    #[serde(default)]
    pub claude: ClaudeConfig,

    /// Microsoft Teams webhook configuration
    #[serde(default)]
    pub teams: TeamsConfig,

    /// SMTP email configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Scheduled task configuration
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Route prefix for the REST API
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply pending migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Key prefix for namespacing
    #[serde(default = "default_redis_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token signing
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_true")]
    pub json_logging: bool,

    /// Expose Prometheus metrics (`/metrics` on the API, a listener in tasks)
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Port of the task runner's Prometheus listener
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_claude_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_claude_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_claude_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures
    #[serde(default = "default_claude_retries")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds
    #[serde(default = "default_claude_backoff")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamsConfig {
    /// Incoming webhook URL
    #[serde(default)]
    pub webhook_url: String,

    /// Enable Teams notifications
    #[serde(default)]
    pub enabled: bool,

    /// Request timeout in seconds
    #[serde(default = "default_teams_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    /// Enable outbound email
    #[serde(default)]
    pub enabled: bool,

    /// Sender address
    #[serde(default = "default_email_from")]
    pub from: String,

    /// SMTP relay host
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP relay port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username
    pub username: Option<String>,

    /// SMTP password
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS
    #[serde(default = "default_true")]
    pub starttls: bool,

    /// Send timeout in seconds
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TasksConfig {
    #[serde(default)]
    pub import: ImportJobConfig,

    #[serde(default)]
    pub scoring: ScoringJobConfig,

    #[serde(default)]
    pub high_score_alert: HighScoreAlertConfig,

    #[serde(default)]
    pub weekly_digest: WeeklyDigestConfig,

    #[serde(default)]
    pub lock: LockConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportJobConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Six-field cron expression (sec min hour dom month dow)
    #[serde(default = "default_import_cron")]
    pub cron: String,

    /// Directory scanned for SAM.gov JSON exports
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringJobConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_scoring_cron")]
    pub cron: String,

    /// Opportunities read per page
    #[serde(default = "default_scoring_page_size")]
    pub page_size: u64,

    /// Opportunities scored per chunk
    #[serde(default = "default_scoring_chunk_size")]
    pub chunk_size: usize,

    /// Concurrent Claude calls within a chunk
    #[serde(default = "default_scoring_concurrency")]
    pub concurrency: usize,

    /// Company profile sent along with each opportunity
    #[serde(default = "default_company_capabilities")]
    pub company_capabilities: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HighScoreAlertConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_alert_cron")]
    pub cron: String,

    /// Minimum score that triggers an alert
    #[serde(default = "default_alert_threshold")]
    pub threshold: u32,

    /// How far back to look for new scores
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,

    /// Optional email recipient
    pub recipient_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeeklyDigestConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_digest_cron")]
    pub cron: String,

    pub recipient_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockConfig {
    /// Upper bound on how long a crashed holder blocks a job
    #[serde(default = "default_lock_at_most")]
    pub lock_at_most_secs: u64,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_api_prefix() -> String { "/api".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_true() -> bool { true }
fn default_redis_url() -> String { "redis://localhost:6379".to_string() }
fn default_redis_prefix() -> String { "athena".to_string() }
fn default_jwt_expiration() -> u64 { 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "athena".to_string() }
fn default_metrics_port() -> u16 { 9091 }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_claude_base_url() -> String { "https://api.anthropic.com".to_string() }
fn default_claude_model() -> String { "claude-3-5-sonnet-20241022".to_string() }
fn default_claude_timeout() -> u64 { 30 }
fn default_claude_retries() -> u32 { 3 }
fn default_claude_backoff() -> u64 { 2000 }
fn default_teams_timeout() -> u64 { 10 }
fn default_email_from() -> String { "noreply@athena.local".to_string() }
fn default_smtp_host() -> String { "localhost".to_string() }
fn default_smtp_port() -> u16 { 587 }
fn default_smtp_timeout() -> u64 { 30 }
fn default_import_cron() -> String { "0 0 2 * * *".to_string() }
fn default_data_dir() -> String { "./data/sam-gov".to_string() }
fn default_scoring_cron() -> String { "0 30 2 * * *".to_string() }
fn default_scoring_page_size() -> u64 { 50 }
fn default_scoring_chunk_size() -> usize { 10 }
fn default_scoring_concurrency() -> usize { 4 }
fn default_company_capabilities() -> String {
    "Government contracting experience with cloud infrastructure, cybersecurity, and data analytics"
        .to_string()
}
fn default_alert_cron() -> String { "0 0 8 * * MON-FRI".to_string() }
fn default_alert_threshold() -> u32 { 80 }
fn default_lookback_hours() -> i64 { 24 }
fn default_digest_cron() -> String { "0 0 9 * * MON".to_string() }
fn default_lock_at_most() -> u64 { 3600 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file, still honouring APP__ overrides
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/athena".to_string(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: true,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_prefix(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: true,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: true,
        }
    }
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_claude_base_url(),
            model: default_claude_model(),
            timeout_secs: default_claude_timeout(),
            max_retries: default_claude_retries(),
            retry_backoff_ms: default_claude_backoff(),
        }
    }
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            enabled: false,
            timeout_secs: default_teams_timeout(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: default_email_from(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            starttls: true,
            timeout_secs: default_smtp_timeout(),
        }
    }
}

impl Default for ImportJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_import_cron(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ScoringJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_scoring_cron(),
            page_size: default_scoring_page_size(),
            chunk_size: default_scoring_chunk_size(),
            concurrency: default_scoring_concurrency(),
            company_capabilities: default_company_capabilities(),
        }
    }
}

impl Default for HighScoreAlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_alert_cron(),
            threshold: default_alert_threshold(),
            lookback_hours: default_lookback_hours(),
            recipient_email: None,
        }
    }
}

impl Default for WeeklyDigestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: default_digest_cron(),
            recipient_email: None,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_at_most_secs: default_lock_at_most(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            redis: RedisConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
            claude: ClaudeConfig::default(),
            teams: TeamsConfig::default(),
            email: EmailConfig::default(),
            tasks: TasksConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_prefix, "/api");
        assert_eq!(config.claude.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.email.from, "noreply@athena.local");
        assert!(!config.teams.enabled);
        assert_eq!(config.observability.metrics_port, 9091);
    }

    #[test]
    fn test_task_defaults() {
        let tasks = TasksConfig::default();
        assert_eq!(tasks.high_score_alert.cron, "0 0 8 * * MON-FRI");
        assert_eq!(tasks.high_score_alert.threshold, 80);
        assert_eq!(tasks.weekly_digest.cron, "0 0 9 * * MON");
        assert_eq!(tasks.scoring.page_size, 50);
        assert_eq!(tasks.scoring.chunk_size, 10);
        assert_eq!(tasks.import.data_dir, "./data/sam-gov");
    }

    #[test]
    fn test_partial_sections_deserialize() {
        let config: AppConfig = Config::builder()
            .set_override("database.url", "postgres://db/athena")
            .unwrap()
            .set_override("tasks.weekly_digest.recipient_email", "capture@example.com")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(
            config.tasks.weekly_digest.recipient_email.as_deref(),
            Some("capture@example.com")
        );
        assert_eq!(config.tasks.weekly_digest.cron, "0 0 9 * * MON");
        assert_eq!(config.redis.key_prefix, "athena");
    }
}
