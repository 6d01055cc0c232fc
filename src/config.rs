//! Configuration types.
//!
//! Everything is read once at startup from environment variables and held
//! immutable for the life of the process. Missing required configuration
//! is a startup-fatal `ConfigError`, never a per-message error.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Agent identity and pipeline limits.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display name the agent signs replies with.
    pub agent_name: String,
    /// The verified address the agent sends from (and identifies as in prompts).
    pub agent_email: String,
    /// Optional reference website the agent may consult for business info.
    pub info_source: Option<String>,
    /// Directory holding raw inbound emails (`emails/<message_id>`).
    pub spool_dir: PathBuf,
    /// How often the spool is scanned for new messages.
    pub poll_interval: Duration,
    /// Maximum emails processed concurrently.
    pub max_concurrent: usize,
    /// Maximum reasoning iterations (model calls) per email.
    pub max_iterations: u32,
    /// Wall-clock budget for one email's reasoning loop.
    pub loop_deadline: Duration,
}

impl AgentConfig {
    /// Build from environment. `MAIL_AGENT_EMAIL` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let agent_email = std::env::var("MAIL_AGENT_EMAIL")
            .map_err(|_| ConfigError::MissingEnvVar("MAIL_AGENT_EMAIL".into()))?;

        let agent_name = std::env::var("MAIL_AGENT_NAME").unwrap_or_else(|_| "Jeff".to_string());
        let info_source = std::env::var("MAIL_AGENT_INFO_SOURCE").ok();

        let spool_dir = std::env::var("MAIL_AGENT_SPOOL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./spool"));

        let poll_interval = Duration::from_secs(parse_var("MAIL_AGENT_POLL_INTERVAL_SECS", 30)?);
        let max_concurrent = parse_var("MAIL_AGENT_MAX_CONCURRENT", 1)?;
        let max_iterations = parse_var("MAIL_AGENT_MAX_ITERATIONS", 8)?;
        let loop_deadline = Duration::from_secs(parse_var("MAIL_AGENT_LOOP_DEADLINE_SECS", 540)?);

        if max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_AGENT_MAX_CONCURRENT".into(),
                message: "must be at least 1".into(),
            });
        }
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_AGENT_MAX_ITERATIONS".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            agent_name,
            agent_email,
            info_source,
            spool_dir,
            poll_interval,
            max_concurrent,
            max_iterations,
            loop_deadline,
        })
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "Jeff".to_string(),
            agent_email: "support@example.com".to_string(),
            info_source: None,
            spool_dir: PathBuf::from("./spool"),
            poll_interval: Duration::from_secs(30),
            max_concurrent: 1,
            max_iterations: 8,
            loop_deadline: Duration::from_secs(540),
        }
    }
}

/// Model call configuration, passed through unchanged on every request.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier, e.g. "gpt-4o-mini".
    pub model: String,
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// API credential.
    pub api_key: SecretString,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum transport-level retries per call.
    pub max_retries: u32,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl ModelConfig {
    /// Build from environment. `OPENAI_API_KEY` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".into()))?;

        let model =
            std::env::var("MAIL_AGENT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let api_base = std::env::var("MAIL_AGENT_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let temperature: f32 = parse_var("MAIL_AGENT_TEMPERATURE", 0.5)?;
        let max_retries = parse_var("MAIL_AGENT_MODEL_MAX_RETRIES", 3)?;
        let timeout = Duration::from_millis(parse_var("MAIL_AGENT_MODEL_TIMEOUT_MS", 540_000)?);

        Ok(Self {
            model,
            api_base,
            api_key: SecretString::from(api_key),
            temperature,
            max_retries,
            timeout,
        })
    }
}

/// SMTP delivery configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build from environment. Returns `None` if `SMTP_HOST` is not set
    /// (delivery then logs replies instead of sending them).
    pub fn from_env(from_address: &str) -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();

        Some(Self {
            host,
            port,
            username,
            password,
            from_address: from_address.to_string(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.into(),
            message: format!("could not parse {raw:?}"),
        }),
    }
}
