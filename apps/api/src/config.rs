use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-3.3-8b-instruct:free";
pub const DEFAULT_OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
/// Provider credentials are optional; a missing key leaves its slot empty.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub providers: ProviderConfig,
}

/// Remote analysis provider identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ProviderKind {
    Gemini,
    OpenRouter,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => f.write_str("Gemini"),
            ProviderKind::OpenRouter => f.write_str("OpenRouter"),
        }
    }
}

/// Everything needed to talk to one provider.
#[derive(Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Site URL sent as `HTTP-Referer`; only OpenRouter uses it.
    pub referer: Option<String>,
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .finish()
    }
}

/// The two provider slots, read once at startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub primary: Option<ProviderSettings>,
    pub secondary: Option<ProviderSettings>,
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match non_blank(&lookup, "PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => 8080,
        };

        let request_timeout = match non_blank(&lookup, "PROVIDER_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        };

        let primary = non_blank(&lookup, "GEMINI_API_KEY").map(|api_key| ProviderSettings {
            kind: ProviderKind::Gemini,
            api_key,
            endpoint: non_blank(&lookup, "GEMINI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
            model: non_blank(&lookup, "GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            referer: None,
        });

        let secondary =
            non_blank(&lookup, "OPENROUTER_API_KEY").map(|api_key| ProviderSettings {
                kind: ProviderKind::OpenRouter,
                api_key,
                endpoint: non_blank(&lookup, "OPENROUTER_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_ENDPOINT.to_string()),
                model: non_blank(&lookup, "OPENROUTER_MODEL")
                    .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
                referer: non_blank(&lookup, "OPENROUTER_REFERER"),
            });

        Ok(Config {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            providers: ProviderConfig {
                primary,
                secondary,
                request_timeout,
            },
        })
    }
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
