use crate::services::providers::gemini::GEMINI_API_BASE;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default request body cap (20MB); attachments are buffered in memory.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Default upstream request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Immutable process configuration, built once in `main`.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub models: ModelConfig,
    pub google: GoogleConfig,
    pub gateway: GatewaySettings,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    /// Model for every route (e.g., gemini-2.5-flash)
    pub text_model: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Optional file whose content replaces the built-in persona.
    pub persona_path: Option<String>,
    pub max_upload_bytes: usize,
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_PROVIDER must be 'gemini' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let var = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let provider: ProviderKind = var("GENAI_PROVIDER", Some("gemini"))?.parse()?;

        // The mock never talks to Google, so it runs without a key.
        let api_key = match provider {
            ProviderKind::Gemini => var("GEMINI_API_KEY", None)?,
            ProviderKind::Mock => lookup("GEMINI_API_KEY").unwrap_or_default(),
        };

        Ok(GatewayConfig {
            common,
            models: ModelConfig {
                provider,
                text_model: var("GENAI_TEXT_MODEL", Some("gemini-2.5-flash"))?,
            },
            google: GoogleConfig {
                api_key: Secret::new(api_key),
                api_base: var("GEMINI_API_BASE", Some(GEMINI_API_BASE))?,
                timeout: Duration::from_secs(parse_or(
                    lookup("GEMINI_TIMEOUT_SECS"),
                    "GEMINI_TIMEOUT_SECS",
                    DEFAULT_TIMEOUT_SECS,
                )?),
            },
            gateway: GatewaySettings {
                persona_path: lookup("GATEWAY_PERSONA_PATH").filter(|p| !p.trim().is_empty()),
                max_upload_bytes: parse_or(
                    lookup("GATEWAY_MAX_UPLOAD_BYTES"),
                    "GATEWAY_MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_UPLOAD_BYTES,
                )?,
                allowed_origins: lookup("GATEWAY_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            },
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|e| !e.trim().is_empty()),
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.gateway.allowed_origins.is_empty()
            || self.gateway.allowed_origins.iter().any(|o| o == "*")
    }
}

fn get_env<F>(
    lookup: &F,
    key: &str,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: '{}'", key, raw))
        }),
        None => Ok(default),
    }
}
