use std::time::Duration;

use chrono_tz::Tz;

const DEV_JWT_SECRET: &str = "solace-dev-secret-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Which reply strategy answers chat messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionProvider {
    /// Canned round-robin replies only
    Fallback,
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub provider: CompletionProvider,
    pub openai: Option<OpenAiConfig>,
    pub timeout: Duration,
    /// Substitute a canned reply when the provider fails
    pub fallback_on_error: bool,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cors_origins: Vec<String>,
    pub day_timezone: Tz,
    pub completion: CompletionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_or("PORT", get("PORT"), 3000u16)?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", get("JWT_TTL_HOURS"), 24i64)?;
        if jwt_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_TTL_HOURS",
                value: jwt_ttl_hours.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let cors_origins = get("SOLACE_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let day_timezone = match get("SOLACE_DAY_TIMEZONE") {
            Some(name) => name.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                name: "SOLACE_DAY_TIMEZONE",
                value: name.clone(),
                reason: e.to_string(),
            })?,
            None => Tz::UTC,
        };

        let provider = match get("COMPLETION_PROVIDER")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "" | "fallback" => CompletionProvider::Fallback,
            "openai" => CompletionProvider::OpenAi,
            other => {
                return Err(ConfigError::Invalid {
                    name: "COMPLETION_PROVIDER",
                    value: other.to_string(),
                    reason: "expected 'fallback' or 'openai'".to_string(),
                });
            }
        };

        let openai = match provider {
            CompletionProvider::OpenAi => Some(OpenAiConfig {
                api_key: get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                max_tokens: parse_or("OPENAI_MAX_TOKENS", get("OPENAI_MAX_TOKENS"), 150u32)?,
            }),
            CompletionProvider::Fallback => None,
        };

        let timeout_secs = parse_or(
            "COMPLETION_TIMEOUT_SECS",
            get("COMPLETION_TIMEOUT_SECS"),
            20u64,
        )?;
        let fallback_on_error = parse_or(
            "COMPLETION_FALLBACK_ON_ERROR",
            get("COMPLETION_FALLBACK_ON_ERROR"),
            true,
        )?;

        Ok(Self {
            database_url,
            port,
            jwt_secret,
            jwt_ttl_hours,
            cors_origins,
            day_timezone,
            completion: CompletionConfig {
                provider,
                openai,
                timeout: Duration::from_secs(timeout_secs),
                fallback_on_error,
            },
        })
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}
