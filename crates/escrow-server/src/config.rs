use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::BackoffPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_path: PathBuf,
    pub health_host: String,
    pub health_port: u16,
    pub store_retry: BackoffPolicy,
    pub bot_retry: BackoffPolicy,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database_path = sqlite_path(&database_url).ok_or(ConfigError::Invalid {
            name: "DATABASE_URL",
            value: database_url.clone(),
        })?;

        let base_delay = Duration::from_secs(parse_or(&get, "STARTUP_RETRY_DELAY_SECS", 5u64)?);
        let max_delay = Duration::from_secs(parse_or(&get, "STARTUP_RETRY_MAX_DELAY_SECS", 60u64)?);
        let jitter = Duration::from_millis(parse_or(&get, "STARTUP_RETRY_JITTER_MS", 0u64)?);
        let multiplier: f64 = parse_or(&get, "STARTUP_RETRY_BACKOFF", 1.0)?;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                name: "STARTUP_RETRY_BACKOFF",
                value: multiplier.to_string(),
            });
        }

        let policy = |attempts: u32| BackoffPolicy {
            attempts,
            base_delay,
            multiplier,
            max_delay,
            jitter,
        };
        let store_attempts = parse_attempts(&get, "STARTUP_RETRY_ATTEMPTS", 5)?;
        let bot_attempts = parse_attempts(&get, "BOT_RETRY_ATTEMPTS", 3)?;

        Ok(Self {
            bot_token,
            database_path,
            health_host: get("HEALTH_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            health_port: parse_or(&get, "HEALTH_PORT", 8282u16)?,
            store_retry: policy(store_attempts),
            bot_retry: policy(bot_attempts),
            log_dir: get("LOG_DIR").map(PathBuf::from),
        })
    }
}

/// `sqlite://path`, `sqlite:path` or a bare path.
fn sqlite_path(url: &str) -> Option<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    (!path.is_empty()).then(|| PathBuf::from(path))
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

fn parse_attempts<G>(get: &G, name: &'static str, default: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let attempts = parse_or(get, name, default)?;
    if attempts == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: attempts.to_string(),
        });
    }
    Ok(attempts)
}
