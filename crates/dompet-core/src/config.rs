//! Process configuration
//!
//! Everything the bot needs from the environment is read once at startup into an
//! immutable [`Config`] and handed to each component. Nothing else in the crate
//! reads environment variables.
//!
//! Required variables:
//! - `OLLAMA_URL`: full URL of the Ollama generate endpoint
//! - `OLLAMA_MODEL`: model name sent with every completion request
//! - `BOT_TOKEN`: Telegram bot token
//! - `APP_SCRIPT_URL`: Google Apps Script webhook backing the spreadsheet
//! - `AUTHORIZED_USER_ID`: the only Telegram user allowed to record transactions
//!
//! Optional timeout overrides (seconds):
//! - `DOMPET_COMPLETION_TIMEOUT_SECS` (default 120)
//! - `DOMPET_PERSIST_TIMEOUT_SECS` (default 60)
//! - `DOMPET_QUERY_TIMEOUT_SECS` (default 20)

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";
pub const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_APP_SCRIPT_URL: &str = "APP_SCRIPT_URL";
pub const ENV_AUTHORIZED_USER_ID: &str = "AUTHORIZED_USER_ID";

const REQUIRED_VARS: [&str; 5] = [
    ENV_OLLAMA_URL,
    ENV_OLLAMA_MODEL,
    ENV_BOT_TOKEN,
    ENV_APP_SCRIPT_URL,
    ENV_AUTHORIZED_USER_ID,
];

/// Per-call-site timeouts for outbound requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Completion service call (slow local inference)
    pub completion: Duration,
    /// Spreadsheet append
    pub persist: Duration,
    /// Spreadsheet summary queries
    pub query: Duration,
    /// Telegram long-poll wait
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            completion: Duration::from_secs(120),
            persist: Duration::from_secs(60),
            query: Duration::from_secs(20),
            poll: Duration::from_secs(30),
        }
    }
}

/// Immutable process configuration
#[derive(Clone)]
pub struct Config {
    pub ollama_url: String,
    pub ollama_model: String,
    pub bot_token: String,
    pub app_script_url: String,
    pub authorized_user_id: i64,
    pub timeouts: Timeouts,
}

// Hand-written so the bot token never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ollama_url", &self.ollama_url)
            .field("ollama_model", &self.ollama_model)
            .field("bot_token", &"<redacted>")
            .field("app_script_url", &self.app_script_url)
            .field("authorized_user_id", &self.authorized_user_id)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Config {
    /// Load `.env` (if present) and read the configuration from the environment
    pub fn from_env() -> Result<Self> {
        // Real environment variables take precedence over the file.
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Every missing or blank required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|key| get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingConfig(missing));
        }

        let raw_user_id = get(ENV_AUTHORIZED_USER_ID).unwrap_or_default();
        let authorized_user_id = raw_user_id.parse::<i64>().map_err(|_| {
            Error::InvalidConfig(format!(
                "{} must be a numeric Telegram user id, got '{}'",
                ENV_AUTHORIZED_USER_ID, raw_user_id
            ))
        })?;

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            completion: duration_override(
                &get,
                "DOMPET_COMPLETION_TIMEOUT_SECS",
                defaults.completion,
            ),
            persist: duration_override(&get, "DOMPET_PERSIST_TIMEOUT_SECS", defaults.persist),
            query: duration_override(&get, "DOMPET_QUERY_TIMEOUT_SECS", defaults.query),
            poll: defaults.poll,
        };

        Ok(Self {
            ollama_url: get(ENV_OLLAMA_URL).unwrap_or_default(),
            ollama_model: get(ENV_OLLAMA_MODEL).unwrap_or_default(),
            bot_token: get(ENV_BOT_TOKEN).unwrap_or_default(),
            app_script_url: get(ENV_APP_SCRIPT_URL).unwrap_or_default(),
            authorized_user_id,
            timeouts,
        })
    }

    /// Replace the timeouts (tests use short ones)
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

fn duration_override<F>(get: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    key = key,
                    value = %raw,
                    "Ignoring invalid timeout override, using {}s",
                    default.as_secs()
                );
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (ENV_OLLAMA_URL, "http://localhost:11434/api/generate"),
            (ENV_OLLAMA_MODEL, "gemma3"),
            (ENV_BOT_TOKEN, "123:abc"),
            (ENV_APP_SCRIPT_URL, "https://script.google.com/macros/s/xyz/exec"),
            (ENV_AUTHORIZED_USER_ID, "4242"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_config_from_lookup() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.ollama_model, "gemma3");
        assert_eq!(config.authorized_user_id, 4242);
        assert_eq!(config.timeouts, Timeouts::default());
    }

    #[test]
    fn test_config_reports_all_missing_vars() {
        let mut env = full_env();
        env.remove(ENV_BOT_TOKEN);
        env.insert(ENV_OLLAMA_MODEL, "   ");

        match load(&env) {
            Err(Error::MissingConfig(missing)) => {
                assert_eq!(missing, vec!["OLLAMA_MODEL", "BOT_TOKEN"]);
            }
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_config_rejects_non_numeric_user_id() {
        let mut env = full_env();
        env.insert(ENV_AUTHORIZED_USER_ID, "me");
        assert!(matches!(load(&env), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_timeout_overrides() {
        let mut env = full_env();
        env.insert("DOMPET_COMPLETION_TIMEOUT_SECS", "300");
        env.insert("DOMPET_QUERY_TIMEOUT_SECS", "soon");

        let config = load(&env).unwrap();
        assert_eq!(config.timeouts.completion, Duration::from_secs(300));
        assert_eq!(config.timeouts.query, Duration::from_secs(20));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&full_env()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("123:abc"));
        assert!(debug.contains("<redacted>"));
    }
}
