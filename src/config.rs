use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which remote service answers prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Server function taking `{prompt, type, datasetId}`
    Function,
    /// OpenAI-compatible chat completions endpoint
    Gateway,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub function_url: Option<String>,
    pub api_key: Option<String>,
    pub gateway_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("DATACHAT_BACKEND").map(|v| v.to_lowercase()).as_deref() {
            None | Some("gateway") => Backend::Gateway,
            Some("function") => Backend::Function,
            Some(other) => return Err(anyhow!("Unknown DATACHAT_BACKEND '{}' (expected function or gateway)", other)),
        };

        let timeout_secs = match get("DATACHAT_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid DATACHAT_TIMEOUT_SECS '{}'", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            backend,
            function_url: get("DATACHAT_FUNCTION_URL"),
            api_key: get("DATACHAT_API_KEY"),
            gateway_url: get("DATACHAT_GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            model: get("DATACHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.backend, Backend::Gateway);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.api_key.is_none());
        assert!(config.function_url.is_none());
    }

    #[test]
    fn test_function_backend() {
        let config = config_from(&[
            ("DATACHAT_BACKEND", "Function"),
            ("DATACHAT_FUNCTION_URL", "http://localhost:54321/functions/v1/chat"),
            ("DATACHAT_API_KEY", "secret"),
            ("DATACHAT_TIMEOUT_SECS", "5"),
            ("DATACHAT_MODEL", ""),
        ])
        .unwrap();
        assert_eq!(config.backend, Backend::Function);
        assert_eq!(config.function_url.as_deref(), Some("http://localhost:54321/functions/v1/chat"));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("DATACHAT_BACKEND", "carrier-pigeon")]).is_err());
        assert!(config_from(&[("DATACHAT_TIMEOUT_SECS", "soon")]).is_err());
    }
}
