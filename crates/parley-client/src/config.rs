use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`crate::HttpDataSource`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `https://chat.example.com`. The API prefix is added per request.
    pub server_url: Url,
    pub token: String,
    pub team_id: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: &str, token: impl Into<String>) -> Result<Self> {
        let server_url = Url::parse(server_url)
            .with_context(|| format!("invalid server url '{}'", server_url))?;
        Ok(Self {
            server_url,
            token: token.into(),
            team_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Reads `PARLEY_SERVER_URL`, `PARLEY_TOKEN`, `PARLEY_TEAM_ID` and
    /// `PARLEY_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server_url = lookup("PARLEY_SERVER_URL").context("PARLEY_SERVER_URL is not set")?;
        let token = lookup("PARLEY_TOKEN").context("PARLEY_TOKEN is not set")?;

        let mut config = Self::new(&server_url, token)?;
        config.team_id = lookup("PARLEY_TEAM_ID").filter(|t| !t.is_empty());

        if let Some(secs) = lookup("PARLEY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("PARLEY_TIMEOUT_SECS must be a number, got '{}'", secs))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_required_and_optional_settings() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PARLEY_SERVER_URL", "https://chat.example.com"),
            ("PARLEY_TOKEN", "secret"),
            ("PARLEY_TEAM_ID", "team1"),
            ("PARLEY_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.server_url.as_str(), "https://chat.example.com/");
        assert_eq!(config.token, "secret");
        assert_eq!(config.team_id.as_deref(), Some("team1"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn defaults_timeout_and_team() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PARLEY_SERVER_URL", "http://localhost:8065"),
            ("PARLEY_TOKEN", "secret"),
            ("PARLEY_TEAM_ID", ""),
        ]))
        .unwrap();

        assert_eq!(config.team_id, None);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[("PARLEY_SERVER_URL", "http://localhost")]))
            .unwrap_err();
        assert!(err.to_string().contains("PARLEY_TOKEN"));
    }

    #[test]
    fn bad_url_is_an_error() {
        assert!(ClientConfig::new("not a url", "t").is_err());
    }
}
