use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{common::ConfigError, configs::*};

const CONFIG_PATHS: [&str; 2] = ["config.toml", "config.default.toml"];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reads the first config file found, applies environment overrides and
    /// validates the result. Running without any file is allowed as long as
    /// the environment supplies the server URL and token.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(path) => {
                crate::log_println!("Loading configuration from: {}", path);
                let config_str = std::fs::read_to_string(path)?;
                Self::from_toml_str(&config_str)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Overrides connection settings from `PLEX_SERVER`, `PLEX_TOKEN` and
    /// `SKIP_TLS_VERIFICATION`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PLEX_SERVER").filter(|v| !v.is_empty()) {
            self.plex.url = url;
        }
        if let Some(token) = lookup("PLEX_TOKEN").filter(|v| !v.is_empty()) {
            self.plex.token = token;
        }
        if let Some(skip) = lookup("SKIP_TLS_VERIFICATION") {
            self.plex.skip_tls_verification = skip == "true";
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plex.url.is_empty() {
            return Err(ConfigError::Missing("plex.url (PLEX_SERVER)"));
        }
        if self.plex.token.is_empty() {
            return Err(ConfigError::Missing("plex.token (PLEX_TOKEN)"));
        }
        if !self.plex.url.starts_with("http://") && !self.plex.url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "plex.url must be an http(s) URL, got '{}'",
                self.plex.url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.sessions.timeout_secs, 60);
        assert_eq!(config.sessions.prune_interval_secs, 60);
        assert_eq!(config.plex.refresh_interval_secs, 5);
        assert!(config.logging.is_none());
    }

    #[test]
    fn parses_sections() {
        let config = Config::from_toml_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9100

            [plex]
            url = "http://plex:32400"
            token = "abc"
            skip_tls_verification = true

            [sessions]
            timeout_secs = 120

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.address().to_string(), "127.0.0.1:9100");
        assert_eq!(config.plex.token, "abc");
        assert!(config.plex.skip_tls_verification);
        assert_eq!(config.sessions.timeout_secs, 120);
        assert_eq!(config.sessions.prune_interval_secs, 60);
        assert_eq!(config.logging.as_ref().unwrap().level.as_deref(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = Config::from_toml_str("[plex]\nurl = \"http://a\"\ntoken = \"x\"").unwrap();

        config.apply_env(env(&[
            ("PLEX_SERVER", "https://b:32400"),
            ("PLEX_TOKEN", "y"),
            ("SKIP_TLS_VERIFICATION", "true"),
        ]));

        assert_eq!(config.plex.url, "https://b:32400");
        assert_eq!(config.plex.token, "y");
        assert!(config.plex.skip_tls_verification);
    }

    #[test]
    fn missing_connection_settings_fail_validation() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.apply_env(env(&[("PLEX_SERVER", "http://plex:32400")]));
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.apply_env(env(&[("PLEX_TOKEN", "t")]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_url() {
        let mut config = Config::default();
        config.apply_env(env(&[("PLEX_SERVER", "plex:32400"), ("PLEX_TOKEN", "t")]));

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
