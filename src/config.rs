use std::{str::FromStr, time::Duration};

use crate::{
    constants::{
        DEFAULT_DATABASE_URL, DEFAULT_REMOTE_CATEGORY, DEFAULT_SERVER_PORT,
        DEFAULT_SYNC_INTERVAL_SECS, PLACEHOLDER_POSTS_URL, QUOTES_KEY,
    },
    error::{Error, Result},
    sync::SyncStrategy,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemoteKind {
    /// a server speaking `GET /quotes` and `POST /quotes`.
    #[default]
    Server,
    /// the public placeholder posts api.
    Placeholder,
}

impl FromStr for RemoteKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(RemoteKind::Server),
            "placeholder" => Ok(RemoteKind::Placeholder),
            other => Err(Error::Config(format!("unknown remote kind \"{other}\""))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub kind: RemoteKind,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub quotes_key: String,
    pub seed_defaults: bool,
    pub remote: Option<RemoteConfig>,
    pub sync_interval: Duration,
    pub sync_strategy: SyncStrategy,
    pub push_on_save: bool,
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            quotes_key: QUOTES_KEY.to_string(),
            seed_defaults: true,
            remote: None,
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            sync_strategy: SyncStrategy::default(),
            push_on_save: true,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name} must be a boolean, got \"{other}\""))),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a number, got \"{value}\"")))
}

impl Config {
    /// reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(url) = lookup("QUOTEBOX_DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(key) = lookup("QUOTEBOX_QUOTES_KEY").filter(|key| !key.trim().is_empty()) {
            config.quotes_key = key;
        }

        if let Some(seed) = lookup("QUOTEBOX_SEED_DEFAULTS") {
            config.seed_defaults = parse_bool("QUOTEBOX_SEED_DEFAULTS", &seed)?;
        }

        if let Some(secs) = lookup("QUOTEBOX_SYNC_INTERVAL_SECS") {
            let secs: u64 = parse_number("QUOTEBOX_SYNC_INTERVAL_SECS", &secs)?;
            if secs == 0 {
                return Err(Error::Config(
                    "QUOTEBOX_SYNC_INTERVAL_SECS must be greater than zero".to_string(),
                ));
            }
            config.sync_interval = Duration::from_secs(secs);
        }

        if let Some(strategy) = lookup("QUOTEBOX_SYNC_STRATEGY") {
            config.sync_strategy = strategy.parse()?;
        }

        if let Some(push) = lookup("QUOTEBOX_PUSH_ON_SAVE") {
            config.push_on_save = parse_bool("QUOTEBOX_PUSH_ON_SAVE", &push)?;
        }

        if let Some(port) = lookup("QUOTEBOX_SERVER_PORT") {
            config.server_port = parse_number("QUOTEBOX_SERVER_PORT", &port)?;
        }

        let kind = lookup("QUOTEBOX_REMOTE_KIND")
            .map(|kind| kind.parse::<RemoteKind>())
            .transpose()?;
        let url = lookup("QUOTEBOX_REMOTE_URL").filter(|url| !url.trim().is_empty());

        // the placeholder api has a well-known address, the quote server does not.
        let url = match (url, kind) {
            (Some(url), _) => Some(url.trim_end_matches('/').to_string()),
            (None, Some(RemoteKind::Placeholder)) => Some(PLACEHOLDER_POSTS_URL.to_string()),
            (None, _) => None,
        };

        config.remote = url.map(|url| RemoteConfig {
            url,
            kind: kind.unwrap_or_default(),
            category: lookup("QUOTEBOX_REMOTE_CATEGORY")
                .unwrap_or_else(|| DEFAULT_REMOTE_CATEGORY.to_string()),
        });

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.sync_interval, Duration::from_secs(300));
        assert_eq!(config.quotes_key, "quotes");
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_remote_settings() {
        let config = config_from(&[
            ("QUOTEBOX_REMOTE_URL", "http://localhost:3000/"),
            ("QUOTEBOX_REMOTE_KIND", "placeholder"),
            ("QUOTEBOX_REMOTE_CATEGORY", "Posts"),
            ("QUOTEBOX_SYNC_STRATEGY", "remote-wins"),
            ("QUOTEBOX_SYNC_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(
            config.remote,
            Some(RemoteConfig {
                url: "http://localhost:3000".to_string(),
                kind: RemoteKind::Placeholder,
                category: "Posts".to_string(),
            })
        );
        assert_eq!(config.sync_strategy, SyncStrategy::RemoteWins);
        assert_eq!(config.sync_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("QUOTEBOX_SEED_DEFAULTS", "maybe")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[("QUOTEBOX_SYNC_INTERVAL_SECS", "0")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[("QUOTEBOX_SERVER_PORT", "lots")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_from(&[
                ("QUOTEBOX_REMOTE_URL", "http://x"),
                ("QUOTEBOX_REMOTE_KIND", "ftp")
            ]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_placeholder_kind_has_a_default_url() {
        let config = config_from(&[("QUOTEBOX_REMOTE_KIND", "placeholder")]).unwrap();

        let remote = config.remote.unwrap();
        assert_eq!(remote.url, PLACEHOLDER_POSTS_URL);
        assert_eq!(remote.category, "Remote");
    }

    #[test]
    fn test_legacy_key_name() {
        let config = config_from(&[("QUOTEBOX_QUOTES_KEY", "quotesArray")]).unwrap();

        assert_eq!(config.quotes_key, "quotesArray");
    }
}
