//! # tb-config
//!
//! Layered runtime settings. Sources, lowest precedence first:
//!
//! 1. built-in defaults;
//! 2. `config/threadboard.{toml,yaml,json}` if present;
//! 3. `THREADBOARD__*` environment variables (`.env` is read first), e.g.
//!    `THREADBOARD__FEED__PER_PAGE=10` or `THREADBOARD__DATABASE__URL=sqlite:feed.db`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "config/threadboard";
const ENV_PREFIX: &str = "THREADBOARD";
const RESERVED_PATHS: [&str; 2] = ["/home", "/health"];
/// Characters axum reads as captures or wildcards, plus URL delimiters.
const PATH_FORBIDDEN: [char; 6] = ['{', '}', '*', ':', '?', '#'];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub feed: FeedSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

/// Raw feed knobs; `tb_core::FeedOptions` validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub per_page: u64,
    pub reply_depth: usize,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `tb_core=debug,tower_http=info`.
    pub filter: String,
}

impl Settings {
    /// Loads defaults, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let builder = defaults()?
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    /// Defaults overlaid with a TOML document. Ignores files and environment.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        Self::build(defaults()?.add_source(File::from_str(document, FileFormat::Toml)))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        debug!(
            bind = %settings.bind_address(),
            per_page = settings.feed.per_page,
            reply_depth = settings.feed.reply_depth,
            "settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections",
                "must be at least 1".to_string(),
            ));
        }
        if !self.feed.path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "feed.path",
                format!("{:?} is not an absolute path", self.feed.path),
            ));
        }
        if let Some(c) = self.feed.path.chars().find(|c| PATH_FORBIDDEN.contains(c)) {
            return Err(ConfigError::Invalid(
                "feed.path",
                format!("{:?} may not contain {c:?}", self.feed.path),
            ));
        }
        if RESERVED_PATHS.contains(&self.feed.path.as_str()) {
            return Err(ConfigError::Invalid(
                "feed.path",
                format!("{} is already routed", self.feed.path),
            ));
        }
        Ok(())
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080_i64)?
        .set_default("database.url", "sqlite:threadboard.db")?
        .set_default("database.max_connections", 5_i64)?
        .set_default("database.run_migrations", true)?
        .set_default("feed.per_page", 5_i64)?
        .set_default("feed.reply_depth", 3_i64)?
        .set_default("feed.path", "/")?
        .set_default("logging.format", "pretty")?
        .set_default("logging.filter", "info")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_feed() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.feed.per_page, 5);
        assert_eq!(settings.feed.reply_depth, 3);
        assert_eq!(settings.feed.path, "/");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
        assert_eq!(settings.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 3000

            [feed]
            per_page = 10

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.feed.per_page, 10);
        assert_eq!(settings.feed.reply_depth, 3);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_connections_is_rejected() {
        let err = Settings::from_toml("[database]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("database.max_connections", _)));
    }

    #[test]
    fn relative_feed_path_is_rejected() {
        let err = Settings::from_toml("[feed]\npath = \"posts\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("feed.path", _)));

        let err = Settings::from_toml("[feed]\npath = \"/health\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("feed.path", _)));
    }

    #[test]
    fn feed_path_must_be_a_literal_route() {
        for path in ["/{board}", "/posts/*rest", "/feed?sort=new", "/feed#top"] {
            let document = format!("[feed]\npath = {path:?}");
            let err = Settings::from_toml(&document).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid("feed.path", _)),
                "{path} was accepted"
            );
        }

        let settings = Settings::from_toml("[feed]\npath = \"/posts\"").unwrap();
        assert_eq!(settings.feed.path, "/posts");
    }
}
