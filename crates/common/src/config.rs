//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity propagation configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Live presentation configuration.
    #[serde(default)]
    pub presentation: PresentationConfig,
    /// Activity catalog bootstrap configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Identity propagation.
///
/// Authentication happens upstream; the gateway forwards the resolved user id
/// in a request header.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Header carrying the authenticated user id.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

/// How the presentation queue is ordered when it is seeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOrdering {
    /// Registration order of confirmed attendees.
    #[default]
    Registration,
    /// Uniformly shuffled.
    Shuffled,
}

/// Live presentation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    /// Nominal length of one presentation, used only for the countdown display.
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: i64,
    /// Queue seeding order.
    #[serde(default)]
    pub ordering: QueueOrdering,
}

/// Activity catalog bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Install the default activity options on startup when the catalog is empty.
    #[serde(default = "default_true")]
    pub install_defaults: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_duration_seconds(),
            ordering: QueueOrdering::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            install_defaults: default_true(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    50
}

const fn default_min_connections() -> u32 {
    5
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

const fn default_duration_seconds() -> i64 {
    90
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `MIXER_ENV`)
    /// 4. Environment variables with `MIXER__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("MIXER_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MIXER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MIXER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: Config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/mixer")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.user_header, "x-user-id");
        assert_eq!(config.presentation.duration_seconds, 90);
        assert_eq!(config.presentation.ordering, QueueOrdering::Registration);
        assert!(config.catalog.install_defaults);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn test_ordering_parses_lowercase() {
        let config: Config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/mixer")
            .unwrap()
            .set_override("presentation.ordering", "shuffled")
            .unwrap()
            .set_override("presentation.duration_seconds", 120_i64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.presentation.ordering, QueueOrdering::Shuffled);
        assert_eq!(config.presentation.duration_seconds, 120);
    }
}
