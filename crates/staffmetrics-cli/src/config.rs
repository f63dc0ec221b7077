use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use staffmetrics_api::{ApiSettings, JwtConfig};

/// Config file read when `--config` is not given. Absent means defaults.
pub const DEFAULT_CONFIG_PATH: &str = "staffmetrics.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            acquire_timeout_secs: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub page_size: u32,
    pub max_page_size: u32,
    pub rate_limit_per_minute: u32,
    pub export_chunk_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            bind: "127.0.0.1:8000".to_string(),
            page_size: api.page_size,
            max_page_size: api.max_page_size,
            rate_limit_per_minute: api.rate_limit_per_minute,
            export_chunk_size: api.export_chunk_size,
        }
    }
}

impl ServerConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            page_size: self.page_size,
            max_page_size: self.max_page_size,
            rate_limit_per_minute: self.rate_limit_per_minute,
            export_chunk_size: self.export_chunk_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let jwt = JwtConfig::default();
        Self {
            jwt_secret: jwt.secret,
            issuer: jwt.issuer,
            audience: jwt.audience,
            token_ttl_minutes: jwt.token_ttl_minutes,
        }
    }
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            token_ttl_minutes: self.token_ttl_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
    pub format: LogFormat,
    /// Optional JSON log file, appended to.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load `path`, or [`DEFAULT_CONFIG_PATH`] when it exists, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `DATABASE_URL`, `STAFFMETRICS_JWT_SECRET` and `STAFFMETRICS_BIND`
    /// override the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|value| !value.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(secret) = lookup("STAFFMETRICS_JWT_SECRET").filter(|value| !value.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        if let Some(bind) = lookup("STAFFMETRICS_BIND").filter(|value| !value.is_empty()) {
            self.server.bind = bind;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/staff"

            [server]
            rate_limit_per_minute = 30

            [logging]
            format = "json"
            "#,
        )
        .expect("config");

        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/staff"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server.rate_limit_per_minute, 30);
        assert_eq!(config.server.page_size, 50);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.auth.issuer, "staffmetrics");
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://env/db"),
            ("STAFFMETRICS_JWT_SECRET", "s3cret"),
            ("STAFFMETRICS_BIND", ""),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.database.url.as_deref(), Some("postgres://env/db"));
        assert_eq!(config.auth.jwt_config().secret, "s3cret");
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("does-not-exist/staffmetrics.toml")))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
