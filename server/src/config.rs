use serde::{Deserialize, Serialize};
use socialgate_auth::AuthConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    pub https_port: u16,
    pub enable_http: bool,
    pub enable_https: bool,
    pub ssl_cert_path: Option<String>,
    pub ssl_key_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file for user records; users are kept in memory when unset
    #[serde(default)]
    pub path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 3000,
            https_port: 3443,
            enable_http: true,
            enable_https: false,
            ssl_cert_path: None,
            ssl_key_path: None,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("server_config").required(false))
            .add_source(config::Environment::with_prefix("SOCIALGATE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}. Using defaults.", e);
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 3000);
        assert!(config.server.enable_http);
        assert!(!config.server.enable_https);
        assert!(config.database.path.is_none());
        assert_eq!(config.logging.max_level(), tracing::Level::INFO);
        assert!(!config.auth.enable_auth);
    }

    #[test]
    fn test_toml_config() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            http_port = 8080
            https_port = 8443
            enable_http = true
            enable_https = false

            [logging]
            level = "DEBUG"

            [database]
            path = "users.db"

            [auth]
            enable_auth = true
            public_base_url = "https://login.example.org"

            [auth.oauth]
            enable_facebook = true
            facebook_app_id = "app-42"
            facebook_app_secret = "shh"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.logging.max_level(), tracing::Level::DEBUG);
        assert_eq!(config.database.path.as_deref(), Some("users.db"));
        assert!(config.auth.oauth.enable_facebook);
        assert_eq!(config.auth.oauth.facebook_app_id.as_deref(), Some("app-42"));
        assert_eq!(config.auth.session.cookie_name, "session_id");
    }
}
