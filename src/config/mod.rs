use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub client: ClientConfig,
}

/// Deployment profile, read from `NODE_ENV` (falling back to `APP_ENV`).
///
/// Anything other than an explicit development or production value is
/// treated as `Test`: plain connections to the store and generic error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Test,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_ms: u64,
    /// Require TLS to the store without verifying the server certificate.
    pub require_tls: bool,
}

impl DatabaseConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub expose_error_details: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub static_dir: PathBuf,
    pub static_max_age_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let node_env = env::var("NODE_ENV").or_else(|_| env::var("APP_ENV")).ok();

        Self::for_environment(Environment::parse(node_env.as_deref())).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Test => Self::test(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_IDLE_TIMEOUT_SECS") {
            self.database.idle_timeout_secs = v.parse().unwrap_or(self.database.idle_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_MS") {
            self.database.acquire_timeout_ms = v.parse().unwrap_or(self.database.acquire_timeout_ms);
        }

        // API overrides
        if let Ok(v) = env::var("API_KEY") {
            self.api.api_key = Some(v);
        }
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }

        // Client bundle
        if let Ok(v) = env::var("STATIC_DIR") {
            self.client.static_dir = PathBuf::from(v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                idle_timeout_secs: 30,
                acquire_timeout_ms: 2000,
                require_tls: false,
            },
            api: ApiConfig {
                port: 3000,
                api_key: None,
                expose_error_details: true,
            },
            client: ClientConfig {
                static_dir: PathBuf::from("public"),
                static_max_age_secs: 0,
            },
        }
    }

    fn test() -> Self {
        Self {
            environment: Environment::Test,
            api: ApiConfig {
                expose_error_details: false,
                ..Self::development().api
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                require_tls: true,
                ..Self::development().database
            },
            api: ApiConfig {
                expose_error_details: false,
                ..Self::development().api
            },
            client: ClientConfig {
                static_dir: PathBuf::from("public"),
                static_max_age_secs: 3600,
            },
        }
    }
}

// Helper macros for common checks
#[macro_export]
macro_rules! is_development {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_env_values() {
        assert_eq!(Environment::parse(Some("development")), Environment::Development);
        assert_eq!(Environment::parse(Some("Production")), Environment::Production);
        assert_eq!(Environment::parse(Some("test")), Environment::Test);
        assert_eq!(Environment::parse(None), Environment::Test);
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.api.expose_error_details);
        assert!(!config.database.require_tls);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.acquire_timeout(), Duration::from_secs(2));
        assert!(is_development!(config));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.api.expose_error_details);
        assert!(config.database.require_tls);
        assert_eq!(config.database.idle_timeout(), Duration::from_secs(30));
        assert!(is_production!(config));
    }

    #[test]
    fn unspecified_environment_hides_errors_without_tls() {
        let config = AppConfig::for_environment(Environment::parse(None));
        assert!(!config.api.expose_error_details);
        assert!(!config.database.require_tls);
    }
}
