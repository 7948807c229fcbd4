//! Service configuration, loaded from the environment.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    pub database_url: String,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_seconds: u64,

    /// Development-only bypass: never true when `environment == "production"`.
    #[serde(default)]
    pub auth_disabled: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_jwt_secret() -> String {
    "dev-secret-change-me".to_string()
}

fn default_jwt_expiry() -> u64 {
    3600
}

impl AppConfig {
    /// Loads configuration from environment variables (via the `config` crate),
    /// having already let `dotenvy` populate `std::env` from a local `.env` file.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn is_auth_disabled(&self) -> bool {
        self.auth_disabled && self.environment != "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_disabled_forced_off_in_production() {
        let mut config = AppConfig {
            port: default_port(),
            database_url: "postgres://localhost/test".to_string(),
            redis_url: default_redis_url(),
            environment: "production".to_string(),
            jwt_secret: default_jwt_secret(),
            jwt_expiry_seconds: default_jwt_expiry(),
            auth_disabled: true,
        };
        assert!(!config.is_auth_disabled());

        config.environment = "development".to_string();
        assert!(config.is_auth_disabled());
    }
}
