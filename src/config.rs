use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sessions: SessionStoreConfig,
    pub google: GoogleConfig,
    pub stripe: StripeConfig,
    pub storage: StorageConfig,
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionStoreConfig {
    pub redis_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Billing is optional: with no API key the subscription endpoints degrade
/// to a "not configured" response instead of erroring.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StripeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Public base URL of the deployment, used for billing redirects.
    pub url: String,
    /// Marks a production deployment; session cookies carry `Secure` only
    /// when set.
    pub production: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/liftoff".to_string(),
            max_connections: 16,
            min_connections: 4,
            acquire_timeout: 5,
        }
    }
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:8000/oauth/google/callback".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "liftoff-files".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            production: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Liftoff.toml
    /// 3. Environment variables prefixed with LIFTOFF_ (double underscore
    ///    separates nesting levels, e.g. LIFTOFF_GOOGLE__CLIENT_ID)
    /// 4. Raw DATABASE_URL / REDIS_URL for deployment convenience
    pub fn load() -> Result<Self, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::string(&toml::to_string(&Config::default()).unwrap()).nested())
            .merge(Toml::file("Liftoff.toml").nested())
            .merge(Env::prefixed("LIFTOFF_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["REDIS_URL"]).map(|_| "sessions.redis_url".into()));

        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_development_safe() {
        let config = Config::default();
        assert!(!config.app.production);
        assert!(config.stripe.api_key.is_none());
        assert!(!config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn defaults_serialize_for_figment_seeding() {
        // Config::load() feeds the defaults through a TOML round trip.
        let serialized = toml::to_string(&Config::default()).unwrap();
        assert!(serialized.contains("[database]"));
        assert!(serialized.contains("[sessions]"));
    }
}
