use dotenvy::dotenv;
use serde::Deserialize;
use std::{env, str::FromStr};
use tracing::{debug, warn};

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api-connect.eos.com";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub db_uri: Option<String>,
    pub provider_api_key: Option<String>,
    pub provider_base_url: String,
    pub provider_timeout_secs: u64,
    pub cron_secret: Option<String>,
    pub app_name: String,
    pub deployment: String,
    pub tile_cache_max_age: u64,   // Cache-Control max-age for proxied tiles
    pub search_cache_max_age: u64, // Cache-Control max-age for scene searches
    pub poll_interval_secs: u64,
    pub poll_max_attempts: usize,
    pub max_cloud_coverage: f64,
    pub server_addr: String,
}

/// Reads `key`, falling back to `default` when unset or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}

/// First non-empty value among `keys`.
fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available

        let db_uri = env::var("DB_URL").ok().or_else(|| {
            // Assemble from parts only when the host is given
            let host = env::var("DB_HOST").ok()?;
            Some(format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                env::var("DB_PASSWORD").unwrap_or_default(),
                host,
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").unwrap_or_else(|_| "agri_imagery".to_string()),
            ))
        });

        let provider_base_url = env_first(&["PROVIDER_BASE_URL", "EOSDA_API_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let config = Config {
            db_uri,
            provider_api_key: env_first(&["PROVIDER_API_KEY", "EOSDA_API_KEY"]),
            provider_base_url,
            provider_timeout_secs: env_or("PROVIDER_TIMEOUT_SECS", 15),
            cron_secret: env_first(&["CRON_SECRET"]),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "agri-imagery-api".to_string()),
            deployment: env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            tile_cache_max_age: env_or("TILE_CACHE_MAX_AGE", 3600),
            search_cache_max_age: env_or("SEARCH_CACHE_MAX_AGE", 300),
            poll_interval_secs: env_or("POLL_INTERVAL_SECS", 5),
            poll_max_attempts: env_or("POLL_MAX_ATTEMPTS", 60),
            max_cloud_coverage: env_or::<f64>("MAX_CLOUD_COVERAGE", 20.0).clamp(0.0, 100.0),
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        };

        debug!(
            app_name = %config.app_name,
            deployment = %config.deployment,
            provider_base_url = %config.provider_base_url,
            provider_key_set = config.provider_api_key.is_some(),
            cron_secret_set = config.cron_secret.is_some(),
            "Loaded configuration"
        );
        config
    }

    /// Deterministic configuration for unit and integration tests. The
    /// provider points at a closed local port until a test overrides it.
    pub fn for_tests() -> Self {
        Config {
            db_uri: Some("sqlite::memory:".to_string()),
            provider_api_key: Some("test-api-key".to_string()),
            provider_base_url: "http://127.0.0.1:9".to_string(),
            provider_timeout_secs: 2,
            cron_secret: Some("test-cron-secret".to_string()),
            app_name: "agri-imagery-api-test".to_string(),
            deployment: "test".to_string(),
            tile_cache_max_age: 3600,
            search_cache_max_age: 300,
            poll_interval_secs: 0,
            poll_max_attempts: 3,
            max_cloud_coverage: 20.0,
            server_addr: "127.0.0.1:0".to_string(),
        }
    }
}
