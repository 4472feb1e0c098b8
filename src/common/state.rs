use super::error::ApiError;
use crate::{config::Config, provider::ProviderClient};
use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    provider: Option<ProviderClient>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, provider: Option<ProviderClient>) -> Self {
        Self {
            db,
            config,
            provider,
        }
    }

    /// The configured provider client, or a 503 when no API key is set.
    pub fn provider(&self) -> Result<&ProviderClient, ApiError> {
        self.provider.as_ref().ok_or_else(ApiError::missing_provider_key)
    }
}
