// Common test utilities and helpers

pub mod client;
pub mod db;
pub mod fixtures;

use agri_imagery_api::common::state::AppState;
use agri_imagery_api::config::Config;
use agri_imagery_api::provider::ProviderClient;
use agri_imagery_api::routes::build_router;
use client::TestClient;
use fake_provider::FakeProvider;
use sea_orm::DatabaseConnection;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test environment (logging, etc.)
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Full router over a fresh database, talking to a fresh fake provider.
pub struct TestApp {
    pub client: TestClient,
    pub db: DatabaseConnection,
    pub provider: FakeProvider,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], with a hook to adjust configuration (drop the API
/// key, the cron secret, ...) before the state is built.
pub async fn spawn_app_with(customise: impl FnOnce(&mut Config)) -> TestApp {
    init();
    let provider = FakeProvider::start().await;
    let mut config = Config {
        provider_base_url: provider.base_url.clone(),
        ..Config::for_tests()
    };
    customise(&mut config);

    let db = db::create_test_db()
        .await
        .expect("Failed to create test database");
    let client = ProviderClient::from_config(&config).expect("Failed to build provider client");
    let state = AppState::new(db.clone(), config, client);

    TestApp {
        client: TestClient::new(build_router(&state)),
        db,
        provider,
    }
}
