use agri_imagery_api::{common::state::AppState, config::Config, provider::ProviderClient, routes};
use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` filters (default `info`); `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();

    let db_uri = config
        .db_uri
        .as_deref()
        .context("database is not configured: set DB_URL or DB_HOST and friends")?;
    let db: DatabaseConnection = Database::connect(db_uri)
        .await
        .context("could not connect to the database")?;
    Migrator::up(&db, None)
        .await
        .context("database migrations failed")?;
    info!(app = %config.app_name, deployment = %config.deployment, "Connected to the database");

    let provider = ProviderClient::from_config(&config)?;
    match &provider {
        Some(client) => info!(
            base_url = %client.base_url(),
            api_key = %client.masked_key(),
            "Imagery provider configured"
        ),
        None => warn!("No provider API key set; imagery endpoints will answer 503"),
    }
    if config.cron_secret.is_none() {
        warn!("CRON_SECRET not set; scheduled endpoints will answer 503");
    }

    let addr = config.server_addr.clone();
    let state = AppState::new(db, config, provider);
    let router = routes::build_router(&state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
