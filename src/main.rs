//! Wiring & DI. Entry point: load config, build adapters, inject into the router, serve.
//! No business logic here.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use student_hub::adapters::crypto::AesGcmCipher;
use student_hub::adapters::http::{AppState, router};
use student_hub::adapters::integrations::{
    CanvasAdapter, CredentialVault, GoogleCalendarAdapter, IcalFeedAdapter, NotionTaskAdapter,
};
use student_hub::adapters::persistence::SqliteSecretStore;
use student_hub::adapters::upstream;
use student_hub::ports::{
    AssignmentsPort, CalendarPort, CipherPort, SecretStorePort, TaskBoardPort, TimetablePort,
};
use student_hub::shared::config::AppConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load()?;
    let api_key = cfg.api_key();
    if api_key.is_none() {
        warn!("HUB_API_KEY is not set; every protected route will answer 500");
    }

    // --- Secrets: libsql key/value store + AES-GCM cipher ---
    let db_path = cfg.db_path_or_default();
    let store: Arc<dyn SecretStorePort> = Arc::new(
        SqliteSecretStore::connect(&db_path)
            .await
            .map_err(|e| anyhow::anyhow!("secret store at {db_path}: {e}"))?,
    );
    let master_key = cfg.master_key();
    if master_key.is_none() {
        warn!("MASTER_KEY is not set; calendar credentials cannot be read or stored");
    }
    let cipher: Arc<dyn CipherPort> = Arc::new(AesGcmCipher::from_master_key(master_key.as_deref())?);

    // --- Providers ---
    let google = cfg.google_calendar();
    let vault = Arc::new(CredentialVault::new(
        store,
        cipher,
        upstream::build_client("google-oauth", google.timeout)?,
    ));
    let calendar: Arc<dyn CalendarPort> = Arc::new(GoogleCalendarAdapter::new(google, vault)?);
    let tasks: Arc<dyn TaskBoardPort> = Arc::new(NotionTaskAdapter::new(cfg.notion())?);
    let assignments: Arc<dyn AssignmentsPort> = Arc::new(CanvasAdapter::new(cfg.canvas())?);

    let ical = cfg.ical();
    info!(feeds = ical.feed_urls.len(), "timetable feeds configured");
    let timetable: Arc<dyn TimetablePort> = Arc::new(IcalFeedAdapter::new(ical)?);

    let webhooks = cfg.webhooks_enabled();
    info!(webhooks, "reminder webhook {}", if webhooks { "enabled" } else { "disabled" });

    let state = AppState::new(calendar, tasks, assignments, timetable, api_key, webhooks);
    let app = router(state);

    let bind = cfg.bind_addr_or_default();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "student hub listening");
    axum::serve(listener, app).await?;

    Ok(())
}
