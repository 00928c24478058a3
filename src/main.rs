use davadukaan::{
    api::{self, AppState},
    config::{self, bootstrap::bootstrap_admin_from_env, database},
    core::{admin::ensure_bootstrap_admin, auth::TokenKeys, notification::LogPushSender},
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let secret = config::app::jwt_secret()?;
    let tokens = TokenKeys::new(&secret, app_config.auth.token_ttl_hours);

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database tables ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the first admin account if configured
    if let Some(admin) = bootstrap_admin_from_env() {
        if ensure_bootstrap_admin(&db, &admin).await? {
            info!(email = %admin.email, "Bootstrap admin created");
        }
    }

    // 6. Serve
    let bind_addr = app_config.server.bind_addr.clone();
    let state = AppState::new(db, app_config, tokens, Arc::new(LogPushSender));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr.as_str()).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(api::shutdown_signal())
        .await?;

    Ok(())
}
