//! HTTP API: the JSON surface over `core`.
//!
//! Handlers stay thin. They extract, check permissions, call one core function
//! and wrap the result in [`response::ApiResponse`].

pub mod extract;
pub mod response;
pub mod routes;
pub mod state;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", routes::auth_routes())
        .merge(routes::catalog_routes())
        .nest("/user", routes::user_routes())
        .nest("/referrals", routes::referral_routes())
        .nest("/notifications", routes::notification_routes())
        .nest("/admin", routes::admin_routes());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
