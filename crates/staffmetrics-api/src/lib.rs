//! HTTP interface for staffmetrics.
//!
//! CRUD over employees, attendance and performance reviews, the analytics
//! reports and a streaming CSV export, all behind JWT bearer authentication
//! with a per-subject rate limit. `/health` stays open.

pub mod auth;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod routes;
pub mod settings;
pub mod state;

use std::io;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub use auth::{Claims, JwtError, JwtService, Subject};
pub use error::{ApiError, ApiResult};
pub use rate_limit::RateLimiter;
pub use routes::build_app;
pub use settings::{ApiSettings, JwtConfig};
pub use state::ApiState;

/// Serve `app` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!(event = "server_started", %addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(event = "server_stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
