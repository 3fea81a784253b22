//! Stub portal API for local development.
//!
//! | Variable        | Default                 | Description                    |
//! |-----------------|-------------------------|--------------------------------|
//! | `MOCK_API_PORT` | `5038`                  | HTTP listen port               |
//! | `JWT_SECRET`    | `stub-jwt-secret`       | HS256 signing secret           |
//! | `FRONTEND_URL`  | `http://localhost:5173` | Target of stub-login redirects |

use anyhow::Context;
use mock_eid_api::{MockApi, DEFAULT_FRONTEND_URL, DEFAULT_JWT_SECRET};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = match std::env::var("MOCK_API_PORT") {
        Ok(v) => v.parse().context("MOCK_API_PORT must be a port number")?,
        Err(_) => 5038,
    };
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
    let frontend =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string());

    let api = MockApi::with_frontend(&secret, &frontend);
    api.seed();

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(address = %addr, "stub API listening");
    info!("log in with /api/auth/stub-login?user_id=1 (ember), 2 (ash) or 3 (root)");
    axum::serve(listener, api.router()).await?;
    Ok(())
}
