use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use inkwell::inkwell_config::AppConfig;
use inkwell::inkwell_db::{Storage, init_db_pool};
use inkwell::logging::init_tracing;
use inkwell::router::init_router;
use inkwell::state::AppState;
use tracing::{info, warn};

/// How often idle rate limit buckets are dropped.
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guards = init_tracing();

    let config = AppConfig::from_env();
    info!(environment = ?config.environment, "Starting Inkwell");

    let storage = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = init_db_pool(&database_url)
                .await
                .context("Failed to connect to database")?;
            sqlx::migrate!()
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Connected to PostgreSQL");
            Storage::postgres(pool)
        }
        Err(_) => {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Storage::memory()
        }
    };

    let state = AppState::new(config, storage);

    let limiters = state.limiters.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limiters.retain_recent();
        }
    });

    let app = init_router(state);

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    println!("🚀 Server running on http://{addr}");
    println!("📚 Swagger UI available at http://{addr}/swagger-ui");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
