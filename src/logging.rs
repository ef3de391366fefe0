use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::middleware::request_id::RequestId;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|RequestId(id)| id.clone());

    info!(
        request_id = request_id.as_deref(),
        method = %method,
        path = %matched_path,
        "Incoming request"
    );

    let response = next.run(req).await;
    let latency = start.elapsed();
    let status = response.status();

    match status.as_u16() {
        400..=499 => {
            warn!(
                request_id = request_id.as_deref(),
                method = %method,
                path = %matched_path,
                status = %status.as_u16(),
                latency_ms = %latency.as_millis(),
                "Client error"
            );
        }
        500..=599 => {
            error!(
                request_id = request_id.as_deref(),
                method = %method,
                path = %matched_path,
                status = %status.as_u16(),
                latency_ms = %latency.as_millis(),
                "Server error"
            );
        }
        _ => {
            info!(
                request_id = request_id.as_deref(),
                method = %method,
                path = %matched_path,
                status = %status.as_u16(),
                latency_ms = %latency.as_millis(),
                "Request completed"
            );
        }
    }

    response
}

/// Installs the global subscriber.
///
/// Console output is always on. When `LOG_DIR` is set, errors also go to a
/// daily text file and everything at info and above to a daily JSON file.
/// Keep the returned guards alive for the life of the process so buffered
/// lines get flushed.
pub fn init_tracing() -> Vec<WorkerGuard> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=debug,tower_http=debug,axum::rejection=trace",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let Ok(log_dir) = std::env::var("LOG_DIR") else {
        tracing_subscriber::registry().with(console_layer).init();
        return Vec::new();
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        tracing_subscriber::registry().with(console_layer).init();
        warn!(log_dir = %log_dir, error = %e, "Failed to create log directory, logging to console only");
        return Vec::new();
    }

    let (error_writer, error_guard) = tracing_appender::non_blocking(
        RollingFileAppender::new(Rotation::DAILY, &log_dir, "inkwell.log"),
    );
    let file_layer = fmt::layer()
        .with_writer(error_writer)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    // JSON file layer for structured logs (can be ingested by Loki)
    let (json_writer, json_guard) = tracing_appender::non_blocking(
        RollingFileAppender::new(Rotation::DAILY, &log_dir, "inkwell.json"),
    );
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .init();

    info!(log_dir = %log_dir, "File logging enabled");
    vec![error_guard, json_guard]
}
