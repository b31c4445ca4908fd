//! Initialization helpers for the application:
//! - database connection + migrations
//! - background worker spawn helpers

use std::{path::Path, str::FromStr, sync::Arc};

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::{SessionRepository, VerificationRepository};

/// Redact potentially sensitive information from a database URL before logging.
///
/// Attempts to parse the URL and remove userinfo (username:password) components.
/// Falls back to removing everything before '@' or returning "(redacted)".
pub fn redact_db_url(db_url: &str) -> String {
    if let Ok(url) = url::Url::parse(db_url) {
        let scheme = url.scheme();
        let host = url.host_str().unwrap_or("");
        let port_part = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = url.path();
        format!("{}://{}{}{}", scheme, host, port_part, path)
    } else {
        if let Some(at_pos) = db_url.find('@') {
            let without_creds = &db_url[at_pos + 1..];
            return format!("(redacted){}", without_creds);
        }
        "(redacted)".to_string()
    }
}

/// Initialize SQLite database connection and run migrations.
///
/// Creates the parent directory for a file-backed database, opens a pool
/// with `create_if_missing(true)` and runs the embedded migrations.
pub async fn init_db(config: &Config) -> Result<SqlitePool> {
    let db_url = &config.database.url;
    tracing::info!("Connecting to database: {}", redact_db_url(db_url));

    let in_memory = db_url.contains(":memory:");
    if !in_memory {
        let db_path = db_url
            .strip_prefix("sqlite://")
            .or_else(|| db_url.strip_prefix("sqlite:"))
            .unwrap_or(db_url);
        let db_path = db_path.split('?').next().unwrap_or(db_path);

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    )
                })?;
                tracing::info!(
                    "Database directory created or already exists: {}",
                    parent.display()
                );
            }
        }
    }

    let connect_options =
        sqlx::sqlite::SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(connect_options)
        .await?;

    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Delete expired sessions and sign-in verifiers. Returns `(sessions, verifications)` removed.
pub async fn purge_expired_auth_state(pool: &SqlitePool) -> crate::error::AppResult<(u64, u64)> {
    let sessions = SessionRepository::purge_expired(pool).await?;
    let verifications = VerificationRepository::purge_expired(pool).await?;
    Ok((sessions, verifications))
}

/// Spawn background workers:
/// - periodic cleanup of expired sessions and verifications
///
/// Returns the `JoinHandle`s so callers can await task shutdown. Each worker
/// listens for a shutdown notification via a `tokio::sync::broadcast::Sender<()>`.
pub fn spawn_background_workers(
    state: Arc<crate::AppState>,
    shutdown: tokio::sync::broadcast::Sender<()>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();

    // Session cleanup worker
    {
        let mut shutdown_rx = shutdown.subscribe();
        let state = state.clone();
        let interval =
            std::time::Duration::from_secs(state.config.workers.session_cleanup_interval_seconds.max(1));
        handles.push(tokio::spawn(async move {
            loop {
                match purge_expired_auth_state(&state.db).await {
                    Ok((0, 0)) => tracing::debug!("No expired sessions or verifications to purge"),
                    Ok((sessions, verifications)) => tracing::info!(
                        "Purged {} expired sessions and {} expired verifications",
                        sessions,
                        verifications
                    ),
                    Err(e) => tracing::warn!("Session cleanup failed: {:?}", e),
                }

                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Session cleanup worker shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }));
    }

    handles
}
