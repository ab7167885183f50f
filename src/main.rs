//! sulabh-auth binary entry point

use chrono::Utc;
use sulabh_auth::{AppState, config, metrics};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Initialize tracing/logging
/// 2. Load configuration from file and environment
/// 3. Initialize AppState
/// 4. Build Axum router
/// 5. Start HTTP server
/// 6. Start background tasks (expired-session sweep)
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("SULABH_AUTH__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sulabh_auth=info,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sulabh_auth=info,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting sulabh-auth...");

    // 2. Initialize metrics
    metrics::init_metrics();

    // 3. Load configuration
    let config = config::AppConfig::load()?;
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let state = AppState::new(config.clone()).await?;

    // 5. Build Axum router
    let app = sulabh_auth::build_router(state.clone());

    // 6. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", config.server.base_url());

    // 7. Start background tasks
    spawn_session_sweep_task(state.clone());

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn background expired-session sweep task
///
/// Lazily drops expired session records and refreshes the active-session
/// gauge. Lookups never rely on this sweep; expired records are treated as
/// absent everywhere.
fn spawn_session_sweep_task(state: AppState) {
    tokio::spawn(async move {
        let configured_interval_secs = state.config.auth.sweep_interval_seconds;
        let interval_secs = configured_interval_secs.max(1);
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        if configured_interval_secs == 0 {
            tracing::warn!("auth.sweep_interval_seconds=0 is invalid; clamped to 1 second");
        }

        // Consume the immediate first tick to delay the initial sweep.
        interval.tick().await;

        loop {
            interval.tick().await;

            let now = Utc::now();
            match state.db.clean_all_expired_sessions(now).await {
                Ok(removed) => {
                    if removed > 0 {
                        metrics::SESSIONS_REMOVED_TOTAL
                            .with_label_values(&["expired"])
                            .inc_by(removed);
                        tracing::debug!(removed, "Expired sessions swept");
                    }

                    match state.db.count_all_active_sessions(now).await {
                        Ok(active) => metrics::ACTIVE_SESSIONS.set(active),
                        Err(error) => {
                            tracing::warn!(error = %error, "Active session count failed")
                        }
                    }
                }
                Err(error) => {
                    tracing::error!(error = %error, "Session sweep failed");
                }
            }
        }
    });

    tracing::info!("Session sweep task spawned");
}
