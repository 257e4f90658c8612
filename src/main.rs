//! Warden Server: RBAC administration backend.
//!
//! Main entry point that wires all crates together and starts the server.

use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use warden_api::AppState;
use warden_auth::PasswordHasher;
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::events::{DomainEvent, EventBus};
use warden_database::DatabasePool;
use warden_database::migration::run_migrations;
use warden_database::repositories::PermissionRepository;
use warden_database::seed::{AdminBootstrap, ensure_admin};

#[tokio::main]
async fn main() {
    let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    info!("Starting Warden v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;

    // Seeding failures leave the server up; the admin can be repaired later.
    if let Err(e) = seed_admin(&config, &db).await {
        error!(error = %e, "Administrator seeding failed");
    }

    let events = EventBus::default();
    tokio::spawn(audit_log(events.subscribe()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = warden_api::build_state(config, db.pool().clone(), events);
    report_menu_gaps(&state, &db).await;
    let app = warden_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    db.close().await;
    info!("Warden stopped");
    Ok(())
}

async fn seed_admin(config: &AppConfig, db: &DatabasePool) -> Result<(), AppError> {
    let password_hash = PasswordHasher::new().hash_password(&config.auth.admin_initial_password)?;
    ensure_admin(
        db.pool(),
        &AdminBootstrap {
            role_name: config.auth.admin_role_name.clone(),
            user_name: config.auth.admin_user_name.clone(),
            password_hash,
        },
    )
    .await?;
    Ok(())
}

/// Logs menu entries gated on permissions missing from the catalog.
async fn report_menu_gaps(state: &AppState, db: &DatabasePool) {
    match PermissionRepository::new(db.pool().clone()).load_tree().await {
        Ok(catalog) => {
            let gaps = state.menu_service.audit_catalog(&catalog);
            if gaps.is_empty() {
                info!(permissions = catalog.len(), "Menu requirements match the permission catalog");
            } else {
                warn!(entries = gaps.len(), "Some menu entries can never be shown");
            }
        }
        Err(e) => warn!(error = %e, "Could not load the permission catalog to check the menu"),
    }
}

/// Writes every domain event to the `audit` target.
async fn audit_log(mut rx: broadcast::Receiver<DomainEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                info!(
                    target: "audit",
                    event_id = %event.id,
                    actor_id = ?event.actor_id,
                    payload = ?event.payload,
                    "Domain event"
                );
                if event.affects_permissions() {
                    info!(
                        target: "audit",
                        event_id = %event.id,
                        "Effective permissions changed; open consoles pick this up on refresh"
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: "audit", skipped, "Audit logger lagged; events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
