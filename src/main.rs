//! Address Registry API
//!
//! Stores postal addresses for a multi-tenant application. Every address is
//! sanitized against governed fields, validated for completeness and enriched
//! with coordinates from a geocoding provider before it is persisted.

mod address;
mod auth;
mod config;
mod db;
mod error;
mod introspection;
mod models;
mod routes;
mod state;

use crate::address::{AddressService, FieldGovernor, NominatimClient};
use crate::config::Settings;
use crate::db::PgAddressStore;
use crate::introspection::PostgresIntrospector;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Address Registry...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    if settings.auth.enabled && std::env::var("JWT_SECRET").is_err() {
        warn!("⚠️  JWT_SECRET not set, using default (INSECURE - set in production!)");
    }
    if !settings.auth.enabled {
        warn!("⚠️  Identity disabled, addresses will be stored without user references");
    }

    // Initialize database pool - REQUIRED
    let pool = db::create_pool(&settings.database)?;
    if let Err(e) = db::verify_connection(&pool).await {
        error!("❌ FATAL: Failed to connect to database: {}", e);
        error!("DATABASE_URL must be set in .env and database must be accessible");
        return Err(e.into());
    }
    info!("✅ Database connection successful (TLS: {})", settings.database.use_tls);

    db::bootstrap_schema(&pool).await?;

    // Field governance, optionally widened with the identity table's columns
    let governor = match &settings.governance.identity_table {
        Some(table) => {
            let introspector = PostgresIntrospector::new(pool.clone());
            let governor = FieldGovernor::from_introspection(&introspector, table).await?;
            info!("🛡️  Field governance extended with columns of '{}'", table);
            governor
        }
        None => FieldGovernor::new(),
    };

    let geocoder = NominatimClient::new(&settings.geocoder)?;
    info!("🌍 Geocoding via {}", settings.geocoder.endpoint);

    let addresses = AddressService::new(
        Arc::new(PgAddressStore::new(pool)),
        Arc::new(geocoder),
        governor,
    );
    let state = Arc::new(AppState::new(addresses, settings.auth.clone()));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   GET    /health                 - Health check");
    info!("   GET    /api/addresses          - List addresses (query filters)");
    info!("   GET    /api/addresses/{{id}}     - Get address");
    info!("   POST   /api/addresses          - Create geocoded address");
    info!("   PUT    /api/addresses/{{id}}     - Update address");
    info!("   PUT    /api/addresses          - Update addresses matching filters");
    info!("   DELETE /api/addresses/{{id}}     - Delete address");
    info!("   DELETE /api/addresses          - Delete addresses matching filters");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,address_registry_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
