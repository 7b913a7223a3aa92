//! Database connection management
//!
//! Handles connection pooling and schema bootstrap for the address table.

pub mod queries;
pub mod store;

pub use store::{AddressStore, PgAddressStore};

use crate::config::DatabaseConfig;
use crate::error::AppError;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{info, warn};

/// Create a connection pool with given configuration
pub fn create_pool(config: &DatabaseConfig) -> Result<Pool, AppError> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_pool_size));

    if config.use_tls {
        // Create TLS connector for Neon
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| AppError::Config(format!("Failed to create TLS pool: {}", e)))
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))
    }
}

/// Verify that a connection can be checked out and used
pub async fn verify_connection(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;
    client.query_one("SELECT 1 as ok", &[]).await?;
    Ok(())
}

/// Create the address table if it doesn't exist
pub async fn bootstrap_schema(pool: &Pool) -> Result<(), AppError> {
    let client = pool.get().await?;

    client.execute(queries::CREATE_ADDRESS_TABLE, &[]).await?;
    client.execute(queries::ADD_FULL_ADDRESS_COLUMN, &[]).await?;

    // Create indexes for performance
    if let Err(e) = client.execute(queries::CREATE_ADDRESS_CITY_INDEX, &[]).await {
        warn!("Could not create address city index: {}", e);
    }

    info!("✅ Address table initialized");
    Ok(())
}
