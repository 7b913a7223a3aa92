//! Schema Introspection Module
//!
//! Reads column metadata from the live database. Used to derive the governed
//! field set from the identity table.

use crate::db::queries;
use crate::error::AppError;
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::debug;

/// Column lookup for a table
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Column names in ordinal order; empty when the table does not exist
    async fn columns_of(&self, table: &str) -> Result<Vec<String>, AppError>;
}

/// Schema introspector for PostgreSQL
pub struct PostgresIntrospector {
    pool: Pool,
}

impl PostgresIntrospector {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaIntrospector for PostgresIntrospector {
    async fn columns_of(&self, table: &str) -> Result<Vec<String>, AppError> {
        let client = self.pool.get().await?;
        let rows = client.query(queries::GET_COLUMN_NAMES, &[&table]).await?;

        let columns: Vec<String> = rows.iter().map(|r| r.get("column_name")).collect();
        debug!("Introspected {} columns from '{}'", columns.len(), table);
        Ok(columns)
    }
}
