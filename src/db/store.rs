//! Address record store
//!
//! Filtered find/insert/update/delete over the address table. The workflow
//! only depends on [`AddressStore`]; [`PgAddressStore`] is the PostgreSQL
//! implementation.

use crate::address::{AddressComponents, AddressFilter, AddressRecord, AddressWrite, NewAddress};
use crate::db::queries::SqlBuilder;
use crate::error::AppError;
use async_trait::async_trait;
use deadpool_postgres::Pool;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracing::debug;

#[async_trait]
pub trait AddressStore: Send + Sync {
    /// All matching records, ordered by id
    async fn find(&self, filter: &AddressFilter) -> Result<Vec<AddressRecord>, AppError>;

    async fn find_first(&self, filter: &AddressFilter) -> Result<Option<AddressRecord>, AppError>;

    async fn insert(&self, record: &NewAddress) -> Result<AddressRecord, AppError>;

    /// Rows affected
    async fn update_where(&self, filter: &AddressFilter, changes: &AddressWrite) -> Result<u64, AppError>;

    /// Rows affected
    async fn delete_where(&self, filter: &AddressFilter) -> Result<u64, AppError>;
}

type SqlParam<'a> = &'a (dyn ToSql + Sync);

/// Append the filter's equality conditions to `params` and return the
/// matching WHERE clause (empty when the filter is empty).
fn bind_filter<'a>(filter: &'a AddressFilter, params: &mut Vec<SqlParam<'a>>) -> String {
    let mut conditions: Vec<(&str, usize)> = Vec::new();

    let mut push = |column: &'static str, value: SqlParam<'a>, params: &mut Vec<SqlParam<'a>>| {
        params.push(value);
        conditions.push((column, params.len()));
    };

    if let Some(id) = &filter.id {
        push("id", id, params);
    }
    if let Some(key) = &filter.key {
        push("key", key, params);
    }
    if let Some(zipcode) = &filter.zipcode {
        push("zipcode", zipcode, params);
    }
    if let Some(city) = &filter.city {
        push("city", city, params);
    }
    if let Some(state) = &filter.state {
        push("state", state, params);
    }
    if let Some(neighborhood) = &filter.neighborhood {
        push("neighborhood", neighborhood, params);
    }
    if let Some(user_id) = &filter.created_by_user_id {
        push("created_by_user_id", user_id, params);
    }

    SqlBuilder::where_equals(&conditions)
}

fn record_from_row(row: &Row) -> AddressRecord {
    AddressRecord {
        id: row.get("id"),
        key: row.get("key"),
        components: AddressComponents {
            zipcode: row.get("zipcode"),
            street: row.get("street"),
            number: row.get("number"),
            complement: row.get("complement"),
            neighborhood: row.get("neighborhood"),
            state: row.get("state"),
            city: row.get("city"),
        },
        full_address: row.get("full_address"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        created_by_user_id: row.get("created_by_user_id"),
        updated_by_user_id: row.get("updated_by_user_id"),
    }
}

/// PostgreSQL-backed address store
pub struct PgAddressStore {
    pool: Pool,
}

impl PgAddressStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn select(&self, filter: &AddressFilter, limit: Option<u32>) -> Result<Vec<AddressRecord>, AppError> {
        let client = self.pool.get().await?;

        let mut params: Vec<SqlParam<'_>> = Vec::new();
        let where_clause = bind_filter(filter, &mut params);
        let sql = SqlBuilder::select_addresses(&where_clause, limit);

        let rows = client.query(sql.as_str(), &params).await?;
        Ok(rows.iter().map(record_from_row).collect())
    }
}

#[async_trait]
impl AddressStore for PgAddressStore {
    async fn find(&self, filter: &AddressFilter) -> Result<Vec<AddressRecord>, AppError> {
        let records = self.select(filter, None).await?;
        debug!("Found {} addresses", records.len());
        Ok(records)
    }

    async fn find_first(&self, filter: &AddressFilter) -> Result<Option<AddressRecord>, AppError> {
        Ok(self.select(filter, Some(1)).await?.into_iter().next())
    }

    async fn insert(&self, record: &NewAddress) -> Result<AddressRecord, AppError> {
        let client = self.pool.get().await?;
        let c = &record.components;

        let row = client
            .query_one(
                SqlBuilder::insert_address().as_str(),
                &[
                    &record.key,
                    &c.zipcode,
                    &c.street,
                    &c.number,
                    &c.complement,
                    &c.neighborhood,
                    &c.state,
                    &c.city,
                    &record.full_address,
                    &record.latitude,
                    &record.longitude,
                    &record.created_at,
                    &record.created_by_user_id,
                ],
            )
            .await?;

        Ok(record_from_row(&row))
    }

    async fn update_where(&self, filter: &AddressFilter, changes: &AddressWrite) -> Result<u64, AppError> {
        let client = self.pool.get().await?;
        let c = &changes.components;

        let mut params: Vec<SqlParam<'_>> = vec![
            &c.zipcode,
            &c.street,
            &c.number,
            &c.complement,
            &c.neighborhood,
            &c.state,
            &c.city,
            &changes.full_address,
            &changes.latitude,
            &changes.longitude,
            &changes.updated_at,
            &changes.updated_by_user_id,
        ];
        let where_clause = bind_filter(filter, &mut params);
        let sql = SqlBuilder::update_addresses(&where_clause);

        Ok(client.execute(sql.as_str(), &params).await?)
    }

    async fn delete_where(&self, filter: &AddressFilter) -> Result<u64, AppError> {
        let client = self.pool.get().await?;

        let mut params: Vec<SqlParam<'_>> = Vec::new();
        let where_clause = bind_filter(filter, &mut params);
        let sql = SqlBuilder::delete_addresses(&where_clause);

        Ok(client.execute(sql.as_str(), &params).await?)
    }
}
