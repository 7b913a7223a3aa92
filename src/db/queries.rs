//! SQL query constants and builders
//!
//! Contains all SQL queries used by the application.

/// Address table name
pub const ADDRESS_TABLE: &str = "adr_address";

/// Create the address table
pub const CREATE_ADDRESS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS adr_address (
        id SERIAL PRIMARY KEY,
        "key" VARCHAR(64) UNIQUE NOT NULL,
        zipcode TEXT,
        street TEXT NOT NULL,
        "number" TEXT NOT NULL,
        complement TEXT,
        neighborhood TEXT NOT NULL,
        state TEXT NOT NULL,
        city TEXT NOT NULL,
        full_address TEXT,
        latitude DOUBLE PRECISION,
        longitude DOUBLE PRECISION,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ,
        created_by_user_id INTEGER,
        updated_by_user_id INTEGER
    )
"#;

/// Older deployments predate the composed address column
pub const ADD_FULL_ADDRESS_COLUMN: &str =
    "ALTER TABLE adr_address ADD COLUMN IF NOT EXISTS full_address TEXT";

pub const CREATE_ADDRESS_CITY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_adr_address_city ON adr_address(city)";

/// Column list returned by every address query
pub const ADDRESS_COLUMNS: &str = r#"id, "key", zipcode, street, "number", complement, neighborhood, state, city, full_address, latitude, longitude, created_at, updated_at, created_by_user_id, updated_by_user_id"#;

/// Get column names of a table in the public schema
pub const GET_COLUMN_NAMES: &str = r#"
    SELECT column_name
    FROM information_schema.columns
    WHERE table_schema = 'public'
        AND table_name = $1
    ORDER BY ordinal_position
"#;

/// SQL builder for safe identifier quoting
pub struct SqlBuilder;

impl SqlBuilder {
    /// Quote an identifier (table/column name) safely
    pub fn quote_ident(ident: &str) -> String {
        // PostgreSQL identifier quoting
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// `SELECT <columns> FROM adr_address<where> ORDER BY id`
    pub fn select_addresses(where_clause: &str, limit: Option<u32>) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}{} ORDER BY id",
            ADDRESS_COLUMNS, ADDRESS_TABLE, where_clause
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    /// INSERT with positional parameters for every writable column
    pub fn insert_address() -> String {
        format!(
            r#"INSERT INTO {} ("key", zipcode, street, "number", complement, neighborhood, state, city, full_address, latitude, longitude, created_at, created_by_user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {}"#,
            ADDRESS_TABLE, ADDRESS_COLUMNS
        )
    }

    /// UPDATE of the merged components and stamps; the where clause
    /// continues numbering at `$13`
    pub fn update_addresses(where_clause: &str) -> String {
        format!(
            r#"UPDATE {} SET zipcode = $1, street = $2, "number" = $3, complement = $4, neighborhood = $5, state = $6, city = $7, full_address = $8, latitude = $9, longitude = $10, updated_at = $11, updated_by_user_id = $12{}"#,
            ADDRESS_TABLE, where_clause
        )
    }

    pub fn delete_addresses(where_clause: &str) -> String {
        format!("DELETE FROM {}{}", ADDRESS_TABLE, where_clause)
    }

    /// ` WHERE a = $n AND b = $m` from `(column, placeholder index)` pairs
    pub fn where_equals(conditions: &[(&str, usize)]) -> String {
        if conditions.is_empty() {
            return String::new();
        }

        let clauses: Vec<String> = conditions
            .iter()
            .map(|(column, index)| format!("{} = ${}", Self::quote_ident(column), index))
            .collect();
        format!(" WHERE {}", clauses.join(" AND "))
    }
}
