//! Field governance for address payloads
//!
//! System-managed and identity-related fields must never travel inside an
//! address payload. The policy is a fixed set of system field names, optionally
//! widened with the live columns of the identity table.

use crate::address::model::Payload;
use crate::error::AppError;
use crate::introspection::SchemaIntrospector;
use std::collections::BTreeSet;
use tracing::debug;

/// Fields that are always computed or looked up internally
pub const SYSTEM_FIELDS: [&str; 9] = [
    "id",
    "key",
    "full_address",
    "latitude",
    "longitude",
    "created_at",
    "updated_at",
    "created_by_user_id",
    "updated_by_user_id",
];

/// Canonical spelling used for comparisons: `created_at` and `createdAt`
/// both become `createdat`.
pub fn normalize_field_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Allow/deny mask applied to inbound payloads
#[derive(Debug, Clone)]
pub struct FieldGovernor {
    forbidden: BTreeSet<String>,
}

impl FieldGovernor {
    pub fn new() -> Self {
        Self {
            forbidden: SYSTEM_FIELDS.iter().map(|f| normalize_field_name(f)).collect(),
        }
    }

    /// Add the columns of an identity table to the forbidden set
    pub fn with_identity_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.forbidden
            .extend(columns.into_iter().map(|c| normalize_field_name(c.as_ref())));
        self
    }

    /// Build the policy from the live schema of `identity_table`.
    /// A missing table contributes nothing.
    pub async fn from_introspection(
        introspector: &dyn SchemaIntrospector,
        identity_table: &str,
    ) -> Result<Self, AppError> {
        let columns = introspector.columns_of(identity_table).await?;
        debug!(
            "Identity table '{}' contributes {} governed columns",
            identity_table,
            columns.len()
        );
        Ok(Self::new().with_identity_columns(columns))
    }

    pub fn is_forbidden(&self, name: &str) -> bool {
        self.forbidden.contains(&normalize_field_name(name))
    }

    /// Keep only governed keys (whitelist mode)
    pub fn filter_fields(&self, payload: &Payload) -> Payload {
        payload
            .iter()
            .filter(|(k, _)| self.is_forbidden(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drop every governed key (denylist mode)
    pub fn strip_identity_fields(&self, payload: &Payload) -> Payload {
        payload
            .iter()
            .filter(|(k, _)| !self.is_forbidden(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for FieldGovernor {
    fn default() -> Self {
        Self::new()
    }
}
