//! Address records, payload patches and store filters

use crate::error::AppError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

/// Inbound JSON object, keyed by wire field name
pub type Payload = serde_json::Map<String, Value>;

/// Generated record keys look like `adr-<hex>`
pub static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^adr-[0-9a-f]+$").unwrap());

/// The caller-editable address components
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressField {
    Zipcode,
    Street,
    Number,
    Complement,
    Neighborhood,
    State,
    City,
}

impl AddressField {
    /// Order in which components appear in a composed address string
    pub const CANONICAL_ORDER: [AddressField; 7] = [
        AddressField::Zipcode,
        AddressField::Street,
        AddressField::Number,
        AddressField::Complement,
        AddressField::Neighborhood,
        AddressField::State,
        AddressField::City,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AddressField::Zipcode => "zipcode",
            AddressField::Street => "street",
            AddressField::Number => "number",
            AddressField::Complement => "complement",
            AddressField::Neighborhood => "neighborhood",
            AddressField::State => "state",
            AddressField::City => "city",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::CANONICAL_ORDER.into_iter().find(|f| f.name() == name)
    }

    /// Everything except the complement is required for a valid address
    pub fn is_mandatory(self) -> bool {
        !matches!(self, AddressField::Complement)
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Free-text postal address components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponents {
    pub zipcode: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

impl AddressComponents {
    /// Value of a component, `None` when absent or blank
    pub fn get(&self, field: AddressField) -> Option<&str> {
        let value = match field {
            AddressField::Zipcode => &self.zipcode,
            AddressField::Street => &self.street,
            AddressField::Number => &self.number,
            AddressField::Complement => &self.complement,
            AddressField::Neighborhood => &self.neighborhood,
            AddressField::State => &self.state,
            AddressField::City => &self.city,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    fn slot_mut(&mut self, field: AddressField) -> &mut Option<String> {
        match field {
            AddressField::Zipcode => &mut self.zipcode,
            AddressField::Street => &mut self.street,
            AddressField::Number => &mut self.number,
            AddressField::Complement => &mut self.complement,
            AddressField::Neighborhood => &mut self.neighborhood,
            AddressField::State => &mut self.state,
            AddressField::City => &mut self.city,
        }
    }

    /// Components of a fresh address payload
    pub fn from_payload(payload: &Payload) -> Result<Self, AppError> {
        Ok(Self::default().merged_with(&AddressPatch::from_payload(payload)?))
    }

    /// Overlay a patch: patched fields win, the rest is kept
    pub fn merged_with(mut self, patch: &AddressPatch) -> Self {
        for (field, value) in &patch.changes {
            *self.slot_mut(*field) = value.clone();
        }
        self
    }
}

/// Field-by-field changes parsed from a payload.
///
/// A key present with `null` (or a blank string) clears the component; absent
/// keys leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressPatch {
    changes: BTreeMap<AddressField, Option<String>>,
}

impl AddressPatch {
    pub fn from_payload(payload: &Payload) -> Result<Self, AppError> {
        let mut changes = BTreeMap::new();

        for (name, value) in payload {
            let field = AddressField::from_name(name)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown address field '{}'", name)))?;

            let text = match value {
                Value::Null => None,
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "Address field '{}' must be a string",
                        name
                    )))
                }
            };

            changes.insert(field, text.filter(|t| !t.is_empty()));
        }

        Ok(Self { changes })
    }

    pub fn fields(&self) -> impl Iterator<Item = AddressField> + '_ {
        self.changes.keys().copied()
    }
}

/// Persisted address entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub id: i32,
    pub key: String,
    #[serde(flatten)]
    pub components: AddressComponents,
    pub full_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<i32>,
    pub updated_by_user_id: Option<i32>,
}

/// Fully assembled record ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddress {
    pub key: String,
    pub components: AddressComponents,
    pub full_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Option<i32>,
}

/// Merged and stamped values written back by an update
#[derive(Debug, Clone, PartialEq)]
pub struct AddressWrite {
    pub components: AddressComponents,
    pub full_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub updated_at: DateTime<Utc>,
    pub updated_by_user_id: Option<i32>,
}

/// Equality filters over the address table. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddressFilter {
    #[validate(range(min = 1, message = "id must be positive"))]
    pub id: Option<i32>,
    #[validate(regex(path = *KEY_PATTERN, message = "key must look like adr-<hex>"))]
    pub key: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub zipcode: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub neighborhood: Option<String>,
    pub created_by_user_id: Option<i32>,
}

impl AddressFilter {
    pub fn by_id(id: i32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
