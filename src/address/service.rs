//! Address reconciliation workflow
//!
//! Ties field governance, completeness validation, geocoding enrichment and
//! persistence together for create and update. Reads and deletes go straight
//! to the store.

use crate::address::builder::{build_full_address, ensure_complete, join_components};
use crate::address::geocode::{resolve_coordinates, Geocoder};
use crate::address::governor::FieldGovernor;
use crate::address::model::{
    AddressComponents, AddressField, AddressFilter, AddressPatch, AddressRecord, AddressWrite,
    NewAddress, Payload,
};
use crate::auth::IdentityResolver;
use crate::db::AddressStore;
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fields exempt from the completeness check when re-validating a merged record
const UPDATE_IGNORED_FIELDS: [AddressField; 1] = [AddressField::Zipcode];

/// Fresh record key, `adr-` followed by 32 hex digits
pub fn generate_key() -> String {
    format!("adr-{}", Uuid::new_v4().simple())
}

pub struct AddressService {
    store: Arc<dyn AddressStore>,
    geocoder: Arc<dyn Geocoder>,
    governor: FieldGovernor,
}

impl AddressService {
    pub fn new(store: Arc<dyn AddressStore>, geocoder: Arc<dyn Geocoder>, governor: FieldGovernor) -> Self {
        Self {
            store,
            geocoder,
            governor,
        }
    }

    pub async fn list(&self, filter: &AddressFilter) -> Result<Vec<AddressRecord>, AppError> {
        self.store.find(filter).await
    }

    pub async fn get(&self, filter: &AddressFilter) -> Result<Option<AddressRecord>, AppError> {
        self.store.find_first(filter).await
    }

    pub async fn remove(&self, filter: &AddressFilter) -> Result<u64, AppError> {
        let rows = self.store.delete_where(filter).await?;
        info!("Removed {} addresses", rows);
        Ok(rows)
    }

    /// Create a geocoded address from a caller payload.
    ///
    /// Nothing is inserted unless every mandatory component is present and
    /// the geocoder answers.
    pub async fn create(
        &self,
        payload: &Payload,
        identity: &dyn IdentityResolver,
    ) -> Result<AddressRecord, AppError> {
        let sanitized = self.sanitize(payload);
        let components = AddressComponents::from_payload(&sanitized)?;

        let full_address = build_full_address(&components, &[])?;
        let coordinates = resolve_coordinates(self.geocoder.as_ref(), &full_address).await?;

        let record = NewAddress {
            key: generate_key(),
            components,
            full_address,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            created_at: Utc::now(),
            created_by_user_id: identity.current_user_id(),
        };

        let inserted = self.store.insert(&record).await?;
        info!("Address created: {} (id: {})", inserted.key, inserted.id);
        Ok(inserted)
    }

    /// Apply `changes` to every record matching `filter`, re-geocoding each one.
    ///
    /// Records are processed one at a time in store order. A geocoding failure
    /// stops the loop; records written before it stay written.
    pub async fn update(
        &self,
        filter: &AddressFilter,
        changes: &Payload,
        identity: &dyn IdentityResolver,
    ) -> Result<u64, AppError> {
        let sanitized = self.sanitize(changes);
        let patch = AddressPatch::from_payload(&sanitized)?;

        let matched = self.store.find(filter).await?;
        let fields: Vec<&str> = patch.fields().map(|f| f.name()).collect();
        debug!(
            "Updating [{}] on {} matched addresses",
            fields.join(", "),
            matched.len()
        );

        let mut rows = 0;

        for existing in matched {
            let merged = existing.components.clone().merged_with(&patch);

            ensure_complete(&merged, &UPDATE_IGNORED_FIELDS)?;
            let full_address = join_components(&merged, &[]);
            let coordinates = match resolve_coordinates(self.geocoder.as_ref(), &full_address).await {
                Ok(coordinates) => coordinates,
                Err(e) => {
                    warn!(
                        "Stopping address update at id {} after {} rows: {}",
                        existing.id, rows, e
                    );
                    return Err(e);
                }
            };

            let write = AddressWrite {
                components: merged,
                full_address,
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
                updated_at: Utc::now(),
                updated_by_user_id: identity.current_user_id(),
            };

            rows += self
                .store
                .update_where(&AddressFilter::by_id(existing.id), &write)
                .await?;
        }

        info!("Updated {} addresses", rows);
        Ok(rows)
    }

    /// Strip governed fields, reporting the ones the caller tried to send
    fn sanitize(&self, payload: &Payload) -> Payload {
        let rejected = self.governor.filter_fields(payload);
        if !rejected.is_empty() {
            let names: Vec<&str> = rejected.keys().map(String::as_str).collect();
            debug!("Ignoring governed fields in address payload: {}", names.join(", "));
        }
        self.governor.strip_identity_fields(payload)
    }
}
