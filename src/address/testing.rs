//! In-memory collaborators for workflow tests

use crate::address::geocode::{GeocodeCandidate, GeocodeResponse, Geocoder, RawCoordinate};
use crate::address::model::{AddressFilter, AddressRecord, AddressWrite, NewAddress};
use crate::auth::IdentityResolver;
use crate::db::AddressStore;
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::RwLock;

fn matches(filter: &AddressFilter, record: &AddressRecord) -> bool {
    let c = &record.components;
    filter.id.map_or(true, |id| record.id == id)
        && filter.key.as_ref().map_or(true, |k| &record.key == k)
        && filter.zipcode.as_ref().map_or(true, |z| c.zipcode.as_ref() == Some(z))
        && filter.city.as_ref().map_or(true, |v| c.city.as_ref() == Some(v))
        && filter.state.as_ref().map_or(true, |v| c.state.as_ref() == Some(v))
        && filter.neighborhood.as_ref().map_or(true, |v| c.neighborhood.as_ref() == Some(v))
        && filter
            .created_by_user_id
            .map_or(true, |u| record.created_by_user_id == Some(u))
}

/// Vec-backed store keeping insertion (= id) order
pub struct InMemoryAddressStore {
    records: RwLock<Vec<AddressRecord>>,
}

impl InMemoryAddressStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn snapshot(&self) -> Vec<AddressRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn find(&self, filter: &AddressFilter) -> Result<Vec<AddressRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| matches(filter, r)).cloned().collect())
    }

    async fn find_first(&self, filter: &AddressFilter) -> Result<Option<AddressRecord>, AppError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    async fn insert(&self, record: &NewAddress) -> Result<AddressRecord, AppError> {
        let mut records = self.records.write().await;
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        let inserted = AddressRecord {
            id,
            key: record.key.clone(),
            components: record.components.clone(),
            full_address: Some(record.full_address.clone()),
            latitude: record.latitude,
            longitude: record.longitude,
            created_at: record.created_at,
            updated_at: None,
            created_by_user_id: record.created_by_user_id,
            updated_by_user_id: None,
        };
        records.push(inserted.clone());
        Ok(inserted)
    }

    async fn update_where(&self, filter: &AddressFilter, changes: &AddressWrite) -> Result<u64, AppError> {
        let mut records = self.records.write().await;
        let mut rows = 0;
        for record in records.iter_mut().filter(|r| matches(filter, r)) {
            record.components = changes.components.clone();
            record.full_address = Some(changes.full_address.clone());
            record.latitude = changes.latitude;
            record.longitude = changes.longitude;
            record.updated_at = Some(changes.updated_at);
            record.updated_by_user_id = changes.updated_by_user_id;
            rows += 1;
        }
        Ok(rows)
    }

    async fn delete_where(&self, filter: &AddressFilter) -> Result<u64, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !matches(filter, r));
        Ok((before - records.len()) as u64)
    }
}

/// Geocoder answering from a queue of canned responses
pub struct ScriptedGeocoder {
    responses: Mutex<VecDeque<GeocodeResponse>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: GeocodeResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Status 200 with one candidate per `(lat, lon)` pair
    pub fn push_ok(&self, candidates: Vec<(&str, &str)>) {
        self.push(GeocodeResponse {
            status: 200,
            candidates: candidates
                .into_iter()
                .map(|(lat, lon)| GeocodeCandidate {
                    lat: Some(RawCoordinate::Text(lat.to_string())),
                    lon: Some(RawCoordinate::Text(lon.to_string())),
                })
                .collect(),
        });
    }

    pub fn push_status(&self, status: u16) {
        self.push(GeocodeResponse {
            status,
            candidates: Vec::new(),
        });
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Internal(format!("unexpected geocode query '{}'", query)))
    }
}

/// Identity resolver returning a fixed user
pub struct FixedIdentity(pub Option<i32>);

impl IdentityResolver for FixedIdentity {
    fn current_user_id(&self) -> Option<i32> {
        self.0
    }
}
