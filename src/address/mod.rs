//! Address reconciliation and enrichment
//!
//! - `governor`: strips system and identity fields from payloads
//! - `builder`: composes the canonical address string
//! - `geocode`: resolves coordinates from an external provider
//! - `service`: create/update/list/get/remove workflow

pub mod builder;
pub mod geocode;
pub mod governor;
pub mod model;
pub mod service;

#[cfg(test)]
pub mod testing;

pub use geocode::NominatimClient;
pub use governor::FieldGovernor;
pub use model::{AddressComponents, AddressFilter, AddressRecord, AddressWrite, NewAddress, Payload};
pub use service::AddressService;
