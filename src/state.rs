//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::address::AddressService;
use crate::config::AuthConfig;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Address reconciliation workflow
    pub addresses: AddressService,

    /// Identity settings consulted by the session middleware
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(addresses: AddressService, auth: AuthConfig) -> Self {
        Self { addresses, auth }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
