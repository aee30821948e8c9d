//! Endpoint fallback selection
//!
//! Selection is a pure function over the current endpoint and a read-only
//! catalog: candidates are filtered to one network, stable-sorted by
//! priority, and walked round-robin. Nothing remembers which endpoints
//! failed, so a full cycle revisits every endpoint once before repeating.

use crate::models::{EndpointDescriptor, NetworkId};
use crate::utils::ConfigError;
use std::collections::HashSet;

fn candidates(network: NetworkId, catalog: &[EndpointDescriptor]) -> Vec<&EndpointDescriptor> {
    let mut filtered: Vec<&EndpointDescriptor> =
        catalog.iter().filter(|e| e.network == network).collect();
    // Stable: equal priorities keep catalog order
    filtered.sort_by_key(|e| e.priority);
    filtered
}

/// Next endpoint to try on `network`
///
/// - `current == None` returns the highest-priority endpoint.
/// - Otherwise returns the endpoint after `current` (matched by id), wrapping
///   to the first after the last. An id not present on `network` restarts
///   at the first endpoint.
/// - Returns `None` when the catalog has no endpoint for `network`; callers
///   should treat that as terminal.
pub fn next_endpoint<'a>(
    current: Option<&EndpointDescriptor>,
    network: NetworkId,
    catalog: &'a [EndpointDescriptor],
) -> Option<&'a EndpointDescriptor> {
    let sorted = candidates(network, catalog);
    let first = *sorted.first()?;

    let Some(current) = current else {
        return Some(first);
    };

    match sorted.iter().position(|e| e.id == current.id) {
        Some(index) => Some(sorted[(index + 1) % sorted.len()]),
        None => Some(first),
    }
}

/// Static endpoint catalog built at startup
///
/// Ids are unique across the catalog. Shared read-only (typically behind an
/// `Arc`) for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointCatalog {
    endpoints: Vec<EndpointDescriptor>,
}

impl EndpointCatalog {
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            if !seen.insert(endpoint.id.as_str()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.id.clone()));
            }
        }
        Ok(Self { endpoints })
    }

    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    /// Endpoints of `network` in the order they are tried
    pub fn for_network(&self, network: NetworkId) -> Vec<&EndpointDescriptor> {
        candidates(network, &self.endpoints)
    }

    pub fn first(&self, network: NetworkId) -> Option<&EndpointDescriptor> {
        next_endpoint(None, network, &self.endpoints)
    }

    pub fn next_after(
        &self,
        current: &EndpointDescriptor,
        network: NetworkId,
    ) -> Option<&EndpointDescriptor> {
        next_endpoint(Some(current), network, &self.endpoints)
    }
}
