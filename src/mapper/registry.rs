//! Resource-type and endpoint routing to backend adapters.

use super::adapter::ResourceAdapter;
use crate::error::{ScimError, ScimResult};
use crate::snapshot::SnapshotCell;

use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Clone, Default)]
struct Registrations {
    adapters: HashMap<String, Vec<Arc<dyn ResourceAdapter>>>,
    query_adapters: HashMap<String, Arc<dyn ResourceAdapter>>,
}

impl Registrations {
    fn add_adapter(&mut self, resource_type: &str, adapter: Arc<dyn ResourceAdapter>) -> ScimResult<()> {
        let adapters = self.adapters.entry(resource_type.to_string()).or_default();
        if adapters.iter().any(|existing| same_adapter(existing, &adapter)) {
            return Err(ScimError::DuplicateAdapterRegistration {
                endpoint: resource_type.to_string(),
            });
        }
        adapters.push(adapter);
        Ok(())
    }

    fn add_query_adapter(&mut self, endpoint: &str, adapter: Arc<dyn ResourceAdapter>) -> ScimResult<()> {
        if self.query_adapters.contains_key(endpoint) {
            return Err(ScimError::DuplicateAdapterRegistration {
                endpoint: endpoint.to_string(),
            });
        }
        self.query_adapters.insert(endpoint.to_string(), adapter);
        Ok(())
    }
}

fn identity(adapter: &Arc<dyn ResourceAdapter>) -> *const () {
    Arc::as_ptr(adapter) as *const ()
}

fn same_adapter(a: &Arc<dyn ResourceAdapter>, b: &Arc<dyn ResourceAdapter>) -> bool {
    identity(a) == identity(b)
}

/// Routes resource types to their adapters and query endpoints to the single
/// adapter serving list operations.
///
/// Registrations publish a new snapshot; request handling reads the current
/// one without waiting on a registration in progress.
#[derive(Default)]
pub struct ResourceMapperRegistry {
    registrations: SnapshotCell<Registrations>,
}

impl ResourceMapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter for `resource_type`. Several adapters may serve one
    /// type; the same adapter twice is a
    /// [`DuplicateAdapterRegistration`](ScimError::DuplicateAdapterRegistration).
    pub fn register_adapter(&self, resource_type: &str, adapter: Arc<dyn ResourceAdapter>) -> ScimResult<()> {
        self.registrations
            .update(|r| r.add_adapter(resource_type, adapter))?;
        info!("Registered adapter for resource type '{}'", resource_type);
        Ok(())
    }

    /// Adapters for `resource_type` in registration order; empty when none.
    pub fn adapters_for(&self, resource_type: &str) -> Vec<Arc<dyn ResourceAdapter>> {
        self.registrations
            .load()
            .adapters
            .get(resource_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Make `adapter` the query adapter of `endpoint`. Fails when the endpoint
    /// already has one.
    pub fn register_query_adapter(&self, endpoint: &str, adapter: Arc<dyn ResourceAdapter>) -> ScimResult<()> {
        self.registrations
            .update(|r| r.add_query_adapter(endpoint, adapter))?;
        info!("Registered query adapter for endpoint '{}'", endpoint);
        Ok(())
    }

    pub fn query_adapter_for(&self, endpoint: &str) -> Option<Arc<dyn ResourceAdapter>> {
        self.registrations.load().query_adapters.get(endpoint).cloned()
    }

    /// Register an adapter under its own resource type and, when it supports
    /// queries, as the query adapter of its endpoint. Either both
    /// registrations take effect or neither does.
    pub fn register(&self, adapter: Arc<dyn ResourceAdapter>) -> ScimResult<()> {
        let resource_type = adapter.resource_type().to_string();
        let endpoint = adapter.query_endpoint().to_string();
        let queryable = adapter.supports_query();
        self.registrations.update(|r| {
            r.add_adapter(&resource_type, Arc::clone(&adapter))?;
            if queryable {
                r.add_query_adapter(&endpoint, adapter)?;
            }
            Ok::<_, ScimError>(())
        })?;
        info!(
            "Registered adapter for '{}' (query endpoint: {})",
            resource_type,
            if queryable { endpoint.as_str() } else { "none" }
        );
        Ok(())
    }

    /// Resource types with at least one adapter.
    pub fn resource_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.registrations.load().adapters.keys().cloned().collect();
        types.sort();
        types
    }

    /// Remove every registration and finalize each distinct adapter exactly
    /// once. Returns the number of adapters finalized.
    pub fn shutdown(&self) -> usize {
        let previous = self.registrations.replace(Registrations::default());
        let mut seen = HashSet::new();
        let all = previous
            .adapters
            .values()
            .flatten()
            .chain(previous.query_adapters.values());
        let mut finalized = 0;
        for adapter in all {
            if seen.insert(identity(adapter)) {
                debug!("Finalizing adapter for '{}'", adapter.resource_type());
                adapter.finalize();
                finalized += 1;
            }
        }
        info!("Mapper registry shut down, {} adapters finalized", finalized);
        finalized
    }
}

impl std::fmt::Debug for ResourceMapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.registrations.load();
        f.debug_struct("ResourceMapperRegistry")
            .field("resource_types", &snapshot.adapters.keys().collect::<Vec<_>>())
            .field("query_endpoints", &snapshot.query_adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
