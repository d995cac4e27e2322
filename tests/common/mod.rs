//! Shared helpers for the integration suite.

use scim_sdk::mapper::InMemoryAdapter;
use scim_sdk::schema::SchemaRegistry;
use scim_sdk::server::{ScimServer, ScimServerBuilder};
use std::sync::{Arc, Once};

pub mod fixtures;

static LOGGING: Once = Once::new();

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::with_core_schemas().expect("embedded schemas load"))
}

/// Server under `/scim` with in-memory User and Group adapters. User names
/// are unique.
pub fn server_with(schemas: Arc<SchemaRegistry>, max_results: u64) -> ScimServer {
    init_logging();
    let users = schemas.resource_descriptor("User").expect("User is registered");
    let groups = schemas.resource_descriptor("Group").expect("Group is registered");
    ScimServerBuilder::new()
        .with_schema_registry(schemas)
        .with_base_uri("/scim")
        .with_max_results(max_results)
        .with_adapter(Arc::new(
            InMemoryAdapter::new(users).with_unique_attribute("userName"),
        ))
        .with_adapter(Arc::new(InMemoryAdapter::new(groups)))
        .build()
        .expect("server builds")
}

pub fn server() -> ScimServer {
    server_with(registry(), 100)
}
