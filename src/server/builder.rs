//! Server construction.
//!
//! Building is the startup boundary: configuration errors and registration
//! conflicts fail [`build`](ScimServerBuilder::build) and no server is
//! returned.

use super::handler::ScimServer;
use crate::config::ServerConfig;
use crate::error::{BuildError, BuildResult};
use crate::mapper::{ResourceAdapter, ResourceMapperRegistry};
use crate::schema::SchemaRegistry;

use log::info;
use std::sync::Arc;

/// Builder for [`ScimServer`].
///
/// ```rust
/// use scim_sdk::mapper::InMemoryAdapter;
/// use scim_sdk::schema::SchemaRegistry;
/// use scim_sdk::server::ScimServerBuilder;
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let schemas = Arc::new(SchemaRegistry::with_core_schemas()?);
/// let users = InMemoryAdapter::new(schemas.resource_descriptor("User").unwrap());
///
/// let server = ScimServerBuilder::new()
///     .with_schema_registry(schemas)
///     .with_base_uri("/scim")
///     .with_adapter(Arc::new(users))
///     .build()?;
/// assert_eq!(server.mapper_registry().resource_types(), vec!["User"]);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ScimServerBuilder {
    schemas: Option<Arc<SchemaRegistry>>,
    mappers: Option<Arc<ResourceMapperRegistry>>,
    adapters: Vec<Arc<dyn ResourceAdapter>>,
    config: ServerConfig,
}

impl ScimServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema_registry(mut self, schemas: Arc<SchemaRegistry>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Use an existing mapper registry instead of a fresh one.
    pub fn with_mapper_registry(mut self, mappers: Arc<ResourceMapperRegistry>) -> Self {
        self.mappers = Some(mappers);
        self
    }

    /// Register `adapter` at build time under its own resource type, and as
    /// the query adapter of its endpoint when it supports queries.
    pub fn with_adapter(mut self, adapter: Arc<dyn ResourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.config.base_uri = base_uri.into();
        self
    }

    pub fn with_max_results(mut self, max_results: u64) -> Self {
        self.config.max_results = max_results;
        self
    }

    pub fn with_strict_decode(mut self, strict: bool) -> Self {
        self.config.strict_decode = strict;
        self
    }

    /// Validate the configuration, register the adapters and create the
    /// server.
    pub fn build(self) -> BuildResult<ScimServer> {
        self.config.validate()?;
        let schemas = self.schemas.ok_or(BuildError::MissingSchemaRegistry)?;
        let mappers = self.mappers.unwrap_or_default();

        for adapter in self.adapters {
            let resource_type = adapter.resource_type().to_string();
            let Some(descriptor) = schemas.resource_descriptor(&resource_type) else {
                return Err(BuildError::InvalidConfiguration {
                    message: format!("Adapter serves unregistered resource type '{}'", resource_type),
                });
            };
            if adapter.supports_query() && adapter.query_endpoint() != descriptor.endpoint() {
                return Err(BuildError::InvalidConfiguration {
                    message: format!(
                        "Adapter for '{}' queries '{}' but the resource type is served at '{}'",
                        resource_type,
                        adapter.query_endpoint(),
                        descriptor.endpoint()
                    ),
                });
            }
            mappers.register(adapter)?;
        }

        info!(
            "SCIM server ready at '{}' serving {:?}",
            self.config.normalized_base(),
            mappers.resource_types()
        );
        Ok(ScimServer::new(schemas, mappers, self.config))
    }
}
