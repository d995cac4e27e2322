//! Schema registry for resource and attribute descriptors.
//!
//! The registry is built once at startup and read on every request. It is an
//! explicitly constructed value, normally shared behind an `Arc` by the codecs
//! and the server, never a global.

use super::types::{AttributeDescriptor, ResourceDescriptor};
use super::{embedded, loader};
use crate::error::{ConfigError, ScimError, ScimResult};
use crate::snapshot::SnapshotCell;

use log::info;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Descriptors {
    resources: HashMap<String, Arc<ResourceDescriptor>>,
    resource_order: Vec<String>,
    endpoints: HashMap<String, String>,
    attributes: HashMap<(String, String), Arc<AttributeDescriptor>>,
}

impl Descriptors {
    /// Index an attribute, keeping an equal descriptor that is already present.
    fn index_attribute(
        &mut self,
        descriptor: Arc<AttributeDescriptor>,
    ) -> ScimResult<Arc<AttributeDescriptor>> {
        let key = (descriptor.schema().to_string(), descriptor.name().to_string());
        match self.attributes.get(&key) {
            Some(existing) if **existing == *descriptor => Ok(Arc::clone(existing)),
            Some(_) => Err(attribute_conflict(&key.0, &key.1)),
            None => {
                self.attributes.insert(key, Arc::clone(&descriptor));
                Ok(descriptor)
            }
        }
    }
}

fn attribute_conflict(schema: &str, name: &str) -> ScimError {
    ScimError::schema_conflict(format!("attribute '{}' in schema '{}'", name, schema))
}

/// Registry of resource and attribute descriptors.
///
/// Lookups read an immutable snapshot. Registrations are serialized and publish
/// a new snapshot only when they succeed.
pub struct SchemaRegistry {
    descriptors: SnapshotCell<Descriptors>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: SnapshotCell::default(),
        }
    }

    /// Create a registry holding the SCIM 1.0 core schema (User, Group,
    /// ServiceProviderConfig) and the enterprise user extension.
    pub fn with_core_schemas() -> Result<Self, ConfigError> {
        let registry = Self::new();
        registry.load_str(embedded::core_schema(), "embedded core schema")?;
        registry.load_str(embedded::enterprise_extension(), "embedded enterprise extension")?;
        Ok(registry)
    }

    /// Register a resource type.
    ///
    /// Attributes of the descriptor are indexed under their own identity when
    /// not yet known. Fails with [`ScimError::SchemaConflict`] when the
    /// resource type or its endpoint is already registered, or when one of its
    /// attributes collides with a different registered descriptor.
    pub fn register_resource(&self, descriptor: ResourceDescriptor) -> ScimResult<Arc<ResourceDescriptor>> {
        let registered = self.descriptors.update(|d| {
            if d.resources.contains_key(descriptor.name()) {
                return Err(ScimError::schema_conflict(format!(
                    "resource type '{}'",
                    descriptor.name()
                )));
            }
            if let Some(owner) = d.endpoints.get(descriptor.endpoint()) {
                return Err(ScimError::schema_conflict(format!(
                    "endpoint '{}' (served by resource type '{}')",
                    descriptor.endpoint(),
                    owner
                )));
            }

            let mut resource = ResourceDescriptor::new(descriptor.name(), descriptor.schema())
                .with_endpoint(descriptor.endpoint())
                .with_description(descriptor.description());
            for attribute in descriptor.attributes() {
                resource = resource.with_attribute(d.index_attribute(Arc::clone(attribute))?);
            }

            let resource = Arc::new(resource);
            d.endpoints
                .insert(resource.endpoint().to_string(), resource.name().to_string());
            d.resource_order.push(resource.name().to_string());
            d.resources
                .insert(resource.name().to_string(), Arc::clone(&resource));
            Ok(resource)
        })?;

        info!(
            "Registered resource type {} (schema {}, endpoint /{})",
            registered.name(),
            registered.schema(),
            registered.endpoint()
        );
        Ok(registered)
    }

    /// Register an attribute under its (schema URI, name) identity.
    ///
    /// Unlike resource registration this is strict: any existing descriptor
    /// with the same identity is a conflict.
    pub fn register_attribute(&self, descriptor: AttributeDescriptor) -> ScimResult<Arc<AttributeDescriptor>> {
        let descriptor = Arc::new(descriptor);
        self.descriptors.update(|d| {
            let key = (descriptor.schema().to_string(), descriptor.name().to_string());
            if d.attributes.contains_key(&key) {
                return Err(attribute_conflict(&key.0, &key.1));
            }
            d.attributes.insert(key, Arc::clone(&descriptor));
            Ok(())
        })?;
        Ok(descriptor)
    }

    pub fn resource_descriptor(&self, name: &str) -> Option<Arc<ResourceDescriptor>> {
        self.descriptors.load().resources.get(name).cloned()
    }

    pub fn attribute_descriptor(&self, schema: &str, name: &str) -> Option<Arc<AttributeDescriptor>> {
        self.descriptors
            .load()
            .attributes
            .get(&(schema.to_string(), name.to_string()))
            .cloned()
    }

    /// Resource type served at a collection endpoint such as `Users`.
    pub fn resource_for_endpoint(&self, endpoint: &str) -> Option<Arc<ResourceDescriptor>> {
        let snapshot = self.descriptors.load();
        let name = snapshot.endpoints.get(endpoint)?;
        snapshot.resources.get(name).cloned()
    }

    /// All resource descriptors in registration order.
    pub fn resource_descriptors(&self) -> Vec<Arc<ResourceDescriptor>> {
        let snapshot = self.descriptors.load();
        snapshot
            .resource_order
            .iter()
            .filter_map(|name| snapshot.resources.get(name).cloned())
            .collect()
    }

    /// True when at least one attribute is registered under `schema`.
    pub fn is_known_schema(&self, schema: &str) -> bool {
        self.descriptors
            .load()
            .attributes
            .keys()
            .any(|(s, _)| s == schema)
    }

    /// Load a schema definition document from a string. `origin` names the
    /// source in error messages.
    pub fn load_str(&self, content: &str, origin: &str) -> Result<(), ConfigError> {
        let document = loader::parse_document(content, origin)?;
        loader::install(self, document)
    }

    /// Load a schema definition document from a JSON file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = loader::read_file(path)?;
        self.load_str(&content, &path.display().to_string())
    }

    /// Load every `*.json` file of a directory, in file name order.
    pub fn load_dir<P: AsRef<Path>>(&self, dir: P) -> Result<usize, ConfigError> {
        let files = loader::schema_files(dir.as_ref())?;
        for file in &files {
            self.load_file(file)?;
        }
        Ok(files.len())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.descriptors.load();
        f.debug_struct("SchemaRegistry")
            .field("resources", &snapshot.resource_order)
            .field("attributes", &snapshot.attributes.len())
            .finish()
    }
}
