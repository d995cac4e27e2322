//! Reference adapter keeping resources in process memory.
//!
//! Useful for tests, demos and as a template for real backends. Ids are
//! random UUIDs; `meta.created` and `meta.lastModified` are maintained on
//! every write. Queries are evaluated in process with the filter matcher.

use super::adapter::{QueryResult, ResourceAdapter};
use crate::error::{AdapterError, AdapterResult};
use crate::query::{AttributeSelection, QueryDescriptor, ScimUri, matcher};
use crate::resource::{Attribute, ComplexValue, ScimResource, SimpleValue};
use crate::schema::ResourceDescriptor;

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Default)]
struct Store {
    order: Vec<String>,
    resources: HashMap<String, ScimResource>,
}

/// In-memory adapter for one resource type.
pub struct InMemoryAdapter {
    descriptor: Arc<ResourceDescriptor>,
    unique_attribute: Option<String>,
    location_base: Option<String>,
    store: RwLock<Store>,
}

impl InMemoryAdapter {
    pub fn new(descriptor: Arc<ResourceDescriptor>) -> Self {
        Self {
            descriptor,
            unique_attribute: None,
            location_base: None,
            store: RwLock::new(Store::default()),
        }
    }

    /// Reject writes that would give two resources the same value for this
    /// primary-schema attribute.
    pub fn with_unique_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.unique_attribute = Some(attribute.into());
        self
    }

    /// Fill `meta.location` with resource URIs under `base`.
    pub fn with_location_base(mut self, base: impl Into<String>) -> Self {
        self.location_base = Some(base.into());
        self
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn unique_key(&self, resource: &ScimResource) -> Option<(String, String)> {
        let name = self.unique_attribute.as_deref()?;
        let attribute = resource.attribute(resource.primary_schema(), name)?;
        let text = attribute.singular_value()?.as_simple()?.to_text();
        let key = if attribute.descriptor().is_case_exact() {
            text.clone()
        } else {
            text.to_lowercase()
        };
        Some((key, text))
    }

    fn check_unique(&self, store: &Store, resource: &ScimResource, exclude: Option<&str>) -> AdapterResult<()> {
        let Some((key, text)) = self.unique_key(resource) else {
            return Ok(());
        };
        let taken = store
            .resources
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != exclude)
            .any(|(_, other)| self.unique_key(other).is_some_and(|(k, _)| k == key));
        if taken {
            let name = self.unique_attribute.as_deref().unwrap_or_default();
            return Err(AdapterError::Conflict(format!(
                "{} with {} '{}' already exists",
                self.descriptor.name(),
                name,
                text
            )));
        }
        Ok(())
    }

    /// Stamp id and meta onto `resource`.
    fn stamp(&self, resource: &ScimResource, id: &str, created: DateTime<Utc>) -> AdapterResult<ScimResource> {
        let mut builder = resource.to_builder();

        let id_descriptor = self
            .descriptor
            .attribute("id")
            .ok_or_else(|| AdapterError::Unavailable(format!("{} has no id attribute", self.descriptor.name())))?;
        builder.set_attribute(Attribute::singular(Arc::clone(id_descriptor), id).map_err(AdapterError::backend)?);

        if let Some(meta) = self.descriptor.attribute("meta") {
            let location = self.location_base.as_deref().map(|base| {
                ScimUri::new(base, self.descriptor.endpoint())
                    .with_id(id)
                    .to_string()
            });
            let value = ComplexValue::builder(meta)
                .with("created", created)
                .with("lastModified", Utc::now())
                .with_opt("location", location)
                .build()
                .map_err(AdapterError::backend)?;
            builder.set_attribute(Attribute::singular(Arc::clone(meta), value).map_err(AdapterError::backend)?);
        }
        Ok(builder.build())
    }
}

impl ResourceAdapter for InMemoryAdapter {
    fn resource_type(&self) -> &str {
        self.descriptor.name()
    }

    fn query_endpoint(&self) -> &str {
        self.descriptor.endpoint()
    }

    fn supports_query(&self) -> bool {
        true
    }

    fn fetch(&self, id: &str, selection: &AttributeSelection) -> AdapterResult<Option<ScimResource>> {
        debug!("Fetching {} {}", self.descriptor.name(), id);
        Ok(self.read().resources.get(id).map(|r| r.select(selection)))
    }

    fn create(&self, resource: ScimResource) -> AdapterResult<ScimResource> {
        let mut store = self.write();
        self.check_unique(&store, &resource, None)?;

        let id = uuid::Uuid::new_v4().to_string();
        let stored = self.stamp(&resource, &id, Utc::now())?;
        store.order.push(id.clone());
        store.resources.insert(id.clone(), stored.clone());
        info!("Created {} {}", self.descriptor.name(), id);
        Ok(stored)
    }

    fn replace(&self, id: &str, resource: ScimResource) -> AdapterResult<Option<ScimResource>> {
        let mut store = self.write();
        let Some(existing) = store.resources.get(id) else {
            return Ok(None);
        };
        let created = existing
            .attribute(existing.primary_schema(), "meta")
            .and_then(|meta| meta.singular_value()?.as_complex()?.sub_value("created").cloned())
            .and_then(|created| match created {
                SimpleValue::DateTime(created) => Some(created),
                _ => None,
            })
            .unwrap_or_else(Utc::now);
        self.check_unique(&store, &resource, Some(id))?;

        let stored = self.stamp(&resource, id, created)?;
        store.resources.insert(id.to_string(), stored.clone());
        info!("Replaced {} {}", self.descriptor.name(), id);
        Ok(Some(stored))
    }

    fn delete(&self, id: &str) -> AdapterResult<bool> {
        let mut store = self.write();
        if store.resources.remove(id).is_none() {
            return Ok(false);
        }
        store.order.retain(|existing| existing != id);
        info!("Deleted {} {}", self.descriptor.name(), id);
        Ok(true)
    }

    fn query(&self, query: &QueryDescriptor) -> AdapterResult<QueryResult> {
        let mut matched: Vec<ScimResource> = {
            let store = self.read();
            store
                .order
                .iter()
                .filter_map(|id| store.resources.get(id))
                .filter(|r| query.filter.as_ref().is_none_or(|f| matcher::matches(f, r)))
                .cloned()
                .collect()
        };
        let total_results = matched.len() as u64;

        if let Some(sort) = &query.sort {
            matcher::sort_resources(&mut matched, sort);
        }
        if let Some(page) = &query.page {
            matched = page.apply(matched);
        }
        let resources = matched.iter().map(|r| r.select(&query.selection)).collect();
        debug!(
            "Query on {} matched {} resources",
            self.descriptor.name(),
            total_results
        );
        Ok(QueryResult::new(resources, total_results))
    }

    fn finalize(&self) {
        let mut store = self.write();
        info!(
            "Releasing {} stored {} resources",
            store.order.len(),
            self.descriptor.name()
        );
        store.order.clear();
        store.resources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{AttributePath, Filter, PageSpec, SortSpec, StartIndexPolicy};
    use crate::schema::{CORE_SCHEMA, SchemaRegistry};

    fn adapter(registry: &SchemaRegistry) -> InMemoryAdapter {
        InMemoryAdapter::new(registry.resource_descriptor("User").unwrap())
            .with_unique_attribute("userName")
            .with_location_base("https://example.com/scim")
    }

    fn user(registry: &SchemaRegistry, user_name: &str) -> ScimResource {
        let descriptor = registry.resource_descriptor("User").unwrap();
        ScimResource::builder(&descriptor)
            .with_value(registry.attribute_descriptor(CORE_SCHEMA, "userName").unwrap(), user_name)
            .unwrap()
            .build()
    }

    #[test]
    fn test_create_assigns_id_and_meta() {
        let registry = SchemaRegistry::with_core_schemas().unwrap();
        let adapter = adapter(&registry);
        let created = adapter.create(user(&registry, "bjensen")).unwrap();

        let id = created.id().unwrap().to_string();
        let meta = created.attribute(CORE_SCHEMA, "meta").unwrap().singular_value().unwrap();
        let meta = meta.as_complex().unwrap();
        assert!(meta.sub_value("created").unwrap().as_date_time().is_some());
        assert_eq!(
            meta.sub_value("location").unwrap().as_str().unwrap(),
            format!("https://example.com/scim/Users/{}", id)
        );

        let fetched = adapter.fetch(&id, &AttributeSelection::all()).unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[test]
    fn test_unique_attribute_conflict() {
        let registry = SchemaRegistry::with_core_schemas().unwrap();
        let adapter = adapter(&registry);
        adapter.create(user(&registry, "bjensen")).unwrap();
        assert!(matches!(
            adapter.create(user(&registry, "BJENSEN")),
            Err(AdapterError::Conflict(_))
        ));
    }

    #[test]
    fn test_replace_and_delete() {
        let registry = SchemaRegistry::with_core_schemas().unwrap();
        let adapter = adapter(&registry);
        let created = adapter.create(user(&registry, "bjensen")).unwrap();
        let id = created.id().unwrap().to_string();

        let replaced = adapter.replace(&id, user(&registry, "barbara")).unwrap().unwrap();
        assert_eq!(replaced.id(), Some(id.as_str()));
        assert_eq!(replaced.simple_value("userName").unwrap().as_str(), Some("barbara"));
        assert!(adapter.replace("missing", user(&registry, "x")).unwrap().is_none());

        assert!(adapter.delete(&id).unwrap());
        assert!(!adapter.delete(&id).unwrap());
        assert!(adapter.is_empty());
    }

    #[test]
    fn test_query_filters_sorts_and_pages() {
        let registry = SchemaRegistry::with_core_schemas().unwrap();
        let adapter = adapter(&registry);
        for name in ["carol", "alice", "bob", "dave"] {
            adapter.create(user(&registry, name)).unwrap();
        }

        let query = QueryDescriptor::new()
            .with_filter(Filter::parse(r#"userName ne "dave""#).unwrap())
            .with_sort(SortSpec::ascending(AttributePath::new("userName")))
            .with_page(PageSpec::new(2, Some(5), StartIndexPolicy::Clamp).unwrap())
            .with_selection(AttributeSelection::parse("userName").unwrap());
        let result = adapter.query(&query).unwrap();

        assert_eq!(result.total_results, 3);
        let names: Vec<_> = result
            .resources
            .iter()
            .map(|r| r.simple_value("userName").unwrap().to_text())
            .collect();
        assert_eq!(names, vec!["bob", "carol"]);
        assert!(result.resources[0].id().is_some());
        assert!(result.resources[0].attribute(CORE_SCHEMA, "meta").is_none());
    }
}
