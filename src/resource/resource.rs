//! Generic resource instances.
//!
//! A [`ScimResource`] is immutable. Changes go through [`ScimResourceBuilder`],
//! usually obtained from [`ScimResource::to_builder`], and produce a new
//! instance.

use super::attribute::Attribute;
use super::value::{AttributeValue, SimpleValue};
use crate::error::{ScimError, ScimResult};
use crate::query::{AttributePath, AttributeSelection};
use crate::schema::{AttributeDescriptor, ResourceDescriptor};

use std::collections::HashSet;
use std::sync::Arc;

/// Attributes contributed by one schema URI.
#[derive(Debug, Clone)]
struct SchemaAttributes {
    schema: String,
    attributes: Vec<Attribute>,
}

/// One resource instance of a given resource type.
///
/// The primary schema is always present. Extension schemas are present
/// exactly when they contribute at least one attribute, in first-seen order.
#[derive(Debug, Clone)]
pub struct ScimResource {
    resource_type: String,
    schemas: Vec<SchemaAttributes>,
}

impl ScimResource {
    /// Start a resource of the type described by `descriptor`.
    pub fn builder(descriptor: &ResourceDescriptor) -> ScimResourceBuilder {
        ScimResourceBuilder::new(descriptor.name(), descriptor.schema())
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn primary_schema(&self) -> &str {
        &self.schemas[0].schema
    }

    /// Schema URIs present, primary first.
    pub fn schemas(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.schema.as_str()).collect()
    }

    /// Extension schema URIs in first-seen order.
    pub fn extension_schemas(&self) -> impl Iterator<Item = &str> {
        self.schemas[1..].iter().map(|s| s.schema.as_str())
    }

    pub fn attribute(&self, schema: &str, name: &str) -> Option<&Attribute> {
        self.attributes_in_schema(schema)
            .iter()
            .find(|a| a.name() == name)
    }

    /// Attributes of one schema in insertion order; empty when the schema is
    /// not present.
    pub fn attributes_in_schema(&self, schema: &str) -> &[Attribute] {
        self.schemas
            .iter()
            .find(|s| s.schema == schema)
            .map(|s| s.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// Every attribute, primary schema first.
    pub fn all_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.schemas.iter().flat_map(|s| s.attributes.iter())
    }

    /// Attribute named by `path`, resolved against the primary schema when the
    /// path carries no schema URI.
    pub fn attribute_at(&self, path: &AttributePath) -> Option<&Attribute> {
        self.attribute(path.schema_or(self.primary_schema()), path.attribute())
    }

    /// Singular simple value of a primary-schema attribute.
    pub fn simple_value(&self, name: &str) -> Option<&SimpleValue> {
        self.attribute(self.primary_schema(), name)?
            .singular_value()?
            .as_simple()
    }

    /// The resource id, when present.
    pub fn id(&self) -> Option<&str> {
        self.simple_value("id")?.as_str()
    }

    pub fn to_builder(&self) -> ScimResourceBuilder {
        ScimResourceBuilder {
            resource_type: self.resource_type.clone(),
            schemas: self.schemas.clone(),
        }
    }

    /// Project onto `selection`. Paths with a sub-attribute keep only that
    /// sub-attribute of complex values. The `id` attribute is always kept.
    pub fn select(&self, selection: &AttributeSelection) -> ScimResource {
        if selection.is_all() {
            return self.clone();
        }
        let primary = self.primary_schema().to_string();

        let mut builder = ScimResourceBuilder::new(&self.resource_type, &primary);
        for attribute in self.all_attributes() {
            let matching: Vec<&AttributePath> = selection
                .paths()
                .iter()
                .filter(|p| p.schema_or(&primary) == attribute.schema() && p.attribute() == attribute.name())
                .collect();

            let keep_whole = (attribute.schema() == primary && attribute.name() == "id")
                || matching.iter().any(|p| p.sub_attribute().is_none());
            if keep_whole {
                builder.set_attribute(attribute.clone());
                continue;
            }
            if matching.is_empty() {
                continue;
            }

            let subs: HashSet<&str> = matching.iter().filter_map(|p| p.sub_attribute()).collect();
            if let Some(projected) = attribute.project(|complex| complex.retain(&subs)) {
                builder.set_attribute(projected);
            }
        }
        builder.build()
    }

    /// New resource where every attribute of `changes` replaces the attribute
    /// with the same schema and name.
    pub fn merge(&self, changes: &ScimResource) -> ScimResource {
        let mut builder = self.to_builder();
        for attribute in changes.all_attributes() {
            builder.set_attribute(attribute.clone());
        }
        builder.build()
    }
}

impl PartialEq for ScimResource {
    /// Same resource type, same schema set and equal attributes per schema;
    /// attribute order within a schema is not significant.
    fn eq(&self, other: &Self) -> bool {
        if self.resource_type != other.resource_type || self.schemas.len() != other.schemas.len() {
            return false;
        }
        self.schemas.iter().all(|mine| {
            let theirs = other.attributes_in_schema(&mine.schema);
            other.schemas.iter().any(|s| s.schema == mine.schema)
                && theirs.len() == mine.attributes.len()
                && mine
                    .attributes
                    .iter()
                    .all(|a| theirs.iter().any(|b| b.name() == a.name() && b == a))
        })
    }
}

/// Builder for [`ScimResource`].
#[derive(Debug, Clone)]
pub struct ScimResourceBuilder {
    resource_type: String,
    schemas: Vec<SchemaAttributes>,
}

impl ScimResourceBuilder {
    pub fn new(resource_type: impl Into<String>, primary_schema: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            schemas: vec![SchemaAttributes {
                schema: primary_schema.into(),
                attributes: Vec::new(),
            }],
        }
    }

    fn bucket(&mut self, schema: &str) -> &mut Vec<Attribute> {
        let index = match self.schemas.iter().position(|s| s.schema == schema) {
            Some(index) => index,
            None => {
                self.schemas.push(SchemaAttributes {
                    schema: schema.to_string(),
                    attributes: Vec::new(),
                });
                self.schemas.len() - 1
            }
        };
        &mut self.schemas[index].attributes
    }

    /// Add an attribute. Fails with [`ScimError::DuplicateAttribute`] when
    /// the schema already holds an attribute of that name.
    pub fn add_attribute(&mut self, attribute: Attribute) -> ScimResult<()> {
        let bucket = self.bucket(attribute.schema());
        if bucket.iter().any(|a| a.name() == attribute.name()) {
            return Err(ScimError::DuplicateAttribute {
                attribute: attribute.name().to_string(),
            });
        }
        bucket.push(attribute);
        Ok(())
    }

    /// Fluent form of [`add_attribute`](Self::add_attribute).
    pub fn with_attribute(mut self, attribute: Attribute) -> ScimResult<Self> {
        self.add_attribute(attribute)?;
        Ok(self)
    }

    /// Add a singular attribute built from `descriptor` and `value`.
    pub fn with_value(
        self,
        descriptor: Arc<AttributeDescriptor>,
        value: impl Into<AttributeValue>,
    ) -> ScimResult<Self> {
        self.with_attribute(Attribute::singular(descriptor, value)?)
    }

    /// Add or replace an attribute, keeping the position of a replaced one.
    pub fn set_attribute(&mut self, attribute: Attribute) {
        let bucket = self.bucket(attribute.schema());
        match bucket.iter_mut().find(|a| a.name() == attribute.name()) {
            Some(existing) => *existing = attribute,
            None => bucket.push(attribute),
        }
    }

    pub fn remove_attribute(&mut self, schema: &str, name: &str) -> Option<Attribute> {
        let entry = self.schemas.iter_mut().find(|s| s.schema == schema)?;
        let index = entry.attributes.iter().position(|a| a.name() == name)?;
        Some(entry.attributes.remove(index))
    }

    /// Finish the resource. Empty complex values and empty plural attributes
    /// are dropped, and so are extension schemas left without attributes.
    pub fn build(mut self) -> ScimResource {
        for entry in &mut self.schemas {
            entry.attributes = std::mem::take(&mut entry.attributes)
                .into_iter()
                .filter_map(Attribute::normalized)
                .collect();
        }
        let mut index = 0;
        self.schemas.retain(|entry| {
            let keep = index == 0 || !entry.attributes.is_empty();
            index += 1;
            keep
        });
        ScimResource {
            resource_type: self.resource_type,
            schemas: self.schemas,
        }
    }
}
