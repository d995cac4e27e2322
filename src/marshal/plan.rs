//! Format-neutral encode ordering and decode-side schema resolution.
//!
//! Both codecs walk a resource through [`EmissionPlan`] so that attribute and
//! schema order are identical across formats, and rebuild attributes through
//! [`Resolver`] so that unknown-attribute handling is identical too.

use crate::error::{ScimError, ScimResult};
use crate::resource::{Attribute, AttributeValue, ComplexValue, ScimResource};
use crate::schema::{AttributeDescriptor, ResourceDescriptor, SchemaRegistry};

use log::warn;
use std::sync::Arc;

/// Attributes of one resource in emission order.
pub(crate) struct EmissionPlan<'a> {
    pub primary_schema: &'a str,
    pub primary: Vec<&'a Attribute>,
    /// Extension schemas in first-seen order with their attributes in
    /// insertion order.
    pub extensions: Vec<(&'a str, &'a [Attribute])>,
}

impl<'a> EmissionPlan<'a> {
    /// Order `resource` for emission. Primary attributes follow the resource
    /// descriptor; attributes it does not list come after, in insertion order.
    /// Without a descriptor insertion order is used throughout.
    pub fn new(registry: &SchemaRegistry, resource: &'a ScimResource) -> Self {
        let primary_schema = resource.primary_schema();
        let present = resource.attributes_in_schema(primary_schema);

        let primary = match registry.resource_descriptor(resource.resource_type()) {
            Some(descriptor) => {
                let mut ordered: Vec<&Attribute> = descriptor
                    .attributes()
                    .iter()
                    .filter_map(|d| present.iter().find(|a| a.name() == d.name()))
                    .collect();
                ordered.extend(present.iter().filter(|a| descriptor.attribute(a.name()).is_none()));
                ordered
            }
            None => present.iter().collect(),
        };

        let extensions = resource
            .extension_schemas()
            .map(|schema| (schema, resource.attributes_in_schema(schema)))
            .collect();

        Self {
            primary_schema,
            primary,
            extensions,
        }
    }
}

/// Sub-attributes of a complex value in declaration order, followed by any
/// the descriptor does not declare.
pub(crate) fn ordered_sub_attributes<'a>(
    descriptor: &AttributeDescriptor,
    value: &'a ComplexValue,
) -> Vec<&'a Attribute> {
    let mut ordered: Vec<&Attribute> = descriptor
        .sub_attributes()
        .iter()
        .filter_map(|sub| value.sub_attribute(sub.name()))
        .collect();
    ordered.extend(
        value
            .attributes()
            .iter()
            .filter(|a| descriptor.sub_attribute(a.name()).is_none()),
    );
    ordered
}

/// Registry lookups performed while decoding, applying strict or lenient
/// handling of names the registry does not know.
#[derive(Clone, Copy)]
pub(crate) struct Resolver<'a> {
    pub registry: &'a SchemaRegistry,
    pub strict: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a SchemaRegistry, strict: bool) -> Self {
        Self { registry, strict }
    }

    pub fn resource(&self, resource_type: &str) -> ScimResult<Arc<ResourceDescriptor>> {
        self.registry
            .resource_descriptor(resource_type)
            .ok_or_else(|| ScimError::UnsupportedResourceType(resource_type.to_string()))
    }

    /// Descriptor of a top-level attribute. `Ok(None)` means drop it.
    pub fn attribute(&self, schema: &str, name: &str) -> ScimResult<Option<Arc<AttributeDescriptor>>> {
        match self.registry.attribute_descriptor(schema, name) {
            Some(descriptor) => Ok(Some(descriptor)),
            None => self.unknown(schema, name.to_string()),
        }
    }

    /// Descriptor of a sub-attribute of `parent`. `Ok(None)` means drop it.
    pub fn sub_attribute(
        &self,
        parent: &AttributeDescriptor,
        name: &str,
    ) -> ScimResult<Option<Arc<AttributeDescriptor>>> {
        match parent.sub_attribute(name) {
            Some(descriptor) => Ok(Some(Arc::clone(descriptor))),
            None => self.unknown(parent.schema(), format!("{}.{}", parent.name(), name)),
        }
    }

    /// Handle an unknown attribute: an error in strict mode, dropped with a
    /// warning otherwise.
    pub fn unknown<T>(&self, schema: &str, attribute: String) -> ScimResult<Option<T>> {
        if self.strict {
            return Err(ScimError::unknown_attribute(schema, attribute));
        }
        warn!("Dropping unknown attribute '{}' of schema '{}'", attribute, schema);
        Ok(None)
    }
}

/// Assemble a decoded attribute. A plural attribute without values is absent;
/// a singular one must have exactly one value.
pub(crate) fn assemble(
    descriptor: Arc<AttributeDescriptor>,
    mut values: Vec<AttributeValue>,
) -> ScimResult<Option<Attribute>> {
    if descriptor.is_plural() {
        if values.is_empty() {
            return Ok(None);
        }
        return Attribute::plural(descriptor, values).map(Some);
    }
    match values.len() {
        0 => Ok(None),
        1 => Attribute::singular(descriptor, values.remove(0)).map(Some),
        _ => Err(ScimError::PluralityMismatch {
            attribute: descriptor.name().to_string(),
            expected: "singular",
        }),
    }
}
