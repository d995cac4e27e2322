//! Attribute and resource descriptors.
//!
//! Descriptors are immutable once built. The registry hands them out behind
//! `Arc` so resource instances can reference the descriptor they were built
//! from without copying it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Value type of a simple attribute or sub-attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    /// String value
    #[default]
    String,
    /// Boolean value
    Boolean,
    /// DateTime in RFC3339 format
    DateTime,
    /// Binary data (base64 encoded on the wire)
    Binary,
    /// Integer number
    Integer,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::Integer => "integer",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one attribute, identified by (schema URI, name).
///
/// A descriptor with sub-attributes describes complex values. Sub-attribute
/// descriptors share their parent's schema and are never complex themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    schema: String,
    name: String,
    description: String,
    data_type: DataType,
    plural: bool,
    required: bool,
    case_exact: bool,
    plural_element: Option<String>,
    sub_attributes: Vec<Arc<AttributeDescriptor>>,
}

impl AttributeDescriptor {
    /// Start building a descriptor for `name` in `schema`.
    pub fn builder(schema: impl Into<String>, name: impl Into<String>) -> AttributeDescriptorBuilder {
        AttributeDescriptorBuilder {
            descriptor: AttributeDescriptor {
                schema: schema.into(),
                name: name.into(),
                description: String::new(),
                data_type: DataType::String,
                plural: false,
                required: false,
                case_exact: false,
                plural_element: None,
                sub_attributes: Vec::new(),
            },
        }
    }

    /// Singular simple attribute of the given type.
    pub fn simple(schema: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self::builder(schema, name).data_type(data_type).build()
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_plural(&self) -> bool {
        self.plural
    }

    pub fn is_complex(&self) -> bool {
        !self.sub_attributes.is_empty()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_case_exact(&self) -> bool {
        self.case_exact
    }

    /// Sub-attribute descriptors in declaration order.
    pub fn sub_attributes(&self) -> &[Arc<AttributeDescriptor>] {
        &self.sub_attributes
    }

    pub fn sub_attribute(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.sub_attributes.iter().find(|sub| sub.name == name)
    }

    /// Element name used for each value of a plural attribute in the tag
    /// format, e.g. `email` for `emails`.
    pub fn plural_element(&self) -> &str {
        match &self.plural_element {
            Some(element) => element,
            None => self.name.strip_suffix('s').filter(|s| !s.is_empty()).unwrap_or(&self.name),
        }
    }

    /// Human readable kind, used in error messages.
    pub fn kind(&self) -> String {
        let shape = if self.plural { "plural" } else { "singular" };
        if self.is_complex() {
            format!("{} complex", shape)
        } else {
            format!("{} {}", shape, self.data_type)
        }
    }
}

/// Fluent builder for [`AttributeDescriptor`].
#[derive(Debug, Clone)]
pub struct AttributeDescriptorBuilder {
    descriptor: AttributeDescriptor,
}

impl AttributeDescriptorBuilder {
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.descriptor.data_type = data_type;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    pub fn plural(mut self) -> Self {
        self.descriptor.plural = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.descriptor.required = true;
        self
    }

    pub fn case_exact(mut self) -> Self {
        self.descriptor.case_exact = true;
        self
    }

    pub fn plural_element(mut self, element: impl Into<String>) -> Self {
        self.descriptor.plural_element = Some(element.into());
        self
    }

    /// Append a singular simple sub-attribute.
    pub fn sub_attribute(self, name: impl Into<String>, data_type: DataType) -> Self {
        let schema = self.descriptor.schema.clone();
        self.push_sub(AttributeDescriptor::simple(schema, name, data_type))
    }

    /// Append a plural simple sub-attribute.
    pub fn plural_sub_attribute(self, name: impl Into<String>, data_type: DataType) -> Self {
        let schema = self.descriptor.schema.clone();
        let sub = AttributeDescriptor::builder(schema, name)
            .data_type(data_type)
            .plural()
            .build();
        self.push_sub(sub)
    }

    /// Append a fully described sub-attribute. Its schema is forced to the
    /// parent's and any nested sub-attributes are discarded.
    pub(crate) fn sub_attribute_descriptor(self, mut sub: AttributeDescriptor) -> Self {
        sub.schema = self.descriptor.schema.clone();
        sub.sub_attributes.clear();
        self.push_sub(sub)
    }

    fn push_sub(mut self, sub: AttributeDescriptor) -> Self {
        self.descriptor.sub_attributes.push(Arc::new(sub));
        self
    }

    pub fn build(self) -> AttributeDescriptor {
        self.descriptor
    }
}

/// Descriptor of a resource type such as `User`.
///
/// The attribute list is ordered: encoders emit primary-schema attributes in
/// exactly this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    name: String,
    schema: String,
    endpoint: String,
    description: String,
    attributes: Vec<Arc<AttributeDescriptor>>,
}

impl ResourceDescriptor {
    /// New descriptor whose query endpoint defaults to the plural of `name`.
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            endpoint: format!("{}s", name),
            name,
            schema: schema.into(),
            description: String::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an attribute to the ordered attribute list.
    pub fn with_attribute(mut self, descriptor: impl Into<Arc<AttributeDescriptor>>) -> Self {
        self.attributes.push(descriptor.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The primary schema URI.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn attributes(&self) -> &[Arc<AttributeDescriptor>] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attributes.iter().find(|a| a.name() == name)
    }
}
