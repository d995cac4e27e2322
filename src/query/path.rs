//! Attribute paths of the form `[schemaURI:]attribute[.subAttribute]`.

use crate::error::{ScimError, ScimResult};
use crate::schema::{AttributeDescriptor, ResourceDescriptor, SchemaRegistry};

use std::fmt;
use std::sync::Arc;

/// Reference to an attribute or sub-attribute.
///
/// A path without a schema URI refers to the primary schema of the resource
/// it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    schema: Option<String>,
    attribute: String,
    sub_attribute: Option<String>,
}

impl AttributePath {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            schema: None,
            attribute: attribute.into(),
            sub_attribute: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_sub_attribute(mut self, sub_attribute: impl Into<String>) -> Self {
        self.sub_attribute = Some(sub_attribute.into());
        self
    }

    /// Parse a path. `parameter` names the query parameter in errors.
    pub fn parse(text: &str, parameter: &str) -> ScimResult<Self> {
        let text = text.trim();
        let (schema, rest) = match text.rsplit_once(':') {
            Some((schema, rest)) if !schema.is_empty() => (Some(schema), rest),
            Some(_) => return Err(invalid_path(parameter, text)),
            None => (None, text),
        };
        let (attribute, sub_attribute) = match rest.split_once('.') {
            Some((attribute, sub)) => (attribute, Some(sub)),
            None => (rest, None),
        };

        if !is_name(attribute) || sub_attribute.is_some_and(|sub| !is_name(sub)) {
            return Err(invalid_path(parameter, text));
        }

        Ok(Self {
            schema: schema.map(str::to_string),
            attribute: attribute.to_string(),
            sub_attribute: sub_attribute.map(str::to_string),
        })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Schema URI the path refers to when applied to a resource whose primary
    /// schema is `primary`.
    pub fn schema_or<'a>(&'a self, primary: &'a str) -> &'a str {
        self.schema.as_deref().unwrap_or(primary)
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn sub_attribute(&self) -> Option<&str> {
        self.sub_attribute.as_deref()
    }

    /// Resolve the attribute descriptor this path names, for the given
    /// resource type. Returns the top-level descriptor together with the
    /// sub-attribute descriptor when the path has one.
    pub fn resolve(
        &self,
        registry: &SchemaRegistry,
        resource: &ResourceDescriptor,
    ) -> Option<(Arc<AttributeDescriptor>, Option<Arc<AttributeDescriptor>>)> {
        let descriptor = registry.attribute_descriptor(self.schema_or(resource.schema()), &self.attribute)?;
        match &self.sub_attribute {
            Some(sub) => {
                let sub = descriptor.sub_attribute(sub)?.clone();
                Some((descriptor, Some(sub)))
            }
            None => Some((descriptor, None)),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}:", schema)?;
        }
        f.write_str(&self.attribute)?;
        if let Some(sub) = &self.sub_attribute {
            write!(f, ".{}", sub)?;
        }
        Ok(())
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$')
}

fn invalid_path(parameter: &str, text: &str) -> ScimError {
    ScimError::invalid_parameter(parameter, format!("'{}' is not a valid attribute path", text))
}
