//! Attribute values: simple scalars and complex values.

use super::attribute::Attribute;
use crate::error::{ScimError, ScimResult};
use crate::schema::{AttributeDescriptor, DataType};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleValue {
    String(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    Integer(i64),
}

impl SimpleValue {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Boolean(_) => DataType::Boolean,
            Self::DateTime(_) => DataType::DateTime,
            Self::Binary(_) => DataType::Binary,
            Self::Integer(_) => DataType::Integer,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Text form used by the tag-based format and by string-typed wire
    /// members: RFC 3339 date-times with only the fractional digits needed,
    /// standard base64 for binary.
    pub fn to_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::DateTime(d) => d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Binary(b) => STANDARD.encode(b),
            Self::Integer(i) => i.to_string(),
        }
    }

    /// Parse the text form of a value of `data_type`. `attribute` names the
    /// attribute in the error.
    pub fn from_text(attribute: &str, data_type: DataType, text: &str) -> ScimResult<Self> {
        let mismatch = |actual: &str| ScimError::type_mismatch(attribute, data_type.as_str(), actual);
        match data_type {
            DataType::String => Ok(Self::String(text.to_string())),
            DataType::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    Ok(Self::Boolean(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Self::Boolean(false))
                } else {
                    Err(mismatch(&format!("'{}'", text)))
                }
            }
            DataType::DateTime => DateTime::parse_from_rfc3339(text.trim())
                .map(|d| Self::DateTime(d.with_timezone(&Utc)))
                .map_err(|_| mismatch(&format!("'{}'", text))),
            DataType::Binary => STANDARD
                .decode(text.trim())
                .map(Self::Binary)
                .map_err(|_| mismatch("invalid base64")),
            DataType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| mismatch(&format!("'{}'", text))),
        }
    }
}

impl From<&str> for SimpleValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SimpleValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for SimpleValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for SimpleValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for SimpleValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<u8>> for SimpleValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// A complex value: named sub-attributes, each name at most once.
///
/// Equality ignores sub-attribute order.
#[derive(Debug, Clone, Default)]
pub struct ComplexValue {
    attributes: Vec<Attribute>,
}

impl ComplexValue {
    /// Build from sub-attributes. Fails with
    /// [`ScimError::DuplicateAttribute`] when a name repeats.
    pub fn new(attributes: Vec<Attribute>) -> ScimResult<Self> {
        let mut seen = HashSet::new();
        for attribute in &attributes {
            if !seen.insert(attribute.name()) {
                return Err(ScimError::DuplicateAttribute {
                    attribute: attribute.name().to_string(),
                });
            }
        }
        Ok(Self { attributes })
    }

    /// Start a complex value for the given complex attribute descriptor.
    pub fn builder(descriptor: &AttributeDescriptor) -> ComplexValueBuilder<'_> {
        ComplexValueBuilder {
            descriptor,
            entries: Vec::new(),
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn sub_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Singular simple value of a sub-attribute.
    pub fn sub_value(&self, name: &str) -> Option<&SimpleValue> {
        self.sub_attribute(name)?.singular_value()?.as_simple()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Same value with empty sub-attributes removed.
    pub(crate) fn normalized(self) -> Self {
        Self {
            attributes: self.attributes.into_iter().filter_map(Attribute::normalized).collect(),
        }
    }

    /// Keep only the named sub-attributes.
    pub(crate) fn retain(&self, names: &HashSet<&str>) -> Self {
        Self {
            attributes: self
                .attributes
                .iter()
                .filter(|a| names.contains(a.name()))
                .cloned()
                .collect(),
        }
    }
}

impl PartialEq for ComplexValue {
    fn eq(&self, other: &Self) -> bool {
        self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|a| other.sub_attribute(a.name()) == Some(a))
    }
}

enum Entry {
    Singular(String, SimpleValue),
    Plural(String, Vec<SimpleValue>),
}

/// Builds a [`ComplexValue`] from sub-attribute names, resolving each against
/// the parent descriptor.
pub struct ComplexValueBuilder<'a> {
    descriptor: &'a AttributeDescriptor,
    entries: Vec<Entry>,
}

impl ComplexValueBuilder<'_> {
    pub fn with(mut self, name: &str, value: impl Into<SimpleValue>) -> Self {
        self.entries.push(Entry::Singular(name.to_string(), value.into()));
        self
    }

    /// Set a sub-attribute only when `value` is present.
    pub fn with_opt<V: Into<SimpleValue>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn with_plural(mut self, name: &str, values: Vec<SimpleValue>) -> Self {
        self.entries.push(Entry::Plural(name.to_string(), values));
        self
    }

    pub fn build(self) -> ScimResult<ComplexValue> {
        let parent = self.descriptor;
        let resolve = |name: &str| -> ScimResult<Arc<AttributeDescriptor>> {
            parent.sub_attribute(name).cloned().ok_or_else(|| {
                ScimError::unknown_attribute(parent.schema(), format!("{}.{}", parent.name(), name))
            })
        };

        let mut attributes = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match entry {
                Entry::Singular(name, value) => {
                    attributes.push(Attribute::singular(resolve(&name)?, value)?);
                }
                Entry::Plural(name, values) => {
                    let values = values.into_iter().map(AttributeValue::Simple).collect();
                    attributes.push(Attribute::plural(resolve(&name)?, values)?);
                }
            }
        }
        ComplexValue::new(attributes)
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Simple(SimpleValue),
    Complex(ComplexValue),
}

impl AttributeValue {
    pub fn as_simple(&self) -> Option<&SimpleValue> {
        match self {
            Self::Simple(v) => Some(v),
            Self::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            Self::Complex(v) => Some(v),
            Self::Simple(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_simple()?.as_str()
    }
}

macro_rules! simple_attribute_value {
    ($($source:ty),*) => {
        $(
            impl From<$source> for AttributeValue {
                fn from(value: $source) -> Self {
                    Self::Simple(value.into())
                }
            }
        )*
    };
}

simple_attribute_value!(SimpleValue, &str, String, bool, i64, DateTime<Utc>, Vec<u8>);

impl From<ComplexValue> for AttributeValue {
    fn from(value: ComplexValue) -> Self {
        Self::Complex(value)
    }
}
