//! Singular and plural attributes bound to their descriptors.

use super::value::{AttributeValue, ComplexValue};
use crate::error::{ScimError, ScimResult};
use crate::schema::AttributeDescriptor;

use std::slice;
use std::sync::Arc;

/// Values held by an attribute. Which variant is legal is decided by the
/// descriptor, never by the instance.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    Singular(AttributeValue),
    Plural(Vec<AttributeValue>),
}

/// An attribute instance: a descriptor plus one value or a sequence of values.
#[derive(Debug, Clone)]
pub struct Attribute {
    descriptor: Arc<AttributeDescriptor>,
    values: AttributeValues,
}

impl Attribute {
    /// Singular attribute. Fails when the descriptor is plural or the value
    /// does not match the declared type.
    pub fn singular(descriptor: Arc<AttributeDescriptor>, value: impl Into<AttributeValue>) -> ScimResult<Self> {
        if descriptor.is_plural() {
            return Err(ScimError::PluralityMismatch {
                attribute: descriptor.name().to_string(),
                expected: "plural",
            });
        }
        let value = value.into();
        check_value(&descriptor, &value)?;
        Ok(Self {
            descriptor,
            values: AttributeValues::Singular(value),
        })
    }

    /// Plural attribute. Zero values are accepted here; resource builders and
    /// codecs treat an empty plural attribute as absent.
    pub fn plural(descriptor: Arc<AttributeDescriptor>, values: Vec<AttributeValue>) -> ScimResult<Self> {
        if !descriptor.is_plural() {
            return Err(ScimError::PluralityMismatch {
                attribute: descriptor.name().to_string(),
                expected: "singular",
            });
        }
        for value in &values {
            check_value(&descriptor, value)?;
        }
        Ok(Self {
            descriptor,
            values: AttributeValues::Plural(values),
        })
    }

    pub fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn schema(&self) -> &str {
        self.descriptor.schema()
    }

    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    pub fn is_plural(&self) -> bool {
        matches!(self.values, AttributeValues::Plural(_))
    }

    /// True for a plural attribute holding no values.
    pub fn is_empty(&self) -> bool {
        matches!(&self.values, AttributeValues::Plural(values) if values.is_empty())
    }

    pub fn singular_value(&self) -> Option<&AttributeValue> {
        match &self.values {
            AttributeValues::Singular(value) => Some(value),
            AttributeValues::Plural(_) => None,
        }
    }

    /// Every value: one for a singular attribute, all of them for a plural one.
    pub fn all_values(&self) -> &[AttributeValue] {
        match &self.values {
            AttributeValues::Singular(value) => slice::from_ref(value),
            AttributeValues::Plural(values) => values,
        }
    }

    /// The attribute without empty complex values or empty plurals, or `None`
    /// when nothing is left.
    pub(crate) fn normalized(self) -> Option<Self> {
        let keep = |value: AttributeValue| match value {
            AttributeValue::Complex(complex) => {
                let complex = complex.normalized();
                (!complex.is_empty()).then_some(AttributeValue::Complex(complex))
            }
            simple => Some(simple),
        };
        let values = match self.values {
            AttributeValues::Singular(value) => AttributeValues::Singular(keep(value)?),
            AttributeValues::Plural(values) => {
                let kept: Vec<_> = values.into_iter().filter_map(keep).collect();
                if kept.is_empty() {
                    return None;
                }
                AttributeValues::Plural(kept)
            }
        };
        Some(Self {
            descriptor: self.descriptor,
            values,
        })
    }

    /// Same attribute with each complex value mapped through `project`;
    /// values that come back empty are dropped. Returns `None` when nothing
    /// is left.
    pub(crate) fn project(&self, project: impl Fn(&ComplexValue) -> ComplexValue) -> Option<Self> {
        let map = |value: &AttributeValue| match value {
            AttributeValue::Complex(complex) => {
                let projected = project(complex);
                (!projected.is_empty()).then_some(AttributeValue::Complex(projected))
            }
            AttributeValue::Simple(_) => None,
        };
        let values = match &self.values {
            AttributeValues::Singular(value) => AttributeValues::Singular(map(value)?),
            AttributeValues::Plural(values) => {
                let kept: Vec<_> = values.iter().filter_map(map).collect();
                if kept.is_empty() {
                    return None;
                }
                AttributeValues::Plural(kept)
            }
        };
        Some(Self {
            descriptor: Arc::clone(&self.descriptor),
            values,
        })
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.schema() == other.schema() && self.name() == other.name() && self.values == other.values
    }
}

fn check_value(descriptor: &AttributeDescriptor, value: &AttributeValue) -> ScimResult<()> {
    match value {
        AttributeValue::Simple(simple) => {
            if descriptor.is_complex() {
                return Err(ScimError::type_mismatch(
                    descriptor.name(),
                    "complex",
                    simple.data_type().as_str(),
                ));
            }
            if simple.data_type() != descriptor.data_type() {
                return Err(ScimError::type_mismatch(
                    descriptor.name(),
                    descriptor.data_type().as_str(),
                    simple.data_type().as_str(),
                ));
            }
        }
        AttributeValue::Complex(complex) => {
            if !descriptor.is_complex() {
                return Err(ScimError::type_mismatch(
                    descriptor.name(),
                    descriptor.data_type().as_str(),
                    "complex",
                ));
            }
            for sub in complex.attributes() {
                if descriptor.sub_attribute(sub.name()).is_none() {
                    return Err(ScimError::unknown_attribute(
                        descriptor.schema(),
                        format!("{}.{}", descriptor.name(), sub.name()),
                    ));
                }
            }
        }
    }
    Ok(())
}
