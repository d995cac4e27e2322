//! Generic, schema-agnostic resource model.
//!
//! A resource is a resource-type name plus attributes grouped by schema URI.
//! Attributes are singular or plural as their descriptor dictates, and each
//! value is either a simple scalar or a complex value made of sub-attributes.
//!
//! # Key Components
//!
//! * [`ScimResource`] - Immutable resource instance
//! * [`ScimResourceBuilder`] - Construction and copy-on-write changes
//! * [`Attribute`] - Attribute bound to its descriptor
//! * [`AttributeValue`] - Simple or complex value

pub mod attribute;
pub mod resource;
pub mod value;

pub use attribute::{Attribute, AttributeValues};
pub use resource::{ScimResource, ScimResourceBuilder};
pub use value::{AttributeValue, ComplexValue, ComplexValueBuilder, SimpleValue};
