//! Schema registry and descriptors for SCIM resources.
//!
//! Descriptors decide how the generic resource model is interpreted: whether
//! an attribute is plural or complex, which value type it carries, and the
//! order in which codecs emit primary-schema attributes.
//!
//! # Key Types
//!
//! - [`SchemaRegistry`] - Registry of resource and attribute descriptors
//! - [`ResourceDescriptor`] - Resource type with its ordered attribute list
//! - [`AttributeDescriptor`] - Attribute identified by (schema URI, name)
//!
//! # Examples
//!
//! ```rust
//! use scim_sdk::schema::SchemaRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::with_core_schemas()?;
//! let user = registry.resource_descriptor("User").expect("core User");
//! assert_eq!(user.endpoint(), "Users");
//! # Ok(())
//! # }
//! ```

pub mod embedded;
mod loader;
pub mod registry;
pub mod types;


pub use embedded::{CORE_SCHEMA, ENTERPRISE_EXTENSION};
pub use registry::SchemaRegistry;
pub use types::{AttributeDescriptor, AttributeDescriptorBuilder, DataType, ResourceDescriptor};
