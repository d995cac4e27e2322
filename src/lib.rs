//! SCIM protocol SDK for Rust.
//!
//! Schema-extensible resources (users, groups, service-provider metadata) are
//! held in a generic attribute model driven by a schema registry, marshalled
//! losslessly to and from JSON and XML, and queried through a
//! backend-neutral selection, filter, sort and paging model.
//!
//! # Core Components
//!
//! - [`SchemaRegistry`] - Resource and attribute descriptors
//! - [`ScimResource`] - Generic resource instance
//! - [`JsonCodec`] / [`XmlCodec`] - The two wire formats
//! - [`QueryDescriptor`] - Parsed `attributes`, `filter`, `sortBy` and paging parameters
//! - [`ResourceAdapter`] - Trait for implementing storage backends
//! - [`ScimServer`] - Transport-neutral HTTP binding
//! - [`ScimClient`] - Client for a SCIM service
//!
//! # Quick Start
//!
//! ```rust
//! use scim_sdk::{InMemoryAdapter, Method, ScimRequest, ScimServerBuilder, SchemaRegistry};
//! use scim_sdk::marshal::MediaType;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schemas = Arc::new(SchemaRegistry::with_core_schemas()?);
//! let users = InMemoryAdapter::new(schemas.resource_descriptor("User").unwrap());
//! let server = ScimServerBuilder::new()
//!     .with_schema_registry(schemas)
//!     .with_base_uri("/scim")
//!     .with_adapter(Arc::new(users))
//!     .build()?;
//!
//! let body = br#"{"schemas":["urn:scim:schemas:core:1.0"],"userName":"bjensen"}"#.to_vec();
//! let response = server
//!     .handle(ScimRequest::new(Method::Post, "/scim/Users").with_body(MediaType::Json, body))
//!     .await;
//! assert_eq!(response.status, 201);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod marshal;
pub mod query;
pub mod resource;
pub mod schema;
pub mod server;
pub mod service_provider;
mod snapshot;

// Re-export commonly used types for convenience
pub use client::{HttpTransport, LocalTransport, ScimClient};
pub use config::ServerConfig;
pub use error::{AdapterError, AdapterResult, BuildError, ConfigError, ScimError, ScimResult};
pub use mapper::{InMemoryAdapter, QueryResult, ResourceAdapter, ResourceMapperRegistry};
pub use marshal::{Codec, ErrorEntry, JsonCodec, ListResponse, MediaType, ScimDocument, XmlCodec};
pub use query::{AttributePath, AttributeSelection, Filter, PageSpec, QueryDescriptor, ScimUri, SortSpec};
pub use resource::{Attribute, AttributeValue, ComplexValue, ScimResource, SimpleValue};
pub use schema::{AttributeDescriptor, DataType, ResourceDescriptor, SchemaRegistry};
pub use server::{Method, ScimRequest, ScimResponse, ScimServer, ScimServerBuilder};
pub use service_provider::{AuthenticationScheme, ServiceProviderConfig};
