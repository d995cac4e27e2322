//! Backend adapters and the registry that routes requests to them.
//!
//! A resource type may be served by several adapters (for example one per
//! backend object class); fetch-by-id asks them in registration order. Each
//! collection endpoint has at most one query adapter.

pub mod adapter;
pub mod in_memory;
pub mod registry;

pub use adapter::{QueryResult, ResourceAdapter};
pub use in_memory::InMemoryAdapter;
pub use registry::ResourceMapperRegistry;
