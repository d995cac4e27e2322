//! Backend adapter interface.

use crate::error::{AdapterError, AdapterResult};
use crate::query::{AttributeSelection, QueryDescriptor};
use crate::resource::ScimResource;

/// One page of query results plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub resources: Vec<ScimResource>,
    pub total_results: u64,
}

impl QueryResult {
    pub fn new(resources: Vec<ScimResource>, total_results: u64) -> Self {
        Self {
            resources,
            total_results,
        }
    }
}

/// Executes create, read, update, delete and query operations for one
/// resource type against a backend.
///
/// Calls are synchronous and may block; the server runs them off the async
/// executor. Failures are reported, never retried by the caller.
///
/// ```rust
/// use scim_sdk::error::AdapterResult;
/// use scim_sdk::mapper::ResourceAdapter;
/// use scim_sdk::query::AttributeSelection;
/// use scim_sdk::resource::ScimResource;
///
/// struct ReadOnlyDirectory;
///
/// impl ResourceAdapter for ReadOnlyDirectory {
///     fn resource_type(&self) -> &str { "User" }
///     fn query_endpoint(&self) -> &str { "Users" }
///     fn fetch(&self, _id: &str, _selection: &AttributeSelection) -> AdapterResult<Option<ScimResource>> {
///         Ok(None)
///     }
///     fn create(&self, resource: ScimResource) -> AdapterResult<ScimResource> { Ok(resource) }
///     fn replace(&self, _id: &str, _resource: ScimResource) -> AdapterResult<Option<ScimResource>> {
///         Ok(None)
///     }
///     fn delete(&self, _id: &str) -> AdapterResult<bool> { Ok(false) }
/// }
/// ```
pub trait ResourceAdapter: Send + Sync {
    /// Resource type served, e.g. `User`.
    fn resource_type(&self) -> &str;

    /// Collection endpoint this adapter queries, e.g. `Users`.
    fn query_endpoint(&self) -> &str;

    fn supports_query(&self) -> bool {
        false
    }

    /// Fetch one resource. `Ok(None)` means no resource with that id.
    fn fetch(&self, id: &str, selection: &AttributeSelection) -> AdapterResult<Option<ScimResource>>;

    /// Store a new resource and return it as stored.
    fn create(&self, resource: ScimResource) -> AdapterResult<ScimResource>;

    /// Replace a resource. `Ok(None)` means no resource with that id.
    fn replace(&self, id: &str, resource: ScimResource) -> AdapterResult<Option<ScimResource>>;

    /// Delete a resource. `Ok(false)` means no resource with that id.
    fn delete(&self, id: &str) -> AdapterResult<bool>;

    /// Execute a query. Only called when [`supports_query`](Self::supports_query)
    /// is true.
    fn query(&self, _query: &QueryDescriptor) -> AdapterResult<QueryResult> {
        Err(AdapterError::Unavailable(format!(
            "{} adapter does not support queries",
            self.resource_type()
        )))
    }

    /// Release backend resources. Called once at shutdown.
    fn finalize(&self) {}
}
