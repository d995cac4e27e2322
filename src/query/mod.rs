//! Query parameter protocol.
//!
//! Attribute selection, filter expressions, sorting and paging are parsed from
//! a request query string into a [`QueryDescriptor`] that backends execute, and
//! serialized back in a fixed parameter order so generated URIs are stable.
//!
//! ```rust
//! use scim_sdk::query::{QueryDescriptor, ScimUri};
//!
//! let query = QueryDescriptor::parse(r#"filter=userName eq "bjensen"&count=5"#).unwrap();
//! let uri = ScimUri::new("/scim", "Users").with_query(query);
//! assert_eq!(
//!     uri.to_string(),
//!     "/scim/Users?filter=userName+eq+%22bjensen%22&startIndex=1&count=5"
//! );
//! ```

pub mod descriptor;
pub mod filter;
pub mod matcher;
pub mod page;
pub mod path;
pub mod selection;
pub mod sort;
pub mod uri;

pub use descriptor::QueryDescriptor;
pub use filter::{CompareOp, Filter, FilterValue};
pub use page::{PageSpec, StartIndexPolicy};
pub use path::AttributePath;
pub use selection::AttributeSelection;
pub use sort::{SortOrder, SortSpec};
pub use uri::ScimUri;
