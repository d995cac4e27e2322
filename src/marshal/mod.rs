//! Schema-bound codecs between wire documents and the generic model.
//!
//! Two codecs implement [`Codec`]: [`JsonCodec`] for the key-value format and
//! [`XmlCodec`] for the tag/namespace format. Both consult the
//! [`SchemaRegistry`](crate::schema::SchemaRegistry) at every step. Encoding
//! orders primary-schema attributes by the resource descriptor and groups
//! extension attributes by schema in first-seen order. Decoding rebuilds each
//! attribute from its descriptor and drops attributes the registry does not
//! know, unless the codec is strict.
//!
//! ```rust
//! use scim_sdk::marshal::{Codec, JsonCodec};
//! use scim_sdk::schema::{CORE_SCHEMA, SchemaRegistry};
//! use scim_sdk::resource::ScimResource;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SchemaRegistry::with_core_schemas().unwrap());
//! let user = registry.resource_descriptor("User").unwrap();
//! let resource = ScimResource::builder(&user)
//!     .with_value(registry.attribute_descriptor(CORE_SCHEMA, "userName").unwrap(), "bjensen")
//!     .unwrap()
//!     .build();
//!
//! let codec = JsonCodec::new(registry);
//! let bytes = codec.encode(&resource).unwrap();
//! assert_eq!(codec.decode(&bytes, "User").unwrap(), resource);
//! ```

pub mod document;
pub mod json;
pub mod media;
mod plan;
pub mod xml;

pub use document::{ErrorEntry, ListResponse, ScimDocument};
pub use json::JsonCodec;
pub use media::MediaType;
pub use xml::XmlCodec;

use crate::error::{ScimError, ScimResult};
use crate::resource::ScimResource;

use std::slice;

/// Contract shared by both wire formats.
pub trait Codec: Send + Sync {
    fn media_type(&self) -> MediaType;

    /// Encode a single resource.
    fn encode(&self, resource: &ScimResource) -> ScimResult<Vec<u8>>;

    /// Encode a collection response.
    fn encode_list(&self, list: &ListResponse) -> ScimResult<Vec<u8>>;

    /// Encode an error document.
    fn encode_errors(&self, errors: &[ErrorEntry]) -> ScimResult<Vec<u8>>;

    /// Decode any top-level document. `resource_type` names the type of a
    /// single resource, and of list elements that carry no type
    /// discriminator, when the document itself does not say.
    fn decode_document(&self, bytes: &[u8], resource_type: Option<&str>) -> ScimResult<ScimDocument>;

    fn encode_error(&self, error: &ErrorEntry) -> ScimResult<Vec<u8>> {
        self.encode_errors(slice::from_ref(error))
    }

    /// Decode a single resource of `resource_type`.
    fn decode(&self, bytes: &[u8], resource_type: &str) -> ScimResult<ScimResource> {
        match self.decode_document(bytes, Some(resource_type))? {
            ScimDocument::Resource(resource) => Ok(resource),
            ScimDocument::List(_) => Err(ScimError::malformed("expected a resource, found a list response")),
            ScimDocument::Errors(_) => Err(ScimError::malformed("expected a resource, found an error response")),
        }
    }
}
