//! HTTP binding of the protocol, independent of any HTTP stack.
//!
//! | Method | Target | Operation |
//! |---|---|---|
//! | GET | `/<Endpoint>/<id>` | fetch, 404 when no adapter has it |
//! | GET | `/<Endpoint>?filter=..` | query through the endpoint's query adapter |
//! | POST | `/<Endpoint>` | create, 201 with `Location` |
//! | PUT | `/<Endpoint>/<id>` | replace |
//! | PATCH | `/<Endpoint>/<id>` | merge the body over the stored resource |
//! | DELETE | `/<Endpoint>/<id>` | delete |
//! | GET | `/ServiceProviderConfigs` | service provider metadata |
//!
//! POST may carry a method-override header naming PUT, PATCH or DELETE.
//! Responses carry weak `ETag`s; writes honor `If-Match`.

pub mod builder;
pub mod etag;
pub mod handler;
pub mod request;

pub use builder::ScimServerBuilder;
pub use etag::EntityTag;
pub use handler::ScimServer;
pub use request::{Headers, Method, ScimRequest, ScimResponse};
