//! Client side of the HTTP binding.
//!
//! [`ScimClient`] builds requests (URI with query string, `Accept`, body in
//! the chosen format, optional method override and basic credentials), hands
//! them to an [`HttpTransport`] and interprets the responses. Error documents
//! returned by the service become [`ScimError::Remote`].
//!
//! ```rust
//! use scim_sdk::client::{LocalTransport, ScimClient};
//! use scim_sdk::mapper::InMemoryAdapter;
//! use scim_sdk::schema::{CORE_SCHEMA, SchemaRegistry};
//! use scim_sdk::resource::ScimResource;
//! use scim_sdk::server::ScimServerBuilder;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schemas = Arc::new(SchemaRegistry::with_core_schemas()?);
//! let user = schemas.resource_descriptor("User").unwrap();
//! let server = ScimServerBuilder::new()
//!     .with_schema_registry(schemas.clone())
//!     .with_adapter(Arc::new(InMemoryAdapter::new(user.clone())))
//!     .build()?;
//!
//! let client = ScimClient::new(LocalTransport::new(Arc::new(server)), schemas.clone(), "/");
//! let bjensen = ScimResource::builder(&user)
//!     .with_value(schemas.attribute_descriptor(CORE_SCHEMA, "userName").unwrap(), "bjensen")?
//!     .build();
//! let created = client.post(&bjensen).await?;
//! assert!(created.id().is_some());
//! # Ok(())
//! # }
//! ```

pub mod local;

pub use local::LocalTransport;

use crate::error::{ScimError, ScimResult};
use crate::marshal::{Codec, JsonCodec, ListResponse, MediaType, ScimDocument, XmlCodec};
use crate::query::{AttributeSelection, QueryDescriptor, ScimUri};
use crate::resource::ScimResource;
use crate::schema::SchemaRegistry;
use crate::server::request::{ACCEPT, AUTHORIZATION, Method, ScimRequest, ScimResponse};
use crate::service_provider::{SERVICE_PROVIDER_CONFIG, ServiceProviderConfig};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use log::debug;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

/// Sends one request and returns the response. Connection handling,
/// timeouts and TLS belong to the implementation.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: ScimRequest) -> impl Future<Output = ScimResult<ScimResponse>> + Send;
}

/// Typed client for a SCIM service.
pub struct ScimClient<T> {
    transport: T,
    schemas: Arc<SchemaRegistry>,
    base: String,
    send_media: MediaType,
    accept: Vec<MediaType>,
    overridden: HashSet<Method>,
    override_header: String,
    authorization: Option<String>,
    json: JsonCodec,
    xml: XmlCodec,
}

impl<T: HttpTransport> ScimClient<T> {
    /// Client for the service rooted at `base_uri`. Requests are sent and
    /// accepted as JSON until configured otherwise.
    pub fn new(transport: T, schemas: Arc<SchemaRegistry>, base_uri: &str) -> Self {
        Self {
            transport,
            base: base_uri.to_string(),
            send_media: MediaType::Json,
            accept: vec![MediaType::Json],
            overridden: HashSet::new(),
            override_header: "X-HTTP-Method-Override".to_string(),
            authorization: None,
            json: JsonCodec::new(Arc::clone(&schemas)),
            xml: XmlCodec::new(Arc::clone(&schemas)),
            schemas,
        }
    }

    /// Send and accept `media` only.
    pub fn with_media_type(mut self, media: MediaType) -> Self {
        self.send_media = media;
        self.accept = vec![media];
        self
    }

    /// Formats listed in `Accept`, most preferred first.
    pub fn with_accept(mut self, accept: Vec<MediaType>) -> Self {
        self.accept = accept;
        self
    }

    /// Send `method` as POST with a method-override header.
    pub fn with_method_override(mut self, method: Method, enabled: bool) -> Self {
        if enabled {
            self.overridden.insert(method);
        } else {
            self.overridden.remove(&method);
        }
        self
    }

    pub fn with_override_header(mut self, header: impl Into<String>) -> Self {
        self.override_header = header.into();
        self
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        let credentials = BASE64.encode(format!("{}:{}", username, password));
        self.authorization = Some(format!("Basic {}", credentials));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch one resource. `None` when the service has no such resource.
    pub async fn get(
        &self,
        resource_type: &str,
        id: &str,
        selection: &AttributeSelection,
    ) -> ScimResult<Option<ScimResource>> {
        let query = QueryDescriptor::new().with_selection(selection.clone());
        let uri = self.uri(resource_type)?.with_id(id).with_query(query);
        let response = self.exchange(self.request(Method::Get, &uri)).await?;
        match response.status {
            200 => self.read_resource(&response, resource_type).map(Some),
            404 => Ok(None),
            _ => Err(self.failure(&response, resource_type)),
        }
    }

    /// Run a query against the collection of `resource_type`.
    pub async fn list(&self, resource_type: &str, query: &QueryDescriptor) -> ScimResult<ListResponse> {
        let uri = self.uri(resource_type)?.with_query(query.clone());
        let response = self.exchange(self.request(Method::Get, &uri)).await?;
        if response.status != 200 {
            return Err(self.failure(&response, resource_type));
        }
        match self.read_document(&response, resource_type)? {
            ScimDocument::List(list) => Ok(list),
            _ => Err(ScimError::malformed("expected a list response")),
        }
    }

    /// Create a resource and return it as stored by the service.
    pub async fn post(&self, resource: &ScimResource) -> ScimResult<ScimResource> {
        let resource_type = resource.resource_type();
        let uri = self.uri(resource_type)?;
        let request = self.with_body(self.request(Method::Post, &uri), resource)?;
        let response = self.exchange(request).await?;
        match response.status {
            200 | 201 => self.read_resource(&response, resource_type),
            _ => Err(self.failure(&response, resource_type)),
        }
    }

    /// Replace a resource. `None` when the service has no such resource.
    pub async fn put(&self, id: &str, resource: &ScimResource) -> ScimResult<Option<ScimResource>> {
        self.update(Method::Put, id, resource).await
    }

    /// Change the attributes present in `changes`, keeping the rest.
    pub async fn patch(&self, id: &str, changes: &ScimResource) -> ScimResult<Option<ScimResource>> {
        self.update(Method::Patch, id, changes).await
    }

    /// Delete a resource. `false` when the service has no such resource.
    pub async fn delete(&self, resource_type: &str, id: &str) -> ScimResult<bool> {
        let uri = self.uri(resource_type)?.with_id(id);
        let response = self.exchange(self.request(Method::Delete, &uri)).await?;
        match response.status {
            200 | 204 => Ok(true),
            404 => Ok(false),
            _ => Err(self.failure(&response, resource_type)),
        }
    }

    pub async fn service_provider_config(&self) -> ScimResult<ServiceProviderConfig> {
        let uri = self.uri(SERVICE_PROVIDER_CONFIG)?;
        let response = self.exchange(self.request(Method::Get, &uri)).await?;
        if response.status != 200 {
            return Err(self.failure(&response, SERVICE_PROVIDER_CONFIG));
        }
        ServiceProviderConfig::from_resource(&self.read_resource(&response, SERVICE_PROVIDER_CONFIG)?)
    }

    async fn update(&self, method: Method, id: &str, resource: &ScimResource) -> ScimResult<Option<ScimResource>> {
        let resource_type = resource.resource_type();
        let uri = self.uri(resource_type)?.with_id(id);
        let request = self.with_body(self.request(method, &uri), resource)?;
        let response = self.exchange(request).await?;
        match response.status {
            200 => self.read_resource(&response, resource_type).map(Some),
            404 => Ok(None),
            _ => Err(self.failure(&response, resource_type)),
        }
    }

    fn codec(&self, media: MediaType) -> &dyn Codec {
        match media {
            MediaType::Json => &self.json,
            MediaType::Xml => &self.xml,
        }
    }

    fn uri(&self, resource_type: &str) -> ScimResult<ScimUri> {
        let descriptor = self
            .schemas
            .resource_descriptor(resource_type)
            .ok_or_else(|| ScimError::UnsupportedResourceType(resource_type.to_string()))?;
        Ok(ScimUri::new(&self.base, descriptor.endpoint()))
    }

    fn request(&self, method: Method, uri: &ScimUri) -> ScimRequest {
        let overridden = self.overridden.contains(&method);
        let wire_method = if overridden { Method::Post } else { method };
        let mut request = ScimRequest::new(wire_method, uri.to_string());
        if !self.accept.is_empty() {
            let accept: Vec<&str> = self.accept.iter().map(MediaType::mime).collect();
            request = request.with_header(ACCEPT, accept.join(", "));
        }
        if overridden {
            request = request.with_header(self.override_header.as_str(), method.as_str());
        }
        if let Some(authorization) = &self.authorization {
            request = request.with_header(AUTHORIZATION, authorization.as_str());
        }
        request
    }

    fn with_body(&self, request: ScimRequest, resource: &ScimResource) -> ScimResult<ScimRequest> {
        let body = self.codec(self.send_media).encode(resource)?;
        Ok(request.with_body(self.send_media, body))
    }

    async fn exchange(&self, request: ScimRequest) -> ScimResult<ScimResponse> {
        debug!("Sending {} {}", request.method, request.target);
        let response = self.transport.send(request).await?;
        debug!("Received {}", response.status);
        Ok(response)
    }

    fn read_document(&self, response: &ScimResponse, resource_type: &str) -> ScimResult<ScimDocument> {
        let media = response.content_type()?.unwrap_or(self.send_media);
        self.codec(media).decode_document(&response.body, Some(resource_type))
    }

    fn read_resource(&self, response: &ScimResponse, resource_type: &str) -> ScimResult<ScimResource> {
        match self.read_document(response, resource_type)? {
            ScimDocument::Resource(resource) => Ok(resource),
            _ => Err(ScimError::malformed("expected a resource in the response")),
        }
    }

    /// Error for a non-success response, from its error document when it
    /// has one.
    fn failure(&self, response: &ScimResponse, resource_type: &str) -> ScimError {
        let status = response.status;
        if let Ok(ScimDocument::Errors(errors)) = self.read_document(response, resource_type) {
            if let Some(first) = errors.into_iter().next() {
                return ScimError::Remote {
                    status,
                    description: first.description,
                    code: first.code,
                };
            }
        }
        let text = String::from_utf8_lossy(&response.body).trim().to_string();
        ScimError::Remote {
            status,
            description: if text.is_empty() { format!("HTTP {}", status) } else { text },
            code: None,
        }
    }
}
