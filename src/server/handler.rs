//! Request dispatch for the HTTP binding.
//!
//! [`ScimServer::handle`] turns one [`ScimRequest`] into one [`ScimResponse`].
//! Every failure becomes an error document in the negotiated format with the
//! status from [`ScimError::status_code`]; nothing a request does can take
//! the server down.

use super::etag::EntityTag;
use super::request::{ACCEPT, ETAG, IF_MATCH, LOCATION, Method, ScimRequest, ScimResponse};
use crate::config::ServerConfig;
use crate::error::{AdapterResult, ScimError, ScimResult};
use crate::mapper::{ResourceAdapter, ResourceMapperRegistry};
use crate::marshal::{Codec, ErrorEntry, JsonCodec, ListResponse, MediaType, XmlCodec};
use crate::query::{AttributeSelection, QueryDescriptor, ScimUri};
use crate::resource::ScimResource;
use crate::schema::{ResourceDescriptor, SchemaRegistry};
use crate::service_provider::SERVICE_PROVIDER_CONFIG;

use log::{debug, info, warn};
use std::sync::Arc;

/// Transport-neutral SCIM service.
///
/// Built by [`ScimServerBuilder`](super::ScimServerBuilder). Share it behind
/// an `Arc` and call [`handle`](Self::handle) from as many tasks as needed.
pub struct ScimServer {
    schemas: Arc<SchemaRegistry>,
    mappers: Arc<ResourceMapperRegistry>,
    config: ServerConfig,
    base: String,
    json: JsonCodec,
    xml: XmlCodec,
}

type Located = (Arc<dyn ResourceAdapter>, ScimResource);

impl ScimServer {
    pub(super) fn new(schemas: Arc<SchemaRegistry>, mappers: Arc<ResourceMapperRegistry>, config: ServerConfig) -> Self {
        let strict = config.strict_decode;
        Self {
            json: JsonCodec::new(Arc::clone(&schemas)).with_strict(strict),
            xml: XmlCodec::new(Arc::clone(&schemas)).with_strict(strict),
            base: config.normalized_base(),
            schemas,
            mappers,
            config,
        }
    }

    pub fn schema_registry(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }

    pub fn mapper_registry(&self) -> &Arc<ResourceMapperRegistry> {
        &self.mappers
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn codec(&self, media: MediaType) -> &dyn Codec {
        match media {
            MediaType::Json => &self.json,
            MediaType::Xml => &self.xml,
        }
    }

    /// Handle one request.
    pub async fn handle(&self, request: ScimRequest) -> ScimResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!("Request {}: {} {}", request_id, request.method, request.target);

        let uri = ScimUri::parse(&self.base, &request.target, self.config.start_index_policy);
        let suffix = uri.as_ref().ok().and_then(ScimUri::suffix);
        let media = match self.response_media(&request, suffix) {
            Ok(media) => media,
            Err(error) => return self.error_response(&request_id, &error, self.config.default_media_type),
        };

        let result = match uri {
            Ok(uri) => self.dispatch(&request, uri, media).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(response) => {
                debug!("Request {} completed with {}", request_id, response.status);
                response
            }
            Err(error) => self.error_response(&request_id, &error, media),
        }
    }

    /// Remove every adapter registration and finalize each adapter once.
    pub fn shutdown(&self) -> usize {
        info!("Shutting down SCIM server");
        self.mappers.shutdown()
    }

    /// A URI suffix wins over `Accept`; without either, a request body's
    /// format is mirrored.
    fn response_media(&self, request: &ScimRequest, suffix: Option<MediaType>) -> ScimResult<MediaType> {
        if let Some(media) = suffix {
            return Ok(media);
        }
        let fallback = match request.content_type() {
            Ok(Some(media)) if !request.body.is_empty() => media,
            _ => self.config.default_media_type,
        };
        MediaType::negotiate(request.headers.get(ACCEPT), fallback)
    }

    fn effective_method(&self, request: &ScimRequest) -> ScimResult<Method> {
        match request.headers.get(&self.config.method_override_header) {
            Some(value) if request.method == Method::Post => {
                let method = value.parse()?;
                debug!("POST overridden as {}", method);
                Ok(method)
            }
            Some(_) => {
                debug!("Ignoring method override on {}", request.method);
                Ok(request.method)
            }
            None => Ok(request.method),
        }
    }

    async fn dispatch(&self, request: &ScimRequest, uri: ScimUri, media: MediaType) -> ScimResult<ScimResponse> {
        let method = self.effective_method(request)?;
        let descriptor = self
            .schemas
            .resource_for_endpoint(uri.endpoint())
            .ok_or_else(|| ScimError::UnsupportedResourceType(uri.endpoint().to_string()))?;

        if descriptor.name() == SERVICE_PROVIDER_CONFIG {
            return self.service_provider_config(method, &uri, media);
        }
        if self.config.strict_decode {
            uri.query().validate(&self.schemas, &descriptor)?;
        }

        let query = uri.query();
        match (method, uri.id()) {
            (Method::Get, Some(id)) => self.fetch(&descriptor, id, query, media).await,
            (Method::Get, None) => self.list(&descriptor, query, media).await,
            (Method::Post, None) => self.create(&descriptor, request, query, media).await,
            (Method::Put, Some(id)) => self.replace(&descriptor, id, request, query, media).await,
            (Method::Patch, Some(id)) => self.patch(&descriptor, id, request, query, media).await,
            (Method::Delete, Some(id)) => self.delete(&descriptor, id, request).await,
            (method, _) => Err(ScimError::NotImplemented {
                operation: format!("{} {}", method, uri.path()),
            }),
        }
    }

    fn service_provider_config(&self, method: Method, uri: &ScimUri, media: MediaType) -> ScimResult<ScimResponse> {
        if method != Method::Get || uri.id().is_some() {
            return Err(ScimError::NotImplemented {
                operation: format!("{} {}", method, uri.path()),
            });
        }
        let mut config = self.config.service_provider.clone();
        config
            .filter_max_results
            .get_or_insert(u32::try_from(self.config.max_results).unwrap_or(u32::MAX));
        let resource = config.to_resource(&self.schemas)?;
        self.resource_response(200, &resource, media)
    }

    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        id: &str,
        query: &QueryDescriptor,
        media: MediaType,
    ) -> ScimResult<ScimResponse> {
        let (_, resource) = self
            .locate(descriptor, id, &query.selection)
            .await?
            .ok_or_else(|| ScimError::resource_not_found(descriptor.name(), id))?;
        let response = self.resource_response(200, &resource, media)?;
        if query.selection.is_all() {
            return Ok(response.with_header(ETAG, self.etag(&resource)?.to_string()));
        }
        Ok(response)
    }

    async fn list(&self, descriptor: &ResourceDescriptor, query: &QueryDescriptor, media: MediaType) -> ScimResult<ScimResponse> {
        let adapter = self
            .mappers
            .query_adapter_for(descriptor.endpoint())
            .ok_or_else(|| ScimError::NotImplemented {
                operation: format!("query on {}", descriptor.endpoint()),
            })?;

        let requested = query.page.is_some();
        let page = query.page.unwrap_or_default().capped(self.config.max_results);
        let query = query.clone().with_page(page);
        let result = run_blocking(move || adapter.query(&query)).await?;
        debug!(
            "Query on {} returned {} of {} resources",
            descriptor.endpoint(),
            result.resources.len(),
            result.total_results
        );

        let mut list = ListResponse::new(result.resources).with_total(result.total_results);
        if requested {
            list = list.with_page(page.start_index());
        }
        let body = self.codec(media).encode_list(&list)?;
        Ok(ScimResponse::new(200).with_body(media, body))
    }

    async fn create(
        &self,
        descriptor: &ResourceDescriptor,
        request: &ScimRequest,
        query: &QueryDescriptor,
        media: MediaType,
    ) -> ScimResult<ScimResponse> {
        let resource = self.decode_body(request, descriptor)?;
        let adapter = self
            .mappers
            .adapters_for(descriptor.name())
            .into_iter()
            .next()
            .ok_or_else(|| ScimError::UnsupportedResourceType(descriptor.name().to_string()))?;

        let created = run_blocking(move || adapter.create(resource)).await?;
        let etag = self.etag(&created)?;
        let mut response = self
            .resource_response(201, &created.select(&query.selection), media)?
            .with_header(ETAG, etag.to_string());
        match created.id() {
            Some(id) => {
                let location = ScimUri::new(&self.base, descriptor.endpoint()).with_id(id);
                info!("Created {} {}", descriptor.name(), id);
                response = response.with_header(LOCATION, location.to_string());
            }
            None => warn!("Adapter for {} created a resource without an id", descriptor.name()),
        }
        Ok(response)
    }

    async fn replace(
        &self,
        descriptor: &ResourceDescriptor,
        id: &str,
        request: &ScimRequest,
        query: &QueryDescriptor,
        media: MediaType,
    ) -> ScimResult<ScimResponse> {
        let replacement = self.decode_body(request, descriptor)?;
        for adapter in self.write_targets(descriptor, id, request).await? {
            let (owned_id, resource) = (id.to_string(), replacement.clone());
            if let Some(updated) = run_blocking(move || adapter.replace(&owned_id, resource)).await? {
                return self.modified_response(&updated, query, media);
            }
        }
        Err(ScimError::resource_not_found(descriptor.name(), id))
    }

    /// Fetch, merge the request body over the current resource, replace.
    async fn patch(
        &self,
        descriptor: &ResourceDescriptor,
        id: &str,
        request: &ScimRequest,
        query: &QueryDescriptor,
        media: MediaType,
    ) -> ScimResult<ScimResponse> {
        let changes = self.decode_body(request, descriptor)?;
        let (adapter, current) = self
            .locate(descriptor, id, &AttributeSelection::all())
            .await?
            .ok_or_else(|| ScimError::resource_not_found(descriptor.name(), id))?;
        self.check_precondition(request, &current)?;

        let merged = current.merge(&changes);
        let owned_id = id.to_string();
        let updated = run_blocking(move || adapter.replace(&owned_id, merged))
            .await?
            .ok_or_else(|| ScimError::resource_not_found(descriptor.name(), id))?;
        self.modified_response(&updated, query, media)
    }

    async fn delete(&self, descriptor: &ResourceDescriptor, id: &str, request: &ScimRequest) -> ScimResult<ScimResponse> {
        for adapter in self.write_targets(descriptor, id, request).await? {
            let owned_id = id.to_string();
            if run_blocking(move || adapter.delete(&owned_id)).await? {
                info!("Deleted {} {}", descriptor.name(), id);
                return Ok(ScimResponse::new(200));
            }
        }
        Err(ScimError::resource_not_found(descriptor.name(), id))
    }

    /// Adapters to try for a write. With `If-Match` only the adapter holding
    /// the resource qualifies, and only when the tag matches.
    async fn write_targets(
        &self,
        descriptor: &ResourceDescriptor,
        id: &str,
        request: &ScimRequest,
    ) -> ScimResult<Vec<Arc<dyn ResourceAdapter>>> {
        if !request.headers.contains(IF_MATCH) {
            let adapters = self.mappers.adapters_for(descriptor.name());
            if adapters.is_empty() {
                return Err(ScimError::UnsupportedResourceType(descriptor.name().to_string()));
            }
            return Ok(adapters);
        }
        let (adapter, current) = self
            .locate(descriptor, id, &AttributeSelection::all())
            .await?
            .ok_or_else(|| ScimError::resource_not_found(descriptor.name(), id))?;
        self.check_precondition(request, &current)?;
        Ok(vec![adapter])
    }

    /// First adapter, in registration order, that has the resource.
    async fn locate(
        &self,
        descriptor: &ResourceDescriptor,
        id: &str,
        selection: &AttributeSelection,
    ) -> ScimResult<Option<Located>> {
        let adapters = self.mappers.adapters_for(descriptor.name());
        if adapters.is_empty() {
            return Err(ScimError::UnsupportedResourceType(descriptor.name().to_string()));
        }
        for adapter in adapters {
            let (candidate, owned_id, selection) = (Arc::clone(&adapter), id.to_string(), selection.clone());
            if let Some(resource) = run_blocking(move || candidate.fetch(&owned_id, &selection)).await? {
                return Ok(Some((adapter, resource)));
            }
        }
        Ok(None)
    }

    fn check_precondition(&self, request: &ScimRequest, current: &ScimResource) -> ScimResult<()> {
        let Some(expected) = request.headers.get(IF_MATCH) else {
            return Ok(());
        };
        let tag = self.etag(current)?;
        if tag.matches_header(expected) {
            Ok(())
        } else {
            Err(ScimError::PreconditionFailed {
                expected: expected.to_string(),
                current: tag.to_string(),
            })
        }
    }

    fn etag(&self, resource: &ScimResource) -> ScimResult<EntityTag> {
        Ok(EntityTag::from_content(&self.json.encode(resource)?))
    }

    fn decode_body(&self, request: &ScimRequest, descriptor: &ResourceDescriptor) -> ScimResult<ScimResource> {
        if request.body.iter().all(u8::is_ascii_whitespace) {
            return Err(ScimError::invalid_request("A request body is required"));
        }
        let media = request.content_type()?.unwrap_or(self.config.default_media_type);
        self.codec(media).decode(&request.body, descriptor.name())
    }

    fn resource_response(&self, status: u16, resource: &ScimResource, media: MediaType) -> ScimResult<ScimResponse> {
        let body = self.codec(media).encode(resource)?;
        Ok(ScimResponse::new(status).with_body(media, body))
    }

    fn modified_response(&self, resource: &ScimResource, query: &QueryDescriptor, media: MediaType) -> ScimResult<ScimResponse> {
        let etag = self.etag(resource)?;
        Ok(self
            .resource_response(200, &resource.select(&query.selection), media)?
            .with_header(ETAG, etag.to_string()))
    }

    fn error_response(&self, request_id: &str, error: &ScimError, media: MediaType) -> ScimResponse {
        let status = error.status_code();
        if status >= 500 {
            warn!("Request {} failed with {}: {}", request_id, status, error);
        } else {
            debug!("Request {} rejected with {}: {}", request_id, status, error);
        }
        match self.codec(media).encode_error(&ErrorEntry::from(error)) {
            Ok(body) => ScimResponse::new(status).with_body(media, body),
            Err(encode_error) => {
                warn!("Request {}: could not encode error document: {}", request_id, encode_error);
                ScimResponse::new(status)
            }
        }
    }
}

/// Run an adapter call on the blocking pool. Adapter failures are passed on
/// as they are.
async fn run_blocking<T, F>(operation: F) -> ScimResult<T>
where
    F: FnOnce() -> AdapterResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            warn!("Adapter call failed: {}", error);
            Err(error.into())
        }
        Err(join_error) => Err(ScimError::internal(format!("Adapter task failed: {}", join_error))),
    }
}

impl std::fmt::Debug for ScimServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScimServer")
            .field("base", &self.base)
            .field("mappers", &self.mappers)
            .finish()
    }
}
