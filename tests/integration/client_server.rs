//! Client and server wired together through the in-process transport.

use crate::common::{self, fixtures};
use scim_sdk::client::{HttpTransport, LocalTransport, ScimClient};
use scim_sdk::error::{ScimError, ScimResult};
use scim_sdk::marshal::MediaType;
use scim_sdk::query::{AttributeSelection, Filter, PageSpec, QueryDescriptor, StartIndexPolicy};
use scim_sdk::schema::{CORE_SCHEMA, ENTERPRISE_EXTENSION};
use scim_sdk::server::{Method, ScimRequest, ScimResponse};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Local transport that remembers the wire method and override header of
/// every request.
#[derive(Clone)]
struct Tap {
    inner: LocalTransport,
    seen: Arc<Mutex<Vec<(Method, Option<String>)>>>,
}

impl Tap {
    fn new(inner: LocalTransport) -> Self {
        Self {
            inner,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn seen(&self) -> Vec<(Method, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

impl HttpTransport for Tap {
    fn send(&self, request: ScimRequest) -> impl Future<Output = ScimResult<ScimResponse>> + Send {
        let header = request.headers.get("X-HTTP-Method-Override").map(str::to_string);
        self.seen.lock().unwrap().push((request.method, header));
        self.inner.send(request)
    }
}

fn client(media: MediaType) -> ScimClient<LocalTransport> {
    let server = Arc::new(common::server());
    let schemas = server.schema_registry().clone();
    ScimClient::new(LocalTransport::new(server), schemas, "/scim").with_media_type(media)
}

async fn lifecycle(media: MediaType) {
    let client = client(media);
    let registry = client.transport().server().schema_registry().clone();

    let created = client.post(&fixtures::employee(&registry, "bjensen", "701984")).await.unwrap();
    let id = created.id().unwrap().to_string();
    assert!(created.attribute(ENTERPRISE_EXTENSION, "employeeNumber").is_some());

    let fetched = client.get("User", &id, &AttributeSelection::all()).await.unwrap().unwrap();
    assert_eq!(fetched.simple_value("userName"), created.simple_value("userName"));

    let display = registry.attribute_descriptor(CORE_SCHEMA, "displayName").unwrap();
    let changes = scim_sdk::ScimResource::builder(&registry.resource_descriptor("User").unwrap())
        .with_value(display, "Babs")
        .unwrap()
        .build();
    let patched = client.patch(&id, &changes).await.unwrap().unwrap();
    assert_eq!(patched.simple_value("displayName").unwrap().as_str(), Some("Babs"));
    assert_eq!(patched.simple_value("userName").unwrap().as_str(), Some("bjensen"));

    let replaced = client.put(&id, &fixtures::user(&registry, "barbara")).await.unwrap().unwrap();
    assert!(replaced.simple_value("displayName").is_none());
    assert!(replaced.attribute(ENTERPRISE_EXTENSION, "employeeNumber").is_none());

    assert!(client.delete("User", &id).await.unwrap());
    assert!(!client.delete("User", &id).await.unwrap());
    assert!(client.get("User", &id, &AttributeSelection::all()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_lifecycle_over_json() {
    common::init_logging();
    lifecycle(MediaType::Json).await;
}

#[tokio::test]
async fn test_lifecycle_over_xml() {
    common::init_logging();
    lifecycle(MediaType::Xml).await;
}

#[tokio::test]
async fn test_list_with_filter_sort_and_page() {
    let client = client(MediaType::Xml);
    let registry = client.transport().server().schema_registry().clone();
    for name in ["carol", "alice", "bob", "alfred"] {
        client.post(&fixtures::user(&registry, name)).await.unwrap();
    }

    let query = QueryDescriptor::new()
        .with_filter(Filter::parse(r#"userName sw "al""#).unwrap())
        .with_sort(scim_sdk::query::SortSpec::descending(scim_sdk::query::AttributePath::new("userName")))
        .with_page(PageSpec::new(1, Some(10), StartIndexPolicy::Clamp).unwrap());
    let list = client.list("User", &query).await.unwrap();

    assert_eq!(list.total_results, 2);
    let names: Vec<_> = list
        .resources
        .iter()
        .filter_map(|r| r.simple_value("userName")?.as_str())
        .collect();
    assert_eq!(names, vec!["alice", "alfred"]);
}

#[tokio::test]
async fn test_method_override_through_transport() {
    let server = Arc::new(common::server());
    let schemas = server.schema_registry().clone();
    let tap = Tap::new(LocalTransport::new(server));
    let client = ScimClient::new(tap.clone(), schemas.clone(), "/scim")
        .with_method_override(Method::Delete, true)
        .with_method_override(Method::Put, true);

    let created = client.post(&fixtures::user(&schemas, "bjensen")).await.unwrap();
    let id = created.id().unwrap().to_string();
    client.put(&id, &fixtures::user(&schemas, "barbara")).await.unwrap().unwrap();
    assert!(client.delete("User", &id).await.unwrap());

    assert_eq!(
        tap.seen(),
        vec![
            (Method::Post, None),
            (Method::Post, Some("PUT".to_string())),
            (Method::Post, Some("DELETE".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_remote_errors_carry_status_and_description() {
    let client = client(MediaType::Json);
    let registry = client.transport().server().schema_registry().clone();
    client.post(&fixtures::user(&registry, "bjensen")).await.unwrap();

    match client.post(&fixtures::user(&registry, "BJENSEN")).await {
        Err(ScimError::Remote {
            status, description, ..
        }) => {
            assert_eq!(status, 409);
            assert!(description.contains("already exists"));
        }
        other => panic!("Expected a remote conflict, got {:?}", other),
    }

    let unknown = client.list("Widget", &QueryDescriptor::new()).await;
    assert!(matches!(unknown, Err(ScimError::UnsupportedResourceType(_))));
}

#[tokio::test]
async fn test_service_provider_config_over_both_formats() {
    for media in [MediaType::Json, MediaType::Xml] {
        let config = client(media).service_provider_config().await.unwrap();
        assert!(config.filter_supported);
        assert!(config.xml_data_format_supported);
        assert_eq!(config.filter_max_results, Some(100));
    }
}

#[tokio::test]
async fn test_mixed_formats_agree() {
    let server = Arc::new(common::server());
    let schemas = server.schema_registry().clone();
    let json = ScimClient::new(LocalTransport::new(server.clone()), schemas.clone(), "/scim");
    let xml = ScimClient::new(LocalTransport::new(server), schemas.clone(), "/scim").with_media_type(MediaType::Xml);

    let created = json.post(&fixtures::employee(&schemas, "bjensen", "701984")).await.unwrap();
    let id = created.id().unwrap();
    let via_json = json.get("User", id, &AttributeSelection::all()).await.unwrap().unwrap();
    let via_xml = xml.get("User", id, &AttributeSelection::all()).await.unwrap().unwrap();
    assert_eq!(via_json, via_xml);
}
