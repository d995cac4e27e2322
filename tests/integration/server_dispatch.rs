//! HTTP binding scenarios, including concurrent request handling.

use crate::common::{self, fixtures};
use futures::future::join_all;
use scim_sdk::marshal::{Codec, MediaType};
use scim_sdk::server::{EntityTag, Method, ScimRequest, ScimResponse, ScimServer, ScimServerBuilder};
use scim_sdk::{InMemoryAdapter, ListResponse, ScimResource};
use std::collections::HashSet;
use std::sync::Arc;

fn read_resource(server: &ScimServer, response: &ScimResponse, resource_type: &str) -> ScimResource {
    let media = response.content_type().unwrap().unwrap();
    server.codec(media).decode(&response.body, resource_type).unwrap()
}

fn read_list(server: &ScimServer, response: &ScimResponse, resource_type: &str) -> ListResponse {
    let media = response.content_type().unwrap().unwrap();
    server
        .codec(media)
        .decode_document(&response.body, Some(resource_type))
        .unwrap()
        .into_list()
        .unwrap()
}

async fn create_user(server: &ScimServer, user_name: &str) -> ScimResource {
    let response = server
        .handle(ScimRequest::new(Method::Post, "/scim/Users").with_body(MediaType::Json, fixtures::user_json(user_name)))
        .await;
    assert_eq!(response.status, 201, "{}", String::from_utf8_lossy(&response.body));
    read_resource(server, &response, "User")
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let server = Arc::new(common::server());

    let requests = (0..25).map(|i| {
        let server = Arc::clone(&server);
        async move { create_user(&server, &format!("user{}", i)).await }
    });
    let created = join_all(requests).await;

    let ids: HashSet<String> = created.iter().map(|r| r.id().unwrap().to_string()).collect();
    assert_eq!(ids.len(), 25);

    let response = server.handle(ScimRequest::get("/scim/Users?count=5")).await;
    let list = read_list(&server, &response, "User");
    assert_eq!(list.total_results, 25);
    assert_eq!(list.resources.len(), 5);
}

#[tokio::test]
async fn test_concurrent_duplicates_yield_one_winner() {
    let server = Arc::new(common::server());

    let requests = (0..10).map(|_| {
        let server = Arc::clone(&server);
        async move {
            server
                .handle(
                    ScimRequest::new(Method::Post, "/scim/Users")
                        .with_body(MediaType::Json, fixtures::user_json("bjensen")),
                )
                .await
                .status
        }
    });
    let statuses = join_all(requests).await;

    assert_eq!(statuses.iter().filter(|s| **s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == 409).count(), 9);
}

#[tokio::test]
async fn test_concurrent_reads_and_tasks() {
    let server = Arc::new(common::server());
    let id = create_user(&server, "bjensen").await.id().unwrap().to_string();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let server = Arc::clone(&server);
            let target = if i % 2 == 0 {
                format!("/scim/Users/{}.json", id)
            } else {
                format!("/scim/Users/{}.xml", id)
            };
            tokio::spawn(async move { server.handle(ScimRequest::get(target)).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status, 200);
        let user = read_resource(&server, &response, "User");
        assert_eq!(user.simple_value("userName").unwrap().as_str(), Some("bjensen"));
    }
}

#[tokio::test]
async fn test_paging_walks_the_collection() {
    let server = common::server_with(common::registry(), 2);
    for name in ["erin", "carol", "alice", "dave", "bob"] {
        create_user(&server, name).await;
    }

    let mut seen = Vec::new();
    let mut start = 1;
    loop {
        let target = format!("/scim/Users?sortBy=userName&startIndex={}", start);
        let list = read_list(&server, &server.handle(ScimRequest::get(target)).await, "User");
        assert_eq!(list.total_results, 5);
        assert_eq!(list.start_index, Some(start));
        if list.resources.is_empty() {
            break;
        }
        for user in &list.resources {
            seen.push(user.simple_value("userName").unwrap().as_str().unwrap().to_string());
        }
        start += list.resources.len() as u64;
    }
    assert_eq!(seen, vec!["alice", "bob", "carol", "dave", "erin"]);
}

#[tokio::test]
async fn test_attribute_selection_on_get() {
    let server = common::server();
    let id = create_user(&server, "bjensen").await.id().unwrap().to_string();

    let response = server
        .handle(ScimRequest::get(format!("/scim/Users/{}?attributes=userName", id)))
        .await;
    assert_eq!(response.status, 200);
    assert!(response.header("ETag").is_none());
    let selected = read_resource(&server, &response, "User");
    assert_eq!(selected.id(), Some(id.as_str()));
    assert!(selected.simple_value("userName").is_some());
    assert!(selected.attribute(selected.primary_schema(), "meta").is_none());
}

#[tokio::test]
async fn test_xml_request_gets_xml_response() {
    let server = common::server();
    let response = server
        .handle(
            ScimRequest::new(Method::Post, "/scim/Users")
                .with_body(MediaType::Xml, fixtures::BJENSEN_XML.as_bytes().to_vec()),
        )
        .await;
    assert_eq!(response.status, 201);
    assert_eq!(response.content_type().unwrap(), Some(MediaType::Xml));
    let created = read_resource(&server, &response, "User");
    assert_eq!(created.schemas().len(), 2);
}

#[tokio::test]
async fn test_etag_follows_replacement() {
    let server = common::server();
    let created = server
        .handle(ScimRequest::new(Method::Post, "/scim/Users").with_body(MediaType::Json, fixtures::user_json("bjensen")))
        .await;
    let id = read_resource(&server, &created, "User").id().unwrap().to_string();
    let first: EntityTag = created.header("ETag").unwrap().parse().unwrap();

    let replaced = server
        .handle(
            ScimRequest::new(Method::Put, format!("/scim/Users/{}", id))
                .with_header("If-Match", first.to_string())
                .with_body(MediaType::Json, fixtures::user_json("barbara")),
        )
        .await;
    assert_eq!(replaced.status, 200);
    let second: EntityTag = replaced.header("ETag").unwrap().parse().unwrap();
    assert_ne!(first, second);

    let stale = server
        .handle(
            ScimRequest::new(Method::Delete, format!("/scim/Users/{}", id)).with_header("If-Match", first.to_string()),
        )
        .await;
    assert_eq!(stale.status, 412);

    let any = server
        .handle(ScimRequest::new(Method::Delete, format!("/scim/Users/{}", id)).with_header("If-Match", "*"))
        .await;
    assert_eq!(any.status, 200);
}

#[tokio::test]
async fn test_strict_server_rejects_unknown_names() {
    let schemas = common::registry();
    let users = InMemoryAdapter::new(schemas.resource_descriptor("User").unwrap());
    let server = ScimServerBuilder::new()
        .with_schema_registry(schemas)
        .with_base_uri("/scim")
        .with_strict_decode(true)
        .with_adapter(Arc::new(users))
        .build()
        .unwrap();

    let response = server.handle(ScimRequest::get("/scim/Users?sortBy=shoeSize")).await;
    assert_eq!(response.status, 400);

    let response = server
        .handle(
            ScimRequest::new(Method::Post, "/scim/Users")
                .with_body(MediaType::Json, br#"{"userName":"b","shoeSize":"9"}"#.to_vec()),
        )
        .await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_groups_and_users_are_independent() {
    let server = common::server();
    let user = create_user(&server, "bjensen").await;
    let json = server.codec(MediaType::Json);
    let group = fixtures::group(server.schema_registry(), "Admins", &[user.id().unwrap()]);

    let response = server
        .handle(ScimRequest::new(Method::Post, "/scim/Groups").with_body(MediaType::Json, json.encode(&group).unwrap()))
        .await;
    assert_eq!(response.status, 201);

    let groups = read_list(&server, &server.handle(ScimRequest::get("/scim/Groups")).await, "Group");
    assert_eq!(groups.total_results, 1);
    let members = groups.resources[0].attribute(scim_sdk::schema::CORE_SCHEMA, "members").unwrap();
    assert_eq!(members.all_values().len(), 1);

    let users = read_list(&server, &server.handle(ScimRequest::get("/scim/Users")).await, "User");
    assert_eq!(users.total_results, 1);
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let server = common::server();
    let response = server
        .handle(ScimRequest::new(Method::Post, "/scim/Users").with_body(MediaType::Json, b"  ".to_vec()))
        .await;
    assert_eq!(response.status, 400);
}
