//! Custom schemas loaded from definition files and used end to end.

use crate::common;
use scim_sdk::error::{BuildError, ConfigError};
use scim_sdk::mapper::InMemoryAdapter;
use scim_sdk::marshal::{Codec, JsonCodec, MediaType, XmlCodec};
use scim_sdk::schema::SchemaRegistry;
use scim_sdk::server::{Method, ScimRequest, ScimServerBuilder};
use scim_sdk::ServerConfig;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const BADGES: &str = r#"{
  "schema": "urn:example:schemas:badges:1.0",
  "attributes": [
    {"name": "id", "caseExact": true},
    {"name": "holder", "required": true},
    {"name": "issued", "type": "dateTime"},
    {"name": "doors", "plural": true, "pluralElement": "door", "type": "integer"},
    {"name": "sponsor", "subAttributes": [{"name": "value"}, {"name": "display"}]}
  ],
  "resources": [
    {"name": "Badge", "endpoint": "Badges", "description": "Building access badge",
     "attributes": ["id", "holder", "issued", "doors", "sponsor"]}
  ]
}"#;

const CLEARANCE: &str = r#"{
  "schema": "urn:example:schemas:clearance:1.0",
  "attributes": [{"name": "level", "type": "integer"}]
}"#;

/// Fresh directory holding the given definition files.
fn schema_dir(files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scim-schemas-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_load_dir_registers_resources_and_extensions() {
    common::init_logging();
    let dir = schema_dir(&[("badges.json", BADGES), ("clearance.json", CLEARANCE), ("notes.txt", "ignored")]);
    let registry = SchemaRegistry::with_core_schemas().unwrap();
    assert_eq!(registry.load_dir(&dir).unwrap(), 2);
    fs::remove_dir_all(&dir).unwrap();

    let badge = registry.resource_for_endpoint("Badges").unwrap();
    assert_eq!(badge.name(), "Badge");
    assert_eq!(badge.attributes().len(), 5);
    assert!(registry.is_known_schema("urn:example:schemas:clearance:1.0"));
    assert!(
        registry
            .attribute_descriptor("urn:example:schemas:clearance:1.0", "level")
            .is_some()
    );
}

#[test]
fn test_loaded_schema_drives_both_codecs() {
    let registry = SchemaRegistry::with_core_schemas().unwrap();
    registry.load_str(BADGES, "badges.json").unwrap();
    registry.load_str(CLEARANCE, "clearance.json").unwrap();
    let registry = Arc::new(registry);

    let json = JsonCodec::new(registry.clone());
    let xml = XmlCodec::new(registry.clone());
    let badge = json
        .decode(
            br#"{
              "holder": "bjensen",
              "issued": "2011-08-01T18:29:49Z",
              "doors": [3, 14],
              "sponsor": {"value": "26118915", "display": "John Smith"}
            }"#,
            "Badge",
        )
        .unwrap();

    let encoded = String::from_utf8(xml.encode(&badge).unwrap()).unwrap();
    assert!(encoded.contains(r#"<Badge xmlns="urn:example:schemas:badges:1.0">"#));
    assert!(encoded.contains("<doors><door>3</door><door>14</door></doors>"));
    assert_eq!(xml.decode(encoded.as_bytes(), "Badge").unwrap(), badge);

    let user = json
        .decode(
            br#"{"userName": "bjensen", "urn:example:schemas:clearance:1.0": {"level": 3}}"#,
            "User",
        )
        .unwrap();
    assert_eq!(
        user.schemas(),
        vec!["urn:scim:schemas:core:1.0", "urn:example:schemas:clearance:1.0"]
    );
}

#[test]
fn test_broken_definition_reports_its_origin() {
    let dir = schema_dir(&[("broken.json", "{\"schema\": ")]);
    let result = SchemaRegistry::new().load_dir(&dir);
    fs::remove_dir_all(&dir).unwrap();
    match result {
        Err(ConfigError::Json { path, .. }) => assert!(path.ends_with("broken.json")),
        other => panic!("Expected a JSON error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_custom_resource_served_over_http_binding() {
    common::init_logging();
    let registry = SchemaRegistry::with_core_schemas().unwrap();
    registry.load_str(BADGES, "badges.json").unwrap();
    let registry = Arc::new(registry);
    let badges = InMemoryAdapter::new(registry.resource_descriptor("Badge").unwrap());

    let server = ScimServerBuilder::new()
        .with_schema_registry(registry.clone())
        .with_base_uri("/scim")
        .with_adapter(Arc::new(badges))
        .build()
        .unwrap();

    let created = server
        .handle(
            ScimRequest::new(Method::Post, "/scim/Badges.xml").with_body(
                MediaType::Xml,
                br#"<Badge xmlns="urn:example:schemas:badges:1.0"><holder>bjensen</holder></Badge>"#.to_vec(),
            ),
        )
        .await;
    assert_eq!(created.status, 201);
    assert_eq!(created.content_type().unwrap(), Some(MediaType::Xml));

    let listed = server.handle(ScimRequest::get("/scim/Badges?filter=holder%20eq%20%22BJENSEN%22")).await;
    assert_eq!(listed.status, 200);
    let list = server
        .codec(MediaType::Json)
        .decode_document(&listed.body, Some("Badge"))
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(list.total_results, 1);
}

#[test]
fn test_adapter_for_unknown_type_fails_build() {
    let registry = common::registry();
    let other = SchemaRegistry::new();
    other.load_str(BADGES, "badges.json").unwrap();
    let badges = InMemoryAdapter::new(other.resource_descriptor("Badge").unwrap());

    let result = ScimServerBuilder::new()
        .with_schema_registry(registry)
        .with_adapter(Arc::new(badges))
        .build();
    assert!(matches!(result, Err(BuildError::InvalidConfiguration { .. })));
}

#[test]
fn test_server_config_file_drives_builder() {
    let path = std::env::temp_dir().join(format!("scim-server-{}.json", uuid::Uuid::new_v4()));
    fs::write(
        &path,
        r#"{"baseUri": "https://example.com/scim/", "maxResults": 5, "defaultMediaType": "xml"}"#,
    )
    .unwrap();
    let config = ServerConfig::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.normalized_base(), "https://example.com/scim");
    let server = ScimServerBuilder::new()
        .with_schema_registry(common::registry())
        .with_config(config)
        .build()
        .unwrap();
    assert_eq!(server.config().max_results, 5);
    assert_eq!(server.config().default_media_type, MediaType::Xml);
}
