//! Both wire formats exercised against the same resources.

use crate::common::{self, fixtures};
use scim_sdk::error::ScimError;
use scim_sdk::marshal::{Codec, ErrorEntry, JsonCodec, ListResponse, ScimDocument, XmlCodec};
use scim_sdk::schema::{CORE_SCHEMA, ENTERPRISE_EXTENSION};
use serde_json::Value;

#[test]
fn test_json_and_xml_fixtures_decode_to_the_same_resource() {
    common::init_logging();
    let registry = common::registry();
    let json = JsonCodec::new(registry.clone());
    let xml = XmlCodec::new(registry.clone());

    let from_json = json.decode(fixtures::BJENSEN_JSON.as_bytes(), "User").unwrap();
    let from_xml = xml.decode(fixtures::BJENSEN_XML.as_bytes(), "User").unwrap();
    assert_eq!(from_json, from_xml);

    assert_eq!(from_json.schemas(), vec![CORE_SCHEMA, ENTERPRISE_EXTENSION]);
    let manager = from_json
        .attribute(ENTERPRISE_EXTENSION, "manager")
        .and_then(|a| a.singular_value())
        .and_then(|v| v.as_complex())
        .unwrap();
    assert_eq!(manager.sub_value("managerId").unwrap().as_str(), Some("26118915"));
}

#[test]
fn test_cross_format_round_trip() {
    let registry = common::registry();
    let json = JsonCodec::new(registry.clone());
    let xml = XmlCodec::new(registry.clone());

    let original = json.decode(fixtures::BJENSEN_JSON.as_bytes(), "User").unwrap();
    let through_xml = xml.decode(&xml.encode(&original).unwrap(), "User").unwrap();
    let back_to_json = json.decode(&json.encode(&through_xml).unwrap(), "User").unwrap();
    assert_eq!(back_to_json, original);
}

#[test]
fn test_json_lists_extension_schemas() {
    let registry = common::registry();
    let json = JsonCodec::new(registry.clone());

    let plain = json.to_value(&fixtures::user(&registry, "alice"));
    assert_eq!(plain["schemas"], serde_json::json!([CORE_SCHEMA]));

    let employee = json.to_value(&fixtures::employee(&registry, "bob", "42"));
    assert_eq!(employee["schemas"], serde_json::json!([CORE_SCHEMA, ENTERPRISE_EXTENSION]));
    assert_eq!(employee[ENTERPRISE_EXTENSION]["employeeNumber"], "42");
    assert!(employee.get("employeeNumber").is_none());
}

#[test]
fn test_xml_plural_elements_use_singular_names() {
    let registry = common::registry();
    let xml = XmlCodec::new(registry.clone());
    let encoded = String::from_utf8(xml.encode(&fixtures::employee(&registry, "bob", "42")).unwrap()).unwrap();

    assert!(encoded.contains("<emails><email>"));
    assert!(encoded.contains(r#"xmlns:ns1="urn:scim:schemas:extension:enterprise:1.0""#));
    assert!(encoded.contains("<ns1:employeeNumber>42</ns1:employeeNumber>"));
}

#[test]
fn test_heterogeneous_list_round_trip() {
    let registry = common::registry();
    let list = ListResponse::new(vec![
        fixtures::user(&registry, "alice"),
        fixtures::group(&registry, "Admins", &["1", "2"]),
    ]);
    assert!(list.is_heterogeneous());

    let json = JsonCodec::new(registry.clone());
    let bytes = json.encode_list(&list).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["totalResults"], 2);
    assert_eq!(value["Resources"][0]["resourceType"], "User");
    assert_eq!(value["Resources"][1]["resourceType"], "Group");
    assert_eq!(json.decode_document(&bytes, None).unwrap(), ScimDocument::List(list.clone()));

    let xml = XmlCodec::new(registry.clone());
    let bytes = xml.encode_list(&list).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains(r#"xsi:type="Group""#));
    assert_eq!(xml.decode_document(&bytes, None).unwrap(), ScimDocument::List(list));
}

#[test]
fn test_homogeneous_list_omits_type_tags() {
    let registry = common::registry();
    let list = ListResponse::new(vec![
        fixtures::user(&registry, "alice"),
        fixtures::user(&registry, "bob"),
    ])
    .with_total(10)
    .with_page(3);

    let json = JsonCodec::new(registry.clone());
    let value: Value = serde_json::from_slice(&json.encode_list(&list).unwrap()).unwrap();
    assert!(value["Resources"][0].get("resourceType").is_none());
    assert_eq!(value["itemsPerPage"], 2);
    assert_eq!(value["startIndex"], 3);

    let xml = XmlCodec::new(registry.clone());
    let decoded = xml
        .decode_document(&xml.encode_list(&list).unwrap(), Some("User"))
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(decoded.total_results, 10);
    assert_eq!(decoded.start_index, Some(3));
    assert_eq!(decoded.resources.len(), 2);
}

#[test]
fn test_error_documents_in_both_formats() {
    let registry = common::registry();
    let errors = vec![
        ErrorEntry::new("Resource 2819c223 not found").with_code("404"),
        ErrorEntry::new("Second problem").with_uri("urn:example:help"),
    ];
    let codecs: Vec<Box<dyn Codec>> = vec![
        Box::new(JsonCodec::new(registry.clone())),
        Box::new(XmlCodec::new(registry.clone())),
    ];
    for codec in &codecs {
        let bytes = codec.encode_errors(&errors).unwrap();
        let decoded = codec.decode_document(&bytes, Some("User")).unwrap();
        assert_eq!(decoded.into_errors(), Some(errors.clone()), "{}", codec.media_type());
    }
}

#[test]
fn test_error_entry_from_scim_error() {
    let entry = ErrorEntry::from(&ScimError::resource_not_found("User", "2819c223"));
    assert_eq!(entry.code.as_deref(), Some("404"));
    assert!(entry.description.contains("2819c223"));
}

#[test]
fn test_unknown_attributes_lenient_and_strict() {
    let registry = common::registry();
    let document = br#"{"schemas":["urn:scim:schemas:core:1.0"],"userName":"bjensen","favoriteColor":"blue"}"#;

    let lenient = JsonCodec::new(registry.clone());
    let decoded = lenient.decode(document, "User").unwrap();
    assert_eq!(decoded.simple_value("userName").unwrap().as_str(), Some("bjensen"));
    assert!(decoded.simple_value("favoriteColor").is_none());

    let strict = JsonCodec::new(registry.clone()).with_strict(true);
    assert!(strict.decode(document, "User").is_err());

    let xml = XmlCodec::new(registry.clone()).with_strict(true);
    let document = br#"<User xmlns="urn:scim:schemas:core:1.0"><userName>b</userName><shoeSize>9</shoeSize></User>"#;
    assert!(xml.decode(document, "User").is_err());
}

#[test]
fn test_empty_plural_is_absent() {
    let registry = common::registry();
    let json = JsonCodec::new(registry.clone());
    let decoded = json
        .decode(br#"{"userName":"bjensen","emails":[]}"#, "User")
        .unwrap();
    assert!(decoded.attribute(CORE_SCHEMA, "emails").is_none());
    let value = json.to_value(&decoded);
    assert!(value.get("emails").is_none());
}

#[test]
fn test_type_mismatch_is_rejected() {
    let registry = common::registry();
    let json = JsonCodec::new(registry.clone());
    assert!(json.decode(br#"{"userName":"bjensen","active":"yes"}"#, "User").is_err());

    let xml = XmlCodec::new(registry);
    let document = br#"<User xmlns="urn:scim:schemas:core:1.0"><active>maybe</active></User>"#;
    assert!(xml.decode(document, "User").is_err());
}

#[test]
fn test_malformed_documents() {
    let registry = common::registry();
    assert!(JsonCodec::new(registry.clone()).decode(b"{not json", "User").is_err());
    assert!(XmlCodec::new(registry).decode(b"<User><userName>", "User").is_err());
}
