//! Query strings, request URIs and in-process filter evaluation.

use crate::common::{self, fixtures};
use scim_sdk::marshal::MediaType;
use scim_sdk::query::matcher::{matches, sort_resources};
use scim_sdk::query::{
    AttributePath, AttributeSelection, CompareOp, Filter, PageSpec, QueryDescriptor, ScimUri, SortSpec,
    StartIndexPolicy,
};
use scim_sdk::resource::ScimResource;
use scim_sdk::schema::ENTERPRISE_EXTENSION;

#[test]
fn test_query_string_round_trip() {
    let query = QueryDescriptor::parse(
        "?attributes=userName,emails.value&filter=userName%20sw%20%22b%22%20and%20active%20eq%20true\
         &sortBy=userName&sortOrder=descending&startIndex=11&count=10",
    )
    .unwrap();

    assert_eq!(query.selection.paths().len(), 2);
    assert_eq!(
        query.filter,
        Some(Filter::compare(AttributePath::new("userName"), CompareOp::Sw, "b").and(Filter::eq("active", true)))
    );
    assert_eq!(query.sort, Some(SortSpec::descending(AttributePath::new("userName"))));
    let page = query.page.unwrap();
    assert_eq!((page.start_index(), page.count()), (11, Some(10)));

    assert_eq!(QueryDescriptor::parse(&query.to_query_string()).unwrap(), query);
}

#[test]
fn test_defaults_are_not_serialized() {
    let query = QueryDescriptor::new().with_sort(SortSpec::ascending(AttributePath::new("userName")));
    assert_eq!(query.to_query_string(), "sortBy=userName");
    assert_eq!(QueryDescriptor::new().to_query_string(), "");
    assert!(QueryDescriptor::parse("unrelated=1").unwrap().is_empty());
}

#[test]
fn test_repeated_parameter_is_rejected() {
    assert!(QueryDescriptor::parse("count=1&count=2").is_err());
}

#[test]
fn test_start_index_policies() {
    let clamped = QueryDescriptor::parse("startIndex=0").unwrap();
    assert_eq!(clamped.page.unwrap().start_index(), 1);
    assert!(QueryDescriptor::parse_with("startIndex=0", StartIndexPolicy::Reject).is_err());
    assert!(QueryDescriptor::parse("startIndex=ten").is_err());
}

#[test]
fn test_uri_round_trip_with_encoded_id_and_suffix() {
    let query = QueryDescriptor::new().with_selection(AttributeSelection::parse("displayName").unwrap());
    let uri = ScimUri::new("https://example.com/scim/", "Users")
        .with_id("a b/c")
        .with_suffix(MediaType::Xml)
        .with_query(query.clone());

    let text = uri.to_string();
    assert!(text.starts_with("https://example.com/scim/Users/a%20b%2Fc.xml?"));

    let target = text.trim_start_matches("https://example.com");
    let parsed = ScimUri::parse("https://example.com/scim", target, StartIndexPolicy::Clamp).unwrap();
    assert_eq!(parsed.endpoint(), "Users");
    assert_eq!(parsed.id(), Some("a b/c"));
    assert_eq!(parsed.suffix(), Some(MediaType::Xml));
    assert_eq!(parsed.query(), &query);
}

#[test]
fn test_uri_outside_base_is_rejected() {
    assert!(ScimUri::parse("/scim", "/other/Users", StartIndexPolicy::Clamp).is_err());
    assert!(ScimUri::parse("/scim", "/scim/Users/1/extra", StartIndexPolicy::Clamp).is_err());
}

#[test]
fn test_filters_evaluate_against_resources() {
    let registry = common::registry();
    let bob = fixtures::employee(&registry, "bob", "42");
    let alice = fixtures::user(&registry, "alice");

    let by_name = Filter::parse(r#"userName eq "BOB""#).unwrap();
    assert!(matches(&by_name, &bob));
    assert!(!matches(&by_name, &alice));

    let by_email = Filter::parse(r#"emails co "@example.com""#).unwrap();
    assert!(matches(&by_email, &bob));

    let extension = Filter::parse(&format!("{}:employeeNumber pr", ENTERPRISE_EXTENSION)).unwrap();
    assert!(matches(&extension, &bob));
    assert!(!matches(&extension, &alice));
    assert!(matches(&extension.negate(), &alice));
}

#[test]
fn test_sort_ignores_case_and_puts_missing_values_last() {
    let registry = common::registry();
    let unnamed = ScimResource::builder(&registry.resource_descriptor("Group").unwrap()).build();
    let mut resources = vec![
        unnamed,
        fixtures::group(&registry, "Zeta", &[]),
        fixtures::group(&registry, "alpha", &[]),
        fixtures::group(&registry, "Mid", &[]),
    ];
    for sort in [
        SortSpec::ascending(AttributePath::new("displayName")),
        SortSpec::descending(AttributePath::new("displayName")),
    ] {
        sort_resources(&mut resources, &sort);
        assert!(resources[3].simple_value("displayName").is_none());
    }

    sort_resources(&mut resources, &SortSpec::ascending(AttributePath::new("displayName")));
    let names: Vec<_> = resources[..3]
        .iter()
        .filter_map(|r| r.simple_value("displayName")?.as_str())
        .collect();
    assert_eq!(names, vec!["alpha", "Mid", "Zeta"]);
}

#[test]
fn test_validation_against_registry() {
    let registry = common::registry();
    let user = registry.resource_descriptor("User").unwrap();

    let known = QueryDescriptor::parse("filter=name.givenName%20eq%20%22B%22&sortBy=userName").unwrap();
    assert!(known.validate(&registry, &user).is_ok());

    let unknown = QueryDescriptor::parse("sortBy=shoeSize").unwrap();
    assert!(unknown.validate(&registry, &user).is_err());

    let extension = QueryDescriptor::parse(&format!("attributes={}:employeeNumber", ENTERPRISE_EXTENSION)).unwrap();
    assert!(extension.validate(&registry, &user).is_ok());
}

#[test]
fn test_page_capping() {
    let page = PageSpec::new(5, Some(500), StartIndexPolicy::Clamp).unwrap();
    let capped = page.capped(100);
    assert_eq!(capped.start_index(), 5);
    assert_eq!(capped.count(), Some(100));
    assert_eq!(PageSpec::default().capped(25).count(), Some(25));
}
