//! Property-based checks over generated resources, filters and URIs.
//!
//! Generated data sticks to values each format represents exactly: non-empty
//! strings without surrounding whitespace, so XML text nodes survive intact.

use crate::common::{self, fixtures};
use proptest::prelude::*;
use scim_sdk::client::{LocalTransport, ScimClient};
use scim_sdk::marshal::{Codec, JsonCodec, MediaType, XmlCodec};
use scim_sdk::query::{
    AttributePath, AttributeSelection, CompareOp, Filter, FilterValue, PageSpec, QueryDescriptor, ScimUri, SortSpec,
    StartIndexPolicy,
};
use scim_sdk::resource::{Attribute, AttributeValue, ComplexValue, ScimResource};
use scim_sdk::schema::{CORE_SCHEMA, SchemaRegistry};
use std::sync::Arc;

const TEXT: &str = "[a-zA-Z0-9<&>'._@-]([a-zA-Z0-9<&>' ._@-]{0,14}[a-zA-Z0-9<&>'._@-])?";

#[derive(Debug, Clone)]
struct UserShape {
    user_name: String,
    display_name: Option<String>,
    active: Option<bool>,
    emails: Vec<(String, bool)>,
}

fn user_shape() -> impl Strategy<Value = UserShape> {
    (
        TEXT,
        proptest::option::of(TEXT),
        proptest::option::of(any::<bool>()),
        proptest::collection::vec((TEXT, any::<bool>()), 0..4),
    )
        .prop_map(|(user_name, display_name, active, emails)| UserShape {
            user_name,
            display_name,
            active,
            emails,
        })
}

fn build_user(registry: &SchemaRegistry, shape: &UserShape) -> ScimResource {
    let attr = |name: &str| registry.attribute_descriptor(CORE_SCHEMA, name).unwrap();
    let mut builder = fixtures::user(registry, &shape.user_name).to_builder();
    if let Some(display_name) = &shape.display_name {
        builder.set_attribute(Attribute::singular(attr("displayName"), display_name.as_str()).unwrap());
    }
    if let Some(active) = shape.active {
        builder.set_attribute(Attribute::singular(attr("active"), active).unwrap());
    }
    let emails = attr("emails");
    let values: Vec<AttributeValue> = shape
        .emails
        .iter()
        .map(|(value, primary)| {
            ComplexValue::builder(&emails)
                .with("value", value.as_str())
                .with("primary", *primary)
                .build()
                .unwrap()
                .into()
        })
        .collect();
    builder.set_attribute(Attribute::plural(emails.clone(), values).unwrap());
    builder.build()
}

fn leaf_filter() -> impl Strategy<Value = Filter> {
    let path = prop_oneof![
        Just("userName"),
        Just("displayName"),
        Just("emails.value"),
        Just("name.givenName"),
        Just("urn:scim:schemas:extension:enterprise:1.0:employeeNumber"),
    ]
    .prop_map(|text| AttributePath::parse(text, "filter").unwrap());
    let op = prop_oneof![
        Just(CompareOp::Eq),
        Just(CompareOp::Ne),
        Just(CompareOp::Co),
        Just(CompareOp::Sw),
        Just(CompareOp::Ew),
        Just(CompareOp::Gt),
        Just(CompareOp::Ge),
        Just(CompareOp::Lt),
        Just(CompareOp::Le),
    ];
    let value = prop_oneof![
        "\\PC{0,12}".prop_map(FilterValue::String),
        any::<bool>().prop_map(FilterValue::Boolean),
        any::<i64>().prop_map(FilterValue::from),
    ];
    prop_oneof![
        (path.clone(), op, value).prop_map(|(path, op, value)| Filter::Compare { path, op, value }),
        path.prop_map(Filter::Present),
    ]
}

fn filter() -> impl Strategy<Value = Filter> {
    leaf_filter().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 2..4).prop_map(Filter::And),
            proptest::collection::vec(inner.clone(), 2..4).prop_map(Filter::Or),
            inner.prop_map(|f| f.negate()),
        ]
    })
}

fn query() -> impl Strategy<Value = QueryDescriptor> {
    (
        proptest::option::of(filter()),
        proptest::option::of((any::<bool>(), prop_oneof![Just("userName"), Just("meta.created")])),
        proptest::option::of((1i64..1000, proptest::option::of(0i64..500))),
        any::<bool>(),
    )
        .prop_map(|(filter, sort, page, select)| {
            let mut query = QueryDescriptor::new();
            if let Some(filter) = filter {
                query = query.with_filter(filter);
            }
            if let Some((descending, path)) = sort {
                let path = AttributePath::parse(path, "sortBy").unwrap();
                query = query.with_sort(if descending {
                    SortSpec::descending(path)
                } else {
                    SortSpec::ascending(path)
                });
            }
            if let Some((start, count)) = page {
                query = query.with_page(PageSpec::new(start, count, StartIndexPolicy::Reject).unwrap());
            }
            if select {
                query = query.with_selection(AttributeSelection::parse("userName,emails.value").unwrap());
            }
            query
        })
}

proptest! {
    #[test]
    fn prop_resources_round_trip_through_both_formats(shape in user_shape()) {
        let registry = common::registry();
        let user = build_user(&registry, &shape);
        let json = JsonCodec::new(registry.clone());
        let xml = XmlCodec::new(registry.clone());

        prop_assert_eq!(json.decode(&json.encode(&user).unwrap(), "User").unwrap(), user.clone());
        prop_assert_eq!(xml.decode(&xml.encode(&user).unwrap(), "User").unwrap(), user.clone());
        prop_assert_eq!(json.encode(&user).unwrap(), json.encode(&user.clone()).unwrap());
    }

    #[test]
    fn prop_filter_serialization_is_stable(filter in filter()) {
        let parsed = Filter::parse(&filter.to_string());
        prop_assert!(parsed.is_ok(), "{} did not parse: {:?}", filter, parsed);
        let parsed = parsed.unwrap();
        prop_assert_eq!(Filter::parse(&parsed.to_string()).unwrap(), parsed.clone());
        prop_assert_eq!(parsed.to_string(), Filter::parse(&parsed.to_string()).unwrap().to_string());
    }

    #[test]
    fn prop_query_string_is_stable(query in query()) {
        let text = query.to_query_string();
        let parsed = QueryDescriptor::parse(&text).unwrap();
        prop_assert_eq!(parsed.to_query_string(), text);
        prop_assert_eq!(parsed.page, query.page);
        prop_assert_eq!(parsed.sort, query.sort);
        prop_assert_eq!(parsed.selection, query.selection);
    }

    #[test]
    fn prop_resource_ids_survive_uri_encoding(id in "[a-zA-Z0-9 ./?#%+&=~_é-]{1,24}") {
        let uri = ScimUri::new("/scim", "Users").with_id(id.clone());
        let parsed = ScimUri::parse("/scim", &uri.to_string(), StartIndexPolicy::Clamp).unwrap();
        prop_assert_eq!(parsed.endpoint(), "Users");
        prop_assert_eq!(parsed.id(), Some(id.as_str()));
    }

    #[test]
    fn prop_client_reads_back_what_it_created(shape in user_shape(), xml in any::<bool>()) {
        tokio_test::block_on(async {
            let server = Arc::new(common::server());
            let schemas = server.schema_registry().clone();
            let media = if xml { MediaType::Xml } else { MediaType::Json };
            let client = ScimClient::new(LocalTransport::new(server), schemas.clone(), "/scim").with_media_type(media);

            let created = client.post(&build_user(&schemas, &shape)).await.unwrap();
            assert_eq!(created.simple_value("userName").unwrap().as_str(), Some(shape.user_name.as_str()));
            let fetched = client
                .get("User", created.id().unwrap(), &AttributeSelection::all())
                .await
                .unwrap();
            assert_eq!(fetched, Some(created));
        });
    }
}
