//! Resources and wire documents used across the suite.

use scim_sdk::resource::{Attribute, AttributeValue, ComplexValue, ScimResource};
use scim_sdk::schema::{CORE_SCHEMA, ENTERPRISE_EXTENSION, SchemaRegistry};

/// Babs Jensen as a JSON document, with the enterprise extension.
pub const BJENSEN_JSON: &str = r#"{
  "schemas": ["urn:scim:schemas:core:1.0", "urn:scim:schemas:extension:enterprise:1.0"],
  "userName": "bjensen",
  "name": {"givenName": "Barbara", "familyName": "Jensen"},
  "displayName": "Babs Jensen",
  "active": true,
  "emails": [
    {"value": "bjensen@example.com", "type": "work", "primary": true},
    {"value": "babs@jensen.org", "type": "home"}
  ],
  "urn:scim:schemas:extension:enterprise:1.0": {
    "employeeNumber": "701984",
    "manager": {"managerId": "26118915", "displayName": "John Smith"}
  }
}"#;

/// The same user in the tag/namespace format.
pub const BJENSEN_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<User xmlns="urn:scim:schemas:core:1.0" xmlns:enterprise="urn:scim:schemas:extension:enterprise:1.0">"#,
    "<userName>bjensen</userName>",
    "<name><givenName>Barbara</givenName><familyName>Jensen</familyName></name>",
    "<displayName>Babs Jensen</displayName>",
    "<active>true</active>",
    "<emails>",
    "<email><value>bjensen@example.com</value><type>work</type><primary>true</primary></email>",
    "<email><value>babs@jensen.org</value><type>home</type></email>",
    "</emails>",
    "<enterprise:employeeNumber>701984</enterprise:employeeNumber>",
    "<enterprise:manager><enterprise:managerId>26118915</enterprise:managerId>",
    "<enterprise:displayName>John Smith</enterprise:displayName></enterprise:manager>",
    "</User>"
);

/// Minimal user body carrying only `userName`.
pub fn user_json(user_name: &str) -> Vec<u8> {
    format!(
        r#"{{"schemas":["urn:scim:schemas:core:1.0"],"userName":"{}"}}"#,
        user_name
    )
    .into_bytes()
}

/// A user built through the resource API.
pub fn user(registry: &SchemaRegistry, user_name: &str) -> ScimResource {
    let descriptor = registry.resource_descriptor("User").expect("User is registered");
    let attr = |name: &str| registry.attribute_descriptor(CORE_SCHEMA, name).expect("core attribute");
    ScimResource::builder(&descriptor)
        .with_value(attr("userName"), user_name)
        .expect("valid userName")
        .build()
}

/// A user with a work email and an enterprise employee number.
pub fn employee(registry: &SchemaRegistry, user_name: &str, employee_number: &str) -> ScimResource {
    let emails = registry.attribute_descriptor(CORE_SCHEMA, "emails").expect("emails");
    let work: AttributeValue = ComplexValue::builder(&emails)
        .with("value", format!("{}@example.com", user_name))
        .with("type", "work")
        .with("primary", true)
        .build()
        .expect("valid email")
        .into();
    let number = registry
        .attribute_descriptor(ENTERPRISE_EXTENSION, "employeeNumber")
        .expect("employeeNumber");

    user(registry, user_name)
        .to_builder()
        .with_attribute(Attribute::plural(emails, vec![work]).expect("valid emails"))
        .expect("no duplicate")
        .with_value(number, employee_number)
        .expect("valid employeeNumber")
        .build()
}

/// A group with the given display name and member ids.
pub fn group(registry: &SchemaRegistry, display_name: &str, members: &[&str]) -> ScimResource {
    let descriptor = registry.resource_descriptor("Group").expect("Group is registered");
    let attr = |name: &str| registry.attribute_descriptor(CORE_SCHEMA, name).expect("core attribute");
    let members_descriptor = attr("members");
    let values: Vec<AttributeValue> = members
        .iter()
        .map(|id| {
            ComplexValue::builder(&members_descriptor)
                .with("value", *id)
                .build()
                .expect("valid member")
                .into()
        })
        .collect();

    ScimResource::builder(&descriptor)
        .with_value(attr("displayName"), display_name)
        .expect("valid displayName")
        .with_attribute(Attribute::plural(members_descriptor.clone(), values).expect("valid members"))
        .expect("no duplicate")
        .build()
}
