//! Embedded SCIM 1.0 schema definitions.
//!
//! These are loaded by [`SchemaRegistry::with_core_schemas`](super::SchemaRegistry::with_core_schemas)
//! so a server can run without external schema files.

/// Core schema URI shared by User, Group and ServiceProviderConfig.
pub const CORE_SCHEMA: &str = "urn:scim:schemas:core:1.0";

/// Enterprise user extension schema URI.
pub const ENTERPRISE_EXTENSION: &str = "urn:scim:schemas:extension:enterprise:1.0";

/// The SCIM 1.0 core schema with the User, Group and ServiceProviderConfig
/// resource types.
pub fn core_schema() -> &'static str {
    r#"{
  "schema": "urn:scim:schemas:core:1.0",
  "attributes": [
    {"name": "id", "caseExact": true, "description": "Unique identifier assigned by the service provider"},
    {"name": "externalId", "caseExact": true},
    {"name": "userName", "required": true, "description": "Unique identifier for the user"},
    {"name": "name", "subAttributes": [
      {"name": "formatted"},
      {"name": "familyName"},
      {"name": "givenName"},
      {"name": "middleName"},
      {"name": "honorificPrefix"},
      {"name": "honorificSuffix"}
    ]},
    {"name": "displayName"},
    {"name": "nickName"},
    {"name": "profileUrl"},
    {"name": "title"},
    {"name": "userType"},
    {"name": "preferredLanguage"},
    {"name": "locale"},
    {"name": "timezone"},
    {"name": "active", "type": "boolean"},
    {"name": "password", "caseExact": true},
    {"name": "emails", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "phoneNumbers", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "ims", "plural": true, "pluralElement": "im", "subAttributes": [
      {"name": "type"},
      {"name": "value"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "photos", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "addresses", "plural": true, "pluralElement": "address", "subAttributes": [
      {"name": "type"},
      {"name": "formatted"},
      {"name": "streetAddress"},
      {"name": "locality"},
      {"name": "region"},
      {"name": "postalCode"},
      {"name": "country"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "groups", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value", "caseExact": true},
      {"name": "display"}
    ]},
    {"name": "entitlements", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "roles", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "x509Certificates", "plural": true, "subAttributes": [
      {"name": "value", "type": "binary"}
    ]},
    {"name": "members", "plural": true, "subAttributes": [
      {"name": "type"},
      {"name": "value", "caseExact": true},
      {"name": "display"}
    ]},
    {"name": "documentationUrl"},
    {"name": "patch", "subAttributes": [{"name": "supported", "type": "boolean"}]},
    {"name": "bulk", "subAttributes": [
      {"name": "supported", "type": "boolean"},
      {"name": "maxOperations", "type": "integer"},
      {"name": "maxPayloadSize", "type": "integer"}
    ]},
    {"name": "filter", "subAttributes": [
      {"name": "supported", "type": "boolean"},
      {"name": "maxResults", "type": "integer"}
    ]},
    {"name": "changePassword", "subAttributes": [{"name": "supported", "type": "boolean"}]},
    {"name": "sort", "subAttributes": [{"name": "supported", "type": "boolean"}]},
    {"name": "etag", "subAttributes": [{"name": "supported", "type": "boolean"}]},
    {"name": "xmlDataFormat", "subAttributes": [{"name": "supported", "type": "boolean"}]},
    {"name": "authenticationSchemes", "plural": true, "subAttributes": [
      {"name": "name"},
      {"name": "description"},
      {"name": "specUrl"},
      {"name": "documentationUrl"},
      {"name": "type"},
      {"name": "primary", "type": "boolean"}
    ]},
    {"name": "meta", "subAttributes": [
      {"name": "created", "type": "dateTime"},
      {"name": "lastModified", "type": "dateTime"},
      {"name": "location"},
      {"name": "version"}
    ]}
  ],
  "resources": [
    {
      "name": "User",
      "endpoint": "Users",
      "description": "User Account",
      "attributes": [
        "id", "externalId", "userName", "name", "displayName", "nickName",
        "profileUrl", "title", "userType", "preferredLanguage", "locale",
        "timezone", "active", "password", "emails", "phoneNumbers", "ims",
        "photos", "addresses", "groups", "entitlements", "roles",
        "x509Certificates", "meta"
      ]
    },
    {
      "name": "Group",
      "endpoint": "Groups",
      "description": "Group",
      "attributes": ["id", "externalId", "displayName", "members", "meta"]
    },
    {
      "name": "ServiceProviderConfig",
      "endpoint": "ServiceProviderConfigs",
      "description": "Service Provider Configuration",
      "attributes": [
        "documentationUrl", "patch", "bulk", "filter", "changePassword",
        "sort", "etag", "xmlDataFormat", "authenticationSchemes"
      ]
    }
  ]
}"#
}

/// The enterprise user extension schema. It declares attributes only; they
/// appear on User resources under their own schema URI.
pub fn enterprise_extension() -> &'static str {
    r#"{
  "schema": "urn:scim:schemas:extension:enterprise:1.0",
  "attributes": [
    {"name": "employeeNumber"},
    {"name": "costCenter"},
    {"name": "organization"},
    {"name": "division"},
    {"name": "department"},
    {"name": "manager", "subAttributes": [
      {"name": "managerId", "caseExact": true},
      {"name": "displayName"}
    ]}
  ]
}"#
}
