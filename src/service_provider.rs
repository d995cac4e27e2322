//! Service provider metadata.
//!
//! [`ServiceProviderConfig`] describes what the service supports so clients
//! can discover it at `GET /ServiceProviderConfigs`. It is a typed view over
//! the generic resource model: [`to_resource`](ServiceProviderConfig::to_resource)
//! and [`from_resource`](ServiceProviderConfig::from_resource) convert through
//! the registered `ServiceProviderConfig` descriptor, so either codec can
//! carry it.

use crate::error::{ScimError, ScimResult};
use crate::resource::{Attribute, AttributeValue, ComplexValue, ScimResource, SimpleValue};
use crate::schema::{AttributeDescriptor, ResourceDescriptor, SchemaRegistry};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Resource type name of the service provider configuration.
pub const SERVICE_PROVIDER_CONFIG: &str = "ServiceProviderConfig";

/// Service provider capabilities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceProviderConfig {
    /// Human-readable help for the service
    pub documentation_url: Option<String>,

    #[serde(rename = "patch")]
    pub patch_supported: bool,

    #[serde(rename = "bulk")]
    pub bulk_supported: bool,

    #[serde(rename = "filter")]
    pub filter_supported: bool,

    #[serde(rename = "changePassword")]
    pub change_password_supported: bool,

    #[serde(rename = "sort")]
    pub sort_supported: bool,

    #[serde(rename = "etag")]
    pub etag_supported: bool,

    /// Whether the tag-based (XML) format is served
    #[serde(rename = "xmlDataFormat")]
    pub xml_data_format_supported: bool,

    pub authentication_schemes: Vec<AuthenticationScheme>,

    /// Maximum number of operations in a bulk request
    pub bulk_max_operations: Option<u32>,

    /// Maximum payload size for bulk operations
    pub bulk_max_payload_size: Option<u64>,

    /// Maximum number of resources returned in a query
    pub filter_max_results: Option<u32>,
}

impl Default for ServiceProviderConfig {
    /// Capabilities of the built-in server: PATCH, filtering, sorting, ETags
    /// and both data formats; no bulk or password change.
    fn default() -> Self {
        Self {
            documentation_url: None,
            patch_supported: true,
            bulk_supported: false,
            filter_supported: true,
            change_password_supported: false,
            sort_supported: true,
            etag_supported: true,
            xml_data_format_supported: true,
            authentication_schemes: vec![],
            bulk_max_operations: None,
            bulk_max_payload_size: None,
            filter_max_results: None,
        }
    }
}

/// Authentication scheme definition for service provider config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticationScheme {
    pub name: String,
    pub description: String,
    pub spec_url: Option<String>,
    pub documentation_url: Option<String>,
    /// Authentication type (e.g., "oauth2", "httpbasic")
    #[serde(rename = "type")]
    pub auth_type: String,
    pub primary: bool,
}

impl AuthenticationScheme {
    pub fn new(name: impl Into<String>, description: impl Into<String>, auth_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            auth_type: auth_type.into(),
            ..Self::default()
        }
    }

    /// HTTP Basic authentication as defined by RFC 2617.
    pub fn http_basic() -> Self {
        Self {
            spec_url: Some("http://www.ietf.org/rfc/rfc2617.txt".to_string()),
            ..Self::new("HTTP Basic", "Authentication via the HTTP Basic standard", "httpbasic")
        }
    }

    /// OAuth 2.0 bearer tokens as defined by RFC 6750.
    pub fn oauth_bearer_token() -> Self {
        Self {
            spec_url: Some("http://tools.ietf.org/html/rfc6750".to_string()),
            ..Self::new("OAuth Bearer Token", "Authentication using OAuth 2.0 bearer tokens", "oauthbearertoken")
        }
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    fn to_value(&self, descriptor: &AttributeDescriptor) -> ScimResult<ComplexValue> {
        let mut builder = ComplexValue::builder(descriptor)
            .with("name", self.name.as_str())
            .with("description", self.description.as_str())
            .with_opt("specUrl", self.spec_url.as_deref())
            .with_opt("documentationUrl", self.documentation_url.as_deref())
            .with("type", self.auth_type.as_str());
        if self.primary {
            builder = builder.with("primary", true);
        }
        builder.build()
    }

    fn from_value(value: &ComplexValue) -> Self {
        let text = |name: &str| value.sub_value(name).and_then(SimpleValue::as_str).map(str::to_string);
        Self {
            name: text("name").unwrap_or_default(),
            description: text("description").unwrap_or_default(),
            spec_url: text("specUrl"),
            documentation_url: text("documentationUrl"),
            auth_type: text("type").unwrap_or_default(),
            primary: value
                .sub_value("primary")
                .and_then(SimpleValue::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Resolves attributes of the `ServiceProviderConfig` resource type.
struct Attributes {
    descriptor: Arc<ResourceDescriptor>,
}

impl Attributes {
    fn lookup(registry: &SchemaRegistry) -> ScimResult<Self> {
        registry
            .resource_descriptor(SERVICE_PROVIDER_CONFIG)
            .map(|descriptor| Self { descriptor })
            .ok_or_else(|| ScimError::UnsupportedResourceType(SERVICE_PROVIDER_CONFIG.to_string()))
    }

    fn get(&self, name: &str) -> ScimResult<Arc<AttributeDescriptor>> {
        self.descriptor
            .attribute(name)
            .cloned()
            .ok_or_else(|| ScimError::unknown_attribute(self.descriptor.schema(), name))
    }

    fn supported(&self, name: &str, supported: bool) -> ScimResult<Attribute> {
        let descriptor = self.get(name)?;
        let value = ComplexValue::builder(&descriptor)
            .with("supported", supported)
            .build()?;
        Attribute::singular(descriptor, value)
    }
}

fn to_integer<T: TryInto<i64>>(value: T) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

impl ServiceProviderConfig {
    /// Render as a generic resource of type `ServiceProviderConfig`.
    pub fn to_resource(&self, registry: &SchemaRegistry) -> ScimResult<ScimResource> {
        let attributes = Attributes::lookup(registry)?;
        let mut builder = ScimResource::builder(&attributes.descriptor);

        if let Some(url) = &self.documentation_url {
            builder.add_attribute(Attribute::singular(attributes.get("documentationUrl")?, url.as_str())?)?;
        }
        builder.add_attribute(attributes.supported("patch", self.patch_supported)?)?;

        let bulk = attributes.get("bulk")?;
        let value = ComplexValue::builder(&bulk)
            .with("supported", self.bulk_supported)
            .with_opt("maxOperations", self.bulk_max_operations.map(to_integer))
            .with_opt("maxPayloadSize", self.bulk_max_payload_size.map(to_integer))
            .build()?;
        builder.add_attribute(Attribute::singular(bulk, value)?)?;

        let filter = attributes.get("filter")?;
        let value = ComplexValue::builder(&filter)
            .with("supported", self.filter_supported)
            .with_opt("maxResults", self.filter_max_results.map(to_integer))
            .build()?;
        builder.add_attribute(Attribute::singular(filter, value)?)?;

        builder.add_attribute(attributes.supported("changePassword", self.change_password_supported)?)?;
        builder.add_attribute(attributes.supported("sort", self.sort_supported)?)?;
        builder.add_attribute(attributes.supported("etag", self.etag_supported)?)?;
        builder.add_attribute(attributes.supported("xmlDataFormat", self.xml_data_format_supported)?)?;

        let schemes = attributes.get("authenticationSchemes")?;
        let values = self
            .authentication_schemes
            .iter()
            .map(|scheme| scheme.to_value(&schemes).map(AttributeValue::from))
            .collect::<ScimResult<Vec<_>>>()?;
        builder.add_attribute(Attribute::plural(schemes, values)?)?;

        Ok(builder.build())
    }

    /// Read back a `ServiceProviderConfig` resource. Missing capabilities
    /// read as unsupported.
    pub fn from_resource(resource: &ScimResource) -> ScimResult<Self> {
        if resource.resource_type() != SERVICE_PROVIDER_CONFIG {
            return Err(ScimError::invalid_request(format!(
                "Expected a {} resource, got {}",
                SERVICE_PROVIDER_CONFIG,
                resource.resource_type()
            )));
        }
        let complex = |name: &str| {
            resource
                .attribute(resource.primary_schema(), name)
                .and_then(Attribute::singular_value)
                .and_then(AttributeValue::as_complex)
        };
        let flag = |name: &str| {
            complex(name)
                .and_then(|c| c.sub_value("supported"))
                .and_then(SimpleValue::as_bool)
                .unwrap_or(false)
        };
        let integer = |name: &str, sub: &str| {
            complex(name)
                .and_then(|c| c.sub_value(sub))
                .and_then(SimpleValue::as_integer)
        };

        let authentication_schemes = resource
            .attribute(resource.primary_schema(), "authenticationSchemes")
            .map(Attribute::all_values)
            .unwrap_or_default()
            .iter()
            .filter_map(AttributeValue::as_complex)
            .map(AuthenticationScheme::from_value)
            .collect();

        Ok(Self {
            documentation_url: resource
                .simple_value("documentationUrl")
                .and_then(SimpleValue::as_str)
                .map(str::to_string),
            patch_supported: flag("patch"),
            bulk_supported: flag("bulk"),
            filter_supported: flag("filter"),
            change_password_supported: flag("changePassword"),
            sort_supported: flag("sort"),
            etag_supported: flag("etag"),
            xml_data_format_supported: flag("xmlDataFormat"),
            authentication_schemes,
            bulk_max_operations: integer("bulk", "maxOperations").and_then(|v| u32::try_from(v).ok()),
            bulk_max_payload_size: integer("bulk", "maxPayloadSize").and_then(|v| u64::try_from(v).ok()),
            filter_max_results: integer("filter", "maxResults").and_then(|v| u32::try_from(v).ok()),
        })
    }
}
