//! Server configuration.
//!
//! [`ServerConfig`] is plain data: build it in code or load it from a JSON
//! file with [`ServerConfig::from_file`]. Every field has a default, so a
//! file only needs the settings it changes:
//!
//! ```json
//! {
//!   "baseUri": "/scim",
//!   "maxResults": 50,
//!   "strictDecode": true,
//!   "startIndexPolicy": "reject",
//!   "defaultMediaType": "xml"
//! }
//! ```

use crate::error::{BuildError, ConfigError};
use crate::marshal::MediaType;
use crate::query::StartIndexPolicy;
use crate::query::uri::normalize_base;
use crate::service_provider::ServiceProviderConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings applied by [`ScimServerBuilder`](crate::server::ScimServerBuilder).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Path prefix (or absolute URL) under which endpoints are served.
    pub base_uri: String,

    /// Upper bound on resources returned by one query; requested counts
    /// above it are reduced.
    pub max_results: u64,

    /// Reject request bodies with attributes the schema registry does not
    /// know, and queries naming such attributes.
    pub strict_decode: bool,

    pub start_index_policy: StartIndexPolicy,

    /// Format used when the request neither asks for one nor sends a body.
    pub default_media_type: MediaType,

    /// Header letting POST stand in for PUT, PATCH and DELETE.
    pub method_override_header: String,

    pub service_provider: ServiceProviderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_uri: "/".to_string(),
            max_results: 100,
            strict_decode: false,
            start_index_policy: StartIndexPolicy::Clamp,
            default_media_type: MediaType::Json,
            method_override_header: "X-HTTP-Method-Override".to_string(),
            service_provider: ServiceProviderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Base URI as used for routing and `Location` headers.
    pub fn normalized_base(&self) -> String {
        normalize_base(&self.base_uri)
    }

    /// Check settings that would leave the server unusable.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_results == 0 {
            return Err(BuildError::InvalidConfiguration {
                message: "maxResults must be at least 1".to_string(),
            });
        }
        if self.method_override_header.trim().is_empty() {
            return Err(BuildError::InvalidConfiguration {
                message: "methodOverrideHeader cannot be empty".to_string(),
            });
        }
        let base = self.base_uri.trim();
        if base.contains(['?', '#']) {
            return Err(BuildError::InvalidConfiguration {
                message: format!("baseUri '{}' must not carry a query or fragment", base),
            });
        }
        if let Some((scheme, _)) = base.split_once("://") {
            if scheme != "http" && scheme != "https" {
                return Err(BuildError::InvalidConfiguration {
                    message: format!("baseUri '{}' must use http or https", base),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.base_uri, "/");
        assert_eq!(config.max_results, 100);
        assert!(!config.strict_decode);
        assert_eq!(config.start_index_policy, StartIndexPolicy::Clamp);
        assert_eq!(config.default_media_type, MediaType::Json);
        assert_eq!(config.method_override_header, "X-HTTP-Method-Override");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: ServerConfig = serde_json::from_str(
            r#"{"baseUri": "scim/", "startIndexPolicy": "reject", "defaultMediaType": "xml",
                "serviceProvider": {"bulk": true}}"#,
        )
        .unwrap();
        assert_eq!(config.normalized_base(), "/scim");
        assert_eq!(config.start_index_policy, StartIndexPolicy::Reject);
        assert_eq!(config.default_media_type, MediaType::Xml);
        assert_eq!(config.max_results, 100);
        assert!(config.service_provider.bulk_supported);
        assert!(config.service_provider.patch_supported);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServerConfig {
            max_results: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        config.max_results = 10;
        config.base_uri = "ldap://directory".to_string();
        assert!(config.validate().is_err());

        config.base_uri = "https://scim.example.com/v1?x=1".to_string();
        assert!(config.validate().is_err());

        config.base_uri = "https://scim.example.com/v1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("scim-config-{}.json", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"maxResults": 25, "strictDecode": true}"#).unwrap();
        drop(file);

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.max_results, 25);
        assert!(config.strict_decode);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            ServerConfig::from_file(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
