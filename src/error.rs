//! Error types for SCIM marshalling, query and dispatch operations.
//!
//! Codec, query-parser and dispatch failures are returned to the immediate
//! caller as [`ScimError`]. Backend adapters report failures through
//! [`AdapterError`], which the dispatch layer wraps without retrying.

use std::error::Error as StdError;

/// Main error type for SCIM operations.
///
/// Every variant maps to an HTTP status through [`ScimError::status_code`] so
/// the transport boundary can translate it into an error document.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Duplicate registration of a schema identity
    #[error("Schema conflict: {identity} is already registered")]
    SchemaConflict { identity: String },

    /// Structurally invalid JSON or XML document
    #[error("Malformed document: {message}")]
    MalformedDocument { message: String },

    /// Attribute that cannot be resolved against the schema registry
    #[error("Unknown attribute '{attribute}' in schema '{schema}'")]
    UnknownAttribute { schema: String, attribute: String },

    /// Value does not match the type declared by its descriptor
    #[error("Attribute '{attribute}' has invalid value, expected {expected}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Singular value supplied for a plural attribute or vice versa
    #[error("Attribute '{attribute}' must be {expected}")]
    PluralityMismatch {
        attribute: String,
        expected: &'static str,
    },

    /// Same attribute name used twice within one value
    #[error("Attribute '{attribute}' appears more than once")]
    DuplicateAttribute { attribute: String },

    /// Filter expression could not be parsed
    #[error("Invalid filter at position {position} near '{fragment}': {message}")]
    InvalidFilter {
        message: String,
        fragment: String,
        position: usize,
    },

    /// Bad attributes, sort or paging parameter value
    #[error("Invalid query parameter '{parameter}': {message}")]
    InvalidQueryParameter { parameter: String, message: String },

    /// Resource not found
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// Failure reported by a backend adapter
    #[error("Adapter failure: {0}")]
    AdapterFailure(#[source] AdapterError),

    /// Second query adapter for the same endpoint, or the same adapter twice
    #[error("An adapter is already registered for {endpoint}")]
    DuplicateAdapterRegistration { endpoint: String },

    /// No resource descriptor or adapter serves the requested endpoint
    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// Request or response media type is not one of the supported formats
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Operation the server does not implement
    #[error("Operation '{operation}' is not implemented")]
    NotImplemented { operation: String },

    /// If-Match precondition did not hold
    #[error("Precondition failed: expected {expected}, current {current}")]
    PreconditionFailed { expected: String, current: String },

    /// Invalid request format or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Error document returned by a remote SCIM service
    #[error("SCIM service returned {status}: {description}")]
    Remote {
        status: u16,
        description: String,
        code: Option<String>,
    },

    /// Internal server errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors reported by backend adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The backend has no entry for the resource
    #[error("{resource_type} {id} does not exist")]
    NotFound { resource_type: String, id: String },

    /// The change conflicts with existing backend state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backend rejected the caller's credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller may not perform the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The backend could not be reached or timed out
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Any other backend error
    #[error("{0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

/// Errors that can occur while building a server.
///
/// These are fatal at startup; a server is never returned half-configured.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No schema registry was supplied
    #[error("A schema registry is required but was not provided")]
    MissingSchemaRegistry,

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Registration performed during build failed
    #[error("Registration failed: {0}")]
    Registration(#[from] ScimError),
}

/// Errors raised while loading configuration or schema files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A schema document that parses but is inconsistent
    #[error("Invalid schema definition: {message}")]
    InvalidDefinition { message: String },

    #[error(transparent)]
    Registry(#[from] ScimError),
}

/// Result type for SCIM operations.
pub type ScimResult<T> = Result<T, ScimError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for server building.
pub type BuildResult<T> = Result<T, BuildError>;

impl ScimError {
    /// Create a schema conflict error for the colliding identity
    pub fn schema_conflict(identity: impl Into<String>) -> Self {
        Self::SchemaConflict {
            identity: identity.into(),
        }
    }

    /// Create a malformed document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create an unknown attribute error
    pub fn unknown_attribute(schema: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            schema: schema.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid query parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQueryParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status code used when this error reaches the transport boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedDocument { .. }
            | Self::UnknownAttribute { .. }
            | Self::TypeMismatch { .. }
            | Self::PluralityMismatch { .. }
            | Self::DuplicateAttribute { .. }
            | Self::InvalidFilter { .. }
            | Self::InvalidQueryParameter { .. }
            | Self::UnsupportedMediaType(_)
            | Self::InvalidRequest { .. } => 400,
            Self::ResourceNotFound { .. } | Self::UnsupportedResourceType(_) => 404,
            Self::AdapterFailure(inner) => match inner {
                AdapterError::NotFound { .. } => 404,
                AdapterError::Conflict(_) => 409,
                AdapterError::Unauthorized(_) => 401,
                AdapterError::Forbidden(_) => 403,
                AdapterError::Unavailable(_) | AdapterError::Backend(_) => 500,
            },
            Self::PreconditionFailed { .. } => 412,
            Self::NotImplemented { .. } => 501,
            Self::Remote { status, .. } => *status,
            Self::SchemaConflict { .. }
            | Self::DuplicateAdapterRegistration { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Machine-readable code carried in error documents.
    pub fn error_code(&self) -> String {
        match self {
            Self::Remote {
                code: Some(code), ..
            } => code.clone(),
            _ => self.status_code().to_string(),
        }
    }
}

impl From<AdapterError> for ScimError {
    fn from(error: AdapterError) -> Self {
        match error {
            AdapterError::NotFound { resource_type, id } => {
                Self::ResourceNotFound { resource_type, id }
            }
            other => Self::AdapterFailure(other),
        }
    }
}

impl AdapterError {
    /// Wrap an arbitrary backend error
    pub fn backend<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}
