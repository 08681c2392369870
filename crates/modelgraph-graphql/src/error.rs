//! Error types for schema generation and GraphQL requests.

use std::fmt;

use async_graphql::ErrorExtensions;
use modelgraph_core::{ModelError, RegistryError, StoreError};

/// Errors raised while generating the schema.
///
/// Any of these is fatal at startup: no partial schema is ever served.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The model registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A model cannot be exposed.
    #[error(transparent)]
    InvalidModel(#[from] ModelError),

    /// Two entries produce the same root query field.
    #[error("Query field '{name}' is generated more than once")]
    DuplicateQueryField {
        /// Clashing field name.
        name: String,
    },

    /// A generated type name is taken by another type.
    #[error("Type name '{name}' generated for model {model} is already in use")]
    TypeNameCollision {
        /// Clashing type name.
        name: String,
        /// Model whose type clashed.
        model: String,
    },

    /// A connection argument name is produced twice.
    #[error("Argument '{argument}' of connection field for {model} is generated more than once")]
    ArgumentCollision {
        /// Model name.
        model: String,
        /// Clashing argument name.
        argument: String,
    },

    /// async-graphql rejected the assembled schema.
    #[error("Failed to build GraphQL schema: {0}")]
    Build(String),
}

impl From<async_graphql::dynamic::SchemaError> for SchemaError {
    fn from(err: async_graphql::dynamic::SchemaError) -> Self {
        Self::Build(err.to_string())
    }
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug)]
pub enum GraphQLError {
    /// Invalid request or query syntax.
    InvalidQuery(String),

    /// Store error.
    Storage(String),

    /// Validation error.
    Validation(String),

    /// Internal server error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery(msg) => write!(f, "Invalid GraphQL query: {msg}"),
            Self::Storage(msg) => write!(f, "Storage error: {msg}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) | Self::Validation(_) => 400,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ErrorExtensions for GraphQLError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", self.error_code()))
    }
}

impl From<StoreError> for GraphQLError {
    fn from(err: StoreError) -> Self {
        if err.is_client_error() {
            Self::Validation(err.to_string())
        } else {
            Self::Storage(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GraphQLError::InvalidQuery("test".into()).status_code(), 400);
        assert_eq!(GraphQLError::Validation("test".into()).status_code(), 400);
        assert_eq!(GraphQLError::Storage("test".into()).status_code(), 500);
        assert_eq!(GraphQLError::Internal("test".into()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GraphQLError::InvalidQuery("x".into()).error_code(),
            "INVALID_QUERY"
        );
        assert_eq!(GraphQLError::Internal("x".into()).error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_from_store_error() {
        let err: GraphQLError = StoreError::unknown_field("api.Widget", "colour").into();
        assert_eq!(err.status_code(), 400);

        let err: GraphQLError = StoreError::internal("disk on fire").into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_extensions_carry_error_code() {
        let err = GraphQLError::Validation("bad filter".into()).extend();
        assert_eq!(err.message, "Validation error: bad filter");
        assert!(err.extensions.is_some());
    }

    #[test]
    fn test_schema_error_messages() {
        let err = SchemaError::DuplicateQueryField {
            name: "all_Widget".into(),
        };
        assert_eq!(
            err.to_string(),
            "Query field 'all_Widget' is generated more than once"
        );

        let err: SchemaError = RegistryError::UnknownNamespace {
            namespace: "api".into(),
        }
        .into();
        assert!(matches!(err, SchemaError::Registry(_)));
    }
}
