//! Error types for model metadata, registries and record stores.

/// Errors raised while validating a model description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The model name cannot be used as a GraphQL type name.
    #[error("Invalid model name '{name}': must match [_A-Za-z][_0-9A-Za-z]*")]
    InvalidModelName {
        /// The offending name.
        name: String,
    },

    /// A field name cannot be used as a GraphQL field name.
    #[error("Invalid field name '{field}' on model {model}")]
    InvalidFieldName {
        /// The model declaring the field.
        model: String,
        /// The offending field name.
        field: String,
    },

    /// Two fields share the same name.
    #[error("Duplicate field '{field}' on model {model}")]
    DuplicateField {
        /// The model declaring the fields.
        model: String,
        /// The duplicated field name.
        field: String,
    },

    /// The declared primary key is not one of the model's fields.
    #[error("Primary key '{primary_key}' is not a field of model {model}")]
    MissingPrimaryKey {
        /// The model.
        model: String,
        /// The declared primary key field name.
        primary_key: String,
    },

    /// The primary key field has a type that cannot identify a record.
    #[error("Primary key '{primary_key}' of model {model} cannot be of type {field_type}")]
    UnsupportedPrimaryKey {
        /// The model.
        model: String,
        /// The primary key field name.
        primary_key: String,
        /// The field type tag.
        field_type: String,
    },

    /// A field collides with one of the synthetic identity fields.
    #[error("Field '{field}' on model {model} collides with a generated identity field")]
    ReservedFieldName {
        /// The model.
        model: String,
        /// The colliding field name.
        field: String,
    },

    /// A raw value could not be coerced to a field's type.
    #[error("Enter a valid value for field '{field}': {value:?}")]
    InvalidValue {
        /// The field the value was meant for.
        field: String,
        /// The raw input.
        value: String,
    },
}

/// Errors raised by a model registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No application is registered under the requested namespace.
    #[error("No installed app with label '{namespace}'")]
    UnknownNamespace {
        /// The requested namespace.
        namespace: String,
    },

    /// The same model is registered twice in one namespace.
    #[error("Model '{name}' is registered more than once in app '{namespace}'")]
    DuplicateModel {
        /// The namespace.
        namespace: String,
        /// The duplicated model name.
        name: String,
    },

    /// A registered model failed validation.
    #[error(transparent)]
    InvalidModel(#[from] ModelError),

    /// The model manifest could not be parsed.
    #[error("Invalid model manifest: {message}")]
    Manifest {
        /// Parser diagnostics.
        message: String,
    },

    /// The model manifest could not be read.
    #[error("Failed to read model manifest: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Creates a new `Manifest` error.
    #[must_use]
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }
}

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has no table for the requested model.
    #[error("Unknown model: {model}")]
    UnknownModel {
        /// The model label.
        model: String,
    },

    /// A lookup or ordering referenced a field the model does not have.
    #[error("Cannot resolve keyword '{field}' into field of {model}")]
    UnknownField {
        /// The model label.
        model: String,
        /// The unresolved field name.
        field: String,
    },

    /// A record is malformed.
    #[error("Invalid record: {message}")]
    InvalidRecord {
        /// Description of why the record is invalid.
        message: String,
    },

    /// Fixture data could not be loaded.
    #[error("Fixture error: {message}")]
    Fixture {
        /// Description of the failure.
        message: String,
    },

    /// An internal store error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `UnknownModel` error.
    #[must_use]
    pub fn unknown_model(model: impl Into<String>) -> Self {
        Self::UnknownModel {
            model: model.into(),
        }
    }

    /// Creates a new `UnknownField` error.
    #[must_use]
    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Creates a new `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a new `Fixture` error.
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the error was caused by the caller's query rather
    /// than by the store itself.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownModel { .. } | Self::UnknownField { .. })
    }
}
