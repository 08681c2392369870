//! Model metadata.
//!
//! A [`ModelDescriptor`] is the framework-level description of a persisted
//! record type: its application label, its name, its ordered fields and the
//! field acting as primary key. Descriptors are plain data so that any
//! registry (a manifest, an ORM's reflection layer, a test fixture) can
//! produce them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// Primary key field name used when a model does not declare one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Names generated on every object type; model fields may not shadow them.
const IDENTITY_FIELD: &str = "id";
const RAW_ID_FIELD: &str = "_id";

/// The type tag of a model field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Auto-incrementing integer, usually the primary key.
    Auto,
    /// Integer value.
    Integer,
    /// Floating point value.
    Float,
    /// Arbitrary precision decimal, carried as a string.
    Decimal,
    /// Boolean value.
    Boolean,
    /// Text of any length.
    Text,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Time of day.
    Time,
    /// UUID.
    Uuid,
    /// Reference to another model's primary key.
    ForeignKey {
        /// Name of the referenced model.
        to: String,
    },
    /// References to any number of another model's records, stored as an
    /// array of primary keys.
    ManyToMany {
        /// Name of the referenced model.
        to: String,
    },
    /// Homogeneous array of values.
    Array {
        /// Type of the array elements.
        item: Box<FieldType>,
    },
    /// Free-form JSON document.
    Json,
    /// Relation whose target model is chosen per record.
    GenericRelation,
}

impl FieldType {
    /// Returns the serialized tag of this type.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Time => "time",
            Self::Uuid => "uuid",
            Self::ForeignKey { .. } => "foreign_key",
            Self::ManyToMany { .. } => "many_to_many",
            Self::Array { .. } => "array",
            Self::Json => "json",
            Self::GenericRelation => "generic_relation",
        }
    }

    /// Returns `true` if values of this type cannot be compared by equality
    /// or set membership in the underlying store.
    #[must_use]
    pub fn is_filter_exempt(&self) -> bool {
        matches!(
            self,
            Self::Array { .. } | Self::Json | Self::GenericRelation
        )
    }

    /// Returns the referenced model of a relation field.
    #[must_use]
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            Self::ForeignKey { to } | Self::ManyToMany { to } => Some(to),
            _ => None,
        }
    }

    /// Returns `true` for integral types.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Auto | Self::Integer)
    }

    /// Coerces a raw string, as received in a filter list or a global id,
    /// into the JSON representation the store holds for this type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] if the input does not parse, or
    /// if the type has no scalar representation.
    pub fn parse_raw(&self, field: &str, raw: &str) -> Result<Value, ModelError> {
        let invalid = || ModelError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
        };
        let trimmed = raw.trim();

        match self {
            Self::Auto | Self::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid()),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(invalid),
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            Self::Decimal | Self::Text | Self::Date | Self::DateTime | Self::Time | Self::Uuid => {
                Ok(Value::String(raw.to_string()))
            }
            // Target key type is unknown here; integral keys are the common case.
            Self::ForeignKey { .. } | Self::ManyToMany { .. } => Ok(trimmed
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string()))),
            Self::Array { .. } | Self::Json | Self::GenericRelation => Err(invalid()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignKey { to } => write!(f, "foreign_key({to})"),
            Self::ManyToMany { to } => write!(f, "many_to_many({to})"),
            Self::Array { item } => write!(f, "array({item})"),
            other => f.write_str(other.tag()),
        }
    }
}

/// A single field of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name, as stored and as exposed.
    pub name: String,
    /// Type tag.
    #[serde(flatten)]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    /// Creates a new field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

/// Description of a persisted record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Label of the application namespace the model belongs to.
    #[serde(rename = "app")]
    pub app_label: String,
    /// Model class name. Becomes the GraphQL type name.
    pub name: String,
    /// Name of the primary key field.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    /// Creates a model with no fields and the default primary key name.
    #[must_use]
    pub fn new(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            name: name.into(),
            primary_key: default_primary_key(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type));
        self
    }

    /// Sets the primary key field name.
    #[must_use]
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Returns the `app.Model` label used in logs and store errors.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.name)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary key field, if it is declared.
    #[must_use]
    pub fn primary_key_field(&self) -> Option<&FieldDescriptor> {
        self.field(&self.primary_key)
    }

    /// Coerces a raw primary key string to the store representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary key is undeclared or the value does
    /// not parse as the primary key's type.
    pub fn parse_pk(&self, raw: &str) -> Result<Value, ModelError> {
        let pk = self
            .primary_key_field()
            .ok_or_else(|| ModelError::MissingPrimaryKey {
                model: self.name.clone(),
                primary_key: self.primary_key.clone(),
            })?;
        pk.field_type.parse_raw(&pk.name, raw)
    }

    /// Validates the model so that a schema can be generated from it.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !is_graphql_name(&self.name) {
            return Err(ModelError::InvalidModelName {
                name: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_graphql_name(&field.name) {
                return Err(ModelError::InvalidFieldName {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ModelError::DuplicateField {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            let shadows_identity = field.name == IDENTITY_FIELD && field.name != self.primary_key;
            if shadows_identity || field.name == RAW_ID_FIELD {
                return Err(ModelError::ReservedFieldName {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let pk = self
            .primary_key_field()
            .ok_or_else(|| ModelError::MissingPrimaryKey {
                model: self.name.clone(),
                primary_key: self.primary_key.clone(),
            })?;
        let multi_valued = matches!(pk.field_type, FieldType::ManyToMany { .. });
        if multi_valued || pk.field_type.is_filter_exempt() {
            return Err(ModelError::UnsupportedPrimaryKey {
                model: self.name.clone(),
                primary_key: pk.name.clone(),
                field_type: pk.field_type.to_string(),
            });
        }

        Ok(())
    }
}

/// Returns `true` if `name` is a valid, non-reserved GraphQL name.
///
/// Names must match `[_A-Za-z][_0-9A-Za-z]*` and must not start with the
/// `__` prefix reserved for introspection.
#[must_use]
pub fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return false;
    }
    !name.starts_with("__") && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
