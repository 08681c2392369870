//! Global object identifiers.
//!
//! Every object exposed through the `Node` interface carries an `id` that
//! identifies it across all types. The token is the plain, human-readable
//! `TypeName:id` pair rather than an opaque base64 blob, so clients can build
//! and read identifiers by hand.
//!
//! Type names must not contain the delimiter. Model validation guarantees
//! this for generated types, so decoding splits on the first delimiter and
//! the id part may itself contain `:` (text primary keys such as
//! `acme:eu`).

use std::fmt;
use std::str::FromStr;

/// Separator between the type name and the record id.
pub const GLOBAL_ID_DELIMITER: char = ':';

/// Errors produced when decoding a global identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlobalIdError {
    /// The token has no delimiter.
    #[error("Unable to parse global ID \"{token}\": expected the form TypeName:id")]
    MissingDelimiter {
        /// The rejected token.
        token: String,
    },

    /// The type name part is empty.
    #[error("Unable to parse global ID \"{token}\": type name is empty")]
    EmptyTypeName {
        /// The rejected token.
        token: String,
    },

    /// The id part is empty.
    #[error("Unable to parse global ID \"{token}\": id is empty")]
    EmptyId {
        /// The rejected token.
        token: String,
    },

    /// The token is well formed but names another type.
    #[error("Must receive a {expected} id.")]
    WrongType {
        /// The type the field serves.
        expected: String,
        /// The type named by the token.
        found: String,
    },
}

/// A decoded global identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
    /// GraphQL type name.
    pub type_name: String,
    /// Record id within the type, as a string.
    pub id: String,
}

impl GlobalId {
    /// Creates a new global id.
    #[must_use]
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Encodes this id as `TypeName:id`.
    #[must_use]
    pub fn encode(&self) -> String {
        to_global_id(&self.type_name, &self.id)
    }

    /// Decodes a `TypeName:id` token.
    ///
    /// # Errors
    ///
    /// Returns an error unless the token contains a delimiter with non-empty
    /// text on both sides of the first occurrence.
    pub fn decode(token: &str) -> Result<Self, GlobalIdError> {
        from_global_id(token)
    }

    /// Returns the record id if this token names `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalIdError::WrongType`] for tokens of any other type.
    pub fn expect_type(self, type_name: &str) -> Result<String, GlobalIdError> {
        if self.type_name == type_name {
            Ok(self.id)
        } else {
            Err(GlobalIdError::WrongType {
                expected: type_name.to_string(),
                found: self.type_name,
            })
        }
    }

    /// Returns the `(type_name, id)` pair.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.type_name, self.id)
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{GLOBAL_ID_DELIMITER}{}", self.type_name, self.id)
    }
}

impl FromStr for GlobalId {
    type Err = GlobalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_global_id(s)
    }
}

/// Encodes a type name and record id as `TypeName:id`.
///
/// No escaping is performed; `type_name` must not contain `:`, while `id`
/// may.
#[must_use]
pub fn to_global_id(type_name: &str, id: &str) -> String {
    format!("{type_name}{GLOBAL_ID_DELIMITER}{id}")
}

/// Decodes a `TypeName:id` token.
///
/// # Errors
///
/// See [`GlobalId::decode`].
pub fn from_global_id(token: &str) -> Result<GlobalId, GlobalIdError> {
    let Some((type_name, id)) = token.split_once(GLOBAL_ID_DELIMITER) else {
        return Err(GlobalIdError::MissingDelimiter {
            token: token.to_string(),
        });
    };

    if type_name.is_empty() {
        return Err(GlobalIdError::EmptyTypeName {
            token: token.to_string(),
        });
    }
    if id.is_empty() {
        return Err(GlobalIdError::EmptyId {
            token: token.to_string(),
        });
    }

    Ok(GlobalId::new(type_name, id))
}
