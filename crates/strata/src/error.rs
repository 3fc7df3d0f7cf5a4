//! Error types for document conversion.
//!
//! Errors are reported synchronously to the caller of the triggering
//! operation and are never retried internally. A node either fully converts
//! or the whole operation fails.

use std::borrow::Cow;
use std::{error, fmt};

// -----------------------------------------------------------------------------
// WriteError

/// An enumeration of all error outcomes that might happen while writing a
/// value to a document node.
#[derive(Debug)]
pub enum WriteError {
    /// Attempted to write a value whose runtime type is neither registered
    /// as an identifiable type nor covered by a converter.
    NotSerializable { type_name: Cow<'static, str> },
    /// A map key rendered to something other than a string, number, or bool.
    UnsupportedKey { type_name: Cow<'static, str> },
    /// The document model rejected a leaf value.
    Document(serde_json::Error),
}

impl WriteError {
    /// A [`WriteError::NotSerializable`] for the given value type name.
    #[inline]
    pub fn not_serializable(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self::NotSerializable {
            type_name: type_name.into(),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSerializable { type_name } => {
                write!(f, "type `{type_name}` is not serializable")
            }
            Self::UnsupportedKey { type_name } => {
                write!(f, "type `{type_name}` cannot be used as a map key")
            }
            Self::Document(err) => {
                write!(f, "document model error: {err}")
            }
        }
    }
}

impl error::Error for WriteError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// ReadError

/// An enumeration of all error outcomes that might happen while reading a
/// value back out of a document node.
#[derive(Debug)]
pub enum ReadError {
    /// The document is structurally unusable: a missing or invalid
    /// discriminator or version field, or a node of the wrong shape.
    MalformedDocument { detail: Cow<'static, str> },
    /// The discriminator resolves to no registered (id, version) pair.
    UnknownType {
        id: String,
        version: Option<u32>,
    },
    /// The declared type has no registered descriptor and no converter.
    NotSerializable { type_name: Cow<'static, str> },
    /// The document model rejected a leaf value.
    Document(serde_json::Error),
}

impl ReadError {
    /// A [`ReadError::MalformedDocument`] with the given detail.
    #[inline]
    pub fn malformed(detail: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedDocument {
            detail: detail.into(),
        }
    }

    /// Prefixes the error's detail with the field id it occurred under, so
    /// nested failures report the path from the document root.
    pub fn at_field(self, field_id: &str) -> Self {
        match self {
            Self::MalformedDocument { detail } => Self::MalformedDocument {
                detail: format!("`{field_id}`: {detail}").into(),
            },
            Self::Document(err) => Self::MalformedDocument {
                detail: format!("`{field_id}`: {err}").into(),
            },
            other => other,
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDocument { detail } => {
                write!(f, "malformed document: {detail}")
            }
            Self::UnknownType { id, version } => match version {
                Some(version) => {
                    write!(f, "unknown identifiable type: id = `{id}`, version = {version}")
                }
                None => write!(f, "unknown identifiable type: id = `{id}`"),
            },
            Self::NotSerializable { type_name } => {
                write!(f, "type `{type_name}` is not deserializable")
            }
            Self::Document(err) => {
                write!(f, "document model error: {err}")
            }
        }
    }
}

impl error::Error for ReadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReadError;

    #[test]
    fn at_field_builds_a_path() {
        let err = ReadError::malformed("expected an array")
            .at_field("tags")
            .at_field("profile");
        match err {
            ReadError::MalformedDocument { detail } => {
                assert_eq!(detail, "`profile`: `tags`: expected an array");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn at_field_leaves_unknown_type_untouched() {
        let err = ReadError::UnknownType {
            id: "ghost".into(),
            version: Some(2),
        }
        .at_field("slot");
        assert!(matches!(err, ReadError::UnknownType { .. }));
    }
}
