//! Schema collaborator contract.
//!
//! A schema parses an untyped JSON value and either returns the parsed value
//! (possibly normalized) or a [`SchemaViolation`]. The crate never inspects
//! schema internals, so any validator can be plugged in.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Data did not match a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    message: String,
}

impl SchemaViolation {
    /// Violation with a description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// What did not match.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema violation: {}", self.message)
    }
}

impl std::error::Error for SchemaViolation {}

impl From<serde_json::Error> for SchemaViolation {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Parses data into its validated form.
pub trait Schema: Send + Sync {
    /// Validate `data`, returning the parsed value on success.
    fn parse(&self, data: &Value) -> Result<Value, SchemaViolation>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Result<Value, SchemaViolation> + Send + Sync,
{
    fn parse(&self, data: &Value) -> Result<Value, SchemaViolation> {
        self(data)
    }
}

/// Schema backed by a serde type: data is valid when it deserializes into `T`.
///
/// The parsed value is `T` serialized back, so defaults and unknown-field
/// stripping applied by `T` show up in the result.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
/// use tagged_errors::{Schema, SerdeSchema};
///
/// #[derive(Serialize, Deserialize)]
/// struct User { id: u64 }
///
/// static USER: SerdeSchema<User> = SerdeSchema::new();
///
/// assert!(USER.parse(&json!({ "id": 1 })).is_ok());
/// assert!(USER.parse(&json!({ "id": "one" })).is_err());
/// ```
pub struct SerdeSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    /// Schema for `T`.
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeSchema<{}>", std::any::type_name::<T>())
    }
}

impl<T> Schema for SerdeSchema<T>
where
    T: DeserializeOwned + Serialize,
{
    fn parse(&self, data: &Value) -> Result<Value, SchemaViolation> {
        let parsed = T::deserialize(data)?;
        Ok(serde_json::to_value(parsed)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Item {
        id: u32,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn serde_schema_normalizes() {
        let schema = SerdeSchema::<Item>::new();
        let parsed = schema.parse(&json!({ "id": 3, "extra": true })).unwrap();
        assert_eq!(parsed, json!({ "id": 3, "tags": [] }));
    }

    #[test]
    fn serde_schema_reports_mismatch() {
        let schema = SerdeSchema::<Item>::new();
        let err = schema.parse(&json!({ "id": "three" })).unwrap_err();
        assert!(err.message().contains("invalid type"));
    }

    #[test]
    fn closures_are_schemas() {
        let non_empty = |data: &Value| match data.as_str() {
            Some(s) if !s.is_empty() => Ok(data.clone()),
            _ => Err(SchemaViolation::new("expected a non-empty string")),
        };

        assert_eq!(non_empty.parse(&json!("x")), Ok(json!("x")));
        assert!(non_empty.parse(&json!("")).is_err());
    }
}
