//! The tagged error instance shared by every error family.
//!
//! [`TaggedError`] is the single concrete carrier behind internal, public and
//! definition-backed errors. Families differ by the [`ErrorType`] chain they
//! are built with, not by inheritance.
//!
//! # Construction Order
//!
//! Tags are computed and attached first, before any other field is set, so an
//! instance can never be observed with a partial identity.
//!
//! # Serialization
//!
//! Tags are never serialized. A value rebuilt from its serialized form is a
//! valid error without identity tags; guards fall back to its `name` field.
//!
//! # Memory Hygiene
//!
//! Owned message, code and detail strings are zeroized on drop, since details
//! of internal errors routinely hold diagnostic data.

use crate::identity::{ErrorTag, ErrorType, TypeTagged, UNIVERSAL_ROOT_NAME};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use zeroize::Zeroize;

/// The universal root every error chain hangs from. Never part of a tag path.
pub static UNIVERSAL_ROOT: ErrorType = ErrorType::root(UNIVERSAL_ROOT_NAME);

/// Root of every error family defined by this crate.
pub static BASE_ERROR: ErrorType = ErrorType::child("BaseError", &UNIVERSAL_ROOT);

/// Boxed cause used for error chaining.
pub type BoxedCause = Box<dyn Error + Send + Sync>;

/// An error value carrying cross-context identity tags.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedError {
    #[serde(skip)]
    tags: SmallVec<[ErrorTag; 4]>,
    name: Cow<'static, str>,
    message: String,
    #[serde(rename = "errorCode")]
    code: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip)]
    cause: Option<BoxedCause>,
}

impl TaggedError {
    /// Build an instance of `ty`, tagging it with every ancestor path.
    pub fn new(
        ty: &ErrorType,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        let tags = ty.tag_chain();
        Self {
            tags,
            name: Cow::Borrowed(ty.name()),
            message: message.into(),
            code: code.into(),
            details: None,
            cause: None,
        }
    }

    /// Attach free-form details.
    #[inline]
    pub fn with_details(mut self, details: impl Into<Option<Value>>) -> Self {
        self.details = details.into();
        self
    }

    /// Attach the underlying cause.
    #[inline]
    pub fn with_cause(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[inline]
    pub(crate) fn with_optional_cause(mut self, cause: Option<BoxedCause>) -> Self {
        self.cause = cause;
        self
    }

    /// Name of the most-derived type.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error code.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Details, if any.
    #[inline]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Underlying cause, if any.
    #[inline]
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Identity tags attached at construction.
    #[inline]
    pub fn tags(&self) -> &[ErrorTag] {
        &self.tags
    }

    /// False for values rebuilt from a serialized form.
    #[inline]
    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Clear every string reachable from a JSON value.
pub(crate) fn zeroize_value(value: &mut Value) {
    match value {
        Value::String(s) => s.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(zeroize_value),
        Value::Object(map) => map.values_mut().for_each(zeroize_value),
        _ => {}
    }
}

impl Drop for TaggedError {
    fn drop(&mut self) {
        // Drop the cause first, it may hold sensitive data of its own.
        self.cause = None;
        self.message.zeroize();
        if let Cow::Owned(ref mut code) = self.code {
            code.zeroize();
        }
        if let Some(details) = self.details.as_mut() {
            zeroize_value(details);
        }
    }
}

impl fmt::Debug for TaggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedError")
            .field("name", &self.name)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("details", &self.details.as_ref().map(|_| "<REDACTED>"))
            .field("cause", &self.cause.as_ref().map(|_| "<PRESENT>"))
            .field("tags", &self.tags.iter().map(|t| t.path()).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for TaggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for TaggedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl TypeTagged for TaggedError {
    fn error_name(&self) -> &str {
        &self.name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn error_code(&self) -> &str {
        &self.code
    }

    fn tags(&self) -> &[ErrorTag] {
        &self.tags
    }

    fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}
