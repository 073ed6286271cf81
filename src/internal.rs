//! Diagnostic-only errors.
//!
//! An [`InternalError`] may carry sensitive `details` and must never be
//! rendered verbatim to an external caller. Deciding what to show is left to
//! the surrounding API layer, which uses [`is_internal_error`] to tell these
//! apart from public errors.

use crate::base::{BASE_ERROR, BoxedCause, TaggedError};
use crate::identity::{ErrorTag, ErrorType, TypeTagged, has_type};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// Descriptor of the internal error family.
pub static INTERNAL_ERROR: ErrorType = ErrorType::child("InternalError", &BASE_ERROR);

/// Constructor parameters for [`InternalError`].
pub struct InternalErrorParams {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code.
    pub error_code: Cow<'static, str>,
    /// Diagnostic details.
    pub details: Option<Value>,
    /// Underlying cause.
    pub cause: Option<BoxedCause>,
}

impl InternalErrorParams {
    /// Parameters with only the mandatory fields set.
    pub fn new(message: impl Into<String>, error_code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            details: None,
            cause: None,
        }
    }

    /// Set details.
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Set the cause.
    pub fn cause(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Error meant for logs and diagnostics only.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalError {
    inner: TaggedError,
}

impl InternalError {
    /// Build a plain internal error.
    pub fn new(params: InternalErrorParams) -> Self {
        Self::with_type(&INTERNAL_ERROR, params)
    }

    /// Build an instance of a named subtype of [`INTERNAL_ERROR`].
    ///
    /// ```rust
    /// use tagged_errors::{ErrorType, InternalError, InternalErrorParams, INTERNAL_ERROR, is_internal_error};
    ///
    /// static STORAGE_ERROR: ErrorType = ErrorType::child("StorageError", &INTERNAL_ERROR);
    ///
    /// let err = InternalError::with_type(&STORAGE_ERROR, InternalErrorParams::new("disk full", "DISK_FULL"));
    /// assert_eq!(err.name(), "StorageError");
    /// assert!(is_internal_error(&err));
    /// ```
    pub fn with_type(ty: &ErrorType, params: InternalErrorParams) -> Self {
        let InternalErrorParams {
            message,
            error_code,
            details,
            cause,
        } = params;

        Self {
            inner: TaggedError::new(ty, error_code, message)
                .with_details(details)
                .with_optional_cause(cause),
        }
    }

    /// Name of the most-derived type.
    #[inline]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Message.
    #[inline]
    pub fn message(&self) -> &str {
        self.inner.message()
    }

    /// Error code.
    #[inline]
    pub fn error_code(&self) -> &str {
        self.inner.code()
    }

    /// Diagnostic details.
    #[inline]
    pub fn details(&self) -> Option<&Value> {
        self.inner.details()
    }

    /// Underlying cause.
    #[inline]
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.inner.cause()
    }

    /// The tagged carrier.
    #[inline]
    pub fn as_tagged(&self) -> &TaggedError {
        &self.inner
    }
}

impl fmt::Debug for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalError")
            .field("name", &self.inner.name())
            .field("error_code", &self.inner.code())
            .field("message", &self.inner.message())
            .field("details", &self.inner.details().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for InternalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl TypeTagged for InternalError {
    fn error_name(&self) -> &str {
        self.inner.name()
    }

    fn message(&self) -> &str {
        self.inner.message()
    }

    fn error_code(&self) -> &str {
        self.inner.code()
    }

    fn tags(&self) -> &[ErrorTag] {
        self.inner.tags()
    }

    fn details(&self) -> Option<&Value> {
        self.inner.details()
    }
}

/// True for internal errors and their named subtypes, wherever they were built.
///
/// Values rebuilt from a serialized form carry no tags and are recognized by
/// their literal name.
pub fn is_internal_error(value: &dyn TypeTagged) -> bool {
    has_type(value, &INTERNAL_ERROR) || value.error_name() == INTERNAL_ERROR.name()
}
