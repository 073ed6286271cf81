//! Error definition registry.
//!
//! An [`ErrorDefinition`] is a static, immutable record of one error kind:
//! its code, its [`ErrorCategory`] (and therefore its status), whether it is
//! safe to expose, and an optional schema its details must satisfy.
//!
//! [`create_error_class`] turns a definition into an [`ErrorClass`], a factory
//! of [`AppError`] values tagged as `BaseError.AppError.<code>`.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use tagged_errors::{
//!     AppErrorOptions, ErrorCategory, ErrorClass, ErrorDefinition, SerdeSchema,
//!     create_error_class, define_error,
//! };
//!
//! #[derive(Serialize, Deserialize)]
//! struct UserDetails { user_id: u64 }
//!
//! static USER_DETAILS: SerdeSchema<UserDetails> = SerdeSchema::new();
//!
//! static USER_NOT_FOUND: ErrorDefinition = define_error(
//!     ErrorDefinition::const_new("USER_NOT_FOUND", ErrorCategory::NotFound, true)
//!         .with_details_schema(&USER_DETAILS),
//! );
//! static USER_NOT_FOUND_ERROR: ErrorClass = create_error_class(&USER_NOT_FOUND);
//!
//! let err = USER_NOT_FOUND_ERROR.new(
//!     AppErrorOptions::new("no such user").details(json!({ "user_id": 7 })),
//! );
//! assert_eq!(err.status_code(), 404);
//! assert!(USER_NOT_FOUND_ERROR.is_instance(&err));
//!
//! // Details are mandatory once a schema is attached.
//! assert!(USER_NOT_FOUND_ERROR.try_new(AppErrorOptions::new("no such user")).is_err());
//! ```

use crate::base::{BASE_ERROR, BoxedCause, TaggedError};
use crate::category::ErrorCategory;
use crate::identity::{ErrorTag, ErrorType, PATH_DELIMITER, TypeTagged, has_type};
use crate::schema::{Schema, SchemaViolation};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;
use std::error::Error;
use std::fmt;

/// Descriptor of the definition-backed error family.
pub static APP_ERROR: ErrorType = ErrorType::child("AppError", &BASE_ERROR);

// ============================================================================
// Definitions
// ============================================================================

/// Static description of one error kind.
pub struct ErrorDefinition {
    code: &'static str,
    category: ErrorCategory,
    is_public: bool,
    details_schema: Option<&'static dyn Schema>,
}

const fn is_valid_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == PATH_DELIMITER.as_bytes()[0] {
            return false;
        }
        i += 1;
    }
    true
}

impl ErrorDefinition {
    /// Definition for const statics.
    ///
    /// # Panics
    ///
    /// Panics if `code` is empty or contains the path delimiter. In const
    /// contexts this is a compile error.
    pub const fn const_new(code: &'static str, category: ErrorCategory, is_public: bool) -> Self {
        assert!(
            is_valid_code(code),
            "Error definition code must be non-empty and must not contain '.'"
        );

        Self {
            code,
            category,
            is_public,
            details_schema: None,
        }
    }

    /// Like [`const_new`](Self::const_new), reporting a bad code instead of
    /// panicking.
    ///
    /// Definitions live for the whole process and their codes name interned
    /// tags, so `code` must be `'static`. A code read at runtime has to be
    /// leaked first, e.g. with `String::leak`, once per distinct code.
    pub fn checked_new(
        code: &'static str,
        category: ErrorCategory,
        is_public: bool,
    ) -> Result<Self, DefinitionViolation> {
        if !is_valid_code(code) {
            return Err(DefinitionViolation::InvalidCode { code });
        }

        Ok(Self {
            code,
            category,
            is_public,
            details_schema: None,
        })
    }

    /// Attach a details schema.
    pub const fn with_details_schema(self, schema: &'static dyn Schema) -> Self {
        Self {
            details_schema: Some(schema),
            ..self
        }
    }

    /// Unique code, also the type name of the kind.
    #[inline]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Category, source of the status code.
    #[inline]
    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Whether instances may be shown to external callers.
    #[inline]
    pub const fn is_public(&self) -> bool {
        self.is_public
    }

    /// Schema the details of every instance must satisfy.
    #[inline]
    pub const fn details_schema(&self) -> Option<&'static dyn Schema> {
        self.details_schema
    }

    /// Status code of the category.
    #[inline]
    pub const fn status_code(&self) -> u16 {
        self.category.status_code()
    }
}

impl fmt::Debug for ErrorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDefinition")
            .field("code", &self.code)
            .field("category", &self.category)
            .field("is_public", &self.is_public)
            .field("details_schema", &self.details_schema.map(|_| "<SCHEMA>"))
            .finish()
    }
}

/// Identity helper that keeps definitions declarative.
#[inline]
pub const fn define_error(definition: ErrorDefinition) -> ErrorDefinition {
    definition
}

// ============================================================================
// Violations
// ============================================================================

/// Why a definition or an instance of it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionViolation {
    /// Code is empty or contains the path delimiter.
    InvalidCode {
        /// Rejected code.
        code: &'static str,
    },
    /// The definition has a schema but no details were given.
    MissingDetails {
        /// Code of the definition.
        code: &'static str,
    },
    /// Details did not satisfy the schema.
    InvalidDetails {
        /// Code of the definition.
        code: &'static str,
        /// Schema failure.
        violation: SchemaViolation,
    },
}

impl fmt::Display for DefinitionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCode { code } => write!(f, "Invalid error definition code '{}'", code),
            Self::MissingDetails { code } => {
                write!(f, "Error {} requires details matching its schema", code)
            }
            Self::InvalidDetails { code, violation } => {
                write!(f, "Invalid details for error {}: {}", code, violation.message())
            }
        }
    }
}

impl Error for DefinitionViolation {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDetails { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

// ============================================================================
// Error Classes
// ============================================================================

/// Constructor options for [`AppError`].
pub struct AppErrorOptions {
    /// Human-readable message.
    pub message: String,
    /// Details, mandatory when the definition has a schema.
    pub details: Option<Value>,
    /// Underlying cause.
    pub cause: Option<BoxedCause>,
}

impl AppErrorOptions {
    /// Options carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
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

/// Factory of [`AppError`] values for one definition.
#[derive(Debug)]
pub struct ErrorClass {
    definition: &'static ErrorDefinition,
    ty: ErrorType,
}

/// Bind a definition to its error type `BaseError.AppError.<code>`.
#[inline]
pub const fn create_error_class(definition: &'static ErrorDefinition) -> ErrorClass {
    ErrorClass {
        definition,
        ty: ErrorType::child(definition.code, &APP_ERROR),
    }
}

impl ErrorClass {
    /// The bound definition.
    #[inline]
    pub const fn definition(&self) -> &'static ErrorDefinition {
        self.definition
    }

    /// Type descriptor of instances.
    #[inline]
    pub const fn error_type(&self) -> &ErrorType {
        &self.ty
    }

    /// Build an instance, validating details against the definition's schema.
    ///
    /// Valid details are stored as given, not as parsed.
    pub fn try_new(&self, options: AppErrorOptions) -> Result<AppError, DefinitionViolation> {
        let AppErrorOptions {
            message,
            details,
            cause,
        } = options;
        let code = self.definition.code;

        if let Some(schema) = self.definition.details_schema {
            match details.as_ref() {
                None => return Err(DefinitionViolation::MissingDetails { code }),
                Some(data) => {
                    schema
                        .parse(data)
                        .map_err(|violation| DefinitionViolation::InvalidDetails { code, violation })?;
                }
            }
        }

        Ok(AppError {
            inner: TaggedError::new(&self.ty, code, message)
                .with_details(details)
                .with_optional_cause(cause),
            definition: self.definition,
        })
    }

    /// Build an instance.
    ///
    /// # Panics
    ///
    /// Panics when details are missing or invalid for the definition's
    /// schema. Use [`try_new`](Self::try_new) for details from untrusted input.
    pub fn new(&self, options: AppErrorOptions) -> AppError {
        match self.try_new(options) {
            Ok(err) => err,
            Err(violation) => panic!("{}", violation),
        }
    }

    /// Whether `value` was built by this class (or a class with the same code).
    pub fn is_instance(&self, value: &dyn TypeTagged) -> bool {
        has_type(value, &self.ty) || value.error_name() == self.definition.code
    }
}

// ============================================================================
// App Error
// ============================================================================

/// Error built from an [`ErrorDefinition`].
pub struct AppError {
    inner: TaggedError,
    definition: &'static ErrorDefinition,
}

impl AppError {
    /// Code of the definition.
    #[inline]
    pub fn code(&self) -> &'static str {
        self.definition.code
    }

    /// Category of the definition.
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.definition.category
    }

    /// Whether the error may be shown to external callers.
    #[inline]
    pub fn is_public(&self) -> bool {
        self.definition.is_public
    }

    /// Status code derived from the category on every read.
    #[inline]
    pub fn status_code(&self) -> u16 {
        self.definition.category.status_code()
    }

    /// Message.
    #[inline]
    pub fn message(&self) -> &str {
        self.inner.message()
    }

    /// Details.
    #[inline]
    pub fn details(&self) -> Option<&Value> {
        self.inner.details()
    }

    /// Underlying cause.
    #[inline]
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.inner.cause()
    }

    /// The definition this error was built from.
    #[inline]
    pub fn definition(&self) -> &'static ErrorDefinition {
        self.definition
    }

    /// The tagged carrier.
    #[inline]
    pub fn as_tagged(&self) -> &TaggedError {
        &self.inner
    }
}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.details().is_some() { 7 } else { 6 };
        let mut state = serializer.serialize_struct("AppError", len)?;
        state.serialize_field("name", self.inner.name())?;
        state.serialize_field("message", self.message())?;
        state.serialize_field("errorCode", self.code())?;
        state.serialize_field("category", &self.category())?;
        state.serialize_field("isPublic", &self.is_public())?;
        state.serialize_field("httpStatusCode", &self.status_code())?;
        if let Some(details) = self.details() {
            state.serialize_field("details", details)?;
        }
        state.end()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("AppError");
        dbg.field("code", &self.code())
            .field("category", &self.category())
            .field("message", &self.message());
        if self.is_public() {
            dbg.field("details", &self.details());
        } else {
            dbg.field("details", &self.details().map(|_| "<REDACTED>"));
        }
        dbg.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl TypeTagged for AppError {
    fn error_name(&self) -> &str {
        self.inner.name()
    }

    fn message(&self) -> &str {
        self.inner.message()
    }

    fn error_code(&self) -> &str {
        self.definition.code
    }

    fn tags(&self) -> &[ErrorTag] {
        self.inner.tags()
    }

    fn details(&self) -> Option<&Value> {
        self.inner.details()
    }

    fn http_status_code(&self) -> Option<u16> {
        Some(self.status_code())
    }

    fn is_public(&self) -> bool {
        self.definition.is_public
    }
}

/// True for any definition-backed error.
pub fn is_app_error(value: &dyn TypeTagged) -> bool {
    has_type(value, &APP_ERROR)
}
