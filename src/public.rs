//! Errors that are safe to return to an external caller.
//!
//! A [`PublicError`] carries a protocol status code (500 unless stated) next
//! to the usual name, code, message and details. The stock kinds below cover
//! the statuses almost every service ends up returning.

use crate::base::{BASE_ERROR, BoxedCause, TaggedError};
use crate::identity::{ErrorTag, ErrorType, TypeTagged, has_type};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

/// Status used when a public error does not specify one.
pub const DEFAULT_HTTP_STATUS_CODE: u16 = 500;

/// Descriptor of the public error family.
pub static PUBLIC_ERROR: ErrorType = ErrorType::child("PublicError", &BASE_ERROR);

/// Invalid request parameters, 400.
pub static REQUEST_VALIDATION_ERROR: ErrorType =
    ErrorType::child("RequestValidationError", &PUBLIC_ERROR);
/// Caller lacks permission, 403.
pub static ACCESS_DENIED_ERROR: ErrorType = ErrorType::child("AccessDeniedError", &PUBLIC_ERROR);
/// Entity does not exist, 404.
pub static ENTITY_NOT_FOUND_ERROR: ErrorType =
    ErrorType::child("EntityNotFoundError", &PUBLIC_ERROR);
/// Entity existed but was removed, 410.
pub static ENTITY_GONE_ERROR: ErrorType = ErrorType::child("EntityGoneError", &PUBLIC_ERROR);
/// Authentication failed, 401.
pub static AUTH_FAILED_ERROR: ErrorType = ErrorType::child("AuthFailedError", &PUBLIC_ERROR);
/// A remote call ended with a failing status.
pub static RESPONSE_STATUS_ERROR: ErrorType =
    ErrorType::child("ResponseStatusError", &PUBLIC_ERROR);

// ============================================================================
// Parameters
// ============================================================================

/// Constructor parameters for [`PublicError`].
pub struct PublicErrorParams {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code.
    pub error_code: Cow<'static, str>,
    /// Caller-visible details.
    pub details: Option<Value>,
    /// Underlying cause.
    pub cause: Option<BoxedCause>,
    /// Protocol status, [`DEFAULT_HTTP_STATUS_CODE`] when unset.
    pub http_status_code: Option<u16>,
}

impl PublicErrorParams {
    /// Parameters with only the mandatory fields set.
    pub fn new(message: impl Into<String>, error_code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            error_code: error_code.into(),
            details: None,
            cause: None,
            http_status_code: None,
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

    /// Set the protocol status.
    pub fn http_status_code(mut self, status: u16) -> Self {
        self.http_status_code = Some(status);
        self
    }
}

/// Parameters shared by the stock kinds that take a caller message.
pub struct CommonErrorParams {
    /// Human-readable message.
    pub message: String,
    /// Caller-visible details.
    pub details: Option<Value>,
    /// Underlying cause.
    pub cause: Option<BoxedCause>,
}

impl CommonErrorParams {
    /// Parameters carrying only a message.
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

/// Like [`CommonErrorParams`], with a kind-specific default message.
#[derive(Default)]
pub struct OptionalMessageErrorParams {
    /// Message overriding the default one.
    pub message: Option<String>,
    /// Caller-visible details.
    pub details: Option<Value>,
    /// Underlying cause.
    pub cause: Option<BoxedCause>,
}

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// What went wrong.
    pub message: String,
    /// Location of the offending value, outermost key first.
    pub path: Vec<String>,
}

impl ValidationIssue {
    /// Issue at `path`.
    pub fn new<I, S>(message: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: message.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Public Error
// ============================================================================

/// Error whose message, code and details may be shown to callers.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicError {
    #[serde(flatten)]
    inner: TaggedError,
    http_status_code: u16,
}

impl PublicError {
    /// Build a plain public error.
    pub fn new(params: PublicErrorParams) -> Self {
        Self::with_type(&PUBLIC_ERROR, params)
    }

    /// Build an instance of a named subtype of [`PUBLIC_ERROR`].
    pub fn with_type(ty: &ErrorType, params: PublicErrorParams) -> Self {
        let PublicErrorParams {
            message,
            error_code,
            details,
            cause,
            http_status_code,
        } = params;

        Self {
            inner: TaggedError::new(ty, error_code, message)
                .with_details(details)
                .with_optional_cause(cause),
            http_status_code: http_status_code.unwrap_or(DEFAULT_HTTP_STATUS_CODE),
        }
    }

    fn stock(
        ty: &ErrorType,
        error_code: &'static str,
        status: u16,
        params: CommonErrorParams,
    ) -> Self {
        Self::with_type(
            ty,
            PublicErrorParams {
                message: params.message,
                error_code: Cow::Borrowed(error_code),
                details: params.details,
                cause: params.cause,
                http_status_code: Some(status),
            },
        )
    }

    /// `RequestValidationError`: 400, `VALIDATION_ERROR`, details `{error: [...]}`.
    pub fn request_validation(issues: Vec<ValidationIssue>) -> Self {
        let issues: Vec<Value> = issues
            .into_iter()
            .map(|issue| json!({ "message": issue.message, "path": issue.path }))
            .collect();

        Self::stock(
            &REQUEST_VALIDATION_ERROR,
            "VALIDATION_ERROR",
            400,
            CommonErrorParams::new("Invalid params").details(json!({ "error": issues })),
        )
    }

    /// `AccessDeniedError`: 403, `ACCESS_DENIED`.
    pub fn access_denied(params: CommonErrorParams) -> Self {
        Self::stock(&ACCESS_DENIED_ERROR, "ACCESS_DENIED", 403, params)
    }

    /// `EntityNotFoundError`: 404, `ENTITY_NOT_FOUND`.
    pub fn entity_not_found(params: CommonErrorParams) -> Self {
        Self::stock(&ENTITY_NOT_FOUND_ERROR, "ENTITY_NOT_FOUND", 404, params)
    }

    /// `EntityGoneError`: 410, `ENTITY_GONE`.
    pub fn entity_gone(params: CommonErrorParams) -> Self {
        Self::stock(&ENTITY_GONE_ERROR, "ENTITY_GONE", 410, params)
    }

    /// `AuthFailedError`: 401, `AUTH_FAILED`, message defaults to `Authentication failed`.
    pub fn auth_failed(params: OptionalMessageErrorParams) -> Self {
        Self::stock(
            &AUTH_FAILED_ERROR,
            "AUTH_FAILED",
            401,
            CommonErrorParams {
                message: params
                    .message
                    .unwrap_or_else(|| "Authentication failed".to_owned()),
                details: params.details,
                cause: params.cause,
            },
        )
    }

    /// `ResponseStatusError`: a remote call ended with a failing status.
    ///
    /// Details are `{requestLabel, response: {statusCode, body}}`, the label
    /// defaulting to `N/A`. The error's own status stays at the default.
    pub fn response_status(status_code: Option<u16>, body: Value, request_label: Option<&str>) -> Self {
        let rendered = match status_code {
            Some(code) => code.to_string(),
            None => "unknown".to_owned(),
        };

        Self::with_type(
            &RESPONSE_STATUS_ERROR,
            PublicErrorParams::new(format!("Response status code {rendered}"), "REQUEST_ERROR")
                .details(json!({
                    "requestLabel": request_label.unwrap_or("N/A"),
                    "response": {
                        "statusCode": status_code,
                        "body": body
                    }
                })),
        )
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

    /// Protocol status.
    #[inline]
    pub fn http_status_code(&self) -> u16 {
        self.http_status_code
    }

    /// The tagged carrier.
    #[inline]
    pub fn as_tagged(&self) -> &TaggedError {
        &self.inner
    }
}

impl fmt::Debug for PublicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicError")
            .field("name", &self.inner.name())
            .field("error_code", &self.inner.code())
            .field("http_status_code", &self.http_status_code)
            .field("message", &self.inner.message())
            .field("details", &self.inner.details())
            .finish()
    }
}

impl fmt::Display for PublicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for PublicError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

impl TypeTagged for PublicError {
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

    fn http_status_code(&self) -> Option<u16> {
        Some(self.http_status_code)
    }

    fn is_public(&self) -> bool {
        true
    }
}

// ============================================================================
// Guards
// ============================================================================

/// True for public errors and their named subtypes.
///
/// Values rebuilt from their serialized form carry no tags. Those count as
/// public when they are named `PublicError` or report themselves public, so
/// a deserialized `EntityGoneError` is still recognized.
pub fn is_public_error(value: &dyn TypeTagged) -> bool {
    if has_type(value, &PUBLIC_ERROR) {
        return true;
    }
    value.tags().is_empty() && (value.error_name() == PUBLIC_ERROR.name() || value.is_public())
}

/// True for a public error whose status is 410, whatever its kind.
pub fn is_entity_gone_error(value: &dyn TypeTagged) -> bool {
    is_public_error(value) && value.http_status_code() == Some(410)
}

/// True for errors raised on a failing remote response.
pub fn is_response_status_error(value: &dyn TypeTagged) -> bool {
    has_type(value, &RESPONSE_STATUS_ERROR) || value.error_name() == RESPONSE_STATUS_ERROR.name()
}
