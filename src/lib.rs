//! # Tagged Errors
//!
//! Error identity that survives crossing execution contexts, a two-tier
//! internal/public error taxonomy, a schema-backed error definition registry
//! and a retry-aware request outcome classifier.
//!
//! ## Design Philosophy
//!
//! 1. **Identity is a string path, not an address.** Errors carry interned
//!    tags for every ancestor path, so `has_type` works across plugins,
//!    separately compiled modules and deserialized values.
//! 2. **Internal errors are for operators.** Their details never reach an
//!    external caller; the guards let the API layer decide.
//! 3. **Public errors are for callers.** They carry a protocol status.
//! 4. **Expected failures are values.** A single failed attempt travels as an
//!    [`Either`] and becomes an error only when the caller asks for it.
//! 5. **Nothing escapes silently.** Entry points wrapped with the
//!    [`global_handler`] functions log every escaped error or panic.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagged_errors::{
//!     CommonErrorParams, InternalError, InternalErrorParams, PublicError,
//!     is_entity_gone_error, is_internal_error, is_public_error,
//! };
//!
//! let gone = PublicError::entity_gone(CommonErrorParams::new("order was removed"));
//! assert!(is_public_error(&gone));
//! assert!(is_entity_gone_error(&gone));
//!
//! let internal = InternalError::new(InternalErrorParams::new("pool exhausted", "DB_POOL"));
//! assert!(is_internal_error(&internal));
//! assert!(!is_public_error(&internal));
//! ```
//!
//! ## Features
//!
//! - `tokio` (default): inter-attempt pauses of [`RequestClassifier::execute`] use tokio
//! - `async_std`: same, with async-std (tokio wins when both are enabled)
//! - `trusted_debug`: [`logging::ErrorLog::format_for_trusted_debug`] in debug builds

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::error::Error;

pub mod base;
pub mod category;
pub mod classifier;
pub mod convenience;
pub mod definitions;
pub mod either;
pub mod global_handler;
pub mod identity;
pub mod internal;
pub mod logging;
pub mod public;
pub mod reporting;
pub mod retry;
pub mod schema;

pub use base::{BASE_ERROR, BoxedCause, TaggedError, UNIVERSAL_ROOT};
pub use category::{CategoryParseError, ErrorCategory};
pub use classifier::{
    AttemptFailure, AttemptOutcome, DEFAULT_REQUEST_LABEL, RequestClassifier, RequestError,
    Response, Transport,
};
pub use definitions::{
    APP_ERROR, AppError, AppErrorOptions, DefinitionViolation, ErrorClass, ErrorDefinition,
    create_error_class, define_error, is_app_error,
};
pub use either::{DefiniteEither, Either, failure, is_failure, is_success, success};
pub use global_handler::{
    GLOBAL_ERROR_EXIT_CODE, GlobalErrorLogObject, Raised, UNKNOWN_ERROR_MESSAGE,
    execute_and_handle_global_errors, execute_async_and_handle_global_errors,
    execute_settle_all_and_handle_global_errors, resolve_global_error_log_object,
};
pub use identity::{
    ErrorTag, ErrorType, PATH_DELIMITER, StandardizedError, TypeTagged, UNIVERSAL_ROOT_NAME,
    has_type, intern_tag, looks_like_error, lookup_tag,
};
pub use internal::{INTERNAL_ERROR, InternalError, InternalErrorParams, is_internal_error};
pub use public::{
    ACCESS_DENIED_ERROR, AUTH_FAILED_ERROR, CommonErrorParams, DEFAULT_HTTP_STATUS_CODE,
    ENTITY_GONE_ERROR, ENTITY_NOT_FOUND_ERROR, OptionalMessageErrorParams, PUBLIC_ERROR,
    PublicError, PublicErrorParams, REQUEST_VALIDATION_ERROR, RESPONSE_STATUS_ERROR,
    ValidationIssue, is_entity_gone_error, is_public_error, is_response_status_error,
};
pub use reporting::{
    DefaultErrorResolver, ErrorReport, ErrorReporter, ErrorResolver, ReportEntry,
    RingBufferReporter, TracingReporter,
};
pub use retry::{OutcomePolicy, RetryPolicy, RetryPolicyError};
pub use schema::{Schema, SchemaViolation, SerdeSchema};

/// Recover the tagged view of any error family defined by this crate.
///
/// Returns `None` for foreign errors.
///
/// ```rust
/// use tagged_errors::{InternalError, InternalErrorParams, tagged_view};
///
/// let boxed: Box<dyn std::error::Error + Send + Sync> =
///     Box::new(InternalError::new(InternalErrorParams::new("x", "X")));
/// assert_eq!(tagged_view(&*boxed).map(|t| t.error_code()), Some("X"));
///
/// let foreign = std::io::Error::other("y");
/// assert!(tagged_view(&foreign).is_none());
/// ```
pub fn tagged_view<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a dyn TypeTagged> {
    if let Some(err) = err.downcast_ref::<InternalError>() {
        return Some(err);
    }
    if let Some(err) = err.downcast_ref::<PublicError>() {
        return Some(err);
    }
    if let Some(err) = err.downcast_ref::<AppError>() {
        return Some(err);
    }
    if let Some(err) = err.downcast_ref::<RequestError>() {
        return Some(err);
    }
    if let Some(err) = err.downcast_ref::<TaggedError>() {
        return Some(err);
    }
    None
}
