//! Last-resort handling for errors that escape an entry point.
//!
//! The `execute_*` wrappers run an operation, log whatever escapes it as a
//! single structured event and, when asked to, stop the process with
//! [`GLOBAL_ERROR_EXIT_CODE`]. Panics are caught and logged the same way as
//! returned errors.
//!
//! ```rust
//! use tagged_errors::{InternalError, InternalErrorParams, execute_and_handle_global_errors};
//!
//! let value = execute_and_handle_global_errors(|| Ok::<_, InternalError>(7), false);
//! assert_eq!(value, Some(7));
//!
//! let failed = execute_and_handle_global_errors(
//!     || Err::<u8, _>(InternalError::new(InternalErrorParams::new("boot failed", "BOOT"))),
//!     false,
//! );
//! assert_eq!(failed, None);
//! ```

use crate::base::BoxedCause;
use crate::logging::{ErrorLog, truncate_with_indicator};
use crate::tagged_view;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::error::Error;
use std::future::{Future, poll_fn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Process exit code used when a wrapper stops on error.
pub const GLOBAL_ERROR_EXIT_CODE: i32 = 1;

/// Message logged when nothing readable was raised.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Nested causes serialized below the top-level error.
const MAX_CAUSE_DEPTH: usize = 8;

// ============================================================================
// Log Object
// ============================================================================

/// Whatever escaped an operation.
#[derive(Debug)]
pub enum Raised {
    /// A returned error.
    Error(BoxedCause),
    /// A panic payload.
    Panic(Box<dyn Any + Send>),
}

/// Structured event logged for an escaped error.
///
/// Serializes as `{"msg", "error"?, "x-request-id"?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalErrorLogObject {
    /// Log message.
    pub msg: String,
    /// Serialized error, present only when a real error was raised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Correlation id of the request being handled, if any.
    #[serde(rename = "x-request-id", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Build the log object for `raised`.
///
/// - An error (returned, or used as a panic payload) gives its message and
///   its serialized form, causes included.
/// - A panic with a text payload gives that text only.
/// - Anything else gives [`UNKNOWN_ERROR_MESSAGE`].
pub fn resolve_global_error_log_object(
    raised: &Raised,
    correlation_id: Option<&str>,
) -> GlobalErrorLogObject {
    let request_id = correlation_id.map(str::to_owned);

    let error = match raised {
        Raised::Error(err) => Some(err),
        Raised::Panic(payload) => payload.downcast_ref::<BoxedCause>(),
    };
    if let Some(err) = error {
        let err: &(dyn Error + 'static) = &**err;
        return GlobalErrorLogObject {
            msg: truncate_with_indicator(&err.to_string()).into_owned(),
            error: Some(serialize_error(err, 0)),
            request_id,
        };
    }

    let text: Option<&str> = match raised {
        Raised::Panic(payload) => match payload.downcast_ref::<&'static str>() {
            Some(text) => Some(*text),
            None => payload.downcast_ref::<String>().map(String::as_str),
        },
        Raised::Error(_) => None,
    };

    GlobalErrorLogObject {
        msg: truncate_with_indicator(text.unwrap_or(UNKNOWN_ERROR_MESSAGE)).into_owned(),
        error: None,
        request_id,
    }
}

fn serialize_error(err: &(dyn Error + 'static), depth: usize) -> Value {
    let mut object = Map::new();

    match tagged_view(err) {
        Some(tagged) => {
            let log = ErrorLog::from_error(tagged);
            object.insert("type".to_owned(), log.name().into());
            object.insert(
                "message".to_owned(),
                truncate_with_indicator(log.message()).into_owned().into(),
            );
            object.insert("errorCode".to_owned(), log.code().into());
            if let Some(status) = log.http_status_code() {
                object.insert("httpStatusCode".to_owned(), status.into());
            }
            if let Some(details) = log.rendered_details() {
                object.insert("details".to_owned(), details.into());
            }
        }
        None => {
            object.insert("type".to_owned(), "Error".into());
            object.insert(
                "message".to_owned(),
                truncate_with_indicator(&err.to_string()).into_owned().into(),
            );
        }
    }

    if let Some(source) = err.source().filter(|_| depth < MAX_CAUSE_DEPTH) {
        object.insert("cause".to_owned(), serialize_error(source, depth + 1));
    }

    Value::Object(object)
}

fn emit(log_object: &GlobalErrorLogObject) {
    let error = log_object.error.as_ref().map(Value::to_string);
    tracing::error!(
        request_id = log_object.request_id.as_deref(),
        error = error.as_deref(),
        "{}",
        log_object.msg
    );
}

fn report(raised: &Raised) {
    emit(&resolve_global_error_log_object(raised, None));
}

fn stop() -> ! {
    std::process::exit(GLOBAL_ERROR_EXIT_CODE)
}

// ============================================================================
// Wrappers
// ============================================================================

/// Run `operation`, logging an escaped error or panic.
///
/// Returns `None` after logging when `stop_on_error` is false. Otherwise the
/// process exits with [`GLOBAL_ERROR_EXIT_CODE`].
pub fn execute_and_handle_global_errors<T, E>(
    operation: impl FnOnce() -> Result<T, E>,
    stop_on_error: bool,
) -> Option<T>
where
    E: Into<BoxedCause>,
{
    let raised = match catch_unwind(AssertUnwindSafe(operation)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => Raised::Error(err.into()),
        Err(payload) => Raised::Panic(payload),
    };

    report(&raised);
    if stop_on_error {
        stop();
    }
    None
}

/// Async form of [`execute_and_handle_global_errors`].
pub async fn execute_async_and_handle_global_errors<T, E, Fut>(
    operation: Fut,
    stop_on_error: bool,
) -> Option<T>
where
    E: Into<BoxedCause>,
    Fut: Future<Output = Result<T, E>>,
{
    let mut operation = Box::pin(operation);
    match poll_fn(|cx| poll_caught(operation.as_mut(), cx)).await {
        Ok(value) => Some(value),
        Err(raised) => {
            report(&raised);
            if stop_on_error {
                stop();
            }
            None
        }
    }
}

/// Drive every operation to completion, then log each failure.
///
/// Results keep the input order. If any operation failed, returns `None`
/// after logging all failures, or exits when `stop_on_error` is set.
pub async fn execute_settle_all_and_handle_global_errors<T, E, Fut>(
    operations: impl IntoIterator<Item = Fut>,
    stop_on_error: bool,
) -> Option<Vec<T>>
where
    E: Into<BoxedCause>,
    Fut: Future<Output = Result<T, E>>,
{
    let mut pending: Vec<Option<Pin<Box<Fut>>>> =
        operations.into_iter().map(|op| Some(Box::pin(op))).collect();
    let mut settled: Vec<Option<Result<T, Raised>>> = pending.iter().map(|_| None).collect();

    poll_fn(|cx| {
        let mut all_settled = true;
        for (slot, outcome) in pending.iter_mut().zip(settled.iter_mut()) {
            let Some(operation) = slot else {
                continue;
            };
            match poll_caught(operation.as_mut(), cx) {
                Poll::Pending => all_settled = false,
                Poll::Ready(result) => {
                    *outcome = Some(result);
                    *slot = None;
                }
            }
        }

        if all_settled { Poll::Ready(()) } else { Poll::Pending }
    })
    .await;

    let mut results = Vec::with_capacity(settled.len());
    let mut errors_happened = false;
    for outcome in settled.into_iter().flatten() {
        match outcome {
            Ok(value) => results.push(value),
            Err(raised) => {
                report(&raised);
                errors_happened = true;
            }
        }
    }

    if errors_happened {
        if stop_on_error {
            stop();
        }
        return None;
    }
    Some(results)
}

fn poll_caught<T, E, Fut>(operation: Pin<&mut Fut>, cx: &mut Context<'_>) -> Poll<Result<T, Raised>>
where
    E: Into<BoxedCause>,
    Fut: Future<Output = Result<T, E>>,
{
    match catch_unwind(AssertUnwindSafe(|| operation.poll(cx))) {
        Ok(Poll::Pending) => Poll::Pending,
        Ok(Poll::Ready(Ok(value))) => Poll::Ready(Ok(value)),
        Ok(Poll::Ready(Err(err))) => Poll::Ready(Err(Raised::Error(err.into()))),
        Err(payload) => Poll::Ready(Err(Raised::Panic(payload))),
    }
}
