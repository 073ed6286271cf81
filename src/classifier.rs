//! Request outcome classifier.
//!
//! Wraps one fallible remote call, supplied by a [`Transport`], with a
//! [`RetryPolicy`] and turns the terminal outcome into a value, an [`Either`]
//! or an error, as selected by an [`OutcomePolicy`].
//!
//! # Flow
//!
//! 1. Perform one attempt.
//! 2. On failure, if the policy allows another attempt, pause and go to 1.
//! 3. Shape the terminal outcome:
//!    - failure with `throw_on_error`: [`RequestError::ResponseStatus`]
//!    - failure otherwise: `Ok(Either::Failure)`, unchanged
//!    - success with `validate_response` and a schema: the parsed body, or
//!      [`RequestError::InvalidResponse`] on a violation, whatever `throw_on_error` says
//!    - success otherwise: `Ok(Either::Success)`, unchanged
//!
//! Attempts are strictly sequential and each [`RequestClassifier::execute`]
//! call keeps its own attempt counter.

use crate::either::Either;
use crate::identity::{ErrorTag, TypeTagged};
use crate::internal::{InternalError, InternalErrorParams};
use crate::public::PublicError;
use crate::retry::{OutcomePolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::error::Error;
use std::fmt;
use std::future::Future;
use tracing::warn;

#[cfg(any(feature = "tokio", feature = "async_std"))]
use std::time::Duration;

/// Label used when the outcome policy names none.
pub const DEFAULT_REQUEST_LABEL: &str = "N/A";

// ============================================================================
// Transport Contract
// ============================================================================

/// Successful attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Protocol status.
    pub status_code: u16,
    /// Decoded body.
    pub body: Value,
}

impl Response {
    /// Response with `status_code` and `body`.
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }
}

/// Failed attempt.
///
/// `status_code` is absent when no response arrived at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptFailure {
    /// Protocol status, if a response arrived.
    pub status_code: Option<u16>,
    /// Decoded body, `null` when there was none.
    pub body: Value,
    /// The attempt ran out of time.
    #[serde(default)]
    pub timed_out: bool,
}

impl AttemptFailure {
    /// A response with a failing status.
    pub fn status(status_code: u16, body: Value) -> Self {
        Self {
            status_code: Some(status_code),
            body,
            timed_out: false,
        }
    }

    /// No response within the deadline.
    pub fn timeout() -> Self {
        Self {
            status_code: None,
            body: Value::Null,
            timed_out: true,
        }
    }

    /// No response for another reason, e.g. a refused connection.
    pub fn connection(body: Value) -> Self {
        Self {
            status_code: None,
            body,
            timed_out: false,
        }
    }
}

/// Outcome of a single attempt.
pub type AttemptOutcome = Either<AttemptFailure, Response>;

/// Performs one attempt of a remote call. Never retries on its own.
pub trait Transport {
    /// Run one attempt.
    fn attempt(&mut self) -> impl Future<Output = AttemptOutcome>;
}

impl<F, Fut> Transport for F
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    fn attempt(&mut self) -> impl Future<Output = AttemptOutcome> {
        self()
    }
}

// ============================================================================
// Request Errors
// ============================================================================

/// Terminal outcome the caller asked to receive as an error.
#[derive(Debug)]
pub enum RequestError {
    /// Terminal failure under `throw_on_error`. Tagged `ResponseStatusError`.
    ResponseStatus(PublicError),
    /// A successful body violated the response schema.
    InvalidResponse(InternalError),
}

impl RequestError {
    /// Tagged view of the wrapped error.
    pub fn as_tagged(&self) -> &dyn TypeTagged {
        match self {
            Self::ResponseStatus(err) => err,
            Self::InvalidResponse(err) => err,
        }
    }

    /// Details of the wrapped error.
    pub fn details(&self) -> Option<&Value> {
        self.as_tagged().details()
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseStatus(err) => fmt::Display::fmt(err, f),
            Self::InvalidResponse(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ResponseStatus(err) => err.source(),
            Self::InvalidResponse(err) => err.source(),
        }
    }
}

impl TypeTagged for RequestError {
    fn error_name(&self) -> &str {
        self.as_tagged().error_name()
    }

    fn message(&self) -> &str {
        self.as_tagged().message()
    }

    fn error_code(&self) -> &str {
        self.as_tagged().error_code()
    }

    fn tags(&self) -> &[ErrorTag] {
        self.as_tagged().tags()
    }

    fn details(&self) -> Option<&Value> {
        self.as_tagged().details()
    }

    fn http_status_code(&self) -> Option<u16> {
        self.as_tagged().http_status_code()
    }

    fn is_public(&self) -> bool {
        self.as_tagged().is_public()
    }
}

impl From<PublicError> for RequestError {
    fn from(err: PublicError) -> Self {
        Self::ResponseStatus(err)
    }
}

impl From<InternalError> for RequestError {
    fn from(err: InternalError) -> Self {
        Self::InvalidResponse(err)
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Retry loop plus outcome shaping for one kind of request.
#[derive(Debug, Clone, Default)]
pub struct RequestClassifier {
    retry: RetryPolicy,
    outcome: OutcomePolicy,
}

impl RequestClassifier {
    /// Classifier with both policies.
    pub fn new(retry: RetryPolicy, outcome: OutcomePolicy) -> Self {
        Self { retry, outcome }
    }

    /// Retry policy.
    #[inline]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Outcome policy.
    #[inline]
    pub fn outcome_policy(&self) -> &OutcomePolicy {
        &self.outcome
    }

    fn request_label(&self) -> &str {
        self.outcome
            .request_label
            .as_deref()
            .unwrap_or(DEFAULT_REQUEST_LABEL)
    }

    /// Run `transport` until it succeeds or the retry policy gives up, then
    /// shape the terminal outcome with [`classify`](Self::classify).
    #[cfg(any(feature = "tokio", feature = "async_std"))]
    pub async fn execute<T: Transport>(
        &self,
        transport: &mut T,
    ) -> Result<AttemptOutcome, RequestError> {
        let mut attempts_used: u32 = 0;

        let outcome = loop {
            attempts_used += 1;
            let outcome = transport.attempt().await;

            if let Either::Failure(failure) = &outcome {
                if self
                    .retry
                    .should_retry(failure.status_code, failure.timed_out, attempts_used)
                {
                    tracing::debug!(
                        request_label = self.request_label(),
                        attempt = attempts_used,
                        status_code = ?failure.status_code,
                        timed_out = failure.timed_out,
                        "Retrying failed attempt"
                    );
                    pause(self.retry.delay()).await;
                    continue;
                }
            }

            break outcome;
        };

        self.classify(outcome)
    }

    /// Shape a terminal outcome according to the outcome policy.
    pub fn classify(&self, outcome: AttemptOutcome) -> Result<AttemptOutcome, RequestError> {
        match outcome {
            Either::Failure(failure) => {
                if !self.outcome.throw_on_error {
                    return Ok(Either::Failure(failure));
                }

                warn!(
                    request_label = self.request_label(),
                    status_code = ?failure.status_code,
                    timed_out = failure.timed_out,
                    "Request failed"
                );
                Err(RequestError::ResponseStatus(PublicError::response_status(
                    failure.status_code,
                    failure.body,
                    Some(self.request_label()),
                )))
            }
            Either::Success(mut response) => {
                let schema = match (&self.outcome.response_schema, self.outcome.validate_response) {
                    (Some(schema), true) => schema,
                    _ => return Ok(Either::Success(response)),
                };

                match schema.parse(&response.body) {
                    Ok(parsed) => {
                        response.body = parsed;
                        Ok(Either::Success(response))
                    }
                    Err(violation) => {
                        warn!(
                            request_label = self.request_label(),
                            status_code = response.status_code,
                            violation = violation.message(),
                            "Response failed validation"
                        );
                        let params = InternalErrorParams::new(
                            format!("Invalid response: {}", violation.message()),
                            "RESPONSE_VALIDATION_FAILED",
                        )
                        .details(json!({
                            "requestLabel": self.request_label(),
                            "response": {
                                "statusCode": response.status_code,
                                "body": response.body
                            }
                        }))
                        .cause(violation);
                        Err(RequestError::InvalidResponse(InternalError::new(params)))
                    }
                }
            }
        }
    }
}

#[cfg(any(feature = "tokio", feature = "async_std"))]
async fn pause(delay: Duration) {
    if delay.is_zero() {
        return;
    }

    #[cfg(feature = "tokio")]
    tokio::time::sleep(delay).await;

    #[cfg(all(feature = "async_std", not(feature = "tokio")))]
    async_std::task::sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::is_internal_error;
    use crate::public::{is_public_error, is_response_status_error};
    use crate::schema::SchemaViolation;

    fn expect_object(data: &Value) -> Result<Value, SchemaViolation> {
        if data.is_object() {
            Ok(data.clone())
        } else {
            Err(SchemaViolation::new("expected an object"))
        }
    }

    #[test]
    fn failure_passes_through_without_throw() {
        let classifier = RequestClassifier::new(
            RetryPolicy::default(),
            OutcomePolicy::default().throw_on_error(false),
        );
        let outcome = classifier
            .classify(Either::Failure(AttemptFailure::status(400, json!("bad"))))
            .unwrap();
        assert_eq!(outcome.error().and_then(|f| f.status_code), Some(400));
    }

    #[test]
    fn failure_becomes_response_status_error() {
        let classifier = RequestClassifier::new(
            RetryPolicy::default(),
            OutcomePolicy::default().request_label("list-users"),
        );
        let err = classifier
            .classify(Either::Failure(AttemptFailure::status(400, json!({ "e": 1 }))))
            .unwrap_err();

        assert!(is_public_error(&err));
        assert!(is_response_status_error(&err));
        assert_eq!(err.to_string(), "Response status code 400");
        let details = err.details().unwrap();
        assert_eq!(details["requestLabel"], "list-users");
        assert_eq!(details["response"]["statusCode"], 400);
        assert_eq!(details["response"]["body"], json!({ "e": 1 }));
    }

    #[test]
    fn schema_violation_errors_even_without_throw() {
        let classifier = RequestClassifier::new(
            RetryPolicy::default(),
            OutcomePolicy::default()
                .throw_on_error(false)
                .response_schema(expect_object),
        );
        let err = classifier
            .classify(Either::Success(Response::new(200, json!([1, 2]))))
            .unwrap_err();

        assert!(matches!(err, RequestError::InvalidResponse(_)));
        assert!(is_internal_error(&err));
        assert!(err.source().is_some());
    }

    #[test]
    fn validation_can_be_disabled() {
        let classifier = RequestClassifier::new(
            RetryPolicy::default(),
            OutcomePolicy::default()
                .validate_response(false)
                .response_schema(expect_object),
        );
        let outcome = classifier
            .classify(Either::Success(Response::new(200, json!("raw"))))
            .unwrap();
        assert_eq!(outcome.result().map(|r| &r.body), Some(&json!("raw")));
    }

    #[test]
    fn parsed_body_replaces_raw_body() {
        let trim = |data: &Value| -> Result<Value, SchemaViolation> {
            Ok(json!({ "id": data["id"].clone() }))
        };
        let classifier =
            RequestClassifier::new(RetryPolicy::default(), OutcomePolicy::default().response_schema(trim));
        let outcome = classifier
            .classify(Either::Success(Response::new(200, json!({ "id": 1, "noise": true }))))
            .unwrap();
        assert_eq!(outcome.result().unwrap().body, json!({ "id": 1 }));
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn closures_are_transports() {
        let classifier = RequestClassifier::default();
        let mut transport = || async { AttemptOutcome::Success(Response::new(204, Value::Null)) };
        let outcome = classifier.execute(&mut transport).await.unwrap();
        assert_eq!(outcome.result().map(|r| r.status_code), Some(204));
    }
}
