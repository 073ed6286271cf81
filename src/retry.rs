//! Retry and outcome policies for the request classifier.
//!
//! Both policies are plain configuration values. They can be built in code
//! or deserialized from a configuration document with camelCase keys:
//!
//! ```rust
//! use tagged_errors::RetryPolicy;
//!
//! let policy: RetryPolicy = serde_json::from_str(r#"{
//!     "statusCodesToRetry": [502, 503],
//!     "retryOnTimeout": true,
//!     "delayBetweenAttemptsInMsecs": 250,
//!     "maxAttempts": 3
//! }"#).unwrap();
//!
//! assert!(policy.should_retry(Some(503), false, 1));
//! assert!(!policy.should_retry(Some(503), false, 3));
//! ```

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Retry Policy
// ============================================================================

/// When and how often a failed attempt is repeated.
///
/// `max_attempts` counts every attempt, the first one included, and is
/// always at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRetryPolicy")]
pub struct RetryPolicy {
    status_codes_to_retry: SmallVec<[u16; 4]>,
    retry_on_timeout: bool,
    delay_between_attempts_in_msecs: u64,
    max_attempts: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRetryPolicy {
    #[serde(default)]
    status_codes_to_retry: SmallVec<[u16; 4]>,
    #[serde(default)]
    retry_on_timeout: bool,
    #[serde(default)]
    delay_between_attempts_in_msecs: u64,
    max_attempts: u32,
}

impl TryFrom<RawRetryPolicy> for RetryPolicy {
    type Error = RetryPolicyError;

    fn try_from(raw: RawRetryPolicy) -> Result<Self, Self::Error> {
        Ok(Self::checked_new(raw.max_attempts)?
            .with_status_codes(raw.status_codes_to_retry)
            .with_retry_on_timeout(raw.retry_on_timeout)
            .with_delay_msecs(raw.delay_between_attempts_in_msecs))
    }
}

/// Invalid retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicyError {
    /// `max_attempts` must allow at least the first attempt.
    ZeroMaxAttempts,
}

impl fmt::Display for RetryPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaxAttempts => f.write_str("maxAttempts must be at least 1"),
        }
    }
}

impl std::error::Error for RetryPolicyError {}

impl RetryPolicy {
    /// Policy allowing `max_attempts` attempts, retrying on nothing yet.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is 0. In const contexts this is a compile error.
    pub const fn new(max_attempts: u32) -> Self {
        assert!(max_attempts >= 1, "maxAttempts must be at least 1");
        Self {
            status_codes_to_retry: SmallVec::new_const(),
            retry_on_timeout: false,
            delay_between_attempts_in_msecs: 0,
            max_attempts,
        }
    }

    /// Like [`new`](Self::new), for values read at runtime.
    pub fn checked_new(max_attempts: u32) -> Result<Self, RetryPolicyError> {
        if max_attempts == 0 {
            return Err(RetryPolicyError::ZeroMaxAttempts);
        }
        Ok(Self::new(max_attempts))
    }

    /// A single attempt, never retried.
    pub const fn no_retry() -> Self {
        Self::new(1)
    }

    /// Statuses that make a failed attempt retryable.
    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_codes_to_retry = codes.into_iter().collect();
        self
    }

    /// Whether timed-out attempts are retried.
    pub fn with_retry_on_timeout(mut self, retry_on_timeout: bool) -> Self {
        self.retry_on_timeout = retry_on_timeout;
        self
    }

    /// Pause between attempts, in milliseconds. 0 retries immediately.
    pub fn with_delay_msecs(mut self, msecs: u64) -> Self {
        self.delay_between_attempts_in_msecs = msecs;
        self
    }

    /// Statuses that make a failed attempt retryable.
    #[inline]
    pub fn status_codes_to_retry(&self) -> &[u16] {
        &self.status_codes_to_retry
    }

    /// Whether timed-out attempts are retried.
    #[inline]
    pub fn retry_on_timeout(&self) -> bool {
        self.retry_on_timeout
    }

    /// Pause between attempts.
    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_attempts_in_msecs)
    }

    /// Total attempts allowed, first one included.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether a failed attempt is retried after `attempts_used` attempts.
    ///
    /// A failure without a status is retried only when it timed out and
    /// timeouts are retryable. Refused connections are never retried.
    pub fn should_retry(&self, status_code: Option<u16>, timed_out: bool, attempts_used: u32) -> bool {
        if attempts_used >= self.max_attempts {
            return false;
        }

        let retryable_status = status_code.is_some_and(|code| self.status_codes_to_retry.contains(&code));
        retryable_status || (timed_out && self.retry_on_timeout)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

// ============================================================================
// Outcome Policy
// ============================================================================

/// What the classifier does with the terminal outcome.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutcomePolicy {
    /// Turn a terminal failure into an error instead of returning it.
    pub throw_on_error: bool,
    /// Validate successful bodies against `response_schema`.
    pub validate_response: bool,
    /// Shape a successful body must have.
    #[serde(skip)]
    pub response_schema: Option<Arc<dyn Schema>>,
    /// Label identifying the request in errors and logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_label: Option<Cow<'static, str>>,
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self {
            throw_on_error: true,
            validate_response: true,
            response_schema: None,
            request_label: None,
        }
    }
}

impl OutcomePolicy {
    /// Set `throw_on_error`.
    pub fn throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }

    /// Set `validate_response`.
    pub fn validate_response(mut self, validate_response: bool) -> Self {
        self.validate_response = validate_response;
        self
    }

    /// Attach a response schema.
    pub fn response_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.response_schema = Some(Arc::new(schema));
        self
    }

    /// Label the request.
    pub fn request_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.request_label = Some(label.into());
        self
    }
}

impl fmt::Debug for OutcomePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomePolicy")
            .field("throw_on_error", &self.throw_on_error)
            .field("validate_response", &self.validate_response)
            .field("response_schema", &self.response_schema.as_ref().map(|_| "<SCHEMA>"))
            .field("request_label", &self.request_label)
            .finish()
    }
}
