//! Structured log view of tagged errors.
//!
//! [`ErrorLog`] borrows from the error it describes and cannot outlive it.
//! It is meant to be consumed immediately by a logger: either written to a
//! buffer with [`ErrorLog::write_to`] or turned into a `tracing` event with
//! [`emit`].
//!
//! Every field written through this module is truncated to
//! [`MAX_FIELD_OUTPUT_LEN`] bytes, so a huge message or body cannot blow up
//! the log pipeline.

use crate::identity::{ErrorTag, TypeTagged};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Maximum length for any individual field in formatted output.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Appended to truncated fields.
pub const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Borrowed, structured view of an error.
///
/// ```rust
/// use tagged_errors::{InternalError, InternalErrorParams, logging::ErrorLog};
///
/// let err = InternalError::new(InternalErrorParams::new("db down", "DB_DOWN"));
/// let mut line = String::new();
/// ErrorLog::from_error(&err).write_to(&mut line).unwrap();
/// assert_eq!(line, "[DB_DOWN] InternalError message='db down'");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ErrorLog<'a> {
    name: &'a str,
    code: &'a str,
    message: &'a str,
    details: Option<&'a Value>,
    http_status_code: Option<u16>,
    is_public: bool,
    tags: &'a [ErrorTag],
}

impl<'a> ErrorLog<'a> {
    /// View of `err`.
    pub fn from_error(err: &'a dyn TypeTagged) -> Self {
        Self {
            name: err.error_name(),
            code: err.error_code(),
            message: err.message(),
            details: err.details(),
            http_status_code: err.http_status_code(),
            is_public: err.is_public(),
            tags: err.tags(),
        }
    }

    /// Write a single log line, every field truncated.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{}] {} message='{}'",
            truncate_with_indicator(self.code),
            self.name,
            truncate_with_indicator(self.message)
        )?;

        if let Some(status) = self.http_status_code {
            write!(f, " status={}", status)?;
        }

        if let Some(details) = self.rendered_details() {
            write!(f, " details='{}'", details)?;
        }

        Ok(())
    }

    /// Like [`write_to`](Self::write_to), plus the identity tags.
    ///
    /// Only available with the `trusted_debug` feature in debug builds.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut output);

        output.push_str(" tags=[");
        for (idx, tag) in self.tags.iter().enumerate() {
            if idx > 0 {
                output.push(',');
            }
            output.push_str(tag.path());
        }
        output.push(']');
        output
    }

    /// Details rendered as compact JSON, truncated.
    pub fn rendered_details(&self) -> Option<String> {
        self.details
            .map(|details| truncate_with_indicator(&details.to_string()).into_owned())
    }

    /// Error name.
    #[inline]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Error code.
    #[inline]
    pub const fn code(&self) -> &'a str {
        self.code
    }

    /// Message, untruncated.
    #[inline]
    pub const fn message(&self) -> &'a str {
        self.message
    }

    /// Details, untruncated.
    #[inline]
    pub const fn details(&self) -> Option<&'a Value> {
        self.details
    }

    /// Protocol status, if any.
    #[inline]
    pub const fn http_status_code(&self) -> Option<u16> {
        self.http_status_code
    }

    /// Whether the error may be shown to callers.
    #[inline]
    pub const fn is_public(&self) -> bool {
        self.is_public
    }

    /// Identity tags.
    #[inline]
    pub const fn tags(&self) -> &'a [ErrorTag] {
        self.tags
    }
}

impl fmt::Display for ErrorLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Emit `err` as a `tracing` event.
///
/// Public errors are expected outcomes and go out at `warn`. Everything
/// else is logged at `error`.
pub fn emit(err: &dyn TypeTagged) {
    let log = ErrorLog::from_error(err);
    let message = truncate_with_indicator(log.message());
    let details = log.rendered_details();

    if log.is_public() {
        tracing::warn!(
            error_name = log.name(),
            error_code = log.code(),
            http_status_code = log.http_status_code(),
            details = details.as_deref(),
            "{}",
            message
        );
    } else {
        tracing::error!(
            error_name = log.name(),
            error_code = log.code(),
            http_status_code = log.http_status_code(),
            details = details.as_deref(),
            "{}",
            message
        );
    }
}

/// Truncate `s` to [`MAX_FIELD_OUTPUT_LEN`] bytes on a char boundary.
///
/// Borrows when no truncation is needed.
pub fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{InternalError, InternalErrorParams};
    use crate::public::{CommonErrorParams, PublicError};
    use serde_json::json;

    #[test]
    fn public_line_has_status_and_details() {
        let err = PublicError::entity_gone(
            CommonErrorParams::new("order removed").details(json!({ "orderId": 9 })),
        );
        let line = ErrorLog::from_error(&err).to_string();
        assert_eq!(
            line,
            "[ENTITY_GONE] EntityGoneError message='order removed' status=410 details='{\"orderId\":9}'"
        );
    }

    #[test]
    fn view_reflects_visibility_and_tags() {
        let err = InternalError::new(InternalErrorParams::new("x", "X"));
        let log = ErrorLog::from_error(&err);
        assert!(!log.is_public());
        assert_eq!(log.http_status_code(), None);
        assert_eq!(log.tags().len(), 2);
    }

    #[test]
    fn huge_message_is_truncated() {
        let err = InternalError::new(InternalErrorParams::new("m".repeat(5000), "BIG"));
        let line = ErrorLog::from_error(&err).to_string();
        assert!(line.contains(TRUNCATION_INDICATOR));
        assert!(line.len() < 5000);
    }

    #[test]
    fn emit_without_subscriber_is_silent() {
        let err = InternalError::new(InternalErrorParams::new("x", "X"));
        emit(&err);
        emit(&PublicError::entity_gone(CommonErrorParams::new("gone")));
    }

    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    #[test]
    fn trusted_debug_lists_tags() {
        let err = InternalError::new(InternalErrorParams::new("x", "X"));
        let out = ErrorLog::from_error(&err).format_for_trusted_debug();
        assert!(out.ends_with("tags=[BaseError,BaseError.InternalError]"));
    }

    #[test]
    fn truncate_ascii() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN + 10);
        let truncated = truncate_with_indicator(&s);

        assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn no_truncate_when_under_limit() {
        let truncated = truncate_with_indicator("short string");
        assert!(matches!(truncated, Cow::Borrowed(_)));
    }

    #[test]
    fn truncate_utf8_boundary() {
        // 2 bytes per char.
        let s = "й".repeat(MAX_FIELD_OUTPUT_LEN);
        let truncated = truncate_with_indicator(&s);

        assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn exactly_at_limit() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN);
        let truncated = truncate_with_indicator(&s);

        assert!(matches!(truncated, Cow::Borrowed(_)));
        assert!(!truncated.ends_with(TRUNCATION_INDICATOR));
    }
}
