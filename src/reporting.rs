//! Error reporting contracts and a bounded in-memory reporter.
//!
//! [`ErrorReporter`] ships an error (plus optional context) somewhere: a log
//! pipeline, an error tracker, a test buffer. [`ErrorResolver`] turns
//! anything that was raised into an [`InternalError`], so the reporting side
//! only ever deals with one shape.
//!
//! [`RingBufferReporter`] keeps the most recent reports in memory with FIFO
//! eviction and a byte cap per entry, so a burst of failures cannot grow it
//! without bound.

use crate::base::BoxedCause;
use crate::internal::{InternalError, InternalErrorParams};
use crate::logging::ErrorLog;
use crate::tagged_view;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Code given to errors the resolver does not recognize.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

// ============================================================================
// Contracts
// ============================================================================

/// An error together with the context it happened in.
#[derive(Debug)]
pub struct ErrorReport<'a> {
    /// The error.
    pub error: &'a (dyn Error + 'static),
    /// Free-form context, e.g. a request id.
    pub context: Option<Value>,
}

impl<'a> ErrorReport<'a> {
    /// Report without context.
    pub fn new(error: &'a (dyn Error + 'static)) -> Self {
        Self {
            error,
            context: None,
        }
    }

    /// Attach context.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Sends error reports somewhere.
pub trait ErrorReporter: Send + Sync {
    /// Report one error.
    fn report(&self, report: &ErrorReport<'_>);
}

/// Normalizes whatever was raised into an [`InternalError`].
pub trait ErrorResolver {
    /// Resolve `thrown`.
    fn process_error(&self, thrown: BoxedCause) -> InternalError;
}

/// Keeps internal errors as they are and wraps everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorResolver;

impl ErrorResolver for DefaultErrorResolver {
    fn process_error(&self, thrown: BoxedCause) -> InternalError {
        match thrown.downcast::<InternalError>() {
            Ok(internal) => *internal,
            Err(other) => InternalError::new(
                InternalErrorParams {
                    message: other.to_string(),
                    error_code: Cow::Borrowed(UNKNOWN_ERROR_CODE),
                    details: None,
                    cause: Some(other),
                },
            ),
        }
    }
}

/// Reports through `tracing` at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: &ErrorReport<'_>) {
        let context = report.context.as_ref().map(|c| c.to_string());

        match tagged_view(report.error) {
            Some(tagged) => {
                let log = ErrorLog::from_error(tagged);
                tracing::error!(
                    error_name = log.name(),
                    error_code = log.code(),
                    http_status_code = log.http_status_code(),
                    context = context.as_deref(),
                    "{}",
                    crate::logging::truncate_with_indicator(log.message())
                );
            }
            None => {
                tracing::error!(
                    error_code = UNKNOWN_ERROR_CODE,
                    context = context.as_deref(),
                    "{}",
                    report.error
                );
            }
        }
    }
}

// ============================================================================
// Ring Buffer Reporter
// ============================================================================

/// One captured report, capped in size.
///
/// Fields are `Arc<str>` so reading entries back only bumps refcounts.
#[derive(Clone, Debug)]
pub struct ReportEntry {
    /// Unix timestamp of the report, in seconds.
    pub timestamp: u64,
    /// Error name.
    pub name: Arc<str>,
    /// Error code.
    pub code: Arc<str>,
    /// Message, truncated.
    pub message: Arc<str>,
    /// Context rendered as JSON, truncated.
    pub context: Option<Arc<str>>,
    /// Whether the error was public.
    pub is_public: bool,
    /// Bytes of payload held by this entry.
    pub size_bytes: usize,
}

struct Entries {
    items: VecDeque<ReportEntry>,
    capacity: usize,
}

/// Bounded reporter keeping the most recent reports.
///
/// Clones share the same buffer.
#[derive(Clone)]
pub struct RingBufferReporter {
    entries: Arc<RwLock<Entries>>,
    max_entry_bytes: usize,
    eviction_count: Arc<AtomicU64>,
}

impl RingBufferReporter {
    /// Keep at most `max_entries` (at least 1), each at most `max_entry_bytes`.
    pub fn new(max_entries: usize, max_entry_bytes: usize) -> Self {
        let capacity = max_entries.max(1);
        Self {
            entries: Arc::new(RwLock::new(Entries {
                items: VecDeque::with_capacity(capacity),
                capacity,
            })),
            max_entry_bytes,
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn capture(&self, report: &ErrorReport<'_>) -> ReportEntry {
        let rendered_message;
        let (name, code, message, is_public) = match tagged_view(report.error) {
            Some(tagged) => (
                tagged.error_name(),
                tagged.error_code(),
                tagged.message(),
                tagged.is_public(),
            ),
            None => {
                rendered_message = report.error.to_string();
                ("Error", UNKNOWN_ERROR_CODE, rendered_message.as_str(), false)
            }
        };

        // Name and code are short identifiers and always kept whole.
        let mut remaining = self.max_entry_bytes.saturating_sub(name.len() + code.len());
        let message = truncate_to_bytes(message, remaining);
        remaining = remaining.saturating_sub(message.len());

        let context = report
            .context
            .as_ref()
            .map(|ctx| Arc::from(truncate_to_bytes(&ctx.to_string(), remaining).as_ref()));
        let context_len = context.as_ref().map_or(0, |c: &Arc<str>| c.len());

        ReportEntry {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            name: Arc::from(name),
            code: Arc::from(code),
            size_bytes: name.len() + code.len() + message.len() + context_len,
            message: Arc::from(message.as_ref()),
            context,
            is_public,
        }
    }

    /// The `count` most recent entries, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<ReportEntry> {
        self.read_entries().items.iter().rev().take(count).cloned().collect()
    }

    /// Every entry, newest first.
    pub fn get_all(&self) -> Vec<ReportEntry> {
        self.read_entries().items.iter().rev().cloned().collect()
    }

    /// Entries matching `predicate`, oldest first.
    pub fn get_filtered<F>(&self, predicate: F) -> Vec<ReportEntry>
    where
        F: Fn(&ReportEntry) -> bool,
    {
        self.read_entries()
            .items
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.read_entries().items.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.read_entries().capacity
    }

    /// Entries dropped to make room since creation.
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.write_entries().items.clear();
    }
}

impl ErrorReporter for RingBufferReporter {
    fn report(&self, report: &ErrorReport<'_>) {
        let entry = self.capture(report);

        let mut entries = self.write_entries();
        if entries.items.len() >= entries.capacity {
            entries.items.pop_front();
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
        entries.items.push_back(entry);
    }
}

/// Truncate to `max_bytes` on a char boundary, marking the cut.
fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    const INDICATOR: &str = "...[TRUNC]";

    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    if max_bytes <= INDICATOR.len() {
        return Cow::Borrowed(&INDICATOR[..max_bytes]);
    }

    let mut idx = max_bytes - INDICATOR.len();
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    let mut out = String::with_capacity(idx + INDICATOR.len());
    out.push_str(&s[..idx]);
    out.push_str(INDICATOR);
    Cow::Owned(out)
}
