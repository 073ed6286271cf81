//! Property-based tests for tagged_errors
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use proptest::prelude::*;
use tagged_errors::logging::{ErrorLog, MAX_FIELD_OUTPUT_LEN, truncate_with_indicator};
use tagged_errors::{
    BASE_ERROR, Either, ErrorCategory, ErrorType, InternalError, InternalErrorParams, RetryPolicy,
    TaggedError, has_type, intern_tag, lookup_tag,
};

fn type_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,8}".prop_filter("universal root is reserved", |name| name != "Error")
}

/// Build a descriptor chain below `BaseError` at runtime.
fn leak_chain(names: &[String]) -> Vec<&'static ErrorType> {
    let mut chain = Vec::with_capacity(names.len());
    let mut parent: &'static ErrorType = &BASE_ERROR;

    for name in names {
        let name: &'static str = Box::leak(name.clone().into_boxed_str());
        let ty: &'static ErrorType = Box::leak(Box::new(ErrorType::child(name, parent)));
        chain.push(ty);
        parent = ty;
    }

    chain
}

static UNRELATED_SIBLING: ErrorType = ErrorType::child("ZzUnrelatedSibling", &BASE_ERROR);

// ============================================================================
// IDENTITY PROPERTIES
// ============================================================================

proptest! {
    /// Interning is idempotent and keyed only by the path string
    #[test]
    fn interning_is_idempotent(path in "[A-Za-z.]{1,40}") {
        let first = intern_tag(&path);
        let second = intern_tag(&path.clone());
        prop_assert_eq!(first, second);
        prop_assert_eq!(lookup_tag(&path), Some(first));
        prop_assert_eq!(first.path(), path.as_str());
    }

    /// Distinct paths never share a tag
    #[test]
    fn distinct_paths_distinct_tags(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        prop_assume!(a != b);
        prop_assert_ne!(intern_tag(&a), intern_tag(&b));
    }

    /// An instance matches every ancestor of its type, and nothing unrelated
    #[test]
    fn instance_matches_every_ancestor(names in prop::collection::vec(type_name(), 1..6)) {
        let chain = leak_chain(&names);
        let leaf = chain[chain.len() - 1];
        let err = TaggedError::new(leaf, "PROP", "generated");

        prop_assert_eq!(err.tags().len(), names.len() + 1);
        prop_assert!(has_type(&err, &BASE_ERROR));
        for ancestor in &chain {
            prop_assert!(has_type(&err, ancestor));
        }
        prop_assert!(!has_type(&err, &UNRELATED_SIBLING));
    }

    /// A chain declared twice yields interchangeable descriptors
    #[test]
    fn duplicate_declarations_are_interchangeable(names in prop::collection::vec(type_name(), 1..5)) {
        let original = leak_chain(&names);
        let duplicate = leak_chain(&names);
        let err = TaggedError::new(original[original.len() - 1], "PROP", "generated");

        for ty in &duplicate {
            prop_assert!(has_type(&err, ty));
        }
    }

    /// A descendant is never matched by an instance of its parent
    #[test]
    fn parents_do_not_match_descendants(names in prop::collection::vec(type_name(), 2..6)) {
        let chain = leak_chain(&names);
        let parent = chain[chain.len() - 2];
        let err = TaggedError::new(parent, "PROP", "generated");

        prop_assert!(!has_type(&err, chain[chain.len() - 1]));
    }
}

// ============================================================================
// TRUNCATION PROPERTIES
// ============================================================================

proptest! {
    /// Truncated strings must always be valid UTF-8 and bounded
    #[test]
    fn truncation_is_bounded_utf8(s in "\\PC{0,3000}") {
        let truncated = truncate_with_indicator(&s);
        prop_assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        prop_assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
        if s.len() <= MAX_FIELD_OUTPUT_LEN {
            prop_assert_eq!(truncated.as_ref(), s.as_str());
        }
    }

    /// Log lines stay bounded whatever the message size
    #[test]
    fn log_lines_are_bounded(message in "\\PC{0,10000}") {
        let err = InternalError::new(InternalErrorParams::new(message, "PROP"));
        let mut buffer = String::new();
        ErrorLog::from_error(&err).write_to(&mut buffer).unwrap();

        prop_assert!(buffer.len() <= MAX_FIELD_OUTPUT_LEN + 64);
    }
}

// ============================================================================
// POLICY PROPERTIES
// ============================================================================

proptest! {
    /// No retry once the attempt budget is spent
    #[test]
    fn retry_budget_is_respected(
        max_attempts in 1u32..10,
        used in 0u32..20,
        status in proptest::option::of(100u16..600),
        timed_out in any::<bool>(),
    ) {
        let policy = RetryPolicy::new(max_attempts)
            .with_status_codes([500, 502, 503])
            .with_retry_on_timeout(true);

        if used >= max_attempts {
            prop_assert!(!policy.should_retry(status, timed_out, used));
        }
    }

    /// Unlisted statuses are never retried
    #[test]
    fn unlisted_statuses_not_retried(status in 100u16..600) {
        prop_assume!(status != 503);
        let policy = RetryPolicy::new(5).with_status_codes([503]);
        prop_assert!(!policy.should_retry(Some(status), false, 1));
    }

    /// Either keeps exactly one side through conversions
    #[test]
    fn either_has_exactly_one_side(value in any::<i64>(), fail in any::<bool>()) {
        let result: Result<i64, i64> = if fail { Err(value) } else { Ok(value) };
        let either: Either<i64, i64> = result.into();

        prop_assert!(either.is_failure() != either.is_success());
        prop_assert_eq!(either.is_failure(), fail);
        prop_assert_eq!(either.into_result(), result);
    }

    /// Category tokens parse back to their category
    #[test]
    fn category_tokens_parse(idx in 0usize..8) {
        let category = ErrorCategory::ALL[idx];
        prop_assert_eq!(category.as_str().parse::<ErrorCategory>(), Ok(category));
    }
}
