//! Result channel for recoverable outcomes.
//!
//! [`Either`] holds exactly one of an error or a result. It serializes as
//! `{"error": ...}` or `{"result": ...}`, and converts to and from
//! [`std::result::Result`] so `?` stays available at the boundary.

use serde::{Deserialize, Serialize};

/// Exactly one of a failure or a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Either<E, R> {
    /// Error side.
    #[serde(rename = "error")]
    Failure(E),
    /// Result side.
    #[serde(rename = "result")]
    Success(R),
}

/// Build the error side.
#[inline]
pub const fn failure<E, R>(error: E) -> Either<E, R> {
    Either::Failure(error)
}

/// Build the result side.
#[inline]
pub const fn success<E, R>(result: R) -> Either<E, R> {
    Either::Success(result)
}

/// Whether `either` holds an error.
#[inline]
pub const fn is_failure<E, R>(either: &Either<E, R>) -> bool {
    matches!(either, Either::Failure(_))
}

/// Whether `either` holds a result.
#[inline]
pub const fn is_success<E, R>(either: &Either<E, R>) -> bool {
    matches!(either, Either::Success(_))
}

impl<E, R> Either<E, R> {
    /// Whether this holds an error.
    #[inline]
    pub const fn is_failure(&self) -> bool {
        is_failure(self)
    }

    /// Whether this holds a result.
    #[inline]
    pub const fn is_success(&self) -> bool {
        is_success(self)
    }

    /// The error, if any.
    #[inline]
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Failure(error) => Some(error),
            Self::Success(_) => None,
        }
    }

    /// The result, if any.
    #[inline]
    pub fn result(&self) -> Option<&R> {
        match self {
            Self::Failure(_) => None,
            Self::Success(result) => Some(result),
        }
    }

    /// Convert into a standard `Result`.
    #[inline]
    pub fn into_result(self) -> Result<R, E> {
        match self {
            Self::Failure(error) => Err(error),
            Self::Success(result) => Ok(result),
        }
    }

    /// Borrow both sides.
    #[inline]
    pub const fn as_ref(&self) -> Either<&E, &R> {
        match self {
            Self::Failure(error) => Either::Failure(error),
            Self::Success(result) => Either::Success(result),
        }
    }

    /// Transform the result side.
    pub fn map<U, F: FnOnce(R) -> U>(self, f: F) -> Either<E, U> {
        match self {
            Self::Failure(error) => Either::Failure(error),
            Self::Success(result) => Either::Success(f(result)),
        }
    }

    /// Transform the error side.
    pub fn map_err<G, F: FnOnce(E) -> G>(self, f: F) -> Either<G, R> {
        match self {
            Self::Failure(error) => Either::Failure(f(error)),
            Self::Success(result) => Either::Success(result),
        }
    }
}

impl<E, R> From<Result<R, E>> for Either<E, R> {
    fn from(result: Result<R, E>) -> Self {
        match result {
            Ok(result) => Self::Success(result),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<E, R> From<Either<E, R>> for Result<R, E> {
    fn from(either: Either<E, R>) -> Self {
        either.into_result()
    }
}

/// Always carries a result, and may also carry an error.
///
/// Useful for partial success, e.g. a batch where some items failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefiniteEither<E, R> {
    /// Error that happened along the way, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<E>,
    /// The result.
    pub result: R,
}

impl<E, R> DefiniteEither<E, R> {
    /// A clean result.
    #[inline]
    pub const fn ok(result: R) -> Self {
        Self {
            error: None,
            result,
        }
    }

    /// A result accompanied by an error.
    #[inline]
    pub const fn with_error(result: R, error: E) -> Self {
        Self {
            error: Some(error),
            result,
        }
    }

    /// Whether an error was recorded.
    #[inline]
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exactly_one_side() {
        let ok: Either<&str, u32> = success(3);
        let err: Either<&str, u32> = failure("nope");

        assert!(ok.is_success() && !ok.is_failure());
        assert!(err.is_failure() && !err.is_success());
        assert_eq!(ok.result(), Some(&3));
        assert_eq!(ok.error(), None);
        assert_eq!(err.error(), Some(&"nope"));
        assert_eq!(err.result(), None);
    }

    #[test]
    fn falsy_results_are_still_success() {
        // Zero, empty and null are values, not the absence of one.
        assert!(is_success(&success::<(), _>(0)));
        assert!(is_success(&success::<(), _>("")));
        assert!(is_success(&success::<(), _>(serde_json::Value::Null)));
        assert!(is_failure(&failure::<_, ()>(false)));
    }

    #[test]
    fn wire_shape() {
        let ok: Either<String, u32> = success(1);
        let err: Either<String, u32> = failure("bad".into());
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "result": 1 }));
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({ "error": "bad" }));

        let parsed: Either<String, u32> = serde_json::from_value(json!({ "error": "x" })).unwrap();
        assert_eq!(parsed, failure("x".to_owned()));
    }

    #[test]
    fn converts_with_result() {
        let either: Either<String, u8> = Ok::<u8, String>(4).into();
        assert_eq!(either, success(4));
        let back: Result<u8, String> = failure::<String, u8>("e".into()).into();
        assert_eq!(back, Err("e".to_owned()));
    }

    #[test]
    fn maps_one_side() {
        let doubled = success::<String, u32>(2).map(|n| n * 2);
        assert_eq!(doubled, success(4));
        let untouched = failure::<String, u32>("e".into()).map(|n| n * 2);
        assert_eq!(untouched, failure("e".to_owned()));
        assert_eq!(failure::<u8, ()>(1).map_err(u16::from), failure(1u16));
    }

    #[test]
    fn definite_either_always_has_result() {
        let clean: DefiniteEither<String, Vec<u8>> = DefiniteEither::ok(vec![1]);
        assert!(!clean.has_error());
        assert_eq!(serde_json::to_value(&clean).unwrap(), json!({ "result": [1] }));

        let partial = DefiniteEither::with_error(vec![1], "item 2 failed".to_owned());
        assert!(partial.has_error());
        let parsed: DefiniteEither<String, Vec<u8>> =
            serde_json::from_value(json!({ "result": [1] })).unwrap();
        assert_eq!(parsed, clean);
        assert_eq!(partial.result, vec![1]);
    }
}
