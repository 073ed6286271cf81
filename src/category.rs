//! Error categories and their fixed protocol status codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse classification of an application error.
///
/// Every category maps to exactly one status code, see [`status_code`](Self::status_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Malformed or invalid input.
    BadRequest,
    /// Missing or invalid credentials.
    Unauthenticated,
    /// Authenticated, but not allowed.
    PermissionDenied,
    /// Target does not exist.
    NotFound,
    /// Conflicts with current state.
    Conflict,
    /// Too many requests.
    RateLimit,
    /// Unexpected server-side failure.
    Internal,
    /// Dependency or service temporarily down.
    Unavailable,
}

impl ErrorCategory {
    /// Every category, in table order.
    pub const ALL: [ErrorCategory; 8] = [
        Self::BadRequest,
        Self::Unauthenticated,
        Self::PermissionDenied,
        Self::NotFound,
        Self::Conflict,
        Self::RateLimit,
        Self::Internal,
        Self::Unavailable,
    ];

    /// Protocol status for this category.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthenticated => 401,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::RateLimit => 429,
            Self::Internal => 500,
            Self::Unavailable => 503,
        }
    }

    /// Wire token, e.g. `PERMISSION_DENIED`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimit => "RATE_LIMIT",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown category token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryParseError {
    input: String,
}

impl CategoryParseError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error category '{}'", self.input)
    }
}

impl std::error::Error for CategoryParseError {}

impl FromStr for ErrorCategory {
    type Err = CategoryParseError;

    /// Accepts wire tokens and their kebab-case spelling (`rate-limit`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| CategoryParseError { input: s.to_owned() })
    }
}
