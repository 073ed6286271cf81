//! Declarative macros for defining and raising errors.
//!
//! # Usage
//!
//! ```rust
//! use tagged_errors::{AppErrorOptions, define_errors, internal_error, public_error};
//!
//! define_errors! {
//!     NotFound, public => {
//!         USER_NOT_FOUND => USER_NOT_FOUND_ERROR,
//!         ORDER_NOT_FOUND => ORDER_NOT_FOUND_ERROR,
//!     }
//! }
//!
//! let err = USER_NOT_FOUND_ERROR.new(AppErrorOptions::new("no such user"));
//! assert_eq!(err.code(), "USER_NOT_FOUND");
//! assert_eq!(err.status_code(), 404);
//!
//! let shard = 3;
//! let internal = internal_error!("SHARD_DOWN", "shard {} unreachable", shard);
//! assert_eq!(internal.message(), "shard 3 unreachable");
//!
//! let public = public_error!(409, "NAME_TAKEN", "name already taken");
//! assert_eq!(public.http_status_code(), 409);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __visibility_flag {
    (public) => {
        true
    };
    (internal) => {
        false
    };
}

/// Define one error and its class.
///
/// The code is the stringified definition name.
///
/// ```rust
/// # use tagged_errors::define_error_kind;
/// define_error_kind!(PAYMENT_DECLINED => PAYMENT_DECLINED_ERROR, BadRequest, public);
/// assert_eq!(PAYMENT_DECLINED.code(), "PAYMENT_DECLINED");
/// ```
#[macro_export]
macro_rules! define_error_kind {
    ($definition:ident => $class:ident, $category:ident, $visibility:ident $(, $schema:expr)?) => {
        pub static $definition: $crate::ErrorDefinition = $crate::define_error(
            $crate::ErrorDefinition::const_new(
                stringify!($definition),
                $crate::ErrorCategory::$category,
                $crate::__visibility_flag!($visibility),
            )
            $(.with_details_schema($schema))?,
        );
        pub static $class: $crate::ErrorClass = $crate::create_error_class(&$definition);
    };
}

/// Define several errors sharing a category and visibility.
///
/// Visibility is `public` or `internal`. An entry may name a details schema
/// with `with <expr>`.
///
/// ```rust
/// # use tagged_errors::{define_errors, SerdeSchema};
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct Limits { limit: u32 }
/// static LIMITS: SerdeSchema<Limits> = SerdeSchema::new();
///
/// define_errors! {
///     RateLimit, public => {
///         TOO_MANY_REQUESTS => TOO_MANY_REQUESTS_ERROR with &LIMITS,
///     }
/// }
/// assert!(TOO_MANY_REQUESTS.details_schema().is_some());
/// ```
#[macro_export]
macro_rules! define_errors {
    ($category:ident, $visibility:ident => {
        $( $definition:ident => $class:ident $(with $schema:expr)? ),+ $(,)?
    }) => {
        $(
            $crate::define_error_kind!($definition => $class, $category, $visibility $(, $schema)?);
        )+
    };
}

/// Build an [`InternalError`](crate::InternalError) from a code and a format string.
#[macro_export]
macro_rules! internal_error {
    ($code:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::InternalError::new($crate::InternalErrorParams::new(
            format!($fmt $(, $arg)*),
            $code,
        ))
    };
}

/// Build a [`PublicError`](crate::PublicError) from a status, a code and a format string.
#[macro_export]
macro_rules! public_error {
    ($status:expr, $code:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::PublicError::new(
            $crate::PublicErrorParams::new(format!($fmt $(, $arg)*), $code)
                .http_status_code($status),
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::{AppErrorOptions, is_internal_error, is_public_error};

    define_errors! {
        Conflict, internal => {
            VERSION_MISMATCH => VERSION_MISMATCH_ERROR,
            LOCK_HELD => LOCK_HELD_ERROR,
        }
    }

    #[test]
    fn define_errors_declares_definitions_and_classes() {
        assert_eq!(VERSION_MISMATCH.code(), "VERSION_MISMATCH");
        assert!(!VERSION_MISMATCH.is_public());
        assert_eq!(LOCK_HELD.status_code(), 409);

        let err = LOCK_HELD_ERROR.new(AppErrorOptions::new("held"));
        assert!(LOCK_HELD_ERROR.is_instance(&err));
        assert!(!VERSION_MISMATCH_ERROR.is_instance(&err));
    }

    #[test]
    fn raise_macros_pick_the_family() {
        let internal = internal_error!("X", "value {} too large", 7);
        assert!(is_internal_error(&internal));
        assert_eq!(internal.message(), "value 7 too large");

        let public = public_error!(422, "Y", "bad input");
        assert!(is_public_error(&public));
        assert_eq!(public.http_status_code(), 422);
        assert_eq!(public.error_code(), "Y");
    }
}
