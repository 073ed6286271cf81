//! Cross-context type identity for error values.
//!
//! Identity checks based on `TypeId` or on the address of a type descriptor
//! stop working as soon as the code that builds an error and the code that
//! inspects it were compiled or loaded separately: two plugins that each
//! declare `InternalError` end up with two distinct descriptors, and an error
//! that crossed a serialization boundary has no descriptor at all.
//!
//! This module replaces those checks with **interned tags**:
//!
//! - Every error type is described by an [`ErrorType`] (a name plus a parent link).
//! - At construction, the ancestor chain is walked and one path string is built
//!   per prefix, e.g. `BaseError`, `BaseError.PublicError`,
//!   `BaseError.PublicError.EntityGoneError`.
//! - Each path is interned in a process-wide table ([`intern_tag`]) and the
//!   resulting [`ErrorTag`] is stored on the instance.
//! - [`has_type`] recomputes the candidate's full path and checks for its tag.
//!
//! Two descriptors declared in different places with the same names produce
//! the same paths, therefore the same tags.
//!
//! # Chain rules
//!
//! - The universal root (`Error`) and everything above it is never part of a path.
//! - The walk starts at the leaf and stops at the first anonymous link (empty
//!   name). That link and every ancestor above it are dropped, so a named type
//!   declared below an anonymous one loses its ancestry: it matches itself but
//!   not the families above the anonymous link. An anonymous leaf carries no
//!   tags at all and matches nothing, not even `BaseError`. This is an
//!   accepted limitation.
//!
//! # Registry lifetime
//!
//! The tag table is lazily populated and never cleared. It grows with the
//! number of distinct ancestor chains in the program, not with the number of
//! error instances. Interning an already known path only takes the shared lock.

use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Delimiter joining ancestor names into a tag path.
pub const PATH_DELIMITER: &str = ".";

/// Name of the universal root type, excluded from every path.
pub const UNIVERSAL_ROOT_NAME: &str = "Error";

// ============================================================================
// Interned Tags
// ============================================================================

/// Interned identifier of one ancestor path.
///
/// Tags are cheap to copy and compare. Equal paths always yield equal tags,
/// no matter which module interned them first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorTag {
    id: u32,
    path: &'static str,
}

impl ErrorTag {
    /// Registry slot of this tag.
    #[inline]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// The dot-joined ancestor path this tag was interned for.
    #[inline]
    pub const fn path(self) -> &'static str {
        self.path
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

type TagTable = HashMap<&'static str, ErrorTag>;

fn registry() -> &'static RwLock<TagTable> {
    static REGISTRY: OnceLock<RwLock<TagTable>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

#[inline]
fn read_registry() -> RwLockReadGuard<'static, TagTable> {
    registry().read().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn write_registry() -> RwLockWriteGuard<'static, TagTable> {
    registry().write().unwrap_or_else(PoisonError::into_inner)
}

/// Return the process-wide tag for `path`, creating it on first use.
///
/// Re-interning a known path is a no-op that returns the existing tag.
pub fn intern_tag(path: &str) -> ErrorTag {
    if let Some(tag) = lookup_tag(path) {
        return tag;
    }

    let mut table = write_registry();
    // Another thread may have won the race between the two locks.
    if let Some(tag) = table.get(path) {
        return *tag;
    }

    let path: &'static str = Box::leak(path.to_owned().into_boxed_str());
    let tag = ErrorTag {
        id: table.len() as u32,
        path,
    };
    table.insert(path, tag);
    tag
}

/// Look up an already interned tag without creating it.
pub fn lookup_tag(path: &str) -> Option<ErrorTag> {
    read_registry().get(path).copied()
}

// ============================================================================
// Type Descriptors
// ============================================================================

/// Descriptor of a logical error type: a name and an optional parent.
///
/// Descriptors are plain data and are normally declared as `static`s:
///
/// ```rust
/// use tagged_errors::{ErrorType, BASE_ERROR};
///
/// static FEATURE_ERROR: ErrorType = ErrorType::child("FeatureError", &BASE_ERROR);
///
/// assert_eq!(FEATURE_ERROR.path(), "BaseError.FeatureError");
/// ```
#[derive(Debug)]
pub struct ErrorType {
    name: &'static str,
    parent: Option<&'static ErrorType>,
}

impl ErrorType {
    /// A type with no parent.
    #[inline]
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A named subtype of `parent`.
    #[inline]
    pub const fn child(name: &'static str, parent: &'static ErrorType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// An unnamed subtype of `parent`.
    ///
    /// Chains passing through it lose this link and everything above it.
    /// Instances of the anonymous type itself carry no tags.
    #[inline]
    pub const fn anonymous(parent: &'static ErrorType) -> Self {
        Self {
            name: "",
            parent: Some(parent),
        }
    }

    /// Name of this type, empty for anonymous types.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Parent descriptor, if any.
    #[inline]
    pub const fn parent(&self) -> Option<&'static ErrorType> {
        self.parent
    }

    /// Ancestor names ordered root-most first, ending with this type.
    ///
    /// The walk stops at the first anonymous link, and the universal root
    /// together with everything above it is removed.
    pub fn ancestor_names(&self) -> SmallVec<[&'static str; 4]> {
        let mut names: SmallVec<[&'static str; 4]> = SmallVec::new();
        let mut current = Some(self);

        while let Some(ty) = current {
            if ty.name.is_empty() {
                break;
            }
            names.push(ty.name);
            current = ty.parent;
        }

        names.reverse();

        if let Some(root_idx) = names.iter().position(|name| *name == UNIVERSAL_ROOT_NAME) {
            names.drain(..=root_idx);
        }

        names
    }

    /// One path per prefix of [`ancestor_names`](Self::ancestor_names).
    pub fn ancestor_paths(&self) -> SmallVec<[String; 4]> {
        let mut paths: SmallVec<[String; 4]> = SmallVec::new();
        for name in self.ancestor_names() {
            let path = match paths.last() {
                Some(prev) => format!("{prev}{PATH_DELIMITER}{name}"),
                None => name.to_owned(),
            };
            paths.push(path);
        }
        paths
    }

    /// Full ancestor path of this type, empty when nothing survives truncation.
    pub fn path(&self) -> String {
        self.ancestor_names().join(PATH_DELIMITER)
    }

    /// Tag identifying this type, or `None` when its path is empty.
    pub fn tag(&self) -> Option<ErrorTag> {
        let path = self.path();
        if path.is_empty() {
            None
        } else {
            Some(intern_tag(&path))
        }
    }

    /// Tags for every prefix path, as attached to instances of this type.
    pub fn tag_chain(&self) -> SmallVec<[ErrorTag; 4]> {
        self.ancestor_paths()
            .iter()
            .map(|path| intern_tag(path))
            .collect()
    }
}

// ============================================================================
// Structural Error Shape
// ============================================================================

/// Structural shape shared by every error this crate knows how to identify.
///
/// Anything implementing this trait "looks like an error": it is an
/// [`std::error::Error`] with a name, a message, a code and its tags.
/// Code that only depends on this trait never needs the concrete types.
pub trait TypeTagged: Error {
    /// Name of the most-derived type the value was built as.
    fn error_name(&self) -> &str;

    /// Human-readable message.
    fn message(&self) -> &str;

    /// Machine-readable error code.
    fn error_code(&self) -> &str;

    /// Identity tags attached at construction. Empty for rebuilt values.
    fn tags(&self) -> &[ErrorTag];

    /// Free-form details, if any.
    fn details(&self) -> Option<&serde_json::Value> {
        None
    }

    /// Protocol status carried by the error, if any.
    fn http_status_code(&self) -> Option<u16> {
        None
    }

    /// Whether the error may be shown to an external caller.
    fn is_public(&self) -> bool {
        false
    }

    /// `{code, message}` view used by libraries that only know that shape.
    fn standardized(&self) -> StandardizedError<'_> {
        StandardizedError {
            code: self.error_code(),
            message: self.message(),
        }
    }
}

/// Minimal `{code, message}` error shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandardizedError<'a> {
    /// Error code.
    pub code: &'a str,
    /// Error message.
    pub message: &'a str,
}

/// Structural check: a value looks like an error when it carries a name.
#[inline]
pub fn looks_like_error(value: &dyn TypeTagged) -> bool {
    !value.error_name().is_empty()
}

/// Check whether `value` is of logical type `candidate` (or a subtype of it).
///
/// Works across separately declared descriptors because only the interned
/// tag of the candidate's full path is compared.
pub fn has_type(value: &dyn TypeTagged, candidate: &ErrorType) -> bool {
    if !looks_like_error(value) {
        return false;
    }

    match candidate.tag() {
        Some(tag) => value.tags().contains(&tag),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ROOT: ErrorType = ErrorType::root(UNIVERSAL_ROOT_NAME);
    static BASE: ErrorType = ErrorType::child("IdentityBase", &ROOT);
    static FEATURE: ErrorType = ErrorType::child("FeatureError", &BASE);
    static NESTED: ErrorType = ErrorType::child("NestedError", &FEATURE);
    static HIDDEN: ErrorType = ErrorType::anonymous(&FEATURE);
    static BELOW_HIDDEN: ErrorType = ErrorType::child("BelowHidden", &HIDDEN);

    #[test]
    fn interning_same_path_yields_same_tag() {
        let a = intern_tag("IdentityBase.Interned");
        let b = intern_tag(&String::from("IdentityBase.Interned"));
        assert_eq!(a, b);
        assert_eq!(a.path(), "IdentityBase.Interned");
        assert_eq!(lookup_tag("IdentityBase.Interned"), Some(a));
    }

    #[test]
    fn different_paths_yield_different_tags() {
        assert_ne!(intern_tag("IdentityBase.Left"), intern_tag("IdentityBase.Right"));
    }

    #[test]
    fn lookup_does_not_create() {
        assert_eq!(lookup_tag("IdentityBase.NeverInterned.Anywhere"), None);
    }

    #[test]
    fn universal_root_is_excluded() {
        assert_eq!(NESTED.ancestor_names().as_slice(), ["IdentityBase", "FeatureError", "NestedError"]);
        assert_eq!(NESTED.path(), "IdentityBase.FeatureError.NestedError");
    }

    #[test]
    fn paths_cover_every_prefix() {
        let paths = NESTED.ancestor_paths();
        assert_eq!(
            paths.as_slice(),
            [
                "IdentityBase".to_owned(),
                "IdentityBase.FeatureError".to_owned(),
                "IdentityBase.FeatureError.NestedError".to_owned(),
            ]
        );
        assert_eq!(NESTED.tag_chain().len(), 3);
        assert_eq!(NESTED.tag_chain()[0], BASE.tag().unwrap());
    }

    #[test]
    fn anonymous_link_truncates_chain() {
        // The anonymous link and its ancestors are cut; the named leaf survives.
        assert!(BELOW_HIDDEN.ancestor_names().as_slice() == ["BelowHidden"]);
        assert_eq!(BELOW_HIDDEN.path(), "BelowHidden");
        assert!(HIDDEN.ancestor_names().is_empty());
        assert_eq!(HIDDEN.tag(), None);
        assert!(HIDDEN.tag_chain().is_empty());
    }

    #[test]
    fn separately_declared_descriptors_share_tags() {
        mod other_module {
            use super::super::ErrorType;
            pub static ROOT: ErrorType = ErrorType::root("Error");
            pub static BASE: ErrorType = ErrorType::child("IdentityBase", &ROOT);
            pub static FEATURE: ErrorType = ErrorType::child("FeatureError", &BASE);
        }

        assert!(!std::ptr::eq(&FEATURE, &other_module::FEATURE));
        assert_eq!(FEATURE.tag(), other_module::FEATURE.tag());
    }
}
