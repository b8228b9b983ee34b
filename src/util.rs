//! Miscellaneous utilities shared by the runtime modules.

use std::any::{self, TypeId};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A [`TypeId`] that also remembers the type name for diagnostics.
#[derive(Clone, Copy)]
pub struct DbgTypeId {
    /// The underlying type ID.
    pub id:   TypeId,
    /// The type name as reported by [`any::type_name`].
    pub name: &'static str,
}

impl DbgTypeId {
    /// Creates a new [`DbgTypeId`] from the type.
    pub fn of<T: 'static>() -> Self { Self { id: TypeId::of::<T>(), name: any::type_name::<T>() } }
}

impl fmt::Debug for DbgTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name) }
}

impl fmt::Display for DbgTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name) }
}

impl PartialEq for DbgTypeId {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for DbgTypeId {}

impl Hash for DbgTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) { self.id.hash(state); }
}

impl Borrow<TypeId> for DbgTypeId {
    fn borrow(&self) -> &TypeId { &self.id }
}

/// Checks a runtime invariant.
///
/// Whether a violation panics or is only logged
/// depends on the `debug-checks` and `release-checks` features.
macro_rules! invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::util::invariant_violated(format_args!($($arg)+));
        }
    };
}
pub(crate) use invariant;

cfg_if::cfg_if! {
    if #[cfg(any(
        all(debug_assertions, feature = "debug-checks"),
        all(not(debug_assertions), feature = "release-checks"),
    ))] {
        /// Whether violated invariants panic in this build.
        pub const CHECKS_ENABLED: bool = true;

        #[cold]
        #[track_caller]
        pub(crate) fn invariant_violated(message: fmt::Arguments<'_>) {
            panic!("{message}");
        }
    } else {
        /// Whether violated invariants panic in this build.
        pub const CHECKS_ENABLED: bool = false;

        #[cold]
        pub(crate) fn invariant_violated(message: fmt::Arguments<'_>) {
            log::error!("Invariant violated: {message}");
        }
    }
}
