//! Typed views - a handle interpreted under one runtime type
//!
//! Design:
//! 1. A view is a `Handle` and nothing else; every operation asks the runtime
//! 2. Construction from an arbitrary handle checks the kind once, through
//!    `Kind::of`; a mismatch yields an empty instance of the view's own kind
//! 3. Out-of-range indices and absent keys produce empty results, not errors
//! 4. Element access returns new counted references

use crate::core::{Handle, Kind};

/// Shared surface of the typed views
pub trait View: Sized {
    const KIND: Kind;

    /// Fresh empty instance
    fn new() -> Self;

    /// View `handle` if it holds an object of `KIND`, else a fresh empty view
    fn from_handle(handle: Handle) -> Self;

    fn handle(&self) -> &Handle;

    fn into_handle(self) -> Handle;
}

/// Resolve a possibly negative index against `len`
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

/// Wire a view type to `Handle`: the `View` trait, `Deref`, conversions,
/// comparison and formatting
macro_rules! impl_view {
    ($view:ident, $kind:expr) => {
        impl $crate::views::View for $view {
            const KIND: $crate::core::Kind = $kind;

            fn new() -> Self {
                $view::new()
            }

            fn from_handle(handle: $crate::core::Handle) -> Self {
                if $crate::core::Kind::of(&handle) == $kind {
                    Self { handle }
                } else {
                    $view::new()
                }
            }

            fn handle(&self) -> &$crate::core::Handle {
                &self.handle
            }

            fn into_handle(self) -> $crate::core::Handle {
                self.handle
            }
        }

        impl Default for $view {
            fn default() -> Self {
                $view::new()
            }
        }

        impl std::ops::Deref for $view {
            type Target = $crate::core::Handle;

            fn deref(&self) -> &Self::Target {
                &self.handle
            }
        }

        impl From<$view> for $crate::core::Handle {
            fn from(view: $view) -> Self {
                view.handle
            }
        }

        impl From<&$view> for $crate::core::Handle {
            fn from(view: &$view) -> Self {
                view.handle.clone()
            }
        }

        impl From<$crate::core::Handle> for $view {
            fn from(handle: $crate::core::Handle) -> Self {
                <$view as $crate::views::View>::from_handle(handle)
            }
        }

        impl std::fmt::Debug for $view {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($view), self.handle.repr())
            }
        }

        impl std::fmt::Display for $view {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.handle, f)
            }
        }

        impl PartialEq for $view {
            fn eq(&self, other: &Self) -> bool {
                self.handle == other.handle
            }
        }

        impl PartialOrd for $view {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                self.handle.partial_cmp(&other.handle)
            }

            fn lt(&self, other: &Self) -> bool {
                self.handle < other.handle
            }

            fn le(&self, other: &Self) -> bool {
                self.handle <= other.handle
            }

            fn gt(&self, other: &Self) -> bool {
                self.handle > other.handle
            }

            fn ge(&self, other: &Self) -> bool {
                self.handle >= other.handle
            }
        }
    };
}

// Declared after `impl_view!` so the macro is in textual scope
pub mod dict;
pub mod list;
pub mod set;
pub mod text;
pub mod tuple;

pub use dict::Dict;
pub use list::List;
pub use set::Set;
pub use text::Text;
pub use tuple::Tuple;

#[cfg(test)]
mod tests;
