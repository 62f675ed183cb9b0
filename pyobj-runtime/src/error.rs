//! Runtime exceptions
//!
//! Failures are reported as values that mirror the exception classes a
//! program running inside the runtime would observe.

use std::fmt;

/// Exception class of a runtime failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcKind {
    Exception,
    TypeError,
    ValueError,
    KeyError,
    IndexError,
    NameError,
    AttributeError,
    ZeroDivisionError,
    OverflowError,
    SyntaxError,
    RecursionError,
    NotImplementedError,
    ImportError,
    AssertionError,
    OSError,
    JSONDecodeError,
    RuntimeError,
    /// Misuse of the runtime itself: not initialized, stale or freed reference.
    SystemError,
}

impl ExcKind {
    /// Exception classes that programs can name and raise.
    pub const RAISABLE: [ExcKind; 16] = [
        ExcKind::Exception,
        ExcKind::TypeError,
        ExcKind::ValueError,
        ExcKind::KeyError,
        ExcKind::IndexError,
        ExcKind::NameError,
        ExcKind::AttributeError,
        ExcKind::ZeroDivisionError,
        ExcKind::OverflowError,
        ExcKind::RecursionError,
        ExcKind::NotImplementedError,
        ExcKind::ImportError,
        ExcKind::AssertionError,
        ExcKind::OSError,
        ExcKind::RuntimeError,
        ExcKind::SystemError,
    ];

    /// Whether an `except base` clause catches this kind
    pub fn is_subclass_of(self, base: ExcKind) -> bool {
        if self == base || base == ExcKind::Exception {
            return true;
        }
        matches!(
            (self, base),
            (ExcKind::JSONDecodeError, ExcKind::ValueError)
                | (ExcKind::RecursionError, ExcKind::RuntimeError)
                | (ExcKind::NotImplementedError, ExcKind::RuntimeError)
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Exception => "Exception",
            Self::TypeError => "TypeError",
            Self::ValueError => "ValueError",
            Self::KeyError => "KeyError",
            Self::IndexError => "IndexError",
            Self::NameError => "NameError",
            Self::AttributeError => "AttributeError",
            Self::ZeroDivisionError => "ZeroDivisionError",
            Self::OverflowError => "OverflowError",
            Self::SyntaxError => "SyntaxError",
            Self::RecursionError => "RecursionError",
            Self::NotImplementedError => "NotImplementedError",
            Self::ImportError => "ImportError",
            Self::AssertionError => "AssertionError",
            Self::OSError => "OSError",
            Self::JSONDecodeError => "JSONDecodeError",
            Self::RuntimeError => "RuntimeError",
            Self::SystemError => "SystemError",
        }
    }
}

impl fmt::Display for ExcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure raised inside the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    kind: ExcKind,
    message: String,
}

pub type RtResult<T> = Result<T, RuntimeError>;

impl RuntimeError {
    pub fn new(kind: ExcKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ExcKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::TypeError, message)
    }

    pub(crate) fn value_error(message: impl Into<String>) -> Self {
        Self::new(ExcKind::ValueError, message)
    }

    pub(crate) fn not_initialized() -> Self {
        Self::new(ExcKind::SystemError, "runtime is not initialized")
    }

    pub(crate) fn stale_reference(index: u32) -> Self {
        Self::new(
            ExcKind::SystemError,
            format!("object reference #{} is stale or has been freed", index),
        )
    }

    pub(crate) fn unsupported(what: &str) -> Self {
        Self::new(ExcKind::NotImplementedError, format!("unsupported {}", what))
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = RuntimeError::new(ExcKind::KeyError, "'missing'");
        assert_eq!(err.to_string(), "KeyError: 'missing'");

        let bare = RuntimeError::new(ExcKind::ValueError, "");
        assert_eq!(bare.to_string(), "ValueError");
    }

    #[test]
    fn test_subclass_matching() {
        assert!(ExcKind::KeyError.is_subclass_of(ExcKind::Exception));
        assert!(ExcKind::JSONDecodeError.is_subclass_of(ExcKind::ValueError));
        assert!(!ExcKind::ValueError.is_subclass_of(ExcKind::TypeError));
    }

    #[test]
    fn test_system_errors() {
        assert_eq!(RuntimeError::not_initialized().kind(), ExcKind::SystemError);
        assert_eq!(RuntimeError::stale_reference(3).kind(), ExcKind::SystemError);
    }
}
