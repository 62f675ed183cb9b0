//! Host conversions - host literals into fresh runtime objects

use pyobj_runtime::api;

use super::handle::Handle;
use crate::infrastructure::diagnostics;

impl From<bool> for Handle {
    fn from(value: bool) -> Self {
        Handle::from_result("convert", api::new_bool(value))
    }
}

impl From<i64> for Handle {
    fn from(value: i64) -> Self {
        Handle::from_result("convert", api::new_int(value))
    }
}

impl From<i32> for Handle {
    fn from(value: i32) -> Self {
        Handle::from(i64::from(value))
    }
}

impl From<u32> for Handle {
    fn from(value: u32) -> Self {
        Handle::from(i64::from(value))
    }
}

impl From<usize> for Handle {
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(value) => Handle::from(value),
            Err(_) => {
                diagnostics::report("convert", format!("{} does not fit a runtime int", value));
                Handle::empty()
            }
        }
    }
}

impl From<f64> for Handle {
    fn from(value: f64) -> Self {
        Handle::from_result("convert", api::new_float(value))
    }
}

impl From<f32> for Handle {
    fn from(value: f32) -> Self {
        Handle::from(f64::from(value))
    }
}

impl From<&str> for Handle {
    fn from(value: &str) -> Self {
        Handle::from_result("convert", api::new_str(value))
    }
}

impl From<String> for Handle {
    fn from(value: String) -> Self {
        Handle::from(value.as_str())
    }
}

impl From<&String> for Handle {
    fn from(value: &String) -> Self {
        Handle::from(value.as_str())
    }
}

/// Shares the object (refcount +1)
impl From<&Handle> for Handle {
    fn from(value: &Handle) -> Self {
        value.clone()
    }
}

/// `None` becomes the runtime's `None`
impl<T: Into<Handle>> From<Option<T>> for Handle {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Handle::none(),
        }
    }
}
