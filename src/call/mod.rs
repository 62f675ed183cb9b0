//! Call marshaling - invoke runtime callables with host arguments
//!
//! Positional arguments are packed into a runtime tuple in order, keyword
//! arguments into a runtime dict, and the pair is handed to the runtime's
//! call protocol. A handle that is empty or not callable is reported and no
//! call is made. A failing call yields an empty handle.

pub mod args;

pub use args::{Arg, Kwargs};

use pyobj_runtime::api;
use tracing::trace;

use crate::core::Handle;
use crate::infrastructure::diagnostics;
use crate::views::{Dict, List, Tuple, View};

/// Call `callable(*args, **kwargs)`
pub fn call(callable: &Handle, args: &[Arg], kwargs: Option<&Kwargs>) -> Handle {
    if callable.is_null() {
        diagnostics::report("call", "cannot call an empty handle");
        return Handle::empty();
    }
    if !callable.is_callable() {
        diagnostics::report(
            "call",
            format!("'{}' object is not callable", crate::present::type_name(callable)),
        );
        return Handle::empty();
    }

    let positional = Tuple::from_handles(args.iter().map(Arg::to_handle).collect());
    let keywords = kwargs.map(pack_kwargs);
    trace!(
        positional = args.len(),
        keywords = kwargs.map_or(0, Kwargs::len),
        "marshaled call"
    );

    callable.produce("call", |raw| {
        let positional = positional.require()?;
        let keywords = match &keywords {
            Some(dict) => Some(dict.require()?),
            None => None,
        };
        api::call_object(raw, positional, keywords)
    })
}

fn pack_kwargs(kwargs: &Kwargs) -> Handle {
    let dict = Dict::new();
    for (name, value) in kwargs.iter() {
        dict.add(name, value.to_handle());
    }
    dict.into_handle()
}

impl Handle {
    /// Call this object with marshaled arguments
    pub fn call(&self, args: &[Arg], kwargs: Option<&Kwargs>) -> Handle {
        call(self, args, kwargs)
    }

    /// Look up method `name` and call it
    pub fn call_method(&self, name: &str, args: &[Arg], kwargs: Option<&Kwargs>) -> Handle {
        if self.is_null() {
            return Handle::empty();
        }
        let method = self.getattr(name);
        if method.is_null() {
            return Handle::empty();
        }
        call(&method, args, kwargs)
    }
}

/// Every element is truthy (vacuously true for an empty list)
pub fn all(items: &List) -> bool {
    items.iter().all(|item| item.is_truthy())
}

/// Some element is truthy
pub fn any(items: &List) -> bool {
    items.iter().any(|item| item.is_truthy())
}

/// Apply `func` to each element, keeping the results of calls that succeed
pub fn map(func: &Handle, items: &List) -> List {
    items
        .iter()
        .map(|item| call(func, &[Arg::Object(item)], None))
        .filter(|result| !result.is_null())
        .collect()
}

/// A builtin function or type by name (`len`, `sorted`, `int`, ...)
pub fn builtin(name: &str) -> Handle {
    Handle::from_result("builtin", api::builtin(name))
}

#[cfg(test)]
mod tests;
