//! Built-in methods - attribute lookup and method dispatch per type
//!
//! Design: each receiver type has a focused module with a name table and a
//! dispatcher. `getattr` binds a receiver to a method name; calling the
//! bound method lands back in `call_method`.
//!
//! - `string.rs` - `str` methods
//! - `list.rs` - `list` methods and the fallible stable sort
//! - `tuple.rs` - `tuple` methods
//! - `dict.rs` - `dict` methods
//! - `set.rs` - `set` methods

mod dict;
mod list;
mod set;
mod string;
mod tuple;

#[cfg(test)]
mod tests;

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::{BoundMethod, Object, ObjectType};

const FILE_METHODS: &[&str] = &["read", "write", "close"];

/// Positional and keyword arguments of one call, borrowed
#[derive(Clone, Copy)]
pub(crate) struct CallArgs<'a> {
    name: &'a str,
    positional: &'a [ObjRef],
    keywords: &'a [(String, ObjRef)],
}

impl<'a> CallArgs<'a> {
    pub fn new(name: &'a str, positional: &'a [ObjRef], keywords: &'a [(String, ObjRef)]) -> Self {
        Self {
            name,
            positional,
            keywords,
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn positional(&self) -> &'a [ObjRef] {
        self.positional
    }

    pub fn keywords(&self) -> &'a [(String, ObjRef)] {
        self.keywords
    }

    pub fn get(&self, index: usize) -> Option<ObjRef> {
        self.positional.get(index).copied()
    }

    pub fn required(&self, index: usize) -> RtResult<ObjRef> {
        self.get(index).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "{}() missing required argument {}",
                self.name,
                index + 1
            ))
        })
    }

    pub fn keyword(&self, name: &str) -> Option<ObjRef> {
        self.keywords
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    /// Reject keywords other than `allowed`
    pub fn keywords_only(&self, allowed: &[&str]) -> RtResult<()> {
        match self.keywords.iter().find(|(key, _)| !allowed.contains(&key.as_str())) {
            Some((key, _)) if allowed.is_empty() => Err(RuntimeError::type_error(format!(
                "{}() takes no keyword arguments (got '{}')",
                self.name, key
            ))),
            Some((key, _)) => Err(RuntimeError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                self.name, key
            ))),
            None => Ok(()),
        }
    }

    /// Check the positional count is within `min..=max`
    pub fn arity(&self, min: usize, max: usize) -> RtResult<()> {
        let given = self.positional.len();
        if given >= min && given <= max {
            return Ok(());
        }
        let expected = if min == max {
            format!("exactly {}", min)
        } else if given < min {
            format!("at least {}", min)
        } else {
            format!("at most {}", max)
        };
        Err(RuntimeError::type_error(format!(
            "{}() takes {} argument{} ({} given)",
            self.name,
            expected,
            if min == max && min == 1 { "" } else { "s" },
            given
        )))
    }

    /// Positional-only call with no keywords
    pub fn simple(&self, min: usize, max: usize) -> RtResult<()> {
        self.keywords_only(&[])?;
        self.arity(min, max)
    }
}

fn method_names(kind: ObjectType) -> &'static [&'static str] {
    match kind {
        ObjectType::Str => string::METHODS,
        ObjectType::List => list::METHODS,
        ObjectType::Tuple => tuple::METHODS,
        ObjectType::Dict => dict::METHODS,
        ObjectType::Set => set::METHODS,
        ObjectType::File => FILE_METHODS,
        _ => &[],
    }
}

fn no_attribute(kind: ObjectType, name: &str) -> RuntimeError {
    RuntimeError::new(
        ExcKind::AttributeError,
        format!("'{}' object has no attribute '{}'", kind.name(), name),
    )
}

impl Interpreter {
    pub fn has_method(&self, receiver: ObjRef, name: &str) -> RtResult<bool> {
        let kind = self.get(receiver)?.object_type();
        Ok(method_names(kind).contains(&name))
    }

    /// `receiver.name`: a bound method or a data attribute
    pub fn getattr(&mut self, receiver: ObjRef, name: &str) -> RtResult<ObjRef> {
        let object = self.get(receiver)?;
        let kind = object.object_type();
        if method_names(kind).contains(&name) {
            return self.adopt(Object::Method(BoundMethod {
                receiver,
                name: name.to_string(),
            }));
        }

        match (object, name) {
            (Object::File(file), "name") => {
                let path = file.path().to_string();
                Ok(self.new_str(path))
            }
            (Object::File(file), "mode") => {
                let mode = file.mode().as_str();
                Ok(self.new_str(mode))
            }
            (Object::File(file), "closed") => {
                let closed = file.is_closed();
                Ok(self.new_bool(closed))
            }
            (Object::Function(func), "__name__") => {
                let func_name = func.name.clone();
                Ok(self.new_str(func_name))
            }
            (Object::Builtin(builtin), "__name__") => {
                let builtin_name = builtin.name();
                Ok(self.new_str(builtin_name))
            }
            (Object::Exception(exc), "args") => {
                let message = exc.message.clone();
                let items = if message.is_empty() {
                    Vec::new()
                } else {
                    vec![self.new_str(message)]
                };
                Ok(self.new_tuple(items))
            }
            (Object::Method(method), "__self__") => {
                let bound = method.receiver;
                self.incref(bound)
            }
            _ => Err(no_attribute(kind, name)),
        }
    }

    /// Call the built-in method `name` on `receiver`
    pub fn call_method(
        &mut self,
        receiver: ObjRef,
        name: &str,
        args: &[ObjRef],
        kwargs: &[(String, ObjRef)],
    ) -> RtResult<ObjRef> {
        let kind = self.get(receiver)?.object_type();
        if !method_names(kind).contains(&name) {
            return Err(no_attribute(kind, name));
        }
        let qualified = format!("{}.{}", kind.name(), name);
        let args = CallArgs::new(&qualified, args, kwargs);
        match kind {
            ObjectType::Str => self.str_method(receiver, name, args),
            ObjectType::List => self.list_method(receiver, name, args),
            ObjectType::Tuple => self.tuple_method(receiver, name, args),
            ObjectType::Dict => self.dict_method(receiver, name, args),
            ObjectType::Set => self.set_method(receiver, name, args),
            ObjectType::File => self.file_method(receiver, name, args),
            _ => Err(no_attribute(kind, name)),
        }
    }

    fn file_method(&mut self, receiver: ObjRef, name: &str, args: CallArgs<'_>) -> RtResult<ObjRef> {
        match name {
            "read" => {
                args.simple(0, 0)?;
                let text = match self.get_mut(receiver)? {
                    Object::File(file) => file.read()?,
                    _ => return Err(no_attribute(ObjectType::File, name)),
                };
                Ok(self.new_str(text))
            }
            "write" => {
                args.simple(1, 1)?;
                let text = self.to_str(args.required(0)?)?.to_string();
                let written = match self.get_mut(receiver)? {
                    Object::File(file) => file.write(&text)?,
                    _ => return Err(no_attribute(ObjectType::File, name)),
                };
                Ok(self.new_int(written as i64))
            }
            _ => {
                args.simple(0, 0)?;
                if let Object::File(file) = self.get_mut(receiver)? {
                    file.close()?;
                }
                Ok(self.new_none())
            }
        }
    }

    /// Member of an index-like argument, resolved against `len` with clamping
    pub(crate) fn clamp_index(&self, index: ObjRef, len: usize) -> RtResult<usize> {
        let raw = self.to_int(index)?;
        let len = len as i64;
        let adjusted = if raw < 0 { (raw + len).max(0) } else { raw.min(len) };
        Ok(adjusted as usize)
    }
}
