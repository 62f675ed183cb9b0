//! `str` methods

use super::CallArgs;
use crate::error::{RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::Object;
use crate::strings;

pub(super) const METHODS: &[&str] = &[
    "capitalize",
    "upper",
    "lower",
    "strip",
    "lstrip",
    "rstrip",
    "title",
    "replace",
    "split",
    "join",
    "startswith",
    "endswith",
    "find",
    "count",
    "isdigit",
    "isalpha",
    "isalnum",
    "isspace",
    "isupper",
    "islower",
];

impl Interpreter {
    /// Optional text argument where `None` means "not given"
    fn optional_str(&self, arg: Option<ObjRef>) -> RtResult<Option<String>> {
        match arg {
            Some(r) if !self.is_none(r) => Ok(Some(self.to_str(r)?.to_string())),
            _ => Ok(None),
        }
    }

    /// Prefix/suffix argument: one string or a tuple of strings
    fn affixes(&self, arg: ObjRef) -> RtResult<Vec<String>> {
        match self.get(arg)? {
            Object::Str(s) => Ok(vec![s.clone()]),
            Object::Tuple(items) => items
                .iter()
                .map(|item| self.to_str(*item).map(str::to_string))
                .collect(),
            other => Err(RuntimeError::type_error(format!(
                "expected str or a tuple of str, not {}",
                other.object_type().name()
            ))),
        }
    }

    pub(super) fn str_method(
        &mut self,
        receiver: ObjRef,
        name: &str,
        args: CallArgs<'_>,
    ) -> RtResult<ObjRef> {
        let text = self.to_str(receiver)?.to_string();

        let converted = match name {
            "capitalize" | "upper" | "lower" | "title" => {
                args.simple(0, 0)?;
                match name {
                    "capitalize" => strings::capitalize(&text),
                    "upper" => text.to_uppercase(),
                    "lower" => text.to_lowercase(),
                    _ => strings::title(&text),
                }
            }
            "strip" | "lstrip" | "rstrip" => {
                args.simple(0, 1)?;
                let chars = self.optional_str(args.get(0))?;
                let (left, right) = match name {
                    "lstrip" => (true, false),
                    "rstrip" => (false, true),
                    _ => (true, true),
                };
                strings::strip(&text, chars.as_deref(), left, right).to_string()
            }
            "replace" => {
                args.simple(2, 2)?;
                let old = self.to_str(args.required(0)?)?.to_string();
                let new = self.to_str(args.required(1)?)?;
                text.replace(&old, new)
            }
            "split" => {
                args.keywords_only(&["sep"])?;
                args.arity(0, 1)?;
                let sep = self.optional_str(args.get(0).or_else(|| args.keyword("sep")))?;
                let parts = strings::split(&text, sep.as_deref())?;
                return Ok(self.str_list(parts));
            }
            "join" => {
                args.simple(1, 1)?;
                return self.str_join(&text, args.required(0)?);
            }
            "startswith" | "endswith" => {
                args.simple(1, 1)?;
                let affixes = self.affixes(args.required(0)?)?;
                let hit = affixes.iter().any(|affix| {
                    if name == "startswith" {
                        text.starts_with(affix.as_str())
                    } else {
                        text.ends_with(affix.as_str())
                    }
                });
                return Ok(self.new_bool(hit));
            }
            "find" | "count" => {
                args.simple(1, 1)?;
                let needle = self.to_str(args.required(0)?)?;
                let value = if name == "find" {
                    strings::find(&text, needle)
                } else {
                    strings::count(&text, needle) as i64
                };
                return Ok(self.new_int(value));
            }
            _ => {
                args.simple(0, 0)?;
                let result = match name {
                    "isdigit" => strings::isdigit(&text),
                    "isalpha" => strings::isalpha(&text),
                    "isalnum" => strings::isalnum(&text),
                    "isspace" => strings::isspace(&text),
                    "isupper" => strings::isupper(&text),
                    _ => strings::islower(&text),
                };
                return Ok(self.new_bool(result));
            }
        };
        Ok(self.new_str(converted))
    }

    fn str_join(&mut self, separator: &str, iterable: ObjRef) -> RtResult<ObjRef> {
        let items = self.iterate(iterable)?;
        let mut parts = Vec::with_capacity(items.len());
        let mut failure = None;
        for (i, item) in items.iter().enumerate() {
            match self.get(*item)? {
                Object::Str(s) => parts.push(s.clone()),
                other => {
                    failure = Some(RuntimeError::type_error(format!(
                        "sequence item {}: expected str instance, {} found",
                        i,
                        other.object_type().name()
                    )));
                    break;
                }
            }
        }
        self.release_all(items);
        match failure {
            Some(err) => Err(err),
            None => Ok(self.new_str(parts.join(separator))),
        }
    }
}
