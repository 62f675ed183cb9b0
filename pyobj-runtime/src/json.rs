//! JSON encoder/decoder - `json.dumps` / `json.loads` over heap objects
//!
//! Design: values convert to and from `serde_json::Value` (with
//! `preserve_order`, so dict insertion order survives a round trip):
//! - Compact output uses `", "` and `": "` separators, like `json.dumps`
//! - Indented output uses serde's pretty printer with the requested width
//! - Non-text dict keys are coerced the way `json.dumps` coerces them

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::object::Object;
use crate::ops::MAX_NESTING;
use crate::strings::float_repr;

/// Single-line output with spaced separators
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn write_value(value: &Value, indent: Option<usize>) -> RtResult<String> {
    let mut out = Vec::new();
    let written = match indent {
        Some(width) => {
            let spaces = " ".repeat(width);
            let formatter = PrettyFormatter::with_indent(spaces.as_bytes());
            value.serialize(&mut Serializer::with_formatter(&mut out, formatter))
        }
        None => value.serialize(&mut Serializer::with_formatter(&mut out, SpacedFormatter)),
    };
    written.map_err(|err| RuntimeError::value_error(err.to_string()))?;
    String::from_utf8(out).map_err(|err| RuntimeError::value_error(err.to_string()))
}

impl Interpreter {
    /// Serialize `value` to JSON text
    pub fn json_dumps(&self, value: ObjRef, indent: Option<usize>) -> RtResult<String> {
        let mut visiting = Vec::new();
        let tree = self.to_json(value, &mut visiting)?;
        write_value(&tree, indent)
    }

    fn to_json(&self, r: ObjRef, visiting: &mut Vec<ObjRef>) -> RtResult<Value> {
        let object = self.get(r)?;
        if object.object_type().is_container() {
            if visiting.contains(&r) {
                return Err(RuntimeError::value_error("Circular reference detected"));
            }
            if visiting.len() >= MAX_NESTING {
                return Err(RuntimeError::new(
                    ExcKind::RecursionError,
                    "maximum recursion depth exceeded while encoding a JSON object",
                ));
            }
            visiting.push(r);
        }
        let value = match object {
            Object::None => Value::Null,
            Object::Bool(b) => Value::Bool(*b),
            Object::Int(i) => Value::Number(Number::from(*i)),
            Object::Float(f) => Value::Number(Number::from_f64(*f).ok_or_else(|| {
                RuntimeError::value_error(format!(
                    "Out of range float values are not JSON compliant: {}",
                    float_repr(*f)
                ))
            })?),
            Object::Str(s) => Value::String(s.clone()),
            Object::List(items) | Object::Tuple(items) => {
                let mut array = Vec::with_capacity(items.len());
                for item in items {
                    array.push(self.to_json(*item, visiting)?);
                }
                Value::Array(array)
            }
            Object::Dict(_) => {
                let mut map = Map::new();
                for (key, value) in self.dict_entries(r)? {
                    let key = self.json_key(key)?;
                    map.insert(key, self.to_json(value, visiting)?);
                }
                Value::Object(map)
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "Object of type {} is not JSON serializable",
                    other.object_type().name()
                )))
            }
        };
        if object.object_type().is_container() {
            visiting.pop();
        }
        Ok(value)
    }

    fn json_key(&self, key: ObjRef) -> RtResult<String> {
        match self.get(key)? {
            Object::Str(s) => Ok(s.clone()),
            Object::Int(i) => Ok(i.to_string()),
            Object::Float(f) => Ok(float_repr(*f)),
            Object::Bool(true) => Ok("true".to_string()),
            Object::Bool(false) => Ok("false".to_string()),
            Object::None => Ok("null".to_string()),
            other => Err(RuntimeError::type_error(format!(
                "keys must be str, int, float, bool or None, not {}",
                other.object_type().name()
            ))),
        }
    }

    /// Parse JSON text into new heap objects
    pub fn json_loads(&mut self, text: &str) -> RtResult<ObjRef> {
        let tree: Value = serde_json::from_str(text)
            .map_err(|err| RuntimeError::new(ExcKind::JSONDecodeError, err.to_string()))?;
        self.from_json(&tree)
    }

    fn from_json(&mut self, value: &Value) -> RtResult<ObjRef> {
        match value {
            Value::Null => Ok(self.new_none()),
            Value::Bool(b) => Ok(self.new_bool(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(self.new_int(i)),
                (None, Some(f)) if n.is_f64() => Ok(self.new_float(f)),
                _ => Err(RuntimeError::value_error(format!(
                    "integer {} does not fit in 64 bits",
                    n
                ))),
            },
            Value::String(s) => Ok(self.new_str(s.as_str())),
            Value::Array(items) => {
                let mut refs = Vec::with_capacity(items.len());
                for item in items {
                    match self.from_json(item) {
                        Ok(r) => refs.push(r),
                        Err(err) => {
                            self.release_all(refs);
                            return Err(err);
                        }
                    }
                }
                Ok(self.new_list(refs))
            }
            Value::Object(map) => {
                let dict = self.new_dict();
                for (key, item) in map {
                    let stored = self.from_json(item).and_then(|item| {
                        let stored = self.dict_set_str(dict, key, item);
                        self.release(item);
                        stored
                    });
                    if let Err(err) = stored {
                        self.release(dict);
                        return Err(err);
                    }
                }
                Ok(dict)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interp() -> Interpreter {
        Interpreter::new(1).unwrap()
    }

    #[test]
    fn test_dumps_compact_separators() {
        let mut interp = interp();
        let value = interp.json_loads(r#"{"a":1,"b":[true,null,"x"]}"#).unwrap();
        assert_eq!(
            interp.json_dumps(value, None).unwrap(),
            r#"{"a": 1, "b": [true, null, "x"]}"#
        );
    }

    #[test]
    fn test_dumps_indented() {
        let mut interp = interp();
        let value = interp.json_loads(r#"{"a": [1, 2], "b": {}}"#).unwrap();
        let text = interp.json_dumps(value, Some(2)).unwrap();
        assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}");
    }

    #[test]
    fn test_preserves_key_order() {
        let mut interp = interp();
        let value = interp.json_loads(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys = interp.table_keys(value).unwrap();
        let names: Vec<_> = keys.iter().map(|k| interp.to_str(*k).unwrap().to_string()).collect();
        assert_eq!(names, ["z", "a", "m"]);
    }

    #[test]
    fn test_numbers_keep_their_type() {
        let mut interp = interp();
        let value = interp.json_loads("[1, 1.5, -3]").unwrap();
        assert_eq!(interp.repr(value).unwrap(), "[1, 1.5, -3]");
    }

    #[test]
    fn test_rejects_integers_beyond_i64() {
        let mut interp = interp();
        let err = interp.json_loads("[1, 18446744073709551615]").unwrap_err();
        assert_eq!(err.kind(), ExcKind::ValueError);
        assert!(err.message().contains("18446744073709551615"));

        let edge = interp.json_loads("[9223372036854775807, -9223372036854775808]").unwrap();
        assert_eq!(
            interp.repr(edge).unwrap(),
            "[9223372036854775807, -9223372036854775808]"
        );
    }

    #[test]
    fn test_key_coercion() {
        let mut interp = interp();
        let dict = interp.new_dict();
        let one = interp.new_int(1);
        let two = interp.new_int(2);
        let yes = interp.new_bool(true);
        let none = interp.new_none();
        interp.dict_set(dict, two, one).unwrap();
        interp.dict_set(dict, yes, none).unwrap();
        interp.dict_set(dict, none, two).unwrap();
        assert_eq!(
            interp.json_dumps(dict, None).unwrap(),
            r#"{"2": 1, "true": null, "null": 2}"#
        );

        // True and 1 are the same key
        let merged = interp.new_dict();
        interp.dict_set(merged, one, one).unwrap();
        interp.dict_set(merged, yes, none).unwrap();
        assert_eq!(interp.json_dumps(merged, None).unwrap(), r#"{"1": null}"#);

        let key = interp.new_tuple(Vec::new());
        let bad = interp.new_dict();
        interp.dict_set(bad, key, one).unwrap();
        assert_eq!(interp.json_dumps(bad, None).unwrap_err().kind(), ExcKind::TypeError);
    }

    #[test]
    fn test_rejects_unserializable() {
        let mut interp = interp();
        let set = interp.new_set();
        assert_eq!(interp.json_dumps(set, None).unwrap_err().kind(), ExcKind::TypeError);
        let nan = interp.new_float(f64::NAN);
        assert_eq!(interp.json_dumps(nan, None).unwrap_err().kind(), ExcKind::ValueError);
    }

    #[test]
    fn test_circular_reference() {
        let mut interp = interp();
        let list = interp.new_list(Vec::new());
        interp.list_append(list, list).unwrap();
        let err = interp.json_dumps(list, None).unwrap_err();
        assert_eq!(err.message(), "Circular reference detected");
    }

    #[test]
    fn test_deep_nesting_is_recursion_error() {
        let mut interp = interp();
        let mut value = interp.new_list(Vec::new());
        for _ in 0..20_000 {
            value = interp.new_list(vec![value]);
        }
        let err = interp.json_dumps(value, None).unwrap_err();
        assert_eq!(err.kind(), ExcKind::RecursionError);

        let mut shallow = interp.new_list(Vec::new());
        for _ in 0..MAX_NESTING - 1 {
            shallow = interp.new_list(vec![shallow]);
        }
        assert!(interp.json_dumps(shallow, None).is_ok());
    }

    #[test]
    fn test_shared_subtree_is_not_circular() {
        let mut interp = interp();
        let inner = interp.new_list(Vec::new());
        let outer = interp.adopt(Object::List(vec![inner, inner])).unwrap();
        assert_eq!(interp.json_dumps(outer, None).unwrap(), "[[], []]");
    }

    #[test]
    fn test_decode_error_kind() {
        let mut interp = interp();
        let err = interp.json_loads("{not json").unwrap_err();
        assert_eq!(err.kind(), ExcKind::JSONDecodeError);
        assert!(err.kind().is_subclass_of(ExcKind::ValueError));
    }
}
