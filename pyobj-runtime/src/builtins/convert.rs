//! Type constructors and numeric conversion builtins

use num_traits::ToPrimitive;

use super::Builtin;
use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::heap::ObjRef;
use crate::interp::Interpreter;
use crate::methods::CallArgs;
use crate::object::Object;

/// Round half to even, the way `round()` does
pub(crate) fn round_half_even(value: f64) -> f64 {
    let rounded = value.round();
    if (value - value.trunc()).abs() == 0.5 {
        2.0 * (value / 2.0).round()
    } else {
        rounded
    }
}

fn parse_int(text: &str, base: u32) -> Option<i64> {
    let trimmed = text.trim().replace('_', "");
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, trimmed.strip_prefix('+').unwrap_or(&trimmed).to_string()),
    };
    let digits = match base {
        16 => digits.trim_start_matches("0x").trim_start_matches("0X").to_string(),
        8 => digits.trim_start_matches("0o").trim_start_matches("0O").to_string(),
        2 => digits.trim_start_matches("0b").trim_start_matches("0B").to_string(),
        _ => digits,
    };
    if digits.is_empty() {
        return None;
    }
    let magnitude = i64::from_str_radix(&digits, base).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim().to_lowercase();
    match trimmed.as_str() {
        "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        "nan" | "+nan" | "-nan" => Some(f64::NAN),
        other => other.replace('_', "").parse().ok(),
    }
}

impl Interpreter {
    pub(super) fn construct(&mut self, builtin: Builtin, args: CallArgs<'_>) -> RtResult<ObjRef> {
        match builtin {
            Builtin::Str => {
                args.simple(0, 1)?;
                let text = match args.get(0) {
                    Some(value) => self.str(value)?,
                    None => String::new(),
                };
                Ok(self.new_str(text))
            }
            Builtin::Bool => {
                args.simple(0, 1)?;
                let value = match args.get(0) {
                    Some(value) => self.truthy(value)?,
                    None => false,
                };
                Ok(self.new_bool(value))
            }
            Builtin::Int => self.construct_int(args),
            Builtin::Float => {
                args.simple(0, 1)?;
                let value = match args.get(0) {
                    None => 0.0,
                    Some(value) => match self.get(value)? {
                        Object::Str(s) => parse_float(s).ok_or_else(|| {
                            RuntimeError::value_error(format!(
                                "could not convert string to float: {}",
                                crate::strings::str_repr(s)
                            ))
                        })?,
                        _ => self.to_float(value)?,
                    },
                };
                Ok(self.new_float(value))
            }
            Builtin::List | Builtin::Tuple => {
                args.simple(0, 1)?;
                let items = match args.get(0) {
                    Some(iterable) => self.iterate(iterable)?,
                    None => Vec::new(),
                };
                Ok(if builtin == Builtin::List {
                    self.new_list(items)
                } else {
                    self.new_tuple(items)
                })
            }
            Builtin::Set => {
                args.simple(0, 1)?;
                match args.get(0) {
                    Some(iterable) => self.set_from(iterable),
                    None => Ok(self.new_set()),
                }
            }
            Builtin::Dict => {
                args.arity(0, 1)?;
                let dict = self.new_dict();
                let mut outcome = match args.get(0) {
                    Some(source) => self.dict_update(dict, source),
                    None => Ok(()),
                };
                for (key, value) in args.keywords() {
                    if outcome.is_ok() {
                        outcome = self.dict_set_str(dict, key, *value);
                    }
                }
                match outcome {
                    Ok(()) => Ok(dict),
                    Err(err) => {
                        self.release(dict);
                        Err(err)
                    }
                }
            }
            _ => self.round(args),
        }
    }

    fn construct_int(&mut self, args: CallArgs<'_>) -> RtResult<ObjRef> {
        args.keywords_only(&["base"])?;
        args.arity(0, 2)?;
        let Some(value) = args.get(0) else {
            return Ok(self.new_int(0));
        };
        let base = match args.get(1).or_else(|| args.keyword("base")) {
            Some(base) => Some(self.to_int(base)?),
            None => None,
        };

        let result = match (self.get(value)?, base) {
            (Object::Str(s), base) => {
                let base = base.unwrap_or(10);
                if !(2..=36).contains(&base) {
                    return Err(RuntimeError::value_error("int() base must be >= 2 and <= 36"));
                }
                parse_int(s, base as u32).ok_or_else(|| {
                    RuntimeError::value_error(format!(
                        "invalid literal for int() with base {}: {}",
                        base,
                        crate::strings::str_repr(s)
                    ))
                })?
            }
            (_, Some(_)) => {
                return Err(RuntimeError::type_error(
                    "int() can't convert non-string with explicit base",
                ))
            }
            (Object::Float(f), None) => {
                if f.is_nan() {
                    return Err(RuntimeError::value_error("cannot convert float NaN to integer"));
                }
                f.trunc().to_i64().ok_or_else(|| {
                    RuntimeError::new(
                        ExcKind::OverflowError,
                        "cannot convert float infinity to integer",
                    )
                })?
            }
            (Object::Int(_) | Object::Bool(_), None) => self.to_int(value)?,
            (other, None) => {
                return Err(RuntimeError::type_error(format!(
                    "int() argument must be a string or a real number, not '{}'",
                    other.object_type().name()
                )))
            }
        };
        Ok(self.new_int(result))
    }

    fn round(&mut self, args: CallArgs<'_>) -> RtResult<ObjRef> {
        args.keywords_only(&["ndigits"])?;
        args.arity(1, 2)?;
        let value = args.required(0)?;
        let ndigits = match args.get(1).or_else(|| args.keyword("ndigits")) {
            Some(n) if !self.is_none(n) => Some(self.to_int(n)?),
            _ => None,
        };

        if let Object::Int(_) | Object::Bool(_) = self.get(value)? {
            let i = self.to_int(value)?;
            return Ok(self.new_int(i));
        }
        let f = self.to_float(value)?;
        match ndigits {
            None => {
                let rounded = round_half_even(f);
                let i = rounded.to_i64().ok_or_else(|| {
                    RuntimeError::new(ExcKind::OverflowError, "cannot convert float to integer")
                })?;
                Ok(self.new_int(i))
            }
            Some(n) => {
                let factor = 10f64.powi(n.clamp(-308, 308) as i32);
                let rounded = round_half_even(f * factor) / factor;
                Ok(self.new_float(if rounded.is_finite() { rounded } else { f }))
            }
        }
    }
}
