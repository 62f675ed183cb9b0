//! Text helpers shared by `str` methods, `repr` and f-strings
//!
//! Indices and lengths are in code points, never bytes.

use crate::error::{RtResult, RuntimeError};

/// `repr()` of a float: shortest round-trip digits, exponent outside [1e-4, 1e16)
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let plain = format!("{}", value);
        if plain.contains('.') {
            plain
        } else {
            plain + ".0"
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// `repr()` of a string, choosing quotes the way the runtime does
pub(crate) fn str_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub(crate) fn title(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_cased = false;
    for c in value.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}

pub(crate) fn strip<'a>(value: &'a str, chars: Option<&str>, left: bool, right: bool) -> &'a str {
    let matches = |c: char| match chars {
        Some(set) => set.contains(c),
        None => c.is_whitespace(),
    };
    let mut out = value;
    if left {
        out = out.trim_start_matches(matches);
    }
    if right {
        out = out.trim_end_matches(matches);
    }
    out
}

pub(crate) fn split(value: &str, sep: Option<&str>) -> RtResult<Vec<String>> {
    match sep {
        None => Ok(value.split_whitespace().map(str::to_string).collect()),
        Some("") => Err(RuntimeError::value_error("empty separator")),
        Some(sep) => Ok(value.split(sep).map(str::to_string).collect()),
    }
}

/// Code point index of the first occurrence of `needle`, -1 when absent
pub(crate) fn find(haystack: &str, needle: &str) -> i64 {
    match haystack.find(needle) {
        Some(byte) => haystack[..byte].chars().count() as i64,
        None => -1,
    }
}

/// Non-overlapping occurrences; an empty needle matches between every character
pub(crate) fn count(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return char_len(haystack) + 1;
    }
    haystack.matches(needle).count()
}

fn all_nonempty(value: &str, pred: impl Fn(char) -> bool) -> bool {
    !value.is_empty() && value.chars().all(pred)
}

pub(crate) fn isdigit(value: &str) -> bool {
    all_nonempty(value, |c| c.is_ascii_digit() || c.is_numeric())
}

pub(crate) fn isalpha(value: &str) -> bool {
    all_nonempty(value, char::is_alphabetic)
}

pub(crate) fn isalnum(value: &str) -> bool {
    all_nonempty(value, char::is_alphanumeric)
}

pub(crate) fn isspace(value: &str) -> bool {
    all_nonempty(value, char::is_whitespace)
}

/// At least one cased character, and no lowercase ones
pub(crate) fn isupper(value: &str) -> bool {
    value.chars().any(char::is_uppercase) && !value.chars().any(char::is_lowercase)
}

pub(crate) fn islower(value: &str) -> bool {
    value.chars().any(char::is_lowercase) && !value.chars().any(char::is_uppercase)
}

/// Parsed `[[fill]align][sign][0][width][,][.precision][type]`
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<char>,
    pub sign: Option<char>,
    pub zero: bool,
    pub width: usize,
    pub grouping: bool,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

impl FormatSpec {
    pub fn parse(spec: &str) -> RtResult<Self> {
        let chars: Vec<char> = spec.chars().collect();
        let mut out = FormatSpec::default();
        let mut i = 0;
        let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');

        if chars.len() >= 2 && is_align(chars[1]) {
            out.fill = Some(chars[0]);
            out.align = Some(chars[1]);
            i = 2;
        } else if !chars.is_empty() && is_align(chars[0]) {
            out.align = Some(chars[0]);
            i = 1;
        }
        if let Some(&c) = chars.get(i) {
            if matches!(c, '+' | '-' | ' ') {
                out.sign = Some(c);
                i += 1;
            }
        }
        if chars.get(i) == Some(&'0') {
            out.zero = true;
            i += 1;
        }
        let start = i;
        while chars.get(i).map_or(false, char::is_ascii_digit) {
            i += 1;
        }
        if i > start {
            out.width = chars[start..i].iter().collect::<String>().parse().unwrap_or(0);
        }
        if chars.get(i) == Some(&',') {
            out.grouping = true;
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).map_or(false, char::is_ascii_digit) {
                i += 1;
            }
            if i == start {
                return Err(RuntimeError::value_error("Format specifier missing precision"));
            }
            out.precision = chars[start..i].iter().collect::<String>().parse().ok();
        }
        if let Some(&c) = chars.get(i) {
            out.kind = Some(c);
            i += 1;
        }
        if i != chars.len() {
            return Err(RuntimeError::value_error(format!(
                "Invalid format specifier '{}'",
                spec
            )));
        }
        Ok(out)
    }

    /// Pad `body` (already signed) to the requested width
    pub fn pad(&self, body: String, numeric: bool) -> String {
        let len = char_len(&body);
        if len >= self.width {
            return body;
        }
        let missing = self.width - len;
        let default_align = if numeric { '>' } else { '<' };
        let (fill, align) = if self.zero && self.align.is_none() {
            ('0', '=')
        } else {
            (self.fill.unwrap_or(' '), self.align.unwrap_or(default_align))
        };
        let filler = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();
        match align {
            '<' => body + &filler(missing),
            '^' => {
                let left = missing / 2;
                filler(left) + &body + &filler(missing - left)
            }
            '=' => {
                let (sign, digits) = match body.chars().next() {
                    Some(c @ ('-' | '+' | ' ')) => (c.to_string(), body[1..].to_string()),
                    _ => (String::new(), body),
                };
                sign + &filler(missing) + &digits
            }
            _ => filler(missing) + &body,
        }
    }

    fn signed(&self, negative: bool, digits: String) -> String {
        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Some('+')) => "+",
            (false, Some(' ')) => " ",
            _ => "",
        };
        format!("{}{}", sign, digits)
    }

    pub fn format_int(&self, value: i64) -> RtResult<String> {
        let magnitude = value.unsigned_abs();
        let digits = match self.kind {
            None | Some('d') => group(magnitude.to_string(), self.grouping),
            Some('x') => format!("{:x}", magnitude),
            Some('X') => format!("{:X}", magnitude),
            Some('o') => format!("{:o}", magnitude),
            Some('b') => format!("{:b}", magnitude),
            Some('f' | 'F' | 'e' | 'E' | '%' | 'g') => return self.format_float(value as f64),
            Some(kind) => {
                return Err(RuntimeError::value_error(format!(
                    "Unknown format code '{}' for object of type 'int'",
                    kind
                )))
            }
        };
        Ok(self.pad(self.signed(value < 0, digits), true))
    }

    pub fn format_float(&self, value: f64) -> RtResult<String> {
        let magnitude = value.abs();
        let digits = match self.kind {
            Some('f' | 'F') => {
                let text = format!("{:.*}", self.precision.unwrap_or(6), magnitude);
                group_fixed(text, self.grouping)
            }
            Some('e' | 'E') => {
                let text = sci(magnitude, self.precision.unwrap_or(6));
                if self.kind == Some('E') {
                    text.to_uppercase()
                } else {
                    text
                }
            }
            Some('%') => format!("{:.*}%", self.precision.unwrap_or(6), magnitude * 100.0),
            Some('g') | None => match self.precision {
                Some(precision) => general(magnitude, precision.max(1)),
                None => group_fixed(float_repr(magnitude), self.grouping),
            },
            Some(kind) => {
                return Err(RuntimeError::value_error(format!(
                    "Unknown format code '{}' for object of type 'float'",
                    kind
                )))
            }
        };
        let negative = value.is_sign_negative() && !value.is_nan();
        Ok(self.pad(self.signed(negative, digits), true))
    }

    pub fn format_str(&self, value: &str) -> RtResult<String> {
        if let Some(kind) = self.kind.filter(|k| *k != 's') {
            return Err(RuntimeError::value_error(format!(
                "Unknown format code '{}' for object of type 'str'",
                kind
            )));
        }
        let body: String = match self.precision {
            Some(precision) => value.chars().take(precision).collect(),
            None => value.to_string(),
        };
        Ok(self.pad(body, false))
    }
}

fn group(digits: String, grouping: bool) -> String {
    if !grouping {
        return digits;
    }
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn group_fixed(text: String, grouping: bool) -> String {
    match text.split_once('.') {
        Some((whole, frac)) => format!("{}.{}", group(whole.to_string(), grouping), frac),
        None => group(text, grouping),
    }
}

fn sci(value: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => text,
    }
}

/// `g` presentation: significant digits, trailing zeros removed
fn general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.log10().floor() as i32;
    let text = if exponent < -4 || exponent >= precision as i32 {
        let text = sci(value, precision - 1);
        match text.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", trim_zeros(mantissa), exp),
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    };
    text
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
