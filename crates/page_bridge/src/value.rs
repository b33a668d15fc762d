use core::fmt::Write as _;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Largest integer a page-side double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// An engine-agnostic representation of values crossing the bridge.
#[derive(Clone, Debug, PartialEq)]
pub enum JSValue {
    /// The `undefined` value.
    Undefined,
    /// The `null` value.
    Null,
    /// A boolean primitive.
    Boolean(bool),
    /// A number (IEEE 754 double precision).
    Number(f64),
    /// A string value (UTF-8).
    String(String),
    /// An array of values.
    Array(Vec<JSValue>),
    /// A plain object with string keys.
    Object(BTreeMap<String, JSValue>),
}

impl JSValue {
    /// Encode the value as a page-context literal expression.
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }

    /// Append the literal form of the value to `out`.
    pub fn write_literal(&self, out: &mut String) {
        match self {
            Self::Undefined => out.push_str("undefined"),
            Self::Null => out.push_str("null"),
            Self::Boolean(value) => out.push_str(if *value { "true" } else { "false" }),
            Self::Number(value) => write_number(*value, out),
            Self::String(value) => write_string(value, out),
            Self::Array(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    item.write_literal(out);
                }
                out.push(']');
            }
            Self::Object(fields) => {
                out.push('{');
                for (index, (key, item)) in fields.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    write_string(key, out);
                    out.push(':');
                    item.write_literal(out);
                }
                out.push('}');
            }
        }
    }

    /// True for `undefined` and `null`.
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// The numeric payload, if any.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The numeric payload when it is an exactly representable integer.
    pub fn as_i64(&self) -> Option<i64> {
        let number = self.as_f64()?;
        (number.is_finite() && number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER)
            .then_some(number as i64)
    }

    /// Borrow the array items, if any.
    pub fn as_array(&self) -> Option<&[JSValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the object fields, if any.
    pub const fn as_object(&self) -> Option<&BTreeMap<String, JSValue>> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Numbers print without a fraction when integral so ids survive as integers page-side.
fn write_number(value: f64, out: &mut String) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    } else if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        let _written = write!(out, "{}", value as i64);
    } else if let Some(number) = Number::from_f64(value) {
        let _written = write!(out, "{number}");
    } else {
        let _written = write!(out, "{value}");
    }
}

/// Escape a string so it can be embedded as a double-quoted literal, including inside
/// an inline `<script>` element.
fn write_string(input: &str, out: &mut String) {
    out.reserve(input.len().saturating_add(2));
    out.push('"');
    let mut previous = '\0';
    for character in input.chars() {
        match character {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '/' if previous == '<' => out.push_str("\\/"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            control if control.is_control() && (control as u32) < 0x100 => {
                let _written = write!(out, "\\u{:04x}", control as u32);
            }
            _ => out.push(character),
        }
        previous = character;
    }
    out.push('"');
}

impl From<Value> for JSValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Boolean(flag),
            Value::Number(number) => Self::Number(number.as_f64().unwrap_or(f64::NAN)),
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, item)| (key, Self::from(item)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for JSValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for JSValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for JSValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for JSValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for JSValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for JSValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for JSValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for JSValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<JSValue>> From<Vec<T>> for JSValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<JSValue>> From<Option<T>> for JSValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<JSValue>> From<BTreeMap<String, T>> for JSValue {
    fn from(fields: BTreeMap<String, T>) -> Self {
        Self::Object(
            fields
                .into_iter()
                .map(|(key, item)| (key, item.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_have_no_fraction() {
        assert_eq!(JSValue::from(42).to_literal(), "42");
        assert_eq!(JSValue::Number(-3.0).to_literal(), "-3");
        assert_eq!(JSValue::Number(0.5).to_literal(), "0.5");
        assert_eq!(JSValue::Number(f64::NAN).to_literal(), "NaN");
        assert_eq!(JSValue::Number(f64::NEG_INFINITY).to_literal(), "-Infinity");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            JSValue::from("a\"b\\c\nd").to_literal(),
            r#""a\"b\\c\nd""#
        );
        assert_eq!(JSValue::from("</script>").to_literal(), r#""<\/script>""#);
        assert_eq!(JSValue::from("\u{1}").to_literal(), r#""\u0001""#);
        assert_eq!(JSValue::from("a/b").to_literal(), r#""a/b""#);
    }

    #[test]
    fn nested_structures_encode_recursively() {
        let mut record = BTreeMap::new();
        record.insert(String::from("k"), JSValue::from(vec![1, 2]));
        record.insert(String::from("flag"), JSValue::Boolean(false));
        let value = JSValue::Array(vec![JSValue::Object(record), JSValue::Null]);
        assert_eq!(value.to_literal(), r#"[{"flag":false,"k":[1,2]},null]"#);
    }

    #[test]
    fn integer_accessor_rejects_fractions() {
        assert_eq!(JSValue::Number(7.0).as_i64(), Some(7));
        assert_eq!(JSValue::Number(7.5).as_i64(), None);
        assert_eq!(JSValue::from("7").as_i64(), None);
    }

    #[test]
    fn converts_from_json_values() {
        let value = JSValue::from(serde_json::json!({"0": ["Home", "http://x/"], "n": 1.5}));
        let fields = value.as_object().expect("object");
        assert_eq!(
            fields.get("0"),
            Some(&JSValue::Array(vec![
                JSValue::from("Home"),
                JSValue::from("http://x/")
            ]))
        );
        assert_eq!(fields.get("n"), Some(&JSValue::Number(1.5)));
    }
}
