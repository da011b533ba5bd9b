//! JSON pretty-printer.
//!
//! Output shape is controlled by [`WriteOptions`]: indent mode, key quoting,
//! numeric precision and trimming, float-special style, and the array margin
//! driving the line-wrapping heuristic.
//!
//! Arrays wrap adaptively. Short arrays of scalars stay on one line; the
//! decision renders each element once into scratch storage, measures the
//! would-be line, and replays those renderings verbatim whichever way the
//! decision goes — elements are never formatted twice.
//!
//! # Examples
//!
//! ```rust
//! let v = valon::from_str(r#"{"a": 1, "b": [1, 2, 3], "c": "hi"}"#).unwrap();
//! let text = valon::to_string(&v);
//! assert_eq!(text, "{\n  a: 1,\n  b: [1, 2, 3],\n  c: \"hi\"\n}");
//! ```

use crate::error::{Error, Result};
use crate::read::{is_start_token_char, is_token_char};
use crate::value::Value;
use std::fmt::Write as _;
use std::path::Path;

/// Indentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    /// Everything on one line, no spaces between tokens.
    Packed,
    /// Everything on one line, with spaces between tokens.
    SingleLine,
    /// Multi-line output indented by this many spaces per level.
    Width(u16),
}

/// How to render `Infinity` and `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specials {
    /// `inf`, `-inf`, `nan`.
    CLike,
    /// `Infinity`, `-Infinity`, `NaN`.
    JsLike,
    /// `null` — the only strictly JSON-legal rendering.
    Null,
}

/// Formatting configuration.
///
/// The default profile is the lenient one: 2-space indent, bare keys where
/// legal, array margin 74, precision 6 with trailing-zero trimming, and
/// JavaScript-style specials.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub indent: Indent,
    /// Quote every key, rather than leaving keys bare when they lex as a
    /// single token.
    pub quote_keys: bool,
    /// Line-length threshold for the array wrapping heuristic; 0 forces one
    /// element per line.
    pub array_margin: usize,
    /// Maximum significant digits for doubles.
    pub max_precision: usize,
    /// Drop trailing zeroes (and a trailing bare dot) from doubles.
    pub trim_zeroes: bool,
    pub specials: Specials,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            indent: Indent::Width(2),
            quote_keys: false,
            array_margin: 74,
            max_precision: 6,
            trim_zeroes: true,
            specials: Specials::JsLike,
        }
    }
}

impl WriteOptions {
    /// Output parseable by strict JSON parsers: quoted keys, one array
    /// element per line, specials as `null`.
    #[must_use]
    pub fn strict() -> Self {
        WriteOptions {
            quote_keys: true,
            array_margin: 0,
            specials: Specials::Null,
            ..WriteOptions::default()
        }
    }

    /// Everything on one line with spaces, for logs and small documents.
    #[must_use]
    pub fn single_line() -> Self {
        WriteOptions {
            indent: Indent::SingleLine,
            ..WriteOptions::default()
        }
    }

    /// Minimal output: one line, no inter-token spaces.
    #[must_use]
    pub fn packed() -> Self {
        WriteOptions {
            indent: Indent::Packed,
            ..WriteOptions::default()
        }
    }
}

/// Serializes with the default profile.
#[must_use]
pub fn to_string(value: &Value) -> String {
    to_string_with_options(value, &WriteOptions::default())
}

/// Serializes with the given options.
#[must_use]
pub fn to_string_with_options(value: &Value, options: &WriteOptions) -> String {
    let mut writer = Writer {
        options,
        document: String::new(),
        child_values: Vec::new(),
        add_child_values: false,
        indent: 0,
    };
    writer.write_value(value);
    writer.document
}

/// Serializes to a file with the given options.
pub fn save_file(path: &Path, value: &Value, options: &WriteOptions) -> Result<()> {
    let text = to_string_with_options(value, options);
    std::fs::write(path, text).map_err(|e| Error::io(path, &e))
}

struct Writer<'o> {
    options: &'o WriteOptions,
    document: String,
    /// Scratch renderings from the array measurement pass, replayed when the
    /// array is committed.
    child_values: Vec<String>,
    add_child_values: bool,
    indent: usize,
}

impl Writer<'_> {
    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.push_value("null"),
            Value::Bool(true) => self.push_value("true"),
            Value::Bool(false) => self.push_value("false"),
            Value::Int(v) => self.push_value(&v.to_string()),
            Value::UInt(v) => self.push_value(&v.to_string()),
            Value::Int64(v) => self.push_value(&v.to_string()),
            Value::UInt64(v) => self.push_value(&v.to_string()),
            Value::Double(v) => {
                let text = format_double(*v, self.options);
                self.push_value(&text);
            }
            Value::String(s) => {
                let mut text = String::new();
                append_escaped(&mut text, s, true);
                self.push_value(&text);
            }
            Value::Array(_) => self.write_array(value),
            Value::Object(map) => {
                if map.is_empty() {
                    self.push_value("{}");
                    return;
                }

                self.write_with_indent("{");
                self.indent_in();

                let last = map.len() - 1;
                for (i, (name, child)) in map.iter().enumerate() {
                    self.write_indent();
                    if self.options.quote_keys || !is_bare_key(name) {
                        append_escaped(&mut self.document, name, true);
                    } else {
                        self.document.push_str(name);
                    }
                    if self.options.indent == Indent::Packed {
                        self.document.push(':');
                    } else {
                        self.document.push_str(": ");
                    }

                    self.write_value(child);
                    if i < last {
                        self.document.push(',');
                    }
                }

                self.indent_out();
                self.write_with_indent("}");
            }
        }
    }

    fn write_array(&mut self, value: &Value) {
        let elts = value.elts();

        if elts.is_empty() {
            self.push_value("[]");
            return;
        }

        let multi_line =
            matches!(self.options.indent, Indent::Width(_)) && self.is_multi_line_array(elts);

        // Renderings staged by the measurement pass; nested arrays start a
        // fresh pass of their own.
        let staged = std::mem::take(&mut self.child_values);

        if multi_line {
            self.write_with_indent("[");
            self.indent_in();

            for (i, child) in elts.iter().enumerate() {
                if let Some(text) = staged.get(i) {
                    self.write_with_indent(text);
                } else {
                    self.write_indent();
                    self.write_value(child);
                }
                if i + 1 < elts.len() {
                    self.document.push(',');
                }
            }

            self.indent_out();
            self.write_with_indent("]");
        } else {
            self.document.push('[');

            for (i, child) in elts.iter().enumerate() {
                if i > 0 {
                    self.document.push(',');
                    if self.options.indent != Indent::Packed {
                        self.document.push(' ');
                    }
                }
                if let Some(text) = staged.get(i) {
                    self.document.push_str(text);
                } else {
                    self.write_value(child);
                }
            }

            self.document.push(']');
        }
    }

    /// Decides wrapping, rendering the elements into `child_values` when the
    /// cheap checks don't settle it.
    fn is_multi_line_array(&mut self, elts: &[Value]) -> bool {
        let margin = self.options.array_margin;
        if margin == 0 {
            return true;
        }

        // Each element costs at least "x, ".
        if elts.len() * 3 >= margin {
            return true;
        }

        if elts
            .iter()
            .any(|child| (child.is_array() || child.is_object()) && !child.is_empty())
        {
            return true;
        }

        self.child_values.reserve(elts.len());
        self.add_child_values = true;

        // '[' + ']' plus ", " per gap.
        let mut line_length = 2 + (elts.len() - 1) * 2;

        for (i, child) in elts.iter().enumerate() {
            self.write_value(child);
            line_length += self.child_values[i].len();
        }

        self.add_child_values = false;
        line_length >= margin
    }

    fn push_value(&mut self, text: &str) {
        if self.add_child_values {
            self.child_values.push(text.to_string());
        } else {
            self.document.push_str(text);
        }
    }

    fn write_indent(&mut self) {
        match self.options.indent {
            Indent::Packed => {}
            Indent::SingleLine => {
                if !self.document.is_empty() {
                    self.document.push(' ');
                }
            }
            Indent::Width(_) => {
                if !self.document.is_empty() {
                    if self.document.ends_with(' ') {
                        return; // already positioned, e.g. after "key: "
                    }
                    if !self.document.ends_with('\n') {
                        self.document.push('\n');
                    }
                }
                for _ in 0..self.indent {
                    self.document.push(' ');
                }
            }
        }
    }

    fn write_with_indent(&mut self, text: &str) {
        self.write_indent();
        self.document.push_str(text);
    }

    fn indent_in(&mut self) {
        if let Indent::Width(w) = self.options.indent {
            self.indent += usize::from(w);
        }
    }

    fn indent_out(&mut self) {
        if let Indent::Width(w) = self.options.indent {
            self.indent -= usize::from(w);
        }
    }
}

fn is_bare_key(name: &str) -> bool {
    // These lex as keyword tokens, not member names.
    if matches!(
        name,
        "null" | "true" | "false" | "NaN" | "nan" | "Infinity" | "inf"
    ) {
        return false;
    }
    let bytes = name.as_bytes();
    match bytes.split_first() {
        Some((&first, rest)) => {
            is_start_token_char(first) && rest.iter().all(|&b| is_token_char(b))
        }
        None => false,
    }
}

/// Appends `text`, escaped for a JSON string literal. The common case of no
/// escapable characters is a single copy.
fn append_escaped(out: &mut String, text: &str, quoted: bool) {
    let clean = !text
        .bytes()
        .any(|b| b == b'"' || b == b'\\' || b < 0x20);

    if quoted {
        out.push('"');
    }

    if clean {
        out.push_str(text);
    } else {
        out.reserve(text.len() * 2);
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\u{0008}' => out.push_str("\\b"),
                '\u{000C}' => out.push_str("\\f"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                }
                c => out.push(c),
            }
        }
    }

    if quoted {
        out.push('"');
    }
}

/// `%g`-style formatting: fixed notation inside the precision window,
/// scientific outside it, with optional trailing-zero trimming.
fn format_double(value: f64, options: &WriteOptions) -> String {
    if !value.is_finite() {
        return match options.specials {
            Specials::Null => "null".to_string(),
            Specials::JsLike => {
                if value.is_nan() {
                    "NaN".to_string()
                } else if value < 0.0 {
                    "-Infinity".to_string()
                } else {
                    "Infinity".to_string()
                }
            }
            Specials::CLike => {
                if value.is_nan() {
                    "nan".to_string()
                } else if value < 0.0 {
                    "-inf".to_string()
                } else {
                    "inf".to_string()
                }
            }
        };
    }

    let precision = options.max_precision.max(1);

    // Round to the requested significant digits first; the exponent of the
    // rounded value picks the notation.
    let sci = format!("{:.*e}", precision - 1, value);
    let e_at = sci.find('e').unwrap_or(sci.len() - 1);
    let exponent: i32 = sci[e_at + 1..].parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mut mantissa = sci[..e_at].to_string();
        if options.trim_zeroes {
            trim_trailing_zeroes(&mut mantissa);
        } else if !mantissa.contains('.') {
            mantissa.push('.');
        }
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let mut text = format!("{:.*}", decimals, value);
        if options.trim_zeroes {
            trim_trailing_zeroes(&mut text);
        } else if decimals == 0 {
            text.push('.');
        }
        text
    }
}

fn trim_trailing_zeroes(text: &mut String) {
    let Some(dot) = text.find('.') else {
        return;
    };
    let mut keep = text.len();
    while keep > dot + 1 && text.as_bytes()[keep - 1] == b'0' {
        keep -= 1;
    }
    if keep == dot + 1 {
        keep = dot;
    }
    text.truncate(keep);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valon;

    fn write(value: &Value, options: &WriteOptions) -> String {
        to_string_with_options(value, options)
    }

    #[test]
    fn default_profile_layout() {
        let v = valon!({ "a": 1, "b": [1, 2, 3], "c": "hi" });
        assert_eq!(
            to_string(&v),
            "{\n  a: 1,\n  b: [1, 2, 3],\n  c: \"hi\"\n}"
        );
    }

    #[test]
    fn single_line_and_packed() {
        let v = valon!({ "a": 1, "b": [1, 2] });
        assert_eq!(
            write(&v, &WriteOptions::single_line()),
            "{ a: 1, b: [1, 2] }"
        );
        assert_eq!(write(&v, &WriteOptions::packed()), "{a:1,b:[1,2]}");
    }

    #[test]
    fn strict_profile_quotes_keys_and_wraps_arrays() {
        let v = valon!({ "k": [1, 2] });
        assert_eq!(
            write(&v, &WriteOptions::strict()),
            "{\n  \"k\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn short_arrays_stay_on_one_line() {
        let v = valon!([1, 2, 3]);
        assert_eq!(to_string(&v), "[1, 2, 3]");
    }

    #[test]
    fn long_arrays_wrap_one_element_per_line() {
        let v: Value = (0..40).map(Value::Int).collect();
        let text = to_string(&v);
        assert_eq!(text.lines().count(), 42); // brackets plus one line each
        assert!(text.starts_with("[\n  0,\n  1,"));
    }

    #[test]
    fn measured_arrays_wrap_at_the_margin() {
        let wide = valon!(["aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "cccc"]);
        assert!(to_string(&wide).contains('\n'));

        let narrow = valon!(["aa", "bb"]);
        assert_eq!(to_string(&narrow), "[\"aa\", \"bb\"]");
    }

    #[test]
    fn nested_nonempty_containers_force_wrapping() {
        let v = valon!([[1], 2]);
        assert_eq!(to_string(&v), "[\n  [1],\n  2\n]");

        // Empty nested containers don't.
        let v = valon!([[], {}, 1]);
        assert_eq!(to_string(&v), "[[], {}, 1]");
    }

    #[test]
    fn non_bare_keys_are_quoted() {
        let v = valon!({ "two words": 1, "plain": 2 });
        assert_eq!(to_string(&v), "{\n  plain: 2,\n  \"two words\": 1\n}");
    }

    #[test]
    fn keyword_like_keys_are_quoted() {
        let v = valon!({ "null": 1, "inf": 2, "normal": 3 });
        let text = to_string(&v);

        assert!(text.contains("\"null\": 1"));
        assert!(text.contains("\"inf\": 2"));
        assert!(text.contains("\n  normal: 3"));
        assert_eq!(crate::from_str(&text).unwrap(), v);

        // Extensions of a keyword are still bare.
        assert_eq!(to_string(&valon!({ "nullable": 1 })), "{\n  nullable: 1\n}");
    }

    #[test]
    fn string_escaping() {
        let mut out = String::new();
        append_escaped(&mut out, "a\"b\\c\n\u{1}", true);
        assert_eq!(out, "\"a\\\"b\\\\c\\n\\u0001\"");

        let v = valon!("plain text");
        assert_eq!(write(&v, &WriteOptions::packed()), "\"plain text\"");
    }

    #[test]
    fn double_formatting() {
        let packed = WriteOptions::packed();
        assert_eq!(write(&valon!(2.5), &packed), "2.5");
        assert_eq!(write(&valon!(100.0), &packed), "100");
        assert_eq!(write(&valon!(-0.25), &packed), "-0.25");
        assert_eq!(write(&valon!(1.0 / 3.0), &packed), "0.333333");
        assert_eq!(write(&valon!(1e20), &packed), "1e+20");
        assert_eq!(write(&valon!(1.5e-7), &packed), "1.5e-07");
        assert_eq!(write(&valon!(0.0), &packed), "0");
    }

    #[test]
    fn double_formatting_untrimmed() {
        let options = WriteOptions {
            trim_zeroes: false,
            ..WriteOptions::packed()
        };
        assert_eq!(write(&valon!(2.5), &options), "2.50000");
    }

    #[test]
    fn float_specials_per_style() {
        let js = WriteOptions::packed();
        let c = WriteOptions {
            specials: Specials::CLike,
            ..WriteOptions::packed()
        };
        let null = WriteOptions {
            specials: Specials::Null,
            ..WriteOptions::packed()
        };

        assert_eq!(write(&valon!(f64::INFINITY), &js), "Infinity");
        assert_eq!(write(&valon!(f64::NEG_INFINITY), &js), "-Infinity");
        assert_eq!(write(&valon!(f64::NAN), &js), "NaN");
        assert_eq!(write(&valon!(f64::INFINITY), &c), "inf");
        assert_eq!(write(&valon!(f64::NAN), &c), "nan");
        assert_eq!(write(&valon!(f64::INFINITY), &null), "null");
        assert_eq!(write(&valon!(f64::NAN), &null), "null");
    }

    #[test]
    fn empty_containers() {
        assert_eq!(to_string(&valon!({})), "{}");
        assert_eq!(to_string(&valon!([])), "[]");
        assert_eq!(to_string(&Value::Null), "null");
    }
}
