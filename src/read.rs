//! Lenient JSON reader.
//!
//! The accepted grammar is a superset of strict JSON in the JSON5 direction:
//! `//` and `/* */` comments, trailing commas, bare (unquoted) keys and
//! scalar tokens, and the float specials `NaN`/`Infinity`/`-Infinity` with
//! their lowercase `nan`/`inf` variants. Each leniency can be switched off
//! through [`ReadOptions`].
//!
//! Parsing is a single pass with one-token lookahead and no backtracking.
//! Errors do not abort the parse: each failure is recorded and the parser
//! resynchronizes at the next separator or closing bracket of the enclosing
//! container, so one malformed member costs only itself. The partial tree
//! travels inside [`ParseFailure`] together with every diagnostic.
//!
//! # Examples
//!
//! ```rust
//! let v = valon::from_str(r#"
//!     {
//!         // comments are fine
//!         name: "widget",
//!         sizes: [1, 2, 3,],   // so are trailing commas and bare keys
//!     }
//! "#).unwrap();
//!
//! assert_eq!(v["name"].as_str(""), "widget");
//! assert_eq!(v["sizes"].num_elts(), 3);
//! ```

use crate::error::{ParseError, ParseFailure};
use crate::intern::StringTable;
use crate::map::ValueMap;
use crate::value::Value;

/// Leniency and interning switches for the reader.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Permit a comma before `}` / `]`.
    pub allow_trailing_commas: bool,
    /// Permit bare keys and bare scalar tokens.
    pub allow_unquoted_strings: bool,
    /// Route object keys through the attached [`StringTable`], if any.
    pub intern_keys: bool,
    /// Route string scalars through the attached [`StringTable`], if any.
    pub intern_values: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            allow_trailing_commas: true,
            allow_unquoted_strings: true,
            intern_keys: true,
            intern_values: true,
        }
    }
}

impl ReadOptions {
    /// Strict-JSON profile: no trailing commas, no bare tokens.
    #[must_use]
    pub fn strict() -> Self {
        ReadOptions {
            allow_trailing_commas: false,
            allow_unquoted_strings: false,
            ..ReadOptions::default()
        }
    }
}

/// A configured parser, optionally sharing a [`StringTable`].
///
/// A `Reader` is reusable: each [`Reader::read`] call parses one complete
/// document.
#[derive(Debug, Default)]
pub struct Reader<'st> {
    options: ReadOptions,
    table: Option<&'st mut StringTable>,
}

impl<'st> Reader<'st> {
    /// A reader with the default lenient options.
    #[must_use]
    pub fn new() -> Self {
        Reader::default()
    }

    /// A reader with the given options.
    #[must_use]
    pub fn with_options(options: ReadOptions) -> Self {
        Reader {
            options,
            table: None,
        }
    }

    /// Attaches an interning pool for keys and string values, per the
    /// `intern_*` options.
    #[must_use]
    pub fn table(mut self, table: &'st mut StringTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Parses one document. On failure the partial tree and all recorded
    /// diagnostics are returned together.
    ///
    /// Anything other than trailing whitespace after the value is an error.
    pub fn read(&mut self, text: &str) -> Result<Value, ParseFailure> {
        let mut parser = Parser {
            text,
            src: text.as_bytes(),
            pos: 0,
            options: &self.options,
            table: self.table.as_deref_mut(),
            errors: Vec::new(),
        };

        let token = parser.next_meaningful_token();
        let root = parser.parse_value(token).unwrap_or(Value::Null);

        parser.skip_spaces();
        if parser.errors.is_empty() && parser.pos != parser.src.len() {
            let at = parser.pos;
            parser.add_error("trailing text after value", at..parser.src.len(), None);
        }

        if parser.errors.is_empty() {
            Ok(root)
        } else {
            Err(ParseFailure {
                value: root,
                errors: parser.errors,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
    Str,
    Number,
    True,
    False,
    Null,
    NaN,
    Infinity,
    MinusInfinity,
    Comma,
    Colon,
    Comment,
    EndOfStream,
    Error,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

// Bare tokens deliberately admit `.-+=` so dates, versions, and simple
// expressions read as single strings; structural chars are excluded. The
// writer uses the same predicates to decide whether a key can go unquoted.
pub(crate) fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'@' | b'.' | b'-' | b'+' | b'=')
}

pub(crate) fn is_start_token_char(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'@'
}

struct Parser<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    options: &'a ReadOptions,
    table: Option<&'a mut StringTable>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn skip_spaces(&mut self) {
        while let Some(&b) = self.src.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\r' | b'\n') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let b = self.src.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn next_token(&mut self) -> Token {
        self.skip_spaces();
        let start = self.pos;

        let kind = match self.next_byte() {
            None => TokenKind::EndOfStream,
            Some(b'{') => TokenKind::ObjectBegin,
            Some(b'}') => TokenKind::ObjectEnd,
            Some(b'[') => TokenKind::ArrayBegin,
            Some(b']') => TokenKind::ArrayEnd,
            Some(b',') => TokenKind::Comma,
            Some(b':') => TokenKind::Colon,
            Some(b'"') => {
                if self.scan_string() {
                    TokenKind::Str
                } else {
                    TokenKind::Error
                }
            }
            Some(b'/') => {
                if self.scan_comment() {
                    TokenKind::Comment
                } else {
                    TokenKind::Error
                }
            }
            Some(b'-') => {
                if self.match_literal(b"Infinity") || self.match_literal(b"inf") {
                    TokenKind::MinusInfinity
                } else {
                    self.scan_number();
                    TokenKind::Number
                }
            }
            Some(b'0'..=b'9' | b'+') => {
                self.scan_number();
                TokenKind::Number
            }
            Some(b'I') => self.literal_or_bare(b"nfinity", TokenKind::Infinity),
            Some(b'i') => self.literal_or_bare(b"nf", TokenKind::Infinity),
            Some(b'N') => self.literal_or_bare(b"aN", TokenKind::NaN),
            Some(b't') => self.literal_or_bare(b"rue", TokenKind::True),
            Some(b'f') => self.literal_or_bare(b"alse", TokenKind::False),
            Some(b'n') => {
                if self.match_literal(b"ull") {
                    TokenKind::Null
                } else if self.match_literal(b"an") {
                    TokenKind::NaN
                } else {
                    self.bare_or_error()
                }
            }
            Some(b) if is_start_token_char(b) => self.bare_or_error(),
            Some(_) => TokenKind::Error,
        };

        Token {
            kind,
            start,
            end: self.pos,
        }
    }

    fn next_meaningful_token(&mut self) -> Token {
        loop {
            let token = self.next_token();
            if token.kind != TokenKind::Comment {
                return token;
            }
        }
    }

    /// Matches `pattern` at the cursor only when not followed by more bare
    /// token text, so `nullx` lexes as one bare token rather than `null`+`x`.
    fn match_literal(&mut self, pattern: &[u8]) -> bool {
        let end = self.pos + pattern.len();
        if !self.src[self.pos..].starts_with(pattern) {
            return false;
        }
        if self.src.get(end).is_some_and(|&b| is_token_char(b)) {
            return false;
        }
        self.pos = end;
        true
    }

    fn literal_or_bare(&mut self, rest: &[u8], kind: TokenKind) -> TokenKind {
        if self.match_literal(rest) {
            kind
        } else {
            self.bare_or_error()
        }
    }

    fn bare_or_error(&mut self) -> TokenKind {
        if !self.options.allow_unquoted_strings {
            return TokenKind::Error;
        }
        while self.src.get(self.pos).is_some_and(|&b| is_token_char(b)) {
            self.pos += 1;
        }
        TokenKind::Str
    }

    /// Raw scan over a quoted string; escape decoding happens later.
    fn scan_string(&mut self) -> bool {
        loop {
            match self.next_byte() {
                None => return false,
                Some(b'\\') => {
                    self.next_byte();
                }
                Some(b'"') => return true,
                Some(_) => {}
            }
        }
    }

    fn scan_comment(&mut self) -> bool {
        match self.next_byte() {
            Some(b'/') => {
                while let Some(b) = self.next_byte() {
                    if b == b'\r' || b == b'\n' {
                        break;
                    }
                }
                true
            }
            Some(b'*') => {
                while let Some(b) = self.next_byte() {
                    if b == b'*' && self.src.get(self.pos) == Some(&b'/') {
                        self.pos += 1;
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn scan_number(&mut self) {
        while self
            .src
            .get(self.pos)
            .is_some_and(|&b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
        {
            self.pos += 1;
        }
    }

    // --- Parsing ----------------------------------------------------------

    /// `None` means an error was recorded; the caller resynchronizes.
    fn parse_value(&mut self, token: Token) -> Option<Value> {
        match token.kind {
            TokenKind::ObjectBegin => Some(self.parse_object()),
            TokenKind::ArrayBegin => Some(self.parse_array()),
            TokenKind::Number => self.decode_number(&token),
            TokenKind::Str => self.decode_string_value(&token),
            TokenKind::True => Some(Value::Bool(true)),
            TokenKind::False => Some(Value::Bool(false)),
            TokenKind::Null => Some(Value::Null),
            TokenKind::NaN => Some(Value::Double(f64::NAN)),
            TokenKind::Infinity => Some(Value::Double(f64::INFINITY)),
            TokenKind::MinusInfinity => Some(Value::Double(f64::NEG_INFINITY)),
            _ => {
                self.add_token_error("expected a value, object or array", &token);
                None
            }
        }
    }

    fn parse_object(&mut self) -> Value {
        let mut map = ValueMap::new();
        let mut first = true;

        loop {
            let name_token = self.next_meaningful_token();

            if name_token.kind == TokenKind::ObjectEnd
                && (first || self.options.allow_trailing_commas)
            {
                break;
            }
            if name_token.kind == TokenKind::EndOfStream {
                self.add_token_error("unterminated object", &name_token);
                break;
            }
            if name_token.kind != TokenKind::Str {
                self.add_token_error("object member name is not a string", &name_token);
                if self.recover_to_separator() {
                    first = false;
                    continue;
                }
                break;
            }

            let Some(name) = self.decode_string(&name_token) else {
                if self.recover_to_separator() {
                    first = false;
                    continue;
                }
                break;
            };

            let colon = self.next_meaningful_token();
            if colon.kind != TokenKind::Colon {
                self.add_token_error("missing ':' after object member name", &colon);
                if self.recover_to_separator() {
                    first = false;
                    continue;
                }
                break;
            }

            let value_token = self.next_meaningful_token();
            let Some(value) = self.parse_value(value_token) else {
                // The bad token may itself have been the separator.
                match value_token.kind {
                    TokenKind::Comma => {
                        first = false;
                        continue;
                    }
                    TokenKind::ObjectEnd => break,
                    _ => {
                        if self.recover_to_separator() {
                            first = false;
                            continue;
                        }
                        break;
                    }
                }
            };

            // Find-or-insert, so a repeated key's last occurrence wins.
            match (self.options.intern_keys, self.table.as_deref_mut()) {
                (true, Some(table)) => *map.update_interned(table.intern(&name)) = value,
                _ => map.insert(&name, value),
            }

            let separator = self.next_meaningful_token();
            match separator.kind {
                TokenKind::ObjectEnd => break,
                TokenKind::Comma => first = false,
                _ => {
                    self.add_token_error("missing ',' or '}' in object", &separator);
                    if self.recover_to_separator() {
                        first = false;
                        continue;
                    }
                    break;
                }
            }
        }

        Value::from(map)
    }

    fn parse_array(&mut self) -> Value {
        // Elements stage in a Vec and commit as one fixed-length payload.
        let mut elts: Vec<Value> = Vec::new();

        loop {
            let token = self.next_meaningful_token();

            if token.kind == TokenKind::ArrayEnd
                && (elts.is_empty() || self.options.allow_trailing_commas)
            {
                break;
            }
            if token.kind == TokenKind::EndOfStream {
                self.add_token_error("unterminated array", &token);
                break;
            }

            let Some(value) = self.parse_value(token) else {
                match token.kind {
                    TokenKind::Comma => continue,
                    TokenKind::ArrayEnd => break,
                    _ => {
                        if self.recover_to_separator() {
                            continue;
                        }
                        break;
                    }
                }
            };
            elts.push(value);

            let separator = self.next_meaningful_token();
            match separator.kind {
                TokenKind::ArrayEnd => break,
                TokenKind::Comma => {}
                TokenKind::EndOfStream => {
                    self.add_token_error("unterminated array", &separator);
                    break;
                }
                _ => {
                    self.add_token_error("expected ',' in array", &separator);
                    if !self.recover_to_separator() {
                        break;
                    }
                }
            }
        }

        Value::from(elts)
    }

    /// Skips forward after an error. Returns `true` on reaching a `,` at the
    /// current nesting depth (parsing of the container continues) and `false`
    /// on its closing bracket or end of input. Errors that would be recorded
    /// while skipping are discarded.
    fn recover_to_separator(&mut self) -> bool {
        let recorded = self.errors.len();
        let mut depth = 0usize;

        let resume = loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::ObjectBegin | TokenKind::ArrayBegin => depth += 1,
                TokenKind::ObjectEnd | TokenKind::ArrayEnd if depth > 0 => depth -= 1,
                TokenKind::ObjectEnd | TokenKind::ArrayEnd => break false,
                TokenKind::Comma if depth == 0 => break true,
                TokenKind::EndOfStream => break false,
                _ => {}
            }
        };

        self.errors.truncate(recorded);
        resume
    }

    // --- Token decoding ---------------------------------------------------

    /// Exact narrowing rule: integer path with per-digit overflow detection
    /// falling back to float, then the narrowest representable type.
    fn decode_number(&mut self, token: &Token) -> Option<Value> {
        let bytes = &self.src[token.start..token.end];

        let float = bytes
            .iter()
            .enumerate()
            .any(|(i, &b)| matches!(b, b'.' | b'e' | b'E' | b'+') || (b == b'-' && i != 0));
        if float {
            return self.decode_double(token);
        }

        let mut negative = false;
        let mut digits = 0;
        while digits < bytes.len() && matches!(bytes[digits], b'-' | b'+') {
            if bytes[digits] == b'-' {
                negative = !negative;
            }
            digits += 1;
        }

        let mut value: u64 = 0;
        let mut saw_digit = false;
        for &b in &bytes[digits..] {
            if !b.is_ascii_digit() {
                return self.not_a_number(token);
            }
            saw_digit = true;
            match value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(b - b'0')))
            {
                Some(v) => value = v,
                None => return self.decode_double(token),
            }
        }
        if !saw_digit {
            return self.not_a_number(token);
        }

        Some(if negative {
            if value <= 1 << 31 {
                Value::Int((value as i32).wrapping_neg())
            } else if value <= 1 << 63 {
                Value::Int64((value as i64).wrapping_neg())
            } else {
                Value::Double(-(value as f64))
            }
        } else if value <= i32::MAX as u64 {
            Value::Int(value as i32)
        } else if value <= u64::from(u32::MAX) {
            Value::UInt(value as u32)
        } else if value <= i64::MAX as u64 {
            Value::Int64(value as i64)
        } else {
            Value::UInt64(value)
        })
    }

    fn decode_double(&mut self, token: &Token) -> Option<Value> {
        match self.text[token.start..token.end].parse::<f64>() {
            Ok(value) => Some(Value::Double(value)),
            Err(_) => self.not_a_number(token),
        }
    }

    fn not_a_number(&mut self, token: &Token) -> Option<Value> {
        let message = format!("'{}' is not a number", &self.text[token.start..token.end]);
        self.add_error(&message, token.start..token.end, None);
        None
    }

    fn decode_string_value(&mut self, token: &Token) -> Option<Value> {
        let decoded = self.decode_string(token)?;
        Some(match (self.options.intern_values, self.table.as_deref_mut()) {
            (true, Some(table)) => Value::String(table.intern(&decoded)),
            _ => Value::from(decoded),
        })
    }

    /// Decodes a quoted or bare string token, processing escapes. `\uXXXX`
    /// covers the basic multilingual plane only; an unpaired surrogate
    /// becomes U+FFFD.
    fn decode_string(&mut self, token: &Token) -> Option<String> {
        let quoted = self.src[token.start] == b'"';
        let (content_start, content_end) = if quoted {
            (token.start + 1, token.end - 1)
        } else {
            (token.start, token.end)
        };

        let content = &self.text[content_start..content_end];
        let mut decoded = String::with_capacity(content.len());
        let mut chars = content.char_indices();

        while let Some((offset, c)) = chars.next() {
            if c != '\\' {
                decoded.push(c);
                continue;
            }

            let at = content_start + offset;
            let Some((_, escape)) = chars.next() else {
                return self.fail_at(token, at, "empty escape sequence in string");
            };

            match escape {
                '"' => decoded.push('"'),
                '/' => decoded.push('/'),
                '\\' => decoded.push('\\'),
                'b' => decoded.push('\u{0008}'),
                'f' => decoded.push('\u{000C}'),
                'n' => decoded.push('\n'),
                'r' => decoded.push('\r'),
                't' => decoded.push('\t'),
                'u' => {
                    let mut code: u32 = 0;
                    for _ in 0..4 {
                        let Some(digit) = chars.next().and_then(|(_, hex)| hex.to_digit(16))
                        else {
                            return self.fail_at(
                                token,
                                at,
                                "unicode escape needs four hex digits",
                            );
                        };
                        code = code << 4 | digit;
                    }
                    decoded.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
                _ => return self.fail_at(token, at, "bad escape sequence in string"),
            }
        }

        Some(decoded)
    }

    // --- Diagnostics ------------------------------------------------------

    fn line_and_column(&self, location: usize) -> (usize, usize) {
        let mut line = 1;
        let mut line_start = 0;
        let mut i = 0;

        while i < location && i < self.src.len() {
            let b = self.src[i];
            i += 1;
            if b == b'\r' {
                if self.src.get(i) == Some(&b'\n') {
                    i += 1;
                }
                line_start = i;
                line += 1;
            } else if b == b'\n' {
                line_start = i;
                line += 1;
            }
        }

        (line, location - line_start + 1)
    }

    fn add_error(&mut self, message: &str, span: std::ops::Range<usize>, extra: Option<usize>) {
        let (line, column) = self.line_and_column(span.start);
        self.errors.push(ParseError {
            message: message.to_string(),
            line,
            column,
            span,
            extra: extra.map(|at| self.line_and_column(at)),
        });
    }

    fn add_token_error(&mut self, message: &str, token: &Token) {
        self.add_error(message, token.start..token.end, None);
    }

    fn fail_at<T>(&mut self, token: &Token, at: usize, message: &str) -> Option<T> {
        self.add_error(message, token.start..token.end, Some(at));
        None
    }
}
