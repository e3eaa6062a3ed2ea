//! Identifier and literal escaping.
//!
//! Every identifier and value that reaches the rendered SQL goes through an
//! [`Escaper`]. Identifiers are split on `.` and each segment is quoted with
//! the dialect's quoting character; a segment that already contains that
//! character is refused rather than escaped.
//!
//! # Example
//! ```
//! use sqlfold::{Escaper, Value};
//!
//! let esc = Escaper::default();
//! assert_eq!(esc.identifier("users.id")?, "`users`.`id`");
//! assert_eq!(esc.value(&Value::from("O'Hara"))?, r"'O\'Hara'");
//! assert!(esc.identifier("us`ers").is_err());
//! # Ok::<(), sqlfold::SqlError>(())
//! ```

use crate::condition::Operator;
use crate::error::{SqlError, SqlResult};
use crate::value::{Value, describe};

/// How boolean values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolStyle {
    /// MySQL bit literals: `b'0'` / `b'1'`.
    #[default]
    BitLiteral,
    /// Plain integers: `0` / `1`.
    Integer,
}

/// SQL dialect knobs used by the [`Escaper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Identifier quoting character.
    pub quote: char,
    /// Boolean literal style.
    pub bool_style: BoolStyle,
    /// Whether string literals use backslash escapes (MySQL default) or only `''`.
    pub backslash_escapes: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::mysql()
    }
}

impl Dialect {
    /// MySQL / MariaDB defaults.
    pub const fn mysql() -> Self {
        Self {
            quote: '`',
            bool_style: BoolStyle::BitLiteral,
            backslash_escapes: true,
        }
    }

    /// Override the identifier quoting character.
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Override the boolean literal style.
    pub fn with_bool_style(mut self, style: BoolStyle) -> Self {
        self.bool_style = style;
        self
    }

    /// Server runs with `NO_BACKSLASH_ESCAPES`.
    pub fn without_backslash_escapes(mut self) -> Self {
        self.backslash_escapes = false;
        self
    }
}

/// Renders identifiers, values and single conditions as SQL text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Escaper {
    dialect: Dialect,
}

impl Escaper {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Quote a (possibly dotted) identifier.
    ///
    /// `*` segments pass through unquoted.
    pub fn identifier(&self, name: &str) -> SqlResult<String> {
        let mut out = String::with_capacity(name.len() + 4);
        self.write_identifier(name, &mut out)?;
        Ok(out)
    }

    pub(crate) fn write_identifier(&self, name: &str, out: &mut String) -> SqlResult<()> {
        let q = self.dialect.quote;
        for (i, segment) in name.split('.').enumerate() {
            if segment.is_empty() || segment.contains(q) || segment.contains('\0') {
                return Err(SqlError::UnsafeIdentifier(name.to_string()));
            }
            if i > 0 {
                out.push('.');
            }
            if segment == "*" {
                out.push('*');
            } else {
                out.push(q);
                out.push_str(segment);
                out.push(q);
            }
        }
        Ok(())
    }

    /// Quote a table reference with an optional alias: `` `users` `u` ``.
    pub fn table(&self, table: &str, alias: Option<&str>) -> SqlResult<String> {
        let mut out = self.identifier(table)?;
        if let Some(alias) = alias {
            out.push(' ');
            self.write_identifier(alias, &mut out)?;
        }
        Ok(out)
    }

    /// Escape and single-quote a string literal.
    pub fn string_literal(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        if self.dialect.backslash_escapes {
            for ch in s.chars() {
                match ch {
                    '\0' => out.push_str("\\0"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\\' => out.push_str("\\\\"),
                    '\'' => out.push_str("\\'"),
                    '"' => out.push_str("\\\""),
                    '\x1a' => out.push_str("\\Z"),
                    c => out.push(c),
                }
            }
        } else {
            for ch in s.chars() {
                if ch == '\'' {
                    out.push('\'');
                }
                out.push(ch);
            }
        }
        out.push('\'');
        out
    }

    /// Render a scalar value as a SQL literal.
    pub fn value(&self, value: &Value) -> SqlResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(self.bool_literal(*b)),
            Value::Int(v) => Ok(v.to_string()),
            Value::Float(v) => {
                if v.is_finite() {
                    Ok(v.to_string())
                } else {
                    Err(SqlError::unsupported_value(describe(value)))
                }
            }
            Value::Text(s) if s == "NULL" => Ok("NULL".to_string()),
            Value::Text(s) => Ok(self.string_literal(s)),
            Value::List(_) => Err(SqlError::unsupported_value(format!(
                "{} outside of IN / NOT IN",
                describe(value)
            ))),
            Value::RawCall { name, arg_field } => self.call(name, arg_field),
        }
    }

    /// Render `field <op> value`.
    pub fn condition(&self, field: &str, op: Operator, value: &Value) -> SqlResult<String> {
        let mut out = self.identifier(field)?;
        match (op.takes_list(), value) {
            (true, Value::List(items)) if items.is_empty() => {
                // Nothing can be IN an empty set; everything is NOT IN it.
                return Ok(if op == Operator::In { "1=0" } else { "1=1" }.to_string());
            }
            (true, Value::List(items)) => {
                let rendered = items
                    .iter()
                    .map(|v| self.value(v))
                    .collect::<SqlResult<Vec<_>>>()?;
                out.push(' ');
                out.push_str(op.as_str());
                out.push_str(" (");
                out.push_str(&rendered.join(", "));
                out.push(')');
            }
            (true, other) => {
                return Err(SqlError::malformed(format!(
                    "{op} requires a list, got {}",
                    describe(other)
                )));
            }
            (false, Value::List(_)) => {
                return Err(SqlError::malformed(format!(
                    "list value used with {op} on '{field}'"
                )));
            }
            (false, scalar) => {
                out.push(' ');
                out.push_str(op.as_str());
                out.push(' ');
                out.push_str(&self.value(scalar)?);
            }
        }
        Ok(out)
    }

    /// Render `name(arg)`; the argument is an identifier unless it is `*` or numeric.
    pub fn call(&self, name: &str, arg: &str) -> SqlResult<String> {
        if !is_plain_word(name) {
            return Err(SqlError::UnsafeIdentifier(name.to_string()));
        }
        let arg = arg.trim();
        let rendered = if arg.is_empty() || arg == "*" || is_numeric(arg) {
            arg.to_string()
        } else {
            self.identifier(arg)?
        };
        Ok(format!("{name}({rendered})"))
    }

    fn bool_literal(&self, b: bool) -> String {
        let bit = u8::from(b);
        match self.dialect.bool_style {
            BoolStyle::BitLiteral => format!("b'{bit}'"),
            BoolStyle::Integer => bit.to_string(),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_plain_word(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

pub(crate) fn is_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
}
