//! Projection expressions accepted by `fields()`.
//!
//! This is a convenience for trusted, caller-written strings, not a security
//! boundary: only the inner field token is escaped, the function name and the
//! alias are written verbatim after a character-class check.

use crate::error::{SqlError, SqlResult};
use crate::escape::{Escaper, is_plain_word};

/// A parsed projection entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExpression {
    /// `field`
    Plain(String),
    /// `field as alias`
    Aliased { field: String, alias: String },
    /// `fn(field)`
    Call { function: String, arg: String },
    /// `fn(field) as alias`
    CallAliased {
        function: String,
        arg: String,
        alias: String,
    },
}

impl FieldExpression {
    /// Parse a projection string.
    ///
    /// Precedence: `fn(field) as alias`, `field as alias`, `fn(field)`, plain field.
    pub fn parse(input: &str) -> SqlResult<Self> {
        let input = input.trim();
        let (expr, alias) = split_alias(input);

        if let Some(alias) = alias {
            if !is_plain_word(alias) {
                return Err(SqlError::UnsafeIdentifier(alias.to_string()));
            }
        }

        Ok(match (split_call(expr), alias) {
            (Some((function, arg)), Some(alias)) => FieldExpression::CallAliased {
                function: function.to_string(),
                arg: arg.to_string(),
                alias: alias.to_string(),
            },
            (None, Some(alias)) => FieldExpression::Aliased {
                field: expr.to_string(),
                alias: alias.to_string(),
            },
            (Some((function, arg)), None) => FieldExpression::Call {
                function: function.to_string(),
                arg: arg.to_string(),
            },
            (None, None) => FieldExpression::Plain(expr.to_string()),
        })
    }

    /// Parse a bare `fn(arg)` expression, ignoring any other shape.
    pub fn parse_call(input: &str) -> Option<(String, String)> {
        split_call(input.trim()).map(|(f, a)| (f.to_string(), a.to_string()))
    }

    pub fn render(&self, esc: &Escaper) -> SqlResult<String> {
        match self {
            FieldExpression::Plain(field) => esc.identifier(field),
            FieldExpression::Aliased { field, alias } => {
                Ok(format!("{} as {alias}", esc.identifier(field)?))
            }
            FieldExpression::Call { function, arg } => esc.call(function, arg),
            FieldExpression::CallAliased {
                function,
                arg,
                alias,
            } => Ok(format!("{} as {alias}", esc.call(function, arg)?)),
        }
    }
}

/// Split a trailing ` as alias` (case-insensitive keyword).
fn split_alias(input: &str) -> (&str, Option<&str>) {
    // ASCII lowercasing keeps byte offsets stable.
    let lower = input.to_ascii_lowercase();
    match lower.rfind(" as ") {
        Some(idx) => {
            let expr = input[..idx].trim_end();
            let alias = input[idx + 4..].trim();
            if expr.is_empty() || alias.is_empty() {
                (input, None)
            } else {
                (expr, Some(alias))
            }
        }
        None => (input, None),
    }
}

/// Split `name(arg)` where `arg` contains no parentheses.
fn split_call(expr: &str) -> Option<(&str, &str)> {
    let body = expr.strip_suffix(')')?;
    let open = body.find('(')?;
    let name = body[..open].trim_end();
    let arg = &body[open + 1..];
    if !is_plain_word(name) || arg.contains(['(', ')']) {
        return None;
    }
    Some((name, arg.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(s: &str) -> String {
        FieldExpression::parse(s)
            .unwrap()
            .render(&Escaper::default())
            .unwrap()
    }

    #[test]
    fn plain_field() {
        assert_eq!(
            FieldExpression::parse("name").unwrap(),
            FieldExpression::Plain("name".into())
        );
        assert_eq!(render("u.name"), "`u`.`name`");
        assert_eq!(render("*"), "*");
    }

    #[test]
    fn aliased_field() {
        assert_eq!(
            FieldExpression::parse("u.name as author").unwrap(),
            FieldExpression::Aliased {
                field: "u.name".into(),
                alias: "author".into()
            }
        );
        assert_eq!(render("u.name as author"), "`u`.`name` as author");
        assert_eq!(render("name AS n"), "`name` as n");
    }

    #[test]
    fn call() {
        assert_eq!(
            FieldExpression::parse("count(id)").unwrap(),
            FieldExpression::Call {
                function: "count".into(),
                arg: "id".into()
            }
        );
        assert_eq!(render("max(p.price)"), "max(`p`.`price`)");
        assert_eq!(render("count(*)"), "count(*)");
    }

    #[test]
    fn call_aliased_wins_over_alias() {
        assert_eq!(
            FieldExpression::parse("count(id) as result").unwrap(),
            FieldExpression::CallAliased {
                function: "count".into(),
                arg: "id".into(),
                alias: "result".into()
            }
        );
        assert_eq!(render("count(id) as result"), "count(`id`) as result");
    }

    #[test]
    fn unsafe_alias_rejected() {
        assert!(matches!(
            FieldExpression::parse("id as x; drop table t"),
            Err(SqlError::UnsafeIdentifier(_))
        ));
    }

    #[test]
    fn quote_in_field_rejected_at_render() {
        let expr = FieldExpression::parse("na`me").unwrap();
        assert!(expr.render(&Escaper::default()).is_err());
    }

    #[test]
    fn nested_parens_are_not_calls() {
        assert_eq!(
            FieldExpression::parse_call("lower(trim(x))"),
            None
        );
        assert_eq!(
            FieldExpression::parse_call("unix_timestamp(created)"),
            Some(("unix_timestamp".into(), "created".into()))
        );
    }
}
