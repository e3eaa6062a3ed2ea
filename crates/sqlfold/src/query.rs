//! Hand-written SQL with named parameters.

use crate::builder::StatementKind;
use crate::client::Driver;
use crate::database::Database;
use crate::error::SqlResult;
use crate::escape::Escaper;
use crate::monitor::QueryContext;
use crate::result::ExecutionResult;
use crate::value::Value;
use std::fmt;

/// A single SQL statement ready to run.
///
/// Named parameters are substituted with escaped literals when the query runs,
/// using the connection's dialect. Keys are matched verbatim (include the `:`)
/// and the longest key wins, so `:id` never clobbers `:id2`.
///
/// ```
/// use sqlfold::{Escaper, query};
///
/// let sql = query("SELECT * FROM `user` WHERE `id` = :id AND `name` = :name")
///     .bind(":id", 7)
///     .bind(":name", "O'Hara")
///     .render(&Escaper::default())?;
/// assert_eq!(sql, r"SELECT * FROM `user` WHERE `id` = 7 AND `name` = 'O\'Hara'");
/// # Ok::<(), sqlfold::SqlError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    kind: Option<StatementKind>,
    params: Vec<(String, Value)>,
    tag: Option<String>,
}

/// Create a query from raw SQL.
pub fn query(sql: impl Into<String>) -> Query {
    Query::new(sql)
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self {
            kind: StatementKind::detect(&sql),
            sql,
            params: Vec::new(),
            tag: None,
        }
    }

    pub(crate) fn from_builder(sql: String, kind: StatementKind, tag: Option<String>) -> Self {
        Self {
            sql,
            kind: Some(kind),
            params: Vec::new(),
            tag,
        }
    }

    /// Name this query for hooks and monitors (`QueryContext::tag`).
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Substitute `params` into `sql` right away.
    pub fn with_params<K: AsRef<str>>(
        esc: &Escaper,
        sql: &str,
        params: &[(K, Value)],
    ) -> SqlResult<Self> {
        let bound = params
            .iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.clone()))
            .collect::<Vec<_>>();
        Ok(Self::new(substitute(esc, sql, &bound)?))
    }

    /// Bind a named parameter.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// SQL text as written, before parameter substitution.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn kind(&self) -> Option<StatementKind> {
        self.kind
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// SQL text with bound parameters substituted.
    pub fn render(&self, esc: &Escaper) -> SqlResult<String> {
        if self.params.is_empty() {
            return Ok(self.sql.clone());
        }
        substitute(esc, &self.sql, &self.params)
    }

    /// Send the statement to `db`.
    pub fn run<D: Driver>(&self, db: &mut Database<D>) -> SqlResult<ExecutionResult> {
        let mut ctx = QueryContext::new(&self.render(db.escaper())?);
        if let Some(kind) = self.kind {
            ctx = ctx.with_kind(kind);
        }
        if let Some(tag) = &self.tag {
            ctx = ctx.with_tag(tag.clone());
        }
        db.execute(ctx)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Single left-to-right pass; substituted text is never rescanned.
fn substitute(esc: &Escaper, sql: &str, params: &[(String, Value)]) -> SqlResult<String> {
    let mut keys = params
        .iter()
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| Ok((k.as_str(), esc.value(v)?)))
        .collect::<SqlResult<Vec<_>>>()?;
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    'scan: while let Some(ch) = rest.chars().next() {
        for (key, literal) in &keys {
            if let Some(after) = rest.strip_prefix(key) {
                out.push_str(literal);
                rest = after;
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    Ok(out)
}
