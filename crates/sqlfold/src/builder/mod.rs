//! Statement builder.
//!
//! One [`StatementBuilder`] type covers SELECT, UPDATE, INSERT and DELETE. The
//! statement kind is fixed at creation and every fluent call is checked
//! against it centrally (see [`StatementKind::allows`]).
//!
//! ## Design
//!
//! - Values are escaped inline; there are no placeholders.
//! - Safe defaults: UPDATE/DELETE require a WHERE clause unless `force()` was
//!   called; UPDATE requires at least one SET.
//! - Fluent calls never panic. The first error is recorded and returned by
//!   `build()`, `to_sql()` or `run()`, so an invalid builder never produces SQL.

mod join;
mod render;

pub use join::{JoinClause, JoinKind};

use crate::condition::{ConditionLeaf, ConditionTree, Operator};
use crate::database::Database;
use crate::client::Driver;
use crate::error::{SqlError, SqlResult};
use crate::escape::Escaper;
use crate::field::FieldExpression;
use crate::normalize::normalize;
use crate::query::Query;
use crate::result::ExecutionResult;
use crate::value::Value;
use render::Mode;
use std::fmt;
use std::str::FromStr;

/// Which SQL operation a builder renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Update,
    Insert,
    Delete,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Update => "UPDATE",
            StatementKind::Insert => "INSERT",
            StatementKind::Delete => "DELETE",
        }
    }

    /// Whether `method` may be called on a builder of this kind.
    pub fn allows(&self, method: Method) -> bool {
        use StatementKind::*;

        match method {
            Method::Table => true,
            Method::ExtraTable => matches!(self, Select),
            Method::Fields
            | Method::Join
            | Method::JoinCondition
            | Method::Order
            | Method::Group => matches!(self, Select),
            Method::Set => matches!(self, Update | Insert),
            Method::Condition | Method::Limit => matches!(self, Select | Update | Delete),
            Method::Force => matches!(self, Update | Delete),
        }
    }

    /// Detect the statement kind from the leading keyword of raw SQL.
    pub fn detect(sql: &str) -> Option<Self> {
        let keyword = sql.split_whitespace().next()?;
        [Self::Select, Self::Update, Self::Insert, Self::Delete]
            .into_iter()
            .find(|kind| keyword.eq_ignore_ascii_case(kind.as_str()))
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder operations subject to the per-kind legality table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Table,
    /// A second (or later) table.
    ExtraTable,
    Fields,
    Set,
    Condition,
    Join,
    JoinCondition,
    Order,
    Group,
    Limit,
    Force,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Table => "table()",
            Method::ExtraTable => "multiple table selection",
            Method::Fields => "fields()",
            Method::Set => "set()",
            Method::Condition => "condition()",
            Method::Join => "join()",
            Method::JoinCondition => "join_condition()",
            Method::Order => "order()",
            Method::Group => "group()",
            Method::Limit => "limit()",
            Method::Force => "force()",
        })
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl FromStr for Order {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            other => Err(SqlError::UnrecognizedOrder(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableRef {
    name: String,
    alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Limit {
    Count(u64),
    Range { offset: u64, count: u64 },
}

/// Fluent builder for a single statement.
///
/// # Example
/// ```
/// use sqlfold::{Order, select};
///
/// let sql = select("post")
///     .fields(["id", "title", "count(c.id) as comments"])
///     .left_join("comment", "c", "c.post_id", "=", "post.id")
///     .condition("post.published", "=", true)
///     .group("post.id")
///     .order("post.id", Order::Desc)
///     .limit(10)
///     .build_sql()?;
///
/// assert_eq!(
///     sql,
///     "SELECT `id`, `title`, count(`c`.`id`) as comments FROM `post` \
///      LEFT JOIN `comment` `c` ON `c`.`post_id` = `post`.`id` \
///      WHERE (`post`.`published` = b'1') GROUP BY `post`.`id` \
///      ORDER BY `post`.`id` DESC LIMIT 10"
/// );
/// # Ok::<(), sqlfold::SqlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    kind: StatementKind,
    escaper: Escaper,
    tables: Vec<TableRef>,
    fields: Vec<FieldExpression>,
    assignments: Vec<(String, Value)>,
    conditions: ConditionTree,
    joins: Vec<JoinClause>,
    order: Vec<(String, Order)>,
    group: Vec<String>,
    limit: Option<Limit>,
    forced: bool,
    tag: Option<String>,
    build_error: Option<SqlError>,
}

impl StatementBuilder {
    /// Create a builder for `kind` on `table`.
    pub fn new(kind: StatementKind, escaper: Escaper, table: &str, alias: Option<&str>) -> Self {
        let builder = Self {
            kind,
            escaper,
            tables: Vec::new(),
            fields: Vec::new(),
            assignments: Vec::new(),
            conditions: ConditionTree::new(),
            joins: Vec::new(),
            order: Vec::new(),
            group: Vec::new(),
            limit: None,
            forced: false,
            tag: None,
            build_error: None,
        };
        builder.push_table(table, alias)
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Name the statement for hooks and monitors. Legal on every kind.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The first error recorded by a fluent call, if any.
    pub fn error(&self) -> Option<&SqlError> {
        self.build_error.as_ref()
    }

    /// Run `f` if no error has been recorded yet and `method` is legal for this kind.
    fn apply(mut self, method: Method, f: impl FnOnce(&mut Self) -> SqlResult<()>) -> Self {
        if self.build_error.is_some() {
            return self;
        }
        let result = if self.kind.allows(method) {
            f(&mut self)
        } else {
            Err(SqlError::UnsupportedOperation {
                method,
                kind: self.kind,
            })
        };
        if let Err(err) = result {
            self.build_error = Some(err);
        }
        self
    }

    fn push_table(self, table: &str, alias: Option<&str>) -> Self {
        let method = if self.tables.is_empty() {
            Method::Table
        } else {
            Method::ExtraTable
        };
        self.apply(method, |b| {
            b.escaper.table(table, alias)?;
            b.tables.push(TableRef {
                name: table.to_string(),
                alias: alias.map(str::to_string),
            });
            Ok(())
        })
    }

    // ==================== Tables & projection ====================

    /// Add a table to the FROM list (SELECT only once one table is present).
    pub fn table(self, table: &str) -> Self {
        self.push_table(table, None)
    }

    /// Add an aliased table.
    pub fn table_as(self, table: &str, alias: &str) -> Self {
        self.push_table(table, Some(alias))
    }

    /// Add one projection (`field`, `field as alias`, `fn(field)`, `fn(field) as alias`).
    pub fn field(self, field: &str) -> Self {
        self.apply(Method::Fields, |b| {
            let expr = FieldExpression::parse(field)?;
            expr.render(&b.escaper)?;
            b.fields.push(expr);
            Ok(())
        })
    }

    /// Add several projections.
    pub fn fields<I>(self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        fields
            .into_iter()
            .fold(self, |b, field| b.field(field.as_ref()))
    }

    // ==================== Assignments ====================

    /// `SET field = value` (UPDATE / INSERT).
    pub fn set(self, field: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.apply(Method::Set, |b| {
            b.escaper.identifier(field)?;
            b.escaper.value(&value)?;
            b.assignments.push((field.to_string(), value));
            Ok(())
        })
    }

    /// `SET field = fn(arg)` from a call expression such as `"unix_timestamp(created)"`.
    pub fn set_expr(self, field: &str, expr: &str) -> Self {
        match FieldExpression::parse_call(expr) {
            Some((name, arg)) => self.set(field, Value::RawCall {
                name,
                arg_field: arg,
            }),
            None => self.apply(Method::Set, |_| {
                Err(SqlError::unsupported_value(format!(
                    "'{expr}' is not a function call"
                )))
            }),
        }
    }

    // ==================== Conditions ====================

    /// AND a `field <op> value` leaf into the current condition group.
    pub fn condition(self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.apply(Method::Condition, |b| {
            let leaf = ConditionLeaf::new(field, Operator::parse(operator)?, value);
            leaf.render(&b.escaper)?;
            b.conditions.push(leaf);
            Ok(())
        })
    }

    /// Start a new OR group.
    pub fn or(self) -> Self {
        self.apply(Method::Condition, |b| {
            b.conditions.or();
            Ok(())
        })
    }

    /// Add conditions from loosely typed filter input (see [`crate::normalize`]).
    pub fn conditions(self, filter: &serde_json::Value) -> Self {
        self.apply(Method::Condition, |b| {
            let tree = normalize(filter)?;
            tree.render(&b.escaper)?;
            b.conditions.append(tree);
            Ok(())
        })
    }

    /// Add an already normalized condition tree.
    pub fn condition_tree(self, tree: ConditionTree) -> Self {
        self.apply(Method::Condition, |b| {
            tree.render(&b.escaper)?;
            b.conditions.append(tree);
            Ok(())
        })
    }

    // ==================== Joins ====================

    /// Add a join: `<kind> JOIN table [alias] ON left <op> right`.
    pub fn join<'a>(
        self,
        kind: JoinKind,
        table: &str,
        alias: impl Into<Option<&'a str>>,
        left_field: &str,
        operator: &str,
        right_field: &str,
    ) -> Self {
        let alias = alias.into();
        self.apply(Method::Join, |b| {
            let join = JoinClause::new(kind, table, alias, left_field, operator, right_field)?;
            join.render(&b.escaper)?;
            b.joins.push(join);
            Ok(())
        })
    }

    pub fn inner_join<'a>(
        self,
        table: &str,
        alias: impl Into<Option<&'a str>>,
        left_field: &str,
        operator: &str,
        right_field: &str,
    ) -> Self {
        self.join(JoinKind::Inner, table, alias, left_field, operator, right_field)
    }

    pub fn left_join<'a>(
        self,
        table: &str,
        alias: impl Into<Option<&'a str>>,
        left_field: &str,
        operator: &str,
        right_field: &str,
    ) -> Self {
        self.join(JoinKind::Left, table, alias, left_field, operator, right_field)
    }

    pub fn right_join<'a>(
        self,
        table: &str,
        alias: impl Into<Option<&'a str>>,
        left_field: &str,
        operator: &str,
        right_field: &str,
    ) -> Self {
        self.join(JoinKind::Right, table, alias, left_field, operator, right_field)
    }

    fn last_join(&mut self) -> SqlResult<&mut JoinClause> {
        self.joins.last_mut().ok_or(SqlError::NoActiveJoin)
    }

    /// AND a leaf into the most recent join's ON clause.
    pub fn join_condition(self, field: &str, operator: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.apply(Method::JoinCondition, |b| {
            let leaf = ConditionLeaf::new(field, Operator::parse(operator)?, value);
            leaf.render(&b.escaper)?;
            b.last_join()?.conditions.push(leaf);
            Ok(())
        })
    }

    /// Start a new OR group in the most recent join's extra conditions.
    pub fn or_in_join(self) -> Self {
        self.apply(Method::JoinCondition, |b| {
            b.last_join()?.conditions.or();
            Ok(())
        })
    }

    /// Add filter input to the most recent join's extra conditions.
    pub fn join_conditions(self, filter: &serde_json::Value) -> Self {
        self.apply(Method::JoinCondition, |b| {
            let tree = normalize(filter)?;
            tree.render(&b.escaper)?;
            b.last_join()?.conditions.append(tree);
            Ok(())
        })
    }

    // ==================== Ordering, grouping, limits ====================

    pub fn order(self, field: &str, order: Order) -> Self {
        self.apply(Method::Order, |b| {
            b.escaper.identifier(field)?;
            b.order.push((field.to_string(), order));
            Ok(())
        })
    }

    pub fn group(self, field: &str) -> Self {
        self.apply(Method::Group, |b| {
            b.escaper.identifier(field)?;
            b.group.push(field.to_string());
            Ok(())
        })
    }

    pub fn group_by<I>(self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        fields
            .into_iter()
            .fold(self, |b, field| b.group(field.as_ref()))
    }

    /// `LIMIT count`
    pub fn limit(self, count: u64) -> Self {
        self.apply(Method::Limit, |b| {
            b.limit = Some(Limit::Count(count));
            Ok(())
        })
    }

    /// `LIMIT offset, count`
    pub fn limit_offset(self, offset: u64, count: u64) -> Self {
        self.apply(Method::Limit, |b| {
            b.limit = Some(Limit::Range { offset, count });
            Ok(())
        })
    }

    /// Allow UPDATE/DELETE without a WHERE clause.
    pub fn force(self) -> Self {
        self.apply(Method::Force, |b| {
            b.forced = true;
            Ok(())
        })
    }

    // ==================== Rendering & execution ====================

    /// Strict render: a SELECT without fields fails with [`SqlError::EmptyProjection`].
    pub fn build(&self) -> SqlResult<Query> {
        let sql = self.render(Mode::Strict)?;
        Ok(Query::from_builder(sql, self.kind, self.tag.clone()))
    }

    /// Strict render, returning the SQL text.
    pub fn build_sql(&self) -> SqlResult<String> {
        self.render(Mode::Strict)
    }

    /// Permissive render: a SELECT without fields selects `*`.
    pub fn to_sql(&self) -> SqlResult<String> {
        self.render(Mode::Permissive)
    }

    /// `build()` then run against `db`.
    pub fn run<D: Driver>(&self, db: &mut Database<D>) -> SqlResult<ExecutionResult> {
        self.build()?.run(db)
    }
}
