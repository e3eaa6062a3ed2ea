use crate::condition::{ConditionTree, Operator};
use crate::error::SqlResult;
use crate::escape::Escaper;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// `<kind> JOIN table [alias] ON left <op> right [AND (extra conditions)]`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub left_field: String,
    pub operator: Operator,
    pub right_field: String,
    pub conditions: ConditionTree,
}

impl JoinClause {
    pub fn new(
        kind: JoinKind,
        table: &str,
        alias: Option<&str>,
        left_field: &str,
        operator: &str,
        right_field: &str,
    ) -> SqlResult<Self> {
        Ok(Self {
            kind,
            table: table.to_string(),
            alias: alias.map(str::to_string),
            left_field: left_field.to_string(),
            operator: Operator::parse(operator)?,
            right_field: right_field.to_string(),
            conditions: ConditionTree::new(),
        })
    }

    pub fn render(&self, esc: &Escaper) -> SqlResult<String> {
        let mut sql = format!(
            "{} {} ON {} {} {}",
            self.kind.as_str(),
            esc.table(&self.table, self.alias.as_deref())?,
            esc.identifier(&self.left_field)?,
            self.operator,
            esc.identifier(&self.right_field)?,
        );
        if let Some(extra) = self.conditions.render(esc)? {
            sql.push_str(" AND (");
            sql.push_str(&extra);
            sql.push(')');
        }
        Ok(sql)
    }
}
