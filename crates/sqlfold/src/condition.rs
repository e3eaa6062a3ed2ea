//! Condition trees for WHERE and JOIN clauses.
//!
//! A [`ConditionTree`] is always stored in its canonical shape: an ordered list
//! of OR-groups, each an ordered list of AND-ed [`ConditionLeaf`]s. It renders
//! as `(a AND b) OR (c)`.

use crate::error::{SqlError, SqlResult};
use crate::escape::Escaper;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `<>`
    NotEq,
    /// `!=`
    Ne,
    /// `IN (list)`
    In,
    /// `NOT IN (list)`
    NotIn,
    Like,
    Is,
    IsNot,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::NotEq,
        Operator::Ne,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::Is,
        Operator::IsNot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::NotEq => "<>",
            Operator::Ne => "!=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Like => "LIKE",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        }
    }

    /// `IN` and `NOT IN` take a list on the right-hand side.
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Parse an operator token. Tokens must match exactly (`NOT IN`, not `not in`).
    pub fn parse(token: &str) -> SqlResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| SqlError::UnrecognizedOperator(token.to_string()))
    }
}

impl FromStr for Operator {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        Operator::parse(s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field <op> value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionLeaf {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl ConditionLeaf {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build a leaf from an operator token, failing on unknown operators.
    pub fn parse(field: impl Into<String>, operator: &str, value: impl Into<Value>) -> SqlResult<Self> {
        Ok(Self::new(field, Operator::parse(operator)?, value))
    }

    pub fn render(&self, esc: &Escaper) -> SqlResult<String> {
        esc.condition(&self.field, self.operator, &self.value)
    }
}

/// OR-of-AND-groups predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
    groups: Vec<Vec<ConditionLeaf>>,
}

impl ConditionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from canonical groups. Empty groups are dropped.
    pub fn from_groups(groups: Vec<Vec<ConditionLeaf>>) -> Self {
        Self {
            groups: groups.into_iter().filter(|g| !g.is_empty()).collect(),
        }
    }

    /// True when no leaf has been added.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Vec::is_empty)
    }

    /// Non-empty groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = &[ConditionLeaf]> {
        self.groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(Vec::as_slice)
    }

    /// Append a leaf to the current (last) group.
    pub fn push(&mut self, leaf: ConditionLeaf) {
        match self.groups.last_mut() {
            Some(group) => group.push(leaf),
            None => self.groups.push(vec![leaf]),
        }
    }

    /// Start a new OR-group. Consecutive calls do not create empty groups.
    pub fn or(&mut self) {
        if self.groups.last().is_some_and(|g| !g.is_empty()) {
            self.groups.push(Vec::new());
        }
    }

    /// Merge another tree: its first group extends the current group, and a new
    /// group is opened after each of its groups.
    pub fn append(&mut self, other: ConditionTree) {
        for group in other.groups.into_iter().filter(|g| !g.is_empty()) {
            for leaf in group {
                self.push(leaf);
            }
            self.or();
        }
    }

    /// Render as `(a AND b) OR (c)`, or `None` when empty.
    pub fn render(&self, esc: &Escaper) -> SqlResult<Option<String>> {
        let mut rendered = Vec::new();
        for group in self.groups() {
            let leaves = group
                .iter()
                .map(|leaf| leaf.render(esc))
                .collect::<SqlResult<Vec<_>>>()?;
            rendered.push(format!("({})", leaves.join(" AND ")));
        }
        if rendered.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rendered.join(" OR ")))
        }
    }
}

impl From<ConditionLeaf> for ConditionTree {
    fn from(leaf: ConditionLeaf) -> Self {
        Self {
            groups: vec![vec![leaf]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_parse() {
        assert_eq!(Operator::parse("=").unwrap(), Operator::Eq);
        assert_eq!(Operator::parse("NOT IN").unwrap(), Operator::NotIn);
        assert_eq!(Operator::parse("IS NOT").unwrap(), Operator::IsNot);
        assert_eq!(Operator::parse("<>").unwrap(), Operator::NotEq);
        assert!(matches!(
            Operator::parse("BOGUS"),
            Err(SqlError::UnrecognizedOperator(op)) if op == "BOGUS"
        ));
        assert!(Operator::parse("==").is_err());
        assert!(Operator::parse("BETWEEN").is_err());
    }

    #[test]
    fn operator_tokens_are_exact() {
        for token in ["like", "not in", "In", "IS  NOT", " = "] {
            assert_eq!(
                Operator::parse(token),
                Err(SqlError::UnrecognizedOperator(token.to_string()))
            );
        }
    }

    #[test]
    fn operators_round_trip_through_display() {
        for op in Operator::ALL {
            assert_eq!(op.to_string().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn empty_tree_renders_nothing() {
        let tree = ConditionTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.render(&Escaper::default()).unwrap(), None);
    }

    #[test]
    fn or_groups() {
        let mut tree = ConditionTree::new();
        tree.push(ConditionLeaf::new("a", Operator::Eq, 1));
        tree.push(ConditionLeaf::new("b", Operator::Gt, 2));
        tree.or();
        tree.or();
        tree.push(ConditionLeaf::new("c", Operator::Like, "x%"));
        assert_eq!(
            tree.render(&Escaper::default()).unwrap().unwrap(),
            "(`a` = 1 AND `b` > 2) OR (`c` LIKE 'x%')"
        );
    }

    #[test]
    fn trailing_or_is_ignored() {
        let mut tree = ConditionTree::new();
        tree.push(ConditionLeaf::new("a", Operator::Eq, 1));
        tree.or();
        assert_eq!(tree.groups().count(), 1);
    }

    #[test]
    fn append_merges_into_current_group() {
        let mut tree = ConditionTree::new();
        tree.push(ConditionLeaf::new("a", Operator::Eq, 1));
        tree.append(ConditionTree::from_groups(vec![
            vec![ConditionLeaf::new("b", Operator::Eq, 2)],
            vec![ConditionLeaf::new("c", Operator::Eq, 3)],
        ]));
        assert_eq!(
            tree.render(&Escaper::default()).unwrap().unwrap(),
            "(`a` = 1 AND `b` = 2) OR (`c` = 3)"
        );
    }
}
