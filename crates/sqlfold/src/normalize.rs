//! Normalization of loosely typed filter input into a [`ConditionTree`].
//!
//! Filters usually arrive as JSON from the HTTP layer, in one of four shapes:
//!
//! ```text
//! ["age", ">", 18]                                   single leaf
//! [["age", ">", 18], ["name", "=", "Ann"]]           one AND group
//! [[["age", ">", 18]], [["name", "=", "Ann"]]]       OR of AND groups
//! [["age", ">", 18], [["name", "=", "Ann"]]]         mixed
//! ```
//!
//! An entry whose first element is a string is a leaf; one whose first element
//! is a list is a group. Every leaf must have exactly three elements.

use crate::condition::{ConditionLeaf, ConditionTree, Operator};
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use serde_json::Value as Json;

/// Normalize a filter into its canonical OR-of-AND-groups tree.
///
/// An empty list yields an empty tree (no WHERE clause).
pub fn normalize(input: &Json) -> SqlResult<ConditionTree> {
    let entries = input
        .as_array()
        .ok_or_else(|| SqlError::malformed(format!("expected a list, got {input}")))?;

    let Some(first) = entries.first() else {
        return Ok(ConditionTree::new());
    };

    if first.is_string() {
        return Ok(ConditionTree::from(leaf(input)?));
    }

    let mut classified = Vec::with_capacity(entries.len());
    for entry in entries {
        classified.push(classify(entry)?);
    }

    let has_groups = classified.iter().any(|e| matches!(e, Entry::Group(_)));
    let groups = if has_groups {
        classified
            .into_iter()
            .map(|e| match e {
                Entry::Leaf(leaf) => vec![leaf],
                Entry::Group(group) => group,
            })
            .collect()
    } else {
        vec![
            classified
                .into_iter()
                .filter_map(|e| match e {
                    Entry::Leaf(leaf) => Some(leaf),
                    Entry::Group(_) => None,
                })
                .collect(),
        ]
    };

    Ok(ConditionTree::from_groups(groups))
}

impl TryFrom<&Json> for ConditionTree {
    type Error = SqlError;

    fn try_from(input: &Json) -> SqlResult<Self> {
        normalize(input)
    }
}

enum Entry {
    Leaf(ConditionLeaf),
    Group(Vec<ConditionLeaf>),
}

fn classify(entry: &Json) -> SqlResult<Entry> {
    let items = entry
        .as_array()
        .ok_or_else(|| SqlError::malformed(format!("expected a condition or group, got {entry}")))?;

    match items.first() {
        Some(Json::String(_)) => Ok(Entry::Leaf(leaf(entry)?)),
        Some(Json::Array(_)) => {
            let group = items.iter().map(leaf).collect::<SqlResult<Vec<_>>>()?;
            Ok(Entry::Group(group))
        }
        _ => Err(SqlError::malformed(format!(
            "expected a condition or group, got {entry}"
        ))),
    }
}

fn leaf(entry: &Json) -> SqlResult<ConditionLeaf> {
    let malformed = || SqlError::malformed(format!("expected [field, operator, value], got {entry}"));

    let items = entry.as_array().ok_or_else(malformed)?;
    let [field, operator, value] = items.as_slice() else {
        return Err(malformed());
    };
    let field = field.as_str().ok_or_else(malformed)?;
    let operator = operator.as_str().ok_or_else(malformed)?;

    Ok(ConditionLeaf::new(
        field,
        Operator::parse(operator)?,
        Value::try_from(value)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::Escaper;
    use serde_json::json;

    fn render(input: Json) -> Option<String> {
        normalize(&input)
            .unwrap()
            .render(&Escaper::default())
            .unwrap()
    }

    #[test]
    fn empty_input_is_no_condition() {
        assert!(normalize(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn single_leaf() {
        let tree = normalize(&json!(["age", ">", 18])).unwrap();
        assert_eq!(tree.groups().count(), 1);
        assert_eq!(render(json!(["age", ">", 18])).unwrap(), "(`age` > 18)");
    }

    #[test]
    fn flat_list_is_one_and_group() {
        assert_eq!(
            render(json!([["age", ">", 18], ["name", "=", "Ann"]])).unwrap(),
            "(`age` > 18 AND `name` = 'Ann')"
        );
    }

    #[test]
    fn list_of_groups_is_canonical() {
        assert_eq!(
            render(json!([[["age", ">", 18]], [["name", "=", "Ann"]]])).unwrap(),
            "(`age` > 18) OR (`name` = 'Ann')"
        );
    }

    #[test]
    fn mixed_promotes_leaves() {
        assert_eq!(
            render(json!([["age", ">", 18], [["name", "=", "Ann"], ["id", "IN", [1, 2]]]]))
                .unwrap(),
            "(`age` > 18) OR (`name` = 'Ann' AND `id` IN (1, 2))"
        );
    }

    #[test]
    fn all_shapes_of_one_predicate_agree() {
        let shapes = [
            json!(["id", "=", 7]),
            json!([["id", "=", 7]]),
            json!([[["id", "=", 7]]]),
        ];
        let rendered: Vec<_> = shapes.into_iter().map(render).collect();
        assert!(rendered.windows(2).all(|w| w[0] == w[1]));

        let two = [
            json!([["a", "=", 1], ["b", "=", 2]]),
            json!([[["a", "=", 1], ["b", "=", 2]]]),
        ];
        let rendered: Vec<_> = two.into_iter().map(render).collect();
        assert_eq!(rendered[0], rendered[1]);
    }

    #[test]
    fn wrong_arity_fails() {
        for input in [
            json!(["age", ">"]),
            json!([["age", ">", 1, 2]]),
            json!([[["age", ">"]]]),
            json!([["a", "=", 1], [["b", "="]]]),
        ] {
            assert!(
                matches!(normalize(&input), Err(SqlError::MalformedCondition(_))),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn non_list_entries_fail() {
        for input in [
            json!("age > 18"),
            json!([1, 2, 3]),
            json!([["a", "=", 1], 5]),
            json!([[]]),
            json!([[1, "=", 2]]),
        ] {
            assert!(
                matches!(normalize(&input), Err(SqlError::MalformedCondition(_))),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn unknown_operator_fails() {
        assert!(matches!(
            normalize(&json!(["x", "BOGUS", 1])),
            Err(SqlError::UnrecognizedOperator(_))
        ));
    }
}
