use super::{Limit, StatementBuilder, StatementKind, TableRef};
use crate::error::{SqlError, SqlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Mode {
    /// `build()`: a SELECT must name its fields.
    Strict,
    /// `to_sql()`: a SELECT without fields selects `*`.
    Permissive,
}

impl StatementBuilder {
    pub(super) fn render(&self, mode: Mode) -> SqlResult<String> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }

        let mut parts: Vec<String> = Vec::new();
        match self.kind {
            StatementKind::Select => {
                let projection = if self.fields.is_empty() {
                    if mode == Mode::Strict {
                        return Err(SqlError::EmptyProjection);
                    }
                    "*".to_string()
                } else {
                    self.fields
                        .iter()
                        .map(|f| f.render(&self.escaper))
                        .collect::<SqlResult<Vec<_>>>()?
                        .join(", ")
                };
                parts.push(format!("SELECT {projection} FROM {}", self.render_tables()?));
                for join in &self.joins {
                    parts.push(join.render(&self.escaper)?);
                }
                self.push_where(&mut parts)?;
                if !self.group.is_empty() {
                    let group = self
                        .group
                        .iter()
                        .map(|g| self.escaper.identifier(g))
                        .collect::<SqlResult<Vec<_>>>()?;
                    parts.push(format!("GROUP BY {}", group.join(", ")));
                }
                if !self.order.is_empty() {
                    let order = self
                        .order
                        .iter()
                        .map(|(field, dir)| {
                            Ok(format!("{} {}", self.escaper.identifier(field)?, dir.as_str()))
                        })
                        .collect::<SqlResult<Vec<_>>>()?;
                    parts.push(format!("ORDER BY {}", order.join(", ")));
                }
                self.push_limit(&mut parts);
            }
            StatementKind::Update => {
                if self.assignments.is_empty() {
                    return Err(SqlError::NoChanges);
                }
                self.require_condition()?;
                parts.push(format!(
                    "UPDATE {} SET {}",
                    self.render_tables()?,
                    self.render_assignments()?
                ));
                self.push_where(&mut parts)?;
                self.push_limit(&mut parts);
            }
            StatementKind::Insert => {
                let table = self.render_tables()?;
                if self.assignments.is_empty() {
                    parts.push(format!("INSERT INTO {table} VALUES ()"));
                } else {
                    parts.push(format!(
                        "INSERT INTO {table} SET {}",
                        self.render_assignments()?
                    ));
                }
            }
            StatementKind::Delete => {
                self.require_condition()?;
                parts.push(format!("DELETE FROM {}", self.render_tables()?));
                self.push_where(&mut parts)?;
                self.push_limit(&mut parts);
            }
        }

        Ok(parts.join(" "))
    }

    fn render_tables(&self) -> SqlResult<String> {
        let tables = self
            .tables
            .iter()
            .map(|TableRef { name, alias }| self.escaper.table(name, alias.as_deref()))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(tables.join(", "))
    }

    fn render_assignments(&self) -> SqlResult<String> {
        let sets = self
            .assignments
            .iter()
            .map(|(field, value)| {
                Ok(format!(
                    "{} = {}",
                    self.escaper.identifier(field)?,
                    self.escaper.value(value)?
                ))
            })
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(sets.join(", "))
    }

    fn require_condition(&self) -> SqlResult<()> {
        if self.conditions.is_empty() && !self.forced {
            return Err(SqlError::MissingCondition(self.kind));
        }
        Ok(())
    }

    fn push_where(&self, parts: &mut Vec<String>) -> SqlResult<()> {
        if let Some(clause) = self.conditions.render(&self.escaper)? {
            parts.push(format!("WHERE {clause}"));
        }
        Ok(())
    }

    fn push_limit(&self, parts: &mut Vec<String>) {
        match self.limit {
            Some(Limit::Count(count)) => parts.push(format!("LIMIT {count}")),
            Some(Limit::Range { offset, count }) => {
                parts.push(format!("LIMIT {offset}, {count}"))
            }
            None => {}
        }
    }
}
