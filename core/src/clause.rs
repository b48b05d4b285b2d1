//! Composable query fragments: projection, predicate and ordering.
//!
//! A [`Clause`] is pure data. Clauses of the same kind merge by concatenation
//! (ordering: the incoming one replaces the receiver); merging clauses of
//! different kinds leaves the receiver untouched.

use core::fmt::Write;

use crate::value::Value;

/// Writes `` `name` `` into `out`, doubling any backtick inside `name`.
pub(crate) fn write_ident(name: &str, out: &mut String) {
    out.push('`');
    if name.contains('`') {
        out.push_str(&name.replace('`', "``"));
    } else {
        out.push_str(name);
    }
    out.push('`');
}

/// Writes `` `table`.`column` `` into `out`.
pub(crate) fn write_qualified_column(table: &str, column: &str, out: &mut String) {
    write_ident(table, out);
    out.push('.');
    write_ident(column, out);
}

/// A physical column, optionally renamed in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub table: String,
    pub alias: Option<String>,
}

/// Shorthand for [`Column::new`].
pub fn col(name: impl Into<String>, table: impl Into<String>) -> Column {
    Column::new(name, table)
}

impl Column {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            alias: None,
        }
    }

    /// Renames the column in the output (`AS alias`).
    ///
    /// Aliases of the form `<RelationField>$<SubColumn>` route the value to a
    /// related entity when the row is materialized.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name under which the column appears in the result set.
    pub fn output_name(&self, include_alias: bool) -> &str {
        match &self.alias {
            Some(alias) if include_alias => alias,
            _ => &self.name,
        }
    }

    fn predicate(&self, op: Op, value: impl Into<Value>) -> Predicate {
        Predicate::new(self.name.clone(), self.table.clone(), op, value)
    }

    pub fn eq(&self, value: impl Into<Value>) -> Predicate {
        self.predicate(Op::Eq, value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Predicate {
        self.predicate(Op::Lt, value)
    }

    pub fn le(&self, value: impl Into<Value>) -> Predicate {
        self.predicate(Op::Le, value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> Predicate {
        self.predicate(Op::Gt, value)
    }

    pub fn ge(&self, value: impl Into<Value>) -> Predicate {
        self.predicate(Op::Ge, value)
    }

    pub fn like(&self, pattern: impl Into<Value>) -> Predicate {
        self.predicate(Op::Like, pattern)
    }
}

/// Comparison operator of a [`Predicate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Op {
    pub const fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
        }
    }
}

/// One comparison of `table.column` against a bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub table: String,
    pub op: Op,
    pub value: Value,
}

impl Predicate {
    pub fn new(
        column: impl Into<String>,
        table: impl Into<String>,
        op: Op,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            column: column.into(),
            table: table.into(),
            op,
            value: value.into(),
        }
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    Asc,
    Desc,
}

impl OrderBy {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

/// Rendering options for a clause.
///
/// `rename_table` replaces the table of every column (used when a projection
/// is re-exposed through a subquery alias); `include_alias = false` drops
/// `AS` renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub include_alias: bool,
    pub rename_table: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            include_alias: true,
            rename_table: None,
        }
    }
}

impl RenderConfig {
    /// Re-exposes columns through `table`, optionally keeping their aliases.
    pub fn through(table: impl Into<String>, include_alias: bool) -> Self {
        Self {
            include_alias,
            rename_table: Some(table.into()),
        }
    }
}

/// A composable fragment of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Projection(Vec<Column>),
    Predicate(Vec<Predicate>),
    OrderBy(Column, OrderBy),
}

impl Clause {
    /// Merges `other` into `self`.
    ///
    /// Projections and predicates concatenate in order, an ordering replaces
    /// the receiver's. Mismatched kinds are a no-op.
    pub fn merge(&mut self, other: Clause) {
        match (self, other) {
            (Clause::Projection(cols), Clause::Projection(more)) => cols.extend(more),
            (Clause::Predicate(preds), Clause::Predicate(more)) => preds.extend(more),
            (Clause::OrderBy(column, direction), Clause::OrderBy(new_column, new_direction)) => {
                *column = new_column;
                *direction = new_direction;
            }
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Clause::Projection(cols) => cols.is_empty(),
            Clause::Predicate(preds) => preds.is_empty(),
            Clause::OrderBy(..) => false,
        }
    }

    /// Renders the clause body (no `SELECT`/`WHERE`/`ORDER BY` keyword) into
    /// `out`, appending bound values to `args` in placeholder order.
    pub fn render_into(&self, config: &RenderConfig, out: &mut String, args: &mut Vec<Value>) {
        match self {
            Clause::Projection(cols) => {
                for (i, c) in cols.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let table = config.rename_table.as_deref().unwrap_or(&c.table);
                    write_qualified_column(table, &c.name, out);
                    if let Some(alias) = c.alias.as_deref().filter(|_| config.include_alias) {
                        out.push_str(" AS ");
                        write_ident(alias, out);
                    }
                }
            }
            Clause::Predicate(preds) => {
                for (i, p) in preds.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" AND ");
                    }
                    let table = config.rename_table.as_deref().unwrap_or(&p.table);
                    write_qualified_column(table, &p.column, out);
                    let _ = write!(out, " {} ?", p.op.as_str());
                    args.push(p.value.clone());
                }
            }
            Clause::OrderBy(c, direction) => {
                let table = config.rename_table.as_deref().unwrap_or(&c.table);
                write_qualified_column(table, &c.name, out);
                out.push(' ');
                out.push_str(direction.as_str());
            }
        }
    }

    /// Renders the clause body with the default configuration.
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut args = Vec::new();
        self.render_into(&RenderConfig::default(), &mut sql, &mut args);
        (sql, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_escape_backticks() {
        let mut sql = String::new();
        write_qualified_column("odd`table", "a``b", &mut sql);
        assert_eq!(sql, "`odd``table`.`a````b`");
    }

    #[test]
    fn test_projection_merge_concatenates() {
        let mut left = Clause::Projection(vec![col("id", "drivers")]);
        left.merge(Clause::Projection(vec![col("age", "drivers"), col("name", "drivers")]));

        let Clause::Projection(cols) = &left else {
            panic!("expected projection");
        };
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "age", "name"]);
    }

    #[test]
    fn test_mismatched_merge_is_noop() {
        let mut predicate = Clause::Predicate(vec![col("age", "drivers").ge(35)]);
        let before = predicate.clone();
        predicate.merge(Clause::Projection(vec![col("id", "drivers")]));
        assert_eq!(predicate, before);

        let mut order = Clause::OrderBy(col("age", "drivers"), OrderBy::Asc);
        order.merge(Clause::Predicate(vec![col("age", "drivers").ge(35)]));
        assert_eq!(order, Clause::OrderBy(col("age", "drivers"), OrderBy::Asc));
    }

    #[test]
    fn test_order_by_merge_replaces() {
        let mut order = Clause::OrderBy(col("age", "drivers"), OrderBy::Asc);
        order.merge(Clause::OrderBy(col("name", "drivers"), OrderBy::Desc));
        assert_eq!(order, Clause::OrderBy(col("name", "drivers"), OrderBy::Desc));
    }

    #[test]
    fn test_render_projection_with_aliases() {
        let clause = Clause::Projection(vec![
            col("id", "drivers"),
            col("plate", "vehicles").alias("vehicles$plate"),
        ]);
        let (sql, args) = clause.render();
        assert_eq!(
            sql,
            "`drivers`.`id`, `vehicles`.`plate` AS `vehicles$plate`"
        );
        assert!(args.is_empty());
    }

    #[test]
    fn test_render_projection_renamed_without_alias() {
        let clause = Clause::Projection(vec![
            col("id", "drivers"),
            col("plate", "vehicles").alias("vehicles$plate"),
        ]);
        let mut sql = String::new();
        let mut args = Vec::new();
        clause.render_into(&RenderConfig::through("r_1", false), &mut sql, &mut args);
        assert_eq!(sql, "`r_1`.`id`, `r_1`.`plate`");
    }

    #[test]
    fn test_empty_projection_renders_empty() {
        let (sql, _) = Clause::Projection(Vec::new()).render();
        assert_eq!(sql, "");
    }

    #[test]
    fn test_predicate_args_follow_declaration_order() {
        let clause = Clause::Predicate(vec![
            col("age", "driver").ge(35),
            col("name", "driver").like("%John%"),
        ]);
        let (sql, args) = clause.render();
        assert_eq!(sql, "`driver`.`age` >= ? AND `driver`.`name` LIKE ?");
        assert_eq!(args, vec![Value::Integer(35), Value::Text("%John%".into())]);
    }
}
