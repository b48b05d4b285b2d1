//! Multi-hop joins compiled into nested `INNER JOIN` subqueries.
//!
//! A chain `drivers -> vehicles -> trips` compiles innermost first:
//!
//! ```text
//! SELECT `r_1`.`plate` AS `vehicles$plate`, `drivers`.`id`
//! FROM `drivers`
//! INNER JOIN (
//!     SELECT `vehicles`.`plate`, `vehicles`.`driver_id`
//!     FROM `vehicles`
//!     INNER JOIN `trips` ON `vehicles`.`id` = `trips`.`vehicle_id`
//! ) AS `r_1` ON `drivers`.`id` = `r_1`.`driver_id`
//! ```
//!
//! Columns and predicates attached to a relation belong to the level where
//! their table is in scope. Deeper columns are re-exposed through each
//! enclosing subquery alias; output aliases only appear at the outermost
//! level.

use core::fmt::Write;

use hashbrown::HashMap;

use crate::builder::QueryBuilder;
use crate::clause::{Clause, Column, OrderBy, Predicate, RenderConfig, write_ident, write_qualified_column};
use crate::error::{DrmError, Result};
use crate::tracing::trace_relation_warning;
use crate::value::Value;

/// A directed join edge `from.from_key = to.to_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub from: String,
    pub from_key: String,
    pub to: String,
    pub to_key: String,
    /// Local projection and predicate for the tables this relation names.
    pub builder: Option<QueryBuilder>,
}

impl Relation {
    pub fn new(
        from: impl Into<String>,
        from_key: impl Into<String>,
        to: impl Into<String>,
        to_key: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            from_key: from_key.into(),
            to: to.into(),
            to_key: to_key.into(),
            builder: None,
        }
    }

    /// Attaches a local builder; a second call merges into the first.
    pub fn with(mut self, builder: QueryBuilder) -> Self {
        match &mut self.builder {
            Some(existing) => existing.merge(builder),
            None => self.builder = Some(builder),
        }
        self
    }

    /// Swaps both ends of the edge, keys included.
    pub fn reverse(&mut self) {
        core::mem::swap(&mut self.from, &mut self.to);
        core::mem::swap(&mut self.from_key, &mut self.to_key);
    }

    fn touches(&self, table: &str) -> bool {
        self.from == table || self.to == table
    }
}

/// Relations in any declaration order, plus an optional final ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationChain {
    relations: Vec<Relation>,
    order_by: Option<(Column, OrderBy)>,
}

impl RelationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Orders the outermost result.
    pub fn order_by(mut self, column: Column, direction: OrderBy) -> Self {
        self.order_by = Some((column, direction));
        self
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn ordering(&self) -> Option<&(Column, OrderBy)> {
        self.order_by.as_ref()
    }

    pub fn normalize(&self) -> Result<Vec<Relation>> {
        normalize(self.relations.clone())
    }

    pub fn compile(&self) -> Result<CompiledChain> {
        let path = self.normalize()?;
        compile(&path, self.order_by.as_ref())
    }
}

/// A subquery alias introduced by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedAlias {
    /// `r_<depth>`
    pub alias: String,
    /// Driving table of the wrapped level
    pub table: String,
    /// Column the enclosing level joins on
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledChain {
    pub sql: String,
    pub args: Vec<Value>,
    pub aliases: Vec<JoinedAlias>,
}

fn relation_error(message: impl Into<String>) -> DrmError {
    DrmError::Relation(message.into())
}

/// Arranges relations into a directed path where each relation's `to` is the
/// next relation's `from`.
///
/// A single relation is kept as declared.
pub fn normalize(relations: Vec<Relation>) -> Result<Vec<Relation>> {
    let mut path = order_path(relations)?;
    orient(&mut path);
    Ok(path)
}

/// Orders relations along the path they form, starting from one end.
fn order_path(relations: Vec<Relation>) -> Result<Vec<Relation>> {
    if relations.is_empty() {
        return Err(relation_error("empty relation chain"));
    }
    if let Some(relation) = relations.iter().find(|r| r.from == r.to) {
        return Err(relation_error(format!(
            "relation joins `{}` to itself",
            relation.from
        )));
    }
    if relations.len() == 1 {
        return Ok(relations);
    }

    let order = walk_order(&relations)?;
    let mut slots: Vec<Option<Relation>> = relations.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

/// Indices of `relations` in path order.
fn walk_order(relations: &[Relation]) -> Result<Vec<usize>> {
    let mut incident: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut tables: Vec<&str> = Vec::new();
    for (i, relation) in relations.iter().enumerate() {
        for table in [relation.from.as_str(), relation.to.as_str()] {
            let edges = incident.entry(table).or_default();
            if edges.is_empty() {
                tables.push(table);
            }
            edges.push(i);
            if edges.len() > 2 {
                return Err(relation_error(format!(
                    "table `{table}` joins more than two relations"
                )));
            }
        }
    }

    let ends: Vec<(&str, usize)> = tables
        .iter()
        .filter_map(|table| match incident[table].as_slice() {
            [only] => Some((*table, *only)),
            _ => None,
        })
        .collect();
    let [first, second] = ends.as_slice() else {
        return Err(relation_error("relation chain is not a simple path"));
    };

    let is_source = |(table, i): &(&str, usize)| relations[*i].from == *table;
    let start = match (is_source(first), is_source(second)) {
        (true, false) => *first,
        (false, true) => *second,
        _ if second.1 < first.1 => *second,
        _ => *first,
    };

    let mut order = Vec::with_capacity(relations.len());
    let mut visited = vec![false; relations.len()];
    let (mut table, mut current) = start;
    loop {
        visited[current] = true;
        order.push(current);
        let relation = &relations[current];
        table = if relation.from == table {
            relation.to.as_str()
        } else {
            relation.from.as_str()
        };
        match incident[table].iter().find(|i| !visited[**i]) {
            Some(next) => current = *next,
            None => break,
        }
    }
    if order.len() != relations.len() {
        return Err(relation_error("relation chain is disconnected"));
    }
    Ok(order)
}

/// Points every relation of an ordered path in the same direction.
fn orient(path: &mut [Relation]) {
    for i in 1..path.len() {
        let (head, tail) = path.split_at_mut(i);
        let prev = &mut head[i - 1];
        let cur = &mut tail[0];
        if cur.touches(&prev.from) {
            prev.reverse();
        }
        if cur.to == prev.to {
            cur.reverse();
        }
    }
}

/// Rendered level of the chain, consumed by the enclosing level.
struct Level {
    sql: String,
    args: Vec<Value>,
    exports: Vec<Column>,
}

/// Compiles a normalized path into one statement.
pub fn compile(path: &[Relation], order_by: Option<&(Column, OrderBy)>) -> Result<CompiledChain> {
    let Some(last) = path.last() else {
        return Err(relation_error("empty relation chain"));
    };
    let depth = path.len();
    let mut tables: Vec<&str> = path.iter().map(|r| r.from.as_str()).collect();
    tables.push(last.to.as_str());

    let level_of = |table: &str| -> Option<usize> {
        tables
            .iter()
            .position(|t| *t == table)
            .map(|k| k.min(depth - 1))
    };

    let mut columns: Vec<Vec<Column>> = vec![Vec::new(); depth];
    let mut predicates: Vec<Vec<Predicate>> = vec![Vec::new(); depth];
    for builder in path.iter().filter_map(|r| r.builder.as_ref()) {
        for column in builder.columns() {
            let level = level_of(&column.table).unwrap_or_else(|| {
                trace_relation_warning!(column.table, column.name, "drm.relation.unscoped");
                0
            });
            columns[level].push(column.clone());
        }
        for predicate in builder.predicates() {
            let level = level_of(&predicate.table).unwrap_or_else(|| {
                trace_relation_warning!(predicate.table, predicate.column, "drm.relation.unscoped");
                0
            });
            predicates[level].push(predicate.clone());
        }
    }

    let mut inner: Option<Level> = None;
    for k in (0..depth).rev() {
        let relation = &path[k];
        let outermost = k == 0;
        let inner_alias = format!("r_{}", k + 1);
        let mut sql = String::from("SELECT ");
        let mut args = Vec::new();
        let mut exports = Vec::new();
        let mut select = Vec::new();

        if let Some(level) = inner.as_ref().filter(|level| !level.exports.is_empty()) {
            select.extend(level.exports.iter().cloned());
            let bubbled = Clause::Projection(level.exports.clone());
            bubbled.render_into(
                &RenderConfig::through(inner_alias.as_str(), outermost),
                &mut sql,
                &mut args,
            );
            exports.extend(level.exports.iter().cloned());
        }

        let mut own = core::mem::take(&mut columns[k]);
        let mandatory = if outermost {
            Some(Column::new(relation.from_key.as_str(), relation.from.as_str()))
        } else {
            None
        };
        exports.extend(own.iter().cloned());
        if let Some(key) = mandatory {
            if !own.iter().any(|c| c.table == key.table && c.name == key.name) {
                own.push(key);
            }
        }
        if k > 0 {
            let back = &path[k - 1];
            let key = Column::new(back.to_key.as_str(), back.to.as_str());
            if !own.iter().any(|c| c.table == key.table && c.name == key.name) {
                own.push(key);
            }
        }
        if !own.is_empty() {
            if !select.is_empty() {
                sql.push_str(", ");
            }
            select.extend(own.iter().cloned());
            let config = RenderConfig {
                include_alias: outermost,
                rename_table: None,
            };
            Clause::Projection(own).render_into(&config, &mut sql, &mut args);
        }
        if !outermost {
            check_unique_outputs(&select)?;
        }

        sql.push_str(" FROM ");
        write_ident(&relation.from, &mut sql);
        sql.push_str(" INNER JOIN ");
        let joined = match inner.take() {
            Some(level) => {
                let _ = write!(sql, "({}) AS ", level.sql);
                write_ident(&inner_alias, &mut sql);
                args.extend(level.args);
                inner_alias
            }
            None => {
                write_ident(&relation.to, &mut sql);
                relation.to.clone()
            }
        };
        sql.push_str(" ON ");
        write_qualified_column(&relation.from, &relation.from_key, &mut sql);
        sql.push_str(" = ");
        write_qualified_column(&joined, &relation.to_key, &mut sql);

        let own_predicates = core::mem::take(&mut predicates[k]);
        if !own_predicates.is_empty() {
            sql.push_str(" WHERE ");
            Clause::Predicate(own_predicates).render_into(&RenderConfig::default(), &mut sql, &mut args);
        }

        if let Some((column, direction)) = order_by.filter(|_| outermost) {
            sql.push_str(" ORDER BY ");
            let nested = depth > 1 && level_of(&column.table).is_some_and(|level| level > 0);
            let config = if nested {
                RenderConfig::through("r_1", false)
            } else {
                RenderConfig::default()
            };
            Clause::OrderBy(column.clone(), *direction).render_into(&config, &mut sql, &mut args);
        }

        inner = Some(Level { sql, args, exports });
    }

    let aliases = (1..depth)
        .map(|k| JoinedAlias {
            alias: format!("r_{k}"),
            table: path[k].from.clone(),
            key: path[k - 1].to_key.clone(),
        })
        .collect();
    let Level { sql, args, .. } = inner.ok_or_else(|| relation_error("empty relation chain"))?;

    Ok(CompiledChain { sql, args, aliases })
}

/// Subquery outputs are addressed by bare column name from the enclosing
/// level, so two outputs sharing a name would bind to the wrong column.
fn check_unique_outputs(select: &[Column]) -> Result<()> {
    for (i, column) in select.iter().enumerate() {
        if let Some(other) = select[..i].iter().find(|c| c.name == column.name) {
            return Err(relation_error(format!(
                "`{}`.`{}` and `{}`.`{}` share an output name inside a nested join",
                other.table, other.name, column.table, column.name
            )));
        }
    }
    Ok(())
}
