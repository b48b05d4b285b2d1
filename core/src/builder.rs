//! Linear query assembly: `SELECT … FROM … WHERE … ORDER BY …`.

use crate::clause::{Clause, Column, OrderBy, Predicate, RenderConfig, write_ident, write_qualified_column};
use crate::entity::Entity;
use crate::value::Value;

/// Key pair describing how a second entity joins the first.
///
/// The base table joins on `primary_key`, the related table on
/// `foreign_key`; `inverse` swaps the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKeys {
    pub foreign_key: String,
    pub primary_key: String,
    pub inverse: bool,
}

impl JoinKeys {
    pub fn new(foreign_key: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            foreign_key: foreign_key.into(),
            primary_key: primary_key.into(),
            inverse: false,
        }
    }

    pub fn inverse(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }
}

/// Assembles clauses around a base `FROM`/`JOIN` fragment.
///
/// [`build`](Self::build) is a pure render; the builder can be rendered any
/// number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    base: String,
    projection: Option<Clause>,
    predicate: Option<Clause>,
    order_by: Option<Clause>,
}

impl QueryBuilder {
    /// Creates a builder without a base fragment, as used for the local
    /// projection/predicate of a relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder over a raw base fragment.
    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    /// `FROM `table``
    pub fn from_table(table: &str) -> Self {
        let mut base = String::from("FROM ");
        write_ident(table, &mut base);
        Self::with_base(base)
    }

    /// `FROM` the table of entity `T`.
    pub fn from_entity<T: Entity>() -> Self {
        Self::from_table(&T::table_name())
    }

    /// `FROM` the table of `T` with a single `INNER JOIN` on the table of `U`.
    pub fn join_entities<T: Entity, U: Entity>(keys: &JoinKeys) -> Self {
        let base_table = T::table_name();
        let joined_table = U::table_name();
        let (mut base_key, mut joined_key) = (keys.primary_key.as_str(), keys.foreign_key.as_str());
        if keys.inverse {
            core::mem::swap(&mut base_key, &mut joined_key);
        }

        let mut base = String::from("FROM ");
        write_ident(&base_table, &mut base);
        base.push_str(" INNER JOIN ");
        write_ident(&joined_table, &mut base);
        base.push_str(" ON ");
        write_qualified_column(&base_table, base_key, &mut base);
        base.push_str(" = ");
        write_qualified_column(&joined_table, joined_key, &mut base);
        Self::with_base(base)
    }

    /// Appends a column to the projection.
    pub fn select(mut self, column: Column) -> Self {
        let clause = Clause::Projection(vec![column]);
        match &mut self.projection {
            Some(projection) => projection.merge(clause),
            None => self.projection = Some(clause),
        }
        self
    }

    /// Appends a predicate to the `WHERE` conjunction.
    pub fn r#where(mut self, predicate: Predicate) -> Self {
        let clause = Clause::Predicate(vec![predicate]);
        match &mut self.predicate {
            Some(existing) => existing.merge(clause),
            None => self.predicate = Some(clause),
        }
        self
    }

    /// Sets the ordering, replacing any previous one.
    pub fn order_by(mut self, column: Column, direction: OrderBy) -> Self {
        self.order_by = Some(Clause::OrderBy(column, direction));
        self
    }

    /// Merges the projection and predicate of `other` into `self`.
    ///
    /// The ordering and base fragment of `other` are ignored.
    pub fn merge(&mut self, other: QueryBuilder) {
        for (slot, incoming) in [
            (&mut self.projection, other.projection),
            (&mut self.predicate, other.predicate),
        ] {
            match slot {
                Some(existing) => {
                    if let Some(incoming) = incoming {
                        existing.merge(incoming);
                    }
                }
                None => *slot = incoming,
            }
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn projection(&self) -> Option<&Clause> {
        self.projection.as_ref()
    }

    pub fn predicate(&self) -> Option<&Clause> {
        self.predicate.as_ref()
    }

    pub fn ordering(&self) -> Option<&Clause> {
        self.order_by.as_ref()
    }

    /// Selected columns, in selection order.
    pub fn columns(&self) -> &[Column] {
        match &self.projection {
            Some(Clause::Projection(cols)) => cols,
            _ => &[],
        }
    }

    /// Predicates, in declaration order.
    pub fn predicates(&self) -> &[Predicate] {
        match &self.predicate {
            Some(Clause::Predicate(preds)) => preds,
            _ => &[],
        }
    }

    /// Renders the statement text and its arguments in placeholder order.
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut sql = String::with_capacity(128);
        let mut args = Vec::new();
        let config = RenderConfig::default();

        if let Some(projection) = self.projection.as_ref().filter(|p| !p.is_empty()) {
            sql.push_str("SELECT ");
            projection.render_into(&config, &mut sql, &mut args);
        }
        if !self.base.is_empty() {
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&self.base);
        }
        if let Some(predicate) = self.predicate.as_ref().filter(|p| !p.is_empty()) {
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str("WHERE ");
            predicate.render_into(&config, &mut sql, &mut args);
        }
        if let Some(order_by) = &self.order_by {
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str("ORDER BY ");
            order_by.render_into(&config, &mut sql, &mut args);
        }

        (sql, args)
    }
}
