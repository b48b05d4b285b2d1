//! SQLite-backed repository built on [`rusqlite`].

use std::path::Path;

use drm_core::error::{DrmError, Result};
use drm_core::{
    Action, Changeset, Entity, JoinKeys, Materializer, QueryBuilder, RelationChain, Value,
    insert_query, update_query,
};
use rusqlite::{Connection, params_from_iter};

use crate::transaction::{IsolationLevel, Transaction};

/// Owns the database handle and runs queries into entities.
#[derive(Debug)]
pub struct Repo {
    conn: Connection,
}

impl Repo {
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DrmError::PrepareError(e.to_string()))?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DrmError::PrepareError(e.to_string()))?;
        Ok(Self::new(conn))
    }

    /// Gets a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn mut_conn(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// `SELECT` skeleton over the table of `T`.
    pub fn from<T: Entity>(&self) -> QueryBuilder {
        QueryBuilder::from_entity::<T>()
    }

    /// `SELECT` skeleton over `T` joined with `U`.
    pub fn join<T: Entity, U: Entity>(&self, keys: &JoinKeys) -> QueryBuilder {
        QueryBuilder::join_entities::<T, U>(keys)
    }

    /// Runs a query and materializes its rows into `T`.
    ///
    /// Entities keep first-seen order when the statement has an `ORDER BY`.
    pub fn query<T: Entity>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        query_entities(&self.conn, sql, args)
    }

    pub fn fetch<T: Entity>(&self, builder: &QueryBuilder) -> Result<Vec<T>> {
        let (sql, args) = builder.build();
        self.query(&sql, &args)
    }

    pub fn fetch_chain<T: Entity>(&self, chain: &RelationChain) -> Result<Vec<T>> {
        let compiled = chain.compile()?;
        self.query(&compiled.sql, &compiled.args)
    }

    /// Runs a statement and returns the number of affected rows.
    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<usize> {
        execute_statement(&self.conn, sql, args)
    }

    /// Inserts the changeset, writing a generated key back.
    pub fn save<C: Changeset + ?Sized>(&self, cs: &mut C) -> Result<()> {
        save_changeset(&self.conn, cs)
    }

    pub fn update_by_id<C: Changeset + ?Sized>(&self, cs: &mut C) -> Result<()> {
        update_changeset(&self.conn, cs)
    }

    /// Begins a transaction. Dropping it without commit rolls back.
    pub fn begin(&mut self, isolation: IsolationLevel) -> Result<Transaction<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(isolation.into())
            .map_err(|e| DrmError::TransactionError(e.to_string()))?;
        drm_core::drm_trace_tx!("begin", "sqlite.rusqlite");
        Ok(Transaction::new(tx, isolation))
    }
}

pub(crate) fn query_entities<T: Entity>(
    conn: &Connection,
    sql: &str,
    args: &[Value],
) -> Result<Vec<T>> {
    drm_core::drm_trace_query!(sql, args.len());

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DrmError::PrepareError(e.to_string()))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut materializer = Materializer::<T>::new(&columns, sql.contains("ORDER BY"))?;

    let mut rows = stmt
        .query(params_from_iter(args))
        .map_err(|e| DrmError::ExecutionError(e.to_string()))?;
    while let Some(row) = rows.next()? {
        let values = (0..columns.len())
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        materializer.push_row(values)?;
    }

    Ok(materializer.finish())
}

pub(crate) fn execute_statement(conn: &Connection, sql: &str, args: &[Value]) -> Result<usize> {
    drm_core::drm_trace_query!(sql, args.len());

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DrmError::PrepareError(e.to_string()))?;
    stmt.execute(params_from_iter(args))
        .map_err(|e| DrmError::ExecutionError(e.to_string()))
}

pub(crate) fn save_changeset<C: Changeset + ?Sized>(conn: &Connection, cs: &mut C) -> Result<()> {
    let (sql, args) = insert_query(&*cs);
    execute_statement(conn, &sql, &args)?;
    if cs.needs_generated_key() {
        cs.set_primary_key(Value::Integer(conn.last_insert_rowid()));
    }
    cs.mark(Action::Inserted);
    Ok(())
}

pub(crate) fn update_changeset<C: Changeset + ?Sized>(
    conn: &Connection,
    cs: &mut C,
) -> Result<()> {
    let (sql, args) = update_query(&*cs);
    execute_statement(conn, &sql, &args)?;
    cs.mark(Action::Updated);
    Ok(())
}
