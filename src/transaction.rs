use drm_core::error::{DrmError, Result};
use drm_core::{Changeset, Entity, QueryBuilder, RelationChain, Value};

use crate::repo::{execute_statement, query_entities, save_changeset, update_changeset};

/// SQLite transaction locking behavior
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    #[default]
    /// A deferred transaction is the default - it does not acquire locks until needed
    Deferred,
    /// An immediate transaction acquires a RESERVED lock immediately
    Immediate,
    /// An exclusive transaction acquires an EXCLUSIVE lock immediately
    Exclusive,
}

impl From<IsolationLevel> for ::rusqlite::TransactionBehavior {
    fn from(level: IsolationLevel) -> Self {
        match level {
            IsolationLevel::Deferred => ::rusqlite::TransactionBehavior::Deferred,
            IsolationLevel::Immediate => ::rusqlite::TransactionBehavior::Immediate,
            IsolationLevel::Exclusive => ::rusqlite::TransactionBehavior::Exclusive,
        }
    }
}

/// Transaction-scoped reads and writes.
///
/// Nothing is retried. Dropping the transaction without [`commit`](Self::commit)
/// rolls it back.
#[derive(Debug)]
pub struct Transaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
    isolation: IsolationLevel,
}

impl<'conn> Transaction<'conn> {
    pub(crate) fn new(tx: rusqlite::Transaction<'conn>, isolation: IsolationLevel) -> Self {
        Self { tx, isolation }
    }

    /// Gets a reference to the underlying transaction
    #[inline]
    pub fn inner(&self) -> &rusqlite::Transaction<'conn> {
        &self.tx
    }

    #[inline]
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    pub fn query<T: Entity>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        query_entities(&self.tx, sql, args)
    }

    pub fn fetch<T: Entity>(&self, builder: &QueryBuilder) -> Result<Vec<T>> {
        let (sql, args) = builder.build();
        self.query(&sql, &args)
    }

    pub fn fetch_chain<T: Entity>(&self, chain: &RelationChain) -> Result<Vec<T>> {
        let compiled = chain.compile()?;
        self.query(&compiled.sql, &compiled.args)
    }

    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<usize> {
        execute_statement(&self.tx, sql, args)
    }

    pub fn save<C: Changeset + ?Sized>(&self, cs: &mut C) -> Result<()> {
        save_changeset(&self.tx, cs)
    }

    pub fn update_by_id<C: Changeset + ?Sized>(&self, cs: &mut C) -> Result<()> {
        update_changeset(&self.tx, cs)
    }

    /// Commits the transaction
    pub fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .map_err(|e| DrmError::TransactionError(e.to_string()))?;
        drm_core::drm_trace_tx!("commit", "sqlite.rusqlite");
        Ok(())
    }

    /// Rolls back the transaction
    pub fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .map_err(|e| DrmError::TransactionError(e.to_string()))?;
        drm_core::drm_trace_tx!("rollback", "sqlite.rusqlite");
        Ok(())
    }
}
