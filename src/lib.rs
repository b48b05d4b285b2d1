//! # drm
//!
//! A micro ORM: composable query fragments, nested relation joins and
//! row-to-entity materialization.
//!
//! ## Quick Start
//!
//! ```rust
//! use drm::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Driver {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Entity for Driver {
//!     type Key = i64;
//!     const NAME: &'static str = "Driver";
//!     const FIELDS: &'static [Field] = &[Field::scalar("id"), Field::scalar("name")];
//!
//!     fn key(&self) -> Option<i64> {
//!         Some(self.id)
//!     }
//!
//!     fn set(&mut self, field: &str, value: Value) -> drm::Result<()> {
//!         match field {
//!             "id" => assign(&mut self.id, value),
//!             "name" => assign(&mut self.name, value),
//!             _ => Ok(()),
//!         }
//!     }
//! }
//!
//! # fn main() -> drm::Result<()> {
//! let repo = Repo::open_in_memory()?;
//! repo.execute("CREATE TABLE drivers (id INTEGER PRIMARY KEY, name TEXT)", &[])?;
//! repo.execute("INSERT INTO drivers (name) VALUES (?)", &["John".into()])?;
//!
//! let query = repo
//!     .from::<Driver>()
//!     .select(col("id", "drivers"))
//!     .select(col("name", "drivers"))
//!     .r#where(col("name", "drivers").like("J%"));
//! let drivers: Vec<Driver> = repo.fetch(&query)?;
//! assert_eq!(drivers[0].name, "John");
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature    | Description                               | Default |
//! |------------|-------------------------------------------|---------|
//! | `rusqlite` | SQLite-backed [`Repo`] and transactions   | ✅      |
//! | `tracing`  | Query and transaction events via tracing  | ✅      |

#[cfg(feature = "rusqlite")]
mod repo;
#[cfg(feature = "rusqlite")]
mod transaction;

/// Result type for drm operations
pub use drm_core::error::Result;

/// Error types
pub mod error {
    pub use drm_core::error::DrmError;
}

pub use drm_core::{
    Action, Change, Changeset, Clause, Column, CompiledChain, Entity, Field, FieldKind,
    Fragment, FromValue, JoinKeys, JoinedAlias, Materializer, Multiplicity, Op, OrderBy,
    Predicate, QueryBuilder, Related, Relation, RelationChain, RenderConfig, Value, assign,
    col, decode, insert_query, materialize, update_query,
};

/// Core building blocks, re-exported for driver-agnostic use.
pub mod core {
    pub use drm_core::*;
}

#[cfg(feature = "rusqlite")]
pub use repo::Repo;
#[cfg(feature = "rusqlite")]
pub use transaction::{IsolationLevel, Transaction};

/// Everything needed to declare entities and run queries.
pub mod prelude {
    pub use crate::error::DrmError;
    pub use drm_core::{
        Action, Change, Changeset, Column, Entity, Field, Fragment, JoinKeys, OrderBy,
        QueryBuilder, Related, Relation, RelationChain, Value, assign, col, decode,
    };

    #[cfg(feature = "rusqlite")]
    pub use crate::{IsolationLevel, Repo, Transaction};
}
