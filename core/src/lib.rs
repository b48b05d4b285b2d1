//! Driver-agnostic core of drm: values, clauses, query builders, relation
//! chains, entity descriptors and the row materializer.

pub mod builder;
pub mod changeset;
pub mod clause;
pub mod entity;
pub mod error;
pub mod materialize;
pub mod relation;
pub mod tracing;
pub mod value;

// Re-export key types and traits
pub use builder::{JoinKeys, QueryBuilder};
pub use changeset::{Action, Change, Changeset, insert_query, update_query};
pub use clause::{Clause, Column, Op, OrderBy, Predicate, RenderConfig, col};
pub use entity::{Entity, Field, FieldKind, Fragment, Multiplicity, Related, assign, decode};
pub use error::{DrmError, Result};
pub use materialize::{Materializer, RELATION_SEPARATOR, materialize};
pub use relation::{CompiledChain, JoinedAlias, Relation, RelationChain, compile, normalize};
pub use value::{FromValue, Value};
