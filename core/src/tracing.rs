//! Tracing utilities for query, transaction and materializer observability.
//!
//! Enable the `tracing` feature to emit spans and events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site. The crate-private ones still borrow their arguments so
//! call sites compile warning-free either way. The feature is checked in the crate that expands the
//! macro, so downstream crates forward their own `tracing` feature.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// drm_trace_query!(&sql, args.len());
/// ```
#[macro_export]
macro_rules! drm_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(sql = %$sql, params = $param_count, "drm.query");
    };
}

/// Emit an info-level tracing event for transaction lifecycle (begin, commit, rollback).
///
/// ```ignore
/// drm_trace_tx!("begin", "sqlite.rusqlite");
/// ```
#[macro_export]
macro_rules! drm_trace_tx {
    ($event:literal, $driver:literal) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!(event = $event, driver = $driver, "drm.transaction");
    };
}

/// Emit a debug-level event for a result column that maps onto nothing.
macro_rules! trace_discarded_column {
    ($entity:expr, $column:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(entity = $entity, column = %$column, "drm.materialize.discard");
        #[cfg(not(feature = "tracing"))]
        let _ = (&$entity, &$column);
    };
}

/// Emit a warn-level event for a JSON payload that failed to decode.
macro_rules! trace_json_failure {
    ($entity:expr, $field:expr, $err:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(entity = $entity, field = $field, error = %$err, "drm.materialize.json");
        #[cfg(not(feature = "tracing"))]
        let _ = (&$entity, &$field, &$err);
    };
}

/// Emit a warn-level event for a relation chain item whose table is outside
/// the joined path.
macro_rules! trace_relation_warning {
    ($table:expr, $column:expr, $message:literal) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(table = %$table, column = %$column, $message);
        #[cfg(not(feature = "tracing"))]
        let _ = (&$table, &$column);
    };
}

pub(crate) use trace_discarded_column;
pub(crate) use trace_json_failure;
pub(crate) use trace_relation_warning;
