//! Reconstruction of entity graphs from flat result rows.
//!
//! Columns are resolved once per result set:
//!
//! ```text
//! id              -> scalar field `id` of the root entity
//! home            -> JSON field `home` of the root entity
//! vehicles$plate  -> field `plate` of the related entity behind `vehicles`
//! anything else   -> discarded
//! ```
//!
//! Every row builds a root entity plus at most one related instance per
//! relation field. Rows are then merged by primary key: the first row of a
//! key creates the entity, later rows only contribute relation fragments.

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use crate::entity::{Entity, FieldKind, Fragment};
use crate::error::{DrmError, Result};
use crate::tracing::{trace_discarded_column, trace_json_failure};
use crate::value::Value;

/// Separator between relation field and column in result column names.
pub const RELATION_SEPARATOR: char = '$';

/// Where a result column goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Scalar(&'static str),
    Json(&'static str),
    Related {
        slot: usize,
        field: &'static str,
        json: bool,
    },
    Discard,
}

/// Incremental row-to-entity materialization for one result set.
pub struct Materializer<T: Entity> {
    plan: Vec<Target>,
    relations: Vec<Box<dyn Fragment<T>>>,
    by_key: HashMap<T::Key, T>,
    ordered_keys: Vec<T::Key>,
    ordered: bool,
}

impl<T: Entity> Materializer<T> {
    /// Resolves `columns` against `T`.
    ///
    /// With `ordered`, entities are emitted in first-seen key order, which is
    /// only meaningful when the query carries an `ORDER BY`.
    ///
    /// Fails when a relation field's declared multiplicity disagrees with the
    /// fragment [`Entity::relation`] hands out for it.
    pub fn new<S: AsRef<str>>(columns: &[S], ordered: bool) -> Result<Self> {
        let mut relations: Vec<(&'static str, Box<dyn Fragment<T>>)> = Vec::new();
        let plan: Vec<Target> = columns
            .iter()
            .map(|column| resolve::<T>(column.as_ref(), &mut relations))
            .collect::<Result<_>>()?;

        Ok(Self {
            plan,
            relations: relations.into_iter().map(|(_, template)| template).collect(),
            by_key: HashMap::new(),
            ordered_keys: Vec::new(),
            ordered,
        })
    }

    /// Scans one row and merges it into the state.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        let mut root = T::default();
        let mut fragments: Vec<Option<Box<dyn Fragment<T>>>> =
            self.relations.iter().map(|_| None).collect();
        let mut pending_json: Vec<(Option<usize>, &'static str, Value)> = Vec::new();

        for (target, value) in self.plan.iter().zip(row) {
            match *target {
                Target::Scalar(field) => root.set(field, value)?,
                Target::Json(field) => pending_json.push((None, field, value)),
                Target::Related { slot, field, json } => {
                    let fragment =
                        fragments[slot].get_or_insert_with(|| self.relations[slot].fresh());
                    if json {
                        pending_json.push((Some(slot), field, value));
                    } else {
                        fragment.set(field, value)?;
                    }
                }
                Target::Discard => {}
            }
        }

        for (slot, field, value) in pending_json {
            // NULL payloads leave the field at its default
            let Some(raw) = value.as_bytes() else {
                continue;
            };
            let decoded = match slot {
                None => root.set_json(field, raw),
                Some(slot) => match fragments[slot].as_mut() {
                    Some(fragment) => fragment.set_json(field, raw),
                    None => Ok(()),
                },
            };
            if let Err(err) = decoded {
                trace_json_failure!(T::NAME, field, err);
            }
        }

        let Some(key) = root.key() else {
            return Ok(());
        };
        let entity = match self.by_key.entry(key) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                if self.ordered {
                    self.ordered_keys.push(slot.key().clone());
                }
                slot.insert(root)
            }
        };
        for fragment in fragments.into_iter().flatten() {
            fragment.attach(entity);
        }
        Ok(())
    }

    /// Number of distinct entities seen so far.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Emits every entity once.
    ///
    /// Unordered materializers emit in map iteration order, which is not
    /// stable.
    pub fn finish(self) -> Vec<T> {
        let Self {
            mut by_key,
            ordered_keys,
            ordered,
            ..
        } = self;

        if !ordered {
            return by_key.into_values().collect();
        }
        ordered_keys
            .iter()
            .filter_map(|key| by_key.remove(key))
            .collect()
    }
}

fn resolve<T: Entity>(
    column: &str,
    relations: &mut Vec<(&'static str, Box<dyn Fragment<T>>)>,
) -> Result<Target> {
    if let Some(field) = T::field(column) {
        return Ok(match field.kind {
            FieldKind::Scalar => Target::Scalar(field.name),
            FieldKind::Json => Target::Json(field.name),
            FieldKind::Relation(_) => {
                trace_discarded_column!(T::NAME, column);
                Target::Discard
            }
        });
    }

    let mut parts = column.split(RELATION_SEPARATOR);
    let (Some(relation), Some(sub), None) = (parts.next(), parts.next(), parts.next()) else {
        trace_discarded_column!(T::NAME, column);
        return Ok(Target::Discard);
    };
    let Some((relation_field, declared)) = T::field(relation).and_then(|f| match f.kind {
        FieldKind::Relation(multiplicity) => Some((f, multiplicity)),
        _ => None,
    }) else {
        trace_discarded_column!(T::NAME, column);
        return Ok(Target::Discard);
    };

    let slot = match relations.iter().position(|(name, _)| *name == relation_field.name) {
        Some(slot) => slot,
        None => {
            let Some(template) = T::relation(relation_field.name) else {
                trace_discarded_column!(T::NAME, column);
                return Ok(Target::Discard);
            };
            if template.multiplicity() != declared {
                return Err(DrmError::Mapping(format!(
                    "{}.{} is declared {:?} but its relation is {:?}",
                    T::NAME,
                    relation_field.name,
                    declared,
                    template.multiplicity()
                )));
            }
            relations.push((relation_field.name, template));
            relations.len() - 1
        }
    };

    Ok(match relations[slot].1.field(sub) {
        Some(field) if field.kind == FieldKind::Scalar => Target::Related {
            slot,
            field: field.name,
            json: false,
        },
        Some(field) if field.kind == FieldKind::Json => Target::Related {
            slot,
            field: field.name,
            json: true,
        },
        _ => {
            trace_discarded_column!(relations[slot].1.entity_name(), column);
            Target::Discard
        }
    })
}

/// Materializes a whole row stream.
pub fn materialize<T, S, I>(columns: &[S], rows: I, ordered: bool) -> Result<Vec<T>>
where
    T: Entity,
    S: AsRef<str>,
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut materializer = Materializer::<T>::new(columns, ordered)?;
    for row in rows {
        materializer.push_row(row)?;
    }
    Ok(materializer.finish())
}
