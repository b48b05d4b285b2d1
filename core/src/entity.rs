//! Statically typed entity descriptors.
//!
//! An [`Entity`] lists its fields once in [`Entity::FIELDS`] and exposes
//! typed setters, so the materializer never looks fields up by reflection.
//! Relation fields hand out [`Fragment`]s: a fresh related instance plus the
//! knowledge of where it goes on the owner.

use core::hash::Hash;

use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::value::{FromValue, Value};

/// Whether a relation field holds one related entity or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain column value
    Scalar,
    /// Column holding a JSON document, decoded into the field
    Json,
    /// Related entity reached through `<field>$<column>` result columns
    Relation(Multiplicity),
}

/// One field of an entity, addressed by its column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
        }
    }

    pub const fn json(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Json,
        }
    }

    pub const fn one(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Relation(Multiplicity::One),
        }
    }

    pub const fn many(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Relation(Multiplicity::Many),
        }
    }
}

/// A type that rows can be materialized into.
///
/// ```ignore
/// impl Entity for Driver {
///     type Key = i64;
///     const NAME: &'static str = "Driver";
///     const FIELDS: &'static [Field] = &[
///         Field::scalar("id"),
///         Field::json("home"),
///         Field::many("vehicles"),
///     ];
///
///     fn key(&self) -> Option<i64> {
///         Some(self.id)
///     }
///
///     fn set(&mut self, field: &str, value: Value) -> Result<()> {
///         match field {
///             "id" => assign(&mut self.id, value),
///             _ => Ok(()),
///         }
///     }
///
///     fn set_json(&mut self, field: &str, raw: &[u8]) -> Result<()> {
///         match field {
///             "home" => decode(&mut self.home, raw),
///             _ => Ok(()),
///         }
///     }
///
///     fn relation(field: &str) -> Option<Box<dyn Fragment<Self>>> {
///         match field {
///             "vehicles" => Some(Related::many(|d: &mut Driver| &mut d.vehicles)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Entity: Default + 'static {
    /// Primary key type used to deduplicate rows.
    type Key: Hash + Eq + Clone;

    /// Type name; the table name is derived from it.
    const NAME: &'static str;

    /// Field descriptors, by column name.
    const FIELDS: &'static [Field];

    /// Table name: lower-cased type name, pluralized with `s`.
    fn table_name() -> String {
        let mut table = Self::NAME.to_lowercase();
        table.push('s');
        table
    }

    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    /// Primary key value, `None` when the row carried no key.
    fn key(&self) -> Option<Self::Key>;

    /// Assigns a scalar field.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;

    /// Decodes a JSON payload into a JSON field.
    fn set_json(&mut self, field: &str, raw: &[u8]) -> Result<()> {
        let _ = (field, raw);
        Ok(())
    }

    /// A fresh related instance for relation field `field`.
    fn relation(field: &str) -> Option<Box<dyn Fragment<Self>>> {
        let _ = field;
        None
    }
}

/// Assigns a scanned cell to a typed field.
pub fn assign<T: FromValue>(slot: &mut T, value: Value) -> Result<()> {
    *slot = T::from_value(value)?;
    Ok(())
}

/// Decodes a JSON payload into a typed field.
pub fn decode<T: DeserializeOwned>(slot: &mut T, raw: &[u8]) -> Result<()> {
    *slot = serde_json::from_slice(raw)?;
    Ok(())
}

/// A related entity under construction for one row, type-erased over the
/// related type.
pub trait Fragment<Owner> {
    fn entity_name(&self) -> &'static str;

    fn field(&self, name: &str) -> Option<&'static Field>;

    fn set(&mut self, field: &str, value: Value) -> Result<()>;

    fn set_json(&mut self, field: &str, raw: &[u8]) -> Result<()>;

    /// Whether the fragment is assigned or appended on attach.
    fn multiplicity(&self) -> Multiplicity;

    /// An empty instance of the same relation.
    fn fresh(&self) -> Box<dyn Fragment<Owner>>;

    /// Places the fragment on `owner`: assigned for one-to-one, appended
    /// for one-to-many.
    fn attach(self: Box<Self>, owner: &mut Owner);
}

enum Placement<Owner, T> {
    One(fn(&mut Owner) -> &mut Option<Box<T>>),
    Many(fn(&mut Owner) -> &mut Vec<T>),
}

impl<Owner, T> Clone for Placement<Owner, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Owner, T> Copy for Placement<Owner, T> {}

/// [`Fragment`] implementation for a concrete related entity `T`.
pub struct Related<Owner, T> {
    entity: T,
    placement: Placement<Owner, T>,
}

impl<Owner: 'static, T: Entity> Related<Owner, T> {
    /// One-to-one relation stored in `Option<Box<T>>`.
    pub fn one(slot: fn(&mut Owner) -> &mut Option<Box<T>>) -> Box<dyn Fragment<Owner>> {
        Box::new(Self {
            entity: T::default(),
            placement: Placement::One(slot),
        })
    }

    /// One-to-many relation stored in `Vec<T>`.
    pub fn many(slot: fn(&mut Owner) -> &mut Vec<T>) -> Box<dyn Fragment<Owner>> {
        Box::new(Self {
            entity: T::default(),
            placement: Placement::Many(slot),
        })
    }
}

impl<Owner: 'static, T: Entity> Fragment<Owner> for Related<Owner, T> {
    fn entity_name(&self) -> &'static str {
        T::NAME
    }

    fn field(&self, name: &str) -> Option<&'static Field> {
        T::field(name)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        self.entity.set(field, value)
    }

    fn set_json(&mut self, field: &str, raw: &[u8]) -> Result<()> {
        self.entity.set_json(field, raw)
    }

    fn multiplicity(&self) -> Multiplicity {
        match self.placement {
            Placement::One(_) => Multiplicity::One,
            Placement::Many(_) => Multiplicity::Many,
        }
    }

    fn fresh(&self) -> Box<dyn Fragment<Owner>> {
        Box::new(Self {
            entity: T::default(),
            placement: self.placement,
        })
    }

    fn attach(self: Box<Self>, owner: &mut Owner) {
        let Related { entity, placement } = *self;
        match placement {
            Placement::One(slot) => *slot(owner) = Some(Box::new(entity)),
            Placement::Many(slot) => slot(owner).push(entity),
        }
    }
}
