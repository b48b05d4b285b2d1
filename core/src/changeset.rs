//! Contract for pending writes and the `INSERT`/`UPDATE` statements they
//! render to.

use crate::clause::write_ident;
use crate::value::Value;

/// Outcome recorded on a changeset once its statement ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Inserted,
    Updated,
}

/// A touched column of a changeset.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub value: Value,
    /// Column name written instead of the field name, used for relation key
    /// columns (`driver` + `_id`).
    pub rename: Option<String>,
    /// Key generated by the database on insert.
    pub auto_increment: bool,
}

impl Change {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            rename: None,
            auto_increment: false,
        }
    }

    pub fn renamed(mut self, column: impl Into<String>) -> Self {
        self.rename = Some(column.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// A pending write computed by a change-tracking component.
pub trait Changeset {
    /// Type name of the changed entity.
    fn entity_name(&self) -> &str;

    /// Touched columns, in write order.
    fn columns(&self) -> Vec<String>;

    fn change(&self, column: &str) -> Option<&Change>;

    /// Current primary key value.
    fn primary_key(&self) -> Value;

    fn set_primary_key(&mut self, value: Value);

    fn mark(&mut self, action: Action);

    fn primary_key_column(&self) -> &str {
        "Id"
    }

    /// Table name: lower-cased entity name, pluralized with `s`.
    fn table_name(&self) -> String {
        let mut table = self.entity_name().to_lowercase();
        table.push('s');
        table
    }

    /// Whether an insert should write the generated key back.
    fn needs_generated_key(&self) -> bool {
        match self.change(self.primary_key_column()) {
            Some(change) => change.auto_increment,
            None => true,
        }
    }
}

/// Touched columns paired with the name they are written under.
fn written_columns<C: Changeset + ?Sized>(cs: &C) -> Vec<(String, Value)> {
    cs.columns()
        .into_iter()
        .filter_map(|column| {
            let change = cs.change(&column)?;
            let name = change.rename.clone().unwrap_or(column);
            Some((name, change.value.clone()))
        })
        .collect()
}

/// `INSERT INTO `table` (`a`, `b`) VALUES (?, ?)`
pub fn insert_query<C: Changeset + ?Sized>(cs: &C) -> (String, Vec<Value>) {
    let mut sql = String::from("INSERT INTO ");
    write_ident(&cs.table_name(), &mut sql);
    sql.push_str(" (");

    let written = written_columns(cs);
    let mut args = Vec::with_capacity(written.len());
    for (i, (name, value)) in written.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        write_ident(&name, &mut sql);
        args.push(value);
    }

    sql.push_str(") VALUES (");
    sql.push_str(&vec!["?"; args.len()].join(", "));
    sql.push(')');
    (sql, args)
}

/// `UPDATE `table` SET `a` = ?, `b` = ? WHERE `Id` = ?`, the key bound last.
pub fn update_query<C: Changeset + ?Sized>(cs: &C) -> (String, Vec<Value>) {
    let mut sql = String::from("UPDATE ");
    write_ident(&cs.table_name(), &mut sql);
    sql.push_str(" SET ");

    let written = written_columns(cs);
    let mut args = Vec::with_capacity(written.len() + 1);
    for (i, (name, value)) in written.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        write_ident(&name, &mut sql);
        sql.push_str(" = ?");
        args.push(value);
    }

    sql.push_str(" WHERE ");
    write_ident(cs.primary_key_column(), &mut sql);
    sql.push_str(" = ?");
    args.push(cs.primary_key());
    (sql, args)
}
