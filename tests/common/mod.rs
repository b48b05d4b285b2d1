#![cfg(feature = "rusqlite")]
#![allow(dead_code)]

pub mod schema;

pub use schema::*;

use drm::prelude::*;

const CREATE_TABLES: &str = "
    CREATE TABLE partners (
        id INTEGER PRIMARY KEY,
        company TEXT NOT NULL
    );
    CREATE TABLE drivers (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER NOT NULL DEFAULT 0,
        home TEXT,
        partner_id INTEGER
    );
    CREATE TABLE vehicles (
        id INTEGER PRIMARY KEY,
        plate TEXT NOT NULL,
        license TEXT NOT NULL DEFAULT '',
        driver_id INTEGER NOT NULL
    );
    CREATE TABLE trips (
        id INTEGER PRIMARY KEY,
        distance REAL NOT NULL,
        vehicle_id INTEGER NOT NULL
    );
";

pub fn setup_repo() -> Repo {
    let repo = Repo::open_in_memory().expect("Failed to create in-memory database");
    repo.conn()
        .execute_batch(CREATE_TABLES)
        .expect("Failed to create tables");
    repo
}

/// Two partners, three drivers, four vehicles and five trips.
pub fn seed(repo: &Repo) {
    repo.conn()
        .execute_batch(
            "
            INSERT INTO partners (id, company) VALUES (1, 'Grab'), (2, 'Be');
            INSERT INTO drivers (id, name, age, partner_id) VALUES
                (1, 'JohnSmith', 40, 1),
                (2, 'Jane', 30, 2),
                (3, 'JohnSmith Jr', 52, 1);
            INSERT INTO vehicles (id, plate, license, driver_id) VALUES
                (1, '29A-001', 'B2', 1),
                (2, '29A-002', 'C', 1),
                (3, '30F-123', 'B2', 2),
                (4, '51G-777', 'D', 3);
            INSERT INTO trips (id, distance, vehicle_id) VALUES
                (1, 12.5, 1),
                (2, 3.0, 1),
                (3, 7.25, 2),
                (4, 20.0, 3),
                (5, 1.5, 4);
            ",
        )
        .expect("Failed to seed tables");
}

/// In-memory pending write, standing in for a change-tracking component.
#[derive(Debug, Clone)]
pub struct Changes {
    entity: &'static str,
    changes: Vec<(String, Change)>,
    id: Value,
    pub action: Option<Action>,
}

impl Changes {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            changes: Vec::new(),
            id: Value::Null,
            action: None,
        }
    }

    pub fn set(mut self, column: &str, change: impl Into<Change>) -> Self {
        self.changes.push((column.to_owned(), change.into()));
        self
    }

    /// Targets an existing row.
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> i64 {
        match self.id {
            Value::Integer(id) => id,
            ref other => panic!("no integer id: {other:?}"),
        }
    }
}

impl Changeset for Changes {
    fn entity_name(&self) -> &str {
        self.entity
    }

    fn columns(&self) -> Vec<String> {
        self.changes.iter().map(|(column, _)| column.clone()).collect()
    }

    fn change(&self, column: &str) -> Option<&Change> {
        self.changes
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, change)| change)
    }

    fn primary_key(&self) -> Value {
        self.id.clone()
    }

    fn set_primary_key(&mut self, value: Value) {
        self.id = value;
    }

    fn mark(&mut self, action: Action) {
        self.action = Some(action);
    }
}
