use drm::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub label: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub home: Option<Location>,
    pub vehicles: Vec<Vehicle>,
    pub trips: Vec<Trip>,
    pub partner: Option<Box<Partner>>,
}

impl Entity for Driver {
    type Key = i64;
    const NAME: &'static str = "Driver";
    const FIELDS: &'static [Field] = &[
        Field::scalar("id"),
        Field::scalar("name"),
        Field::scalar("age"),
        Field::json("home"),
        Field::many("vehicles"),
        Field::many("trips"),
        Field::one("partner"),
    ];

    fn key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn set(&mut self, field: &str, value: Value) -> drm::Result<()> {
        match field {
            "id" => assign(&mut self.id, value),
            "name" => assign(&mut self.name, value),
            "age" => assign(&mut self.age, value),
            _ => Ok(()),
        }
    }

    fn set_json(&mut self, field: &str, raw: &[u8]) -> drm::Result<()> {
        match field {
            "home" => decode(&mut self.home, raw),
            _ => Ok(()),
        }
    }

    fn relation(field: &str) -> Option<Box<dyn Fragment<Self>>> {
        match field {
            "vehicles" => Some(Related::many(|d: &mut Driver| &mut d.vehicles)),
            "trips" => Some(Related::many(|d: &mut Driver| &mut d.trips)),
            "partner" => Some(Related::one(|d: &mut Driver| &mut d.partner)),
            _ => None,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub plate: String,
    pub license: String,
    pub driver_id: i64,
}

impl Entity for Vehicle {
    type Key = i64;
    const NAME: &'static str = "Vehicle";
    const FIELDS: &'static [Field] = &[
        Field::scalar("id"),
        Field::scalar("plate"),
        Field::scalar("license"),
        Field::scalar("driver_id"),
    ];

    fn key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn set(&mut self, field: &str, value: Value) -> drm::Result<()> {
        match field {
            "id" => assign(&mut self.id, value),
            "plate" => assign(&mut self.plate, value),
            "license" => assign(&mut self.license, value),
            "driver_id" => assign(&mut self.driver_id, value),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Trip {
    pub id: i64,
    pub distance: f64,
    pub vehicle_id: i64,
}

impl Entity for Trip {
    type Key = i64;
    const NAME: &'static str = "Trip";
    const FIELDS: &'static [Field] = &[
        Field::scalar("id"),
        Field::scalar("distance"),
        Field::scalar("vehicle_id"),
    ];

    fn key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn set(&mut self, field: &str, value: Value) -> drm::Result<()> {
        match field {
            "id" => assign(&mut self.id, value),
            "distance" => assign(&mut self.distance, value),
            "vehicle_id" => assign(&mut self.vehicle_id, value),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Partner {
    pub id: i64,
    pub company: String,
}

impl Entity for Partner {
    type Key = i64;
    const NAME: &'static str = "Partner";
    const FIELDS: &'static [Field] = &[Field::scalar("id"), Field::scalar("company")];

    fn key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn set(&mut self, field: &str, value: Value) -> drm::Result<()> {
        match field {
            "id" => assign(&mut self.id, value),
            "company" => assign(&mut self.company, value),
            _ => Ok(()),
        }
    }
}
