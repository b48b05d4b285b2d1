#![cfg(feature = "rusqlite")]

use common::{Driver, Vehicle, seed, setup_repo};
use drm::prelude::*;

mod common;

fn driver_trips() -> RelationChain {
    RelationChain::new()
        .join(
            Relation::new("vehicles", "id", "trips", "vehicle_id").with(
                QueryBuilder::new()
                    .select(col("plate", "vehicles").alias("vehicles$plate"))
                    .select(col("distance", "trips").alias("trips$distance"))
                    .r#where(col("distance", "trips").gt(5.0)),
            ),
        )
        .join(
            Relation::new("drivers", "id", "vehicles", "driver_id").with(
                QueryBuilder::new()
                    .select(col("id", "drivers"))
                    .select(col("name", "drivers")),
            ),
        )
}

#[test]
fn test_chain_materializes_nested_relations() {
    let repo = setup_repo();
    seed(&repo);

    let chain = driver_trips().order_by(col("distance", "trips"), OrderBy::Desc);
    let drivers: Vec<Driver> = repo.fetch_chain(&chain).unwrap();

    let ids: Vec<_> = drivers.iter().map(|d| d.id).collect();
    assert_eq!(ids, [2, 1]);

    let jane = &drivers[0];
    assert_eq!(jane.name, "Jane");
    assert_eq!(jane.vehicles[0].plate, "30F-123");
    assert_eq!(jane.trips[0].distance, 20.0);

    let john = &drivers[1];
    let distances: Vec<_> = john.trips.iter().map(|t| t.distance).collect();
    assert_eq!(distances, [12.5, 7.25]);
    let plates: Vec<_> = john.vehicles.iter().map(|v| v.plate.as_str()).collect();
    assert_eq!(plates, ["29A-001", "29A-002"]);
}

#[test]
fn test_chain_statement() {
    let compiled = driver_trips().compile().unwrap();

    assert_eq!(
        compiled.sql,
        "SELECT `r_1`.`plate` AS `vehicles$plate`, `r_1`.`distance` AS `trips$distance`, \
         `drivers`.`id`, `drivers`.`name` FROM `drivers` INNER JOIN \
         (SELECT `vehicles`.`plate`, `trips`.`distance`, `vehicles`.`driver_id` \
         FROM `vehicles` INNER JOIN `trips` ON `vehicles`.`id` = `trips`.`vehicle_id` \
         WHERE `trips`.`distance` > ?) AS `r_1` ON `drivers`.`id` = `r_1`.`driver_id`"
    );
    assert_eq!(compiled.args, vec![Value::Real(5.0)]);
    assert_eq!(compiled.aliases.len(), 1);
    assert_eq!(compiled.aliases[0].alias, "r_1");
}

#[test]
fn test_chain_three_hops_in_transaction() {
    let mut repo = setup_repo();
    seed(&repo);
    repo.execute("CREATE TABLE stops (id INTEGER PRIMARY KEY, city TEXT NOT NULL, trip_id INTEGER NOT NULL)", &[])
        .unwrap();
    repo.execute(
        "INSERT INTO stops (city, trip_id) VALUES ('Hue', 1), ('Hanoi', 4), ('Hue', 5)",
        &[],
    )
    .unwrap();

    let chain = RelationChain::new()
        .join(Relation::new("trips", "id", "stops", "trip_id").with(
            QueryBuilder::new().r#where(col("city", "stops").eq("Hue")),
        ))
        .join(Relation::new("drivers", "id", "vehicles", "driver_id").with(
            QueryBuilder::new().select(col("id", "drivers")),
        ))
        .join(Relation::new("vehicles", "id", "trips", "vehicle_id").with(
            QueryBuilder::new().select(col("distance", "trips").alias("trips$distance")),
        ))
        .order_by(col("id", "drivers"), OrderBy::Asc);

    let tx = repo.begin(IsolationLevel::Deferred).unwrap();
    let drivers: Vec<Driver> = tx.fetch_chain(&chain).unwrap();
    tx.commit().unwrap();

    let summary: Vec<_> = drivers
        .iter()
        .map(|d| (d.id, d.trips.iter().map(|t| t.distance).collect::<Vec<_>>()))
        .collect();
    assert_eq!(summary, [(1, vec![12.5]), (3, vec![1.5])]);
}

#[test]
fn test_broken_chain_is_rejected() {
    let repo = setup_repo();
    let chain = RelationChain::new()
        .join(Relation::new("drivers", "id", "vehicles", "driver_id"))
        .join(Relation::new("trips", "id", "stops", "trip_id"));
    let result: drm::Result<Vec<Driver>> = repo.fetch_chain(&chain);
    assert!(matches!(result, Err(DrmError::Relation(_))));
}

fn vehicle_partners(partner_columns: QueryBuilder) -> RelationChain {
    RelationChain::new()
        .join(Relation::new("vehicles", "driver_id", "drivers", "id").with(
            QueryBuilder::new()
                .select(col("id", "vehicles"))
                .select(col("plate", "vehicles")),
        ))
        .join(Relation::new("drivers", "partner_id", "partners", "id").with(partner_columns))
        .order_by(col("id", "vehicles"), OrderBy::Asc)
}

#[test]
fn test_chain_joins_back_on_driving_key() {
    let repo = setup_repo();
    seed(&repo);

    let chain = vehicle_partners(
        QueryBuilder::new().select(col("company", "partners").alias("partner$company")),
    );
    let compiled = chain.compile().unwrap();
    assert!(compiled.sql.contains(
        "(SELECT `partners`.`company`, `drivers`.`id` FROM `drivers` INNER JOIN `partners`"
    ));

    let vehicles: Vec<Vehicle> = repo.fetch_chain(&chain).unwrap();
    let rows: Vec<_> = vehicles.iter().map(|v| (v.id, v.driver_id)).collect();
    assert_eq!(rows, [(1, 1), (2, 1), (3, 2), (4, 3)]);
}

#[test]
fn test_nested_output_sharing_join_key_name_is_rejected() {
    let repo = setup_repo();
    seed(&repo);

    let chain = vehicle_partners(
        QueryBuilder::new()
            .select(col("company", "partners").alias("partner$company"))
            .select(col("id", "partners").alias("partner$id")),
    );
    assert!(matches!(chain.compile(), Err(DrmError::Relation(_))));

    let result: drm::Result<Vec<Vehicle>> = repo.fetch_chain(&chain);
    assert!(matches!(result, Err(DrmError::Relation(_))));
}
