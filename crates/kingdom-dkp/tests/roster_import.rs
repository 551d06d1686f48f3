use kingdom_dkp::workflows::roster::{RosterImportError, RosterImporter};

#[test]
fn importer_reads_fixture_export() {
    let rows = RosterImporter::from_reader(&include_bytes!("../fixtures/kingdom_start.csv")[..])
        .expect("fixture imports");

    assert_eq!(rows.len(), 4, "blank-id row is dropped");
    let aria = rows.iter().find(|row| row.id == "101").expect("Aria present");
    assert_eq!(aria.name.as_deref(), Some("Aria"));
    assert_eq!(aria.power, Some(45_000_000.0));
    assert_eq!(aria.killpoints, 1_200_000_000.0);
    assert_eq!(aria.deads, Some(300_000.0));
    assert_eq!(aria.t4_kills, 2_000_000.0);
    assert_eq!(aria.t5_kills, 500_000.0);
    assert_eq!(aria.city_hall, Some(25.0));
    assert_eq!(aria.acclaim, 1200.0);
}

#[test]
fn importer_keeps_file_order() {
    let rows = RosterImporter::from_path(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/fixtures/kingdom_end.csv"
    ))
    .expect("fixture imports");

    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103", "105"]);
}

#[test]
fn export_without_id_column_is_rejected() {
    let error = RosterImporter::from_csv_str("Username,Power\nAria,10\n")
        .expect_err("no id column");

    assert!(matches!(error, RosterImportError::MissingIdColumn));
    assert_eq!(error.to_string(), "roster export has no player id column");
}
