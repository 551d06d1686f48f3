use std::path::PathBuf;
use std::sync::Arc;

use kingdom_dkp::workflows::dkp::{
    AdjustmentKind, DkpService, JsonFileSettingsStore, PenaltyColumn, PenaltyRequest, PowerRange,
    RunOptions, SettingsKey, SettingsStore,
};
use kingdom_dkp::workflows::roster::RosterImporter;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "kingdom-dkp-it-{}-{}.json",
        name,
        std::process::id()
    ))
}

fn run_fixture(service: &DkpService<JsonFileSettingsStore>) {
    let start = RosterImporter::from_csv_str(include_str!("../fixtures/kingdom_start.csv"))
        .expect("start imports");
    let end = RosterImporter::from_csv_str(include_str!("../fixtures/kingdom_end.csv"))
        .expect("end imports");
    service
        .run(&start, &end, RunOptions::default())
        .expect("run succeeds");
}

#[test]
fn file_store_survives_a_service_restart() {
    let path = scratch_path("restart");
    let _ = std::fs::remove_file(&path);

    let service =
        DkpService::load(Arc::new(JsonFileSettingsStore::new(&path))).expect("empty store loads");
    service
        .add_power_range(PowerRange::new(0, None, 0.5))
        .expect("add tier");
    run_fixture(&service);
    service
        .add_penalty(PenaltyRequest {
            player_id: "101".to_string(),
            column: PenaltyColumn::parse("KP gained").expect("known column"),
            kind: AdjustmentKind::Percent,
            value: -0.1,
        })
        .expect("checkpoint captured");

    let restarted =
        DkpService::load(Arc::new(JsonFileSettingsStore::new(&path))).expect("reload store");
    let settings = restarted.settings().expect("settings");
    assert_eq!(settings.power_ranges.len(), 1);
    assert_eq!(settings.min_dkp.get("101"), Some(22_500_000));
    assert_eq!(settings.penalties.rules_for("101").len(), 1);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read store")).expect("json");
    let penalty = &raw["penalties"]["101"][0];
    assert_eq!(penalty["column"], "KP gained");
    assert_eq!(penalty["checkpoint"], 60_000_000.0);
    assert_eq!(penalty["appliedValue"], 54_000_000.0);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn export_imports_into_a_fresh_store() {
    let source_path = scratch_path("export-source");
    let target_path = scratch_path("export-target");
    let _ = std::fs::remove_file(&source_path);
    let _ = std::fs::remove_file(&target_path);

    let source = DkpService::load(Arc::new(JsonFileSettingsStore::new(&source_path)))
        .expect("source loads");
    source
        .add_power_range(PowerRange::new(0, None, 0.4))
        .expect("add tier");
    run_fixture(&source);
    let bundle = source.export_settings().expect("export");
    let document = serde_json::to_string_pretty(&bundle).expect("encode bundle");

    let target_store = Arc::new(JsonFileSettingsStore::new(&target_path));
    let target = DkpService::load(target_store.clone()).expect("target loads");
    let changed = target
        .import_settings(serde_json::from_str(&document).expect("decode bundle"))
        .expect("import");

    assert_eq!(changed.len(), SettingsKey::ALL.len());
    assert_eq!(
        target_store
            .load(SettingsKey::MinDkp)
            .expect("load")
            .expect("baselines stored")["102"],
        32_000_000
    );
    assert_eq!(
        target.settings().expect("settings"),
        source.settings().expect("settings")
    );

    let _ = std::fs::remove_file(&source_path);
    let _ = std::fs::remove_file(&target_path);
}
