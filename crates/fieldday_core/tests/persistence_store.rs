use chrono::NaiveDate;
use fieldday_core::db::open_db;
use fieldday_core::model::medal::MEDAL_CATALOG;
use fieldday_core::{
    CommandCenterConfig, Engine, FieldMedal, FixedClock, PersistenceStore, PlaceDraft, PlaceTag,
    StorageUnit, Zone,
};
use std::path::Path;

const LEGACY_ZONE_ID: &str = "6f1c3c1e-3b7a-4d43-9d0b-6a1f2b3c4d5e";

fn clock() -> Box<FixedClock> {
    Box::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()))
}

fn write_raw_unit(path: &Path, unit_key: &str, payload: &str) {
    let conn = open_db(path).unwrap();
    conn.execute(
        "INSERT INTO storage_units (unit_key, payload) VALUES (?1, ?2)
         ON CONFLICT(unit_key) DO UPDATE SET payload = excluded.payload;",
        [unit_key, payload],
    )
    .unwrap();
}

#[test]
fn saved_collections_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fieldday.sqlite3");

    let (zones, days, config, medals) = {
        let mut engine = Engine::new(PersistenceStore::open(&path).unwrap(), clock());
        let zone_id = engine.create_zone("Downtown", "building.2").unwrap();
        let place_id = engine
            .create_place(zone_id, PlaceDraft::new("Bank", PlaceTag::Errands, 20, 10))
            .unwrap();
        let day_id = engine.assign_today_zone(zone_id).unwrap();
        assert!(engine.deploy_stop(day_id, zone_id, place_id));
        assert!(engine.update_callsign("Ranger One"));
        assert!(engine.flush());
        (
            engine.zones().to_vec(),
            engine.field_days().to_vec(),
            engine.config().clone(),
            engine.medals().to_vec(),
        )
    };

    let reopened = Engine::new(PersistenceStore::open(&path).unwrap(), clock());
    assert_eq!(reopened.zones(), zones.as_slice());
    assert_eq!(reopened.field_days(), days.as_slice());
    assert_eq!(reopened.config(), &config);
    assert_eq!(reopened.medals(), medals.as_slice());
    assert!(reopened
        .medals()
        .iter()
        .any(|medal| medal.id == "first_zone" && medal.is_unlocked));
}

#[test]
fn missing_units_load_as_defaults() {
    let store = PersistenceStore::open_in_memory().unwrap();

    assert!(store.load::<Vec<Zone>>(StorageUnit::Zones).is_empty());
    assert_eq!(
        store.load::<CommandCenterConfig>(StorageUnit::Config),
        CommandCenterConfig::default()
    );
    let medals = store.load_medals();
    assert_eq!(medals.len(), MEDAL_CATALOG.len());
    assert!(medals.iter().all(|medal| !medal.is_unlocked));
}

#[test]
fn drifted_version_is_backed_up_and_still_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drift.sqlite3");
    let raw = format!(
        r#"{{"schemaVersion":0,"data":[{{"id":"{LEGACY_ZONE_ID}","title":"Harbor","created_at":1,"updated_at":1}}]}}"#
    );
    write_raw_unit(&path, "zones", &raw);

    let store = PersistenceStore::open(&path).unwrap();
    let zones: Vec<Zone> = store.load(StorageUnit::Zones);

    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].title, "Harbor");
    assert!(zones[0].places.is_empty());
    assert_eq!(store.read_backup(StorageUnit::Zones).as_deref(), Some(raw.as_str()));
}

#[test]
fn legacy_unwrapped_payload_is_decoded_after_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite3");
    let raw = format!(
        r#"[{{"id":"{LEGACY_ZONE_ID}","title":"Old Town","created_at":5,"updated_at":5,"is_pinned":true}}]"#
    );
    write_raw_unit(&path, "zones", &raw);

    let store = PersistenceStore::open(&path).unwrap();
    let zones: Vec<Zone> = store.load(StorageUnit::Zones);

    assert_eq!(zones.len(), 1);
    assert!(zones[0].is_pinned);
    assert!(store.read_backup(StorageUnit::Zones).is_some());
}

#[test]
fn undecodable_unit_falls_back_to_default_and_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.sqlite3");
    write_raw_unit(&path, "field_days", "not json at all");

    let store = PersistenceStore::open(&path).unwrap();
    let days: Vec<fieldday_core::FieldDay> = store.load(StorageUnit::FieldDays);

    assert!(days.is_empty());
    assert_eq!(
        store.read_backup(StorageUnit::FieldDays).as_deref(),
        Some("not json at all")
    );
}

#[test]
fn current_version_does_not_create_backup() {
    let store = PersistenceStore::open_in_memory().unwrap();
    let config = CommandCenterConfig {
        streak_count: 4,
        ..CommandCenterConfig::default()
    };
    store.save(StorageUnit::Config, &config);
    assert!(store.flush());

    assert_eq!(store.load::<CommandCenterConfig>(StorageUnit::Config), config);
    assert!(store.read_backup(StorageUnit::Config).is_none());
}

#[test]
fn stored_medals_merge_with_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medals.sqlite3");
    let stored = vec![
        FieldMedal {
            id: "first_zone".to_string(),
            title: "Outdated title".to_string(),
            description: String::new(),
            icon: String::new(),
            is_unlocked: true,
            unlocked_at: Some(42),
        },
        FieldMedal {
            id: "retired_medal".to_string(),
            title: "Gone".to_string(),
            description: String::new(),
            icon: String::new(),
            is_unlocked: true,
            unlocked_at: Some(7),
        },
    ];
    let payload = serde_json::json!({ "schemaVersion": 1, "data": stored }).to_string();
    write_raw_unit(&path, "medals", &payload);

    let medals = PersistenceStore::open(&path).unwrap().load_medals();

    assert_eq!(medals.len(), MEDAL_CATALOG.len());
    let first_zone = medals.iter().find(|medal| medal.id == "first_zone").unwrap();
    assert!(first_zone.is_unlocked);
    assert_eq!(first_zone.unlocked_at, Some(42));
    assert_ne!(first_zone.title, "Outdated title");
    assert!(medals.iter().all(|medal| medal.id != "retired_medal"));
}

#[test]
fn nuclear_reset_restores_defaults_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reset.sqlite3");
    {
        let mut engine = Engine::new(PersistenceStore::open(&path).unwrap(), clock());
        engine.create_zone("Downtown", "").unwrap();
        engine.nuclear_reset();
        assert!(engine.zones().is_empty());
        assert!(engine.medals().iter().all(|medal| !medal.is_unlocked));
        assert!(engine.flush());
    }

    let reopened = Engine::new(PersistenceStore::open(&path).unwrap(), clock());
    assert!(reopened.zones().is_empty());
    assert_eq!(reopened.config(), &CommandCenterConfig::default());
    assert!(reopened.medals().iter().all(|medal| !medal.is_unlocked));
}

#[test]
fn settings_updates_are_validated() {
    let mut engine = Engine::open_in_memory(clock()).unwrap();

    let unordered = CommandCenterConfig {
        dense_threshold_min: 500,
        critical_threshold_min: 400,
        ..engine.config().clone()
    };
    assert!(!engine.update_config(unordered));
    assert_eq!(engine.config(), &CommandCenterConfig::default());

    assert!(!engine.update_avatar("   "));
    assert!(engine.update_avatar(" star.fill "));
    assert_eq!(engine.config().profile.avatar, "star.fill");
    assert!(!engine.update_callsign(""));

    assert!(!engine.set_notifications(true, 24, 0));
    assert!(!engine.set_notifications(true, 7, 60));
    assert!(engine.set_notifications(false, 21, 30));
    assert!(!engine.config().notifications.enabled);
    assert_eq!(engine.config().notifications.reminder_hour, 21);

    engine.set_onboarding_completed(true);
    assert!(engine.config().onboarding_completed);
}
