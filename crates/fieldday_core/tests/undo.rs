use chrono::NaiveDate;
use fieldday_core::{
    ChangeEvent, Engine, FieldDayId, FixedClock, PlaceDraft, PlaceTag, UndoActionKind, ZoneId,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn engine() -> Engine {
    let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    Engine::open_in_memory(Box::new(clock)).unwrap()
}

fn planned_day(engine: &mut Engine, titles: &[&str]) -> (ZoneId, FieldDayId) {
    let zone_id = engine.create_zone("Downtown", "").unwrap();
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    for title in titles {
        let draft = PlaceDraft::new(*title, PlaceTag::Errands, 20, 5);
        let place_id = engine.create_place(zone_id, draft).unwrap();
        assert!(engine.deploy_stop(day_id, zone_id, place_id));
    }
    (zone_id, day_id)
}

fn stop_titles(engine: &Engine, day_id: FieldDayId) -> Vec<String> {
    engine
        .field_day(day_id)
        .unwrap()
        .stops
        .iter()
        .map(|stop| stop.title.clone())
        .collect()
}

#[test]
fn deleted_zone_comes_back_once() {
    let mut engine = engine();
    let a = engine.create_zone("A", "").unwrap();
    let b = engine.create_zone("B", "mappin").unwrap();
    let c = engine.create_zone("C", "").unwrap();
    engine
        .create_place(b, PlaceDraft::new("Bank", PlaceTag::Errands, 20, 10))
        .unwrap();
    let original = engine.zone(b).unwrap().clone();

    assert!(engine.delete_zone(b));
    assert_eq!(engine.undo_available(), Some(UndoActionKind::DeleteZone));
    assert_eq!(engine.zone(c).unwrap().sort_index, 1);

    assert!(engine.execute_undo());

    let restored = engine.zone(b).unwrap();
    assert_eq!(restored, &original);
    let order: Vec<ZoneId> = engine
        .active_zones_sorted()
        .iter()
        .map(|zone| zone.id)
        .collect();
    assert_eq!(order, vec![a, b, c]);
    assert_eq!(engine.zone(c).unwrap().sort_index, 2);

    assert!(!engine.execute_undo());
    assert_eq!(engine.undo_available(), None);
}

#[test]
fn deleted_place_returns_to_its_position() {
    let mut engine = engine();
    let zone_id = engine.create_zone("Downtown", "").unwrap();
    let ids: Vec<_> = ["Bank", "Bakery", "Clinic"]
        .iter()
        .map(|title| {
            engine
                .create_place(zone_id, PlaceDraft::new(*title, PlaceTag::Errands, 10, 5))
                .unwrap()
        })
        .collect();

    assert!(engine.delete_place(zone_id, ids[1]));
    assert!(engine.execute_undo());

    let titles: Vec<_> = engine
        .zone(zone_id)
        .unwrap()
        .places
        .iter()
        .map(|place| place.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Bank", "Bakery", "Clinic"]);
}

#[test]
fn a_new_snapshot_replaces_the_previous_one() {
    let mut engine = engine();
    let doomed = engine.create_zone("Doomed", "").unwrap();
    let zone_id = engine.create_zone("Kept", "").unwrap();
    let place_id = engine
        .create_place(zone_id, PlaceDraft::new("Bank", PlaceTag::Errands, 10, 5))
        .unwrap();

    assert!(engine.delete_zone(doomed));
    assert!(engine.delete_place(zone_id, place_id));
    assert_eq!(engine.undo_available(), Some(UndoActionKind::DeletePlace));

    assert!(engine.execute_undo());
    assert!(engine.place(zone_id, place_id).is_some());
    assert!(engine.zone(doomed).is_none());
    assert!(!engine.execute_undo());
}

#[test]
fn queue_mutations_restore_the_whole_queue() {
    let mut engine = engine();
    let (_, day_id) = planned_day(&mut engine, &["A", "B", "C"]);
    let original = engine.field_day(day_id).unwrap().stops.clone();

    let middle = original[1].id;
    assert!(engine.withdraw_stop(day_id, middle));
    assert!(engine.execute_undo());
    assert_eq!(engine.field_day(day_id).unwrap().stops, original);

    assert!(engine.reorder_stops(day_id, &[0], 3));
    assert_eq!(stop_titles(&engine, day_id), vec!["B", "C", "A"]);
    assert!(engine.execute_undo());
    assert_eq!(stop_titles(&engine, day_id), vec!["A", "B", "C"]);

    assert!(engine.clear_today_plan());
    assert_eq!(engine.undo_available(), Some(UndoActionKind::ClearPlan));
    assert!(engine.execute_undo());
    assert_eq!(engine.field_day(day_id).unwrap().stops, original);
}

#[test]
fn reset_day_is_restored_unless_replanned() {
    let mut engine = engine();
    let (zone_id, day_id) = planned_day(&mut engine, &["A"]);
    let original = engine.field_day(day_id).unwrap().clone();

    assert!(engine.reset_today());
    assert!(engine.execute_undo());
    assert_eq!(engine.current_field_day(), Some(&original));

    assert!(engine.reset_today());
    let replanned = engine.assign_today_zone(zone_id).unwrap();
    assert!(!engine.execute_undo());
    assert_eq!(engine.current_field_day().unwrap().id, replanned);
    assert_eq!(engine.field_days().len(), 1);
}

#[test]
fn snapshot_expires_after_the_window() {
    let mut engine = engine();
    engine.set_undo_window(Duration::from_millis(40));
    let zone_id = engine.create_zone("Downtown", "").unwrap();

    assert!(engine.delete_zone(zone_id));
    thread::sleep(Duration::from_millis(150));

    assert_eq!(engine.undo_available(), None);
    assert!(!engine.execute_undo());
    assert!(engine.zone(zone_id).is_none());
}

#[test]
fn undo_events_are_published() {
    let mut engine = engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    let zone_id = engine.create_zone("Downtown", "").unwrap();

    assert!(engine.delete_zone(zone_id));
    assert!(engine.execute_undo());
    assert!(!engine.execute_undo());

    let events = seen.lock().unwrap().clone();
    let armed = events
        .iter()
        .position(|event| *event == ChangeEvent::UndoArmed(UndoActionKind::DeleteZone))
        .unwrap();
    let cleared = events
        .iter()
        .position(|event| *event == ChangeEvent::UndoCleared)
        .unwrap();
    assert!(armed < cleared);
    assert_eq!(
        events
            .iter()
            .filter(|event| **event == ChangeEvent::UndoCleared)
            .count(),
        1
    );
}
