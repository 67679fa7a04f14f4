use chrono::NaiveDate;
use fieldday_core::{
    ChangeEvent, CommandCenterConfig, Engine, FieldDayId, FixedClock, MissionStatus, PlaceDraft,
    PlaceId, PlaceTag, ZoneId,
};
use std::sync::{Arc, Mutex};

fn setup(stop_count: usize) -> (Engine, FixedClock, ZoneId, Vec<PlaceId>) {
    let clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
    let mut engine = Engine::open_in_memory(Box::new(clock.clone())).unwrap();
    let zone_id = engine.create_zone("Downtown", "").unwrap();
    let place_ids = (0..stop_count)
        .map(|index| {
            let draft = PlaceDraft::new(format!("Stop {index}"), PlaceTag::Errands, 20, 10);
            engine.create_place(zone_id, draft).unwrap()
        })
        .collect();
    (engine, clock, zone_id, place_ids)
}

/// Plans today with every place and accomplishes each stop in order.
fn accomplish_today(engine: &mut Engine, zone_id: ZoneId, place_ids: &[PlaceId]) -> FieldDayId {
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    for place_id in place_ids {
        assert!(engine.deploy_stop(day_id, zone_id, *place_id));
    }
    let stop_ids: Vec<_> = engine
        .field_day(day_id)
        .unwrap()
        .stops
        .iter()
        .map(|stop| stop.id)
        .collect();
    for stop_id in stop_ids {
        assert!(engine.toggle_stop(day_id, stop_id));
    }
    day_id
}

#[test]
fn finishing_the_last_stop_awards_the_mission() {
    let (mut engine, _, zone_id, place_ids) = setup(3);
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    for place_id in &place_ids {
        assert!(engine.deploy_stop(day_id, zone_id, *place_id));
    }
    let stop_ids: Vec<_> = engine
        .field_day(day_id)
        .unwrap()
        .stops
        .iter()
        .map(|stop| stop.id)
        .collect();
    assert!(engine.toggle_stop(day_id, stop_ids[0]));
    assert!(engine.toggle_stop(day_id, stop_ids[1]));
    assert_eq!(engine.config().lifetime_points, 0);

    assert!(engine.toggle_stop(day_id, stop_ids[2]));

    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::Accomplished
    );
    assert_eq!(engine.config().lifetime_points, 30);
    assert_eq!(engine.config().total_missions_accomplished, 1);
    assert_eq!(engine.config().current_rank_index, 0);
    assert_eq!(engine.current_rank().title, "Recruit");
    assert_eq!(engine.missions_to_next_rank(), Some(2));
}

#[test]
fn third_mission_promotes_to_next_rank() {
    let (mut engine, clock, zone_id, place_ids) = setup(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    for _ in 0..3 {
        accomplish_today(&mut engine, zone_id, &place_ids);
        clock.advance_days(1);
    }

    assert_eq!(engine.config().total_missions_accomplished, 3);
    assert_eq!(engine.config().current_rank_index, 1);
    assert_eq!(engine.current_rank().title, "Scout");
    let promotions: Vec<_> = seen
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, ChangeEvent::RankPromoted { .. }))
        .cloned()
        .collect();
    assert_eq!(promotions, vec![ChangeEvent::RankPromoted { rank_index: 1 }]);
}

#[test]
fn streak_grows_on_consecutive_days_and_resets_after_a_gap() {
    let (mut engine, clock, zone_id, place_ids) = setup(1);

    accomplish_today(&mut engine, zone_id, &place_ids);
    assert_eq!(engine.config().streak_count, 1);
    clock.advance_days(1);
    accomplish_today(&mut engine, zone_id, &place_ids);
    assert_eq!(engine.config().streak_count, 2);
    clock.advance_days(1);
    accomplish_today(&mut engine, zone_id, &place_ids);
    assert_eq!(engine.config().streak_count, 3);

    clock.advance_days(2);
    accomplish_today(&mut engine, zone_id, &place_ids);
    assert_eq!(engine.config().streak_count, 1);
    assert_eq!(engine.config().longest_streak, 3);
    assert_eq!(engine.lifetime_stats().longest_streak, 3);
    assert!(engine
        .medals()
        .iter()
        .any(|medal| medal.id == "streak_3" && medal.is_unlocked));
}

#[test]
fn streak_is_credited_once_per_day() {
    let (mut engine, _, zone_id, place_ids) = setup(1);
    let day_id = accomplish_today(&mut engine, zone_id, &place_ids);
    let stop_id = engine.field_day(day_id).unwrap().stops[0].id;

    assert!(engine.toggle_stop(day_id, stop_id));
    assert!(engine.toggle_stop(day_id, stop_id));

    assert_eq!(engine.config().streak_count, 1);
    assert_eq!(
        engine.config().last_streak_date_key.as_deref(),
        Some("2026-10-01")
    );
}

#[test]
fn medals_unlock_once_and_keep_their_timestamp() {
    let (mut engine, clock, zone_id, place_ids) = setup(1);
    let unlocked_at = |engine: &Engine, id: &str| {
        engine
            .medals()
            .iter()
            .find(|medal| medal.id == id)
            .and_then(|medal| medal.unlocked_at)
    };
    let first_zone_at = unlocked_at(&engine, "first_zone");
    assert!(first_zone_at.is_some());
    assert!(unlocked_at(&engine, "first_place").is_some());
    assert!(unlocked_at(&engine, "first_mission").is_none());

    clock.advance_days(3);
    accomplish_today(&mut engine, zone_id, &place_ids);
    engine.create_zone("Harbor", "").unwrap();

    assert_eq!(unlocked_at(&engine, "first_zone"), first_zone_at);
    assert!(unlocked_at(&engine, "first_mission").is_some());
    assert!(unlocked_at(&engine, "perfect_day").is_some());
    assert!(unlocked_at(&engine, "overload_survivor").is_none());

    assert!(engine.delete_zone(zone_id));
    assert!(unlocked_at(&engine, "first_zone").is_some());
}

#[test]
fn finishing_a_critical_day_unlocks_overload_survivor() {
    let (mut engine, _, zone_id, place_ids) = setup(2);
    let config = CommandCenterConfig {
        dense_threshold_min: 20,
        critical_threshold_min: 40,
        ..engine.config().clone()
    };
    assert!(engine.update_config(config));

    let day_id = accomplish_today(&mut engine, zone_id, &place_ids);

    let report = engine.pressure(day_id).unwrap();
    assert_eq!(report.total_planned_min, 60);
    assert_eq!(report.pressure_delta_min, 20);
    assert!(engine
        .medals()
        .iter()
        .any(|medal| medal.id == "overload_survivor" && medal.is_unlocked));
}

#[test]
fn zone_architect_needs_three_zones_with_five_places() {
    let (mut engine, _, _, _) = setup(5);
    for title in ["Harbor", "Old Town"] {
        let zone_id = engine.create_zone(title, "").unwrap();
        for index in 0..5 {
            let draft = PlaceDraft::new(format!("{title} {index}"), PlaceTag::Other, 10, 0);
            engine.create_place(zone_id, draft).unwrap();
        }
    }

    let progress = engine.medal_progress();
    assert!(progress.zone_architect);
    assert_eq!(progress.place_count, 15);
    assert!(engine
        .medals()
        .iter()
        .any(|medal| medal.id == "zone_architect" && medal.is_unlocked));
}

#[test]
fn retoggling_one_day_credits_a_single_mission() {
    let (mut engine, _, zone_id, place_ids) = setup(1);
    let day_id = accomplish_today(&mut engine, zone_id, &place_ids);
    let stop_id = engine.field_day(day_id).unwrap().stops[0].id;

    for _ in 0..6 {
        assert!(engine.toggle_stop(day_id, stop_id));
        assert!(engine.toggle_stop(day_id, stop_id));
    }

    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::Accomplished
    );
    assert_eq!(engine.config().total_missions_accomplished, 1);
    assert_eq!(engine.config().lifetime_points, 10);
    assert_eq!(engine.config().current_rank_index, 0);
    assert_eq!(
        engine.config().last_mission_date_key.as_deref(),
        Some("2026-10-01")
    );
}

#[test]
fn withdrawing_the_last_pending_stop_awards_the_mission() {
    let (mut engine, _, zone_id, place_ids) = setup(2);
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    for place_id in &place_ids {
        assert!(engine.deploy_stop(day_id, zone_id, *place_id));
    }
    let stops = engine.field_day(day_id).unwrap().stops.clone();
    assert!(engine.toggle_stop(day_id, stops[0].id));

    assert!(engine.withdraw_stop(day_id, stops[1].id));

    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::Accomplished
    );
    assert_eq!(engine.config().total_missions_accomplished, 1);
    assert_eq!(engine.config().lifetime_points, 10);
    assert_eq!(engine.config().streak_count, 1);
    assert!(engine
        .medals()
        .iter()
        .any(|medal| medal.id == "first_mission" && medal.is_unlocked));
}

#[test]
fn undoing_a_withdraw_does_not_award_the_day_twice() {
    let (mut engine, _, zone_id, place_ids) = setup(2);
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    for place_id in &place_ids {
        assert!(engine.deploy_stop(day_id, zone_id, *place_id));
    }
    let stops = engine.field_day(day_id).unwrap().stops.clone();
    assert!(engine.toggle_stop(day_id, stops[0].id));
    assert!(engine.withdraw_stop(day_id, stops[1].id));

    assert!(engine.execute_undo());
    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::InField
    );
    assert!(engine.toggle_stop(day_id, stops[1].id));

    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::Accomplished
    );
    assert_eq!(engine.config().total_missions_accomplished, 1);
    assert_eq!(engine.config().lifetime_points, 10);
}

#[test]
fn restoring_a_finished_queue_keeps_rewards_stable() {
    let (mut engine, _, zone_id, place_ids) = setup(2);
    let day_id = accomplish_today(&mut engine, zone_id, &place_ids);
    assert_eq!(engine.config().lifetime_points, 20);

    assert!(engine.clear_today_plan());
    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::Briefed
    );
    assert!(engine.execute_undo());

    assert_eq!(
        engine.field_day(day_id).unwrap().status,
        MissionStatus::Accomplished
    );
    assert_eq!(engine.config().total_missions_accomplished, 1);
    assert_eq!(engine.config().lifetime_points, 20);
}
