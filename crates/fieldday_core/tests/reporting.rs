use chrono::NaiveDate;
use fieldday_core::model::medal::MEDAL_CATALOG;
use fieldday_core::{
    Engine, FieldDayId, FixedClock, PlaceDraft, PlaceId, PlaceTag, ReportWindow, ZoneId,
};

fn engine_at(date: NaiveDate) -> (Engine, FixedClock) {
    let clock = FixedClock::at_date(date);
    let engine = Engine::open_in_memory(Box::new(clock.clone())).unwrap();
    (engine, clock)
}

fn place(engine: &mut Engine, zone_id: ZoneId, title: &str, tag: PlaceTag) -> PlaceId {
    engine
        .create_place(zone_id, PlaceDraft::new(title, tag, 20, 10))
        .unwrap()
}

/// Plans today with `places`, accomplishing the first `done` stops.
fn plan_today(
    engine: &mut Engine,
    zone_id: ZoneId,
    places: &[PlaceId],
    done: usize,
) -> FieldDayId {
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    for place_id in places {
        assert!(engine.deploy_stop(day_id, zone_id, *place_id));
    }
    let stop_ids: Vec<_> = engine
        .field_day(day_id)
        .unwrap()
        .stops
        .iter()
        .take(done)
        .map(|stop| stop.id)
        .collect();
    for stop_id in stop_ids {
        assert!(engine.toggle_stop(day_id, stop_id));
    }
    day_id
}

#[test]
fn weekly_report_aggregates_days_in_window() {
    let (mut engine, clock) = engine_at(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
    let downtown = engine.create_zone("Downtown", "").unwrap();
    let harbor = engine.create_zone("Harbor", "").unwrap();
    let cafe = place(&mut engine, downtown, "Cafe", PlaceTag::Food);
    let bank = place(&mut engine, downtown, "Bank", PlaceTag::Errands);
    let dock = place(&mut engine, harbor, "Dock", PlaceTag::Other);

    // Outside a 7-day window ending on 10-12.
    plan_today(&mut engine, harbor, &[dock], 1);
    clock.advance_days(7);
    // 10-08: fully accomplished.
    plan_today(&mut engine, downtown, &[cafe, bank], 2);
    clock.advance_days(2);
    // 10-10: one of two accomplished.
    plan_today(&mut engine, downtown, &[cafe, bank], 1);
    clock.advance_days(2);
    // 10-12: harbor, nothing accomplished.
    plan_today(&mut engine, harbor, &[dock], 0);
    assert!(engine.rename_zone(downtown, "City Center"));

    let report = engine.generate_report(ReportWindow::Week);

    assert_eq!(report.window_days, 7);
    assert_eq!(report.day_count, 3);
    assert_eq!(report.accomplished_day_count, 1);
    assert_eq!(report.accomplished_stop_count, 3);
    assert_eq!(report.total_planned_min, 150);
    assert!((report.average_stops_per_day - 5.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.top_tag, Some(PlaceTag::Food));
    assert_eq!(report.top_zone_title.as_deref(), Some("City Center"));
    assert!((report.completion_rate - 1.0 / 3.0).abs() < 1e-9);

    let quarter = engine.generate_report(ReportWindow::Quarter);
    assert_eq!(quarter.day_count, 4);
    assert_eq!(quarter.accomplished_day_count, 2);
}

#[test]
fn deleted_zone_falls_back_to_title_snapshot() {
    let (mut engine, _) = engine_at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    let zone_id = engine.create_zone("Pop-up market", "").unwrap();
    engine.assign_today_zone(zone_id).unwrap();
    assert!(engine.delete_zone(zone_id));

    let report = engine.generate_report(ReportWindow::Month);
    assert_eq!(report.top_zone_title.as_deref(), Some("Pop-up market"));
    assert_eq!(report.top_tag, None);
}

#[test]
fn empty_history_reports_zeroes() {
    let (engine, _) = engine_at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    let report = engine.generate_report(ReportWindow::Month);

    assert_eq!(report.day_count, 0);
    assert_eq!(report.average_stops_per_day, 0.0);
    assert_eq!(report.completion_rate, 0.0);
    assert_eq!(report.top_zone_title, None);
}

#[test]
fn reminder_text_tracks_today() {
    let (mut engine, _) = engine_at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    assert_eq!(
        engine.reminder_text("Field Day"),
        "Open Field Day to plan your day"
    );

    let zone_id = engine.create_zone("Downtown", "").unwrap();
    let day_id = engine.assign_today_zone(zone_id).unwrap();
    assert_eq!(
        engine.reminder_text("Field Day"),
        "Downtown — add stops for today"
    );

    for title in ["Bank", "Bakery"] {
        let place_id = place(&mut engine, zone_id, title, PlaceTag::Errands);
        assert!(engine.deploy_stop(day_id, zone_id, place_id));
    }
    assert_eq!(engine.reminder_text("Field Day"), "Downtown — 2 stops today");
}

#[test]
fn export_summary_lists_progression() {
    let (mut engine, _) = engine_at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    let zone_id = engine.create_zone("Downtown", "").unwrap();
    let bank = place(&mut engine, zone_id, "Bank", PlaceTag::Errands);
    plan_today(&mut engine, zone_id, &[bank], 1);

    let stats = engine.lifetime_stats();
    assert_eq!(stats.lifetime_points, 10);
    assert_eq!(stats.missions_accomplished, 1);
    assert_eq!(stats.stops_accomplished, 1);
    assert_eq!(stats.medal_count, MEDAL_CATALOG.len());

    let summary = engine.export_summary();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 8);
    assert!(summary.contains("Rank: Recruit"));
    assert!(summary.contains("Lifetime XP: 10"));
    assert!(summary.contains("Streak: 1 (longest 1)"));
    assert!(summary.contains("Missions accomplished: 1"));
    assert!(summary.contains("Zones: 1"));
    assert!(summary.contains("Stops accomplished: 1"));
    assert!(summary.contains(&format!(
        "Medals: {}/{}",
        stats.medals_unlocked,
        MEDAL_CATALOG.len()
    )));
}
