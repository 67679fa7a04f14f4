//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide `Engine` and serialize every call through it.
//! - Translate ids, tags and domain results into plain string/number DTOs.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - The engine is opened lazily, once, at the resolved DB path.
//! - A poisoned engine lock is recovered, never propagated.

use fieldday_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DeploymentStop, Engine, FieldDay, IntelReport, LifetimeStats, Place, PlaceDraft, PlaceTag,
    QuickStopDraft, ReportWindow, Zone,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

const DB_FILE_NAME: &str = "fieldday.sqlite3";
const APP_NAME: &str = "Field Day";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ENGINE: OnceLock<Mutex<Option<Engine>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the action changed state.
    pub ok: bool,
    /// Id of the created entity, when the action creates one.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Zone row for the zone list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneItem {
    pub zone_id: String,
    pub title: String,
    pub icon: String,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub sort_index: u32,
    pub place_count: u32,
    pub blueprint_count: u32,
}

/// Catalog place row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceItem {
    pub place_id: String,
    pub title: String,
    /// Lowercase tag label (`food|services|shopping|errands|meeting|other`).
    pub tag: String,
    pub duration_min: u32,
    pub buffer_min: u32,
    pub memo: String,
    pub is_favorite: bool,
}

/// Deployment stop row within a field day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopItem {
    pub stop_id: String,
    pub place_id: Option<String>,
    pub title: String,
    pub tag: String,
    pub duration_min: u32,
    pub buffer_min: u32,
    pub is_accomplished: bool,
}

/// Today's field day as rendered by the command screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDayView {
    pub day_id: String,
    pub date_key: String,
    pub zone_id: Option<String>,
    pub zone_title: String,
    /// Lowercase mission status label.
    pub status: String,
    pub stops: Vec<StopItem>,
    pub total_planned_min: u32,
    /// Lowercase pressure level label (`steady|dense|critical`).
    pub pressure_level: String,
    pub pressure_delta_min: u32,
    pub progress: f64,
}

/// Response envelope for today's field day.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayResponse {
    /// `None` when nothing is planned for today.
    pub day: Option<FieldDayView>,
    pub reminder: String,
    /// Pending undo action label, if one is still live.
    pub undo_kind: Option<String>,
    pub message: String,
}

/// Aggregated report for a trailing window.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub window_days: u32,
    pub day_count: u32,
    pub accomplished_day_count: u32,
    pub accomplished_stop_count: u32,
    pub total_planned_min: u64,
    pub average_stops_per_day: f64,
    pub top_tag: Option<String>,
    pub top_zone_title: Option<String>,
    pub completion_rate: f64,
}

/// Lifetime progression snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub rank_title: String,
    pub rank_index: u32,
    pub lifetime_points: u64,
    pub missions_accomplished: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub stops_accomplished: u32,
    pub medals_unlocked: u32,
    pub medal_count: u32,
}

/// Lists zones in display order.
///
/// # FFI contract
/// - Sync call, DB-backed on first use only.
/// - Never panics; returns an empty list when the engine cannot open.
#[flutter_rust_bridge::frb(sync)]
pub fn zone_list(include_archived: bool) -> Vec<ZoneItem> {
    with_engine(|engine| {
        let mut items: Vec<ZoneItem> = engine
            .active_zones_sorted()
            .into_iter()
            .map(to_zone_item)
            .collect();
        if include_archived {
            items.extend(engine.archived_zones().into_iter().map(to_zone_item));
        }
        items
    })
    .unwrap_or_default()
}

/// Creates a zone.
///
/// # FFI contract
/// - Sync call, DB write is queued behind the engine.
/// - Never panics.
/// - Returns the created zone ID on success; blank titles fail.
#[flutter_rust_bridge::frb(sync)]
pub fn zone_create(title: String, icon: String) -> ActionResponse {
    match with_engine(|engine| engine.create_zone(&title, &icon)) {
        Ok(Some(zone_id)) => ActionResponse::success("Zone created.", Some(zone_id.to_string())),
        Ok(None) => ActionResponse::failure("zone_create failed: title must not be blank"),
        Err(err) => ActionResponse::failure(format!("zone_create failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn zone_rename(zone_id: String, title: String) -> ActionResponse {
    act_on("zone_rename", "Zone renamed.", |engine| {
        Ok(engine.rename_zone(parse_id(&zone_id, "zone_id")?, &title))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn zone_set_icon(zone_id: String, icon: String) -> ActionResponse {
    act_on("zone_set_icon", "Zone icon updated.", |engine| {
        Ok(engine.set_zone_icon(parse_id(&zone_id, "zone_id")?, &icon))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn zone_toggle_pin(zone_id: String) -> ActionResponse {
    act_on("zone_toggle_pin", "Zone pin toggled.", |engine| {
        Ok(engine.toggle_pin(parse_id(&zone_id, "zone_id")?))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn zone_toggle_archive(zone_id: String) -> ActionResponse {
    act_on("zone_toggle_archive", "Zone archive toggled.", |engine| {
        Ok(engine.toggle_archive(parse_id(&zone_id, "zone_id")?))
    })
}

/// Deletes a zone and arms its undo snapshot.
///
/// # FFI contract
/// - Sync call.
/// - Never panics.
/// - The deletion can be reverted with `undo_execute` inside the undo window.
#[flutter_rust_bridge::frb(sync)]
pub fn zone_delete(zone_id: String) -> ActionResponse {
    act_on("zone_delete", "Zone deleted.", |engine| {
        Ok(engine.delete_zone(parse_id(&zone_id, "zone_id")?))
    })
}

/// Moves the zones at `from_indices` (visible order) before `to_index`.
#[flutter_rust_bridge::frb(sync)]
pub fn zone_reorder(from_indices: Vec<u32>, to_index: u32) -> ActionResponse {
    let from: Vec<usize> = from_indices.into_iter().map(|index| index as usize).collect();
    act_on("zone_reorder", "Zones reordered.", |engine| {
        Ok(engine.reorder_zones(&from, to_index as usize))
    })
}

/// Lists places of a zone, favorites first.
///
/// Input semantics:
/// - `query`: case-insensitive substring over title and memo; empty matches all.
/// - `tag`: optional lowercase tag label filter.
///
/// # FFI contract
/// - Sync call, read-only.
/// - Never panics; invalid ids or tags yield an empty list.
#[flutter_rust_bridge::frb(sync)]
pub fn place_list(zone_id: String, query: String, tag: Option<String>) -> Vec<PlaceItem> {
    let Ok(zone_id) = parse_id(&zone_id, "zone_id") else {
        return Vec::new();
    };
    let tag = match tag.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match PlaceTag::parse(raw) {
            Some(tag) => Some(tag),
            None => return Vec::new(),
        },
        None => None,
    };
    with_engine(|engine| {
        engine
            .filter_places(zone_id, &query, tag)
            .into_iter()
            .map(to_place_item)
            .collect()
    })
    .unwrap_or_default()
}

/// Creates a catalog place in a zone.
///
/// # FFI contract
/// - Sync call.
/// - Never panics.
/// - Returns the created place ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn place_create(
    zone_id: String,
    title: String,
    tag: String,
    duration_min: u32,
    buffer_min: u32,
    memo: String,
) -> ActionResponse {
    let outcome = parse_id(&zone_id, "zone_id").and_then(|zone_id| {
        let draft = place_draft(title, &tag, duration_min, buffer_min, memo)?;
        with_engine(|engine| engine.create_place(zone_id, draft))
    });
    match outcome {
        Ok(Some(place_id)) => {
            ActionResponse::success("Place created.", Some(place_id.to_string()))
        }
        Ok(None) => ActionResponse::failure("place_create failed: unknown zone or blank title"),
        Err(err) => ActionResponse::failure(format!("place_create failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn place_update(
    zone_id: String,
    place_id: String,
    title: String,
    tag: String,
    duration_min: u32,
    buffer_min: u32,
    memo: String,
) -> ActionResponse {
    act_on("place_update", "Place updated.", |engine| {
        let zone_id = parse_id(&zone_id, "zone_id")?;
        let place_id = parse_id(&place_id, "place_id")?;
        let draft = place_draft(title, &tag, duration_min, buffer_min, memo)?;
        Ok(engine.update_place(zone_id, place_id, draft))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn place_delete(zone_id: String, place_id: String) -> ActionResponse {
    act_on("place_delete", "Place deleted.", |engine| {
        let zone_id = parse_id(&zone_id, "zone_id")?;
        Ok(engine.delete_place(zone_id, parse_id(&place_id, "place_id")?))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn place_toggle_favorite(zone_id: String, place_id: String) -> ActionResponse {
    act_on("place_toggle_favorite", "Favorite toggled.", |engine| {
        let zone_id = parse_id(&zone_id, "zone_id")?;
        Ok(engine.toggle_favorite(zone_id, parse_id(&place_id, "place_id")?))
    })
}

/// Saves an ordered list of places as a reusable route.
#[flutter_rust_bridge::frb(sync)]
pub fn blueprint_create(zone_id: String, name: String, place_ids: Vec<String>) -> ActionResponse {
    let outcome = parse_id(&zone_id, "zone_id").and_then(|zone_id| {
        let place_ids = place_ids
            .iter()
            .map(|raw| parse_id(raw, "place_id"))
            .collect::<Result<Vec<_>, _>>()?;
        with_engine(|engine| engine.create_blueprint(zone_id, &name, &place_ids))
    });
    match outcome {
        Ok(Some(blueprint_id)) => {
            ActionResponse::success("Blueprint saved.", Some(blueprint_id.to_string()))
        }
        Ok(None) => ActionResponse::failure("blueprint_create failed: nothing to save"),
        Err(err) => ActionResponse::failure(format!("blueprint_create failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn blueprint_delete(zone_id: String, blueprint_id: String) -> ActionResponse {
    act_on("blueprint_delete", "Blueprint deleted.", |engine| {
        let zone_id = parse_id(&zone_id, "zone_id")?;
        Ok(engine.delete_blueprint(zone_id, parse_id(&blueprint_id, "blueprint_id")?))
    })
}

/// Queues a blueprint's places onto today's field day.
///
/// # FFI contract
/// - Sync call.
/// - Never panics.
/// - Fails when no stop was added; the message carries the added count.
#[flutter_rust_bridge::frb(sync)]
pub fn blueprint_apply(zone_id: String, blueprint_id: String) -> ActionResponse {
    let outcome = parse_id(&zone_id, "zone_id").and_then(|zone_id| {
        let blueprint_id = parse_id(&blueprint_id, "blueprint_id")?;
        with_engine(|engine| engine.apply_blueprint(zone_id, blueprint_id))
    });
    match outcome {
        Ok(0) => ActionResponse::failure("blueprint_apply failed: no stops added"),
        Ok(added) => ActionResponse::success(format!("Added {added} stop(s)."), None),
        Err(err) => ActionResponse::failure(format!("blueprint_apply failed: {err}")),
    }
}

/// Returns today's field day, the reminder line and the live undo kind.
///
/// # FFI contract
/// - Sync call, read-only.
/// - Never panics; the message carries engine open errors.
#[flutter_rust_bridge::frb(sync)]
pub fn today_view() -> TodayResponse {
    match with_engine(|engine| {
        let day = engine
            .current_field_day()
            .map(|day| to_field_day_view(engine, day));
        TodayResponse {
            day,
            reminder: engine.reminder_text(APP_NAME),
            undo_kind: engine.undo_available().map(|kind| kind.label().to_string()),
            message: String::new(),
        }
    }) {
        Ok(response) => response,
        Err(err) => TodayResponse {
            day: None,
            reminder: String::new(),
            undo_kind: None,
            message: format!("today_view failed: {err}"),
        },
    }
}

/// Binds today to a zone, creating the field day when missing.
#[flutter_rust_bridge::frb(sync)]
pub fn today_assign_zone(zone_id: String) -> ActionResponse {
    let outcome = parse_id(&zone_id, "zone_id")
        .and_then(|zone_id| with_engine(|engine| engine.assign_today_zone(zone_id)));
    match outcome {
        Ok(Some(day_id)) => ActionResponse::success("Zone assigned.", Some(day_id.to_string())),
        Ok(None) => ActionResponse::failure("today_assign_zone failed: unknown zone"),
        Err(err) => ActionResponse::failure(format!("today_assign_zone failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn day_reassign_zone(day_id: String, zone_id: String) -> ActionResponse {
    act_on("day_reassign_zone", "Zone reassigned.", |engine| {
        let day_id = parse_id(&day_id, "day_id")?;
        Ok(engine.reassign_today_zone(day_id, parse_id(&zone_id, "zone_id")?))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn day_clear_zone(day_id: String) -> ActionResponse {
    act_on("day_clear_zone", "Zone cleared.", |engine| {
        Ok(engine.clear_day_zone(parse_id(&day_id, "day_id")?))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn stop_deploy(day_id: String, zone_id: String, place_id: String) -> ActionResponse {
    act_on("stop_deploy", "Stop deployed.", |engine| {
        let day_id = parse_id(&day_id, "day_id")?;
        let zone_id = parse_id(&zone_id, "zone_id")?;
        Ok(engine.deploy_stop(day_id, zone_id, parse_id(&place_id, "place_id")?))
    })
}

/// Appends an ad-hoc stop that has no catalog place.
#[flutter_rust_bridge::frb(sync)]
pub fn stop_quick_deploy(
    day_id: String,
    title: String,
    tag: String,
    duration_min: u32,
    buffer_min: u32,
) -> ActionResponse {
    let outcome = parse_id(&day_id, "day_id").and_then(|day_id| {
        let draft = QuickStopDraft {
            title,
            tag: parse_tag(&tag)?,
            duration_min,
            buffer_min,
        };
        with_engine(|engine| engine.quick_deploy(day_id, draft))
    });
    match outcome {
        Ok(Some(stop_id)) => ActionResponse::success("Stop deployed.", Some(stop_id.to_string())),
        Ok(None) => ActionResponse::failure("stop_quick_deploy failed: unknown day or blank title"),
        Err(err) => ActionResponse::failure(format!("stop_quick_deploy failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn stop_withdraw(day_id: String, stop_id: String) -> ActionResponse {
    act_on("stop_withdraw", "Stop withdrawn.", |engine| {
        let day_id = parse_id(&day_id, "day_id")?;
        Ok(engine.withdraw_stop(day_id, parse_id(&stop_id, "stop_id")?))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn stop_reorder(day_id: String, from_indices: Vec<u32>, to_index: u32) -> ActionResponse {
    let from: Vec<usize> = from_indices.into_iter().map(|index| index as usize).collect();
    act_on("stop_reorder", "Stops reordered.", |engine| {
        let day_id = parse_id(&day_id, "day_id")?;
        Ok(engine.reorder_stops(day_id, &from, to_index as usize))
    })
}

/// Flips a stop between pending and accomplished.
///
/// # FFI contract
/// - Sync call.
/// - Never panics.
/// - Finishing the last stop awards points, streak, rank and medals.
#[flutter_rust_bridge::frb(sync)]
pub fn stop_toggle(day_id: String, stop_id: String) -> ActionResponse {
    act_on("stop_toggle", "Stop toggled.", |engine| {
        let day_id = parse_id(&day_id, "day_id")?;
        Ok(engine.toggle_stop(day_id, parse_id(&stop_id, "stop_id")?))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn today_clear_plan() -> ActionResponse {
    act_on("today_clear_plan", "Plan cleared.", |engine| {
        Ok(engine.clear_today_plan())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn today_reset() -> ActionResponse {
    act_on("today_reset", "Today reset.", |engine| Ok(engine.reset_today()))
}

/// Zeroes buffers of the first `count` pending stops.
#[flutter_rust_bridge::frb(sync)]
pub fn day_compress_buffers(day_id: String, count: u32) -> ActionResponse {
    let outcome = parse_id(&day_id, "day_id")
        .and_then(|day_id| with_engine(|engine| engine.compress_buffers(day_id, count as usize)));
    match outcome {
        Ok(0) => ActionResponse::failure("day_compress_buffers failed: nothing to compress"),
        Ok(changed) => ActionResponse::success(format!("Compressed {changed} buffer(s)."), None),
        Err(err) => ActionResponse::failure(format!("day_compress_buffers failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn day_create_light_variant(day_id: String) -> ActionResponse {
    let outcome = parse_id(&day_id, "day_id")
        .and_then(|day_id| with_engine(|engine| engine.create_light_variant(day_id)));
    match outcome {
        Ok(Some(variant_id)) => {
            ActionResponse::success("Light plan saved.", Some(variant_id.to_string()))
        }
        Ok(None) => ActionResponse::failure("day_create_light_variant failed: no stops"),
        Err(err) => ActionResponse::failure(format!("day_create_light_variant failed: {err}")),
    }
}

/// Updates planning defaults and pressure thresholds.
///
/// # FFI contract
/// - Sync call.
/// - Never panics; rejects a critical threshold below the dense one.
#[flutter_rust_bridge::frb(sync)]
pub fn config_update_thresholds(
    default_duration_min: u32,
    default_buffer_min: u32,
    dense_threshold_min: u32,
    critical_threshold_min: u32,
    recommended_stop_count: u32,
) -> ActionResponse {
    if critical_threshold_min < dense_threshold_min {
        return ActionResponse::failure(
            "config_update_thresholds failed: critical is below dense",
        );
    }
    act_on("config_update_thresholds", "Config updated.", |engine| {
        let mut config = engine.config().clone();
        config.default_duration_min = default_duration_min;
        config.default_buffer_min = default_buffer_min;
        config.dense_threshold_min = dense_threshold_min;
        config.critical_threshold_min = critical_threshold_min;
        config.recommended_stop_count = recommended_stop_count;
        Ok(engine.update_config(config))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn profile_update_avatar(avatar: String) -> ActionResponse {
    act_on("profile_update_avatar", "Avatar updated.", |engine| {
        Ok(engine.update_avatar(avatar))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn profile_update_callsign(callsign: String) -> ActionResponse {
    act_on("profile_update_callsign", "Callsign updated.", |engine| {
        Ok(engine.update_callsign(callsign))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn onboarding_complete() -> ActionResponse {
    act_on("onboarding_complete", "Onboarding completed.", |engine| {
        engine.set_onboarding_completed(true);
        Ok(true)
    })
}

/// Stores the daily reminder schedule; `hour` is 0-23, `minute` 0-59.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_update(enabled: bool, hour: u8, minute: u8) -> ActionResponse {
    act_on("notifications_update", "Notifications updated.", |engine| {
        Ok(engine.set_notifications(enabled, hour, minute))
    })
}

/// Wipes every collection back to first-launch defaults.
///
/// # FFI contract
/// - Sync call; blocks until the wiped units are written.
/// - Never panics.
/// - Irreversible; no undo snapshot is armed.
#[flutter_rust_bridge::frb(sync)]
pub fn nuclear_reset() -> ActionResponse {
    act_on("nuclear_reset", "All data reset.", |engine| {
        engine.nuclear_reset();
        Ok(engine.flush())
    })
}

/// Reverts the last destructive action while its window is open.
#[flutter_rust_bridge::frb(sync)]
pub fn undo_execute() -> ActionResponse {
    act_on("undo_execute", "Undone.", |engine| Ok(engine.execute_undo()))
}

/// Builds the intel report for a 7, 30 or 90 day window.
///
/// # FFI contract
/// - Sync call, read-only.
/// - Never panics; unsupported windows fall back to 7 days.
#[flutter_rust_bridge::frb(sync)]
pub fn report_generate(window_days: u32) -> ReportView {
    let window = ReportWindow::from_days(window_days).unwrap_or(ReportWindow::Week);
    with_engine(|engine| to_report_view(&engine.generate_report(window))).unwrap_or_else(|_| {
        ReportView {
            window_days: window.days(),
            day_count: 0,
            accomplished_day_count: 0,
            accomplished_stop_count: 0,
            total_planned_min: 0,
            average_stops_per_day: 0.0,
            top_tag: None,
            top_zone_title: None,
            completion_rate: 0.0,
        }
    })
}

/// Returns lifetime progression, or `None` when the engine cannot open.
#[flutter_rust_bridge::frb(sync)]
pub fn lifetime_stats() -> Option<StatsView> {
    with_engine(|engine| to_stats_view(&engine.lifetime_stats())).ok()
}

#[flutter_rust_bridge::frb(sync)]
pub fn reminder_text() -> String {
    with_engine(|engine| engine.reminder_text(APP_NAME)).unwrap_or_default()
}

/// Plain-text progression summary for sharing.
#[flutter_rust_bridge::frb(sync)]
pub fn export_summary() -> String {
    with_engine(|engine| engine.export_summary()).unwrap_or_default()
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("FIELDDAY_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_engine<T>(f: impl FnOnce(&mut Engine) -> T) -> Result<T, String> {
    let slot = ENGINE.get_or_init(|| Mutex::new(None));
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_none() {
        let path = resolve_db_path();
        let engine = Engine::open(&path).map_err(|err| {
            log::error!(
                "event=engine_open module=ffi status=error path={} error={err}",
                path.display()
            );
            format!("engine open failed: {err}")
        })?;
        *guard = Some(engine);
    }
    match guard.as_mut() {
        Some(engine) => Ok(f(engine)),
        None => Err("engine unavailable".to_string()),
    }
}

fn act_on(
    op: &str,
    message: &str,
    f: impl FnOnce(&mut Engine) -> Result<bool, String>,
) -> ActionResponse {
    match with_engine(f) {
        Ok(Ok(true)) => ActionResponse::success(message, None),
        Ok(Ok(false)) => ActionResponse::failure(format!("{op} failed: no change")),
        Ok(Err(err)) | Err(err) => ActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("{field} is not a valid id"))
}

fn parse_tag(raw: &str) -> Result<PlaceTag, String> {
    if raw.trim().is_empty() {
        return Ok(PlaceTag::default());
    }
    PlaceTag::parse(raw).ok_or_else(|| format!("unknown tag `{}`", raw.trim()))
}

fn place_draft(
    title: String,
    tag: &str,
    duration_min: u32,
    buffer_min: u32,
    memo: String,
) -> Result<PlaceDraft, String> {
    Ok(PlaceDraft::new(title, parse_tag(tag)?, duration_min, buffer_min).with_memo(memo))
}

fn to_zone_item(zone: &Zone) -> ZoneItem {
    ZoneItem {
        zone_id: zone.id.to_string(),
        title: zone.title.clone(),
        icon: zone.icon.clone(),
        is_pinned: zone.is_pinned,
        is_archived: zone.is_archived,
        sort_index: zone.sort_index as u32,
        place_count: zone.places.len() as u32,
        blueprint_count: zone.blueprints.len() as u32,
    }
}

fn to_place_item(place: &Place) -> PlaceItem {
    PlaceItem {
        place_id: place.id.to_string(),
        title: place.title.clone(),
        tag: place.tag.label().to_string(),
        duration_min: place.duration_min,
        buffer_min: place.buffer_min,
        memo: place.memo.clone(),
        is_favorite: place.is_favorite,
    }
}

fn to_stop_item(stop: &DeploymentStop) -> StopItem {
    StopItem {
        stop_id: stop.id.to_string(),
        place_id: stop.ground_point_id.map(|id| id.to_string()),
        title: stop.title.clone(),
        tag: stop.tag.label().to_string(),
        duration_min: stop.duration_min,
        buffer_min: stop.buffer_min,
        is_accomplished: stop.is_accomplished,
    }
}

fn to_field_day_view(engine: &Engine, day: &FieldDay) -> FieldDayView {
    let pressure = engine.pressure(day.id);
    FieldDayView {
        day_id: day.id.to_string(),
        date_key: day.date_key.clone(),
        zone_id: day.assigned_zone_id.map(|id| id.to_string()),
        zone_title: day.zone_title_snapshot.clone(),
        status: day.status.label().to_string(),
        stops: day.stops.iter().map(to_stop_item).collect(),
        total_planned_min: day.total_planned_min(),
        pressure_level: pressure
            .map(|report| report.level.label().to_string())
            .unwrap_or_default(),
        pressure_delta_min: pressure.map_or(0, |report| report.pressure_delta_min),
        progress: day.progress_fraction(),
    }
}

fn to_report_view(report: &IntelReport) -> ReportView {
    ReportView {
        window_days: report.window_days,
        day_count: report.day_count as u32,
        accomplished_day_count: report.accomplished_day_count as u32,
        accomplished_stop_count: report.accomplished_stop_count as u32,
        total_planned_min: report.total_planned_min,
        average_stops_per_day: report.average_stops_per_day,
        top_tag: report.top_tag.map(|tag| tag.label().to_string()),
        top_zone_title: report.top_zone_title.clone(),
        completion_rate: report.completion_rate,
    }
}

fn to_stats_view(stats: &LifetimeStats) -> StatsView {
    StatsView {
        rank_title: stats.rank_title.to_string(),
        rank_index: stats.rank_index as u32,
        lifetime_points: stats.lifetime_points,
        missions_accomplished: stats.missions_accomplished,
        current_streak: stats.current_streak,
        longest_streak: stats.longest_streak,
        stops_accomplished: stats.stops_accomplished as u32,
        medals_unlocked: stats.medals_unlocked as u32,
        medal_count: stats.medal_count as u32,
    }
}
