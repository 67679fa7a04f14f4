//! Read-only reporting over engine collections.
//!
//! # Responsibility
//! - Aggregate field days in a trailing window into an intel report.
//! - Summarize lifetime progression and render the export text.
//! - Produce the daily reminder line for an external scheduler.
//!
//! # Invariants
//! - Nothing here mutates or caches state; every call recomputes.
//! - Tie-breaks are deterministic so equal inputs give equal reports.

use crate::model::config::CommandCenterConfig;
use crate::model::field_day::{FieldDay, MissionStatus};
use crate::model::medal::FieldMedal;
use crate::model::rank;
use crate::model::zone::{PlaceTag, Zone, ZoneId};
use crate::service::clock::parse_date_key;
use crate::service::engine::Engine;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Trailing window a report covers, ending today (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    Week,
    Month,
    Quarter,
}

impl ReportWindow {
    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Week),
            30 => Some(Self::Month),
            90 => Some(Self::Quarter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntelReport {
    pub window_days: u32,
    /// Field days whose date key falls in the window.
    pub day_count: usize,
    pub accomplished_day_count: usize,
    pub accomplished_stop_count: usize,
    pub total_planned_min: u64,
    /// Deployed stops per field day in the window; `0.0` with no days.
    pub average_stops_per_day: f64,
    /// Most frequent tag among accomplished stops.
    pub top_tag: Option<PlaceTag>,
    /// Most assigned zone, by its current title when it still exists.
    pub top_zone_title: Option<String>,
    /// Accomplished days over days in the window; `0.0` with no days.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimeStats {
    pub rank_index: usize,
    pub rank_title: &'static str,
    pub lifetime_points: u64,
    pub missions_accomplished: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub zone_count: usize,
    pub place_count: usize,
    pub field_day_count: usize,
    pub stops_accomplished: usize,
    pub medals_unlocked: usize,
    pub medal_count: usize,
}

/// Aggregates the days of `window` ending on `today`.
pub fn intel_report(
    days: &[FieldDay],
    zones: &[Zone],
    today: NaiveDate,
    window: ReportWindow,
) -> IntelReport {
    let start = today - Duration::days(i64::from(window.days()) - 1);
    let in_window: Vec<&FieldDay> = days
        .iter()
        .filter(|day| {
            parse_date_key(&day.date_key).is_some_and(|date| date >= start && date <= today)
        })
        .collect();

    let day_count = in_window.len();
    let accomplished_day_count = in_window
        .iter()
        .filter(|day| day.status == MissionStatus::Accomplished)
        .count();
    let stop_count: usize = in_window.iter().map(|day| day.stops.len()).sum();
    let accomplished_stop_count = in_window.iter().map(|day| day.accomplished_count()).sum();
    let total_planned_min = in_window
        .iter()
        .map(|day| u64::from(day.total_planned_min()))
        .sum();

    let mut tag_counts: BTreeMap<PlaceTag, usize> = BTreeMap::new();
    for stop in in_window
        .iter()
        .flat_map(|day| day.stops.iter())
        .filter(|stop| stop.is_accomplished)
    {
        *tag_counts.entry(stop.tag).or_default() += 1;
    }

    let mut zone_counts: BTreeMap<ZoneId, (usize, &FieldDay)> = BTreeMap::new();
    for day in in_window.iter().copied() {
        if let Some(zone_id) = day.assigned_zone_id {
            let entry = zone_counts.entry(zone_id).or_insert((0, day));
            entry.0 += 1;
            if day.date_key > entry.1.date_key {
                entry.1 = day;
            }
        }
    }
    let top_zone_title = most_frequent(
        zone_counts
            .iter()
            .map(|(zone_id, (count, latest))| ((*zone_id, *latest), *count)),
    )
    .map(|(zone_id, latest)| {
        zones
            .iter()
            .find(|zone| zone.id == zone_id)
            .map(|zone| zone.title.clone())
            .unwrap_or_else(|| latest.zone_title_snapshot.clone())
    });

    IntelReport {
        window_days: window.days(),
        day_count,
        accomplished_day_count,
        accomplished_stop_count,
        total_planned_min,
        average_stops_per_day: ratio(stop_count, day_count),
        top_tag: most_frequent(tag_counts.into_iter()),
        top_zone_title,
        completion_rate: ratio(accomplished_day_count, day_count),
    }
}

pub fn lifetime_stats(
    zones: &[Zone],
    days: &[FieldDay],
    medals: &[FieldMedal],
    config: &CommandCenterConfig,
) -> LifetimeStats {
    let rank_index = config.current_rank_index;
    LifetimeStats {
        rank_index,
        rank_title: rank::rank_tier(rank_index).title,
        lifetime_points: config.lifetime_points,
        missions_accomplished: config.total_missions_accomplished,
        current_streak: config.streak_count,
        longest_streak: config.longest_streak.max(config.streak_count),
        zone_count: zones.len(),
        place_count: zones.iter().map(|zone| zone.places.len()).sum(),
        field_day_count: days.len(),
        stops_accomplished: days.iter().map(|day| day.accomplished_count()).sum(),
        medals_unlocked: medals.iter().filter(|medal| medal.is_unlocked).count(),
        medal_count: medals.len(),
    }
}

/// Reminder line for today's plan.
pub fn reminder_text(day: Option<&FieldDay>, zone: Option<&Zone>, app_name: &str) -> String {
    match (day, zone) {
        (Some(day), Some(zone)) if day.stops.is_empty() => {
            format!("{} — add stops for today", zone.title)
        }
        (Some(day), Some(zone)) => format!("{} — {} stops today", zone.title, day.stops.len()),
        _ => format!("Open {app_name} to plan your day"),
    }
}

/// Human-readable, multi-line progression summary.
pub fn export_summary(stats: &LifetimeStats) -> String {
    [
        "Field Day Command export".to_string(),
        format!("Rank: {}", stats.rank_title),
        format!("Lifetime XP: {}", stats.lifetime_points),
        format!(
            "Streak: {} (longest {})",
            stats.current_streak, stats.longest_streak
        ),
        format!("Missions accomplished: {}", stats.missions_accomplished),
        format!("Zones: {}", stats.zone_count),
        format!("Stops accomplished: {}", stats.stops_accomplished),
        format!("Medals: {}/{}", stats.medals_unlocked, stats.medal_count),
    ]
    .join("\n")
}

/// Key with the highest count; the first key wins ties.
fn most_frequent<K>(counts: impl Iterator<Item = (K, usize)>) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for (key, count) in counts {
        if best.as_ref().is_none_or(|(_, best_count)| count > *best_count) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

impl Engine {
    pub fn generate_report(&self, window: ReportWindow) -> IntelReport {
        intel_report(&self.field_days, &self.zones, self.clock.today(), window)
    }

    pub fn lifetime_stats(&self) -> LifetimeStats {
        lifetime_stats(&self.zones, &self.field_days, &self.medals, &self.config)
    }

    pub fn reminder_text(&self, app_name: &str) -> String {
        let day = self.current_field_day();
        let zone = day
            .and_then(|day| day.assigned_zone_id)
            .and_then(|zone_id| self.zone(zone_id));
        reminder_text(day, zone, app_name)
    }

    pub fn export_summary(&self) -> String {
        export_summary(&self.lifetime_stats())
    }
}
