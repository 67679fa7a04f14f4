//! Field day and deployment queue model.
//!
//! # Responsibility
//! - Define the single daily plan (`FieldDay`) and its ordered stop queue.
//! - Derive plan metrics (planned minutes, progress) from the stop list.
//!
//! # Invariants
//! - At most one `FieldDay` exists per `date_key` (`%Y-%m-%d`).
//! - `DeploymentStop` is a point-in-time copy of a place, not a live reference.
//! - `zone_title_snapshot` is a snapshot of the zone title at assignment time.
//! - Status is derived from the stop list; see `MissionStatus::derive`.

use crate::model::zone::{Place, PlaceId, PlaceTag, ZoneId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a field day.
pub type FieldDayId = Uuid;
/// Stable identifier of a deployment stop.
pub type StopId = Uuid;
/// Stable identifier of an alternative plan variant.
pub type VariantId = Uuid;

/// Lifecycle state of a field day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// No zone or stops yet.
    #[default]
    Vacant,
    /// Zone assigned, nothing accomplished.
    Briefed,
    /// At least one stop accomplished.
    InField,
    /// Every stop accomplished.
    Accomplished,
    /// Terminal; only reachable through an explicit caller transition.
    Abandoned,
}

impl MissionStatus {
    /// Derives the status implied by a stop list.
    ///
    /// `Abandoned` is terminal and never produced here.
    pub fn derive(stops: &[DeploymentStop]) -> Self {
        let accomplished = stops.iter().filter(|stop| stop.is_accomplished).count();
        if !stops.is_empty() && accomplished == stops.len() {
            Self::Accomplished
        } else if accomplished > 0 {
            Self::InField
        } else {
            Self::Briefed
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Vacant => "vacant",
            Self::Briefed => "briefed",
            Self::InField => "in_field",
            Self::Accomplished => "accomplished",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Snapshot of a place deployed into a field day queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStop {
    pub id: StopId,
    /// Source catalog place; `None` for quick-deployed ad hoc stops.
    #[serde(default)]
    pub ground_point_id: Option<PlaceId>,
    pub title: String,
    #[serde(default)]
    pub tag: PlaceTag,
    pub duration_min: u32,
    #[serde(default)]
    pub buffer_min: u32,
    #[serde(default)]
    pub sort_index: usize,
    #[serde(default)]
    pub is_accomplished: bool,
    #[serde(default)]
    pub accomplished_at: Option<i64>,
}

impl DeploymentStop {
    /// Copies the deployable fields of a catalog place.
    pub fn from_place(place: &Place, sort_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            ground_point_id: Some(place.id),
            title: place.title.clone(),
            tag: place.tag,
            duration_min: place.duration_min,
            buffer_min: place.buffer_min,
            sort_index,
            is_accomplished: false,
            accomplished_at: None,
        }
    }

    pub fn total_load_min(&self) -> u32 {
        self.duration_min.saturating_add(self.buffer_min)
    }
}

/// Caller-provided fields for an ad hoc stop with no catalog source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickStopDraft {
    pub title: String,
    pub tag: PlaceTag,
    pub duration_min: u32,
    pub buffer_min: u32,
}

/// Named alternate draft of a day's stop list, never auto-applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeOps {
    pub id: VariantId,
    pub name: String,
    pub stops: Vec<DeploymentStop>,
    pub created_at: i64,
}

impl AlternativeOps {
    pub fn total_planned_min(&self) -> u32 {
        planned_minutes(&self.stops)
    }
}

/// The single daily plan bound to one date key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDay {
    pub id: FieldDayId,
    pub date_key: String,
    #[serde(default)]
    pub assigned_zone_id: Option<ZoneId>,
    /// Zone title captured at assignment; not refreshed on zone rename.
    #[serde(default)]
    pub zone_title_snapshot: String,
    #[serde(default)]
    pub status: MissionStatus,
    #[serde(default)]
    pub stops: Vec<DeploymentStop>,
    #[serde(default)]
    pub variants: Vec<AlternativeOps>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FieldDay {
    /// Creates a briefed day assigned to one zone.
    pub fn briefed(
        date_key: impl Into<String>,
        zone_id: ZoneId,
        zone_title: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_key: date_key.into(),
            assigned_zone_id: Some(zone_id),
            zone_title_snapshot: zone_title.into(),
            status: MissionStatus::Briefed,
            stops: Vec::new(),
            variants: Vec::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    pub fn total_planned_min(&self) -> u32 {
        planned_minutes(&self.stops)
    }

    pub fn accomplished_count(&self) -> usize {
        self.stops.iter().filter(|stop| stop.is_accomplished).count()
    }

    pub fn remaining_count(&self) -> usize {
        self.stops.len() - self.accomplished_count()
    }

    /// Fraction of accomplished stops in `0.0..=1.0`; `0.0` for an empty queue.
    pub fn progress_fraction(&self) -> f64 {
        if self.stops.is_empty() {
            return 0.0;
        }
        self.accomplished_count() as f64 / self.stops.len() as f64
    }

    pub fn contains_place(&self, place_id: PlaceId) -> bool {
        self.stops
            .iter()
            .any(|stop| stop.ground_point_id == Some(place_id))
    }

    pub fn stop_position(&self, stop_id: StopId) -> Option<usize> {
        self.stops.iter().position(|stop| stop.id == stop_id)
    }

    /// Rewrites stop `sort_index` values to `0..N-1` in list order.
    pub fn normalize_stop_indices(&mut self) {
        for (index, stop) in self.stops.iter_mut().enumerate() {
            stop.sort_index = index;
        }
    }

    /// Recomputes status from the stop list, leaving `Abandoned` untouched.
    pub fn refresh_status(&mut self) {
        if self.status != MissionStatus::Abandoned {
            self.status = MissionStatus::derive(&self.stops);
        }
    }
}

fn planned_minutes(stops: &[DeploymentStop]) -> u32 {
    stops
        .iter()
        .fold(0u32, |acc, stop| acc.saturating_add(stop.total_load_min()))
}

#[cfg(test)]
mod tests {
    use super::{DeploymentStop, FieldDay, MissionStatus};
    use crate::model::zone::PlaceTag;
    use uuid::Uuid;

    fn stop(duration_min: u32, buffer_min: u32, done: bool) -> DeploymentStop {
        DeploymentStop {
            id: Uuid::new_v4(),
            ground_point_id: None,
            title: "stop".to_string(),
            tag: PlaceTag::Other,
            duration_min,
            buffer_min,
            sort_index: 0,
            is_accomplished: done,
            accomplished_at: None,
        }
    }

    #[test]
    fn derive_status_follows_stop_completion() {
        assert_eq!(MissionStatus::derive(&[]), MissionStatus::Briefed);
        assert_eq!(
            MissionStatus::derive(&[stop(10, 0, false), stop(10, 0, false)]),
            MissionStatus::Briefed
        );
        assert_eq!(
            MissionStatus::derive(&[stop(10, 0, true), stop(10, 0, false)]),
            MissionStatus::InField
        );
        assert_eq!(
            MissionStatus::derive(&[stop(10, 0, true), stop(10, 0, true)]),
            MissionStatus::Accomplished
        );
    }

    #[test]
    fn refresh_status_keeps_abandoned_terminal() {
        let mut day = FieldDay::briefed("2026-10-18", Uuid::new_v4(), "Downtown", 0);
        day.stops.push(stop(10, 0, true));
        day.status = MissionStatus::Abandoned;
        day.refresh_status();
        assert_eq!(day.status, MissionStatus::Abandoned);
    }

    #[test]
    fn metrics_are_derived_from_stops() {
        let mut day = FieldDay::briefed("2026-10-18", Uuid::new_v4(), "Downtown", 0);
        day.stops = vec![stop(30, 10, true), stop(20, 5, false)];
        assert_eq!(day.total_planned_min(), 65);
        assert_eq!(day.accomplished_count(), 1);
        assert_eq!(day.remaining_count(), 1);
        assert!((day.progress_fraction() - 0.5).abs() < f64::EPSILON);
    }
}
