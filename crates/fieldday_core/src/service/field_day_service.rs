//! Field day and deployment queue use-cases.
//!
//! # Responsibility
//! - Bind today's field day to a zone and keep its title snapshot.
//! - Deploy, withdraw, reorder and toggle stops in a day's queue.
//! - Offer pressure quick fixes (buffer compression, light variant).
//!
//! # Invariants
//! - A catalog place is deployed at most once per day.
//! - Stop `sort_index` values are `0..N-1` in queue order after every change.
//! - Reassigning a zone never touches the stop queue.
//! - Status is recomputed from the queue; `Abandoned` is never entered here.

use crate::model::field_day::{
    AlternativeOps, DeploymentStop, FieldDay, FieldDayId, MissionStatus, QuickStopDraft, StopId,
    VariantId,
};
use crate::model::zone::{BlueprintId, PlaceId, ZoneId};
use crate::service::engine::Engine;
use crate::service::events::Collection;
use crate::service::ordering::move_items;
use crate::service::pressure::{self, PressureReport};
use crate::service::undo::UndoPayload;
use log::{debug, info};
use uuid::Uuid;

const LIGHT_VARIANT_NAME: &str = "Light plan";

impl Engine {
    /// Assigns `zone_id` to today's field day, creating the day if needed.
    pub fn assign_today_zone(&mut self, zone_id: ZoneId) -> Option<FieldDayId> {
        let title = self.zone(zone_id)?.title.clone();
        let today = self.today_key();
        let now_ms = self.clock.now_ms();

        let day_id = match self.field_days.iter_mut().find(|day| day.date_key == today) {
            Some(day) => {
                bind_zone(day, zone_id, title, now_ms);
                day.id
            }
            None => {
                let day = FieldDay::briefed(today, zone_id, title, now_ms);
                let day_id = day.id;
                self.field_days.push(day);
                day_id
            }
        };
        self.mark_deployed(zone_id, now_ms);
        info!("event=day_assign module=field_day status=ok day_id={day_id} zone_id={zone_id}");
        self.commit(&[Collection::FieldDays, Collection::Zones]);
        Some(day_id)
    }

    /// Points an existing day at another zone; the stop queue is kept as is.
    pub fn reassign_today_zone(&mut self, day_id: FieldDayId, zone_id: ZoneId) -> bool {
        let Some(title) = self.zone(zone_id).map(|zone| zone.title.clone()) else {
            debug!("event=day_reassign module=field_day status=noop reason=missing_zone");
            return false;
        };
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            debug!("event=day_reassign module=field_day status=noop reason=missing_day");
            return false;
        };
        bind_zone(day, zone_id, title, now_ms);
        self.mark_deployed(zone_id, now_ms);
        info!("event=day_reassign module=field_day status=ok day_id={day_id} zone_id={zone_id}");
        self.commit(&[Collection::FieldDays, Collection::Zones]);
        true
    }

    /// Detaches the zone from a day. An empty day falls back to `Vacant`.
    pub fn clear_day_zone(&mut self, day_id: FieldDayId) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            return false;
        };
        if day.assigned_zone_id.is_none() {
            return false;
        }
        day.assigned_zone_id = None;
        day.zone_title_snapshot.clear();
        if day.stops.is_empty() && day.status != MissionStatus::Abandoned {
            day.status = MissionStatus::Vacant;
        }
        day.updated_at = now_ms;
        info!("event=day_clear_zone module=field_day status=ok day_id={day_id}");
        self.commit(&[Collection::FieldDays]);
        true
    }

    /// Appends a snapshot of a catalog place to a day's queue.
    ///
    /// Returns `false` when the day or place is missing or the place is
    /// already in the queue.
    pub fn deploy_stop(&mut self, day_id: FieldDayId, zone_id: ZoneId, place_id: PlaceId) -> bool {
        let Some(place) = self.place(zone_id, place_id).cloned() else {
            debug!("event=stop_deploy module=field_day status=noop reason=missing_place");
            return false;
        };
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            debug!("event=stop_deploy module=field_day status=noop reason=missing_day");
            return false;
        };
        if day.contains_place(place_id) {
            debug!(
                "event=stop_deploy module=field_day status=noop reason=duplicate day_id={} place_id={}",
                day_id, place_id
            );
            return false;
        }
        let stop = DeploymentStop::from_place(&place, day.stops.len());
        let stop_id = stop.id;
        push_stop(day, stop, now_ms);
        self.mark_deployed(zone_id, now_ms);
        info!("event=stop_deploy module=field_day status=ok day_id={day_id} stop_id={stop_id}");
        self.commit(&[Collection::FieldDays, Collection::Zones]);
        true
    }

    /// Appends an ad hoc stop with no catalog source.
    pub fn quick_deploy(&mut self, day_id: FieldDayId, draft: QuickStopDraft) -> Option<StopId> {
        let title = draft.title.trim();
        if title.is_empty() {
            debug!("event=stop_quick_deploy module=field_day status=noop reason=blank_title");
            return None;
        }
        let now_ms = self.clock.now_ms();
        let day = self.day_mut(day_id)?;
        let stop = DeploymentStop {
            id: Uuid::new_v4(),
            ground_point_id: None,
            title: title.to_string(),
            tag: draft.tag,
            duration_min: draft.duration_min,
            buffer_min: draft.buffer_min,
            sort_index: day.stops.len(),
            is_accomplished: false,
            accomplished_at: None,
        };
        let stop_id = stop.id;
        push_stop(day, stop, now_ms);
        info!("event=stop_quick_deploy module=field_day status=ok day_id={day_id} stop_id={stop_id}");
        self.commit(&[Collection::FieldDays]);
        Some(stop_id)
    }

    /// Deploys a blueprint's places to today's day.
    ///
    /// Place ids are resolved against the live catalog; stale ids and places
    /// already queued are skipped. Today's day is created for the zone when
    /// absent. Returns how many stops were added.
    pub fn apply_blueprint(&mut self, zone_id: ZoneId, blueprint_id: BlueprintId) -> usize {
        let Some(zone) = self.zone(zone_id) else {
            return 0;
        };
        let Some(blueprint) = zone.blueprints.iter().find(|bp| bp.id == blueprint_id) else {
            debug!("event=blueprint_apply module=field_day status=noop reason=missing_blueprint");
            return 0;
        };
        let places: Vec<_> = blueprint
            .place_ids
            .iter()
            .filter_map(|place_id| zone.place(*place_id).cloned())
            .collect();
        let skipped_stale = blueprint.place_ids.len() - places.len();
        let title = zone.title.clone();

        let today = self.today_key();
        let now_ms = self.clock.now_ms();
        if self.field_day_for_key(&today).is_none() {
            self.field_days
                .push(FieldDay::briefed(today.clone(), zone_id, title, now_ms));
        }
        let Some(day) = self.field_days.iter_mut().find(|day| day.date_key == today) else {
            return 0;
        };

        let mut added = 0;
        for place in &places {
            if day.contains_place(place.id) {
                continue;
            }
            let stop = DeploymentStop::from_place(place, day.stops.len());
            push_stop(day, stop, now_ms);
            added += 1;
        }
        let day_id = day.id;
        self.mark_deployed(zone_id, now_ms);
        info!(
            "event=blueprint_apply module=field_day status=ok day_id={} blueprint_id={} added={} skipped_stale={}",
            day_id, blueprint_id, added, skipped_stale
        );
        self.commit(&[Collection::FieldDays, Collection::Zones]);
        added
    }

    /// Removes one stop, capturing the whole queue for undo.
    pub fn withdraw_stop(&mut self, day_id: FieldDayId, stop_id: StopId) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            return false;
        };
        let Some(position) = day.stop_position(stop_id) else {
            debug!("event=stop_withdraw module=field_day status=noop reason=missing_stop");
            return false;
        };
        let previous_status = day.status;
        let previous_queue = day.stops.clone();
        day.stops.remove(position);
        settle_queue(day, now_ms);
        self.arm_undo(UndoPayload::StopWithdrawn {
            day_id,
            previous_queue,
        });
        info!("event=stop_withdraw module=field_day status=ok day_id={day_id} stop_id={stop_id}");
        let touched = self.settle_day_rewards(day_id, Some(previous_status));
        self.commit(&touched);
        true
    }

    /// Moves stops within the queue, capturing the old order for undo.
    pub fn reorder_stops(
        &mut self,
        day_id: FieldDayId,
        from_indices: &[usize],
        to_index: usize,
    ) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            return false;
        };
        let previous_queue = day.stops.clone();
        let stops = std::mem::take(&mut day.stops);
        match move_items(stops, from_indices, to_index) {
            Ok(reordered) => day.stops = reordered,
            Err(untouched) => {
                day.stops = untouched;
                debug!("event=stop_reorder module=field_day status=noop reason=invalid_indices");
                return false;
            }
        }
        settle_queue(day, now_ms);
        self.arm_undo(UndoPayload::StopsReordered {
            day_id,
            previous_queue,
        });
        info!(
            "event=stop_reorder module=field_day status=ok day_id={} moved={}",
            day_id,
            from_indices.len()
        );
        self.commit(&[Collection::FieldDays]);
        true
    }

    /// Empties today's queue, capturing it for undo.
    pub fn clear_today_plan(&mut self) -> bool {
        let today = self.today_key();
        let now_ms = self.clock.now_ms();
        let Some(day) = self.field_days.iter_mut().find(|day| day.date_key == today) else {
            return false;
        };
        if day.stops.is_empty() {
            debug!("event=plan_clear module=field_day status=noop reason=empty_queue");
            return false;
        }
        let day_id = day.id;
        let previous_queue = std::mem::take(&mut day.stops);
        let cleared = previous_queue.len();
        settle_queue(day, now_ms);
        self.arm_undo(UndoPayload::PlanCleared {
            day_id,
            previous_queue,
        });
        info!("event=plan_clear module=field_day status=ok day_id={day_id} stops={cleared}");
        self.commit(&[Collection::FieldDays]);
        true
    }

    /// Removes today's field day entirely, capturing it for undo.
    pub fn reset_today(&mut self) -> bool {
        let today = self.today_key();
        let Some(position) = self.field_days.iter().position(|day| day.date_key == today) else {
            return false;
        };
        let day = self.field_days.remove(position);
        let day_id = day.id;
        self.arm_undo(UndoPayload::DayReset { day });
        info!("event=day_reset module=field_day status=ok day_id={day_id}");
        self.commit(&[Collection::FieldDays]);
        true
    }

    /// Flips a stop's accomplished flag and recomputes the day status.
    ///
    /// Entering `Accomplished` awards the mission (points, rank, streak,
    /// day-level medals).
    pub fn toggle_stop(&mut self, day_id: FieldDayId, stop_id: StopId) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            return false;
        };
        let Some(position) = day.stop_position(stop_id) else {
            debug!("event=stop_toggle module=field_day status=noop reason=missing_stop");
            return false;
        };
        let previous_status = day.status;
        let stop = &mut day.stops[position];
        stop.is_accomplished = !stop.is_accomplished;
        stop.accomplished_at = stop.is_accomplished.then_some(now_ms);
        let accomplished = stop.is_accomplished;
        day.refresh_status();
        day.updated_at = now_ms;
        let status = day.status;
        info!(
            "event=stop_toggle module=field_day status=ok day_id={} stop_id={} accomplished={} day_status={}",
            day_id,
            stop_id,
            accomplished,
            status.label()
        );

        let touched = self.settle_day_rewards(day_id, Some(previous_status));
        self.commit(&touched);
        true
    }

    /// Shrinks the largest buffers of a day by one step each.
    ///
    /// Returns how many stops changed.
    pub fn compress_buffers(&mut self, day_id: FieldDayId, count: usize) -> usize {
        let now_ms = self.clock.now_ms();
        let Some(day) = self.day_mut(day_id) else {
            return 0;
        };
        let compressed = pressure::compress_buffers(&mut day.stops, count);
        if compressed == 0 {
            debug!("event=buffer_compress module=field_day status=noop day_id={day_id}");
            return 0;
        }
        day.updated_at = now_ms;
        info!("event=buffer_compress module=field_day status=ok day_id={day_id} compressed={compressed}");
        self.commit(&[Collection::FieldDays]);
        compressed
    }

    /// Appends a light alternative of the current queue; never applied.
    pub fn create_light_variant(&mut self, day_id: FieldDayId) -> Option<VariantId> {
        let now_ms = self.clock.now_ms();
        let day = self.day_mut(day_id)?;
        if day.stops.is_empty() {
            debug!("event=variant_create module=field_day status=noop reason=empty_queue");
            return None;
        }
        let variant = AlternativeOps {
            id: Uuid::new_v4(),
            name: LIGHT_VARIANT_NAME.to_string(),
            stops: pressure::light_variant_stops(&day.stops),
            created_at: now_ms,
        };
        let variant_id = variant.id;
        info!(
            "event=variant_create module=field_day status=ok day_id={} variant_id={} stops={}",
            day_id,
            variant_id,
            variant.stops.len()
        );
        day.variants.push(variant);
        day.updated_at = now_ms;
        self.commit(&[Collection::FieldDays]);
        Some(variant_id)
    }

    pub fn pressure(&self, day_id: FieldDayId) -> Option<PressureReport> {
        self.field_day(day_id)
            .map(|day| pressure::assess(day, &self.config))
    }

    fn day_mut(&mut self, day_id: FieldDayId) -> Option<&mut FieldDay> {
        self.field_days.iter_mut().find(|day| day.id == day_id)
    }

    fn mark_deployed(&mut self, zone_id: ZoneId, now_ms: i64) {
        if let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) {
            zone.last_deployed_at = Some(now_ms);
        }
    }
}

fn bind_zone(day: &mut FieldDay, zone_id: ZoneId, title: String, now_ms: i64) {
    day.assigned_zone_id = Some(zone_id);
    day.zone_title_snapshot = title;
    if day.status == MissionStatus::Vacant {
        day.status = MissionStatus::Briefed;
    }
    day.updated_at = now_ms;
}

fn push_stop(day: &mut FieldDay, stop: DeploymentStop, now_ms: i64) {
    day.stops.push(stop);
    day.refresh_status();
    day.updated_at = now_ms;
}

fn settle_queue(day: &mut FieldDay, now_ms: i64) {
    day.normalize_stop_indices();
    day.refresh_status();
    day.updated_at = now_ms;
}
