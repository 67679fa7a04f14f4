//! Domain engine: owner of every in-memory collection.
//!
//! # Responsibility
//! - Load the four storage units once and own them exclusively.
//! - Route each mutation through `commit`, which saves the touched units,
//!   re-evaluates medals, and publishes change events.
//! - Execute the single-slot undo.
//!
//! # Invariants
//! - All mutation goes through `&mut self`; callers serialize access.
//! - After any mutation, non-archived zone `sort_index` values are dense.
//! - At most one field day exists per date key.
//! - No public operation panics or returns a storage error; failures
//!   degrade to `false` / `None` and are logged.

use crate::model::config::CommandCenterConfig;
use crate::model::field_day::{DeploymentStop, FieldDay, FieldDayId};
use crate::model::medal::{locked_catalog, FieldMedal};
use crate::model::zone::{Place, Zone, ZoneId};
use crate::service::clock::{date_key, Clock, SystemClock};
use crate::service::events::{ChangeEvent, Collection, EventBus, SubscriptionId};
use crate::service::undo::{UndoActionKind, UndoManager, UndoPayload};
use crate::store::{PersistenceStore, StorageUnit, StoreResult};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

pub struct Engine {
    pub(crate) zones: Vec<Zone>,
    pub(crate) field_days: Vec<FieldDay>,
    pub(crate) config: CommandCenterConfig,
    pub(crate) medals: Vec<FieldMedal>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) undo: UndoManager,
    store: PersistenceStore,
    events: EventBus,
    pending_events: Vec<ChangeEvent>,
}

impl Engine {
    /// Builds an engine over `store`, loading every unit.
    pub fn new(store: PersistenceStore, clock: Box<dyn Clock>) -> Self {
        let zones: Vec<Zone> = store.load(StorageUnit::Zones);
        let field_days: Vec<FieldDay> = store.load(StorageUnit::FieldDays);
        let config: CommandCenterConfig = store.load(StorageUnit::Config);
        let medals = store.load_medals();

        let mut engine = Self {
            zones,
            field_days,
            config,
            medals,
            clock,
            undo: UndoManager::default(),
            store,
            events: EventBus::default(),
            pending_events: Vec::new(),
        };
        engine.repair_loaded_state();
        info!(
            "event=engine_load module=engine status=ok zones={} field_days={} medals_unlocked={}",
            engine.zones.len(),
            engine.field_days.len(),
            engine.medals.iter().filter(|medal| medal.is_unlocked).count()
        );
        engine
    }

    /// Opens a SQLite-backed engine at `path` using the system clock.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(PersistenceStore::open(path)?, Box::new(SystemClock)))
    }

    /// Opens an engine over a private in-memory database.
    pub fn open_in_memory(clock: Box<dyn Clock>) -> StoreResult<Self> {
        Ok(Self::new(PersistenceStore::open_in_memory()?, clock))
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&ChangeEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Overrides the undo expiry window for snapshots armed afterwards.
    pub fn set_undo_window(&mut self, window: Duration) {
        self.undo.set_window(window);
    }

    /// Blocks until queued writes reach storage.
    pub fn flush(&self) -> bool {
        self.store.flush()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn field_days(&self) -> &[FieldDay] {
        &self.field_days
    }

    pub fn config(&self) -> &CommandCenterConfig {
        &self.config
    }

    pub fn medals(&self) -> &[FieldMedal] {
        &self.medals
    }

    pub fn today_key(&self) -> String {
        date_key(self.clock.today())
    }

    pub fn zone(&self, zone_id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == zone_id)
    }

    pub fn field_day(&self, day_id: FieldDayId) -> Option<&FieldDay> {
        self.field_days.iter().find(|day| day.id == day_id)
    }

    pub fn field_day_for_key(&self, date_key: &str) -> Option<&FieldDay> {
        self.field_days.iter().find(|day| day.date_key == date_key)
    }

    /// Field day for today's date key.
    pub fn current_field_day(&self) -> Option<&FieldDay> {
        self.field_day_for_key(&self.today_key())
    }

    /// Kind of the pending undo action, if any is still live.
    pub fn undo_available(&self) -> Option<UndoActionKind> {
        self.undo.pending_kind()
    }

    /// Replaces the configuration record wholesale.
    ///
    /// Returns `false` when the dense threshold exceeds the critical one.
    pub fn update_config(&mut self, config: CommandCenterConfig) -> bool {
        if !config.thresholds_are_ordered() {
            debug!("event=config_update module=engine status=noop reason=thresholds_unordered");
            return false;
        }
        self.config = config;
        self.commit(&[Collection::Config]);
        true
    }

    pub fn update_avatar(&mut self, avatar: impl Into<String>) -> bool {
        let avatar = avatar.into();
        let avatar = avatar.trim();
        if avatar.is_empty() {
            return false;
        }
        self.config.profile.avatar = avatar.to_string();
        self.commit(&[Collection::Config]);
        true
    }

    pub fn update_callsign(&mut self, callsign: impl Into<String>) -> bool {
        let callsign = callsign.into();
        let callsign = callsign.trim();
        if callsign.is_empty() {
            return false;
        }
        self.config.profile.callsign = callsign.to_string();
        self.commit(&[Collection::Config]);
        true
    }

    pub fn set_onboarding_completed(&mut self, completed: bool) {
        self.config.onboarding_completed = completed;
        self.commit(&[Collection::Config]);
    }

    pub fn set_notifications(&mut self, enabled: bool, hour: u8, minute: u8) -> bool {
        if hour > 23 || minute > 59 {
            return false;
        }
        self.config.notifications.enabled = enabled;
        self.config.notifications.reminder_hour = hour;
        self.config.notifications.reminder_minute = minute;
        self.commit(&[Collection::Config]);
        true
    }

    /// Wipes every collection back to defaults, including backups.
    pub fn nuclear_reset(&mut self) {
        self.zones.clear();
        self.field_days.clear();
        self.config = CommandCenterConfig::default();
        self.medals = locked_catalog();
        if self.undo.clear() {
            self.pending_events.push(ChangeEvent::UndoCleared);
        }
        self.store.discard_backups();
        warn!("event=nuclear_reset module=engine status=ok");
        self.commit(&[
            Collection::Zones,
            Collection::FieldDays,
            Collection::Config,
            Collection::Medals,
        ]);
    }

    /// Restores the state captured by the last destructive action.
    ///
    /// Returns `false` when nothing is pending, the snapshot expired, or its
    /// target no longer exists.
    pub fn execute_undo(&mut self) -> bool {
        let Some(payload) = self.undo.take() else {
            debug!("event=undo_execute module=undo status=noop reason=empty");
            return false;
        };
        let kind = payload.kind();
        let affected = payload
            .affected_ids()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut touched = Vec::new();
        let restored = match payload {
            UndoPayload::ZoneDeleted { zone } => self.restore_zone(zone),
            UndoPayload::PlaceDeleted {
                zone_id,
                place,
                position,
            } => self.restore_place(zone_id, place, position),
            UndoPayload::StopWithdrawn {
                day_id,
                previous_queue,
            }
            | UndoPayload::StopsReordered {
                day_id,
                previous_queue,
            }
            | UndoPayload::PlanCleared {
                day_id,
                previous_queue,
            } => {
                let previous = self.field_day(day_id).map(|day| day.status);
                let restored = self.restore_queue(day_id, previous_queue);
                if restored {
                    touched = self.settle_day_rewards(day_id, previous);
                }
                restored
            }
            UndoPayload::DayReset { day } => self.restore_day(day),
        };

        info!(
            "event=undo_execute module=undo status={} kind={} affected_ids={}",
            if restored { "ok" } else { "noop" },
            kind.label(),
            affected
        );
        self.pending_events.push(ChangeEvent::UndoCleared);
        match (restored, kind) {
            (true, UndoActionKind::DeleteZone | UndoActionKind::DeletePlace) => {
                self.commit(&[Collection::Zones]);
            }
            (true, UndoActionKind::ResetDay) => self.commit(&[Collection::FieldDays]),
            (true, _) => self.commit(&touched),
            (false, _) => self.publish_pending(),
        }
        restored
    }

    fn restore_zone(&mut self, zone: Zone) -> bool {
        if self.zone(zone.id).is_some() {
            return false;
        }
        if !zone.is_archived {
            // Reopen the gap the zone left so it lands at its old position.
            for sibling in self
                .zones
                .iter_mut()
                .filter(|sibling| !sibling.is_archived && sibling.sort_index >= zone.sort_index)
            {
                sibling.sort_index += 1;
            }
        }
        self.zones.push(zone);
        self.normalize_zone_indices();
        true
    }

    fn restore_place(&mut self, zone_id: ZoneId, place: Place, position: usize) -> bool {
        let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) else {
            return false;
        };
        if zone.place(place.id).is_some() {
            return false;
        }
        let position = position.min(zone.places.len());
        zone.places.insert(position, place);
        true
    }

    fn restore_queue(&mut self, day_id: FieldDayId, previous_queue: Vec<DeploymentStop>) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(day) = self.field_days.iter_mut().find(|day| day.id == day_id) else {
            return false;
        };
        day.stops = previous_queue;
        day.normalize_stop_indices();
        day.refresh_status();
        day.updated_at = now_ms;
        true
    }

    fn restore_day(&mut self, day: FieldDay) -> bool {
        if self.field_day_for_key(&day.date_key).is_some() {
            return false;
        }
        self.field_days.push(day);
        true
    }

    /// Stores `payload` as the undo snapshot and queues its event.
    pub(crate) fn arm_undo(&mut self, payload: UndoPayload) {
        let kind = payload.kind();
        self.undo.arm(payload);
        self.pending_events.push(ChangeEvent::UndoArmed(kind));
    }

    pub(crate) fn queue_event(&mut self, event: ChangeEvent) {
        self.pending_events.push(event);
    }

    /// Saves `touched` units and publishes change events.
    ///
    /// Medals are re-evaluated first so unlocks caused by this mutation are
    /// saved and announced in the same pass.
    pub(crate) fn commit(&mut self, touched: &[Collection]) {
        let mut touched = touched.to_vec();
        if self.evaluate_medals(Default::default()) && !touched.contains(&Collection::Medals) {
            touched.push(Collection::Medals);
        }

        for collection in &touched {
            self.persist(*collection);
        }
        for collection in touched {
            self.events.publish(&ChangeEvent::Changed(collection));
        }
        self.publish_pending();
    }

    fn publish_pending(&mut self) {
        for event in self.pending_events.drain(..) {
            self.events.publish(&event);
        }
    }

    fn persist(&self, collection: Collection) {
        match collection {
            Collection::Zones => self.store.save(StorageUnit::Zones, &self.zones),
            Collection::FieldDays => self.store.save(StorageUnit::FieldDays, &self.field_days),
            Collection::Config => self.store.save(StorageUnit::Config, &self.config),
            Collection::Medals => self.store.save(StorageUnit::Medals, &self.medals),
        }
    }

    /// Sorted ids of non-archived zones: pinned first, then `sort_index`.
    pub(crate) fn active_zone_ids(&self) -> Vec<ZoneId> {
        let mut active: Vec<&Zone> = self.zones.iter().filter(|zone| !zone.is_archived).collect();
        active.sort_by_key(|zone| (!zone.is_pinned, zone.sort_index));
        active.into_iter().map(|zone| zone.id).collect()
    }

    /// Compacts non-archived `sort_index` values to `0..N-1`, keeping their
    /// relative order. Pin state does not take part.
    pub(crate) fn normalize_zone_indices(&mut self) {
        let mut active: Vec<&mut Zone> = self
            .zones
            .iter_mut()
            .filter(|zone| !zone.is_archived)
            .collect();
        active.sort_by_key(|zone| zone.sort_index);
        for (index, zone) in active.into_iter().enumerate() {
            zone.sort_index = index;
        }
    }

    fn repair_loaded_state(&mut self) {
        self.normalize_zone_indices();

        let mut seen = HashSet::new();
        let before = self.field_days.len();
        self.field_days.retain(|day| seen.insert(day.date_key.clone()));
        if self.field_days.len() != before {
            warn!(
                "event=engine_load module=engine status=repaired duplicate_field_days={}",
                before - self.field_days.len()
            );
        }
        for day in &mut self.field_days {
            day.normalize_stop_indices();
        }
    }
}
