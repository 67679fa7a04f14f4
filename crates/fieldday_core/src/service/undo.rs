//! Single-slot, time-boxed undo.
//!
//! # Responsibility
//! - Hold the pre-mutation state of the most recent destructive action.
//! - Expire that state after a fixed window.
//!
//! # Invariants
//! - At most one snapshot exists; arming replaces (and cancels) the previous one.
//! - An expired snapshot is never returned, even if its timer has not fired yet.
//! - One expiry worker per manager; re-arming moves its deadline.
//! - The expiry worker holds only a weak reference to the slot.

use crate::model::field_day::{DeploymentStop, FieldDay, FieldDayId};
use crate::model::zone::{Place, Zone, ZoneId};
use log::{debug, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoActionKind {
    DeleteZone,
    DeletePlace,
    WithdrawStop,
    ReorderStops,
    ClearPlan,
    ResetDay,
}

impl UndoActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::DeleteZone => "delete_zone",
            Self::DeletePlace => "delete_place",
            Self::WithdrawStop => "withdraw_stop",
            Self::ReorderStops => "reorder_stops",
            Self::ClearPlan => "clear_plan",
            Self::ResetDay => "reset_day",
        }
    }
}

/// Reversal data, one variant per reversible action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoPayload {
    ZoneDeleted {
        zone: Zone,
    },
    PlaceDeleted {
        zone_id: ZoneId,
        place: Place,
        position: usize,
    },
    StopWithdrawn {
        day_id: FieldDayId,
        previous_queue: Vec<DeploymentStop>,
    },
    StopsReordered {
        day_id: FieldDayId,
        previous_queue: Vec<DeploymentStop>,
    },
    PlanCleared {
        day_id: FieldDayId,
        previous_queue: Vec<DeploymentStop>,
    },
    DayReset {
        day: FieldDay,
    },
}

impl UndoPayload {
    pub fn kind(&self) -> UndoActionKind {
        match self {
            Self::ZoneDeleted { .. } => UndoActionKind::DeleteZone,
            Self::PlaceDeleted { .. } => UndoActionKind::DeletePlace,
            Self::StopWithdrawn { .. } => UndoActionKind::WithdrawStop,
            Self::StopsReordered { .. } => UndoActionKind::ReorderStops,
            Self::PlanCleared { .. } => UndoActionKind::ClearPlan,
            Self::DayReset { .. } => UndoActionKind::ResetDay,
        }
    }

    /// Ids of the entities the action touched.
    pub fn affected_ids(&self) -> Vec<Uuid> {
        match self {
            Self::ZoneDeleted { zone } => vec![zone.id],
            Self::PlaceDeleted { zone_id, place, .. } => vec![*zone_id, place.id],
            Self::StopWithdrawn { day_id, .. }
            | Self::StopsReordered { day_id, .. }
            | Self::PlanCleared { day_id, .. } => vec![*day_id],
            Self::DayReset { day } => vec![day.id],
        }
    }
}

#[derive(Default)]
struct UndoSlot {
    /// Payload and the instant it expires.
    pending: Option<(UndoPayload, Instant)>,
}

/// Message to the expiry worker.
#[derive(Clone, Copy)]
enum TimerCommand {
    Arm(Instant),
    Cancel,
}

pub struct UndoManager {
    slot: Arc<Mutex<UndoSlot>>,
    window: Duration,
    timer: Option<Sender<TimerCommand>>,
    timer_spawns: u32,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl UndoManager {
    pub fn new(window: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(UndoSlot::default())),
            window,
            timer: None,
            timer_spawns: 0,
        }
    }

    /// Applies to snapshots armed after the call.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Stores `payload` as the only snapshot and re-arms the expiry timer.
    pub fn arm(&mut self, payload: UndoPayload) {
        let kind = payload.kind();
        let expires_at = Instant::now() + self.window;
        {
            let Ok(mut slot) = self.slot.lock() else {
                warn!("event=undo_arm module=undo status=error error_code=lock_poisoned");
                return;
            };
            slot.pending = Some((payload, expires_at));
        }
        debug!(
            "event=undo_arm module=undo status=ok kind={} window_ms={}",
            kind.label(),
            self.window.as_millis()
        );
        self.signal(TimerCommand::Arm(expires_at));
    }

    /// Removes and returns the snapshot if it has not expired.
    pub fn take(&mut self) -> Option<UndoPayload> {
        let taken = {
            let mut slot = self.slot.lock().ok()?;
            slot.pending.take()
        };
        self.signal(TimerCommand::Cancel);
        let (payload, expires_at) = taken?;
        if Instant::now() >= expires_at {
            debug!(
                "event=undo_take module=undo status=expired kind={}",
                payload.kind().label()
            );
            return None;
        }
        Some(payload)
    }

    /// Discards the snapshot. Returns whether one was pending.
    pub fn clear(&mut self) -> bool {
        let cleared = match self.slot.lock() {
            Ok(mut slot) => slot.pending.take().is_some(),
            Err(_) => return false,
        };
        self.signal(TimerCommand::Cancel);
        cleared
    }

    /// Kind of the live snapshot, if any.
    pub fn pending_kind(&self) -> Option<UndoActionKind> {
        let slot = self.slot.lock().ok()?;
        slot.pending
            .as_ref()
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(payload, _)| payload.kind())
    }

    /// Sends `command` to the expiry worker, starting it on first use.
    fn signal(&mut self, command: TimerCommand) {
        if matches!(command, TimerCommand::Cancel) && self.timer.is_none() {
            return;
        }
        let command = match self.timer.as_ref().map(|timer| timer.send(command)) {
            Some(Ok(())) => return,
            Some(Err(SendError(command))) => command,
            None => command,
        };
        match self.spawn_worker() {
            Ok(sender) => {
                if sender.send(command).is_ok() {
                    self.timer = Some(sender);
                }
            }
            Err(err) => {
                // Expiry is still enforced lazily by `take` and `pending_kind`.
                self.timer = None;
                warn!(
                    "event=undo_arm module=undo status=degraded error_code=timer_spawn_failed error={}",
                    err
                );
            }
        }
    }

    fn spawn_worker(&mut self) -> std::io::Result<Sender<TimerCommand>> {
        let (sender, receiver) = mpsc::channel();
        let weak_slot: Weak<Mutex<UndoSlot>> = Arc::downgrade(&self.slot);
        thread::Builder::new()
            .name("fieldday-undo-expiry".to_string())
            .spawn(move || run_expiry(&receiver, &weak_slot))?;
        self.timer_spawns += 1;
        debug!(
            "event=undo_timer module=undo status=started spawns={}",
            self.timer_spawns
        );
        Ok(sender)
    }
}

/// Expiry worker loop. Exits when the manager drops its sender or the slot
/// is gone.
fn run_expiry(receiver: &Receiver<TimerCommand>, weak_slot: &Weak<Mutex<UndoSlot>>) {
    let mut deadline: Option<Instant> = None;
    loop {
        let received = match deadline {
            Some(at) => receiver.recv_timeout(at.saturating_duration_since(Instant::now())),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(TimerCommand::Arm(at)) => deadline = Some(at),
            Ok(TimerCommand::Cancel) => deadline = None,
            Err(RecvTimeoutError::Timeout) => {
                deadline = None;
                let Some(shared) = weak_slot.upgrade() else {
                    return;
                };
                let Ok(mut slot) = shared.lock() else {
                    return;
                };
                match slot.pending.as_ref().map(|(_, expires_at)| *expires_at) {
                    Some(expires_at) if Instant::now() < expires_at => deadline = Some(expires_at),
                    Some(_) => {
                        slot.pending = None;
                        debug!("event=undo_expire module=undo status=ok");
                    }
                    None => {}
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
