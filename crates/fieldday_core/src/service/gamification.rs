//! Rank, streak and medal progression.
//!
//! # Responsibility
//! - Award points and missions when a field day becomes accomplished.
//! - Maintain the daily streak and the longest-streak accumulator.
//! - Unlock medals whose criterion is met by the current aggregates.
//!
//! # Invariants
//! - Unlocked medals are never re-locked and keep their first timestamp.
//! - Points, missions and the streak are credited at most once per date key.
//! - `current_rank_index` always matches `total_missions_accomplished`.

use crate::model::field_day::{FieldDayId, MissionStatus};
use crate::model::medal::{medal_definition, MedalProgress};
use crate::model::rank::{self, RankTier};
use crate::service::clock::{date_key, parse_date_key};
use crate::service::engine::Engine;
use crate::service::events::{ChangeEvent, Collection};
use crate::service::pressure::{self, PressureLevel};
use chrono::Duration;
use log::info;

/// Points granted per stop of an accomplished day.
pub const POINTS_PER_STOP: u64 = 10;

/// Day-level facts that only exist at the moment a day is accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayOutcome {
    pub perfect_day: bool,
    pub overload_survivor: bool,
}

impl Engine {
    pub fn current_rank(&self) -> &'static RankTier {
        rank::rank_tier(self.config.current_rank_index)
    }

    /// Missions left until the next tier; `None` at the top of the ladder.
    pub fn missions_to_next_rank(&self) -> Option<u32> {
        rank::missions_to_next_rank(self.config.total_missions_accomplished)
    }

    /// Aggregate counters medal criteria are checked against.
    pub fn medal_progress(&self) -> MedalProgress {
        let architect_zones = self
            .zones
            .iter()
            .filter(|zone| zone.places.len() >= 5)
            .count();
        MedalProgress {
            zone_count: self.zones.len(),
            place_count: self.zones.iter().map(|zone| zone.places.len()).sum(),
            favorite_count: self.zones.iter().map(|zone| zone.favorite_count()).sum(),
            streak: self.config.streak_count,
            missions_accomplished: self.config.total_missions_accomplished,
            stops_accomplished: self
                .field_days
                .iter()
                .map(|day| day.accomplished_count())
                .sum(),
            blueprint_count: self.zones.iter().map(|zone| zone.blueprints.len()).sum(),
            perfect_day: false,
            overload_survivor: false,
            zone_architect: architect_zones >= 3,
        }
    }

    /// Unlocks every locked medal whose criterion is now met.
    ///
    /// Returns whether any medal changed.
    pub(crate) fn evaluate_medals(&mut self, outcome: DayOutcome) -> bool {
        let progress = MedalProgress {
            perfect_day: outcome.perfect_day,
            overload_survivor: outcome.overload_survivor,
            ..self.medal_progress()
        };
        let now_ms = self.clock.now_ms();

        let mut unlocked = Vec::new();
        for medal in self.medals.iter_mut().filter(|medal| !medal.is_unlocked) {
            let Some(definition) = medal_definition(&medal.id) else {
                continue;
            };
            if definition.criterion.is_met(&progress) && medal.unlock(now_ms) {
                unlocked.push(medal.id.clone());
            }
        }

        let changed = !unlocked.is_empty();
        for medal_id in unlocked {
            info!("event=medal_unlock module=gamification status=ok medal_id={medal_id}");
            self.queue_event(ChangeEvent::MedalUnlocked { medal_id });
        }
        changed
    }

    /// Awards the mission when `day_id` moved into `Accomplished` from
    /// `previous`. Every path that can complete a day calls this.
    ///
    /// Returns the collections the caller must commit.
    pub(crate) fn settle_day_rewards(
        &mut self,
        day_id: FieldDayId,
        previous: Option<MissionStatus>,
    ) -> Vec<Collection> {
        let mut touched = vec![Collection::FieldDays];
        let Some(day) = self.field_day(day_id) else {
            return touched;
        };
        if day.status != MissionStatus::Accomplished
            || previous == Some(MissionStatus::Accomplished)
        {
            return touched;
        }
        let outcome = DayOutcome {
            perfect_day: true,
            overload_survivor: pressure::assess(day, &self.config).level
                == PressureLevel::Critical,
        };
        let day_key = day.date_key.clone();
        let stop_count = day.stops.len();
        touched.push(Collection::Config);
        if self.on_day_accomplished(&day_key, stop_count, outcome) {
            touched.push(Collection::Medals);
        }
        touched
    }

    /// Applies mission rewards for a day that just became accomplished.
    ///
    /// A date key that already earned its mission only re-checks medals.
    /// Returns whether any medal was unlocked.
    pub(crate) fn on_day_accomplished(
        &mut self,
        day_key: &str,
        stop_count: usize,
        outcome: DayOutcome,
    ) -> bool {
        if self.config.last_mission_date_key.as_deref() == Some(day_key) {
            info!("event=mission_accomplished module=gamification status=noop reason=already_credited");
            return self.evaluate_medals(outcome);
        }
        let points = POINTS_PER_STOP.saturating_mul(stop_count as u64);
        let config = &mut self.config;
        config.lifetime_points = config.lifetime_points.saturating_add(points);
        config.total_missions_accomplished = config.total_missions_accomplished.saturating_add(1);
        config.last_mission_date_key = Some(day_key.to_string());

        let previous_rank = config.current_rank_index;
        let rank_index = rank::rank_index_for(config.total_missions_accomplished);
        config.current_rank_index = rank_index;
        let promoted = rank_index > previous_rank;

        self.credit_streak(day_key);
        info!(
            "event=mission_accomplished module=gamification status=ok points={} missions={} rank_index={} streak={}",
            points,
            self.config.total_missions_accomplished,
            rank_index,
            self.config.streak_count
        );
        if promoted {
            info!("event=rank_promote module=gamification status=ok rank_index={rank_index}");
            self.queue_event(ChangeEvent::RankPromoted { rank_index });
        }
        self.evaluate_medals(outcome)
    }

    /// Extends the streak when yesterday was accomplished, else restarts it.
    fn credit_streak(&mut self, day_key: &str) {
        if self.config.last_streak_date_key.as_deref() == Some(day_key) {
            return;
        }
        let yesterday_accomplished = parse_date_key(day_key)
            .and_then(|date| date.checked_sub_signed(Duration::days(1)))
            .map(date_key)
            .and_then(|yesterday| self.field_day_for_key(&yesterday))
            .is_some_and(|day| day.status == MissionStatus::Accomplished);

        let config = &mut self.config;
        config.streak_count = if yesterday_accomplished {
            config.streak_count.saturating_add(1)
        } else {
            1
        };
        config.longest_streak = config.longest_streak.max(config.streak_count);
        config.last_streak_date_key = Some(day_key.to_string());
    }
}
