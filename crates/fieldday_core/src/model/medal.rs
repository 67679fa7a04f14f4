//! Medal catalog and unlock state.
//!
//! # Responsibility
//! - Define the fixed static medal catalog and each medal's unlock criterion.
//! - Merge persisted unlock state against the catalog.
//!
//! # Invariants
//! - Every catalog medal is present after `merge_with_catalog`.
//! - Once unlocked, a medal is never re-locked and `unlocked_at` never changes.

use serde::{Deserialize, Serialize};

/// Persisted medal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMedal {
    /// Stable string key from the catalog.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub is_unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<i64>,
}

impl FieldMedal {
    /// Unlocks the medal, returning `true` only on the first unlock.
    pub fn unlock(&mut self, now_ms: i64) -> bool {
        if self.is_unlocked {
            return false;
        }
        self.is_unlocked = true;
        self.unlocked_at = Some(now_ms);
        true
    }
}

/// Condition that unlocks one medal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedalCriterion {
    ZoneCount(usize),
    PlaceCount(usize),
    FavoriteCount(usize),
    Streak(u32),
    MissionsAccomplished(u32),
    StopsAccomplished(usize),
    BlueprintCount(usize),
    /// A day finished with every stop accomplished.
    PerfectDay,
    /// A day at critical pressure finished accomplished.
    OverloadSurvivor,
    /// At least three zones, each with at least five places.
    ZoneArchitect,
}

/// Aggregate counters a criterion is checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MedalProgress {
    pub zone_count: usize,
    pub place_count: usize,
    pub favorite_count: usize,
    pub streak: u32,
    pub missions_accomplished: u32,
    pub stops_accomplished: usize,
    pub blueprint_count: usize,
    pub perfect_day: bool,
    pub overload_survivor: bool,
    pub zone_architect: bool,
}

impl MedalCriterion {
    pub fn is_met(self, progress: &MedalProgress) -> bool {
        match self {
            Self::ZoneCount(required) => progress.zone_count >= required,
            Self::PlaceCount(required) => progress.place_count >= required,
            Self::FavoriteCount(required) => progress.favorite_count >= required,
            Self::Streak(required) => progress.streak >= required,
            Self::MissionsAccomplished(required) => progress.missions_accomplished >= required,
            Self::StopsAccomplished(required) => progress.stops_accomplished >= required,
            Self::BlueprintCount(required) => progress.blueprint_count >= required,
            Self::PerfectDay => progress.perfect_day,
            Self::OverloadSurvivor => progress.overload_survivor,
            Self::ZoneArchitect => progress.zone_architect,
        }
    }
}

/// Static catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedalDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub criterion: MedalCriterion,
}

impl MedalDefinition {
    fn locked(&self) -> FieldMedal {
        FieldMedal {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            is_unlocked: false,
            unlocked_at: None,
        }
    }
}

pub const MEDAL_CATALOG: &[MedalDefinition] = &[
    MedalDefinition {
        id: "first_zone",
        title: "Staked Claim",
        description: "Create your first zone.",
        icon: "flag.fill",
        criterion: MedalCriterion::ZoneCount(1),
    },
    MedalDefinition {
        id: "zone_collector",
        title: "Territory Holder",
        description: "Manage five zones.",
        icon: "map.fill",
        criterion: MedalCriterion::ZoneCount(5),
    },
    MedalDefinition {
        id: "first_place",
        title: "Ground Point",
        description: "Catalog your first place.",
        icon: "mappin",
        criterion: MedalCriterion::PlaceCount(1),
    },
    MedalDefinition {
        id: "cartographer",
        title: "Cartographer",
        description: "Catalog twenty-five places.",
        icon: "globe",
        criterion: MedalCriterion::PlaceCount(25),
    },
    MedalDefinition {
        id: "curator",
        title: "Curator",
        description: "Mark five places as favorites.",
        icon: "star.fill",
        criterion: MedalCriterion::FavoriteCount(5),
    },
    MedalDefinition {
        id: "first_mission",
        title: "Boots on the Ground",
        description: "Accomplish your first field day.",
        icon: "checkmark.seal.fill",
        criterion: MedalCriterion::MissionsAccomplished(1),
    },
    MedalDefinition {
        id: "veteran",
        title: "Veteran",
        description: "Accomplish twenty-five field days.",
        icon: "shield.fill",
        criterion: MedalCriterion::MissionsAccomplished(25),
    },
    MedalDefinition {
        id: "streak_3",
        title: "Momentum",
        description: "Hold a three-day streak.",
        icon: "flame",
        criterion: MedalCriterion::Streak(3),
    },
    MedalDefinition {
        id: "streak_7",
        title: "Full Week",
        description: "Hold a seven-day streak.",
        icon: "flame.fill",
        criterion: MedalCriterion::Streak(7),
    },
    MedalDefinition {
        id: "streak_30",
        title: "Unbroken",
        description: "Hold a thirty-day streak.",
        icon: "bolt.fill",
        criterion: MedalCriterion::Streak(30),
    },
    MedalDefinition {
        id: "stops_50",
        title: "Road Runner",
        description: "Accomplish fifty stops.",
        icon: "figure.walk",
        criterion: MedalCriterion::StopsAccomplished(50),
    },
    MedalDefinition {
        id: "stops_250",
        title: "Long Haul",
        description: "Accomplish two hundred fifty stops.",
        icon: "car.fill",
        criterion: MedalCriterion::StopsAccomplished(250),
    },
    MedalDefinition {
        id: "perfect_day",
        title: "Clean Sweep",
        description: "Finish a day with every stop accomplished.",
        icon: "sparkles",
        criterion: MedalCriterion::PerfectDay,
    },
    MedalDefinition {
        id: "overload_survivor",
        title: "Overload Survivor",
        description: "Accomplish a day planned at critical pressure.",
        icon: "exclamationmark.triangle.fill",
        criterion: MedalCriterion::OverloadSurvivor,
    },
    MedalDefinition {
        id: "route_planner",
        title: "Route Planner",
        description: "Save your first route blueprint.",
        icon: "point.topleft.down.curvedto.point.bottomright.up",
        criterion: MedalCriterion::BlueprintCount(1),
    },
    MedalDefinition {
        id: "zone_architect",
        title: "Zone Architect",
        description: "Build three zones with at least five places each.",
        icon: "building.2.fill",
        criterion: MedalCriterion::ZoneArchitect,
    },
];

pub fn medal_definition(id: &str) -> Option<&'static MedalDefinition> {
    MEDAL_CATALOG.iter().find(|definition| definition.id == id)
}

/// Returns every catalog medal in locked state.
pub fn locked_catalog() -> Vec<FieldMedal> {
    MEDAL_CATALOG.iter().map(MedalDefinition::locked).collect()
}

/// Merges stored medals with the static catalog.
///
/// Catalog order and text win; stored unlock state wins. Catalog medals
/// missing from storage are added locked. Stored ids unknown to the catalog
/// are dropped.
pub fn merge_with_catalog(stored: Vec<FieldMedal>) -> Vec<FieldMedal> {
    MEDAL_CATALOG
        .iter()
        .map(|definition| {
            let mut medal = definition.locked();
            if let Some(saved) = stored.iter().find(|saved| saved.id == definition.id) {
                medal.is_unlocked = saved.is_unlocked;
                medal.unlocked_at = saved.unlocked_at;
            }
            medal
        })
        .collect()
}
