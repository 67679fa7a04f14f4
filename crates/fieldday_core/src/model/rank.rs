//! Fixed rank ladder.
//!
//! # Invariants
//! - Eight tiers with strictly increasing `required_missions`.
//! - The first tier requires zero missions, so a rank always resolves.

/// One tier of the rank ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankTier {
    pub title: &'static str,
    pub icon: &'static str,
    pub required_missions: u32,
}

pub const RANK_LADDER: [RankTier; 8] = [
    RankTier {
        title: "Recruit",
        icon: "chevron.up",
        required_missions: 0,
    },
    RankTier {
        title: "Scout",
        icon: "binoculars.fill",
        required_missions: 3,
    },
    RankTier {
        title: "Ranger",
        icon: "leaf.fill",
        required_missions: 7,
    },
    RankTier {
        title: "Pathfinder",
        icon: "location.north.fill",
        required_missions: 15,
    },
    RankTier {
        title: "Navigator",
        icon: "safari.fill",
        required_missions: 30,
    },
    RankTier {
        title: "Field Commander",
        icon: "star.circle.fill",
        required_missions: 50,
    },
    RankTier {
        title: "Marshal",
        icon: "crown.fill",
        required_missions: 75,
    },
    RankTier {
        title: "Legend",
        icon: "trophy.fill",
        required_missions: 100,
    },
];

/// Highest ladder index whose threshold is met by `missions`.
pub fn rank_index_for(missions: u32) -> usize {
    RANK_LADDER
        .iter()
        .rposition(|tier| tier.required_missions <= missions)
        .unwrap_or(0)
}

/// Tier at `index`, clamped to the top of the ladder.
pub fn rank_tier(index: usize) -> &'static RankTier {
    &RANK_LADDER[index.min(RANK_LADDER.len() - 1)]
}

/// Missions still needed to reach the next tier; `None` at the top.
pub fn missions_to_next_rank(missions: u32) -> Option<u32> {
    RANK_LADDER
        .get(rank_index_for(missions) + 1)
        .map(|next| next.required_missions - missions)
}
