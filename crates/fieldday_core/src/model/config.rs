//! Global command center configuration record.
//!
//! # Responsibility
//! - Hold time defaults, pressure thresholds, behaviour toggles, profile,
//!   notification settings, and gamification accumulators.
//!
//! # Invariants
//! - Exactly one instance exists per store.
//! - `dense_threshold_min <= critical_threshold_min` for accepted updates.
//! - Every field decodes with a default, so older and newer records load.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_MIN: u32 = 30;
pub const DEFAULT_BUFFER_MIN: u32 = 10;
pub const DEFAULT_DENSE_THRESHOLD_MIN: u32 = 360;
pub const DEFAULT_CRITICAL_THRESHOLD_MIN: u32 = 480;
pub const DEFAULT_RECOMMENDED_STOP_COUNT: u32 = 5;

/// Behaviour toggles consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorToggles {
    pub haptics_enabled: bool,
    pub sounds_enabled: bool,
    pub confirm_destructive_actions: bool,
    pub show_pressure_banner: bool,
}

impl Default for BehaviorToggles {
    fn default() -> Self {
        Self {
            haptics_enabled: true,
            sounds_enabled: true,
            confirm_destructive_actions: true,
            show_pressure_banner: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderProfile {
    pub avatar: String,
    pub callsign: String,
}

impl Default for CommanderProfile {
    fn default() -> Self {
        Self {
            avatar: "person.fill".to_string(),
            callsign: "Commander".to_string(),
        }
    }
}

/// Daily reminder settings. Scheduling itself belongs to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub reminder_hour: u8,
    pub reminder_minute: u8,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_hour: 8,
            reminder_minute: 0,
        }
    }
}

/// Single global configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandCenterConfig {
    pub default_duration_min: u32,
    pub default_buffer_min: u32,
    pub dense_threshold_min: u32,
    pub critical_threshold_min: u32,
    pub recommended_stop_count: u32,
    pub behavior: BehaviorToggles,
    pub streak_count: u32,
    pub longest_streak: u32,
    /// Date key of the day that last credited the streak.
    pub last_streak_date_key: Option<String>,
    /// Date key of the day that last earned mission points.
    pub last_mission_date_key: Option<String>,
    pub total_missions_accomplished: u32,
    pub lifetime_points: u64,
    pub current_rank_index: usize,
    pub profile: CommanderProfile,
    pub onboarding_completed: bool,
    pub notifications: NotificationSettings,
}

impl Default for CommandCenterConfig {
    fn default() -> Self {
        Self {
            default_duration_min: DEFAULT_DURATION_MIN,
            default_buffer_min: DEFAULT_BUFFER_MIN,
            dense_threshold_min: DEFAULT_DENSE_THRESHOLD_MIN,
            critical_threshold_min: DEFAULT_CRITICAL_THRESHOLD_MIN,
            recommended_stop_count: DEFAULT_RECOMMENDED_STOP_COUNT,
            behavior: BehaviorToggles::default(),
            streak_count: 0,
            longest_streak: 0,
            last_streak_date_key: None,
            last_mission_date_key: None,
            total_missions_accomplished: 0,
            lifetime_points: 0,
            current_rank_index: 0,
            profile: CommanderProfile::default(),
            onboarding_completed: false,
            notifications: NotificationSettings::default(),
        }
    }
}

impl CommandCenterConfig {
    /// Returns whether the pressure thresholds are ordered.
    pub fn thresholds_are_ordered(&self) -> bool {
        self.dense_threshold_min <= self.critical_threshold_min
    }
}

#[cfg(test)]
mod tests {
    use super::CommandCenterConfig;

    #[test]
    fn partial_record_decodes_with_defaults() {
        let config: CommandCenterConfig =
            serde_json::from_str(r#"{"streak_count": 4, "profile": {"callsign": "Kite"}}"#)
                .expect("partial config should decode");
        assert_eq!(config.streak_count, 4);
        assert_eq!(config.profile.callsign, "Kite");
        assert_eq!(config.profile.avatar, "person.fill");
        assert_eq!(config.critical_threshold_min, 480);
    }
}
