//! Day pressure (overload) evaluation and quick fixes.
//!
//! # Invariants
//! - Levels compare planned minutes with strict `>` against each threshold.
//! - Quick fixes never push a buffer below zero.

use crate::model::config::CommandCenterConfig;
use crate::model::field_day::{DeploymentStop, FieldDay};
use uuid::Uuid;

/// Minutes removed from a buffer by one compression pass.
pub const BUFFER_COMPRESS_STEP_MIN: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PressureLevel {
    Steady,
    Dense,
    Critical,
}

impl PressureLevel {
    pub fn evaluate(
        total_planned_min: u32,
        dense_threshold_min: u32,
        critical_threshold_min: u32,
    ) -> Self {
        if total_planned_min > critical_threshold_min {
            Self::Critical
        } else if total_planned_min > dense_threshold_min {
            Self::Dense
        } else {
            Self::Steady
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Dense => "dense",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureReport {
    pub level: PressureLevel,
    pub total_planned_min: u32,
    /// Minutes above the critical threshold; zero otherwise.
    pub pressure_delta_min: u32,
    pub stop_count: usize,
    /// Stops beyond the configured recommended count.
    pub stops_over_recommended: usize,
}

pub fn assess(day: &FieldDay, config: &CommandCenterConfig) -> PressureReport {
    let total_planned_min = day.total_planned_min();
    let recommended = usize::try_from(config.recommended_stop_count).unwrap_or(usize::MAX);
    PressureReport {
        level: PressureLevel::evaluate(
            total_planned_min,
            config.dense_threshold_min,
            config.critical_threshold_min,
        ),
        total_planned_min,
        pressure_delta_min: total_planned_min.saturating_sub(config.critical_threshold_min),
        stop_count: day.stops.len(),
        stops_over_recommended: day.stops.len().saturating_sub(recommended),
    }
}

/// Reduces the buffer of the `count` stops with the largest buffers.
///
/// Ties keep queue order. Returns how many buffers actually shrank.
pub fn compress_buffers(stops: &mut [DeploymentStop], count: usize) -> usize {
    let mut order: Vec<usize> = (0..stops.len()).collect();
    // Stable sort keeps original order among equal buffers.
    order.sort_by(|a, b| stops[*b].buffer_min.cmp(&stops[*a].buffer_min));

    let mut compressed = 0;
    for index in order.into_iter().take(count) {
        let stop = &mut stops[index];
        let reduced = stop.buffer_min.saturating_sub(BUFFER_COMPRESS_STEP_MIN);
        if reduced != stop.buffer_min {
            stop.buffer_min = reduced;
            compressed += 1;
        }
    }
    compressed
}

/// Number of leading stops a light plan keeps: two thirds, rounded up.
pub fn light_keep_count(stop_count: usize) -> usize {
    (stop_count * 2).div_ceil(3)
}

/// Builds the stop list of a light plan from the current queue order.
pub fn light_variant_stops(stops: &[DeploymentStop]) -> Vec<DeploymentStop> {
    stops
        .iter()
        .take(light_keep_count(stops.len()))
        .enumerate()
        .map(|(index, stop)| DeploymentStop {
            id: Uuid::new_v4(),
            buffer_min: stop.buffer_min.saturating_sub(BUFFER_COMPRESS_STEP_MIN),
            sort_index: index,
            ..stop.clone()
        })
        .collect()
}
