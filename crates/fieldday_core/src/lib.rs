//! Core domain engine for Field Day Command.
//! This crate is the single source of truth for planning invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::config::CommandCenterConfig;
pub use model::field_day::{
    AlternativeOps, DeploymentStop, FieldDay, FieldDayId, MissionStatus, QuickStopDraft, StopId,
};
pub use model::medal::FieldMedal;
pub use model::rank::{RankTier, RANK_LADDER};
pub use model::zone::{Place, PlaceDraft, PlaceId, PlaceTag, RouteBlueprint, Zone, ZoneId};
pub use report::{IntelReport, LifetimeStats, ReportWindow};
pub use repo::unit_repo::{RepoError, RepoResult, SqliteUnitRepository, UnitRepository};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::engine::Engine;
pub use service::events::{ChangeEvent, Collection, SubscriptionId};
pub use service::pressure::{PressureLevel, PressureReport};
pub use service::undo::UndoActionKind;
pub use store::{PersistenceStore, StorageUnit, StoreError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
