//! Zone catalog domain model.
//!
//! # Responsibility
//! - Define zones, their catalog places, and reusable route blueprints.
//! - Provide read-only load metrics derived from place fields.
//!
//! # Invariants
//! - `sort_index` is a dense `0..N-1` ordering over non-archived zones.
//! - Pinned zones are listed before unpinned zones regardless of index.
//! - Blueprint place ids are not referential constraints; they may go stale.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a zone.
pub type ZoneId = Uuid;
/// Stable identifier of a catalog place.
pub type PlaceId = Uuid;
/// Stable identifier of a route blueprint.
pub type BlueprintId = Uuid;

/// Category of a catalog place.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlaceTag {
    Food,
    Services,
    Shopping,
    Errands,
    Meeting,
    #[default]
    Other,
}

impl PlaceTag {
    pub const ALL: [PlaceTag; 6] = [
        PlaceTag::Food,
        PlaceTag::Services,
        PlaceTag::Shopping,
        PlaceTag::Errands,
        PlaceTag::Meeting,
        PlaceTag::Other,
    ];

    /// Stable lowercase label, matching the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Services => "services",
            Self::Shopping => "shopping",
            Self::Errands => "errands",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.label() == normalized.as_str())
    }
}

/// Catalog entry within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub title: String,
    #[serde(default)]
    pub tag: PlaceTag,
    pub duration_min: u32,
    #[serde(default)]
    pub buffer_min: u32,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub icon: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Place {
    /// Total minutes a visit occupies: duration plus buffer.
    pub fn total_load_min(&self) -> u32 {
        self.duration_min.saturating_add(self.buffer_min)
    }
}

/// Caller-provided fields for creating or updating a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDraft {
    pub title: String,
    pub tag: PlaceTag,
    pub duration_min: u32,
    pub buffer_min: u32,
    pub memo: String,
    pub icon: String,
}

impl PlaceDraft {
    pub fn new(
        title: impl Into<String>,
        tag: PlaceTag,
        duration_min: u32,
        buffer_min: u32,
    ) -> Self {
        Self {
            title: title.into(),
            tag,
            duration_min,
            buffer_min,
            memo: String::new(),
            icon: String::new(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

/// Named, ordered list of place ids used as a reusable route template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBlueprint {
    pub id: BlueprintId,
    pub name: String,
    pub place_ids: Vec<PlaceId>,
    pub created_at: i64,
}

/// User-defined geographic or activity area grouping catalog places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub sort_index: usize,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub last_deployed_at: Option<i64>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub blueprints: Vec<RouteBlueprint>,
}

impl Zone {
    /// Creates an active, unpinned zone with no places.
    pub fn new(
        title: impl Into<String>,
        icon: impl Into<String>,
        sort_index: usize,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            icon: icon.into(),
            is_pinned: false,
            is_archived: false,
            sort_index,
            created_at: now_ms,
            updated_at: now_ms,
            last_deployed_at: None,
            places: Vec::new(),
            blueprints: Vec::new(),
        }
    }

    pub fn place(&self, place_id: PlaceId) -> Option<&Place> {
        self.places.iter().find(|place| place.id == place_id)
    }

    pub fn place_mut(&mut self, place_id: PlaceId) -> Option<&mut Place> {
        self.places.iter_mut().find(|place| place.id == place_id)
    }

    pub fn favorite_count(&self) -> usize {
        self.places.iter().filter(|place| place.is_favorite).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{Place, PlaceTag};
    use uuid::Uuid;

    #[test]
    fn total_load_adds_buffer_to_duration() {
        let place = Place {
            id: Uuid::new_v4(),
            title: "Bakery".to_string(),
            tag: PlaceTag::Food,
            duration_min: 20,
            buffer_min: 10,
            memo: String::new(),
            is_favorite: false,
            icon: String::new(),
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(place.total_load_min(), 30);
    }

    #[test]
    fn tag_parse_is_case_insensitive() {
        assert_eq!(PlaceTag::parse(" Food "), Some(PlaceTag::Food));
        assert_eq!(PlaceTag::parse("unknown"), None);
    }
}
