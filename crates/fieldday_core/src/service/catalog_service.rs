//! Zone and place catalog use-cases.
//!
//! # Responsibility
//! - Create, rename, pin, archive, reorder and delete zones.
//! - Manage places and route blueprints scoped to one zone.
//! - Provide deterministic listing, sorting and filtering views.
//!
//! # Invariants
//! - Blank titles and names are rejected as no-ops.
//! - Non-archived zone `sort_index` values stay dense after every mutation.
//! - Zone and place deletion arm a single-slot undo before removal.

use crate::model::zone::{
    BlueprintId, Place, PlaceDraft, PlaceId, PlaceTag, RouteBlueprint, Zone, ZoneId,
};
use crate::service::engine::Engine;
use crate::service::events::Collection;
use crate::service::ordering::move_items;
use crate::service::undo::UndoPayload;
use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use uuid::Uuid;

impl Engine {
    /// Creates a zone at the end of the visible ordering.
    pub fn create_zone(&mut self, title: &str, icon: &str) -> Option<ZoneId> {
        let title = title.trim();
        if title.is_empty() {
            debug!("event=zone_create module=catalog status=noop reason=blank_title");
            return None;
        }
        let sort_index = self.zones.iter().filter(|zone| !zone.is_archived).count();
        let zone = Zone::new(title, icon.trim(), sort_index, self.clock.now_ms());
        let zone_id = zone.id;
        self.zones.push(zone);
        info!(
            "event=zone_create module=catalog status=ok zone_id={} sort_index={}",
            zone_id, sort_index
        );
        self.commit(&[Collection::Zones]);
        Some(zone_id)
    }

    pub fn rename_zone(&mut self, zone_id: ZoneId, title: &str) -> bool {
        let title = title.trim().to_string();
        if title.is_empty() {
            debug!("event=zone_rename module=catalog status=noop reason=blank_title");
            return false;
        }
        if !self.update_zone(zone_id, "zone_rename", |zone| zone.title = title) {
            return false;
        }
        self.commit(&[Collection::Zones]);
        true
    }

    pub fn set_zone_icon(&mut self, zone_id: ZoneId, icon: &str) -> bool {
        let icon = icon.trim().to_string();
        if !self.update_zone(zone_id, "zone_icon", |zone| zone.icon = icon) {
            return false;
        }
        self.commit(&[Collection::Zones]);
        true
    }

    pub fn toggle_pin(&mut self, zone_id: ZoneId) -> bool {
        if !self.update_zone(zone_id, "zone_pin", |zone| zone.is_pinned = !zone.is_pinned) {
            return false;
        }
        self.commit(&[Collection::Zones]);
        true
    }

    /// Archives or restores a zone. A restored zone joins the end of the
    /// visible ordering.
    pub fn toggle_archive(&mut self, zone_id: ZoneId) -> bool {
        let tail = self.zones.iter().filter(|zone| !zone.is_archived).count();
        let toggled = self.update_zone(zone_id, "zone_archive", |zone| {
            zone.is_archived = !zone.is_archived;
            if !zone.is_archived {
                zone.sort_index = tail;
            }
        });
        if !toggled {
            return false;
        }
        self.normalize_zone_indices();
        self.commit(&[Collection::Zones]);
        true
    }

    /// Removes a zone after capturing it for undo.
    pub fn delete_zone(&mut self, zone_id: ZoneId) -> bool {
        let Some(position) = self.zones.iter().position(|zone| zone.id == zone_id) else {
            debug!("event=zone_delete module=catalog status=noop reason=missing zone_id={zone_id}");
            return false;
        };
        let zone = self.zones.remove(position);
        let place_count = zone.places.len();
        self.arm_undo(UndoPayload::ZoneDeleted { zone });
        self.normalize_zone_indices();
        info!(
            "event=zone_delete module=catalog status=ok zone_id={} places={}",
            zone_id, place_count
        );
        self.commit(&[Collection::Zones]);
        true
    }

    /// Moves zones within the visible (non-archived, pinned-first) ordering.
    ///
    /// Indices refer to positions in `active_zones_sorted()`.
    pub fn reorder_zones(&mut self, from_indices: &[usize], to_index: usize) -> bool {
        let visible = self.active_zone_ids();
        let Ok(reordered) = move_items(visible, from_indices, to_index) else {
            debug!(
                "event=zone_reorder module=catalog status=noop reason=invalid_indices count={}",
                from_indices.len()
            );
            return false;
        };
        let now_ms = self.clock.now_ms();
        for (index, zone_id) in reordered.iter().enumerate() {
            if let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == *zone_id) {
                zone.sort_index = index;
                zone.updated_at = now_ms;
            }
        }
        info!(
            "event=zone_reorder module=catalog status=ok moved={} to_index={}",
            from_indices.len(),
            to_index
        );
        self.commit(&[Collection::Zones]);
        true
    }

    /// Non-archived zones, pinned first, then by `sort_index`.
    pub fn active_zones_sorted(&self) -> Vec<&Zone> {
        self.active_zone_ids()
            .into_iter()
            .filter_map(|zone_id| self.zone(zone_id))
            .collect()
    }

    /// Archived zones in creation order.
    pub fn archived_zones(&self) -> Vec<&Zone> {
        let mut archived: Vec<&Zone> = self.zones.iter().filter(|zone| zone.is_archived).collect();
        archived.sort_by_key(|zone| zone.created_at);
        archived
    }

    pub fn place(&self, zone_id: ZoneId, place_id: PlaceId) -> Option<&Place> {
        self.zone(zone_id)?.place(place_id)
    }

    pub fn create_place(&mut self, zone_id: ZoneId, draft: PlaceDraft) -> Option<PlaceId> {
        let title = draft.title.trim();
        if title.is_empty() {
            debug!("event=place_create module=catalog status=noop reason=blank_title");
            return None;
        }
        let now_ms = self.clock.now_ms();
        let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) else {
            debug!("event=place_create module=catalog status=noop reason=missing_zone zone_id={zone_id}");
            return None;
        };
        let place = Place {
            id: Uuid::new_v4(),
            title: title.to_string(),
            tag: draft.tag,
            duration_min: draft.duration_min,
            buffer_min: draft.buffer_min,
            memo: draft.memo.trim().to_string(),
            is_favorite: false,
            icon: draft.icon.trim().to_string(),
            created_at: now_ms,
            updated_at: now_ms,
        };
        let place_id = place.id;
        zone.places.push(place);
        zone.updated_at = now_ms;
        info!(
            "event=place_create module=catalog status=ok zone_id={} place_id={}",
            zone_id, place_id
        );
        self.commit(&[Collection::Zones]);
        Some(place_id)
    }

    /// Replaces the editable fields of a place. Favorite state is kept.
    pub fn update_place(&mut self, zone_id: ZoneId, place_id: PlaceId, draft: PlaceDraft) -> bool {
        let title = draft.title.trim();
        if title.is_empty() {
            debug!("event=place_update module=catalog status=noop reason=blank_title");
            return false;
        }
        let now_ms = self.clock.now_ms();
        let Some(place) = self.place_mut(zone_id, place_id) else {
            debug!("event=place_update module=catalog status=noop reason=missing place_id={place_id}");
            return false;
        };
        place.title = title.to_string();
        place.tag = draft.tag;
        place.duration_min = draft.duration_min;
        place.buffer_min = draft.buffer_min;
        place.memo = draft.memo.trim().to_string();
        place.icon = draft.icon.trim().to_string();
        place.updated_at = now_ms;
        info!("event=place_update module=catalog status=ok zone_id={zone_id} place_id={place_id}");
        self.commit(&[Collection::Zones]);
        true
    }

    /// Removes a place after capturing it and its position for undo.
    pub fn delete_place(&mut self, zone_id: ZoneId, place_id: PlaceId) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) else {
            return false;
        };
        let Some(position) = zone.places.iter().position(|place| place.id == place_id) else {
            debug!("event=place_delete module=catalog status=noop reason=missing place_id={place_id}");
            return false;
        };
        let place = zone.places.remove(position);
        zone.updated_at = now_ms;
        self.arm_undo(UndoPayload::PlaceDeleted {
            zone_id,
            place,
            position,
        });
        info!("event=place_delete module=catalog status=ok zone_id={zone_id} place_id={place_id}");
        self.commit(&[Collection::Zones]);
        true
    }

    pub fn toggle_favorite(&mut self, zone_id: ZoneId, place_id: PlaceId) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(place) = self.place_mut(zone_id, place_id) else {
            return false;
        };
        place.is_favorite = !place.is_favorite;
        place.updated_at = now_ms;
        debug!(
            "event=place_favorite module=catalog status=ok place_id={} favorite={}",
            place_id, place.is_favorite
        );
        self.commit(&[Collection::Zones]);
        true
    }

    /// Places of a zone: favorites first, then oldest first.
    ///
    /// The sort is stable, so equal keys keep catalog order.
    pub fn sorted_places(&self, zone_id: ZoneId) -> Vec<&Place> {
        let Some(zone) = self.zone(zone_id) else {
            return Vec::new();
        };
        let mut places: Vec<&Place> = zone.places.iter().collect();
        places.sort_by_key(|place| (!place.is_favorite, place.created_at));
        places
    }

    /// Sorted places whose title or memo contains `query`, ignoring case,
    /// optionally restricted to one tag.
    pub fn filter_places(
        &self,
        zone_id: ZoneId,
        query: &str,
        tag: Option<PlaceTag>,
    ) -> Vec<&Place> {
        let matcher = substring_matcher(query);
        self.sorted_places(zone_id)
            .into_iter()
            .filter(|place| tag.is_none_or(|tag| place.tag == tag))
            .filter(|place| match &matcher {
                Some(regex) => regex.is_match(&place.title) || regex.is_match(&place.memo),
                None => true,
            })
            .collect()
    }

    /// Saves a named route over existing places of the zone.
    ///
    /// Unknown place ids are dropped; a blueprint with no places left is
    /// rejected.
    pub fn create_blueprint(
        &mut self,
        zone_id: ZoneId,
        name: &str,
        place_ids: &[PlaceId],
    ) -> Option<BlueprintId> {
        let name = name.trim();
        if name.is_empty() {
            debug!("event=blueprint_create module=catalog status=noop reason=blank_name");
            return None;
        }
        let now_ms = self.clock.now_ms();
        let zone = self.zones.iter_mut().find(|zone| zone.id == zone_id)?;
        let mut kept: Vec<PlaceId> = Vec::with_capacity(place_ids.len());
        for place_id in place_ids {
            if zone.place(*place_id).is_some() && !kept.contains(place_id) {
                kept.push(*place_id);
            }
        }
        if kept.is_empty() {
            debug!("event=blueprint_create module=catalog status=noop reason=no_places zone_id={zone_id}");
            return None;
        }
        let blueprint = RouteBlueprint {
            id: Uuid::new_v4(),
            name: name.to_string(),
            place_ids: kept,
            created_at: now_ms,
        };
        let blueprint_id = blueprint.id;
        info!(
            "event=blueprint_create module=catalog status=ok zone_id={} blueprint_id={} places={}",
            zone_id,
            blueprint_id,
            blueprint.place_ids.len()
        );
        zone.blueprints.push(blueprint);
        zone.updated_at = now_ms;
        self.commit(&[Collection::Zones]);
        Some(blueprint_id)
    }

    pub fn delete_blueprint(&mut self, zone_id: ZoneId, blueprint_id: BlueprintId) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) else {
            return false;
        };
        let before = zone.blueprints.len();
        zone.blueprints.retain(|blueprint| blueprint.id != blueprint_id);
        if zone.blueprints.len() == before {
            return false;
        }
        zone.updated_at = now_ms;
        info!("event=blueprint_delete module=catalog status=ok zone_id={zone_id} blueprint_id={blueprint_id}");
        self.commit(&[Collection::Zones]);
        true
    }

    fn place_mut(&mut self, zone_id: ZoneId, place_id: PlaceId) -> Option<&mut Place> {
        self.zones
            .iter_mut()
            .find(|zone| zone.id == zone_id)?
            .place_mut(place_id)
    }

    /// Applies `mutate` to one zone and refreshes `updated_at`. Callers commit.
    fn update_zone(
        &mut self,
        zone_id: ZoneId,
        event: &str,
        mutate: impl FnOnce(&mut Zone),
    ) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(zone) = self.zones.iter_mut().find(|zone| zone.id == zone_id) else {
            debug!("event={event} module=catalog status=noop reason=missing zone_id={zone_id}");
            return false;
        };
        mutate(zone);
        zone.updated_at = now_ms;
        info!("event={event} module=catalog status=ok zone_id={zone_id}");
        true
    }
}

/// Case-insensitive literal matcher; `None` for a blank query.
fn substring_matcher(query: &str) -> Option<Regex> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("event=place_filter module=catalog status=degraded error={err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::substring_matcher;

    #[test]
    fn matcher_treats_query_as_literal_and_ignores_case() {
        let regex = substring_matcher("  Caf(e ").expect("matcher");
        assert!(regex.is_match("old CAF(E corner"));
        assert!(!regex.is_match("cafe"));
        assert!(substring_matcher("   ").is_none());
    }
}
