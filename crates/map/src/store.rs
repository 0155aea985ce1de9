//! Persistent map and search state
//!
//! [`MapStore`] is the single source of truth for the map viewport, the
//! displayed results, selection, and search context. It is cheap to clone;
//! all clones share one state. Every mutation is one atomic transition on a
//! `watch` channel, so subscribers always observe whole states.

use fourmore_api_client::{Poi, PoiKey};
use fourmore_geo::{BoundingBox, Coordinate};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};

/// Where the map starts before anything else is known
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 40.7128,
    longitude: -74.0060,
};

pub const DEFAULT_ZOOM: f64 = 15.0;

/// How the current results were produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsOrigin {
    /// An explicit search; the map fits to the results
    Search,
    /// A refetch of what is already on screen; the map stays put
    Viewport,
}

/// Map position saved before navigating away
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSnapshot {
    pub center: Coordinate,
    pub bounds: Option<BoundingBox>,
}

/// Everything the home screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub center: Coordinate,
    pub zoom: f64,
    /// Only ever reported by the rendered map
    pub bounds: Option<BoundingBox>,
    pub include_user_location: bool,
    pub user_location: Option<Coordinate>,

    /// Displayed results in display order
    pub pois: Vec<Poi>,
    pub results_origin: Option<ResultsOrigin>,
    pub selected: Option<PoiKey>,
    pub expanded: Option<PoiKey>,

    /// Text as typed
    pub search_query: String,
    /// Label on the collapsed search control
    pub search_display: String,
    pub last_search_category: Option<String>,
    pub last_search_center: Option<Coordinate>,
    /// Zoom of the last search that produced results
    pub last_search_zoom: Option<f64>,

    /// The user panned away from `reference_center`
    pub map_moved: bool,
    /// Center the current results were loaded around
    pub reference_center: Option<Coordinate>,

    snapshot: Option<MapSnapshot>,
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            bounds: None,
            include_user_location: false,
            user_location: None,
            pois: Vec::new(),
            results_origin: None,
            selected: None,
            expanded: None,
            search_query: String::new(),
            search_display: String::new(),
            last_search_category: None,
            last_search_center: None,
            last_search_zoom: None,
            map_moved: false,
            reference_center: None,
            snapshot: None,
        }
    }
}

impl MapState {
    pub fn has_results(&self) -> bool {
        !self.pois.is_empty()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn poi(&self, key: &PoiKey) -> Option<&Poi> {
        self.pois.iter().find(|poi| poi.key() == *key)
    }

    pub fn contains(&self, key: &PoiKey) -> bool {
        self.poi(key).is_some()
    }

    pub fn selected_poi(&self) -> Option<&Poi> {
        self.selected.as_ref().and_then(|key| self.poi(key))
    }

    /// Results other than the place the user is checked in to
    pub fn nearby_pois(&self) -> Vec<&Poi> {
        self.pois.iter().filter(|poi| !poi.is_checked_in()).collect()
    }

    /// Results inside the current bounds; zero while bounds are unknown
    pub fn visible_poi_count(&self) -> usize {
        self.bounds.map_or(0, |bounds| {
            self.pois
                .iter()
                .filter(|poi| bounds.contains(&poi.coordinate()))
                .count()
        })
    }

    fn prune_selection(&mut self) {
        if self.selected.is_some_and(|key| !self.contains(&key)) {
            trace!("Selected POI left the result set");
            self.selected = None;
        }
        if self.expanded.is_some_and(|key| !self.contains(&key)) {
            self.expanded = None;
        }
    }
}

/// Shared, observable map state
#[derive(Debug, Clone)]
pub struct MapStore {
    tx: Arc<watch::Sender<MapState>>,
}

impl Default for MapStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MapStore {
    pub fn new() -> Self {
        Self::with_state(MapState::default())
    }

    pub fn with_state(state: MapState) -> Self {
        let (tx, _) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current state
    pub fn state(&self) -> MapState {
        self.tx.borrow().clone()
    }

    /// Read without cloning
    pub fn read<R>(&self, f: impl FnOnce(&MapState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<MapState> {
        self.tx.subscribe()
    }

    fn update(&self, f: impl FnOnce(&mut MapState)) {
        self.tx.send_modify(f);
    }

    pub fn set_map_center(&self, center: Coordinate) {
        self.update(|s| s.center = center);
    }

    pub fn set_map_bounds(&self, bounds: Option<BoundingBox>) {
        self.update(|s| s.bounds = bounds);
    }

    pub fn set_current_zoom(&self, zoom: f64) {
        self.update(|s| s.zoom = zoom);
    }

    pub fn set_include_user_location(&self, include: bool) {
        self.update(|s| s.include_user_location = include);
    }

    pub fn set_user_location(&self, location: Option<Coordinate>) {
        self.update(|s| s.user_location = location);
    }

    /// Replace the result set, dropping selections that no longer exist
    pub fn set_pois(&self, pois: Vec<Poi>) {
        self.update(|s| {
            s.pois = pois;
            s.prune_selection();
        });
    }

    /// Replace the result set and record how it was produced
    pub fn replace_results(&self, pois: Vec<Poi>, origin: ResultsOrigin) {
        self.update(|s| {
            debug!(count = pois.len(), ?origin, "Results replaced");
            s.pois = pois;
            s.results_origin = Some(origin);
            s.prune_selection();
        });
    }

    /// Select a displayed POI; keys not in the result set clear the selection
    pub fn set_selected_poi(&self, key: Option<PoiKey>) {
        self.update(|s| s.selected = key.filter(|k| s.contains(k)));
    }

    pub fn set_expanded_poi(&self, key: Option<PoiKey>) {
        self.update(|s| s.expanded = key.filter(|k| s.contains(k)));
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|s| s.search_query = query);
    }

    pub fn set_search_display(&self, display: impl Into<String>) {
        let display = display.into();
        self.update(|s| s.search_display = display);
    }

    /// Remember the active category search; `None` means "everything nearby"
    pub fn set_last_search(&self, category: Option<String>, center: Option<Coordinate>, zoom: Option<f64>) {
        self.update(|s| {
            s.last_search_category = category;
            s.last_search_center = center;
            s.last_search_zoom = zoom;
        });
    }

    pub fn set_map_moved(&self, moved: bool) {
        self.update(|s| s.map_moved = moved);
    }

    pub fn set_reference_center(&self, center: Option<Coordinate>) {
        self.update(|s| s.reference_center = center);
    }

    /// Save center and bounds, overwriting any earlier snapshot
    pub fn snapshot_map_state(&self) {
        self.update(|s| {
            s.snapshot = Some(MapSnapshot {
                center: s.center,
                bounds: s.bounds,
            });
        });
    }

    /// Apply and consume the saved snapshot; false if there was none
    pub fn restore_map_snapshot(&self) -> bool {
        let mut restored = false;
        self.update(|s| {
            if let Some(snapshot) = s.snapshot.take() {
                s.center = snapshot.center;
                s.bounds = snapshot.bounds;
                restored = true;
            }
        });
        if restored {
            debug!("Map snapshot restored");
        }
        restored
    }

    /// Drop results and search context but keep the camera where it is
    pub fn clear_results(&self) {
        self.update(|s| {
            s.pois.clear();
            s.results_origin = None;
            s.selected = None;
            s.expanded = None;
            s.search_query.clear();
            s.search_display.clear();
            s.last_search_category = None;
            s.last_search_center = None;
            s.last_search_zoom = None;
            s.bounds = None;
            s.map_moved = false;
            s.reference_center = None;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourmore_search::testing::poi;
    use proptest::prelude::*;

    fn key(id: i64) -> PoiKey {
        poi(id, "", "cafe", 0.0, 0.0).key()
    }

    #[test]
    fn test_selection_pruned_on_replace() {
        let store = MapStore::new();
        store.set_pois(vec![poi(1, "A", "cafe", 40.0, -74.0), poi(2, "B", "bar", 40.0, -74.0)]);
        store.set_selected_poi(Some(key(1)));
        store.set_expanded_poi(Some(key(2)));

        store.set_pois(vec![poi(2, "B", "bar", 40.0, -74.0)]);
        let state = store.state();
        assert_eq!(state.selected, None);
        assert_eq!(state.expanded, Some(key(2)));
    }

    #[test]
    fn test_selecting_missing_poi_clears() {
        let store = MapStore::new();
        store.set_pois(vec![poi(1, "A", "cafe", 40.0, -74.0)]);
        store.set_selected_poi(Some(key(9)));
        assert_eq!(store.state().selected, None);
    }

    #[test]
    fn test_snapshot_is_single_use() {
        let store = MapStore::new();
        let saved = Coordinate::new(41.0, -73.0);
        store.set_map_center(saved);
        store.snapshot_map_state();
        store.set_map_center(Coordinate::new(10.0, 10.0));

        assert!(store.restore_map_snapshot());
        assert_eq!(store.state().center, saved);

        let moved = Coordinate::new(42.0, -72.0);
        store.set_map_center(moved);
        assert!(!store.restore_map_snapshot());
        assert_eq!(store.state().center, moved);
    }

    #[test]
    fn test_snapshot_overwrites_previous() {
        let store = MapStore::new();
        store.set_map_center(Coordinate::new(1.0, 1.0));
        store.snapshot_map_state();
        store.set_map_center(Coordinate::new(2.0, 2.0));
        store.snapshot_map_state();
        store.set_map_center(Coordinate::new(3.0, 3.0));

        assert!(store.restore_map_snapshot());
        assert_eq!(store.state().center, Coordinate::new(2.0, 2.0));
    }

    #[test]
    fn test_clear_results_keeps_camera() {
        let store = MapStore::new();
        let center = Coordinate::new(40.0, -74.0);
        store.set_map_center(center);
        store.set_current_zoom(14.0);
        store.set_map_bounds(Some(BoundingBox::new(40.1, 39.9, -73.9, -74.1)));
        store.replace_results(vec![poi(1, "A", "cafe", 40.0, -74.0)], ResultsOrigin::Search);
        store.set_selected_poi(Some(key(1)));
        store.set_search_display("Café");
        store.set_last_search(Some("cafe".into()), Some(center), Some(14.0));
        store.set_map_moved(true);

        store.clear_results();
        let state = store.state();
        assert!(state.pois.is_empty());
        assert_eq!(state.selected, None);
        assert!(state.search_display.is_empty());
        assert_eq!(state.last_search_category, None);
        assert_eq!(state.bounds, None);
        assert!(!state.map_moved);
        assert_eq!(state.center, center);
        assert_eq!(state.zoom, 14.0);
    }

    #[test]
    fn test_nearby_excludes_checked_in() {
        let mut here = poi(1, "Here", "cafe", 40.0, -74.0);
        here.is_checked_in = Some(true);
        let store = MapStore::new();
        store.set_pois(vec![here, poi(2, "There", "bar", 40.0, -74.0)]);

        let names: Vec<_> = store.read(|s| s.nearby_pois().iter().map(|p| p.display_name().to_string()).collect());
        assert_eq!(names, vec!["There"]);
    }

    #[test]
    fn test_visible_count_uses_bounds() {
        let store = MapStore::new();
        store.set_pois(vec![poi(1, "In", "cafe", 40.0, -74.0), poi(2, "Out", "cafe", 45.0, -74.0)]);
        assert_eq!(store.read(MapState::visible_poi_count), 0);

        store.set_map_bounds(Some(BoundingBox::new(40.1, 39.9, -73.9, -74.1)));
        assert_eq!(store.read(MapState::visible_poi_count), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = MapStore::new();
        let mut rx = store.subscribe();
        store.set_current_zoom(12.0);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().zoom, 12.0);
    }

    proptest! {
        #[test]
        fn prop_selection_always_references_a_result(
            lists in prop::collection::vec(prop::collection::vec(0i64..8, 0..6), 1..8),
            selected in 0i64..8,
            expanded in 0i64..8,
        ) {
            let store = MapStore::new();
            let first: Vec<Poi> = (0..8).map(|id| poi(id, "", "cafe", 0.0, 0.0)).collect();
            store.set_pois(first);
            store.set_selected_poi(Some(key(selected)));
            store.set_expanded_poi(Some(key(expanded)));

            for ids in lists {
                store.set_pois(ids.iter().map(|&id| poi(id, "", "cafe", 0.0, 0.0)).collect());
                let state = store.state();
                if let Some(k) = state.selected {
                    prop_assert!(state.contains(&k));
                }
                if let Some(k) = state.expanded {
                    prop_assert!(state.contains(&k));
                }
            }
        }
    }
}
