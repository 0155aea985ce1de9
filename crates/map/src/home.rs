//! Home screen controller
//!
//! Wires the store, the map view, category search and place suggestions into
//! the home screen flow: a collapsible typeahead, seeding the camera from the
//! first location fix, a one-time "everything nearby" load, refetching after
//! the user pans, and the derived visibility of the floating controls.
//!
//! Every operation that replaces results takes a ticket from one shared
//! sequence, so whichever was issued last wins regardless of completion order.

use crate::error::{MapError, Result};
use crate::geolocation::{GeolocationProvider, LocationSource};
use crate::store::{MapState, MapStore, ResultsOrigin};
use crate::view::{ClickTarget, MapSurface, MapView, MapViewConfig, MoveEnd};
use fourmore_api_client::{Category, PlacesBackend, Poi, PoiKey};
use fourmore_core::config::ConfigSchema;
use fourmore_core::debounce::Debouncer;
use fourmore_core::sequence::RequestSequence;
use fourmore_geo::{BoundingBox, Coordinate, ViewportSize};
use fourmore_search::{
    CategoryCatalog, ContinueOutcome, ContinueRequest, PlaceSuggestionFetcher, ProgressiveSearch,
    ProgressiveSearchConfig, SearchError, SuggestionConfig,
};
use fourmore_telemetry::{metrics, names};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Label on the collapsed search control before anything was searched
pub const SEARCH_PLACEHOLDER: &str = "Search for places";

/// Informational outcomes that are not failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoResultsNearby,
    NoAdditionalResults,
    AlreadyAtMaximumArea,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoResultsNearby => "No results found nearby",
            Self::NoAdditionalResults => "No additional results found",
            Self::AlreadyAtMaximumArea => "Already showing maximum search area",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Search progress shown next to the search control
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeStatus {
    pub is_searching: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Collapsed,
    Open,
}

/// What the open typeahead shows
#[derive(Debug, Clone, PartialEq)]
pub struct Typeahead {
    pub mode: SearchMode,
    pub query: String,
    pub categories: Vec<Category>,
    pub places: Vec<Poi>,
    pub is_fetching: bool,
    pub error: Option<String>,
    pub has_minimum_query: bool,
}

/// Which floating controls are visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub search_here: bool,
    pub clear: bool,
    pub recenter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomeConfig {
    pub refetch_debounce: Duration,
    pub viewport_result_limit: usize,
    pub sparse_result_threshold: usize,
    pub move_threshold_deg: f64,
    pub category_suggestion_cap: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self::from_schema(&ConfigSchema::default())
    }
}

impl HomeConfig {
    pub fn from_schema(schema: &ConfigSchema) -> Self {
        Self {
            refetch_debounce: Duration::from_millis(schema.map.refetch_debounce_ms),
            viewport_result_limit: schema.search.viewport_result_limit,
            sparse_result_threshold: schema.map.sparse_result_threshold,
            move_threshold_deg: schema.map.move_threshold_deg,
            category_suggestion_cap: schema.search.category_suggestion_cap,
        }
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    mounted: bool,
    restored_snapshot: bool,
    located: bool,
    location_failed: bool,
    nearby_loaded: bool,
    mode: SearchMode,
}

struct Inner<B, M> {
    store: MapStore,
    view: MapView<M>,
    search: ProgressiveSearch<B>,
    catalog: Arc<CategoryCatalog>,
    config: HomeConfig,
    results: RequestSequence,
    status: watch::Sender<HomeStatus>,
    lifecycle: Mutex<Lifecycle>,
}

impl<B: PlacesBackend, M: MapSurface> Inner<B, M> {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_search(&self) {
        self.status.send_modify(|s| {
            s.is_searching = true;
            s.error = None;
            s.notice = None;
        });
    }

    fn finish(&self, notice: Option<Notice>) {
        let visible = self.store.read(MapState::visible_poi_count);
        metrics().gauge(names::VISIBLE_POIS, visible as u64);
        self.status.send_modify(|s| {
            s.is_searching = false;
            s.notice = notice;
        });
    }

    fn fail(&self, error: &SearchError) {
        let message = error.user_message();
        self.status.send_modify(|s| {
            s.is_searching = false;
            s.error = Some(message);
        });
    }

    fn discard_stale(&self, what: &str) {
        metrics().increment(names::STALE_RESPONSES_DISCARDED);
        debug!(what, "Discarding superseded results");
    }

    /// Query everything (or the active category) inside the visible bounds
    async fn refetch_viewport(&self) {
        let Some((bounds, category, last_zoom)) = self
            .store
            .read(|s| s.bounds.map(|b| (b, s.last_search_category.clone(), s.last_search_zoom)))
        else {
            return;
        };

        let ticket = self.results.issue();
        self.begin_search();
        metrics().increment(names::VIEWPORT_REFETCHES);
        debug!(?category, "Refetching visible area");

        let result = self
            .search
            .backend()
            .search_places_in_bbox(&bounds, category.as_deref(), self.config.viewport_result_limit)
            .await;

        if !self.results.is_current(ticket) {
            self.discard_stale("viewport refetch");
            return;
        }

        match result {
            Ok(pois) => {
                let center = bounds.center();
                let empty = pois.is_empty();
                self.store.replace_results(pois, ResultsOrigin::Viewport);
                self.store.set_map_moved(false);
                self.store.set_reference_center(Some(center));
                if category.is_some() {
                    self.store.set_last_search(category, Some(center), last_zoom);
                }
                self.view.fit_to_results(None);
                self.finish(empty.then_some(Notice::NoResultsNearby));
            }
            Err(e) => {
                warn!(error = %e, "Viewport refetch failed");
                self.fail(&SearchError::from(e));
            }
        }
    }
}

/// The home screen
pub struct HomeController<B: PlacesBackend + 'static, M> {
    inner: Arc<Inner<B, M>>,
    suggestions: PlaceSuggestionFetcher<B>,
    refetch: Debouncer,
}

impl<B: PlacesBackend + 'static, M> fmt::Debug for HomeController<B, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeController")
            .field("config", &self.inner.config)
            .field("refetch_pending", &self.refetch.is_pending())
            .finish_non_exhaustive()
    }
}

impl<B, M> HomeController<B, M>
where
    B: PlacesBackend + Clone + 'static,
    M: MapSurface + 'static,
{
    pub fn new(backend: B, surface: M, store: MapStore, schema: &ConfigSchema) -> Result<Self> {
        Self::with_catalog(
            backend,
            surface,
            store,
            schema,
            Arc::new(CategoryCatalog::builtin().clone()),
        )
    }

    pub fn with_catalog(
        backend: B,
        surface: M,
        store: MapStore,
        schema: &ConfigSchema,
        catalog: Arc<CategoryCatalog>,
    ) -> Result<Self> {
        ViewportSize::new(schema.map.viewport_width_px, schema.map.viewport_height_px).validated()?;

        let config = HomeConfig::from_schema(schema);
        let suggestions = PlaceSuggestionFetcher::with_catalog(
            backend.clone(),
            SuggestionConfig::from_schema(schema),
            Arc::clone(&catalog),
        );
        suggestions.set_enabled(false);

        let (status, _) = watch::channel(HomeStatus::default());
        Ok(Self {
            inner: Arc::new(Inner {
                view: MapView::new(surface, store.clone(), MapViewConfig::from_schema(schema)),
                store,
                search: ProgressiveSearch::new(backend, ProgressiveSearchConfig::from_schema(schema)),
                catalog,
                config,
                results: RequestSequence::new(),
                status,
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
            suggestions,
            refetch: Debouncer::new(config.refetch_debounce),
        })
    }

    pub fn store(&self) -> &MapStore {
        &self.inner.store
    }

    pub fn view(&self) -> &MapView<M> {
        &self.inner.view
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.inner.catalog
    }

    pub fn status(&self) -> HomeStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<HomeStatus> {
        self.inner.status.subscribe()
    }

    /// Screen became visible; restores the pre-navigation snapshot once
    pub fn mount(&self) -> bool {
        {
            let mut lifecycle = self.inner.lifecycle();
            if lifecycle.mounted {
                return false;
            }
            lifecycle.mounted = true;
        }

        let restored = self.inner.store.restore_map_snapshot();
        self.inner.lifecycle().restored_snapshot = restored;
        if restored {
            let center = self.inner.store.read(|s| s.center);
            info!(lat = center.latitude, lon = center.longitude, "Restored map position");
            self.inner.view.recenter(center);
        }
        restored
    }

    /// Save the camera before leaving the screen and stop pending work
    pub fn before_navigate(&self) {
        self.inner.store.snapshot_map_state();
        self.refetch.cancel();
        self.suggestions.shutdown();
    }

    /// Record a location fix
    ///
    /// The first fix centers the map on the user unless a snapshot was
    /// restored or results are already showing. Returns true if it did.
    pub fn on_location(&self, location: Coordinate) -> bool {
        self.inner.store.set_user_location(Some(location));
        self.suggestions.set_bias(Some(location));

        let seed = {
            let mut lifecycle = self.inner.lifecycle();
            let first = !lifecycle.located;
            lifecycle.located = true;
            first && !lifecycle.restored_snapshot && !self.inner.store.read(MapState::has_results)
        };

        if seed {
            info!(lat = location.latitude, lon = location.longitude, "Centering on first location fix");
            self.inner.view.recenter(location);
        }
        seed
    }

    /// The location request failed; show what is in view instead
    pub fn on_location_error(&self) {
        self.inner.lifecycle().location_failed = true;
        self.maybe_load_nearby();
    }

    /// Ask `provider` for a position and feed it to [`Self::on_location`]
    pub async fn locate<S: LocationSource>(&self, provider: &GeolocationProvider<S>) -> Result<Coordinate> {
        match provider.locate().await {
            Ok(location) => {
                self.on_location(location);
                Ok(location)
            }
            Err(e) => {
                self.on_location_error();
                Err(e.into())
            }
        }
    }

    /// The map settled
    pub fn on_move_end(&self, center: Coordinate, zoom: f64, bounds: BoundingBox) -> MoveEnd {
        let end = self.inner.view.on_move_end(center, zoom, bounds);
        self.maybe_load_nearby();

        if matches!(end, MoveEnd::User { .. }) && self.inner.store.read(|s| s.map_moved && s.bounds.is_some()) {
            let inner = Arc::clone(&self.inner);
            self.refetch.schedule(async move { inner.refetch_viewport().await });
        }
        end
    }

    /// Start the one-time load of everything in view, if its time has come
    ///
    /// Waits for the first fix, a restored snapshot or a failed location
    /// request, so bounds reported at the default center load nothing.
    fn maybe_load_nearby(&self) -> bool {
        let ready = self
            .inner
            .store
            .read(|s| s.bounds.is_some() && !s.has_results() && s.last_search_category.is_none());
        if !ready || self.inner.status.borrow().is_searching {
            return false;
        }

        {
            let mut lifecycle = self.inner.lifecycle();
            let anchored = lifecycle.located || lifecycle.restored_snapshot || lifecycle.location_failed;
            if lifecycle.nearby_loaded || !anchored {
                return false;
            }
            lifecycle.nearby_loaded = true;
        }

        info!("Loading everything nearby");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.refetch_viewport().await });
        true
    }

    pub fn open_search(&self) {
        self.inner.lifecycle().mode = SearchMode::Open;
        let query = self.inner.store.read(|s| s.search_query.clone());
        self.suggestions.set_query(&query);
        self.suggestions.set_enabled(true);
    }

    pub fn close_search(&self) {
        self.inner.lifecycle().mode = SearchMode::Collapsed;
        self.suggestions.set_enabled(false);
    }

    pub fn set_query(&self, query: &str) {
        self.inner.store.set_search_query(query);
        self.suggestions.set_query(query);
    }

    pub fn search_mode(&self) -> SearchMode {
        self.inner.lifecycle().mode
    }

    /// Text on the collapsed search control
    pub fn search_label(&self) -> String {
        self.inner.store.read(|s| {
            if s.search_display.is_empty() {
                SEARCH_PLACEHOLDER.to_string()
            } else {
                s.search_display.clone()
            }
        })
    }

    pub fn typeahead(&self) -> Typeahead {
        let mode = self.search_mode();
        let query = self.inner.store.read(|s| s.search_query.clone());
        let categories = self
            .inner
            .catalog
            .suggest(&query, self.inner.config.category_suggestion_cap)
            .into_iter()
            .cloned()
            .collect();
        let places = self.suggestions.state();
        Typeahead {
            mode,
            query,
            categories,
            places: places.suggestions,
            is_fetching: places.is_fetching,
            error: places.error,
            has_minimum_query: places.has_minimum_query,
        }
    }

    /// Run a category search around the map center
    pub async fn select_category(&self, class: &str) -> Result<usize> {
        self.close_search();
        self.refetch.cancel();
        self.inner.store.set_search_display(self.inner.catalog.label_for(class));

        let (center, zoom) = self.inner.store.read(|s| (s.center, s.zoom));
        let ticket = self.inner.results.issue();
        self.inner.begin_search();

        let outcome = self.inner.search.search_category(class, center, Some(zoom)).await;
        if !self.inner.results.is_current(ticket) {
            self.inner.discard_stale("category search");
            return Ok(0);
        }

        match outcome {
            Ok(outcome) => {
                let count = outcome.results.len();
                let store = &self.inner.store;
                store.replace_results(outcome.results, ResultsOrigin::Search);
                store.set_last_search(Some(class.to_string()), Some(outcome.center), Some(outcome.zoom));
                store.set_map_moved(false);
                store.set_reference_center(Some(outcome.center));
                self.inner.view.fit_to_results(None);
                self.inner.finish((count == 0).then_some(Notice::NoResultsNearby));
                Ok(count)
            }
            Err(e) => {
                self.inner.fail(&e);
                Err(e.into())
            }
        }
    }

    /// Show one place picked from the suggestions
    pub fn select_place(&self, poi: Poi) {
        self.close_search();
        self.refetch.cancel();
        self.inner.results.invalidate();

        let key = poi.key();
        let location = poi.coordinate();
        let store = &self.inner.store;
        store.set_search_display(poi.display_name());
        store.replace_results(vec![poi], ResultsOrigin::Search);
        store.set_last_search(None, None, None);
        store.set_selected_poi(Some(key));
        store.set_map_moved(false);
        store.set_reference_center(Some(location));

        self.inner.view.fit_to_results(None);
        self.inner.finish(None);
    }

    /// "Search here": re-search the panned-to area, or widen the last search
    pub async fn continue_search(&self) -> Result<usize> {
        let (category, request) = self.inner.store.read(|s| {
            let request = ContinueRequest::choose(
                s.map_moved,
                s.bounds,
                s.zoom,
                s.last_search_center.unwrap_or(s.center),
                s.last_search_zoom.unwrap_or(s.zoom),
            );
            (s.last_search_category.clone(), request)
        });
        let Some(category) = category else {
            return Err(MapError::NoActiveCategory);
        };

        self.refetch.cancel();
        let ticket = self.inner.results.issue();
        self.inner.begin_search();

        let outcome = self.inner.search.continue_search(&category, request).await;
        if !self.inner.results.is_current(ticket) {
            self.inner.discard_stale("continue search");
            return Ok(0);
        }

        let store = &self.inner.store;
        match outcome {
            Ok(ContinueOutcome::AlreadyAtMaximumArea) => {
                self.inner.finish(Some(Notice::AlreadyAtMaximumArea));
                Ok(0)
            }
            Ok(ContinueOutcome::Searched(outcome)) => {
                let count = outcome.results.len();
                store.set_last_search(Some(category), Some(outcome.center), Some(outcome.zoom));
                store.set_map_moved(false);
                store.set_reference_center(Some(outcome.center));

                if count == 0 {
                    self.inner.finish(Some(Notice::NoAdditionalResults));
                    return Ok(0);
                }

                let origin = match request {
                    ContinueRequest::Moved { .. } => ResultsOrigin::Viewport,
                    ContinueRequest::Widen { .. } => ResultsOrigin::Search,
                };
                store.replace_results(outcome.results, origin);
                self.inner.view.fit_to_results(None);
                self.inner.finish(None);
                Ok(count)
            }
            Err(e) => {
                self.inner.fail(&e);
                Err(e.into())
            }
        }
    }

    /// Dismiss results; the camera stays where it is
    pub fn clear_results(&self) {
        self.refetch.cancel();
        self.inner.results.invalidate();
        self.inner.store.clear_results();
        self.inner.view.reset_fit();
        self.suggestions.set_query("");
        self.inner.status.send_modify(|s| *s = HomeStatus::default());
        debug!("Results cleared");
    }

    /// Center on the user's last known position
    pub fn recenter_on_user(&self) -> bool {
        match self.inner.store.read(|s| s.user_location) {
            Some(location) => {
                self.inner.view.recenter(location);
                true
            }
            None => false,
        }
    }

    pub fn on_click(&self, target: ClickTarget) {
        self.inner.view.on_click(target);
    }

    pub fn expand_poi(&self, key: Option<PoiKey>) {
        self.inner.store.set_expanded_poi(key);
    }

    pub fn controls(&self) -> Controls {
        let mode = self.search_mode();
        let config = &self.inner.config;
        self.inner.store.read(|s| {
            let has_results = s.has_results();
            Controls {
                search_here: s.last_search_category.is_some()
                    && has_results
                    && (s.visible_poi_count() < config.sparse_result_threshold || s.map_moved),
                clear: has_results && mode == SearchMode::Collapsed,
                recenter: s
                    .user_location
                    .is_some_and(|user| s.center.moved_beyond(&user, config.move_threshold_deg)),
            }
        })
    }
}

impl<B: PlacesBackend + 'static, M> Drop for HomeController<B, M> {
    fn drop(&mut self) {
        self.inner.results.invalidate();
    }
}
