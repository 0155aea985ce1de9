//! Progressive category search
//!
//! A category search starts at street zoom and queries the box the viewport
//! would show there. Each empty answer widens the box by one zoom step until
//! something turns up or the floor zoom is reached. The floor is never
//! queried below.

use crate::error::{Result, SearchError};
use fourmore_api_client::{PlacesBackend, Poi};
use fourmore_core::config::ConfigSchema;
use fourmore_geo::{bbox_from_center_zoom, BoundingBox, Coordinate, ViewportSize};
use fourmore_telemetry::{metrics, names, Timer};
use tracing::{debug, info, instrument, warn};

/// Zoom change per widening step
pub const ZOOM_STEP: f64 = 1.0;

/// Knobs for [`ProgressiveSearch`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressiveSearchConfig {
    /// Floor zoom; no query is issued below it
    pub min_zoom: f64,
    /// Default starting zoom
    pub street_zoom: f64,
    /// Result cap per query
    pub result_limit: usize,
    /// Viewport the boxes are sized for
    pub viewport: ViewportSize,
    /// Start from the viewport's zoom when it is closer in than street zoom
    pub prefer_viewport_zoom: bool,
}

impl Default for ProgressiveSearchConfig {
    fn default() -> Self {
        Self::from_schema(&ConfigSchema::default())
    }
}

impl ProgressiveSearchConfig {
    pub fn from_schema(schema: &ConfigSchema) -> Self {
        Self {
            min_zoom: schema.search.min_zoom,
            street_zoom: schema.search.street_zoom,
            result_limit: schema.search.category_result_limit,
            viewport: ViewportSize::new(schema.map.viewport_width_px, schema.map.viewport_height_px),
            prefer_viewport_zoom: schema.search.prefer_viewport_zoom,
        }
    }

    /// Zoom the first query runs at, never below the floor
    pub fn start_zoom(&self, current_zoom: Option<f64>) -> f64 {
        let start = match current_zoom {
            Some(current) if self.prefer_viewport_zoom && current > self.street_zoom => current,
            _ => self.street_zoom,
        };
        start.max(self.min_zoom)
    }

    /// One step wider, clamped to the floor
    pub fn widen(&self, zoom: f64) -> f64 {
        (zoom - ZOOM_STEP).max(self.min_zoom)
    }
}

/// Result of a category search
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySearchOutcome {
    pub category: String,
    pub results: Vec<Poi>,
    /// Zoom of the query that produced `results`
    pub zoom: f64,
    /// Remembered search center
    pub center: Coordinate,
    /// Box that was queried last
    pub bbox: BoundingBox,
    /// Number of backend queries issued
    pub queries: u32,
}

impl CategorySearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// What "continue search" should do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContinueRequest {
    /// The user panned: search exactly what is on screen
    Moved { bounds: BoundingBox, zoom: f64 },
    /// The user did not pan: one step wider around the remembered center
    Widen { center: Coordinate, from_zoom: f64 },
}

impl ContinueRequest {
    /// Pick the continuation for the current map state
    ///
    /// A pan searches the visible bounds at the displayed zoom. Otherwise the
    /// last search is widened from the zoom it ran at. Searching the visible
    /// area needs known bounds; without them the request falls back to
    /// widening.
    pub fn choose(
        map_moved: bool,
        bounds: Option<BoundingBox>,
        current_zoom: f64,
        last_center: Coordinate,
        last_zoom: f64,
    ) -> Self {
        match bounds {
            Some(bounds) if map_moved => Self::Moved {
                bounds,
                zoom: current_zoom,
            },
            _ => Self::Widen {
                center: last_center,
                from_zoom: last_zoom,
            },
        }
    }
}

/// Result of a continue-search request
#[derive(Debug, Clone, PartialEq)]
pub enum ContinueOutcome {
    Searched(CategorySearchOutcome),
    /// Already at the floor zoom; nothing was queried
    AlreadyAtMaximumArea,
}

/// Category search driver over a [`PlacesBackend`]
#[derive(Debug, Clone)]
pub struct ProgressiveSearch<B> {
    backend: B,
    config: ProgressiveSearchConfig,
}

impl<B: PlacesBackend> ProgressiveSearch<B> {
    pub fn new(backend: B, config: ProgressiveSearchConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ProgressiveSearchConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Widen from the start zoom until results appear or the floor is reached
    #[instrument(skip(self), fields(start_zoom = tracing::field::Empty))]
    pub async fn search_category(
        &self,
        category: &str,
        center: Coordinate,
        current_zoom: Option<f64>,
    ) -> Result<CategorySearchOutcome> {
        let timer = Timer::start(names::CATEGORY_SEARCH_DURATION);
        let mut zoom = self.config.start_zoom(current_zoom);
        tracing::Span::current().record("start_zoom", zoom);

        let mut queries = 0u32;
        loop {
            let bbox = bbox_from_center_zoom(&center, zoom, self.config.viewport);
            queries += 1;
            let results = self.query(category, &bbox).await?;

            if !results.is_empty() || zoom <= self.config.min_zoom {
                metrics().increment_by(names::CATEGORY_SEARCH_ZOOM_STEPS, u64::from(queries - 1));
                timer.stop();
                info!(category, zoom, queries, count = results.len(), "Category search finished");
                return Ok(CategorySearchOutcome {
                    category: category.to_string(),
                    results,
                    zoom,
                    center,
                    bbox,
                    queries,
                });
            }

            let next = self.config.widen(zoom);
            debug!(category, from = zoom, to = next, "No results, widening");
            zoom = next;
        }
    }

    /// Resume the last category search after a pan, or widen it by one step
    #[instrument(skip(self))]
    pub async fn continue_search(&self, category: &str, request: ContinueRequest) -> Result<ContinueOutcome> {
        let (bbox, center, zoom) = match request {
            ContinueRequest::Moved { bounds, zoom } => (bounds, bounds.center(), zoom),
            ContinueRequest::Widen { center, from_zoom } => {
                if from_zoom <= self.config.min_zoom {
                    debug!(category, from_zoom, "Already at maximum search area");
                    return Ok(ContinueOutcome::AlreadyAtMaximumArea);
                }
                let zoom = self.config.widen(from_zoom);
                (bbox_from_center_zoom(&center, zoom, self.config.viewport), center, zoom)
            }
        };

        let results = self.query(category, &bbox).await?;
        info!(category, zoom, count = results.len(), "Continued category search");
        Ok(ContinueOutcome::Searched(CategorySearchOutcome {
            category: category.to_string(),
            results,
            zoom,
            center,
            bbox,
            queries: 1,
        }))
    }

    async fn query(&self, category: &str, bbox: &BoundingBox) -> Result<Vec<Poi>> {
        metrics().increment(names::CATEGORY_SEARCH_QUERIES);
        self.backend
            .search_places_in_bbox(bbox, Some(category), self.config.result_limit)
            .await
            .map_err(|e| {
                warn!(category, error = %e, "Category search request failed");
                SearchError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{poi, BackendCall, FakeBackend, Scripted};
    use fourmore_api_client::ApiError;
    use fourmore_geo::zoom_from_bbox;
    use proptest::prelude::*;
    use std::sync::Arc;

    const CENTER: Coordinate = Coordinate {
        latitude: 40.0,
        longitude: -74.0,
    };

    fn config() -> ProgressiveSearchConfig {
        ProgressiveSearchConfig::default()
    }

    fn zooms(backend: &FakeBackend, viewport: ViewportSize) -> Vec<f64> {
        backend
            .boxes()
            .iter()
            .map(|bbox| zoom_from_bbox(bbox, viewport).round())
            .collect()
    }

    #[tokio::test]
    async fn test_cafes_found_at_zoom_14() {
        let backend = Arc::new(FakeBackend::with_responder(|_, index| {
            if index < 3 {
                Scripted::empty()
            } else {
                Scripted::ok(vec![
                    poi(1, "Blue Bottle", "cafe", 40.01, -74.0),
                    poi(2, "Joe's", "cafe", 40.0, -74.02),
                    poi(3, "", "cafe", 39.99, -74.01),
                ])
            }
        }));
        let search = ProgressiveSearch::new(backend.clone(), config());

        let outcome = search.search_category("cafe", CENTER, None).await.unwrap();

        assert_eq!(outcome.zoom, 14.0);
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.queries, 4);
        assert_eq!(zooms(&backend, config().viewport), vec![17.0, 16.0, 15.0, 14.0]);
        assert!(backend.calls().iter().all(|call| matches!(
            call,
            BackendCall::Bbox { category: Some(c), limit: 100, .. } if c == "cafe"
        )));
    }

    #[tokio::test]
    async fn test_empty_everywhere_stops_at_floor() {
        let backend = Arc::new(FakeBackend::new());
        let search = ProgressiveSearch::new(backend.clone(), config());

        let outcome = search.search_category("museum", CENTER, None).await.unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.zoom, 12.0);
        assert_eq!(zooms(&backend, config().viewport), vec![17.0, 16.0, 15.0, 14.0, 13.0, 12.0]);
    }

    #[tokio::test]
    async fn test_first_hit_stops_immediately() {
        let backend = Arc::new(FakeBackend::returning(vec![poi(1, "Bar", "bar", 40.0, -74.0)]));
        let search = ProgressiveSearch::new(backend.clone(), config());

        let outcome = search.search_category("bar", CENTER, None).await.unwrap();
        assert_eq!(outcome.zoom, 17.0);
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_start_zoom_prefers_viewport_only_when_enabled() {
        let plain = config();
        assert_eq!(plain.start_zoom(Some(18.5)), 17.0);

        let prefer = ProgressiveSearchConfig {
            prefer_viewport_zoom: true,
            ..config()
        };
        assert_eq!(prefer.start_zoom(Some(18.5)), 18.5);
        assert_eq!(prefer.start_zoom(Some(10.0)), 17.0);
        assert_eq!(prefer.start_zoom(None), 17.0);
    }

    #[tokio::test]
    async fn test_error_surfaces_without_retry() {
        let backend = Arc::new(FakeBackend::with_responder(|_, _| {
            Scripted::err(ApiError::api_response(500, "boom"))
        }));
        let search = ProgressiveSearch::new(backend.clone(), config());

        let err = search.search_category("cafe", CENTER, None).await.unwrap_err();
        assert_eq!(err.user_message(), crate::SEARCH_UNAVAILABLE_MESSAGE);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_continue_after_pan_queries_visible_bounds() {
        let backend = Arc::new(FakeBackend::returning(vec![poi(1, "Cafe", "cafe", 40.5, -73.5)]));
        let search = ProgressiveSearch::new(backend.clone(), config());
        let bounds = BoundingBox::new(41.0, 40.0, -73.0, -74.0);

        let request = ContinueRequest::choose(true, Some(bounds), 15.0, CENTER, 13.0);
        let ContinueOutcome::Searched(outcome) = search.continue_search("cafe", request).await.unwrap() else {
            panic!("expected a search");
        };

        assert_eq!(backend.boxes(), vec![bounds]);
        assert_eq!(outcome.center, Coordinate::new(40.5, -73.5));
        assert_eq!(outcome.zoom, 15.0);
    }

    #[tokio::test]
    async fn test_continue_without_pan_widens_one_step() {
        let backend = Arc::new(FakeBackend::new());
        let search = ProgressiveSearch::new(backend.clone(), config());

        let request = ContinueRequest::choose(false, None, 16.0, CENTER, 14.0);
        let ContinueOutcome::Searched(outcome) = search.continue_search("cafe", request).await.unwrap() else {
            panic!("expected a search");
        };

        assert_eq!(outcome.zoom, 13.0);
        assert_eq!(outcome.center, CENTER);
        assert_eq!(zooms(&backend, config().viewport), vec![13.0]);
    }

    #[tokio::test]
    async fn test_continue_at_floor_reports_maximum_area() {
        let backend = Arc::new(FakeBackend::new());
        let search = ProgressiveSearch::new(backend.clone(), config());

        let request = ContinueRequest::choose(false, None, 15.0, CENTER, 12.0);
        let outcome = search.continue_search("cafe", request).await.unwrap();

        assert_eq!(outcome, ContinueOutcome::AlreadyAtMaximumArea);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_moved_without_bounds_widens() {
        let request = ContinueRequest::choose(true, None, 16.0, CENTER, 15.0);
        assert_eq!(
            request,
            ContinueRequest::Widen {
                center: CENTER,
                from_zoom: 15.0
            }
        );
    }

    proptest! {
        #[test]
        fn prop_search_terminates_above_floor(
            start in 12.0f64..20.0,
            hit_at in 0usize..12,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
            let backend = Arc::new(FakeBackend::with_responder(move |_, index| {
                if index == hit_at {
                    Scripted::ok(vec![poi(1, "Hit", "cafe", 40.0, -74.0)])
                } else {
                    Scripted::empty()
                }
            }));
            let cfg = ProgressiveSearchConfig { street_zoom: start, ..config() };
            let search = ProgressiveSearch::new(backend.clone(), cfg);

            let outcome = runtime.block_on(search.search_category("cafe", CENTER, None)).unwrap();

            let boxes = backend.boxes();
            let queried: Vec<f64> = boxes.iter().map(|b| zoom_from_bbox(b, cfg.viewport)).collect();
            prop_assert!(queried.iter().all(|z| *z >= cfg.min_zoom - 1e-6));
            prop_assert!(queried.windows(2).all(|w| w[1] <= w[0]));
            prop_assert_eq!(outcome.queries as usize, boxes.len());
            prop_assert!(boxes.len() <= (start - cfg.min_zoom).ceil() as usize + 1);
        }
    }
}
