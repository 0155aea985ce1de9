//! Map view controller
//!
//! [`MapView`] drives the rendered map through a [`MapSurface`] and keeps the
//! [`MapStore`] in sync with it. Camera changes the application makes go
//! through the programmatic-move guard so their settle events are not counted
//! as the user moving the map.

use crate::camera::{MoveGuard, MoveOrigin, SettleCallback};
use crate::store::{MapStore, ResultsOrigin};
use fourmore_api_client::PoiKey;
use fourmore_core::config::{ConfigSchema, PaddingSettings};
use fourmore_core::debounce::Debouncer;
use fourmore_geo::{bbox_from_radius, BoundingBox, Coordinate};
use fourmore_telemetry::{metrics, names};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Decimal places used when comparing coordinates for change detection
const SIGNATURE_DECIMALS: i32 = 6;

/// Screen-space padding in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl From<PaddingSettings> for Padding {
    fn from(p: PaddingSettings) -> Self {
        Self {
            top: p.top,
            bottom: p.bottom,
            left: p.left,
            right: p.right,
        }
    }
}

/// Pixel offset applied after centering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenOffset {
    pub x: f64,
    pub y: f64,
}

/// An animated camera change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    FlyTo { center: Coordinate, zoom: f64 },
    FitBounds { bounds: BoundingBox, padding: Padding },
    PanTo { center: Coordinate, offset: ScreenOffset },
}

/// The rendered map
///
/// Implementations animate the camera and later report the settled camera
/// back through [`MapView::on_move_end`].
pub trait MapSurface: Send + Sync {
    fn apply(&self, command: CameraCommand);
}

impl<T: MapSurface + ?Sized> MapSurface for Arc<T> {
    fn apply(&self, command: CameraCommand) {
        (**self).apply(command);
    }
}

/// What a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Marker(PoiKey),
    Map,
}

/// Classification of a settle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveEnd {
    Programmatic,
    User {
        /// Displacement from the results' reference center exceeded the threshold
        moved: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewConfig {
    pub move_threshold_deg: f64,
    pub settle_timeout: Duration,
    pub drawer_height_px: f64,
    pub padding: Padding,
    /// Zoom used when focusing a single place
    pub focus_zoom: f64,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self::from_schema(&ConfigSchema::default())
    }
}

impl MapViewConfig {
    pub fn from_schema(schema: &ConfigSchema) -> Self {
        Self {
            move_threshold_deg: schema.map.move_threshold_deg,
            settle_timeout: Duration::from_millis(schema.map.settle_timeout_ms),
            drawer_height_px: schema.map.drawer_height_px,
            padding: schema.map.padding.into(),
            focus_zoom: schema.search.street_zoom,
        }
    }
}

#[derive(Debug)]
pub struct MapView<M> {
    surface: M,
    store: MapStore,
    config: MapViewConfig,
    guard: Arc<Mutex<MoveGuard>>,
    settle_timer: Debouncer,
    last_fit: Mutex<Option<String>>,
}

impl<M: MapSurface> MapView<M> {
    pub fn new(surface: M, store: MapStore, config: MapViewConfig) -> Self {
        Self {
            surface,
            store,
            guard: Arc::new(Mutex::new(MoveGuard::new(config.settle_timeout))),
            settle_timer: Debouncer::new(config.settle_timeout),
            config,
            last_fit: Mutex::new(None),
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn store(&self) -> &MapStore {
        &self.store
    }

    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    fn guard(&self) -> MutexGuard<'_, MoveGuard> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_awaiting_settle(&self) -> bool {
        self.guard().is_awaiting_settle()
    }

    /// Issue a camera change marked as programmatic
    ///
    /// The guard is armed before the command reaches the surface. Must be
    /// called from within a tokio runtime.
    pub fn move_camera(&self, command: CameraCommand, on_settle: Option<SettleCallback>) {
        self.guard().begin(Instant::now(), on_settle);

        let guard = Arc::clone(&self.guard);
        self.settle_timer.schedule(async move {
            let expired = guard
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .expire(Instant::now());
            if expired {
                metrics().increment(names::SETTLE_TIMEOUTS);
            }
        });

        metrics().increment(names::PROGRAMMATIC_MOVES);
        debug!(?command, "Programmatic camera move");
        self.surface.apply(command);
    }

    /// Handle the map's settle event
    pub fn on_move_end(&self, center: Coordinate, zoom: f64, bounds: BoundingBox) -> MoveEnd {
        self.store.set_map_bounds(Some(bounds));

        let (origin, callback) = self.guard().on_move_end();
        self.store.set_map_center(center);
        self.store.set_current_zoom(zoom);

        match origin {
            MoveOrigin::Programmatic => {
                self.settle_timer.cancel();
                if let Some(callback) = callback {
                    callback();
                }
                trace!("Programmatic move settled");
                MoveEnd::Programmatic
            }
            MoveOrigin::User => {
                let threshold = self.config.move_threshold_deg;
                let moved = self
                    .store
                    .read(|s| s.reference_center)
                    .is_some_and(|reference| center.moved_beyond(&reference, threshold));
                if moved {
                    self.store.set_map_moved(true);
                }
                debug!(moved, zoom, "User moved the map");
                MoveEnd::User { moved }
            }
        }
    }

    /// Fit the camera to the current results
    ///
    /// A radius with a known user location fits a circle around the user.
    /// Otherwise the results, plus the user location when the store asks for
    /// it, are fitted with the configured padding. Nothing happens when the
    /// inputs match the previous fit or the results came from a viewport
    /// refetch. Returns true if the camera moved.
    pub fn fit_to_results(&self, radius_m: Option<f64>) -> bool {
        let (signature, command, origin) = self.store.read(|s| {
            let user = s.user_location.filter(|_| s.include_user_location || radius_m.is_some());
            let signature = fit_signature(
                s.pois.iter().map(|p| (p.key(), p.coordinate())),
                user,
                radius_m,
                s.include_user_location,
            );

            let command = match (radius_m, s.user_location) {
                (Some(radius), Some(anchor)) => Some(CameraCommand::FitBounds {
                    bounds: bbox_from_radius(&anchor, radius),
                    padding: self.config.padding,
                }),
                _ => {
                    let points: Vec<Coordinate> = s
                        .pois
                        .iter()
                        .map(|p| p.coordinate())
                        .chain(user.filter(|_| s.has_results()))
                        .collect();
                    BoundingBox::from_points(&points).map(|bounds| {
                        if bounds.is_degenerate() {
                            CameraCommand::FlyTo {
                                center: bounds.center(),
                                zoom: self.config.focus_zoom,
                            }
                        } else {
                            CameraCommand::FitBounds {
                                bounds,
                                padding: self.config.padding,
                            }
                        }
                    })
                }
            };
            (signature, command, s.results_origin)
        });

        if origin == Some(ResultsOrigin::Viewport) && radius_m.is_none() {
            trace!("Results came from the visible area, not fitting");
            return false;
        }
        let Some(command) = command else {
            return false;
        };

        {
            let mut last = self.last_fit.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_deref() == Some(signature.as_str()) {
                trace!("Fit inputs unchanged, skipping");
                return false;
            }
            *last = Some(signature);
        }

        self.move_camera(command, None);
        true
    }

    /// Forget the last fit so the next call always runs
    pub fn reset_fit(&self) {
        self.last_fit.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Move to `center` at the current zoom
    pub fn recenter(&self, center: Coordinate) {
        let zoom = self.store.read(|s| s.zoom);
        self.store.set_map_center(center);
        self.move_camera(CameraCommand::FlyTo { center, zoom }, None);
    }

    /// Pan to a result, keeping it visible above the drawer
    pub fn focus_poi(&self, key: PoiKey) -> bool {
        let Some(center) = self.store.read(|s| s.poi(&key).map(|p| p.coordinate())) else {
            return false;
        };
        let offset = ScreenOffset {
            x: 0.0,
            y: -self.config.drawer_height_px / 2.0,
        };
        self.move_camera(CameraCommand::PanTo { center, offset }, None);
        true
    }

    /// Marker clicks select; clicks on the bare map clear the selection
    pub fn on_click(&self, target: ClickTarget) {
        match target {
            ClickTarget::Marker(key) => {
                self.store.set_selected_poi(Some(key));
                self.focus_poi(key);
            }
            ClickTarget::Map => {
                self.store.set_selected_poi(None);
                self.store.set_expanded_poi(None);
            }
        }
    }
}

/// Opaque change-detection key for a fit
fn fit_signature(
    pois: impl Iterator<Item = (PoiKey, Coordinate)>,
    user: Option<Coordinate>,
    radius_m: Option<f64>,
    include_user: bool,
) -> String {
    let mut signature = String::new();
    for (key, coordinate) in pois {
        let c = coordinate.rounded(SIGNATURE_DECIMALS);
        let _ = write!(signature, "{key}@{},{};", c.latitude, c.longitude);
    }
    match user.map(|u| u.rounded(SIGNATURE_DECIMALS)) {
        Some(u) => {
            let _ = write!(signature, "|u{},{}", u.latitude, u.longitude);
        }
        None => signature.push_str("|u-"),
    }
    let _ = write!(signature, "|r{radius_m:?}|i{include_user}");
    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourmore_geo::{bbox_from_center_zoom, ViewportSize};
    use fourmore_search::testing::poi;

    #[derive(Debug, Default)]
    struct Recorder {
        commands: Mutex<Vec<CameraCommand>>,
    }

    impl MapSurface for Recorder {
        fn apply(&self, command: CameraCommand) {
            self.commands.lock().unwrap().push(command);
        }
    }

    impl Recorder {
        fn taken(&self) -> Vec<CameraCommand> {
            std::mem::take(&mut *self.commands.lock().unwrap())
        }
    }

    fn view() -> MapView<Arc<Recorder>> {
        MapView::new(Arc::new(Recorder::default()), MapStore::new(), MapViewConfig::default())
    }

    fn bounds_at(center: Coordinate) -> BoundingBox {
        bbox_from_center_zoom(&center, 15.0, ViewportSize::new(390.0, 844.0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_programmatic_settle_does_not_flag_move() {
        let view = view();
        view.store().set_reference_center(Some(Coordinate::new(40.0, -74.0)));

        let far = Coordinate::new(40.1, -74.1);
        view.move_camera(CameraCommand::FlyTo { center: far, zoom: 15.0 }, None);
        let result = view.on_move_end(far, 15.0, bounds_at(far));

        assert_eq!(result, MoveEnd::Programmatic);
        assert!(!view.store().state().map_moved);
        assert_eq!(view.store().state().bounds, Some(bounds_at(far)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_move_beyond_threshold_flags_move() {
        let view = view();
        view.store().set_reference_center(Some(Coordinate::new(40.0, -74.0)));

        let near = Coordinate::new(40.001, -74.0);
        assert_eq!(view.on_move_end(near, 15.0, bounds_at(near)), MoveEnd::User { moved: false });
        assert!(!view.store().state().map_moved);

        let far = Coordinate::new(40.01, -74.0);
        assert_eq!(view.on_move_end(far, 15.0, bounds_at(far)), MoveEnd::User { moved: true });
        assert!(view.store().state().map_moved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_callback_runs_after_move_end() {
        let view = view();
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        let center = Coordinate::new(40.0, -74.0);
        view.move_camera(
            CameraCommand::FlyTo { center, zoom: 15.0 },
            Some(Box::new(move || {
                let _ = tx.send(());
            })),
        );
        assert!(rx.try_recv().is_err());

        view.on_move_end(center, 15.0, bounds_at(center));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_settle_expires_guard() {
        let view = view();
        let center = Coordinate::new(40.0, -74.0);
        view.move_camera(CameraCommand::FlyTo { center, zoom: 15.0 }, None);
        assert!(view.is_awaiting_settle());

        tokio::time::sleep(Duration::from_millis(701)).await;
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(!view.is_awaiting_settle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fit_skipped_when_inputs_unchanged() {
        let view = view();
        view.store().replace_results(
            vec![poi(1, "A", "cafe", 40.0, -74.0), poi(2, "B", "cafe", 40.01, -74.01)],
            ResultsOrigin::Search,
        );

        assert!(view.fit_to_results(None));
        assert!(!view.fit_to_results(None));
        assert_eq!(view.surface().taken().len(), 1);

        view.store().set_include_user_location(true);
        view.store().set_user_location(Some(Coordinate::new(40.02, -74.0)));
        assert!(view.fit_to_results(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fit_uses_asymmetric_padding() {
        let view = view();
        view.store().replace_results(
            vec![poi(1, "A", "cafe", 40.0, -74.0), poi(2, "B", "cafe", 40.01, -74.01)],
            ResultsOrigin::Search,
        );
        view.fit_to_results(None);

        let commands = view.surface().taken();
        let [CameraCommand::FitBounds { bounds, padding }] = commands.as_slice() else {
            panic!("expected one fit");
        };
        assert_eq!(*bounds, BoundingBox::new(40.01, 40.0, -74.0, -74.01));
        assert!(padding.top > padding.left);
        assert!(padding.bottom > padding.right);
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewport_results_do_not_fit() {
        let view = view();
        view.store().replace_results(
            vec![poi(1, "A", "cafe", 40.0, -74.0), poi(2, "B", "cafe", 40.01, -74.01)],
            ResultsOrigin::Viewport,
        );
        assert!(!view.fit_to_results(None));
        assert!(view.surface().taken().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_results_fit_after_same_viewport_results() {
        let view = view();
        let place = poi(1, "A", "cafe", 40.0, -74.0);
        view.store().replace_results(vec![place.clone()], ResultsOrigin::Viewport);
        assert!(!view.fit_to_results(None));

        view.store().replace_results(vec![place], ResultsOrigin::Search);
        assert!(view.fit_to_results(None));
        assert_eq!(view.surface().taken().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_result_flies_to_it() {
        let view = view();
        view.store().replace_results(vec![poi(1, "A", "cafe", 40.0, -74.0)], ResultsOrigin::Search);
        view.fit_to_results(None);
        assert_eq!(
            view.surface().taken(),
            vec![CameraCommand::FlyTo {
                center: Coordinate::new(40.0, -74.0),
                zoom: 17.0
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_radius_fit_around_user() {
        let view = view();
        let user = Coordinate::new(40.0, -74.0);
        view.store().set_user_location(Some(user));
        view.fit_to_results(Some(1000.0));

        let commands = view.surface().taken();
        let [CameraCommand::FitBounds { bounds, .. }] = commands.as_slice() else {
            panic!("expected one fit");
        };
        assert_eq!(*bounds, bbox_from_radius(&user, 1000.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_offsets_above_drawer() {
        let view = view();
        let target = poi(1, "A", "cafe", 40.0, -74.0);
        let key = target.key();
        view.store().replace_results(vec![target], ResultsOrigin::Search);

        assert!(view.focus_poi(key));
        assert_eq!(
            view.surface().taken(),
            vec![CameraCommand::PanTo {
                center: Coordinate::new(40.0, -74.0),
                offset: ScreenOffset { x: 0.0, y: -160.0 }
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_click_selects_and_map_click_clears() {
        let view = view();
        let target = poi(1, "A", "cafe", 40.0, -74.0);
        let key = target.key();
        view.store().replace_results(vec![target], ResultsOrigin::Search);

        view.on_click(ClickTarget::Marker(key));
        assert_eq!(view.store().state().selected, Some(key));

        view.on_click(ClickTarget::Map);
        assert_eq!(view.store().state().selected, None);
    }

    #[test]
    fn test_signature_ignores_sub_micro_degree_jitter() {
        let key = poi(1, "", "cafe", 0.0, 0.0).key();
        let a = fit_signature([(key, Coordinate::new(40.0, -74.0))].into_iter(), None, None, false);
        let b = fit_signature([(key, Coordinate::new(40.000_000_01, -74.0))].into_iter(), None, None, false);
        assert_eq!(a, b);
    }
}
