//! Map state and the home screen for the FourMore client.
//!
//! This crate provides:
//! - [`MapStore`], the persistent map and search state shared by every screen
//! - [`MapView`], which drives a [`MapSurface`] and tells programmatic camera
//!   moves apart from user gestures
//! - [`GeolocationProvider`], one-shot positioning over a [`LocationSource`]
//! - [`HomeController`], the home screen flow tying search and the map together
//!
//! # Example
//!
//! ```
//! use fourmore_geo::Coordinate;
//! use fourmore_map::{MapStore, ResultsOrigin};
//!
//! let store = MapStore::new();
//! store.set_map_center(Coordinate::new(40.0, -74.0));
//! store.replace_results(Vec::new(), ResultsOrigin::Viewport);
//! assert!(!store.state().has_results());
//! ```

#![warn(clippy::all)]

mod camera;
mod error;
mod geolocation;
mod home;
mod store;
mod view;

pub use camera::{GuardState, MoveGuard, MoveOrigin, SettleCallback};
pub use error::{LocationError, MapError, Result};
pub use geolocation::{
    FixedLocationSource, GeolocationProvider, LocationSource, LocationState, PositionOptions,
    UnsupportedLocationSource,
};
pub use home::{Controls, HomeConfig, HomeController, HomeStatus, Notice, SearchMode, Typeahead, SEARCH_PLACEHOLDER};
pub use store::{MapSnapshot, MapState, MapStore, ResultsOrigin, DEFAULT_CENTER, DEFAULT_ZOOM};
pub use view::{CameraCommand, ClickTarget, MapSurface, MapView, MapViewConfig, MoveEnd, Padding, ScreenOffset};
