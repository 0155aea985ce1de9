//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one group of backend routes.
//!
//! | Module | Routes |
//! |--------|--------|
//! | `places` | `/places/search`, `/places/bbox`, `/places/nearby`, `/places/{type}/{id}` |
//! | `checkins` | `/checkins`, `/checkins/{id}`, `/checkins/stats/summary` |
//! | `osm` | `/osm/confirm-info`, `/osm/note` |
//! | `quests` | `/quests/applicable/{type}/{id}`, `/quests/respond` |
//! | `auth` | `/auth/login`, `/auth/callback` |
//! | `users` | `/me`, `/me/settings` |
//! | `categories` | `/categories/`, `/categories/{class}` |

pub mod auth;
pub mod categories;
pub mod checkins;
pub mod osm;
pub mod places;
pub mod quests;
pub mod users;

pub use auth::AuthApi;
pub use categories::CategoriesApi;
pub use checkins::CheckInsApi;
pub use osm::OsmApi;
pub use places::PlacesApi;
pub use quests::QuestsApi;
pub use users::UsersApi;
