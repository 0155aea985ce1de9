//! Typed HTTP client for the FourMore backend
//!
//! # Features
//!
//! - **Environment-based configuration**: base URL, environment and timeout
//! - **Session persistence**: bearer token and user profile under fixed keys
//! - **Sign-out on 401**: any rejected token clears the stored session and
//!   flips the observable [`AuthState`]
//! - **Request correlation**: every request carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use fourmore_api_client::{FourmoreClient, NearbyQuery};
//! use fourmore_geo::Coordinate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FourmoreClient::new()?;
//!
//!     let query = NearbyQuery::new(Coordinate::new(40.7128, -74.0060)).with_category("cafe");
//!     for poi in client.places().nearby(&query).await? {
//!         println!("{} ({})", poi.display_name(), poi.key());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod session;

pub use backend::PlacesBackend;
pub use client::{AuthState, FourmoreClient};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use models::{
    AuthToken, Category, CheckIn, CheckInPage, CheckInStats, ConfirmResult, NearbyQuery, NewCheckIn,
    NoteResult, OsmType, Poi, PoiKey, Quest, QuestAnswer, QuestAnswerResult, QuestList, SearchBias,
    SettingsUpdate, TagValue, User, UserSettings,
};
pub use session::{FileTokenStorage, MemoryTokenStorage, Session, TokenStorage};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::PlacesBackend;
    pub use crate::client::{AuthState, FourmoreClient};
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{AuthApi, CategoriesApi, CheckInsApi, OsmApi, PlacesApi, QuestsApi, UsersApi};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::models::{OsmType, Poi, PoiKey};
}
