//! Search for the FourMore client.
//!
//! This crate provides:
//! - A category catalog with popular categories and typeahead matching
//! - Progressive category search that widens until something is found
//! - Debounced, race-safe place suggestions
//! - Multi-level relevance scoring shared by both typeahead sources
//!
//! # Example
//!
//! ```
//! use fourmore_search::CategoryCatalog;
//!
//! let catalog = CategoryCatalog::builtin();
//! let found: Vec<_> = catalog.suggest("caf", 6).iter().map(|c| c.class.as_str()).collect();
//! assert_eq!(found, vec!["cafe"]);
//! ```

#![warn(clippy::all)]

mod categories;
mod error;
mod fuzzy;
mod progressive;
mod relevance;
mod suggestions;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use categories::{humanize_class, CategoryCatalog, DEFAULT_SUGGESTION_CAP, POPULAR_CATEGORIES};
pub use error::{Result, SearchError, SEARCH_UNAVAILABLE_MESSAGE};
pub use fuzzy::fuzzy_match;
pub use progressive::{
    CategorySearchOutcome, ContinueOutcome, ContinueRequest, ProgressiveSearch, ProgressiveSearchConfig,
    ZOOM_STEP,
};
pub use relevance::{calculate_relevance, RelevanceScore};
pub use suggestions::{PlaceSuggestionFetcher, SuggestionConfig, SuggestionState};
