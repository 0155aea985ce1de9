//! Configuration loading and schema definitions
//!
//! Settings shared by the search, map and API layers.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
