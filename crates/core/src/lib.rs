//! Core utilities shared by the FourMore client crates
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with validation
//! - **Request sequencing**: generation counters that discard stale responses
//! - **Debouncing**: cancelable single-slot timers on the tokio runtime
//!
//! # Example
//!
//! ```rust,no_run
//! use fourmore_core::{config::Config, sequence::RequestSequence};
//!
//! let config = Config::load(None).expect("invalid configuration");
//! println!("backend: {}", config.schema.api.base_url);
//!
//! let suggestions = RequestSequence::new();
//! let ticket = suggestions.issue();
//! // ... await the response ...
//! if suggestions.is_current(ticket) {
//!     // apply it
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod debounce;
pub mod error;
pub mod sequence;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::debounce::Debouncer;
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::sequence::{RequestSequence, Ticket};
}
