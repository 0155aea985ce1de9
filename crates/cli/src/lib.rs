//! Terminal output for the FourMore command-line client
//!
//! Provides shared CLI functionality:
//! - Text or JSON output selection
//! - Colored status lines and place listings
//! - Spinners for network calls

#![warn(missing_docs)]

pub mod output;
pub mod progress;

pub use output::{OutputFormat, Status};
