//! Core domain types for mockfetch.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The async source lives in `mockfetch-source`; everything here can be used from
//! either side of a fetch without pulling in a runtime.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod config;
mod error;
mod ids;
mod record;
mod status;

pub use config::FetchConfig;
pub use error::{ConfigError, FetchError};
pub use ids::RequestId;
pub use record::{DuplicateRecordId, FetchResult, Record};
pub use status::FetchStatus;

/// What a caller eventually observes from a fetch.
pub type FetchOutcome = Result<FetchResult, FetchError>;
