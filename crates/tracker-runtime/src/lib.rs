//! Runtime layer for the cost tracker.
//!
//! Owns the loaded upload for the lifetime of the program and turns it into
//! per-period dashboard views on request.

pub mod dashboard;
pub mod document_cache;

pub use tracker_core as core;
pub use tracker_data as data;
