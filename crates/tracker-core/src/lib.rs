//! Core types for the cost tracker.
//!
//! Holds the normalized usage model, the error and diagnostic taxonomy,
//! number formatting helpers and the CLI settings shared by every other
//! crate in the workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
