//! Data layer for the cost tracker.
//!
//! Reads a usage export through a [`source::FileSource`], reconciles the two
//! supported JSON shapes into [`tracker_core::models::UsageRecord`]s and
//! computes the per-period summaries and rankings the dashboard renders.

pub mod aggregator;
pub mod normalizer;
pub mod source;

pub use tracker_core as core;
