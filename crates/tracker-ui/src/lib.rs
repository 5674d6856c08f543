//! Terminal UI layer for the cost tracker.
//!
//! Provides themes, the header, metric-card and bar-chart components, the
//! dashboard, tables and diagnostics screens, the plain-text report, and the
//! main application event loop built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod diagnostics_view;
pub mod report;
pub mod table_view;
pub mod themes;

pub use tracker_core as core;
