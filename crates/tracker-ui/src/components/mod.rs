//! Reusable line- and box-level widgets shared by the screens.

pub mod bar_chart;
pub mod header;
pub mod metric_card;
