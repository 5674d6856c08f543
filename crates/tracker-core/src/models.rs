use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// `type` assigned to records that do not carry one.
pub const DEFAULT_RECORD_TYPE: &str = "chat_completion";

/// Timestamp layout written by the cost tracker export, up to the fraction.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Default number of models shown in each ranking.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// Label of the synthetic aggregate row appended to the per-user breakdown.
pub const TOTAL_LABEL: &str = "Total";

/// One validated usage record.
///
/// Created once during normalization and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Calendar month bucket, `YYYY-MM`.
    pub period: String,
    /// Model identifier as found in the export.
    pub model: String,
    /// Cost in USD. Not range checked: zero and negative values pass through.
    pub cost: f64,
    /// User e-mail, from the enclosing key or the record's own `user` field.
    pub user: String,
    /// `input_tokens + output_tokens`.
    pub total_tokens: i64,
    /// Number of generated images, `0` when absent.
    pub image_count: i64,
    /// Request type, `"chat_completion"` when absent.
    #[serde(rename = "type")]
    pub record_type: String,
}

/// Four scalar totals for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub message_count: usize,
    pub total_cost: f64,
    pub total_tokens: i64,
    pub total_images: i64,
}

impl Summary {
    pub fn add_record(&mut self, record: &UsageRecord) {
        self.message_count += 1;
        self.total_cost += record.cost;
        self.total_tokens = self.total_tokens.saturating_add(record.total_tokens);
        self.total_images = self.total_images.saturating_add(record.image_count);
    }
}

/// Which per-model sum a ranking is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelMetric {
    TotalTokens,
    TotalCost,
}

impl ModelMetric {
    pub fn column_name(self) -> &'static str {
        match self {
            ModelMetric::TotalTokens => "total_tokens",
            ModelMetric::TotalCost => "total_cost",
        }
    }
}

/// Sums for one model group within a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelTotals {
    pub model: String,
    pub total_tokens: i64,
    pub total_cost: f64,
}

impl ModelTotals {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            total_tokens: 0,
            total_cost: 0.0,
        }
    }

    pub fn add_record(&mut self, record: &UsageRecord) {
        self.total_tokens = self.total_tokens.saturating_add(record.total_tokens);
        self.total_cost += record.cost;
    }

    /// The requested metric as a float, for sorting and charting.
    pub fn metric(&self, metric: ModelMetric) -> f64 {
        match metric {
            ModelMetric::TotalTokens => self.total_tokens as f64,
            ModelMetric::TotalCost => self.total_cost,
        }
    }
}

/// Row label in the per-user breakdown.
///
/// The aggregate row is tagged rather than identified by its text, so a real
/// user literally named `"Total"` never collides with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum UserLabel {
    User(String),
    Total,
}

impl UserLabel {
    pub fn is_total(&self) -> bool {
        matches!(self, UserLabel::Total)
    }
}

impl fmt::Display for UserLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserLabel::User(user) => f.write_str(user),
            UserLabel::Total => f.write_str(TOTAL_LABEL),
        }
    }
}

/// One row of the per-user breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub label: UserLabel,
    pub total_cost: f64,
    pub total_tokens: i64,
    pub total_images: i64,
}

impl UserRow {
    pub fn new(label: UserLabel) -> Self {
        Self {
            label,
            total_cost: 0.0,
            total_tokens: 0,
            total_images: 0,
        }
    }

    pub fn add_record(&mut self, record: &UsageRecord) {
        self.add_sums(record.cost, record.total_tokens, record.image_count);
    }

    /// Fold another row's sums into this one.
    pub fn add_row(&mut self, other: &UserRow) {
        self.add_sums(other.total_cost, other.total_tokens, other.total_images);
    }

    // Counts saturate: single records are bounded, sums across them are not.
    fn add_sums(&mut self, cost: f64, tokens: i64, images: i64) {
        self.total_cost += cost;
        self.total_tokens = self.total_tokens.saturating_add(tokens);
        self.total_images = self.total_images.saturating_add(images);
    }
}

// ── Periods ───────────────────────────────────────────────────────────────────

/// Zero-padded `YYYY-MM` label for a parsed timestamp.
pub fn period_from_timestamp(ts: &NaiveDateTime) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

/// `true` when `label` looks like `YYYY-MM` with a month in `01..=12`.
pub fn is_period_label(label: &str) -> bool {
    let Some((year, month)) = label.split_once('-') else {
        return false;
    };
    year.len() == 4
        && month.len() == 2
        && year.chars().all(|c| c.is_ascii_digit())
        && matches!(month.parse::<u32>(), Ok(1..=12))
}
