//! Per-period summaries and rankings over normalized usage records.
//!
//! Every function filters to one `YYYY-MM` period first and is a pure
//! function of its inputs; nothing is cached between calls.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use tracker_core::models::{
    ModelMetric, ModelTotals, Summary, UsageRecord, UserLabel, UserRow,
};

/// Stateless helper that groups usage records within a period.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Distinct periods present in `records`, ascending.
    pub fn available_periods(records: &[UsageRecord]) -> BTreeSet<String> {
        records.iter().map(|r| r.period.clone()).collect()
    }

    /// Records of `period`, in their original order.
    pub fn records_for_period<'a>(
        records: &'a [UsageRecord],
        period: &'a str,
    ) -> impl Iterator<Item = &'a UsageRecord> + 'a {
        records.iter().filter(move |r| r.period == period)
    }

    /// Message count and cost/token/image sums for `period`.
    ///
    /// A period with no records yields the zero summary, not an error.
    pub fn summarize(records: &[UsageRecord], period: &str) -> Summary {
        let mut summary = Summary::default();
        for record in Self::records_for_period(records, period) {
            summary.add_record(record);
        }
        summary
    }

    /// Per-model sums for `period`, ordered by `metric` descending and cut to
    /// `limit` entries. Ties keep first-encountered order.
    pub fn top_by_model(
        records: &[UsageRecord],
        period: &str,
        metric: ModelMetric,
        limit: usize,
    ) -> Vec<ModelTotals> {
        let mut groups = Self::group_by_model(records, period);
        groups.sort_by(|a, b| descending(a.metric(metric), b.metric(metric)));
        groups.truncate(limit);
        groups
    }

    /// Per-user sums for `period` ordered by cost descending, followed by the
    /// synthetic [`UserLabel::Total`] row holding the column sums.
    pub fn by_user(records: &[UsageRecord], period: &str) -> Vec<UserRow> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<UserRow> = Vec::new();

        for record in Self::records_for_period(records, period) {
            let slot = *index.entry(record.user.as_str()).or_insert_with(|| {
                rows.push(UserRow::new(UserLabel::User(record.user.clone())));
                rows.len() - 1
            });
            rows[slot].add_record(record);
        }

        rows.sort_by(|a, b| descending(a.total_cost, b.total_cost));

        let mut total = UserRow::new(UserLabel::Total);
        for row in &rows {
            total.add_row(row);
        }
        rows.push(total);
        rows
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Model groups in first-encountered order.
    fn group_by_model(records: &[UsageRecord], period: &str) -> Vec<ModelTotals> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<ModelTotals> = Vec::new();

        for record in Self::records_for_period(records, period) {
            let slot = *index.entry(record.model.as_str()).or_insert_with(|| {
                groups.push(ModelTotals::new(record.model.clone()));
                groups.len() - 1
            });
            groups[slot].add_record(record);
        }

        groups
    }
}

/// Descending order for floats; stable sorts keep ties in place.
fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
