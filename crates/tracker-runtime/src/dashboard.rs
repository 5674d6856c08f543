//! The per-period dashboard pipeline.
//!
//! [`Session`] owns one upload for the lifetime of the program: it loads it
//! through the [`DocumentCache`], tracks the selected period, and builds a
//! fresh [`DashboardView`] on every request. Views are never cached.

use tracker_core::error::{Diagnostic, Result, TrackerError};
use tracker_core::models::{
    is_period_label, ModelMetric, ModelTotals, Summary, UsageRecord, UserRow,
};
use tracker_data::aggregator::UsageAggregator;
use tracker_data::source::FileSource;

use crate::document_cache::{DocumentCache, LoadedDocument};

// ── DashboardView ─────────────────────────────────────────────────────────────

/// Everything the renderer needs for one period.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub period: String,
    pub summary: Summary,
    /// Top models by token usage.
    pub top_by_tokens: Vec<ModelTotals>,
    /// Top models by cost.
    pub top_by_cost: Vec<ModelTotals>,
    /// Users by cost, with the synthetic total row last.
    pub users: Vec<UserRow>,
    /// The period's records in input order.
    pub records: Vec<UsageRecord>,
}

impl DashboardView {
    /// Aggregate `records` for `period`, keeping `top` models per ranking.
    ///
    /// Fails with [`TrackerError::NoDataForPeriod`] when `records` is not
    /// empty but none of them fall in `period`.
    pub fn build(records: &[UsageRecord], period: &str, top: usize) -> Result<Self> {
        let period_records: Vec<UsageRecord> =
            UsageAggregator::records_for_period(records, period)
                .cloned()
                .collect();

        if period_records.is_empty() && !records.is_empty() {
            return Err(TrackerError::NoDataForPeriod(period.to_string()));
        }

        Ok(Self {
            period: period.to_string(),
            summary: UsageAggregator::summarize(&period_records, period),
            top_by_tokens: UsageAggregator::top_by_model(
                &period_records,
                period,
                ModelMetric::TotalTokens,
                top,
            ),
            top_by_cost: UsageAggregator::top_by_model(
                &period_records,
                period,
                ModelMetric::TotalCost,
                top,
            ),
            users: UsageAggregator::by_user(&period_records, period),
            records: period_records,
        })
    }

    /// True when the period holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// User rows for the cost chart; the synthetic total is left out.
    pub fn chart_users(&self) -> impl Iterator<Item = &UserRow> {
        self.users.iter().filter(|row| !row.label.is_total())
    }

    /// The ranking for `metric`.
    pub fn top_by(&self, metric: ModelMetric) -> &[ModelTotals] {
        match metric {
            ModelMetric::TotalTokens => &self.top_by_tokens,
            ModelMetric::TotalCost => &self.top_by_cost,
        }
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One loaded upload plus the current period selection.
pub struct Session<S: FileSource> {
    source: S,
    cache: DocumentCache,
    top: usize,
    selected: Option<String>,
}

impl<S: FileSource> Session<S> {
    /// Load `source` and pre-select its most recent period.
    ///
    /// Document-level failures (`FileRead`, `InvalidDocument`,
    /// `DocumentTooLarge`) are returned; record-level problems are available
    /// from [`Session::diagnostics`].
    pub fn open(source: S, max_bytes: usize, top: usize) -> Result<Self> {
        let mut session = Self {
            source,
            cache: DocumentCache::new(max_bytes),
            top,
            selected: None,
        };
        session.reload()?;
        Ok(session)
    }

    /// Re-read the upload through the cache.
    ///
    /// Returns `true` when the content changed and was re-normalized. The
    /// selected period is kept if it still exists, otherwise the most recent
    /// one is selected.
    pub fn reload(&mut self) -> Result<bool> {
        let misses_before = self.cache.misses();
        self.cache.load(&self.source)?;
        let changed = self.cache.misses() != misses_before;

        let periods = self.periods();
        let keep = self
            .selected
            .as_ref()
            .is_some_and(|p| periods.contains(p));
        if !keep {
            self.selected = periods.last().cloned();
        }

        Ok(changed)
    }

    pub fn identity(&self) -> String {
        self.source.identity()
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.cache.current()
    }

    /// All valid records of the current upload.
    pub fn records(&self) -> &[UsageRecord] {
        self.document()
            .map(|doc| doc.normalized.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.document()
            .map(|doc| doc.normalized.diagnostics.as_slice())
            .unwrap_or(&[])
    }

    /// Periods present in the upload, ascending.
    pub fn periods(&self) -> Vec<String> {
        UsageAggregator::available_periods(self.records())
            .into_iter()
            .collect()
    }

    pub fn selected_period(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select `period` (`YYYY-MM`). A well-formed period with no records is
    /// accepted; [`Session::view`] then reports it as `NoDataForPeriod`.
    pub fn select_period(&mut self, period: &str) -> Result<()> {
        if !is_period_label(period) {
            return Err(TrackerError::UnknownPeriod(period.to_string()));
        }
        self.selected = Some(period.to_string());
        Ok(())
    }

    /// Move the selection `step` periods forward (positive) or back, clamped
    /// to the available range.
    pub fn step_period(&mut self, step: isize) {
        let periods = self.periods();
        if periods.is_empty() {
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|p| periods.iter().position(|q| q == p))
            .unwrap_or(periods.len() - 1);
        let last = periods.len() as isize - 1;
        let next = (current as isize + step).clamp(0, last) as usize;
        self.selected = Some(periods[next].clone());
    }

    /// Build the view for the selected period; `Ok(None)` when the upload has
    /// no valid records at all.
    pub fn view(&self) -> Result<Option<DashboardView>> {
        match self.selected.as_deref() {
            Some(period) => DashboardView::build(self.records(), period, self.top).map(Some),
            None => Ok(None),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
