//! Plain-text report written by `--report` instead of the interactive
//! dashboard.

use std::io::{self, Write};

use tracker_core::error::Diagnostic;
use tracker_core::formatting;
use tracker_core::models::{ModelMetric, UserLabel, TOTAL_LABEL};
use tracker_runtime::dashboard::DashboardView;

use crate::components::metric_card::MetricCard;

const RULE_WIDTH: usize = 60;

/// Write the report for `view` followed by any diagnostics.
///
/// `view` is `None` when the upload held no valid records; only the
/// diagnostics are written then.
pub fn write_report<W: Write>(
    view: Option<&DashboardView>,
    diagnostics: &[Diagnostic],
    writer: &mut W,
) -> io::Result<()> {
    if let Some(view) = view {
        write_view(view, writer)?;
    }

    if !diagnostics.is_empty() {
        writeln!(writer, "Diagnostics ({})", diagnostics.len())?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for diagnostic in diagnostics {
            writeln!(writer, "  {}", diagnostic)?;
        }
    }
    Ok(())
}

fn write_view<W: Write>(view: &DashboardView, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "AI cost report for {}", view.period)?;
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
    for card in MetricCard::for_summary(&view.summary) {
        writeln!(writer, "{:<24}{:>16}", format!("{}:", card.title), card.value)?;
    }
    writeln!(writer)?;

    for (metric, title) in [
        (ModelMetric::TotalTokens, "Models by Tokens Used"),
        (ModelMetric::TotalCost, "Models by Cost"),
    ] {
        let models = view.top_by(metric);
        writeln!(writer, "Top {} {}", models.len(), title)?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for m in models {
            writeln!(
                writer,
                "  {:<30}{:>14}{:>14}",
                formatting::truncate_label(&m.model, 30),
                formatting::format_count(m.total_tokens),
                formatting::format_currency(m.total_cost, 4),
            )?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "Cost by User")?;
    writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
    for row in &view.users {
        // The aggregate row sits under a rule and never reads as a plain user.
        let label = match &row.label {
            UserLabel::User(user) => formatting::truncate_label(user, 30),
            UserLabel::Total => {
                writeln!(writer, "  {}", "-".repeat(RULE_WIDTH - 2))?;
                format!("{} (all users)", TOTAL_LABEL)
            }
        };
        writeln!(
            writer,
            "  {:<30}{:>14}{:>14}{:>8}",
            label,
            formatting::format_currency(row.total_cost, 4),
            formatting::format_count(row.total_tokens),
            formatting::format_count(row.total_images),
        )?;
    }
    writeln!(writer)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
