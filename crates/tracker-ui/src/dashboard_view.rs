//! Dashboard screen: headline metric cards and the three ranking charts.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use tracker_core::formatting;
use tracker_core::models::ModelMetric;
use tracker_runtime::dashboard::DashboardView;

use crate::components::bar_chart::{BarEntry, HorizontalBarChart};
use crate::components::metric_card::MetricCard;
use crate::themes::Theme;

/// Columns reserved after each bar for the formatted value.
const VALUE_COLUMNS: u16 = 16;

// ── Chart data ────────────────────────────────────────────────────────────────

/// Bar entries for the model ranking ordered by `metric`.
pub fn model_entries(view: &DashboardView, metric: ModelMetric) -> Vec<BarEntry> {
    view.top_by(metric)
        .iter()
        .map(|m| {
            let display = match metric {
                ModelMetric::TotalTokens => formatting::format_count(m.total_tokens),
                ModelMetric::TotalCost => formatting::format_currency(m.total_cost, 4),
            };
            BarEntry::new(m.model.clone(), m.metric(metric), display)
        })
        .collect()
}

/// Bar entries for the per-user cost chart, without the total row.
pub fn user_entries(view: &DashboardView) -> Vec<BarEntry> {
    view.chart_users()
        .map(|row| {
            BarEntry::new(
                row.label.to_string(),
                row.total_cost,
                formatting::format_currency(row.total_cost, 4),
            )
        })
        .collect()
}

// ── Render ────────────────────────────────────────────────────────────────────

/// Render the dashboard for `view` into `area`.
pub fn render_dashboard(frame: &mut Frame, area: Rect, view: &DashboardView, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Metric cards
            Constraint::Fill(1),   // Tokens by model
            Constraint::Fill(1),   // Cost by model
            Constraint::Fill(1),   // Cost by user
        ])
        .split(area);

    let card_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(chunks[0]);
    for (card, card_area) in MetricCard::for_summary(&view.summary)
        .iter()
        .zip(card_areas.iter())
    {
        card.render(frame, *card_area, theme);
    }

    let top = view.top_by_tokens.len().max(view.top_by_cost.len());
    render_chart(
        frame,
        chunks[1],
        &format!("Top {} Models by Tokens Used", top),
        model_entries(view, ModelMetric::TotalTokens),
        theme.bar_tokens,
        theme,
    );
    render_chart(
        frame,
        chunks[2],
        &format!("Top {} Models by Cost", top),
        model_entries(view, ModelMetric::TotalCost),
        theme.bar_cost,
        theme,
    );
    render_chart(
        frame,
        chunks[3],
        "Cost by User",
        user_entries(view),
        theme.bar_user,
        theme,
    );
}

fn render_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    entries: Vec<BarEntry>,
    bar_style: Style,
    theme: &Theme,
) {
    let inner_width = area.width.saturating_sub(2);
    let label_width = (inner_width / 3).min(28);
    let bar_width = inner_width
        .saturating_sub(label_width + 1 + VALUE_COLUMNS)
        .max(1);

    let lines = HorizontalBarChart::new(entries, bar_style, theme)
        .with_widths(bar_width, label_width)
        .to_lines();

    let chart = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.table_border)
            .title(Span::styled(format!(" {} ", title), theme.table_header)),
    );
    frame.render_widget(chart, area);
}

/// Render a centred status message in place of the dashboard (no data for
/// the period, nothing valid in the upload, ...).
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    message: &str,
    style: Style,
    theme: &Theme,
) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), style)),
        Line::from(""),
        Line::from(Span::styled(
            "Use ←/→ to change period, Tab for other screens, q to quit.",
            theme.dim,
        )),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(format!(" {} ", title)),
            ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tracker_core::models::{UsageRecord, DEFAULT_RECORD_TYPE};

    fn record(model: &str, user: &str, cost: f64, tokens: i64) -> UsageRecord {
        UsageRecord {
            period: "2024-11".to_string(),
            model: model.to_string(),
            cost,
            user: user.to_string(),
            total_tokens: tokens,
            image_count: 0,
            record_type: DEFAULT_RECORD_TYPE.to_string(),
        }
    }

    fn make_view() -> DashboardView {
        let records = vec![
            record("gpt-4", "a@x.com", 0.02, 150),
            record("dall-e-3", "b@x.com", 0.04, 0),
            record("gpt-4", "b@x.com", 0.01, 50),
        ];
        DashboardView::build(&records, "2024-11", 10).unwrap()
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_model_entries_tokens() {
        let entries = model_entries(&make_view(), ModelMetric::TotalTokens);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "gpt-4");
        assert_eq!(entries[0].display, "200");
        assert_eq!(entries[1].value, 0.0);
    }

    #[test]
    fn test_model_entries_cost() {
        let entries = model_entries(&make_view(), ModelMetric::TotalCost);
        assert_eq!(entries[0].label, "dall-e-3");
        assert_eq!(entries[0].display, "$0.0400");
    }

    #[test]
    fn test_user_entries_exclude_total() {
        let entries = user_entries(&make_view());
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["b@x.com", "a@x.com"]);
    }

    #[test]
    fn test_render_dashboard() {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let view = make_view();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, area, &view, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Total Messages/Prompts"));
        assert!(text.contains("$0.0700"));
        assert!(text.contains("Models by Tokens Used"));
        assert!(text.contains("Cost by User"));
    }

    #[test]
    fn test_render_dashboard_small_terminal_does_not_panic() {
        let backend = TestBackend::new(20, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::classic();
        let view = make_view();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, area, &view, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_status() {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_status(
                    frame,
                    area,
                    "2023-01",
                    "No data available for 2023-01.",
                    theme.error,
                    &theme,
                );
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("No data available for 2023-01."));
    }
}
