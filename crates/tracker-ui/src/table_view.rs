//! Tables screen: the raw period records plus the three aggregate tables
//! behind the dashboard charts.
//!
//! Each table is a bordered [`ratatui::widgets::Table`]; the per-user table
//! ends with the highlighted total row.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use tracker_core::formatting;
use tracker_core::models::{ModelMetric, UsageRecord};
use tracker_runtime::dashboard::DashboardView;

use crate::themes::Theme;

/// Largest useful scroll offset for the records table.
pub fn max_scroll(view: &DashboardView) -> usize {
    view.records.len().saturating_sub(1)
}

/// Render all four tables for `view`, with the records table scrolled down
/// by `scroll` rows.
pub fn render_tables(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    scroll: usize,
    theme: &Theme,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_records_table(frame, columns[0], &view.records, scroll, theme);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1), // Tokens by model
            Constraint::Fill(1), // Cost by model
            Constraint::Fill(1), // Users
        ])
        .split(columns[1]);

    render_model_table(frame, right[0], view, ModelMetric::TotalTokens, theme);
    render_model_table(frame, right[1], view, ModelMetric::TotalCost, theme);
    render_user_table(frame, right[2], view, theme);
}

fn bordered<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(format!(" {} ", title))
}

fn header_row<'a>(labels: &[&'a str], theme: &Theme) -> Row<'a> {
    Row::new(
        labels
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header))
            .collect::<Vec<_>>(),
    )
    .height(1)
}

fn render_records_table(
    frame: &mut Frame,
    area: Rect,
    records: &[UsageRecord],
    scroll: usize,
    theme: &Theme,
) {
    let offset = scroll.min(records.len().saturating_sub(1));
    let rows: Vec<Row> = records
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, record)| {
            Row::new(vec![
                Cell::from(record.user.clone()),
                Cell::from(record.model.clone()),
                Cell::from(formatting::format_currency(record.cost, 4)),
                Cell::from(formatting::format_count(record.total_tokens)),
                Cell::from(formatting::format_count(record.image_count)),
                Cell::from(record.record_type.clone()),
            ])
            .style(theme.row_style(i))
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Fill(1),
    ];

    let title = if records.is_empty() {
        "Records".to_string()
    } else {
        format!("Records {}-{} of {}", offset + 1, records.len(), records.len())
    };

    let table = Table::new(rows, widths)
        .header(header_row(
            &["User", "Model", "Cost", "Tokens", "Images", "Type"],
            theme,
        ))
        .block(bordered(title, theme))
        .style(theme.text);

    frame.render_widget(table, area);
}

fn render_model_table(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    metric: ModelMetric,
    theme: &Theme,
) {
    let rows: Vec<Row> = view
        .top_by(metric)
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Row::new(vec![
                Cell::from(m.model.clone()),
                Cell::from(formatting::format_count(m.total_tokens)),
                Cell::from(formatting::format_currency(m.total_cost, 4)),
            ])
            .style(theme.row_style(i))
        })
        .collect();

    let title = match metric {
        ModelMetric::TotalTokens => "Models by Tokens",
        ModelMetric::TotalCost => "Models by Cost",
    };

    let table = Table::new(
        rows,
        [
            Constraint::Fill(1),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["Model", "Tokens", "Cost"], theme))
    .block(bordered(title.to_string(), theme))
    .style(theme.text);

    frame.render_widget(table, area);
}

fn render_user_table(frame: &mut Frame, area: Rect, view: &DashboardView, theme: &Theme) {
    let rows: Vec<Row> = view
        .users
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if row.label.is_total() {
                theme.table_total
            } else {
                theme.row_style(i)
            };
            Row::new(vec![
                Cell::from(row.label.to_string()),
                Cell::from(formatting::format_currency(row.total_cost, 4)),
                Cell::from(formatting::format_count(row.total_tokens)),
                Cell::from(formatting::format_count(row.total_images)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(7),
        ],
    )
    .header(header_row(&["User", "Cost", "Tokens", "Images"], theme))
    .block(bordered("Users".to_string(), theme))
    .style(theme.text);

    frame.render_widget(table, area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
