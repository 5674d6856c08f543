use crate::themes::Theme;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tracker_core::formatting;
use tracker_core::models::Summary;

// ── MetricCard ───────────────────────────────────────────────────────────────

/// A bordered box showing one headline figure under its title.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
}

impl MetricCard {
    pub fn new(title: &'static str, value: impl Into<String>) -> Self {
        Self {
            title,
            value: value.into(),
        }
    }

    /// The four headline cards for a period, in display order.
    ///
    /// Cost is shown with four decimals.
    pub fn for_summary(summary: &Summary) -> [MetricCard; 4] {
        [
            MetricCard::new(
                "Total Messages/Prompts",
                formatting::format_count(summary.message_count as i64),
            ),
            MetricCard::new(
                "Total Cost",
                formatting::format_currency(summary.total_cost, 4),
            ),
            MetricCard::new("Total Tokens", formatting::format_count(summary.total_tokens)),
            MetricCard::new(
                "Images Generated",
                formatting::format_count(summary.total_images),
            ),
        ]
    }

    pub fn to_lines<'a>(&self, theme: &Theme) -> Vec<Line<'a>> {
        vec![
            Line::from(Span::styled(self.title, theme.card_title)),
            Line::from(Span::styled(self.value.clone(), theme.value)),
        ]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let paragraph = Paragraph::new(self.to_lines(theme))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.card_border),
            );
        frame.render_widget(paragraph, area);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
