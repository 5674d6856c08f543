use crate::themes::Theme;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use tracker_core::formatting;

/// Configuration controlling visual appearance of a bar chart.
pub struct BarChartConfig {
    /// Width in terminal columns of the longest bar.
    pub width: u16,
    /// Columns reserved for the category label.
    pub label_width: u16,
    /// Character used for the filled portion of a bar.
    pub filled_char: char,
    /// Character used for the remainder of the bar track.
    pub empty_char: char,
}

impl Default for BarChartConfig {
    fn default() -> Self {
        Self {
            width: 40,
            label_width: 24,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

/// One category of a [`HorizontalBarChart`].
#[derive(Debug, Clone, PartialEq)]
pub struct BarEntry {
    pub label: String,
    /// Value that determines the bar length.
    pub value: f64,
    /// Pre-formatted value shown after the bar.
    pub display: String,
}

impl BarEntry {
    pub fn new(label: impl Into<String>, value: f64, display: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            display: display.into(),
        }
    }
}

// ── HorizontalBarChart ───────────────────────────────────────────────────────

/// Horizontal bar chart rendered as one [`Line`] per category.
///
/// Bars are scaled against the largest positive value; zero and negative
/// values render as an empty track.
pub struct HorizontalBarChart<'a> {
    pub entries: Vec<BarEntry>,
    /// Style of the filled portion.
    pub bar_style: Style,
    pub theme: &'a Theme,
    pub config: BarChartConfig,
}

impl<'a> HorizontalBarChart<'a> {
    pub fn new(entries: Vec<BarEntry>, bar_style: Style, theme: &'a Theme) -> Self {
        Self {
            entries,
            bar_style,
            theme,
            config: BarChartConfig::default(),
        }
    }

    /// Builder-style override of the bar and label widths.
    pub fn with_widths(mut self, bar_width: u16, label_width: u16) -> Self {
        self.config.width = bar_width;
        self.config.label_width = label_width;
        self
    }

    /// Number of filled columns for `value`.
    pub fn filled_columns(&self, value: f64) -> u16 {
        let max = self
            .entries
            .iter()
            .map(|e| e.value)
            .fold(0.0_f64, f64::max);
        if max <= 0.0 || value <= 0.0 {
            return 0;
        }
        let filled = ((value / max) * self.config.width as f64).round() as u16;
        // A non-zero value always shows at least one cell.
        filled.clamp(1, self.config.width)
    }

    /// Render the chart; a single dim line when there are no entries.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        if self.entries.is_empty() {
            return vec![Line::from(Span::styled("No data", self.theme.dim))];
        }

        let label_width = self.config.label_width as usize;
        self.entries
            .iter()
            .map(|entry| {
                let label = formatting::truncate_label(&entry.label, label_width);
                let pad = label_width.saturating_sub(UnicodeWidthStr::width(label.as_str()));

                let filled = self.filled_columns(entry.value);
                let empty = self.config.width.saturating_sub(filled);
                let filled_str: String =
                    std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
                let empty_str: String =
                    std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

                Line::from(vec![
                    Span::styled(format!("{label}{} ", " ".repeat(pad)), self.theme.label),
                    Span::styled(filled_str, self.bar_style),
                    Span::styled(empty_str, self.theme.dim),
                    Span::styled(format!(" {}", entry.display), self.theme.value),
                ])
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn chart(theme: &Theme) -> HorizontalBarChart<'_> {
        HorizontalBarChart::new(
            vec![
                BarEntry::new("gpt-4", 100.0, "100"),
                BarEntry::new("gpt-4o-mini", 50.0, "50"),
                BarEntry::new("dall-e-3", 0.0, "0"),
            ],
            theme.bar_tokens,
            theme,
        )
        .with_widths(20, 12)
    }

    #[test]
    fn test_bar_lengths_scale_to_max() {
        let theme = Theme::dark();
        let chart = chart(&theme);
        assert_eq!(chart.filled_columns(100.0), 20);
        assert_eq!(chart.filled_columns(50.0), 10);
        assert_eq!(chart.filled_columns(0.0), 0);
        assert_eq!(chart.filled_columns(0.1), 1);
    }

    #[test]
    fn test_negative_values_render_empty() {
        let theme = Theme::dark();
        let chart = HorizontalBarChart::new(
            vec![BarEntry::new("refund", -3.0, "$-3.00")],
            theme.bar_cost,
            &theme,
        );
        assert_eq!(chart.filled_columns(-3.0), 0);
        let lines = chart.to_lines();
        assert!(text(&lines[0]).ends_with("$-3.00"));
    }

    #[test]
    fn test_line_layout() {
        let theme = Theme::dark();
        let lines = chart(&theme).to_lines();
        assert_eq!(lines.len(), 3);

        let first = text(&lines[0]);
        assert!(first.starts_with("gpt-4        "));
        assert_eq!(first.matches('█').count(), 20);
        assert!(first.ends_with(" 100"));

        let second = text(&lines[1]);
        assert_eq!(second.matches('█').count(), 10);
        assert_eq!(second.matches('░').count(), 10);
    }

    #[test]
    fn test_long_labels_truncated() {
        let theme = Theme::dark();
        let lines = HorizontalBarChart::new(
            vec![BarEntry::new("a-very-long-model-name-indeed", 1.0, "1")],
            theme.bar_tokens,
            &theme,
        )
        .with_widths(10, 8)
        .to_lines();
        assert!(text(&lines[0]).starts_with("a-very-… "));
    }

    #[test]
    fn test_empty_chart() {
        let theme = Theme::dark();
        let lines = HorizontalBarChart::new(vec![], theme.bar_user, &theme).to_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(text(&lines[0]), "No data");
    }
}
