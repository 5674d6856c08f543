use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the application title.
pub const ACCENT: &str = "◆ ◇ ◆";

/// Dashboard header rendering four lines:
///
/// 1. Application title with accent decorations (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. Loaded file and selected period in `[ file | period ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Identity of the loaded upload (path or `stdin`).
    pub file: &'a str,
    /// Selected period, or `None` before any valid record was loaded.
    pub period: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(file: &'a str, period: Option<&'a str>, theme: &'a Theme) -> Self {
        Self {
            file,
            period,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" AI COST TRACKER ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.file, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.period.unwrap_or("no period"), self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let lines = Header::new("costs.json", Some("2024-11"), &theme).to_lines();
        assert_eq!(lines.len(), 4, "header must produce exactly 4 lines");
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new("costs.json", Some("2024-11"), &theme).to_lines();
        let title = text(&lines[0]);
        assert!(title.contains("AI COST TRACKER"), "got: {title}");
        assert!(title.starts_with(ACCENT));
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::dark();
        let lines = Header::new("/tmp/Costs.json", Some("2024-11"), &theme).to_lines();
        // File names keep their case.
        assert_eq!(text(&lines[2]), "[ /tmp/Costs.json | 2024-11 ]");
        assert_eq!(lines[2].spans.len(), 5);
    }

    #[test]
    fn test_header_info_line_without_period() {
        let theme = Theme::dark();
        let lines = Header::new("stdin", None, &theme).to_lines();
        assert_eq!(text(&lines[2]), "[ stdin | no period ]");
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::classic();
        let lines = Header::new("costs.json", None, &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
        assert!(text(&lines[3]).is_empty());
    }
}
