//! Diagnostics screen listing every record skipped while loading the upload.

use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tracker_core::error::Diagnostic;

use crate::themes::Theme;

/// One line per diagnostic: `[KIND] location field: message`.
pub fn diagnostic_lines<'a>(diagnostics: &[Diagnostic], theme: &Theme) -> Vec<Line<'a>> {
    diagnostics
        .iter()
        .map(|d| {
            let mut spans = vec![
                Span::styled(format!("[{}] ", d.kind), theme.diagnostic_style(d.kind)),
                Span::styled(d.location.to_string(), theme.label),
            ];
            if let Some(field) = &d.field {
                spans.push(Span::styled(format!(" {}", field), theme.dim));
            }
            spans.push(Span::styled(format!(": {}", d.message), theme.text));
            Line::from(spans)
        })
        .collect()
}

/// Render the diagnostics list scrolled down by `scroll` lines.
pub fn render_diagnostics(
    frame: &mut Frame,
    area: Rect,
    diagnostics: &[Diagnostic],
    scroll: usize,
    theme: &Theme,
) {
    let lines = if diagnostics.is_empty() {
        vec![Line::from(Span::styled(
            "All records were loaded without problems.",
            theme.success,
        ))]
    } else {
        diagnostic_lines(diagnostics, theme)
    };

    let warnings = diagnostics.iter().filter(|d| d.kind.is_warning()).count();
    let title = format!(
        " Diagnostics: {} errors, {} warnings ",
        diagnostics.len() - warnings,
        warnings
    );

    let offset = u16::try_from(scroll).unwrap_or(u16::MAX);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .scroll((offset, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(title),
            ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
