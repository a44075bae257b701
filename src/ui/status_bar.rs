use crate::api::types::HealthStatus;
use crate::app::state::*;
use crate::store::settings::interval_label;
use crate::ui::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

const HINTS: &str = " / command  F1 help  F2 settings  m move  r refresh ";

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let bar = palette.header_bar();
    let mut parts: Vec<Span> = Vec::new();

    let text_style = match state.status_message {
        Some((_, StatusLevel::Error)) => bar.fg(palette.loss),
        _ => bar,
    };
    parts.push(Span::styled(format!(" {} ", state.status_line()), text_style));

    let health = match &state.health {
        Some(report) if report.status == HealthStatus::Healthy => {
            Span::styled(format!(" ● {} ", report.provider), bar.fg(palette.gain))
        }
        Some(report) => Span::styled(format!(" ● {}: {} ", report.provider, report.message), bar.fg(palette.loss)),
        None => Span::styled(" ○ checking API ", bar.fg(palette.text_muted)),
    };
    parts.push(health);

    // Pad to fill remaining space
    let used: usize = parts.iter().map(|s| UnicodeWidthStr::width(s.content.as_ref())).sum();
    let remaining = (area.width as usize).saturating_sub(used + HINTS.len());
    parts.push(Span::styled(" ".repeat(remaining), bar));
    parts.push(Span::styled(HINTS, bar.fg(palette.text_muted)));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

/// Top line: app name, auto-refresh badge and the move indicator.
pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let bar = palette.header_bar();
    let settings = state.store.settings();
    let mut parts = vec![Span::styled(
        " FinBoard ",
        bar.fg(palette.accent).add_modifier(Modifier::BOLD),
    )];

    let badge = match settings.auto_refresh_ms() {
        Some(ms) => Span::styled(format!(" ⟳ {} ", interval_label(ms)), bar.fg(palette.gain)),
        None => Span::styled(" ⟳ paused ", bar.fg(palette.text_muted)),
    };
    parts.push(badge);

    if state.reorder.is_dragging() {
        parts.push(Span::styled(" MOVE ", bar.fg(palette.warn).add_modifier(Modifier::BOLD)));
    }

    let used: usize = parts.iter().map(|s| UnicodeWidthStr::width(s.content.as_ref())).sum();
    parts.push(Span::styled(" ".repeat((area.width as usize).saturating_sub(used)), bar));
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
