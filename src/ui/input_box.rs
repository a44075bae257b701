use crate::app::state::*;
use crate::ui::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::block::Padding;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    if area.height == 0 {
        return;
    }
    let block = Block::default()
        .title(" Command ")
        .title_style(palette.title())
        .borders(Borders::ALL)
        .border_type(palette.border_type_focused())
        .border_style(palette.border_focused())
        .padding(Padding::horizontal(1))
        .style(palette.base());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input_text = &state.input.text;
    let line = Line::from(vec![
        Span::styled("❯ ", Style::default().fg(palette.accent)),
        Span::styled(input_text.as_str(), Style::default().fg(palette.text)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);

    // Cursor offset: chevron "❯ " (2 cells) plus the display width before the cursor
    let before = UnicodeWidthStr::width(&input_text[..state.input.cursor]) as u16;
    let cursor_x = inner.x + 2 + before;
    frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y));
}
