use crate::app::state::*;
use crate::store::widget::WidgetKind;
use crate::ui::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

const KEYS: &[(&str, &str)] = &[
    ("Tab / arrows", "move focus between widgets"),
    ("/", "enter a command"),
    ("m", "pick up the focused widget"),
    ("  arrows, Enter / Esc", "choose a spot, drop / cancel"),
    ("r / R", "refresh focused / all widgets"),
    ("PgUp / PgDn", "page a stock table"),
    ("F1 / F2", "help / settings"),
    ("q / Ctrl-C", "quit"),
];

const COMMANDS: &[(&str, &str)] = &[
    ("/add <type> [title]", "add a widget"),
    ("/api <url> [title]", "add a custom API widget"),
    ("/remove", "remove the focused widget"),
    ("/title <text>", "rename the focused widget"),
    ("/symbols A,B,C", "symbols for the focused widget"),
    ("/symbol /interval /period", "chart settings"),
    ("/count <n>", "gainers and losers list size"),
    ("/holding <sym> <n> <cost>", "set or drop (0) a position"),
    ("/fields a,b  /map <f> <name>", "custom API fields and labels"),
    ("/mode <m>  /every <secs>", "custom API display and refresh"),
    ("/filter  /sort  /page", "stock table view"),
    ("/theme  /compact on|off", "look and density"),
    ("/interval-all  /autorefresh", "refresh settings"),
    ("/export  /import <path>", "save or load a dashboard file"),
    ("/reset /refresh /clear-cache", "housekeeping"),
];

/// Popup rectangle: `pct_w` by `pct_h` percent of `area`, at least
/// `min_w` by `min_h`, centered.
fn popup(area: Rect, pct_w: u16, pct_h: u16, min_w: u16, min_h: u16) -> Rect {
    let w = (area.width * pct_w / 100)
        .max(min_w)
        .min(area.width.saturating_sub(4));
    let h = (area.height * pct_h / 100)
        .max(min_h)
        .min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

fn popup_block<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .title(title)
        .title_style(palette.title())
        .borders(Borders::ALL)
        .border_type(palette.border_type())
        .border_style(palette.border_focused())
        .style(Style::default().fg(palette.text).bg(palette.bg_elevated))
}

pub fn render_help(frame: &mut Frame, palette: &Palette) {
    let area = popup(frame.area(), 80, 85, 60, 20);
    frame.render_widget(Clear, area);

    let key_style = Style::default().fg(palette.accent).add_modifier(Modifier::BOLD);
    let row = |(key, text): &(&'static str, &'static str)| {
        Line::from(vec![
            Span::styled(format!("  {:<29}", key), key_style),
            Span::raw(*text),
        ])
    };

    let mut lines = vec![Line::from(Span::styled("Keys", palette.title()))];
    lines.extend(KEYS.iter().map(row));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Commands", palette.title())));
    lines.extend(COMMANDS.iter().map(row));

    let mut kinds = vec![Line::from(Span::styled("Widget types", palette.title()))];
    for kind in WidgetKind::ALL {
        kinds.push(Line::from(Span::styled(format!("  {}", kind.tag()), key_style)));
        kinds.push(Line::from(Span::styled(format!("    {}", kind.description()), palette.muted())));
    }

    let block = popup_block(" Help (Esc to close) ", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .spacing(2)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(inner);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), columns[0]);
    frame.render_widget(Paragraph::new(kinds).wrap(Wrap { trim: false }), columns[1]);
}

pub fn render_settings(frame: &mut Frame, state: &AppState, selected: usize, palette: &Palette) {
    let area = popup(frame.area(), 40, 40, 44, 10);
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = SettingsRow::ALL
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == selected {
                Style::default().fg(palette.bg).bg(palette.accent)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!(" {:<18}", row.label())),
                Span::styled(format!("◂ {} ▸", state.setting_value(*row)), palette.title()),
            ]))
            .style(style)
        })
        .collect();

    let list = List::new(items).block(popup_block(" Settings: ↑↓ select, ←→ change, Esc close ", palette));
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_is_centered_and_fits() {
        let area = Rect::new(0, 0, 100, 50);
        assert_eq!(popup(area, 40, 40, 44, 10), Rect::new(28, 15, 44, 20));
        // never larger than the screen
        let tiny = Rect::new(0, 0, 30, 8);
        let r = popup(tiny, 40, 40, 44, 10);
        assert!(r.width <= 26 && r.height <= 6);
    }
}
