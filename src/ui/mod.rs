mod input_box;
mod layout;
mod overlays;
mod status_bar;
mod theme;
mod widget_panel;

use crate::app::state::{AppState, InputMode, Overlay};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph};
use theme::Palette;

pub fn render(frame: &mut Frame, state: &AppState) {
    let palette = Palette::for_theme(state.store.settings().theme);
    let area = frame.area();
    frame.render_widget(Block::default().style(palette.base()), area);

    let app_layout = layout::compute_layout(area, state.mode == InputMode::Command);

    status_bar::render_header(frame, app_layout.header, state, &palette);
    render_grid(frame, app_layout.grid, state, &palette);
    if state.mode == InputMode::Command {
        input_box::render(frame, app_layout.input_box, state, &palette);
    }
    status_bar::render(frame, app_layout.status_bar, state, &palette);

    match state.overlay {
        Some(Overlay::Help) => overlays::render_help(frame, &palette),
        Some(Overlay::Settings { selected }) => overlays::render_settings(frame, state, selected, &palette),
        None => {}
    }
}

fn render_grid(frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let widgets = state.store.widgets();
    if widgets.is_empty() {
        let hint = Paragraph::new(vec![
            Line::from(Span::styled("No widgets yet", palette.title())),
            Line::from(Span::styled(
                "Type /add watchlist, or /help for every widget type",
                palette.muted(),
            )),
        ])
        .alignment(Alignment::Center);
        let y = area.y + area.height / 2;
        frame.render_widget(hint, Rect::new(area.x, y.saturating_sub(1), area.width, 2.min(area.height)));
        return;
    }

    for (idx, cell) in layout::grid_cells(area, widgets, state.grid_columns(), state.focus) {
        widget_panel::render(frame, cell, state, idx, &widgets[idx], palette);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::handler::execute_command;
    use crate::app::commands::parse_command;
    use crate::config::AppConfig;
    use crate::store::persist::MemoryStorage;
    use crate::store::DashboardStore;
    use ratatui::backend::TestBackend;

    fn screen(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn state() -> AppState {
        let store = DashboardStore::open(Box::new(MemoryStorage::new()));
        AppState::new(AppConfig::default(), store)
    }

    #[test]
    fn test_renders_default_dashboard() {
        let state = state();
        let text = screen(&state);
        assert!(text.contains("FinBoard"));
        assert!(text.contains("Market Overview"));
        assert!(text.contains("My Watchlist"));
        assert!(text.contains("Loading"));
    }

    #[test]
    fn test_renders_empty_dashboard_and_overlays() {
        let mut state = state();
        for _ in 0..3 {
            execute_command(&mut state, parse_command("/remove").unwrap());
        }
        assert!(screen(&state).contains("No widgets yet"));

        state.overlay = Some(Overlay::Help);
        assert!(screen(&state).contains("api-custom"));
        state.overlay = Some(Overlay::Settings { selected: 1 });
        assert!(screen(&state).contains("Refresh interval"));
    }
}
