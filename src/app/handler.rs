use crate::api::external::validate_url;
use crate::app::action::Action;
use crate::app::commands::{self, ParsedCommand};
use crate::app::event::AppEvent;
use crate::app::portfolio::{self, Holding};
use crate::app::state::*;
use crate::store::settings::{interval_label, SettingsPatch};
use crate::store::widget::{WidgetConfig, WidgetDraft, WidgetKind, WidgetUpdate};
use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::time::Instant;

pub fn handle_event(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    let now = Instant::now();
    let mut actions = match event {
        AppEvent::Terminal(cevent) => {
            state.dirty = true;
            handle_terminal(state, cevent)
        }
        AppEvent::WidgetData {
            widget_id,
            generation,
            result,
        } => {
            if state.scheduler.complete(&widget_id, generation, result) {
                state.dirty = true;
            }
            vec![]
        }
        AppEvent::Health(report) => {
            state.health = Some(report);
            state.dirty = true;
            vec![]
        }
        AppEvent::Tick => {
            if state.health_due(now) {
                vec![Action::CheckHealth]
            } else {
                vec![]
            }
        }
    };

    // store mutations above may have created, changed or removed widgets
    actions.extend(state.collect_due(now));
    actions
}

fn handle_terminal(state: &mut AppState, event: CEvent) -> Vec<Action> {
    match event {
        CEvent::Key(key) if key.kind != KeyEventKind::Release => handle_key(state, key),
        CEvent::Resize(_, _) => {
            state.dirty = true;
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    // Global keybindings
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![Action::Quit];
    }

    match state.overlay {
        Some(Overlay::Help) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter | KeyCode::Char('q')) {
                state.overlay = None;
            }
            return vec![];
        }
        Some(Overlay::Settings { selected }) => return handle_settings_key(state, key, selected),
        None => {}
    }

    if state.mode == InputMode::Command {
        return handle_input_key(state, key);
    }

    if state.reorder.is_dragging() {
        handle_move_key(state, key);
        return vec![];
    }

    handle_dashboard_key(state, key)
}

fn handle_settings_key(state: &mut AppState, key: KeyEvent, selected: usize) -> Vec<Action> {
    let rows = SettingsRow::ALL.len();
    match key.code {
        KeyCode::Esc | KeyCode::F(2) => state.overlay = None,
        KeyCode::Up => {
            state.overlay = Some(Overlay::Settings {
                selected: (selected + rows - 1) % rows,
            })
        }
        KeyCode::Down => {
            state.overlay = Some(Overlay::Settings {
                selected: (selected + 1) % rows,
            })
        }
        KeyCode::Enter | KeyCode::Right | KeyCode::Char(' ') => {
            state.adjust_setting(SettingsRow::ALL[selected % rows], true)
        }
        KeyCode::Left => state.adjust_setting(SettingsRow::ALL[selected % rows], false),
        _ => {}
    }
    vec![]
}

fn handle_move_key(state: &mut AppState, key: KeyEvent) {
    let cols = state.grid_columns() as isize;
    match key.code {
        KeyCode::Left => state.reorder.move_target(-1, state.store.widgets()),
        KeyCode::Right => state.reorder.move_target(1, state.store.widgets()),
        KeyCode::Up => state.reorder.move_target(-cols, state.store.widgets()),
        KeyCode::Down => state.reorder.move_target(cols, state.store.widgets()),
        KeyCode::Esc => {
            state.reorder.cancel_drag();
            state.set_status("Move cancelled");
        }
        KeyCode::Enter | KeyCode::Char('m') => {
            let moved = state.reorder.active_id().map(str::to_string);
            let over = state.reorder.target_id(state.store.widgets()).map(str::to_string);
            match state.reorder.drop_onto(&mut state.store, over.as_deref()) {
                Ok(true) => {
                    state.relayout();
                    if let Some(id) = moved {
                        state.focus_id(&id);
                    }
                    state.set_status("Widget moved");
                }
                Ok(false) => state.set_status("Widget left in place"),
                Err(e) => state.set_error(format!("Move failed: {}", e)),
            }
        }
        _ => {}
    }
}

fn handle_dashboard_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    let cols = state.grid_columns() as isize;
    match key.code {
        KeyCode::Char('/') | KeyCode::Char(':') => {
            state.mode = InputMode::Command;
            state.input.clear();
            state.input.insert_char('/');
        }
        KeyCode::Tab | KeyCode::Right => state.move_focus(1),
        KeyCode::BackTab | KeyCode::Left => state.move_focus(-1),
        KeyCode::Down => state.move_focus(cols),
        KeyCode::Up => state.move_focus(-cols),
        KeyCode::Char('m') => {
            if let Some(id) = state.focused_id() {
                state.reorder.begin_drag(id);
                state.set_status("Moving: arrows pick a spot, Enter drops, Esc cancels");
            }
        }
        KeyCode::Char('r') => {
            if let Some(id) = state.focused_id() {
                state.scheduler.refresh(&id, Instant::now());
            }
        }
        KeyCode::Char('R') => state.scheduler.refresh_all(Instant::now()),
        KeyCode::PageDown | KeyCode::PageUp => {
            let step = if key.code == KeyCode::PageDown {
                crate::app::table::PageMove::Next
            } else {
                crate::app::table::PageMove::Prev
            };
            return execute_command(state, ParsedCommand::Page { step });
        }
        KeyCode::F(1) | KeyCode::Char('?') => state.overlay = Some(Overlay::Help),
        KeyCode::F(2) => state.overlay = Some(Overlay::Settings { selected: 0 }),
        KeyCode::Char('q') => return vec![Action::Quit],
        KeyCode::Esc => state.status_message = None,
        _ => {}
    }
    vec![]
}

fn handle_input_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Enter => {
            let text = state.input.take_text();
            state.mode = InputMode::Normal;
            if text.trim().is_empty() || text.trim() == "/" {
                return vec![];
            }
            match commands::parse_command(&text) {
                Some(cmd) => execute_command(state, cmd),
                None => {
                    state.set_error(format!("Unknown command or bad arguments: {} (F1 for help)", text.trim()));
                    vec![]
                }
            }
        }
        KeyCode::Esc => {
            state.input.clear();
            state.mode = InputMode::Normal;
            vec![]
        }
        KeyCode::Backspace => {
            state.input.delete_back();
            if state.input.text.is_empty() {
                state.mode = InputMode::Normal;
            }
            vec![]
        }
        KeyCode::Delete => {
            state.input.delete_forward();
            vec![]
        }
        KeyCode::Left => {
            state.input.move_left();
            vec![]
        }
        KeyCode::Right => {
            state.input.move_right();
            vec![]
        }
        KeyCode::Home => {
            state.input.move_home();
            vec![]
        }
        KeyCode::End => {
            state.input.move_end();
            vec![]
        }
        KeyCode::Up => {
            state.input.history_up();
            vec![]
        }
        KeyCode::Down => {
            state.input.history_down();
            vec![]
        }
        KeyCode::Char(c) => {
            state.input.insert_char(c);
            vec![]
        }
        _ => vec![],
    }
}

/// The focused widget's id, provided it is one of `kinds`.
fn focused_of(state: &mut AppState, kinds: &[WidgetKind]) -> Option<String> {
    match state.focused_widget() {
        Some(w) if kinds.contains(&w.kind) => Some(w.id.clone()),
        Some(w) => {
            let wanted: Vec<&str> = kinds.iter().map(|k| k.tag()).collect();
            let msg = format!("'{}' is a {} widget; this needs {}", w.title, w.kind, wanted.join(" or "));
            state.set_error(msg);
            None
        }
        None => {
            state.set_error("No widget focused");
            None
        }
    }
}

fn edit_config(state: &mut AppState, id: &str, edit: impl FnOnce(&mut WidgetConfig)) {
    let Some(widget) = state.store.widget(id) else {
        return;
    };
    let mut config = widget.config.clone();
    edit(&mut config);
    state.store.update_widget(id, WidgetUpdate::config(config));
}

fn set_config_value(state: &mut AppState, kinds: &[WidgetKind], key: &str, value: Value) {
    if let Some(id) = focused_of(state, kinds) {
        edit_config(state, &id, |config| {
            config.insert(key.to_string(), value.clone());
        });
        state.set_status(format!("Set {} to {}", key, value));
    }
}

fn settings_patch(state: &mut AppState, patch: SettingsPatch, message: String) {
    let relayout = patch.compact_mode.is_some();
    state.store.update_settings(patch);
    if relayout {
        state.relayout();
    }
    state.set_status(message);
}

pub fn execute_command(state: &mut AppState, cmd: ParsedCommand) -> Vec<Action> {
    use WidgetKind::*;

    match cmd {
        ParsedCommand::Add { kind, title } => {
            let mut draft = WidgetDraft::from_kind(kind);
            if let Some(title) = title {
                draft = draft.with_title(title);
            }
            let name = draft.title.clone();
            let id = state.store.add_widget(draft);
            state.relayout();
            state.focus_id(&id);
            state.set_status(format!("Added {}", name));
        }
        ParsedCommand::AddApi { url, title } => {
            if let Err(e) = validate_url(&url) {
                state.set_error(format!("Cannot add API widget: {}", e));
                return vec![];
            }
            let draft = WidgetDraft::from_kind(ApiCustom)
                .with_title(title.unwrap_or_else(|| ApiCustom.display_name().to_string()))
                .with_config("apiUrl", json!(url));
            let id = state.store.add_widget(draft);
            state.relayout();
            state.focus_id(&id);
            state.set_status("Added API widget; use /fields to pick what it shows");
        }
        ParsedCommand::Remove => {
            if let Some(widget) = state.focused_widget() {
                let (id, title) = (widget.id.clone(), widget.title.clone());
                state.store.remove_widget(&id);
                state.relayout();
                state.set_status(format!("Removed {}", title));
            }
        }
        ParsedCommand::Title { text } => {
            if let Some(id) = state.focused_id() {
                state.store.update_widget(&id, WidgetUpdate::title(text));
            }
        }
        ParsedCommand::Symbols { symbols } => {
            let key = match state.focused_widget().map(|w| w.kind) {
                Some(MarketOverview) => "indices",
                _ => "symbols",
            };
            set_config_value(state, &[Watchlist, Table, MarketOverview], key, json!(symbols));
        }
        ParsedCommand::Symbol { symbol } => set_config_value(state, &[Chart], "symbol", json!(symbol)),
        ParsedCommand::Interval { interval } => set_config_value(state, &[Chart], "interval", json!(interval)),
        ParsedCommand::Period { period } => set_config_value(state, &[Chart], "period", json!(period)),
        ParsedCommand::Count { count } => set_config_value(state, &[Gainers, Losers], "count", json!(count)),
        ParsedCommand::Holding { symbol, shares, cost } => {
            if let Some(id) = focused_of(state, &[Portfolio]) {
                let mut holdings = state
                    .store
                    .widget(&id)
                    .map(portfolio::holdings)
                    .unwrap_or_default();
                holdings.retain(|h| h.symbol != symbol);
                if shares > 0.0 {
                    holdings.push(Holding {
                        symbol: symbol.clone(),
                        shares,
                        cost,
                    });
                }
                edit_config(state, &id, |config| {
                    config.insert("holdings".into(), json!(holdings));
                });
                state.set_status(format!("Updated holding {}", symbol));
            }
        }
        ParsedCommand::Fields { fields } => set_config_value(state, &[ApiCustom], "selectedFields", json!(fields)),
        ParsedCommand::Map { field, name } => {
            if let Some(id) = focused_of(state, &[ApiCustom]) {
                edit_config(state, &id, |config| {
                    let mapping = config
                        .entry("fieldMapping")
                        .or_insert_with(|| Value::Object(Default::default()));
                    if !mapping.is_object() {
                        *mapping = Value::Object(Default::default());
                    }
                    if let Value::Object(map) = mapping {
                        map.insert(field.clone(), json!(name));
                    }
                });
                state.set_status(format!("{} now shows as {}", field, name));
            }
        }
        ParsedCommand::Mode { mode } => set_config_value(state, &[ApiCustom], "displayMode", json!(mode)),
        ParsedCommand::Every { secs } => set_config_value(state, &[ApiCustom], "refreshInterval", json!(secs)),
        ParsedCommand::Theme { theme } => settings_patch(
            state,
            SettingsPatch {
                theme: Some(theme),
                ..Default::default()
            },
            format!("Theme: {}", theme),
        ),
        ParsedCommand::IntervalAll { ms } => settings_patch(
            state,
            SettingsPatch {
                refresh_interval: Some(ms),
                ..Default::default()
            },
            format!("Refresh every {}", interval_label(ms)),
        ),
        ParsedCommand::AutoRefresh { on } => settings_patch(
            state,
            SettingsPatch {
                auto_refresh: Some(on),
                ..Default::default()
            },
            format!("Auto refresh {}", if on { "on" } else { "off" }),
        ),
        ParsedCommand::Compact { on } => settings_patch(
            state,
            SettingsPatch {
                compact_mode: Some(on),
                ..Default::default()
            },
            format!("Compact mode {}", if on { "on" } else { "off" }),
        ),
        ParsedCommand::Export { path } => {
            let path = path.map(PathBuf::from).unwrap_or_else(|| {
                let date = chrono::Utc::now().format("%Y-%m-%d");
                state
                    .config
                    .storage
                    .data_dir
                    .join(format!("finboard-dashboard-{}.json", date))
            });
            return vec![Action::ExportFile { path }];
        }
        ParsedCommand::Import { path } => {
            return vec![Action::ImportFile {
                path: PathBuf::from(path),
            }]
        }
        ParsedCommand::Reset => {
            state.store.reset_dashboard();
            state.tables.clear();
            state.focus = 0;
            state.set_status("Dashboard reset to defaults");
        }
        ParsedCommand::Refresh => {
            if let Some(id) = state.focused_id() {
                state.scheduler.refresh(&id, Instant::now());
            }
        }
        ParsedCommand::ClearCache => {
            state.scheduler.refresh_all(Instant::now());
            state.set_status("Cache cleared");
            return vec![Action::ClearCache];
        }
        ParsedCommand::Filter { text } => {
            if let Some(id) = focused_of(state, &[Table]) {
                state.table_view_mut(&id).set_filter(text);
            }
        }
        ParsedCommand::Sort { key } => {
            if let Some(id) = focused_of(state, &[Table]) {
                state.table_view_mut(&id).sort_by(key);
            }
        }
        ParsedCommand::Page { step } => {
            if let Some(id) = focused_of(state, &[Table]) {
                let total_pages = table_pages(state, &id);
                state.table_view_mut(&id).turn_page(step, total_pages);
            }
        }
        ParsedCommand::Help => state.overlay = Some(Overlay::Help),
        ParsedCommand::Quit => return vec![Action::Quit],
    }
    state.dirty = true;
    vec![]
}

fn table_pages(state: &AppState, id: &str) -> usize {
    use crate::app::refresh::{FeedState, WidgetPayload};
    match state.scheduler.feed(id).map(|f| &f.state) {
        Some(FeedState::Ready(WidgetPayload::Quotes(quotes))) => state.table_view(id).arrange(quotes).total_pages,
        _ => 1,
    }
}
