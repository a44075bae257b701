use crate::api::types::HealthReport;
use crate::app::action::Action;
use crate::app::refresh::{RefreshScheduler, MAX_REFRESH_INTERVAL};
use crate::app::table::TableView;
use crate::config::AppConfig;
use crate::store::layout::flow_layout;
use crate::store::reorder::ReorderController;
use crate::store::settings::{interval_label, SettingsPatch, Theme, REFRESH_INTERVALS_MS};
use crate::store::widget::Widget;
use crate::store::DashboardStore;
use chrono::Local;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct InputState {
    pub text: String,
    pub cursor: usize,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            history: Vec::new(),
            history_index: None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.history_index = None;
    }

    pub fn take_text(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.cursor = 0;
        self.history_index = None;
        if !text.is_empty() {
            self.history.push(text.clone());
        }
        text
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            Some(i) if i > 0 => i - 1,
            Some(_) => return,
            None => self.history.len() - 1,
        };
        self.history_index = Some(idx);
        self.text = self.history[idx].clone();
        self.cursor = self.text.len();
    }

    pub fn history_down(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => {
                let idx = i + 1;
                self.history_index = Some(idx);
                self.text = self.history[idx].clone();
                self.cursor = self.text.len();
            }
            Some(_) => self.clear(),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

/// Rows of the settings overlay, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    Theme,
    RefreshInterval,
    AutoRefresh,
    CompactMode,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 4] = [
        SettingsRow::Theme,
        SettingsRow::RefreshInterval,
        SettingsRow::AutoRefresh,
        SettingsRow::CompactMode,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsRow::Theme => "Theme",
            SettingsRow::RefreshInterval => "Refresh interval",
            SettingsRow::AutoRefresh => "Auto refresh",
            SettingsRow::CompactMode => "Compact mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
    Settings { selected: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

pub struct AppState {
    pub config: AppConfig,
    pub store: DashboardStore,
    pub scheduler: RefreshScheduler,
    pub tables: HashMap<String, TableView>,
    pub reorder: ReorderController,
    pub input: InputState,
    pub mode: InputMode,
    pub overlay: Option<Overlay>,
    /// Index of the focused widget.
    pub focus: usize,
    pub health: Option<HealthReport>,
    pub next_health_check: Instant,
    pub status_message: Option<(String, StatusLevel)>,
    pub should_quit: bool,
    pub dirty: bool,
}

impl AppState {
    pub fn new(config: AppConfig, store: DashboardStore) -> Self {
        Self {
            config,
            store,
            scheduler: RefreshScheduler::new(),
            tables: HashMap::new(),
            reorder: ReorderController::new(),
            input: InputState::new(),
            mode: InputMode::Normal,
            overlay: None,
            focus: 0,
            health: None,
            next_health_check: Instant::now(),
            status_message: None,
            should_quit: false,
            dirty: true,
        }
    }

    pub fn focused_widget(&self) -> Option<&Widget> {
        self.store.widgets().get(self.focus)
    }

    pub fn focused_id(&self) -> Option<String> {
        self.focused_widget().map(|w| w.id.clone())
    }

    /// Move focus by `delta`, wrapping at either end.
    pub fn move_focus(&mut self, delta: isize) {
        let len = self.store.widgets().len();
        if len == 0 {
            self.focus = 0;
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len as isize) as usize;
        self.dirty = true;
    }

    pub fn focus_id(&mut self, id: &str) {
        if let Some(idx) = self.store.widgets().iter().position(|w| w.id == id) {
            self.focus = idx;
        }
    }

    pub fn clamp_focus(&mut self) {
        self.focus = self.focus.min(self.store.widgets().len().saturating_sub(1));
    }

    pub fn grid_columns(&self) -> u16 {
        if self.store.settings().compact_mode {
            4
        } else {
            3
        }
    }

    /// Recompute grid coordinates after a structural change.
    pub fn relayout(&mut self) {
        let layout = flow_layout(self.store.widgets(), self.grid_columns());
        self.store.update_layout(layout);
        self.tables.retain(|id, _| self.store.widget(id).is_some());
        self.clamp_focus();
        self.dirty = true;
    }

    pub fn table_view(&self, id: &str) -> TableView {
        self.tables.get(id).cloned().unwrap_or_default()
    }

    pub fn table_view_mut(&mut self, id: &str) -> &mut TableView {
        self.tables.entry(id.to_string()).or_default()
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some((text.into(), StatusLevel::Info));
        self.dirty = true;
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status_message = Some((text.into(), StatusLevel::Error));
        self.dirty = true;
    }

    /// Reconcile feeds with the store and turn due feeds into fetches.
    pub fn collect_due(&mut self, now: Instant) -> Vec<Action> {
        self.scheduler
            .sync(self.store.widgets(), self.store.settings(), now);
        self.scheduler
            .due(self.store.widgets(), now)
            .into_iter()
            .map(Action::Fetch)
            .collect()
    }

    pub fn health_due(&mut self, now: Instant) -> bool {
        if now < self.next_health_check {
            return false;
        }
        let every = Duration::from_secs(self.config.refresh.health_interval_secs.max(1))
            .min(MAX_REFRESH_INTERVAL);
        self.next_health_check = now + every;
        true
    }

    pub fn import_from_str(&mut self, raw: &str) {
        match self.store.import_dashboard(raw) {
            Ok(()) => {
                self.tables.clear();
                self.focus = 0;
                let count = self.store.widgets().len();
                self.set_status(format!("Imported {} widgets", count));
            }
            Err(e) => self.set_error(format!("Import failed: {}", e)),
        }
    }

    /// Apply one step of the settings overlay to `row`. `forward` picks the
    /// next value for cycling rows.
    pub fn adjust_setting(&mut self, row: SettingsRow, forward: bool) {
        let settings = self.store.settings().clone();
        let patch = match row {
            SettingsRow::Theme => {
                let order = [Theme::Light, Theme::Dark, Theme::System];
                let idx = order.iter().position(|t| *t == settings.theme).unwrap_or(0);
                let next = (if forward { idx + 1 } else { idx + order.len() - 1 }) % order.len();
                SettingsPatch {
                    theme: Some(order[next]),
                    ..Default::default()
                }
            }
            SettingsRow::RefreshInterval => {
                let idx = REFRESH_INTERVALS_MS
                    .iter()
                    .position(|ms| *ms == settings.refresh_interval)
                    .unwrap_or(1);
                let len = REFRESH_INTERVALS_MS.len();
                let next = (if forward { idx + 1 } else { idx + len - 1 }) % len;
                SettingsPatch {
                    refresh_interval: Some(REFRESH_INTERVALS_MS[next]),
                    ..Default::default()
                }
            }
            SettingsRow::AutoRefresh => SettingsPatch {
                auto_refresh: Some(!settings.auto_refresh),
                ..Default::default()
            },
            SettingsRow::CompactMode => SettingsPatch {
                compact_mode: Some(!settings.compact_mode),
                ..Default::default()
            },
        };
        self.store.update_settings(patch);
        if row == SettingsRow::CompactMode {
            self.relayout();
        }
        self.dirty = true;
    }

    pub fn setting_value(&self, row: SettingsRow) -> String {
        let settings = self.store.settings();
        let on_off = |b: bool| (if b { "on" } else { "off" }).to_string();
        match row {
            SettingsRow::Theme => settings.theme.to_string(),
            SettingsRow::RefreshInterval => interval_label(settings.refresh_interval),
            SettingsRow::AutoRefresh => on_off(settings.auto_refresh),
            SettingsRow::CompactMode => on_off(settings.compact_mode),
        }
    }

    pub fn status_line(&self) -> String {
        if let Some((ref msg, _)) = self.status_message {
            return msg.clone();
        }
        let saved = chrono::DateTime::from_timestamp_millis(self.store.last_saved())
            .map(|t| {
                t.with_timezone(&Local)
                    .format(&self.config.ui.timestamp_format)
                    .to_string()
            })
            .unwrap_or_else(|| "-".to_string());
        format!("Widgets: {} | Saved {}", self.store.widgets().len(), saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::persist::MemoryStorage;
    use crate::store::widget::{WidgetDraft, WidgetKind};

    fn state() -> AppState {
        let store = DashboardStore::open(Box::new(MemoryStorage::new()));
        AppState::new(AppConfig::default(), store)
    }

    #[test]
    fn test_input_editing() {
        let mut input = InputState::new();
        for c in "/adé".chars() {
            input.insert_char(c);
        }
        input.move_left();
        input.delete_forward();
        assert_eq!(input.text, "/ad");
        input.move_home();
        input.move_right();
        input.delete_back();
        assert_eq!(input.text, "ad");
        input.move_end();
        assert_eq!(input.take_text(), "ad");
        assert!(input.text.is_empty());
    }

    #[test]
    fn test_input_history() {
        let mut input = InputState::new();
        input.text = "/refresh".into();
        input.take_text();
        input.text = "/help".into();
        input.take_text();
        input.history_up();
        assert_eq!(input.text, "/help");
        input.history_up();
        assert_eq!(input.text, "/refresh");
        input.history_down();
        input.history_down();
        assert!(input.text.is_empty());
    }

    #[test]
    fn test_focus_wraps() {
        let mut state = state();
        state.move_focus(-1);
        assert_eq!(state.focus, 2);
        state.move_focus(1);
        assert_eq!(state.focus, 0);
    }

    #[test]
    fn test_relayout_uses_compact_columns() {
        let mut state = state();
        state.relayout();
        // market overview spans two of three columns
        assert_eq!(state.store.layout()["default-3"].y, 1);
        state.adjust_setting(SettingsRow::CompactMode, true);
        assert_eq!(state.grid_columns(), 4);
        assert_eq!(state.store.layout()["default-3"].y, 0);
    }

    #[test]
    fn test_adjust_settings_cycle() {
        let mut state = state();
        state.adjust_setting(SettingsRow::Theme, true);
        assert_eq!(state.store.settings().theme, Theme::Light);
        state.adjust_setting(SettingsRow::Theme, false);
        assert_eq!(state.store.settings().theme, Theme::System);

        state.adjust_setting(SettingsRow::RefreshInterval, true);
        assert_eq!(state.store.settings().refresh_interval, 300_000);
        state.adjust_setting(SettingsRow::RefreshInterval, false);
        state.adjust_setting(SettingsRow::RefreshInterval, false);
        assert_eq!(state.store.settings().refresh_interval, 30_000);

        state.adjust_setting(SettingsRow::AutoRefresh, true);
        assert_eq!(state.setting_value(SettingsRow::AutoRefresh), "off");
    }

    #[test]
    fn test_health_due_schedules_next() {
        let mut state = state();
        let now = Instant::now();
        assert!(state.health_due(now));
        assert!(!state.health_due(now + Duration::from_secs(299)));
        assert!(state.health_due(now + Duration::from_secs(300)));

        state.config.refresh.health_interval_secs = u64::MAX;
        let later = now + Duration::from_secs(600);
        assert!(state.health_due(later));
        assert!(!state.health_due(later + Duration::from_secs(3600)));
    }

    #[test]
    fn test_import_reports_status() {
        let mut state = state();
        state.import_from_str("{}");
        assert!(matches!(state.status_message, Some((_, StatusLevel::Error))));

        let exported = state.store.export_dashboard().unwrap();
        state.store.add_widget(WidgetDraft::from_kind(WidgetKind::Chart));
        state.import_from_str(&exported);
        assert_eq!(state.store.widgets().len(), 3);
        assert!(matches!(state.status_message, Some((_, StatusLevel::Info))));
    }
}
