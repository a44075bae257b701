//! Persistent dashboard state: widgets, settings and layout.

pub mod layout;
pub mod persist;
pub mod reorder;
pub mod settings;
pub mod transfer;
pub mod widget;

use layout::LayoutMap;
use persist::{PersistedState, StateStorage};
use settings::{DashboardSettings, SettingsPatch};
use thiserror::Error;
use transfer::{ExportDocument, ImportError};
use widget::{default_widgets, generate_widget_id, Widget, WidgetDraft, WidgetUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("new order is not a permutation of the current widgets")]
    NotAPermutation,
    #[error("failed to persist dashboard: {0:#}")]
    Persist(anyhow::Error),
    #[error("failed to serialize export: {0}")]
    Export(#[from] serde_json::Error),
}

pub struct DashboardStore {
    storage: Box<dyn StateStorage>,
    widgets: Vec<Widget>,
    settings: DashboardSettings,
    layout: LayoutMap,
    last_saved: i64,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl DashboardStore {
    /// Load whatever the storage holds, falling back to the default
    /// dashboard when it is empty or unreadable.
    pub fn open(storage: Box<dyn StateStorage>) -> Self {
        let restored = match storage.load() {
            Ok(Some(raw)) => match persist::decode(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!(storage = %storage.describe(), "discarding stored dashboard: {:#}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(storage = %storage.describe(), "could not load dashboard: {:#}", e);
                None
            }
        };

        let state = restored.unwrap_or_else(|| {
            tracing::info!("starting with the default dashboard");
            PersistedState {
                widgets: default_widgets(),
                settings: DashboardSettings::default(),
                layout: LayoutMap::new(),
                last_saved: now_millis(),
            }
        });

        tracing::info!(
            widgets = state.widgets.len(),
            storage = %storage.describe(),
            "dashboard loaded"
        );

        Self {
            storage,
            widgets: state.widgets,
            settings: state.settings,
            layout: state.layout,
            last_saved: state.last_saved,
        }
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn layout(&self) -> &LayoutMap {
        &self.layout
    }

    pub fn last_saved(&self) -> i64 {
        self.last_saved
    }

    /// Append a widget and return its freshly generated id.
    pub fn add_widget(&mut self, draft: WidgetDraft) -> String {
        let mut id = generate_widget_id();
        while self.widget(&id).is_some() {
            id = generate_widget_id();
        }
        tracing::info!(id = %id, kind = %draft.kind, "widget added");
        self.widgets.push(draft.into_widget(id.clone()));
        self.touch();
        id
    }

    pub fn remove_widget(&mut self, id: &str) {
        let before = self.widgets.len();
        self.widgets.retain(|w| w.id != id);
        if self.widgets.len() == before {
            return;
        }
        self.layout.remove(id);
        tracing::info!(id = %id, "widget removed");
        self.touch();
    }

    pub fn update_widget(&mut self, id: &str, update: WidgetUpdate) {
        let Some(widget) = self.widgets.iter_mut().find(|w| w.id == id) else {
            return;
        };
        update.apply(widget);
        self.touch();
    }

    /// Replace the widget order. `widgets` must hold exactly the current
    /// ids; the stored widgets are rearranged to match.
    pub fn reorder_widgets(&mut self, widgets: Vec<Widget>) -> Result<(), StoreError> {
        let mut proposed: Vec<&str> = widgets.iter().map(|w| w.id.as_str()).collect();
        let mut current: Vec<&str> = self.widgets.iter().map(|w| w.id.as_str()).collect();
        proposed.sort_unstable();
        current.sort_unstable();
        if proposed != current {
            tracing::warn!(
                proposed = widgets.len(),
                current = self.widgets.len(),
                "rejected widget reorder"
            );
            return Err(StoreError::NotAPermutation);
        }

        let mut pool = std::mem::take(&mut self.widgets);
        for wanted in &widgets {
            if let Some(pos) = pool.iter().position(|w| w.id == wanted.id) {
                self.widgets.push(pool.swap_remove(pos));
            }
        }
        self.touch();
        Ok(())
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.settings.apply(patch);
        self.touch();
    }

    pub fn update_layout(&mut self, layout: LayoutMap) {
        self.layout = layout;
        self.touch();
    }

    pub fn export_dashboard(&self) -> Result<String, StoreError> {
        let doc = ExportDocument::new(&self.widgets, &self.settings, &self.layout);
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Replace the dashboard with an exported document. Nothing changes
    /// when the document is rejected.
    pub fn import_dashboard(&mut self, raw: &str) -> Result<(), ImportError> {
        let imported = transfer::validate_import(raw).inspect_err(|e| {
            tracing::warn!("import rejected: {}", e);
        })?;
        tracing::info!(widgets = imported.widgets.len(), "dashboard imported");
        self.widgets = imported.widgets;
        self.settings = imported.settings;
        self.layout = imported.layout;
        self.touch();
        Ok(())
    }

    pub fn reset_dashboard(&mut self) {
        self.widgets = default_widgets();
        self.settings = DashboardSettings::default();
        self.layout.clear();
        tracing::info!("dashboard reset");
        self.touch();
    }

    /// Stamp the current time and write through to storage.
    pub fn mark_saved(&mut self) -> Result<(), StoreError> {
        self.last_saved = now_millis().max(self.last_saved);
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let state = PersistedState {
            widgets: self.widgets.clone(),
            settings: self.settings.clone(),
            layout: self.layout.clone(),
            last_saved: self.last_saved,
        };
        let raw = persist::encode(&state).map_err(StoreError::Persist)?;
        self.storage.save(&raw).map_err(StoreError::Persist)
    }

    fn touch(&mut self) {
        if let Err(e) = self.mark_saved() {
            tracing::warn!(storage = %self.storage.describe(), "{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::persist::MemoryStorage;
    use crate::store::settings::Theme;
    use crate::store::widget::WidgetKind;
    use serde_json::json;
    use std::collections::HashSet;

    fn open_store() -> (DashboardStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        (DashboardStore::open(Box::new(storage.clone())), storage)
    }

    fn ids(store: &DashboardStore) -> Vec<String> {
        store.widgets().iter().map(|w| w.id.clone()).collect()
    }

    struct BrokenStorage;

    impl StateStorage for BrokenStorage {
        fn load(&self) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk on fire")
        }
        fn save(&self, _contents: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn test_opens_with_defaults() {
        let (store, storage) = open_store();
        assert_eq!(ids(&store), vec!["default-1", "default-2", "default-3"]);
        assert_eq!(store.settings(), &DashboardSettings::default());
        assert!(store.layout().is_empty());
        // nothing is written until the first mutation
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_added_ids_are_distinct() {
        let (mut store, _) = open_store();
        let mut seen: HashSet<String> = ids(&store).into_iter().collect();
        for _ in 0..50 {
            let id = store.add_widget(WidgetDraft::from_kind(WidgetKind::Gainers));
            assert!(seen.insert(id));
        }
        assert_eq!(store.widgets().len(), 53);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let (mut store, _) = open_store();
        store.update_layout(layout::flow_layout(store.widgets(), 3));
        store.remove_widget("default-2");
        let after_first = ids(&store);
        store.remove_widget("default-2");
        assert_eq!(ids(&store), after_first);
        assert_eq!(after_first, vec!["default-1", "default-3"]);
        assert!(!store.layout().contains_key("default-2"));
    }

    #[test]
    fn test_update_never_changes_id() {
        let (mut store, _) = open_store();
        store.update_widget(
            "default-1",
            WidgetUpdate {
                title: Some("Indices".into()),
                active: Some(false),
                ..Default::default()
            },
        );
        let widget = store.widget("default-1").unwrap();
        assert_eq!(widget.title, "Indices");
        assert!(!widget.active);
        assert_eq!(widget.kind, WidgetKind::MarketOverview);

        let before = store.last_saved();
        store.update_widget("missing", WidgetUpdate::title("x"));
        assert_eq!(store.last_saved(), before);
    }

    #[test]
    fn test_reorder_permutation() {
        let (mut store, _) = open_store();
        let mut reversed = store.widgets().to_vec();
        reversed.reverse();
        store.reorder_widgets(reversed).unwrap();
        assert_eq!(ids(&store), vec!["default-3", "default-2", "default-1"]);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let (mut store, _) = open_store();
        let original = ids(&store);

        let mut short = store.widgets().to_vec();
        short.pop();
        assert!(matches!(store.reorder_widgets(short), Err(StoreError::NotAPermutation)));

        let mut duplicated = store.widgets().to_vec();
        duplicated[2] = duplicated[0].clone();
        assert!(store.reorder_widgets(duplicated).is_err());

        let mut foreign = store.widgets().to_vec();
        foreign[1].id = "stranger".into();
        assert!(store.reorder_widgets(foreign).is_err());

        assert_eq!(ids(&store), original);
    }

    #[test]
    fn test_export_import_round_trip() {
        let (mut store, _) = open_store();
        store.add_widget(WidgetDraft::from_kind(WidgetKind::Chart).with_config("symbol", json!("TSLA")));
        store.update_settings(SettingsPatch {
            theme: Some(Theme::Dark),
            refresh_interval: Some(300_000),
            ..Default::default()
        });
        let exported = store.export_dashboard().unwrap();

        let (mut other, _) = open_store();
        other.import_dashboard(&exported).unwrap();
        assert_eq!(other.widgets(), store.widgets());
        assert_eq!(other.settings(), store.settings());
    }

    #[test]
    fn test_export_errors_surface() {
        let (store, _) = open_store();
        let exported = store.export_dashboard().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert!(doc["widgets"].as_array().is_some_and(|w| !w.is_empty()));

        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StoreError::from(bad);
        assert!(matches!(err, StoreError::Export(_)));
        assert!(err.to_string().starts_with("failed to serialize export"));
    }

    #[test]
    fn test_malformed_import_leaves_state() {
        let (mut store, _) = open_store();
        store.add_widget(WidgetDraft::from_kind(WidgetKind::Losers));
        let widgets = store.widgets().to_vec();
        let settings = store.settings().clone();

        assert!(store.import_dashboard("definitely not json").is_err());
        assert!(store.import_dashboard(r#"{"settings": {}}"#).is_err());
        assert!(store
            .import_dashboard(r#"{"widgets": [{"id": "a", "type": "chart"}]}"#)
            .is_err());

        assert_eq!(store.widgets(), widgets.as_slice());
        assert_eq!(store.settings(), &settings);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (mut store, _) = open_store();
        store.remove_widget("default-1");
        store.update_settings(SettingsPatch {
            compact_mode: Some(true),
            ..Default::default()
        });
        store.update_layout(layout::flow_layout(store.widgets(), 4));
        store.reset_dashboard();
        assert_eq!(store.widgets(), default_widgets().as_slice());
        assert_eq!(store.settings(), &DashboardSettings::default());
        assert!(store.layout().is_empty());
    }

    #[test]
    fn test_state_survives_reopen() {
        let (mut store, storage) = open_store();
        let id = store.add_widget(WidgetDraft::from_kind(WidgetKind::Portfolio));
        store.update_settings(SettingsPatch {
            auto_refresh: Some(false),
            ..Default::default()
        });
        let saved = store.last_saved();
        drop(store);

        let reopened = DashboardStore::open(Box::new(storage));
        assert!(reopened.widget(&id).is_some());
        assert!(!reopened.settings().auto_refresh);
        assert_eq!(reopened.last_saved(), saved);
    }

    #[test]
    fn test_corrupt_storage_falls_back() {
        let storage = MemoryStorage::with_contents("{\"state\": 7}");
        let store = DashboardStore::open(Box::new(storage));
        assert_eq!(store.widgets(), default_widgets().as_slice());
    }

    #[test]
    fn test_persist_failure_still_applies() {
        let mut store = DashboardStore::open(Box::new(BrokenStorage));
        store.remove_widget("default-3");
        assert_eq!(ids(&store), vec!["default-1", "default-2"]);
        assert!(matches!(store.mark_saved(), Err(StoreError::Persist(_))));
    }
}
