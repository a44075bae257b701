//! Durable storage of dashboard state.
//!
//! The blob is a versioned envelope, `{"state": {...}, "version": N}`.
//! Version 0 blobs predate some settings fields; loading one backfills
//! missing settings with defaults.

use crate::store::layout::LayoutMap;
use crate::store::settings::{DashboardSettings, SettingsPatch};
use crate::store::widget::{default_widgets, Widget};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const STORAGE_NAME: &str = "finboard-dashboard";
pub const SCHEMA_VERSION: u32 = 1;

/// Somewhere a serialized dashboard can live between runs.
pub trait StateStorage: Send {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, contents: &str) -> Result<()>;
    fn describe(&self) -> String;
}

/// JSON file at `<dir>/<name>.json`.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            path: dir.into().join(format!("{}.json", name)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl StateStorage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read dashboard state from {}", self.path.display()))?;
        Ok(Some(contents))
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
        }
        // the state file is replaced whole, never written in place
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write dashboard state to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move dashboard state into {}", self.path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local storage. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        *slot = Some(contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// The persisted subset of store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub widgets: Vec<Widget>,
    pub settings: DashboardSettings,
    pub layout: LayoutMap,
    /// Unix millis of the last mutation.
    pub last_saved: i64,
}

/// On-disk shape. Every field is optional so older blobs still parse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    widgets: Option<Vec<Widget>>,
    #[serde(default)]
    settings: Option<Value>,
    #[serde(default)]
    layout: Option<LayoutMap>,
    #[serde(default)]
    last_saved: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StoredEnvelope {
    state: StoredState,
    #[serde(default)]
    version: u32,
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    state: &'a PersistedState,
    version: u32,
}

pub fn encode(state: &PersistedState) -> Result<String> {
    serde_json::to_string(&EnvelopeOut {
        state,
        version: SCHEMA_VERSION,
    })
    .context("Failed to serialize dashboard state")
}

/// Parse a stored blob, migrating older schema versions. Fields the blob
/// lacks fall back to the initial state.
pub fn decode(raw: &str) -> Result<PersistedState> {
    let envelope: StoredEnvelope =
        serde_json::from_str(raw).context("Stored dashboard state is not valid JSON")?;
    let stored = envelope.state;

    if envelope.version > SCHEMA_VERSION {
        tracing::warn!(
            version = envelope.version,
            current = SCHEMA_VERSION,
            "stored dashboard state is newer than this build"
        );
    }

    let settings = match stored.settings {
        None => DashboardSettings::default(),
        Some(value) if envelope.version < SCHEMA_VERSION => {
            tracing::info!(from = envelope.version, to = SCHEMA_VERSION, "migrating dashboard settings");
            let patch: SettingsPatch =
                serde_json::from_value(value).context("Stored settings are malformed")?;
            DashboardSettings::merged_over_defaults(patch)
        }
        Some(value) => serde_json::from_value(value).context("Stored settings are malformed")?,
    };

    Ok(PersistedState {
        widgets: stored.widgets.unwrap_or_else(default_widgets),
        settings,
        layout: stored.layout.unwrap_or_default(),
        last_saved: stored
            .last_saved
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::settings::Theme;
    use serde_json::json;

    fn sample() -> PersistedState {
        PersistedState {
            widgets: default_widgets(),
            settings: DashboardSettings::default(),
            layout: LayoutMap::new(),
            last_saved: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_encode_decode() {
        let state = sample();
        let raw = encode(&state).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], json!(SCHEMA_VERSION));
        assert_eq!(value["state"]["lastSaved"], json!(1_700_000_000_000i64));
        assert_eq!(decode(&raw).unwrap(), state);
    }

    #[test]
    fn test_version_zero_backfills_settings() {
        let raw = json!({
            "state": {
                "widgets": [],
                "settings": { "theme": "dark" },
                "layout": {},
                "lastSaved": 5
            },
            "version": 0
        })
        .to_string();
        let state = decode(&raw).unwrap();
        assert_eq!(state.settings.theme, Theme::Dark);
        assert_eq!(state.settings.refresh_interval, 60_000);
        assert!(state.settings.auto_refresh);
        assert!(state.widgets.is_empty());
    }

    #[test]
    fn test_current_version_requires_full_settings() {
        let raw = json!({
            "state": { "settings": { "theme": "dark" } },
            "version": 1
        })
        .to_string();
        assert!(decode(&raw).is_err());
    }

    #[test]
    fn test_missing_fields_use_initial_state() {
        let raw = json!({ "state": {}, "version": 1 }).to_string();
        let state = decode(&raw).unwrap();
        assert_eq!(state.widgets, default_widgets());
        assert_eq!(state.settings, DashboardSettings::default());
        assert!(state.layout.is_empty());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode("not json").is_err());
        assert!(decode("{\"version\": 1}").is_err());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"), STORAGE_NAME);
        assert!(storage.load().unwrap().is_none());
        storage.save("{\"hello\":1}").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("{\"hello\":1}"));
        assert!(storage.path().ends_with("finboard-dashboard.json"));
    }

    #[test]
    fn test_memory_storage_clones_share_slot() {
        let storage = MemoryStorage::new();
        let view = storage.clone();
        storage.save("abc").unwrap();
        assert_eq!(view.contents().as_deref(), Some("abc"));
    }
}
