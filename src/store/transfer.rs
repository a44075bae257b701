//! Export documents and import validation.

use crate::store::layout::LayoutMap;
use crate::store::settings::{DashboardSettings, SettingsPatch};
use crate::store::widget::{Widget, WidgetKind};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("not valid JSON: {0}")]
    Parse(String),
    #[error("missing widgets array")]
    MissingWidgets,
    #[error("widget {index}: {reason}")]
    InvalidWidget { index: usize, reason: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub widgets: &'a [Widget],
    pub settings: &'a DashboardSettings,
    pub layout: &'a LayoutMap,
    pub exported_at: String,
    pub version: &'static str,
}

impl<'a> ExportDocument<'a> {
    pub fn new(widgets: &'a [Widget], settings: &'a DashboardSettings, layout: &'a LayoutMap) -> Self {
        Self {
            widgets,
            settings,
            layout,
            exported_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            version: EXPORT_VERSION,
        }
    }
}

/// A validated import, ready to replace store state.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDashboard {
    pub widgets: Vec<Widget>,
    pub settings: DashboardSettings,
    pub layout: LayoutMap,
}

/// Validate an exported document. Every widget must be well formed; any
/// failure rejects the whole document.
pub fn validate_import(raw: &str) -> Result<ImportedDashboard, ImportError> {
    let doc: Value = serde_json::from_str(raw).map_err(|e| ImportError::Parse(e.to_string()))?;

    let entries = doc
        .get("widgets")
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingWidgets)?;

    let mut seen = HashSet::new();
    let mut widgets = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let widget = check_widget(entry).map_err(|reason| ImportError::InvalidWidget { index, reason })?;
        if !seen.insert(widget.id.clone()) {
            return Err(ImportError::InvalidWidget {
                index,
                reason: format!("duplicate id '{}'", widget.id),
            });
        }
        widgets.push(widget);
    }

    let settings = match doc.get("settings") {
        None | Some(Value::Null) => DashboardSettings::default(),
        Some(value) => {
            let patch: SettingsPatch = serde_json::from_value(value.clone())
                .map_err(|e| ImportError::Parse(format!("settings: {}", e)))?;
            DashboardSettings::merged_over_defaults(patch)
        }
    };

    let layout = match doc.get("layout") {
        None | Some(Value::Null) => LayoutMap::new(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ImportError::Parse(format!("layout: {}", e)))?,
    };

    Ok(ImportedDashboard {
        widgets,
        settings,
        layout,
    })
}

fn check_widget(entry: &Value) -> Result<Widget, String> {
    let obj = entry.as_object().ok_or("not an object")?;

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or("id must be a non-empty string")?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("type must be a string")?;
    let kind = WidgetKind::ALL
        .iter()
        .copied()
        .find(|k| k.tag() == kind)
        .ok_or_else(|| format!("unknown type '{}'", kind))?;
    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .ok_or("title must be a non-empty string")?;
    let active = obj
        .get("active")
        .and_then(Value::as_bool)
        .ok_or("active must be a boolean")?;
    let config = match obj.get("config") {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => return Err("config is required".into()),
        Some(_) => return Err("config must be an object".into()),
    };

    Ok(Widget {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        config,
        active,
    })
}
