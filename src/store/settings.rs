use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Refresh intervals offered by the settings menu, in milliseconds.
pub const REFRESH_INTERVALS_MS: [u64; 4] = [30_000, 60_000, 300_000, 600_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    pub theme: Theme,
    /// Milliseconds between automatic refreshes.
    pub refresh_interval: u64,
    pub auto_refresh: bool,
    pub compact_mode: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            refresh_interval: 60_000,
            auto_refresh: true,
            compact_mode: false,
        }
    }
}

impl DashboardSettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(interval) = patch.refresh_interval {
            self.refresh_interval = interval;
        }
        if let Some(auto) = patch.auto_refresh {
            self.auto_refresh = auto;
        }
        if let Some(compact) = patch.compact_mode {
            self.compact_mode = compact;
        }
    }

    /// Defaults overlaid with whatever the patch supplies.
    pub fn merged_over_defaults(patch: SettingsPatch) -> Self {
        let mut settings = Self::default();
        settings.apply(patch);
        settings
    }

    /// Effective periodic interval, `None` when auto-refresh is off.
    pub fn auto_refresh_ms(&self) -> Option<u64> {
        (self.auto_refresh && self.refresh_interval > 0).then_some(self.refresh_interval)
    }
}

/// Shallow partial of [`DashboardSettings`]. Also the shape older
/// persisted blobs and imports are read with, so missing fields are fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact_mode: Option<bool>,
}

/// Parse a menu label like `30s`, `1m`, `5m`, `10m` (or raw millis) into
/// milliseconds.
pub fn parse_interval(label: &str) -> Option<u64> {
    let label = label.trim().to_lowercase();
    let ms = if let Some(secs) = label.strip_suffix('s') {
        secs.parse::<u64>().ok()?.checked_mul(1000)?
    } else if let Some(mins) = label.strip_suffix('m') {
        mins.parse::<u64>().ok()?.checked_mul(60_000)?
    } else {
        label.parse::<u64>().ok()?
    };
    (ms > 0).then_some(ms)
}

pub fn interval_label(ms: u64) -> String {
    if ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_serialize_camel_case() {
        let value = serde_json::to_value(DashboardSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "theme": "system",
                "refreshInterval": 60000,
                "autoRefresh": true,
                "compactMode": false
            })
        );
    }

    #[test]
    fn test_patch_merges_shallowly() {
        let mut settings = DashboardSettings::default();
        settings.apply(SettingsPatch {
            theme: Some(Theme::Dark),
            compact_mode: Some(true),
            ..Default::default()
        });
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.compact_mode);
        assert_eq!(settings.refresh_interval, 60_000);
        assert!(settings.auto_refresh);
    }

    #[test]
    fn test_partial_json_reads_as_patch() {
        let patch: SettingsPatch = serde_json::from_value(json!({ "theme": "light" })).unwrap();
        let settings = DashboardSettings::merged_over_defaults(patch);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.refresh_interval, 60_000);
    }

    #[test]
    fn test_auto_refresh_ms() {
        let mut settings = DashboardSettings::default();
        assert_eq!(settings.auto_refresh_ms(), Some(60_000));
        settings.auto_refresh = false;
        assert_eq!(settings.auto_refresh_ms(), None);
    }

    #[test]
    fn test_interval_labels() {
        assert_eq!(parse_interval("30s"), Some(30_000));
        assert_eq!(parse_interval("1m"), Some(60_000));
        assert_eq!(parse_interval("10M"), Some(600_000));
        assert_eq!(parse_interval("300000"), Some(300_000));
        assert_eq!(parse_interval("0s"), None);
        assert_eq!(parse_interval("soon"), None);
        for ms in REFRESH_INTERVALS_MS {
            assert_eq!(parse_interval(&interval_label(ms)), Some(ms));
        }
        assert_eq!(interval_label(30_000), "30s");
    }

    #[test]
    fn test_interval_overflow_is_rejected() {
        assert_eq!(parse_interval("18446744073709552s"), None);
        assert_eq!(parse_interval("307445734561826m"), None);
        assert_eq!(parse_interval("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_interval("18446744073709551616"), None);
    }
}
