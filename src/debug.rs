//! Operational debug report: runtime, settings and cached entries.

use serde::Serialize;
use std::fmt::Write as _;

use crate::cache::{CacheEntry, CacheStore, KEY_PREFIX};
use crate::error::StoreError;
use crate::settings::{Settings, SettingsStore};

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeInfo {
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

impl RuntimeInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    pub runtime: RuntimeInfo,
    pub settings_location: String,
    pub settings: Settings,
    pub cache: Vec<CacheEntry>,
}

impl DebugReport {
    pub fn collect(settings: &dyn SettingsStore, cache: &dyn CacheStore) -> Result<Self, StoreError> {
        Ok(Self {
            runtime: RuntimeInfo::current(),
            settings_location: settings.location(),
            settings: settings.load()?,
            cache: cache.list(KEY_PREFIX)?,
        })
    }

    /// Plain-text rendering with one section per source.
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Runtime");
        let _ = writeln!(out, "  tstats version: {}", self.runtime.version);
        let _ = writeln!(out, "  Platform: {}-{}", self.runtime.arch, self.runtime.os);

        let _ = writeln!(out, "\nSettings ({})", self.settings_location);
        match toml::to_string_pretty(&self.settings) {
            Ok(settings) => {
                for line in settings.lines().filter(|line| !line.is_empty()) {
                    let _ = writeln!(out, "  {line}");
                }
            }
            Err(e) => {
                let _ = writeln!(out, "  <unavailable: {e}>");
            }
        }

        let _ = writeln!(out, "\nCache ({} entries)", self.cache.len());
        for entry in &self.cache {
            let expires = entry
                .expires_at
                .map(|at| format!("expires at {at}"))
                .unwrap_or_else(|| "no expiry".to_string());
            let _ = writeln!(out, "  {} ({expires})", entry.key);
            let _ = writeln!(out, "    {}", entry.value);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FsCacheStore;
    use crate::settings::TomlSettingsStore;
    use serde_json::json;

    #[test]
    fn report_lists_settings_and_prefixed_cache() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TomlSettingsStore::new(dir.path().join("settings.toml"));
        settings
            .save(&Settings {
                locale: Some("pt_PT".into()),
                ..Settings::default()
            })
            .unwrap();
        let cache = FsCacheStore::new(dir.path().join("cache"));
        cache.set("tstats_update_akismet_pt_PT", json!({"success": true}), None).unwrap();
        cache.set("unrelated", json!(1), None).unwrap();

        let report = DebugReport::collect(&settings, &cache).unwrap();
        assert_eq!(report.cache.len(), 1);

        let text = report.render();
        assert!(text.contains("locale = \"pt_PT\""));
        assert!(text.contains("tstats_update_akismet_pt_PT (no expiry)"));
        assert!(!text.contains("unrelated"));
        assert!(text.contains(&format!("tstats version: {}", env!("CARGO_PKG_VERSION"))));
    }
}
