pub(crate) mod cache;
pub(crate) mod debug;
pub(crate) mod inspect;
pub(crate) mod locales;
pub(crate) mod update;

use std::path::Path;
use tstats::cache::FsCacheStore;
use tstats::settings::TomlSettingsStore;

const SETTINGS_FILE: &str = "settings.toml";
const CACHE_SUBDIR: &str = "cache";

/// Settings and cache stores rooted at one config directory.
pub(crate) struct Stores {
    pub settings: TomlSettingsStore,
    pub cache: FsCacheStore,
}

impl Stores {
    pub fn open(config_dir: &Path) -> Self {
        tracing::trace!(dir = %config_dir.display(), "Opening stores");
        Self {
            settings: TomlSettingsStore::new(config_dir.join(SETTINGS_FILE)),
            cache: FsCacheStore::new(config_dir.join(CACHE_SUBDIR)),
        }
    }
}
