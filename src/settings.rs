//! Plugin settings: where translations come from and which projects to keep updated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::DownloadConfig;
use crate::error::StoreError;
use crate::project::{Project, ProjectKind, DEFAULT_API_URL};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Translation service base URL
    pub api_url: String,
    /// Locale used when none is given (e.g., "pt_PT")
    pub locale: Option<String>,
    /// Directory receiving translation files
    pub destination: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    /// Show debug information after each command
    pub debug: bool,
    pub projects: BTreeMap<String, ProjectSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            locale: None,
            destination: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            debug: false,
            projects: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
            ..DownloadConfig::default()
        }
    }

    /// Enabled projects, in slug order.
    pub fn enabled_projects(&self) -> Vec<Project> {
        self.projects
            .iter()
            .filter(|(_, project)| project.enabled)
            .map(|(slug, project)| project.to_project(slug))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub enabled: bool,
    pub kind: ProjectKind,
    pub subproject: Option<String>,
    /// Text domain; defaults to the project slug
    pub domain: Option<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: ProjectKind::Plugin,
            subproject: None,
            domain: None,
        }
    }
}

impl ProjectSettings {
    pub fn to_project(&self, slug: &str) -> Project {
        let project = match self.kind {
            ProjectKind::Plugin => Project::plugin(slug),
            ProjectKind::Theme => Project::theme(slug),
        };
        let project = match &self.subproject {
            Some(subproject) => project.with_subproject(subproject),
            None => project,
        };
        match &self.domain {
            Some(domain) => project.with_domain(domain),
            None => project,
        }
    }
}

/// Where settings are kept.
pub trait SettingsStore {
    fn load(&self) -> Result<Settings, StoreError>;
    fn save(&self, settings: &Settings) -> Result<(), StoreError>;
    /// Human-readable location, for debug output.
    fn location(&self) -> String;
}

/// Settings stored as a TOML file.
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Settings, StoreError> {
        tracing::trace!(path = %self.path.display(), "Loading settings");

        if !self.path.exists() {
            tracing::trace!("Settings file does not exist, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|source| StoreError::SettingsParse {
            path: self.path.clone(),
            source,
        })?;

        tracing::trace!(api_url = %settings.api_url, projects = settings.projects.len(), "Settings loaded");
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        tracing::trace!(path = %self.path.display(), "Saving settings");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(settings)?;
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::trace!("Settings saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
