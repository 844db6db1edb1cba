use std::path::PathBuf;
use thiserror::Error;

/// Failure of one step of the translation update pipeline.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Unknown locale {0:?}.")]
    LocaleResolution(String),

    #[error("Invalid project {field} {value:?}. It must be a single path segment.")]
    InvalidProject { field: &'static str, value: String },

    #[error("Download failed. {0}")]
    Download(String),

    #[error("Could not create file {}: {source}", target.display())]
    Write {
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not extract translations from file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Update cancelled.")]
    Cancelled,

    #[error("Update timed out.")]
    TimedOut,
}

impl UpdateError {
    /// Stable machine-readable kind, safe to match on and to persist.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocaleResolution(_) => "locale-resolution-error",
            Self::InvalidProject { .. } => "invalid-project-error",
            Self::Download(_) => "download-error",
            Self::Write { .. } => "write-error",
            Self::Parse { .. } => "parse-error",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed-out",
        }
    }

    pub(crate) fn write(target: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            target: target.into(),
            source,
        }
    }
}

/// Errors raised by the settings and cache stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings from {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),

    #[error("Invalid cache entry {key}: {source}")]
    CacheEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid cache key {0:?}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
