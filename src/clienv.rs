use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvVar {
    TstatsConfigDir,
    TstatsApiUrl,
    TstatsLocale,
    TstatsDebug,
    TstatsLog,
}

impl EnvVar {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TstatsConfigDir => "TSTATS_CONFIG_DIR",
            Self::TstatsApiUrl => "TSTATS_API_URL",
            Self::TstatsLocale => "TSTATS_LOCALE",
            Self::TstatsDebug => "TSTATS_DEBUG",
            Self::TstatsLog => "TSTATS_LOG",
        }
    }
}

const FALLBACK_CONFIG_DIR: &str = "~/.config";
const TSTATS_SUBDIR: &str = "tstats";

/// Non-empty value of an environment variable.
fn env_opt(var: EnvVar) -> Option<String> {
    std::env::var(var.as_str())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// tstats config directory ($TSTATS_CONFIG_DIR or ~/.config/tstats)
pub fn config_dir() -> PathBuf {
    let dir = env_opt(EnvVar::TstatsConfigDir)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_DIR))
                .join(TSTATS_SUBDIR)
        });
    tracing::trace!(dir = %dir.display(), "Resolved config directory");
    dir
}

/// Translation service override ($TSTATS_API_URL)
pub fn api_url() -> Option<String> {
    let val = env_opt(EnvVar::TstatsApiUrl);
    tracing::trace!(value = ?val, "TSTATS_API_URL env var");
    val
}

/// Default locale override ($TSTATS_LOCALE)
pub fn locale() -> Option<String> {
    let val = env_opt(EnvVar::TstatsLocale);
    tracing::trace!(value = ?val, "TSTATS_LOCALE env var");
    val
}

/// Debug output from env var ($TSTATS_DEBUG)
pub fn debug_env() -> Option<bool> {
    let val = env_opt(EnvVar::TstatsDebug).map(|v| is_truthy(&v));
    tracing::trace!(value = ?val, "TSTATS_DEBUG env var");
    val
}

/// Log filter directives ($TSTATS_LOG)
pub fn log_filter() -> Option<String> {
    env_opt(EnvVar::TstatsLog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(is_truthy(value), "{value:?}");
        }
        for value in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(value), "{value:?}");
        }
    }

    #[test]
    fn env_names_are_prefixed() {
        for var in [
            EnvVar::TstatsConfigDir,
            EnvVar::TstatsApiUrl,
            EnvVar::TstatsLocale,
            EnvVar::TstatsDebug,
            EnvVar::TstatsLog,
        ] {
            assert!(var.as_str().starts_with("TSTATS_"));
        }
    }
}
