use serde::{Deserialize, Serialize};

use crate::error::UpdateError;
use crate::locale::Locale;

pub const DEFAULT_API_URL: &str = "https://translate.wordpress.org";
const DEFAULT_SUBPROJECT: &str = "stable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    #[default]
    Plugin,
    Theme,
}

/// A translatable project on the translation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    #[serde(default)]
    pub kind: ProjectKind,
    /// Plugin sub-project, `stable` or `dev`. Ignored for themes.
    #[serde(default = "default_subproject")]
    pub subproject: String,
    /// Text domain, used as the file name prefix. Empty means no prefix.
    #[serde(default)]
    pub domain: String,
}

fn default_subproject() -> String {
    DEFAULT_SUBPROJECT.to_string()
}

impl Project {
    pub fn plugin(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            kind: ProjectKind::Plugin,
            subproject: default_subproject(),
            domain: slug.to_string(),
        }
    }

    pub fn theme(slug: &str) -> Self {
        Self {
            kind: ProjectKind::Theme,
            ..Self::plugin(slug)
        }
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    pub fn with_subproject(mut self, subproject: &str) -> Self {
        self.subproject = subproject.to_string();
        self
    }

    /// Slug, sub-project and domain end up in URL segments and file names.
    pub fn validate(&self) -> Result<(), UpdateError> {
        if self.slug.is_empty() {
            return Err(UpdateError::InvalidProject {
                field: "slug",
                value: String::new(),
            });
        }
        for (field, value) in [
            ("slug", &self.slug),
            ("subproject", &self.subproject),
            ("domain", &self.domain),
        ] {
            if !is_path_segment(value) {
                return Err(UpdateError::InvalidProject {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Export URL of the `.po` file for this project and locale.
    ///
    /// Example: `https://translate.wordpress.org/projects/wp-plugins/akismet/stable/pt/default/export-translations/?format=po`
    pub fn translation_path(&self, api_url: &str, locale: &Locale) -> String {
        let base = api_url.trim_end_matches('/');
        match self.kind {
            ProjectKind::Plugin => format!(
                "{}/projects/wp-plugins/{}/{}/{}/export-translations/?format=po",
                base, self.slug, self.subproject, locale.locale_slug
            ),
            ProjectKind::Theme => format!(
                "{}/projects/wp-themes/{}/{}/export-translations/?format=po",
                base, self.slug, locale.locale_slug
            ),
        }
    }
}

fn is_path_segment(value: &str) -> bool {
    !value.contains(['/', '\\']) && !value.contains("..")
}
