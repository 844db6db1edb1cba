//! File naming for every artifact the pipeline reads or writes.
//!
//! Writer, parser and compiler all resolve their paths here so the three steps
//! can never disagree on where the catalog lives.

use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

use crate::locale::Locale;
use crate::project::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Po,
    Mo,
    Json,
}

impl FileKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Po => "po",
            Self::Mo => "mo",
            Self::Json => "json",
        }
    }
}

/// `{domain}-{wp_locale}` or `{wp_locale}` when the domain is empty.
fn stem(project: &Project, locale: &Locale) -> String {
    if project.domain.is_empty() {
        locale.wp_locale.clone()
    } else {
        format!("{}-{}", project.domain, locale.wp_locale)
    }
}

/// `myplugin-pt_PT.po`, `pt_PT.mo`, ...
pub fn file_name(project: &Project, locale: &Locale, kind: FileKind) -> String {
    format!("{}.{}", stem(project, locale), kind.extension())
}

pub fn file_path(destination: &Path, project: &Project, locale: &Locale, kind: FileKind) -> PathBuf {
    destination.join(file_name(project, locale, kind))
}

/// `{domain-}{wp_locale}-{md5(source)}.json` for translations used by one script.
pub fn script_json_file_name(project: &Project, locale: &Locale, source: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(source.as_bytes());
    format!("{}-{}.json", stem(project, locale), hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale;

    #[test]
    fn domain_prefixes_file_names() {
        let locale = locale::resolve("pt_PT").unwrap();
        let project = Project::plugin("my-plugin").with_domain("myplugin");
        assert_eq!(file_name(&project, &locale, FileKind::Po), "myplugin-pt_PT.po");
        assert_eq!(file_name(&project, &locale, FileKind::Mo), "myplugin-pt_PT.mo");
        assert_eq!(file_name(&project, &locale, FileKind::Json), "myplugin-pt_PT.json");
    }

    #[test]
    fn empty_domain_uses_bare_locale() {
        let locale = locale::resolve("pt_PT").unwrap();
        let project = Project::plugin("my-plugin").with_domain("");
        assert_eq!(file_name(&project, &locale, FileKind::Po), "pt_PT.po");
        assert_eq!(
            file_path(Path::new("/srv/languages"), &project, &locale, FileKind::Mo),
            PathBuf::from("/srv/languages/pt_PT.mo")
        );
    }

    #[test]
    fn script_json_name_hashes_source() {
        let locale = locale::resolve("pt_PT").unwrap();
        let project = Project::plugin("akismet");
        // md5("js/app.js")
        assert_eq!(
            script_json_file_name(&project, &locale, "js/app.js"),
            format!("akismet-pt_PT-{}.json", hex::encode(Md5::digest(b"js/app.js")))
        );
        assert_ne!(
            script_json_file_name(&project, &locale, "js/a.js"),
            script_json_file_name(&project, &locale, "js/b.js")
        );
    }
}
