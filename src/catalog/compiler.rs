//! Compile a parsed catalog into the files WordPress loads at runtime:
//! the binary `.mo` and the Jed-format JSON used by script translations.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::paths::{self, FileKind};
use super::writer;
use super::{Catalog, Entry};
use crate::error::Result;
use crate::locale::Locale;
use crate::mo;
use crate::project::Project;

const JED_DOMAIN: &str = "messages";
const GENERATOR: &str = concat!("tstats/", env!("CARGO_PKG_VERSION"));

/// A rendered output file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl CompiledFile {
    pub fn path(&self, destination: &Path) -> PathBuf {
        destination.join(&self.file_name)
    }

    pub async fn write(&self, destination: &Path) -> Result<PathBuf> {
        let path = self.path(destination);
        writer::write_file(&path, &self.contents).await?;
        Ok(path)
    }
}

/// Everything produced from one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCatalog {
    pub mo: CompiledFile,
    /// One file per script source, plus one for strings no script references.
    pub json: Vec<CompiledFile>,
}

/// Render the `.mo` and JSON payloads. Takes the catalog by value: it is not used again.
pub fn compile(catalog: Catalog, project: &Project, locale: &Locale) -> CompiledCatalog {
    let mo = CompiledFile {
        file_name: paths::file_name(project, locale, FileKind::Mo),
        contents: mo::encode(&mo::messages(&catalog)),
    };

    let plural_forms = catalog
        .header("Plural-Forms")
        .map(str::to_string)
        .unwrap_or_else(|| locale.plural_forms());
    let revision_date = catalog.header("PO-Revision-Date");

    let json = group_by_script(&catalog)
        .into_iter()
        .map(|(source, entries)| {
            let file_name = match &source {
                Some(source) => paths::script_json_file_name(project, locale, source),
                None => paths::file_name(project, locale, FileKind::Json),
            };
            let document = jed_document(source.as_deref(), &entries, locale, &plural_forms, revision_date);
            CompiledFile {
                file_name,
                contents: document.to_string().into_bytes(),
            }
        })
        .collect();

    tracing::debug!(
        entries = catalog.len(),
        translated = catalog.translated().count(),
        "Compiled catalog"
    );

    CompiledCatalog { mo, json }
}

/// Translated entries keyed by the script that uses them; `None` collects the rest.
fn group_by_script(catalog: &Catalog) -> BTreeMap<Option<String>, Vec<&Entry>> {
    let mut groups: BTreeMap<Option<String>, Vec<&Entry>> = BTreeMap::new();
    for entry in catalog.translated() {
        let mut scripts: Vec<String> = entry.references.iter().filter_map(|r| script_source(r)).collect();
        scripts.sort_unstable();
        scripts.dedup();

        if scripts.is_empty() {
            groups.entry(None).or_default().push(entry);
        } else {
            for script in scripts {
                groups.entry(Some(script)).or_default().push(entry);
            }
        }
    }
    groups
}

/// `src/app.min.js:12` → `src/app.js`. Non-script references yield `None`.
fn script_source(reference: &str) -> Option<String> {
    let path = match reference.rsplit_once(':') {
        Some((path, line)) if line.chars().all(|c| c.is_ascii_digit()) => path,
        _ => reference,
    };
    if let Some(base) = path.strip_suffix(".min.js") {
        return Some(format!("{base}.js"));
    }
    path.ends_with(".js").then(|| path.to_string())
}

fn jed_document(
    source: Option<&str>,
    entries: &[&Entry],
    locale: &Locale,
    plural_forms: &str,
    revision_date: Option<&str>,
) -> Value {
    let mut messages = Map::new();
    messages.insert(
        String::new(),
        json!({
            "domain": JED_DOMAIN,
            "lang": locale.wp_locale,
            "plural-forms": plural_forms,
        }),
    );
    for entry in entries {
        messages.insert(entry.key(), json!(entry.translations));
    }

    let mut document = Map::new();
    if let Some(date) = revision_date {
        document.insert("translation-revision-date".into(), json!(date));
    }
    document.insert("generator".into(), json!(GENERATOR));
    if let Some(source) = source {
        document.insert("source".into(), json!(source));
    }
    document.insert("domain".into(), json!(JED_DOMAIN));
    document.insert("locale_data".into(), json!({ JED_DOMAIN: messages }));
    Value::Object(document)
}
