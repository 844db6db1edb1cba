//! In-memory translation catalog and the steps that move it between disk formats.
//!
//! A [`Catalog`] is built once by [`parser::parse`] from a written `.po` file and
//! handed by value to [`compiler::compile`], which turns it into the `.mo` and JSON
//! payloads. All file names come from [`paths`].

pub mod compiler;
pub mod parser;
pub mod paths;
pub mod writer;

/// Separator between context and message id in compiled keys.
pub const CONTEXT_SEPARATOR: char = '\u{4}';

/// One translatable message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    /// A single translation for singular entries, one per plural form otherwise.
    pub translations: Vec<String>,
    pub fuzzy: bool,
    /// Source references (`path/to/file.js:12`).
    pub references: Vec<String>,
}

impl Entry {
    pub fn singular(msgid: &str, translation: &str) -> Self {
        Self {
            msgid: msgid.to_string(),
            translations: vec![translation.to_string()],
            ..Self::default()
        }
    }

    /// Usable at runtime: not fuzzy and every form has a translation.
    pub fn is_translated(&self) -> bool {
        !self.fuzzy
            && !self.translations.is_empty()
            && self.translations.iter().all(|t| !t.is_empty())
    }

    /// Lookup key: `msgid`, or `context \x04 msgid` when a context is set.
    pub fn key(&self) -> String {
        match &self.context {
            Some(context) => format!("{context}{CONTEXT_SEPARATOR}{}", self.msgid),
            None => self.msgid.clone(),
        }
    }
}

/// Parsed catalog. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    headers: String,
    entries: Vec<Entry>,
}

impl Catalog {
    /// `headers` is the header entry text: `Name: value` lines separated by `\n`.
    pub fn new(headers: String, entries: Vec<Entry>) -> Self {
        Self { headers, entries }
    }

    pub fn headers(&self) -> &str {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
                .filter(|value| !value.is_empty())
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn translated(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| entry.is_translated())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let catalog = Catalog::new(
            "Language: pt_PT\nPlural-Forms: nplurals=2; plural=n != 1;\nX-Empty: \n".into(),
            Vec::new(),
        );
        assert_eq!(catalog.header("language"), Some("pt_PT"));
        assert_eq!(
            catalog.header("Plural-Forms"),
            Some("nplurals=2; plural=n != 1;")
        );
        assert_eq!(catalog.header("X-Empty"), None);
        assert_eq!(catalog.header("Missing"), None);
    }

    #[test]
    fn context_is_part_of_key() {
        let mut entry = Entry::singular("Post", "Artigo");
        assert_eq!(entry.key(), "Post");
        entry.context = Some("noun".into());
        assert_eq!(entry.key(), "noun\u{4}Post");
    }

    #[test]
    fn fuzzy_and_partial_entries_are_untranslated() {
        let mut entry = Entry::singular("Hello", "Olá");
        assert!(entry.is_translated());
        entry.fuzzy = true;
        assert!(!entry.is_translated());

        let partial = Entry {
            msgid: "%d file".into(),
            msgid_plural: Some("%d files".into()),
            translations: vec!["%d ficheiro".into(), String::new()],
            ..Entry::default()
        };
        assert!(!partial.is_translated());
        assert!(!Entry::singular("Hello", "").is_translated());
    }
}
