//! Gettext `.po` reader.
//!
//! Line oriented and strict: every non-blank line must be a comment, a
//! keyword (`msgctxt`, `msgid`, `msgid_plural`, `msgstr`, `msgstr[N]`) or a
//! quoted continuation string. The first entry must be the header (empty
//! `msgid`, no context). Anything else is a [`SyntaxError`] carrying the line
//! number, so an HTML error page or a truncated download never turns into an
//! empty catalog.

use std::path::Path;
use thiserror::Error;

use super::paths::{self, FileKind};
use super::{Catalog, Entry};
use crate::error::{Result, UpdateError};
use crate::locale::Locale;
use crate::project::Project;

/// Highest `msgstr[N]` index accepted.
const MAX_PLURAL_FORMS: usize = 10;
const BOM: char = '\u{feff}';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parse the `.po` file previously saved for this project and locale.
pub fn parse(destination: &Path, project: &Project, locale: &Locale) -> Result<Catalog> {
    let path = paths::file_path(destination, project, locale, FileKind::Po);
    parse_file(&path)
}

pub fn parse_file(path: &Path) -> Result<Catalog> {
    tracing::debug!(path = %path.display(), "Parsing PO file");

    let parse_error = |reason: String| UpdateError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| parse_error(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| parse_error("file is not valid UTF-8".to_string()))?;
    let catalog = parse_str(&text).map_err(|e| parse_error(e.to_string()))?;

    tracing::debug!(entries = catalog.len(), "Parsed PO file");
    Ok(catalog)
}

/// Parse PO text into a catalog whose headers are the header entry's raw `msgstr`.
pub fn parse_str(text: &str) -> std::result::Result<Catalog, SyntaxError> {
    let mut reader = Reader::default();
    let text = text.strip_prefix(BOM).unwrap_or(text);

    for (index, line) in text.lines().enumerate() {
        reader.line = index + 1;
        reader.consume(line.trim())?;
    }
    reader.line += 1;
    reader.finish_entry()?;

    let headers = reader
        .headers
        .ok_or_else(|| SyntaxError::new(reader.line, "missing header entry (msgid \"\")"))?;
    Ok(Catalog::new(headers, reader.entries))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Field {
    #[default]
    None,
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Debug, Default)]
struct Pending {
    start_line: usize,
    context: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    translations: Vec<String>,
    has_msgstr: bool,
    fuzzy: bool,
    references: Vec<String>,
}

#[derive(Debug, Default)]
struct Reader {
    line: usize,
    field: Field,
    pending: Pending,
    headers: Option<String>,
    entries: Vec<Entry>,
}

impl Reader {
    fn consume(&mut self, line: &str) -> std::result::Result<(), SyntaxError> {
        if line.is_empty() {
            return self.finish_entry();
        }

        if let Some(comment) = line.strip_prefix('#') {
            if self.pending.has_msgstr {
                self.finish_entry()?;
            }
            self.field = Field::None;
            if let Some(references) = comment.strip_prefix(':') {
                self.pending
                    .references
                    .extend(references.split_whitespace().map(str::to_string));
            } else if let Some(flags) = comment.strip_prefix(',') {
                if flags.split(',').any(|flag| flag.trim() == "fuzzy") {
                    self.pending.fuzzy = true;
                }
            }
            return Ok(());
        }

        if line.starts_with('"') {
            let value = unquote(line, self.line)?;
            return self.append(&value);
        }

        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let known = matches!(keyword, "msgctxt" | "msgid" | "msgid_plural" | "msgstr")
            || plural_index(keyword).is_some();
        if !known {
            return Err(SyntaxError::new(
                self.line,
                format!("unexpected content {:?}", truncate(line)),
            ));
        }
        let value = unquote(rest, self.line)?;
        match keyword {
            "msgctxt" => {
                if self.pending.msgid.is_some() {
                    self.finish_entry()?;
                }
                if self.pending.context.is_some() {
                    return Err(SyntaxError::new(self.line, "duplicate msgctxt"));
                }
                self.pending.start_line = self.line;
                self.pending.context = Some(value);
                self.field = Field::Context;
            }
            "msgid" => {
                if self.pending.msgid.is_some() {
                    self.finish_entry()?;
                }
                if self.pending.context.is_none() {
                    self.pending.start_line = self.line;
                }
                self.pending.msgid = Some(value);
                self.field = Field::Id;
            }
            "msgid_plural" => {
                if self.pending.msgid.is_none() || self.pending.has_msgstr {
                    return Err(SyntaxError::new(self.line, "msgid_plural must follow msgid"));
                }
                if self.pending.msgid_plural.is_some() {
                    return Err(SyntaxError::new(self.line, "duplicate msgid_plural"));
                }
                self.pending.msgid_plural = Some(value);
                self.field = Field::IdPlural;
            }
            "msgstr" => {
                self.expect_msgid("msgstr")?;
                if self.pending.has_msgstr {
                    return Err(SyntaxError::new(self.line, "duplicate msgstr"));
                }
                self.pending.translations = vec![value];
                self.pending.has_msgstr = true;
                self.field = Field::Str(0);
            }
            _ => {
                let index = plural_index(keyword).unwrap_or_default();
                if index >= MAX_PLURAL_FORMS {
                    return Err(SyntaxError::new(self.line, format!("plural index {index} out of range")));
                }
                self.expect_msgid("msgstr[]")?;
                let translations = &mut self.pending.translations;
                if translations.len() <= index {
                    translations.resize(index + 1, String::new());
                }
                translations[index] = value;
                self.pending.has_msgstr = true;
                self.field = Field::Str(index);
            }
        }
        Ok(())
    }

    fn expect_msgid(&self, keyword: &str) -> std::result::Result<(), SyntaxError> {
        match self.pending.msgid {
            Some(_) => Ok(()),
            None => Err(SyntaxError::new(self.line, format!("{keyword} without msgid"))),
        }
    }

    fn append(&mut self, value: &str) -> std::result::Result<(), SyntaxError> {
        let pending = &mut self.pending;
        let target = match self.field {
            Field::None => None,
            Field::Context => pending.context.as_mut(),
            Field::Id => pending.msgid.as_mut(),
            Field::IdPlural => pending.msgid_plural.as_mut(),
            Field::Str(index) => pending.translations.get_mut(index),
        };
        match target {
            Some(target) => {
                target.push_str(value);
                Ok(())
            }
            None => Err(SyntaxError::new(self.line, "string outside of a message")),
        }
    }

    fn finish_entry(&mut self) -> std::result::Result<(), SyntaxError> {
        self.field = Field::None;
        let pending = std::mem::take(&mut self.pending);

        let Some(msgid) = pending.msgid else {
            if pending.context.is_some() {
                return Err(SyntaxError::new(pending.start_line, "msgctxt without msgid"));
            }
            return Ok(());
        };
        if !pending.has_msgstr {
            return Err(SyntaxError::new(pending.start_line, "msgid without msgstr"));
        }

        let is_header = msgid.is_empty() && pending.context.is_none();
        match (&self.headers, is_header) {
            (None, true) if self.entries.is_empty() => {
                self.headers = Some(pending.translations.into_iter().next().unwrap_or_default());
            }
            (None, _) => {
                return Err(SyntaxError::new(pending.start_line, "missing header entry (msgid \"\")"));
            }
            (Some(_), true) => {
                return Err(SyntaxError::new(pending.start_line, "duplicate header entry"));
            }
            (Some(_), false) => self.entries.push(Entry {
                context: pending.context,
                msgid,
                msgid_plural: pending.msgid_plural,
                translations: pending.translations,
                fuzzy: pending.fuzzy,
                references: pending.references,
            }),
        }
        Ok(())
    }
}

/// `msgstr[2]` → `2`.
fn plural_index(keyword: &str) -> Option<usize> {
    keyword
        .strip_prefix("msgstr[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

fn truncate(line: &str) -> String {
    line.chars().take(40).collect()
}

/// Decode one `"..."` literal.
fn unquote(raw: &str, line: usize) -> std::result::Result<String, SyntaxError> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| SyntaxError::new(line, "expected a quoted string"))?;

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('a') => '\u{7}',
                    Some('b') => '\u{8}',
                    Some('f') => '\u{c}',
                    Some('v') => '\u{b}',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    Some(other) => {
                        return Err(SyntaxError::new(line, format!("invalid escape \\{other}")));
                    }
                    None => return Err(SyntaxError::new(line, "unterminated string")),
                };
                value.push(escaped);
            }
            '"' => return Err(SyntaxError::new(line, "unescaped quote inside string")),
            c => value.push(c),
        }
    }
    Ok(value)
}
