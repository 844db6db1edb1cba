//! GNU gettext `.mo` encoder and decoder.
//!
//! Layout (all integers little-endian when written):
//!
//! ```text
//! 0   magic 0x950412de
//! 4   revision (0)
//! 8   N, number of strings
//! 12  offset of original strings table
//! 16  offset of translated strings table
//! 20  hash table size S
//! 24  offset of hash table
//! ```
//!
//! Both string tables hold `(length, offset)` pairs sorted by original string.
//! Strings are NUL-terminated; plural forms are separated by NUL and a
//! context is joined to its message id with `\x04`.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::catalog::{Catalog, CONTEXT_SEPARATOR};

pub const MAGIC: u32 = 0x9504_12de;
const HEADER_LEN: u32 = 28;
const MIN_HASH_SIZE: u32 = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MoError {
    #[error("file is too short to be a MO file")]
    TooShort,
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    #[error("unsupported MO revision {0}")]
    UnsupportedRevision(u32),
    #[error("string table entry {0} points outside the file")]
    OutOfBounds(usize),
    #[error("string {0} is not valid UTF-8")]
    InvalidUtf8(usize),
}

/// Original → translation pairs in MO key form, ready to encode.
///
/// The header goes in under the empty key; untranslated and fuzzy entries are left out.
pub fn messages(catalog: &Catalog) -> BTreeMap<String, String> {
    let mut messages = BTreeMap::new();
    if !catalog.headers().is_empty() {
        messages.insert(String::new(), catalog.headers().to_string());
    }
    for entry in catalog.translated() {
        let mut key = entry.key();
        if let Some(plural) = &entry.msgid_plural {
            key.push('\0');
            key.push_str(plural);
        }
        messages.insert(key, entry.translations.join("\0"));
    }
    messages
}

/// Encode sorted pairs into MO bytes.
pub fn encode(messages: &BTreeMap<String, String>) -> Vec<u8> {
    let count = messages.len() as u32;
    let hash_size = hash_table_size(count);
    let originals_offset = HEADER_LEN;
    let translations_offset = originals_offset + count * 8;
    let hash_offset = translations_offset + count * 8;
    let strings_offset = hash_offset + hash_size * 4;

    let mut originals = Vec::with_capacity(messages.len());
    let mut translations = Vec::with_capacity(messages.len());
    let mut offset = strings_offset;
    for original in messages.keys() {
        originals.push((original.len() as u32, offset));
        offset += original.len() as u32 + 1;
    }
    for translation in messages.values() {
        translations.push((translation.len() as u32, offset));
        offset += translation.len() as u32 + 1;
    }

    let mut hash_table = vec![0u32; hash_size as usize];
    for (index, original) in messages.keys().enumerate() {
        insert_hash(&mut hash_table, original.as_bytes(), index as u32 + 1);
    }

    let mut out = Vec::with_capacity(offset as usize);
    for word in [
        MAGIC,
        0,
        count,
        originals_offset,
        translations_offset,
        hash_size,
        hash_offset,
    ] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (len, off) in originals.iter().chain(translations.iter()) {
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&off.to_le_bytes());
    }
    for slot in &hash_table {
        out.extend_from_slice(&slot.to_le_bytes());
    }
    for text in messages.keys().chain(messages.values()) {
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    }
    out
}

/// A message read back from a MO file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoMessage {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub translations: Vec<String>,
}

impl MoMessage {
    fn from_pair(original: &str, translation: &str) -> Self {
        let (context, rest) = match original.split_once(CONTEXT_SEPARATOR) {
            Some((context, rest)) => (Some(context.to_string()), rest),
            None => (None, original),
        };
        let (msgid, msgid_plural) = match rest.split_once('\0') {
            Some((msgid, plural)) => (msgid.to_string(), Some(plural.to_string())),
            None => (rest.to_string(), None),
        };
        Self {
            context,
            msgid,
            msgid_plural,
            translations: translation.split('\0').map(str::to_string).collect(),
        }
    }

    pub fn is_header(&self) -> bool {
        self.context.is_none() && self.msgid.is_empty()
    }
}

/// Decoded MO file: the raw pairs in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoFile {
    pub pairs: Vec<(String, String)>,
}

impl MoFile {
    pub fn header(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(original, _)| original.is_empty())
            .map(|(_, translation)| translation.as_str())
    }

    pub fn messages(&self) -> impl Iterator<Item = MoMessage> + '_ {
        self.pairs
            .iter()
            .map(|(original, translation)| MoMessage::from_pair(original, translation))
            .filter(|message| !message.is_header())
    }
}

/// Decode MO bytes, accepting either byte order.
pub fn decode(bytes: &[u8]) -> Result<MoFile, MoError> {
    if bytes.len() < HEADER_LEN as usize {
        return Err(MoError::TooShort);
    }

    let magic_le = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let read: fn([u8; 4]) -> u32 = if magic_le == MAGIC {
        u32::from_le_bytes
    } else if u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == MAGIC {
        u32::from_be_bytes
    } else {
        return Err(MoError::BadMagic(magic_le));
    };

    let word = |at: usize| -> Option<u32> {
        let chunk = bytes.get(at..at + 4)?;
        Some(read([chunk[0], chunk[1], chunk[2], chunk[3]]))
    };

    let revision = word(4).ok_or(MoError::TooShort)?;
    if revision >> 16 != 0 {
        return Err(MoError::UnsupportedRevision(revision));
    }
    let count = word(8).ok_or(MoError::TooShort)? as usize;
    let originals_offset = word(12).ok_or(MoError::TooShort)? as usize;
    let translations_offset = word(16).ok_or(MoError::TooShort)? as usize;

    let string_at = |table: usize, index: usize| -> Result<String, MoError> {
        let descriptor = table + index * 8;
        let len = word(descriptor).ok_or(MoError::OutOfBounds(index))? as usize;
        let offset = word(descriptor + 4).ok_or(MoError::OutOfBounds(index))? as usize;
        let raw = bytes
            .get(offset..offset + len)
            .ok_or(MoError::OutOfBounds(index))?;
        String::from_utf8(raw.to_vec()).map_err(|_| MoError::InvalidUtf8(index))
    };

    let mut pairs = Vec::with_capacity(count.min(bytes.len() / 16));
    for index in 0..count {
        let original = string_at(originals_offset, index)?;
        let translation = string_at(translations_offset, index)?;
        pairs.push((original, translation));
    }
    Ok(MoFile { pairs })
}

/// Size of the lookup table: the smallest prime ≥ 4N/3, at least 3.
fn hash_table_size(count: u32) -> u32 {
    next_prime((count * 4 / 3).max(MIN_HASH_SIZE))
}

fn next_prime(mut candidate: u32) -> u32 {
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    let mut divisor = 2u32;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}

/// ELF/PJW string hash as used by gettext. Stops at the first NUL, so plural
/// keys hash on their singular msgid.
fn hashpjw(key: &[u8]) -> u32 {
    let mut hval: u32 = 0;
    for &byte in key.iter().take_while(|&&b| b != 0) {
        hval = (hval << 4).wrapping_add(u32::from(byte));
        let high = hval & 0xf000_0000;
        if high != 0 {
            hval ^= high >> 24;
            hval ^= high;
        }
    }
    hval
}

fn insert_hash(table: &mut [u32], key: &[u8], value: u32) {
    let size = table.len() as u32;
    let hash = hashpjw(key);
    let mut index = hash % size;
    let increment = 1 + hash % (size - 2);
    while table[index as usize] != 0 {
        index = if index >= size - increment {
            index - (size - increment)
        } else {
            index + increment
        };
    }
    table[index as usize] = value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Entry;

    fn sample_catalog() -> Catalog {
        let mut with_context = Entry::singular("Post", "Publicar");
        with_context.context = Some("verb".into());
        let plural = Entry {
            msgid: "%d comment".into(),
            msgid_plural: Some("%d comments".into()),
            translations: vec!["%d comentário".into(), "%d comentários".into()],
            ..Entry::default()
        };
        let mut fuzzy = Entry::singular("Settings", "Definições");
        fuzzy.fuzzy = true;
        Catalog::new(
            "Language: pt_PT\nPlural-Forms: nplurals=2; plural=n != 1;\n".into(),
            vec![
                Entry::singular("Hello", "Olá"),
                with_context,
                plural,
                fuzzy,
                Entry::singular("Untranslated", ""),
            ],
        )
    }

    #[test]
    fn header_layout() {
        let bytes = encode(&messages(&sample_catalog()));
        let word = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        assert_eq!(word(0), MAGIC);
        assert_eq!(word(4), 0);
        assert_eq!(word(8), 4); // header, Hello, verb|Post, plural
        assert_eq!(word(12), 28);
        assert_eq!(word(16), 28 + 4 * 8);
        assert_eq!(word(20), 5);
        assert_eq!(word(24), 28 + 8 * 8);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let catalog = sample_catalog();
        let decoded = decode(&encode(&messages(&catalog))).unwrap();

        assert_eq!(
            decoded.header(),
            Some("Language: pt_PT\nPlural-Forms: nplurals=2; plural=n != 1;\n")
        );

        let read: Vec<MoMessage> = decoded.messages().collect();
        assert_eq!(read.len(), 3);
        assert!(read.iter().any(|m| m.msgid == "Hello" && m.translations == ["Olá"]));
        assert!(read
            .iter()
            .any(|m| m.context.as_deref() == Some("verb") && m.msgid == "Post"));
        let plural = read.iter().find(|m| m.msgid == "%d comment").unwrap();
        assert_eq!(plural.msgid_plural.as_deref(), Some("%d comments"));
        assert_eq!(plural.translations, ["%d comentário", "%d comentários"]);
    }

    #[test]
    fn originals_are_sorted() {
        let decoded = decode(&encode(&messages(&sample_catalog()))).unwrap();
        let originals: Vec<&str> = decoded.pairs.iter().map(|(o, _)| o.as_str()).collect();
        let mut sorted = originals.clone();
        sorted.sort_unstable();
        assert_eq!(originals, sorted);
    }

    #[test]
    fn every_key_is_reachable_through_the_hash_table() {
        let messages = messages(&sample_catalog());
        let bytes = encode(&messages);
        let word = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        let size = word(20);
        let offset = word(24) as usize;
        let table: Vec<u32> = (0..size as usize).map(|i| word(offset + i * 4)).collect();

        for (index, key) in messages.keys().enumerate() {
            let hash = hashpjw(key.as_bytes());
            let increment = 1 + hash % (size - 2);
            let mut slot = hash % size;
            loop {
                assert_ne!(table[slot as usize], 0, "{key:?} not found");
                if table[slot as usize] == index as u32 + 1 {
                    break;
                }
                slot = (slot + increment) % size;
            }
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(decode(b"short"), Err(MoError::TooShort));
        assert_eq!(decode(&[0u8; 28]), Err(MoError::BadMagic(0)));
    }

    #[test]
    fn reads_big_endian_files() {
        let mut bytes = Vec::new();
        for word in [MAGIC, 0, 1, 28, 36, 0, 44] {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&44u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&47u32.to_be_bytes());
        bytes.extend_from_slice(b"Hi\0Oi\0");
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.pairs, vec![("Hi".to_string(), "Oi".to_string())]);
    }

    #[test]
    fn hash_size_is_prime_and_roomy() {
        assert_eq!(hash_table_size(0), 3);
        assert_eq!(hash_table_size(1), 3);
        assert_eq!(hash_table_size(4), 5);
        assert_eq!(hash_table_size(100), 137);
    }
}
