use anyhow::{bail, Context};
use std::path::Path;
use tstats::catalog::{parser, Catalog};
use tstats::mo::{self, MoMessage};

pub(crate) fn cmd_inspect(file: &Path) -> anyhow::Result<()> {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("mo") => inspect_mo(file),
        Some("po") => inspect_po(file),
        _ => bail!("Unsupported file {}: expected a .po or .mo file", file.display()),
    }
}

fn inspect_mo(file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let decoded = mo::decode(&bytes).with_context(|| format!("Invalid MO file {}", file.display()))?;

    if let Some(header) = decoded.header() {
        print_headers(header);
    }
    let messages: Vec<MoMessage> = decoded.messages().collect();
    println!("{} message(s)", messages.len());
    for message in &messages {
        println!("{}", format_message(message));
    }
    Ok(())
}

fn inspect_po(file: &Path) -> anyhow::Result<()> {
    let catalog: Catalog = parser::parse_file(file)?;
    print_headers(catalog.headers());
    println!(
        "{} message(s), {} translated",
        catalog.len(),
        catalog.translated().count()
    );
    for entry in catalog.entries() {
        let state = if entry.is_translated() { ' ' } else { '!' };
        println!("{state} {}", entry.msgid);
    }
    Ok(())
}

fn print_headers(headers: &str) {
    for line in headers.lines().filter(|line| !line.is_empty()) {
        println!("  {line}");
    }
}

fn format_message(message: &MoMessage) -> String {
    let mut line = String::new();
    if let Some(context) = &message.context {
        line.push_str(&format!("[{context}] "));
    }
    line.push_str(&message.msgid);
    if let Some(plural) = &message.msgid_plural {
        line.push_str(&format!(" | {plural}"));
    }
    line.push_str(" => ");
    line.push_str(&message.translations.join(" | "));
    line
}
