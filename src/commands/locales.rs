use tstats::locale::{self, GpLocale};

pub(crate) fn cmd_locales(query: Option<&str>) -> anyhow::Result<()> {
    let locales: Vec<&GpLocale> = match query {
        Some(query) => locale::search(query),
        None => locale::all().collect(),
    };

    if locales.is_empty() {
        anyhow::bail!("No locale matches {:?}", query.unwrap_or_default());
    }

    for gp in locales {
        println!("{}", format_row(gp));
    }
    Ok(())
}

fn format_row(gp: &GpLocale) -> String {
    let locale = locale::Locale::new(gp);
    format!(
        "{:<14} {:<28} {:<24} {}",
        locale.wp_locale, locale.english_name, locale.native_name, locale.locale_slug
    )
}
