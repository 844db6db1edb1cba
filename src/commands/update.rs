use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tstats::cache::{self, CacheStore};
use tstats::download::Downloader;
use tstats::pipeline::{Pipeline, RunContext, UpdateReport, UpdateRequest, UpdateSummary};
use tstats::settings::{Settings, SettingsStore};
use tstats::{clienv, Project, ProjectKind};

use super::Stores;
use crate::args::UpdateArgs;

/// What `tstats debug` shows about the last update of a project.
#[derive(Debug, Serialize)]
struct UpdateRecord<'a> {
    project: &'a str,
    wp_locale: &'a str,
    success: bool,
    error_kind: Option<&'static str>,
    log: &'a [String],
    updated_at: u64,
}

pub(crate) async fn cmd_update(stores: &Stores, args: UpdateArgs) -> anyhow::Result<()> {
    let settings = stores.settings.load().context("Failed to load settings")?;

    let wp_locale = args
        .locale
        .clone()
        .or_else(clienv::locale)
        .or_else(|| settings.locale.clone())
        .context("No locale given. Use --locale, TSTATS_LOCALE or the `locale` setting.")?;

    let destination = match args.destination.clone().or_else(|| settings.destination.clone()) {
        Some(destination) => destination,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    tokio::fs::create_dir_all(&destination)
        .await
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    let projects = select_projects(&settings, &args)?;

    let mut download = settings.download_config();
    if let Some(api_url) = args.api_url.clone().or_else(clienv::api_url) {
        download.api_url = api_url;
    }
    tracing::debug!(api_url = %download.api_url, wp_locale = %wp_locale, projects = projects.len(), "Starting update");
    let pipeline = Pipeline::new(Downloader::new(download)?);

    let cancel = tokio_util::sync::CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut failures = 0;
    for project in projects {
        let ctx = RunContext {
            cancel: cancel.clone(),
            deadline: args
                .timeout
                .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs)),
        };
        let request = UpdateRequest {
            destination: destination.clone(),
            project,
            wp_locale: wp_locale.clone(),
        };

        let report = run_with_spinner(&pipeline, &request, &ctx).await;
        print_report(&request, &report);
        record(&stores.cache, &request, &report);

        if !report.is_success() {
            failures += 1;
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    let show_debug = args.debug || clienv::debug_env().unwrap_or(settings.debug);
    if show_debug {
        println!();
        super::debug::print_report(stores)?;
    }

    if failures > 0 {
        bail!("{failures} update(s) failed");
    }
    Ok(())
}

/// The named project (settings entry overridden by flags), or every enabled project.
fn select_projects(settings: &Settings, args: &UpdateArgs) -> anyhow::Result<Vec<Project>> {
    let Some(slug) = &args.project else {
        let projects = settings.enabled_projects();
        if projects.is_empty() {
            bail!("No project given and no enabled projects in settings.");
        }
        return Ok(projects);
    };

    let mut project = match settings.projects.get(slug) {
        Some(configured) => configured.to_project(slug),
        None => Project::plugin(slug),
    };
    if let Some(kind) = args.kind {
        project.kind = kind;
    }
    if let Some(subproject) = &args.subproject {
        project.subproject = subproject.clone();
    }
    if let Some(domain) = &args.domain {
        project.domain = domain.clone();
    }
    if project.kind == ProjectKind::Theme && args.subproject.is_some() {
        tracing::warn!(slug = %slug, "Sub-project is ignored for themes");
    }
    project.validate()?;
    Ok(vec![project])
}

async fn run_with_spinner(
    pipeline: &Pipeline,
    request: &UpdateRequest,
    ctx: &RunContext,
) -> UpdateReport<UpdateSummary> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!(
        "Updating {} ({})",
        request.project.slug, request.wp_locale
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = pipeline.run(request, ctx).await;

    spinner.finish_and_clear();
    report
}

fn print_report(request: &UpdateRequest, report: &UpdateReport<UpdateSummary>) {
    println!("{} ({})", request.project.slug, request.wp_locale);
    for line in report.log.entries() {
        println!("  {line}");
    }
    match &report.result {
        Ok(summary) => println!(
            "  {} of {} strings translated, {} file(s) written to {}",
            summary.translated,
            summary.entries,
            2 + summary.json.len(),
            summary.mo.parent().map(|dir| dir.display().to_string()).unwrap_or_default()
        ),
        Err(e) => eprintln!("  Error [{}]: {e}", e.kind()),
    }
}

fn record(cache: &dyn CacheStore, request: &UpdateRequest, report: &UpdateReport<UpdateSummary>) {
    let entry = UpdateRecord {
        project: &request.project.slug,
        wp_locale: &request.wp_locale,
        success: report.is_success(),
        error_kind: report.result.as_ref().err().map(|e| e.kind()),
        log: report.log.entries(),
        updated_at: cache::unix_now(),
    };
    let key = cache::update_key(&request.project.slug, &request.wp_locale);
    let stored = serde_json::to_value(&entry)
        .map_err(|e| e.to_string())
        .and_then(|value| cache.set(&key, value, None).map_err(|e| e.to_string()));
    if let Err(e) = stored {
        tracing::warn!(key = %key, error = %e, "Failed to record update");
    }
}
