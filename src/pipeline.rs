//! Translation update pipeline.
//!
//! `resolving-locale → downloading → writing-po → parsing → compiling-mo-and-json → done`
//!
//! Each step appends one line to the [`UpdateLog`] (the compile step appends one
//! per written file). The first failing step appends its progress line followed
//! by the error message and the run stops there, so the log length tells how far
//! the update got. Project validation and locale resolution only log when they fail.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::catalog::paths::{self, FileKind};
use crate::catalog::{compiler, parser, writer};
use crate::download::Downloader;
use crate::error::{Result, UpdateError};
use crate::locale::{self, Locale};
use crate::project::Project;

pub const SUCCESS_MESSAGE: &str = "Translation updated successfully.";

/// Append-only list of human-readable progress lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateLog(Vec<String>);

impl UpdateLog {
    fn push(&mut self, line: String) {
        tracing::info!("{line}");
        self.0.push(line);
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn into_entries(self) -> Vec<String> {
        self.0
    }
}

/// Log plus outcome. The log is complete only as far as `result` says.
#[derive(Debug)]
pub struct UpdateReport<T> {
    pub log: UpdateLog,
    pub result: Result<T>,
}

impl<T> UpdateReport<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Directory receiving the `.po`, `.mo` and `.json` files.
    pub destination: PathBuf,
    pub project: Project,
    pub wp_locale: String,
}

#[derive(Debug, Clone)]
pub struct UpdateSummary {
    pub locale: Locale,
    pub po: PathBuf,
    pub mo: PathBuf,
    pub json: Vec<PathBuf>,
    pub entries: usize,
    pub translated: usize,
}

/// Cancellation and deadline shared by every step of a run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub cancel: CancellationToken,
    pub deadline: Option<Instant>,
}

impl RunContext {
    pub fn with_timeout(timeout: std::time::Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Run `step` unless the run is cancelled or out of time first.
    async fn guard<T>(&self, step: impl Future<Output = Result<T>>) -> Result<T> {
        let deadline = self.deadline;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UpdateError::Cancelled),
            _ = sleep_until(deadline) => Err(UpdateError::TimedOut),
            result = step => result,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

static PROCESS_LOCKS: OnceLock<TargetLocks> = OnceLock::new();

/// One async mutex per target `.po` path.
///
/// [`Pipeline::new`] uses the process-wide registry from [`TargetLocks::global`];
/// a separate registry only matters for tests. Entries are dropped once the
/// last holder or waiter for a target is gone.
#[derive(Debug, Clone, Default)]
pub struct TargetLocks {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>,
}

impl TargetLocks {
    pub fn global() -> Self {
        PROCESS_LOCKS.get_or_init(TargetLocks::default).clone()
    }

    pub async fn lock(&self, target: &Path) -> TargetGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(target.to_path_buf()).or_default().clone()
        };
        tracing::trace!(target = %target.display(), "Waiting for target lock");
        TargetGuard {
            guard: Some(lock.lock_owned().await),
            target: target.to_path_buf(),
            locks: self.clone(),
        }
    }

    /// Number of targets currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, target: &Path) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under this mutex, so a count of one means nobody holds or awaits it.
        if locks.get(target).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(target);
        }
    }
}

/// Exclusive access to one target until dropped.
#[derive(Debug)]
pub struct TargetGuard {
    guard: Option<OwnedMutexGuard<()>>,
    target: PathBuf,
    locks: TargetLocks,
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.target);
    }
}

fn record<T>(log: &mut UpdateLog, progress: String, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => log.push(progress),
        Err(e) => log.push(format!("{progress} {e}")),
    }
    result
}

pub struct Pipeline {
    downloader: Downloader,
    locks: TargetLocks,
}

impl Pipeline {
    pub fn new(downloader: Downloader) -> Self {
        Self {
            downloader,
            locks: TargetLocks::global(),
        }
    }

    /// Use a private lock registry instead of the process-wide one.
    pub fn with_locks(mut self, locks: TargetLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Download `.po`, save it, parse it, then write `.mo` and `.json` files.
    pub async fn run(&self, request: &UpdateRequest, ctx: &RunContext) -> UpdateReport<UpdateSummary> {
        let mut log = UpdateLog::default();
        let result = self.run_steps(request, ctx, &mut log).await;
        match &result {
            Ok(summary) => tracing::debug!(
                project = %request.project.slug,
                wp_locale = %request.wp_locale,
                translated = summary.translated,
                "Update finished"
            ),
            Err(e) => tracing::warn!(
                project = %request.project.slug,
                wp_locale = %request.wp_locale,
                kind = e.kind(),
                error = %e,
                "Update failed"
            ),
        }
        UpdateReport { log, result }
    }

    async fn run_steps(
        &self,
        request: &UpdateRequest,
        ctx: &RunContext,
        log: &mut UpdateLog,
    ) -> Result<UpdateSummary> {
        let destination = request.destination.as_path();
        let project = &request.project;

        let locale = match project.validate().and_then(|()| locale::resolve(&request.wp_locale)) {
            Ok(locale) => locale,
            Err(e) => {
                log.push(e.to_string());
                return Err(e);
            }
        };

        let source = self.downloader.source_url(project, &locale);
        let body = record(
            log,
            format!("Downloading translation from {source}…"),
            ctx.guard(self.downloader.download(project, &locale)).await,
        )?;

        let po_path = paths::file_path(destination, project, &locale, FileKind::Po);
        let (_target, po) = record(
            log,
            format!("Saving file {}…", paths::file_name(project, &locale, FileKind::Po)),
            ctx.guard(async {
                let target = self.locks.lock(&po_path).await;
                let path = writer::write_po(destination, project, &locale, &body).await?;
                Ok((target, path))
            })
            .await,
        )?;

        let parse_task = {
            let (destination, project, locale) = (destination.to_path_buf(), project.clone(), locale.clone());
            tokio::task::spawn_blocking(move || parser::parse(&destination, &project, &locale))
        };
        let catalog = record(
            log,
            format!("Extracting translations from file {}…", paths::file_name(project, &locale, FileKind::Po)),
            ctx.guard(async {
                parse_task.await.map_err(|e| UpdateError::Parse {
                    path: po.clone(),
                    reason: format!("parser task failed: {e}"),
                })?
            })
            .await,
        )?;

        let entries = catalog.len();
        let translated = catalog.translated().count();
        let compiled = compiler::compile(catalog, project, &locale);

        let mo = record(
            log,
            format!("Saving file {}…", compiled.mo.file_name),
            ctx.guard(compiled.mo.write(destination)).await,
        )?;

        let mut json = Vec::with_capacity(compiled.json.len());
        for file in &compiled.json {
            let path = record(
                log,
                format!("Saving file {}…", file.file_name),
                ctx.guard(file.write(destination)).await,
            )?;
            json.push(path);
        }

        log.push(SUCCESS_MESSAGE.to_string());

        Ok(UpdateSummary {
            locale,
            po,
            mo,
            json,
            entries,
            translated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadConfig;
    use mockito::{Matcher, Server, ServerGuard};
    use std::time::Duration;

    const PO_BODY: &str = "msgid \"\"\nmsgstr \"\"\n\"Plural-Forms: nplurals=2; plural=n != 1;\\n\"\n\nmsgid \"Hello\"\nmsgstr \"Olá\"\n";

    fn pipeline(server: &ServerGuard) -> Pipeline {
        Pipeline::new(
            Downloader::new(DownloadConfig {
                api_url: server.url(),
                timeout: Duration::from_secs(5),
                max_attempts: 1,
                initial_backoff: Duration::from_millis(1),
            })
            .unwrap(),
        )
    }

    fn request(destination: &Path, wp_locale: &str) -> UpdateRequest {
        UpdateRequest {
            destination: destination.to_path_buf(),
            project: Project::plugin("hello-dolly").with_domain(""),
            wp_locale: wp_locale.to_string(),
        }
    }

    /// Header block as translate.wordpress.org exports it: no POT-Creation-Date,
    /// no Language-Team, plus `X-` extensions.
    const GLOTPRESS_BODY: &str = "# Translation of Plugins - Hello Dolly - Stable (latest release) in Portuguese (Portugal)\n\
# This file is distributed under the same license as the Plugins - Hello Dolly - Stable (latest release) package.\n\
msgid \"\"\n\
msgstr \"\"\n\
\"PO-Revision-Date: 2024-03-01 10:12:45+0000\\n\"\n\
\"MIME-Version: 1.0\\n\"\n\
\"Content-Type: text/plain; charset=UTF-8\\n\"\n\
\"Content-Transfer-Encoding: 8bit\\n\"\n\
\"Plural-Forms: nplurals=2; plural=n != 1;\\n\"\n\
\"X-Generator: GlotPress/4.0.1\\n\"\n\
\"Language: pt\\n\"\n\
\"Project-Id-Version: Plugins - Hello Dolly - Stable (latest release)\\n\"\n\
\n\
#. Description of the plugin\n\
#: hello.php\n\
msgid \"This is not just a plugin.\"\n\
msgstr \"Isto não é apenas um plugin.\"\n";

    const HTML_BODY: &str = "<!DOCTYPE html>\n<html><head><title>Not Found</title></head>\n<body><h1>Oops</h1></body></html>\n";

    async fn serve(server: &mut ServerGuard, content_type: &str) -> mockito::Mock {
        serve_body(server, content_type, PO_BODY).await
    }

    async fn serve_body(server: &mut ServerGuard, content_type: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_header("content-type", content_type)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn wrong_content_type_stops_after_one_entry() {
        let mut server = Server::new_async().await;
        serve(&mut server, "text/plain").await;
        let dir = tempfile::tempdir().unwrap();

        let report = pipeline(&server)
            .run(&request(dir.path(), "pt_PT"), &RunContext::default())
            .await;

        assert_eq!(report.result.unwrap_err().kind(), "download-error");
        assert_eq!(report.log.len(), 1);
        assert!(report.log.entries()[0].starts_with("Downloading translation from "));
        assert!(!dir.path().join("pt_PT.po").exists());
    }

    #[tokio::test]
    async fn write_failure_skips_parse_and_compile() {
        let mut server = Server::new_async().await;
        serve(&mut server, "application/octet-stream").await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let report = pipeline(&server)
            .run(&request(&missing, "pt_PT"), &RunContext::default())
            .await;

        assert_eq!(report.result.unwrap_err().kind(), "write-error");
        assert_eq!(report.log.len(), 2);
        assert!(report.log.entries()[1].starts_with("Saving file pt_PT.po… Could not create file"));
    }

    #[tokio::test]
    async fn unknown_locale_never_downloads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let report = pipeline(&server)
            .run(&request(dir.path(), "xx_XX"), &RunContext::default())
            .await;

        assert_eq!(report.result.unwrap_err().kind(), "locale-resolution-error");
        assert_eq!(report.log.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn domain_escaping_destination_never_downloads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("languages");
        std::fs::create_dir(&destination).unwrap();
        let mut request = request(&destination, "pt_PT");
        request.project = request.project.with_domain("../escaped");

        let report = pipeline(&server).run(&request, &RunContext::default()).await;

        assert_eq!(report.result.unwrap_err().kind(), "invalid-project-error");
        assert_eq!(report.log.len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cancelled_run_stops_at_download() {
        let mut server = Server::new_async().await;
        serve(&mut server, "application/octet-stream").await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::default();
        ctx.cancel.cancel();

        let report = pipeline(&server).run(&request(dir.path(), "pt_PT"), &ctx).await;

        assert_eq!(report.result.unwrap_err().kind(), "cancelled");
        assert_eq!(report.log.len(), 1);
    }

    #[tokio::test]
    async fn expired_deadline_times_out() {
        let mut server = Server::new_async().await;
        serve(&mut server, "application/octet-stream").await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now()),
        };

        let report = pipeline(&server).run(&request(dir.path(), "pt_PT"), &ctx).await;

        assert_eq!(report.result.unwrap_err().kind(), "timed-out");
    }

    #[tokio::test]
    async fn successful_run_logs_every_step() {
        let mut server = Server::new_async().await;
        serve(&mut server, "application/octet-stream").await;
        let dir = tempfile::tempdir().unwrap();

        let report = pipeline(&server)
            .run(&request(dir.path(), "pt_PT"), &RunContext::default())
            .await;

        let entries = report.log.entries().to_vec();
        let summary = report.result.unwrap();
        assert_eq!(
            entries[1..],
            [
                "Saving file pt_PT.po…".to_string(),
                "Extracting translations from file pt_PT.po…".to_string(),
                "Saving file pt_PT.mo…".to_string(),
                "Saving file pt_PT.json…".to_string(),
                SUCCESS_MESSAGE.to_string(),
            ]
        );
        assert_eq!(summary.translated, 1);
        assert_eq!(summary.po, dir.path().join("pt_PT.po"));
        assert_eq!(summary.json, vec![dir.path().join("pt_PT.json")]);
    }

    #[tokio::test]
    async fn glotpress_export_compiles() {
        let mut server = Server::new_async().await;
        serve_body(&mut server, "application/octet-stream", GLOTPRESS_BODY).await;
        let dir = tempfile::tempdir().unwrap();

        let report = pipeline(&server)
            .run(&request(dir.path(), "pt_PT"), &RunContext::default())
            .await;

        assert_eq!(report.log.last(), Some(SUCCESS_MESSAGE));
        let summary = report.result.unwrap();
        assert_eq!((summary.entries, summary.translated), (1, 1));
        let mo = crate::mo::decode(&std::fs::read(&summary.mo).unwrap()).unwrap();
        let header = mo.header().unwrap();
        assert!(header.contains("X-Generator: GlotPress/4.0.1"));
        assert!(!header.contains("POT-Creation-Date"));
    }

    #[tokio::test]
    async fn html_page_is_a_parse_error() {
        let mut server = Server::new_async().await;
        serve_body(&mut server, "application/octet-stream", HTML_BODY).await;
        let dir = tempfile::tempdir().unwrap();

        let report = pipeline(&server)
            .run(&request(dir.path(), "pt_PT"), &RunContext::default())
            .await;

        assert_eq!(report.result.unwrap_err().kind(), "parse-error");
        assert_eq!(report.log.len(), 3);
        assert!(report.log.entries()[2]
            .starts_with("Extracting translations from file pt_PT.po… Could not extract translations"));
        assert!(dir.path().join("pt_PT.po").exists());
        assert!(!dir.path().join("pt_PT.mo").exists());
        assert!(!dir.path().join("pt_PT.json").exists());
    }

    #[tokio::test]
    async fn concurrent_runs_on_one_target_both_finish() {
        let mut server = Server::new_async().await;
        serve(&mut server, "application/octet-stream").await;
        let dir = tempfile::tempdir().unwrap();
        let locks = TargetLocks::default();
        let first = pipeline(&server).with_locks(locks.clone());
        let second = pipeline(&server).with_locks(locks);
        let req = request(dir.path(), "pt_PT");
        let ctx = RunContext::default();

        let (a, b) = tokio::join!(first.run(&req, &ctx), second.run(&req, &ctx));

        assert!(a.is_success() && b.is_success());
        let mo = crate::mo::decode(&std::fs::read(dir.path().join("pt_PT.mo")).unwrap()).unwrap();
        assert_eq!(mo.messages().count(), 1);
    }

    #[tokio::test]
    async fn target_lock_is_exclusive() {
        let locks = TargetLocks::default();
        let path = Path::new("/tmp/pt_PT.po");
        let held = locks.lock(path).await;
        let waiting = tokio::time::timeout(Duration::from_millis(20), locks.lock(path)).await;
        assert!(waiting.is_err());
        drop(held);
        let acquired = tokio::time::timeout(Duration::from_millis(200), locks.lock(path)).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn released_targets_are_forgotten() {
        let locks = TargetLocks::default();
        let first = locks.lock(Path::new("/tmp/a.po")).await;
        let second = locks.lock(Path::new("/tmp/b.po")).await;
        assert_eq!(locks.len(), 2);

        drop(first);
        assert_eq!(locks.len(), 1);
        drop(second);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn waiting_target_stays_registered() {
        let locks = TargetLocks::default();
        let path = Path::new("/tmp/c.po");
        let held = locks.lock(path).await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock(Path::new("/tmp/c.po")).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn pipelines_share_process_locks_by_default() {
        let server = Server::new_async().await;
        let (first, second) = (pipeline(&server), pipeline(&server));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pt_PT.po");

        let held = first.locks.lock(&path).await;
        let waiting = tokio::time::timeout(Duration::from_millis(20), second.locks.lock(&path)).await;
        assert!(waiting.is_err());
        drop(held);
        let acquired = tokio::time::timeout(Duration::from_millis(200), second.locks.lock(&path)).await;
        assert!(acquired.is_ok());
    }
}
