use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;

use crate::error::{Result, UpdateError};
use crate::locale::Locale;
use crate::project::{Project, DEFAULT_API_URL};

const OCTET_STREAM: &str = "application/octet-stream";
const USER_AGENT: &str = concat!("tstats/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub api_url: String,
    /// Per-request timeout, covering connect and body.
    pub timeout: Duration,
    /// Total attempts for transient failures, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt, up to 30s.
    pub initial_backoff: Duration,
}

impl DownloadConfig {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.initial_backoff.checked_mul(factor))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_BACKOFF,
        }
    }
}

enum Failure {
    /// Worth another attempt: connection trouble, timeouts, 5xx, 429.
    Transient(String),
    Permanent(String),
}

/// Fetches `.po` exports from the translation service.
pub struct Downloader {
    client: reqwest::Client,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpdateError::Download(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn source_url(&self, project: &Project, locale: &Locale) -> String {
        project.translation_path(&self.config.api_url, locale)
    }

    /// Download the `.po` body for `project` in `locale`.
    pub async fn download(&self, project: &Project, locale: &Locale) -> Result<Vec<u8>> {
        let url = self.source_url(project, locale);
        let attempts = self.config.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            tracing::debug!(url = %url, attempt, "Downloading translation");
            match self.fetch_once(&url).await {
                Ok(body) => {
                    tracing::debug!(url = %url, bytes = body.len(), "Translation downloaded");
                    return Ok(body);
                }
                Err(Failure::Transient(reason)) if attempt < attempts => {
                    let delay = self.config.backoff(attempt);
                    tracing::warn!(url = %url, attempt, delay_ms = delay.as_millis() as u64, reason = %reason, "Transient download failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(Failure::Transient(reason)) | Err(Failure::Permanent(reason)) => {
                    tracing::debug!(url = %url, reason = %reason, "Download failed");
                    return Err(UpdateError::Download(reason));
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<Vec<u8>, Failure> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                Failure::Transient(format!("Request failed: {e}"))
            } else {
                Failure::Permanent(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Failure::Transient(format!("Server returned status {status}.")));
        }
        if !status.is_success() {
            return Err(Failure::Permanent(format!("Server returned status {status}.")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        if content_type != Some(OCTET_STREAM) {
            tracing::debug!(content_type = ?content_type, "Unexpected content type");
            return Err(Failure::Permanent("A valid URL was not provided.".to_string()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Failure::Transient(format!("Failed to read response body: {e}")))?;
        Ok(body.to_vec())
    }
}
