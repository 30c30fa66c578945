// src/fetch/mod.rs

use anyhow::{Context, Result};
use futures::future::try_join_all;
use reqwest::Client;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, time::sleep};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::{Config, FeedSpec};
use crate::feeds::FeedPaths;

/// Retry policy for a single download.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Retry {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_retries: cfg.retries,
            initial_backoff_ms: cfg.backoff_ms,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.initial_backoff_ms * 2u64.pow(attempt.saturating_sub(1)))
    }
}

/// Reject bodies that cannot be an index feed: empty payloads and the HTML
/// error pages some mirrors serve with a 200.
fn check_body(url: &Url, body: &[u8]) -> Result<()> {
    let head = String::from_utf8_lossy(&body[..body.len().min(64)]).to_ascii_lowercase();
    let head = head.trim_start();
    if head.is_empty() {
        anyhow::bail!("empty body from {}", url);
    }
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        anyhow::bail!("{} returned an HTML page instead of feed text", url);
    }
    Ok(())
}

async fn fetch_once(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("status from {}", url))?;
    let body = response
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    check_body(url, &body)?;
    Ok(body.to_vec())
}

/// Up to `1 + max_retries` attempts, sleeping `retry.backoff(n)` before
/// attempt `n + 1`.
async fn fetch_with_retry(client: &Client, url: &Url, retry: Retry) -> Result<Vec<u8>> {
    let mut attempt = 0;
    let err = loop {
        match fetch_once(client, url).await {
            Ok(body) => {
                debug!(%url, attempt, "fetched");
                return Ok(body);
            }
            Err(e) if attempt >= retry.max_retries => break e,
            Err(e) => {
                attempt += 1;
                let delay = retry.backoff(attempt);
                warn!(%url, attempt, ?delay, error = %e, "feed download failed, retrying");
                sleep(delay).await;
            }
        }
    };
    error!(%url, attempts = attempt + 1, error = %err, "giving up on feed");
    Err(err.context(format!("{} attempts", attempt + 1)))
}

/// Download one feed into `dest_dir`, returning the saved path.
#[instrument(level = "info", skip(client, dest_dir), fields(url = %spec.url))]
pub async fn download_feed(
    client: &Client,
    spec: &FeedSpec,
    dest_dir: impl AsRef<Path>,
    retry: Retry,
) -> Result<PathBuf> {
    let url = Url::parse(&spec.url).with_context(|| format!("parsing feed URL {}", spec.url))?;
    let dest_path = dest_dir.as_ref().join(&spec.file);
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let bytes = fetch_with_retry(client, &url, retry).await?;
    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing {}", dest_path.display()))?;
    info!(file = %spec.file, bytes = bytes.len(), "downloaded");
    Ok(dest_path)
}

/// Fetch all four feeds concurrently into `dest_dir`.
pub async fn fetch_all(client: &Client, cfg: &Config, dest_dir: &Path) -> Result<FeedPaths> {
    let retry = Retry::from_config(cfg);
    let downloads = cfg
        .feeds
        .all()
        .into_iter()
        .map(|spec| download_feed(client, spec, dest_dir, retry));
    let saved = try_join_all(downloads).await?;
    debug!(files = saved.len(), "all feeds saved");
    Ok(cfg.feeds.paths_in(dest_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let retry = Retry {
            max_retries: 3,
            initial_backoff_ms: 100,
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn rejects_bodies_that_are_not_feeds() {
        let url = Url::parse("https://example.org/SOLFSMY.TXT").unwrap();
        assert!(check_body(&url, b"").is_err());
        assert!(check_body(&url, b"  \n").is_err());
        assert!(check_body(&url, b"<!DOCTYPE html><html><body>503</body></html>").is_err());
        assert!(check_body(&url, b"\n<HTML><HEAD>").is_err());
        assert!(check_body(&url, b"SOLFSMY.TXT\n# YYYY DDD   JulianDay").is_ok());
    }

    #[tokio::test]
    async fn bad_url_fails_before_any_request() {
        let spec = FeedSpec {
            url: "not a url".to_string(),
            file: "x.txt".to_string(),
        };
        let dir = tempfile::tempdir().unwrap();
        let retry = Retry {
            max_retries: 0,
            initial_backoff_ms: 1,
        };
        let err = download_feed(&Client::new(), &spec, dir.path(), retry)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("parsing feed URL"));
        assert!(!dir.path().join("x.txt").exists());
    }
}
