//! Detail page fetching
//!
//! A detail fetch never raises: every failure comes back as a [`FetchError`] naming the URL,
//! and the pipeline degrades that one record. Retrying is opt-in through [`RetryPolicy`].

use crate::config::PipelineConfig;
use crate::crawler::loader::{PageLoadError, PageLoader};
use crate::crawler::parser::is_ready;
use crate::extract::{compile, extract_fields, FieldExtractor, ItemHandle};
use crate::record::DetailRecord;
use crate::site::DetailProfile;
use crate::url::parse_http_url;
use crate::ConfigResult;
use scraper::Selector;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a detail fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    #[error("not an http(s) URL")]
    InvalidUrl,

    #[error(transparent)]
    Load(#[from] PageLoadError),
}

/// A detail page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("detail fetch failed for {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchCause,
}

/// Retry behaviour for detail loads
///
/// Only transient failures are retried; the wait before retry `n` (1-based) is
/// `backoff * 2^(n-1)`. `attempts` counts the first try, so `1` disables retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl From<&PipelineConfig> for RetryPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            attempts: config.detail_attempts,
            backoff: config.retry_backoff(),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails permanently or attempts run out
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, PageLoadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PageLoadError>>,
    {
        let mut attempt = 1u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() || attempt >= self.attempts => return Err(err),
                Err(err) => {
                    let delay = self
                        .backoff
                        .saturating_mul(1u32 << (attempt - 1).min(16));
                    tracing::warn!(
                        attempt,
                        max_attempts = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Loads detail pages and extracts the site's detail fields
pub struct DetailFetcher {
    loader: Arc<dyn PageLoader>,
    extractor: Arc<dyn FieldExtractor>,
    ready: Option<(Selector, String)>,
    field_timeout: Duration,
    retry: RetryPolicy,
}

impl DetailFetcher {
    pub fn new(
        loader: Arc<dyn PageLoader>,
        extractor: Arc<dyn FieldExtractor>,
        profile: &DetailProfile,
        field_timeout: Duration,
        retry: RetryPolicy,
    ) -> ConfigResult<Self> {
        let ready = match &profile.ready_selector {
            Some(raw) => Some((compile(raw)?, raw.clone())),
            None => None,
        };

        Ok(Self {
            loader,
            extractor,
            ready,
            field_timeout,
            retry,
        })
    }

    /// Names of the fields a detail record carries
    pub fn field_names(&self) -> Vec<String> {
        self.extractor
            .fields()
            .iter()
            .map(|spec| spec.name.clone())
            .collect()
    }

    /// Fetches one detail page
    ///
    /// Absent fields resolve to the sentinel; only a page that cannot be loaded (or never
    /// shows its ready marker) is an error.
    pub async fn fetch(&self, url: &str) -> Result<DetailRecord, FetchError> {
        let parsed = parse_http_url(url).ok_or_else(|| FetchError {
            url: url.to_string(),
            cause: FetchCause::InvalidUrl,
        })?;

        let html = self
            .retry
            .run(|| self.load_ready(&parsed))
            .await
            .map_err(|e| FetchError {
                url: url.to_string(),
                cause: e.into(),
            })?;

        let page = ItemHandle::new(0, html);
        let fields = extract_fields(self.extractor.as_ref(), &page, self.field_timeout).await;

        Ok(DetailRecord::new(url, fields))
    }

    async fn load_ready(&self, url: &Url) -> Result<String, PageLoadError> {
        let html = self.loader.load(url).await?;

        match &self.ready {
            Some((selector, raw)) if !is_ready(&html, Some(selector)) => {
                Err(PageLoadError::NotReady {
                    url: url.to_string(),
                    selector: raw.clone(),
                })
            }
            _ => Ok(html),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SelectorExtractor;
    use crate::record::{FieldValue, SENTINEL};
    use crate::site::{preset, FieldSpec};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails with the scripted errors first, then serves `html`
    struct FlakyLoader {
        failures: Mutex<Vec<PageLoadError>>,
        html: String,
        calls: AtomicU32,
    }

    impl FlakyLoader {
        fn new(failures: Vec<PageLoadError>, html: &str) -> Self {
            Self {
                failures: Mutex::new(failures),
                html: html.to_string(),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageLoader for FlakyLoader {
        async fn load(&self, _url: &Url) -> Result<String, PageLoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                Ok(self.html.clone())
            } else {
                Err(failures.remove(0))
            }
        }
    }

    const PDP: &str = r#"<html><body><div class="prod-container">
        <div class="size-variant-item size-instock"><span>S</span></div>
        <div class="size-variant-item size-instock"><span>M</span></div>
    </div></body></html>"#;

    const URL: &str = "https://www.ajio.com/p/460123";

    fn fetcher(loader: Arc<FlakyLoader>, retry: RetryPolicy) -> DetailFetcher {
        let profile = preset("ajio").unwrap();
        let extractor = SelectorExtractor::detail(&profile).unwrap();
        DetailFetcher::new(
            loader,
            Arc::new(extractor),
            &profile.detail,
            Duration::from_secs(1),
            retry,
        )
        .unwrap()
    }

    fn server_error() -> PageLoadError {
        PageLoadError::Status {
            url: URL.to_string(),
            status: 503,
        }
    }

    fn quick_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_fetch_extracts_detail_fields() {
        let loader = Arc::new(FlakyLoader::new(Vec::new(), PDP));
        let record = fetcher(loader, RetryPolicy::default()).fetch(URL).await.unwrap();

        assert_eq!(record.canonical_url, URL);
        assert_eq!(
            record.fields["Sizes Available"],
            FieldValue::List(vec!["S".to_string(), "M".to_string()])
        );
        assert_eq!(record.fields["Product Details"], FieldValue::sentinel());
        assert!(!record.is_placeholder());
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let loader = Arc::new(FlakyLoader::new(vec![server_error()], PDP));
        let error = fetcher(loader.clone(), RetryPolicy::default())
            .fetch(URL)
            .await
            .unwrap_err();

        assert_eq!(error.url, URL);
        assert_eq!(error.cause, FetchCause::Load(server_error()));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_failure() {
        let loader = Arc::new(FlakyLoader::new(vec![server_error(), server_error()], PDP));
        let record = fetcher(loader.clone(), quick_retry(3)).fetch(URL).await.unwrap();

        assert_eq!(loader.calls(), 3);
        assert_ne!(record.fields["Sizes Available"], FieldValue::sentinel());
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let not_found = PageLoadError::Status {
            url: URL.to_string(),
            status: 404,
        };
        let loader = Arc::new(FlakyLoader::new(vec![not_found.clone()], PDP));
        let error = fetcher(loader.clone(), quick_retry(3))
            .fetch(URL)
            .await
            .unwrap_err();

        assert_eq!(error.cause, FetchCause::Load(not_found));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_ready_marker_fails() {
        let loader = Arc::new(FlakyLoader::new(Vec::new(), "<html><body>captcha</body></html>"));
        let error = fetcher(loader, RetryPolicy::default())
            .fetch(URL)
            .await
            .unwrap_err();

        assert!(matches!(
            error.cause,
            FetchCause::Load(PageLoadError::NotReady { .. })
        ));
    }

    #[tokio::test]
    async fn test_sentinel_url_is_invalid() {
        let loader = Arc::new(FlakyLoader::new(Vec::new(), PDP));
        let error = fetcher(loader.clone(), RetryPolicy::default())
            .fetch(SENTINEL)
            .await
            .unwrap_err();

        assert_eq!(error.cause, FetchCause::InvalidUrl);
        assert_eq!(loader.calls(), 0);
    }

    #[test]
    fn test_field_names() {
        let loader = Arc::new(FlakyLoader::new(Vec::new(), PDP));
        let mut profile = preset("ajio").unwrap();
        profile.detail.fields.push(FieldSpec::text("Fabric", &[".fabric"]));
        let extractor = SelectorExtractor::detail(&profile).unwrap();
        let fetcher = DetailFetcher::new(
            loader,
            Arc::new(extractor),
            &profile.detail,
            Duration::from_secs(1),
            RetryPolicy::default(),
        )
        .unwrap();

        assert_eq!(
            fetcher.field_names(),
            vec!["Sizes Available", "Product Details", "Fabric"]
        );
    }
}
