use crate::site::{preset, SiteProfile};
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Resolves the site profile: the named preset or the inline profile, with the
    /// `base-url` override applied
    pub fn site_profile(&self) -> ConfigResult<SiteProfile> {
        let mut profile = match (&self.site.preset, &self.site.profile) {
            (Some(name), None) => {
                preset(name).ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?
            }
            (None, Some(profile)) => profile.clone(),
            (Some(_), Some(_)) => {
                return Err(ConfigError::Validation(
                    "site.preset and site.profile are mutually exclusive".to_string(),
                ))
            }
            (None, None) => {
                return Err(ConfigError::Validation(
                    "site needs either a preset or an inline profile".to_string(),
                ))
            }
        };

        if let Some(base_url) = &self.site.base_url {
            profile.base_url = base_url.clone();
        }

        Ok(profile)
    }

    /// Parses the configured seeds
    pub fn seed_urls(&self) -> ConfigResult<Vec<Url>> {
        self.input
            .seeds
            .iter()
            .map(|seed| parse_seed(seed))
            .collect()
    }
}

/// Parses one seed, accepting only absolute http(s) URLs
pub(crate) fn parse_seed(seed: &str) -> ConfigResult<Url> {
    let url = Url::parse(seed.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL must be http or https: {}",
            seed
        )));
    }

    Ok(url)
}

/// Target site selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    /// Built-in profile name ("ajio", "amazon", "flipkart", "myntra")
    #[serde(default)]
    pub preset: Option<String>,

    /// Overrides the profile's base origin used for URL normalization
    #[serde(default, rename = "base-url")]
    pub base_url: Option<String>,

    /// Inline profile for a site without a preset
    #[serde(default)]
    pub profile: Option<SiteProfile>,
}

/// Run input
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Listing URLs to paginate, in order
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Maximum records collected per seed
    #[serde(rename = "per-seed-limit", default = "default_per_seed_limit")]
    pub per_seed_limit: usize,
}

fn default_per_seed_limit() -> usize {
    5
}

/// Pipeline tuning
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Listing items extracted concurrently
    #[serde(rename = "listing-concurrency", default = "default_listing_concurrency")]
    pub listing_concurrency: usize,

    /// Detail pages fetched concurrently
    #[serde(rename = "detail-concurrency", default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    /// Consecutive empty cursor advances before a seed is exhausted
    #[serde(rename = "stagnation-threshold", default = "default_stagnation_threshold")]
    pub stagnation_threshold: u32,

    /// Hard ceiling on cursor advances per seed
    #[serde(rename = "max-cursor-advances", default = "default_max_cursor_advances")]
    pub max_cursor_advances: u32,

    /// Bounded wait per field (milliseconds)
    #[serde(rename = "field-timeout-ms", default = "default_field_timeout_ms")]
    pub field_timeout_ms: u64,

    /// Pause between cursor advances (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Attempts per detail page, counting the first
    #[serde(rename = "detail-attempts", default = "default_detail_attempts")]
    pub detail_attempts: u32,

    /// Base delay for exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl PipelineConfig {
    pub fn field_timeout(&self) -> Duration {
        Duration::from_millis(self.field_timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            listing_concurrency: default_listing_concurrency(),
            detail_concurrency: default_detail_concurrency(),
            stagnation_threshold: default_stagnation_threshold(),
            max_cursor_advances: default_max_cursor_advances(),
            field_timeout_ms: default_field_timeout_ms(),
            page_delay_ms: default_page_delay_ms(),
            detail_attempts: default_detail_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_listing_concurrency() -> usize {
    8
}

fn default_detail_concurrency() -> usize {
    4
}

fn default_stagnation_threshold() -> u32 {
    2
}

fn default_max_cursor_advances() -> u32 {
    50
}

fn default_field_timeout_ms() -> u64 {
    1500
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_detail_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// HTTP session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Bound on loading one page, body included (milliseconds)
    #[serde(rename = "load-timeout-ms", default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl HttpConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            load_timeout_ms: default_load_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
    )
    .to_string()
}

fn default_load_timeout_ms() -> u64 {
    60_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving every output file
    pub directory: String,

    /// Prepended to each file name as `<prefix>_listing.json`
    #[serde(default, rename = "file-prefix")]
    pub file_prefix: Option<String>,
}
