//! Run orchestration
//!
//! This module drives one complete harvest:
//! - Paginating every seed in order and concatenating the listing records
//! - Deduplicating the listing by canonical URL
//! - Fetching detail pages with bounded concurrency
//! - Merging listing and detail records into the final dataset

use crate::config::Config;
use crate::crawler::detail::{DetailFetcher, RetryPolicy};
use crate::crawler::loader::{build_http_client, HttpPageLoader, PageLoader};
use crate::crawler::merge::{dedup_by_url, index_details, merge_records, Dataset};
use crate::crawler::paginator::{ListingPaginator, PaginatorSettings, SeedSummary};
use crate::extract::SelectorExtractor;
use crate::output::RunStats;
use crate::record::{DetailRecord, ItemRecord};
use crate::{ConfigResult, HarvestError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Concatenated listing records in seed order, before URL deduplication
    pub listing: Vec<ItemRecord>,

    /// One entry per attempted detail URL, placeholders included
    pub details: Vec<DetailRecord>,

    pub dataset: Dataset,

    pub seeds: Vec<SeedSummary>,

    pub stats: RunStats,
}

/// Listing + detail + merge pipeline for one site
pub struct MergePipeline {
    paginator: ListingPaginator,
    fetcher: DetailFetcher,
    detail_fields: Vec<String>,
    detail_concurrency: usize,
}

impl MergePipeline {
    /// Builds the pipeline for a validated configuration
    ///
    /// One HTTP client is built here and shared by every listing and detail load.
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.http)?;
        let loader = Arc::new(HttpPageLoader::new(client, config.http.load_timeout()));
        Ok(Self::with_loader(config, loader)?)
    }

    /// Builds the pipeline around an existing page loader
    pub fn with_loader(config: &Config, loader: Arc<dyn PageLoader>) -> ConfigResult<Self> {
        let profile = config.site_profile()?;

        let paginator = ListingPaginator::new(
            loader.clone(),
            Arc::new(SelectorExtractor::listing(&profile)?),
            &profile.listing,
            PaginatorSettings::from(&config.pipeline),
        )?;
        let fetcher = DetailFetcher::new(
            loader,
            Arc::new(SelectorExtractor::detail(&profile)?),
            &profile.detail,
            config.pipeline.field_timeout(),
            RetryPolicy::from(&config.pipeline),
        )?;

        Ok(Self::from_parts(
            paginator,
            fetcher,
            config.pipeline.detail_concurrency,
        ))
    }

    /// Assembles a pipeline from its collaborators
    pub fn from_parts(
        paginator: ListingPaginator,
        fetcher: DetailFetcher,
        detail_concurrency: usize,
    ) -> Self {
        let detail_fields = fetcher.field_names();
        Self {
            paginator,
            fetcher,
            detail_fields,
            detail_concurrency: detail_concurrency.max(1),
        }
    }

    /// Runs the pipeline over `seeds`
    ///
    /// Every failure below the run level is recovered; the only error is
    /// [`HarvestError::NoSeedLoaded`] when not a single listing page could be loaded.
    pub async fn run(&self, seeds: &[Url], per_seed_limit: usize) -> Result<RunOutcome, HarvestError> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        let mut listing = Vec::new();
        let mut summaries = Vec::with_capacity(seeds.len());

        for (index, seed) in seeds.iter().enumerate() {
            tracing::info!("Seed {}/{}: {}", index + 1, seeds.len(), seed);
            let report = self.paginator.paginate(seed, per_seed_limit).await;
            listing.extend(report.records);
            summaries.push(report.summary);
        }

        let seeds_loaded = summaries.iter().filter(|s| s.pages_loaded > 0).count();
        if seeds_loaded == 0 {
            tracing::error!("None of the {} seeds could be loaded", seeds.len());
            return Err(HarvestError::NoSeedLoaded { seeds: seeds.len() });
        }

        let (unique, duplicates_removed) = dedup_by_url(listing.clone());
        tracing::info!(
            "Listing complete: {} records, {} duplicates removed",
            unique.len(),
            duplicates_removed
        );

        let details = self.fetch_details(&unique).await;
        let detail_failures = details.iter().filter(|d| d.is_placeholder()).count();
        let detail_skipped = unique.iter().filter(|r| !r.has_url()).count();

        let dataset = merge_records(&unique, &index_details(&details), &self.detail_fields);

        let stats = RunStats {
            seeds: seeds.len(),
            seeds_loaded,
            listing_records: listing.len(),
            discarded_records: summaries.iter().map(|s| s.discarded).sum(),
            duplicates_removed,
            detail_fetched: details.len() - detail_failures,
            detail_failures,
            detail_skipped,
            final_records: dataset.len(),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Run completed: {} records in {:?} ({} detail failures)",
            stats.final_records,
            stats.elapsed,
            stats.detail_failures
        );

        Ok(RunOutcome {
            started_at,
            finished_at: Utc::now(),
            listing,
            details,
            dataset,
            seeds: summaries,
            stats,
        })
    }

    /// Fetches the detail page of every record that has a URL
    ///
    /// Failed fetches become placeholders; results keep listing order.
    async fn fetch_details(&self, records: &[ItemRecord]) -> Vec<DetailRecord> {
        let targets: Vec<&ItemRecord> = records.iter().filter(|r| r.has_url()).collect();
        let total = targets.len();

        for record in records.iter().filter(|r| !r.has_url()) {
            tracing::warn!(
                identifier = %record.identifier,
                "Skipping detail fetch for record without URL"
            );
        }

        let fetches = stream::iter(targets)
            .map(|record| self.fetcher.fetch(&record.canonical_url))
            .buffered(self.detail_concurrency);
        futures::pin_mut!(fetches);

        let mut details = Vec::with_capacity(total);
        while let Some(result) = fetches.next().await {
            let detail = match result {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!(url = %e.url, error = %e.cause, "Detail fetch failed");
                    DetailRecord::placeholder(
                        e.url,
                        self.detail_fields.iter().map(String::as_str),
                        e.cause.to_string(),
                    )
                }
            };
            details.push(detail);

            if details.len() % 10 == 0 || details.len() == total {
                tracing::info!("Progress: {}/{} detail pages fetched", details.len(), total);
            }
        }

        details
    }
}
