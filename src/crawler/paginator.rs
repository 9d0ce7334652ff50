//! Listing pagination for one seed
//!
//! The paginator walks a seed's listing cursor (page number or scroll offset), extracts
//! every newly visible item with bounded concurrency and stops on the first of:
//! - the per-seed limit being reached (output is truncated to exactly the limit)
//! - `stagnation_threshold` consecutive advances without new items
//! - the cursor advance ceiling
//! - a listing page that fails to load or never shows its ready marker
//!
//! Scroll-style loads only enumerate items beyond the previously visible count. For both
//! styles a load is stagnant when it appends no record with an unseen identifier; a scroll
//! load that reveals more items which are all repeats still counts as stagnant.

use crate::config::PipelineConfig;
use crate::crawler::loader::{PageLoadError, PageLoader};
use crate::crawler::parser::{parse_listing, ListingSelectors};
use crate::extract::{extract_item, FieldExtractor, ItemHandle};
use crate::record::ItemRecord;
use crate::site::{ListingProfile, PaginationStyle};
use crate::url::with_query_param;
use crate::ConfigResult;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Tunables for one paginator
#[derive(Debug, Clone)]
pub struct PaginatorSettings {
    /// Items extracted concurrently per page
    pub concurrency: usize,

    /// Consecutive empty advances before the seed counts as exhausted
    pub stagnation_threshold: u32,

    /// Hard ceiling on cursor advances per seed
    pub max_cursor_advances: u32,

    /// Bounded wait per field
    pub field_timeout: Duration,

    /// Pause between cursor advances
    pub page_delay: Duration,
}

impl From<&PipelineConfig> for PaginatorSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            concurrency: config.listing_concurrency,
            stagnation_threshold: config.stagnation_threshold,
            max_cursor_advances: config.max_cursor_advances,
            field_timeout: config.field_timeout(),
            page_delay: config.page_delay(),
        }
    }
}

impl Default for PaginatorSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Position within a seed's listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// 1-based page number
    Page(u32),

    /// Cumulative scroll offset
    Scroll(u32),
}

impl Cursor {
    pub fn start(style: &PaginationStyle) -> Self {
        match style {
            PaginationStyle::Page { .. } => Cursor::Page(1),
            PaginationStyle::Scroll { .. } => Cursor::Scroll(0),
        }
    }

    pub fn advance(self, style: &PaginationStyle) -> Self {
        match (self, style) {
            (Cursor::Page(page), _) => Cursor::Page(page.saturating_add(1)),
            (Cursor::Scroll(offset), PaginationStyle::Scroll { step, .. }) => {
                Cursor::Scroll(offset.saturating_add(*step))
            }
            (Cursor::Scroll(offset), PaginationStyle::Page { .. }) => Cursor::Scroll(offset),
        }
    }

    /// The listing URL for this cursor
    pub fn url(&self, seed: &Url, style: &PaginationStyle) -> Url {
        let (param, value) = match (self, style) {
            (Cursor::Page(page), PaginationStyle::Page { param }) => (param, *page),
            (Cursor::Scroll(offset), PaginationStyle::Scroll { param, .. }) => (param, *offset),
            (Cursor::Page(value), PaginationStyle::Scroll { param, .. })
            | (Cursor::Scroll(value), PaginationStyle::Page { param }) => (param, *value),
        };

        with_query_param(seed, param, &value.to_string())
    }
}

/// Why a seed stopped producing items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    LimitReached,
    Stagnated,
    CursorCeiling,
    PageLoadFailed(PageLoadError),
}

impl Termination {
    /// Returns true for the normal end states (limit, stagnation, ceiling)
    pub fn is_exhausted(&self) -> bool {
        !matches!(self, Termination::PageLoadFailed(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::LimitReached => write!(f, "limit reached"),
            Termination::Stagnated => write!(f, "no new items"),
            Termination::CursorCeiling => write!(f, "cursor ceiling reached"),
            Termination::PageLoadFailed(e) => write!(f, "page load failed ({})", e),
        }
    }
}

/// Per-seed counts, kept after the records move on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub seed: String,
    pub collected: usize,
    pub pages_loaded: u32,
    pub cursor_advances: u32,
    pub discarded: usize,
    pub duplicates_skipped: usize,
    pub termination: Termination,
}

/// Records collected for one seed plus how collection ended
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub records: Vec<ItemRecord>,
    pub summary: SeedSummary,
}

impl SeedReport {
    /// Returns true if at least one listing page loaded
    pub fn loaded(&self) -> bool {
        self.summary.pages_loaded > 0
    }
}

#[derive(Debug, Default)]
struct PaginationState {
    collected: Vec<ItemRecord>,
    seen_identifiers: HashSet<String>,
    stagnation_count: u32,
    pages_loaded: u32,
    cursor_advances: u32,
    /// Items enumerated so far (page style) or visible at the last load (scroll style)
    enumerated: usize,
    discarded: usize,
    duplicates_skipped: usize,
}

/// Drives one seed's listing to completion
pub struct ListingPaginator {
    loader: Arc<dyn PageLoader>,
    extractor: Arc<dyn FieldExtractor>,
    selectors: ListingSelectors,
    pagination: PaginationStyle,
    settings: PaginatorSettings,
}

impl ListingPaginator {
    pub fn new(
        loader: Arc<dyn PageLoader>,
        extractor: Arc<dyn FieldExtractor>,
        profile: &ListingProfile,
        settings: PaginatorSettings,
    ) -> ConfigResult<Self> {
        Ok(Self {
            loader,
            extractor,
            selectors: ListingSelectors::from_profile(profile)?,
            pagination: profile.pagination.clone(),
            settings,
        })
    }

    /// Collects at most `limit` unique records from `seed`
    ///
    /// Never fails: a listing page that cannot be loaded ends the seed with whatever was
    /// collected so far.
    pub async fn paginate(&self, seed: &Url, limit: usize) -> SeedReport {
        let mut state = PaginationState::default();
        let mut cursor = Cursor::start(&self.pagination);

        let termination = loop {
            if state.collected.len() >= limit {
                break Termination::LimitReached;
            }

            let url = cursor.url(seed, &self.pagination);
            let items = match self.load_items(&url).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(seed = %seed, cursor = %url, error = %e, "Listing page failed");
                    break Termination::PageLoadFailed(e);
                }
            };
            state.pages_loaded += 1;

            let fresh = self.select_fresh(items, &mut state);
            let records = self.extract_batch(seed, &fresh, &mut state).await;
            let grew = self.append(records, limit, &mut state);

            tracing::info!(
                "Progress: {} of {} items collected from {} ({} pages loaded)",
                state.collected.len(),
                limit,
                seed,
                state.pages_loaded
            );

            if state.collected.len() >= limit {
                break Termination::LimitReached;
            }

            // Stagnation is judged on appended identifiers for both styles, not on the
            // visible item count, so scroll pages that only re-render repeats still stop.
            if grew {
                state.stagnation_count = 0;
            } else {
                state.stagnation_count += 1;
                tracing::info!(
                    seed = %seed,
                    stagnation = state.stagnation_count,
                    "No new items after cursor advance"
                );
                if state.stagnation_count >= self.settings.stagnation_threshold {
                    break Termination::Stagnated;
                }
            }

            if state.cursor_advances >= self.settings.max_cursor_advances {
                tracing::warn!(
                    seed = %seed,
                    advances = state.cursor_advances,
                    "Cursor advance ceiling reached"
                );
                break Termination::CursorCeiling;
            }

            cursor = cursor.advance(&self.pagination);
            state.cursor_advances += 1;

            if !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        };

        state.collected.truncate(limit);
        tracing::info!(
            seed = %seed,
            collected = state.collected.len(),
            "Seed finished: {}",
            termination
        );

        SeedReport {
            summary: SeedSummary {
                seed: seed.to_string(),
                collected: state.collected.len(),
                pages_loaded: state.pages_loaded,
                cursor_advances: state.cursor_advances,
                discarded: state.discarded,
                duplicates_skipped: state.duplicates_skipped,
                termination,
            },
            records: state.collected,
        }
    }

    async fn load_items(&self, url: &Url) -> Result<Vec<ItemHandle>, PageLoadError> {
        let html = self.loader.load(url).await?;

        parse_listing(&html, &self.selectors).ok_or_else(|| PageLoadError::NotReady {
            url: url.to_string(),
            selector: self.selectors.ready_marker().unwrap_or_default().to_string(),
        })
    }

    /// Picks the items this load contributes and rebases their positions
    fn select_fresh(&self, items: Vec<ItemHandle>, state: &mut PaginationState) -> Vec<ItemHandle> {
        match self.pagination {
            PaginationStyle::Scroll { .. } => {
                let visible = items.len();
                let fresh = items.into_iter().skip(state.enumerated).collect();
                state.enumerated = state.enumerated.max(visible);
                fresh
            }
            PaginationStyle::Page { .. } => {
                let offset = state.enumerated;
                state.enumerated += items.len();
                items
                    .into_iter()
                    .map(|mut item| {
                        item.position += offset;
                        item
                    })
                    .collect()
            }
        }
    }

    /// Extracts a batch with bounded concurrency, preserving discovery order
    async fn extract_batch(
        &self,
        seed: &Url,
        items: &[ItemHandle],
        state: &mut PaginationState,
    ) -> Vec<ItemRecord> {
        let extractor = self.extractor.as_ref();
        let field_timeout = self.settings.field_timeout;

        let results: Vec<_> = stream::iter(items)
            .map(|item| async move {
                (
                    item.position,
                    extract_item(extractor, item, field_timeout).await,
                )
            })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(position, result)| match result {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(seed = %seed, position, error = %e, "Discarding listing item");
                    state.discarded += 1;
                    None
                }
            })
            .collect()
    }

    /// Appends unseen records up to the limit; returns true if any identifier was new
    fn append(&self, records: Vec<ItemRecord>, limit: usize, state: &mut PaginationState) -> bool {
        let mut grew = false;

        for record in records {
            if state.collected.len() >= limit {
                break;
            }
            if !state.seen_identifiers.insert(record.identifier.clone()) {
                tracing::debug!(identifier = %record.identifier, "Skipping seen identifier");
                state.duplicates_skipped += 1;
                continue;
            }
            state.collected.push(record);
            grew = true;
        }

        grew
    }
}
