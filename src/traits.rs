//! Traits and interfaces shared by the per-firm scrapers

use anyhow::Result;
use async_trait::async_trait;

use crate::fetcher::PageFetcher;
use crate::listing::Harvest;
use crate::models::DateRange;

/// Static description of one firm's scraper
#[derive(Debug, Clone)]
pub struct FirmConfig {
    /// Short identifier used on the command line
    pub key: &'static str,
    /// Company name stored with every record
    pub name: &'static str,
    /// MySQL table holding this firm's publications
    pub table: &'static str,
    /// Site root used to resolve relative links
    pub base_url: &'static str,
}

/// Everything a scraper needs for one run
#[derive(Clone)]
pub struct ScrapeContext {
    pub fetcher: PageFetcher,
    pub range: DateRange,
    /// Global cap on pages per listing
    pub max_pages: u32,
}

/// Trait for firm-specific scrapers
#[async_trait]
pub trait FirmScraper: Send + Sync {
    /// Get the configuration for this scraper
    fn config(&self) -> &FirmConfig;

    /// Crawl every listing this firm publishes and return the in-range publications
    ///
    /// # Returns
    /// * `Result<Harvest>` - Deduplicated publications plus filter counters
    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest>;
}
