//! Pagination over a firm's listing pages
//!
//! Every firm listing follows the same loop: fetch a page, parse the resource
//! blocks on it, keep what falls inside the date range, and decide whether the
//! next page is worth fetching. Listings are newest-first, so the first stale
//! item is the usual signal to stop; how strictly that signal is applied
//! differs per site and is captured by [`StopRule`].

use std::collections::HashSet;

use anyhow::Result;
use tracing::{info, warn};

use crate::models::{DateRange, DateVerdict, Publication};
use crate::traits::ScrapeContext;

/// How page `n` of a listing is addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScheme {
    /// One page only
    Single,
    /// `{base}/page/{n}/` (WordPress style)
    PathSegment,
    /// `{base}/page/{n}/{suffix}`, e.g. a category query string after the page segment
    PathSegmentWithSuffix(String),
    /// `{base}?page={n}`
    QueryParam,
}

impl PageScheme {
    /// URL of page `page` (1-based); page 1 is always `first_url` itself
    pub fn url(&self, first_url: &str, page: u32) -> String {
        if page <= 1 {
            return first_url.to_string();
        }

        match self {
            Self::Single => first_url.to_string(),
            Self::PathSegment => format!("{}/page/{}/", first_url.trim_end_matches('/'), page),
            Self::PathSegmentWithSuffix(suffix) => {
                let base = first_url.strip_suffix(suffix.as_str()).unwrap_or(first_url);
                format!("{}/page/{}/{}", base.trim_end_matches('/'), page, suffix)
            }
            Self::QueryParam => {
                let separator = if first_url.contains('?') { '&' } else { '?' };
                format!("{first_url}{separator}page={page}")
            }
        }
    }
}

/// When a stale (older than the range) item ends the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRule {
    /// Only empty pages or the page limit end the crawl
    Never,
    /// Stop at the first stale item and drop the rest of its page
    FirstStale,
    /// Finish the page, then stop if it held any stale item
    PageWithStale,
    /// Stop only when the page held stale items and nothing in range
    PageAllStale,
}

/// What to do with items whose date is missing or unparseable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndatedPolicy {
    Keep,
    Drop,
}

/// One page's candidates after date filtering
#[derive(Debug, Default)]
pub struct PageSift {
    pub kept: Vec<Publication>,
    pub filtered: usize,
    pub stop: bool,
}

/// Apply the date range and stop rule to the candidates parsed from one page
pub fn sift_page(
    candidates: Vec<Publication>,
    range: &DateRange,
    rule: StopRule,
    undated: UndatedPolicy,
) -> PageSift {
    let mut sift = PageSift::default();
    let mut saw_stale = false;
    let mut saw_in_range = false;

    for candidate in candidates {
        match range.classify(candidate.publication_date) {
            DateVerdict::InRange => {
                saw_in_range = true;
                sift.kept.push(candidate);
            }
            DateVerdict::Undated if undated == UndatedPolicy::Keep => sift.kept.push(candidate),
            DateVerdict::Undated | DateVerdict::Future => sift.filtered += 1,
            DateVerdict::Stale => {
                saw_stale = true;
                sift.filtered += 1;
                if rule == StopRule::FirstStale {
                    sift.stop = true;
                    return sift;
                }
            }
        }
    }

    sift.stop = match rule {
        StopRule::Never | StopRule::FirstStale => false,
        StopRule::PageWithStale => saw_stale,
        StopRule::PageAllStale => saw_stale && !saw_in_range,
    };
    sift
}

/// Publications gathered from one or more listings
#[derive(Debug, Default)]
pub struct Harvest {
    pub publications: Vec<Publication>,
    pub filtered: usize,
    pub pages: u32,
}

impl Harvest {
    /// Append another harvest, dropping links already collected
    pub fn merge(&mut self, other: Harvest) {
        let mut seen: HashSet<String> = self.publications.iter().map(|p| p.link.clone()).collect();
        for publication in other.publications {
            if seen.insert(publication.link.clone()) {
                self.publications.push(publication);
            }
        }
        self.filtered += other.filtered;
        self.pages += other.pages;
    }
}

/// A paginated source of resource blocks
#[derive(Debug, Clone)]
pub struct Listing {
    /// Human-readable name used in logs, e.g. "SAM Tax - Reports"
    pub label: String,
    pub first_url: String,
    pub scheme: PageScheme,
    pub max_pages: u32,
    /// Consecutive empty (or failed) pages tolerated before giving up
    pub max_consecutive_empty: u32,
    pub stop_rule: StopRule,
    pub undated: UndatedPolicy,
}

impl Listing {
    pub fn new(label: impl Into<String>, first_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            first_url: first_url.into(),
            scheme: PageScheme::Single,
            max_pages: 50,
            max_consecutive_empty: 1,
            stop_rule: StopRule::Never,
            undated: UndatedPolicy::Drop,
        }
    }

    pub fn paged(mut self, scheme: PageScheme, max_pages: u32) -> Self {
        self.scheme = scheme;
        self.max_pages = max_pages;
        self
    }

    pub fn stop_rule(mut self, rule: StopRule) -> Self {
        self.stop_rule = rule;
        self
    }

    pub fn undated(mut self, policy: UndatedPolicy) -> Self {
        self.undated = policy;
        self
    }

    pub fn tolerate_empty_pages(mut self, count: u32) -> Self {
        self.max_consecutive_empty = count.max(1);
        self
    }

    /// Crawl the listing, parsing each page with `parse(html, page_url)`.
    ///
    /// A parse error is a selector bug, not a site problem, and aborts the crawl.
    pub async fn crawl<F>(&self, ctx: &ScrapeContext, parse: F) -> Result<Harvest>
    where
        F: Fn(&str, &str) -> Result<Vec<Publication>> + Send + Sync,
    {
        let max_pages = self.max_pages.min(ctx.max_pages).max(1);
        let mut harvest = Harvest::default();
        let mut seen = HashSet::new();
        let mut empty_streak = 0;
        let mut page = 1;

        loop {
            if page > max_pages {
                info!("Reached page limit ({}) for {}", max_pages, self.label);
                break;
            }

            let url = self.scheme.url(&self.first_url, page);
            info!("Fetching page {} of {}: {}", page, self.label, url);

            let candidates = match ctx.fetcher.fetch(&url).await {
                Ok(Some(html)) => Some(parse(&html, &url)?),
                Ok(None) => {
                    info!("No page {} for {}, stopping", page, self.label);
                    break;
                }
                Err(e) => {
                    warn!("Skipping page {} of {}: {:#}", page, self.label, e);
                    None
                }
            };
            harvest.pages += 1;

            match candidates {
                Some(candidates) if !candidates.is_empty() => {
                    empty_streak = 0;
                    let found = candidates.len();
                    let sift = sift_page(candidates, &ctx.range, self.stop_rule, self.undated);
                    harvest.filtered += sift.filtered;

                    let mut kept = 0;
                    for publication in sift.kept {
                        if seen.insert(publication.link.clone()) {
                            harvest.publications.push(publication);
                            kept += 1;
                        }
                    }
                    info!(
                        "Page {} of {}: {} blocks, {} kept, {} outside date range",
                        page, self.label, found, kept, sift.filtered
                    );

                    if sift.stop {
                        info!(
                            "Reached publications before {} on {}, stopping pagination",
                            ctx.range.start, self.label
                        );
                        break;
                    }
                }
                _ => {
                    empty_streak += 1;
                    info!(
                        "No publications on page {} of {} ({}/{})",
                        page, self.label, empty_streak, self.max_consecutive_empty
                    );
                    if empty_streak >= self.max_consecutive_empty {
                        break;
                    }
                }
            }

            if self.scheme == PageScheme::Single {
                break;
            }

            page += 1;
            ctx.fetcher.pause().await;
        }

        info!(
            "Finished {}: {} publications from {} pages",
            self.label,
            harvest.publications.len(),
            harvest.pages
        );
        Ok(harvest)
    }
}
