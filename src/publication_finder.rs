use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info, warn};

use crate::database::Database;
use crate::models::{DateRange, FirmSummary};
use crate::scrapers;
use crate::traits::{FirmScraper, ScrapeContext};

/// Outcome of a run over one or more firms
#[derive(Debug, Default)]
pub struct RunReport {
    pub summaries: Vec<FirmSummary>,
    /// Keys of firms whose scrape failed outright
    pub failed_firms: Vec<String>,
}

impl RunReport {
    pub fn total_saved(&self) -> usize {
        self.summaries.iter().map(|s| s.saved).sum()
    }
}

#[derive(Clone)]
pub struct PublicationFinder {
    ctx: ScrapeContext,
    /// `None` in dry-run mode: publications are logged instead of stored
    database: Option<Database>,
    scrapers: Arc<Vec<Box<dyn FirmScraper>>>,
}

impl PublicationFinder {
    pub fn new(ctx: ScrapeContext, database: Option<Database>) -> Self {
        Self::with_scrapers(ctx, database, scrapers::all())
    }

    pub fn with_scrapers(
        ctx: ScrapeContext,
        database: Option<Database>,
        scrapers: Vec<Box<dyn FirmScraper>>,
    ) -> Self {
        Self {
            ctx,
            database,
            scrapers: Arc::new(scrapers),
        }
    }

    /// Same finder, filtering on a different date range
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.ctx.range = range;
        self
    }

    /// Scrape every firm in turn. One firm failing does not stop the others.
    pub async fn run_all(&self) -> RunReport {
        let mut report = RunReport::default();

        for (idx, scraper) in self.scrapers.iter().enumerate() {
            if idx > 0 {
                self.ctx.fetcher.pause().await;
            }

            let key = scraper.config().key;
            match self.run_scraper(scraper.as_ref()).await {
                Ok(summary) => report.summaries.push(summary),
                Err(e) => {
                    error!("Error scraping {}: {:#}", key, e);
                    report.failed_firms.push(key.to_string());
                }
            }
        }

        info!(
            "Run complete: {} firms scraped, {} failed, {} new publications",
            report.summaries.len(),
            report.failed_firms.len(),
            report.total_saved()
        );
        report
    }

    /// Scrape the firm registered under `key`
    pub async fn run_firm(&self, key: &str) -> Result<FirmSummary> {
        let scraper = self
            .scrapers
            .iter()
            .find(|scraper| scraper.config().key.eq_ignore_ascii_case(key.trim()))
            .ok_or_else(|| anyhow!("Unknown firm '{}'", key))?;

        self.run_scraper(scraper.as_ref()).await
    }

    async fn run_scraper(&self, scraper: &dyn FirmScraper) -> Result<FirmSummary> {
        let config = scraper.config();
        info!(
            "Scraping {} publications from {} to {}",
            config.name, self.ctx.range.start, self.ctx.range.end
        );

        let harvest = scraper
            .scrape(&self.ctx)
            .await
            .with_context(|| format!("Scraping {} failed", config.name))?;

        let mut summary = FirmSummary::new(config.name);
        summary.found = harvest.publications.len();
        summary.filtered = harvest.filtered;

        match &self.database {
            Some(database) => {
                for publication in &harvest.publications {
                    match database.upsert(config.table, publication).await {
                        Ok(outcome) => summary.record(outcome),
                        Err(e) => {
                            warn!("Failed to save '{}': {:#}", publication.heading, e);
                            summary.failed += 1;
                        }
                    }
                }
            }
            None => {
                for publication in &harvest.publications {
                    info!(
                        "[dry run] {} | {} | {} | {}",
                        publication
                            .publication_date
                            .map_or_else(|| "undated".to_string(), |d| d.to_string()),
                        publication.publication_type,
                        publication.heading,
                        publication.link
                    );
                }
            }
        }

        info!(
            "{}: {} found over {} pages, {} new, {} updated, {} unchanged, {} filtered, {} failed",
            summary.firm,
            summary.found,
            harvest.pages,
            summary.saved,
            summary.updated,
            summary.unchanged,
            summary.filtered,
            summary.failed
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::fetcher::test_support::fast_fetcher;
    use crate::listing::Harvest;
    use crate::models::Publication;
    use crate::traits::FirmConfig;

    struct FixedScraper {
        config: FirmConfig,
        fail: bool,
    }

    impl FixedScraper {
        fn boxed(key: &'static str, fail: bool) -> Box<dyn FirmScraper> {
            Box::new(Self {
                config: FirmConfig {
                    key,
                    name: key,
                    table: "test_publications",
                    base_url: "http://localhost",
                },
                fail,
            })
        }
    }

    #[async_trait]
    impl FirmScraper for FixedScraper {
        fn config(&self) -> &FirmConfig {
            &self.config
        }

        async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
            if self.fail {
                bail!("site unreachable");
            }

            Ok(Harvest {
                publications: vec![Publication {
                    company: self.config.name.to_string(),
                    publication_type: "Article".to_string(),
                    publication_date: Some(ctx.range.start),
                    practice_area: None,
                    heading: "Heading".to_string(),
                    link: format!("{}/a", self.config.base_url),
                }],
                filtered: 3,
                pages: 1,
            })
        }
    }

    fn finder(scrapers: Vec<Box<dyn FirmScraper>>) -> PublicationFinder {
        let ctx = ScrapeContext {
            fetcher: fast_fetcher(),
            range: DateRange::default(),
            max_pages: 1,
        };
        PublicationFinder::with_scrapers(ctx, None, scrapers)
    }

    #[tokio::test]
    async fn failing_firm_does_not_stop_the_run() {
        let finder = finder(vec![
            FixedScraper::boxed("first", false),
            FixedScraper::boxed("broken", true),
            FixedScraper::boxed("last", false),
        ]);

        let report = finder.run_all().await;

        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.failed_firms, vec!["broken".to_string()]);
        assert_eq!(report.summaries[1].firm, "last");
        assert_eq!(report.summaries[0].found, 1);
        assert_eq!(report.summaries[0].filtered, 3);
        assert_eq!(report.total_saved(), 0);
    }

    #[tokio::test]
    async fn run_firm_matches_key_ignoring_case() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );
        let finder = finder(vec![FixedScraper::boxed("only", false)]).with_range(range);

        let summary = finder.run_firm("ONLY").await.unwrap();
        assert_eq!(summary.firm, "only");
        assert_eq!(summary.found, 1);

        assert!(finder.run_firm("missing").await.is_err());
    }
}
