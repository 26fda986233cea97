//! Lakshmikumaran & Sridharan: articles, news briefings and ten newsletter series

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use tracing::info;

use crate::dates::{DateFormat, newsletter_title_date, quarterly_title_date};
use crate::fetcher::dom::{absolute_url, element_text, first_text, selector};
use crate::listing::{Harvest, Listing, PageScheme, StopRule};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "LKS";
const MAX_PAGES: u32 = 50;

/// Newsletter series under `/insights/newsletters/`, with the practice each covers
const NEWSLETTERS: [(&str, &str); 10] = [
    ("tax-amicus", "Tax"),
    ("direct-tax-amicus", "Direct Tax"),
    ("international-trade-amicus", "International Trade"),
    ("ipr-amicus", "IPR"),
    ("corporate-amicus", "Corporate"),
    ("competition-law", "Competition Law"),
    ("quarterly-update", "Corporate Quarterly Updates"),
    ("lks-bis-amicus", "BIS"),
    ("technolawgy-bulletin", "Technology"),
    ("hyma-newsletter", "M&A"),
];

/// Which `div.inner_sec` listing is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    Articles,
    Alerts,
}

pub struct LksScraper {
    config: FirmConfig,
}

impl LksScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "lks",
                name: COMPANY,
                table: "lks_publications",
                base_url: "https://www.lakshmisri.com",
            },
        }
    }

    fn listing(&self, label: impl Into<String>, path: &str) -> Listing {
        Listing::new(label, format!("{}{}", self.config.base_url, path))
            .paged(PageScheme::QueryParam, MAX_PAGES)
            .stop_rule(StopRule::PageAllStale)
    }
}

#[async_trait]
impl FirmScraper for LksScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        let mut harvest = self
            .listing("LKS articles", "/insights/articles/")
            .crawl(ctx, |html, url| parse_insights(html, url, InsightKind::Articles))
            .await?;
        ctx.fetcher.pause().await;

        harvest.merge(
            self.listing("LKS news briefings", "/newsroom/news-briefings/")
                .crawl(ctx, |html, url| parse_insights(html, url, InsightKind::Alerts))
                .await?,
        );

        for (slug, series) in NEWSLETTERS {
            ctx.fetcher.pause().await;
            info!("Scraping LKS newsletter: {}", series);

            harvest.merge(
                self.listing(
                    format!("LKS {series} newsletter"),
                    &format!("/insights/newsletters/{slug}/"),
                )
                .crawl(ctx, |html, url| parse_newsletters(html, url, series))
                .await?,
            );
        }

        Ok(harvest)
    }
}

/// `div.inner_sec` blocks: `h2` title (link inside), `p.date` like `16 September 2025`.
/// Articles carry a `p.typePractice`; briefings have no practice.
pub fn parse_insights(html: &str, page_url: &str, kind: InsightKind) -> Result<Vec<Publication>> {
    let block_selector = selector("div.inner_sec")?;
    let title_selector = selector("h2")?;
    let anchor_selector = selector("a[href]")?;
    let date_selector = selector("p.date")?;
    let practice_selector = selector("p.typePractice")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for block in document.select(&block_selector) {
        let Some(title) = block.select(&title_selector).next() else {
            continue;
        };
        let Some(anchor) = title.select(&anchor_selector).next() else {
            continue;
        };
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| absolute_url(page_url, href))
        else {
            continue;
        };
        let heading = Some(element_text(anchor))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| element_text(title));
        if heading.is_empty() {
            continue;
        }

        let publication_date =
            first_text(block, &date_selector).and_then(|text| DateFormat::DayMonthYear.parse(&text));
        let (publication_type, practice_area) = match kind {
            InsightKind::Articles => ("Articles", first_text(block, &practice_selector)),
            InsightKind::Alerts => ("Alerts/Updates", None),
        };

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: publication_type.to_string(),
            publication_date,
            practice_area,
            heading,
            link,
        });
    }

    Ok(publications)
}

/// `div.news_sec` blocks whose `a.desc_title` text is the only date source:
/// `Tax Amicus: June 2025`, or a month span for the quarterly series.
pub fn parse_newsletters(html: &str, page_url: &str, series: &str) -> Result<Vec<Publication>> {
    let block_selector = selector("div.news_sec")?;
    let title_selector = selector("a.desc_title")?;

    let quarterly = series.to_lowercase().contains("quarterly");
    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for block in document.select(&block_selector) {
        let Some(title) = block.select(&title_selector).next() else {
            continue;
        };
        let heading = element_text(title);
        let Some(link) = title
            .value()
            .attr("href")
            .and_then(|href| absolute_url(page_url, href))
        else {
            continue;
        };
        if heading.is_empty() {
            continue;
        }

        let publication_date = if quarterly {
            quarterly_title_date(&heading)
        } else {
            newsletter_title_date(&heading)
        };

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: format!("Newsletter - {series}"),
            publication_date,
            practice_area: Some(series.to_string()),
            heading,
            link,
        });
    }

    Ok(publications)
}
