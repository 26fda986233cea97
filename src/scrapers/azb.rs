//! AZB & Partners resource listing

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use tracing::debug;

use crate::dates::DateFormat;
use crate::fetcher::dom::{absolute_url, element_text, first_text, selector};
use crate::listing::{Harvest, Listing, PageScheme, StopRule};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "AZB Partners";

pub struct AzbScraper {
    config: FirmConfig,
}

impl AzbScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "azb",
                name: COMPANY,
                table: "azb_partners_publications",
                base_url: "https://www.azbpartners.com",
            },
        }
    }

    fn listing(&self) -> Listing {
        Listing::new(
            "AZB resources",
            format!("{}/resource/", self.config.base_url),
        )
        .paged(PageScheme::PathSegment, 200)
        .tolerate_empty_pages(2)
        .stop_rule(StopRule::PageAllStale)
    }
}

#[async_trait]
impl FirmScraper for AzbScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        self.listing().crawl(ctx, parse_resources).await
    }
}

/// Parse the `div.resource-blk` blocks on one resource page. Deals are not publications.
pub fn parse_resources(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let block_selector = selector("div.resource-blk")?;
    let label_selector = selector("span.label-span")?;
    let heading_selector = selector("h3")?;
    let link_selector = selector("a[href]")?;
    let tags_selector = selector("div.resource-tags")?;
    let date_selector = selector("span")?;
    let practice_selector = selector("a")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for block in document.select(&block_selector) {
        let Some(publication_type) = first_text(block, &label_selector) else {
            continue;
        };
        if publication_type.eq_ignore_ascii_case("deals") {
            debug!("Skipping deal block");
            continue;
        }

        let Some(heading) = first_text(block, &heading_selector) else {
            continue;
        };
        let Some(link) = block
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_url(page_url, href))
        else {
            continue;
        };

        let tags = block.select(&tags_selector).next();
        let publication_date = tags
            .and_then(|tags| tags.select(&date_selector).next())
            .and_then(|span| DateFormat::MonthAbbrevDayYear.parse(&element_text(span)));
        let practice_area = tags.and_then(|tags| first_text(tags, &practice_selector));

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type,
            publication_date,
            practice_area,
            heading,
            link,
        });
    }

    Ok(publications)
}
