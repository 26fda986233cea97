//! Economic Laws Practice thought leadership listing

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;

use crate::dates::DateFormat;
use crate::fetcher::dom::{absolute_url, element_text, joined_texts, selector};
use crate::listing::{Harvest, Listing};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "ELP";

pub struct ElpScraper {
    config: FirmConfig,
}

impl ElpScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "elp",
                name: COMPANY,
                table: "elp_publications",
                base_url: "https://elplaw.in",
            },
        }
    }
}

#[async_trait]
impl FirmScraper for ElpScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        Listing::new(
            "ELP thought leadership",
            format!("{}/thought-leadership/", self.config.base_url),
        )
        .crawl(ctx, parse_thought_leadership)
        .await
    }
}

/// Each card is a `figcaption`: `<p><span>type</span><span>4th Nov 2025</span></p>`,
/// then the title paragraph, then a paragraph of practice links, then a `.btn` link.
/// Cards missing any of type, date, title or link are skipped.
pub fn parse_thought_leadership(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let card_selector = selector("figcaption")?;
    let paragraph_selector = selector("p")?;
    let span_selector = selector("span")?;
    let anchor_selector = selector("a")?;
    let button_selector = selector("a.btn[href]")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for card in document.select(&card_selector) {
        let paragraphs: Vec<_> = card.select(&paragraph_selector).collect();
        let Some(meta) = paragraphs.first() else {
            continue;
        };

        let spans: Vec<String> = meta.select(&span_selector).map(element_text).collect();
        let (Some(publication_type), Some(date_text)) = (spans.first(), spans.get(1)) else {
            continue;
        };
        let Some(publication_date) = DateFormat::OrdinalDayMonthAbbrevYear.parse(date_text) else {
            continue;
        };

        let Some(heading) = paragraphs
            .get(1)
            .map(|p| element_text(*p))
            .filter(|text| !text.is_empty())
        else {
            continue;
        };
        let practice_area = paragraphs
            .get(2)
            .and_then(|p| joined_texts(*p, &anchor_selector, " | "));

        let Some(link) = card
            .select(&button_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| absolute_url(page_url, href))
        else {
            continue;
        };

        if publication_type.is_empty() {
            continue;
        }

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: publication_type.clone(),
            publication_date: Some(publication_date),
            practice_area,
            heading,
            link,
        });
    }

    Ok(publications)
}
