//! Trilegal knowledge repository

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::dates::DateFormat;
use crate::fetcher::dom::{absolute_url, element_text, first_text, joined_texts, selector};
use crate::listing::{Harvest, Listing, PageScheme, StopRule, UndatedPolicy};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "Trilegal";
const MAX_PAGES: u32 = 100;

pub struct TrilegalScraper {
    config: FirmConfig,
}

impl TrilegalScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "trilegal",
                name: COMPANY,
                table: "trilegal_publications",
                base_url: "https://trilegal.com",
            },
        }
    }
}

#[async_trait]
impl FirmScraper for TrilegalScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        Listing::new(
            "Trilegal knowledge repository",
            format!("{}/knowledge-repository/", self.config.base_url),
        )
        .paged(PageScheme::PathSegment, MAX_PAGES)
        .stop_rule(StopRule::FirstStale)
        .undated(UndatedPolicy::Keep)
        .crawl(ctx, parse_repository)
        .await
    }
}

struct Selectors {
    link: Selector,
    kind: Selector,
    date: Selector,
    heading: Selector,
    tags: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            link: selector(r#"a[href*="knowledge_repository"]"#)?,
            kind: selector("div.info span.type")?,
            date: selector("div.info span.date")?,
            heading: selector("h3")?,
            tags: selector("div.tags a")?,
        })
    }
}

/// Pagination links also match the repository selector
fn is_article_href(href: &str) -> bool {
    !href.contains("knowledge-repository/page")
}

/// One publication from a card: `info` holds `div.info` with type and date spans,
/// `heading_scope` the `h3`, and the first of `tag_scopes` with tags gives the practice.
fn publication_from(
    selectors: &Selectors,
    page_url: &str,
    anchor: ElementRef<'_>,
    info: ElementRef<'_>,
    heading_scope: ElementRef<'_>,
    tag_scopes: &[ElementRef<'_>],
) -> Option<Publication> {
    let href = anchor.value().attr("href").filter(|href| is_article_href(href))?;
    let link = absolute_url(page_url, href)?;

    let publication_type = first_text(info, &selectors.kind)?;
    let date_text = info.select(&selectors.date).next().map(element_text)?;

    let heading = first_text(heading_scope, &selectors.heading)
        .or_else(|| Some(element_text(anchor)).filter(|text| !text.is_empty()))?;
    let practice_area = tag_scopes
        .iter()
        .find_map(|scope| joined_texts(*scope, &selectors.tags, " | "));

    Some(Publication {
        company: COMPANY.to_string(),
        publication_type,
        publication_date: DateFormat::DayMonthAbbrevYear.parse(&date_text),
        practice_area,
        heading,
        link,
    })
}

/// Cards are `div.item`, or `article` on older layouts. Failing both, every repository
/// link is read against its parent element.
pub fn parse_repository(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let selectors = Selectors::new()?;
    let item_selector = selector("div.item")?;
    let article_selector = selector("article")?;

    let document = Html::parse_document(html);

    let mut cards: Vec<ElementRef<'_>> = document.select(&item_selector).collect();
    if cards.is_empty() {
        cards = document.select(&article_selector).collect();
    }

    if !cards.is_empty() {
        return Ok(cards
            .into_iter()
            .filter_map(|card| {
                let anchor = card.select(&selectors.link).next()?;
                publication_from(&selectors, page_url, anchor, card, card, &[card])
            })
            .collect());
    }

    Ok(document
        .select(&selectors.link)
        .filter_map(|anchor| {
            let parent = anchor.parent().and_then(ElementRef::wrap)?;
            let mut tag_scopes = vec![parent];
            tag_scopes.extend(parent.parent().and_then(ElementRef::wrap));
            publication_from(&selectors, page_url, anchor, parent, anchor, &tag_scopes)
        })
        .collect())
}
