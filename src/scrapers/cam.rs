//! Cyril Amarchand Mangaldas: three static sections on the firm site plus
//! five practice blogs hosted on their own domains.

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::info;

use crate::dates::{DateFormat, parse_any};
use crate::fetcher::dom::{
    absolute_url, element_text, first_text, next_sibling_elements, selector, slugify,
};
use crate::listing::{Harvest, Listing, PageScheme, StopRule, UndatedPolicy};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "CAM";
const SECTION_DATE_FORMATS: [DateFormat; 2] = [DateFormat::MonthDayYear, DateFormat::MonthYear];

/// Practice blogs, each paginated WordPress-style
const BLOGS: [(&str, &str); 5] = [
    ("https://disputeresolution.cyrilamarchandblogs.com/", "Dispute Resolution"),
    ("https://corporate.cyrilamarchandblogs.com/", "Corporate"),
    ("https://privateclient.cyrilamarchandblogs.com/", "Private Client"),
    ("https://tax.cyrilamarchandblogs.com/", "Tax"),
    ("https://competition.cyrilamarchandblogs.com/", "Competition"),
];

pub struct CamScraper {
    config: FirmConfig,
}

impl CamScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "cam",
                name: COMPANY,
                table: "cam_publications",
                base_url: "https://www.cyrilshroff.com",
            },
        }
    }

    fn section(&self, label: &str, path: &str) -> Listing {
        Listing::new(label, format!("{}{}", self.config.base_url, path))
    }
}

#[async_trait]
impl FirmScraper for CamScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        let mut harvest = self
            .section("CAM publications", "/campublication/")
            .crawl(ctx, parse_publications)
            .await?;
        ctx.fetcher.pause().await;

        harvest.merge(
            self.section("CAM newsletters", "/newsletters/")
                .crawl(ctx, parse_newsletters)
                .await?,
        );
        ctx.fetcher.pause().await;

        harvest.merge(
            self.section("CAM podcasts", "/podcasts/")
                .crawl(ctx, parse_podcasts)
                .await?,
        );

        for (url, practice) in BLOGS {
            ctx.fetcher.pause().await;
            info!("Scraping CAM blog: {}", practice);

            let listing = Listing::new(format!("CAM {practice} blog"), url)
                .paged(PageScheme::PathSegment, 50)
                .stop_rule(StopRule::FirstStale)
                .undated(UndatedPolicy::Keep);
            harvest.merge(
                listing
                    .crawl(ctx, |html, page_url| parse_blog(html, page_url, practice))
                    .await?,
            );
        }

        Ok(harvest)
    }
}

fn section_publication(
    publication_type: &str,
    heading: String,
    link: String,
    date_text: Option<String>,
) -> Publication {
    Publication {
        company: COMPANY.to_string(),
        publication_type: publication_type.to_string(),
        publication_date: date_text.and_then(|text| parse_any(&text, &SECTION_DATE_FORMATS)),
        practice_area: None,
        heading,
        link,
    }
}

fn pdf_link(block: ElementRef<'_>, page_url: &str) -> Result<Option<String>> {
    let pdf_selector = selector(r#"a[href*=".pdf"]"#)?;
    Ok(block
        .select(&pdf_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolute_url(page_url, href)))
}

/// Publications: `h2` title, the date in the paragraph after the first one, and a PDF download
pub fn parse_publications(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let block_selector = selector("div.block-content")?;
    let heading_selector = selector("h2")?;
    let paragraph_selector = selector("p")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for block in document.select(&block_selector) {
        let Some(heading) = first_text(block, &heading_selector) else {
            continue;
        };
        let date_text = block
            .select(&paragraph_selector)
            .next()
            .and_then(|first| next_sibling_elements(first).find(|el| el.value().name() == "p"))
            .map(element_text);
        let Some(link) = pdf_link(block, page_url)? else {
            continue;
        };

        publications.push(section_publication("Publications", heading, link, date_text));
    }

    Ok(publications)
}

/// Newsletters: `h4` title, the issue line in the first `li` ending with the date, PDF download
pub fn parse_newsletters(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let block_selector = selector("div.block-content")?;
    let heading_selector = selector("h4")?;
    let item_selector = selector("li")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for block in document.select(&block_selector) {
        let Some(heading) = first_text(block, &heading_selector) else {
            continue;
        };
        // "Issue 12<br>October 2025": the date is the last text run
        let date_text = block.select(&item_selector).next().and_then(|li| {
            li.text()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .last()
                .map(str::to_string)
        });
        let Some(link) = pdf_link(block, page_url)? else {
            continue;
        };

        publications.push(section_publication("Newsletters", heading, link, date_text));
    }

    Ok(publications)
}

/// Podcasts have no per-episode page; each episode is keyed by a fragment on the listing URL
pub fn parse_podcasts(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let block_selector = selector("div.block-content")?;
    let heading_selector = selector("h2")?;
    let date_selector = selector("ul.dt li")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for block in document.select(&block_selector) {
        let Some(heading) = first_text(block, &heading_selector) else {
            continue;
        };
        let date_text = block.select(&date_selector).nth(1).map(element_text);
        let link = format!(
            "{}#{}",
            page_url.split('#').next().unwrap_or(page_url),
            slugify(&heading, 100)
        );

        publications.push(section_publication("Podcasts", heading, link, date_text));
    }

    Ok(publications)
}

/// One page of a practice blog; the post's first category overrides the blog's practice
pub fn parse_blog(html: &str, page_url: &str, default_practice: &str) -> Result<Vec<Publication>> {
    let header_selector = selector("header.lxb_af-post_header")?;
    let title_selector = selector("h1.lxb_af-template_tags-get_linked_post_title a")?;
    let date_selector = selector("time.lxb_af-template_tags-get_post_date")?;
    let category_selector = selector("div.lxb_af-template_tags-get_post_categories a")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for header in document.select(&header_selector) {
        let Some(title) = header.select(&title_selector).next() else {
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

        let publication_date = first_text(header, &date_selector)
            .and_then(|text| DateFormat::MonthDayYear.parse(&text));
        let practice_area = first_text(header, &category_selector)
            .unwrap_or_else(|| default_practice.to_string());

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: "Blogs".to_string(),
            publication_date,
            practice_area: Some(practice_area),
            heading,
            link,
        });
    }

    Ok(publications)
}
