//! Khaitan & Co.: thought leadership and news listings, each article page
//! visited once more for its practice area, plus the Compass blog.

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use crate::dates::DateFormat;
use crate::fetcher::dom::{absolute_url, element_text, first_text, joined_texts, nearest_ancestor, selector, slugify};
use crate::listing::{Harvest, Listing, UndatedPolicy};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "Khaitan & Co.";
const COMPASS_BASE: &str = "https://compass.khaitanco.com";

static LISTING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+'\d{2}")
        .expect("valid listing date regex")
});
static BLOG_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}",
    )
    .expect("valid blog date regex")
});

/// The two listing pages on the main site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    ThoughtLeadership,
    NewsAndEvents,
}

impl Section {
    fn path(self) -> &'static str {
        match self {
            Self::ThoughtLeadership => "thought-leadership",
            Self::NewsAndEvents => "news-and-events",
        }
    }

    /// News cards repeat short labels ("Read more") as links; real titles are longer
    fn min_title_len(self) -> usize {
        match self {
            Self::ThoughtLeadership => 1,
            Self::NewsAndEvents => 10,
        }
    }

    fn publication_type(self, card_text: &str) -> &'static str {
        match self {
            Self::NewsAndEvents => "News/Event",
            Self::ThoughtLeadership => {
                const KINDS: [&str; 4] = ["Ergo Update", "Ergo Newsflash", "Ergo Newsletter", "Article"];
                KINDS
                    .into_iter()
                    .find(|kind| card_text.contains(kind))
                    .unwrap_or("Unknown")
            }
        }
    }
}

pub struct KhaitanScraper {
    config: FirmConfig,
}

impl KhaitanScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "khaitan",
                name: COMPANY,
                table: "khaitan_publications",
                base_url: "https://www.khaitanco.com",
            },
        }
    }

    async fn scrape_section(&self, ctx: &ScrapeContext, section: Section) -> Result<Harvest> {
        let listing = Listing::new(
            format!("Khaitan {}", section.path()),
            format!("{}/{}", self.config.base_url, section.path()),
        )
        .undated(UndatedPolicy::Keep);

        let mut harvest = listing
            .crawl(ctx, |html, page_url| parse_section(html, page_url, section))
            .await?;
        fill_practice_areas(ctx, &mut harvest).await?;
        Ok(harvest)
    }
}

#[async_trait]
impl FirmScraper for KhaitanScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        let mut harvest = self.scrape_section(ctx, Section::ThoughtLeadership).await?;
        ctx.fetcher.pause().await;

        harvest.merge(self.scrape_section(ctx, Section::NewsAndEvents).await?);
        ctx.fetcher.pause().await;

        harvest.merge(
            Listing::new("Khaitan Compass blog", format!("{COMPASS_BASE}/blog/list/0"))
                .crawl(ctx, |html, _| parse_compass_blog(html, COMPASS_BASE))
                .await?,
        );

        Ok(harvest)
    }
}

/// Visit each kept article once to read its practice area. PDFs have none.
async fn fill_practice_areas(ctx: &ScrapeContext, harvest: &mut Harvest) -> Result<()> {
    for publication in &mut harvest.publications {
        if publication.practice_area.is_some() || publication.link.to_lowercase().ends_with(".pdf") {
            continue;
        }

        debug!("Fetching practice area from {}", publication.link);
        match ctx.fetcher.fetch(&publication.link).await {
            Ok(Some(html)) => {
                publication.practice_area = extract_practice_area(&html)?;
                if publication.practice_area.is_none() {
                    info!("No practice area on {}", publication.link);
                }
            }
            Ok(None) => info!("Article page gone: {}", publication.link),
            Err(e) => warn!("Could not fetch practice area for {}: {:#}", publication.link, e),
        }

        ctx.fetcher.pause().await;
    }

    Ok(())
}

/// Anchors pointing at `/{section}/{slug}`, one publication per distinct URL.
/// Date and type come from the text of the anchor's enclosing card.
pub fn parse_section(html: &str, page_url: &str, section: Section) -> Result<Vec<Publication>> {
    let href_pattern = Regex::new(&format!("/{}/[^/]+", section.path()))?;
    let anchor_selector = selector("a[href]")?;

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut publications = Vec::new();

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href").filter(|href| href_pattern.is_match(href)) else {
            continue;
        };
        let Some(link) = absolute_url(page_url, href) else {
            continue;
        };
        if !seen.insert(link.clone()) {
            continue;
        }

        let heading = element_text(anchor);
        if heading.chars().count() < section.min_title_len() {
            continue;
        }

        let card_text: String = nearest_ancestor(anchor, &["div", "article", "li"], None)
            .map(|card| card.text().collect())
            .unwrap_or_default();
        let publication_date = LISTING_DATE
            .find(&card_text)
            .and_then(|m| DateFormat::DayMonthShortYear.parse(m.as_str()));

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: section.publication_type(&card_text).to_string(),
            publication_date,
            practice_area: None,
            heading,
            link,
        });
    }

    Ok(publications)
}

fn has_practice_class(element: ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| class.to_lowercase().contains("practice"))
}

/// Practice area from an article page: the footer paragraph, else the tag list, else any
/// short element whose class mentions "practice".
pub fn extract_practice_area(html: &str) -> Result<Option<String>> {
    let footer_selector = selector("div.public-footer p")?;
    let tag_list_selector = selector("ul.flex.gap-2")?;
    let tag_selector = selector("li a")?;
    let candidate_selector = selector("div, span, p, a")?;

    let document = Html::parse_document(html);
    let root = document.root_element();

    if let Some(area) = first_text(root, &footer_selector) {
        return Ok(Some(area));
    }

    if let Some(area) = document
        .select(&tag_list_selector)
        .find_map(|list| joined_texts(list, &tag_selector, ", "))
    {
        return Ok(Some(area));
    }

    Ok(document
        .select(&candidate_selector)
        .filter(|el| has_practice_class(*el))
        .map(element_text)
        .find(|text| (6..100).contains(&text.chars().count())))
}

/// The Compass blog list has no per-post markup worth selecting, so it is read as text:
/// a line carrying a date opens a post, and the first long line after it is the title.
pub fn parse_compass_blog(html: &str, base_url: &str) -> Result<Vec<Publication>> {
    const SKIP: [&str; 3] = ["the latest news", "resources", "http"];

    let document = Html::parse_document(html);
    let text: String = document.root_element().text().collect();

    let mut posts: Vec<(String, Option<String>)> = Vec::new();
    for line in text.lines().map(str::trim).filter(|line| line.len() >= 5) {
        if let Some(date) = BLOG_DATE.find(line) {
            posts.push((date.as_str().to_string(), None));
            continue;
        }

        if let Some((_, heading)) = posts.last_mut()
            && heading.is_none()
        {
            let lower = line.to_lowercase();
            if line.chars().count() > 30 && !SKIP.iter().any(|skip| lower.contains(skip)) {
                *heading = Some(line.to_string());
            }
        }
    }

    Ok(posts
        .into_iter()
        .filter_map(|(date, heading)| {
            let heading = heading?;
            Some(Publication {
                company: COMPANY.to_string(),
                publication_type: "Blog".to_string(),
                publication_date: DateFormat::DayMonthYear.parse(&date),
                practice_area: None,
                link: format!("{}/{}", base_url.trim_end_matches('/'), slugify(&heading, 100)),
                heading,
            })
        })
        .collect())
}
