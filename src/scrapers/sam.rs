//! Shardul Amarchand Mangaldas: insights browsed per practice category and publication type

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info};

use crate::dates::DateFormat;
use crate::fetcher::dom::{absolute_url, first_text, nearest_ancestor, selector};
use crate::listing::{Harvest, Listing, PageScheme, StopRule};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "SAM";
const MAX_PAGES: u32 = 20;

const PRACTICES: [(&str, &str); 7] = [
    ("General Corporate", "general-corporate"),
    ("Private Equity", "private-equity"),
    ("Banking & Finance", "banking-finance"),
    ("Insolvency & Restructuring", "insolvency-restructuring-reports"),
    ("Capital Markets", "capital-markets"),
    ("Tax", "tax"),
    ("Intellectual Property", "intellectual-property"),
];

const PUBLICATION_TYPES: [(&str, &str); 3] = [
    ("Articles/Alerts", "?category=alerts"),
    ("Reports", "?category=reports"),
    ("Research Papers", "?category=research-papers"),
];

pub struct SamScraper {
    config: FirmConfig,
}

impl SamScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "sam",
                name: COMPANY,
                table: "sam_publications",
                base_url: "https://www.amsshardul.com",
            },
        }
    }

    /// `/insight-category/{slug}/?category=x`, then `/insight-category/{slug}/page/{n}/?category=x`
    fn listing(&self, practice: &str, slug: &str, publication_type: &str, param: &str) -> Listing {
        Listing::new(
            format!("SAM {practice} - {publication_type}"),
            format!("{}/insight-category/{}/{}", self.config.base_url, slug, param),
        )
        .paged(PageScheme::PathSegmentWithSuffix(param.to_string()), MAX_PAGES)
        .tolerate_empty_pages(2)
        .stop_rule(StopRule::PageWithStale)
    }
}

#[async_trait]
impl FirmScraper for SamScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        let mut harvest = Harvest::default();
        let mut first = true;

        for (practice, slug) in PRACTICES {
            info!("Scraping SAM practice: {}", practice);

            for (publication_type, param) in PUBLICATION_TYPES {
                if !first {
                    ctx.fetcher.pause().await;
                }
                first = false;

                harvest.merge(
                    self.listing(practice, slug, publication_type, param)
                        .crawl(ctx, |html, url| parse_insights(html, url, practice, publication_type))
                        .await?,
                );
            }
        }

        Ok(harvest)
    }
}

/// `div.insight-text` cards: `div.date p` like `October 15, 2025` and an `h3` title.
/// The link sits on an `<a>` wrapping the whole card a few levels up.
/// Type and practice come from the listing being browsed.
pub fn parse_insights(
    html: &str,
    page_url: &str,
    practice: &str,
    publication_type: &str,
) -> Result<Vec<Publication>> {
    let card_selector = selector("div.insight-text")?;
    let date_selector = selector("div.date p")?;
    let title_selector = selector("h3")?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for card in document.select(&card_selector) {
        let date_text = first_text(card, &date_selector);
        let heading = first_text(card, &title_selector);
        let link = nearest_ancestor(card, &["a"], Some(5))
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| absolute_url(page_url, href));

        let (Some(date_text), Some(heading), Some(link)) = (date_text, heading, link) else {
            debug!("Skipping incomplete SAM card on {}", page_url);
            continue;
        };

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: publication_type.to_string(),
            publication_date: DateFormat::MonthDayYear.parse(&date_text),
            practice_area: Some(practice.to_string()),
            heading,
            link,
        });
    }

    Ok(publications)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn cards_take_link_from_wrapping_anchor() {
        let html = r#"
            <div class="insights">
              <a href="https://www.amsshardul.com/insight/sebi-circular/">
                <div class="insight-card"><div class="insight-body">
                  <div class="insight-text">
                    <div class="date"><p>October 15, 2025</p></div>
                    <h3>SEBI circular on related party transactions</h3>
                  </div>
                </div></div>
              </a>
              <div class="insight-text"><div class="date"><p>May 2, 2025</p></div><h3>No wrapping link</h3></div>
              <a href="/insight/undated/"><div class="insight-text"><h3>No date</h3></div></a>
            </div>
        "#;

        let publications = parse_insights(
            html,
            "https://www.amsshardul.com/insight-category/tax/?category=alerts",
            "Tax",
            "Articles/Alerts",
        )
        .unwrap();

        assert_eq!(publications.len(), 1);
        let first = &publications[0];
        assert_eq!(first.link, "https://www.amsshardul.com/insight/sebi-circular/");
        assert_eq!(first.publication_date, NaiveDate::from_ymd_opt(2025, 10, 15));
        assert_eq!(first.practice_area.as_deref(), Some("Tax"));
        assert_eq!(first.publication_type, "Articles/Alerts");
    }

    #[test]
    fn listing_pages_keep_category_after_page_segment() {
        let listing = SamScraper::new().listing("Tax", "tax", "Reports", "?category=reports");

        assert_eq!(
            listing.first_url,
            "https://www.amsshardul.com/insight-category/tax/?category=reports"
        );
        assert_eq!(
            listing.scheme.url(&listing.first_url, 3),
            "https://www.amsshardul.com/insight-category/tax/page/3/?category=reports"
        );
        assert_eq!(listing.scheme, PageScheme::PathSegmentWithSuffix("?category=reports".into()));
        assert_eq!(listing.max_consecutive_empty, 2);
    }
}
