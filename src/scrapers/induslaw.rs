//! IndusLaw publication listing

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::dates::DateFormat;
use crate::fetcher::dom::{absolute_url, element_text, nearest_ancestor, selector};
use crate::listing::{Harvest, Listing, UndatedPolicy};
use crate::models::Publication;
use crate::traits::{FirmConfig, FirmScraper, ScrapeContext};

const COMPANY: &str = "IndusLaw";
const PRACTICE_LABEL: &str = "Practice Area :";
const DATE_LABEL: &str = "Published on :";

pub struct IndusLawScraper {
    config: FirmConfig,
}

impl IndusLawScraper {
    pub fn new() -> Self {
        Self {
            config: FirmConfig {
                key: "induslaw",
                name: COMPANY,
                table: "induslaw_publications",
                base_url: "https://induslaw.com",
            },
        }
    }
}

#[async_trait]
impl FirmScraper for IndusLawScraper {
    fn config(&self) -> &FirmConfig {
        &self.config
    }

    async fn scrape(&self, ctx: &ScrapeContext) -> Result<Harvest> {
        Listing::new(
            "IndusLaw publications",
            format!("{}/publication", self.config.base_url),
        )
        .undated(UndatedPolicy::Keep)
        .crawl(ctx, parse_publications)
        .await
    }
}

/// `<strong>` elements under `container` whose text is `label`
fn labelled<'a>(container: ElementRef<'a>, label: &str) -> Option<ElementRef<'a>> {
    container
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "strong" && element_text(*el) == label)
}

/// First `<span>` after `marker` in document order within `container`
fn span_after<'a>(container: ElementRef<'a>, marker: ElementRef<'a>) -> Option<ElementRef<'a>> {
    container
        .descendants()
        .filter_map(ElementRef::wrap)
        .skip_while(|el| el.id() != marker.id())
        .skip(1)
        .find(|el| el.value().name() == "span")
}

fn practice_area_of(container: ElementRef<'_>) -> Result<Option<String>> {
    let anchor_selector = selector("a")?;

    Ok(labelled(container, PRACTICE_LABEL)
        .and_then(|label| span_after(container, label))
        .and_then(|span| {
            span.select(&anchor_selector)
                .next()
                .map(element_text)
                .or_else(|| Some(element_text(span)))
        })
        .filter(|text| !text.is_empty()))
}

fn published_on(container: ElementRef<'_>) -> Option<String> {
    let label = labelled(container, DATE_LABEL)?;
    let line = label.parent().and_then(ElementRef::wrap)?;
    let text = element_text(line);
    let value = text.strip_prefix(DATE_LABEL).unwrap_or(&text).trim();

    (!value.is_empty()).then(|| value.to_string())
}

/// Title anchors (`a.mediatitle`) carry the heading and link; their enclosing `div`
/// holds the labelled practice area and `DD/MM/YYYY` publication date.
pub fn parse_publications(html: &str, page_url: &str) -> Result<Vec<Publication>> {
    let title_selector = selector(r#"a.mediatitle[target="_blank"]"#)?;

    let document = Html::parse_document(html);
    let mut publications = Vec::new();

    for title in document.select(&title_selector) {
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

        let container = nearest_ancestor(title, &["div"], None);
        let (practice_area, date_text) = match container {
            Some(container) => (practice_area_of(container)?, published_on(container)),
            None => (None, None),
        };
        let publication_date =
            date_text.and_then(|text| DateFormat::NumericDayMonthYear.parse(&text));

        publications.push(Publication {
            company: COMPANY.to_string(),
            publication_type: "Publication".to_string(),
            publication_date,
            practice_area,
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
    fn reads_labelled_fields_from_enclosing_div() {
        let html = r#"
            <div class="media-body">
              <h4><a class="mediatitle" target="_blank" href="/publication/data-protection-rules">DPDP Rules notified</a></h4>
              <p><strong>Practice Area :</strong> <span><a href="/practice/tmt">Technology, Media and Telecom</a></span></p>
              <p><strong>Published on  :</strong> 16/09/2025</p>
            </div>
            <div class="media-body">
              <h4><a class="mediatitle" target="_blank" href="https://induslaw.com/publication/undated">Undated note</a></h4>
            </div>
            <div><a class="mediatitle" href="/not-a-title">Same tab link</a></div>
        "#;

        let publications = parse_publications(html, "https://induslaw.com/publication").unwrap();

        assert_eq!(publications.len(), 2);
        let first = &publications[0];
        assert_eq!(first.heading, "DPDP Rules notified");
        assert_eq!(first.link, "https://induslaw.com/publication/data-protection-rules");
        assert_eq!(first.practice_area.as_deref(), Some("Technology, Media and Telecom"));
        assert_eq!(first.publication_date, NaiveDate::from_ymd_opt(2025, 9, 16));

        let second = &publications[1];
        assert_eq!(second.practice_area, None);
        assert_eq!(second.publication_date, None);
    }
}
