//! Small DOM helpers shared by the firm parsers

use anyhow::{Result, anyhow};
use reqwest::Url;
use scraper::{ElementRef, Selector};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Failed to parse selector '{}': {:?}", css, e))
}

/// Element text on one line, whitespace runs collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match under `element`, if it is non-empty
pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Non-empty texts of every match under `element`, joined with `separator`
pub fn joined_texts(element: ElementRef<'_>, selector: &Selector, separator: &str) -> Option<String> {
    let texts: Vec<String> = element
        .select(selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join(separator))
    }
}

/// Resolve `href` against the page it appeared on
pub fn absolute_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .ok()
}

/// Walk up from `element` to the closest ancestor whose tag is one of `names`.
///
/// `max_depth` bounds how many levels are inspected; `None` walks to the root.
pub fn nearest_ancestor<'a>(
    element: ElementRef<'a>,
    names: &[&str],
    max_depth: Option<usize>,
) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(max_depth.unwrap_or(usize::MAX))
        .find(|ancestor| names.contains(&ancestor.value().name()))
}

/// Following sibling elements of `element`, skipping text nodes
pub fn next_sibling_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Lowercase, alphanumeric-and-dash slug truncated to `max_len` characters
pub fn slugify(text: &str, max_len: usize) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    #[test]
    fn element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<div>  Corporate \n <b>Update</b>\t2025 </div>");
        let div = html.select(&selector("div").unwrap()).next().unwrap();

        assert_eq!(element_text(div), "Corporate Update 2025");
    }

    #[test]
    fn joined_texts_skips_empty_matches() {
        let html = Html::parse_fragment(
            r#"<div class="tags"><a>Tax</a><a> </a><a>Disputes</a></div>"#,
        );
        let div = html.select(&selector("div.tags").unwrap()).next().unwrap();

        assert_eq!(
            joined_texts(div, &selector("a").unwrap(), " | ").as_deref(),
            Some("Tax | Disputes")
        );
        assert_eq!(joined_texts(div, &selector("span").unwrap(), " | "), None);
    }

    #[test]
    fn absolute_url_joins_relative_and_keeps_absolute() {
        assert_eq!(
            absolute_url("https://www.azbpartners.com/resource/", "/resource/a-note/").as_deref(),
            Some("https://www.azbpartners.com/resource/a-note/")
        );
        assert_eq!(
            absolute_url("https://induslaw.com/publication", "https://cdn.example.com/x.pdf").as_deref(),
            Some("https://cdn.example.com/x.pdf")
        );
        assert_eq!(absolute_url("https://induslaw.com/", "  "), None);
        assert_eq!(absolute_url("not a url", "/x"), None);
    }

    #[test]
    fn nearest_ancestor_stops_at_depth() {
        let html = Html::parse_fragment(
            r#"<a href="/insight/one"><div><div><div class="insight-text"><h3>T</h3></div></div></div></a>"#,
        );
        let text = html
            .select(&selector("div.insight-text").unwrap())
            .next()
            .unwrap();

        let anchor = nearest_ancestor(text, &["a"], Some(5)).unwrap();
        assert_eq!(anchor.value().attr("href"), Some("/insight/one"));
        assert!(nearest_ancestor(text, &["a"], Some(2)).is_none());
        assert!(nearest_ancestor(text, &["article"], None).is_none());
    }

    #[test]
    fn slugify_matches_blog_permalinks() {
        assert_eq!(
            slugify("SEBI's New Framework: What Changes in 2025?", 100),
            "sebis-new-framework-what-changes-in-2025"
        );
        assert_eq!(slugify("A B C", 3), "a-b");
    }
}
