pub mod azb;
pub mod cam;
pub mod elp;
pub mod induslaw;
pub mod khaitan;
pub mod lks;
pub mod sam;
pub mod trilegal;

use crate::traits::FirmScraper;

/// Every supported firm, in the order a full run visits them
pub fn all() -> Vec<Box<dyn FirmScraper>> {
    vec![
        Box::new(azb::AzbScraper::new()),
        Box::new(cam::CamScraper::new()),
        Box::new(elp::ElpScraper::new()),
        Box::new(induslaw::IndusLawScraper::new()),
        Box::new(khaitan::KhaitanScraper::new()),
        Box::new(lks::LksScraper::new()),
        Box::new(sam::SamScraper::new()),
        Box::new(trilegal::TrilegalScraper::new()),
    ]
}

/// Look a scraper up by its command-line key, ignoring case
pub fn find(key: &str) -> Option<Box<dyn FirmScraper>> {
    all()
        .into_iter()
        .find(|scraper| scraper.config().key.eq_ignore_ascii_case(key.trim()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_and_tables_are_unique() {
        let scrapers = all();
        let keys: HashSet<_> = scrapers.iter().map(|s| s.config().key).collect();
        let tables: HashSet<_> = scrapers.iter().map(|s| s.config().table).collect();

        assert_eq!(scrapers.len(), 8);
        assert_eq!(keys.len(), 8);
        assert_eq!(tables.len(), 8);
        assert!(tables.iter().all(|t| t.ends_with("_publications")));
    }

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(find("LKS").map(|s| s.config().table), Some("lks_publications"));
        assert_eq!(find(" trilegal ").map(|s| s.config().name), Some("Trilegal"));
        assert!(find("unknown-firm").is_none());
    }
}
