//! Date heuristics for the free-form strings firms print on their listings

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(st|nd|rd|th)\b").expect("valid ordinal regex"));
static NEWSLETTER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*([A-Za-z]+)\s+(\d{4})").expect("valid newsletter regex"));
static MONTH_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z]+)\s*-\s*([A-Za-z]+)").expect("valid month span regex"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

/// Listing date layouts seen across the firm sites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `Oct 08, 2025`
    MonthAbbrevDayYear,
    /// `October 15, 2025`
    MonthDayYear,
    /// `October 2025`, resolved to the first of the month
    MonthYear,
    /// `16 September 2025`
    DayMonthYear,
    /// `4th Nov 2025`
    OrdinalDayMonthAbbrevYear,
    /// `04 Nov 2025`
    DayMonthAbbrevYear,
    /// `03 Oct '25`
    DayMonthShortYear,
    /// `16/09/2025`
    NumericDayMonthYear,
}

impl DateFormat {
    pub fn parse(self, raw: &str) -> Option<NaiveDate> {
        let text = collapse_whitespace(raw);
        if text.is_empty() {
            return None;
        }

        let parsed = match self {
            Self::MonthAbbrevDayYear => NaiveDate::parse_from_str(&text, "%b %d, %Y"),
            Self::MonthDayYear => NaiveDate::parse_from_str(&text, "%B %d, %Y"),
            Self::MonthYear => NaiveDate::parse_from_str(&format!("1 {text}"), "%d %B %Y"),
            Self::DayMonthYear => NaiveDate::parse_from_str(&text, "%d %B %Y"),
            Self::OrdinalDayMonthAbbrevYear => {
                let stripped = ORDINAL_SUFFIX.replace_all(&text, "$1");
                NaiveDate::parse_from_str(&stripped, "%d %b %Y")
            }
            Self::DayMonthAbbrevYear => NaiveDate::parse_from_str(&text, "%d %b %Y"),
            Self::DayMonthShortYear => {
                NaiveDate::parse_from_str(&text.replace('\'', "20"), "%d %b %Y")
            }
            Self::NumericDayMonthYear => NaiveDate::parse_from_str(&text, "%d/%m/%Y"),
        };

        match parsed {
            Ok(date) => Some(date),
            Err(e) => {
                debug!("Could not parse '{}' as {:?}: {}", text, self, e);
                None
            }
        }
    }
}

/// Try each format in order and return the first successful parse
pub fn parse_any(raw: &str, formats: &[DateFormat]) -> Option<NaiveDate> {
    formats.iter().find_map(|format| format.parse(raw))
}

/// Month number for a full or three-letter English month name
pub fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    let lower = name.trim().to_lowercase();
    if lower.len() < 3 {
        return None;
    }

    MONTHS
        .iter()
        .position(|month| *month == lower || (lower.len() == 3 && month.starts_with(&lower)))
        .map(|idx| idx as u32 + 1)
}

pub fn last_day_of_month(month_name: &str, year: i32) -> Option<NaiveDate> {
    let month = month_number(month_name)?;
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    first_of_next.pred_opt()
}

/// `Tax Amicus: June 2025` is dated the last day of June 2025
pub fn newsletter_title_date(title: &str) -> Option<NaiveDate> {
    let caps = NEWSLETTER_TITLE.captures(title)?;
    let year = caps[2].parse().ok()?;
    last_day_of_month(&caps[1], year)
}

/// `Quarterly Update 2025 (July - September)` is dated the last day of the quarter's final month
pub fn quarterly_title_date(title: &str) -> Option<NaiveDate> {
    let end_month = MONTH_SPAN
        .captures_iter(title)
        .find(|caps| month_number(&caps[1]).is_some() && month_number(&caps[2]).is_some())?;
    let year: i32 = YEAR.captures(title)?[1].parse().ok()?;

    last_day_of_month(&end_month[2], year)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_each_listing_layout() {
        assert_eq!(DateFormat::MonthAbbrevDayYear.parse("Oct 08, 2025"), Some(date(2025, 10, 8)));
        assert_eq!(DateFormat::MonthDayYear.parse("October 15, 2025"), Some(date(2025, 10, 15)));
        assert_eq!(DateFormat::MonthYear.parse("October 2025"), Some(date(2025, 10, 1)));
        assert_eq!(DateFormat::DayMonthYear.parse("16 September 2025"), Some(date(2025, 9, 16)));
        assert_eq!(
            DateFormat::OrdinalDayMonthAbbrevYear.parse("4th Nov 2025"),
            Some(date(2025, 11, 4))
        );
        assert_eq!(
            DateFormat::OrdinalDayMonthAbbrevYear.parse("21st Feb 2024"),
            Some(date(2024, 2, 21))
        );
        assert_eq!(DateFormat::DayMonthAbbrevYear.parse("04 Nov 2025"), Some(date(2025, 11, 4)));
        assert_eq!(DateFormat::DayMonthShortYear.parse("03 Oct '25"), Some(date(2025, 10, 3)));
        assert_eq!(DateFormat::NumericDayMonthYear.parse("16/09/2025"), Some(date(2025, 9, 16)));
    }

    #[test]
    fn tolerates_surrounding_and_internal_whitespace() {
        assert_eq!(
            DateFormat::MonthDayYear.parse("  April   7,\n 2020 "),
            Some(date(2020, 4, 7))
        );
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        assert_eq!(DateFormat::MonthDayYear.parse(""), None);
        assert_eq!(DateFormat::NumericDayMonthYear.parse("31/02/2025"), None);
        assert_eq!(DateFormat::DayMonthYear.parse("Issue 12"), None);
    }

    #[test]
    fn parse_any_uses_first_matching_format() {
        let formats = [DateFormat::MonthDayYear, DateFormat::MonthYear];
        assert_eq!(parse_any("March 2024", &formats), Some(date(2024, 3, 1)));
        assert_eq!(parse_any("March 5, 2024", &formats), Some(date(2024, 3, 5)));
        assert_eq!(parse_any("Issue 4", &formats), None);
    }

    #[test]
    fn month_lookup_accepts_full_and_short_names() {
        assert_eq!(month_number("June"), Some(6));
        assert_eq!(month_number("sep"), Some(9));
        assert_eq!(month_number("Sept"), None);
        assert_eq!(month_number("ma"), None);
    }

    #[test]
    fn last_day_handles_leap_years_and_december() {
        assert_eq!(last_day_of_month("February", 2024), Some(date(2024, 2, 29)));
        assert_eq!(last_day_of_month("February", 2025), Some(date(2025, 2, 28)));
        assert_eq!(last_day_of_month("December", 2025), Some(date(2025, 12, 31)));
        assert_eq!(last_day_of_month("Smarch", 2025), None);
    }

    #[test]
    fn newsletter_titles_resolve_to_month_end() {
        assert_eq!(newsletter_title_date("Tax Amicus: June 2025"), Some(date(2025, 6, 30)));
        assert_eq!(newsletter_title_date("IPR Amicus / Issue 12"), None);
    }

    #[test]
    fn quarterly_titles_resolve_to_quarter_end() {
        assert_eq!(
            quarterly_title_date("Corporate Practice: Quarterly Update 2025 (July - September)"),
            Some(date(2025, 9, 30))
        );
        assert_eq!(
            quarterly_title_date("Quarterly Update (January-March) 2024"),
            Some(date(2024, 3, 31))
        );
        assert_eq!(quarterly_title_date("Quarterly Update - Corporate 2024"), None);
    }
}
