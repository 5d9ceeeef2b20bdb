//! Free-text listing dates and the acceptance window.

use chrono::{Days, NaiveDate};

/// Formats tried in order against listing date text. Month names match
/// case-insensitively and `%d` accepts a single digit.
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%d %b %Y", "%B %d, %Y", "%d %B %Y"];

/// Parse human date text such as `Oct 12, 2026` or `12 October 2026`.
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&compact, format).ok())
}

pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Inclusive range of acceptable race dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window covering `today` through `today + horizon_days`.
    pub fn starting(today: NaiveDate, horizon_days: u64) -> Self {
        let end = today
            .checked_add_days(Days::new(horizon_days))
            .unwrap_or(NaiveDate::MAX);
        Self { start: today, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_supported_shapes() {
        assert_eq!(parse_listing_date("Oct 12, 2026"), Some(ymd(2026, 10, 12)));
        assert_eq!(parse_listing_date("Dec 7, 2026"), Some(ymd(2026, 12, 7)));
        assert_eq!(parse_listing_date("7 Dec 2026"), Some(ymd(2026, 12, 7)));
        assert_eq!(
            parse_listing_date("September 20, 2026"),
            Some(ymd(2026, 9, 20))
        );
        assert_eq!(parse_listing_date("3 May 2027"), Some(ymd(2027, 5, 3)));
    }

    #[test]
    fn collapses_whitespace_before_parsing() {
        assert_eq!(
            parse_listing_date("  Oct\n   12,  2026 "),
            Some(ymd(2026, 10, 12))
        );
    }

    #[test]
    fn rejects_unrecognised_text() {
        assert_eq!(parse_listing_date(""), None);
        assert_eq!(parse_listing_date("TBA"), None);
        assert_eq!(parse_listing_date("2026/10/12"), None);
        assert_eq!(parse_listing_date("Feb 30, 2026"), None);
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let today = ymd(2026, 10, 19);
        let window = DateWindow::starting(today, 365);

        assert_eq!(window.end, ymd(2027, 10, 19));
        assert!(window.contains(today));
        assert!(window.contains(window.end));
        assert!(!window.contains(ymd(2026, 10, 18)));
        assert!(!window.contains(ymd(2027, 10, 20)));
    }

    #[test]
    fn iso_form_is_zero_padded() {
        assert_eq!(to_iso(ymd(2027, 3, 5)), "2027-03-05");
    }
}
