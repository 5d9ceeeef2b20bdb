//! Registration status inference.
//!
//! Listing markup is inconsistent, so badge text is consulted first and the
//! race URL slug second.

use super::races::RaceStatus;

/// Keyword table for badge text, first match wins.
const TEXT_KEYWORDS: &[(&[&str], RaceStatus)] = &[
    (&["open"], RaceStatus::Open),
    (&["waitlist"], RaceStatus::Waitlist),
    (&["closed"], RaceStatus::Closed),
    (&["sold out"], RaceStatus::SoldOut),
    (&["coming soon", "opens"], RaceStatus::RegistrationSoon),
];

pub fn resolve_status(status_text: &str, url: &str) -> RaceStatus {
    match status_from_text(status_text) {
        RaceStatus::Unknown => status_from_url(url),
        status => status,
    }
}

pub fn status_from_text(text: &str) -> RaceStatus {
    let lowered = text.to_lowercase();
    TEXT_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, status)| *status)
        .unwrap_or(RaceStatus::Unknown)
}

pub fn status_from_url(url: &str) -> RaceStatus {
    let lowered = url.to_lowercase();

    if lowered.contains("/open/") {
        RaceStatus::Open
    } else if lowered.contains("/waitlist/") {
        RaceStatus::Waitlist
    } else if lowered.contains("/closed/") {
        RaceStatus::Closed
    } else if lowered.contains("/sold") && lowered.contains("out") {
        RaceStatus::SoldOut
    } else if lowered.contains("coming soon") || lowered.contains("opens") {
        RaceStatus::RegistrationSoon
    } else {
        RaceStatus::Unknown
    }
}
