//! Candidate validation: canonical dates, status inference, window filtering.

use super::dates::{DateWindow, parse_listing_date, to_iso};
use super::error::Rejection;
use super::races::{CandidateRecord, RaceRecord};
use super::status::resolve_status;

/// Turn an extracted candidate into a record, or explain why it was dropped.
pub fn normalize(candidate: CandidateRecord, window: &DateWindow) -> Result<RaceRecord, Rejection> {
    let date_text = candidate.date_text.trim();
    if date_text.is_empty() {
        return Err(Rejection::MissingDate {
            name: candidate.name,
        });
    }

    let Some(date) = parse_listing_date(date_text) else {
        return Err(Rejection::UnparseableDate {
            date_text: date_text.to_string(),
            name: candidate.name,
        });
    };

    if !window.contains(date) {
        return Err(Rejection::OutOfWindow {
            name: candidate.name,
            date_iso: to_iso(date),
            start: to_iso(window.start),
            end: to_iso(window.end),
        });
    }

    let status = resolve_status(&candidate.status_text, &candidate.url);
    Ok(RaceRecord {
        date_iso: to_iso(date),
        date_text: candidate.date_text,
        name: candidate.name,
        location: candidate.location,
        distance: candidate.distance,
        url: candidate.url,
        status,
    })
}
