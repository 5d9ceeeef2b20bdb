//! Race listing entities shared by the scraper, the cache and the HTTP surface.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distance category of a race. The wire form matches the labels shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distance {
    #[serde(rename = "Full")]
    Full,
    #[serde(rename = "70.3")]
    Half,
}

impl Distance {
    pub fn as_str(self) -> &'static str {
        match self {
            Distance::Full => "Full",
            Distance::Half => "70.3",
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration status of a race as advertised by the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Open,
    Closed,
    Waitlist,
    #[serde(rename = "Sold Out")]
    SoldOut,
    #[serde(rename = "Registration Soon")]
    RegistrationSoon,
    Unknown,
}

impl RaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RaceStatus::Open => "Open",
            RaceStatus::Closed => "Closed",
            RaceStatus::Waitlist => "Waitlist",
            RaceStatus::SoldOut => "Sold Out",
            RaceStatus::RegistrationSoon => "Registration Soon",
            RaceStatus::Unknown => "Unknown",
        }
    }
}

/// A validated race entry.
///
/// `date_iso` is always a real calendar date in `YYYY-MM-DD` form, so plain
/// string comparison orders records chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub name: String,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    #[serde(rename = "dateText")]
    pub date_text: String,
    pub location: String,
    pub distance: Distance,
    pub url: String,
    pub status: RaceStatus,
}

/// Raw fields pulled out of one listing element, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub name: String,
    pub location: String,
    pub date_text: String,
    /// Absolute URL of the race page.
    pub url: String,
    /// Badge or label text, empty when the element had none.
    pub status_text: String,
    pub distance: Distance,
}

/// Caller-facing distance filter (`HALF` / `FULL` on the query string).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceFilter {
    Half,
    Full,
}

impl DistanceFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "HALF" => Some(Self::Half),
            "FULL" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn distance(self) -> Distance {
        match self {
            DistanceFilter::Half => Distance::Half,
            DistanceFilter::Full => Distance::Full,
        }
    }
}

/// Apply the optional distance filter, then keep at most `limit` records.
pub fn select(
    records: &[RaceRecord],
    filter: Option<DistanceFilter>,
    limit: usize,
) -> Vec<RaceRecord> {
    records
        .iter()
        .filter(|race| filter.is_none_or(|f| race.distance == f.distance()))
        .take(limit)
        .cloned()
        .collect()
}
