//! Selector fallback tables for listing markup.
//!
//! Listing pages do not share a stable structure, so every lookup is a
//! prioritized list. Container selectors stop at the first one that matches;
//! field selectors yield the first non-empty text among their entries.

/// Candidate containers for one race, most specific first.
pub const CONTAINER_SELECTORS: &[&str] = &[
    ".event-card",
    ".race-card",
    ".event-item",
    ".race-item",
    "[data-event]",
    ".card",
    "article",
];

/// Descendant whose `href` links to the race page. Only the first one counts.
pub const LINK_SELECTOR: &str = "a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Location,
    DateText,
    Status,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub selectors: &'static [&'static str],
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Name,
        selectors: &["h3", "h4", ".event-name", ".race-name", "[data-name]"],
    },
    FieldRule {
        field: Field::Location,
        selectors: &[".location", ".venue", "[data-location]"],
    },
    FieldRule {
        field: Field::DateText,
        selectors: &[".date", ".event-date", "[data-date]"],
    },
    FieldRule {
        field: Field::Status,
        selectors: &[".status", ".badge", ".label"],
    },
];

/// Descendant selector scoped to `container`.
pub fn scoped(container: &str, inner: &str) -> String {
    format!("{container} {inner}")
}
