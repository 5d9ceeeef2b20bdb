//! Cross-source merge: de-duplication, chronological order, ceiling.

use std::collections::HashSet;

use super::races::RaceRecord;

/// Upper bound on records kept per aggregation.
pub const DEFAULT_RESULT_CEILING: usize = 12;

/// Drop every record sharing a `url`, or a `name` and `date_iso`, with any
/// earlier record, then stable-sort by date and keep at most `ceiling`.
///
/// URLs are compared verbatim: trailing slashes or query strings make distinct keys.
pub fn collate(records: Vec<RaceRecord>, ceiling: usize) -> Vec<RaceRecord> {
    let mut seen_urls = HashSet::new();
    let mut seen_name_dates = HashSet::new();

    let mut unique: Vec<RaceRecord> = records
        .into_iter()
        .filter(|race| {
            // Keys of dropped records still count for later ones.
            let url_is_new = seen_urls.insert(race.url.clone());
            let pair_is_new = seen_name_dates.insert((race.name.clone(), race.date_iso.clone()));
            url_is_new && pair_is_new
        })
        .collect();

    unique.sort_by(|a, b| a.date_iso.cmp(&b.date_iso));
    unique.truncate(ceiling);
    unique
}
