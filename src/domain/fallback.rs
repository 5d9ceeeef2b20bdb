//! Sample races returned when live aggregation produces nothing.

use super::races::{Distance, RaceRecord, RaceStatus};

struct FallbackRace {
    name: &'static str,
    date_iso: &'static str,
    date_text: &'static str,
    location: &'static str,
    distance: Distance,
    url: &'static str,
    status: RaceStatus,
}

const FALLBACK_RACES: &[FallbackRace] = &[
    FallbackRace {
        name: "Ironman 70.3 La Quinta",
        date_iso: "2025-12-07",
        date_text: "Dec 7, 2025",
        location: "La Quinta, CA",
        distance: Distance::Half,
        url: "https://www.ironman.com/im703-la-quinta",
        status: RaceStatus::Open,
    },
    FallbackRace {
        name: "Ironman Arizona",
        date_iso: "2025-11-23",
        date_text: "Nov 23, 2025",
        location: "Tempe, AZ",
        distance: Distance::Full,
        url: "https://www.ironman.com/im-arizona",
        status: RaceStatus::Open,
    },
    FallbackRace {
        name: "Ironman 70.3 Oceanside",
        date_iso: "2025-04-05",
        date_text: "Apr 5, 2025",
        location: "Oceanside, CA",
        distance: Distance::Half,
        url: "https://www.ironman.com/im703-oceanside",
        status: RaceStatus::RegistrationSoon,
    },
    FallbackRace {
        name: "Ironman Texas",
        date_iso: "2025-04-26",
        date_text: "Apr 26, 2025",
        location: "The Woodlands, TX",
        distance: Distance::Full,
        url: "https://www.ironman.com/im-texas",
        status: RaceStatus::Open,
    },
    FallbackRace {
        name: "Ironman 70.3 St. George",
        date_iso: "2025-05-03",
        date_text: "May 3, 2025",
        location: "St. George, UT",
        distance: Distance::Half,
        url: "https://www.ironman.com/im703-st-george",
        status: RaceStatus::Waitlist,
    },
    FallbackRace {
        name: "Ironman Coeur d'Alene",
        date_iso: "2025-06-29",
        date_text: "Jun 29, 2025",
        location: "Coeur d'Alene, ID",
        distance: Distance::Full,
        url: "https://www.ironman.com/im-coeur-dalene",
        status: RaceStatus::Open,
    },
];

/// The fixed sample list, in display order.
pub fn fallback_races() -> Vec<RaceRecord> {
    FALLBACK_RACES
        .iter()
        .map(|race| RaceRecord {
            name: race.name.to_string(),
            date_iso: race.date_iso.to_string(),
            date_text: race.date_text.to_string(),
            location: race.location.to_string(),
            distance: race.distance,
            url: race.url.to_string(),
            status: race.status,
        })
        .collect()
}
