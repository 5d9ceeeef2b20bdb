use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Calendar date currently observed in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn pacific_date_lags_utc_in_the_evening() {
        let utc = Utc
            .with_ymd_and_hms(2026, 10, 20, 3, 0, 0)
            .single()
            .expect("valid instant");
        let local = utc.with_timezone(&chrono_tz::America::Los_Angeles).date_naive();
        assert_eq!(local, NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"));
    }

    #[test]
    fn today_is_within_a_day_of_utc() {
        let utc_today = Utc::now().date_naive();
        let pacific = today_in(chrono_tz::America::Los_Angeles);
        let gap = (utc_today - pacific).num_days();
        assert!((0..=1).contains(&gap));
    }
}
