pub mod address;
pub mod normalize;
pub mod nrc;
pub mod search;
pub mod validators;

use chrono::{NaiveDate, Utc};

/// UTC calendar date used everywhere a "today" is needed: bill generation,
/// payment dates, today's collections and overdue flags.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_follows_utc_clock() {
        let before = Utc::now().date_naive();
        let date = today();
        let after = Utc::now().date_naive();
        assert!(before <= date && date <= after);
    }
}
