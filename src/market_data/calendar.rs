// =============================================================================
// Trade date helpers
// =============================================================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_trade_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .ok()
}

/// Most recent weekday strictly before `today`.  Exchange holidays are not
/// known here; the provider reports those as missing data.
pub fn recent_trade_date(today: NaiveDate) -> NaiveDate {
    let mut date = today - Duration::days(1);
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date -= Duration::days(1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_both_formats() {
        assert_eq!(parse_trade_date("20251015"), Some(d(2025, 10, 15)));
        assert_eq!(parse_trade_date("2025-10-15"), Some(d(2025, 10, 15)));
        assert_eq!(parse_trade_date(" 20251015 "), Some(d(2025, 10, 15)));
        assert_eq!(parse_trade_date("20251332"), None);
        assert_eq!(parse_trade_date("yesterday"), None);
    }

    #[test]
    fn recent_trade_date_skips_weekends() {
        // 2025-10-15 is a Wednesday.
        assert_eq!(recent_trade_date(d(2025, 10, 15)), d(2025, 10, 14));
        // Monday -> previous Friday.
        assert_eq!(recent_trade_date(d(2025, 10, 13)), d(2025, 10, 10));
        // Sunday -> Friday.
        assert_eq!(recent_trade_date(d(2025, 10, 12)), d(2025, 10, 10));
    }
}
