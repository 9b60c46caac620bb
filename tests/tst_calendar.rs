use greeks_snapshot::smartapi::calendar::{format_expiry, ist_offset, nearest_expiry};
use greeks_snapshot::smartapi::config::{self, TRACKED_INDICES};
use greeks_snapshot::smartapi::models::{Exchange, ExpiryConvention, IndexConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Weekday};

    fn ist(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        ist_offset().with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn weekly_thu() -> &'static IndexConfig {
        config::index_config("NIFTY").unwrap()
    }

    fn monthly() -> &'static IndexConfig {
        config::index_config("BANKNIFTY").unwrap()
    }

    #[test]
    fn test_weekly_rolls_forward_to_target_weekday() {
        // Tuesday -> the coming Thursday.
        let now = ist(2025, 6, 24, 10, 0);
        let d = nearest_expiry(weekly_thu(), now, &config::market_holidays());
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 6, 26).unwrap());
    }

    #[test]
    fn test_weekly_cutoff_on_expiry_day() {
        let holidays = config::market_holidays();
        // Thursday 15:59 IST: today's contracts are still current.
        let before = ist(2025, 6, 26, 15, 59);
        assert_eq!(
            nearest_expiry(weekly_thu(), before, &holidays),
            NaiveDate::from_ymd_opt(2025, 6, 26).unwrap()
        );
        // Thursday 16:00 IST: rolled to next week.
        let after = ist(2025, 6, 26, 16, 0);
        assert_eq!(
            nearest_expiry(weekly_thu(), after, &holidays),
            NaiveDate::from_ymd_opt(2025, 7, 3).unwrap()
        );
    }

    #[test]
    fn test_weekly_holiday_steps_backward() {
        // Target Thursday closed: contracts expire the prior trading day.
        let holidays = vec![NaiveDate::from_ymd_opt(2025, 6, 26).unwrap()];
        let now = ist(2025, 6, 23, 10, 0);
        assert_eq!(
            nearest_expiry(weekly_thu(), now, &holidays),
            NaiveDate::from_ymd_opt(2025, 6, 25).unwrap()
        );
    }

    #[test]
    fn test_weekly_backtracking_skips_weekends() {
        // A whole closed week: stepping back must jump the weekend and land
        // on the previous Friday, in bounded steps.
        let sensex = config::index_config("SENSEX").unwrap();
        let holidays: Vec<NaiveDate> = (9..=13)
            .map(|d| NaiveDate::from_ymd_opt(2025, 6, d).unwrap())
            .collect(); // Mon 9th .. Fri 13th
        let now = ist(2025, 6, 9, 10, 0);
        assert_eq!(
            nearest_expiry(sensex, now, &holidays),
            NaiveDate::from_ymd_opt(2025, 6, 6).unwrap()
        );
    }

    #[test]
    fn test_monthly_last_thursday() {
        let now = ist(2025, 6, 2, 10, 0);
        let d = nearest_expiry(monthly(), now, &config::market_holidays());
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 6, 26).unwrap());
    }

    #[test]
    fn test_monthly_past_expiry_rolls_to_next_month() {
        // June's last Thursday is the 26th; the 27th must resolve to July.
        let now = ist(2025, 6, 27, 10, 0);
        let d = nearest_expiry(monthly(), now, &config::market_holidays());
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
    }

    #[test]
    fn test_monthly_christmas_2025_steps_to_wednesday() {
        // Real calendar case: 25 Dec 2025 is both the last Thursday of the
        // month and a holiday, so December contracts expire on the 24th.
        let now = ist(2025, 12, 1, 10, 0);
        let d = nearest_expiry(monthly(), now, &config::market_holidays());
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
        assert_eq!(format_expiry(d), "24DEC2025");
    }

    #[test]
    fn test_never_resolves_to_holiday_or_weekend() {
        // Sweep every day of 2025 for every tracked index.
        let holidays = config::market_holidays();
        let mut day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        while day <= end {
            let now = ist(day.year(), day.month(), day.day(), 10, 0);
            for cfg in TRACKED_INDICES {
                let d = nearest_expiry(cfg, now, &holidays);
                assert!(!holidays.contains(&d), "{} resolved to holiday {}", cfg.name, d);
                if matches!(cfg.expiry, ExpiryConvention::Weekly(_)) {
                    assert!(
                        !matches!(d.weekday(), Weekday::Sat | Weekday::Sun),
                        "{} resolved to weekend {}",
                        cfg.name,
                        d
                    );
                }
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_weekly_index_conventions() {
        assert_eq!(weekly_thu().expiry, ExpiryConvention::Weekly(Weekday::Thu));
        let sensex = config::index_config("SENSEX").unwrap();
        assert_eq!(sensex.expiry, ExpiryConvention::Weekly(Weekday::Fri));
        assert_eq!(sensex.exchange, Exchange::Bse);
    }

    #[test]
    fn test_expiry_format_examples() {
        assert_eq!(
            format_expiry(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()),
            "25DEC2025"
        );
        assert_eq!(
            format_expiry(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            "01JAN2026"
        );
    }
}
