use crate::smartapi::config;
use crate::smartapi::models::{ExpiryConvention, IndexConfig};
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Timelike, Utc, Weekday};
use tracing::warn;

// -----------------------------------------------
// EXCHANGE CLOCK
// -----------------------------------------------

/// IST is a fixed +05:30 offset, no DST. 19800 seconds is always valid.
pub fn ist_offset() -> FixedOffset {
    FixedOffset::east_opt(19800).unwrap()
}

pub fn ist_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&ist_offset())
}

// -----------------------------------------------
// EXPIRY RESOLUTION
// -----------------------------------------------

/// Nearest valid expiry for an index at the given exchange-local instant.
/// Total: always lands on a tradable date. Weekly roll-forward is bounded by
/// one week; holiday backtracking is bounded because no exchange calendar
/// closes 7+ consecutive days.
pub fn nearest_expiry(
    cfg: &IndexConfig,
    now_ist: DateTime<FixedOffset>,
    holidays: &[NaiveDate],
) -> NaiveDate {
    let today = now_ist.date_naive();

    match cfg.expiry {
        ExpiryConvention::MonthlyLastThursday => {
            let current = last_expiry_thursday(today.year(), today.month(), holidays);
            if today > current {
                let (year, month) = next_month(today.year(), today.month());
                last_expiry_thursday(year, month, holidays)
            } else {
                current
            }
        }
        ExpiryConvention::Weekly(target) => {
            let mut days_ahead =
                (target.num_days_from_sunday() + 7 - today.weekday().num_days_from_sunday()) % 7;
            if days_ahead == 0 && now_ist.hour() >= config::WEEKLY_ROLLOVER_HOUR {
                // Today's contracts have expired; next week's are current.
                days_ahead = 7;
            }
            let mut date = today
                .checked_add_days(Days::new(days_ahead as u64))
                .unwrap();
            // Stepping backward corrects holidays and weekend drift in one go.
            while holidays.contains(&date) || is_weekend(date) {
                date = date.pred_opt().unwrap();
            }
            date
        }
    }
}

/// Last Thursday of the month, stepped backward past holidays. Backtracking
/// may leave the month if the calendar were ever that hostile; kept from the
/// historical behavior, logged loudly.
fn last_expiry_thursday(year: i32, month: u32, holidays: &[NaiveDate]) -> NaiveDate {
    let (next_year, next_m) = next_month(year, month);
    let mut day = NaiveDate::from_ymd_opt(next_year, next_m, 1)
        .unwrap()
        .pred_opt()
        .unwrap();
    while day.weekday() != Weekday::Thu {
        day = day.pred_opt().unwrap();
    }
    while holidays.contains(&day) {
        day = day.pred_opt().unwrap();
    }
    if day.month() != month {
        warn!(
            year,
            month,
            resolved = %day,
            "monthly expiry backtracked across a month boundary"
        );
    }
    day
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// -----------------------------------------------
// FORMATTING
// -----------------------------------------------

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// SmartAPI expiry parameter form: DDMMMYYYY, e.g. "25DEC2025".
pub fn format_expiry(date: NaiveDate) -> String {
    format!(
        "{:02}{}{}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}
