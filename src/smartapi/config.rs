use crate::smartapi::models::{Exchange, ExpiryConvention, IndexConfig};
use chrono::{NaiveDate, Weekday};
use std::time::Duration;

// -----------------------------------------------
// SMARTAPI ENDPOINTS
// -----------------------------------------------
pub const SMARTAPI_BASE_URL: &str = "https://apiconnect.angelbroking.com";
pub const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
pub const CANDLE_DATA_PATH: &str = "/rest/secure/angelbroking/historical/v1/getCandleData";
pub const OPTION_GREEK_PATH: &str = "/rest/secure/angelbroking/marketData/v1/optionGreek";

// -----------------------------------------------
// STATIC HEADERS (required by SmartAPI on every call)
// -----------------------------------------------
pub const HEADER_USER_TYPE: &str = "USER";
pub const HEADER_SOURCE_ID: &str = "WEB";
pub const HEADER_CLIENT_LOCAL_IP: &str = "127.0.0.1";
pub const HEADER_CLIENT_PUBLIC_IP: &str = "103.103.103.103";
pub const HEADER_MAC_ADDRESS: &str = "00:00:00:00:00:00";

// -----------------------------------------------
// TRACKED INDICES
// -----------------------------------------------
// SENSEX expires on Friday, NIFTY on Thursday; the rest trade monthly
// contracts expiring on the last Thursday of the month.
pub const TRACKED_INDICES: &[IndexConfig] = &[
    IndexConfig {
        name: "NIFTY",
        token: "99926000",
        exchange: Exchange::Nse,
        strike_step: 50,
        expiry: ExpiryConvention::Weekly(Weekday::Thu),
    },
    IndexConfig {
        name: "BANKNIFTY",
        token: "99926009",
        exchange: Exchange::Nse,
        strike_step: 100,
        expiry: ExpiryConvention::MonthlyLastThursday,
    },
    IndexConfig {
        name: "FINNIFTY",
        token: "99926037",
        exchange: Exchange::Nse,
        strike_step: 50,
        expiry: ExpiryConvention::MonthlyLastThursday,
    },
    IndexConfig {
        name: "SENSEX",
        token: "99919000",
        exchange: Exchange::Bse,
        strike_step: 100,
        expiry: ExpiryConvention::Weekly(Weekday::Fri),
    },
    IndexConfig {
        name: "MIDCPNIFTY",
        token: "99926074",
        exchange: Exchange::Nse,
        strike_step: 25,
        expiry: ExpiryConvention::MonthlyLastThursday,
    },
];

pub fn index_config(name: &str) -> Option<&'static IndexConfig> {
    TRACKED_INDICES.iter().find(|cfg| cfg.name == name)
}

// -----------------------------------------------
// EXCHANGE TRADING HOLIDAYS (NSE/BSE, calendar year 2025)
// -----------------------------------------------
const MARKET_HOLIDAYS_2025: &[(i32, u32, u32)] = &[
    (2025, 2, 26),
    (2025, 3, 14),
    (2025, 3, 31),
    (2025, 4, 10),
    (2025, 4, 14),
    (2025, 4, 18),
    (2025, 5, 1),
    (2025, 8, 15),
    (2025, 8, 27),
    (2025, 10, 2),
    (2025, 10, 21),
    (2025, 10, 22),
    (2025, 11, 5),
    (2025, 12, 25),
];

/// Exchange holiday list as calendar dates. The (y, m, d) table above is
/// checked by the tests, so the unwrap here never fires.
pub fn market_holidays() -> Vec<NaiveDate> {
    MARKET_HOLIDAYS_2025
        .iter()
        .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
        .collect()
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// PIPELINE PACING AND WINDOWING
// -----------------------------------------------
/// Courtesy delay between consecutive SmartAPI calls.
pub const PACING_DELAY_MS: u64 = 1000;

/// Trailing window for the daily-candle query used as the LTP source.
pub const CANDLE_LOOKBACK_DAYS: i64 = 5;

/// Half-width of the ATM strike window, in multiples of the strike step.
pub const ATM_WINDOW_STEPS: u32 = 5;

/// On the expiry weekday itself, roll to next week at/after this IST hour.
pub const WEEKLY_ROLLOVER_HOUR: u32 = 16;
