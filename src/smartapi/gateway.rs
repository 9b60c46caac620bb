use crate::smartapi::calendar;
use crate::smartapi::config;
use crate::smartapi::models::{CandleRequest, GreekQuote, GreeksRequest, IndexConfig};
use crate::smartapi::session::QuoteSession;
use chrono::{Days, NaiveDate};
use serde_json::Value;
use tracing::{debug, warn};

// -----------------------------------------------
// FETCH OUTCOME
// -----------------------------------------------

/// Result of one upstream lookup. `Empty` means the API answered and had
/// nothing for us; `Failed` means the call itself broke. The pipeline skips
/// on both, but the logs tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Data(T),
    Empty,
    Failed,
}

impl<T> FetchOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Data(value) => Some(value),
            _ => None,
        }
    }
}

// -----------------------------------------------
// MARKET DATA GATEWAY
// -----------------------------------------------

/// Read-side facade over an authenticated session: last traded price,
/// nearest expiry, bulk option greeks. Network errors never escape; they
/// come back as `FetchOutcome::Failed`.
pub struct MarketDataGateway {
    session: QuoteSession,
    holidays: Vec<NaiveDate>,
}

impl MarketDataGateway {
    pub fn new(session: QuoteSession, holidays: Vec<NaiveDate>) -> Self {
        Self { session, holidays }
    }

    /// Close of the most recent daily candle over a trailing 5-day window.
    /// SmartAPI has no direct index LTP endpoint, so the candle query stands
    /// in for it.
    pub async fn last_price(&self, cfg: &IndexConfig) -> FetchOutcome<f64> {
        let to = calendar::ist_now();
        let from = to.checked_sub_days(Days::new(config::CANDLE_LOOKBACK_DAYS as u64));
        let Some(from) = from else {
            return FetchOutcome::Failed;
        };

        let body = CandleRequest {
            exchange: cfg.exchange.as_str(),
            symboltoken: cfg.token,
            interval: "ONE_DAY",
            fromdate: from.format("%Y-%m-%d %H:%M").to_string(),
            todate: to.format("%Y-%m-%d %H:%M").to_string(),
        };

        debug!(index = cfg.name, token = cfg.token, "fetching last price");

        match self.session.post_authed(config::CANDLE_DATA_PATH, &body).await {
            Ok(value) => parse_last_close(cfg.name, &value),
            Err(e) => {
                warn!(index = cfg.name, error = %e, "candle request failed");
                FetchOutcome::Failed
            }
        }
    }

    /// Nearest expiry for the index convention at the current IST instant.
    /// Pure; no network call.
    pub fn nearest_expiry(&self, cfg: &IndexConfig) -> String {
        calendar::format_expiry(calendar::nearest_expiry(cfg, calendar::ist_now(), &self.holidays))
    }

    /// Full option-chain greeks for an index/expiry pair.
    pub async fn option_greeks(&self, cfg: &IndexConfig, expiry: &str) -> FetchOutcome<Vec<GreekQuote>> {
        let body = GreeksRequest {
            name: cfg.name,
            expirydate: expiry,
        };

        debug!(index = cfg.name, expiry, "fetching option greeks");

        match self.session.post_authed(config::OPTION_GREEK_PATH, &body).await {
            Ok(value) => parse_greeks(cfg.name, &value),
            Err(e) => {
                warn!(index = cfg.name, expiry, error = %e, "option greeks request failed");
                FetchOutcome::Failed
            }
        }
    }
}

// -----------------------------------------------
// RESPONSE PARSING
// -----------------------------------------------

fn upstream_message(value: &Value) -> &str {
    value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
}

fn parse_last_close(index: &str, value: &Value) -> FetchOutcome<f64> {
    if value.get("status").and_then(Value::as_bool) != Some(true) {
        warn!(index, message = upstream_message(value), "candle query unsuccessful");
        return FetchOutcome::Empty;
    }

    let Some(candles) = value.get("data").and_then(Value::as_array) else {
        return FetchOutcome::Empty;
    };
    let Some(last) = candles.last() else {
        return FetchOutcome::Empty;
    };

    // Candle rows are [timestamp, open, high, low, close, volume].
    match last.get(4).and_then(Value::as_f64) {
        Some(close) => FetchOutcome::Data(close),
        None => {
            warn!(index, "candle row has no numeric close");
            FetchOutcome::Failed
        }
    }
}

fn parse_greeks(index: &str, value: &Value) -> FetchOutcome<Vec<GreekQuote>> {
    if value.get("status").and_then(Value::as_bool) != Some(true) {
        warn!(index, message = upstream_message(value), "greeks query unsuccessful");
        return FetchOutcome::Empty;
    }

    let Some(data) = value.get("data") else {
        return FetchOutcome::Empty;
    };
    if data.is_null() {
        return FetchOutcome::Empty;
    }

    match serde_json::from_value::<Vec<GreekQuote>>(data.clone()) {
        Ok(records) if records.is_empty() => FetchOutcome::Empty,
        Ok(records) => FetchOutcome::Data(records),
        Err(e) => {
            warn!(index, error = %e, "greeks payload did not parse");
            FetchOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_last_close_takes_most_recent_candle() {
        let value = json!({
            "status": true,
            "data": [
                ["2025-08-20T00:00:00", 24600.0, 24710.0, 24580.0, 24690.0, 0],
                ["2025-08-21T00:00:00", 24700.0, 24910.0, 24650.0, 24875.0, 0]
            ]
        });
        assert_eq!(parse_last_close("NIFTY", &value), FetchOutcome::Data(24875.0));
    }

    #[test]
    fn test_parse_last_close_empty_and_failure() {
        let no_rows = json!({"status": true, "data": []});
        assert_eq!(parse_last_close("NIFTY", &no_rows), FetchOutcome::Empty);

        let rejected = json!({"status": false, "message": "Something Went Wrong"});
        assert_eq!(parse_last_close("NIFTY", &rejected), FetchOutcome::Empty);

        let junk_close = json!({"status": true, "data": [["ts", 1.0, 2.0, 0.5, "x", 0]]});
        assert_eq!(parse_last_close("NIFTY", &junk_close), FetchOutcome::Failed);
    }

    #[test]
    fn test_parse_greeks_outcomes() {
        let ok = json!({
            "status": true,
            "data": [{
                "name": "NIFTY", "expiry": "25DEC2025",
                "strikePrice": "24900.000000", "optionType": "CE",
                "delta": "0.5", "gamma": "0.0004", "theta": "-4.0",
                "vega": "9.0", "impliedVolatility": "13.2", "tradeVolume": "1000"
            }]
        });
        match parse_greeks("NIFTY", &ok) {
            FetchOutcome::Data(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].strike(), Some(24900.0));
            }
            other => panic!("expected data, got {:?}", other),
        }

        let empty = json!({"status": true, "data": []});
        assert_eq!(parse_greeks("NIFTY", &empty), FetchOutcome::Empty);

        let null_data = json!({"status": true, "data": null});
        assert_eq!(parse_greeks("NIFTY", &null_data), FetchOutcome::Empty);

        let rejected = json!({"status": false, "message": "Invalid expiry"});
        assert_eq!(parse_greeks("NIFTY", &rejected), FetchOutcome::Empty);

        let malformed = json!({"status": true, "data": [{"strikePrice": 1}]});
        assert_eq!(parse_greeks("NIFTY", &malformed), FetchOutcome::Failed);
    }
}
