use chrono::Weekday;
use serde::{Deserialize, Serialize};

// -----------------------------------------------
// INDEX CONFIGURATION
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Nse,
    Bse,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Nse => "NSE",
            Exchange::Bse => "BSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryConvention {
    /// Contracts expire every week on the given weekday.
    Weekly(Weekday),
    /// Contracts expire on the last Thursday of the month.
    MonthlyLastThursday,
}

/// Static routing and contract details for one tracked index.
#[derive(Debug, Clone, Copy)]
pub struct IndexConfig {
    pub name: &'static str,
    pub token: &'static str,
    pub exchange: Exchange,
    pub strike_step: u32,
    pub expiry: ExpiryConvention,
}

// -----------------------------------------------
// REQUEST BODIES
// -----------------------------------------------

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub clientcode: &'a str,
    pub password: &'a str,
    pub totp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CandleRequest<'a> {
    pub exchange: &'a str,
    pub symboltoken: &'a str,
    pub interval: &'a str,
    pub fromdate: String,
    pub todate: String,
}

#[derive(Debug, Serialize)]
pub struct GreeksRequest<'a> {
    pub name: &'a str,
    pub expirydate: &'a str,
}

// -----------------------------------------------
// RESPONSE ENVELOPE
// -----------------------------------------------

/// Every SmartAPI response wraps its payload in the same envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: bool,

    pub message: Option<String>,

    pub errorcode: Option<String>,

    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Human-readable failure cause for log lines.
    pub fn failure_reason(&self) -> String {
        match (&self.message, &self.errorcode) {
            (Some(msg), Some(code)) => format!("{} ({})", msg, code),
            (Some(msg), None) => msg.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(rename = "jwtToken")]
    pub jwt_token: Option<String>,

    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,

    #[serde(rename = "feedToken")]
    pub feed_token: Option<String>,
}

// -----------------------------------------------
// OPTION GREEKS
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionSide {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSide::Call => "CE",
            OptionSide::Put => "PE",
        }
    }
}

/// One per-contract record from the optionGreek endpoint. SmartAPI sends
/// every numeric field as a string; the payload is persisted as-is and only
/// the strike is parsed, for window filtering and symbol construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreekQuote {
    pub name: Option<String>,

    pub expiry: Option<String>,

    #[serde(rename = "strikePrice")]
    pub strike_price: String,

    #[serde(rename = "optionType")]
    pub option_type: OptionSide,

    pub delta: Option<String>,

    pub gamma: Option<String>,

    pub theta: Option<String>,

    pub vega: Option<String>,

    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Option<String>,

    #[serde(rename = "tradeVolume")]
    pub trade_volume: Option<String>,
}

impl GreekQuote {
    /// Strike as a number, or None when the upstream string is junk.
    pub fn strike(&self) -> Option<f64> {
        self.strike_price.trim().parse::<f64>().ok().filter(|s| s.is_finite())
    }
}

// -----------------------------------------------
// PERSISTED INSTRUMENT
// -----------------------------------------------

/// One option contract ready to be written to the per-index collection.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentRecord {
    pub symbol: String,
    pub token: String,
    pub greeks: GreekQuote,
}

impl InstrumentRecord {
    /// Builds the record for a quote, or None when the strike cannot be
    /// parsed (such rows are unaddressable and are dropped upstream too).
    pub fn from_quote(index: &IndexConfig, expiry: &str, quote: &GreekQuote) -> Option<Self> {
        let strike = quote.strike()?;
        Some(Self {
            symbol: contract_symbol(index.name, expiry, strike, quote.option_type),
            token: index.token.to_string(),
            greeks: quote.clone(),
        })
    }
}

/// Contract symbol: index name + expiry + integer strike + side,
/// e.g. "NIFTY25DEC202524900CE".
pub fn contract_symbol(index: &str, expiry: &str, strike: f64, side: OptionSide) -> String {
    format!("{}{}{}{}", index, expiry, strike.round() as i64, side.as_str())
}
