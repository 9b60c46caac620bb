pub mod calendar;
pub mod config;
pub mod gateway;
pub mod models;
pub mod session;
pub mod totp;

// Re-exports (public API)
pub use config::TRACKED_INDICES;
pub use gateway::{FetchOutcome, MarketDataGateway};
pub use models::{
    contract_symbol, Exchange, ExpiryConvention, GreekQuote, IndexConfig, InstrumentRecord,
    OptionSide,
};
pub use session::{Credentials, QuoteSession};
