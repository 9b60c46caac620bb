use crate::app_config::AppConfig;
use crate::smartapi::config;
use crate::smartapi::gateway::{FetchOutcome, MarketDataGateway};
use crate::smartapi::models::{GreekQuote, IndexConfig, InstrumentRecord};
use crate::smartapi::session::QuoteSession;
use crate::store::SnapshotStore;
use anyhow::{bail, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

// -----------------------------------------------
// SNAPSHOT PIPELINE
// -----------------------------------------------

/// One triggered ingestion run: login, then walk the tracked indices in
/// order, fetching greeks and upserting the ATM window of each. Strictly
/// sequential across indices with a courtesy pause between upstream calls;
/// only the per-contract writes inside one index fan out.
pub struct SnapshotPipeline {
    config: Arc<AppConfig>,
    store: SnapshotStore,
    indices: &'static [IndexConfig],
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub contracts_written: usize,
}

impl SnapshotPipeline {
    pub fn new(config: Arc<AppConfig>, store: SnapshotStore) -> Self {
        Self {
            config,
            store,
            indices: config::TRACKED_INDICES,
        }
    }

    /// Fire-and-forget entry point: always logs a completion marker, whether
    /// the run finished, partially finished, or aborted.
    pub async fn run(&self) {
        info!(indices = self.indices.len(), "snapshot run starting");
        match self.run_inner().await {
            Ok(summary) => info!(
                processed = summary.processed,
                skipped = summary.skipped,
                contracts = summary.contracts_written,
                "snapshot run complete"
            ),
            Err(e) => error!(error = %e, "snapshot run aborted"),
        }
    }

    async fn run_inner(&self) -> Result<RunSummary> {
        let mut session = QuoteSession::new(self.config.credentials())?;
        if !session.login().await {
            bail!("SmartAPI login failed; nothing fetched this run");
        }
        let gateway = MarketDataGateway::new(session, config::market_holidays());

        let mut summary = RunSummary::default();
        for cfg in self.indices {
            match self.process_index(&gateway, cfg).await? {
                Some(written) => {
                    summary.processed += 1;
                    summary.contracts_written += written;
                }
                None => summary.skipped += 1,
            }
            // Trailing pause before the next index's calls.
            pace().await;
        }
        Ok(summary)
    }

    /// One index: price -> window -> expiry -> greeks -> filter -> upserts.
    /// Ok(None) is a logged skip; Err aborts the remaining indices.
    async fn process_index(
        &self,
        gateway: &MarketDataGateway,
        cfg: &IndexConfig,
    ) -> Result<Option<usize>> {
        let price = gateway.last_price(cfg).await;
        // Courtesy delay between consecutive upstream calls, regardless of
        // how the price lookup went.
        pace().await;

        let last_price = match price {
            FetchOutcome::Data(p) => p,
            FetchOutcome::Empty => {
                warn!(index = cfg.name, "no recent price data; skipping index");
                return Ok(None);
            }
            FetchOutcome::Failed => {
                warn!(index = cfg.name, "price lookup failed; skipping index");
                return Ok(None);
            }
        };

        let atm = atm_strike(last_price, cfg.strike_step);
        let (low, high) = strike_window(atm, cfg.strike_step);
        let expiry = gateway.nearest_expiry(cfg);
        info!(
            index = cfg.name,
            last_price,
            atm,
            window_low = low,
            window_high = high,
            expiry = %expiry,
            "resolved contract window"
        );

        let chain = match gateway.option_greeks(cfg, &expiry).await {
            FetchOutcome::Data(chain) => chain,
            FetchOutcome::Empty => {
                info!(index = cfg.name, expiry = %expiry, "upstream returned no greeks; skipping index");
                return Ok(None);
            }
            FetchOutcome::Failed => {
                warn!(index = cfg.name, expiry = %expiry, "greeks fetch failed; skipping index");
                return Ok(None);
            }
        };

        let records = build_records(cfg, &expiry, &chain, low, high);
        if records.is_empty() {
            info!(index = cfg.name, expiry = %expiry, "no contracts inside the ATM window");
            return Ok(None);
        }

        // All upserts for one index go out together; the first failure
        // aborts the run (writes already made stay put).
        let writes = records.iter().map(|r| self.store.upsert(cfg.name, r));
        for result in join_all(writes).await {
            result?;
        }

        info!(
            index = cfg.name,
            expiry = %expiry,
            contracts = records.len(),
            "snapshot upserted"
        );
        Ok(Some(records.len()))
    }
}

async fn pace() {
    tokio::time::sleep(Duration::from_millis(config::PACING_DELAY_MS)).await;
}

// -----------------------------------------------
// ATM WINDOW MATH (pure)
// -----------------------------------------------

/// Nearest tradable strike to the last price.
pub fn atm_strike(last_price: f64, step: u32) -> f64 {
    let step = step as f64;
    (last_price / step).round() * step
}

/// Symmetric window of ± ATM_WINDOW_STEPS strike steps, inclusive.
pub fn strike_window(atm: f64, step: u32) -> (f64, f64) {
    let half_width = (config::ATM_WINDOW_STEPS * step) as f64;
    (atm - half_width, atm + half_width)
}

/// Filter the chain to the window and shape each survivor into its persisted
/// record. Quotes with unparseable strikes are dropped.
pub fn build_records(
    cfg: &IndexConfig,
    expiry: &str,
    chain: &[GreekQuote],
    low: f64,
    high: f64,
) -> Vec<InstrumentRecord> {
    chain
        .iter()
        .filter(|quote| {
            quote
                .strike()
                .map(|strike| strike >= low && strike <= high)
                .unwrap_or(false)
        })
        .filter_map(|quote| InstrumentRecord::from_quote(cfg, expiry, quote))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smartapi::models::OptionSide;

    fn quote(strike: &str, side: OptionSide) -> GreekQuote {
        GreekQuote {
            name: Some("NIFTY".to_string()),
            expiry: Some("25DEC2025".to_string()),
            strike_price: strike.to_string(),
            option_type: side,
            delta: None,
            gamma: None,
            theta: None,
            vega: None,
            implied_volatility: None,
            trade_volume: None,
        }
    }

    #[test]
    fn test_atm_strike_rounds_to_step() {
        assert_eq!(atm_strike(24875.0, 50), 24900.0);
        assert_eq!(atm_strike(24874.0, 50), 24850.0);
        assert_eq!(atm_strike(51234.0, 100), 51200.0);
        assert_eq!(atm_strike(12512.0, 25), 12500.0);
    }

    #[test]
    fn test_strike_window_bounds() {
        let (low, high) = strike_window(24900.0, 50);
        assert_eq!((low, high), (24650.0, 25150.0));
    }

    #[test]
    fn test_build_records_inclusive_bounds() {
        let cfg = config::index_config("NIFTY").unwrap();
        let chain = vec![
            quote("24600.000000", OptionSide::Call), // below
            quote("24650.000000", OptionSide::Call), // lower bound
            quote("24900.000000", OptionSide::Put),  // inside
            quote("25150.000000", OptionSide::Put),  // upper bound
            quote("25200.000000", OptionSide::Call), // above
            quote("garbage", OptionSide::Call),      // unparseable
        ];
        let records = build_records(cfg, "25DEC2025", &chain, 24650.0, 25150.0);
        let symbols: Vec<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(
            symbols,
            vec![
                "NIFTY25DEC202524650CE",
                "NIFTY25DEC202524900PE",
                "NIFTY25DEC202525150PE"
            ]
        );
    }
}
