//! Lending rate abstractions and core types

use crate::core::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A lendable asset and its rates, as reported by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Upper-cased ticker
    pub symbol: String,
    pub current_rate: f64,
    pub predicted_rate: f64,
    pub as_of: Option<DateTime<Utc>>,
}

/// One historical observation of an instrument's rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub instrument_id: u64,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Full instrument list, in feed order.
    async fn fetch_instruments(&self) -> Result<Vec<Instrument>, FetchError>;

    /// History samples for one instrument, newest first.
    async fn fetch_history(&self, instrument_id: u64) -> Result<Vec<HistorySample>, FetchError>;
}

/// Case-insensitive exact match on the symbol. The feed does not promise
/// unique symbols, so the first match wins.
pub fn find_by_symbol<'a>(symbol: &str, instruments: &'a [Instrument]) -> Option<&'a Instrument> {
    let symbol = symbol.trim();
    instruments
        .iter()
        .find(|instrument| instrument.symbol.eq_ignore_ascii_case(symbol))
}

/// Orders instruments by descending current rate, ties broken by symbol.
pub fn rank_by_rate(instruments: &mut [&Instrument]) {
    instruments.sort_by(|a, b| match b.current_rate.total_cmp(&a.current_rate) {
        Ordering::Equal => a.symbol.cmp(&b.symbol),
        other => other,
    });
}
