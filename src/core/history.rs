//! Turns a raw history series into display lines and a same-day average.

use crate::core::rate::HistorySample;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW: usize = 24;

/// Result of [`summarize`]. An empty series is reported as `NoHistory`
/// rather than as a summary with no lines.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    NoHistory,
    Summary(HistorySummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    /// UTC day the average was computed for.
    pub day: NaiveDate,
    /// Newest first, at most `window` entries.
    pub lines: Vec<String>,
    /// `None` when no sample falls on `day`. A zero rate is a real value.
    pub average_today: Option<f64>,
    pub samples_today: usize,
}

/// Summarizes `samples` against today's UTC date.
pub fn summarize(samples: &[HistorySample], window: usize) -> HistoryOutcome {
    summarize_on(samples, window, Utc::now().date_naive())
}

/// Summarizes `samples` against an explicit UTC day.
///
/// The display window is the first `window` samples in source order. The
/// average covers every sample of the full series observed on `day`.
pub fn summarize_on(samples: &[HistorySample], window: usize, day: NaiveDate) -> HistoryOutcome {
    if samples.is_empty() {
        return HistoryOutcome::NoHistory;
    }

    let (sum, count) = samples
        .iter()
        .filter(|s| s.observed_at.date_naive() == day)
        .fold((0.0, 0usize), |(sum, count), s| (sum + s.rate, count + 1));

    let lines = samples
        .iter()
        .take(window)
        .map(|s| display_line(&s.observed_at, s.rate))
        .collect();

    HistoryOutcome::Summary(HistorySummary {
        day,
        lines,
        average_today: (count > 0).then(|| sum / count as f64),
        samples_today: count,
    })
}

/// Rate fraction scaled to percent, rounded to two decimals half away from
/// zero. Non-finite input maps to zero.
pub fn percent(rate: f64) -> Decimal {
    let fraction = Decimal::from_f64(rate).unwrap_or_default();
    (fraction * Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", percent(rate))
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn display_line(at: &DateTime<Utc>, rate: f64) -> String {
    format!("{} — {}", format_timestamp(at), format_percent(rate))
}

/// Symbols for which the feed serves history, and their feed ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedHistorySet {
    ids: BTreeMap<String, u64>,
}

impl SupportedHistorySet {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let ids = entries
            .into_iter()
            .map(|(symbol, id)| (symbol.as_ref().trim().to_uppercase(), id))
            .collect();
        Self { ids }
    }

    pub fn id_for(&self, symbol: &str) -> Option<u64> {
        self.ids.get(&symbol.trim().to_uppercase()).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.id_for(symbol).is_some()
    }

    /// Supported symbols in ascending order.
    pub fn symbols(&self) -> Vec<String> {
        self.ids.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
