//! Core lookup and navigation engine

pub mod action;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod log;
pub mod pager;
pub mod rate;
pub mod router;
pub mod session;
pub mod view;

// Re-export main types for cleaner imports
pub use cache::AssetCache;
pub use error::{FetchError, LookupError};
pub use history::{HistoryOutcome, SupportedHistorySet};
pub use rate::{HistorySample, Instrument, RateSource};
pub use router::{Router, RouterSettings};
pub use view::{Button, Render};
