//! Maps action tokens, commands and free text to views.

use crate::core::action::{Action, BackTarget};
use crate::core::cache::AssetCache;
use crate::core::error::LookupError;
use crate::core::history::{SupportedHistorySet, format_percent, summarize};
use crate::core::pager::page;
use crate::core::rate::{Instrument, RateSource, find_by_symbol, rank_by_rate};
use crate::core::session::{Prompt, SessionId, Sessions};
use crate::core::view::{self, Render};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct RouterSettings {
    pub page_size: usize,
    pub history_window: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            page_size: 10,
            history_window: crate::core::history::DEFAULT_WINDOW,
        }
    }
}

pub struct Router {
    source: Arc<dyn RateSource>,
    cache: AssetCache,
    supported: SupportedHistorySet,
    sessions: Sessions,
    settings: RouterSettings,
}

type Outcome = Result<Render, LookupError>;

impl Router {
    pub fn new(
        source: Arc<dyn RateSource>,
        cache: AssetCache,
        supported: SupportedHistorySet,
        settings: RouterSettings,
    ) -> Self {
        Self {
            source,
            cache,
            supported,
            sessions: Sessions::new(),
            settings,
        }
    }

    pub async fn pending_prompt(&self, session: SessionId) -> Option<Prompt> {
        self.sessions.pending(session).await
    }

    /// Main menu. Drops any prompt still waiting for an answer.
    pub async fn start(&self, session: SessionId) -> Render {
        self.sessions.take(session).await;
        view::main_menu()
    }

    /// Handles a button tap.
    pub async fn handle_action(&self, session: SessionId, token: &str) -> Render {
        debug!(session, token, "Handling action");
        let outcome = match token.parse::<Action>() {
            Ok(action) => self.dispatch(session, action).await,
            Err(e) => Err(e),
        };
        self.finish(outcome)
    }

    /// Handles a slash command. `/start` and `/menu` open the main menu, any
    /// other command is read as a ticker (`/ton`). Either way the pending
    /// prompt is dropped.
    pub async fn handle_command(&self, session: SessionId, command: &str) -> Render {
        self.sessions.take(session).await;

        let name = command.trim().trim_start_matches('/');
        let name = name.split('@').next().unwrap_or_default();
        debug!(session, command = name, "Handling command");

        match name.to_lowercase().as_str() {
            "start" | "menu" => view::main_menu(),
            "" => view::empty_input(),
            _ => self.finish(self.rate_card(name, false).await),
        }
    }

    /// Handles a free-text message. A pending prompt is consumed whatever the
    /// text holds; without one the text is looked up as a ticker.
    pub async fn handle_text(&self, session: SessionId, text: &str) -> Render {
        let prompt = self.sessions.take(session).await;
        let text = text.trim();
        debug!(session, ?prompt, text, "Handling text");

        if text.is_empty() {
            return view::empty_input();
        }

        let outcome = match prompt {
            Some(Prompt::Filter) => self.filter_page(0, &text.to_uppercase()).await,
            Some(Prompt::Search) | None => self.rate_card(text, false).await,
        };
        self.finish(outcome)
    }

    fn finish(&self, outcome: Outcome) -> Render {
        outcome.unwrap_or_else(|e| {
            info!(error = %e, "Lookup failed");
            view::error(&e)
        })
    }

    async fn dispatch(&self, session: SessionId, action: Action) -> Outcome {
        match action {
            Action::Page(index) => self.asset_page(index).await,
            Action::Item(symbol) => self.rate_card(&symbol, false).await,
            Action::Refresh(symbol) => self.rate_card(&symbol, true).await,
            Action::History(symbol) => self.history(&symbol).await,
            Action::HistoryPage(index) => Ok(self.history_page(index)),
            Action::Search => {
                self.sessions.arm(session, Prompt::Search).await;
                Ok(view::search_prompt())
            }
            Action::Filter => {
                self.sessions.arm(session, Prompt::Filter).await;
                Ok(view::filter_prompt())
            }
            Action::FilterPage { page, query } => self.filter_page(page, &query).await,
            Action::Back(BackTarget::Menu) => Ok(view::main_menu()),
            Action::Back(BackTarget::History) => Ok(self.history_page(0)),
        }
    }

    async fn rate_card(&self, symbol: &str, force_refresh: bool) -> Outcome {
        let symbol = symbol.trim().to_uppercase();
        let instruments = self.cache.try_get(force_refresh).await?;
        let instrument =
            find_by_symbol(&symbol, &instruments).ok_or_else(|| LookupError::NotFound(symbol.clone()))?;
        Ok(view::rate_card(instrument, self.supported.contains(&symbol)))
    }

    async fn history(&self, symbol: &str) -> Outcome {
        let symbol = symbol.trim().to_uppercase();
        let id = self
            .supported
            .id_for(&symbol)
            .ok_or_else(|| LookupError::Unsupported(symbol.clone()))?;
        let samples = self.source.fetch_history(id).await?;
        let outcome = summarize(&samples, self.settings.history_window);
        Ok(view::history(&symbol, &outcome))
    }

    async fn asset_page(&self, index: usize) -> Outcome {
        let instruments = self.cache.try_get(false).await?;
        let mut ranked: Vec<&Instrument> = instruments.iter().collect();
        rank_by_rate(&mut ranked);

        let p = page(&ranked, index, self.settings.page_size);
        Ok(view::list_page("All Pairs", &p, instrument_entry, Action::Page))
    }

    async fn filter_page(&self, index: usize, query: &str) -> Outcome {
        let instruments = self.cache.try_get(false).await?;
        let mut matches: Vec<&Instrument> = instruments
            .iter()
            .filter(|i| i.symbol.contains(query))
            .collect();
        if matches.is_empty() {
            return Err(LookupError::NotFound(query.to_string()));
        }
        rank_by_rate(&mut matches);

        let p = page(&matches, index, self.settings.page_size);
        Ok(view::list_page(
            &format!("Pairs matching \"{query}\""),
            &p,
            instrument_entry,
            |n| Action::FilterPage {
                page: n,
                query: query.to_string(),
            },
        ))
    }

    fn history_page(&self, index: usize) -> Render {
        let symbols = self.supported.symbols();
        let p = page(&symbols, index, self.settings.page_size);
        view::list_page(
            "History",
            &p,
            |symbol: &String| (symbol.clone(), Action::History(symbol.clone())),
            Action::HistoryPage,
        )
    }
}

fn instrument_entry(instrument: &&Instrument) -> (String, Action) {
    (
        format!("{} {}", instrument.symbol, format_percent(instrument.current_rate)),
        Action::Item(instrument.symbol.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FetchError;
    use crate::core::rate::HistorySample;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockSource {
        instruments: Vec<Instrument>,
        history: HashMap<u64, Vec<HistorySample>>,
        list_calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl RateSource for MockSource {
        async fn fetch_instruments(&self) -> Result<Vec<Instrument>, FetchError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(FetchError::Timeout);
            }
            Ok(self.instruments.clone())
        }

        async fn fetch_history(&self, instrument_id: u64) -> Result<Vec<HistorySample>, FetchError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(FetchError::Status(500));
            }
            Ok(self.history.get(&instrument_id).cloned().unwrap_or_default())
        }
    }

    fn instrument(symbol: &str, current_rate: f64) -> Instrument {
        Instrument {
            symbol: symbol.to_string(),
            current_rate,
            predicted_rate: current_rate / 2.0,
            as_of: None,
        }
    }

    fn mock_source() -> Arc<MockSource> {
        let now = Utc::now();
        let history = HashMap::from([(
            2054,
            vec![
                HistorySample {
                    instrument_id: 2054,
                    rate: 0.01,
                    observed_at: now,
                },
                HistorySample {
                    instrument_id: 2054,
                    rate: 0.03,
                    observed_at: now,
                },
                HistorySample {
                    instrument_id: 2054,
                    rate: 0.9,
                    observed_at: now - ChronoDuration::days(2),
                },
            ],
        )]);
        Arc::new(MockSource {
            instruments: vec![
                instrument("USDT", 0.05),
                instrument("TON", 0.12),
                instrument("USDC", 0.07),
                instrument("BTC_USD", 0.01),
            ],
            history,
            list_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    fn router_with(source: Arc<MockSource>, page_size: usize) -> Router {
        let cache = AssetCache::new(source.clone(), Duration::from_secs(30));
        Router::new(
            source,
            cache,
            SupportedHistorySet::new([("TON", 2054), ("USDT", 7), ("DOT", 1486)]),
            RouterSettings {
                page_size,
                history_window: 24,
            },
        )
    }

    #[tokio::test]
    async fn test_asset_pages_are_ranked_and_linked() {
        let router = router_with(mock_source(), 2);

        let first = router.handle_action(1, "page_0").await;
        assert_eq!(first.tokens(), vec!["item_TON", "item_USDC", "page_1", "back_menu"]);
        assert_eq!(first.buttons[0].label, "TON 12.00%");

        let second = router.handle_action(1, "page_1").await;
        assert_eq!(
            second.tokens(),
            vec!["item_USDT", "item_BTC_USD", "page_0", "back_menu"]
        );

        let beyond = router.handle_action(1, "page_7").await;
        assert_eq!(beyond.tokens(), vec!["back_menu"]);
    }

    #[tokio::test]
    async fn test_item_with_delimiter_in_symbol() {
        let router = router_with(mock_source(), 10);

        let render = router.handle_action(1, "item_btc_usd").await;
        assert!(render.text.contains("*BTC_USD*"));
        assert_eq!(render.tokens(), vec!["refresh_BTC_USD", "back_menu"]);
    }

    #[tokio::test]
    async fn test_refresh_forces_fetch() {
        let source = mock_source();
        let router = router_with(source.clone(), 10);

        router.handle_action(1, "item_TON").await;
        router.handle_action(1, "item_TON").await;
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);

        let render = router.handle_action(1, "refresh_TON").await;
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(render.tokens(), vec!["refresh_TON", "history_TON", "back_menu"]);
    }

    #[tokio::test]
    async fn test_search_prompt_is_consumed_once() {
        let router = router_with(mock_source(), 10);

        let prompt = router.handle_action(7, "search").await;
        assert!(prompt.buttons.is_empty());
        assert_eq!(router.pending_prompt(7).await, Some(Prompt::Search));

        let answer = router.handle_text(7, "ton").await;
        assert!(answer.text.contains("*TON*"));
        assert_eq!(router.pending_prompt(7).await, None);

        let next = router.handle_text(7, "usdt").await;
        assert!(next.text.contains("*USDT*"));
        assert_eq!(router.pending_prompt(7).await, None);
    }

    #[tokio::test]
    async fn test_filter_prompt_then_stateless_text() {
        let router = router_with(mock_source(), 10);

        router.handle_action(3, "filter").await;
        let matches = router.handle_text(3, "us").await;
        assert!(matches.text.contains("Pairs matching \"US\""));
        assert_eq!(
            matches.tokens(),
            vec!["item_USDC", "item_USDT", "item_BTC_USD", "back_menu"]
        );

        // The prompt is gone, so the same text is now a ticker lookup.
        let lookup = router.handle_text(3, "us").await;
        assert_eq!(lookup.text, "❌ US not found in lending list.");
    }

    #[tokio::test]
    async fn test_invalid_prompt_answer_still_clears_flag() {
        let router = router_with(mock_source(), 10);

        router.handle_action(4, "search").await;
        let render = router.handle_text(4, "nope").await;
        assert_eq!(render.text, "❌ NOPE not found in lending list.");
        assert_eq!(router.pending_prompt(4).await, None);
    }

    #[tokio::test]
    async fn test_last_prompt_wins() {
        let router = router_with(mock_source(), 10);

        router.handle_action(5, "search").await;
        router.handle_action(5, "filter").await;
        let render = router.handle_text(5, "usd").await;
        assert!(render.text.contains("Pairs matching \"USD\""));
    }

    #[tokio::test]
    async fn test_prompts_are_per_session() {
        let router = router_with(mock_source(), 10);

        router.handle_action(1, "filter").await;
        let other = router.handle_text(2, "ton").await;
        assert!(other.text.contains("*TON*"));
        assert_eq!(router.pending_prompt(1).await, Some(Prompt::Filter));
    }

    #[tokio::test]
    async fn test_history_summary() {
        let router = router_with(mock_source(), 10);

        let render = router.handle_action(1, "history_ton").await;
        assert!(render.text.contains("Last 3 records"));
        assert!(render.text.contains("*2.00%* (based on 2 records)"));
        assert!(render.text.contains("90.00%"));
        assert_eq!(render.tokens(), vec!["back_history", "back_menu"]);
    }

    #[tokio::test]
    async fn test_history_without_samples() {
        let router = router_with(mock_source(), 10);

        let render = router.handle_action(1, "history_USDT").await;
        assert_eq!(render.text, "⚠ No historical data available for USDT.");
    }

    #[tokio::test]
    async fn test_history_unsupported_symbol() {
        let router = router_with(mock_source(), 10);

        let render = router.handle_action(1, "history_BTC").await;
        assert_eq!(render.text, "⚠ history is not available for BTC.");
        assert_eq!(render.tokens(), vec!["back_menu"]);
    }

    #[tokio::test]
    async fn test_history_fetch_error_is_surfaced() {
        let source = mock_source();
        let router = router_with(source.clone(), 10);
        source.failing.store(true, Ordering::SeqCst);

        let render = router.handle_action(1, "history_TON").await;
        assert_eq!(
            render.text,
            "⚠ Failed to fetch data from OKX: unexpected HTTP status: 500"
        );
    }

    #[tokio::test]
    async fn test_list_uses_stale_data_after_failure() {
        let source = mock_source();
        let router = router_with(source.clone(), 10);

        router.handle_action(1, "page_0").await;
        source.failing.store(true, Ordering::SeqCst);

        let render = router.handle_action(1, "refresh_TON").await;
        assert!(render.text.contains("*TON*"));
    }

    #[tokio::test]
    async fn test_list_without_any_data() {
        let source = mock_source();
        source.failing.store(true, Ordering::SeqCst);
        let router = router_with(source, 10);

        let render = router.handle_action(1, "page_0").await;
        assert_eq!(render.text, "⚠ Failed to fetch data from OKX: request timed out");
    }

    #[tokio::test]
    async fn test_history_pages_and_back() {
        let router = router_with(mock_source(), 2);

        let first = router.handle_action(1, "history_page_0").await;
        assert_eq!(
            first.tokens(),
            vec!["history_DOT", "history_TON", "history_page_1", "back_menu"]
        );

        let back = router.handle_action(1, "back_history").await;
        assert_eq!(back, first);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let router = router_with(mock_source(), 10);

        let render = router.handle_action(1, "hist_asset_TON").await;
        assert_eq!(render.text, "Unknown action.");
        assert_eq!(render.tokens(), vec!["back_menu"]);
    }

    #[tokio::test]
    async fn test_commands() {
        let router = router_with(mock_source(), 10);

        router.handle_action(9, "filter").await;
        let menu = router.handle_command(9, "/start").await;
        assert_eq!(menu, view::main_menu());
        assert_eq!(router.pending_prompt(9).await, None);

        let ton = router.handle_command(9, "/ton@lendrate_bot").await;
        assert!(ton.text.contains("*TON*"));
    }
}
