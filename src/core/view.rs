//! Render instructions handed back to the transport.

use crate::core::action::{Action, BackTarget};
use crate::core::error::LookupError;
use crate::core::history::{HistoryOutcome, format_percent, format_timestamp};
use crate::core::pager::Page;
use crate::core::rate::Instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

/// Message text plus the actions available from it, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl Render {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn button(mut self, label: impl Into<String>, action: Action) -> Self {
        self.buttons.push(btn(label, action));
        self
    }

    pub fn tokens(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.token.as_str()).collect()
    }
}

fn btn(label: impl Into<String>, action: Action) -> Button {
    Button {
        label: label.into(),
        token: action.token(),
    }
}

fn back_to_menu(render: Render) -> Render {
    render.button("⬅ Back to Menu", Action::Back(BackTarget::Menu))
}

pub fn main_menu() -> Render {
    Render::new("📊 Welcome! Choose an option or type a ticker (e.g., TON) directly.")
        .button("🔍 Search by Ticker", Action::Search)
        .button("🔎 Filter Pairs", Action::Filter)
        .button("📋 View All Pairs", Action::Page(0))
        .button("📊 History", Action::HistoryPage(0))
}

pub fn search_prompt() -> Render {
    Render::new("✏ Enter the crypto ticker (e.g., TON):")
}

pub fn filter_prompt() -> Render {
    Render::new("✏ Enter part of a ticker to filter pairs (e.g., US):")
}

pub fn empty_input() -> Render {
    back_to_menu(Render::new("✏ Type a ticker such as TON."))
}

pub fn rate_card(instrument: &Instrument, history_supported: bool) -> Render {
    let updated = instrument
        .as_of
        .as_ref()
        .map_or_else(|| "an unknown time".to_string(), format_timestamp);
    let text = format!(
        "♻ Updated *{}* Lending Rates at {}\n💰 Current rate: *{}*\n📈 Estimated rate: *{}*",
        instrument.symbol,
        updated,
        format_percent(instrument.current_rate),
        format_percent(instrument.predicted_rate),
    );

    let mut render = Render::new(text).button("♻ Refresh", Action::Refresh(instrument.symbol.clone()));
    if history_supported {
        render = render.button("📊 History", Action::History(instrument.symbol.clone()));
    }
    back_to_menu(render)
}

pub fn history(symbol: &str, outcome: &HistoryOutcome) -> Render {
    let text = match outcome {
        HistoryOutcome::NoHistory => format!("⚠ No historical data available for {symbol}."),
        HistoryOutcome::Summary(summary) => {
            let mut lines = vec![format!(
                "📊 *{symbol}* Lending Rate — Last {} records\n",
                summary.lines.len()
            )];
            lines.push(match summary.average_today {
                Some(average) => format!(
                    "📌 Average APR for {} (UTC): *{}* (based on {} records)\n",
                    summary.day,
                    format_percent(average),
                    summary.samples_today
                ),
                None => format!(
                    "📌 Average APR for {} (UTC): *N/A* (no records for today)\n",
                    summary.day
                ),
            });
            lines.extend(summary.lines.iter().cloned());
            lines.join("\n")
        }
    };

    back_to_menu(Render::new(text).button("⬅ Back to History list", Action::Back(BackTarget::History)))
}

/// Builds a list page: one button per entry, then prev/next, then back.
pub fn list_page<T>(
    title: &str,
    page: &Page<'_, T>,
    entry: impl Fn(&T) -> (String, Action),
    nav: impl Fn(usize) -> Action,
) -> Render {
    if page.items.is_empty() {
        return back_to_menu(Render::new(format!("📄 {title} — nothing to show on this page.")));
    }

    let mut render = Render::new(format!(
        "📄 {title} — Page {} of {}",
        page.index + 1,
        page.total_pages
    ));
    for item in page.items {
        let (label, action) = entry(item);
        render = render.button(label, action);
    }
    if page.has_prev {
        render = render.button("⬅ Prev", nav(page.index - 1));
    }
    if page.has_next {
        render = render.button("Next ➡", nav(page.index + 1));
    }
    back_to_menu(render)
}

pub fn error(err: &LookupError) -> Render {
    let text = match err {
        LookupError::Fetch(e) => format!("⚠ Failed to fetch data from OKX: {e}"),
        LookupError::NotFound(_) => format!("❌ {err}."),
        LookupError::Unsupported(_) => format!("⚠ {err}."),
        LookupError::UnknownAction(_) => "Unknown action.".to_string(),
    };
    back_to_menu(Render::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pager::page;

    #[test]
    fn test_main_menu_tokens() {
        assert_eq!(
            main_menu().tokens(),
            vec!["search", "filter", "page_0", "history_page_0"]
        );
    }

    #[test]
    fn test_rate_card_hides_history_when_unsupported() {
        let instrument = Instrument {
            symbol: "BTC".to_string(),
            current_rate: 0.0123,
            predicted_rate: 0.015,
            as_of: None,
        };

        let render = rate_card(&instrument, false);
        assert!(render.text.contains("*1.23%*"));
        assert!(render.text.contains("*1.50%*"));
        assert_eq!(render.tokens(), vec!["refresh_BTC", "back_menu"]);

        let render = rate_card(&instrument, true);
        assert_eq!(render.tokens(), vec!["refresh_BTC", "history_BTC", "back_menu"]);
    }

    #[test]
    fn test_list_page_navigation_buttons() {
        let symbols = ["A", "B", "C"];
        let p = page(&symbols, 1, 1);
        let render = list_page(
            "Pairs",
            &p,
            |s| (s.to_string(), Action::Item(s.to_string())),
            Action::Page,
        );

        assert!(render.text.ends_with("Page 2 of 3"));
        assert_eq!(render.tokens(), vec!["item_B", "page_0", "page_2", "back_menu"]);
    }

    #[test]
    fn test_history_without_samples() {
        let render = history("TON", &HistoryOutcome::NoHistory);
        assert_eq!(render.text, "⚠ No historical data available for TON.");
        assert_eq!(render.tokens(), vec!["back_history", "back_menu"]);
    }
}
