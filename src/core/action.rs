//! Action tokens carried by menu buttons.
//!
//! A token is `<verb>` or `<verb>_<arg>`. The token holds all navigation
//! state (page index, symbol, filter query), so nothing about the current
//! view is stored between requests.

use crate::core::error::LookupError;
use std::fmt::{self, Display};
use std::str::FromStr;

pub const DELIMITER: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Page,
    Item,
    Refresh,
    History,
    HistoryPage,
    Search,
    Filter,
    Back,
}

/// Parse table. Longer names come first so `history_page_1` never reads as
/// `history` of `PAGE_1`; `asset` is kept as an alias of `item`.
const VERBS: &[(&str, Verb)] = &[
    ("history_page", Verb::HistoryPage),
    ("history", Verb::History),
    ("refresh", Verb::Refresh),
    ("search", Verb::Search),
    ("filter", Verb::Filter),
    ("asset", Verb::Item),
    ("item", Verb::Item),
    ("page", Verb::Page),
    ("back", Verb::Back),
];

impl Verb {
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Page => "page",
            Verb::Item => "item",
            Verb::Refresh => "refresh",
            Verb::History => "history",
            Verb::HistoryPage => "history_page",
            Verb::Search => "search",
            Verb::Filter => "filter",
            Verb::Back => "back",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    Menu,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Page of the full instrument list.
    Page(usize),
    Item(String),
    Refresh(String),
    History(String),
    /// Page of the supported-history symbols.
    HistoryPage(usize),
    /// Prompt for a ticker.
    Search,
    /// Prompt for a symbol substring.
    Filter,
    /// Page of instruments matching a query.
    FilterPage { page: usize, query: String },
    Back(BackTarget),
}

/// Splits a token into its verb and the raw remainder after the first
/// delimiter. Symbols may contain the delimiter and are passed through.
pub fn split_token(token: &str) -> Option<(Verb, Option<&str>)> {
    VERBS.iter().find_map(|(name, verb)| {
        let rest = token.strip_prefix(name)?;
        if rest.is_empty() {
            Some((*verb, None))
        } else {
            rest.strip_prefix(DELIMITER).map(|arg| (*verb, Some(arg)))
        }
    })
}

fn symbol_arg(arg: Option<&str>) -> Option<String> {
    arg.map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty())
}

fn index_arg(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|s| s.parse().ok())
}

impl Action {
    pub fn verb(&self) -> Verb {
        match self {
            Action::Page(_) => Verb::Page,
            Action::Item(_) => Verb::Item,
            Action::Refresh(_) => Verb::Refresh,
            Action::History(_) => Verb::History,
            Action::HistoryPage(_) => Verb::HistoryPage,
            Action::Search => Verb::Search,
            Action::Filter | Action::FilterPage { .. } => Verb::Filter,
            Action::Back(_) => Verb::Back,
        }
    }

    /// Everything after the verb's delimiter, if any.
    pub fn arg(&self) -> Option<String> {
        match self {
            Action::Page(n) | Action::HistoryPage(n) => Some(n.to_string()),
            Action::Item(s) | Action::Refresh(s) | Action::History(s) => Some(s.clone()),
            Action::FilterPage { page, query } => Some(format!("{page}{DELIMITER}{query}")),
            Action::Back(BackTarget::Menu) => Some("menu".to_string()),
            Action::Back(BackTarget::History) => Some("history".to_string()),
            Action::Search | Action::Filter => None,
        }
    }

    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arg() {
            Some(arg) => write!(f, "{}{}{}", self.verb().name(), DELIMITER, arg),
            None => write!(f, "{}", self.verb().name()),
        }
    }
}

impl FromStr for Action {
    type Err = LookupError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let unknown = || LookupError::UnknownAction(token.to_string());
        let (verb, arg) = split_token(token).ok_or_else(unknown)?;

        let action = match verb {
            Verb::Page => index_arg(arg).map(Action::Page),
            Verb::HistoryPage => index_arg(arg).map(Action::HistoryPage),
            Verb::Item => symbol_arg(arg).map(Action::Item),
            Verb::Refresh => symbol_arg(arg).map(Action::Refresh),
            Verb::History => symbol_arg(arg).map(Action::History),
            Verb::Search => arg.is_none().then_some(Action::Search),
            Verb::Filter => match arg {
                None => Some(Action::Filter),
                Some(rest) => rest.split_once(DELIMITER).and_then(|(page, query)| {
                    Some(Action::FilterPage {
                        page: page.parse().ok()?,
                        query: symbol_arg(Some(query))?,
                    })
                }),
            },
            Verb::Back => match arg {
                Some("menu") => Some(Action::Back(BackTarget::Menu)),
                Some("history") => Some(Action::Back(BackTarget::History)),
                _ => None,
            },
        };

        action.ok_or_else(unknown)
    }
}
