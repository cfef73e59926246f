//! Terminal front end: one-shot table commands and the chat session.

pub mod chat;
pub mod history;
pub mod list;
pub mod rate;
pub mod setup;
pub mod ui;
