pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{AssetCache, RateSource, Router};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    /// One page of all pairs, ranked by current rate
    List { page: usize },
    /// Current rates for the given tickers
    Rate { symbols: Vec<String> },
    /// Recent history for the given tickers
    History { symbols: Vec<String> },
    /// Interactive menu session
    Chat,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Lending rate lookup starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let okx = config.okx();
    let source: Arc<dyn RateSource> = Arc::new(
        providers::OkxSource::new(&okx.base_url, Duration::from_secs(okx.timeout_secs))
            .context("Failed to create OKX client")?,
    );
    let cache = AssetCache::new(Arc::clone(&source), config.cache_ttl());
    let supported = config.supported_history();
    let settings = config.router_settings();

    match command {
        AppCommand::List { page } => cli::list::run(&cache, page, settings.page_size).await,
        AppCommand::Rate { symbols } => cli::rate::run(&cache, &supported, &symbols).await,
        AppCommand::History { symbols } => {
            cli::history::run(source.as_ref(), &supported, &symbols, settings.history_window).await
        }
        AppCommand::Chat => {
            let router = Router::new(source, cache, supported, settings);
            cli::chat::run(&router).await
        }
    }
}
