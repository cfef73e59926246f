use super::ui;
use crate::core::history::format_timestamp;
use crate::core::rate::find_by_symbol;
use crate::core::{AssetCache, SupportedHistorySet};
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::debug;

/// Prints current and estimated rates for the given tickers.
pub async fn run(
    cache: &AssetCache,
    supported: &SupportedHistorySet,
    symbols: &[String],
) -> Result<()> {
    let pb = ui::new_spinner("Fetching lending rates...");
    let instruments = cache.try_get(false).await;
    pb.finish_and_clear();
    let instruments = instruments.context("Failed to fetch asset list from OKX")?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Current"),
        ui::header_cell("Estimated"),
        ui::header_cell("Updated"),
        ui::header_cell("History"),
    ]);

    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        let history = if supported.contains(&symbol) { "yes" } else { "no" };
        match find_by_symbol(&symbol, &instruments) {
            Some(instrument) => table.add_row(vec![
                Cell::new(&instrument.symbol),
                ui::rate_cell(instrument.current_rate),
                ui::rate_cell(instrument.predicted_rate),
                instrument
                    .as_of
                    .as_ref()
                    .map_or_else(|| ui::na_cell(false), |at| Cell::new(format_timestamp(at))),
                Cell::new(history),
            ]),
            None => {
                debug!("{} not found in lending list", symbol);
                table.add_row(vec![
                    Cell::new(ui::style_text(&symbol, ui::StyleType::Error)),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    Cell::new(history),
                ])
            }
        };
    }

    println!("{table}");
    Ok(())
}
