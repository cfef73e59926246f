use super::ui;
use crate::core::history::format_timestamp;
use crate::core::pager::page;
use crate::core::rate::{Instrument, rank_by_rate};
use crate::core::AssetCache;
use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment};

/// Prints one page of all lendable instruments, highest current rate first.
pub async fn run(cache: &AssetCache, page_index: usize, page_size: usize) -> Result<()> {
    let pb = ui::new_spinner("Fetching lending rates...");
    let instruments = cache.try_get(false).await;
    pb.finish_and_clear();
    let instruments = instruments.context("Failed to fetch asset list from OKX")?;

    let mut ranked: Vec<&Instrument> = instruments.iter().collect();
    rank_by_rate(&mut ranked);
    let p = page(&ranked, page_index, page_size);

    if p.items.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No pairs on page {} ({} in total).", page_index + 1, ranked.len()),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Pair"),
        ui::header_cell("Current"),
        ui::header_cell("Estimated"),
        ui::header_cell("Updated"),
    ]);

    let offset = page_index * page_size;
    for (i, instrument) in p.items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(offset + i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&instrument.symbol),
            ui::rate_cell(instrument.current_rate),
            ui::rate_cell(instrument.predicted_rate),
            instrument
                .as_of
                .as_ref()
                .map_or_else(|| ui::na_cell(false), |at| Cell::new(format_timestamp(at))),
        ]);
    }

    println!("{}", ui::style_text("Lending Rates (OKX)", ui::StyleType::Title));
    println!("{table}");

    let mut footer = format!("Page {} of {}", p.index + 1, p.total_pages);
    if p.has_next {
        footer.push_str(&format!(" · next: --page {}", p.index + 2));
    }
    println!("{}", ui::style_text(&footer, ui::StyleType::Subtle));
    Ok(())
}
