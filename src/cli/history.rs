use super::ui;
use crate::core::history::{HistoryOutcome, format_percent, format_timestamp, summarize};
use crate::core::{FetchError, HistorySample, RateSource, SupportedHistorySet};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;

enum Lookup {
    Unsupported,
    Fetched(Result<Vec<HistorySample>, FetchError>),
}

/// Prints recent history and today's average for each ticker. Histories are
/// fetched concurrently.
pub async fn run(
    source: &dyn RateSource,
    supported: &SupportedHistorySet,
    symbols: &[String],
    window: usize,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching lending history...");
    let lookups = join_all(symbols.iter().map(|symbol| async move {
        let symbol = symbol.trim().to_uppercase();
        let lookup = match supported.id_for(&symbol) {
            Some(id) => Lookup::Fetched(source.fetch_history(id).await),
            None => Lookup::Unsupported,
        };
        (symbol, lookup)
    }))
    .await;
    pb.finish_and_clear();

    let count = lookups.len();
    for (i, (symbol, lookup)) in lookups.into_iter().enumerate() {
        println!("{}\n", ui::style_text(&symbol, ui::StyleType::Title));
        match lookup {
            Lookup::Unsupported => println!(
                "{}",
                ui::style_text(
                    &format!("History is not available for {symbol}."),
                    ui::StyleType::Error
                )
            ),
            Lookup::Fetched(Err(e)) => println!(
                "{}",
                ui::style_text(
                    &format!("Failed to fetch history for {symbol}: {e}"),
                    ui::StyleType::Error
                )
            ),
            Lookup::Fetched(Ok(samples)) => print_history(&samples, window),
        }
        if i + 1 < count {
            ui::print_separator();
        }
    }

    Ok(())
}

fn print_history(samples: &[HistorySample], window: usize) {
    let summary = match summarize(samples, window) {
        HistoryOutcome::NoHistory => {
            println!(
                "{}",
                ui::style_text("No historical data available.", ui::StyleType::Subtle)
            );
            return;
        }
        HistoryOutcome::Summary(summary) => summary,
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Time"), ui::header_cell("Rate")]);
    for sample in samples.iter().take(window) {
        table.add_row(vec![
            Cell::new(format_timestamp(&sample.observed_at)),
            ui::rate_cell(sample.rate),
        ]);
    }
    println!("{table}");

    let label = format!("Average APR for {} (UTC):", summary.day);
    let value = match summary.average_today {
        Some(average) => ui::style_text(
            &format!(
                "{} ({} records)",
                format_percent(average),
                summary.samples_today
            ),
            ui::StyleType::TotalValue,
        ),
        None => ui::style_text("N/A (no records for today)", ui::StyleType::Subtle),
    };
    println!(
        "\n{} {}",
        ui::style_text(&label, ui::StyleType::TotalLabel),
        value
    );
}
