//! The dashboard: summary cards, spending by category, savings progress,
//! net worth trend and asset allocation, all derived from one snapshot of
//! backend state.

use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, error};

use super::ui;
use crate::api::{ApiClient, token};
use crate::core::analytics::{self, TimeRange};
use crate::core::config::AppConfig;
use crate::core::fetch;
use crate::core::model::{Asset, Bank, CreditCard, Saving, SourceKind};
use crate::core::refresh::{Debouncer, FetchGeneration};
use crate::core::transaction::NormalizedTransaction;

/// One refresh cycle's worth of backend state. Derived views are
/// recomputed from this on every render; nothing here outlives the next
/// refresh.
pub struct DashboardData {
    pub assets: Vec<Asset>,
    pub banks: Vec<Bank>,
    pub savings: Vec<Saving>,
    pub cards: Vec<CreditCard>,
    pub transactions: Vec<NormalizedTransaction>,
    pub range: TimeRange,
}

/// Fetches entity lists in parallel, then their transactions through the
/// bounded fetcher, one pool per entity group.
pub async fn load(
    client: &ApiClient,
    range: TimeRange,
    concurrency: usize,
    quiet: bool,
) -> Result<DashboardData> {
    let (assets, banks, savings, cards) = tokio::try_join!(
        client.list_assets(),
        client.list_banks(),
        client.list_savings(),
        client.list_credit_cards(),
    )?;

    let total = (assets.len() + banks.len() + savings.len() + cards.len()) as u64;
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ui::new_progress_bar(total, true)
    };
    pb.set_message("Fetching transactions...");

    let since = Some(range.start(Utc::now().date_naive()));
    let asset_ids: Vec<u64> = assets.iter().map(|a| a.id).collect();
    let bank_ids: Vec<u64> = banks.iter().map(|b| b.id).collect();
    let saving_ids: Vec<u64> = savings.iter().map(|s| s.id).collect();
    let card_ids: Vec<u64> = cards.iter().map(|c| c.id).collect();
    let progress = || pb.inc(1);

    // Feeds must outlive the joined futures borrowing them.
    let asset_feed = client.feed(SourceKind::Asset);
    let bank_feed = client.feed(SourceKind::Bank);
    let saving_feed = client.feed(SourceKind::Saving);
    let card_feed = client.feed(SourceKind::Credit);

    let (asset_txns, bank_txns, saving_txns, card_txns) = tokio::join!(
        fetch::fetch_group(
            &asset_feed,
            &asset_ids,
            SourceKind::Asset,
            concurrency,
            since,
            &progress,
        ),
        fetch::fetch_group(
            &bank_feed,
            &bank_ids,
            SourceKind::Bank,
            concurrency,
            since,
            &progress,
        ),
        fetch::fetch_group(
            &saving_feed,
            &saving_ids,
            SourceKind::Saving,
            concurrency,
            since,
            &progress,
        ),
        fetch::fetch_group(
            &card_feed,
            &card_ids,
            SourceKind::Credit,
            concurrency,
            since,
            &progress,
        ),
    );
    pb.finish_and_clear();

    let mut transactions = asset_txns;
    transactions.extend(bank_txns);
    transactions.extend(saving_txns);
    transactions.extend(card_txns);
    fetch::sort_chronological(&mut transactions);
    debug!("Loaded {} transactions", transactions.len());

    Ok(DashboardData {
        assets,
        banks,
        savings,
        cards,
        transactions,
        range,
    })
}

pub fn render(data: &DashboardData, currency: &str) {
    let summary = analytics::summarize(&data.assets, &data.banks, &data.savings, &data.cards);

    println!(
        "{} ({})\n",
        ui::style_text("Financial Dashboard", ui::StyleType::Title),
        data.range.description()
    );

    let mut cards_table = ui::new_styled_table();
    cards_table.set_header(vec![
        ui::header_cell("Net Worth"),
        ui::header_cell("Total Assets"),
        ui::header_cell("Bank Balances"),
        ui::header_cell("Savings"),
        ui::header_cell("Credit Card Debt"),
    ]);
    cards_table.add_row(vec![
        ui::money_cell(summary.net_worth),
        ui::money_cell(summary.total_assets),
        ui::money_cell(summary.total_banks),
        ui::money_cell(summary.total_savings),
        ui::money_cell(summary.total_debt),
    ]);
    println!("All amounts in {currency}.\n{cards_table}");

    render_spending(&data.transactions);
    render_savings_progress(&data.savings);
    render_net_worth_trend(data);
    render_allocation(&data.assets);
}

fn render_spending(transactions: &[NormalizedTransaction]) {
    let spends = analytics::spending_by_category(transactions);
    println!("\n{}", ui::style_text("Spending by Category", ui::StyleType::TotalLabel));
    if spends.is_empty() {
        println!("{}", ui::style_text("No expenses in range.", ui::StyleType::Subtle));
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Category"), ui::header_cell("Spent")]);
    for spend in spends {
        table.add_row(vec![Cell::new(&spend.name), ui::money_cell(spend.total)]);
    }
    println!("{table}");
}

fn render_savings_progress(savings: &[Saving]) {
    let progress = analytics::savings_progress(savings);
    println!("\n{}", ui::style_text("Savings Progress", ui::StyleType::TotalLabel));
    if progress.is_empty() {
        println!("{}", ui::style_text("No savings accounts.", ui::StyleType::Subtle));
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Account"),
        ui::header_cell("Balance"),
        ui::header_cell("Goal"),
        ui::header_cell("Progress"),
    ]);
    for entry in progress {
        table.add_row(vec![
            Cell::new(&entry.name),
            ui::money_cell(entry.value),
            ui::money_cell(entry.goal),
            Cell::new(ui::progress_text(entry.value, entry.goal)),
        ]);
    }
    println!("{table}");
}

fn render_net_worth_trend(data: &DashboardData) {
    let history = analytics::net_worth_history(
        &data.transactions,
        &data.assets,
        &data.banks,
        &data.savings,
        &data.cards,
        data.range,
        Utc::now().date_naive(),
    );
    println!("\n{}", ui::style_text("Net Worth Trend", ui::StyleType::TotalLabel));
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Net Worth")]);
    for point in &history {
        table.add_row(vec![Cell::new(&point.date), ui::money_cell(point.net_worth)]);
    }
    println!("{table}");
}

fn render_allocation(assets: &[Asset]) {
    let allocation = analytics::asset_allocation(assets);
    println!("\n{}", ui::style_text("Asset Allocation", ui::StyleType::TotalLabel));
    if allocation.is_empty() {
        println!("{}", ui::style_text("No assets.", ui::StyleType::Subtle));
        return;
    }
    let total: f64 = allocation.iter().map(|a| a.value).sum();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Value"),
        ui::header_cell("Share"),
    ]);
    for entry in allocation {
        let share = if total > 0.0 {
            format!("{:.0}%", entry.value / total * 100.0)
        } else {
            "N/A".to_string()
        };
        table.add_row(vec![
            Cell::new(&entry.name),
            ui::money_cell(entry.value),
            Cell::new(share),
        ]);
    }
    println!("{table}");
}

pub async fn run(config: &AppConfig, range: TimeRange, watch: bool) -> Result<()> {
    let stored_token = token::load(&config.token_path()?)?;
    let client = Arc::new(ApiClient::new(&config.base_url, stored_token)?);

    let data = load(&client, range, config.concurrency, false).await?;
    render(&data, &config.currency);

    if watch {
        watch_loop(client, config, range).await?;
    }
    Ok(())
}

/// Interactive refresh loop. Range keys (7d/30d/...) and `r` both apply
/// the filter: each input schedules a debounced re-fetch, so mashing keys
/// costs one backend round-trip per entity group, not one per keypress.
/// A fetch that loses the race to a newer one discards its results.
async fn watch_loop(client: Arc<ApiClient>, config: &AppConfig, initial: TimeRange) -> Result<()> {
    let debouncer = Arc::new(Debouncer::new(Duration::from_millis(config.debounce_ms)));
    let generation = Arc::new(FetchGeneration::new());
    let mut range = initial;

    println!(
        "\n{}",
        ui::style_text(
            "watch mode: enter 7d/30d/90d/6m/1y to change range, r to refresh, q to quit",
            ui::StyleType::Subtle
        )
    );

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "r" | "refresh" => schedule_refresh(&debouncer, &generation, &client, config, range).await,
            input => match input.parse::<TimeRange>() {
                Ok(new_range) => {
                    range = new_range;
                    schedule_refresh(&debouncer, &generation, &client, config, range).await;
                }
                Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
            },
        }
    }
    debouncer.flush().await;
    Ok(())
}

async fn schedule_refresh(
    debouncer: &Debouncer,
    generation: &Arc<FetchGeneration>,
    client: &Arc<ApiClient>,
    config: &AppConfig,
    range: TimeRange,
) {
    let generation = Arc::clone(generation);
    let client = Arc::clone(client);
    let currency = config.currency.clone();
    let concurrency = config.concurrency;

    debouncer
        .trigger(move || async move {
            let claimed = generation.begin();
            match load(&client, range, concurrency, true).await {
                Ok(data) => {
                    if !generation.is_current(claimed) {
                        debug!("Discarding stale fetch generation {claimed}");
                        return;
                    }
                    ui::print_separator();
                    render(&data, &currency);
                }
                Err(e) => error!("Refresh failed: {e}"),
            }
        })
        .await;
}
