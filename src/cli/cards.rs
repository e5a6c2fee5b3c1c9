use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use comfy_table::Cell;
use serde_json::json;

use super::ui;
use crate::api::ApiClient;
use crate::core::fetch::TransactionFeed;
use crate::core::model::{CreditCard, SourceKind};

#[derive(Debug, Subcommand)]
pub enum CardCommand {
    /// List all credit cards
    List,
    /// Show one card in detail
    Show { id: u64 },
    /// Create a credit card
    Add {
        name: String,
        #[arg(long)]
        limit: f64,
    },
    /// Rename a card or change its limit
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        limit: Option<f64>,
    },
    /// Delete a card; it must carry no outstanding spend
    Delete { id: u64 },
    /// Show the transaction ledger for a card
    Ledger { id: u64 },
    /// Record a spend on a card
    Record {
        id: u64,
        /// Positive amount
        amount: String,
        /// Transaction date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Move unbilled spends into the billed bucket
    Bill { id: u64 },
}

pub async fn run(client: &ApiClient, command: CardCommand, currency: &str) -> Result<()> {
    match command {
        CardCommand::List => {
            let cards = client.list_credit_cards().await?;
            print_cards(&cards, currency);
        }
        CardCommand::Show { id } => {
            let card = client.get_credit_card(id).await?;
            print_card_detail(&card, currency);
        }
        CardCommand::Add { name, limit } => {
            client
                .create_credit_card(json!({"name": name, "limit": limit}))
                .await?;
            println!("Credit card created.");
        }
        CardCommand::Update { id, name, limit } => {
            let mut fields = json!({});
            if let Some(name) = name {
                fields["name"] = json!(name);
            }
            if let Some(limit) = limit {
                fields["limit"] = json!(limit);
            }
            client.update_credit_card(id, fields).await?;
            println!("Credit card updated.");
        }
        CardCommand::Delete { id } => {
            let card = client.get_credit_card(id).await?;
            super::ensure_zero_balance("credit card", &card.name, card.used)?;
            client.delete_credit_card(id).await?;
            println!("Deleted credit card {:?}.", card.name);
        }
        CardCommand::Ledger { id } => {
            let records = client
                .feed(SourceKind::Credit)
                .transactions(id, None)
                .await?;
            super::print_ledger(&records, SourceKind::Credit);
        }
        CardCommand::Record {
            id,
            amount,
            date,
            category,
            description,
        } => {
            let amount = super::parse_amount(&amount)?;
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
                .with_context(|| format!("Date must be YYYY-MM-DD, got {date:?}"))?;
            let mut fields = json!({});
            if let Some(category) = category {
                fields["category"] = json!(category);
            }
            if let Some(description) = description {
                fields["description"] = json!(description);
            }
            client.add_card_transaction(id, amount, date, fields).await?;
            println!("Transaction recorded.");
        }
        CardCommand::Bill { id } => {
            client.process_billing(id).await?;
            let card = client.get_credit_card(id).await?;
            println!(
                "Billing processed. Billed unpaid is now {:.2} {currency}.",
                card.billed_unpaid.unwrap_or(0.0)
            );
        }
    }
    Ok(())
}

fn print_cards(cards: &[CreditCard], currency: &str) {
    if cards.is_empty() {
        println!("No credit cards.");
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("Limit ({currency})")),
        ui::header_cell("Used"),
        ui::header_cell("Available"),
    ]);
    for card in cards {
        table.add_row(vec![
            Cell::new(card.id),
            Cell::new(&card.name),
            ui::money_cell(card.limit),
            ui::money_cell(card.used),
            ui::format_optional_cell(card.available_limit, |v| format!("{v:.2}")),
        ]);
    }
    println!("{table}");
}

fn print_card_detail(card: &CreditCard, currency: &str) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("Name"), Cell::new(&card.name)]);
    table.add_row(vec![Cell::new("Limit"), ui::money_cell(card.limit)]);
    table.add_row(vec![Cell::new("Used"), ui::money_cell(card.used)]);
    table.add_row(vec![
        Cell::new("Available"),
        ui::format_optional_cell(card.available_limit, |v| format!("{v:.2}")),
    ]);
    table.add_row(vec![
        Cell::new("Billed unpaid"),
        ui::format_optional_cell(card.billed_unpaid, |v| format!("{v:.2}")),
    ]);
    table.add_row(vec![
        Cell::new("Unbilled spends"),
        ui::format_optional_cell(card.unbilled_spends, |v| format!("{v:.2}")),
    ]);
    println!("All amounts in {currency}.\n{table}");
}
