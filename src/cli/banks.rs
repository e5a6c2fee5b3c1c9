use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use comfy_table::Cell;
use serde_json::json;

use super::ui;
use crate::api::ApiClient;
use crate::core::fetch::TransactionFeed;
use crate::core::model::{Bank, SourceKind};

#[derive(Debug, Subcommand)]
pub enum BankCommand {
    /// List all bank accounts
    List,
    /// Create a bank account; its balance starts at zero
    Add { name: String },
    /// Rename a bank account
    Update { id: u64, name: String },
    /// Delete a bank account; its balance must already be zero
    Delete { id: u64 },
    /// Show the current balance of one bank
    Balance { id: u64 },
    /// Show the transaction ledger for a bank
    Ledger { id: u64 },
    /// Record an income or expense transaction
    Record {
        id: u64,
        /// Positive amount; direction comes from --kind
        amount: String,
        #[arg(long, value_enum)]
        kind: BankTxKind,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BankTxKind {
    Income,
    Expense,
}

impl BankTxKind {
    fn as_str(&self) -> &'static str {
        match self {
            BankTxKind::Income => "income",
            BankTxKind::Expense => "expense",
        }
    }
}

pub async fn run(client: &ApiClient, command: BankCommand, currency: &str) -> Result<()> {
    match command {
        BankCommand::List => {
            let banks = client.list_banks().await?;
            print_banks(&banks, currency);
        }
        BankCommand::Add { name } => {
            client.create_bank(&name).await?;
            println!("Bank created.");
        }
        BankCommand::Update { id, name } => {
            client.update_bank(id, &name).await?;
            println!("Bank updated.");
        }
        BankCommand::Delete { id } => {
            let banks = client.list_banks().await?;
            let Some(bank) = banks.iter().find(|b| b.id == id) else {
                bail!("No bank with id {id}");
            };
            super::ensure_zero_balance("bank", &bank.name, bank.balance)?;
            client.delete_bank(id).await?;
            println!("Deleted bank {:?}.", bank.name);
        }
        BankCommand::Balance { id } => {
            let balance = client.bank_balance(id).await?;
            println!(
                "{} {}",
                ui::style_text("Balance:", ui::StyleType::TotalLabel),
                ui::style_text(
                    &format!("{:.2} {currency}", balance.balance),
                    ui::StyleType::TotalValue
                )
            );
        }
        BankCommand::Ledger { id } => {
            let records = client.feed(SourceKind::Bank).transactions(id, None).await?;
            super::print_ledger(&records, SourceKind::Bank);
        }
        BankCommand::Record {
            id,
            amount,
            kind,
            category,
            description,
        } => {
            let amount = super::parse_amount(&amount)?;
            let mut fields = json!({"amount": amount, "type": kind.as_str()});
            if let Some(category) = category {
                fields["category"] = json!(category);
            }
            if let Some(description) = description {
                fields["description"] = json!(description);
            }
            client.add_bank_transaction(id, fields).await?;
            println!("Transaction recorded.");
        }
    }
    Ok(())
}

fn print_banks(banks: &[Bank], currency: &str) {
    if banks.is_empty() {
        println!("No bank accounts.");
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("Balance ({currency})")),
    ]);
    for bank in banks {
        table.add_row(vec![
            Cell::new(bank.id),
            Cell::new(&bank.name),
            ui::money_cell(bank.balance),
        ]);
    }
    println!("{table}");
}
