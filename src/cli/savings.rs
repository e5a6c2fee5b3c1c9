use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use comfy_table::Cell;
use serde_json::json;

use super::ui;
use crate::api::ApiClient;
use crate::core::fetch::TransactionFeed;
use crate::core::model::{Saving, SourceKind};

#[derive(Debug, Subcommand)]
pub enum SavingCommand {
    /// List all savings accounts
    List,
    /// Create a savings account linked to a bank
    Add {
        name: String,
        /// Bank the deposits are drawn from
        #[arg(long)]
        bank_id: u64,
        /// Target amount; progress is tracked against it
        #[arg(long)]
        goal: Option<f64>,
    },
    /// Rename a savings account or change its goal
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        goal: Option<f64>,
    },
    /// Delete a savings account; its balance must already be zero
    Delete { id: u64 },
    /// Show the transaction ledger for a savings account
    Ledger { id: u64 },
    /// Record a deposit or withdrawal
    Record {
        id: u64,
        /// Positive amount; direction comes from --kind
        amount: String,
        #[arg(long, value_enum, default_value = "deposit")]
        kind: SavingTxKind,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SavingTxKind {
    Deposit,
    Withdrawal,
}

impl SavingTxKind {
    fn as_str(&self) -> &'static str {
        match self {
            SavingTxKind::Deposit => "deposit",
            SavingTxKind::Withdrawal => "withdrawal",
        }
    }
}

pub async fn run(client: &ApiClient, command: SavingCommand, currency: &str) -> Result<()> {
    match command {
        SavingCommand::List => {
            let savings = client.list_savings().await?;
            print_savings(&savings, currency);
        }
        SavingCommand::Add { name, bank_id, goal } => {
            let banks = client.banks_dropdown().await?;
            if !banks.iter().any(|b| b.id == bank_id) {
                bail!("No bank with id {bank_id}");
            }
            let mut fields = json!({"name": name, "bank_id": bank_id, "balance": 0});
            if let Some(goal) = goal {
                fields["goal"] = json!(goal);
            }
            client.create_saving(fields).await?;
            println!("Savings account created.");
        }
        SavingCommand::Update { id, name, goal } => {
            let mut fields = json!({});
            if let Some(name) = name {
                fields["name"] = json!(name);
            }
            if let Some(goal) = goal {
                fields["goal"] = json!(goal);
            }
            client.update_saving(id, fields).await?;
            println!("Savings account updated.");
        }
        SavingCommand::Delete { id } => {
            let savings = client.list_savings().await?;
            let Some(saving) = savings.iter().find(|s| s.id == id) else {
                bail!("No savings account with id {id}");
            };
            super::ensure_zero_balance("savings account", &saving.name, saving.balance)?;
            client.delete_saving(id).await?;
            println!("Deleted savings account {:?}.", saving.name);
        }
        SavingCommand::Ledger { id } => {
            let records = client
                .feed(SourceKind::Saving)
                .transactions(id, None)
                .await?;
            super::print_ledger(&records, SourceKind::Saving);
        }
        SavingCommand::Record {
            id,
            amount,
            kind,
            description,
        } => {
            let amount = super::parse_amount(&amount)?;
            let mut fields = json!({"amount": amount, "type": kind.as_str()});
            if let Some(description) = description {
                fields["description"] = json!(description);
            }
            client.add_saving_transaction(id, fields).await?;
            println!("Transaction recorded.");
        }
    }
    Ok(())
}

fn print_savings(savings: &[Saving], currency: &str) {
    if savings.is_empty() {
        println!("No savings accounts.");
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("Balance ({currency})")),
        ui::header_cell("Goal"),
        ui::header_cell("Progress"),
    ]);
    for saving in savings {
        let goal_cell = ui::format_optional_cell(saving.goal, |g| format!("{g:.2}"));
        let progress = saving
            .goal
            .map_or("N/A".to_string(), |g| ui::progress_text(saving.balance, g));
        table.add_row(vec![
            Cell::new(saving.id),
            Cell::new(&saving.name),
            ui::money_cell(saving.balance),
            goal_cell,
            Cell::new(progress),
        ]);
    }
    println!("{table}");
}
