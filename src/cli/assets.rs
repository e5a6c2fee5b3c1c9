use anyhow::{Result, bail};
use clap::{Subcommand, ValueEnum};
use comfy_table::Cell;
use serde_json::json;

use super::ui;
use crate::api::ApiClient;
use crate::core::fetch::TransactionFeed;
use crate::core::model::{Asset, SourceKind};

#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    /// List all assets
    List,
    /// Create an asset; its balance starts at zero
    Add {
        name: String,
        /// Bank funding purchases of this asset
        #[arg(long)]
        bank_id: Option<u64>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Rename or recategorize an asset
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an asset; its balance must already be zero
    Delete { id: u64 },
    /// Show the transaction ledger for an asset
    Ledger { id: u64 },
    /// Record a transaction against an asset
    Record {
        id: u64,
        /// Positive amount; direction comes from --kind
        amount: String,
        #[arg(long, value_enum, default_value = "buy")]
        kind: AssetTxKind,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AssetTxKind {
    Buy,
    Sell,
}

impl AssetTxKind {
    fn as_str(&self) -> &'static str {
        match self {
            AssetTxKind::Buy => "buy",
            AssetTxKind::Sell => "sell",
        }
    }
}

pub async fn run(client: &ApiClient, command: AssetCommand, currency: &str) -> Result<()> {
    match command {
        AssetCommand::List => {
            let assets = client.list_assets().await?;
            print_assets(&assets, currency);
        }
        AssetCommand::Add {
            name,
            bank_id,
            category,
        } => {
            let mut fields = json!({"name": name, "balance": 0});
            if let Some(bank_id) = bank_id {
                fields["bank_id"] = json!(bank_id);
            }
            if let Some(category) = category {
                fields["category"] = json!(category);
            }
            client.create_asset(fields).await?;
            println!("Asset created.");
        }
        AssetCommand::Update { id, name, category } => {
            let mut fields = json!({});
            if let Some(name) = name {
                fields["name"] = json!(name);
            }
            if let Some(category) = category {
                fields["category"] = json!(category);
            }
            client.update_asset(id, fields).await?;
            println!("Asset updated.");
        }
        AssetCommand::Delete { id } => {
            let assets = client.list_assets().await?;
            let Some(asset) = assets.iter().find(|a| a.id == id) else {
                bail!("No asset with id {id}");
            };
            super::ensure_zero_balance("asset", &asset.name, asset.balance)?;
            client.delete_asset(id).await?;
            println!("Deleted asset {:?}.", asset.name);
        }
        AssetCommand::Ledger { id } => {
            let records = client.feed(SourceKind::Asset).transactions(id, None).await?;
            super::print_ledger(&records, SourceKind::Asset);
        }
        AssetCommand::Record {
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
            client.add_asset_transaction(id, fields).await?;
            println!("Transaction recorded.");
        }
    }
    Ok(())
}

fn print_assets(assets: &[Asset], currency: &str) {
    if assets.is_empty() {
        println!("No assets.");
        return;
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Category"),
        ui::header_cell(&format!("Balance ({currency})")),
    ]);
    for asset in assets {
        table.add_row(vec![
            Cell::new(asset.id),
            Cell::new(&asset.name),
            Cell::new(asset.category.as_deref().unwrap_or("-")),
            ui::money_cell(asset.balance),
        ]);
    }
    println!("{table}");
}
