//! Command implementations. Each module owns one page of the original
//! tracker: a clap subcommand enum plus a `run` function.

pub mod assets;
pub mod auth;
pub mod banks;
pub mod cards;
pub mod dashboard;
pub mod savings;
pub mod setup;
pub mod ui;
pub mod users;

use anyhow::{Context, Result, bail};
use comfy_table::Cell;
use serde_json::Value;

use crate::core::fetch;
use crate::core::model::SourceKind;
use crate::core::transaction::{self, NormalizedTransaction};

/// Parses a user-supplied amount. Zero, negative and non-numeric input
/// never reaches the backend.
pub(crate) fn parse_amount(input: &str) -> Result<f64> {
    let amount: f64 = input
        .trim()
        .parse()
        .with_context(|| format!("Amount must be a number, got {input:?}"))?;
    if !amount.is_finite() {
        bail!("Amount must be a finite number");
    }
    if amount <= 0.0 {
        bail!("Amount must be greater than zero");
    }
    Ok(amount)
}

/// Refuses deletion of an account that still holds money. The check runs
/// before any request so a rejected delete never reaches the backend.
pub(crate) fn ensure_zero_balance(kind: &str, name: &str, balance: f64) -> Result<()> {
    if balance.abs() > f64::EPSILON {
        bail!(
            "Cannot delete {kind} {name:?}: balance is {balance:.2}. \
             Move the funds out through transactions first."
        );
    }
    Ok(())
}

/// Renders a raw transaction list as a ledger table, oldest first.
pub(crate) fn print_ledger(records: &[Value], source: SourceKind) {
    if records.is_empty() {
        println!("No transactions.");
        return;
    }
    let mut txns: Vec<NormalizedTransaction> = records
        .iter()
        .map(|record| transaction::normalize(record, source))
        .collect();
    fetch::sort_chronological(&mut txns);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Amount"),
        ui::header_cell("Category"),
        ui::header_cell("Description"),
    ]);
    for tx in &txns {
        let date = tx
            .date
            .map_or("N/A".to_string(), |d| d.format("%d %b %Y").to_string());
        let description = tx
            .raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        table.add_row(vec![
            Cell::new(date),
            ui::signed_money_cell(tx.amount),
            Cell::new(&tx.category),
            Cell::new(description),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_positive_numbers() {
        assert_eq!(parse_amount("500.00").unwrap(), 500.0);
        assert_eq!(parse_amount(" 12.5 ").unwrap(), 12.5);
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("inf").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn test_zero_balance_guard() {
        assert!(ensure_zero_balance("asset", "Gold", 0.0).is_ok());
        let err = ensure_zero_balance("asset", "Gold", 150.0).unwrap_err();
        assert!(err.to_string().contains("150.00"));
    }
}
