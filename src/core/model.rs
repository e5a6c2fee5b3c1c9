//! Entity records as served by the backend. Balances are authoritative on
//! the server; the client only displays them and requests mutations via
//! transactions.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which entity type a transaction was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Asset,
    Bank,
    Saving,
    Credit,
}

impl SourceKind {
    /// Collection segment of the REST path for this entity type.
    pub fn collection(&self) -> &'static str {
        match self {
            SourceKind::Asset => "assets",
            SourceKind::Bank => "banks",
            SourceKind::Saving => "savings",
            SourceKind::Credit => "credit_cards",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Asset => "asset",
            SourceKind::Bank => "bank",
            SourceKind::Saving => "saving",
            SourceKind::Credit => "credit",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub balance: f64,
    pub bank_id: Option<u64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saving {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub balance: f64,
    pub bank_id: Option<u64>,
    pub goal: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub limit: f64,
    #[serde(default)]
    pub used: f64,
    pub available_limit: Option<f64>,
    pub billed_unpaid: Option<f64>,
    pub unbilled_spends: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub age: Option<i64>,
    pub dob: Option<String>,
    pub place: Option<String>,
}
