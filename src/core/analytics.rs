//! Derived dashboard views computed from normalized transactions and
//! current entity balances. All functions here are pure; they are
//! recomputed on every refresh and never persisted.

use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::core::model::{Asset, Bank, CreditCard, Saving, SourceKind};
use crate::core::transaction::NormalizedTransaction;

/// Selected dashboard window, counted back from "now" at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    SevenDays,
    ThirtyDays,
    NinetyDays,
    SixMonths,
    OneYear,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::SevenDays,
        TimeRange::ThirtyDays,
        TimeRange::NinetyDays,
        TimeRange::SixMonths,
        TimeRange::OneYear,
    ];

    pub fn start(&self, now: NaiveDate) -> NaiveDate {
        match self {
            TimeRange::SevenDays => now - Duration::days(7),
            TimeRange::ThirtyDays => now - Duration::days(30),
            TimeRange::NinetyDays => now - Duration::days(90),
            TimeRange::SixMonths => now.checked_sub_months(Months::new(6)).unwrap_or(now),
            TimeRange::OneYear => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }

    /// Ranges up to 90 days bucket per day, longer ranges per month.
    pub fn is_daily(&self) -> bool {
        matches!(
            self,
            TimeRange::SevenDays | TimeRange::ThirtyDays | TimeRange::NinetyDays
        )
    }

    /// Bucket label for a date within this range.
    pub fn label(&self, date: NaiveDate) -> String {
        if self.is_daily() {
            date.format("%d %b").to_string()
        } else {
            date.format("%b %y").to_string()
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TimeRange::SevenDays => "Last 7 Days",
            TimeRange::ThirtyDays => "Last 30 Days",
            TimeRange::NinetyDays => "Last 90 Days",
            TimeRange::SixMonths => "Last 6 Months",
            TimeRange::OneYear => "Last Year",
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            TimeRange::SevenDays => "7d",
            TimeRange::ThirtyDays => "30d",
            TimeRange::NinetyDays => "90d",
            TimeRange::SixMonths => "6m",
            TimeRange::OneYear => "1y",
        };
        write!(f, "{key}")
    }
}

impl FromStr for TimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(TimeRange::SevenDays),
            "30d" => Ok(TimeRange::ThirtyDays),
            "90d" => Ok(TimeRange::NinetyDays),
            "6m" => Ok(TimeRange::SixMonths),
            "1y" => Ok(TimeRange::OneYear),
            other => Err(anyhow::anyhow!(
                "Invalid time range: {other} (expected 7d, 30d, 90d, 6m or 1y)"
            )),
        }
    }
}

const TOP_CATEGORIES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySpend {
    pub name: String,
    pub total: f64,
}

/// Sums expenses per category and returns the top entries, descending.
///
/// Outflows are negative everywhere except the credit feed, where charges
/// arrive positive. A card refund also arrives positive and therefore
/// counts as spend here; that approximation is carried over from the
/// original ledgers rather than guessed away.
pub fn spending_by_category(transactions: &[NormalizedTransaction]) -> Vec<CategorySpend> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for tx in transactions {
        let expense = if tx.amount < 0.0 || tx.source == SourceKind::Credit {
            tx.amount.abs()
        } else {
            0.0
        };
        if expense <= 0.0 {
            continue;
        }
        if !totals.contains_key(&tx.category) {
            order.push(tx.category.clone());
        }
        *totals.entry(tx.category.clone()).or_insert(0.0) += expense;
    }

    let mut spends: Vec<CategorySpend> = order
        .into_iter()
        .map(|name| {
            let total = totals[&name];
            CategorySpend { name, total }
        })
        .collect();
    // Stable sort keeps insertion order for equal totals.
    spends.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    spends.truncate(TOP_CATEGORIES);
    spends
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsProgress {
    pub name: String,
    pub value: f64,
    pub goal: f64,
}

/// Maps each savings account to its balance and goal. Accounts without an
/// explicit goal get 1.5x the current balance as a placeholder target.
pub fn savings_progress(savings: &[Saving]) -> Vec<SavingsProgress> {
    savings
        .iter()
        .map(|s| SavingsProgress {
            name: s.name.clone(),
            value: s.balance,
            goal: s.goal.unwrap_or_else(|| (s.balance * 1.5).max(1.0)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthPoint {
    pub date: String,
    pub net_worth: f64,
}

/// Headline totals for the dashboard summary cards.
#[derive(Debug, Clone, PartialEq)]
pub struct NetWorthSummary {
    pub total_assets: f64,
    pub total_banks: f64,
    pub total_savings: f64,
    pub total_debt: f64,
    pub net_worth: f64,
}

pub fn summarize(
    assets: &[Asset],
    banks: &[Bank],
    savings: &[Saving],
    cards: &[CreditCard],
) -> NetWorthSummary {
    let total_assets: f64 = assets.iter().map(|a| a.balance).sum();
    let total_banks: f64 = banks.iter().map(|b| b.balance).sum();
    let total_savings: f64 = savings.iter().map(|s| s.balance).sum();
    let total_debt: f64 = cards.iter().map(|c| c.used).sum();
    NetWorthSummary {
        total_assets,
        total_banks,
        total_savings,
        total_debt,
        net_worth: total_assets + total_banks + total_savings - total_debt,
    }
}

/// Builds the cumulative net worth timeline for a range.
///
/// The running sum is seeded with net worth at CURRENT balances, then each
/// bucket's transaction delta is applied walking buckets in chronological
/// order, so ordering holds by construction. Transactions without a valid
/// date, or dated before the range start, are skipped. When nothing in the
/// range moved, the timeline collapses to a single point at the starting
/// net worth.
pub fn net_worth_history(
    transactions: &[NormalizedTransaction],
    assets: &[Asset],
    banks: &[Bank],
    savings: &[Saving],
    cards: &[CreditCard],
    range: TimeRange,
    now: NaiveDate,
) -> Vec<NetWorthPoint> {
    let start = range.start(now);
    let seed = summarize(assets, banks, savings, cards).net_worth;

    let mut buckets: HashMap<String, f64> = HashMap::new();
    for tx in transactions {
        let Some(date) = tx.date else { continue };
        if date < start {
            continue;
        }
        *buckets.entry(range.label(date)).or_insert(0.0) += tx.amount;
    }

    if buckets.is_empty() {
        return vec![NetWorthPoint {
            date: range.label(start),
            net_worth: seed.round(),
        }];
    }

    let mut history = Vec::new();
    let mut running = seed;
    if range.is_daily() {
        let mut day = start;
        while day <= now {
            let key = range.label(day);
            running += buckets.get(&key).copied().unwrap_or(0.0);
            history.push(NetWorthPoint {
                date: key,
                net_worth: running.round(),
            });
            day += Duration::days(1);
        }
    } else {
        let mut month = start.with_day0(0).unwrap_or(start);
        let end = now.with_day0(0).unwrap_or(now);
        while month <= end {
            let key = range.label(month);
            running += buckets.get(&key).copied().unwrap_or(0.0);
            history.push(NetWorthPoint {
                date: key,
                net_worth: running.round(),
            });
            month = match month.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
    }

    history
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub name: String,
    pub value: f64,
}

/// Current asset balances for proportional display. Pass-through; no math.
pub fn asset_allocation(assets: &[Asset]) -> Vec<Allocation> {
    assets
        .iter()
        .map(|a| Allocation {
            name: a.name.clone(),
            value: a.balance,
        })
        .collect()
}
