//! Bounded-parallelism transaction fetching.
//!
//! An account list can be large; fetching serially is slow and fetching
//! everything at once floods the backend. A fixed pool of workers pulls
//! the next unclaimed index from a shared counter instead.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::warn;

use crate::core::model::SourceKind;
use crate::core::transaction::{self, NormalizedTransaction};

/// Source of raw transaction records for a single entity.
///
/// The `since` cutoff is a hint; the backend may ignore it, so callers
/// must still filter by date themselves.
#[async_trait]
pub trait TransactionFeed: Send + Sync {
    async fn transactions(&self, entity_id: u64, since: Option<NaiveDate>) -> Result<Vec<Value>>;
}

/// Runs `f(0..len)` with at most `concurrency` calls in flight. Results
/// land at their input index regardless of completion order.
pub async fn map_bounded<R, F, Fut>(len: usize, concurrency: usize, f: F) -> Vec<Result<R>>
where
    F: Fn(usize) -> Fut + Sync,
    Fut: Future<Output = Result<R>>,
{
    if len == 0 {
        return Vec::new();
    }
    let slots: Mutex<Vec<Option<Result<R>>>> = Mutex::new((0..len).map(|_| None).collect());
    let next = AtomicUsize::new(0);
    let workers = concurrency.clamp(1, len);

    {
        let slots = &slots;
        let next = &next;
        let f = &f;
        join_all((0..workers).map(|_| async move {
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= len {
                    break;
                }
                let result = f(index).await;
                slots.lock().await[index] = Some(result);
            }
        }))
        .await;
    }

    slots
        .into_inner()
        .into_iter()
        .map(|slot| slot.expect("every index is claimed by exactly one worker"))
        .collect()
}

/// Fetches and normalizes transactions for one entity group.
///
/// Per-entity failures degrade to an empty list so that one bad account
/// never sinks the whole batch. Output preserves entity order; `progress`
/// is invoked once per completed entity.
pub async fn fetch_group(
    feed: &dyn TransactionFeed,
    entity_ids: &[u64],
    source: SourceKind,
    concurrency: usize,
    since: Option<NaiveDate>,
    progress: &(dyn Fn() + Sync),
) -> Vec<NormalizedTransaction> {
    let per_entity = map_bounded(entity_ids.len(), concurrency, |index| {
        let entity_id = entity_ids[index];
        async move {
            let result = feed.transactions(entity_id, since).await;
            progress();
            result
        }
    })
    .await;

    let mut all = Vec::new();
    for (entity_id, result) in entity_ids.iter().zip(per_entity) {
        match result {
            Ok(records) => {
                all.extend(records.iter().map(|raw| transaction::normalize(raw, source)));
            }
            Err(e) => warn!("Failed to fetch {source} transactions for id={entity_id}: {e}"),
        }
    }
    all
}

/// Sorts by date ascending. Transactions without a parseable date sort
/// first so they never interleave with the dated timeline.
pub fn sort_chronological(transactions: &mut [NormalizedTransaction]) {
    transactions.sort_by_key(|tx| tx.date);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct MockFeed {
        /// Per-entity canned responses keyed by id.
        responses: std::collections::HashMap<u64, Result<Vec<Value>, String>>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl MockFeed {
        fn new() -> Self {
            MockFeed {
                responses: std::collections::HashMap::new(),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn add(&mut self, id: u64, records: Vec<Value>) {
            self.responses.insert(id, Ok(records));
        }

        fn add_error(&mut self, id: u64, message: &str) {
            self.responses.insert(id, Err(message.to_string()));
        }
    }

    #[async_trait]
    impl TransactionFeed for MockFeed {
        async fn transactions(
            &self,
            entity_id: u64,
            _since: Option<NaiveDate>,
        ) -> Result<Vec<Value>> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            // Earlier ids finish later to exercise out-of-order completion.
            let delay = 40u64.saturating_sub(entity_id * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.responses.get(&entity_id) {
                Some(Ok(records)) => Ok(records.clone()),
                Some(Err(message)) => Err(anyhow!(message.clone())),
                None => Ok(Vec::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrency_limit_respected() {
        let mut feed = MockFeed::new();
        for id in 1..=8 {
            feed.add(id, vec![json!({"id": id, "amount": 1.0})]);
        }
        let max = Arc::clone(&feed.max_in_flight);

        let ids: Vec<u64> = (1..=8).collect();
        let txns = fetch_group(&feed, &ids, SourceKind::Bank, 3, None, &|| ()).await;

        assert_eq!(txns.len(), 8);
        assert!(
            max.load(Ordering::SeqCst) <= 3,
            "observed {} in flight",
            max.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_output_order_matches_input_despite_completion_order() {
        let mut feed = MockFeed::new();
        // id=1 is the slowest, id=4 the fastest.
        for id in 1..=4 {
            feed.add(id, vec![json!({"id": id, "amount": id as f64})]);
        }

        let ids = vec![1, 2, 3, 4];
        let txns = fetch_group(&feed, &ids, SourceKind::Asset, 4, None, &|| ()).await;

        let got: Vec<i64> = txns.iter().filter_map(|tx| tx.id).collect();
        assert_eq!(got, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_single_entity_failure_is_isolated() {
        let mut feed = MockFeed::new();
        feed.add(1, vec![json!({"id": 10, "amount": 5.0})]);
        feed.add_error(2, "boom");
        feed.add(3, vec![json!({"id": 30, "amount": 7.0})]);

        let txns = fetch_group(&feed, &[1, 2, 3], SourceKind::Saving, 2, None, &|| ()).await;

        let got: Vec<i64> = txns.iter().filter_map(|tx| tx.id).collect();
        assert_eq!(got, vec![10, 30]);
    }

    #[tokio::test]
    async fn test_progress_called_once_per_entity() {
        let mut feed = MockFeed::new();
        for id in 1..=5 {
            feed.add(id, Vec::new());
        }
        let calls = AtomicUsize::new(0);

        let ids: Vec<u64> = (1..=5).collect();
        fetch_group(&feed, &ids, SourceKind::Credit, 2, None, &|| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_map_bounded_empty_input() {
        let results: Vec<Result<u32>> = map_bounded(0, 4, |_| async { Ok(1) }).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_sort_chronological_puts_undated_first() {
        let mk = |id: i64, date: Option<NaiveDate>| NormalizedTransaction {
            id: Some(id),
            date,
            amount: 0.0,
            category: "Uncategorized".to_string(),
            source: SourceKind::Bank,
            raw: Value::Null,
        };
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        let mut txns = vec![
            mk(1, d(2024, 5, 1)),
            mk(2, None),
            mk(3, d(2024, 1, 1)),
        ];
        sort_chronological(&mut txns);
        let got: Vec<i64> = txns.iter().filter_map(|tx| tx.id).collect();
        assert_eq!(got, vec![2, 3, 1]);
    }
}
