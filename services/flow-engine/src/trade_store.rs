//! Bounded, time-ordered trade store
//!
//! The id → record map is the arena; `index` is a separate vector of
//! (execution time, id) keys kept sorted newest-first by binary-search
//! insertion and removal, so snapshots never re-sort. When the index grows
//! past capacity the oldest entries are evicted from both structures.
//!
//! Equal execution times are ordered by ascending trade id, which keeps the
//! order independent of arrival order.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use swap_types::ids::TradeId;
use swap_types::trade::Trade;
use tracing::{debug, warn};

use crate::fingerprint::{Fingerprint, Fingerprinted};

#[derive(Debug, Clone)]
struct StoredTrade {
    trade: Trade,
    fingerprint: Fingerprint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexKey {
    executed_at: DateTime<Utc>,
    id: TradeId,
}

impl IndexKey {
    fn of(trade: &Trade) -> Self {
        Self {
            executed_at: trade.execution_timestamp,
            id: trade.dissemination_identifier.clone(),
        }
    }
}

/// Newest first, then ascending id.
fn index_order(a: &IndexKey, b: &IndexKey) -> Ordering {
    b.executed_at
        .cmp(&a.executed_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Inserted,
    Updated,
    Unchanged,
}

/// Authoritative set of recent trades.
#[derive(Debug)]
pub struct TradeStore {
    records: HashMap<TradeId, StoredTrade>,
    /// Sorted newest-first; one key per record.
    index: Vec<IndexKey>,
    capacity: usize,
    evicted_total: u64,
}

impl TradeStore {
    /// Create an empty store holding at most `capacity` trades.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity + 1),
            index: Vec::with_capacity(capacity + 1),
            capacity,
            evicted_total: 0,
        }
    }

    /// Insert or update one trade.
    ///
    /// Returns `true` when the visible contents of the store changed.
    pub fn upsert(&mut self, trade: Trade) -> bool {
        let id = trade.dissemination_identifier.clone();
        let merge = self.merge(trade);
        let evicted = self.evict_overflow();

        match merge {
            Merge::Updated => true,
            Merge::Unchanged => !evicted.is_empty(),
            // A trade older than everything in a full store is evicted at once
            Merge::Inserted => !(evicted.len() == 1 && evicted[0] == id),
        }
    }

    /// Insert or update many trades with a single eviction pass at the end.
    ///
    /// Returns `true` when the visible contents of the store changed.
    pub fn upsert_batch<I>(&mut self, trades: I) -> bool
    where
        I: IntoIterator<Item = Trade>,
    {
        let mut inserted: HashSet<TradeId> = HashSet::new();
        let mut updated: HashSet<TradeId> = HashSet::new();
        let mut unchanged = 0usize;

        for trade in trades {
            let id = trade.dissemination_identifier.clone();
            match self.merge(trade) {
                Merge::Inserted => {
                    inserted.insert(id);
                }
                Merge::Updated => {
                    updated.insert(id);
                }
                Merge::Unchanged => unchanged += 1,
            }
        }

        let evicted: HashSet<TradeId> = self.evict_overflow().into_iter().collect();
        let evicted_new = evicted.iter().filter(|id| inserted.contains(*id)).count();
        let evicted_existing = evicted.len() - evicted_new;
        let surviving_new = inserted.len() - evicted_new;
        // Updates to trades inserted in this pass are covered by `surviving_new`
        let surviving_updated = updated
            .iter()
            .filter(|id| !inserted.contains(*id) && !evicted.contains(*id))
            .count();

        debug!(
            inserted = inserted.len(),
            updated = updated.len(),
            unchanged,
            evicted = evicted.len(),
            "Trade batch merged"
        );

        surviving_updated > 0 || surviving_new > 0 || evicted_existing > 0
    }

    /// Trades ordered by descending execution time.
    pub fn snapshot(&self) -> Vec<Trade> {
        self.iter().cloned().collect()
    }

    /// Iterate trades newest-first without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &Trade> + '_ {
        self.index
            .iter()
            .filter_map(move |key| self.records.get(&key.id).map(|s| &s.trade))
    }

    /// Fingerprints in snapshot order.
    pub fn fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.index
            .iter()
            .filter_map(move |key| self.records.get(&key.id).map(|s| s.fingerprint))
    }

    pub fn get(&self, id: &TradeId) -> Option<&Trade> {
        self.records.get(id).map(|s| &s.trade)
    }

    pub fn contains(&self, id: &TradeId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total trades evicted since creation or the last `clear`.
    pub fn evicted_total(&self) -> u64 {
        self.evicted_total
    }

    /// Drop every trade.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
        self.evicted_total = 0;
    }

    fn merge(&mut self, mut trade: Trade) -> Merge {
        trade.sanitize();
        let fingerprint = trade.fingerprint();
        let id = trade.dissemination_identifier.clone();
        let new_key = IndexKey::of(&trade);

        let old_key = match self.records.get_mut(&id) {
            None => {
                self.insert_key(new_key);
                self.records.insert(id, StoredTrade { trade, fingerprint });
                return Merge::Inserted;
            }
            Some(stored) if stored.fingerprint == fingerprint => return Merge::Unchanged,
            Some(stored) => {
                let old_key = IndexKey::of(&stored.trade);
                stored.trade = trade;
                stored.fingerprint = fingerprint;
                old_key
            }
        };

        if old_key.executed_at != new_key.executed_at {
            self.remove_key(&old_key);
            self.insert_key(new_key);
        }
        Merge::Updated
    }

    fn insert_key(&mut self, key: IndexKey) {
        match self.index.binary_search_by(|probe| index_order(probe, &key)) {
            Ok(_) => {}
            Err(pos) => self.index.insert(pos, key),
        }
    }

    fn remove_key(&mut self, key: &IndexKey) {
        match self.index.binary_search_by(|probe| index_order(probe, key)) {
            Ok(pos) => {
                self.index.remove(pos);
            }
            Err(_) => {
                warn!(trade_id = %key.id, "Index key missing; removing by id");
                self.index.retain(|k| k.id != key.id);
            }
        }
    }

    fn evict_overflow(&mut self) -> Vec<TradeId> {
        if self.index.len() <= self.capacity {
            return Vec::new();
        }
        let evicted: Vec<TradeId> = self
            .index
            .drain(self.capacity..)
            .map(|key| key.id)
            .collect();
        for id in &evicted {
            self.records.remove(id);
        }
        self.evicted_total += evicted.len() as u64;
        debug!(
            evicted = evicted.len(),
            remaining = self.index.len(),
            "Evicted oldest trades"
        );
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use swap_types::trade::ActionType;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()
    }

    fn make_trade(id: &str, offset_secs: i64) -> Trade {
        Trade::new(
            TradeId::new(id),
            ActionType::New,
            base() + Duration::seconds(offset_secs),
        )
        .with_instrument("10Y")
        .with_notional_eur(50_000_000.0)
    }

    fn ids(store: &TradeStore) -> Vec<String> {
        store.iter().map(|t| t.id().as_str().to_string()).collect()
    }

    #[test]
    fn test_upsert_new_trade_reports_change() {
        let mut store = TradeStore::new(10);
        assert!(store.upsert(make_trade("A", 0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_unchanged_is_idempotent() {
        let mut store = TradeStore::new(10);
        assert!(store.upsert(make_trade("A", 0)));
        assert!(!store.upsert(make_trade("A", 0)));
    }

    #[test]
    fn test_modification_replaces_record() {
        let mut store = TradeStore::new(10);
        store.upsert(make_trade("A", 0));

        let mut modified = make_trade("A", 0).with_notional_eur(75_000_000.0);
        modified.action_type = ActionType::Modify;
        assert!(store.upsert(modified));

        let stored = store.get(&TradeId::new("A")).unwrap();
        assert_eq!(stored.notional_eur, Some(75_000_000.0));
        assert_eq!(stored.action_type, ActionType::Modify);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_newest_first() {
        let mut store = TradeStore::new(10);
        store.upsert(make_trade("A", 10));
        store.upsert(make_trade("B", 30));
        store.upsert(make_trade("C", 20));
        assert_eq!(ids(&store), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_equal_timestamps_order_by_id() {
        let mut forward = TradeStore::new(10);
        let mut backward = TradeStore::new(10);
        for id in ["A", "B", "C"] {
            forward.upsert(make_trade(id, 5));
        }
        for id in ["C", "B", "A"] {
            backward.upsert(make_trade(id, 5));
        }
        assert_eq!(ids(&forward), vec!["A", "B", "C"]);
        assert_eq!(ids(&forward), ids(&backward));
    }

    #[test]
    fn test_retimed_trade_is_reindexed() {
        let mut store = TradeStore::new(10);
        store.upsert(make_trade("A", 10));
        store.upsert(make_trade("B", 20));
        assert_eq!(ids(&store), vec!["B", "A"]);

        assert!(store.upsert(make_trade("A", 30)));
        assert_eq!(ids(&store), vec!["A", "B"]);
        assert_eq!(store.index.len(), 2);
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut store = TradeStore::new(3);
        for i in 0..5 {
            store.upsert(make_trade(&format!("T{i}"), i));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(ids(&store), vec!["T4", "T3", "T2"]);
        assert!(!store.contains(&TradeId::new("T0")));
        assert_eq!(store.evicted_total(), 2);
    }

    #[test]
    fn test_inserting_older_than_full_store_is_not_a_change() {
        let mut store = TradeStore::new(2);
        store.upsert(make_trade("A", 10));
        store.upsert(make_trade("B", 20));
        assert!(!store.upsert(make_trade("OLD", 0)));
        assert_eq!(ids(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_batch_defers_eviction() {
        let mut store = TradeStore::new(2);
        let batch: Vec<Trade> = (0..4).map(|i| make_trade(&format!("T{i}"), i)).collect();
        assert!(store.upsert_batch(batch.clone()));
        assert_eq!(ids(&store), vec!["T3", "T2"]);

        // Replaying the same batch changes nothing
        assert!(!store.upsert_batch(batch));
    }

    #[test]
    fn test_batch_of_only_stale_trades_is_not_a_change() {
        let mut store = TradeStore::new(2);
        store.upsert(make_trade("A", 100));
        store.upsert(make_trade("B", 200));
        let stale = vec![make_trade("X", 1), make_trade("Y", 2)];
        assert!(!store.upsert_batch(stale));
        assert_eq!(ids(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_batch_insert_then_retime_into_eviction_is_not_a_change() {
        let mut store = TradeStore::new(2);
        store.upsert(make_trade("A", 100));
        store.upsert(make_trade("B", 200));

        // X lands in the middle, then is re-timed behind everything held
        let batch = vec![make_trade("X", 150), make_trade("X", 1)];
        assert!(!store.upsert_batch(batch));
        assert_eq!(ids(&store), vec!["B", "A"]);
    }

    #[test]
    fn test_nan_notional_stored_as_none() {
        let mut store = TradeStore::new(10);
        store.upsert(make_trade("A", 0).with_notional_eur(f64::NAN));
        let stored = store.get(&TradeId::new("A")).unwrap();
        assert_eq!(stored.notional_eur, None);
        assert!(stored.is_sanitized());
    }

    #[test]
    fn test_clear_resets_store() {
        let mut store = TradeStore::new(2);
        for i in 0..3 {
            store.upsert(make_trade(&format!("T{i}"), i));
        }
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.evicted_total(), 0);
        assert!(store.snapshot().is_empty());
    }
}
