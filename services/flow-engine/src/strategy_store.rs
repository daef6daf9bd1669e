//! Strategy store
//!
//! Same fingerprint-diff upsert as the trade store, but unbounded and
//! without a time index. Snapshots list strategies in first-seen order.

use std::collections::HashMap;

use swap_types::ids::StrategyId;
use swap_types::strategy::Strategy;
use tracing::debug;

use crate::fingerprint::{Fingerprint, Fingerprinted};

#[derive(Debug, Clone)]
struct StoredStrategy {
    strategy: Strategy,
    fingerprint: Fingerprint,
}

/// Detected multi-leg strategies keyed by id.
#[derive(Debug, Default)]
pub struct StrategyStore {
    records: HashMap<StrategyId, StoredStrategy>,
    order: Vec<StrategyId>,
}

impl StrategyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a strategy. Returns `true` if anything changed.
    pub fn upsert(&mut self, mut strategy: Strategy) -> bool {
        strategy.sanitize();
        let fingerprint = strategy.fingerprint();

        match self.records.get_mut(strategy.id()) {
            Some(stored) if stored.fingerprint == fingerprint => false,
            Some(stored) => {
                stored.strategy = strategy;
                stored.fingerprint = fingerprint;
                true
            }
            None => {
                let id = strategy.id().clone();
                self.order.push(id.clone());
                self.records.insert(
                    id,
                    StoredStrategy {
                        strategy,
                        fingerprint,
                    },
                );
                true
            }
        }
    }

    pub fn upsert_batch<I>(&mut self, strategies: I) -> bool
    where
        I: IntoIterator<Item = Strategy>,
    {
        let mut changed = 0usize;
        let mut seen = 0usize;
        for strategy in strategies {
            seen += 1;
            if self.upsert(strategy) {
                changed += 1;
            }
        }
        debug!(seen, changed, "Strategy batch merged");
        changed > 0
    }

    pub fn snapshot(&self) -> Vec<Strategy> {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.records.get(id).map(|s| &s.strategy))
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.records.get(id).map(|s| s.fingerprint))
    }

    pub fn contains(&self, id: &StrategyId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &StrategyId) -> Option<&Strategy> {
        self.records.get(id).map(|s| &s.strategy)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }
}
