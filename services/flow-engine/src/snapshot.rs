//! Versioned cache snapshots
//!
//! A snapshot is the immutable view handed to analytics and consumers after
//! a merge pass reported a change. Each carries a monotonic version and a
//! SHA-256 checksum over the fingerprints of its contents, so two views can
//! be compared, or a received view verified, without a deep comparison.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use swap_types::alert::Alert;
use swap_types::strategy::Strategy;
use swap_types::trade::Trade;

use crate::fingerprint::{Fingerprint, Fingerprinted};

/// Immutable view of the three stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Monotonic snapshot version.
    pub version: u64,
    /// Trades, newest first.
    pub trades: Vec<Trade>,
    /// Strategies in first-seen order.
    pub strategies: Vec<Strategy>,
    /// Alerts, newest first.
    pub alerts: Vec<Alert>,
    /// When the snapshot was built.
    pub created_at: DateTime<Utc>,
    /// SHA-256 over content fingerprints, lower-case hex.
    pub checksum: String,
}

impl CacheSnapshot {
    /// The zero-version snapshot of an empty cache.
    pub fn empty(created_at: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            trades: Vec::new(),
            strategies: Vec::new(),
            alerts: Vec::new(),
            created_at,
            checksum: compute_checksum(
                std::iter::empty::<Fingerprint>(),
                std::iter::empty::<Fingerprint>(),
                std::iter::empty::<&Alert>(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.strategies.is_empty() && self.alerts.is_empty()
    }
}

/// Builds snapshots with increasing versions.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version_counter: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self { version_counter: 0 }
    }

    /// Build the next snapshot from store contents.
    ///
    /// `trade_fps` and `strategy_fps` must be in the same order as
    /// `trades` and `strategies`.
    pub fn build(
        &mut self,
        trades: Vec<Trade>,
        trade_fps: impl Iterator<Item = Fingerprint>,
        strategies: Vec<Strategy>,
        strategy_fps: impl Iterator<Item = Fingerprint>,
        alerts: Vec<Alert>,
        created_at: DateTime<Utc>,
    ) -> CacheSnapshot {
        self.version_counter += 1;
        let checksum = compute_checksum(trade_fps, strategy_fps, alerts.iter());
        CacheSnapshot {
            version: self.version_counter,
            trades,
            strategies,
            alerts,
            created_at,
            checksum,
        }
    }

    pub fn current_version(&self) -> u64 {
        self.version_counter
    }
}

fn compute_checksum<'a>(
    trade_fps: impl Iterator<Item = Fingerprint>,
    strategy_fps: impl Iterator<Item = Fingerprint>,
    alerts: impl Iterator<Item = &'a Alert>,
) -> String {
    let mut hasher = Sha256::new();

    for fp in trade_fps {
        hasher.update(fp.as_u64().to_le_bytes());
    }
    hasher.update(b"---");

    for fp in strategy_fps {
        hasher.update(fp.as_u64().to_le_bytes());
    }
    hasher.update(b"---");

    // Alerts are immutable, so the id identifies the content
    for alert in alerts {
        hasher.update(alert.alert_id.as_str().as_bytes());
        hasher.update(b"|");
    }

    format!("{:x}", hasher.finalize())
}

/// Verify that a snapshot's checksum matches its content.
pub fn verify_snapshot_integrity(snapshot: &CacheSnapshot) -> bool {
    let expected = compute_checksum(
        snapshot.trades.iter().map(Fingerprinted::fingerprint),
        snapshot.strategies.iter().map(Fingerprinted::fingerprint),
        snapshot.alerts.iter(),
    );
    snapshot.checksum == expected
}
