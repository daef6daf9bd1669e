//! Flow Engine
//!
//! Consumes a live stream of reported interest-rate-swap trades and
//! maintains:
//! - A bounded, time-ordered trade cache (newest first)
//! - Detected multi-leg strategies
//! - A capped, newest-first alert list
//! - Versioned, checksummed snapshots of the three
//! - Derived market, flow and risk analytics
//! - Pro-trader metrics over trailing windows
//!
//! Events are applied one at a time in arrival order. Analytics are
//! recomputed only when a merge pass changed the stores.
//!
//! # Architecture
//!
//! ```text
//!   Stream messages
//!         │
//!    ┌────▼────┐
//!    │ Ingest  │  ← Parses, sanitizes, decodes
//!    └────┬────┘
//!         │
//!   ┌─────┼──────────┬──────────┐
//!   │     │          │          │
//! ┌─▼───┐ ┌▼────────┐ ┌▼──────┐  │
//! │Trade│ │Strategy │ │Alerts │  │ analytics_update
//! └─┬───┘ └┬────────┘ └┬──────┘  │
//!   └──────┼───────────┘         │
//!     ┌────▼─────┐               │
//!     │ Snapshot │               │
//!     └────┬─────┘               │
//!   ┌──────▼──────────────┐      │
//!   │ Analytics +         │      │
//!   │ Pro-trader windows  │      │
//!   └──────┬──────────────┘      │
//!          └──────► view ◄───────┘
//! ```

pub mod alerts;
pub mod analytics;
pub mod config;
pub mod engine;
pub mod events;
pub mod fingerprint;
pub mod ingestion;
pub mod metrics;
pub mod pro_trader;
pub mod sanitize;
pub mod snapshot;
pub mod strategy_store;
pub mod trade_store;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AnalyticsSource, ApplyOutcome, FlowEngine, ViewDigest};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
