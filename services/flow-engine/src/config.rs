//! Engine configuration
//!
//! Plain structs with `Default` impls; `validate()` is run by
//! `FlowEngine::new` before any store is built.

use std::time::Duration;

use swap_types::alert::Severity;

/// Errors for configurations the engine refuses to run with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },

    #[error("at least one pro-trader window is required")]
    NoWindows,

    #[error("pro-trader windows must be positive minutes, got {0}")]
    InvalidWindow(u32),

    #[error("alert thresholds must satisfy critical >= high >= medium > 0")]
    InvalidThresholds,

    #[error("trend volume threshold must be positive and finite")]
    InvalidTrendVolume,
}

/// EUR notional thresholds for locally derived alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    /// Trailing five-minute volume above which a trend alert fires.
    pub trend_volume: f64,
}

impl AlertThresholds {
    /// Severity for a notional, `None` below the medium threshold.
    pub fn classify(&self, notional_eur: f64) -> Option<Severity> {
        if !notional_eur.is_finite() {
            return None;
        }
        if notional_eur >= self.critical {
            Some(Severity::Critical)
        } else if notional_eur >= self.high {
            Some(Severity::High)
        } else if notional_eur >= self.medium {
            Some(Severity::Medium)
        } else {
            None
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            critical: 2_000_000_000.0,
            high: 1_000_000_000.0,
            medium: 500_000_000.0,
            trend_volume: 5_000_000_000.0,
        }
    }
}

/// Configuration for the flow engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of trades held by the trade store.
    pub trade_capacity: usize,
    /// Maximum number of alerts held by the alert buffer.
    pub alert_capacity: usize,
    /// Trailing windows (minutes) for the pro-trader aggregator.
    pub pro_trader_windows: Vec<u32>,
    /// Maximum number of instrument × currency heatmap cells.
    pub heatmap_cap: usize,
    /// Floor for the elapsed time used by rate velocity.
    pub rate_velocity_min_elapsed: Duration,
    /// Derive large-trade, strategy-package and volume-trend alerts from
    /// `new_trade` and `strategy_detected` events.
    pub derive_large_trade_alerts: bool,
    pub alert_thresholds: AlertThresholds,
    /// Number of recently alerted trade ids remembered for dedup.
    pub alert_dedup_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trade_capacity: 1000,
            alert_capacity: 100,
            pro_trader_windows: vec![10, 15, 20, 30, 60],
            heatmap_cap: 100,
            rate_velocity_min_elapsed: Duration::from_secs(60),
            derive_large_trade_alerts: false,
            alert_thresholds: AlertThresholds::default(),
            alert_dedup_window: 10_000,
        }
    }
}

impl EngineConfig {
    /// Reject configurations that would break store or window invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trade_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "trade_capacity",
            });
        }
        if self.alert_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "alert_capacity",
            });
        }
        if self.heatmap_cap == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "heatmap_cap",
            });
        }
        if self.alert_dedup_window == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "alert_dedup_window",
            });
        }
        if self.pro_trader_windows.is_empty() {
            return Err(ConfigError::NoWindows);
        }
        if let Some(&bad) = self.pro_trader_windows.iter().find(|&&w| w == 0) {
            return Err(ConfigError::InvalidWindow(bad));
        }
        let t = &self.alert_thresholds;
        let ordered = t.critical >= t.high && t.high >= t.medium && t.medium > 0.0;
        if !ordered || !t.critical.is_finite() {
            return Err(ConfigError::InvalidThresholds);
        }
        if !(t.trend_volume.is_finite() && t.trend_volume > 0.0) {
            return Err(ConfigError::InvalidTrendVolume);
        }
        Ok(())
    }

    /// Windows sorted ascending with duplicates removed.
    pub fn windows(&self) -> Vec<u32> {
        let mut windows = self.pro_trader_windows.clone();
        windows.sort_unstable();
        windows.dedup();
        windows
    }
}
