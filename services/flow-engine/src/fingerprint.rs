//! Structural fingerprints for change detection
//!
//! A fingerprint hashes only the fields that affect aggregation or
//! display. Two records with equal fingerprints are treated as unchanged,
//! which lets the stores skip replacement and downstream recomputation
//! without a deep comparison.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use swap_types::strategy::Strategy;
use swap_types::trade::Trade;

/// Opaque 64-bit content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Records that can be diffed by fingerprint.
pub trait Fingerprinted {
    fn fingerprint(&self) -> Fingerprint;
}

// -0.0 and 0.0 hash alike; NaN never reaches here after sanitization.
fn hash_f64<H: Hasher>(state: &mut H, value: Option<f64>) {
    match value {
        Some(v) => {
            1u8.hash(state);
            let normalized = if v == 0.0 { 0.0f64 } else { v };
            normalized.to_bits().hash(state);
        }
        None => 0u8.hash(state),
    }
}

impl Fingerprinted for Trade {
    fn fingerprint(&self) -> Fingerprint {
        let mut h = DefaultHasher::new();
        self.dissemination_identifier.hash(&mut h);
        self.action_type.hash(&mut h);
        self.execution_timestamp.hash(&mut h);
        hash_f64(&mut h, self.notional_amount_leg1);
        hash_f64(&mut h, self.notional_amount_leg2);
        self.notional_currency_leg1.hash(&mut h);
        self.notional_currency_leg2.hash(&mut h);
        hash_f64(&mut h, self.fixed_rate_leg1);
        hash_f64(&mut h, self.fixed_rate_leg2);
        hash_f64(&mut h, self.spread_leg1);
        hash_f64(&mut h, self.spread_leg2);
        self.instrument.hash(&mut h);
        self.unique_product_identifier_underlier_name.hash(&mut h);
        self.platform_identifier.hash(&mut h);
        self.package_indicator.hash(&mut h);
        self.package_transaction_price.hash(&mut h);
        self.package_legs.len().hash(&mut h);
        self.package_legs_count.hash(&mut h);
        self.strategy_id.hash(&mut h);
        self.is_forward.hash(&mut h);
        hash_f64(&mut h, self.notional_eur);
        Fingerprint(h.finish())
    }
}

impl Fingerprinted for Strategy {
    fn fingerprint(&self) -> Fingerprint {
        let mut h = DefaultHasher::new();
        self.strategy_id.hash(&mut h);
        self.strategy_type.hash(&mut h);
        self.underlying_name.hash(&mut h);
        self.legs.hash(&mut h);
        hash_f64(&mut h, self.total_notional_eur);
        self.execution_start.hash(&mut h);
        self.execution_end.hash(&mut h);
        self.package_transaction_price.hash(&mut h);
        Fingerprint(h.finish())
    }
}
