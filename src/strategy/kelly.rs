//! Stake sizing in units.
//!
//! A linear edge-to-units mapping clamped to a fixed band, rather than a
//! bankroll-fraction Kelly stake: the report has no bankroll to size
//! against.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::debug;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UnitConfig {
    /// Units per unit of edge (0.01 edge → 0.4u).
    pub multiplier: Decimal,
    pub min_units: Decimal,
    pub max_units: Decimal,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            multiplier: dec!(40),
            min_units: dec!(1.0),
            max_units: dec!(5.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Suggested stake for an edge: `clamp(round(edge × 40, 1), 1, 5)`, or 0
/// when there is no edge.
pub fn unit_size(edge: f64) -> Decimal {
    size_with(&UnitConfig::default(), edge)
}

pub fn size_with(config: &UnitConfig, edge: f64) -> Decimal {
    if !edge.is_finite() || edge <= 0.0 {
        return Decimal::ZERO;
    }
    let Some(edge) = Decimal::from_f64(edge) else {
        return Decimal::ZERO;
    };

    let units = (edge * config.multiplier)
        .round_dp(1)
        .clamp(config.min_units, config.max_units);

    debug!(edge = %edge, units = %units, "Stake sized");
    units
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edge_no_stake() {
        assert_eq!(unit_size(0.0), Decimal::ZERO);
        assert_eq!(unit_size(-0.05), Decimal::ZERO);
        assert_eq!(unit_size(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_linear_region() {
        // -150 implied 0.6 vs model 0.68
        assert_eq!(unit_size(0.68 - 0.6), dec!(3.2));
        assert_eq!(unit_size(0.05), dec!(2.0));
    }

    #[test]
    fn test_clamped_band() {
        assert_eq!(unit_size(0.001), dec!(1.0));
        assert_eq!(unit_size(0.03), dec!(1.2));
        assert_eq!(unit_size(0.2), dec!(5.0));
        assert_eq!(unit_size(0.9), dec!(5.0));
    }

    #[test]
    fn test_monotonic_in_edge() {
        let mut prev = Decimal::ZERO;
        for i in 1..=300 {
            let units = unit_size(i as f64 / 1000.0);
            assert!(units >= prev);
            assert!(units >= dec!(1.0) && units <= dec!(5.0));
            prev = units;
        }
    }
}
