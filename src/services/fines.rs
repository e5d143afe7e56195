//! Overdue fine schedule

use rust_decimal::Decimal;

use crate::config::CirculationConfig;

/// Linear per-day fine, optionally after a grace period and up to a cap
#[derive(Debug, Clone, PartialEq)]
pub struct FinePolicy {
    pub rate_per_day: Decimal,
    pub grace_days: i64,
    pub max_fine: Option<Decimal>,
}

impl FinePolicy {
    pub fn new(rate_per_day: Decimal) -> Self {
        Self {
            rate_per_day,
            grace_days: 0,
            max_fine: None,
        }
    }

    pub fn from_config(config: &CirculationConfig) -> Self {
        Self {
            rate_per_day: config.fine_per_day,
            grace_days: i64::from(config.fine_grace_days),
            max_fine: config.max_fine,
        }
    }

    /// Fine owed for a loan returned `overdue_days` after its due date
    pub fn compute(&self, overdue_days: i64) -> Decimal {
        let chargeable = (overdue_days - self.grace_days).max(0);
        let fine = (Decimal::from(chargeable) * self.rate_per_day).round_dp(2);
        match self.max_fine {
            Some(cap) if fine > cap => cap,
            _ => fine,
        }
    }
}

impl Default for FinePolicy {
    fn default() -> Self {
        Self::from_config(&CirculationConfig::default())
    }
}
