//! Deposit routing: baselines, overrides, and computed deposit plans

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::OverrideId;
use super::money::Money;

/// Total basis points of a complete allocation
pub const TOTAL_BPS: i64 = 10_000;

/// Standing share of every deposit routed to an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingBaseline {
    pub envelope_name: String,
    pub bps: i64,
    pub updated_at: DateTime<Utc>,
}

impl RoutingBaseline {
    pub fn new(envelope_name: impl Into<String>, bps: i64) -> Self {
        Self {
            envelope_name: envelope_name.into(),
            bps,
            updated_at: Utc::now(),
        }
    }
}

/// Temporary signed adjustment to an envelope's share of deposits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingOverride {
    pub id: OverrideId,
    pub envelope_name: String,
    pub delta_bps: i64,

    /// Deposits left before this override stops applying; `None` = no countdown
    #[serde(default)]
    pub remaining_deposits: Option<u32>,

    /// Last day this override applies; `None` = no expiry
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default)]
    pub allow_protected_reduction: bool,

    /// Overrides apply in ascending creation order
    pub created_at: DateTime<Utc>,
}

impl RoutingOverride {
    pub fn new(envelope_name: impl Into<String>, delta_bps: i64) -> Self {
        Self {
            id: OverrideId::new(),
            envelope_name: envelope_name.into(),
            delta_bps,
            remaining_deposits: None,
            expires_on: None,
            reason: None,
            created_by: None,
            allow_protected_reduction: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_remaining_deposits(mut self, remaining: u32) -> Self {
        self.remaining_deposits = Some(remaining);
        self
    }

    pub fn with_expiry(mut self, expires_on: NaiveDate) -> Self {
        self.expires_on = Some(expires_on);
        self
    }

    pub fn allowing_protected_reduction(mut self) -> Self {
        self.allow_protected_reduction = true;
        self
    }

    /// Whether the override still applies to deposits on `date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        let has_deposits_left = self.remaining_deposits.map_or(true, |r| r > 0);
        let not_expired = self.expires_on.map_or(true, |e| e >= date);
        has_deposits_left && not_expired
    }

    /// Consume one deposit from the countdown, saturating at zero
    ///
    /// Returns true if the countdown changed.
    pub fn consume_deposit(&mut self) -> bool {
        match self.remaining_deposits {
            Some(r) if r > 0 => {
                self.remaining_deposits = Some(r - 1);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositPlanLine {
    pub envelope_name: String,
    pub bps: i64,
    #[serde(rename = "amountDollars")]
    pub amount: Money,
}

/// Split of a single deposit across envelopes
///
/// Line amounts always sum to exactly `deposit_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositPlan {
    #[serde(rename = "depositAmountDollars")]
    pub deposit_amount: Money,
    pub lines: Vec<DepositPlanLine>,
    pub catch_all_envelope_name: String,
    pub warnings: Vec<String>,
}

impl DepositPlan {
    pub fn line(&self, envelope_name: &str) -> Option<&DepositPlanLine> {
        self.lines.iter().find(|l| l.envelope_name == envelope_name)
    }

    pub fn total_bps(&self) -> i64 {
        self.lines.iter().map(|l| l.bps).sum()
    }

    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(|l| l.amount).sum()
    }
}

/// A confirmed deposit, keyed by the caller's idempotency key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositEvent {
    pub idempotency_key: String,
    #[serde(rename = "depositAmountDollars")]
    pub deposit_amount: Money,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_override_active_window() {
        let o = RoutingOverride::new("Rent", 200)
            .with_remaining_deposits(1)
            .with_expiry(date(2025, 3, 31));

        assert!(o.is_active_on(date(2025, 3, 31)));
        assert!(!o.is_active_on(date(2025, 4, 1)));

        let mut spent = o.clone();
        assert!(spent.consume_deposit());
        assert_eq!(spent.remaining_deposits, Some(0));
        assert!(!spent.is_active_on(date(2025, 3, 1)));
        assert!(!spent.consume_deposit());
    }

    #[test]
    fn test_open_ended_override_never_counts_down() {
        let mut o = RoutingOverride::new("Fun", -100);
        assert!(o.is_active_on(date(2030, 1, 1)));
        assert!(!o.consume_deposit());
        assert_eq!(o.remaining_deposits, None);
    }
}
