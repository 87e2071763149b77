//! Deposit routing
//!
//! Splits one incoming deposit across envelopes in basis points. The split
//! is computed in strictly ordered phases over an [`Allocation`]:
//!
//! 1. seed from baselines, override envelopes and the catch-all
//! 2. apply overrides oldest first
//! 3. cap each envelope's dollar change per deposit
//! 4. normalize the total to 10000 bps
//! 5. convert to cents, with the catch-all taking the rounding remainder
//!
//! The resulting dollar lines always sum to the deposit exactly, even when
//! the bps could not be normalized.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{FixitError, FixitResult};
use crate::models::{
    DepositPlan, DepositPlanLine, EnvelopeRule, Money, PriorityGroup, RoutingBaseline,
    RoutingOverride, TOTAL_BPS,
};

use super::donor::group_rank;

/// Everything the router needs for one deposit
#[derive(Debug, Clone, Copy)]
pub struct DepositInput<'a> {
    pub deposit_amount: Money,
    pub baselines: &'a [RoutingBaseline],
    /// Overrides to apply; callers pass only the ones active today
    pub overrides: &'a [RoutingOverride],
    pub rules: &'a [EnvelopeRule],
    pub catch_all: &'a str,
    /// Largest dollar change any envelope may see per deposit; zero disables the cap
    pub max_adjustment: Money,
}

/// Working numbers for one envelope during routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub baseline_bps: i64,
    pub bps: i64,
    pub protected: bool,
    pub rank: usize,
    /// Set once an applied override allowed reducing this protected envelope
    pub reduction_allowed: bool,
}

impl Slot {
    pub fn delta_bps(&self) -> i64 {
        self.bps - self.baseline_bps
    }
}

fn clamp_bps(bps: i64) -> i64 {
    bps.clamp(0, TOTAL_BPS)
}

/// Per-envelope bps bookkeeping, keyed (and therefore ordered) by envelope name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub slots: BTreeMap<String, Slot>,
    pub catch_all: String,
    pub warnings: Vec<String>,
}

impl Allocation {
    /// Phase 1: baseline bps for every envelope that takes part in routing
    pub fn seed(input: &DepositInput<'_>) -> Self {
        let rule_for = |name: &str| input.rules.iter().find(|r| r.name == name);

        let mut names: Vec<&str> = vec![input.catch_all];
        names.extend(input.baselines.iter().map(|b| b.envelope_name.as_str()));
        names.extend(input.overrides.iter().map(|o| o.envelope_name.as_str()));

        let mut slots = BTreeMap::new();
        for name in names {
            if slots.contains_key(name) {
                continue;
            }
            let baseline_bps = input
                .baselines
                .iter()
                .rev()
                .find(|b| b.envelope_name == name)
                .map(|b| clamp_bps(b.bps))
                .unwrap_or(0);
            let rule = rule_for(name);
            slots.insert(
                name.to_string(),
                Slot {
                    baseline_bps,
                    bps: baseline_bps,
                    protected: rule.is_some_and(|r| r.protected),
                    rank: group_rank(rule.map_or(PriorityGroup::Other, |r| r.priority_group)),
                    reduction_allowed: false,
                },
            );
        }

        Self {
            slots,
            catch_all: input.catch_all.to_string(),
            warnings: Vec::new(),
        }
    }

    pub fn bps(&self, name: &str) -> i64 {
        self.slots.get(name).map_or(0, |s| s.bps)
    }

    pub fn total_bps(&self) -> i64 {
        self.slots.values().map(|s| s.bps).sum()
    }

    fn warn(&mut self, message: String) {
        warn!(catch_all = %self.catch_all, "{}", message);
        self.warnings.push(message);
    }

    /// Phase 2: apply overrides by ascending creation time
    pub fn apply_overrides(&mut self, overrides: &[RoutingOverride]) {
        let mut ordered: Vec<&RoutingOverride> = overrides.iter().collect();
        ordered.sort_by_key(|o| o.created_at);

        for o in ordered {
            let Some(slot) = self.slots.get_mut(&o.envelope_name) else {
                continue;
            };
            let mut next = clamp_bps(slot.bps + o.delta_bps);
            if o.allow_protected_reduction {
                slot.reduction_allowed = true;
            }

            let blocked =
                slot.protected && !o.allow_protected_reduction && next < slot.baseline_bps;
            if blocked {
                next = slot.baseline_bps;
            }
            slot.bps = next;

            if blocked {
                self.warn(format!(
                    "Protected envelope {} not reduced (override blocked).",
                    o.envelope_name
                ));
            }
        }
    }

    /// Phase 3: keep every envelope's dollar change within `max_adjustment`
    pub fn cap_adjustments(&mut self, deposit: Money, max_adjustment: Money) {
        let deposit_cents = deposit.cents();
        let cap_cents = max_adjustment.cents().max(0);
        if cap_cents == 0 || deposit_cents <= 0 {
            return;
        }

        let mut clamped = Vec::new();
        for (name, slot) in self.slots.iter_mut() {
            let delta_bps = slot.delta_bps();
            if delta_bps == 0 {
                continue;
            }

            let delta_cents = deposit.bps_share(delta_bps).cents();
            if delta_cents.abs() <= cap_cents {
                continue;
            }

            let capped = Money::from_cents(if delta_cents > 0 { cap_cents } else { -cap_cents });
            let capped_bps = capped.as_bps_of(deposit).clamp(-TOTAL_BPS, TOTAL_BPS);
            let mut next = clamp_bps(slot.baseline_bps + capped_bps);
            if slot.protected && !slot.reduction_allowed && next < slot.baseline_bps {
                next = slot.baseline_bps;
            }
            slot.bps = next;
            clamped.push(name.clone());
        }

        for name in clamped {
            self.warn(format!(
                "Clamped adjustment for {} to stay within max per-deposit change.",
                name
            ));
        }
    }

    /// Phase 4: bring the total to exactly 10000 bps where possible
    pub fn normalize(&mut self) {
        let total = self.total_bps();
        if total < TOTAL_BPS {
            if let Some(slot) = self.slots.get_mut(&self.catch_all) {
                slot.bps += TOTAL_BPS - total;
            }
            return;
        }

        let mut overflow = total - TOTAL_BPS;
        if overflow == 0 {
            return;
        }

        if let Some(slot) = self.slots.get_mut(&self.catch_all) {
            let take = slot.bps.min(overflow);
            slot.bps -= take;
            overflow -= take;
        }

        if overflow > 0 {
            let mut candidates: Vec<(usize, String)> = self
                .slots
                .iter()
                .filter(|(name, slot)| **name != self.catch_all && !slot.protected)
                .map(|(name, slot)| (slot.rank, name.clone()))
                .collect();
            candidates.sort();

            for (_, name) in candidates {
                if overflow <= 0 {
                    break;
                }
                if let Some(slot) = self.slots.get_mut(&name) {
                    let take = slot.bps.min(overflow);
                    slot.bps -= take;
                    overflow -= take;
                }
            }
        }

        if overflow > 0 {
            self.warn(
                "Unable to resolve bps overflow without touching protected envelopes; returning best-effort plan."
                    .to_string(),
            );
        }
    }

    /// Phase 5: dollar lines sorted by name with the catch-all last
    pub fn into_plan(self, deposit: Money) -> DepositPlan {
        let deposit_cents = deposit.cents();
        let mut lines: Vec<DepositPlanLine> = self
            .slots
            .iter()
            .filter(|(name, _)| **name != self.catch_all)
            .map(|(name, slot)| {
                let bps = clamp_bps(slot.bps);
                DepositPlanLine {
                    envelope_name: name.clone(),
                    bps,
                    amount: deposit.bps_share(bps),
                }
            })
            .collect();

        let others: i64 = lines.iter().map(|l| l.amount.cents()).sum();
        lines.push(DepositPlanLine {
            envelope_name: self.catch_all.clone(),
            bps: clamp_bps(self.bps(&self.catch_all)),
            amount: Money::from_cents(deposit_cents - others),
        });

        DepositPlan {
            deposit_amount: deposit,
            lines,
            catch_all_envelope_name: self.catch_all,
            warnings: self.warnings,
        }
    }
}

/// Compute how a single deposit is split across envelopes
pub fn compute_deposit_plan(input: &DepositInput<'_>) -> FixitResult<DepositPlan> {
    if !input.deposit_amount.is_positive() {
        return Err(FixitError::Validation(format!(
            "Deposit amount must be greater than zero, got {}",
            input.deposit_amount
        )));
    }

    let mut allocation = Allocation::seed(input);
    allocation.apply_overrides(input.overrides);
    allocation.cap_adjustments(input.deposit_amount, input.max_adjustment);
    allocation.normalize();

    Ok(allocation.into_plan(input.deposit_amount))
}
