//! Fix plan generation
//!
//! Every issue gets exactly three options:
//!
//! - **A / RESTORE**: manual transfers now from the safest donors
//! - **B / ROUTING**: tilt the next few deposits toward the envelope
//! - **C / STRUCTURAL**: change the rule so the shortfall stops recurring
//!
//! A is recommended when it fully covers the shortfall, otherwise B when the
//! shortfall can be expressed in basis points, otherwise C.

use std::collections::HashMap;

use crate::models::{
    DetectedIssue, EnvelopeState, FixPlan, FixPlanOption, IssueType, Money, OptionId, PlanStep,
    RuleChanges, Vocabulary, TOTAL_BPS,
};

use super::donor::{can_borrow_from_donor, donors_by_priority, DonorPermissions};

pub(crate) const MAX_RESTORE_STEPS: usize = 3;
pub(crate) const MAX_ROUTING_DEPOSITS: u32 = 12;
pub(crate) const STRUCTURAL_WARNING: &str =
    "This changes the rule definition; apply only if the underlying budget target is truly wrong.";

/// Caller-supplied knobs for one planning request
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Only plan for issues on these envelopes; empty means all issues
    pub scope_envelope_names: Vec<String>,
    pub permissions: DonorPermissions,
    /// Expected size of a single deposit, used to turn dollars into bps
    pub deposit_assumption: Money,
    /// How many upcoming deposits a routing fix is spread over
    pub routing_deposits: u32,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            scope_envelope_names: Vec::new(),
            permissions: DonorPermissions::default(),
            deposit_assumption: Money::from_dollars(2500),
            routing_deposits: 2,
        }
    }
}

impl PlanRequest {
    pub(crate) fn deposits(&self) -> u32 {
        self.routing_deposits.clamp(1, MAX_ROUTING_DEPOSITS)
    }

    pub(crate) fn assumed_deposit(&self) -> Money {
        self.deposit_assumption.max(Money::from_cents(1))
    }
}

/// Transfers gathered from donors for a restore option
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Restore {
    pub steps: Vec<PlanStep>,
    pub donors: Vec<String>,
    pub remaining: Money,
}

/// Pull `needed` into `recipient` from eligible donors, in priority order
///
/// Never takes more than a donor's available surplus, and stops after
/// `MAX_RESTORE_STEPS` transfers.
pub(crate) fn restore_from_donors(
    states: &[EnvelopeState],
    exclude: &[&str],
    recipient: &str,
    needed: Money,
    permissions: DonorPermissions,
) -> Restore {
    let mut steps = Vec::new();
    let mut donors = Vec::new();
    let mut remaining = needed;

    for donor in donors_by_priority(states) {
        if !remaining.is_positive() || steps.len() >= MAX_RESTORE_STEPS {
            break;
        }
        if exclude.contains(&donor.name.as_str()) {
            continue;
        }
        if can_borrow_from_donor(donor, permissions).is_err() {
            continue;
        }

        let available = donor.available_to_spend.unwrap_or_default();
        let take = available.min(remaining);
        if !take.is_positive() {
            continue;
        }

        steps.push(PlanStep::Transfer {
            from_envelope: donor.name.clone(),
            to_envelope: recipient.to_string(),
            amount: take,
        });
        donors.push(donor.name.clone());
        remaining -= take;
    }

    Restore {
        steps,
        donors,
        remaining,
    }
}

/// Per-deposit bps needed to raise `needed` over `deposits` deposits of `assumed` size
pub(crate) fn routing_delta_bps(needed: Money, deposits: u32, assumed: Money) -> i64 {
    let assumed = Money::from_cents(assumed.cents().max(1));
    needed
        .per_deposit(deposits)
        .as_bps_of(assumed)
        .clamp(-TOTAL_BPS, TOTAL_BPS)
}

pub(crate) fn recommend(restore: &Restore, delta_bps: i64) -> OptionId {
    if !restore.steps.is_empty() && !restore.remaining.is_positive() {
        OptionId::A
    } else if delta_bps != 0 {
        OptionId::B
    } else {
        OptionId::C
    }
}

pub(crate) fn restore_shortfall_warning(needed: Money, restore: &Restore) -> Vec<String> {
    if restore.remaining.is_positive() {
        vec![format!(
            "Only found {} of surplus above floors without touching locked envelopes.",
            needed - restore.remaining
        )]
    } else {
        Vec::new()
    }
}

pub(crate) fn routing_estimate_warning(assumed: Money) -> String {
    format!(
        "Routing uses a deposit-size estimate of {}; actual dollars may differ per deposit.",
        assumed
    )
}

fn plan_for_issue(issue: &DetectedIssue, target: &EnvelopeState, states: &[EnvelopeState], request: &PlanRequest) -> FixPlan {
    let needed = issue.shortfall.non_negative();

    // A: restore now
    let restore = restore_from_donors(
        states,
        &[target.name.as_str()],
        &target.name,
        needed,
        request.permissions,
    );
    let option_a = FixPlanOption {
        option_id: OptionId::A,
        label: "Restore now (manual transfers)".to_string(),
        vocabulary: Vocabulary::Restore,
        summary: if restore.steps.is_empty() {
            format!("No safe donors available to restore {} right now.", needed)
        } else {
            format!(
                "Move {} into {} now from: {}.",
                needed - restore.remaining,
                target.name,
                restore.donors.join(", ")
            )
        },
        warnings: restore_shortfall_warning(needed, &restore),
        steps: restore.steps.clone(),
    };

    // B: route upcoming deposits
    let deposits = request.deposits();
    let assumed = request.assumed_deposit();
    let delta_bps = routing_delta_bps(needed, deposits, assumed);

    let sorted = donors_by_priority(states);
    let routing_donor = sorted
        .iter()
        .find(|d| d.priority_group.is_discretionary_like() && d.name != target.name)
        .or_else(|| sorted.iter().find(|d| d.balance.is_some() && d.name != target.name))
        .copied();

    let mut routing_steps = vec![PlanStep::RoutingOverride {
        envelope: target.name.clone(),
        delta_bps: delta_bps.max(0),
        remaining_deposits: deposits,
    }];
    if let Some(donor) = routing_donor {
        if delta_bps != 0 {
            routing_steps.push(PlanStep::RoutingOverride {
                envelope: donor.name.clone(),
                delta_bps: -delta_bps.max(0),
                remaining_deposits: deposits,
            });
        }
    }

    let mut routing_warnings = vec![routing_estimate_warning(assumed)];
    if let Some(donor) = routing_donor {
        if donor.protected && !request.permissions.allow_protected_reduction {
            routing_warnings.push(format!(
                "Routing donor {} is protected; it will not be reduced unless allowed.",
                donor.name
            ));
        }
    }

    let option_b = FixPlanOption {
        option_id: OptionId::B,
        label: format!("Update next {} deposit(s) (auto routing)", deposits),
        vocabulary: Vocabulary::Routing,
        summary: if delta_bps == 0 {
            "Needed amount is too small relative to the deposit estimate to express cleanly in bps."
                .to_string()
        } else {
            format!(
                "For next {} deposits: +{} bps to {} (≈{}/deposit).",
                deposits,
                delta_bps,
                target.name,
                assumed.bps_share(delta_bps)
            )
        },
        steps: routing_steps,
        warnings: routing_warnings,
    };

    // C: change the rule
    let (changes, summary) = match issue.issue_type {
        IssueType::TimingShortfall => {
            let suggested = target.due_amount + needed;
            (
                RuleChanges::due_amount(suggested),
                format!(
                    "Increase {} due_amount to {} so it's funded by the due date without scrambling.",
                    target.name, suggested
                ),
            )
        }
        IssueType::Overspend => {
            let suggested = target.monthly_budget + needed;
            (
                RuleChanges::monthly_budget(suggested),
                format!(
                    "Increase {} monthly_budget to {} (or reduce spending) so it stays above its buffer floor.",
                    target.name, suggested
                ),
            )
        }
        IssueType::StructuralUnderfund => (
            RuleChanges::monthly_budget(target.monthly_budget + needed),
            format!("Adjust {} rule upward so this doesn't repeat.", target.name),
        ),
    };
    let option_c = FixPlanOption {
        option_id: OptionId::C,
        label: "Make it structural (change the rule)".to_string(),
        vocabulary: Vocabulary::Structural,
        summary,
        steps: vec![PlanStep::RuleChange {
            envelope: target.name.clone(),
            changes,
        }],
        warnings: vec![STRUCTURAL_WARNING.to_string()],
    };

    FixPlan {
        issue: issue.clone(),
        recommended_option_id: recommend(&restore, delta_bps),
        options: vec![option_a, option_b, option_c],
    }
}

/// Build three ranked remediation options for each in-scope issue
///
/// Scope only filters which issues are planned; donors are drawn from every
/// state. Issues for envelopes with no state are skipped.
pub fn generate_plans(
    issues: &[DetectedIssue],
    states: &[EnvelopeState],
    request: &PlanRequest,
) -> Vec<FixPlan> {
    let by_name: HashMap<&str, &EnvelopeState> =
        states.iter().map(|s| (s.name.as_str(), s)).collect();

    issues
        .iter()
        .filter(|issue| {
            request.scope_envelope_names.is_empty()
                || request
                    .scope_envelope_names
                    .iter()
                    .any(|n| n == &issue.envelope_name)
        })
        .filter_map(|issue| {
            by_name
                .get(issue.envelope_name.as_str())
                .map(|target| plan_for_issue(issue, target, states, request))
        })
        .collect()
}
