//! Plans for a transfer the user already made by hand
//!
//! Moving money from one envelope to another leaves the source short. The
//! three options restore the source, re-route deposits to cover both sides,
//! or bake the recurring transfer into the recipient's rule.

use std::collections::HashMap;

use crate::models::{
    DetectedIssue, EnvelopeRule, EnvelopeState, FixPlan, FixPlanOption, IssueType, Money,
    OptionId, PlanStep, RuleChanges, Severity, Vocabulary,
};

use super::donor::{donors_by_priority, DonorPermissions};
use super::plans::{
    recommend, restore_from_donors, restore_shortfall_warning,
    routing_delta_bps, routing_estimate_warning, PlanRequest, STRUCTURAL_WARNING,
};

/// The envelope name that SafetyNet permission unlocks for transfer routing
const SAFETY_NET_NAME: &str = "Safety Net";

/// A transfer reported by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedTransfer {
    pub amount: Money,
    pub from_envelope: String,
    pub to_envelope: String,
}

impl ReportedTransfer {
    pub fn new(amount: Money, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            amount,
            from_envelope: from.into(),
            to_envelope: to.into(),
        }
    }
}

fn protected_allowed(donor: &EnvelopeState, permissions: DonorPermissions) -> bool {
    !donor.protected
        || permissions.allow_protected_reduction
        || (permissions.allow_safety_net && donor.name == SAFETY_NET_NAME)
}

fn protected_donor_warning(name: &str) -> String {
    format!(
        "Routing donor {} is protected; pass --allow-protected to use it or pick another envelope.",
        name
    )
}

/// Build the three-option plan for a reported transfer
///
/// `catch_all` is the envelope that absorbs routing offsets when it exists in
/// either `states` or `rules`.
pub fn generate_transfer_plans(
    transfer: &ReportedTransfer,
    states: &[EnvelopeState],
    rules: &[EnvelopeRule],
    request: &PlanRequest,
    catch_all: &str,
) -> FixPlan {
    let amount = transfer.amount.non_negative();
    let from = transfer.from_envelope.as_str();
    let to = transfer.to_envelope.as_str();
    let exclude = [from, to];

    let by_name: HashMap<&str, &EnvelopeState> =
        states.iter().map(|s| (s.name.as_str(), s)).collect();
    let rule_by_name: HashMap<&str, &EnvelopeRule> =
        rules.iter().map(|r| (r.name.as_str(), r)).collect();

    let issue = DetectedIssue {
        issue_type: IssueType::StructuralUnderfund,
        envelope_name: format!("{} → {}", from, to),
        severity: Severity::Info,
        shortfall: amount,
        reason: format!("Transfer noted: moved {} from {} to {}.", amount, from, to),
    };

    // A: put the money back into the source envelope
    let restore = restore_from_donors(states, &exclude, from, amount, request.permissions);
    let option_a = FixPlanOption {
        option_id: OptionId::A,
        label: "Restore donor now (manual transfers)".to_string(),
        vocabulary: Vocabulary::Restore,
        summary: if restore.steps.is_empty() {
            format!(
                "No safe donors available to restore {} into {} right now.",
                amount, from
            )
        } else {
            format!(
                "Move {} into {} now from: {}.",
                amount - restore.remaining,
                from,
                restore.donors.join(", ")
            )
        },
        warnings: restore_shortfall_warning(amount, &restore),
        steps: restore.steps.clone(),
    };

    // B: route deposits
    let deposits = request.deposits();
    let assumed = request.assumed_deposit();
    let delta_bps = routing_delta_bps(amount, deposits, assumed);

    let catch_all_state = by_name.get(catch_all).copied();
    let catch_all_known = catch_all_state.is_some() || rule_by_name.contains_key(catch_all);

    let mut routing_donor: Option<(&str, Option<&EnvelopeState>)> = None;
    let mut blocked_donor: Option<&str> = None;

    if catch_all_known {
        routing_donor = Some((catch_all, catch_all_state));
    } else {
        let sorted = donors_by_priority(states);
        let candidate = sorted
            .iter()
            .find(|d| d.priority_group.is_discretionary_like() && !exclude.contains(&d.name.as_str()))
            .or_else(|| {
                sorted
                    .iter()
                    .find(|d| d.balance.is_some() && !exclude.contains(&d.name.as_str()))
            })
            .copied();
        if let Some(candidate) = candidate {
            if protected_allowed(candidate, request.permissions) {
                routing_donor = Some((candidate.name.as_str(), Some(candidate)));
            } else {
                blocked_donor = Some(candidate.name.as_str());
            }
        }
    }

    let mut routing_steps = vec![PlanStep::RoutingOverride {
        envelope: from.to_string(),
        delta_bps: delta_bps.max(0),
        remaining_deposits: deposits,
    }];

    let recipient_shortfall = by_name
        .get(to)
        .and_then(|r| match (r.balance, r.required_by_due) {
            (Some(balance), Some(required)) if balance < required => Some(required - balance),
            _ => None,
        })
        .unwrap_or_default();
    let recipient_delta_bps = if recipient_shortfall.is_positive() {
        routing_delta_bps(recipient_shortfall, deposits, assumed)
    } else {
        0
    };

    if recipient_delta_bps > 0 && to != from {
        routing_steps.push(PlanStep::RoutingOverride {
            envelope: to.to_string(),
            delta_bps: recipient_delta_bps,
            remaining_deposits: deposits,
        });
    }

    let mut routing_warnings = vec![routing_estimate_warning(assumed)];
    if let Some((_, Some(state))) = routing_donor {
        if !protected_allowed(state, request.permissions) {
            routing_warnings.push(protected_donor_warning(&state.name));
        }
    }
    if let Some(blocked) = blocked_donor {
        routing_warnings.push(protected_donor_warning(blocked));
    }
    if routing_donor.is_none() && delta_bps != 0 {
        routing_warnings.push(
            "No donor envelope found to offset the routing change; consider a manual transfer instead."
                .to_string(),
        );
    }

    let total_delta = delta_bps.max(0) + recipient_delta_bps.max(0);
    if let Some((donor_name, _)) = routing_donor {
        if donor_name != from && total_delta != 0 {
            routing_steps.push(PlanStep::RoutingOverride {
                envelope: donor_name.to_string(),
                delta_bps: -total_delta,
                remaining_deposits: deposits,
            });
        }
    }

    let routing_summary = match blocked_donor {
        Some(blocked) if routing_donor.is_none() && delta_bps != 0 => format!(
            "Routing needs a donor. Pass --allow-protected to use {}, or name a different envelope.",
            blocked
        ),
        _ if delta_bps == 0 => {
            "Needed amount is too small relative to the deposit estimate to express cleanly in bps."
                .to_string()
        }
        _ => format!(
            "For next {} deposits: +{} bps to {} (≈{}/deposit).",
            deposits,
            delta_bps,
            from,
            assumed.bps_share(delta_bps)
        ),
    };

    let option_b = FixPlanOption {
        option_id: OptionId::B,
        label: format!("Update next {} deposit(s) (auto routing)", deposits),
        vocabulary: Vocabulary::Routing,
        summary: routing_summary,
        steps: routing_steps,
        warnings: routing_warnings,
    };

    // C: the recipient's rule absorbs the recurring transfer
    let (structural_steps, structural_summary) = match rule_by_name.get(to) {
        Some(rule) if rule.active_due_day().is_some() => {
            let suggested = rule.effective_due_amount() + amount;
            (
                vec![PlanStep::RuleChange {
                    envelope: to.to_string(),
                    changes: RuleChanges::due_amount(suggested),
                }],
                format!(
                    "Increase {} due_amount to {} to absorb recurring transfers.",
                    to, suggested
                ),
            )
        }
        Some(rule) => {
            let suggested = rule.monthly_budget + amount;
            (
                vec![PlanStep::RuleChange {
                    envelope: to.to_string(),
                    changes: RuleChanges::monthly_budget(suggested),
                }],
                format!(
                    "If this {} happens every month, increase {} monthly_budget to {}. Otherwise keep budget and use Restore/Routing.",
                    amount, to, suggested
                ),
            )
        }
        None => (
            Vec::new(),
            format!(
                "Update {} rule so recurring transfers don't create surprise shortfalls.",
                to
            ),
        ),
    };

    let option_c = FixPlanOption {
        option_id: OptionId::C,
        label: "Make it structural (change the rule)".to_string(),
        vocabulary: Vocabulary::Structural,
        summary: structural_summary,
        steps: structural_steps,
        warnings: vec![STRUCTURAL_WARNING.to_string()],
    };

    FixPlan {
        issue,
        recommended_option_id: recommend(&restore, delta_bps),
        options: vec![option_a, option_b, option_c],
    }
}
