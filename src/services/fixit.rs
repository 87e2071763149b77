//! Fixit service
//!
//! Ties the engine to storage: detects issues from the stored balances and
//! rules, generates fix plans, keeps them as a pending decision, and applies
//! the option the user picks.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::engine::{
    compute_envelope_states, detect_issues, due_dates_needing_snapshots, generate_plans,
    generate_transfer_plans, DonorPermissions, IssueReport, PlanRequest, ReportedTransfer,
};
use crate::error::{FixitError, FixitResult};
use crate::models::{
    DecisionSource, EnvelopeRule, EnvelopeState, FixPlan, OptionId, PendingDecision, PlanStep,
    PriorityGroup, RuleChanges,
};
use crate::storage::Storage;

use super::routing::{OverrideInput, RoutingService};
use super::rule::RuleService;

/// Knobs for a planning request
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Envelope names (or aliases) to plan for; empty plans for every issue
    pub scope: Vec<String>,
    pub allow_safety_net: bool,
    pub allow_protected: bool,
    /// Restore within this many days instead of the default deposit count
    pub restore_days: Option<u32>,
}

/// A plan step checked against storage and ready to run
enum Prepared<'a> {
    Override(OverrideInput),
    RuleChange {
        envelope: &'a str,
        changes: &'a RuleChanges,
    },
    Note,
}

/// A protected envelope the recommended option would draw from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedTouch {
    pub envelope_name: String,
    pub safety_net: bool,
}

impl ProtectedTouch {
    /// CLI flag that grants the missing permission
    pub fn flag(&self) -> &'static str {
        if self.safety_net {
            "--allow-safety-net"
        } else {
            "--allow-protected"
        }
    }
}

/// Result of a planning request
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The stored decision; `None` when there was nothing to plan for
    pub decision: Option<PendingDecision>,
    pub protected_touch: Option<ProtectedTouch>,
}

/// Extra permissions granted when applying a decision
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub allow_safety_net: bool,
    pub allow_protected: bool,
}

/// Result of applying a decision
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub decision: PendingDecision,
    pub option: OptionId,
    /// One line per plan and per applied step
    pub lines: Vec<String>,
}

/// Service for issue detection, planning and applying decisions
pub struct FixitService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> FixitService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Current envelope states without due-date refinement
    pub fn states(&self) -> FixitResult<Vec<EnvelopeState>> {
        let accounts = self.storage.balances.get_all()?;
        let rules = self.storage.rules.get_all()?;
        Ok(compute_envelope_states(&accounts, &rules))
    }

    /// Record today's pod balances and detect issues as of `today`
    pub fn assess(&self, today: NaiveDate) -> FixitResult<IssueReport> {
        let accounts = self.storage.balances.get_all()?;
        let rules = self.storage.rules.get_all()?;

        let mut recorded = 0usize;
        for account in accounts.iter().filter(|a| a.is_pod()) {
            if let Some(balance) = account.balance {
                self.storage.snapshots.record(today, &account.name, balance)?;
                recorded += 1;
            }
        }
        if recorded > 0 {
            self.storage.snapshots.save()?;
        }

        let states = compute_envelope_states(&accounts, &rules);
        let wanted = due_dates_needing_snapshots(&states, today);
        let snapshots = self.storage.snapshots.lookup(&wanted)?;

        debug!(
            envelopes = states.len(),
            snapshots_recorded = recorded,
            due_date_lookups = wanted.len(),
            "assessing envelopes"
        );

        Ok(detect_issues(
            &states,
            today,
            i64::from(self.settings.due_soon_window_days),
            &snapshots,
        ))
    }

    /// Generate plans for detected issues and store them as a pending decision
    pub fn plan(&self, today: NaiveDate, options: &PlanOptions) -> FixitResult<PlanOutcome> {
        let report = self.assess(today)?;
        let rules = self.storage.rules.get_all()?;

        let request = PlanRequest {
            scope_envelope_names: self.resolve_scope(&options.scope)?,
            ..self.plan_request(options)
        };
        let plans = generate_plans(&report.issues, &report.states, &request);

        self.store(DecisionSource::Issues, plans, &rules, &report.states, options)
    }

    /// Generate plans for a transfer the user already made
    pub fn plan_transfer(
        &self,
        transfer: &ReportedTransfer,
        options: &PlanOptions,
    ) -> FixitResult<PlanOutcome> {
        if !transfer.amount.is_positive() {
            return Err(FixitError::Validation(format!(
                "Transfer amount must be greater than zero, got {}",
                transfer.amount
            )));
        }

        let rules = self.storage.rules.get_all()?;
        let transfer = ReportedTransfer::new(
            transfer.amount,
            canonical_name(&rules, &transfer.from_envelope),
            canonical_name(&rules, &transfer.to_envelope),
        );
        if transfer.from_envelope == transfer.to_envelope {
            return Err(FixitError::Validation(
                "Transfer source and destination must differ".into(),
            ));
        }

        let states = self.states()?;
        let plan = generate_transfer_plans(
            &transfer,
            &states,
            &rules,
            &self.plan_request(options),
            &self.settings.catch_all_envelope,
        );

        self.store(DecisionSource::Transfer, vec![plan], &rules, &states, options)
    }

    /// List stored decisions, oldest first
    pub fn decisions(&self) -> FixitResult<Vec<PendingDecision>> {
        self.storage.decisions.get_all()
    }

    /// Find a decision by token, or the newest unapplied one
    pub fn find_decision(&self, token: Option<&str>) -> FixitResult<PendingDecision> {
        match token {
            Some(token) => self
                .storage
                .decisions
                .find(token)?
                .ok_or_else(|| FixitError::decision_not_found(token)),
            None => self
                .storage
                .decisions
                .latest_pending()?
                .ok_or_else(|| FixitError::decision_not_found("(no pending decision)")),
        }
    }

    /// Apply option `option` of a stored decision
    ///
    /// Rule changes update rules, routing steps become overrides, and
    /// transfers are returned as manual instructions. A decision applies once.
    pub fn apply(
        &self,
        option: OptionId,
        token: Option<&str>,
        extra: ApplyOptions,
    ) -> FixitResult<ApplyOutcome> {
        let mut decision = self.find_decision(token)?;
        if let Some(chosen) = decision.chosen_option {
            return Err(FixitError::AlreadyApplied {
                token: decision.token.to_string(),
                option: chosen.to_string(),
            });
        }

        let rules = self.storage.rules.get_all()?;
        let allow_protected = extra.allow_protected || decision.allow_protected_reduction;
        let allow_safety_net = extra.allow_safety_net || decision.allow_safety_net;
        let routing = RoutingService::new(self.storage, self.settings);
        let rule_service = RuleService::new(self.storage);
        let group_of: HashMap<&str, PriorityGroup> = rules
            .iter()
            .map(|r| (r.name.as_str(), r.priority_group))
            .collect();

        // Resolve and check every step first so a bad step leaves nothing half-applied
        let mut prepared = Vec::new();
        for plan in &decision.plans {
            let Some(chosen) = plan.option(option) else {
                continue;
            };
            prepared.push((
                Prepared::Note,
                format!(
                    "Issue {}: {} - {}",
                    plan.issue.envelope_name, chosen.vocabulary, chosen.summary
                ),
            ));

            for step in &chosen.steps {
                let entry = match step {
                    PlanStep::RoutingOverride {
                        envelope,
                        delta_bps: 0,
                        ..
                    } => (
                        Prepared::Note,
                        format!("- Routing unchanged for {}: shortfall is below 1 bps", envelope),
                    ),
                    PlanStep::RoutingOverride {
                        envelope,
                        delta_bps,
                        remaining_deposits,
                    } => {
                        let is_safety_net =
                            group_of.get(envelope.as_str()) == Some(&PriorityGroup::SafetyNet);
                        let input = OverrideInput {
                            envelope_name: envelope.clone(),
                            delta_bps: *delta_bps,
                            remaining_deposits: Some((*remaining_deposits).max(1)),
                            expires_on: None,
                            reason: Some(format!("Fixit {} ({})", decision.token, option)),
                            created_by: Some("fixit apply".to_string()),
                            allow_protected_reduction: allow_protected
                                || (allow_safety_net && is_safety_net),
                        };
                        input.validate()?;
                        (
                            Prepared::Override(input),
                            format!(
                                "- Stored routing override: {} {:+} bps for {} deposit(s)",
                                envelope, delta_bps, remaining_deposits
                            ),
                        )
                    }
                    PlanStep::RuleChange { envelope, changes } => {
                        rule_service.preview_changes(envelope, changes)?;
                        (
                            Prepared::RuleChange { envelope, changes },
                            format!(
                                "- Updated rule for {}: {}",
                                envelope,
                                changes.field_names().join(", ")
                            ),
                        )
                    }
                    PlanStep::Transfer {
                        from_envelope,
                        to_envelope,
                        amount,
                    } => (
                        Prepared::Note,
                        format!(
                            "- Manual transfer: {} → {} {}",
                            from_envelope, to_envelope, amount
                        ),
                    ),
                };
                prepared.push(entry);
            }
        }

        let mut lines = Vec::with_capacity(prepared.len());
        for (step, line) in prepared {
            match step {
                Prepared::Override(input) => {
                    routing.add_override(input)?;
                }
                Prepared::RuleChange { envelope, changes } => {
                    rule_service.apply_changes(envelope, changes)?;
                }
                Prepared::Note => {}
            }
            lines.push(line);
        }

        let before = decision.clone();
        decision.mark_applied(option);
        self.storage.decisions.upsert(decision.clone())?;
        self.storage.decisions.save()?;
        self.storage.log_update(
            EntityType::Decision,
            decision.token.to_string(),
            None,
            &before,
            &decision,
            Some(format!("chosenOption: (none) -> {}", option)),
        )?;

        info!(token = %decision.token, option = %option, steps = lines.len(), "applied decision");

        Ok(ApplyOutcome {
            decision,
            option,
            lines,
        })
    }

    fn plan_request(&self, options: &PlanOptions) -> PlanRequest {
        PlanRequest {
            scope_envelope_names: Vec::new(),
            permissions: DonorPermissions {
                allow_safety_net: options.allow_safety_net,
                allow_protected_reduction: options.allow_protected,
            },
            deposit_assumption: self.settings.deposit_amount_assumption,
            routing_deposits: self.settings.routing_deposits_for(options.restore_days),
        }
    }

    /// Map user-typed names and aliases onto rule names
    fn resolve_scope(&self, scope: &[String]) -> FixitResult<Vec<String>> {
        let rules = self.storage.rules.get_all()?;
        Ok(scope
            .iter()
            .map(|name| canonical_name(&rules, name))
            .collect())
    }

    fn store(
        &self,
        source: DecisionSource,
        plans: Vec<FixPlan>,
        rules: &[EnvelopeRule],
        states: &[EnvelopeState],
        options: &PlanOptions,
    ) -> FixitResult<PlanOutcome> {
        if plans.is_empty() {
            return Ok(PlanOutcome {
                decision: None,
                protected_touch: None,
            });
        }

        let protected_touch = plans
            .first()
            .and_then(|plan| find_protected_touch(plan, rules, states, options));

        let decision = PendingDecision::new(source, plans)
            .with_permissions(options.allow_safety_net, options.allow_protected);
        self.storage.decisions.upsert(decision.clone())?;
        self.storage.decisions.save()?;
        self.storage.log_create(
            EntityType::Decision,
            decision.token.to_string(),
            decision.plans.first().map(|p| p.issue.envelope_name.clone()),
            &decision,
        )?;

        info!(token = %decision.token, plans = decision.plans.len(), "stored pending decision");

        Ok(PlanOutcome {
            decision: Some(decision),
            protected_touch,
        })
    }
}

fn canonical_name(rules: &[EnvelopeRule], name: &str) -> String {
    let name = name.trim();
    rules
        .iter()
        .find(|r| r.name == name)
        .or_else(|| rules.iter().find(|r| r.matches_name(name)))
        .map_or_else(|| name.to_string(), |r| r.name.clone())
}

/// First protected envelope the recommended option takes money from without permission
fn find_protected_touch(
    plan: &FixPlan,
    rules: &[EnvelopeRule],
    states: &[EnvelopeState],
    options: &PlanOptions,
) -> Option<ProtectedTouch> {
    let recommended = plan.recommended()?;

    let touched = recommended.steps.iter().filter_map(|step| match step {
        PlanStep::Transfer { from_envelope, .. } => Some(from_envelope.as_str()),
        PlanStep::RoutingOverride {
            envelope, delta_bps, ..
        } if *delta_bps < 0 => Some(envelope.as_str()),
        _ => None,
    });

    for name in touched {
        let rule = rules.iter().find(|r| r.name == name);
        let is_protected = rule.map(|r| r.protected).unwrap_or_else(|| {
            states
                .iter()
                .find(|s| s.name == name)
                .is_some_and(|s| s.protected)
        });
        if !is_protected || options.allow_protected {
            continue;
        }

        let safety_net = rule.is_some_and(|r| r.priority_group == PriorityGroup::SafetyNet);
        if options.allow_safety_net && safety_net {
            continue;
        }

        return Some(ProtectedTouch {
            envelope_name: name.to_string(),
            safety_net,
        });
    }

    None
}
