//! Envelope state calculation
//!
//! Combines a rule with its live balance into the derived numbers every other
//! engine stage works from. Nothing here looks at the calendar; due-date
//! status is refined by the issue detector.

use std::collections::HashMap;

use crate::models::{AccountBalance, EnvelopeRule, EnvelopeState, EnvelopeStatus, Money};

/// Derive the state of one envelope from its rule and (possibly unknown) balance
pub fn compute_envelope_state(rule: &EnvelopeRule, balance: Option<Money>) -> EnvelopeState {
    let required_floor = rule.monthly_budget.times_months(rule.buffer_months);
    let due_amount = rule.effective_due_amount();
    let required_by_due = rule.active_due_day().map(|_| required_floor + due_amount);
    let available_to_spend = balance.map(|b| b - required_floor);

    let (status, status_reason) = match available_to_spend {
        Some(available) if available.is_negative() => (
            EnvelopeStatus::BufferBreached,
            Some(format!("Below required floor by {}.", available.abs())),
        ),
        _ => (EnvelopeStatus::Ok, None),
    };

    EnvelopeState {
        name: rule.name.clone(),
        balance,
        monthly_budget: rule.monthly_budget,
        due_by_day: rule.due_by_day,
        due_amount,
        buffer_months: rule.buffer_months,
        required_floor,
        required_by_due,
        available_to_spend,
        status,
        status_reason,
        priority_group: rule.priority_group,
        protected: rule.protected,
    }
}

/// Derive states for every rule, matching pod balances by exact name
///
/// Output order follows `rules`.
pub fn compute_envelope_states(
    accounts: &[AccountBalance],
    rules: &[EnvelopeRule],
) -> Vec<EnvelopeState> {
    let by_name: HashMap<&str, &AccountBalance> = accounts
        .iter()
        .filter(|a| a.is_pod())
        .map(|a| (a.name.as_str(), a))
        .collect();

    rules
        .iter()
        .map(|rule| {
            let balance = by_name.get(rule.name.as_str()).and_then(|a| a.balance);
            compute_envelope_state(rule, balance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, PriorityGroup};

    fn dollars(d: i64) -> Money {
        Money::from_dollars(d)
    }

    #[test]
    fn test_floor_and_due_requirement() {
        let rule = EnvelopeRule::new("Insurance", dollars(300), PriorityGroup::Necessities)
            .with_buffer_months(1.5)
            .with_due(15, Some(dollars(250)));

        let state = compute_envelope_state(&rule, Some(dollars(1000)));

        assert_eq!(state.required_floor, dollars(450));
        assert_eq!(state.required_by_due, Some(dollars(700)));
        assert_eq!(state.available_to_spend, Some(dollars(550)));
        assert_eq!(state.status, EnvelopeStatus::Ok);
    }

    #[test]
    fn test_no_due_day_means_no_due_requirement() {
        let rule = EnvelopeRule::new("Fun", dollars(200), PriorityGroup::Discretionary);
        let state = compute_envelope_state(&rule, Some(dollars(50)));

        assert_eq!(state.required_by_due, None);
        assert_eq!(state.due_amount, dollars(200));
    }

    #[test]
    fn test_unknown_balance_stays_ok() {
        let rule = EnvelopeRule::new("Gas", dollars(100), PriorityGroup::Pressing).with_buffer_months(2.0);
        let state = compute_envelope_state(&rule, None);

        assert_eq!(state.available_to_spend, None);
        assert_eq!(state.status, EnvelopeStatus::Ok);
    }

    #[test]
    fn test_below_floor_is_buffer_breached() {
        let rule = EnvelopeRule::new("Groceries", dollars(600), PriorityGroup::Necessities)
            .with_buffer_months(1.0);
        let state = compute_envelope_state(&rule, Some(dollars(450)));

        assert_eq!(state.available_to_spend, Some(dollars(-150)));
        assert_eq!(state.status, EnvelopeStatus::BufferBreached);
        assert_eq!(state.status_reason.as_deref(), Some("Below required floor by $150.00."));
    }

    #[test]
    fn test_only_pods_match_by_exact_name() {
        let rules = vec![
            EnvelopeRule::new("Rent", dollars(1500), PriorityGroup::Necessities),
            EnvelopeRule::new("Fun", dollars(200), PriorityGroup::Discretionary),
        ];
        let accounts = vec![
            AccountBalance::pod("Rent", Some(dollars(900))),
            AccountBalance {
                name: "Fun".into(),
                kind: AccountKind::Account,
                balance: Some(dollars(75)),
            },
            AccountBalance::pod("rent", Some(dollars(1))),
        ];

        let states = compute_envelope_states(&accounts, &rules);

        assert_eq!(states.len(), 2);
        assert_eq!(states[0].balance, Some(dollars(900)));
        assert_eq!(states[1].balance, None);
    }
}
