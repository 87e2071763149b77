//! Issue detection
//!
//! Refines each envelope's status against the calendar and emits typed
//! issues. Checks run in precedence order (overdue, then due soon, then
//! buffer breach) and the first one that fires decides the status.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::{DetectedIssue, EnvelopeState, EnvelopeStatus, IssueType, Money, Severity};

/// Envelope balances as of a past due date; `None` means no snapshot was taken
pub type SnapshotBalances = HashMap<String, Option<Money>>;

/// Refined states plus the issues they produced
#[derive(Debug, Clone, PartialEq)]
pub struct IssueReport {
    pub states: Vec<EnvelopeState>,
    pub issues: Vec<DetectedIssue>,
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    let next_first = first_of_month(first + Duration::days(31));
    (next_first - first).num_days() as u32
}

/// The due date within `month_of`'s month, with the day clamped to the month length
pub fn due_date_in_month(month_of: NaiveDate, due_by_day: u32) -> NaiveDate {
    let first = first_of_month(month_of);
    let day = due_by_day.clamp(1, days_in_month(first));
    first + Duration::days(i64::from(day) - 1)
}

/// The next due date on or after `today`, and how many days away it is
pub fn next_due_date(today: NaiveDate, due_by_day: u32) -> (NaiveDate, i64) {
    let this_month = due_date_in_month(today, due_by_day);
    let due = if today.day() > this_month.day() {
        let next_month = first_of_month(today) + Duration::days(i64::from(days_in_month(today)));
        due_date_in_month(next_month, due_by_day)
    } else {
        this_month
    };
    (due, (due - today).num_days())
}

fn is_past_due_day(state: &EnvelopeState, today: NaiveDate) -> Option<u32> {
    state
        .due_by_day
        .filter(|d| *d > 0 && today.day() > *d)
}

/// Envelopes whose due date already passed this month, with that due date
///
/// Callers use this to look up stored daily snapshots before detection.
pub fn due_dates_needing_snapshots(
    states: &[EnvelopeState],
    today: NaiveDate,
) -> Vec<(String, NaiveDate)> {
    states
        .iter()
        .filter_map(|s| {
            is_past_due_day(s, today).map(|day| (s.name.clone(), due_date_in_month(today, day)))
        })
        .collect()
}

fn refine_status(
    state: &EnvelopeState,
    today: NaiveDate,
    due_soon_window_days: i64,
    snapshots: &SnapshotBalances,
) -> (EnvelopeStatus, Option<String>) {
    let Some(balance) = state.balance else {
        return (EnvelopeStatus::Ok, None);
    };

    if let (Some(required), Some(day)) = (state.required_by_due, is_past_due_day(state, today)) {
        let due_this_month = due_date_in_month(today, day);
        let snapshot = snapshots.get(&state.name).copied().flatten();
        let compared = snapshot.unwrap_or(balance);

        if compared < required {
            let short = required - compared;
            let reason = match snapshot {
                Some(_) => format!("Was short {} on due date ({}).", short, due_this_month),
                None => format!(
                    "Likely short {} for due date (no snapshot for {}).",
                    short, due_this_month
                ),
            };
            return (EnvelopeStatus::Overdue, Some(reason));
        }
    }

    if let (Some(required), Some(day)) = (state.required_by_due, state.due_by_day.filter(|d| *d > 0)) {
        let (_, days_until) = next_due_date(today, day);
        if (0..=due_soon_window_days).contains(&days_until) && balance < required {
            let reason = format!(
                "Needs {} funded within {} day(s).",
                required - balance,
                days_until
            );
            return (EnvelopeStatus::DueSoon, Some(reason));
        }
    }

    match state.available_to_spend {
        Some(available) if available.is_negative() => (
            EnvelopeStatus::BufferBreached,
            Some(format!("Below floor by {}.", available.abs())),
        ),
        _ => (EnvelopeStatus::Ok, None),
    }
}

fn issue_for(state: &EnvelopeState) -> Option<DetectedIssue> {
    let balance = state.balance?;

    match state.status {
        EnvelopeStatus::DueSoon | EnvelopeStatus::Overdue => {
            let required = state.required_by_due.unwrap_or_default();
            let shortfall = (required - balance).non_negative();
            if !shortfall.is_positive() {
                return None;
            }
            Some(DetectedIssue {
                issue_type: IssueType::TimingShortfall,
                envelope_name: state.name.clone(),
                severity: if state.status == EnvelopeStatus::Overdue {
                    Severity::Error
                } else {
                    Severity::Warn
                },
                shortfall,
                reason: state
                    .status_reason
                    .clone()
                    .unwrap_or_else(|| "Needs funding by due date.".to_string()),
            })
        }
        EnvelopeStatus::BufferBreached => Some(DetectedIssue {
            issue_type: IssueType::Overspend,
            envelope_name: state.name.clone(),
            severity: Severity::Warn,
            shortfall: (-state.available_to_spend.unwrap_or_default()).non_negative(),
            reason: state
                .status_reason
                .clone()
                .unwrap_or_else(|| "Below buffer floor.".to_string()),
        }),
        EnvelopeStatus::Ok => None,
    }
}

/// Refine statuses for `today` and collect the resulting issues
///
/// `snapshots` holds balances as of each envelope's due date when that date
/// has already passed this month; envelopes without one fall back to their
/// current balance.
pub fn detect_issues(
    states: &[EnvelopeState],
    today: NaiveDate,
    due_soon_window_days: i64,
    snapshots: &SnapshotBalances,
) -> IssueReport {
    let states: Vec<EnvelopeState> = states
        .iter()
        .map(|s| {
            let (status, status_reason) = refine_status(s, today, due_soon_window_days, snapshots);
            EnvelopeState {
                status,
                status_reason,
                ..s.clone()
            }
        })
        .collect();

    let issues: Vec<DetectedIssue> = states.iter().filter_map(issue_for).collect();

    for issue in &issues {
        debug!(
            envelope = %issue.envelope_name,
            issue_type = %issue.issue_type,
            severity = %issue.severity,
            shortfall = %issue.shortfall,
            "detected funding issue"
        );
    }

    IssueReport { states, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::compute_envelope_state;
    use crate::models::{EnvelopeRule, PriorityGroup};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dollars(d: i64) -> Money {
        Money::from_dollars(d)
    }

    fn rent() -> EnvelopeRule {
        EnvelopeRule::new("Rent", dollars(1500), PriorityGroup::Necessities)
            .with_due(1, Some(dollars(1500)))
            .protected()
    }

    fn detect(state: EnvelopeState, today: NaiveDate, window: i64) -> IssueReport {
        detect_issues(&[state], today, window, &SnapshotBalances::new())
    }

    #[test]
    fn test_due_date_clamps_to_month_length() {
        assert_eq!(due_date_in_month(date(2025, 2, 10), 31), date(2025, 2, 28));
        assert_eq!(due_date_in_month(date(2024, 2, 10), 30), date(2024, 2, 29));
        assert_eq!(due_date_in_month(date(2025, 4, 1), 31), date(2025, 4, 30));
        assert_eq!(due_date_in_month(date(2025, 1, 31), 15), date(2025, 1, 15));
    }

    #[test]
    fn test_next_due_date_rolls_into_next_month_and_year() {
        assert_eq!(next_due_date(date(2025, 1, 10), 15), (date(2025, 1, 15), 5));
        assert_eq!(next_due_date(date(2025, 1, 15), 15), (date(2025, 1, 15), 0));
        assert_eq!(next_due_date(date(2025, 12, 20), 5), (date(2026, 1, 5), 16));
        assert_eq!(next_due_date(date(2025, 1, 31), 30), (date(2025, 2, 28), 28));
    }

    #[test]
    fn test_overdue_rent_without_snapshot() {
        let state = compute_envelope_state(&rent(), Some(Money::zero()));
        let report = detect(state, date(2025, 3, 5), 7);

        assert_eq!(report.states[0].status, EnvelopeStatus::Overdue);
        assert_eq!(
            report.states[0].status_reason.as_deref(),
            Some("Likely short $1500.00 for due date (no snapshot for 2025-03-01).")
        );
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.issue_type, IssueType::TimingShortfall);
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.shortfall, dollars(1500));
    }

    #[test]
    fn test_overdue_prefers_due_date_snapshot() {
        let state = compute_envelope_state(&rent(), Some(dollars(1400)));
        let mut snapshots = SnapshotBalances::new();
        snapshots.insert("Rent".into(), Some(dollars(1000)));

        let report = detect_issues(&[state], date(2025, 3, 5), 7, &snapshots);

        assert_eq!(report.states[0].status, EnvelopeStatus::Overdue);
        assert_eq!(
            report.states[0].status_reason.as_deref(),
            Some("Was short $500.00 on due date (2025-03-01).")
        );
        // Issue shortfall is measured against today's balance
        assert_eq!(report.issues[0].shortfall, dollars(100));
    }

    #[test]
    fn test_snapshot_short_but_now_funded_emits_no_issue() {
        let state = compute_envelope_state(&rent(), Some(dollars(1600)));
        let mut snapshots = SnapshotBalances::new();
        snapshots.insert("Rent".into(), Some(dollars(10)));

        let report = detect_issues(&[state], date(2025, 3, 5), 7, &snapshots);

        assert_eq!(report.states[0].status, EnvelopeStatus::Overdue);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_not_overdue_on_the_due_day_itself() {
        let state = compute_envelope_state(&rent(), Some(dollars(100)));
        let report = detect(state, date(2025, 3, 1), 7);

        assert_eq!(report.states[0].status, EnvelopeStatus::DueSoon);
        assert_eq!(
            report.states[0].status_reason.as_deref(),
            Some("Needs $1400.00 funded within 0 day(s).")
        );
        assert_eq!(report.issues[0].severity, Severity::Warn);
    }

    #[test]
    fn test_due_soon_respects_window() {
        let rule = EnvelopeRule::new("Phone", dollars(80), PriorityGroup::Necessities).with_due(31, None);
        let state = compute_envelope_state(&rule, Some(dollars(20)));

        // February clamps the 31st to the 28th: 8 days out from the 20th.
        let outside = detect(state.clone(), date(2025, 2, 20), 7);
        assert_eq!(outside.states[0].status, EnvelopeStatus::Ok);
        assert!(outside.issues.is_empty());

        let inside = detect(state, date(2025, 2, 20), 10);
        assert_eq!(inside.states[0].status, EnvelopeStatus::DueSoon);
        assert_eq!(inside.issues[0].shortfall, dollars(60));
    }

    #[test]
    fn test_funded_past_due_envelope_checks_next_month() {
        let state = compute_envelope_state(&rent(), Some(dollars(1500)));
        let report = detect(state, date(2025, 3, 28), 7);

        assert_eq!(report.states[0].status, EnvelopeStatus::Ok);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_buffer_breach_emits_overspend() {
        let rule = EnvelopeRule::new("Groceries", dollars(600), PriorityGroup::Necessities)
            .with_buffer_months(1.0);
        let state = compute_envelope_state(&rule, Some(dollars(450)));

        let report = detect(state, date(2025, 3, 10), 7);

        assert_eq!(report.states[0].status, EnvelopeStatus::BufferBreached);
        let issue = &report.issues[0];
        assert_eq!(issue.issue_type, IssueType::Overspend);
        assert_eq!(issue.severity, Severity::Warn);
        assert_eq!(issue.shortfall, dollars(150));
        assert_eq!(issue.reason, "Below floor by $150.00.");
    }

    #[test]
    fn test_due_pressure_wins_over_buffer_breach() {
        let rule = EnvelopeRule::new("Car", dollars(400), PriorityGroup::Necessities)
            .with_buffer_months(1.0)
            .with_due(12, None);
        let state = compute_envelope_state(&rule, Some(dollars(100)));

        let report = detect(state, date(2025, 3, 10), 7);

        assert_eq!(report.states[0].status, EnvelopeStatus::DueSoon);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].shortfall, dollars(700));
    }

    #[test]
    fn test_unknown_balance_is_skipped() {
        let state = compute_envelope_state(&rent(), None);
        let report = detect(state, date(2025, 3, 5), 7);

        assert_eq!(report.states[0].status, EnvelopeStatus::Ok);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_shortfalls_are_never_negative() {
        let rules = vec![
            rent(),
            EnvelopeRule::new("Fun", dollars(100), PriorityGroup::Discretionary).with_buffer_months(1.0),
            EnvelopeRule::new("Water", dollars(60), PriorityGroup::Necessities).with_due(12, None),
        ];
        let balances = [Some(dollars(-20)), Some(dollars(-5)), Some(dollars(59))];
        let states: Vec<_> = rules
            .iter()
            .zip(balances)
            .map(|(r, b)| compute_envelope_state(r, b))
            .collect();

        for day in 1..=28 {
            let report = detect_issues(&states, date(2025, 2, day), 7, &SnapshotBalances::new());
            assert!(report.issues.iter().all(|i| !i.shortfall.is_negative()));
        }
    }

    #[test]
    fn test_snapshot_dates_only_for_passed_due_days() {
        let rules = vec![
            rent(),
            EnvelopeRule::new("Water", dollars(60), PriorityGroup::Necessities).with_due(20, None),
            EnvelopeRule::new("Fun", dollars(100), PriorityGroup::Discretionary),
        ];
        let states: Vec<_> = rules.iter().map(|r| compute_envelope_state(r, None)).collect();

        let needed = due_dates_needing_snapshots(&states, date(2025, 3, 5));
        assert_eq!(needed, vec![("Rent".to_string(), date(2025, 3, 1))]);
    }
}
