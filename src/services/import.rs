//! CSV budget import service
//!
//! Reads a budget spreadsheet export with `Envelope` and `Budget` columns,
//! upserts one rule per envelope, and derives routing baselines from each
//! envelope's share of the total budget.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::{info, warn};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::error::{FixitError, FixitResult};
use crate::models::{EnvelopeRule, Money, PriorityGroup, RoutingBaseline, TOTAL_BPS};
use crate::storage::Storage;

/// Per-envelope settings the spreadsheet does not carry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeOverride {
    #[serde(default)]
    pub due_by_day: Option<u32>,
    #[serde(default)]
    pub buffer_months: Option<f64>,
    #[serde(default, rename = "dueAmountDollars")]
    pub due_amount: Option<Money>,
}

/// Envelope budgets read from a CSV, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBudget {
    pub envelopes: Vec<(String, Money)>,
    /// Rows without a name or a readable amount
    pub skipped_rows: usize,
}

impl ParsedBudget {
    pub fn total(&self) -> Money {
        self.envelopes.iter().map(|(_, budget)| *budget).sum()
    }
}

/// A monthly budget that changed during import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetDiff {
    pub envelope_name: String,
    /// `None` for envelopes that had no rule yet
    pub before: Option<Money>,
    pub after: Money,
}

impl fmt::Display for BudgetDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.before {
            Some(before) => write!(f, "{}: {} -> {}", self.envelope_name, before, self.after),
            None => write!(f, "{}: (new) -> {}", self.envelope_name, self.after),
        }
    }
}

/// What an import changed
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub envelope_count: usize,
    pub skipped_rows: usize,
    pub total_budget: Money,
    /// Sum of the optional income sheet
    pub total_income: Option<Money>,
    /// Previous monthly budgets of the imported envelopes
    pub previous_total: Money,
    /// Sorted by envelope name
    pub budget_diffs: Vec<BudgetDiff>,
    /// Envelope names and bps, largest share first
    pub allocations: Vec<(String, i64)>,
    pub bps_sum: i64,
    /// Bps added to the catch-all so the baselines sum to 10000
    pub remainder: i64,
    pub catch_all: String,
    /// True when no baselines existed before this import
    pub first_baselines: bool,
}

/// Service for importing budgets from CSV
pub struct ImportService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    /// Parse `Envelope`/`Budget` rows from a CSV reader
    ///
    /// Header names are matched case-insensitively. Repeated envelopes are
    /// summed; blank or unreadable rows are skipped.
    pub fn parse_budget_csv<R: Read>(&self, reader: R) -> FixitResult<ParsedBudget> {
        let mut csv_reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let envelope_col = column_index(&headers, "Envelope");
        let budget_col = column_index(&headers, "Budget");
        let (Some(envelope_col), Some(budget_col)) = (envelope_col, budget_col) else {
            return Err(FixitError::Import(
                "CSV is missing the Envelope/Budget headers".into(),
            ));
        };

        let mut parsed = ParsedBudget::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for record in csv_reader.records() {
            let record = record?;
            let name = record.get(envelope_col).unwrap_or("").trim();
            let budget = record
                .get(budget_col)
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
                .and_then(|raw| Money::parse(raw).ok());

            let Some(budget) = budget.filter(|_| !name.is_empty()) else {
                if record.iter().any(|field| !field.trim().is_empty()) {
                    parsed.skipped_rows += 1;
                }
                continue;
            };

            match positions.get(name) {
                Some(&index) => parsed.envelopes[index].1 += budget,
                None => {
                    positions.insert(name.to_string(), parsed.envelopes.len());
                    parsed.envelopes.push((name.to_string(), budget));
                }
            }
        }

        Ok(parsed)
    }

    /// Read the JSON map of envelope name to due/buffer settings
    pub fn load_overrides(&self, path: &Path) -> FixitResult<HashMap<String, EnvelopeOverride>> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FixitError::Import(format!("Failed to read overrides {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            FixitError::Import(format!("Failed to parse overrides {}: {}", path.display(), e))
        })
    }

    /// Import budgets from files on disk
    pub fn import_files(
        &self,
        expenses: &Path,
        overrides: Option<&Path>,
        income: Option<&Path>,
    ) -> FixitResult<ImportSummary> {
        let file = std::fs::File::open(expenses).map_err(|e| {
            FixitError::Import(format!("Failed to open {}: {}", expenses.display(), e))
        })?;
        let parsed = self.parse_budget_csv(file)?;

        let overrides = match overrides {
            Some(path) => self.load_overrides(path)?,
            None => HashMap::new(),
        };

        let total_income = match income {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|e| {
                    FixitError::Import(format!("Failed to open {}: {}", path.display(), e))
                })?;
                Some(self.parse_budget_csv(file)?.total())
            }
            None => None,
        };

        let mut summary = self.import(parsed, &overrides)?;
        summary.total_income = total_income;
        Ok(summary)
    }

    /// Upsert rules and baselines for parsed budgets
    pub fn import(
        &self,
        mut parsed: ParsedBudget,
        overrides: &HashMap<String, EnvelopeOverride>,
    ) -> FixitResult<ImportSummary> {
        parsed.envelopes.retain(|(name, budget)| {
            if budget.is_negative() {
                warn!(envelope = %name, budget = %budget, "skipping envelope with negative budget");
                false
            } else {
                true
            }
        });

        let total_budget = parsed.total();
        if parsed.envelopes.is_empty() || !total_budget.is_positive() {
            return Err(FixitError::Import("No valid envelope budgets found".into()));
        }

        let first_baselines = self.storage.routing.baselines()?.is_empty();
        let mut previous_total = Money::zero();
        let mut budget_diffs = Vec::new();

        for (name, budget) in &parsed.envelopes {
            let existing = self.storage.rules.get_by_name(name)?;
            let settings = overrides.get(name).cloned().unwrap_or_default();

            let mut rule = existing
                .clone()
                .unwrap_or_else(|| EnvelopeRule::new(name.as_str(), *budget, PriorityGroup::Other));
            rule.monthly_budget = *budget;
            rule.due_by_day = settings.due_by_day;
            rule.buffer_months = settings.buffer_months.unwrap_or(0.0);
            rule.due_amount = Some(settings.due_amount.unwrap_or(*budget));
            rule.updated_at = chrono::Utc::now();
            rule.validate()
                .map_err(|e| FixitError::Import(format!("{}: {}", name, e)))?;

            self.storage.rules.upsert(rule.clone())?;

            match &existing {
                Some(before) => {
                    previous_total += before.monthly_budget;
                    self.storage.log_update(
                        EntityType::EnvelopeRule,
                        rule.id.to_string(),
                        Some(rule.name.clone()),
                        before,
                        &rule,
                        None,
                    )?;
                }
                None => self.storage.log_create(
                    EntityType::EnvelopeRule,
                    rule.id.to_string(),
                    Some(rule.name.clone()),
                    &rule,
                )?,
            }

            let before = existing.map(|r| r.monthly_budget);
            if before != Some(*budget) {
                budget_diffs.push(BudgetDiff {
                    envelope_name: rule.name.clone(),
                    before,
                    after: *budget,
                });
            }
        }
        budget_diffs.sort_by(|a, b| a.envelope_name.cmp(&b.envelope_name));

        let mut allocations: Vec<(String, i64)> = parsed
            .envelopes
            .iter()
            .map(|(name, budget)| (name.clone(), budget.as_bps_of(total_budget)))
            .collect();

        let catch_all = self.settings.catch_all_envelope.clone();
        let remainder = TOTAL_BPS - allocations.iter().map(|(_, bps)| bps).sum::<i64>();
        match allocations.iter_mut().find(|(name, _)| *name == catch_all) {
            Some((_, bps)) => *bps = (*bps + remainder).max(0),
            None => allocations.push((catch_all.clone(), remainder.max(0))),
        }
        if remainder < 0 {
            warn!(remainder, catch_all = %catch_all, "rounding overshot 10000 bps; catch-all floored at 0");
        }

        for (name, bps) in &allocations {
            let previous = self.storage.routing.upsert_baseline(name, *bps)?;
            let baseline = RoutingBaseline::new(name.as_str(), *bps);
            match previous {
                Some(before) if before.bps != *bps => self.storage.log_update(
                    EntityType::RoutingBaseline,
                    name.as_str(),
                    None,
                    &before,
                    &baseline,
                    Some(format!("bps: {} -> {}", before.bps, bps)),
                )?,
                Some(_) => {}
                None => self.storage.log_create(
                    EntityType::RoutingBaseline,
                    name.as_str(),
                    None,
                    &baseline,
                )?,
            }
        }

        self.storage.rules.save()?;
        self.storage.routing.save()?;

        allocations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let bps_sum = allocations.iter().map(|(_, bps)| bps).sum();

        info!(
            envelopes = parsed.envelopes.len(),
            total = %total_budget,
            bps_sum,
            remainder,
            "imported budget"
        );

        Ok(ImportSummary {
            envelope_count: parsed.envelopes.len(),
            skipped_rows: parsed.skipped_rows,
            total_budget,
            total_income: None,
            previous_total,
            budget_diffs,
            allocations,
            bps_sum,
            remainder,
            catch_all,
            first_baselines,
        })
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}
