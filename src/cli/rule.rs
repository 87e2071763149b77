//! Envelope rule CLI commands

use clap::Subcommand;

use crate::display::{format_rule_details, format_rule_list};
use crate::error::{FixitError, FixitResult};
use crate::models::PriorityGroup;
use crate::services::{RuleInput, RuleService};
use crate::storage::Storage;

use super::parse_money;

/// Rule subcommands
#[derive(Subcommand)]
pub enum RuleCommands {
    /// List all envelope rules
    List,
    /// Show one rule
    Show {
        /// Envelope name or alias
        envelope: String,
    },
    /// Create a rule or update fields of an existing one
    Set {
        /// Envelope name or alias
        envelope: String,
        /// Monthly budget (e.g., "1500.00")
        #[arg(short, long)]
        budget: Option<String>,
        /// Day of month the bill is due (1-31)
        #[arg(short, long)]
        due: Option<u32>,
        /// Amount due by the due day, if different from the budget
        #[arg(long)]
        due_amount: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with_all = ["due", "due_amount"])]
        no_due: bool,
        /// Months of budget to keep in reserve
        #[arg(long)]
        buffer: Option<f64>,
        /// Priority group (Savings, SafetyNet, Necessities, Pressing, Kiddos, Discretionary, Other)
        #[arg(short, long)]
        group: Option<String>,
        /// Mark the envelope as protected
        #[arg(long, conflicts_with = "unprotect")]
        protect: bool,
        /// Clear the protected flag
        #[arg(long)]
        unprotect: bool,
        /// Comma-separated aliases (replaces existing)
        #[arg(long, value_delimiter = ',')]
        aliases: Option<Vec<String>>,
    },
    /// Remove a rule
    Remove {
        /// Envelope name or alias
        envelope: String,
    },
}

/// Handle a rule command
pub fn handle_rule_command(storage: &Storage, cmd: RuleCommands) -> FixitResult<()> {
    let service = RuleService::new(storage);

    match cmd {
        RuleCommands::List => {
            let rules = service.list()?;
            print!("{}", format_rule_list(&rules));
        }

        RuleCommands::Show { envelope } => {
            let rule = service.get(&envelope)?;
            print!("{}", format_rule_details(&rule));
        }

        RuleCommands::Set {
            envelope,
            budget,
            due,
            due_amount,
            no_due,
            buffer,
            group,
            protect,
            unprotect,
            aliases,
        } => {
            let priority_group = group
                .map(|g| {
                    g.parse::<PriorityGroup>()
                        .map_err(|e| FixitError::Validation(e.to_string()))
                })
                .transpose()?;

            let input = RuleInput {
                monthly_budget: budget.map(|b| parse_money(&b, "budget")).transpose()?,
                due_by_day: due,
                clear_due: no_due,
                due_amount: due_amount
                    .map(|a| parse_money(&a, "due amount"))
                    .transpose()?,
                buffer_months: buffer,
                priority_group,
                protected: match (protect, unprotect) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                aliases,
            };

            let (rule, created) = service.set(&envelope, &input)?;
            if created {
                println!("Created rule: {}", rule.name);
            } else {
                println!("Updated rule: {}", rule.name);
            }
            print!("{}", format_rule_details(&rule));
        }

        RuleCommands::Remove { envelope } => {
            let removed = service.remove(&envelope)?;
            println!("Removed rule: {}", removed.name);
        }
    }

    Ok(())
}
