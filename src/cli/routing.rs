//! Deposit routing CLI commands
//!
//! Baselines, overrides, and planning or confirming a deposit split.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_baseline_list, format_deposit_plan, format_override_list};
use crate::error::FixitResult;
use crate::services::{OverrideInput, RoutingService};
use crate::storage::Storage;

use super::{parse_date, parse_money, resolve_today};

/// Baseline subcommands
#[derive(Subcommand)]
pub enum BaselineCommands {
    /// List baseline shares
    List,
    /// Set one envelope's baseline share in basis points
    Set {
        /// Envelope name
        envelope: String,
        /// Share in basis points (10000 = 100%)
        bps: i64,
    },
}

/// Override subcommands
#[derive(Subcommand)]
pub enum OverrideCommands {
    /// List stored overrides
    List {
        /// Only show overrides that are still active
        #[arg(long)]
        active: bool,
        /// Date to evaluate activity on (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<String>,
    },
    /// Add a temporary change to an envelope's share
    Add {
        /// Envelope name
        envelope: String,
        /// Change in basis points (negative to reduce)
        #[arg(allow_negative_numbers = true)]
        delta_bps: i64,
        /// Number of deposits the override lasts for
        #[arg(short, long)]
        deposits: Option<u32>,
        /// Last date the override applies (YYYY-MM-DD)
        #[arg(short, long)]
        expires: Option<String>,
        /// Why the override exists
        #[arg(short, long)]
        reason: Option<String>,
        /// Permit this override to reduce a protected envelope
        #[arg(long)]
        allow_protected: bool,
    },
    /// Remove an override by id
    Remove {
        /// Override id (full or short form)
        id: String,
    },
}

/// Deposit subcommands
#[derive(Subcommand)]
pub enum DepositCommands {
    /// Show how a deposit would be split
    Plan {
        /// Deposit amount
        amount: String,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
        /// Evaluate overrides as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
    /// Record a deposit so override countdowns advance
    Confirm {
        /// Idempotency key identifying the deposit
        key: String,
        /// Deposit amount
        amount: String,
        #[arg(long)]
        today: Option<String>,
    },
}

/// Handle a baseline command
pub fn handle_baseline_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BaselineCommands,
) -> FixitResult<()> {
    let service = RoutingService::new(storage, settings);

    match cmd {
        BaselineCommands::List => {
            let baselines = service.baselines()?;
            print!("{}", format_baseline_list(&baselines));
        }
        BaselineCommands::Set { envelope, bps } => {
            let baseline = service.set_baseline(&envelope, bps)?;
            println!("Set baseline: {} = {} bps", baseline.envelope_name, baseline.bps);
        }
    }

    Ok(())
}

/// Handle an override command
pub fn handle_override_command(
    storage: &Storage,
    settings: &Settings,
    cmd: OverrideCommands,
) -> FixitResult<()> {
    let service = RoutingService::new(storage, settings);

    match cmd {
        OverrideCommands::List { active, today } => {
            let overrides = if active {
                service.active_overrides(resolve_today(today.as_deref())?)?
            } else {
                service.overrides()?
            };
            print!("{}", format_override_list(&overrides));
        }

        OverrideCommands::Add {
            envelope,
            delta_bps,
            deposits,
            expires,
            reason,
            allow_protected,
        } => {
            let routing_override = service.add_override(OverrideInput {
                envelope_name: envelope,
                delta_bps,
                remaining_deposits: deposits,
                expires_on: expires.as_deref().map(parse_date).transpose()?,
                reason,
                created_by: Some("cli".to_string()),
                allow_protected_reduction: allow_protected,
            })?;
            println!(
                "Added override {}: {} {:+} bps",
                routing_override.id, routing_override.envelope_name, routing_override.delta_bps
            );
        }

        OverrideCommands::Remove { id } => {
            let removed = service.remove_override(&id)?;
            println!(
                "Removed override {}: {} {:+} bps",
                removed.id, removed.envelope_name, removed.delta_bps
            );
        }
    }

    Ok(())
}

/// Handle a deposit command
pub fn handle_deposit_command(
    storage: &Storage,
    settings: &Settings,
    cmd: DepositCommands,
) -> FixitResult<()> {
    let service = RoutingService::new(storage, settings);

    match cmd {
        DepositCommands::Plan {
            amount,
            json,
            today,
        } => {
            let amount = parse_money(&amount, "deposit amount")?;
            let plan = service.plan_deposit(amount, resolve_today(today.as_deref())?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", format_deposit_plan(&plan));
            }
        }

        DepositCommands::Confirm { key, amount, today } => {
            let amount = parse_money(&amount, "deposit amount")?;
            let confirmation =
                service.confirm_deposit(&key, amount, resolve_today(today.as_deref())?)?;

            print!("{}", format_deposit_plan(&confirmation.plan));
            println!();
            if confirmation.newly_recorded {
                println!("Recorded deposit '{}'.", key.trim());
                for o in &confirmation.consumed {
                    match o.remaining_deposits {
                        Some(0) => println!("  Override {} for {} is used up.", o.id, o.envelope_name),
                        Some(n) => println!(
                            "  Override {} for {}: {} deposit(s) left.",
                            o.id, o.envelope_name, n
                        ),
                        None => {}
                    }
                }
            } else {
                println!("Deposit '{}' was already recorded; nothing changed.", key.trim());
            }
        }
    }

    Ok(())
}
