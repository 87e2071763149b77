//! Balance CLI commands
//!
//! Balances stand in for the bank feed: pods are envelopes, and a balance
//! can be marked unknown when the provider could not report it.

use clap::Subcommand;

use crate::display::format_balance_list;
use crate::error::{FixitError, FixitResult};
use crate::models::AccountKind;
use crate::services::BalanceService;
use crate::storage::Storage;

use super::{parse_money, resolve_today};

/// Balance subcommands
#[derive(Subcommand)]
pub enum BalanceCommands {
    /// List stored balances
    List,
    /// Record a balance
    Set {
        /// Account or pod name
        name: String,
        /// Current balance; omit with --unknown
        #[arg(allow_negative_numbers = true, required_unless_present = "unknown")]
        amount: Option<String>,
        /// Account type (pod, account, income)
        #[arg(short = 't', long, default_value = "pod")]
        kind: String,
        /// The provider could not report a balance
        #[arg(long, conflicts_with = "amount")]
        unknown: bool,
        /// Date the balance was observed (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },
    /// Forget a stored balance
    Clear {
        /// Account or pod name
        name: String,
    },
}

/// Handle a balance command
pub fn handle_balance_command(storage: &Storage, cmd: BalanceCommands) -> FixitResult<()> {
    let service = BalanceService::new(storage);

    match cmd {
        BalanceCommands::List => {
            let accounts = service.list()?;
            print!("{}", format_balance_list(&accounts));
        }

        BalanceCommands::Set {
            name,
            amount,
            kind,
            unknown,
            today,
        } => {
            let kind = AccountKind::parse(&kind).ok_or_else(|| {
                FixitError::Validation(format!(
                    "Invalid account type: '{}'. Valid types: pod, account, income",
                    kind
                ))
            })?;
            let balance = if unknown {
                None
            } else {
                amount.map(|a| parse_money(&a, "balance")).transpose()?
            };

            let account = service.set(&name, kind, balance, resolve_today(today.as_deref())?)?;
            match account.balance {
                Some(balance) => println!("Set {} ({}): {}", account.name, account.kind, balance),
                None => println!("Set {} ({}): unknown", account.name, account.kind),
            }
        }

        BalanceCommands::Clear { name } => {
            service.clear(&name)?;
            println!("Cleared balance: {}", name.trim());
        }
    }

    Ok(())
}
