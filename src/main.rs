use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use envelope_fixit::cli::{
    handle_apply_command, handle_audit_command, handle_balance_command, handle_baseline_command,
    handle_decisions_command, handle_deposit_command, handle_import_command, handle_issues_command,
    handle_override_command, handle_plan_command, handle_rule_command, handle_status_command,
    handle_transfer_command, BalanceCommands, BaselineCommands, DepositCommands, OverrideCommands,
    PermissionArgs, RuleCommands,
};
use envelope_fixit::config::{paths::FixitPaths, settings::Settings};
use envelope_fixit::storage::{init, Storage};

#[derive(Parser)]
#[command(
    name = "fixit",
    author = "Kaylee Beyene",
    version,
    about = "Envelope funding health, fix plans, and deposit routing",
    long_about = "fixit watches envelope balances against their funding rules, \
                  explains what is short and why, proposes three ways to fix it, \
                  and splits each paycheck deposit across envelopes."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,

    /// Envelope rule management
    #[command(subcommand)]
    Rule(RuleCommands),

    /// Account and pod balances
    #[command(subcommand)]
    Balance(BalanceCommands),

    /// Baseline deposit routing shares
    #[command(subcommand)]
    Baseline(BaselineCommands),

    /// Temporary routing overrides
    #[command(subcommand)]
    Override(OverrideCommands),

    /// Split or record a deposit
    #[command(subcommand)]
    Deposit(DepositCommands),

    /// Show every envelope's funding state
    Status {
        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// List detected funding issues
    Issues {
        #[arg(long)]
        today: Option<String>,
        /// Print issues as JSON
        #[arg(long)]
        json: bool,
    },

    /// Propose fixes for detected issues
    Plan {
        /// Only plan for these envelopes (names or aliases)
        envelopes: Vec<String>,
        #[command(flatten)]
        permissions: PermissionArgs,
        /// Restore within this many days
        #[arg(long)]
        restore_days: Option<u32>,
        #[arg(long)]
        today: Option<String>,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Propose how to undo the effect of a transfer already made
    Transfer {
        /// Amount moved
        amount: String,
        /// Envelope the money came from
        from: String,
        /// Envelope the money went to
        to: String,
        #[command(flatten)]
        permissions: PermissionArgs,
        #[arg(long)]
        restore_days: Option<u32>,
        #[arg(long)]
        json: bool,
    },

    /// Apply option A, B or C of a decision
    Apply {
        /// Option to apply (A, B or C)
        option: String,
        /// Decision token (defaults to the newest pending decision)
        #[arg(short, long)]
        token: Option<String>,
        #[command(flatten)]
        permissions: PermissionArgs,
    },

    /// List stored decisions or show one
    Decisions {
        /// Decision token to show in full
        token: Option<String>,
    },

    /// Import monthly budgets from a CSV export
    Import {
        /// Expenses CSV with Envelope and Budget columns
        file: String,
        /// JSON file of per-envelope due day, due amount and buffer
        #[arg(long)]
        overrides: Option<String>,
        /// Income CSV, summed for the report
        #[arg(long)]
        income: Option<String>,
    },

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    // Initialize paths and settings
    let paths = FixitPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    if let Some(Commands::Init) = cli.command {
        println!("Initializing fixit at: {}", paths.base_dir().display());
        init::initialize_storage(&paths, &settings)?;
        settings.save(&paths)?;
        println!("Initialization complete!");
        println!();
        println!(
            "Created the catch-all envelope '{}' for unallocated deposits.",
            settings.catch_all_envelope
        );
        println!("Run 'fixit import <expenses.csv>' to load your budgets.");
        return Ok(());
    }

    let storage = if init::needs_initialization(&paths) {
        debug!(path = %paths.base_dir().display(), "initializing data directory");
        let storage = init::initialize_storage(&paths, &settings)?;
        settings.save(&paths)?;
        storage
    } else {
        let mut storage = Storage::new(paths.clone())?;
        storage.load_all()?;
        storage
    };

    match cli.command {
        Some(Commands::Init) => {}
        Some(Commands::Config) => {
            println!("fixit Configuration");
            println!("===================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Catch-all envelope:         {}", settings.catch_all_envelope);
            println!("  Max adjustment per deposit: {}", settings.max_adjustment_per_deposit);
            println!("  Assumed deposit amount:     {}", settings.deposit_amount_assumption);
            println!("  Routing deposits:           {}", settings.routing_deposits);
            println!("  Deposit cadence (days):     {}", settings.deposit_cadence_days);
            println!("  Due-soon window (days):     {}", settings.due_soon_window_days);
        }
        Some(Commands::Rule(cmd)) => handle_rule_command(&storage, cmd)?,
        Some(Commands::Balance(cmd)) => handle_balance_command(&storage, cmd)?,
        Some(Commands::Baseline(cmd)) => handle_baseline_command(&storage, &settings, cmd)?,
        Some(Commands::Override(cmd)) => handle_override_command(&storage, &settings, cmd)?,
        Some(Commands::Deposit(cmd)) => handle_deposit_command(&storage, &settings, cmd)?,
        Some(Commands::Status { today }) => {
            handle_status_command(&storage, &settings, today.as_deref())?
        }
        Some(Commands::Issues { today, json }) => {
            handle_issues_command(&storage, &settings, today.as_deref(), json)?
        }
        Some(Commands::Plan {
            envelopes,
            permissions,
            restore_days,
            today,
            json,
        }) => handle_plan_command(
            &storage,
            &settings,
            envelopes,
            permissions,
            restore_days,
            today.as_deref(),
            json,
        )?,
        Some(Commands::Transfer {
            amount,
            from,
            to,
            permissions,
            restore_days,
            json,
        }) => handle_transfer_command(
            &storage,
            &settings,
            &amount,
            &from,
            &to,
            permissions,
            restore_days,
            json,
        )?,
        Some(Commands::Apply {
            option,
            token,
            permissions,
        }) => handle_apply_command(&storage, &settings, &option, token.as_deref(), permissions)?,
        Some(Commands::Decisions { token }) => {
            handle_decisions_command(&storage, &settings, token.as_deref())?
        }
        Some(Commands::Import {
            file,
            overrides,
            income,
        }) => handle_import_command(
            &storage,
            &settings,
            &file,
            overrides.as_deref(),
            income.as_deref(),
        )?,
        Some(Commands::Audit { limit }) => handle_audit_command(&storage, limit)?,
        None => {
            println!("fixit - envelope funding health and deposit routing");
            println!();
            println!("Run 'fixit --help' for usage information.");
            println!("Run 'fixit status' to see how your envelopes stand.");
        }
    }

    Ok(())
}
