//! MundoFi CLI
//!
//! Drives the wizards end to end from the command line, mostly for scripting
//! and smoke tests. Runs against the demo configuration (mock provider, no
//! delays) unless `--config` points at a JSON settings file.
//!
//! ```bash
//! mundofi transfer --goal-title "Vacation" --amount 50 --wallet 2 --pin 123456
//! mundofi create-wallet --email ana@example.com --otp 123456 --name "Rainy day" --pin 482913
//! mundofi --json trust
//! mundofi activity --search fund --filter deposits
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mundofi_core::activity::{Activity, ActivityFeed, ActivityFilter, ActivityQuery, FilterSelection};
use mundofi_core::config::AppConfig;
use mundofi_core::goals::{GoalBook, GoalDraft};
use mundofi_core::providers::build_provider;
use mundofi_core::session::SessionService;
use mundofi_core::trust::trust_summary;
use mundofi_core::types::WalletRecord;
use mundofi_core::utils::logging;
use mundofi_core::wizard::{
    format_with_commas, ConnectWalletWizard, CreateWalletWizard, Key, Outcome, TransferWizard,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mundofi")]
#[command(version)]
#[command(about = "Savings goals, wallet setup and transfers from the terminal", long_about = None)]
struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// JSON settings file (defaults to the demo profile)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deposit into a new savings goal through the transfer wizard
    Transfer {
        #[arg(long, default_value = "My goal")]
        goal_title: String,

        /// Goal target, as typed in the create-goal form
        #[arg(long, default_value = "1,000")]
        target: String,

        /// One of the preset amounts
        #[arg(long, conflicts_with = "custom")]
        amount: Option<f64>,

        /// Amount typed on the keypad, e.g. "1234.5"
        #[arg(long)]
        custom: Option<String>,

        /// Funding wallet id (first wallet when omitted)
        #[arg(long)]
        wallet: Option<String>,

        #[arg(long)]
        pin: String,
    },

    /// Provision an embedded wallet via email verification
    CreateWallet {
        #[arg(long)]
        email: String,

        #[arg(long)]
        otp: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        pin: String,
    },

    /// Attach an external wallet
    ConnectWallet {
        #[arg(long)]
        name: String,

        #[arg(long)]
        pin: String,
    },

    /// Show the trust score summary
    Trust,

    /// Show recent account activity grouped by day
    Activity {
        /// Case-insensitive title search
        #[arg(long, default_value = "")]
        search: String,

        /// Filter chip to apply (repeatable): deposits, goals, swaps, completed, processing
        #[arg(long = "filter")]
        filters: Vec<ActivityFilter>,
    },

    /// Comma-format an amount the way the keypad shows it
    Format { value: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferReport {
    receipt: mundofi_core::wizard::TransferReceipt,
    goal: mundofi_core::goals::Goal,
    activity: Vec<Activity>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Transfer {
            goal_title,
            target,
            amount,
            custom,
            wallet,
            pin,
        } => {
            let report = run_transfer(&config, goal_title, target, amount, custom, wallet, &pin)?;
            if cli.json {
                print_json(&Outcome::Completed(&report))?;
            } else {
                println!(
                    "Deposited ${} into \"{}\" from wallet {}",
                    format_with_commas(&report.receipt.amount.to_string()),
                    report.goal.title,
                    report.receipt.wallet_id
                );
                println!(
                    "Progress: {} of {} ({:.1}%)",
                    format_with_commas(&report.goal.current_amount.to_string()),
                    format_with_commas(&report.goal.target_amount.to_string()),
                    report.goal.percentage()
                );
            }
        }
        Commands::CreateWallet { email, otp, name, pin } => {
            let provider = build_provider(&config)?;
            let mut wizard = CreateWalletWizard::new(&config, provider);
            wizard.open();
            wizard.submit_email(&email).await?;
            wizard.submit_otp(&otp).await?;
            wizard.submit_name(&name)?;
            let record = wizard.submit_pin(&pin).await?;
            finish_wallet(&config, record, cli.json)?;
        }
        Commands::ConnectWallet { name, pin } => {
            let provider = build_provider(&config)?;
            let mut wizard = ConnectWalletWizard::new(&config, provider);
            wizard.open();
            wizard.connect().await?;
            wizard.submit_name(&name)?;
            let record = wizard.submit_pin(&pin)?;
            finish_wallet(&config, record, cli.json)?;
        }
        Commands::Trust => {
            let summary = trust_summary();
            if cli.json {
                print_json(&summary)?;
            } else {
                println!(
                    "Trust score: {}/{} ({}) {:+} this month",
                    summary.score, summary.max_score, summary.band_label, summary.monthly_change
                );
                for activity in &summary.activities {
                    println!("  {:+3}  {:<20} {}", activity.impact, activity.title, activity.when);
                }
            }
        }
        Commands::Activity { search, filters } => {
            let now = chrono::Utc::now();
            let query = ActivityQuery {
                search,
                filters: FilterSelection::new(filters),
            };
            let utc = chrono::FixedOffset::east_opt(0).context("UTC offset")?;
            let groups = ActivityFeed::sample(now).query(&query, now.date_naive(), utc);
            if cli.json {
                print_json(&serde_json::json!({ "filters": query.filters, "groups": groups }))?;
            } else {
                for group in &groups {
                    println!("{}", group.title);
                    for activity in &group.activities {
                        let amount = activity
                            .amount
                            .map(|a| format!("{:+.2}", a))
                            .unwrap_or_default();
                        println!("  {:<22} {:>10}  {:?}", activity.title, amount, activity.status);
                    }
                }
            }
        }
        Commands::Format { value } => {
            let formatted = format_with_commas(&value);
            if cli.json {
                print_json(&serde_json::json!({ "formatted": formatted }))?;
            } else {
                println!("{}", formatted);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::demo().with_instant_latency(),
    };
    config.apply_env_overrides()?;

    for warning in config.validate() {
        mundofi_core::log_debug!("cli", "Configuration warning", detail = warning);
    }
    Ok(config)
}

fn run_transfer(
    config: &AppConfig,
    goal_title: String,
    target: String,
    amount: Option<f64>,
    custom: Option<String>,
    wallet: Option<String>,
    pin: &str,
) -> Result<TransferReport> {
    let mut book = GoalBook::new();
    let goal = book.create_goal(
        &GoalDraft {
            name: goal_title,
            target_amount: target,
            asset_symbol: Some("USDC".to_string()),
            wallet_id: config.wallet_catalog.first().map(|w| w.id.clone()),
            target_date: None,
        },
        config,
    )?;

    let mut wizard = TransferWizard::new(config);
    wizard.open(goal.to_ref());

    match (amount, custom) {
        (Some(amount), _) => wizard.select_preset(amount)?,
        (None, Some(typed)) => {
            wizard.select_custom()?;
            for c in typed.chars().filter(|c| *c != ',') {
                let key = Key::from_char(c).with_context(|| format!("Unsupported keypad input: {}", c))?;
                wizard.press_amount_key(key)?;
            }
            wizard.confirm_custom_amount()?;
        }
        (None, None) => wizard.continue_with_selected()?,
    }

    match wallet {
        Some(id) => wizard.select_wallet(&id)?,
        None => wizard.continue_with_default_wallet()?,
    }
    wizard.confirm_transfer()?;

    let mut receipt = None;
    for c in pin.chars() {
        let key = Key::from_char(c).with_context(|| "PIN must contain digits only")?;
        if let Some(done) = wizard.press_pin_key(key)? {
            receipt = Some(done);
            break;
        }
    }
    let Some(receipt) = receipt else {
        bail!("PIN must be 6 digits");
    };

    let goal = book.apply_receipt(&receipt)?.clone();
    let mut feed = ActivityFeed::default();
    feed.record_deposit(&receipt, &goal, chrono::Utc::now());
    Ok(TransferReport {
        receipt,
        goal,
        activity: feed.activities().to_vec(),
    })
}

fn finish_wallet(config: &AppConfig, record: WalletRecord, json: bool) -> Result<()> {
    let session = SessionService::from_config(config);
    session.initialize()?;
    session.set_wallet(Some(record.clone()))?;

    if json {
        print_json(&Outcome::Completed(&record))?;
    } else {
        println!("Wallet \"{}\" ready", record.name);
        println!("Address: {}", record.address);
        println!("Network: {}", record.network);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
