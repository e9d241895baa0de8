use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use smsledger_core::time::{to_local_display, utc_to_millis};
use smsledger_core::{
    Direction, MappingRule, Status, SyncError, Transaction, UpdateOp, MANUAL_ID_PREFIX,
};
use smsledger_ingest::{parse_sms_backup_xml, source_error_from_io, Backup, LocalBackupSource, MessageSource};
use smsledger_pipeline::{remap, upserts, Classifier, Pipeline};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod state;
mod store;

use config::{load_config, Config};
use store::Store;

#[derive(Parser, Debug)]
#[command(name = "smsledger", version, about = "Turn bank SMS backups into a transaction ledger")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config to ~/.smsledger/config.toml
    Init,

    /// Import the newest SMS backup of a profile
    Sync {
        /// Profile label; also the backup sub-folder name
        #[arg(long)]
        source: String,

        /// Folder containing one sub-folder per profile
        #[arg(long)]
        root: Option<PathBuf>,

        /// Read this backup file instead of searching the profile folder
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print the writes as JSON without storing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage source-mapping rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Re-apply the current rules to every stored transaction
    Remap,

    /// Record a transaction by hand
    Manual {
        #[arg(long)]
        amount: Decimal,

        #[arg(long, value_enum)]
        direction: DirectionArg,

        #[arg(long, default_value = "Other")]
        channel: String,

        #[arg(long, default_value = "manual")]
        source: String,

        #[arg(long, default_value = "Manual entry")]
        note: String,
    },

    /// Show stored transactions, newest first
    List {
        #[arg(long)]
        source: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    List,

    /// Add a rule; it is checked after all existing rules
    Add {
        /// Channel label to assign, e.g. "HDFC Credit Card"
        #[arg(long)]
        name: String,

        /// Account type stored next to the label
        #[arg(long = "type", default_value = "other")]
        account_type: String,

        /// Case-insensitive substrings of the message body (repeatable)
        #[arg(long = "match", required = true)]
        matches: Vec<String>,
    },

    /// Change a rule in place; omitted options keep their current value
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        account_type: Option<String>,

        /// Replaces all match strings when given
        #[arg(long = "match")]
        matches: Vec<String>,
    },

    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Debit,
    Credit,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Debit => Direction::Debit,
            DirectionArg::Credit => Direction::Credit,
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "smsledger=debug" } else { "smsledger=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(SyncError::ReauthRequired(detail)) = err.downcast_ref::<SyncError>() {
                eprintln!("Access to the backup source was refused: {detail}");
                eprintln!("Re-authorize access to the backup folder, then run the sync again.");
                return ExitCode::from(2);
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let cfg = load_config()?;
    let store_path = state::store_path()?;
    let mut store = Store::load(&store_path)?;

    match command {
        Command::Init => config::init_config()?,

        Command::Sync {
            source,
            root,
            file,
            dry_run,
        } => {
            let backup = fetch_backup(&cfg, &source, root, file).await?;
            let classifier =
                Classifier::from_config(&cfg.classifier).context("building classifier from config")?;
            let pipeline = Pipeline::new(classifier);

            let rules = store.rules_for(&cfg.user.id);
            let batch = pipeline.run(&backup.messages, &source, &rules);

            if batch.transactions.is_empty() {
                println!(
                    "Sync complete. No transactions found in file '{}'.",
                    backup.file_name()
                );
                return Ok(());
            }

            let ops = upserts(&cfg.user.id, &batch.transactions);
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&ops)?);
                return Ok(());
            }

            let summary = store.apply(&ops);
            store.save(&store_path)?;

            println!("Sync complete for '{}'.", source);
            println!("File:          {}", backup.file_name());
            println!("Messages:      {}", batch.total_messages);
            println!("Transactions:  {} ({} duplicates merged)", batch.transactions.len(), batch.merged_away);
            println!("Newly added:   {}", summary.upserted);
            println!("Modified:      {}", summary.modified);
        }

        Command::Rules { command } => run_rules(&cfg, &mut store, &store_path, command)?,

        Command::Remap => remap_and_save(&cfg, &mut store, &store_path)?,

        Command::Manual {
            amount,
            direction,
            channel,
            source,
            note,
        } => {
            if amount <= Decimal::ZERO {
                bail!("amount must be positive, got {amount}");
            }
            let now = Utc::now();
            let txn = Transaction {
                sms_id: format!("{MANUAL_ID_PREFIX}{}", utc_to_millis(now)),
                date: now,
                body: note,
                amount,
                direction: direction.into(),
                channel,
                source,
                status: Status::Success,
                account_type: None,
            };
            let id = txn.sms_id.clone();
            store.apply(&[UpdateOp::Upsert {
                user_id: cfg.user.id.clone(),
                sms_id: id.clone(),
                set: txn,
            }]);
            store.save(&store_path)?;
            println!("Recorded {id}");
        }

        Command::List { source, limit } => {
            let mut txns = store.transactions_for(&cfg.user.id);
            if let Some(src) = &source {
                txns.retain(|p| &p.transaction.source == src);
            }
            txns.sort_by(|a, b| b.transaction.date.cmp(&a.transaction.date));

            for p in txns.iter().take(limit) {
                let t = &p.transaction;
                println!(
                    "{} | {:<8} | {:<6} | {:>12} | {:<16} | {:<7} | {}",
                    to_local_display(t.date, &cfg.user.timezone)?,
                    t.source,
                    t.direction.as_str(),
                    t.amount,
                    t.channel,
                    if t.status == Status::Failed { "failed" } else { "ok" },
                    truncate(&t.body, 60)
                );
            }
            println!("\n{} of {} transactions", txns.len().min(limit), txns.len());
        }
    }

    Ok(())
}

async fn fetch_backup(
    cfg: &Config,
    source: &str,
    root: Option<PathBuf>,
    file: Option<PathBuf>,
) -> Result<Backup> {
    if let Some(path) = file {
        let xml = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| source_error_from_io(e, &path))?;
        let messages = parse_sms_backup_xml(&xml)
            .map_err(|e| SyncError::Source(format!("{}: {e:#}", path.display())))?;
        return Ok(Backup { path, messages });
    }

    let root = match root {
        Some(r) => r,
        None => cfg.backup_root()?,
    };
    let profile = source.to_string();
    let backup = tokio::task::spawn_blocking(move || LocalBackupSource::new(root).fetch(&profile))
        .await
        .context("backup reader task failed")??;
    Ok(backup)
}

fn clean_matches(matches: Vec<String>) -> Vec<String> {
    matches
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

/// Rule CRUD. Every change is followed by a remap of the user's transactions.
fn run_rules(cfg: &Config, store: &mut Store, store_path: &Path, command: RulesCommand) -> Result<()> {
    let user = cfg.user.id.as_str();
    match command {
        RulesCommand::List => {
            let rules: Vec<_> = store.rules.iter().filter(|r| r.user_id == user).collect();
            if rules.is_empty() {
                println!("No mapping rules. Add one with: smsledger rules add --name <label> --match <text>");
            }
            for r in rules {
                println!(
                    "{}  {} [{}]  <- {}",
                    r.id,
                    r.rule.mapping_name,
                    r.rule.account_type,
                    r.rule.match_strings.join(", ")
                );
            }
            return Ok(());
        }
        RulesCommand::Add {
            name,
            account_type,
            matches,
        } => {
            let matches = clean_matches(matches);
            if name.trim().is_empty() || matches.is_empty() {
                bail!("a mapping name and at least one match string are required");
            }
            let id = store
                .add_rule(user, MappingRule::new(name.trim(), account_type, matches))
                .id
                .clone();
            println!("Added {id}");
        }
        RulesCommand::Edit {
            id,
            name,
            account_type,
            matches,
        } => {
            let Some(current) = store.rule(user, &id).map(|r| r.rule.clone()) else {
                bail!("mapping rule '{id}' not found");
            };
            let name = name.map(|n| n.trim().to_string()).unwrap_or(current.mapping_name);
            if name.is_empty() {
                bail!("a mapping name is required");
            }
            let matches = clean_matches(matches);
            let matches = if matches.is_empty() { current.match_strings } else { matches };
            let rule = MappingRule::new(name, account_type.unwrap_or(current.account_type), matches);
            store.update_rule(user, &id, rule);
            println!("Updated {id}");
        }
        RulesCommand::Delete { id } => {
            if !store.delete_rule(user, &id) {
                bail!("mapping rule '{id}' not found");
            }
            println!("Deleted {id}");
        }
    }
    remap_and_save(cfg, store, store_path)
}

fn remap_and_save(cfg: &Config, store: &mut Store, store_path: &Path) -> Result<()> {
    let rules = store.rules_for(&cfg.user.id);
    let ops = remap(&store.transactions_for(&cfg.user.id), &rules);
    let summary = store.apply(&ops);
    store.save(store_path)?;
    println!("Remapped {} transactions", summary.modified);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
