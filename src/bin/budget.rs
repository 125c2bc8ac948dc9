use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::filter::LevelFilter;

use household_budget::{
    Category, Clock, Configuration, Dashboard, Export, Household, HttpMirror, IntervalTicker,
    LocalClock, MemberId, MemberName, RETENTION_DAYS, SqliteStorage, SweepOutcome, SweepSummary,
    SyncWorker, Transaction, TransactionId, count_label, export, export_file_name,
    format_currency, import, import_replacing, parse_date, run_sweeper, setup_logging,
};

/// Track a household's shared expenses.
///
/// Expenses are kept for 35 days. Old ones are cleaned up every time the
/// tool runs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database holding the household's data.
    #[arg(long, env = "BUDGET_DB_PATH", default_value = "household_budget.db")]
    db_path: PathBuf,

    /// Mirror every change to this URL, e.g. http://localhost:3000/api/transactions.
    #[arg(long, env = "BUDGET_MIRROR_URL")]
    mirror_url: Option<String>,

    /// The canonical time zone used to decide what today's date is.
    #[arg(long, env = "BUDGET_TIMEZONE", default_value = "Asia/Kolkata")]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the household budget.
    SetBudget {
        /// The budget in rupees.
        amount: f64,
    },
    /// Add a household member.
    AddMember {
        /// The member's name. Must be unique, ignoring case.
        name: String,
    },
    /// Remove a member and every transaction they logged.
    RemoveMember {
        /// The member's ID or name.
        member: String,
    },
    /// List the household members.
    Members,
    /// Log an expense.
    Add {
        /// The ID or name of the member who spent the money.
        #[arg(long, short)]
        member: String,
        /// The amount spent in rupees.
        amount: f64,
        /// What the money was spent on.
        description: String,
        /// The expense category, e.g. Food or Transport.
        #[arg(long, short, default_value = "Other")]
        category: String,
        /// The date of the expense as yyyy-mm-dd. Defaults to today.
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Delete an expense.
    Delete {
        /// The transaction ID.
        id: String,
    },
    /// List every expense, most recent first.
    List,
    /// Show the budget summary.
    Summary,
    /// Show what is held in storage.
    Stats,
    /// Delete expenses older than 35 days.
    Sweep {
        /// Keep running and sweep once a day until interrupted.
        #[arg(long)]
        watch: bool,
    },
    /// Save a JSON backup of all data.
    Export {
        /// Where to write the backup. Defaults to household-budget-backup-<date>.json.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Restore a JSON backup.
    Import {
        /// The backup file.
        path: PathBuf,
        /// Delete all existing data before importing.
        #[arg(long)]
        replace: bool,
    },
    /// Delete all members, expenses and budget data.
    Clear {
        /// Confirm that all data should be deleted.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(LevelFilter::WARN, Path::new("debug.log"))?;

    let clock = LocalClock::new(&args.timezone)?;
    let storage = Arc::new(SqliteStorage::open(&args.db_path)?);
    let household = Household::new(storage);

    let (household, sync_task) = match &args.mirror_url {
        Some(url) => {
            let (sender, receiver) = mpsc::unbounded_channel();
            let worker = SyncWorker::new(HttpMirror::new(url)?);
            let task = tokio::spawn(async move { worker.run(receiver).await });

            (household.with_sync(sender), Some(task))
        }
        None => (household, None),
    };

    // Every sync sender lives inside `household`, so the worker finishes once it is dropped.
    let result = run(household, clock, args.command).await;

    if let Some(task) = sync_task {
        let report = task.await?;
        if report.dropped > 0 {
            eprintln!(
                "Warning: {} could not be copied to the mirror",
                count_label(report.dropped, "change")
            );
        }
    }

    result
}

async fn run(
    household: Household,
    clock: LocalClock,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    if !matches!(
        command,
        Command::Sweep { .. } | Command::Clear { .. } | Command::Import { .. }
    ) {
        sweep_expired(&household, &clock)?;
    }

    match command {
        Command::SetBudget { amount } => {
            let config = household.config().set_budget(amount)?;
            println!("Budget set to {}", format_currency(config.budget));
        }
        Command::AddMember { name } => {
            let member = household.config().add_member(&name)?;
            println!("Added {} ({})", member.name, member.id);
        }
        Command::RemoveMember { member } => {
            let config = household.config().load()?;
            let member_id = resolve_member(&config, &member)?;
            let name = config.member_name(&member_id).to_owned();
            let removed = household.remove_member(&member_id)?;
            println!(
                "Removed {name} and {} of theirs",
                count_label(removed, "transaction")
            );
        }
        Command::Members => print_members(&household.config().load()?),
        Command::Add {
            member,
            amount,
            description,
            category,
            date,
        } => {
            let config = household.config().load()?;
            let member_id = resolve_member(&config, &member)?;
            let date = match date {
                Some(date) => parse_date(&date)?,
                None => clock.today(),
            };
            let builder = Transaction::build(member_id, amount, date, &description)
                .category(Category::from(category));

            let transaction = household.add_transaction(builder, clock.now())?;
            println!(
                "Saved {} for {} on {} ({})",
                format_currency(transaction.amount),
                transaction.description,
                transaction.date,
                transaction.id
            );
        }
        Command::Delete { id } => {
            let transaction = household.delete_transaction(&TransactionId::new(&id))?;
            println!(
                "Deleted {} for {} on {}",
                format_currency(transaction.amount),
                transaction.description,
                transaction.date
            );
        }
        Command::List => print_transactions(&household.dashboard()?),
        Command::Summary => print_summary(&household.dashboard()?),
        Command::Stats => {
            let stats = household.storage_stats()?;
            println!("Buckets:      {}", stats.bucket_count);
            println!("Transactions: {}", stats.transaction_count);
            match (stats.oldest_date, stats.newest_date) {
                (Some(oldest), Some(newest)) => println!("Dates:        {oldest} to {newest}"),
                _ => println!("Dates:        none"),
            }
        }
        Command::Sweep { watch: false } => {
            match household.sweeper().sweep(clock.today(), clock.now())? {
                SweepOutcome::Swept(summary) => print_sweep_summary(&summary),
                SweepOutcome::NothingStale => {
                    println!("Nothing older than {RETENTION_DAYS} days to clean up")
                }
                SweepOutcome::Busy => println!("A cleanup is already running"),
            }
        }
        Command::Sweep { watch: true } => watch_sweeps(&household, clock).await?,
        Command::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(clock.today())));
            fs::write(&path, export(&household)?.to_json()?)?;
            println!("Data exported to {}", path.display());
        }
        Command::Import { path, replace } => {
            let backup = Export::from_json(&fs::read_to_string(&path)?)?;
            let imported = if replace {
                import_replacing(&household, backup, clock.now())?
            } else {
                import(&household, backup)?
            };
            println!("Imported {}", count_label(imported, "transaction"));
            sweep_expired(&household, &clock)?;
        }
        Command::Clear { yes: false } => {
            return Err("refusing to delete all data without --yes".into());
        }
        Command::Clear { yes: true } => {
            household.clear_all(clock.now())?;
            println!("All data cleared!");
        }
    }

    Ok(())
}

/// Run the retention sweep that happens every time the data is opened or restored.
fn sweep_expired(household: &Household, clock: &LocalClock) -> Result<(), Box<dyn Error>> {
    if let SweepOutcome::Swept(summary) = household.sweeper().sweep(clock.today(), clock.now())? {
        print_sweep_summary(&summary);
    }

    Ok(())
}

/// Sweep now and then once a day, printing each cleanup, until ctrl+c is pressed.
async fn watch_sweeps(household: &Household, clock: LocalClock) -> Result<(), Box<dyn Error>> {
    let (summary_sender, mut summaries) = mpsc::unbounded_channel();
    let sweeper = Arc::new(household.sweeper());
    let sweep_task = tokio::spawn(run_sweeper(
        sweeper,
        IntervalTicker::default(),
        clock,
        summary_sender,
    ));

    println!("Cleaning up daily, press ctrl+c to stop");
    loop {
        tokio::select! {
            Some(summary) = summaries.recv() => print_sweep_summary(&summary),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    sweep_task.abort();
    if let Err(error) = sweep_task.await
        && !error.is_cancelled()
    {
        return Err(error.into());
    }

    Ok(())
}

/// Find a member by ID, or failing that by name ignoring case.
fn resolve_member(config: &Configuration, member: &str) -> Result<MemberId, Box<dyn Error>> {
    let member_id = MemberId::new(member.trim());
    if config.member(&member_id).is_some() {
        return Ok(member_id);
    }

    let name = MemberName::new_unchecked(member.trim());
    config
        .members
        .iter()
        .find(|candidate| candidate.name.matches(&name))
        .map(|candidate| candidate.id.clone())
        .ok_or_else(|| household_budget::Error::UnknownMember(member.to_owned()).into())
}

fn print_sweep_summary(summary: &SweepSummary) {
    println!(
        "Auto-cleanup: Removed {} older than {} from {}",
        count_label(summary.deleted_transaction_count, "old transaction"),
        summary.cutoff,
        count_label(summary.deleted_bucket_count, "day")
    );
}

fn print_members(config: &Configuration) {
    if config.members.is_empty() {
        println!("No members yet. Add one with `budget add-member <name>`.");
        return;
    }

    println!("{}", count_label(config.members.len(), "member"));
    for member in &config.members {
        println!("  {:<20} {}", member.name, member.id);
    }
}

fn print_summary(dashboard: &Dashboard) {
    let totals = &dashboard.totals;

    println!("Budget:    {}", format_currency(totals.budget));
    println!(
        "Spent:     {} ({})",
        format_currency(totals.total_spent),
        count_label(totals.transaction_count, "transaction")
    );
    println!(
        "Remaining: {} ({:.0}% available)",
        format_currency(totals.total_remaining),
        totals.remaining_percentage
    );
    println!(
        "Progress:  {:.1}% [{}] {}",
        totals.percentage,
        progress_bar(dashboard.progress),
        dashboard.status
    );

    if !dashboard.members.is_empty() {
        println!();
        println!("Members");
        for member in &dashboard.members {
            println!(
                "  {:<20} {:>14}  {}",
                member.name,
                format_currency(member.amount),
                count_label(member.count, "transaction")
            );
        }
    }

    if !dashboard.categories.is_empty() {
        println!();
        println!("Categories");
        for category in &dashboard.categories {
            println!(
                "  {:<20} {:>14}  {}",
                category.category,
                format_currency(category.amount),
                count_label(category.count, "transaction")
            );
        }
    }
}

fn progress_bar(progress: f64) -> String {
    const WIDTH: usize = 20;
    let filled = ((progress / 100.0) * WIDTH as f64).round().clamp(0.0, WIDTH as f64) as usize;

    format!("{}{}", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

fn print_transactions(dashboard: &Dashboard) {
    if dashboard.transactions.is_empty() {
        println!("No transactions yet. Add one with `budget add`.");
        return;
    }

    for row in &dashboard.transactions {
        println!(
            "{}  {:<14} {:<14} {:>14}  {}  [{}]",
            row.date,
            row.member_name,
            row.category,
            format_currency(row.amount),
            row.description,
            row.id
        );
    }
}
