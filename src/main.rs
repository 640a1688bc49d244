// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use split_ledger::{
    format_amount, parse_amount, parse_split_inputs, write_group_csv, Config, Entity,
    ExpenseDraft, ExpenseId, ExpenseTracker, History, HistorySide, SettleOutcome, SplitMode, SqliteStore,
};
use std::env;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
Usage: split-ledger [command] [args]

Commands:
  ui                                       Terminal UI (default)
  groups                                   List groups
  create-group <name>                      Create a group with you as first member
  members <group>                          List members
  add-member <group> <name>                Add a member
  expenses <group>                         List the expense log
  add-expense <group> <payer> <total> [equal|exact|percent] [name=value ...]
  preview <group> <payer> <total> [equal|exact|percent] [name=value ...]
  paid <group> <expense-id> [person]       Mark an obligation paid (person defaults to you)
  balances <group>                         You owe / you are owed
  history <group>                          Outstanding items by counterparty
  export <group> [file.csv]                Export split lines as CSV (stdout if no file)
  events <expense-id>                      Audit trail for an expense

Environment: SPLIT_LEDGER_DB, SPLIT_LEDGER_VIEWER, SPLIT_LEDGER_CURRENCY, SPLIT_LEDGER_RESET, RUST_LOG";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let interactive = args.is_empty() || args[0] == "ui";

    init_logging(interactive);

    if matches!(args.first().map(String::as_str), Some("help" | "-h" | "--help")) {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::from_env()?;
    let store = SqliteStore::open(&config.db_path)?;
    let tracker = ExpenseTracker::new(store, config.viewer.clone());
    if config.reset_on_start {
        tracker.reset()?;
    }

    if interactive {
        run_ui_mode(tracker, &config)
    } else {
        run_command(&tracker, &config, &args[0], &args[1..])
    }
}

/// Logs go to stderr. The TUI only logs when RUST_LOG is set explicitly,
/// otherwise the alternate screen would be overwritten.
fn init_logging(interactive: bool) {
    if interactive && env::var("RUST_LOG").is_err() {
        return;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "split_ledger=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run_command(
    tracker: &ExpenseTracker<SqliteStore>,
    config: &Config,
    command: &str,
    args: &[String],
) -> Result<()> {
    let money = |value: f64| format_amount(&config.currency_symbol, value);

    match command {
        "groups" => {
            for name in tracker.group_names()? {
                println!("{}", name);
            }
        }
        "create-group" => {
            let name = arg(args, 0, "group name")?;
            let group = tracker.create_group(name)?;
            println!("✓ Created group '{}'", group.name());
        }
        "members" => {
            let group = tracker.group(arg(args, 0, "group")?)?;
            for member in group.members() {
                let you = if *member == config.viewer { " (You)" } else { "" };
                println!("{}{}", member, you);
            }
        }
        "add-member" => {
            let group = arg(args, 0, "group")?;
            let member = tracker.add_member(group, arg(args, 1, "member name")?)?;
            println!("✓ Added {} to {}", member, group);
        }
        "expenses" => {
            let group = tracker.group(arg(args, 0, "group")?)?;
            if group.expenses().is_empty() {
                println!("No expenses yet");
            }
            for expense in group.expenses() {
                println!(
                    "#{}  {}  {} paid {}",
                    expense.id(),
                    expense.date().with_timezone(&Local).format("%d/%m/%Y %H:%M"),
                    expense.paid_by(),
                    money(expense.total())
                );
                for (person, amount) in expense.splits() {
                    let status = if expense.is_settled(person) { "paid" } else { "owes" };
                    println!("    {} {} {}", person, status, money(*amount));
                }
                println!("    {} keeps {}", expense.paid_by(), money(expense.payer_share()));
                if expense.splits().is_empty() {
                    continue;
                }
                if expense.is_fully_settled() {
                    println!("    ✓ settled");
                } else {
                    println!("    outstanding {}", money(expense.outstanding_total()));
                }
            }
        }
        "add-expense" | "preview" => {
            let group = arg(args, 0, "group")?;
            let draft = parse_draft(&args[1..])?;

            if command == "preview" {
                let preview = tracker.preview(group, &draft)?;
                for row in &preview.rows {
                    let percent = row.percent.map(|p| format!(" ({:.2}%)", p)).unwrap_or_default();
                    let payer = if row.is_payer { " [payer]" } else { "" };
                    println!("{}{}: {}{}", row.member, payer, money(row.amount), percent);
                }
                return Ok(());
            }

            let expense = tracker.add_expense(group, &draft)?;
            println!(
                "✓ Expense #{} added: {} paid {} ({} split)",
                expense.id(),
                expense.paid_by(),
                money(expense.total()),
                draft.mode
            );
            for (person, amount) in expense.splits() {
                println!("    {} owes {}", person, money(*amount));
            }
        }
        "paid" => {
            let group = arg(args, 0, "group")?;
            let id: ExpenseId = arg(args, 1, "expense id")?
                .parse()
                .context("Expense id must be a number")?;
            let person = args.get(2).map(String::as_str).unwrap_or(&config.viewer);

            match tracker.mark_paid(group, id, person)? {
                SettleOutcome::Settled => println!("✓ {} marked paid on #{}", person, id),
                SettleOutcome::AlreadySettled => println!("{} already paid on #{}", person, id),
                SettleOutcome::ExpenseNotFound => println!("No expense #{} (nothing changed)", id),
                SettleOutcome::NotOwed => println!("{} owes nothing on #{}", person, id),
            }
        }
        "balances" => {
            let summary = tracker.balances(arg(args, 0, "group")?)?;
            println!("You owe:       {}", money(summary.you_owe));
            for (creditor, amount) in &summary.you_owe_to {
                println!("    to {}: {}", creditor, money(*amount));
            }
            println!("You are owed:  {}", money(summary.you_are_owed));
            for (debtor, amount) in &summary.owed_to_you {
                println!("    from {}: {}", debtor, money(*amount));
            }
            let net = summary.net();
            let sign = if net < 0.0 { "-" } else { "" };
            println!("Net:           {}{}", sign, money(net.abs()));
        }
        "history" => {
            let history = tracker.history(arg(args, 0, "group")?)?;
            print_history(&history, &money);
        }
        "export" => {
            let group = tracker.group(arg(args, 0, "group")?)?;
            let rows = match args.get(1) {
                Some(path) => {
                    let file = File::create(Path::new(path))
                        .with_context(|| format!("Failed to create {}", path))?;
                    let rows = write_group_csv(&group, file)?;
                    eprintln!("✓ Exported {} rows to {}", rows, path);
                    rows
                }
                None => write_group_csv(&group, io::stdout().lock())?,
            };
            if rows == 0 {
                eprintln!("Nothing to export");
            }
        }
        "events" => {
            let id: ExpenseId = arg(args, 0, "expense id")?
                .parse()
                .context("Expense id must be a number")?;
            let events = tracker.store().events_for(Entity::Expense, &id.to_string())?;
            if events.is_empty() {
                println!("No events for #{}", id);
            }
            for event in events {
                println!(
                    "{}  {}  by {}  {}",
                    event.timestamp.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S"),
                    event.kind,
                    event.actor,
                    event.data
                );
            }
        }
        other => {
            eprintln!("{}", USAGE);
            bail!("Unknown command: {}", other);
        }
    }

    Ok(())
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("Missing argument: <{}>", name))
}

/// `<payer> <total> [mode] [name=value ...]`
fn parse_draft(args: &[String]) -> Result<ExpenseDraft> {
    let paid_by = arg(args, 0, "payer")?.to_string();
    let total = parse_amount(arg(args, 1, "total")?)?;

    let mode = match args.get(2) {
        Some(raw) => raw.parse::<SplitMode>().map_err(anyhow::Error::msg)?,
        None => SplitMode::Equal,
    };

    let mut raw_inputs = Vec::new();
    for pair in args.iter().skip(3) {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected name=value, got '{}'", pair))?;
        raw_inputs.push((name.trim(), value));
    }
    if !mode.takes_inputs() && !raw_inputs.is_empty() {
        bail!("{} split takes no per-member inputs", mode);
    }

    Ok(ExpenseDraft {
        total,
        paid_by,
        mode,
        inputs: parse_split_inputs(raw_inputs)?,
    })
}

fn print_history(history: &History, money: &dyn Fn(f64) -> String) {
    if history.is_empty() {
        println!("All settled up");
        return;
    }

    for side in [HistorySide::YouOwe, HistorySide::OwesYou] {
        let entries = history.side(side);
        if entries.is_empty() {
            continue;
        }
        println!("{}:", side.title());
        for entry in entries {
            println!("  {}  {}", entry.counterparty, money(entry.total));
            for item in &entry.items {
                println!(
                    "      #{}  {}  {}",
                    item.expense_id,
                    item.date.with_timezone(&Local).format("%d/%m/%Y %H:%M"),
                    money(item.amount)
                );
            }
        }
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(tracker: ExpenseTracker<SqliteStore>, config: &Config) -> Result<()> {
    let mut app = ui::App::new(tracker, config.currency_symbol.clone())?;
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_tracker: ExpenseTracker<SqliteStore>, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a command: split-ledger help");
    std::process::exit(1);
}
