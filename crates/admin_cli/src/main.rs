use std::{error::Error, io::Write};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use csv::Writer;
use engine::{
    CabinClass, DepositCmd, Engine, EntryKind, JournalFilter, Money, NewFlightCmd, PostingPoint,
    Pricing, SeatPoolCmd,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "booking_admin")]
#[command(about = "Admin utilities for the booking settlement engine")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./booking.db?mode=rwc"
    )]
    database_url: String,

    /// When settlement entries are posted (`payment` or `issuance`).
    #[arg(long, env = "BOOKING_POSTING_POINT", default_value = "payment")]
    posting_point: PostingPoint,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Accounts(Accounts),
    Agent(Agent),
    Flight(Flight),
    Booking(Booking),
    Ledger(Ledger),
    Journal(Journal),
    Reports(Reports),
}

#[derive(Args, Debug)]
struct Accounts {
    #[command(subcommand)]
    command: AccountsCommand,
}

#[derive(Subcommand, Debug)]
enum AccountsCommand {
    /// Chart of accounts with stored balances.
    List,
}

#[derive(Args, Debug)]
struct Agent {
    #[command(subcommand)]
    command: AgentCommand,
}

#[derive(Subcommand, Debug)]
enum AgentCommand {
    /// Top up an agent wallet.
    Deposit(AgentDepositArgs),
    Balance(AgentBalanceArgs),
}

#[derive(Args, Debug)]
struct AgentDepositArgs {
    #[arg(long)]
    agent: String,
    /// Decimal amount, e.g. `500` or `500.25`.
    #[arg(long)]
    amount: Money,
    /// Makes retries of the same deposit safe.
    #[arg(long)]
    idempotency_key: Option<String>,
}

#[derive(Args, Debug)]
struct AgentBalanceArgs {
    #[arg(long)]
    agent: String,
}

#[derive(Args, Debug)]
struct Flight {
    #[command(subcommand)]
    command: FlightCommand,
}

#[derive(Subcommand, Debug)]
enum FlightCommand {
    Create(FlightCreateArgs),
    /// Set the seats (and optionally pricing) of one cabin class.
    Seats(FlightSeatsArgs),
}

#[derive(Args, Debug)]
struct FlightCreateArgs {
    #[arg(long)]
    airline: String,
    #[arg(long)]
    airline_name: Option<String>,
    #[arg(long)]
    number: String,
    #[arg(long)]
    origin: String,
    #[arg(long)]
    destination: String,
    /// RFC3339 departure time.
    #[arg(long)]
    departure: DateTime<Utc>,
    #[arg(long)]
    selling: Money,
    #[arg(long)]
    cost: Money,
    #[arg(long, default_value = "0")]
    commission: Money,
}

#[derive(Args, Debug)]
struct FlightSeatsArgs {
    #[arg(long)]
    flight: Uuid,
    #[arg(long, default_value = "economy")]
    class: CabinClass,
    #[arg(long)]
    seats: i32,
    #[arg(long, requires = "cost")]
    selling: Option<Money>,
    #[arg(long, requires = "selling")]
    cost: Option<Money>,
    #[arg(long)]
    commission: Option<Money>,
}

#[derive(Args, Debug)]
struct Booking {
    #[command(subcommand)]
    command: BookingCommand,
}

#[derive(Subcommand, Debug)]
enum BookingCommand {
    Show(BookingRefArgs),
    Cancel(BookingCancelArgs),
}

#[derive(Args, Debug)]
struct BookingRefArgs {
    #[arg(long)]
    reference: String,
}

#[derive(Args, Debug)]
struct BookingCancelArgs {
    #[arg(long)]
    reference: String,
    #[arg(long)]
    reason: Option<String>,
}

#[derive(Args, Debug)]
struct Ledger {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Rebuild balances from the journal and report (and repair) drift.
    Verify,
}

#[derive(Args, Debug)]
struct Journal {
    #[command(subcommand)]
    command: JournalCommand,
}

#[derive(Subcommand, Debug)]
enum JournalCommand {
    /// Write journal lines as CSV (stdout when `--out` is absent).
    Export(JournalExportArgs),
}

#[derive(Args, Debug)]
struct JournalExportArgs {
    /// Inclusive, RFC3339.
    #[arg(long)]
    from: Option<DateTime<Utc>>,
    /// Exclusive, RFC3339.
    #[arg(long)]
    to: Option<DateTime<Utc>>,
    #[arg(long)]
    kind: Option<String>,
    #[arg(long)]
    out: Option<std::path::PathBuf>,
}

#[derive(Args, Debug)]
struct Reports {
    #[command(subcommand)]
    command: ReportsCommand,
}

#[derive(Subcommand, Debug)]
enum ReportsCommand {
    Daily {
        /// Defaults to today (UTC).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Monthly {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    BalanceSheet,
}

#[derive(Serialize)]
struct ExportRow {
    entry_id: String,
    occurred_at: String,
    kind: &'static str,
    reference: Option<String>,
    description: String,
    account_code: String,
    debit_minor: i64,
    credit_minor: i64,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn export_journal(
    engine: &Engine,
    args: JournalExportArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let kind = args.kind.as_deref().map(EntryKind::try_from).transpose()?;
    let entries = engine
        .journal_entries(JournalFilter {
            from: args.from,
            to: args.to,
            kind,
            ..JournalFilter::default()
        })
        .await?;

    let mut writer = Writer::from_writer(vec![]);
    let mut rows = 0usize;
    for entry in entries {
        for line in entry.lines {
            writer.serialize(ExportRow {
                entry_id: entry.id.to_string(),
                occurred_at: entry.occurred_at.to_rfc3339(),
                kind: entry.kind.as_str(),
                reference: entry.reference.clone(),
                description: entry.description.clone(),
                account_code: line.account_code,
                debit_minor: line.debit_minor,
                credit_minor: line.credit_minor,
            })?;
            rows += 1;
        }
    }
    let data = writer.into_inner().map_err(|err| err.to_string())?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, data)?;
            eprintln!("exported {rows} lines to {}", path.display());
        }
        None => std::io::stdout().write_all(&data)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .posting_point(cli.posting_point)
        .build()
        .await?;

    match cli.command {
        Command::Accounts(Accounts {
            command: AccountsCommand::List,
        }) => {
            for account in engine.accounts().await? {
                println!(
                    "{:<20} {:<10} {:>14}  {}",
                    account.code,
                    account.account_type.as_str(),
                    Money::new(account.balance_minor),
                    account.name
                );
            }
        }
        Command::Agent(Agent {
            command: AgentCommand::Deposit(args),
        }) => {
            let mut cmd =
                DepositCmd::new(args.agent.as_str(), args.amount.minor()).created_by("admin");
            if let Some(key) = args.idempotency_key {
                cmd = cmd.idempotency_key(key);
            }
            let entry_id = engine.deposit_agent_funds(cmd).await?;
            let balance = Money::new(engine.agent_balance(&args.agent).await?);
            println!(
                "deposited {} for {} ({entry_id}), balance {balance}",
                args.amount, args.agent
            );
        }
        Command::Agent(Agent {
            command: AgentCommand::Balance(args),
        }) => {
            println!("{}", Money::new(engine.agent_balance(&args.agent).await?));
        }
        Command::Flight(Flight {
            command: FlightCommand::Create(args),
        }) => {
            let mut cmd = NewFlightCmd::new(
                args.airline,
                args.number,
                args.departure,
                Pricing::new(
                    args.selling.minor(),
                    args.cost.minor(),
                    args.commission.minor(),
                ),
            )
            .route(args.origin, args.destination);
            if let Some(name) = args.airline_name {
                cmd = cmd.airline_name(name);
            }
            let flight_id = engine.new_flight(cmd).await?;
            println!("created flight: {flight_id}");
        }
        Command::Flight(Flight {
            command: FlightCommand::Seats(args),
        }) => {
            let mut cmd = SeatPoolCmd::new(args.flight, args.class, args.seats);
            if let (Some(selling), Some(cost)) = (args.selling, args.cost) {
                let commission = args.commission.unwrap_or(Money::ZERO);
                cmd = cmd.pricing(Pricing::new(selling.minor(), cost.minor(), commission.minor()));
            }
            let pool = engine.upsert_seat_pool(cmd).await?;
            println!(
                "{} {}: {} seats",
                pool.flight_id, pool.cabin_class, pool.seats_available
            );
        }
        Command::Booking(Booking {
            command: BookingCommand::Show(args),
        }) => {
            print_json(&engine.booking_by_reference(&args.reference).await?)?;
        }
        Command::Booking(Booking {
            command: BookingCommand::Cancel(args),
        }) => {
            let booking = engine.booking_by_reference(&args.reference).await?;
            let booking = engine
                .cancel_booking(booking.id, args.reason.as_deref())
                .await?;
            println!("cancelled {}", booking.reference);
        }
        Command::Ledger(Ledger {
            command: LedgerCommand::Verify,
        }) => {
            let drifts = engine.recompute_balances().await?;
            if drifts.is_empty() {
                println!("ledger consistent");
            } else {
                for drift in &drifts {
                    println!(
                        "{}: stored {} journal {} (repaired)",
                        drift.code,
                        Money::new(drift.stored_minor),
                        Money::new(drift.computed_minor)
                    );
                }
                std::process::exit(1);
            }
        }
        Command::Journal(Journal {
            command: JournalCommand::Export(args),
        }) => export_journal(&engine, args).await?,
        Command::Reports(Reports { command }) => match command {
            ReportsCommand::Daily { date } => {
                let date = date.unwrap_or_else(|| Utc::now().date_naive());
                print_json(&engine.daily_report(date).await?)?;
            }
            ReportsCommand::Monthly { year, month } => {
                print_json(&engine.monthly_report(year, month).await?)?;
            }
            ReportsCommand::BalanceSheet => print_json(&engine.balance_sheet().await?)?,
        },
    }

    Ok(())
}
