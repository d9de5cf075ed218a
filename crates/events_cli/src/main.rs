//! Command-line front end over `events_core`.
//!
//! # Responsibility
//! - Map subcommands onto `EventService` operations.
//! - Print results as JSON for scripting.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use events_core::db::open_db;
use events_core::{
    init_logging, CoreConfig, Event, EventService, Logistics, Participant, Role,
    SqliteEventRepository, SqliteLogisticsRepository, SqliteParticipantRepository,
};
use log::info;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "events")]
#[command(about = "Manage events, participants and logistics")]
#[command(version)]
struct Cli {
    /// Event store file; overrides EVENTS_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an event
    CreateEvent {
        #[arg(long)]
        description: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },

    /// Register a participant
    AddParticipant {
        #[arg(long)]
        surname: String,
        #[arg(long)]
        given_name: String,
        /// organizer | guest | server | animator
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },

    /// Add a participant to an event
    Assign {
        /// Event description
        #[arg(long)]
        event: String,
        #[arg(long)]
        participant: Uuid,
    },

    /// Attach a logistics line item to an event
    AddLogistics {
        /// Event description
        #[arg(long)]
        event: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        unit_price: f64,
        #[arg(long)]
        quantity: i32,
        #[arg(long)]
        reserved: bool,
    },

    /// List reserved logistics of events overlapping a date window
    ReservedLogistics {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// Reserved-logistics cost of every event run by the reporting organizer
    CostReport,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CoreConfig::from_env().context("failed to read configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)
            .map_err(|err| anyhow!("failed to start logging: {err}"))?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let service = EventService::new(
        SqliteEventRepository::new(&conn),
        SqliteParticipantRepository::new(&conn),
        SqliteLogisticsRepository::new(&conn),
    );
    info!(
        "event=cli_command module=cli status=start core_version={}",
        events_core::core_version()
    );

    let output = match cli.command {
        Command::CreateEvent {
            description,
            start,
            end,
        } => serde_json::to_value(service.create_event(&Event::new(description, start, end))?)?,
        Command::AddParticipant {
            surname,
            given_name,
            role,
        } => {
            let participant = Participant::new(surname, given_name, role);
            serde_json::to_value(service.add_participant(&participant)?)?
        }
        Command::Assign { event, participant } => {
            let target = service.event_by_description(&event)?;
            serde_json::to_value(service.add_affect_event_participant(target, participant)?)?
        }
        Command::AddLogistics {
            event,
            description,
            unit_price,
            quantity,
            reserved,
        } => {
            let item = Logistics::new(description, unit_price, quantity).reserved(reserved);
            serde_json::to_value(service.add_affect_logistics(item, &event)?)?
        }
        Command::ReservedLogistics { from, to } => {
            serde_json::to_value(service.get_logistics_dates(from, to)?)?
        }
        Command::CostReport => serde_json::to_value(service.calculate_cost()?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::parse(value).ok_or_else(|| {
        format!("unknown role `{value}`; expected organizer|guest|server|animator")
    })
}
