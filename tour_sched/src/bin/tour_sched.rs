use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tour_sched::calendar;
use tour_sched::db::{connection::connect_sqlite, migrate};
use tour_sched::error::SchedError;
use tour_sched::fixture;
use tour_sched::models::DaySchedule;
use tour_sched::sched;

#[derive(Parser)]
#[command(version, about = "Tour resource scheduling CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Seed an agency roster from a TOML fixture file.
    Seed {
        #[arg(long, value_name = "FILE")]
        file: String,
        /// Parse and normalize only; write nothing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the derived day-by-day calendar.
    Calendar {
        /// Derive from a stored tour's anchors.
        #[arg(long, conflicts_with_all = ["arrival", "departure"])]
        tour: Option<i32>,
        /// Ad-hoc arrival anchor (RFC3339 or YYYY-MM-DD).
        #[arg(long, requires = "departure")]
        arrival: Option<String>,
        /// Ad-hoc departure anchor.
        #[arg(long, requires = "arrival")]
        departure: Option<String>,
    },
    /// Run the conflict pre-check for a plan file without writing anything.
    Check {
        #[arg(long)]
        tour: i32,
        /// JSON array of day schedules.
        #[arg(long, value_name = "FILE")]
        file: String,
    },
    /// Save a plan file as the tour's schedule and reconcile occupations.
    Save {
        #[arg(long)]
        tour: i32,
        #[arg(long, value_name = "FILE")]
        file: String,
    },
    /// Print a tour's schedule view.
    Show {
        #[arg(long)]
        tour: i32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Seed { file, dry_run } => {
            let fix = fixture::load_fixture_path(&file)?;
            if dry_run {
                println!("{}", toml::to_string_pretty(&fix)?);
                return Ok(());
            }
            let mut conn = open_db()?;
            let report = fixture::apply_fixture(&mut conn, &fix)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Cmd::Calendar {
            tour,
            arrival,
            departure,
        } => {
            let cal = match (tour, arrival, departure) {
                (Some(tour_id), _, _) => {
                    let mut conn = open_db()?;
                    let tour = tour_sched::repo::get_tour(&mut conn, tour_id)?;
                    calendar::tour_calendar(&tour)?
                }
                (None, Some(arr), Some(dep)) => calendar::derive_calendar(
                    calendar::anchor_date(&arr)?,
                    calendar::anchor_date(&dep)?,
                )?,
                _ => anyhow::bail!("pass either --tour or both --arrival and --departure"),
            };
            println!("{}", serde_json::to_string_pretty(&cal)?);
        }
        Cmd::Check { tour, file } => {
            let days = read_plan(&file)?;
            let mut conn = open_db()?;
            let row = tour_sched::repo::get_tour(&mut conn, tour)?;
            let cal = calendar::tour_calendar(&row)?;
            let pairs = sched::conflict::pairs_from_schedule(&cal, &days);
            let conflicts = sched::conflict::check_conflicts(&mut conn, tour, &pairs)?;
            println!("{}", serde_json::to_string_pretty(&conflicts)?);
            if !conflicts.is_empty() {
                std::process::exit(1);
            }
        }
        Cmd::Save { tour, file } => {
            let days = read_plan(&file)?;
            let mut conn = open_db()?;
            match sched::save_schedule(&mut conn, tour, days) {
                Ok(saved) => {
                    if !saved.occupations_reconciled {
                        eprintln!("warning: occupation index not reconciled (see logs)");
                    }
                    println!("saved {} day(s) for tour {}", saved.days.len(), saved.tour_id);
                }
                Err(SchedError::HardConflict(conflicts)) => {
                    eprintln!("{}", serde_json::to_string_pretty(&conflicts)?);
                    anyhow::bail!("{} hard conflict(s); nothing was written", conflicts.len());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Cmd::Show { tour } => {
            let mut conn = open_db()?;
            let view = sched::read::get_schedule(&mut conn, tour)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn open_db() -> Result<diesel::SqliteConnection> {
    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    migrate::run_sqlite(&db_url)?;
    connect_sqlite(&db_url)
}

fn read_plan(path: &str) -> Result<Vec<DaySchedule>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read plan file {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parse plan file {path}"))
}
