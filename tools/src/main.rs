//! roster-runner: headless grid resolver for the shift roster engine.
//!
//! Usage:
//!   roster-runner --data roster.json --location CENTRO --job-title Cajero \
//!                 --period 2026-08 --from 2026-08-01 --to 2026-08-31
//!   roster-runner --data roster.json ... --json

use anyhow::Result;
use chrono::NaiveDate;
use roster_core::{
    assembler,
    dataset::RosterDataset,
    model::{DateRange, ScheduleScope},
    store::RosterStore,
};
use std::env;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    grid: &'a assembler::ScheduleGrid,
    locked: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data = str_arg(&args, "--data", "./roster.json");
    let db = str_arg(&args, "--db", ":memory:");
    let location = str_arg(&args, "--location", "CENTRO");
    let job_title = str_arg(&args, "--job-title", "Cajero");
    let period = str_arg(&args, "--period", "2026-08");
    let from: NaiveDate = parse_arg(&args, "--from", "2026-08-01")?;
    let to: NaiveDate = parse_arg(&args, "--to", "2026-08-31")?;
    let as_json = args.iter().any(|a| a == "--json");
    for flag in unknown_flags(&args) {
        log::warn!("Unknown flag {flag} ignored");
    }

    let store = if db == ":memory:" {
        RosterStore::in_memory()?
    } else {
        RosterStore::open(db)?
    };
    store.migrate()?;

    let dataset = RosterDataset::load(data)?;
    dataset.seed(&store)?;

    let scope = ScheduleScope {
        location:  location.to_string(),
        job_title: job_title.to_string(),
        period_id: period.to_string(),
    };
    let range = DateRange::new(from, to);

    let snapshot = store.load_snapshot()?;
    let grid = assembler::build_grid(&snapshot, &scope, &range)?;

    if as_json {
        let out = JsonOutput {
            locked: grid.is_locked(),
            grid: &grid,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_grid(&grid);
    Ok(())
}

fn print_grid(grid: &assembler::ScheduleGrid) {
    println!("=== ROSTER GRID ===");
    println!("  scope:   {}/{}", grid.scope.location, grid.scope.job_title);
    println!("  period:  {}", grid.scope.period_id);
    println!(
        "  range:   {} .. {} ({} days)",
        grid.range.starts_on,
        grid.range.ends_on,
        grid.days.len()
    );
    println!(
        "  state:   {}",
        match &grid.lock {
            Some(s) => format!("APPROVED by {} at {}", s.approved_by, s.approved_at),
            None => "DRAFT".to_string(),
        }
    );
    println!();

    // Header: day-of-month per column.
    let mut header = format!("{:<22}", "collaborator");
    for day in &grid.days {
        header.push_str(&format!("{:>5}", day.format("%d")));
    }
    println!("{header}");

    for row in &grid.rows {
        let mut line = format!("{:<22}", truncate(&row.name, 21));
        for cell in &row.cells {
            match cell {
                Some(c) => line.push_str(&format!("{:>5}", truncate(&c.shift_code, 4))),
                None => line.push_str(&format!("{:>5}", "-")),
            }
        }
        println!("{line}");
    }

    println!();
    println!("=== STAFFING SUMMARY ===");
    for day in &grid.summary.days {
        let actual: Vec<String> = day
            .actual
            .iter()
            .map(|(code, n)| format!("{code}:{n}"))
            .collect();
        let targets: Vec<String> = day
            .targets
            .iter()
            .map(|(code, n)| format!("{code}:{n}"))
            .collect();
        println!(
            "  {}  actual [{}]  target [{}]",
            day.date,
            actual.join(" "),
            targets.join(" ")
        );
    }
    println!();
    println!("  complete:        {}", grid.summary.complete);
    if !grid.summary.missing_work_shifts.is_empty() {
        println!(
            "  missing shifts:  {}",
            grid.summary.missing_work_shifts.join(", ")
        );
    }
    if grid.summary.recommended_headcount > 0 {
        println!(
            "  recommended headcount: {} (under-resourced: {})",
            grid.summary.recommended_headcount, grid.summary.under_resourced
        );
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

const KNOWN_FLAGS: &[&str] = &[
    "--data",
    "--db",
    "--location",
    "--job-title",
    "--period",
    "--from",
    "--to",
    "--json",
];

fn unknown_flags(args: &[String]) -> Vec<&str> {
    args.iter()
        .skip(1)
        .filter(|a| a.starts_with("--") && !KNOWN_FLAGS.contains(&a.as_str()))
        .map(|a| a.as_str())
        .collect()
}

fn str_arg<'a>(args: &'a [String], flag: &str, default: &'a str) -> &'a str {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .unwrap_or(default)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = str_arg(args, flag, default);
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid value for {flag}: {e}"))
}
