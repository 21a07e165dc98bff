// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use edu_roster::{
    load_roster_csv, parse_birth_date, temporal, Person, QualityEngine, Roster, RosterConfig,
    RosterError,
};

const USAGE: &str = "\
Usage: edu-roster [--config <file>] [--json] <command> <roster.csv> [args]

Commands:
  list      <csv>                      Show every registered person
  query     <csv> age <min> <max>      People aged min..=max
            <csv> exact-age <age>
            <csv> band <name>          Kinder, PreK, Primary, Secondary, University,
                                       OtherHigherEd, NotApplicable
            <csv> initial <letter>     Surname initial (case-insensitive)
            <csv> born <DD/MM/YYYY>
  project   <csv>                      Principal component projection summary
  quality   <csv>                      Declared level vs derived band checks
  ui        <csv>                      Interactive roster browser";

struct Options {
    config_path: Option<PathBuf>,
    json: bool,
    positional: Vec<String>,
}

fn parse_options(args: Vec<String>) -> Result<Options> {
    let mut options = Options {
        config_path: None,
        json: false,
        positional: Vec::new(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a file path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--json" => options.json = true,
            _ => options.positional.push(arg),
        }
    }

    Ok(options)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let options = parse_options(env::args().skip(1).collect())?;

    let (command, csv_path) = match options.positional.as_slice() {
        [command, csv, ..] => (command.as_str(), Path::new(csv)),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let config = match &options.config_path {
        Some(path) => RosterConfig::from_file(path)?,
        None => RosterConfig::default(),
    };

    let roster = load_roster(csv_path, config)?;
    let rest = &options.positional[2..];

    match command {
        "list" => run_list(&roster, options.json)?,
        "query" => run_query(&roster, rest)?,
        "project" => run_project(&roster, options.json)?,
        "quality" => run_quality(&roster),
        "ui" => run_ui_mode(roster)?,
        other => {
            eprintln!("❌ Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn load_roster(csv_path: &Path, config: RosterConfig) -> Result<Roster> {
    let roster = Roster::with_config(config)?;
    let report = load_roster_csv(csv_path, &roster)?;

    println!("📂 {}: {}", csv_path.display(), report.summary());
    for rejection in &report.rejected {
        println!("   ⚠️  line {}: {}", rejection.line, rejection.error);
    }

    Ok(roster)
}

fn print_people(title: &str, people: &[Person]) {
    if people.is_empty() {
        println!("\nNo people found {}.", title);
        return;
    }

    println!("\n--- People {} ---", title);
    for (i, person) in people.iter().enumerate() {
        println!("{}. {}", i + 1, person);
    }
}

fn run_list(roster: &Roster, json: bool) -> Result<()> {
    let people = roster.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&people)?);
        return Ok(());
    }

    print_people("registered", &people);
    Ok(())
}

fn query_arg(args: &[String], i: usize) -> Result<&str> {
    args.get(i)
        .map(String::as_str)
        .with_context(|| format!("missing query argument\n\n{}", USAGE))
}

fn run_query(roster: &Roster, args: &[String]) -> Result<()> {
    match lookup(roster, args) {
        Ok((title, people)) => print_people(&title, &people),
        Err(err) => println!("\n❌ {:#}", err),
    }

    Ok(())
}

/// Resolve a query to its title and matches. Bad arguments and rejected
/// lookups both come back as errors.
fn lookup(roster: &Roster, args: &[String]) -> Result<(String, Vec<Person>)> {
    let arg = |i: usize| query_arg(args, i);

    match arg(0)? {
        "age" => {
            let min: i64 = arg(1)?.parse().context("minimum age must be an integer")?;
            let max: i64 = arg(2)?.parse().context("maximum age must be an integer")?;
            Ok((
                format!("aged {} to {}", min, max),
                roster.find_by_age_range(min, max)?,
            ))
        }
        "exact-age" => {
            let age: u32 = arg(1)?.parse().context("age must be a non-negative integer")?;
            Ok((format!("aged {}", age), roster.find_by_exact_age(age)))
        }
        "band" => {
            let band = arg(1)?;
            Ok((format!("in band '{}'", band), roster.find_by_band(band)))
        }
        "initial" => {
            let letter = arg(1)?;
            Ok((
                format!("with surname initial '{}'", letter),
                roster.find_by_surname_initial(letter)?,
            ))
        }
        "born" => {
            let date = parse_birth_date(arg(1)?).map_err(RosterError::from)?;
            Ok((
                format!("born on {}", temporal::format_birth_date(date)),
                roster.find_by_birth_date(date),
            ))
        }
        other => bail!("unknown query '{}'\n\n{}", other, USAGE),
    }
}

fn run_project(roster: &Roster, json: bool) -> Result<()> {
    println!("\n--- Principal Component Analysis ---");

    let projection = match roster.project() {
        Ok(projection) => projection,
        Err(err) => {
            // Reported, not fatal
            println!("❌ {}", err);
            return Ok(());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
        return Ok(());
    }

    print!("{}", projection.summary());

    println!("\nProjected points:");
    for (label, point) in projection.labels.iter().zip(&projection.coordinates) {
        println!("  {:<40} {}", label, format_point(point));
    }
    println!(
        "\n★ Aggregate point: {}",
        format_point(&projection.aggregate_point)
    );
    for (band, centroid) in &projection.band_centroids {
        println!("◆ Centroid {}: {}", band, format_point(centroid));
    }

    Ok(())
}

fn format_point(point: &[f64]) -> String {
    let coords: Vec<String> = point.iter().map(|v| format!("{:>8.3}", v)).collect();
    format!("({})", coords.join(", "))
}

fn run_quality(roster: &Roster) {
    let engine = QualityEngine::new();
    let reports = engine.validate_batch(&roster.snapshot(), temporal::today());

    println!("\n--- Data Quality ---");
    for report in &reports {
        println!("{}", report.summary());
        for issue in &report.issues {
            println!("   {:?} [{}] {} → {}", issue.severity, issue.field, issue.issue, issue.recommendation);
        }
    }
    println!("\n{}", engine.batch_summary(&reports).summary());
}

#[cfg(feature = "tui")]
fn run_ui_mode(roster: Roster) -> Result<()> {
    println!("🖥️  Loading roster browser... (Press 'q' to quit)\n");

    let mut app = ui::App::new(roster);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_roster: Roster) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}

// ============================================================================
// TESTS
// ============================================================================
