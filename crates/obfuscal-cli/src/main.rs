//! `obfuscal` CLI: turn private calendars into a shareable free/busy calendar.
//!
//! ## Usage
//!
//! ```sh
//! # Obfuscate two calendars with the sections from a config file
//! obfuscal obfuscate -c obfuscal.toml -i work.ics -i personal.ics -o shared.ics
//!
//! # Override the config from flags (stdin → stdout)
//! cat work.ics | obfuscal obfuscate -c obfuscal.toml --start 2024-03-04 --end 2024-03-11
//!
//! # No config file at all
//! obfuscal obfuscate -i work.ics --timezone Europe/Berlin \
//!     --start 2024-03-04 --end 2024-03-11 --section 08:00-12:00 --section 13:00-18:00
//!
//! # JSON summary of a generated calendar
//! obfuscal summary -i shared.ics
//!
//! # Validate a config file
//! obfuscal check -c obfuscal.toml
//! ```
//!
//! Logs go to stderr. `RUST_LOG` selects the filter; `-v` raises the default
//! from `warn` to `debug`.

mod settings;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use obfuscal_engine::obfuscator::sections_in_period;
use obfuscal_engine::{
    assemble, parse_calendars, render, summarize_ics, FreeBusyType, InputCalendar,
    ObfuscationConfig, Obfuscator, TimeOfDaySlice,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings::{AppConfig, Overrides};

#[derive(Parser)]
#[command(
    name = "obfuscal",
    version,
    about = "Publish when you are busy, not what you are doing"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obfuscate calendars into free/busy blocks
    Obfuscate {
        #[command(flatten)]
        settings: SettingsArgs,
        /// Input .ics files (reads from stdin if omitted)
        #[arg(short, long)]
        input: Vec<PathBuf>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a JSON summary of a generated calendar
    Summary {
        /// Input .ics file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate settings and show the resulting section grid
    Check {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Target timezone (IANA name)
    #[arg(long)]
    timezone: Option<String>,
    /// First day of the timeframe (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day of the timeframe (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Daily section as HH:MM-HH:MM; repeat for more (replaces the config's list)
    #[arg(long = "section")]
    sections: Vec<TimeOfDaySlice>,
    /// FBTYPE of emitted blocks: free, busy, busy-tentative or busy-unavailable
    #[arg(long)]
    fbtype: Option<FreeBusyType>,
}

impl SettingsArgs {
    fn resolve(self) -> Result<ObfuscationConfig> {
        let overrides = Overrides {
            timezone: self.timezone,
            start: self.start,
            end: self.end,
            sections: self.sections,
            free_busy_type: self.fbtype,
        };
        AppConfig::load_or_default(self.config.as_deref())?
            .apply(overrides)
            .into_engine_config()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Obfuscate {
            settings,
            input,
            output,
        } => {
            let config = settings.resolve()?;
            let started = Instant::now();

            let calendars = read_calendars(&input)?;
            let obfuscator = Obfuscator::new(config)?;
            let result = obfuscator
                .obfuscate(&calendars)
                .context("Failed to obfuscate calendars")?;
            let ics = render(&assemble(&result, obfuscator.config(), Utc::now()));

            write_output(output.as_deref(), &ics)?;
            info!(
                calendars = calendars.len(),
                busy = result.busy.len(),
                shown = result.shown.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "obfuscated"
            );
        }
        Commands::Summary { input } => {
            let summary = match input.as_deref() {
                Some(path) => summarize_ics(BufReader::new(open(path)?)),
                None => summarize_ics(io::stdin().lock()),
            }
            .context("Failed to read generated calendar")?;
            let pretty = serde_json::to_string_pretty(&summary)?;
            write_output(None, &format!("{}\n", pretty))?;
        }
        Commands::Check { settings } => {
            let config = settings.resolve()?;
            println!("timezone:  {}", config.timezone.name());
            println!(
                "timeframe: {} to {} ({} days)",
                config.timeframe.start,
                config.timeframe.end,
                config.timeframe.days()
            );
            let sections: Vec<String> = config.sections.iter().map(ToString::to_string).collect();
            println!("sections:  {}", sections.join(", "));
            println!("fbtype:    {}", config.free_busy_type);
            println!("slots:     {}", sections_in_period(&config).len());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Parse every input file, or stdin when none are given.
fn read_calendars(paths: &[PathBuf]) -> Result<Vec<InputCalendar>> {
    if paths.is_empty() {
        return parse_calendars(io::stdin().lock()).context("Failed to parse calendar from stdin");
    }

    let mut calendars = Vec::new();
    for path in paths {
        let parsed = parse_calendars(BufReader::new(open(path)?))
            .with_context(|| format!("Failed to parse calendar: {}", path.display()))?;
        calendars.extend(parsed);
    }
    Ok(calendars)
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
