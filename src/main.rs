use clap::Parser;
use inquire::CustomType;
use prettytable::{format, Cell, Row, Table};
use chrono::Local;
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod calendar;
mod config;
mod error;
mod export;
mod rows;

use config::Config;
use rows::TimesheetRow;

// --- CLI Structure ---
#[derive(Parser)]
#[command(name = "monthsheet")]
#[command(about = "Generate a monthly timesheet with expected hours per week", long_about = None)]
struct Cli {
    /// Year to generate (defaults to the config file, then the current year)
    #[arg(short, long, allow_negative_numbers = true)]
    year: Option<i32>,

    /// Month to generate, 1-12 (defaults to the config file, then the current month)
    #[arg(short, long, allow_negative_numbers = true)]
    month: Option<i32>,

    /// JSON config file
    #[arg(short, long, env = "TIMESHEET_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory the spreadsheet is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Ask for year and month before generating
    #[arg(short, long)]
    interactive: bool,

    /// Skip the preview table
    #[arg(short, long)]
    quiet: bool,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Reads the .env file
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?.with_overrides(cli.year, cli.month);
    let (mut year, mut month) = config.target(Local::now().date_naive());
    if cli.interactive {
        (year, month) = prompt_target(year, month)?;
    }

    let (path, rows) = generate(&config, year, month, &cli.output_dir)?;

    if !cli.quiet {
        print_preview(&rows, year, month);
    }
    println!("File successfully generated: {}", path.display());
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// --- Pipeline ---
/// Resolves the month, builds one row per week and writes the sheet into `out_dir`.
fn generate(
    config: &Config,
    year: i32,
    month: i32,
    out_dir: &Path,
) -> error::Result<(PathBuf, Vec<TimesheetRow>)> {
    let (bounds, weeks) = calendar::resolve(year, month)?;
    let rows = rows::build_rows(&weeks, &bounds, config);

    let path = out_dir.join(config.output_file_name(year, month));
    info!(path = %path.display(), "generating timesheet");
    export::write(&rows, &path, config.file_format)?;
    Ok((path, rows))
}

fn prompt_target(year: i32, month: i32) -> anyhow::Result<(i32, i32)> {
    println!("\n--- Timesheet Period ---");
    let year = CustomType::<i32>::new("Year:").with_default(year).prompt()?;
    let month = CustomType::<i32>::new("Month (1-12):")
        .with_default(month)
        .prompt()?;
    Ok((year, month))
}

// --- Preview ---
fn print_preview(rows: &[TimesheetRow], year: i32, month: i32) {
    println!("\n--- Timesheet: {}-{:02} ---", year, month);
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        Cell::new("From"), Cell::new("To"), Cell::new("Client"),
        Cell::new("Project"), Cell::new("Hours"), Cell::new("Internal"),
    ]));

    let (mut project_total, mut internal_total) = (0.0, 0.0);
    for row in rows {
        project_total += row.project_hours;
        internal_total += row.internal_hours;
        table.add_row(Row::new(vec![
            Cell::new(&row.date_from),
            Cell::new(&row.date_to),
            Cell::new(&row.client),
            Cell::new(&row.project_name),
            Cell::new(&format_hours(row.project_hours)).style_spec("c"),
            Cell::new(&format_hours(row.internal_hours)).style_spec("c"),
        ]));
    }

    // --- THE TOTAL ROW ---
    table.add_row(Row::new(vec![
        Cell::new("TOTAL").style_spec("b"),
        Cell::new(""), Cell::new(""), Cell::new(""),
        Cell::new(&format_hours(project_total)).style_spec("bc"),
        Cell::new(&format_hours(internal_total)).style_spec("bc"),
    ]));

    table.printstd();
}

fn format_hours(h: f64) -> String {
    if h == 0.0 {
        "".to_string()
    } else {
        h.to_string()
    }
}
