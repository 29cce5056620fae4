use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod export;
mod indicators;
mod models;
mod report;
mod rollover;
mod store;
mod week;
mod workbook;

use models::Dataset;
use rollover::RollOutcome;

#[derive(Parser)]
#[command(name = "engagement-dataset")]
#[command(about = "Weekly customer engagement dataset builder", long_about = None)]
struct Cli {
    /// Directory holding the workbook and the generated json files
    #[arg(long, global = true, env = "ENGAGEMENT_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every weekly sheet of the workbook into customers.json
    Extract {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Copy the latest week into a new week with summaries cleared
    RollWeek {
        /// Sunday of the new week (YYYY-MM-DD); defaults to the next Sunday
        #[arg(long, value_parser = week::parse_week)]
        date: Option<chrono::NaiveDate>,
        /// Answer yes to every confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Show the structure of the workbook
    Inspect {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Generate a markdown report for one week
    Report {
        #[arg(long)]
        week: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export one week of customers to CSV
    Export {
        #[arg(long)]
        week: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;
    let dataset_path = data_dir.join(store::DATASET_FILE);
    let week_index_path = data_dir.join(store::WEEK_INDEX_FILE);

    match cli.command {
        Commands::Extract { input, output } => {
            let input = input.unwrap_or_else(|| data_dir.join(store::WORKBOOK_FILE));
            let output = output.unwrap_or(dataset_path);

            log::info!("Converting: {}", input.display());
            let summary = workbook::extract_to_files(&input, &output)?;
            for (sheet_name, week, count) in summary.sheets.iter() {
                println!("- {sheet_name} -> {week}: {count} customers");
            }

            println!(
                "Wrote {} records across {} weeks to {} ({} sheets skipped).",
                summary.dataset.total,
                summary.dataset.weeks().len(),
                output.display(),
                summary.skipped_sheets.len()
            );
        }
        Commands::RollWeek { date, yes } => {
            let outcome = rollover::roll_week_file(&dataset_path, &week_index_path, date, |prompt| {
                if yes {
                    return Ok(true);
                }
                dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .context("failed to read confirmation")
            })?;

            match outcome {
                RollOutcome::Cancelled => println!("Cancelled."),
                RollOutcome::Rolled(summary) => {
                    println!(
                        "Created week {} from {}: copied {} customers, summaries cleared.",
                        summary.new_week, summary.latest_week, summary.copied
                    );
                    if summary.replaced > 0 {
                        println!("Replaced {} existing records.", summary.replaced);
                    }
                    println!("Total records in dataset: {}.", summary.total);
                }
            }
        }
        Commands::Inspect { input, rows } => {
            let input = input.unwrap_or_else(|| data_dir.join(store::WORKBOOK_FILE));
            let previews = workbook::inspect_workbook(&input, rows)?;

            println!("Workbook {} has {} sheets.", input.display(), previews.len());
            for preview in previews {
                let week = preview.week.as_deref().unwrap_or("not a week");
                println!(
                    "- {} ({}) {} rows x {} columns",
                    preview.name, week, preview.height, preview.width
                );
                for (index, row) in preview.rows.iter().enumerate() {
                    println!("    row {}: {:?}", index + 1, row);
                }
            }
        }
        Commands::Report { week, out } => {
            let dataset = store::load_dataset(&dataset_path)?;
            let week = resolve_week(&dataset, week)?;
            let records: Vec<_> = dataset.records_for_week(&week).collect();
            std::fs::write(&out, report::build_report(&week, &records))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report for {week} written to {}.", out.display());
        }
        Commands::Export { week, out } => {
            let dataset = store::load_dataset(&dataset_path)?;
            let week = resolve_week(&dataset, week)?;
            let records: Vec<_> = dataset.records_for_week(&week).collect();
            let written = export::export_csv(&out, &records)?;
            println!("Exported {written} customers for {week} to {}.", out.display());
        }
    }

    Ok(())
}

fn resolve_week(dataset: &Dataset, week: Option<String>) -> anyhow::Result<String> {
    match week {
        Some(week) if dataset.records_for_week(&week).next().is_some() => Ok(week),
        Some(week) => anyhow::bail!("week {week} not found in data"),
        None => dataset
            .latest_week()
            .context("no weeks found in data"),
    }
}
