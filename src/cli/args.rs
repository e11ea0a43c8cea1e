use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::writers::ExportFormat;

#[derive(Parser)]
#[command(name = "airq")]
#[command(about = "French air-quality snapshot preparation and aggregation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: airq.toml when present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load, clean and aggregate the configured snapshots
    Process {
        #[arg(long, help = "Do not write the clean record cache")]
        no_cache: bool,

        #[arg(short = 'C', long, help = "Cache compression [default: from settings]")]
        compression: Option<String>,

        #[arg(long, help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Print or export one table computed over the filtered records
    Table {
        #[arg(help = "cleaned, timeseries, by_region, by_pollutant, zone_summary, dominance, organizations or locations")]
        name: String,

        #[arg(short, long)]
        pollutant: Option<String>,

        #[arg(short, long = "zone", help = "Monitoring zone, repeatable")]
        zones: Vec<String>,

        #[arg(long, help = "First day included (YYYY-MM-DD)")]
        from: Option<NaiveDate>,

        #[arg(long, help = "Last day included (YYYY-MM-DD)")]
        to: Option<NaiveDate>,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[arg(short, long, conflicts_with = "export", help = "Output file path")]
        output: Option<PathBuf>,

        #[arg(
            long,
            help = "Write to output/airq-{table}-{YYMMDD}.{ext} instead of stdout"
        )]
        export: bool,
    },

    /// Display information about a Parquet cache file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_table_arguments() {
        let cli = Cli::parse_from([
            "airq",
            "table",
            "dominance",
            "--pollutant",
            "no2",
            "--zone",
            "ZAG PARIS",
            "--zone",
            "ZAG LYON",
            "--from",
            "2024-10-14",
            "--format",
            "json",
        ]);

        match cli.command {
            Commands::Table {
                name,
                pollutant,
                zones,
                from,
                to,
                format,
                output,
                export,
            } => {
                assert_eq!(name, "dominance");
                assert_eq!(pollutant.as_deref(), Some("no2"));
                assert_eq!(zones, vec!["ZAG PARIS", "ZAG LYON"]);
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 10, 14));
                assert_eq!(to, None);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(output, None);
                assert!(!export);
            }
            _ => panic!("expected the table command"),
        }
    }
}
