use anyhow::{Context, Result};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::args::{Cli, Commands};
use crate::error::ProcessingError;
use crate::processors::{location_coverage, named_table, Aggregator, Pipeline, RecordFilter};
use crate::settings::Settings;
use crate::utils::constants::{TABLE_LOCATIONS, TABLE_NAMES};
use crate::utils::filename::generate_default_export_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ExportFormat, ParquetWriter, TableWriter};

/// Logs go to stderr so table output on stdout stays machine-readable
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // A subscriber may already be installed (tests); keep the existing one
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Process {
            no_cache,
            compression,
            quiet,
        } => {
            if no_cache {
                settings.cache_enabled = false;
            }
            if let Some(compression) = compression {
                settings.compression = compression;
            }

            println!("Processing air-quality snapshots...");
            println!("Snapshot files: {}", settings.snapshot_files.len());
            if settings.cache_enabled {
                println!("Cache file: {}", settings.cache_path().display());
            }

            let pipeline = Pipeline::from_settings(&settings)?;
            let progress = ProgressReporter::new(
                pipeline.snapshot_paths().len() as u64,
                "Loading snapshots...",
                quiet,
            );

            let data = pipeline
                .run(Some(&progress))
                .context("Failed to prepare air-quality data")?;

            progress.finish_with_message(&format!("Prepared {} records", data.cleaned.len()));

            println!("\n{}", data.report.summary());
            println!("{}", Aggregator::new().overview(&data.cleaned).summary());

            if !data.tables.by_pollutant.is_empty() {
                println!("\nMeasurements per pollutant:");
                for row in &data.tables.by_pollutant {
                    println!("  {:<10} {}", row.pollutant, row.measurements);
                }
            }

            println!("\nProcessing complete!");
        }

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
            if !TABLE_NAMES.contains(&name.as_str()) {
                return Err(ProcessingError::UnknownTable(name)).with_context(|| {
                    format!("Available tables: {}", TABLE_NAMES.join(", "))
                });
            }

            // Tables are read-only views; never rewrite the cache here
            settings.cache_enabled = false;
            let data = Pipeline::from_settings(&settings)?
                .run(None)
                .context("Failed to prepare air-quality data")?;

            let mut filter = RecordFilter::new().with_zones(&zones).with_days(from, to);
            if let Some(pollutant) = &pollutant {
                filter = filter.with_pollutant(pollutant);
            }

            let aggregator = Aggregator::new();
            let table = if filter.is_empty() {
                data.table(&name)
            } else {
                named_table(&aggregator, &filter.apply(&data.cleaned), &name)
            }
            .ok_or_else(|| ProcessingError::UnknownTable(name.clone()))?;

            let format = ExportFormat::from(format);
            let writer = TableWriter::new(format);
            let destination = match (output, export) {
                (Some(path), _) => Some(path),
                (None, true) => Some(generate_default_export_filename(&name, format)),
                (None, false) => None,
            };

            match destination {
                Some(path) => {
                    writer
                        .write_file(&table, &path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {} rows to {}", table.len(), path.display());
                }
                None => writer.write_to(&table, io::stdout().lock())?,
            }

            if name == TABLE_LOCATIONS {
                let filtered = filter.apply(&data.cleaned);
                let (located, total) = location_coverage(&aggregator.zone_locations(&filtered));
                let share = if total > 0 {
                    100.0 * located as f64 / total as f64
                } else {
                    0.0
                };
                eprintln!("{} zones located out of {} ({:.1}%)", located, total, share);
            }
        }

        Commands::Info { file } => {
            println!("Analyzing Parquet file: {}", file.display());

            let file_info = ParquetWriter::new()
                .get_file_info(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            println!("\n{}", file_info.summary());
            if file_info.row_group_sizes.len() > 1 {
                println!("Row group sizes: {:?}", file_info.row_group_sizes);
            }
        }
    }

    Ok(())
}
