use crate::error::Result;
use crate::models::tables::{
    cleaned_table, dominance_table, locations_table, organizations_table, zone_summary_table,
};
use crate::models::{CleanRecord, Table, TableSet};
use crate::processors::{Aggregator, Cleaner, CleaningReport};
use crate::readers::SnapshotReader;
use crate::settings::Settings;
use crate::utils::constants::*;
use crate::utils::ProgressReporter;
use crate::writers::{ParquetCache, ParquetWriter};
use std::path::PathBuf;
use tracing::info;

/// What the presentation layer receives after one load
pub struct PreparedData {
    pub cleaned: Vec<CleanRecord>,
    pub tables: TableSet,
    pub report: CleaningReport,
}

impl PreparedData {
    /// Any named table over the full clean record set; the precomputed ones
    /// are served as is
    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables
            .table(name)
            .or_else(|| named_table(&Aggregator::new(), &self.cleaned, name))
    }
}

/// Compute a named table over an arbitrary record slice
pub fn named_table(aggregator: &Aggregator, records: &[CleanRecord], name: &str) -> Option<Table> {
    match name {
        TABLE_CLEANED => Some(cleaned_table(records)),
        TABLE_TIMESERIES | TABLE_BY_REGION | TABLE_BY_POLLUTANT => {
            aggregator.build_tables(records).table(name)
        }
        TABLE_ZONE_SUMMARY => Some(zone_summary_table(&aggregator.zone_summary(records))),
        TABLE_DOMINANCE => Some(dominance_table(&aggregator.dominance(records))),
        TABLE_ORGANIZATIONS => {
            let zones = aggregator.zone_summary(records);
            Some(organizations_table(&aggregator.organization_summary(&zones)))
        }
        TABLE_LOCATIONS => Some(locations_table(&aggregator.zone_locations(records))),
        _ => None,
    }
}

/// Load → clean → aggregate
pub struct Pipeline {
    snapshot_paths: Vec<PathBuf>,
    reader: SnapshotReader,
    cleaner: Cleaner,
    aggregator: Aggregator,
}

impl Pipeline {
    pub fn new(snapshot_paths: Vec<PathBuf>) -> Self {
        Self {
            snapshot_paths,
            reader: SnapshotReader::new(),
            cleaner: Cleaner::new(),
            aggregator: Aggregator::new(),
        }
    }

    /// Build a pipeline from loaded settings, wiring the Parquet cache when enabled
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut cleaner = Cleaner::new();
        if settings.cache_enabled {
            let writer = ParquetWriter::new()
                .with_compression(&settings.compression)?
                .with_row_group_size(settings.row_group_size);
            cleaner = cleaner
                .with_cache(Box::new(ParquetCache::new(settings.cache_path()).with_writer(writer)));
        }

        Ok(Self::new(settings.snapshot_paths())
            .with_reader(SnapshotReader::new().with_mmap(settings.use_mmap))
            .with_cleaner(cleaner))
    }

    pub fn with_reader(mut self, reader: SnapshotReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_cleaner(mut self, cleaner: Cleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    pub fn snapshot_paths(&self) -> &[PathBuf] {
        &self.snapshot_paths
    }

    pub fn run(&self, progress: Option<&ProgressReporter>) -> Result<PreparedData> {
        let raw = self.reader.read_all(&self.snapshot_paths, progress)?;

        if let Some(p) = progress {
            p.set_message("Cleaning records...");
        }
        let (cleaned, report) = self.cleaner.clean(raw);

        if let Some(p) = progress {
            p.set_message("Building aggregate tables...");
        }
        let tables = self.aggregator.build_tables(&cleaned);

        info!(
            records = cleaned.len(),
            days = tables.timeseries.len(),
            zones = tables.by_region.len(),
            "prepared data"
        );
        Ok(PreparedData {
            cleaned,
            tables,
            report,
        })
    }
}
