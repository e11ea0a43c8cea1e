use crate::models::{CleanRecord, RawRecord, Season};
use crate::processors::report::{CacheOutcome, CleaningReport};
use crate::processors::ZoneOrganizationResolver;
use crate::utils::constants::{DATE_FORMATS, DROPPED_COLUMNS, TIMESTAMP_FORMATS, UNKNOWN};
use crate::utils::stats;
use crate::writers::RecordCache;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Turns raw snapshot records into the clean record set.
///
/// Order of operations: timestamps and derived calendar fields, categorical
/// normalization, metadata column removal, value/pollutant filter, sentinel
/// imputation, season, organization and department resolution, full-row
/// de-duplication, global z-score, optional cache write.
pub struct Cleaner {
    resolver: ZoneOrganizationResolver,
    cache: Option<Box<dyn RecordCache>>,
}

impl Cleaner {
    pub fn new() -> Self {
        Self {
            resolver: ZoneOrganizationResolver::new(),
            cache: None,
        }
    }

    /// Persist every cleaned set through `cache`
    pub fn with_cache(mut self, cache: Box<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn clean(&self, raw: Vec<RawRecord>) -> (Vec<CleanRecord>, CleaningReport) {
        let mut report = CleaningReport {
            input_records: raw.len(),
            ..CleaningReport::default()
        };

        let mut records: Vec<CleanRecord> = raw
            .into_iter()
            .filter_map(|r| self.clean_record(r, &mut report))
            .collect();

        let resolution = self.resolver.resolve(&mut records);
        report.organizations_filled = resolution.organizations_filled;

        let before = records.len();
        let records = drop_duplicates(records);
        report.duplicates_removed = before - records.len();
        report.unmapped_departments = records.iter().filter(|r| !r.has_department()).count();

        let mut records = records;
        let (mean, std) = normalize_values(&mut records);
        report.corpus_mean = mean;
        report.corpus_std = std;
        report.clean_records = records.len();

        if let Some(cache) = &self.cache {
            report.cache = match cache.store(&records) {
                Ok(()) => CacheOutcome::Written(cache.location()),
                Err(e) => {
                    warn!(location = %cache.location(), error = %e, "clean record cache not written");
                    CacheOutcome::Failed(e.to_string())
                }
            };
        }

        info!(
            input = report.input_records,
            clean = report.clean_records,
            dropped_missing_value = report.missing_values,
            duplicates = report.duplicates_removed,
            "cleaned monitoring records"
        );
        (records, report)
    }

    fn clean_record(&self, raw: RawRecord, report: &mut CleaningReport) -> Option<CleanRecord> {
        let start = raw.start.as_deref().and_then(parse_timestamp);
        if raw.start.is_some() && start.is_none() {
            report.invalid_start_timestamps += 1;
        }
        let end = raw.end.as_deref().and_then(parse_timestamp);
        if raw.end.is_some() && end.is_none() {
            report.invalid_end_timestamps += 1;
        }

        let mut extra = raw.extra;
        extra.retain(|column, _| !is_dropped_column(column));

        let Some(value) = raw.value.as_deref().and_then(parse_value) else {
            report.missing_values += 1;
            return None;
        };
        let Some(pollutant) = raw.pollutant.as_deref().and_then(normalize_category) else {
            report.missing_pollutants += 1;
            return None;
        };

        let month = start.map(|ts| ts.month());

        Some(CleanRecord {
            source: raw.source,
            start,
            end,
            pollutant,
            value,
            value_normalized: None,
            zone: impute(raw.zone.as_deref()),
            organization: impute(raw.organization.as_deref()),
            department: None,
            implantation: impute(raw.implantation.as_deref()),
            influence: impute(raw.influence.as_deref()),
            year: start.map(|ts| ts.year()),
            month,
            day: start.map(|ts| ts.date()),
            hour: start.map(|ts| ts.hour()),
            season: Season::from_month(month),
            extra,
        })
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a feed timestamp; anything unrecognised is treated as missing
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a measured value; decimal commas are accepted, non-finite values are missing
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Trimmed, upper-cased category; `None` when nothing is left
pub fn normalize_category(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

fn impute(raw: Option<&str>) -> String {
    raw.and_then(normalize_category)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn is_dropped_column(column: &str) -> bool {
    let column = column.trim().to_lowercase();
    DROPPED_COLUMNS.contains(&column.as_str())
}

/// Keep the first occurrence of every full row, preserving order
fn drop_duplicates(records: Vec<CleanRecord>) -> Vec<CleanRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.row_key()))
        .collect()
}

/// Global z-score over the whole corpus. Returns the mean and standard
/// deviation used, the latter `None` when undefined or zero.
fn normalize_values(records: &mut [CleanRecord]) -> (Option<f64>, Option<f64>) {
    let values: Vec<f64> = records.iter().map(|r| r.value).collect();
    let mean = stats::mean(&values);
    let std = stats::sample_std(&values).filter(|s| *s > 0.0 && s.is_finite());

    for record in records.iter_mut() {
        record.value_normalized = match (mean, std) {
            (Some(m), Some(s)) => Some((record.value - m) / s),
            _ => None,
        };
    }

    debug!(?mean, ?std, "normalized values");
    (mean, std)
}
