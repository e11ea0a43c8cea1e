use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::models::RawRecord;
use crate::utils::constants::CANONICAL_TIMESTAMP_FORMAT;

/// Meteorological season derived from the measurement month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
    Unknown,
}

impl Season {
    pub fn from_month(month: Option<u32>) -> Self {
        match month {
            Some(12 | 1 | 2) => Season::Winter,
            Some(3..=5) => Season::Spring,
            Some(6..=8) => Season::Summer,
            Some(9..=11) => Season::Autumn,
            _ => Season::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "WINTER",
            Season::Spring => "SPRING",
            Season::Summer => "SUMMER",
            Season::Autumn => "AUTUMN",
            Season::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub source: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub pollutant: String,
    pub value: f64,
    pub value_normalized: Option<f64>,
    pub zone: String,
    pub organization: String,
    pub department: Option<String>,
    pub implantation: String,
    pub influence: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<NaiveDate>,
    pub hour: Option<u32>,
    pub season: Season,
    pub extra: BTreeMap<String, String>,
}

/// Identity of a record for full-row duplicate detection.
///
/// Covers every column the cleaner keeps except `value_normalized`, which is
/// computed after de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    source: String,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    pollutant: String,
    value_bits: u64,
    zone: String,
    organization: String,
    department: Option<String>,
    implantation: String,
    influence: String,
    extra: BTreeMap<String, String>,
}

impl CleanRecord {
    pub fn row_key(&self) -> RowKey {
        RowKey {
            source: self.source.clone(),
            start: self.start,
            end: self.end,
            pollutant: self.pollutant.clone(),
            // -0.0 and 0.0 compare equal as values, so they must hash equal too
            value_bits: if self.value == 0.0 {
                0.0f64.to_bits()
            } else {
                self.value.to_bits()
            },
            zone: self.zone.clone(),
            organization: self.organization.clone(),
            department: self.department.clone(),
            implantation: self.implantation.clone(),
            influence: self.influence.clone(),
            extra: self.extra.clone(),
        }
    }

    pub fn has_department(&self) -> bool {
        self.department.is_some()
    }

    /// Write the record back as raw text, so it can be fed to the cleaner again
    pub fn to_raw(&self) -> RawRecord {
        RawRecord {
            source: self.source.clone(),
            start: self
                .start
                .map(|ts| ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string()),
            end: self
                .end
                .map(|ts| ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string()),
            pollutant: Some(self.pollutant.clone()),
            value: Some(self.value.to_string()),
            zone: Some(self.zone.clone()),
            organization: Some(self.organization.clone()),
            implantation: Some(self.implantation.clone()),
            influence: Some(self.influence.clone()),
            extra: self.extra.clone(),
        }
    }
}

/// Fixed columns of a clean record, in output order
pub const CLEAN_COLUMNS: [&str; 16] = [
    "source",
    "start",
    "end",
    "pollutant",
    "value",
    "value_normalized",
    "zone",
    "organization",
    "department",
    "implantation",
    "influence",
    "year",
    "month",
    "day",
    "hour",
    "season",
];

/// Sorted pass-through headers of `records`, each paired with the output
/// column name it is written under.
///
/// A header that clashes with a fixed column (case-insensitively) is written
/// as `extra_<header>`.
pub fn extra_columns(records: &[CleanRecord]) -> Vec<(String, String)> {
    let headers: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extra.keys().map(String::as_str))
        .collect();

    let mut taken: HashSet<String> = CLEAN_COLUMNS
        .iter()
        .chain(headers.iter())
        .map(|name| name.to_lowercase())
        .collect();

    headers
        .into_iter()
        .map(|header| {
            let mut name = header.to_string();
            if CLEAN_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(header)) {
                name = format!("extra_{}", header);
                while taken.contains(&name.to_lowercase()) {
                    name = format!("extra_{}", name);
                }
                taken.insert(name.to_lowercase());
            }
            (header.to_string(), name)
        })
        .collect()
}
