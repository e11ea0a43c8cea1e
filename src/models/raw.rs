use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::constants::MISSING_MARKERS;

/// One unvalidated measurement as read from a snapshot file.
///
/// Every field is kept as text; `None` means the cell was empty or held a
/// missing marker. Columns the pipeline does not interpret are carried in
/// `extra`, keyed by their header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub source: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub pollutant: Option<String>,
    pub value: Option<String>,
    pub zone: Option<String>,
    pub organization: Option<String>,
    pub implantation: Option<String>,
    pub influence: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_pollutant(mut self, pollutant: &str) -> Self {
        self.pollutant = cell(pollutant);
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = cell(value);
        self
    }

    pub fn with_zone(mut self, zone: &str) -> Self {
        self.zone = cell(zone);
        self
    }

    pub fn with_organization(mut self, organization: &str) -> Self {
        self.organization = cell(organization);
        self
    }

    pub fn with_start(mut self, start: &str) -> Self {
        self.start = cell(start);
        self
    }

    pub fn with_end(mut self, end: &str) -> Self {
        self.end = cell(end);
        self
    }

    pub fn with_implantation(mut self, implantation: &str) -> Self {
        self.implantation = cell(implantation);
        self
    }

    pub fn with_influence(mut self, influence: &str) -> Self {
        self.influence = cell(influence);
        self
    }

    pub fn with_extra(mut self, column: &str, value: &str) -> Self {
        if let Some(value) = cell(value) {
            self.extra.insert(column.to_string(), value);
        }
        self
    }
}

/// Turn a raw cell into `None` when it holds a missing marker
pub fn cell(raw: &str) -> Option<String> {
    if is_missing(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_MARKERS.contains(&trimmed)
}
