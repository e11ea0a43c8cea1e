use crate::models::CleanRecord;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Selection of clean records by pollutant, zones and day range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pollutant: Option<String>,
    zones: BTreeSet<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pollutant(mut self, pollutant: &str) -> Self {
        self.pollutant = Some(pollutant.trim().to_uppercase());
        self
    }

    /// Restrict to the given zones; an empty set keeps every zone
    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.zones = zones
            .into_iter()
            .map(|z| z.as_ref().trim().to_uppercase())
            .collect();
        self
    }

    /// Inclusive day range; either bound may be open
    pub fn with_days(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, record: &CleanRecord) -> bool {
        if let Some(pollutant) = &self.pollutant {
            if &record.pollutant != pollutant {
                return false;
            }
        }

        if !self.zones.is_empty() && !self.zones.contains(&record.zone) {
            return false;
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        match record.day {
            Some(day) => {
                self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
            }
            None => false,
        }
    }

    pub fn apply(&self, records: &[CleanRecord]) -> Vec<CleanRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Distinct pollutants, sorted
pub fn pollutant_options(records: &[CleanRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.pollutant.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct zones where `pollutant` was measured, sorted
pub fn zone_options(records: &[CleanRecord], pollutant: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.pollutant == pollutant)
        .map(|r| r.zone.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct measurement days, sorted
pub fn available_days(records: &[CleanRecord]) -> Vec<NaiveDate> {
    records
        .iter()
        .filter_map(|r| r.day)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
