use crate::models::{
    CleanRecord, DailyMean, DatasetOverview, DominancePivot, DominanceRow, OrganizationSummary,
    PollutantCount, TableSet, ZoneLocation, ZoneMean, ZoneSummary,
};
use crate::utils::stats;
use crate::utils::ZoneLocator;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Derived tables over a clean record slice.
///
/// Every operation accepts the full record set or any filtered subset and
/// returns an empty result for empty input.
pub struct Aggregator {
    locator: ZoneLocator,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            locator: ZoneLocator::new(),
        }
    }

    /// The tables computed once per load
    pub fn build_tables(&self, records: &[CleanRecord]) -> TableSet {
        let tables = TableSet {
            timeseries: self.daily_means(records),
            by_region: self.zone_means(records),
            by_pollutant: self.pollutant_counts(records),
        };
        debug!(
            days = tables.timeseries.len(),
            zones = tables.by_region.len(),
            pollutants = tables.by_pollutant.len(),
            "built aggregate tables"
        );
        tables
    }

    /// Mean value per calendar day; records without a day are skipped
    pub fn daily_means(&self, records: &[CleanRecord]) -> Vec<DailyMean> {
        let mut days: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
        for r in records {
            if let Some(day) = r.day {
                days.entry(day).or_default().push(r.value);
            }
        }

        days.into_iter()
            .map(|(day, acc)| DailyMean {
                day,
                mean_value: acc.mean(),
            })
            .collect()
    }

    /// Mean value per zone, sorted by zone
    pub fn zone_means(&self, records: &[CleanRecord]) -> Vec<ZoneMean> {
        let mut zones: BTreeMap<&str, Accumulator> = BTreeMap::new();
        for r in records {
            zones.entry(r.zone.as_str()).or_default().push(r.value);
        }

        zones
            .into_iter()
            .map(|(zone, acc)| ZoneMean {
                zone: zone.to_string(),
                mean_value: acc.mean(),
            })
            .collect()
    }

    /// Record count per pollutant, most measured first
    pub fn pollutant_counts(&self, records: &[CleanRecord]) -> Vec<PollutantCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for r in records {
            *counts.entry(r.pollutant.as_str()).or_insert(0) += 1;
        }

        let mut rows: Vec<PollutantCount> = counts
            .into_iter()
            .map(|(pollutant, measurements)| PollutantCount {
                pollutant: pollutant.to_string(),
                measurements,
            })
            .collect();
        // Stable sort keeps the name order among equal counts
        rows.sort_by(|a, b| b.measurements.cmp(&a.measurements));
        rows
    }

    /// Per-zone descriptive statistics, highest mean first
    pub fn zone_summary(&self, records: &[CleanRecord]) -> Vec<ZoneSummary> {
        struct ZoneGroup<'a> {
            values: Vec<f64>,
            pollutants: BTreeSet<&'a str>,
            organization: &'a str,
        }

        let mut zones: BTreeMap<&str, ZoneGroup> = BTreeMap::new();
        for r in records {
            let group = zones.entry(r.zone.as_str()).or_insert_with(|| ZoneGroup {
                values: Vec::new(),
                pollutants: BTreeSet::new(),
                organization: r.organization.as_str(),
            });
            group.values.push(r.value);
            group.pollutants.insert(r.pollutant.as_str());
        }

        let mut rows: Vec<ZoneSummary> = zones
            .into_iter()
            .filter_map(|(zone, group)| {
                Some(ZoneSummary {
                    zone: zone.to_string(),
                    mean_value: stats::mean(&group.values)?,
                    median_value: stats::median(&group.values)?,
                    std_dev: stats::sample_std(&group.values),
                    min_value: stats::min(&group.values)?,
                    max_value: stats::max(&group.values)?,
                    measurements: group.values.len(),
                    pollutant_count: group.pollutants.len(),
                    organization: group.organization.to_string(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.mean_value.total_cmp(&a.mean_value));
        rows
    }

    /// Zones × pollutants mean matrix with the dominant pollutant of each zone.
    ///
    /// Ties go to the pollutant that sorts first.
    pub fn dominance(&self, records: &[CleanRecord]) -> DominancePivot {
        let mut cells: BTreeMap<&str, BTreeMap<&str, Accumulator>> = BTreeMap::new();
        let mut pollutants: BTreeSet<&str> = BTreeSet::new();
        for r in records {
            cells
                .entry(r.zone.as_str())
                .or_default()
                .entry(r.pollutant.as_str())
                .or_default()
                .push(r.value);
            pollutants.insert(r.pollutant.as_str());
        }
        let pollutants: Vec<&str> = pollutants.into_iter().collect();

        let rows = cells
            .into_iter()
            .filter_map(|(zone, by_pollutant)| {
                let means: Vec<Option<f64>> = pollutants
                    .iter()
                    .map(|p| by_pollutant.get(p).map(Accumulator::mean))
                    .collect();

                let mut dominant: Option<(usize, f64)> = None;
                for (column, mean) in means.iter().enumerate() {
                    if let Some(mean) = *mean {
                        if dominant.map_or(true, |(_, best)| mean > best) {
                            dominant = Some((column, mean));
                        }
                    }
                }

                let (column, dominant_value) = dominant?;
                Some(DominanceRow {
                    zone: zone.to_string(),
                    means,
                    dominant_pollutant: pollutants[column].to_string(),
                    dominant_value,
                })
            })
            .collect();

        DominancePivot {
            pollutants: pollutants.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    /// Zone summaries rolled up by organization, highest mean first
    pub fn organization_summary(&self, zones: &[ZoneSummary]) -> Vec<OrganizationSummary> {
        let mut organizations: BTreeMap<&str, Vec<&ZoneSummary>> = BTreeMap::new();
        for z in zones {
            organizations.entry(z.organization.as_str()).or_default().push(z);
        }

        let mut rows: Vec<OrganizationSummary> = organizations
            .into_iter()
            .filter_map(|(organization, zones)| {
                let means: Vec<f64> = zones.iter().map(|z| z.mean_value).collect();
                Some(OrganizationSummary {
                    organization: organization.to_string(),
                    zone_count: zones.len(),
                    mean_value: stats::mean(&means)?,
                    max_value: stats::max(&means)?,
                    measurements: zones.iter().map(|z| z.measurements).sum(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.mean_value.total_cmp(&a.mean_value));
        rows
    }

    pub fn overview(&self, records: &[CleanRecord]) -> DatasetOverview {
        let pollutants: BTreeSet<&str> = records.iter().map(|r| r.pollutant.as_str()).collect();
        let zones: BTreeSet<&str> = records.iter().map(|r| r.zone.as_str()).collect();
        let years = records.iter().filter_map(|r| r.year);

        DatasetOverview {
            total_records: records.len(),
            pollutant_count: pollutants.len(),
            zone_count: zones.len(),
            first_year: years.clone().min(),
            last_year: years.max(),
        }
    }

    /// Per (zone, organization) statistics with best-effort coordinates
    pub fn zone_locations(&self, records: &[CleanRecord]) -> Vec<ZoneLocation> {
        let mut groups: BTreeMap<(&str, &str), (Accumulator, BTreeSet<&str>)> = BTreeMap::new();
        for r in records {
            let (acc, pollutants) = groups
                .entry((r.zone.as_str(), r.organization.as_str()))
                .or_default();
            acc.push(r.value);
            pollutants.insert(r.pollutant.as_str());
        }

        // A zone name is only geocoded once, however many organizations report it
        let mut positions = HashMap::new();
        groups
            .into_iter()
            .map(|((zone, organization), (acc, pollutants))| {
                let position = *positions
                    .entry(zone)
                    .or_insert_with(|| self.locator.locate(zone));
                ZoneLocation {
                    zone: zone.to_string(),
                    organization: organization.to_string(),
                    mean_value: acc.mean(),
                    measurements: acc.count,
                    pollutant_count: pollutants.len(),
                    position,
                }
            })
            .collect()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Located and total zone/organization pairs
pub fn location_coverage(locations: &[ZoneLocation]) -> (usize, usize) {
    let located = locations.iter().filter(|l| l.is_located()).count();
    (located, locations.len())
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}
