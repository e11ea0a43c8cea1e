use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::table::{Cell, Table};
use crate::models::clean::{extra_columns, CLEAN_COLUMNS};
use crate::models::CleanRecord;
use crate::utils::constants::*;

/// Daily mean of all measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMean {
    pub day: NaiveDate,
    pub mean_value: f64,
}

/// Mean value of one monitoring zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMean {
    pub zone: String,
    pub mean_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollutantCount {
    pub pollutant: String,
    pub measurements: usize,
}

/// Descriptive statistics of one monitoring zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: String,
    pub mean_value: f64,
    pub median_value: f64,
    /// Sample standard deviation, undefined for a single measurement
    pub std_dev: Option<f64>,
    pub min_value: f64,
    pub max_value: f64,
    pub measurements: usize,
    pub pollutant_count: usize,
    /// Organization of the first record seen for the zone
    pub organization: String,
}

/// Zone summaries rolled up per monitoring organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub organization: String,
    pub zone_count: usize,
    pub mean_value: f64,
    pub max_value: f64,
    pub measurements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominanceRow {
    pub zone: String,
    /// Mean per pollutant, aligned with `DominancePivot::pollutants`
    pub means: Vec<Option<f64>>,
    pub dominant_pollutant: String,
    pub dominant_value: f64,
}

/// Zones × pollutants matrix of mean values with the dominant pollutant per zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DominancePivot {
    pub pollutants: Vec<String>,
    pub rows: Vec<DominanceRow>,
}

impl DominancePivot {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, zone: &str) -> Option<&DominanceRow> {
        self.rows.iter().find(|r| r.zone == zone)
    }

    pub fn mean(&self, zone: &str, pollutant: &str) -> Option<f64> {
        let column = self.pollutants.iter().position(|p| p == pollutant)?;
        self.row(zone).and_then(|r| r.means[column])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Per (zone, organization) statistics with best-effort coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneLocation {
    pub zone: String,
    pub organization: String,
    pub mean_value: f64,
    pub measurements: usize,
    pub pollutant_count: usize,
    pub position: Option<GeoPosition>,
}

impl ZoneLocation {
    pub fn is_located(&self) -> bool {
        self.position.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub total_records: usize,
    pub pollutant_count: usize,
    pub zone_count: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

impl DatasetOverview {
    pub fn summary(&self) -> String {
        let period = match (self.first_year, self.last_year) {
            (Some(first), Some(last)) => format!("{} - {}", first, last),
            _ => "n/a".to_string(),
        };

        format!(
            "Dataset Overview:\n\
            - Measurements: {}\n\
            - Pollutants: {}\n\
            - Zones (ZAS): {}\n\
            - Period: {}",
            self.total_records, self.pollutant_count, self.zone_count, period
        )
    }
}

/// The aggregate tables computed up front for the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    pub timeseries: Vec<DailyMean>,
    pub by_region: Vec<ZoneMean>,
    pub by_pollutant: Vec<PollutantCount>,
}

impl TableSet {
    pub fn table(&self, name: &str) -> Option<Table> {
        match name {
            TABLE_TIMESERIES => Some(timeseries_table(&self.timeseries)),
            TABLE_BY_REGION => Some(by_region_table(&self.by_region)),
            TABLE_BY_POLLUTANT => Some(by_pollutant_table(&self.by_pollutant)),
            _ => None,
        }
    }
}

/// The clean record set as a table; pass-through columns follow the fixed
/// ones in sorted order
pub fn cleaned_table(records: &[CleanRecord]) -> Table {
    let extras = extra_columns(records);
    let columns: Vec<&str> = CLEAN_COLUMNS
        .iter()
        .copied()
        .chain(extras.iter().map(|(_, name)| name.as_str()))
        .collect();

    let mut table = Table::new(TABLE_CLEANED, &columns);
    for r in records {
        let mut row = vec![
            Cell::text(&r.source),
            Cell::from(r.start),
            Cell::from(r.end),
            Cell::text(&r.pollutant),
            Cell::Float(r.value),
            Cell::from(r.value_normalized),
            Cell::text(&r.zone),
            Cell::text(&r.organization),
            Cell::from(r.department.as_deref()),
            Cell::text(&r.implantation),
            Cell::text(&r.influence),
            Cell::from(r.year.map(i64::from)),
            Cell::from(r.month.map(i64::from)),
            Cell::from(r.day),
            Cell::from(r.hour.map(i64::from)),
            Cell::text(r.season.as_str()),
        ];
        row.extend(
            extras
                .iter()
                .map(|(header, _)| Cell::from(r.extra.get(header).map(String::as_str))),
        );
        table.push_row(row);
    }
    table
}

pub fn timeseries_table(rows: &[DailyMean]) -> Table {
    let mut table = Table::new(TABLE_TIMESERIES, &["day", "mean_value"]);
    for r in rows {
        table.push_row(vec![Cell::Date(r.day), Cell::Float(r.mean_value)]);
    }
    table
}

pub fn by_region_table(rows: &[ZoneMean]) -> Table {
    let mut table = Table::new(TABLE_BY_REGION, &["zone", "mean_value"]);
    for r in rows {
        table.push_row(vec![Cell::text(&r.zone), Cell::Float(r.mean_value)]);
    }
    table
}

pub fn by_pollutant_table(rows: &[PollutantCount]) -> Table {
    let mut table = Table::new(TABLE_BY_POLLUTANT, &["pollutant", "measurements"]);
    for r in rows {
        table.push_row(vec![
            Cell::text(&r.pollutant),
            Cell::Int(r.measurements as i64),
        ]);
    }
    table
}

pub fn zone_summary_table(rows: &[ZoneSummary]) -> Table {
    let mut table = Table::new(
        TABLE_ZONE_SUMMARY,
        &[
            "zone",
            "mean_value",
            "median_value",
            "std_dev",
            "min_value",
            "max_value",
            "measurements",
            "pollutant_count",
            "organization",
        ],
    );
    for r in rows {
        table.push_row(vec![
            Cell::text(&r.zone),
            Cell::Float(r.mean_value),
            Cell::Float(r.median_value),
            Cell::from(r.std_dev),
            Cell::Float(r.min_value),
            Cell::Float(r.max_value),
            Cell::Int(r.measurements as i64),
            Cell::Int(r.pollutant_count as i64),
            Cell::text(&r.organization),
        ]);
    }
    table
}

pub fn organizations_table(rows: &[OrganizationSummary]) -> Table {
    let mut table = Table::new(
        TABLE_ORGANIZATIONS,
        &[
            "organization",
            "zone_count",
            "mean_value",
            "max_value",
            "measurements",
        ],
    );
    for r in rows {
        table.push_row(vec![
            Cell::text(&r.organization),
            Cell::Int(r.zone_count as i64),
            Cell::Float(r.mean_value),
            Cell::Float(r.max_value),
            Cell::Int(r.measurements as i64),
        ]);
    }
    table
}

pub fn dominance_table(pivot: &DominancePivot) -> Table {
    let mut columns = vec!["zone".to_string()];
    columns.extend(pivot.pollutants.iter().cloned());
    columns.push("dominant_pollutant".to_string());
    columns.push("dominant_value".to_string());

    let mut table = Table::with_columns(TABLE_DOMINANCE, columns);
    for r in &pivot.rows {
        let mut row = vec![Cell::text(&r.zone)];
        row.extend(r.means.iter().map(|m| Cell::from(*m)));
        row.push(Cell::text(&r.dominant_pollutant));
        row.push(Cell::Float(r.dominant_value));
        table.push_row(row);
    }
    table
}

pub fn locations_table(rows: &[ZoneLocation]) -> Table {
    let mut table = Table::new(
        TABLE_LOCATIONS,
        &[
            "zone",
            "organization",
            "mean_value",
            "measurements",
            "pollutant_count",
            "latitude",
            "longitude",
        ],
    );
    for r in rows {
        table.push_row(vec![
            Cell::text(&r.zone),
            Cell::text(&r.organization),
            Cell::Float(r.mean_value),
            Cell::Int(r.measurements as i64),
            Cell::Int(r.pollutant_count as i64),
            Cell::from(r.position.map(|p| p.latitude)),
            Cell::from(r.position.map(|p| p.longitude)),
        ]);
    }
    table
}
