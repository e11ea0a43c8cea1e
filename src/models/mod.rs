pub mod clean;
pub mod raw;
pub mod table;
pub mod tables;

pub use clean::{extra_columns, CleanRecord, RowKey, Season, CLEAN_COLUMNS};
pub use raw::RawRecord;
pub use table::{Cell, Table};
pub use tables::{
    DailyMean, DatasetOverview, DominancePivot, DominanceRow, GeoPosition, OrganizationSummary,
    PollutantCount, TableSet, ZoneLocation, ZoneMean, ZoneSummary,
};
