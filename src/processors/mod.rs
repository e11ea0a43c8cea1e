pub mod aggregator;
pub mod cleaner;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod resolver;

pub use aggregator::{location_coverage, Aggregator};
pub use cleaner::{normalize_category, parse_timestamp, parse_value, Cleaner};
pub use filter::{available_days, pollutant_options, zone_options, RecordFilter};
pub use pipeline::{named_table, Pipeline, PreparedData};
pub use report::{CacheOutcome, CleaningReport};
pub use resolver::{ResolutionStats, ZoneOrganizationResolver};
