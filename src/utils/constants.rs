/// Default snapshot files, loaded in this order
pub const DEFAULT_SNAPSHOT_FILES: [&str; 5] = [
    "data/FR_E2_2021-10-14.csv",
    "data/FR_E2_2024-10-14.csv",
    "data/FR_E2_2025-04-14.csv",
    "data/FR_E2_2025-09-14.csv",
    "data/FR_E2_2025-10-14.csv",
];

/// Default location of the columnar cache of clean records
pub const DEFAULT_CACHE_FILE: &str = "data/data_clean.parquet";

/// Default settings file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "airq.toml";

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "AIRQ";

/// Snapshot field separator
pub const SNAPSHOT_DELIMITER: u8 = b';';

/// Sentinel for missing categorical values
pub const UNKNOWN: &str = "UNKNOWN";

/// Accepted headers per snapshot field, compared lower-cased and trimmed
pub const START_HEADERS: &[&str] = &["date de début", "date de debut", "start"];
pub const END_HEADERS: &[&str] = &["date de fin", "end"];
pub const POLLUTANT_HEADERS: &[&str] = &["polluant", "pollutant"];
pub const VALUE_HEADERS: &[&str] = &["valeur", "value"];
pub const ZONE_HEADERS: &[&str] = &["zas", "zone"];
pub const ORGANIZATION_HEADERS: &[&str] = &["organisme", "organization"];
pub const IMPLANTATION_HEADERS: &[&str] = &["type d'implantation", "implantation"];
pub const INFLUENCE_HEADERS: &[&str] = &["type d'influence", "influence"];

/// Feed metadata columns removed during cleaning
pub const DROPPED_COLUMNS: &[&str] = &[
    "discriminant",
    "taux de saisie",
    "couverture temporelle",
    "couverture de données",
];

/// Cell contents read as missing values
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A",
    "<NA>",
];

/// Timestamp layouts accepted for start/end fields, tried in order
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, read as midnight
pub const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];

/// Layout used when a clean timestamp is written back as text
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Names of the tables served to the presentation layer
pub const TABLE_CLEANED: &str = "cleaned";
pub const TABLE_TIMESERIES: &str = "timeseries";
pub const TABLE_BY_REGION: &str = "by_region";
pub const TABLE_BY_POLLUTANT: &str = "by_pollutant";
pub const TABLE_ZONE_SUMMARY: &str = "zone_summary";
pub const TABLE_DOMINANCE: &str = "dominance";
pub const TABLE_ORGANIZATIONS: &str = "organizations";
pub const TABLE_LOCATIONS: &str = "locations";

pub const TABLE_NAMES: [&str; 8] = [
    TABLE_CLEANED,
    TABLE_TIMESERIES,
    TABLE_BY_REGION,
    TABLE_BY_POLLUTANT,
    TABLE_ZONE_SUMMARY,
    TABLE_DOMINANCE,
    TABLE_ORGANIZATIONS,
    TABLE_LOCATIONS,
];

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

pub const COMPRESSIONS: [&str; 5] = [
    COMPRESSION_SNAPPY,
    COMPRESSION_GZIP,
    COMPRESSION_LZ4,
    COMPRESSION_ZSTD,
    COMPRESSION_NONE,
];
