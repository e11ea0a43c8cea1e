use crate::writers::ExportFormat;
use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Generate default export filename with format: airq-{table}-{YYMMDD}.{ext}
pub fn generate_default_export_filename(table: &str, format: ExportFormat) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year

    let filename = format!(
        "airq-{}-{:02}{:02}{:02}.{}",
        table,
        year,
        now.month(),
        now.day(),
        format.extension()
    );
    PathBuf::from("output").join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_export_filename() {
        let filename = generate_default_export_filename("zone_summary", ExportFormat::Json);
        let filename_str = filename.to_string_lossy();

        let parts: Vec<&str> = filename_str.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "output");

        let file_part = parts[1];
        assert!(file_part.starts_with("airq-zone_summary-"));
        assert!(file_part.ends_with(".json"));
        // "airq-zone_summary-" + YYMMDD + ".json"
        assert_eq!(file_part.len(), 18 + 6 + 5);
    }

    #[test]
    fn test_extension_follows_format() {
        let filename = generate_default_export_filename("timeseries", ExportFormat::Csv);
        assert_eq!(filename.extension().unwrap(), "csv");
    }
}
