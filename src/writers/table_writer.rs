use crate::error::{ProcessingError, Result};
use crate::models::Table;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ProcessingError::Config(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Writes generic tables as CSV or JSON
pub struct TableWriter {
    format: ExportFormat,
}

impl TableWriter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub fn write_to<W: Write>(&self, table: &Table, sink: W) -> Result<()> {
        match self.format {
            ExportFormat::Csv => self.write_csv(table, sink),
            ExportFormat::Json => self.write_json(table, sink),
        }
    }

    pub fn write_file(&self, table: &Table, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write_to(table, file)
    }

    fn write_csv<W: Write>(&self, table: &Table, sink: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);

        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|c| c.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json<W: Write>(&self, table: &Table, mut sink: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut sink, &table.to_json_rows())?;
        writeln!(sink)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use chrono::NaiveDate;

    fn timeseries() -> Table {
        let mut table = Table::new("timeseries", &["day", "mean_value"]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2021, 10, 14).unwrap()),
            Cell::Float(17.5),
        ]);
        table.push_row(vec![
            Cell::Date(NaiveDate::from_ymd_opt(2024, 10, 14).unwrap()),
            Cell::Null,
        ]);
        table
    }

    #[test]
    fn test_csv_export() -> Result<()> {
        let mut out = Vec::new();
        TableWriter::new(ExportFormat::Csv).write_to(&timeseries(), &mut out)?;

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "day,mean_value\n2021-10-14,17.5\n2024-10-14,\n");
        Ok(())
    }

    #[test]
    fn test_json_export() -> Result<()> {
        let mut out = Vec::new();
        TableWriter::new(ExportFormat::Json).write_to(&timeseries(), &mut out)?;

        let parsed: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(parsed[0]["day"], "2021-10-14");
        assert_eq!(parsed[0]["mean_value"], 17.5);
        assert!(parsed[1]["mean_value"].is_null());
        Ok(())
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap().extension(), "json");
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
