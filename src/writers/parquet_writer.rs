use crate::error::{ProcessingError, Result};
use crate::models::{extra_columns, CleanRecord};
use crate::utils::constants::{DEFAULT_BATCH_SIZE, DEFAULT_ROW_GROUP_SIZE};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
    batch_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Write clean records to a Parquet file at `path`
    pub fn write_records(&self, records: &[CleanRecord], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_records_to(records, file)
    }

    /// Write clean records in batches to any writer.
    ///
    /// Pass-through columns become nullable text columns named after their
    /// source header, in sorted order; a header clashing with a fixed column
    /// is written as `extra_<header>`.
    pub fn write_records_to<W: Write + Send>(&self, records: &[CleanRecord], sink: W) -> Result<()> {
        let extra_columns = extra_columns(records);

        let schema = self.create_schema(&extra_columns);
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(sink, schema.clone(), Some(props))?;
        for chunk in records.chunks(self.batch_size) {
            let batch = self.records_to_batch(chunk, &extra_columns, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        Ok(())
    }

    /// Create Arrow schema for clean records
    fn create_schema(&self, extra_columns: &[(String, String)]) -> Arc<Schema> {
        let timestamp = DataType::Timestamp(TimeUnit::Microsecond, None);
        let mut fields = vec![
            Field::new("source", DataType::Utf8, false),
            Field::new("start", timestamp.clone(), true),
            Field::new("end", timestamp, true),
            Field::new("pollutant", DataType::Utf8, false),
            Field::new("value", DataType::Float64, false),
            Field::new("value_normalized", DataType::Float64, true),
            Field::new("zone", DataType::Utf8, false),
            Field::new("organization", DataType::Utf8, false),
            Field::new("department", DataType::Utf8, true),
            Field::new("implantation", DataType::Utf8, false),
            Field::new("influence", DataType::Utf8, false),
            Field::new("year", DataType::Int32, true),
            Field::new("month", DataType::Int32, true),
            Field::new("day", DataType::Date32, true),
            Field::new("hour", DataType::Int32, true),
            Field::new("season", DataType::Utf8, false),
        ];
        fields.extend(
            extra_columns
                .iter()
                .map(|(_, name)| Field::new(name.as_str(), DataType::Utf8, true)),
        );

        Arc::new(Schema::new(fields))
    }

    /// Convert records to Arrow RecordBatch
    fn records_to_batch(
        &self,
        records: &[CleanRecord],
        extra_columns: &[(String, String)],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let sources: Vec<&str> = records.iter().map(|r| r.source.as_str()).collect();
        let starts: Vec<Option<i64>> = records.iter().map(|r| r.start.map(to_micros)).collect();
        let ends: Vec<Option<i64>> = records.iter().map(|r| r.end.map(to_micros)).collect();
        let pollutants: Vec<&str> = records.iter().map(|r| r.pollutant.as_str()).collect();
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        let normalized: Vec<Option<f64>> = records.iter().map(|r| r.value_normalized).collect();
        let zones: Vec<&str> = records.iter().map(|r| r.zone.as_str()).collect();
        let organizations: Vec<&str> = records.iter().map(|r| r.organization.as_str()).collect();
        let departments: Vec<Option<&str>> =
            records.iter().map(|r| r.department.as_deref()).collect();
        let implantations: Vec<&str> = records.iter().map(|r| r.implantation.as_str()).collect();
        let influences: Vec<&str> = records.iter().map(|r| r.influence.as_str()).collect();
        let years: Vec<Option<i32>> = records.iter().map(|r| r.year).collect();
        let months: Vec<Option<i32>> = records.iter().map(|r| r.month.map(|m| m as i32)).collect();
        let days: Vec<Option<i32>> = records.iter().map(|r| r.day.map(to_date32)).collect();
        let hours: Vec<Option<i32>> = records.iter().map(|r| r.hour.map(|h| h as i32)).collect();
        let seasons: Vec<&str> = records.iter().map(|r| r.season.as_str()).collect();

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(sources)),
            Arc::new(TimestampMicrosecondArray::from(starts)),
            Arc::new(TimestampMicrosecondArray::from(ends)),
            Arc::new(StringArray::from(pollutants)),
            Arc::new(Float64Array::from(values)),
            Arc::new(Float64Array::from(normalized)),
            Arc::new(StringArray::from(zones)),
            Arc::new(StringArray::from(organizations)),
            Arc::new(StringArray::from(departments)),
            Arc::new(StringArray::from(implantations)),
            Arc::new(StringArray::from(influences)),
            Arc::new(Int32Array::from(years)),
            Arc::new(Int32Array::from(months)),
            Arc::new(Date32Array::from(days)),
            Arc::new(Int32Array::from(hours)),
            Arc::new(StringArray::from(seasons)),
        ];

        for (header, _) in extra_columns {
            let cells: Vec<Option<&str>> = records
                .iter()
                .map(|r| r.extra.get(header).map(String::as_str))
                .collect();
            columns.push(Arc::new(StringArray::from(cells)));
        }

        let batch = RecordBatch::try_new(schema, columns)?;
        Ok(batch)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();
        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            columns,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}

fn to_date32(day: NaiveDate) -> i32 {
    day.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Columns: {}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.columns.join(", "),
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Season;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    fn sample_record() -> CleanRecord {
        let start = NaiveDate::from_ymd_opt(2025, 10, 14)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut extra = BTreeMap::new();
        extra.insert("unité de mesure".to_string(), "µg-m3".to_string());

        CleanRecord {
            source: "data/FR_E2_2025-10-14.csv".to_string(),
            start: Some(start),
            end: None,
            pollutant: "PM10".to_string(),
            value: 18.4,
            value_normalized: Some(0.25),
            zone: "ZAG LYON".to_string(),
            organization: "ATMO AUVERGNE-RHÔNE-ALPES".to_string(),
            department: Some("Rhone".to_string()),
            implantation: "URBAINE".to_string(),
            influence: "FOND".to_string(),
            year: Some(2025),
            month: Some(10),
            day: Some(start.date()),
            hour: Some(8),
            season: Season::Autumn,
            extra,
        }
    }

    #[test]
    fn test_epoch_conversion() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(to_date32(epoch), 0);
        let day = NaiveDate::from_ymd_opt(2021, 10, 14).unwrap();
        assert_eq!(to_date32(day), 18914);
    }

    #[test]
    fn test_write_empty_records() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_records(&[], temp_file.path())?;
        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);

        Ok(())
    }

    #[test]
    fn test_write_records_with_extra_columns() -> Result<()> {
        let writer = ParquetWriter::new().with_batch_size(1);
        let temp_file = NamedTempFile::new()?;

        let mut second = sample_record();
        second.extra.clear();
        second.extra.insert("code zas".to_string(), "FR84ZAG02".to_string());

        writer.write_records(&[sample_record(), second], temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 2);
        assert!(info.columns.contains(&"value_normalized".to_string()));
        assert!(info.columns.contains(&"code zas".to_string()));
        assert!(info.columns.contains(&"unité de mesure".to_string()));

        Ok(())
    }

    #[test]
    fn test_extra_column_named_like_a_fixed_column() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        let mut record = sample_record();
        record.extra.insert("season".to_string(), "hiver".to_string());

        writer.write_records(&[record], temp_file.path())?;

        let info = writer.get_file_info(temp_file.path())?;
        let seasons = info.columns.iter().filter(|c| *c == "season").count();
        assert_eq!(seasons, 1);
        assert!(info.columns.contains(&"extra_season".to_string()));

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in crate::utils::constants::COMPRESSIONS {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_records(&[sample_record()], temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-9").is_err());
        Ok(())
    }
}
