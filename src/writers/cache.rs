use crate::error::{ProcessingError, Result};
use crate::models::CleanRecord;
use crate::writers::ParquetWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Destination for a snapshot of the clean record set.
///
/// The cleaner only ever writes through this port; nothing in the pipeline
/// reads a cache back.
pub trait RecordCache {
    fn store(&self, records: &[CleanRecord]) -> Result<()>;

    /// Human-readable location, for reports
    fn location(&self) -> String;
}

/// Parquet snapshot written atomically next to its final path
pub struct ParquetCache {
    path: PathBuf,
    writer: ParquetWriter,
}

impl ParquetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: ParquetWriter::new(),
        }
    }

    pub fn with_writer(mut self, writer: ParquetWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordCache for ParquetCache {
    fn store(&self, records: &[CleanRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let staging = NamedTempFile::new_in(&dir)?;
        self.writer.write_records_to(records, staging.as_file())?;
        staging
            .persist(&self.path)
            .map_err(|e| ProcessingError::Io(e.error))?;

        info!(
            path = %self.path.display(),
            rows = records.len(),
            "wrote clean record cache"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
