pub mod cache;
pub mod parquet_writer;
pub mod table_writer;

pub use cache::{ParquetCache, RecordCache};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use table_writer::{ExportFormat, TableWriter};
