use crate::error::{ProcessingError, Result};
use crate::models::raw::cell;
use crate::models::RawRecord;
use crate::utils::constants::*;
use crate::utils::progress::ProgressReporter;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{UTF_8, WINDOWS_1252};
use memmap2::Mmap;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads semicolon-delimited monitoring snapshots into raw records
pub struct SnapshotReader {
    delimiter: u8,
    use_mmap: bool,
}

/// Position of each interpreted field in a snapshot header
#[derive(Debug, Default)]
struct ColumnLayout {
    start: Option<usize>,
    end: Option<usize>,
    pollutant: Option<usize>,
    value: Option<usize>,
    zone: Option<usize>,
    organization: Option<usize>,
    implantation: Option<usize>,
    influence: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut layout = ColumnLayout::default();
        let mut taken: HashSet<String> = HashSet::new();

        for (idx, header) in headers.iter().enumerate() {
            let name = header.trim().to_lowercase();
            let slot = if START_HEADERS.contains(&name.as_str()) {
                &mut layout.start
            } else if END_HEADERS.contains(&name.as_str()) {
                &mut layout.end
            } else if POLLUTANT_HEADERS.contains(&name.as_str()) {
                &mut layout.pollutant
            } else if VALUE_HEADERS.contains(&name.as_str()) {
                &mut layout.value
            } else if ZONE_HEADERS.contains(&name.as_str()) {
                &mut layout.zone
            } else if ORGANIZATION_HEADERS.contains(&name.as_str()) {
                &mut layout.organization
            } else if IMPLANTATION_HEADERS.contains(&name.as_str()) {
                &mut layout.implantation
            } else if INFLUENCE_HEADERS.contains(&name.as_str()) {
                &mut layout.influence
            } else {
                layout.extra.push((idx, unique_header(header.trim(), &mut taken)));
                continue;
            };

            // First matching column wins; later duplicates are carried as extras
            if slot.is_none() {
                *slot = Some(idx);
                taken.insert(header.trim().to_string());
            } else {
                layout.extra.push((idx, unique_header(header.trim(), &mut taken)));
            }
        }

        layout
    }

    fn to_record(&self, row: &StringRecord, source: &str) -> RawRecord {
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(cell);

        let mut record = RawRecord {
            source: source.to_string(),
            start: field(self.start),
            end: field(self.end),
            pollutant: field(self.pollutant),
            value: field(self.value),
            zone: field(self.zone),
            organization: field(self.organization),
            implantation: field(self.implantation),
            influence: field(self.influence),
            ..RawRecord::default()
        };

        for (idx, header) in &self.extra {
            if let Some(value) = row.get(*idx).and_then(cell) {
                record.extra.insert(header.clone(), value);
            }
        }

        record
    }
}

/// Name a repeated header `name.1`, `name.2`, ... so no column is shadowed
fn unique_header(header: &str, taken: &mut HashSet<String>) -> String {
    let mut name = header.to_string();
    let mut n = 0;
    while taken.contains(&name) {
        n += 1;
        name = format!("{}.{}", header, n);
    }
    taken.insert(name.clone());
    name
}

impl SnapshotReader {
    pub fn new() -> Self {
        Self {
            delimiter: SNAPSHOT_DELIMITER,
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read every snapshot in order and concatenate the records.
    ///
    /// Any unreadable or malformed file aborts the whole load.
    pub fn read_all<P: AsRef<Path>>(
        &self,
        paths: &[P],
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if let Some(p) = progress {
                p.set_message(&format!("Reading {}", path.display()));
            }

            let batch = self.read_snapshot(path)?;
            debug!(path = %path.display(), rows = batch.len(), "snapshot read");
            records.extend(batch);

            if let Some(p) = progress {
                p.increment(1);
            }
        }

        info!(
            files = paths.len(),
            rows = records.len(),
            "loaded monitoring snapshots"
        );
        Ok(records)
    }

    /// Read one snapshot, tagging each record with the file path
    pub fn read_snapshot(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let io_err = |source: std::io::Error| ProcessingError::SnapshotRead {
            path: path.to_path_buf(),
            source,
        };

        if self.use_mmap {
            let file = File::open(path).map_err(io_err)?;
            let mmap = unsafe { Mmap::map(&file).map_err(io_err)? };
            let text = decode_snapshot(&mmap, path);
            self.parse_snapshot(&text, path)
        } else {
            let bytes = std::fs::read(path).map_err(io_err)?;
            let text = decode_snapshot(&bytes, path);
            self.parse_snapshot(&text, path)
        }
    }

    fn parse_snapshot(&self, text: &str, path: &Path) -> Result<Vec<RawRecord>> {
        let format_err = |message: String| ProcessingError::Format {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| format_err(e.to_string()))?
            .clone();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(format_err("missing header row".to_string()));
        }

        let layout = ColumnLayout::from_headers(&headers);
        if layout.value.is_none() {
            return Err(format_err(format!(
                "no value column among {} header(s); expected one of {:?} separated by '{}'",
                headers.len(),
                VALUE_HEADERS,
                self.delimiter as char
            )));
        }

        let source = path.display().to_string();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| format_err(e.to_string()))?;
            records.push(layout.to_record(&row, &source));
        }

        Ok(records)
    }
}

impl Default for SnapshotReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode snapshot bytes as UTF-8 (BOM aware).
///
/// The header row decides the encoding: a UTF-8 header keeps the file UTF-8
/// and stray invalid bytes in the body become U+FFFD; otherwise the whole
/// file is read as Windows-1252.
fn decode_snapshot<'a>(bytes: &'a [u8], path: &Path) -> Cow<'a, str> {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text;
    }

    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(bytes.len());
    if std::str::from_utf8(&bytes[..header_end]).is_ok() {
        warn!(
            path = %path.display(),
            "snapshot body contains invalid UTF-8 bytes, replacing them"
        );
        return text;
    }

    warn!(
        path = %path.display(),
        "snapshot is not valid UTF-8, decoding as Windows-1252"
    );
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text
}

/// Snapshot paths resolved against a base directory
pub fn resolve_paths<P: AsRef<Path>>(base: &Path, files: &[P]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|f| {
            let f = f.as_ref();
            if f.is_absolute() {
                f.to_path_buf()
            } else {
                base.join(f)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const HEADER: &str = "Date de début;Date de fin;Organisme;code zas;Zas;code site;nom site;type d'implantation;Polluant;type d'influence;discriminant;valeur;unité de mesure;taux de saisie";

    fn write_snapshot(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        path
    }

    #[test]
    fn test_read_snapshot_fields() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_snapshot(
            &dir,
            "FR_E2_2025-10-14.csv",
            &["2025/10/14 00:00:00;2025/10/14 01:00:00;ATMO SUD;FR93ZAG01;ZAG MARSEILLE-AIX;FR03043;Marseille Longchamp;Urbaine;NO2;Fond;A;21.3;µg-m3;"],
        );

        let records = SnapshotReader::new().read_snapshot(&path)?;
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.source, path.display().to_string());
        assert_eq!(r.start.as_deref(), Some("2025/10/14 00:00:00"));
        assert_eq!(r.pollutant.as_deref(), Some("NO2"));
        assert_eq!(r.value.as_deref(), Some("21.3"));
        assert_eq!(r.zone.as_deref(), Some("ZAG MARSEILLE-AIX"));
        assert_eq!(r.organization.as_deref(), Some("ATMO SUD"));
        assert_eq!(r.implantation.as_deref(), Some("Urbaine"));
        assert_eq!(r.influence.as_deref(), Some("Fond"));
        assert_eq!(r.extra["code zas"], "FR93ZAG01");
        assert_eq!(r.extra["discriminant"], "A");
        // Empty cells are not carried
        assert!(!r.extra.contains_key("taux de saisie"));

        Ok(())
    }

    #[test]
    fn test_concatenation_preserves_order() -> Result<()> {
        let dir = TempDir::new()?;
        let first = write_snapshot(
            &dir,
            "first.csv",
            &[
                "2021/10/14 00:00:00;;ATMO SUD;;Z1;;;;NO2;;;1;;",
                "2021/10/14 01:00:00;;ATMO SUD;;Z1;;;;NO2;;;2;;",
            ],
        );
        let second = write_snapshot(
            &dir,
            "second.csv",
            &["2024/10/14 00:00:00;;AIRPARIF;;Z2;;;;O3;;;3;;"],
        );

        let records = SnapshotReader::new().read_all(&[&first, &second], None)?;
        let values: Vec<_> = records.iter().map(|r| r.value.as_deref()).collect();
        assert_eq!(values, vec![Some("1"), Some("2"), Some("3")]);

        let sources: Vec<_> = records.iter().map(|r| r.source.clone()).collect();
        assert_eq!(
            sources,
            vec![
                first.display().to_string(),
                first.display().to_string(),
                second.display().to_string()
            ]
        );

        Ok(())
    }

    #[test]
    fn test_missing_file_aborts_load() -> Result<()> {
        let dir = TempDir::new()?;
        let present = write_snapshot(&dir, "present.csv", &["a;b;c;d;e;f;g;h;i;j;k;1;m;n"]);
        let missing = dir.path().join("missing.csv");

        let err = SnapshotReader::new()
            .read_all(&[present, missing], None)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::SnapshotRead { .. }));

        Ok(())
    }

    #[test]
    fn test_ragged_rows_are_format_errors() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_snapshot(&dir, "ragged.csv", &["only;three;cells"]);

        let err = SnapshotReader::new().read_snapshot(&path).unwrap_err();
        assert!(matches!(err, ProcessingError::Format { .. }));

        Ok(())
    }

    #[test]
    fn test_wrong_delimiter_is_format_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Polluant,valeur,Zas")?;
        writeln!(file, "NO2,12,Z1")?;

        let err = SnapshotReader::new().read_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, ProcessingError::Format { .. }));

        Ok(())
    }

    #[test]
    fn test_bom_and_latin1_input() -> Result<()> {
        let mut bom = NamedTempFile::new()?;
        bom.write_all(b"\xEF\xBB\xBFPolluant;valeur;Zas\nNO2;12;Z1\n")?;
        let records = SnapshotReader::new().read_snapshot(bom.path())?;
        assert_eq!(records[0].pollutant.as_deref(), Some("NO2"));

        // "Date de début" with a Windows-1252 encoded é
        let mut latin = NamedTempFile::new()?;
        latin.write_all(b"Date de d\xE9but;Polluant;valeur\n2025/04/14 00:00:00;O3;40\n")?;
        let records = SnapshotReader::new().with_mmap(true).read_snapshot(latin.path())?;
        assert_eq!(records[0].start.as_deref(), Some("2025/04/14 00:00:00"));

        Ok(())
    }

    #[test]
    fn test_stray_byte_in_body_keeps_utf8_headers() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(
            "Date de début;Polluant;valeur;nom site\n2025/04/14 00:00:00;O3;40;Nice\n2025/04/14 01:00:00;O3;42;Caf"
                .as_bytes(),
        )?;
        file.write_all(b"\xE9\n")?;

        for use_mmap in [false, true] {
            let records = SnapshotReader::new()
                .with_mmap(use_mmap)
                .read_snapshot(file.path())?;
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].start.as_deref(), Some("2025/04/14 00:00:00"));
            assert_eq!(records[1].start.as_deref(), Some("2025/04/14 01:00:00"));
            assert_eq!(records[1].extra["nom site"], "Caf\u{FFFD}");
            assert!(records.iter().all(|r| !r.extra.keys().any(|k| k.starts_with("Date"))));
        }

        Ok(())
    }

    #[test]
    fn test_repeated_headers_get_distinct_names() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Polluant;valeur;Zas;code;code;Polluant")?;
        writeln!(file, "NO2;10;Z1;A;B;x")?;
        writeln!(file, "NO2;10;Z1;C;B;y")?;

        let records = SnapshotReader::new().read_snapshot(file.path())?;
        assert_eq!(records[0].pollutant.as_deref(), Some("NO2"));
        assert_eq!(records[0].extra["code"], "A");
        assert_eq!(records[0].extra["code.1"], "B");
        assert_eq!(records[0].extra["Polluant.1"], "x");
        assert_eq!(records[1].extra["code"], "C");

        // Rows that differ only in the first repeated column stay distinct
        let (clean, report) = crate::processors::Cleaner::new().clean(records);
        assert_eq!(clean.len(), 2);
        assert_eq!(report.duplicates_removed, 0);

        Ok(())
    }

    #[test]
    fn test_resolve_paths() {
        let base = Path::new("/srv/airq");
        let resolved = resolve_paths(base, &["data/a.csv", "/tmp/b.csv"]);
        assert_eq!(resolved[0], PathBuf::from("/srv/airq/data/a.csv"));
        assert_eq!(resolved[1], PathBuf::from("/tmp/b.csv"));
    }
}
