use airq_processor::error::ProcessingError;
use airq_processor::models::{Season, Table};
use airq_processor::processors::{
    named_table, Aggregator, CacheOutcome, Cleaner, Pipeline, RecordFilter,
};
use airq_processor::readers::SnapshotReader;
use airq_processor::settings::Settings;
use airq_processor::utils::constants::*;
use airq_processor::writers::{ExportFormat, ParquetCache, ParquetWriter, TableWriter};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "Date de début;Date de fin;Organisme;code zas;Zas;code site;nom site;type d'implantation;Polluant;type d'influence;discriminant;valeur;unité de mesure;taux de saisie;couverture temporelle;couverture de données;validité";

fn snapshot_row(start: &str, organization: &str, zone: &str, pollutant: &str, value: &str) -> String {
    format!(
        "{start};{start};{organization};FR00Z;{zone};FR00S;Site;Urbaine;{pollutant};Fond;A;{value};µg-m3;100;100;100;1"
    )
}

fn write_snapshot(dir: &Path, name: &str, rows: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut content = format!("{}\n", HEADER);
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).expect("Failed to write snapshot");
    path
}

fn sample_snapshots(dir: &Path) -> Vec<PathBuf> {
    let first = write_snapshot(
        dir,
        "FR_E2_2021-10-14.csv",
        &[
            snapshot_row("2021/10/14 00:00:00", "ATMO SUD", "ZAG MARSEILLE-AIX", "NO2", "10"),
            snapshot_row("2021/10/14 00:00:00", "ATMO SUD", "ZAG MARSEILLE-AIX", "O3", "30"),
            snapshot_row("2021/10/14 00:00:00", "ATMO SUD", "ZAG MARSEILLE-AIX", "NO2", "20"),
            snapshot_row("2021/10/14 01:00:00", "", "ZAR BASTIA", "PM10", "12,5"),
            snapshot_row("2021/10/14 01:00:00", "", "ZAR BASTIA", "PM10", "12,5"),
            snapshot_row("2021/10/14 02:00:00", "AIRPARIF", "ZAG PARIS", "NO2", ""),
        ],
    );
    let second = write_snapshot(
        dir,
        "FR_E2_2025-04-14.csv",
        &[
            snapshot_row("2025/04/14 13:00:00", "HAWA MAYOTTE", "ZR MAYOTTE", "SO2", "3"),
            snapshot_row("not a date", "AIRPARIF", "ZAG PARIS", "pm2.5", "8"),
        ],
    );
    vec![first, second]
}

#[test]
fn test_loader_concatenates_in_file_order() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let first = write_snapshot(
        dir.path(),
        "one.csv",
        &[
            snapshot_row("2021/10/14 00:00:00", "AIRPARIF", "ZAG PARIS", "NO2", "1"),
            snapshot_row("2021/10/14 00:00:00", "AIRPARIF", "ZAG PARIS", "NO2", "2"),
        ],
    );
    let second = write_snapshot(
        dir.path(),
        "two.csv",
        &[snapshot_row("2021/10/14 00:00:00", "AIRPARIF", "ZAG PARIS", "NO2", "3")],
    );

    let records = SnapshotReader::new()
        .read_all(&[&first, &second], None)
        .unwrap();

    let values: Vec<Option<&str>> = records.iter().map(|r| r.value.as_deref()).collect();
    assert_eq!(values, vec![Some("1"), Some("2"), Some("3")]);
    assert_eq!(records[0].source, first.display().to_string());
    assert_eq!(records[1].source, first.display().to_string());
    assert_eq!(records[2].source, second.display().to_string());
}

#[test]
fn test_loader_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let good = write_snapshot(
        dir.path(),
        "good.csv",
        &[snapshot_row("2021/10/14 00:00:00", "AIRPARIF", "ZAG PARIS", "NO2", "1")],
    );
    let missing = dir.path().join("missing.csv");

    let result = SnapshotReader::new().read_all(&[good, missing], None);
    assert!(matches!(result, Err(ProcessingError::SnapshotRead { .. })));

    let no_value = dir.path().join("no_value.csv");
    fs::write(&no_value, "Polluant;Zas\nNO2;ZAG PARIS\n").unwrap();
    let result = SnapshotReader::new().read_all(&[no_value], None);
    assert!(matches!(result, Err(ProcessingError::Format { .. })));
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let paths = sample_snapshots(dir.path());
    let cache_path = dir.path().join("data").join("data_clean.parquet");

    let cleaner = Cleaner::new().with_cache(Box::new(ParquetCache::new(&cache_path)));
    let data = Pipeline::new(paths).with_cleaner(cleaner).run(None).unwrap();

    // One missing value, one exact duplicate
    assert_eq!(data.report.input_records, 8);
    assert_eq!(data.report.missing_values, 1);
    assert_eq!(data.report.duplicates_removed, 1);
    assert_eq!(data.cleaned.len(), 6);

    // Every clean record has a value and a season consistent with its month
    for record in &data.cleaned {
        assert!(record.value.is_finite());
        assert_eq!(record.season, Season::from_month(record.month));
    }

    // No duplicate rows
    let keys: HashSet<_> = data.cleaned.iter().map(|r| r.row_key()).collect();
    assert_eq!(keys.len(), data.cleaned.len());

    // Organization filled from the zone, department derived from the organization
    let bastia = data.cleaned.iter().find(|r| r.zone == "ZAR BASTIA").unwrap();
    assert_eq!(bastia.organization, "QUALITAIR CORSE");
    assert_eq!(bastia.department.as_deref(), Some("Corse-du-Sud"));
    assert_eq!(bastia.value, 12.5);

    let mayotte = data.cleaned.iter().find(|r| r.zone == "ZR MAYOTTE").unwrap();
    assert_eq!(mayotte.department.as_deref(), Some("Mayotte"));
    assert_eq!(mayotte.season, Season::Spring);

    let undated = data.cleaned.iter().find(|r| r.pollutant == "PM2.5").unwrap();
    assert_eq!(undated.day, None);
    assert_eq!(undated.season, Season::Unknown);

    // Cache holds exactly the clean record set
    assert_eq!(
        data.report.cache,
        CacheOutcome::Written(cache_path.display().to_string())
    );
    let info = ParquetWriter::new().get_file_info(&cache_path).unwrap();
    assert_eq!(info.total_rows, data.cleaned.len() as i64);

    // Dominance for the Marseille zone: NO2 mean 15, O3 mean 30
    let pivot = Aggregator::new().dominance(&data.cleaned);
    assert_eq!(pivot.mean("ZAG MARSEILLE-AIX", "NO2"), Some(15.0));
    assert_eq!(pivot.mean("ZAG MARSEILLE-AIX", "O3"), Some(30.0));
    let row = pivot.row("ZAG MARSEILLE-AIX").unwrap();
    assert_eq!(row.dominant_pollutant, "O3");
    assert_eq!(row.dominant_value, 30.0);
}

#[test]
fn test_recleaning_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let data = Pipeline::new(sample_snapshots(dir.path())).run(None).unwrap();

    let cleaner = Cleaner::new();
    let (again, report) = cleaner.clean(data.cleaned.iter().map(|r| r.to_raw()).collect());

    assert_eq!(again, data.cleaned);
    assert_eq!(report.dropped_records(), 0);
}

#[test]
fn test_normalization_ignores_filters() {
    let dir = TempDir::new().unwrap();
    let data = Pipeline::new(sample_snapshots(dir.path())).run(None).unwrap();

    let filtered = RecordFilter::new()
        .with_pollutant("NO2")
        .apply(&data.cleaned);

    assert_eq!(filtered.len(), 2);
    for record in &filtered {
        let original = data
            .cleaned
            .iter()
            .find(|r| r.row_key() == record.row_key())
            .unwrap();
        assert_eq!(record.value_normalized, original.value_normalized);
    }
}

#[test]
fn test_filtered_tables_and_export() {
    let dir = TempDir::new().unwrap();
    let data = Pipeline::new(sample_snapshots(dir.path())).run(None).unwrap();
    let aggregator = Aggregator::new();

    let empty = RecordFilter::new().with_pollutant("CO").apply(&data.cleaned);
    for name in TABLE_NAMES {
        let table = named_table(&aggregator, &empty, name).unwrap();
        assert!(table.is_empty(), "{} should be empty", name);
    }

    let summary = data.table(TABLE_ZONE_SUMMARY).unwrap();
    let out = dir.path().join("out").join("zone_summary.json");
    TableWriter::new(ExportFormat::Json)
        .write_file(&summary, &out)
        .unwrap();

    let exported: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), summary.len());
    assert_eq!(exported[0]["zone"], "ZAG MARSEILLE-AIX");
    assert_eq!(exported[0]["mean_value"], 20.0);
}

#[test]
fn test_pivot_over_table_without_columns_is_empty() {
    let table = Table::new("by_pollutant", &["pollutant", "measurements"]);
    let pivot = table.pivot_mean("zone", "pollutant", &["value"]);
    assert!(pivot.is_empty());
}

#[test]
fn test_settings_drive_the_pipeline() {
    let dir = TempDir::new().unwrap();
    sample_snapshots(dir.path());

    let settings = Settings {
        base_dir: dir.path().to_path_buf(),
        snapshot_files: vec![
            PathBuf::from("FR_E2_2021-10-14.csv"),
            PathBuf::from("FR_E2_2025-04-14.csv"),
        ],
        cache_enabled: false,
        ..Settings::default()
    };

    let data = Pipeline::from_settings(&settings).unwrap().run(None).unwrap();
    assert_eq!(data.report.cache, CacheOutcome::Disabled);
    assert!(!dir.path().join(DEFAULT_CACHE_FILE).exists());
    assert_eq!(data.cleaned.len(), 6);
}
