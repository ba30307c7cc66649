//! Loading the per-site CSV sources into one combined dataset.
//!
//! Each source is read with the `csv` crate, checked against the
//! statically declared column set, tagged with its site, and appended
//! in source order.

use crate::models::{
    Column, CombinedDataset, Observation, Readings, Site, TIMESTAMP_COLUMN,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Timestamp layouts accepted in the `Timestamp` column.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Errors that make the dataset unusable.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("Schema mismatch in {origin}: missing column(s) {}", missing.join(", "))]
    MissingColumns { origin: String, missing: Vec<String> },

    #[error("Unparseable timestamp {value:?} in {origin} at line {line}")]
    Timestamp {
        origin: String,
        line: u64,
        value: String,
    },
}

/// A source file and the site its rows belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub site: Site,
    pub path: PathBuf,
}

/// The set of files the dataset is built from, in concatenation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub files: Vec<SourceFile>,
}

impl DataSources {
    /// Sources for every site, resolved against a data directory.
    pub fn from_config(config: &crate::config::DataConfig) -> Self {
        let files = Site::ALL
            .into_iter()
            .map(|site| SourceFile {
                site,
                path: config.dir.join(config.file_for(site)),
            })
            .collect();

        Self { files }
    }

    /// Source paths as display strings.
    pub fn describe(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| format!("{} ({})", f.path.display(), f.site))
            .collect()
    }
}

/// Options for loading the sources.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Whether to show a progress bar while reading.
    pub show_progress: bool,
}

/// Rows of a single source, aligned with that source's own header.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub site: Site,
    pub headers: Vec<String>,
    pub rows: Vec<Observation>,
}

/// Load every source and concatenate them into one dataset.
pub fn load(sources: &DataSources, options: &LoadOptions) -> Result<CombinedDataset, LoadError> {
    info!("Loading {} data sources", sources.files.len());

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(sources.files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut tables = Vec::with_capacity(sources.files.len());
    for source in &sources.files {
        if let Some(ref pb) = progress_bar {
            pb.set_message(source.site.label());
        }

        tables.push(read_source(source.site, &source.path)?);

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("sources loaded");
    }

    let dataset = concat(tables);
    for source in &sources.files {
        debug!(
            "{}: {} rows from {}",
            source.site,
            dataset.count_for(source.site),
            source.path.display()
        );
    }
    info!(
        "Combined dataset: {} rows, {} columns",
        dataset.len(),
        dataset.columns.len()
    );

    Ok(dataset)
}

/// Read one source file.
pub fn read_source(site: Site, path: &Path) -> Result<SourceTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    read_source_from(site, file, &path.display().to_string())
}

/// Read one source from any reader; `origin` names it in errors.
pub fn read_source_from<R: Read>(
    site: Site,
    reader: R,
    origin: &str,
) -> Result<SourceTable, LoadError> {
    let csv_error = |source| LoadError::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let positions = resolve_columns(&headers, origin)?;
    let timestamp_idx = positions.timestamp;

    let mut rows = Vec::new();
    let mut malformed_cells = 0usize;

    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let raw_timestamp = record.get(timestamp_idx).unwrap_or("").trim();
        let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| LoadError::Timestamp {
            origin: origin.to_string(),
            line,
            value: raw_timestamp.to_string(),
        })?;

        let readings = Readings::from_fn(|column| {
            let cell = record.get(positions.column(column)).unwrap_or("");
            let value = parse_number(cell);
            if value.is_nan() && !cell.trim().is_empty() {
                malformed_cells += 1;
            }
            value
        });

        rows.push(Observation {
            site,
            timestamp,
            readings,
            fields: record_fields(&record),
        });
    }

    if malformed_cells > 0 {
        warn!(
            "{}: {} non-numeric measurement cell(s) treated as missing",
            origin, malformed_cells
        );
    }

    Ok(SourceTable {
        site,
        headers,
        rows,
    })
}

/// Concatenate source tables in order, aligning rows to the union of headers.
pub fn concat(tables: Vec<SourceTable>) -> CombinedDataset {
    let mut columns: Vec<String> = Vec::new();
    for table in &tables {
        for header in &table.headers {
            if !columns.contains(header) {
                columns.push(header.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(tables.iter().map(|t| t.rows.len()).sum());
    for table in tables {
        if table.headers == columns {
            rows.extend(table.rows);
            continue;
        }

        let lookup: HashMap<&str, usize> = table
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|c| lookup.get(c.as_str()).copied())
            .collect();

        rows.extend(table.rows.into_iter().map(|mut row| {
            row.fields = mapping
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.fields.get(i).cloned())
                        .unwrap_or_default()
                })
                .collect();
            row
        }));
    }

    CombinedDataset { columns, rows }
}

/// Parse a timestamp cell into a naive date-time.
///
/// RFC 3339 input keeps its wall-clock time and drops the offset;
/// bare dates map to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a numeric cell; empty or malformed cells become `NaN`.
pub fn parse_number(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn record_fields(record: &StringRecord) -> Vec<String> {
    record.iter().map(String::from).collect()
}

/// Header positions of the required columns.
struct ColumnPositions {
    timestamp: usize,
    measurements: [usize; 7],
}

impl ColumnPositions {
    fn column(&self, column: Column) -> usize {
        let idx = Column::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default();
        self.measurements[idx]
    }
}

fn resolve_columns(headers: &[String], origin: &str) -> Result<ColumnPositions, LoadError> {
    let find = |name: &str| headers.iter().position(|h| h == name);

    let mut missing = Vec::new();

    let timestamp = find(TIMESTAMP_COLUMN);
    if timestamp.is_none() {
        missing.push(TIMESTAMP_COLUMN.to_string());
    }

    let mut measurements = [0usize; 7];
    for (slot, column) in measurements.iter_mut().zip(Column::ALL) {
        match find(column.name()) {
            Some(idx) => *slot = idx,
            None => missing.push(column.name().to_string()),
        }
    }

    match timestamp {
        Some(timestamp) if missing.is_empty() => Ok(ColumnPositions {
            timestamp,
            measurements,
        }),
        _ => Err(LoadError::MissingColumns {
            origin: origin.to_string(),
            missing,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "Timestamp,GHI,DNI,DHI,Tamb,RH,WS,WSgust";

    fn table(site: Site, body: &str) -> SourceTable {
        let content = format!("{}\n{}", HEADER, body);
        read_source_from(site, content.as_bytes(), "inline").unwrap()
    }

    #[test]
    fn test_read_source_parses_rows() {
        let t = table(
            Site::Benin,
            "2021-08-09 00:01,1.5,0,0,26.2,93.4,0,0.4\n2021-08-09 00:02,2,1,1,26.2,93.6,0.1,0.5",
        );

        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].site, Site::Benin);
        assert_eq!(t.rows[0].readings.ghi, 1.5);
        assert_eq!(t.rows[1].readings.ws_gust, 0.5);
        assert_eq!(
            t.rows[0].timestamp,
            NaiveDate::from_ymd_opt(2021, 8, 9)
                .unwrap()
                .and_hms_opt(0, 1, 0)
                .unwrap()
        );
        assert_eq!(t.rows[0].fields[0], "2021-08-09 00:01");
    }

    #[test]
    fn test_malformed_numbers_become_nan() {
        let t = table(Site::Togo, "2021-08-09 00:01,abc,,0,26.2,93.4,0,0.4");
        assert!(t.rows[0].readings.ghi.is_nan());
        assert!(t.rows[0].readings.dni.is_nan());
        assert_eq!(t.rows[0].readings.dhi, 0.0);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let content = "Timestamp,GHI,DNI,DHI,Tamb,RH,WS\n2021-08-09 00:01,1,1,1,1,1,1";
        let err = read_source_from(Site::Benin, content.as_bytes(), "benin.csv").unwrap_err();

        match err {
            LoadError::MissingColumns { origin, missing } => {
                assert_eq!(origin, "benin.csv");
                assert_eq!(missing, vec!["WSgust".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_timestamp_column_is_schema_mismatch() {
        let content = "GHI,DNI,DHI,Tamb,RH,WS,WSgust\n1,1,1,1,1,1,1";
        let err = read_source_from(Site::Benin, content.as_bytes(), "x").unwrap_err();
        assert!(err.to_string().contains("Timestamp"));
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let content = format!("{}\nnot-a-date,1,1,1,1,1,1,1", HEADER);
        let err = read_source_from(Site::Benin, content.as_bytes(), "x").unwrap_err();
        match err {
            LoadError::Timestamp { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let content = format!("{}\n2021-08-09 00:01,1,1", HEADER);
        let err = read_source_from(Site::Benin, content.as_bytes(), "x").unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 8, 9)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2021-08-09 10:30"), Some(expected));
        assert_eq!(parse_timestamp("2021-08-09 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-08-09T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-08-09T10:30:00Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2021-08-09"),
            NaiveDate::from_ymd_opt(2021, 8, 9).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_concat_preserves_source_order() {
        let benin = table(Site::Benin, "2021-08-09 00:01,1,0,0,0,0,0,0\n2021-08-09 00:02,2,0,0,0,0,0,0");
        let togo = table(Site::Togo, "2021-08-09 00:01,3,0,0,0,0,0,0");

        let dataset = concat(vec![benin, togo]);

        let ghi: Vec<f64> = dataset.rows.iter().map(|r| r.readings.ghi).collect();
        assert_eq!(ghi, vec![1.0, 2.0, 3.0]);
        assert_eq!(dataset.rows[2].site, Site::Togo);
        assert_eq!(dataset.columns.len(), 8);
    }

    #[test]
    fn test_concat_aligns_differing_headers() {
        let with_extra = format!("{},Comments\n2021-08-09 00:01,1,0,0,0,0,0,0,clean", HEADER);
        let benin = read_source_from(Site::Benin, with_extra.as_bytes(), "b").unwrap();
        let togo = table(Site::Togo, "2021-08-09 00:01,3,0,0,0,0,0,0");

        let dataset = concat(vec![togo, benin]);

        assert_eq!(dataset.columns.last().map(String::as_str), Some("Comments"));
        assert_eq!(dataset.rows[0].fields.len(), 9);
        assert_eq!(dataset.rows[0].fields[8], "");
        assert_eq!(dataset.rows[1].fields[8], "clean");
    }

    #[test]
    fn test_load_reads_all_sources() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for (i, site) in Site::ALL.into_iter().enumerate() {
            let path = dir.path().join(format!("{i}.csv"));
            let mut file = File::create(&path).unwrap();
            writeln!(file, "{}", HEADER).unwrap();
            writeln!(file, "2021-08-09 00:0{i},{i},0,0,0,0,0,0").unwrap();
            files.push(SourceFile { site, path });
        }

        let dataset = load(&DataSources { files }, &LoadOptions::default()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.count_for(Site::SierraLeone), 1);
        assert_eq!(dataset.rows[1].readings.ghi, 1.0);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let sources = DataSources {
            files: vec![SourceFile {
                site: Site::Benin,
                path: dir.path().join("missing.csv"),
            }],
        };

        let err = load(&sources, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("missing.csv"));
    }
}
