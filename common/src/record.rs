use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReportError;

/// Columns of one data row: data size, throughput, time taken.
pub const RECORD_COLUMNS: usize = 3;

/// One measured benchmark run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub data_size_gb: f64,
    pub throughput_kbps: f64,
    pub time_taken_s: f64,
}

/// All records of one benchmark CSV, in file order. Keeping whole records
/// (instead of three parallel vectors) makes the per-row alignment of the
/// three values structural.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BenchmarkSeries {
    pub records: Vec<BenchmarkRecord>,
}

impl BenchmarkSeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (data size, throughput) pairs for the left y axis.
    pub fn throughput_points(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.data_size_gb, r.throughput_kbps))
            .collect()
    }

    /// (data size, time taken) pairs for the right y axis.
    pub fn time_points(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.data_size_gb, r.time_taken_s))
            .collect()
    }
}

/// Reads the benchmark CSV at `path`. Open failures of any kind count as a
/// missing input; nothing else is touched before the open succeeds.
pub fn read_series(path: &Path) -> Result<BenchmarkSeries, ReportError> {
    let file = File::open(path).map_err(|source| ReportError::InputMissing {
        path: path.to_path_buf(),
        source,
    })?;
    parse_series(file)
}

/// Parses benchmark records from CSV text. The first line is consumed as a
/// header and never inspected; every following row must hold exactly
/// [`RECORD_COLUMNS`] numeric columns. Fields are matched by position, not by
/// header name, and surrounding whitespace is trimmed.
pub fn parse_series<R: Read>(input: R) -> Result<BenchmarkSeries, ReportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        if row.len() != RECORD_COLUMNS {
            return Err(ReportError::ColumnCount {
                line,
                found: row.len(),
            });
        }

        let mut fields = [0.0; RECORD_COLUMNS];
        for (column, field) in row.iter().enumerate() {
            fields[column] = field.parse().map_err(|_| ReportError::InvalidNumber {
                line,
                column: column + 1,
                value: field.to_owned(),
            })?;
        }
        records.push(BenchmarkRecord {
            data_size_gb: fields[0],
            throughput_kbps: fields[1],
            time_taken_s: fields[2],
        });
    }

    debug!("parsed {} benchmark records", records.len());
    Ok(BenchmarkSeries { records })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(data_size_gb: f64, throughput_kbps: f64, time_taken_s: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            data_size_gb,
            throughput_kbps,
            time_taken_s,
        }
    }

    #[test]
    fn parses_rows_in_file_order() {
        let input = "Data Size,Throughput,Time Taken\n\
                     1.0,500.0,2.0\n\
                     2.0,480.0,4.5\n\
                     4.0,460.0,9.1\n";
        let series = parse_series(input.as_bytes()).unwrap();
        assert_eq!(
            series.records,
            vec![
                record(1.0, 500.0, 2.0),
                record(2.0, 480.0, 4.5),
                record(4.0, 460.0, 9.1),
            ]
        );
    }

    #[test]
    fn accepts_integer_and_scientific_forms() {
        let series = parse_series("h1,h2,h3\n10,5e2, 2.5 \n".as_bytes()).unwrap();
        assert_eq!(series.records, vec![record(10.0, 500.0, 2.5)]);
    }

    #[test]
    fn header_content_is_never_inspected() {
        // A header with the wrong column count and arbitrary text still only
        // costs one skipped line.
        let series = parse_series("whatever\n1,2,3\n".as_bytes()).unwrap();
        assert_eq!(series.records, vec![record(1.0, 2.0, 3.0)]);

        // Round-trip through the serde field names, which differ from the
        // canonical header text.
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(record(3.0, 450.0, 7.5)).unwrap();
        let bytes = writer.into_inner().unwrap();
        let series = parse_series(bytes.as_slice()).unwrap();
        assert_eq!(series.records, vec![record(3.0, 450.0, 7.5)]);
    }

    #[test]
    fn header_only_input_gives_empty_series() {
        let series = parse_series("Data Size,Throughput,Time Taken\n".as_bytes()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.len(), 0);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let series = parse_series("".as_bytes()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn non_numeric_column_is_rejected_with_position() {
        let input = "Data Size,Throughput,Time Taken\n1.0,500.0,2.0\n2.0,abc,4.5\n";
        let err = parse_series(input.as_bytes()).unwrap_err();
        match err {
            ReportError::InvalidNumber {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn empty_field_is_not_a_number() {
        let err = parse_series("h1,h2,h3\n1.0,,2.0\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::InvalidNumber {
                line: 2,
                column: 2,
                ..
            }
        ));
    }

    #[test]
    fn short_row_is_rejected() {
        let err = parse_series("h1,h2,h3\n1.0,500.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::ColumnCount { line: 2, found: 2 }));
    }

    #[test]
    fn long_row_is_rejected() {
        let err = parse_series("h1,h2,h3\n1.0,500.0,2.0,9.9\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::ColumnCount { line: 2, found: 4 }));
    }

    #[test]
    fn quoted_fields_parse() {
        let series = parse_series("h1,h2,h3\n\"1.0\",\"500.0\",2.0\n".as_bytes()).unwrap();
        assert_eq!(series.records, vec![record(1.0, 500.0, 2.0)]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let series = parse_series("h1,h2,h3\n1,2,3\n\n4,5,6\n".as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn invalid_utf8_surfaces_as_csv_error() {
        let err = parse_series(&b"h1,h2,h3\n\xff,1,2\n"[..]).unwrap_err();
        assert!(matches!(err, ReportError::Csv(_)));
    }
}
