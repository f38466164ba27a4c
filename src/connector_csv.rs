//! Delimited-file connector.
//!
//! Streams rows out of a delimited text file, applying an equality filter
//! and an optional result limit. This is the one connector with a
//! cancellation contract: records are pulled from the underlying reader one
//! at a time, and the loop stops the moment the limit is satisfied. Bytes
//! past that point are never requested from the file, so a bounded read on
//! an arbitrarily large file costs only as much input as it takes to fill
//! the limit.

use std::fs::File;
use std::io::{BufReader, Read};

use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::registry::{DataSourceDescriptor, SourceKind};

/// Rows kept by one `read_csv` invocation.
#[derive(Debug)]
pub struct ReadOutcome {
    pub row_count: usize,
    pub rows: Vec<Map<String, Value>>,
}

/// Read rows from the descriptor's file.
///
/// `filter` keeps a row only when every entry equals the row's value for
/// that column. `limit` caps the kept-row count and stops consumption of
/// the file as soon as it is reached.
pub fn read_rows(
    descriptor: &DataSourceDescriptor,
    filter: Option<&Map<String, Value>>,
    limit: Option<usize>,
) -> Result<ReadOutcome, GatewayError> {
    descriptor.expect_kind(SourceKind::DelimitedFile)?;
    let path = descriptor.path()?;
    let file = File::open(path)
        .map_err(|e| GatewayError::Connector(format!("failed to open {path}: {e}")))?;
    read_from(BufReader::new(file), descriptor.delimiter(), filter, limit)
}

/// Stream rows from any reader.
///
/// Split out from [`read_rows`] so tests can wrap the source and observe
/// how many bytes are actually consumed when a limit cuts the read short.
pub fn read_from(
    reader: impl Read,
    delimiter: u8,
    filter: Option<&Map<String, Value>>,
    limit: Option<usize>,
) -> Result<ReadOutcome, GatewayError> {
    if limit == Some(0) {
        return Ok(ReadOutcome {
            row_count: 0,
            rows: Vec::new(),
        });
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| GatewayError::Connector(e.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| GatewayError::Connector(e.to_string()))?;

        let mut row = Map::new();
        for (name, field) in headers.iter().zip(record.iter()) {
            row.insert(name.to_string(), Value::from(field));
        }

        if let Some(filter) = filter {
            if !matches_filter(&row, filter) {
                continue;
            }
        }

        rows.push(row);
        if let Some(limit) = limit {
            if rows.len() >= limit {
                // Limit satisfied: stop pulling records. Unread bytes stay
                // unread.
                break;
            }
        }
    }

    Ok(ReadOutcome {
        row_count: rows.len(),
        rows,
    })
}

/// A row passes only if every filter entry equals the row's value exactly
/// (logical AND). Equality is strict: delimited fields are strings, so a
/// numeric filter value never matches.
fn matches_filter(row: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(column, required)| row.get(column) == Some(required))
}

// ═══════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = "\
name,city,age
ada,london,36
grace,arlington,85
linus,helsinki,28
ada,paris,51
";

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    /// Reader wrapper that counts how many bytes the CSV layer pulls.
    struct CountingReader<R> {
        inner: R,
        bytes_read: usize,
    }

    impl<R: Read> CountingReader<R> {
        fn new(inner: R) -> Self {
            Self {
                inner,
                bytes_read: 0,
            }
        }
    }

    impl<R: Read> Read for CountingReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.inner.read(buf)?;
            self.bytes_read += n;
            Ok(n)
        }
    }

    #[test]
    fn reads_all_rows_without_filter_or_limit() {
        let outcome = read_from(SAMPLE.as_bytes(), b',', None, None).unwrap();
        assert_eq!(outcome.row_count, 4);
        assert_eq!(outcome.rows[0]["name"], "ada");
        assert_eq!(outcome.rows[2]["city"], "helsinki");
    }

    #[test]
    fn filter_is_conjunctive_and_exact() {
        let filter = obj(json!({ "name": "ada" }));
        let outcome = read_from(SAMPLE.as_bytes(), b',', Some(&filter), None).unwrap();
        assert_eq!(outcome.row_count, 2);
        assert!(outcome.rows.iter().all(|r| r["name"] == "ada"));

        let filter = obj(json!({ "name": "ada", "city": "paris" }));
        let outcome = read_from(SAMPLE.as_bytes(), b',', Some(&filter), None).unwrap();
        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.rows[0]["age"], "51");
    }

    #[test]
    fn numeric_filter_value_never_matches_string_cell() {
        let filter = obj(json!({ "age": 36 }));
        let outcome = read_from(SAMPLE.as_bytes(), b',', Some(&filter), None).unwrap();
        assert_eq!(outcome.row_count, 0);

        let filter = obj(json!({ "age": "36" }));
        let outcome = read_from(SAMPLE.as_bytes(), b',', Some(&filter), None).unwrap();
        assert_eq!(outcome.row_count, 1);
    }

    #[test]
    fn limit_caps_rows() {
        let outcome = read_from(SAMPLE.as_bytes(), b',', None, Some(3)).unwrap();
        assert_eq!(outcome.row_count, 3);

        let outcome = read_from(SAMPLE.as_bytes(), b',', None, Some(0)).unwrap();
        assert_eq!(outcome.row_count, 0);
    }

    #[test]
    fn limit_stops_consuming_the_stream() {
        // A file big enough that the CSV layer's internal buffering cannot
        // swallow it all while serving the first few records.
        let mut data = String::from("id,value\n");
        for i in 0..20_000 {
            data.push_str(&format!("{i},row-{i}\n"));
        }

        let mut reader = CountingReader::new(data.as_bytes());
        let outcome = read_from(&mut reader, b',', None, Some(5)).unwrap();

        assert_eq!(outcome.row_count, 5);
        assert!(
            reader.bytes_read < data.len(),
            "expected a partial read, consumed {} of {} bytes",
            reader.bytes_read,
            data.len()
        );
    }

    #[test]
    fn custom_delimiter() {
        let data = "a;b\n1;2\n";
        let outcome = read_from(data.as_bytes(), b';', None, None).unwrap();
        assert_eq!(outcome.row_count, 1);
        assert_eq!(outcome.rows[0]["b"], "2");
    }

    #[test]
    fn ragged_row_is_a_connector_error() {
        let data = "a,b\n1,2,3\n";
        let err = read_from(data.as_bytes(), b',', None, None).unwrap_err();
        assert!(matches!(err, GatewayError::Connector(_)));
    }
}
