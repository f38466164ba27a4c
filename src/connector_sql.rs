//! Relational (SQLite) connector.
//!
//! Executes ad-hoc SQL against a file-backed SQLite database. Every call
//! opens its own connection and closes it before returning, on the success
//! and failure paths alike; nothing is pooled or reused across calls.
//!
//! The query text runs verbatim: no parameterization, no sanitization, no
//! statement restriction. The connector trusts the caller completely. That
//! is the documented trade-off of this gateway, not an oversight.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

use crate::error::GatewayError;
use crate::registry::{DataSourceDescriptor, SourceKind};

/// Rows returned by one `query_sql` invocation.
#[derive(Debug)]
pub struct QueryOutcome {
    pub row_count: usize,
    pub rows: Vec<Map<String, Value>>,
}

/// Run one query against the descriptor's database file.
///
/// The connection lives for exactly this call. On a query failure the
/// connection is still closed before the error propagates; no partial
/// state (an open handle after a failed query) can escape.
pub async fn run_query(
    descriptor: &DataSourceDescriptor,
    query: &str,
) -> Result<QueryOutcome, GatewayError> {
    descriptor.expect_kind(SourceKind::Relational)?;
    let path = descriptor.path()?;

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))
        .map_err(|e| GatewayError::Connector(e.to_string()))?;
    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| GatewayError::Connector(format!("failed to open {path}: {e}")))?;

    // Fetch first, close second, and only then surface a query failure.
    let fetched = sqlx::query(query).fetch_all(&mut conn).await;
    let _ = conn.close().await;

    let raw_rows = fetched.map_err(|e| GatewayError::Connector(e.to_string()))?;
    let rows = raw_rows
        .iter()
        .map(row_to_json)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryOutcome {
        row_count: rows.len(),
        rows,
    })
}

fn row_to_json(row: &SqliteRow) -> Result<Map<String, Value>, GatewayError> {
    let mut out = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_column(row, idx)?);
    }
    Ok(out)
}

/// Decode one column by its SQLite storage class. Ad-hoc queries can
/// produce any shape, so the declared type drives the decode and BLOBs are
/// carried as base64 text.
fn decode_column(row: &SqliteRow, idx: usize) -> Result<Value, GatewayError> {
    let connector = |e: sqlx::Error| GatewayError::Connector(e.to_string());

    let raw = row.try_get_raw(idx).map_err(connector)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(idx).map_err(connector)?),
        "REAL" | "NUMERIC" => Value::from(row.try_get::<f64, _>(idx).map_err(connector)?),
        "BOOLEAN" => Value::from(row.try_get::<bool, _>(idx).map_err(connector)?),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(idx).map_err(connector)?;
            Value::from(BASE64.encode(bytes))
        }
        _ => Value::from(row.try_get::<String, _>(idx).map_err(connector)?),
    };
    Ok(value)
}
