use chrono::{DateTime, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, Value as DuckValue};
use serde::Serialize;
use std::fmt;

use crate::error::{DashboardError, Result};

/// A single cell as returned by the query engine, narrowed to the shapes the dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    /// Sums over BIGINT columns come back as HUGEINT.
    HugeInt(i128),
    Double(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Other(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::HugeInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(""),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::HugeInt(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S")),
            Value::Other(v) => f.write_str(v),
        }
    }
}

impl From<DuckValue> for Value {
    fn from(value: DuckValue) -> Self {
        match value {
            DuckValue::Null => Value::Null,
            DuckValue::Boolean(v) => Value::Boolean(v),
            DuckValue::TinyInt(v) => Value::Integer(v.into()),
            DuckValue::SmallInt(v) => Value::Integer(v.into()),
            DuckValue::Int(v) => Value::Integer(v.into()),
            DuckValue::BigInt(v) => Value::Integer(v),
            DuckValue::HugeInt(v) => Value::HugeInt(v),
            DuckValue::UTinyInt(v) => Value::Integer(v.into()),
            DuckValue::USmallInt(v) => Value::Integer(v.into()),
            DuckValue::UInt(v) => Value::Integer(v.into()),
            DuckValue::UBigInt(v) => Value::HugeInt(v.into()),
            DuckValue::UHugeInt(v) => i128::try_from(v)
                .map(Value::HugeInt)
                .unwrap_or_else(|_| Value::Other(v.to_string())),
            DuckValue::Float(v) => Value::Double(v.into()),
            DuckValue::Double(v) => Value::Double(v),
            DuckValue::Text(v) | DuckValue::Enum(v) => Value::Text(v),
            DuckValue::Timestamp(unit, v) => timestamp_from_unit(unit, v)
                .map(Value::Timestamp)
                .unwrap_or_else(|| Value::Other(v.to_string())),
            DuckValue::Union(inner) => Value::from(*inner),
            other => Value::Other(sql_text(&other)),
        }
    }
}

/// Text for values the dashboard does not model, in the form DuckDB's own `VARCHAR` cast uses:
/// `[a, b]` for lists, `{k=v}` for maps, `{'k': v}` for structs.
fn sql_text(value: &DuckValue) -> String {
    match value {
        DuckValue::Null => "NULL".to_string(),
        DuckValue::Boolean(v) => v.to_string(),
        DuckValue::TinyInt(v) => v.to_string(),
        DuckValue::SmallInt(v) => v.to_string(),
        DuckValue::Int(v) => v.to_string(),
        DuckValue::BigInt(v) => v.to_string(),
        DuckValue::HugeInt(v) => v.to_string(),
        DuckValue::UHugeInt(v) => v.to_string(),
        DuckValue::UTinyInt(v) => v.to_string(),
        DuckValue::USmallInt(v) => v.to_string(),
        DuckValue::UInt(v) => v.to_string(),
        DuckValue::UBigInt(v) => v.to_string(),
        DuckValue::Float(v) => v.to_string(),
        DuckValue::Double(v) => v.to_string(),
        DuckValue::Decimal(v) => v.to_string(),
        DuckValue::Text(v) | DuckValue::Enum(v) => v.clone(),
        DuckValue::Timestamp(unit, v) => timestamp_from_unit(*unit, *v)
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| v.to_string()),
        DuckValue::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| days.to_string()),
        DuckValue::Time64(unit, v) => timestamp_from_unit(*unit, *v)
            .map(|ts| ts.format("%H:%M:%S%.f").to_string())
            .unwrap_or_else(|| v.to_string()),
        DuckValue::Interval { months, days, nanos } => {
            format!("{months} months {days} days {} seconds", *nanos as f64 / 1e9)
        }
        DuckValue::Blob(bytes) | DuckValue::Geometry(bytes) => {
            bytes.iter().map(|b| format!("\\x{b:02X}")).collect()
        }
        DuckValue::List(items) | DuckValue::Array(items) => {
            format!("[{}]", join(items.iter().map(sql_text)))
        }
        DuckValue::Map(entries) => format!(
            "{{{}}}",
            join(entries.iter().map(|(k, v)| format!("{}={}", sql_text(k), sql_text(v))))
        ),
        DuckValue::Struct(fields) => format!(
            "{{{}}}",
            join(fields.iter().map(|(k, v)| format!("'{k}': {}", sql_text(v))))
        ),
        DuckValue::Union(inner) => sql_text(inner),
        other => format!("{other:?}"),
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn timestamp_from_unit(unit: TimeUnit, value: i64) -> Option<NaiveDateTime> {
    let micros = match unit {
        TimeUnit::Second => value.checked_mul(1_000_000)?,
        TimeUnit::Millisecond => value.checked_mul(1_000)?,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    };
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// Ordered rows under named columns, exactly as the engine produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    pub fn first_row(&self, query: &str) -> Result<&[Value]> {
        self.rows
            .first()
            .map(Vec::as_slice)
            .ok_or_else(|| DashboardError::EmptyResult {
                query: query.to_string(),
            })
    }
}
