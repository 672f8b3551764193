//! The tabular-read primitive: run SQL through an engine and shape the result.
//!
//! [`read_sql`] is the only place where engine output becomes a [`Table`]. The
//! [`ReadOptions`] it accepts mirror the options a data-frame reader usually takes:
//! which column becomes the index, which columns hold dates, and which columns to keep.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::errors::ReadError;
use super::{Table, Value};
use crate::dialect::Params;
use crate::engine::Engine;
use crate::materializer::MaterializeError;

/// Fallback formats tried, in order, when `date_format` is not set
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Named options for [`read_sql`]. Every option is optional; unset options do nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadOptions {
    /// Column to move into the table index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_col: Option<String>,
    /// Columns to convert to timestamps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_dates: Option<Vec<String>>,
    /// `chrono` format string used for `parse_dates` text values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    /// Columns to keep, in output order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_col(mut self, column: impl Into<String>) -> Self {
        self.index_col = Some(column.into());
        self
    }

    pub fn parse_dates<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_dates = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set_keys().is_empty()
    }

    /// Names of the options that are set
    pub fn set_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.index_col.is_some() {
            keys.push("index_col");
        }
        if self.parse_dates.is_some() {
            keys.push("parse_dates");
        }
        if self.date_format.is_some() {
            keys.push("date_format");
        }
        if self.columns.is_some() {
            keys.push("columns");
        }
        keys
    }

    /// Layer `self` over `defaults`, key by key.
    ///
    /// A key set in `self` wins; a key only set in `defaults` is kept.
    pub fn merged_over(self, defaults: &ReadOptions) -> ReadOptions {
        ReadOptions {
            index_col: self.index_col.or_else(|| defaults.index_col.clone()),
            parse_dates: self.parse_dates.or_else(|| defaults.parse_dates.clone()),
            date_format: self.date_format.or_else(|| defaults.date_format.clone()),
            columns: self.columns.or_else(|| defaults.columns.clone()),
        }
    }
}

/// The effective arguments of one [`read_sql`] call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadSpec {
    pub sql: String,
    pub params: Params,
    pub options: ReadOptions,
}

impl ReadSpec {
    pub fn read(&self, engine: &dyn Engine) -> Result<Table, MaterializeError> {
        read_sql(&self.sql, engine, &self.params, &self.options)
    }
}

/// Execute `sql` with `params` on `engine` and shape the result with `options`.
///
/// Options are applied as: `parse_dates`, then `index_col`, then `columns`.
/// Engine errors are returned unchanged.
pub fn read_sql(
    sql: &str,
    engine: &dyn Engine,
    params: &Params,
    options: &ReadOptions,
) -> Result<Table, MaterializeError> {
    debug!("read_sql on {}: {}", engine.dialect(), sql);
    let result = engine.execute(sql, params)?;
    trace!(
        "read_sql returned {} rows x {} columns",
        result.rows.len(),
        result.columns.len()
    );

    let mut table = Table::new(result.columns, result.rows)?;

    if let Some(date_columns) = &options.parse_dates {
        table = parse_date_columns(table, date_columns, options.date_format.as_deref())?;
    }
    if let Some(index_col) = &options.index_col {
        table = table.set_index(index_col)?;
    }
    if let Some(keep) = &options.columns {
        table = table.select(keep)?;
    }

    Ok(table)
}

fn parse_date_columns(
    table: Table,
    date_columns: &[String],
    format: Option<&str>,
) -> Result<Table, ReadError> {
    let positions = date_columns
        .iter()
        .map(|column| {
            table
                .column_position(column)
                .ok_or_else(|| ReadError::UnknownColumn {
                    option: "parse_dates",
                    column: column.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (columns, mut rows, index) = table.into_parts();
    for row in rows.iter_mut() {
        for &pos in &positions {
            let cell = std::mem::replace(&mut row[pos], Value::Null);
            row[pos] = to_timestamp(cell, format).map_err(|(value, reason)| {
                ReadError::DateParse {
                    column: columns[pos].clone(),
                    value,
                    reason,
                }
            })?;
        }
    }
    Ok(Table::from_parts(columns, rows, index))
}

/// Convert one cell to a timestamp. Errors carry the rendered value and a reason.
fn to_timestamp(cell: Value, format: Option<&str>) -> Result<Value, (String, String)> {
    match cell {
        Value::Null | Value::Timestamp(_) => Ok(cell),
        Value::Int(secs) => DateTime::from_timestamp(secs, 0)
            .map(|dt| Value::Timestamp(dt.naive_utc()))
            .ok_or_else(|| (secs.to_string(), "timestamp out of range".to_string())),
        Value::Float(secs) if !secs.is_finite() => {
            Err((secs.to_string(), "not a finite number".to_string()))
        }
        Value::Float(secs) => {
            let mut whole = secs.floor();
            let mut nanos = ((secs - whole) * 1e9).round();
            // rounding can reach a full second
            if nanos >= 1e9 {
                whole += 1.0;
                nanos -= 1e9;
            }
            DateTime::from_timestamp(whole as i64, nanos as u32)
                .map(|dt| Value::Timestamp(dt.naive_utc()))
                .ok_or_else(|| (secs.to_string(), "timestamp out of range".to_string()))
        }
        Value::Text(text) => parse_text(&text, format)
            .map(Value::Timestamp)
            .map_err(|reason| (text, reason)),
        Value::Bool(b) => Err((b.to_string(), "booleans are not dates".to_string())),
    }
}

fn parse_text(text: &str, format: Option<&str>) -> Result<NaiveDateTime, String> {
    let text = text.trim();
    if let Some(fmt) = format {
        return NaiveDateTime::parse_from_str(text, fmt)
            .or_else(|_| {
                NaiveDate::parse_from_str(text, fmt)
                    .map(|d| d.and_time(NaiveTime::default()))
            })
            .map_err(|e| e.to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(|d| d.and_time(NaiveTime::default()))
        .map_err(|_| "no known date format matched".to_string())
}
