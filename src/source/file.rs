use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

use crate::compare::{Record, Value};
use crate::error::{AppError, ErrorKind};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Read a headed CSV file. Cells are typed with [`parse_cell`].
pub fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|err| input_error(path, err))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| input_error(path, err))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| input_error(path, err))?;
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.clone(), parse_cell(cell)))
            .collect();
        rows.push(row);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read csv");
    Ok((headers, rows))
}

/// Read a JSON array of objects. Columns follow first-seen key order.
pub fn read_json(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let content = fs::read_to_string(path).map_err(|err| input_error(path, err))?;
    let parsed: serde_json::Value =
        serde_json::from_str(&content).map_err(|err| input_error(path, err))?;

    let serde_json::Value::Array(items) = parsed else {
        return Err(AppError::new(
            ErrorKind::Input,
            format!("{}: expected a JSON array of objects", path.display()),
        )
        .into());
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(map) = item else {
            return Err(AppError::new(
                ErrorKind::Input,
                format!("{}: element {} is not an object", path.display(), idx),
            )
            .into());
        };
        let mut row = Record::with_capacity(map.len());
        for (key, value) in map {
            if !columns.contains(&key) {
                columns.push(key.clone());
            }
            row.insert(key, json_value(value));
        }
        rows.push(row);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "read json");
    Ok((columns, rows))
}

/// Type a CSV cell: empty is null, then integer, float, boolean, date,
/// datetime, otherwise text. A cell is only typed when the typed value prints
/// back as the exact cell text, so `007`, `+5`, `1.50`, ` 42` and integers too
/// wide for `i64` all stay text.
pub fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if raw.trim() != raw {
        return Value::Text(raw.to_string());
    }
    if looks_numeric(raw) {
        if let Ok(int) = raw.parse::<i64>() {
            return Value::Int(int);
        }
        if let Some(float) = raw.parse::<f64>().ok().map(Value::Float) {
            if float.canonical().as_deref() == Some(raw) {
                return float;
            }
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Value::Date(date);
    }
    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Value::DateTime(datetime);
    }
    Value::Text(raw.to_string())
}

fn looks_numeric(cell: &str) -> bool {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    let mut chars = digits.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), Some(next)) if next != '.' => false,
        (Some(first), _) if first.is_ascii_digit() => digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+')),
        _ => false,
    }
}

/// JSON numbers keep their printed form unless they are `i64` or a float that
/// prints back unchanged.
fn json_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                return Value::Int(int);
            }
            let text = n.to_string();
            match n.as_f64().filter(|_| n.is_f64()).map(Value::Float) {
                Some(float) if float.canonical().as_deref() == Some(text.as_str()) => float,
                _ => Value::Text(text),
            }
        }
        serde_json::Value::String(s) => Value::Text(s),
        nested => Value::Text(nested.to_string()),
    }
}

fn input_error(path: &Path, err: impl std::fmt::Display) -> anyhow::Error {
    AppError::new(ErrorKind::Input, format!("{}: {}", path.display(), err)).into()
}
