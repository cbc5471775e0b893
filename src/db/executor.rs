use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tiberius::FromSql;

use crate::compare::Value;
use crate::db::client::SqlClient;
use crate::db::types::{Column, ResultSet};
use crate::error::{AppError, ErrorKind};

pub async fn run_query(query: tiberius::Query<'_>, client: &mut SqlClient) -> Result<ResultSet> {
    let stream = query
        .query(client)
        .await
        .map_err(|err| AppError::new(ErrorKind::Query, err.to_string()))?;
    first_result_set(stream).await
}

/// Run ad-hoc SQL text with no parameters.
pub async fn run_sql(sql: &str, client: &mut SqlClient) -> Result<ResultSet> {
    let stream = client
        .simple_query(sql)
        .await
        .map_err(|err| AppError::new(ErrorKind::Query, err.to_string()))?;
    first_result_set(stream).await
}

/// First result set of the stream. Column metadata is read before the rows so
/// an empty result still reports its columns.
pub async fn first_result_set(mut stream: tiberius::QueryStream<'_>) -> Result<ResultSet> {
    let columns = stream
        .columns()
        .await
        .map_err(|err| AppError::new(ErrorKind::Query, err.to_string()))?
        .map(|cols| {
            cols.iter()
                .map(|col| Column {
                    name: col.name().to_string(),
                    data_type: Some(format!("{:?}", col.column_type())),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let rows = stream
        .into_first_result()
        .await
        .map_err(|err| AppError::new(ErrorKind::Query, err.to_string()))?;

    let mut converted_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let values = row
            .cells()
            .map(|(_, data)| map_column_data(data))
            .collect::<Result<Vec<_>>>()?;
        converted_rows.push(values);
    }

    Ok(ResultSet {
        columns,
        rows: converted_rows,
    })
}

fn map_column_data(data: &tiberius::ColumnData<'static>) -> Result<Value> {
    use tiberius::ColumnData::*;
    let value = match data {
        U8(value) => value.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        I16(value) => value.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        I32(value) => value.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        I64(value) => value.map(Value::Int).unwrap_or(Value::Null),
        F32(value) => value.map(|v| Value::Float(v as f64)).unwrap_or(Value::Null),
        F64(value) => value.map(Value::Float).unwrap_or(Value::Null),
        Bit(value) => value.map(Value::Bool).unwrap_or(Value::Null),
        String(value) => text(value.as_ref()),
        Guid(value) => text(value.as_ref()),
        Numeric(value) => text(value.as_ref()),
        Xml(value) => text(value.as_ref()),
        Binary(value) => value
            .as_ref()
            .map(|bytes| Value::Text(hex(bytes)))
            .unwrap_or(Value::Null),
        DateTime(_) | SmallDateTime(_) => datetime(data)?,
        #[cfg(feature = "tds73")]
        DateTime2(_) => datetime(data)?,
        #[cfg(feature = "tds73")]
        Date(_) => NaiveDate::from_sql(data)
            .map_err(conversion_error)?
            .map(Value::Date)
            .unwrap_or(Value::Null),
        #[cfg(feature = "tds73")]
        Time(_) => chrono::NaiveTime::from_sql(data)
            .map_err(conversion_error)?
            .map(|t| Value::Text(t.format("%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),
        #[cfg(feature = "tds73")]
        DateTimeOffset(_) => chrono::DateTime::<chrono::FixedOffset>::from_sql(data)
            .map_err(conversion_error)?
            .map(|dt| Value::Text(dt.format("%Y-%m-%d %H:%M:%S%.f %:z").to_string()))
            .unwrap_or(Value::Null),
    };
    Ok(value)
}

fn datetime(data: &tiberius::ColumnData<'static>) -> Result<Value> {
    Ok(NaiveDateTime::from_sql(data)
        .map_err(conversion_error)?
        .map(Value::DateTime)
        .unwrap_or(Value::Null))
}

fn text(value: Option<&impl ToString>) -> Value {
    value
        .map(|v| Value::Text(v.to_string()))
        .unwrap_or(Value::Null)
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

fn conversion_error(err: tiberius::error::Error) -> AppError {
    AppError::new(ErrorKind::Query, format!("Unsupported value: {}", err))
}
